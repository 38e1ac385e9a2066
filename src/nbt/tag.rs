//! NBT tree types.
//!
//! [`Tag`] is a closed sum over the 13 tag kinds. Names live with their
//! owner: a [`Compound`] stores `(name, tag)` entries and the root name is
//! carried by [`NamedTag`]. List elements have no names at all.

use std::collections::HashMap;
use std::fmt;

use crate::core::primitives::{narrow, Integral};
use crate::error::{ProtocolError, Result};

/// Tolerance for `Float`/`Double` equality.
pub const FLOAT_EPSILON: f64 = 1e-6;

/// Type byte of a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum TagKind {
    End = 0,
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    ByteArray = 7,
    String = 8,
    List = 9,
    Compound = 10,
    IntArray = 11,
    LongArray = 12,
}

impl TagKind {
    /// Indexed by type byte.
    pub const ALL: [TagKind; 13] = [
        TagKind::End,
        TagKind::Byte,
        TagKind::Short,
        TagKind::Int,
        TagKind::Long,
        TagKind::Float,
        TagKind::Double,
        TagKind::ByteArray,
        TagKind::String,
        TagKind::List,
        TagKind::Compound,
        TagKind::IntArray,
        TagKind::LongArray,
    ];

    pub fn id(self) -> u8 {
        self as u8
    }

    /// # Errors
    /// Returns `ProtocolError::Format` for bytes above 12.
    pub fn from_id(id: u8) -> Result<Self> {
        Self::ALL
            .get(id as usize)
            .copied()
            .ok_or_else(|| ProtocolError::format(format!("invalid NBT type byte {id}")))
    }

    pub fn name(self) -> &'static str {
        match self {
            TagKind::End => "TAG_End",
            TagKind::Byte => "TAG_Byte",
            TagKind::Short => "TAG_Short",
            TagKind::Int => "TAG_Int",
            TagKind::Long => "TAG_Long",
            TagKind::Float => "TAG_Float",
            TagKind::Double => "TAG_Double",
            TagKind::ByteArray => "TAG_Byte_Array",
            TagKind::String => "TAG_String",
            TagKind::List => "TAG_List",
            TagKind::Compound => "TAG_Compound",
            TagKind::IntArray => "TAG_Int_Array",
            TagKind::LongArray => "TAG_Long_Array",
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            TagKind::Byte | TagKind::Short | TagKind::Int | TagKind::Long
        )
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One NBT value.
#[derive(Debug, Clone)]
pub enum Tag {
    End,
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(List),
    Compound(Compound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl Tag {
    pub fn kind(&self) -> TagKind {
        match self {
            Tag::End => TagKind::End,
            Tag::Byte(_) => TagKind::Byte,
            Tag::Short(_) => TagKind::Short,
            Tag::Int(_) => TagKind::Int,
            Tag::Long(_) => TagKind::Long,
            Tag::Float(_) => TagKind::Float,
            Tag::Double(_) => TagKind::Double,
            Tag::ByteArray(_) => TagKind::ByteArray,
            Tag::String(_) => TagKind::String,
            Tag::List(_) => TagKind::List,
            Tag::Compound(_) => TagKind::Compound,
            Tag::IntArray(_) => TagKind::IntArray,
            Tag::LongArray(_) => TagKind::LongArray,
        }
    }

    /// Build an integer tag of `kind`, checking that `value` fits its width.
    ///
    /// # Errors
    /// - `ProtocolError::Range` if `value` does not fit
    /// - `ProtocolError::SchemaMismatch` if `kind` is not an integer kind
    pub fn integer(kind: TagKind, value: i128) -> Result<Self> {
        fn fit<T: Integral>(kind: TagKind, value: i128) -> Result<T> {
            narrow::<T>(value).map_err(|e| relabel_range(e, kind))
        }

        Ok(match kind {
            TagKind::Byte => Tag::Byte(fit::<i8>(kind, value)?),
            TagKind::Short => Tag::Short(fit::<i16>(kind, value)?),
            TagKind::Int => Tag::Int(fit::<i32>(kind, value)?),
            TagKind::Long => Tag::Long(fit::<i64>(kind, value)?),
            other => return Err(ProtocolError::mismatch("an integer kind", other.name())),
        })
    }

    /// The value of an integer tag, widened.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Tag::Byte(v) => Some(v.into()),
            Tag::Short(v) => Some(v.into()),
            Tag::Int(v) => Some(v.into()),
            Tag::Long(v) => Some(v),
            _ => None,
        }
    }

    /// The value of any numeric tag as a double.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Tag::Float(v) => Some(v.into()),
            Tag::Double(v) => Some(v),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Tag::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Tag::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_compound(&self) -> Option<&Compound> {
        match self {
            Tag::Compound(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_compound_mut(&mut self) -> Option<&mut Compound> {
        match self {
            Tag::Compound(c) => Some(c),
            _ => None,
        }
    }
}

/// Name a range error after the tag kind rather than the Rust type.
pub(crate) fn relabel_range(err: ProtocolError, kind: TagKind) -> ProtocolError {
    match err {
        ProtocolError::Range {
            value, min, max, ..
        } => ProtocolError::Range {
            kind: kind.name(),
            value,
            min,
            max,
        },
        other => other,
    }
}

fn float_eq(a: f64, b: f64) -> bool {
    a == b || (a - b).abs() <= FLOAT_EPSILON
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Tag::End, Tag::End) => true,
            (Tag::Byte(a), Tag::Byte(b)) => a == b,
            (Tag::Short(a), Tag::Short(b)) => a == b,
            (Tag::Int(a), Tag::Int(b)) => a == b,
            (Tag::Long(a), Tag::Long(b)) => a == b,
            (Tag::Float(a), Tag::Float(b)) => float_eq(f64::from(*a), f64::from(*b)),
            (Tag::Double(a), Tag::Double(b)) => float_eq(*a, *b),
            (Tag::ByteArray(a), Tag::ByteArray(b)) => a == b,
            (Tag::String(a), Tag::String(b)) => a == b,
            (Tag::List(a), Tag::List(b)) => a == b,
            (Tag::Compound(a), Tag::Compound(b)) => a == b,
            (Tag::IntArray(a), Tag::IntArray(b)) => a == b,
            (Tag::LongArray(a), Tag::LongArray(b)) => a == b,
            _ => false,
        }
    }
}

macro_rules! tag_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Tag {
                fn from(v: $ty) -> Self {
                    Tag::$variant(v)
                }
            }
        )*
    };
}

tag_from! {
    i8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    Vec<i8> => ByteArray,
    String => String,
    List => List,
    Compound => Compound,
    Vec<i32> => IntArray,
    Vec<i64> => LongArray,
}

impl From<&str> for Tag {
    fn from(v: &str) -> Self {
        Tag::String(v.to_string())
    }
}

impl From<bool> for Tag {
    fn from(v: bool) -> Self {
        Tag::Byte(v.into())
    }
}

/// Homogeneous sequence of unnamed tags.
///
/// An empty list has element kind `End` unless created with [`List::of`].
#[derive(Debug, Clone)]
pub struct List {
    kind: TagKind,
    items: Vec<Tag>,
}

impl List {
    pub fn new() -> Self {
        Self {
            kind: TagKind::End,
            items: Vec::new(),
        }
    }

    /// Empty list that only accepts `kind` elements.
    pub fn of(kind: TagKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
        }
    }

    /// # Errors
    /// Returns `ProtocolError::Structural` if the tags are not all the same kind.
    pub fn from_tags(tags: impl IntoIterator<Item = Tag>) -> Result<Self> {
        let mut list = Self::new();
        for tag in tags {
            list.push(tag)?;
        }
        Ok(list)
    }

    /// Append an element.
    ///
    /// # Errors
    /// Returns `ProtocolError::Structural` for an `End` element or one whose
    /// kind differs from the list's.
    pub fn push(&mut self, tag: Tag) -> Result<()> {
        let kind = tag.kind();
        if kind == TagKind::End {
            return Err(ProtocolError::structural("TAG_End cannot be a list element"));
        }
        if self.kind == TagKind::End {
            self.kind = kind;
        } else if self.kind != kind {
            return Err(ProtocolError::structural(format!(
                "list of {} cannot hold {} at index {}",
                self.kind,
                kind,
                self.items.len()
            )));
        }
        self.items.push(tag);
        Ok(())
    }

    /// Element kind; `End` for an untyped empty list.
    pub fn kind(&self) -> TagKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Tag> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.items.iter()
    }

    pub fn into_inner(self) -> Vec<Tag> {
        self.items
    }
}

impl Default for List {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for List {
    fn eq(&self, other: &Self) -> bool {
        // two empty lists are equal whatever kind they were declared with
        self.items == other.items && (self.kind == other.kind || self.items.is_empty())
    }
}

impl<'a> IntoIterator for &'a List {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Named children with unique, non-empty names, kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Compound {
    entries: Vec<(String, Tag)>,
    index: HashMap<String, usize>,
}

impl Compound {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a child.
    ///
    /// # Errors
    /// Returns `ProtocolError::Structural` for an empty or duplicate name, or
    /// an `End` value.
    pub fn insert(&mut self, name: impl Into<String>, tag: impl Into<Tag>) -> Result<()> {
        let name = name.into();
        let tag = tag.into();
        if name.is_empty() {
            return Err(ProtocolError::structural("compound child name is empty"));
        }
        if tag.kind() == TagKind::End {
            return Err(ProtocolError::structural(format!(
                "compound child {name:?} cannot be TAG_End"
            )));
        }
        if self.index.contains_key(&name) {
            return Err(ProtocolError::structural(format!(
                "duplicate compound child {name:?}"
            )));
        }
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push((name, tag));
        Ok(())
    }

    /// Builder form of [`Compound::insert`].
    pub fn with(mut self, name: impl Into<String>, tag: impl Into<Tag>) -> Result<Self> {
        self.insert(name, tag)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Tag> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Tag> {
        match self.index.get(name) {
            Some(&i) => Some(&mut self.entries[i].1),
            None => None,
        }
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Tag> {
        let i = self.index.remove(name)?;
        let (_, tag) = self.entries.remove(i);
        for slot in self.index.values_mut() {
            if *slot > i {
                *slot -= 1;
            }
        }
        Some(tag)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Children in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tag)> {
        self.entries.iter().map(|(n, t)| (n.as_str(), t))
    }

    pub(crate) fn entries(&self) -> std::slice::Iter<'_, (String, Tag)> {
        self.entries.iter()
    }
}

impl PartialEq for Compound {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(name, tag)| other.get(name).is_some_and(|t| t == tag))
    }
}

/// A root tag and its optional name.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedTag {
    pub name: Option<String>,
    pub tag: Tag,
}

impl NamedTag {
    pub fn new(name: impl Into<String>, tag: impl Into<Tag>) -> Self {
        Self {
            name: Some(name.into()),
            tag: tag.into(),
        }
    }

    pub fn unnamed(tag: impl Into<Tag>) -> Self {
        Self {
            name: None,
            tag: tag.into(),
        }
    }
}
