//! Binary NBT encoding.
//!
//! ## Wire Format
//! ```text
//! tag      = [type: u8] [name: i16 len + UTF-8]? [payload]
//! compound = tag* [0x00]
//! list     = [element type: u8] [count: i32] payload*
//! arrays   = [count: i32] element*
//! string   = [byte len: i16] UTF-8
//! ```
//!
//! Encoding always builds the full byte sequence in memory first and hands it
//! to the channel in one write, so the blocking and async writers emit the
//! same bytes. The async reader pulls bytes from the channel as it walks the
//! tree.

use std::io::{Read, Write};

use tokio::io::{AsyncRead, AsyncWrite};

use crate::core::async_io::AsyncMcRead;
use crate::core::buffer::Buffer;
use crate::core::channel::{read_full, read_full_async, write_full, write_full_async};
use crate::core::primitives::{narrow, FixedWidth, McRead};
use crate::error::constants::{ERR_INVALID_UTF8, ERR_NBT_TOO_DEEP, ERR_NBT_TRAILING};
use crate::error::{ProtocolError, Result};
use crate::nbt::tag::{Compound, List, NamedTag, Tag, TagKind};

/// Deepest nesting of lists and compounds accepted on read or write.
pub const MAX_DEPTH: usize = 512;

/// Longest string payload, in bytes.
pub const MAX_STRING_BYTES: usize = i16::MAX as usize;

/// Which parts precede a root tag's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Header {
    /// Type byte and name; the form used for files and most packet fields.
    Named,
    /// Type byte only; the name is omitted.
    Unnamed,
}

fn check_depth(depth: usize) -> Result<()> {
    if depth > MAX_DEPTH {
        Err(ProtocolError::format(ERR_NBT_TOO_DEEP))
    } else {
        Ok(())
    }
}

fn array_len(len: usize, kind: TagKind) -> Result<i32> {
    narrow::<i32>(len as i128).map_err(|_| ProtocolError::Range {
        kind: kind.name(),
        value: format!("{len} elements"),
        min: "0".into(),
        max: i32::MAX.to_string(),
    })
}

fn encode_string(value: &str, out: &mut Vec<u8>) -> Result<()> {
    if value.len() > MAX_STRING_BYTES {
        return Err(ProtocolError::Range {
            kind: TagKind::String.name(),
            value: format!("{} bytes", value.len()),
            min: "0".into(),
            max: MAX_STRING_BYTES.to_string(),
        });
    }
    (value.len() as i16).put(out);
    out.extend_from_slice(value.as_bytes());
    Ok(())
}

fn encode_scalar(tag: &Tag, out: &mut Vec<u8>) -> Result<()> {
    match tag {
        Tag::End => {}
        Tag::Byte(v) => v.put(out),
        Tag::Short(v) => v.put(out),
        Tag::Int(v) => v.put(out),
        Tag::Long(v) => v.put(out),
        Tag::Float(v) => v.put(out),
        Tag::Double(v) => v.put(out),
        Tag::ByteArray(values) => {
            array_len(values.len(), TagKind::ByteArray)?.put(out);
            out.extend(values.iter().map(|b| *b as u8));
        }
        Tag::String(s) => encode_string(s, out)?,
        Tag::IntArray(values) => {
            array_len(values.len(), TagKind::IntArray)?.put(out);
            for v in values {
                v.put(out);
            }
        }
        Tag::LongArray(values) => {
            array_len(values.len(), TagKind::LongArray)?.put(out);
            for v in values {
                v.put(out);
            }
        }
        Tag::List(_) | Tag::Compound(_) => {
            return Err(ProtocolError::format(format!(
                "{} is not a scalar tag",
                tag.kind()
            )))
        }
    }
    Ok(())
}

/// Containers still being written, innermost last.
enum Emit<'a> {
    List(std::slice::Iter<'a, Tag>),
    Compound(std::slice::Iter<'a, (String, Tag)>),
}

/// Append the payload of `tag` (no type byte, no name).
///
/// Nesting is walked with an explicit stack, so deep trees cost heap rather
/// than thread stack.
pub fn encode_payload(tag: &Tag, out: &mut Vec<u8>) -> Result<()> {
    let mut stack: Vec<Emit<'_>> = Vec::new();
    let mut next = Some(tag);
    loop {
        if let Some(tag) = next.take() {
            match tag {
                Tag::List(list) => {
                    check_depth(stack.len() + 1)?;
                    // an empty list is always written as a list of End
                    let kind = if list.is_empty() {
                        TagKind::End
                    } else {
                        list.kind()
                    };
                    out.push(kind.id());
                    array_len(list.len(), TagKind::List)?.put(out);
                    stack.push(Emit::List(list.iter()));
                }
                Tag::Compound(compound) => {
                    check_depth(stack.len() + 1)?;
                    stack.push(Emit::Compound(compound.entries()));
                }
                scalar => encode_scalar(scalar, out)?,
            }
        }

        let Some(top) = stack.last_mut() else {
            return Ok(());
        };
        match top {
            Emit::List(items) => match items.next() {
                Some(item) => next = Some(item),
                None => {
                    stack.pop();
                }
            },
            Emit::Compound(entries) => match entries.next() {
                Some((name, child)) => {
                    out.push(child.kind().id());
                    encode_string(name, out)?;
                    next = Some(child);
                }
                None => {
                    out.push(TagKind::End.id());
                    stack.pop();
                }
            },
        }
    }
}

/// Encode a root tag with the given header.
///
/// A root `End` tag is a single zero byte whatever the header; packets use
/// it to mean "no NBT".
pub fn encode_tag(root: &NamedTag, header: Header) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    out.push(root.tag.kind().id());
    if root.tag.kind() == TagKind::End {
        return Ok(out);
    }
    if header == Header::Named {
        encode_string(root.name.as_deref().unwrap_or(""), &mut out)?;
    }
    encode_payload(&root.tag, &mut out)?;
    Ok(out)
}

/// Serialize a named root tag.
pub fn to_bytes(root: &NamedTag) -> Result<Vec<u8>> {
    encode_tag(root, Header::Named)
}

/// Deserialize a named root tag that spans all of `bytes`.
///
/// # Errors
/// Returns `ProtocolError::Format` if bytes remain after the root.
pub fn from_bytes(bytes: &[u8]) -> Result<NamedTag> {
    let mut buf = Buffer::from(bytes);
    let root = read_tag(&mut buf, Header::Named)?;
    if buf.has_remaining() {
        return Err(ProtocolError::format(format!(
            "{ERR_NBT_TRAILING}: {} bytes",
            buf.remaining()
        )));
    }
    Ok(root)
}

/// Write a root tag to a blocking channel.
pub fn write_tag<W: Write + ?Sized>(writer: &mut W, root: &NamedTag, header: Header) -> Result<()> {
    write_full(writer, &encode_tag(root, header)?)
}

/// Write a root tag to an async channel.
pub async fn write_tag_async<W: AsyncWrite + Unpin + Send + ?Sized>(
    writer: &mut W,
    root: &NamedTag,
    header: Header,
) -> Result<()> {
    let bytes = encode_tag(root, header)?;
    write_full_async(writer, &bytes).await
}

fn decode_name(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes)
        .map_err(|e| ProtocolError::format(format!("{ERR_INVALID_UTF8}: {e}")))
}

fn string_len(len: i16) -> Result<usize> {
    usize::try_from(len)
        .map_err(|_| ProtocolError::format(format!("negative NBT string length {len}")))
}

fn count(len: i32, kind: TagKind) -> Result<usize> {
    usize::try_from(len)
        .map_err(|_| ProtocolError::format(format!("negative {} length {len}", kind.name())))
}

fn byte_len(count: usize, width: usize, kind: TagKind) -> Result<usize> {
    count
        .checked_mul(width)
        .ok_or_else(|| ProtocolError::format(format!("{} length {count} too large", kind.name())))
}

fn chunks<T: FixedWidth>(bytes: &[u8]) -> Result<Vec<T>> {
    bytes.chunks_exact(T::SIZE).map(T::take).collect()
}

fn end_list_error(n: usize) -> ProtocolError {
    ProtocolError::format(format!("list declares {n} TAG_End elements"))
}

fn finish_list(kind: TagKind, items: Vec<Tag>) -> Result<Tag> {
    let mut list = List::of(kind);
    for item in items {
        list.push(item)?;
    }
    Ok(Tag::List(list))
}

fn not_scalar(kind: TagKind) -> ProtocolError {
    ProtocolError::format(format!("{kind} is not a scalar tag"))
}

/// A list or compound whose children are still being read, innermost last.
enum Open {
    List {
        element: TagKind,
        remaining: usize,
        items: Vec<Tag>,
    },
    Compound {
        compound: Compound,
        name: Option<String>,
    },
}

impl Open {
    fn list(element: TagKind, n: usize) -> Result<Self> {
        if element == TagKind::End && n > 0 {
            return Err(end_list_error(n));
        }
        Ok(Open::List {
            element,
            remaining: n,
            items: Vec::with_capacity(n.min(1024)),
        })
    }

    fn compound() -> Self {
        Open::Compound {
            compound: Compound::new(),
            name: None,
        }
    }

    fn accept(&mut self, tag: Tag) -> Result<()> {
        match self {
            Open::List { items, .. } => {
                items.push(tag);
                Ok(())
            }
            Open::Compound { compound, name } => match name.take() {
                Some(name) => compound.insert(name, tag),
                None => Err(ProtocolError::format("compound child has no name")),
            },
        }
    }

    /// Kind of the next list element, or `None` once the list is full.
    fn next_element(&mut self) -> Option<TagKind> {
        match self {
            Open::List {
                element, remaining, ..
            } if *remaining > 0 => {
                *remaining -= 1;
                Some(*element)
            }
            _ => None,
        }
    }

    fn close(self) -> Result<Tag> {
        match self {
            Open::List { element, items, .. } => finish_list(element, items),
            Open::Compound { compound, .. } => Ok(Tag::Compound(compound)),
        }
    }
}

/// Read a root tag from a blocking channel.
pub fn read_tag<R: Read + ?Sized>(reader: &mut R, header: Header) -> Result<NamedTag> {
    let kind = TagKind::from_id(reader.read_value::<u8>()?)?;
    if kind == TagKind::End {
        return Ok(NamedTag::unnamed(Tag::End));
    }
    let name = match header {
        Header::Named => {
            let len = string_len(reader.read_value::<i16>()?)?;
            Some(decode_name(read_full(reader, len)?)?).filter(|n| !n.is_empty())
        }
        Header::Unnamed => None,
    };
    let tag = read_payload(reader, kind)?;
    Ok(NamedTag { name, tag })
}

fn read_scalar<R: Read + ?Sized>(reader: &mut R, kind: TagKind) -> Result<Tag> {
    Ok(match kind {
        TagKind::End => Tag::End,
        TagKind::Byte => Tag::Byte(reader.read_value()?),
        TagKind::Short => Tag::Short(reader.read_value()?),
        TagKind::Int => Tag::Int(reader.read_value()?),
        TagKind::Long => Tag::Long(reader.read_value()?),
        TagKind::Float => Tag::Float(reader.read_value()?),
        TagKind::Double => Tag::Double(reader.read_value()?),
        TagKind::ByteArray => {
            let n = count(reader.read_value::<i32>()?, kind)?;
            Tag::ByteArray(read_full(reader, n)?.into_iter().map(|b| b as i8).collect())
        }
        TagKind::String => {
            let len = string_len(reader.read_value::<i16>()?)?;
            Tag::String(decode_name(read_full(reader, len)?)?)
        }
        TagKind::IntArray => {
            let n = count(reader.read_value::<i32>()?, kind)?;
            Tag::IntArray(chunks(&read_full(reader, byte_len(n, 4, kind)?)?)?)
        }
        TagKind::LongArray => {
            let n = count(reader.read_value::<i32>()?, kind)?;
            Tag::LongArray(chunks(&read_full(reader, byte_len(n, 8, kind)?)?)?)
        }
        TagKind::List | TagKind::Compound => return Err(not_scalar(kind)),
    })
}

/// Read the payload of a tag whose kind is already known.
///
/// Lists and compounds are tracked on an explicit stack, so nesting up to
/// [`MAX_DEPTH`] never grows the thread stack.
pub fn read_payload<R: Read + ?Sized>(reader: &mut R, kind: TagKind) -> Result<Tag> {
    let mut stack: Vec<Open> = Vec::new();
    let mut kind = kind;
    loop {
        let mut done = match kind {
            TagKind::List => {
                check_depth(stack.len() + 1)?;
                let element = TagKind::from_id(reader.read_value::<u8>()?)?;
                let n = count(reader.read_value::<i32>()?, kind)?;
                stack.push(Open::list(element, n)?);
                None
            }
            TagKind::Compound => {
                check_depth(stack.len() + 1)?;
                stack.push(Open::compound());
                None
            }
            scalar => Some(read_scalar(reader, scalar)?),
        };

        // climb until an open container asks for another child
        loop {
            let Some(top) = stack.last_mut() else {
                return done.ok_or_else(|| not_scalar(kind));
            };
            if let Some(tag) = done.take() {
                top.accept(tag)?;
            }
            let next = match top {
                Open::List { .. } => top.next_element(),
                Open::Compound { name, .. } => {
                    let child = TagKind::from_id(reader.read_value::<u8>()?)?;
                    if child == TagKind::End {
                        None
                    } else {
                        let len = string_len(reader.read_value::<i16>()?)?;
                        *name = Some(decode_name(read_full(reader, len)?)?);
                        Some(child)
                    }
                }
            };
            match next {
                Some(next) => {
                    kind = next;
                    break;
                }
                None => {
                    if let Some(open) = stack.pop() {
                        done = Some(open.close()?);
                    }
                }
            }
        }
    }
}

/// Read a root tag from an async channel.
pub async fn read_tag_async<R: AsyncRead + Unpin + Send + ?Sized>(
    reader: &mut R,
    header: Header,
) -> Result<NamedTag> {
    let kind = TagKind::from_id(AsyncMcRead::read_value::<u8>(reader).await?)?;
    if kind == TagKind::End {
        return Ok(NamedTag::unnamed(Tag::End));
    }
    let name = match header {
        Header::Named => {
            let len = string_len(AsyncMcRead::read_value::<i16>(reader).await?)?;
            Some(decode_name(read_full_async(reader, len).await?)?).filter(|n| !n.is_empty())
        }
        Header::Unnamed => None,
    };
    let tag = read_payload_async(reader, kind).await?;
    Ok(NamedTag { name, tag })
}

async fn read_scalar_async<R: AsyncRead + Unpin + Send + ?Sized>(
    reader: &mut R,
    kind: TagKind,
) -> Result<Tag> {
    Ok(match kind {
        TagKind::End => Tag::End,
        TagKind::Byte => Tag::Byte(AsyncMcRead::read_value(reader).await?),
        TagKind::Short => Tag::Short(AsyncMcRead::read_value(reader).await?),
        TagKind::Int => Tag::Int(AsyncMcRead::read_value(reader).await?),
        TagKind::Long => Tag::Long(AsyncMcRead::read_value(reader).await?),
        TagKind::Float => Tag::Float(AsyncMcRead::read_value(reader).await?),
        TagKind::Double => Tag::Double(AsyncMcRead::read_value(reader).await?),
        TagKind::ByteArray => {
            let n = count(AsyncMcRead::read_value::<i32>(reader).await?, kind)?;
            let bytes = read_full_async(reader, n).await?;
            Tag::ByteArray(bytes.into_iter().map(|b| b as i8).collect())
        }
        TagKind::String => {
            let len = string_len(AsyncMcRead::read_value::<i16>(reader).await?)?;
            Tag::String(decode_name(read_full_async(reader, len).await?)?)
        }
        TagKind::IntArray => {
            let n = count(AsyncMcRead::read_value::<i32>(reader).await?, kind)?;
            let bytes = read_full_async(reader, byte_len(n, 4, kind)?).await?;
            Tag::IntArray(chunks(&bytes)?)
        }
        TagKind::LongArray => {
            let n = count(AsyncMcRead::read_value::<i32>(reader).await?, kind)?;
            let bytes = read_full_async(reader, byte_len(n, 8, kind)?).await?;
            Tag::LongArray(chunks(&bytes)?)
        }
        TagKind::List | TagKind::Compound => return Err(not_scalar(kind)),
    })
}

async fn read_payload_async<R: AsyncRead + Unpin + Send + ?Sized>(
    reader: &mut R,
    kind: TagKind,
) -> Result<Tag> {
    let mut stack: Vec<Open> = Vec::new();
    let mut kind = kind;
    loop {
        let mut done = match kind {
            TagKind::List => {
                check_depth(stack.len() + 1)?;
                let element = TagKind::from_id(AsyncMcRead::read_value::<u8>(reader).await?)?;
                let n = count(AsyncMcRead::read_value::<i32>(reader).await?, kind)?;
                stack.push(Open::list(element, n)?);
                None
            }
            TagKind::Compound => {
                check_depth(stack.len() + 1)?;
                stack.push(Open::compound());
                None
            }
            scalar => Some(read_scalar_async(reader, scalar).await?),
        };

        loop {
            let Some(top) = stack.last_mut() else {
                return done.ok_or_else(|| not_scalar(kind));
            };
            if let Some(tag) = done.take() {
                top.accept(tag)?;
            }
            let next = match top {
                Open::List { .. } => top.next_element(),
                Open::Compound { name, .. } => {
                    let child = TagKind::from_id(AsyncMcRead::read_value::<u8>(reader).await?)?;
                    if child == TagKind::End {
                        None
                    } else {
                        let len = string_len(AsyncMcRead::read_value::<i16>(reader).await?)?;
                        *name = Some(decode_name(read_full_async(reader, len).await?)?);
                        Some(child)
                    }
                }
            };
            match next {
                Some(next) => {
                    kind = next;
                    break;
                }
                None => {
                    if let Some(open) = stack.pop() {
                        done = Some(open.close()?);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> NamedTag {
        let mut nested = List::new();
        nested
            .push(Tag::Compound(Compound::new().with("id", "minecraft:stone").unwrap()))
            .unwrap();
        let root = Compound::new()
            .with("byte", 1i8)
            .unwrap()
            .with("short", -2i16)
            .unwrap()
            .with("int", 3i32)
            .unwrap()
            .with("long", i64::MIN)
            .unwrap()
            .with("float", 0.5f32)
            .unwrap()
            .with("double", -0.25f64)
            .unwrap()
            .with("bytes", vec![-1i8, 0, 1])
            .unwrap()
            .with("string", "héllo")
            .unwrap()
            .with("list", nested)
            .unwrap()
            .with("empty", List::new())
            .unwrap()
            .with("ints", vec![i32::MAX, 0])
            .unwrap()
            .with("longs", vec![1i64, -1])
            .unwrap();
        NamedTag::new("root", root)
    }

    #[test]
    fn test_every_kind_roundtrips() {
        let tag = sample();
        assert_eq!(from_bytes(&to_bytes(&tag).unwrap()).unwrap(), tag);
    }

    #[test]
    fn test_hello_world_layout() {
        let root = NamedTag::new(
            "hello world",
            Compound::new().with("name", "Bananrama").unwrap(),
        );
        let bytes = to_bytes(&root).unwrap();
        let mut expected = vec![0x0A, 0x00, 0x0B];
        expected.extend_from_slice(b"hello world");
        expected.extend_from_slice(&[0x08, 0x00, 0x04]);
        expected.extend_from_slice(b"name");
        expected.extend_from_slice(&[0x00, 0x09]);
        expected.extend_from_slice(b"Bananrama");
        expected.push(0x00);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_empty_list_written_as_end() {
        let mut out = Vec::new();
        encode_payload(&Tag::List(List::of(TagKind::Int)), &mut out).unwrap();
        assert_eq!(out, vec![0x00, 0, 0, 0, 0]);
    }

    #[test]
    fn test_unnamed_header() {
        let root = NamedTag::unnamed(Compound::new().with("a", 1i8).unwrap());
        let bytes = encode_tag(&root, Header::Unnamed).unwrap();
        assert_eq!(bytes, vec![0x0A, 0x01, 0x00, 0x01, b'a', 0x01, 0x00]);
        let decoded = read_tag(&mut bytes.as_slice(), Header::Unnamed).unwrap();
        assert_eq!(decoded, root);
    }

    #[test]
    fn test_end_root_is_single_byte() {
        let bytes = to_bytes(&NamedTag::unnamed(Tag::End)).unwrap();
        assert_eq!(bytes, vec![0x00]);
        assert_eq!(from_bytes(&bytes).unwrap().tag, Tag::End);
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = to_bytes(&sample()).unwrap();
        bytes.push(0);
        assert!(matches!(from_bytes(&bytes), Err(ProtocolError::Format(_))));
    }

    #[test]
    fn test_invalid_type_byte() {
        assert!(matches!(from_bytes(&[0x0D]), Err(ProtocolError::Format(_))));
    }

    #[test]
    fn test_negative_lengths() {
        // int array, unnamed header, length -1
        let bytes = [0x0B, 0xFF, 0xFF, 0xFF, 0xFF];
        assert!(matches!(
            read_tag(&mut bytes.as_slice(), Header::Unnamed),
            Err(ProtocolError::Format(_))
        ));
    }

    #[test]
    fn test_list_of_end_with_elements() {
        let bytes = [0x09, 0x00, 0x00, 0x00, 0x00, 0x02];
        assert!(matches!(
            read_tag(&mut bytes.as_slice(), Header::Unnamed),
            Err(ProtocolError::Format(_))
        ));
    }

    #[test]
    fn test_duplicate_names_on_read() {
        let bytes = [
            0x0A, 0x01, 0x00, 0x01, b'a', 0x01, 0x01, 0x00, 0x01, b'a', 0x02, 0x00,
        ];
        assert!(matches!(
            read_tag(&mut bytes.as_slice(), Header::Unnamed),
            Err(ProtocolError::Structural(_))
        ));
    }

    /// An unnamed root list followed by `lists - 1` nested list headers.
    fn nested_lists(lists: usize) -> Vec<u8> {
        let mut bytes = vec![0x09];
        for _ in 1..lists {
            bytes.extend_from_slice(&[0x09, 0x00, 0x00, 0x00, 0x01]);
        }
        bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00]);
        bytes
    }

    #[test]
    fn test_depth_limit() {
        let bytes = nested_lists(MAX_DEPTH + 1);
        assert!(matches!(
            read_tag(&mut bytes.as_slice(), Header::Unnamed),
            Err(ProtocolError::Format(_))
        ));
    }

    #[test]
    fn test_max_depth_fits_small_stack() {
        // 2 MiB is the default stack of spawned threads
        let handle = std::thread::Builder::new()
            .stack_size(2 << 20)
            .spawn(|| {
                let deepest = nested_lists(MAX_DEPTH);
                let root = read_tag(&mut deepest.as_slice(), Header::Unnamed).unwrap();
                assert_eq!(encode_tag(&root, Header::Unnamed).unwrap(), deepest);

                let runtime = tokio::runtime::Builder::new_current_thread()
                    .build()
                    .unwrap();
                let from_async = runtime
                    .block_on(read_tag_async(&mut deepest.as_slice(), Header::Unnamed))
                    .unwrap();
                assert_eq!(encode_tag(&from_async, Header::Unnamed).unwrap(), deepest);

                let too_deep = nested_lists(MAX_DEPTH + 1);
                assert!(matches!(
                    read_tag(&mut too_deep.as_slice(), Header::Unnamed),
                    Err(ProtocolError::Format(_))
                ));
                assert!(matches!(
                    runtime.block_on(read_tag_async(&mut too_deep.as_slice(), Header::Unnamed)),
                    Err(ProtocolError::Format(_))
                ));

                let mut wrapped = List::new();
                wrapped.push(root.tag).unwrap();
                assert!(matches!(
                    encode_tag(&NamedTag::unnamed(wrapped), Header::Unnamed),
                    Err(ProtocolError::Format(_))
                ));
            })
            .unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_deep_compounds_roundtrip() {
        let mut tag = Tag::Int(7);
        for depth in 0..MAX_DEPTH {
            tag = Tag::Compound(Compound::new().with(format!("c{depth}"), tag).unwrap());
        }
        let root = NamedTag::new("deep", tag);
        let bytes = to_bytes(&root).unwrap();
        let decoded = from_bytes(&bytes).unwrap();
        assert_eq!(to_bytes(&decoded).unwrap(), bytes);
    }

    #[test]
    fn test_long_string_is_range_error() {
        let root = NamedTag::unnamed(Tag::String("x".repeat(MAX_STRING_BYTES + 1)));
        assert!(matches!(
            encode_tag(&root, Header::Unnamed),
            Err(ProtocolError::Range { .. })
        ));
    }

    #[tokio::test]
    async fn test_async_matches_sync() {
        let tag = sample();
        let sync_bytes = to_bytes(&tag).unwrap();

        let mut async_bytes = Vec::new();
        write_tag_async(&mut async_bytes, &tag, Header::Named)
            .await
            .unwrap();
        assert_eq!(sync_bytes, async_bytes);

        let decoded = read_tag_async(&mut async_bytes.as_slice(), Header::Named)
            .await
            .unwrap();
        assert_eq!(decoded, tag);
    }
}
