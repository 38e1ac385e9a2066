//! Protocol version numbers and the fallback rules for unsupported ones.
//!
//! Only a closed set of versions has packet layouts declared in this crate.
//! Any other version resolves to the closest older supported version: silently
//! when the pair is listed in [`ProtocolVersion::COMPATIBLE`], with a warning
//! otherwise. A version older than every supported one cannot be resolved.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, Result};

/// A numeric protocol version as sent in the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtocolVersion(pub i32);

impl ProtocolVersion {
    pub const V1_8: Self = Self(47);
    pub const V1_12_2: Self = Self(340);
    pub const V1_16_5: Self = Self(754);
    pub const V1_18_1: Self = Self(757);
    pub const V1_18_2: Self = Self(758);
    pub const V1_19: Self = Self(759);
    pub const V1_19_2: Self = Self(760);
    pub const V1_19_3: Self = Self(761);
    pub const V1_19_4: Self = Self(762);
    pub const V1_20_1: Self = Self(763);

    /// Versions with explicitly declared packet layouts, ascending.
    pub const SUPPORTED: &'static [ProtocolVersion] = &[
        Self::V1_8,
        Self::V1_12_2,
        Self::V1_16_5,
        Self::V1_18_1,
        Self::V1_19,
        Self::V1_19_2,
        Self::V1_19_3,
        Self::V1_20_1,
    ];

    /// Versions known to share every packet layout with an older supported one.
    pub const COMPATIBLE: &'static [(ProtocolVersion, ProtocolVersion)] = &[
        (Self::V1_18_2, Self::V1_18_1),
        (Self::V1_19_4, Self::V1_19_3),
    ];

    pub const LATEST: Self = Self::V1_20_1;

    pub fn number(self) -> i32 {
        self.0
    }

    pub fn is_supported(self) -> bool {
        Self::SUPPORTED.contains(&self)
    }

    /// Game release name, for the versions this crate knows about.
    pub fn release_name(self) -> Option<&'static str> {
        Some(match self.0 {
            47 => "1.8",
            340 => "1.12.2",
            754 => "1.16.5",
            757 => "1.18.1",
            758 => "1.18.2",
            759 => "1.19",
            760 => "1.19.2",
            761 => "1.19.3",
            762 => "1.19.4",
            763 => "1.20.1",
            _ => return None,
        })
    }

    /// Map this version to the supported version whose layouts it uses.
    ///
    /// # Errors
    /// Returns `ProtocolError::UnsupportedVersion` if no supported version is
    /// at or below this one.
    pub fn resolve(self) -> Result<Resolution> {
        if self.is_supported() {
            return Ok(Resolution {
                requested: self,
                effective: self,
                fallback: Fallback::Exact,
            });
        }

        let nearest = Self::SUPPORTED
            .iter()
            .rev()
            .copied()
            .find(|v| *v < self)
            .ok_or(ProtocolError::UnsupportedVersion(self.0))?;

        let fallback = if Self::COMPATIBLE.contains(&(self, nearest)) {
            Fallback::Compatible
        } else {
            Fallback::Nearest
        };

        Ok(Resolution {
            requested: self,
            effective: nearest,
            fallback,
        })
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.release_name() {
            Some(name) => write!(f, "{} ({name})", self.0),
            None => write!(f, "{}", self.0),
        }
    }
}

impl From<i32> for ProtocolVersion {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

/// How a requested version was mapped to a supported one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// The requested version is supported as-is.
    Exact,
    /// Declared layout-compatible with the effective version; no warning.
    Compatible,
    /// Closest older supported version; layouts may differ.
    Nearest,
}

/// Outcome of [`ProtocolVersion::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub requested: ProtocolVersion,
    pub effective: ProtocolVersion,
    pub fallback: Fallback,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_sorted() {
        let mut sorted = ProtocolVersion::SUPPORTED.to_vec();
        sorted.sort();
        assert_eq!(sorted, ProtocolVersion::SUPPORTED);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_exact_resolution() {
        let r = ProtocolVersion(757).resolve().unwrap();
        assert_eq!(r.effective, ProtocolVersion::V1_18_1);
        assert_eq!(r.fallback, Fallback::Exact);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_compatible_resolution() {
        let r = ProtocolVersion(758).resolve().unwrap();
        assert_eq!(r.effective, ProtocolVersion::V1_18_1);
        assert_eq!(r.fallback, Fallback::Compatible);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_nearest_resolution() {
        let r = ProtocolVersion(500).resolve().unwrap();
        assert_eq!(r.effective, ProtocolVersion::V1_12_2);
        assert_eq!(r.fallback, Fallback::Nearest);

        let r = ProtocolVersion(9000).resolve().unwrap();
        assert_eq!(r.effective, ProtocolVersion::LATEST);
    }

    #[test]
    fn test_too_old_is_unsupported() {
        assert!(matches!(
            ProtocolVersion(5).resolve(),
            Err(ProtocolError::UnsupportedVersion(5))
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(ProtocolVersion(757).to_string(), "757 (1.18.1)");
        assert_eq!(ProtocolVersion(1).to_string(), "1");
    }
}
