//! File-size value type used by size rules, snapshots and diffs.
//!
//! Sizes parse from `"<number> <unit>"` literals where the unit is one of
//! `B`, `KB`, `MB`, `GB` (binary multiples). Display picks the largest unit
//! the value reaches and prints two decimals for anything above bytes.

use crate::error::SizeParseError;
use regex::Regex;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

const KB: u64 = 1024;
const MB: u64 = 1024 * KB;
const GB: u64 = 1024 * MB;

/// Immutable non-negative byte count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileSize {
    bytes: u64,
}

/// Signed comparison of two sizes carrying the absolute difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeDelta {
    Lower(FileSize),
    Greater(FileSize),
    Equal,
}

impl SizeDelta {
    pub fn magnitude(&self) -> FileSize {
        match self {
            SizeDelta::Lower(m) | SizeDelta::Greater(m) => *m,
            SizeDelta::Equal => FileSize::default(),
        }
    }
}

impl fmt::Display for SizeDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeDelta::Lower(m) => write!(f, "-{m}"),
            SizeDelta::Greater(m) => write!(f, "+{m}"),
            SizeDelta::Equal => write!(f, "±0 B"),
        }
    }
}

impl FileSize {
    pub const fn from_bytes(bytes: u64) -> Self {
        Self { bytes }
    }

    pub const fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Compare `self` against `other`: `Lower` when `self` is smaller.
    pub fn delta(&self, other: &FileSize) -> SizeDelta {
        match self.bytes.cmp(&other.bytes) {
            std::cmp::Ordering::Less => {
                SizeDelta::Lower(FileSize::from_bytes(other.bytes - self.bytes))
            }
            std::cmp::Ordering::Greater => {
                SizeDelta::Greater(FileSize::from_bytes(self.bytes - other.bytes))
            }
            std::cmp::Ordering::Equal => SizeDelta::Equal,
        }
    }
}

fn size_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<int>\d+)(?:\.(?P<frac>\d+))? (?P<unit>B|KB|MB|GB)$")
            .expect("file size pattern is a valid regex")
    })
}

impl FromStr for FileSize {
    type Err = SizeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || SizeParseError {
            input: s.to_string(),
        };
        let caps = size_pattern().captures(s).ok_or_else(err)?;
        let unit = match &caps["unit"] {
            "B" => 1,
            "KB" => KB,
            "MB" => MB,
            _ => GB,
        };
        let bytes = match caps.name("frac") {
            // Integers stay exact; decimals go through f64 and round.
            None => caps["int"]
                .parse::<u64>()
                .ok()
                .and_then(|n| n.checked_mul(unit))
                .ok_or_else(err)?,
            Some(_) => {
                let value: f64 = caps[0]
                    .split(' ')
                    .next()
                    .and_then(|n| n.parse().ok())
                    .ok_or_else(err)?;
                let scaled = (value * unit as f64).round();
                if !scaled.is_finite() || scaled > u64::MAX as f64 {
                    return Err(err());
                }
                scaled as u64
            }
        };
        Ok(FileSize::from_bytes(bytes))
    }
}

impl fmt::Display for FileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.bytes;
        let (divisor, unit) = if b < KB {
            return write!(f, "{b} B");
        } else if b < MB {
            (KB, "KB")
        } else if b < GB {
            (MB, "MB")
        } else {
            (GB, "GB")
        };
        write!(f, "{:.2} {unit}", b as f64 / divisor as f64)
    }
}

impl std::ops::Add for FileSize {
    type Output = FileSize;

    fn add(self, rhs: FileSize) -> FileSize {
        FileSize::from_bytes(self.bytes.saturating_add(rhs.bytes))
    }
}

impl std::iter::Sum for FileSize {
    fn sum<I: Iterator<Item = FileSize>>(iter: I) -> FileSize {
        iter.fold(FileSize::default(), |acc, s| acc + s)
    }
}

impl Serialize for FileSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.bytes)
    }
}

struct FileSizeVisitor;

impl<'de> Visitor<'de> for FileSizeVisitor {
    type Value = FileSize;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a byte count or a '<number> <unit>' string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<FileSize, E> {
        Ok(FileSize::from_bytes(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<FileSize, E> {
        u64::try_from(v)
            .map(FileSize::from_bytes)
            .map_err(|_| E::custom(format!("file size must not be negative, got {v}")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<FileSize, E> {
        v.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for FileSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<FileSize, D::Error> {
        deserializer.deserialize_any(FileSizeVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("0 B", 0)]
    #[case("512 B", 512)]
    #[case("1 KB", 1024)]
    #[case("1 MB", 1 << 20)]
    #[case("2 GB", 2 << 30)]
    #[case("1.5 KB", 1536)]
    #[case("0.5 MB", 512 * 1024)]
    fn parses_valid_literals(#[case] input: &str, #[case] bytes: u64) {
        assert_eq!(input.parse::<FileSize>().unwrap().bytes(), bytes);
    }

    #[rstest]
    #[case("")]
    #[case("1B")]
    #[case("1 TB")]
    #[case("1  MB")]
    #[case("-1 MB")]
    #[case("MB")]
    #[case("1.5.2 MB")]
    #[case("1 mb")]
    fn rejects_invalid_literals(#[case] input: &str) {
        assert!(input.parse::<FileSize>().is_err());
    }

    #[rstest]
    #[case(0, "0 B")]
    #[case(1023, "1023 B")]
    #[case(1024, "1.00 KB")]
    #[case(1536, "1.50 KB")]
    #[case(1 << 20, "1.00 MB")]
    #[case(150 << 20, "150.00 MB")]
    #[case(3 << 30, "3.00 GB")]
    fn formats_with_largest_unit(#[case] bytes: u64, #[case] expected: &str) {
        assert_eq!(FileSize::from_bytes(bytes).to_string(), expected);
    }

    #[test]
    fn megabyte_literal_and_display_agree() {
        let mb: FileSize = "1 MB".parse().unwrap();
        assert_eq!(mb.bytes(), 1 << 20);
        assert_eq!(mb.to_string(), "1.00 MB");
    }

    #[test]
    fn delta_is_equal_against_itself() {
        let a = FileSize::from_bytes(4096);
        assert_eq!(a.delta(&a), SizeDelta::Equal);
        assert_eq!(a.delta(&a).magnitude().bytes(), 0);
    }

    #[test]
    fn delta_is_antisymmetric() {
        let a = FileSize::from_bytes(100);
        let b = FileSize::from_bytes(350);
        assert_eq!(a.delta(&b), SizeDelta::Lower(FileSize::from_bytes(250)));
        assert_eq!(b.delta(&a), SizeDelta::Greater(FileSize::from_bytes(250)));
        assert_eq!(a.delta(&b).magnitude(), b.delta(&a).magnitude());
    }

    #[test]
    fn deserializes_from_string_or_integer() {
        let from_str: FileSize = serde_yaml::from_str("\"100 MB\"").unwrap();
        let from_int: FileSize = serde_yaml::from_str("2048").unwrap();
        assert_eq!(from_str.bytes(), 100 << 20);
        assert_eq!(from_int.bytes(), 2048);
        assert!(serde_yaml::from_str::<FileSize>("\"100MB\"").is_err());
        assert!(serde_yaml::from_str::<FileSize>("-4").is_err());
    }
}
