//! Version ordering and version ranges
//!
//! Versions are dot-separated numeric segments ("1", "1.0", "4.0.0").
//! Every comparison in the crate goes through [`compare_versions`]: segments
//! compare numerically, and missing trailing segments count as zero, so
//! `1.0` and `1.0.0` are the same version.
//!
//! Ranges use the descriptor notation:
//!
//! ```text
//! 1.0.0+          1.0.0 and later
//! 1.0.0/2.0.0     1.0.0 through 2.0.0 (inclusive)
//! /2.0.0          up to and including 2.0.0
//! 1.0.0           exactly 1.0.0
//! *               every version
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::{ModelError, Result};

/// Compare two versions given as numeric segment tuples.
///
/// Missing trailing segments are treated as zero.
pub fn compare_versions(a: &[u32], b: &[u32]) -> Ordering {
    let len = a.len().max(b.len());
    for i in 0..len {
        let left = a.get(i).copied().unwrap_or(0);
        let right = b.get(i).copied().unwrap_or(0);
        match left.cmp(&right) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// A model version (e.g. "4.0.0")
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    segments: Vec<u32>,
}

impl Version {
    /// Create a version from numeric segments
    pub fn new(segments: impl Into<Vec<u32>>) -> Self {
        Self { segments: segments.into() }
    }

    /// Parse a version string, accepting an optional leading 'v'
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Err(ModelError::InvalidVersion(input.to_string()));
        }

        let segments = trimmed
            .split('.')
            .map(|s| s.parse::<u32>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| ModelError::InvalidVersion(input.to_string()))?;

        Ok(Self { segments })
    }

    /// Numeric segments as declared
    pub fn segments(&self) -> &[u32] {
        &self.segments
    }

    /// Segments without trailing zeros (canonical form for hashing)
    fn significant(&self) -> &[u32] {
        let end = self
            .segments
            .iter()
            .rposition(|s| *s != 0)
            .map(|i| i + 1)
            .unwrap_or(0);
        &self.segments[..end]
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        compare_versions(&self.segments, &other.segments) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant().hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_versions(&self.segments, &other.segments)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.segments.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", parts.join("."))
    }
}

impl FromStr for Version {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Version> for String {
    fn from(value: Version) -> Self {
        value.to_string()
    }
}

/// Inclusive interval over versions. An absent bound is open.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionRange {
    lower: Option<Version>,
    upper: Option<Version>,
}

impl VersionRange {
    /// Range with explicit bounds. Bounds are not checked for order here;
    /// the validator reports inverted ranges.
    pub fn new(lower: Option<Version>, upper: Option<Version>) -> Self {
        Self { lower, upper }
    }

    /// Range covering every version
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// `lower` and later
    pub fn from_version(lower: Version) -> Self {
        Self::new(Some(lower), None)
    }

    /// Exactly one version
    pub fn exactly(version: Version) -> Self {
        Self::new(Some(version.clone()), Some(version))
    }

    /// Parse the descriptor notation (see module docs)
    pub fn parse(input: &str) -> Result<Self> {
        let text = input.trim();
        if text.is_empty() || text == "*" {
            return Ok(Self::unbounded());
        }

        if let Some(lower) = text.strip_suffix('+') {
            return Ok(Self::from_version(Version::parse(lower)?));
        }

        if let Some((lower, upper)) = text.split_once('/') {
            let lower = match lower.trim() {
                "" => None,
                l => Some(Version::parse(l)?),
            };
            let upper = match upper.trim() {
                "" => None,
                u => Some(Version::parse(u)?),
            };
            return Ok(Self::new(lower, upper));
        }

        Ok(Self::exactly(Version::parse(text)?))
    }

    pub fn lower(&self) -> Option<&Version> {
        self.lower.as_ref()
    }

    pub fn upper(&self) -> Option<&Version> {
        self.upper.as_ref()
    }

    /// Whether the range has an upper bound
    pub fn is_bounded_above(&self) -> bool {
        self.upper.is_some()
    }

    /// Lower bound does not exceed upper bound
    pub fn is_well_formed(&self) -> bool {
        match (&self.lower, &self.upper) {
            (Some(lower), Some(upper)) => lower <= upper,
            _ => true,
        }
    }

    /// Whether `version` lies inside the range
    pub fn contains(&self, version: &Version) -> bool {
        let above_lower = self.lower.as_ref().map_or(true, |l| l <= version);
        let below_upper = self.upper.as_ref().map_or(true, |u| version <= u);
        above_lower && below_upper
    }

    /// Whether every version of `other` lies inside this range
    pub fn contains_range(&self, other: &VersionRange) -> bool {
        let lower_ok = match (&self.lower, &other.lower) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(mine), Some(theirs)) => mine <= theirs,
        };
        let upper_ok = match (&self.upper, &other.upper) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(mine), Some(theirs)) => theirs <= mine,
        };
        lower_ok && upper_ok
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.lower, &self.upper) {
            (None, None) => write!(f, "*"),
            (Some(l), None) => write!(f, "{}+", l),
            (None, Some(u)) => write!(f, "/{}", u),
            (Some(l), Some(u)) if l == u => write!(f, "{}", l),
            (Some(l), Some(u)) => write!(f, "{}/{}", l, u),
        }
    }
}

impl FromStr for VersionRange {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VersionRange {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<VersionRange> for String {
    fn from(value: VersionRange) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_compare_missing_segments_are_zero() {
        assert_eq!(compare_versions(&[1], &[1, 0, 0]), Ordering::Equal);
        assert_eq!(compare_versions(&[1, 0, 1], &[1]), Ordering::Greater);
        assert_eq!(compare_versions(&[1, 9], &[1, 10]), Ordering::Less);
    }

    #[test]
    fn test_version_parsing() {
        assert_eq!(v("4.0.0").segments(), &[4, 0, 0]);
        assert_eq!(v("v1.2").to_string(), "1.2");
        assert!(Version::parse("1.x").is_err());
        assert!(Version::parse("").is_err());
    }

    #[test]
    fn test_equal_versions_hash_alike() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(v("1.0"));
        assert!(set.contains(&v("1.0.0")));
    }

    #[test]
    fn test_range_notation() {
        let open = VersionRange::parse("1.0.0+").unwrap();
        assert_eq!(open.lower(), Some(&v("1.0.0")));
        assert!(open.upper().is_none());

        let closed = VersionRange::parse("1.0/2.0").unwrap();
        assert_eq!(closed.to_string(), "1.0/2.0");

        let upper_only = VersionRange::parse("/2.0").unwrap();
        assert!(upper_only.lower().is_none());
        assert!(upper_only.is_bounded_above());

        let exact = VersionRange::parse("3.0.0").unwrap();
        assert_eq!(exact.lower(), exact.upper());

        assert_eq!(VersionRange::parse("*").unwrap(), VersionRange::unbounded());
    }

    #[test]
    fn test_range_membership_is_inclusive() {
        let range = VersionRange::parse("1.0/2.0").unwrap();
        for inside in ["1.0", "1.5", "2.0", "2.0.0"] {
            assert!(range.contains(&v(inside)), "{} should be inside", inside);
        }
        for outside in ["0.9", "2.1", "2.0.1"] {
            assert!(!range.contains(&v(outside)), "{} should be outside", outside);
        }
    }

    #[test]
    fn test_well_formed() {
        assert!(VersionRange::parse("1.0/2.0").unwrap().is_well_formed());
        assert!(VersionRange::parse("2.0/2.0").unwrap().is_well_formed());
        assert!(!VersionRange::parse("2.0/1.0").unwrap().is_well_formed());
    }

    #[test]
    fn test_contains_range() {
        let model = VersionRange::parse("1.0.0+").unwrap();
        assert!(model.contains_range(&VersionRange::parse("1.0/2.0").unwrap()));
        assert!(!model.contains_range(&VersionRange::parse("0.9/2.0").unwrap()));
        assert!(!model.contains_range(&VersionRange::unbounded()));

        let bounded = VersionRange::parse("1.0/2.0").unwrap();
        assert!(!bounded.contains_range(&VersionRange::parse("1.5+").unwrap()));
        assert!(bounded.contains_range(&VersionRange::parse("1.5/2.0.0").unwrap()));
    }

    #[test]
    fn test_serde_as_string() {
        let range: VersionRange = serde_json::from_str("\"1.0.0/2.0.0\"").unwrap();
        assert_eq!(serde_json::to_string(&range).unwrap(), "\"1.0.0/2.0.0\"");
    }
}
