// This file is dual licensed under the terms of the Apache License, Version
// 2.0, and the BSD License. See the LICENSE file in the root of this repository
// for complete details.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::errors::SemverError;

type Result<T, E = SemverError> = core::result::Result<T, E>;

/// The primary numeric segments of a version, most significant first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Major,
    Minor,
    Patch,
}

impl Segment {
    pub(crate) const ALL: [Segment; 3] = [Segment::Major, Segment::Minor, Segment::Patch];
}

/// A version `major.minor.patch[-build]`. Missing numeric components parse
/// as 0 and flip the `partial` flag, which range parsing uses to decide how
/// tightly a literal was meant to bind.
#[derive(Debug, Clone, Default)]
pub struct Version {
    major: u64,
    minor: u64,
    patch: u64,
    build: String,
    partial: bool,
}

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Version {
        Version {
            major,
            minor,
            patch,
            build: String::new(),
            partial: false,
        }
    }

    pub fn with_build<S: Into<String>>(mut self, build: S) -> Version {
        self.build = build.into();
        self
    }

    pub fn parse(value: &str) -> Result<Version> {
        Version::from_str(value)
    }

    pub fn major(&self) -> u64 {
        self.major
    }

    pub fn minor(&self) -> u64 {
        self.minor
    }

    pub fn patch(&self) -> u64 {
        self.patch
    }

    pub fn build(&self) -> &str {
        &self.build
    }

    pub fn is_partial(&self) -> bool {
        self.partial
    }

    pub(crate) fn segment(&self, segment: Segment) -> u64 {
        match segment {
            Segment::Major => self.major,
            Segment::Minor => self.minor,
            Segment::Patch => self.patch,
        }
    }

    pub(crate) fn segment_mut(&mut self, segment: Segment) -> &mut u64 {
        match segment {
            Segment::Major => &mut self.major,
            Segment::Minor => &mut self.minor,
            Segment::Patch => &mut self.patch,
        }
    }

    /// Increment `segment`, zeroing everything below it. The build tag
    /// carries over untouched.
    pub(crate) fn bumped(&self, segment: Segment) -> Version {
        let mut next = self.clone();
        let position = Segment::ALL
            .iter()
            .position(|s| *s == segment)
            .expect("segment is one of the three primaries");
        for lower in &Segment::ALL[position + 1..] {
            *next.segment_mut(*lower) = 0;
        }
        *next.segment_mut(segment) += 1;
        next.partial = false;
        next
    }

    fn key(&self) -> (u64, u64, u64, &str) {
        (self.major, self.minor, self.patch, self.build.as_str())
    }
}

impl FromStr for Version {
    type Err = SemverError;

    fn from_str(value: &str) -> Result<Self> {
        let literal = value;
        let value = value.trim_start().trim_start_matches(&['=', 'v'][..]);
        let (primary, build) = match value.split_once('-') {
            Some((primary, build)) => (primary, build),
            None => (value, ""),
        };

        // Up to three dot-separated components; anything further is ignored.
        let mut parts = primary.split('.');
        let major = numeric(parts.next().unwrap_or(""), literal)?;
        let minor = parts.next().map(|p| numeric(p, literal)).transpose()?;
        let patch = parts.next().map(|p| numeric(p, literal)).transpose()?;

        let mut version = Version::new(major, minor.unwrap_or(0), patch.unwrap_or(0));
        version.partial = minor.is_none() || patch.is_none();
        version.build = build.to_string();
        Ok(version)
    }
}

fn numeric(part: &str, literal: &str) -> Result<u64> {
    part.parse().map_err(|_| SemverError::VersionParse {
        literal: literal.to_string(),
    })
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.build.is_empty() {
            write!(f, "-{}", self.build)?;
        }
        Ok(())
    }
}

// Equality and ordering are over the printed form, so the `partial` marker
// never separates two versions. The build tag compares as one plain string,
// which puts a tagged version after its untagged triple.
impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_versions() {
        let version = Version::parse("1.2.3").unwrap();
        assert_eq!(version.major(), 1);
        assert_eq!(version.minor(), 2);
        assert_eq!(version.patch(), 3);
        assert_eq!(version.build(), "");
        assert!(!version.is_partial());
    }

    #[test]
    fn parses_prefixes() {
        assert_eq!(Version::parse("v1.2.3").unwrap(), Version::new(1, 2, 3));
        assert_eq!(Version::parse("=1.2.3").unwrap(), Version::new(1, 2, 3));
        assert_eq!(Version::parse("  =v1.2.3").unwrap(), Version::new(1, 2, 3));
    }

    #[test]
    fn parses_partials() {
        let version = Version::parse("=1.2").unwrap();
        assert_eq!(version, Version::new(1, 2, 0));
        assert!(version.is_partial());

        let version = Version::parse("1").unwrap();
        assert_eq!(version, Version::new(1, 0, 0));
        assert!(version.is_partial());
    }

    #[test]
    fn parses_builds() {
        let version = Version::parse("1.2.3-abc").unwrap();
        assert_eq!(version.build(), "abc");

        // Everything after the first dash belongs to the build.
        let version = Version::parse("1.2.3-4.5.6").unwrap();
        assert_eq!(version.build(), "4.5.6");
    }

    #[test]
    fn rejects_non_numeric_components() {
        assert!(Version::parse("a.b.c").is_err());
        assert!(Version::parse("1.2.x3").is_err());
        assert!(Version::parse("").is_err());
    }

    #[test]
    fn display_round_trips() {
        for literal in ["1.2.3", "v1.2.3", "=1.2", "0.0.1-alpha", "3", "1.2.3-4.5.6"] {
            let version = Version::parse(literal).unwrap();
            let reparsed = Version::parse(&version.to_string()).unwrap();
            assert_eq!(version, reparsed, "{literal}");
        }
    }

    #[test]
    fn orders_numerically_then_by_build() {
        assert!(Version::parse("1.2.3").unwrap() < Version::parse("1.2.10").unwrap());
        assert!(Version::parse("1.9.0").unwrap() < Version::parse("2.0.0").unwrap());
        assert!(Version::parse("2.0.0").unwrap() > Version::parse("1.999.999").unwrap());

        // A build tag sorts after the bare triple.
        assert!(Version::parse("1.2.3-alpha").unwrap() > Version::parse("1.2.3").unwrap());
        assert!(Version::parse("1.2.3-alpha").unwrap() < Version::parse("1.2.3-beta").unwrap());
    }

    #[test]
    fn order_is_total() {
        let a = Version::parse("1.2.3").unwrap();
        let b = Version::parse("1.2.4").unwrap();
        assert_eq!((a < b, a == b, a > b), (true, false, false));

        let c = Version::parse("=1.2.4").unwrap();
        assert_eq!((b < c, b == c, b > c), (false, true, false));
    }

    #[test]
    fn bumps_zero_out_lower_segments() {
        let version = Version::parse("1.2.3").unwrap();
        assert_eq!(version.bumped(Segment::Major), Version::new(2, 0, 0));
        assert_eq!(version.bumped(Segment::Minor), Version::new(1, 3, 0));
        assert_eq!(version.bumped(Segment::Patch), Version::new(1, 2, 4));
    }

    #[test]
    fn bumps_keep_the_build() {
        let version = Version::parse("1.2.3-beta").unwrap();
        assert_eq!(
            version.bumped(Segment::Minor),
            Version::new(1, 3, 0).with_build("beta")
        );
    }
}
