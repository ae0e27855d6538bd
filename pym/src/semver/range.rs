// This file is dual licensed under the terms of the Apache License, Version
// 2.0, and the BSD License. See the LICENSE file in the root of this repository
// for complete details.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::errors::SemverError;
use crate::semver::{Comparator, Op, Segment, Version};

type Result<T, E = SemverError> = core::result::Result<T, E>;

/// A contiguous set of versions bounded by a lower comparator and an
/// optional upper one. All five range spellings parse into this form; after
/// an intersection the `lower` slot may also hold a lone upper bound, which
/// changes nothing about how containment reads.
#[derive(Debug, Clone)]
pub struct VersionRange {
    lower: Comparator,
    upper: Option<Comparator>,
}

impl VersionRange {
    pub fn new(lower: Comparator, upper: Option<Comparator>) -> VersionRange {
        VersionRange { lower, upper }
    }

    pub fn parse(value: &str) -> Result<VersionRange> {
        VersionRange::from_str(value)
    }

    pub fn lower(&self) -> &Comparator {
        &self.lower
    }

    pub fn upper(&self) -> Option<&Comparator> {
        self.upper.as_ref()
    }

    pub fn contains(&self, version: &Version) -> bool {
        self.lower.satisfies(version)
            && self
                .upper
                .as_ref()
                .map_or(true, |upper| upper.satisfies(version))
    }

    /// The tightest range allowed by both sides, or `None` when they do not
    /// overlap.
    pub fn intersection(&self, other: &VersionRange) -> Option<VersionRange> {
        VersionRange::reduce(self.comparators().chain(other.comparators()))
    }

    fn comparators(&self) -> impl Iterator<Item = &Comparator> {
        std::iter::once(&self.lower).chain(self.upper.iter())
    }

    /// Collapse any number of comparators into the tightest consistent pair.
    ///
    /// An equality pin wins outright when every other comparator admits its
    /// version. Otherwise the tightest lower bound and the tightest upper
    /// bound survive, and the pair must admit each other's versions or the
    /// set is empty.
    pub(crate) fn reduce<'c>(
        comparators: impl IntoIterator<Item = &'c Comparator>,
    ) -> Option<VersionRange> {
        let mut all: Vec<&Comparator> = Vec::new();
        let mut pin: Option<&Comparator> = None;
        let mut lower: Option<&Comparator> = None;
        let mut upper: Option<&Comparator> = None;

        for comparator in comparators {
            all.push(comparator);
            match comparator.op().direction() {
                0 => match pin {
                    // Two pins at different versions can never agree.
                    Some(prior) if prior.version() != comparator.version() => return None,
                    Some(_) => {}
                    None => pin = Some(comparator),
                },
                d if d > 0 => lower = Some(tighter(lower, comparator)),
                _ => upper = Some(tighter(upper, comparator)),
            }
        }

        if let Some(pin) = pin {
            if all.iter().all(|c| c.satisfies(pin.version())) {
                let exact = Comparator::new(Op::Eq, pin.version().clone());
                return Some(VersionRange::new(exact, None));
            }
            return None;
        }

        match (lower, upper) {
            (Some(lower), Some(upper)) => {
                if lower.satisfies(upper.version()) && upper.satisfies(lower.version()) {
                    Some(VersionRange::new(lower.clone(), Some(upper.clone())))
                } else {
                    None
                }
            }
            (Some(bound), None) | (None, Some(bound)) => {
                Some(VersionRange::new(bound.clone(), None))
            }
            (None, None) => None,
        }
    }
}

/// Of two bounds pointing the same way, the one that admits fewer versions:
/// the larger lower bound, the smaller upper bound, the strict operator on a
/// version tie.
fn tighter<'c>(current: Option<&'c Comparator>, candidate: &'c Comparator) -> &'c Comparator {
    let current = match current {
        Some(current) => current,
        None => return candidate,
    };

    match candidate.version().cmp(current.version()) {
        Ordering::Equal => {
            if candidate.op().is_strict() && !current.op().is_strict() {
                candidate
            } else {
                current
            }
        }
        ordering => {
            let wants = if candidate.op().direction() > 0 {
                Ordering::Greater
            } else {
                Ordering::Less
            };
            if ordering == wants {
                candidate
            } else {
                current
            }
        }
    }
}

impl FromStr for VersionRange {
    type Err = SemverError;

    fn from_str(value: &str) -> Result<Self> {
        let value = value.trim();
        if value.contains(" - ") {
            return parse_hyphen(value);
        }
        if value.contains(' ') {
            return parse_pair(value);
        }
        if value
            .split('.')
            .any(|segment| matches!(segment, "*" | "x" | "X"))
        {
            return parse_x(value);
        }
        if let Some(rest) = value.strip_prefix('~') {
            return parse_tilde(rest);
        }
        if let Some(rest) = value.strip_prefix('^') {
            return parse_caret(rest);
        }
        parse_plain(value)
    }
}

/// `A - B` allows everything from A up to B, where a partial B excludes the
/// versions it never spelled out.
fn parse_hyphen(value: &str) -> Result<VersionRange> {
    let (lower, upper) = value.split_once(" - ").ok_or_else(|| range_error(value))?;
    let lower = Comparator::new(Op::Ge, lower.parse()?);
    let bound: Version = upper.parse()?;
    let op = if bound.is_partial() { Op::Lt } else { Op::Le };
    Ok(VersionRange::new(lower, Some(Comparator::new(op, bound))))
}

/// Two explicit comparators separated by a space, e.g. `>=1.0.0 <2.0.0`.
fn parse_pair(value: &str) -> Result<VersionRange> {
    let (lower, upper) = value.split_once(' ').ok_or_else(|| range_error(value))?;
    Ok(VersionRange::new(
        lower.parse()?,
        Some(upper.parse()?),
    ))
}

/// `1.2.x` style: the named prefix fixes the floor, the wildcard segment
/// bumps the segment above it for the ceiling. A bare `*` is unbounded.
fn parse_x(value: &str) -> Result<VersionRange> {
    let mut floor = Version::new(0, 0, 0);
    let mut ceiling = Version::new(0, 0, 0);
    let mut previous: Option<Segment> = None;
    let mut segments = Segment::ALL.iter();

    for piece in value.split('.') {
        if matches!(piece, "*" | "x" | "X") {
            let upper = previous.map(|segment| {
                *ceiling.segment_mut(segment) += 1;
                Comparator::new(Op::Lt, ceiling.clone())
            });
            return Ok(VersionRange::new(
                Comparator::new(Op::Ge, floor),
                upper,
            ));
        }

        let segment = *segments.next().ok_or_else(|| range_error(value))?;
        let piece: u64 = piece.parse().map_err(|_| range_error(value))?;
        *floor.segment_mut(segment) = piece;
        *ceiling.segment_mut(segment) = piece;
        previous = Some(segment);
    }

    Err(range_error(value))
}

/// `~A` allows patch (and minor, when A names neither) drift above A.
fn parse_tilde(value: &str) -> Result<VersionRange> {
    let floor: Version = value.parse()?;
    let ceiling = if floor.minor() != 0 || floor.patch() != 0 {
        floor.bumped(Segment::Minor)
    } else {
        floor.bumped(Segment::Major)
    };
    Ok(VersionRange::new(
        Comparator::new(Op::Ge, floor),
        Some(Comparator::new(Op::Lt, ceiling)),
    ))
}

/// `^A` allows everything up to the next bump of A's first non-zero segment.
fn parse_caret(value: &str) -> Result<VersionRange> {
    let floor: Version = value.parse()?;
    let mut ceiling = Version::new(0, 0, 0);
    for segment in Segment::ALL {
        if floor.segment(segment) != 0 {
            *ceiling.segment_mut(segment) = floor.segment(segment) + 1;
            break;
        }
    }
    Ok(VersionRange::new(
        Comparator::new(Op::Ge, floor),
        Some(Comparator::new(Op::Lt, ceiling)),
    ))
}

/// A single comparator. Plain equality closes the range onto itself; any
/// other operator leaves the far side open.
fn parse_plain(value: &str) -> Result<VersionRange> {
    let lower: Comparator = value.parse()?;
    let upper = match lower.op() {
        Op::Eq => Some(lower.clone()),
        _ => None,
    };
    Ok(VersionRange::new(lower, upper))
}

fn range_error(value: &str) -> SemverError {
    SemverError::RangeParse {
        literal: value.to_string(),
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.lower)?;
        if let Some(upper) = &self.upper {
            if *upper != self.lower {
                write!(f, " {}", upper)?;
            }
        }
        Ok(())
    }
}

// An equality pin is the same set whether the upper slot repeats it or is
// left off, so comparison normalizes that case.
impl PartialEq for VersionRange {
    fn eq(&self, other: &Self) -> bool {
        fn effective_upper(range: &VersionRange) -> Option<&Comparator> {
            match &range.upper {
                Some(upper) => Some(upper),
                None if range.lower.op() == Op::Eq => Some(&range.lower),
                None => None,
            }
        }

        self.lower == other.lower && effective_upper(self) == effective_upper(other)
    }
}

impl Eq for VersionRange {}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(literal: &str) -> VersionRange {
        VersionRange::parse(literal).unwrap()
    }

    fn version(literal: &str) -> Version {
        Version::parse(literal).unwrap()
    }

    #[test]
    fn plain_equality_closes_the_range() {
        let r = range("1.2.3");
        assert_eq!(r.lower(), &Comparator::new(Op::Eq, version("1.2.3")));
        assert!(r.contains(&version("1.2.3")));
        assert!(!r.contains(&version("1.2.4")));
    }

    #[test]
    fn plain_comparator_leaves_the_far_side_open() {
        let r = range(">=1.2.3");
        assert!(r.upper().is_none());
        assert!(r.contains(&version("99.0.0")));
        assert!(!r.contains(&version("1.2.2")));
    }

    #[test]
    fn hyphen_bounds_both_sides() {
        let r = range("1.2.3 - 4.5.6");
        assert_eq!(r.lower(), &Comparator::new(Op::Ge, version("1.2.3")));
        assert_eq!(r.upper(), Some(&Comparator::new(Op::Le, version("4.5.6"))));
        assert!(r.contains(&version("4.5.6")));
    }

    #[test]
    fn hyphen_with_partial_upper_is_exclusive() {
        let r = range("1.2.3 - 4.5");
        let upper = r.upper().unwrap();
        assert_eq!(upper.op(), Op::Lt);
        assert_eq!(upper.version(), &version("4.5.0"));
        assert!(!r.contains(&version("4.5.0")));
        assert!(r.contains(&version("4.4.9")));
    }

    #[test]
    fn pair_of_comparators() {
        let r = range(">=1.0.0 <2.0.0");
        assert!(r.contains(&version("1.0.0")));
        assert!(r.contains(&version("1.999.0")));
        assert!(!r.contains(&version("2.0.0")));
    }

    #[test]
    fn x_range_pins_the_prefix() {
        let r = range("1.2.x");
        assert!(r.contains(&version("1.2.0")));
        assert!(r.contains(&version("1.2.999")));
        assert!(!r.contains(&version("1.3.0")));

        let r = range("1.X");
        assert!(r.contains(&version("1.0.0")));
        assert!(r.contains(&version("1.999.999")));
        assert!(!r.contains(&version("2.0.0")));
    }

    #[test]
    fn bare_star_is_unbounded() {
        let r = range("*");
        assert!(r.upper().is_none());
        assert!(r.contains(&version("0.0.0")));
        assert!(r.contains(&version("999.999.999")));
    }

    #[test]
    fn tilde_allows_patch_drift() {
        let r = range("~1.2.3");
        assert!(r.contains(&version("1.2.3")));
        assert!(r.contains(&version("1.2.99")));
        assert!(!r.contains(&version("1.3.0")));
    }

    #[test]
    fn tilde_on_a_bare_major_allows_minor_drift() {
        let r = range("~1");
        assert!(r.contains(&version("1.99.0")));
        assert!(!r.contains(&version("2.0.0")));
    }

    #[test]
    fn caret_bumps_the_first_nonzero_segment() {
        let r = range("^1.2.3");
        assert_eq!(r.lower(), &Comparator::new(Op::Ge, version("1.2.3")));
        assert_eq!(r.upper(), Some(&Comparator::new(Op::Lt, version("2.0.0"))));

        let r = range("^0.2.3");
        assert_eq!(r.upper(), Some(&Comparator::new(Op::Lt, version("0.3.0"))));

        let r = range("^0.0.3");
        assert_eq!(r.upper(), Some(&Comparator::new(Op::Lt, version("0.0.4"))));
    }

    #[test]
    fn rejects_garbage() {
        assert!(VersionRange::parse("not a range at all").is_err());
        assert!(VersionRange::parse("^oops").is_err());
        assert!(VersionRange::parse("1.y.x").is_err());
        assert!(VersionRange::parse("1.2.3.4.x").is_err());
    }

    #[test]
    fn wildcard_after_a_full_triple_still_parses() {
        let r = range("1.2.3.x");
        assert!(r.contains(&version("1.2.3")));
        assert!(!r.contains(&version("1.2.4")));
    }

    #[test]
    fn containment_matches_the_bounds() {
        let r = range(">=1.0.0 <2.0.0");
        for literal in ["0.9.9", "1.0.0", "1.5.0", "2.0.0", "2.0.1"] {
            let v = version(literal);
            let expected = r.lower().satisfies(&v)
                && r.upper().map_or(true, |upper| upper.satisfies(&v));
            assert_eq!(r.contains(&v), expected, "{literal}");
        }
    }

    #[test]
    fn intersection_tightens_both_sides() {
        let r = range(">=1.0.0 <3.0.0")
            .intersection(&range(">=1.5.0 <2.0.0"))
            .unwrap();
        assert!(!r.contains(&version("1.4.9")));
        assert!(r.contains(&version("1.5.0")));
        assert!(!r.contains(&version("2.0.0")));
    }

    #[test]
    fn intersection_of_disjoint_ranges_is_empty() {
        assert!(range(">=2.0.0").intersection(&range("<1.0.0")).is_none());
        assert!(range("1.0.0").intersection(&range("2.0.0")).is_none());
    }

    #[test]
    fn intersection_with_a_pin_degenerates() {
        let r = range("1.5.0").intersection(&range(">=1.0.0 <2.0.0")).unwrap();
        assert!(r.contains(&version("1.5.0")));
        assert!(!r.contains(&version("1.5.1")));
    }

    #[test]
    fn intersection_is_idempotent() {
        for literal in ["1.2.3", "^1.2.3", "~1.2.3", ">=1.0.0 <2.0.0", "1.2.x", "*"] {
            let r = range(literal);
            assert_eq!(r.intersection(&r).unwrap(), r, "{literal}");
        }
    }

    #[test]
    fn intersection_is_commutative() {
        let pairs = [
            (">=1.0.0 <3.0.0", ">=1.5.0 <2.0.0"),
            ("^1.2.0", ">=1.0.0 <2.0.0"),
            ("1.5.0", ">=1.0.0"),
            ("~1.2.3", "1.2.x"),
        ];
        for (a, b) in pairs {
            assert_eq!(
                range(a).intersection(&range(b)),
                range(b).intersection(&range(a)),
                "{a} and {b}"
            );
        }
    }

    #[test]
    fn display_reparses_to_the_same_range() {
        for literal in ["1.2.3", "^1.2.3", "~1.2.0", ">=1.0.0 <2.0.0", "1.2.x"] {
            let r = range(literal);
            assert_eq!(range(&r.to_string()), r, "{literal}");
        }
    }
}
