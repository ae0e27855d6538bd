// This file is dual licensed under the terms of the Apache License, Version
// 2.0, and the BSD License. See the LICENSE file in the root of this repository
// for complete details.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::SemverError;
use crate::semver::{Version, VersionRange};

type Result<T, E = SemverError> = core::result::Result<T, E>;

static OPERATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(<=|<|>=|>)").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Lt,
    Le,
    Eq,
    Gt,
    Ge,
}

impl Op {
    /// -1 for the upper-bound operators, +1 for the lower-bound ones, 0 for
    /// equality. Intersection keys off this to pick the tighter side.
    pub(crate) fn direction(&self) -> i8 {
        match self {
            Op::Lt | Op::Le => -1,
            Op::Eq => 0,
            Op::Gt | Op::Ge => 1,
        }
    }

    pub(crate) fn is_strict(&self) -> bool {
        matches!(self, Op::Lt | Op::Gt)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let symbol = match self {
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Eq => "=",
            Op::Gt => ">",
            Op::Ge => ">=",
        };
        write!(f, "{}", symbol)
    }
}

/// An operator applied to a version: one half of a constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Comparator {
    op: Op,
    version: Version,
}

impl Comparator {
    pub fn new(op: Op, version: Version) -> Comparator {
        Comparator { op, version }
    }

    pub fn parse(value: &str) -> Result<Comparator> {
        Comparator::from_str(value)
    }

    pub fn op(&self) -> Op {
        self.op
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Whether `version` sits on the allowed side of this comparator.
    pub fn satisfies(&self, version: &Version) -> bool {
        match self.op {
            Op::Lt => version < &self.version,
            Op::Le => version <= &self.version,
            Op::Eq => version == &self.version,
            Op::Gt => version > &self.version,
            Op::Ge => version >= &self.version,
        }
    }

    /// The set of versions both comparators allow, or `None` when the two
    /// half-constraints rule each other out.
    pub fn intersection(&self, other: &Comparator) -> Option<VersionRange> {
        VersionRange::reduce([self, other])
    }
}

impl FromStr for Comparator {
    type Err = SemverError;

    fn from_str(value: &str) -> Result<Self> {
        match OPERATOR.captures(value) {
            Some(captures) => {
                let op = match captures.get(1).map(|m| m.as_str()) {
                    Some("<") => Op::Lt,
                    Some("<=") => Op::Le,
                    Some(">") => Op::Gt,
                    Some(">=") => Op::Ge,
                    _ => unreachable!("operator regex has exactly four alternates"),
                };
                let rest = &value[captures.get(0).map(|m| m.end()).unwrap_or(0)..];
                Ok(Comparator::new(op, rest.parse()?))
            }
            None => Ok(Comparator::new(Op::Eq, value.parse()?)),
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.op, self.version)
    }
}
