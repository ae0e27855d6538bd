// This file is dual licensed under the terms of the Apache License, Version
// 2.0, and the BSD License. See the LICENSE file in the root of this repository
// for complete details.

//! The version algebra, modeled on npm-style semver ranges.
//!
//! A [`Version`] is the basis of every operation. A [`Comparator`] pairs an
//! operator with a version, and a [`VersionRange`] bounds a contiguous set of
//! versions with a lower comparator and an optional upper one. The five range
//! spellings (plain, hyphen, x-range, tilde, caret) all collapse to that one
//! normal form at parse time.

mod comparator;
mod range;
mod version;

pub use comparator::{Comparator, Op};
pub use range::VersionRange;
pub use version::{Segment, Version};
