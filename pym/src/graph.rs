// This file is dual licensed under the terms of the Apache License, Version
// 2.0, and the BSD License. See the LICENSE file in the root of this repository
// for complete details.

use indexmap::IndexMap;
use log::debug;

use crate::errors::GraphError;
use crate::semver::VersionRange;

const LOGNAME: &str = "pym::graph";

type Result<T, E = GraphError> = core::result::Result<T, E>;

/// Accumulates every range requested for each package name, then folds each
/// list into the one range that satisfies all of them.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    ranges: IndexMap<String, Vec<VersionRange>>,
}

impl DependencyGraph {
    pub fn new() -> DependencyGraph {
        DependencyGraph::default()
    }

    pub fn add(&mut self, name: &str, range: &str) -> Result<()> {
        let range: VersionRange = range.parse().map_err(GraphError::Semver)?;
        self.ranges.entry(name.to_string()).or_default().push(range);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Left-fold the intersection over each name's ranges. A fold that
    /// empties out means two packages asked for versions that cannot
    /// coexist, which ends the whole command.
    pub fn resolve(&self) -> Result<IndexMap<String, VersionRange>> {
        let mut resolved = IndexMap::new();
        for (name, ranges) in &self.ranges {
            let mut iter = ranges.iter();
            // add() never stores an empty list, so the first range is there.
            let mut folded = iter.next().expect("name holds at least one range").clone();
            for range in iter {
                folded = folded
                    .intersection(range)
                    .ok_or_else(|| GraphError::Unsatisfiable { name: name.clone() })?;
            }
            debug!(target: LOGNAME, "resolved {} to {}", name, folded);
            resolved.insert(name.clone(), folded);
        }
        Ok(resolved)
    }
}
