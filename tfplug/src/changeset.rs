//! ChangeSet - the set of attribute paths that differ between two states
//!
//! The engine computes a ChangeSet once per update from the prior state and
//! the planned state and hands it to the resource. Paths are dotted names:
//! `port` for a top-level attribute, `ssl` and `ssl.ocsp_enable` for a field
//! inside a single-instance block. A changed inner field always marks its
//! containing block too.

use crate::types::{Dynamic, DynamicValue};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    paths: BTreeSet<String>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from explicit paths; parents of nested paths are added as well
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for path in paths {
            set.mark(path.as_ref());
        }
        set
    }

    /// Diff two root objects
    pub fn between(prior: &DynamicValue, planned: &DynamicValue) -> Self {
        let mut set = Self::new();
        let empty = HashMap::new();
        let prior_map = prior.root_map().unwrap_or(&empty);
        let planned_map = planned.root_map().unwrap_or(&empty);
        diff_maps(&mut set, None, prior_map, planned_map);
        tracing::debug!(changed = ?set.paths, "computed change set");
        set
    }

    pub fn mark(&mut self, path: &str) {
        let mut prefix = String::new();
        for (i, part) in path.split('.').enumerate() {
            if i > 0 {
                prefix.push('.');
            }
            prefix.push_str(part);
            self.paths.insert(prefix.clone());
        }
    }

    /// True when `path` itself or anything beneath it changed
    pub fn has_change(&self, path: &str) -> bool {
        if self.paths.contains(path) {
            return true;
        }
        let nested = format!("{}.", path);
        self.paths
            .range(nested.clone()..)
            .next()
            .is_some_and(|p| p.starts_with(&nested))
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }
}

fn join(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(p) => format!("{}.{}", p, name),
        None => name.to_string(),
    }
}

fn diff_maps(
    set: &mut ChangeSet,
    prefix: Option<&str>,
    prior: &HashMap<String, Dynamic>,
    planned: &HashMap<String, Dynamic>,
) {
    let keys: BTreeSet<&String> = prior.keys().chain(planned.keys()).collect();
    for key in keys {
        let before = prior.get(key).unwrap_or(&Dynamic::Null);
        let after = planned.get(key).unwrap_or(&Dynamic::Null);
        diff_values(set, &join(prefix, key), before, after);
    }
}

fn diff_values(set: &mut ChangeSet, path: &str, before: &Dynamic, after: &Dynamic) {
    // Unknown planned values are resolved by the apply, not reported as changes
    if matches!(after, Dynamic::Unknown) || before == after {
        return;
    }
    // An empty collection and an unset attribute are the same configuration
    if is_empty_value(before) && is_empty_value(after) {
        return;
    }
    set.mark(path);

    let empty = HashMap::new();
    match (single_block(before), single_block(after)) {
        (Some(b), Some(a)) => diff_maps(set, Some(path), b, a),
        (Some(b), None) if after.is_absent() => diff_maps(set, Some(path), b, &empty),
        (None, Some(a)) if before.is_absent() => diff_maps(set, Some(path), &empty, a),
        _ => {}
    }
}

fn is_empty_value(value: &Dynamic) -> bool {
    match value {
        Dynamic::Null => true,
        Dynamic::List(items) | Dynamic::Set(items) => items.is_empty(),
        _ => false,
    }
}

/// A single-instance block is a one-element list holding a map, or a bare map
fn single_block(value: &Dynamic) -> Option<&HashMap<String, Dynamic>> {
    match value {
        Dynamic::Map(m) => Some(m),
        Dynamic::List(items) if items.len() == 1 => items[0].as_map(),
        _ => None,
    }
}
