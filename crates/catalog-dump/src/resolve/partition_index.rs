//! Parent-before-child ordering of attachable partition indexes.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::catalog::model::IndexDefinition;
use crate::catalog::row::Oid;

/// Order indexes so every parent index precedes the indexes attached to it.
///
/// Each index's parent pointer is an edge toward the root. Starting from
/// every index in enumeration order, the walk climbs parent pointers pushing
/// unvisited indexes onto a stack, then pops the stack so the output runs
/// root to leaf. Each index is visited once across the whole call. Indexes
/// that are not attached to a parent keep their relative enumeration order.
///
/// A parent pointer to an index that is not in the input is dropped with a
/// warning; the index itself is kept.
pub fn sort_partition_indexes(indexes: Vec<IndexDefinition>) -> Vec<IndexDefinition> {
    let order: Vec<Oid> = indexes.iter().map(|i| i.oid).collect();
    let fqns: HashMap<Oid, String> = indexes.iter().map(|i| (i.oid, i.fqn())).collect();
    let mut by_oid: HashMap<Oid, IndexDefinition> =
        indexes.into_iter().map(|i| (i.oid, i)).collect();

    for index in by_oid.values_mut() {
        if index.parent_index != 0 && !fqns.contains_key(&index.parent_index) {
            warn!(
                "Parent index {} of index '{}' on table '{}.{}' not found; index will not be attached",
                index.parent_index, index.name, index.owning_schema, index.owning_table
            );
            index.parent_index = 0;
        }
    }

    let mut visited: HashSet<Oid> = HashSet::with_capacity(order.len());
    let mut stack: Vec<Oid> = Vec::new();
    let mut sorted = Vec::with_capacity(order.len());

    for oid in order {
        let mut current = oid;
        while visited.insert(current) {
            stack.push(current);
            match by_oid.get(&current).map(|i| i.parent_index) {
                Some(parent) if parent != 0 => current = parent,
                _ => break,
            }
        }

        while let Some(popped) = stack.pop() {
            if let Some(mut index) = by_oid.remove(&popped) {
                if index.parent_index != 0 {
                    index.parent_index_fqn = fqns.get(&index.parent_index).cloned();
                }
                sorted.push(index);
            }
        }
        // `stack` is empty again and keeps its allocation for the next root.
    }

    sorted
}
