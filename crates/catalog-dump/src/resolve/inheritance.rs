//! Table inheritance resolution and parent-first ordering.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::catalog::model::{InheritanceLink, Relation};
use crate::catalog::row::Oid;

/// Direct parents of each relation in the working set, in `inhseqno` order.
///
/// Links whose child is outside the working set are ignored. A parent that
/// is not part of the working set degrades to no link, with a warning.
pub fn resolve_table_inheritance(
    links: &[InheritanceLink],
    working_set: &HashSet<Oid>,
) -> HashMap<Oid, Vec<String>> {
    let mut parents: HashMap<Oid, Vec<String>> = HashMap::new();
    for link in links {
        if !working_set.contains(&link.oid) {
            continue;
        }
        if !working_set.contains(&link.parent_oid) {
            warn!(
                "Parent table {} of relation {} is not part of the backup; INHERITS link dropped",
                link.parent_fqn, link.oid
            );
            continue;
        }
        parents.entry(link.oid).or_default().push(link.parent_fqn.clone());
    }
    parents
}

/// Order relations so inherited parents precede their children.
///
/// Relations with no in-set parents keep their enumeration order.
pub fn sort_relations_by_inheritance(
    relations: Vec<Relation>,
    links: &[InheritanceLink],
) -> Vec<Relation> {
    let in_set: HashSet<Oid> = relations.iter().map(|r| r.oid).collect();
    let mut parents: HashMap<Oid, Vec<Oid>> = HashMap::new();
    for link in links {
        if in_set.contains(&link.oid) && in_set.contains(&link.parent_oid) {
            parents.entry(link.oid).or_default().push(link.parent_oid);
        }
    }

    let order: Vec<Oid> = relations.iter().map(|r| r.oid).collect();
    let mut by_oid: HashMap<Oid, Relation> = relations.into_iter().map(|r| (r.oid, r)).collect();
    let mut placed: Vec<Oid> = Vec::with_capacity(order.len());
    let mut done: HashSet<Oid> = HashSet::with_capacity(order.len());
    let mut in_progress: HashSet<Oid> = HashSet::new();

    for oid in order {
        visit(oid, &parents, &mut done, &mut in_progress, &mut placed);
    }

    placed
        .into_iter()
        .filter_map(|oid| by_oid.remove(&oid))
        .collect()
}

fn visit(
    oid: Oid,
    parents: &HashMap<Oid, Vec<Oid>>,
    done: &mut HashSet<Oid>,
    in_progress: &mut HashSet<Oid>,
    placed: &mut Vec<Oid>,
) {
    if done.contains(&oid) || !in_progress.insert(oid) {
        return;
    }
    for &parent in parents.get(&oid).map(Vec::as_slice).unwrap_or_default() {
        visit(parent, parents, done, in_progress, placed);
    }
    in_progress.remove(&oid);
    done.insert(oid);
    placed.push(oid);
}
