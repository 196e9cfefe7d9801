//! Partition-level inference from raw parent/child links.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::warn;

use crate::catalog::model::PartitionLink;
use crate::catalog::row::Oid;

/// Position of a relation in a partition hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PartitionLevel {
    /// Root: no parent, has children.
    Parent,
    /// Has a parent and children.
    Intermediate,
    /// Has a parent, no children.
    Leaf,
}

impl PartitionLevel {
    /// Single-letter code used by the legacy catalog (`p`, `i`, `l`).
    pub fn code(&self) -> char {
        match self {
            PartitionLevel::Parent => 'p',
            PartitionLevel::Intermediate => 'i',
            PartitionLevel::Leaf => 'l',
        }
    }
}

/// Derived partition attributes of one relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionLevelInfo {
    pub oid: Oid,
    pub level: PartitionLevel,
    /// Name of the root ancestor. Empty for the root itself.
    pub root_name: String,
    /// Oid of the root ancestor (the relation itself for a root).
    pub root_oid: Oid,
}

impl PartitionLevelInfo {
    pub fn is_child(&self) -> bool {
        self.level != PartitionLevel::Parent
    }
}

/// Classify every relation that appears in a partition link.
pub fn classify_partition_levels(links: &[PartitionLink]) -> HashMap<Oid, PartitionLevelInfo> {
    let parent_of: HashMap<Oid, &PartitionLink> = links.iter().map(|l| (l.oid, l)).collect();
    let has_children: HashSet<Oid> = links.iter().map(|l| l.parent_oid).collect();

    let mut result = HashMap::with_capacity(links.len() + has_children.len());

    for &oid in &has_children {
        if !parent_of.contains_key(&oid) {
            result.insert(
                oid,
                PartitionLevelInfo {
                    oid,
                    level: PartitionLevel::Parent,
                    root_name: String::new(),
                    root_oid: oid,
                },
            );
        }
    }

    for link in links {
        let level = if has_children.contains(&link.oid) {
            PartitionLevel::Intermediate
        } else {
            PartitionLevel::Leaf
        };

        // Walk up to the root. A cycle would be a corrupt catalog; stop after
        // visiting every link once.
        let mut root = link;
        let mut steps = 0;
        while let Some(&parent) = parent_of.get(&root.parent_oid) {
            root = parent;
            steps += 1;
            if steps > links.len() {
                warn!("Partition hierarchy of oid {} does not terminate", link.oid);
                break;
            }
        }

        result.insert(
            link.oid,
            PartitionLevelInfo {
                oid: link.oid,
                level,
                root_name: root.parent_name.clone(),
                root_oid: root.parent_oid,
            },
        );
    }

    result
}

/// How an external leaf partition is swapped into its hierarchy before 7.
///
/// The root's partition clause creates every leaf as a heap table, so an
/// external leaf is created under a staging name and exchanged in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PartitionExchange {
    /// Root table the `ALTER TABLE` is issued against.
    pub root_fqn: String,
    /// Partitions to descend through, root side first.
    pub path: Vec<String>,
    /// The leaf: a quoted name or `FOR (RANK(n))`.
    pub partition: String,
}

fn partition_reference(link: &PartitionLink) -> String {
    if link.partition_name.is_empty() {
        format!("FOR (RANK({}))", link.partition_rank)
    } else {
        link.partition_name.clone()
    }
}

/// Address of a leaf partition relative to its root, keyed by child oid.
pub fn external_partition_exchange(
    oid: Oid,
    parent_of: &HashMap<Oid, &PartitionLink>,
) -> Option<PartitionExchange> {
    let leaf = *parent_of.get(&oid)?;
    let mut path = Vec::new();
    let mut current = leaf;
    while let Some(&parent) = parent_of.get(&current.parent_oid) {
        path.push(partition_reference(parent));
        current = parent;
        if path.len() > parent_of.len() {
            warn!("Partition hierarchy of oid {} does not terminate", oid);
            return None;
        }
    }
    path.reverse();
    Some(PartitionExchange {
        root_fqn: current.parent_fqn(),
        path,
        partition: partition_reference(leaf),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(oid: Oid, parent_oid: Oid, parent_name: &str) -> PartitionLink {
        PartitionLink {
            oid,
            parent_oid,
            parent_schema: "public".into(),
            parent_name: parent_name.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_three_level_hierarchy() {
        // sales(1) -> sales_2024(2) -> sales_2024_q1(3), sales_2024_q2(4)
        let links = vec![
            link(2, 1, "sales"),
            link(3, 2, "sales_2024"),
            link(4, 2, "sales_2024"),
        ];
        let levels = classify_partition_levels(&links);

        assert_eq!(levels[&1].level, PartitionLevel::Parent);
        assert_eq!(levels[&1].root_name, "");
        assert_eq!(levels[&2].level, PartitionLevel::Intermediate);
        assert_eq!(levels[&2].root_name, "sales");
        assert_eq!(levels[&3].level, PartitionLevel::Leaf);
        assert_eq!(levels[&3].root_name, "sales");
        assert_eq!(levels[&4].root_oid, 1);
        assert_eq!(levels[&3].level.code(), 'l');
    }

    #[test]
    fn test_unrelated_relations_are_absent() {
        let levels = classify_partition_levels(&[link(11, 10, "rank")]);
        assert_eq!(levels.len(), 2);
        assert!(!levels.contains_key(&12));
        assert!(levels[&11].is_child());
        assert!(!levels[&10].is_child());
    }

    #[test]
    fn test_exchange_address_of_nested_leaf() {
        // sales(1) -> sales_1_prt_2024(2) -> sales_1_prt_2024_2_prt_east(3)
        let mut year = link(2, 1, "sales");
        year.partition_name = "\"2024\"".into();
        let mut east = link(3, 2, "sales_1_prt_2024");
        east.partition_rank = 2;
        let links = vec![year, east];
        let parent_of: HashMap<Oid, &PartitionLink> = links.iter().map(|l| (l.oid, l)).collect();

        let exchange = external_partition_exchange(3, &parent_of).unwrap();
        assert_eq!(exchange.root_fqn, "public.sales");
        assert_eq!(exchange.path, vec!["\"2024\""]);
        assert_eq!(exchange.partition, "FOR (RANK(2))");

        let top = external_partition_exchange(2, &parent_of).unwrap();
        assert!(top.path.is_empty());
        assert_eq!(top.partition, "\"2024\"");
        assert!(external_partition_exchange(1, &parent_of).is_none());
    }

    #[test]
    fn test_cycle_terminates() {
        let links = vec![link(1, 2, "b"), link(2, 1, "a")];
        let levels = classify_partition_levels(&links);
        assert_eq!(levels.len(), 2);
    }
}
