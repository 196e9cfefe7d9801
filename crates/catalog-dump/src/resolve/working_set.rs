//! Selection of the table working set.

use std::collections::{HashMap, HashSet};

use crate::catalog::filter::ObjectFilter;
use crate::catalog::model::Relation;
use crate::catalog::row::Oid;
use crate::classify::partition::{PartitionLevel, PartitionLevelInfo};

/// Reduce candidate tables to those the backup covers.
///
/// Excluded relations never survive. A partition root is kept when any
/// member of its hierarchy is requested. Children are kept when requested
/// directly, when they are external leaves of a kept root, or when leaf
/// partition data was asked for on a kept root. Candidate order is preserved.
pub fn select_working_set(
    candidates: Vec<Relation>,
    partitions: &HashMap<Oid, PartitionLevelInfo>,
    external_oids: &HashSet<Oid>,
    filter: &dyn ObjectFilter,
) -> Vec<Relation> {
    let explicitly_included = |r: &Relation| {
        filter.has_relation_includes() && filter.includes_relation(&r.schema, &r.name)
    };

    // Roots with a requested descendant.
    let mut wanted_roots: HashSet<Oid> = HashSet::new();
    for relation in &candidates {
        if let Some(info) = partitions.get(&relation.oid) {
            if info.is_child() && explicitly_included(relation) {
                wanted_roots.insert(info.root_oid);
            }
        }
    }

    let mut selected_roots: HashSet<Oid> = HashSet::new();
    let mut directly_included_roots: HashSet<Oid> = HashSet::new();
    for relation in &candidates {
        let is_root = matches!(
            partitions.get(&relation.oid).map(|i| i.level),
            Some(PartitionLevel::Parent)
        );
        if !is_root || filter.excludes_relation(&relation.schema, &relation.name) {
            continue;
        }
        if explicitly_included(relation) {
            directly_included_roots.insert(relation.oid);
        }
        if !filter.has_relation_includes()
            || explicitly_included(relation)
            || wanted_roots.contains(&relation.oid)
        {
            selected_roots.insert(relation.oid);
        }
    }

    candidates
        .into_iter()
        .filter(|relation| {
            if filter.excludes_relation(&relation.schema, &relation.name) {
                return false;
            }
            match partitions.get(&relation.oid) {
                None => filter.includes_relation(&relation.schema, &relation.name),
                Some(info) if info.level == PartitionLevel::Parent => {
                    selected_roots.contains(&relation.oid)
                }
                Some(info) => {
                    if explicitly_included(relation) {
                        return true;
                    }
                    if !selected_roots.contains(&info.root_oid) {
                        return false;
                    }
                    if external_oids.contains(&relation.oid) && info.level == PartitionLevel::Leaf
                    {
                        return true;
                    }
                    filter.leaf_partition_data()
                        && (!filter.has_relation_includes()
                            || directly_included_roots.contains(&info.root_oid))
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::filter::SchemaRelationFilter;
    use crate::catalog::model::PartitionLink;
    use crate::classify::partition::classify_partition_levels;
    use crate::config::FilterConfig;

    // 1: plain table, 2: root, 3: intermediate, 4/5: leaves of 3, 6: external leaf of 2.
    fn candidates() -> Vec<Relation> {
        vec![
            Relation::new(1, "public", "plain"),
            Relation::new(2, "public", "sales"),
            Relation::new(3, "public", "sales_1_prt_2020"),
            Relation::new(4, "public", "sales_1_prt_2020_2_prt_q1"),
            Relation::new(5, "public", "sales_1_prt_2020_2_prt_q2"),
            Relation::new(6, "public", "sales_1_prt_ext"),
        ]
    }

    fn partitions() -> HashMap<Oid, PartitionLevelInfo> {
        let link = |oid, parent_oid, parent_name: &str| PartitionLink {
            oid,
            parent_oid,
            parent_schema: "public".into(),
            parent_name: parent_name.into(),
            ..Default::default()
        };
        classify_partition_levels(&[
            link(3, 2, "sales"),
            link(4, 3, "sales_1_prt_2020"),
            link(5, 3, "sales_1_prt_2020"),
            link(6, 2, "sales"),
        ])
    }

    fn select(f: impl FnOnce(&mut FilterConfig)) -> Vec<Oid> {
        let mut config = FilterConfig::default();
        f(&mut config);
        let filter = SchemaRelationFilter::new(&config).unwrap();
        select_working_set(candidates(), &partitions(), &[6].into(), &filter)
            .into_iter()
            .map(|r| r.oid)
            .collect()
    }

    #[test]
    fn test_default_keeps_roots_and_external_leaves() {
        assert_eq!(select(|_| {}), vec![1, 2, 6]);
    }

    #[test]
    fn test_leaf_partition_data_keeps_children() {
        assert_eq!(select(|c| c.leaf_partition_data = true), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_included_leaf_pulls_in_root() {
        let oids = select(|c| c.include_relations = vec!["public.sales_1_prt_2020_2_prt_q1".into()]);
        assert_eq!(oids, vec![2, 4, 6]);
    }

    #[test]
    fn test_included_root_with_leaf_data() {
        let oids = select(|c| {
            c.include_relations = vec!["public.sales".into()];
            c.leaf_partition_data = true;
        });
        assert_eq!(oids, vec![2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_leaf_data_does_not_widen_leaf_include() {
        let oids = select(|c| {
            c.include_relations = vec!["public.sales_1_prt_2020_2_prt_q2".into()];
            c.leaf_partition_data = true;
        });
        assert_eq!(oids, vec![2, 5, 6]);
    }

    #[test]
    fn test_excluded_relations_dropped() {
        let oids = select(|c| c.exclude_relations = vec!["public.plain".into(), "public.sales".into()]);
        assert!(oids.is_empty());
    }
}
