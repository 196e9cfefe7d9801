//! Sequence ownership (`OWNED BY`) resolution.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::catalog::model::SequenceOwnerRow;
use crate::catalog::row::Oid;
use crate::ident::make_fqn;

/// Owning table and column per sequence FQN.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceOwnership {
    /// Sequence FQN to owning table FQN.
    pub tables: HashMap<String, String>,
    /// Sequence FQN to owning `schema.table.column`.
    pub columns: HashMap<String, String>,
}

impl SequenceOwnership {
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }
}

/// Keep ownership links whose owning table is part of the working set.
///
/// A sequence owned by an excluded table becomes ownerless; whether the
/// sequence itself is dumped is decided separately.
pub fn resolve_sequence_owners(
    rows: &[SequenceOwnerRow],
    working_set: &HashSet<Oid>,
) -> SequenceOwnership {
    let mut ownership = SequenceOwnership::default();
    for row in rows {
        let sequence = row.sequence_fqn();
        if !working_set.contains(&row.table_oid) {
            debug!(
                "Owner {} of sequence {} is not part of the backup; ownership dropped",
                row.table_fqn(),
                sequence
            );
            continue;
        }
        ownership.tables.insert(sequence.clone(), row.table_fqn());
        ownership
            .columns
            .insert(sequence, make_fqn(&row.table_fqn(), &row.column_name));
    }
    ownership
}
