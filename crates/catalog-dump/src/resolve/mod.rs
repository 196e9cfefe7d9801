//! Dependency resolution: orders records that reference each other.

pub mod inheritance;
pub mod partition_index;
pub mod sequence_owner;
pub mod working_set;

pub use inheritance::{resolve_table_inheritance, sort_relations_by_inheritance};
pub use partition_index::sort_partition_indexes;
pub use sequence_owner::{resolve_sequence_owners, SequenceOwnership};
pub use working_set::select_working_set;
