//! Pure functions deriving attributes the catalog does not store directly.

pub mod acl;
pub mod external;
pub mod implicit_index;
pub mod partition;

pub use acl::{parse_acl, parse_acl_list, Acl, Privilege};
pub use external::{
    classify_external_table, determine_external_table_characteristics, ExternalProtocol,
    ExternalTableType,
};
pub use implicit_index::{implicit_index_name, implicit_index_names, ConstraintColumn};
pub use partition::{
    classify_partition_levels, external_partition_exchange, PartitionExchange, PartitionLevel,
    PartitionLevelInfo,
};
