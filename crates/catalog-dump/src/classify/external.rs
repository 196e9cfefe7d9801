//! External-table type and protocol inference.
//!
//! The catalog does not record whether an external table is a web table or
//! which protocol it speaks; both are reconstructed from the first location
//! URI and the writable flag, the same way the server rebuilds its own DDL.

use std::fmt;

use crate::catalog::model::ExternalTableDefinition;

/// Readable/writable and plain/web combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExternalTableType {
    Readable,
    ReadableWeb,
    Writable,
    WritableWeb,
}

impl ExternalTableType {
    /// Keyword used in `CREATE <keyword> TABLE`.
    pub fn keyword(&self) -> &'static str {
        match self {
            ExternalTableType::Readable => "READABLE EXTERNAL",
            ExternalTableType::ReadableWeb => "READABLE EXTERNAL WEB",
            ExternalTableType::Writable => "WRITABLE EXTERNAL",
            ExternalTableType::WritableWeb => "WRITABLE EXTERNAL WEB",
        }
    }

    pub fn is_readable(&self) -> bool {
        matches!(
            self,
            ExternalTableType::Readable | ExternalTableType::ReadableWeb
        )
    }

    pub fn is_web(&self) -> bool {
        matches!(
            self,
            ExternalTableType::ReadableWeb | ExternalTableType::WritableWeb
        )
    }
}

/// Protocol an external table reads or writes through.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExternalProtocol {
    File,
    Gpfdist,
    Gphdfs,
    Http,
    S3,
    /// A user-defined protocol, by scheme. Empty when the location has no scheme.
    Custom(String),
}

impl ExternalProtocol {
    /// Map a URI scheme to a protocol.
    pub fn from_scheme(scheme: &str) -> Self {
        match scheme {
            "file" => ExternalProtocol::File,
            "gpfdist" | "gpfdists" => ExternalProtocol::Gpfdist,
            "gphdfs" => ExternalProtocol::Gphdfs,
            "http" | "https" => ExternalProtocol::Http,
            "s3" => ExternalProtocol::S3,
            other => ExternalProtocol::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for ExternalProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExternalProtocol::File => f.write_str("file"),
            ExternalProtocol::Gpfdist => f.write_str("gpfdist"),
            ExternalProtocol::Gphdfs => f.write_str("gphdfs"),
            ExternalProtocol::Http => f.write_str("http"),
            ExternalProtocol::S3 => f.write_str("s3"),
            ExternalProtocol::Custom(scheme) => write!(f, "custom({})", scheme),
        }
    }
}

/// Derive (type, protocol) from a location and the writable flag.
///
/// An empty location means an EXECUTE web table, which is classified as HTTP.
pub fn determine_external_table_characteristics(
    location: &str,
    writable: bool,
) -> (ExternalTableType, ExternalProtocol) {
    if location.is_empty() {
        let table_type = if writable {
            ExternalTableType::WritableWeb
        } else {
            ExternalTableType::ReadableWeb
        };
        return (table_type, ExternalProtocol::Http);
    }

    let is_web = location.starts_with("http");
    let table_type = match (is_web, writable) {
        (true, true) => ExternalTableType::WritableWeb,
        (true, false) => ExternalTableType::ReadableWeb,
        (false, true) => ExternalTableType::Writable,
        (false, false) => ExternalTableType::Readable,
    };
    let protocol = match location.find("://") {
        Some(idx) => ExternalProtocol::from_scheme(&location[..idx]),
        None => ExternalProtocol::Custom(String::new()),
    };
    (table_type, protocol)
}

/// Classify a fetched external table definition.
pub fn classify_external_table(def: &ExternalTableDefinition) -> (ExternalTableType, ExternalProtocol) {
    determine_external_table_characteristics(&def.location, def.writable)
}
