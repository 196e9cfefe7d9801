//! Engine version detection and query-family selection.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::client::CatalogClient;
use crate::error::{DumpError, Result};

fn version_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Greenplum Database (\d+)\.(\d+)\.(\d+)").ok())
        .as_ref()
}

/// The three catalog layouts that need distinct queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryFamily {
    Pre6,
    V6,
    V7Plus,
}

impl fmt::Display for QueryFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QueryFamily::Pre6 => "pre-6",
            QueryFamily::V6 => "6",
            QueryFamily::V7Plus => "7+",
        };
        f.write_str(s)
    }
}

/// Semantic version of the database engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EngineVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl EngineVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Extract the version from a `SELECT version()` string.
    pub fn from_version_string(version: &str) -> Result<Self> {
        let caps = version_regex()
            .and_then(|re| re.captures(version))
            .ok_or_else(|| DumpError::Version(format!("no Greenplum version in '{}'", version)))?;
        let part = |i: usize| -> Result<u32> {
            caps[i]
                .parse()
                .map_err(|_| DumpError::Version(format!("bad version component in '{}'", version)))
        };
        Ok(Self::new(part(1)?, part(2)?, part(3)?))
    }

    /// Parse a configured override such as `6.20.0` or `7`.
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = [0u32; 3];
        let pieces: Vec<&str> = s.trim().split('.').collect();
        if pieces.is_empty() || pieces.len() > 3 {
            return Err(DumpError::Version(s.to_string()));
        }
        for (slot, piece) in parts.iter_mut().zip(&pieces) {
            *slot = piece
                .parse()
                .map_err(|_| DumpError::Version(s.to_string()))?;
        }
        Ok(Self::new(parts[0], parts[1], parts[2]))
    }

    pub fn before(&self, major: u32) -> bool {
        self.major < major
    }

    pub fn is(&self, major: u32) -> bool {
        self.major == major
    }

    pub fn at_least(&self, major: u32) -> bool {
        self.major >= major
    }

    /// Select the query family for this version.
    pub fn family(&self) -> QueryFamily {
        if self.before(6) {
            QueryFamily::Pre6
        } else if self.is(6) {
            QueryFamily::V6
        } else {
            QueryFamily::V7Plus
        }
    }
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Determine the engine version, preferring a configured override.
pub async fn detect_version<C>(client: &C, override_version: Option<&str>) -> Result<EngineVersion>
where
    C: CatalogClient + ?Sized,
{
    let version = match override_version {
        Some(v) => EngineVersion::parse(v)?,
        None => EngineVersion::from_version_string(&client.server_version().await?)?,
    };
    info!(
        "Engine version {} (query family {})",
        version,
        version.family()
    );
    Ok(version)
}
