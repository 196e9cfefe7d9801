//! Table of contents: byte ranges of every emitted object.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DumpError, Result};

/// Restore phase an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Predata,
    Postdata,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Predata => write!(f, "predata"),
            Section::Postdata => write!(f, "postdata"),
        }
    }
}

/// One object's position in the metadata file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Owning schema; empty for database-wide objects.
    pub schema: String,
    pub name: String,
    pub object_type: String,
    /// Table an index, rule or trigger hangs off, as an FQN.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reference_object: String,
    pub start_byte: u64,
    pub end_byte: u64,
}

impl MetadataEntry {
    pub fn len(&self) -> u64 {
        self.end_byte - self.start_byte
    }

    pub fn is_empty(&self) -> bool {
        self.end_byte == self.start_byte
    }
}

/// Provenance recorded alongside the entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocHeader {
    pub engine_version: String,
    pub config_hash: String,
    pub metadata_file: String,
    pub created_at: DateTime<Utc>,
}

/// Entries per section, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<TocHeader>,
    #[serde(default)]
    pub predata_entries: Vec<MetadataEntry>,
    #[serde(default)]
    pub postdata_entries: Vec<MetadataEntry>,
}

impl Toc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry to a section.
    pub fn add_entry(&mut self, section: Section, entry: MetadataEntry) {
        match section {
            Section::Predata => self.predata_entries.push(entry),
            Section::Postdata => self.postdata_entries.push(entry),
        }
    }

    pub fn entries(&self, section: Section) -> &[MetadataEntry] {
        match section {
            Section::Predata => &self.predata_entries,
            Section::Postdata => &self.postdata_entries,
        }
    }

    /// Total number of entries across sections.
    pub fn len(&self) -> usize {
        self.predata_entries.len() + self.postdata_entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First entry matching an object's identity.
    pub fn find(&self, schema: &str, name: &str, object_type: &str) -> Option<(Section, &MetadataEntry)> {
        [Section::Predata, Section::Postdata]
            .into_iter()
            .flat_map(|s| self.entries(s).iter().map(move |e| (s, e)))
            .find(|(_, e)| e.schema == schema && e.name == name && e.object_type == object_type)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }

    /// The bytes one entry covers in the metadata file.
    pub fn slice<'a>(metadata: &'a [u8], entry: &MetadataEntry) -> Result<&'a [u8]> {
        let start = usize::try_from(entry.start_byte).ok();
        let end = usize::try_from(entry.end_byte).ok();
        match (start, end) {
            (Some(start), Some(end)) if start <= end && end <= metadata.len() => {
                Ok(&metadata[start..end])
            }
            _ => Err(DumpError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "TOC entry {}.{} covers bytes {}..{} but the metadata file has {} bytes",
                    entry.schema,
                    entry.name,
                    entry.start_byte,
                    entry.end_byte,
                    metadata.len()
                ),
            ))),
        }
    }
}
