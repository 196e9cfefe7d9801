//! Records each object's byte range while writing it to the sink.

use std::io::Write;

use super::sink::ByteCountingWriter;
use super::toc::{MetadataEntry, Section, Toc};
use crate::error::Result;

/// Identity of one top-level object in the TOC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryKey {
    pub schema: String,
    pub name: String,
    pub object_type: String,
    pub reference_object: String,
}

impl EntryKey {
    pub fn new(schema: &str, name: &str, object_type: &str) -> Self {
        Self {
            schema: schema.to_string(),
            name: name.to_string(),
            object_type: object_type.to_string(),
            reference_object: String::new(),
        }
    }

    /// Attach the table (or other object) this one depends on.
    pub fn referencing(mut self, reference_object: impl Into<String>) -> Self {
        self.reference_object = reference_object.into();
        self
    }
}

/// Single writer for the metadata stream and its TOC.
///
/// Objects are separated by a blank line that is written before the next
/// object's start offset, so every entry covers exactly its own text.
pub struct MetadataWriter<W: Write> {
    sink: ByteCountingWriter<W>,
    toc: Toc,
}

impl<W: Write> MetadataWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            sink: ByteCountingWriter::new(inner),
            toc: Toc::new(),
        }
    }

    /// Write one rendered object and record its range.
    pub fn emit(&mut self, section: Section, key: EntryKey, text: &str) -> Result<()> {
        if self.sink.byte_count() > 0 {
            self.sink.write_all(b"\n\n")?;
        }
        let start_byte = self.sink.byte_count();
        self.sink.write_all(text.as_bytes())?;
        let end_byte = self.sink.byte_count();

        self.toc.add_entry(
            section,
            MetadataEntry {
                schema: key.schema,
                name: key.name,
                object_type: key.object_type,
                reference_object: key.reference_object,
                start_byte,
                end_byte,
            },
        );
        Ok(())
    }

    pub fn byte_count(&self) -> u64 {
        self.sink.byte_count()
    }

    pub fn toc(&self) -> &Toc {
        &self.toc
    }

    /// Flush and hand back the sink and the TOC.
    pub fn finish(mut self) -> Result<(W, Toc)> {
        self.sink.flush()?;
        Ok((self.sink.into_inner(), self.toc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranges_exclude_separators() {
        let mut writer = MetadataWriter::new(Vec::new());
        writer
            .emit(Section::Predata, EntryKey::new("public", "a", "TABLE"), "CREATE A;")
            .unwrap();
        writer
            .emit(Section::Postdata, EntryKey::new("public", "i", "INDEX"), "CREATE I;")
            .unwrap();
        let (bytes, toc) = writer.finish().unwrap();

        assert_eq!(bytes, b"CREATE A;\n\nCREATE I;");
        let a = &toc.predata_entries[0];
        let i = &toc.postdata_entries[0];
        assert_eq!((a.start_byte, a.end_byte), (0, 9));
        assert_eq!((i.start_byte, i.end_byte), (11, 20));
        assert_eq!(Toc::slice(&bytes, i).unwrap(), b"CREATE I;");
    }

    #[test]
    fn test_reference_object_recorded() {
        let mut writer = MetadataWriter::new(Vec::new());
        let key = EntryKey::new("public", "r", "RULE").referencing("public.t");
        writer.emit(Section::Postdata, key, "CREATE RULE r;").unwrap();
        assert_eq!(writer.toc().postdata_entries[0].reference_object, "public.t");
        assert_eq!(writer.byte_count(), 14);
    }
}
