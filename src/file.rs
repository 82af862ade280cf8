//! Whole-file decoding: header, checksums and every record in stream order.

use crate::codec::FitError;
use crate::header::FileHeader;
use crate::record::DefinitionMessage;
use crate::verify::{check_integrity, Integrity};
use crate::walk::{DataMessage, DecodedField, RecordVisitor, RecordWalker};

/// One record of the stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Definition { offset: usize, definition: DefinitionMessage },
    Data(DataMessage),
}

impl Record {
    pub fn offset(&self) -> usize {
        match self {
            Record::Definition { offset, .. } => *offset,
            Record::Data(m) => m.offset,
        }
    }
}

/// Result of decoding a whole file.
#[derive(Debug)]
pub struct DecodedFile {
    pub header: FileHeader,
    pub integrity: Integrity,
    pub records: Vec<Record>,
}

impl DecodedFile {
    pub fn definitions(&self) -> impl Iterator<Item = (usize, &DefinitionMessage)> {
        self.records.iter().filter_map(|r| match r {
            Record::Definition { offset, definition } => Some((*offset, definition)),
            Record::Data(_) => None,
        })
    }

    pub fn data_messages(&self) -> impl Iterator<Item = &DataMessage> {
        self.records.iter().filter_map(|r| match r {
            Record::Data(m) => Some(m),
            Record::Definition { .. } => None,
        })
    }

    /// Data messages with the given resolved message name.
    pub fn messages_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a DataMessage> + 'a {
        self.data_messages().filter(move |m| m.message_name == name)
    }

    /// Every occurrence of a field name across all data messages.
    pub fn fields_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = (&'a DataMessage, &'a DecodedField)> + 'a {
        self.data_messages()
            .flat_map(move |m| m.fields.iter().filter(move |f| f.name == name).map(move |f| (m, f)))
    }
}

#[derive(Default)]
struct RecordCollector {
    records: Vec<Record>,
}

impl RecordVisitor for RecordCollector {
    fn definition(&mut self, offset: usize, definition: &DefinitionMessage) -> Result<(), FitError> {
        self.records.push(Record::Definition { offset, definition: definition.clone() });
        Ok(())
    }

    fn data(&mut self, message: &DataMessage) -> Result<(), FitError> {
        self.records.push(Record::Data(message.clone()));
        Ok(())
    }
}

/// Decodes every record of `data`. Checksum mismatches are reported in `integrity`, not raised.
pub fn decode_file(data: &[u8]) -> Result<DecodedFile, FitError> {
    let walker = RecordWalker::new(data)?;
    let header = *walker.header();
    let integrity = check_integrity(data, &header);
    let mut collector = RecordCollector::default();
    walker.walk(&mut collector)?;
    Ok(DecodedFile { header, integrity, records: collector.records })
}
