//! Field patching: find every occurrence of a named field holding one value, change it to
//! another, and rewrite the file CRC.
//!
//! Patching runs in two phases. A read-only [`RecordWalker`] pass stages every match in a
//! [`FieldPatcher`], already encoded with the field's base type and byte order. Only if the
//! whole stream decodes are the staged bytes written into the buffer and the CRC recomputed.
//! A structural error therefore never leaves a half-patched buffer behind.

use crate::catalog::BaseType;
use crate::codec::{encode_element, FitError};
use crate::crc::checksum;
use crate::header::{FileHeader, CRC_SIZE};
use crate::value::Value;
use crate::verify::{check_integrity, Integrity};
use crate::walk::{DataMessage, RecordVisitor, RecordWalker};
use byteorder::{ByteOrder, LittleEndian};
use log::{debug, info};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

pub const SUB_SPORT_FIELD: &str = "sub_sport";
/// `sub_sport` value recorded by indoor trainers.
pub const SUB_SPORT_INDOOR_CYCLING: i64 = 6;
/// `sub_sport` value expected by virtual riding platforms.
pub const SUB_SPORT_VIRTUAL_ACTIVITY: i64 = 58;

/// Which field to change, and from which value to which.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchTarget {
    /// Resolved field name, matched in every message type that defines it.
    pub field: String,
    pub from: i64,
    pub to: i64,
}

impl Default for PatchTarget {
    fn default() -> Self {
        PatchTarget {
            field: SUB_SPORT_FIELD.to_string(),
            from: SUB_SPORT_INDOOR_CYCLING,
            to: SUB_SPORT_VIRTUAL_ACTIVITY,
        }
    }
}

impl PatchTarget {
    pub fn new(field: impl Into<String>, from: i64, to: i64) -> Self {
        PatchTarget { field: field.into(), from, to }
    }
}

/// One staged (or applied) change.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchedField {
    pub message_name: String,
    pub global_message_number: u16,
    pub field_number: u8,
    pub base_type: BaseType,
    /// Absolute offset of the field in the file buffer.
    pub offset: usize,
    pub old: Value,
    /// Replacement bytes, already in the definition's byte order.
    pub bytes: Vec<u8>,
}

/// Visitor that stages a change for every field matching a [`PatchTarget`].
pub struct FieldPatcher<'t> {
    target: &'t PatchTarget,
    staged: Vec<PatchedField>,
}

impl<'t> FieldPatcher<'t> {
    pub fn new(target: &'t PatchTarget) -> Self {
        FieldPatcher { target, staged: Vec::new() }
    }

    pub fn staged(&self) -> &[PatchedField] {
        &self.staged
    }

    /// True once at least one field has been staged.
    pub fn is_dirty(&self) -> bool {
        !self.staged.is_empty()
    }

    /// Writes every staged change into `data`. Nothing is written if any span is out of bounds.
    pub fn apply(self, data: &mut [u8]) -> Result<Vec<PatchedField>, FitError> {
        for p in &self.staged {
            if p.offset + p.bytes.len() > data.len() {
                return Err(FitError::Truncated {
                    offset: p.offset,
                    needed: p.bytes.len(),
                    available: data.len().saturating_sub(p.offset),
                });
            }
        }
        for p in &self.staged {
            data[p.offset..p.offset + p.bytes.len()].copy_from_slice(&p.bytes);
        }
        Ok(self.staged)
    }
}

impl RecordVisitor for FieldPatcher<'_> {
    fn data(&mut self, message: &DataMessage) -> Result<(), FitError> {
        for field in &message.fields {
            if field.name != self.target.field.as_str() || !field.value.equals_integer(self.target.from) {
                continue;
            }
            // Values only decode as numbers for known base types with whole elements.
            let (Some(base_type), Some(elements)) = (field.base_type, field.element_count) else {
                continue;
            };
            if elements != 1 {
                return Err(FitError::UnsupportedArrayPatch {
                    field: field.name.to_string(),
                    offset: field.offset,
                    elements,
                });
            }
            let mut bytes = vec![0u8; field.byte_size];
            encode_element(&mut bytes, base_type, field.endianness, self.target.to)?;
            info!(
                "found {} {} in {} message at offset {}, changing to {}",
                field.name, self.target.from, message.message_name, field.offset, self.target.to
            );
            self.staged.push(PatchedField {
                message_name: message.message_name.to_string(),
                global_message_number: message.global_message_number,
                field_number: field.field_number,
                base_type,
                offset: field.offset,
                old: field.value.clone(),
                bytes,
            });
        }
        Ok(())
    }
}

/// Recomputes the CRC over the record stream `[header_size, records_end)` and stores it
/// little-endian in the two bytes at `records_end`. Bytes past the file CRC are not touched.
/// Returns the new CRC.
pub fn rewrite_checksum(data: &mut [u8], header: &FileHeader) -> Result<u16, FitError> {
    let crc_at = header.records_end();
    let crc = checksum(data, header.records_start(), crc_at)?;
    let available = data.len().saturating_sub(crc_at);
    let slot = data.get_mut(crc_at..crc_at + CRC_SIZE).ok_or(FitError::Truncated {
        offset: crc_at,
        needed: CRC_SIZE,
        available,
    })?;
    LittleEndian::write_u16(slot, crc);
    debug!("file checksum rewritten at offset {}: {:#06x}", crc_at, crc);
    Ok(crc)
}

/// Outcome of a successful patch.
#[derive(Debug, Clone)]
pub struct PatchReport {
    pub header: FileHeader,
    /// Checksum status of the input, before patching.
    pub integrity: Integrity,
    pub patched: Vec<PatchedField>,
    /// CRC written at the end of the record stream.
    pub checksum: u16,
}

/// Patches `data` in place. On error `data` is unchanged.
///
/// Fails with [`FitError::NoMatchFound`] when no field matched; the buffer is not written.
pub fn patch_buffer(data: &mut [u8], target: &PatchTarget) -> Result<PatchReport, FitError> {
    let walker = RecordWalker::new(data)?;
    let header = *walker.header();
    let integrity = check_integrity(data, &header);
    integrity.log();

    let mut patcher = FieldPatcher::new(target);
    walker.walk(&mut patcher)?;
    if !patcher.is_dirty() {
        return Err(FitError::NoMatchFound { field: target.field.clone(), value: target.from });
    }
    let patched = patcher.apply(data)?;
    let checksum = rewrite_checksum(data, &header)?;
    Ok(PatchReport { header, integrity, patched, checksum })
}

/// Reads `input`, patches it and writes the result to `output`.
///
/// The result goes to a temporary file next to `output`, which is then renamed over it, so
/// `output` either holds the whole patched file or is left untouched.
pub fn patch_file(input: &Path, output: &Path, target: &PatchTarget) -> Result<PatchReport, FitError> {
    info!("processing {}", input.display());
    let mut data = std::fs::read(input)?;
    let report = patch_buffer(&mut data, target)?;
    write_atomically(output, &data)?;
    info!(
        "{} field(s) changed, modified file written to {}",
        report.patched.len(),
        output.display()
    );
    Ok(report)
}

fn write_atomically(output: &Path, data: &[u8]) -> Result<(), FitError> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(output).map_err(|e| FitError::Io(e.error))?;
    Ok(())
}
