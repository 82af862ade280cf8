//! # fitpatch: FIT activity file decoder and field patcher
//!
//! Decodes the record stream of FIT files (header, definition messages, data messages,
//! file CRC) and rewrites a named field in place, recomputing the CRC so the file stays
//! valid. The main use is changing `sub_sport` from indoor cycling (6) to virtual activity
//! (58) so trainer rides are recognised as virtual rides.
//!
//! ## File structure
//!
//! - **Header**: 12 bytes, or 14 with a CRC over the first 12 (see [`header`])
//! - **Records**: definition messages bind a schema to one of 16 local message type slots;
//!   data messages are decoded with the slot's current schema (see [`record`], [`walk`])
//! - **File CRC**: CRC-16 over the records, stored little-endian right after them (see [`crc`])
//!
//! ## Usage
//!
//! ```ignore
//! use fitpatch::{patch_file, PatchTarget};
//!
//! let report = patch_file("ride.fit".as_ref(), "ride_virtual.fit".as_ref(), &PatchTarget::default())?;
//! println!("{} field(s) changed", report.patched.len());
//! ```
//!
//! See `tests/integration.rs` for more.

pub mod builder;
pub mod catalog;
pub mod codec;
pub mod crc;
pub mod dump;
pub mod file;
pub mod header;
pub mod patch;
pub mod record;
pub mod value;
pub mod verify;
pub mod walk;

pub use builder::FitFileBuilder;
pub use catalog::BaseType;
pub use codec::{Endianness, FitError};
pub use file::{decode_file, DecodedFile, Record};
pub use header::FileHeader;
pub use patch::{patch_buffer, patch_file, FieldPatcher, PatchReport, PatchTarget, PatchedField};
pub use record::{DefinitionMessage, FieldDefinition, LocalMessageTable, RecordHeader};
pub use value::Value;
pub use verify::{check_integrity, ChecksumStatus, Integrity};
pub use walk::{walk_records, DataMessage, DecodedField, RecordVisitor, RecordWalker};
