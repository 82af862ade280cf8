//! Format decoded files for display (`--dump`).

use crate::file::{DecodedFile, Record};
use crate::record::{DefinitionMessage, RecordHeader};
use crate::walk::{DataMessage, DecodedField};

fn hex_string(b: &[u8]) -> String {
    b.iter().map(|x| format!("{:02x}", x)).collect::<Vec<_>>().join(" ")
}

/// One field as `name = value (type)`, flagging arrays and invalid sentinels.
pub fn format_field(field: &DecodedField) -> String {
    let type_name = match field.base_type {
        Some(bt) => bt.name().to_string(),
        None => "unknown type".to_string(),
    };
    let mut line = format!("{} = {} ({})", field.name, field.value, type_name);
    if field.is_array() {
        if let Some(n) = field.element_count {
            line.push_str(&format!(" [{} elements]", n));
        }
    }
    if field.is_invalid() {
        line.push_str(" <invalid>");
    }
    line
}

fn dump_definition(offset: usize, def: &DefinitionMessage, indent: usize) -> String {
    let pad = "  ".repeat(indent);
    let mut lines = vec![format!(
        "{}@{} definition local {} -> {} ({}), {:?} endian, {} fields",
        pad,
        offset,
        def.local_message_type,
        def.message_name(),
        def.global_message_number,
        def.architecture,
        def.fields.len()
    )];
    for f in &def.fields {
        let base = match f.base_type.base_type() {
            Some(bt) => bt.name().to_string(),
            None => format!("{:#04x}", f.base_type.0),
        };
        lines.push(format!(
            "{}  field {} {}: {} bytes {}",
            pad,
            f.field_number,
            crate::catalog::field_name(def.global_message_number, f.field_number),
            f.byte_size,
            base
        ));
    }
    for d in &def.developer_fields {
        lines.push(format!(
            "{}  developer field {} (data index {}): {} bytes",
            pad, d.field_number, d.developer_data_index, d.byte_size
        ));
    }
    lines.join("\n")
}

fn dump_data(message: &DataMessage, indent: usize) -> String {
    let pad = "  ".repeat(indent);
    let time = match message.header {
        RecordHeader::CompressedTimestamp { time_offset, .. } => format!(" +{}s", time_offset),
        RecordHeader::Normal { .. } => String::new(),
    };
    let mut lines = vec![format!(
        "{}@{} data local {} {}{}",
        pad, message.offset, message.local_message_type, message.message_name, time
    )];
    for f in &message.fields {
        lines.push(format!("{}  {}", pad, format_field(f)));
    }
    for d in &message.developer_fields {
        lines.push(format!(
            "{}  developer field {} = hex({})",
            pad,
            d.field_number,
            hex_string(&d.bytes)
        ));
    }
    lines.join("\n")
}

pub fn dump_record(record: &Record, indent: usize) -> String {
    match record {
        Record::Definition { offset, definition } => dump_definition(*offset, definition, indent),
        Record::Data(m) => dump_data(m, indent),
    }
}

/// Header summary, checksum status, then every record in stream order.
pub fn dump_file(file: &DecodedFile) -> String {
    let h = &file.header;
    let mut out = vec![
        format!(
            "header: size {}, protocol {:#04x}, profile {}, data size {}, type {:?}",
            h.header_size,
            h.protocol_version,
            h.profile_version,
            h.data_size,
            String::from_utf8_lossy(&h.data_type)
        ),
        format!("header checksum: {}", file.integrity.header),
        format!("file checksum: {}", file.integrity.body),
    ];
    out.extend(file.records.iter().map(|r| dump_record(r, 0)));
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::FitFileBuilder;
    use crate::catalog::BaseType;
    use crate::file::decode_file;
    use crate::record::FieldDefinition;

    #[test]
    fn dump_lists_header_and_records() {
        let mut b = FitFileBuilder::with_header_size(12);
        b.define_fields(0, 12, &[FieldDefinition::new(1, 1, BaseType::UInt8)]).data(0, &[6]);
        let file = decode_file(&b.finish()).expect("decode");
        let text = dump_file(&file);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("header: size 12, protocol 0x10"));
        assert_eq!(lines[1], "header checksum: absent");
        assert_eq!(lines[2], "file checksum: ok (0xbb49)");
        assert_eq!(lines[3], "@12 definition local 0 -> sport (12), Little endian, 1 fields");
        assert_eq!(lines[4], "  field 1 sub_sport: 1 bytes uint8");
        assert_eq!(lines[5], "@21 data local 0 sport");
        assert_eq!(lines[6], "  sub_sport = 6 (uint8)");
    }

    #[test]
    fn invalid_and_array_fields_are_marked() {
        let mut b = FitFileBuilder::new();
        b.define_fields(0, 20, &[FieldDefinition::new(3, 1, BaseType::UInt8), FieldDefinition::new(7, 4, BaseType::UInt16)])
            .data(0, &[0xFF, 1, 0, 2, 0]);
        let file = decode_file(&b.finish()).expect("decode");
        let m = file.data_messages().next().expect("data");
        assert_eq!(format_field(&m.fields[0]), "heart_rate = 255 (uint8) <invalid>");
        assert_eq!(format_field(&m.fields[1]), "power = 1 (uint16) [2 elements]");
    }
}
