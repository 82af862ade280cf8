//! Static lookup tables: FIT base types and the global message catalog.
//!
//! Both tables are plain `const`/`static` data. Lookups that miss fall back to placeholder
//! names ([`message_name`], [`field_name`]) so an unfamiliar message never stops a scan.

use std::borrow::Cow;

/// FIT base type, numbered by the low five bits of a field definition's base type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BaseType {
    Enum = 0,
    SInt8 = 1,
    UInt8 = 2,
    SInt16 = 3,
    UInt16 = 4,
    SInt32 = 5,
    UInt32 = 6,
    String = 7,
    Float32 = 8,
    Float64 = 9,
    UInt8z = 10,
    UInt16z = 11,
    UInt32z = 12,
    Byte = 13,
    SInt64 = 14,
    UInt64 = 15,
    UInt64z = 16,
}

impl BaseType {
    /// All base types in catalog order (index == base type number).
    pub const ALL: [BaseType; 17] = [
        BaseType::Enum,
        BaseType::SInt8,
        BaseType::UInt8,
        BaseType::SInt16,
        BaseType::UInt16,
        BaseType::SInt32,
        BaseType::UInt32,
        BaseType::String,
        BaseType::Float32,
        BaseType::Float64,
        BaseType::UInt8z,
        BaseType::UInt16z,
        BaseType::UInt32z,
        BaseType::Byte,
        BaseType::SInt64,
        BaseType::UInt64,
        BaseType::UInt64z,
    ];

    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.get(n as usize).copied()
    }

    pub fn number(self) -> u8 {
        self as u8
    }

    /// Full base type byte as written in a definition message (endian ability bit included).
    pub fn code(self) -> u8 {
        if self.is_endian_capable() {
            0x80 | self.number()
        } else {
            self.number()
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BaseType::Enum => "enum",
            BaseType::SInt8 => "sint8",
            BaseType::UInt8 => "uint8",
            BaseType::SInt16 => "sint16",
            BaseType::UInt16 => "uint16",
            BaseType::SInt32 => "sint32",
            BaseType::UInt32 => "uint32",
            BaseType::String => "string",
            BaseType::Float32 => "float32",
            BaseType::Float64 => "float64",
            BaseType::UInt8z => "uint8z",
            BaseType::UInt16z => "uint16z",
            BaseType::UInt32z => "uint32z",
            BaseType::Byte => "byte",
            BaseType::SInt64 => "sint64",
            BaseType::UInt64 => "uint64",
            BaseType::UInt64z => "uint64z",
        }
    }

    /// Width in bytes of one element.
    pub fn size(self) -> usize {
        match self {
            BaseType::Enum
            | BaseType::SInt8
            | BaseType::UInt8
            | BaseType::String
            | BaseType::UInt8z
            | BaseType::Byte => 1,
            BaseType::SInt16 | BaseType::UInt16 | BaseType::UInt16z => 2,
            BaseType::SInt32 | BaseType::UInt32 | BaseType::Float32 | BaseType::UInt32z => 4,
            BaseType::Float64 | BaseType::SInt64 | BaseType::UInt64 | BaseType::UInt64z => 8,
        }
    }

    /// Whether byte order matters for this type (all multi-byte types).
    pub fn is_endian_capable(self) -> bool {
        self.size() > 1
    }

    /// Types decoded as a whole span rather than as repeated numeric elements.
    pub fn is_opaque(self) -> bool {
        matches!(self, BaseType::String | BaseType::Byte)
    }

    /// Bit pattern meaning "field not present". Per-element for `byte`, whole value otherwise.
    pub fn invalid_value(self) -> u64 {
        match self {
            BaseType::Enum | BaseType::UInt8 | BaseType::Byte => 0xFF,
            BaseType::SInt8 => 0x7F,
            BaseType::SInt16 => 0x7FFF,
            BaseType::UInt16 => 0xFFFF,
            BaseType::SInt32 => 0x7FFF_FFFF,
            BaseType::UInt32 | BaseType::Float32 => 0xFFFF_FFFF,
            BaseType::String
            | BaseType::UInt8z
            | BaseType::UInt16z
            | BaseType::UInt32z
            | BaseType::UInt64z => 0,
            BaseType::Float64 | BaseType::UInt64 => 0xFFFF_FFFF_FFFF_FFFF,
            BaseType::SInt64 => 0x7FFF_FFFF_FFFF_FFFF,
        }
    }
}

impl std::fmt::Display for BaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One entry of the global message catalog.
#[derive(Debug)]
pub struct MessageInfo {
    pub number: u16,
    pub name: &'static str,
    /// Field number -> field name, sorted by field number.
    pub fields: &'static [(u8, &'static str)],
}

impl MessageInfo {
    pub fn field_name(&self, field_number: u8) -> Option<&'static str> {
        self.fields
            .binary_search_by_key(&field_number, |(n, _)| *n)
            .ok()
            .map(|i| self.fields[i].1)
    }
}

/// Looks up a global message number; `None` for numbers outside the catalog.
pub fn lookup_message(global_message_number: u16) -> Option<&'static MessageInfo> {
    MESSAGES
        .binary_search_by_key(&global_message_number, |m| m.number)
        .ok()
        .map(|i| &MESSAGES[i])
}

/// Symbolic message name, or `unknown message <N>`.
pub fn message_name(global_message_number: u16) -> Cow<'static, str> {
    match lookup_message(global_message_number) {
        Some(m) => Cow::Borrowed(m.name),
        None => Cow::Owned(format!("unknown message {}", global_message_number)),
    }
}

/// Symbolic field name within a message, or `unknown field <N>` (also for unknown messages).
pub fn field_name(global_message_number: u16, field_number: u8) -> Cow<'static, str> {
    match lookup_message(global_message_number).and_then(|m| m.field_name(field_number)) {
        Some(name) => Cow::Borrowed(name),
        None => Cow::Owned(format!("unknown field {}", field_number)),
    }
}

pub const MESG_SPORT: u16 = 12;
pub const MESG_SESSION: u16 = 18;
pub const MESG_LAP: u16 = 19;
pub const MESG_RECORD: u16 = 20;

const NO_FIELDS: &[(u8, &str)] = &[];

macro_rules! mesg {
    ($num:expr, $name:expr) => {
        MessageInfo { number: $num, name: $name, fields: NO_FIELDS }
    };
    ($num:expr, $name:expr, $fields:expr) => {
        MessageInfo { number: $num, name: $name, fields: $fields }
    };
}

/// Global message catalog, sorted by message number.
static MESSAGES: &[MessageInfo] = &[
    mesg!(0, "file_id", &[
        (0, "type"), (1, "manufacturer"), (2, "product"), (3, "serial_number"),
        (4, "time_created"), (5, "number"), (8, "product_name"),
    ]),
    mesg!(1, "capabilities"),
    mesg!(2, "device_settings"),
    mesg!(3, "user_profile"),
    mesg!(4, "hrm_profile"),
    mesg!(5, "sdm_profile"),
    mesg!(6, "bike_profile"),
    mesg!(7, "zones_target"),
    mesg!(8, "hr_zone"),
    mesg!(9, "power_zone"),
    mesg!(10, "met_zone"),
    mesg!(12, "sport", &[(0, "sport"), (1, "sub_sport"), (3, "name")]),
    mesg!(15, "goal"),
    mesg!(18, "session", &[
        (0, "event"), (1, "event_type"), (2, "start_time"), (3, "start_position_lat"),
        (4, "start_position_long"), (5, "sport"), (6, "sub_sport"), (7, "total_elapsed_time"),
        (8, "total_timer_time"), (9, "total_distance"), (253, "timestamp"), (254, "message_index"),
    ]),
    mesg!(19, "lap", &[
        (0, "event"), (1, "event_type"), (2, "start_time"), (7, "total_elapsed_time"),
        (8, "total_timer_time"), (9, "total_distance"), (25, "sport"), (39, "sub_sport"),
        (253, "timestamp"), (254, "message_index"),
    ]),
    mesg!(20, "record", &[
        (0, "position_lat"), (1, "position_long"), (2, "altitude"), (3, "heart_rate"),
        (4, "cadence"), (5, "distance"), (6, "speed"), (7, "power"),
        (8, "compressed_speed_distance"), (9, "grade"), (10, "resistance"),
        (11, "time_from_course"), (12, "cycle_length"), (13, "temperature"), (17, "speed_1s"),
        (18, "cycles"), (19, "total_cycles"), (28, "compressed_accumulated_power"),
        (29, "accumulated_power"), (30, "left_right_balance"), (31, "gps_accuracy"),
        (32, "vertical_speed"), (33, "calories"), (39, "vertical_oscillation"),
        (40, "stance_time_percent"), (41, "stance_time"), (42, "activity_type"),
        (43, "left_torque_effectiveness"), (44, "right_torque_effectiveness"),
        (45, "left_pedal_smoothness"), (46, "right_pedal_smoothness"),
        (47, "combined_pedal_smoothness"), (48, "time128"), (49, "stroke_type"), (50, "zone"),
        (51, "ball_speed"), (52, "cadence256"), (53, "fractional_cadence"),
        (54, "total_hemoglobin_conc"), (55, "total_hemoglobin_conc_min"),
        (56, "total_hemoglobin_conc_max"), (57, "saturated_hemoglobin_percent"),
        (58, "saturated_hemoglobin_percent_min"), (59, "saturated_hemoglobin_percent_max"),
        (62, "device_index"), (67, "left_pco"), (68, "right_pco"), (69, "left_power_phase"),
        (70, "left_power_phase_peak"), (71, "right_power_phase"), (72, "right_power_phase_peak"),
        (73, "enhanced_speed"), (78, "enhanced_altitude"), (81, "battery_soc"),
        (82, "motor_power"), (83, "vertical_ratio"), (84, "stance_time_balance"),
        (85, "step_length"), (91, "absolute_pressure"), (92, "depth"), (93, "next_stop_depth"),
        (94, "next_stop_time"), (95, "time_to_surface"), (96, "ndl_time"), (97, "cns_load"),
        (98, "n2_load"), (114, "grit"), (115, "flow"), (117, "ebike_travel_range"),
        (118, "ebike_battery_level"), (119, "ebike_assist_mode"),
        (120, "ebike_assist_level_percent"), (139, "core_temperature"), (253, "timestamp"),
    ]),
    mesg!(21, "event", &[
        (0, "event"), (1, "event_type"), (2, "data16"), (3, "data"), (4, "event_group"),
        (7, "score"), (8, "opponent_score"), (9, "front_gear_num"), (10, "front_gear"),
        (11, "rear_gear_num"), (12, "rear_gear"), (13, "device_index"),
        (21, "radar_threat_level_max"), (22, "radar_threat_count"),
    ]),
    mesg!(23, "device_info", &[
        (0, "device_index"), (1, "device_type"), (2, "manufacturer"), (3, "serial_number"),
        (4, "product"), (5, "software_version"), (6, "hardware_version"),
        (7, "cum_operating_time"), (10, "battery_voltage"), (11, "battery_status"),
        (18, "sensor_position"), (19, "descriptor"), (20, "ant_transmission_type"),
        (21, "ant_device_number"), (22, "ant_network"), (25, "source_type"),
        (27, "product_name"), (253, "timestamp"),
    ]),
    mesg!(26, "workout", &[
        (4, "sport"), (5, "capabilities"), (6, "num_valid_steps"), (8, "wkt_name"),
        (11, "sub_sport"),
    ]),
    mesg!(27, "workout_step"),
    mesg!(28, "schedule"),
    mesg!(30, "weight_scale"),
    mesg!(31, "course"),
    mesg!(32, "course_point"),
    mesg!(33, "totals"),
    mesg!(34, "activity", &[
        (0, "total_timer_time"), (1, "num_sessions"), (2, "type"), (3, "event"),
        (4, "event_type"), (5, "local_timestamp"), (253, "timestamp"),
    ]),
    mesg!(35, "software"),
    mesg!(37, "file_capabilities"),
    mesg!(38, "mesg_capabilities"),
    mesg!(39, "field_capabilities"),
    mesg!(49, "file_creator", &[(0, "software_version"), (1, "hardware_version")]),
    mesg!(51, "blood_pressure"),
    mesg!(53, "speed_zone"),
    mesg!(55, "monitoring"),
    mesg!(72, "training_file"),
    mesg!(78, "hrv", &[(0, "time")]),
    mesg!(80, "ant_rx"),
    mesg!(81, "ant_tx"),
    mesg!(82, "ant_channel_id"),
    mesg!(101, "length"),
    mesg!(103, "monitoring_info"),
    mesg!(105, "pad"),
    mesg!(106, "slave_device"),
    mesg!(127, "connectivity"),
    mesg!(128, "weather_conditions"),
    mesg!(129, "weather_alert"),
    mesg!(131, "cadence_zone"),
    mesg!(132, "hr"),
    mesg!(142, "segment_lap"),
    mesg!(145, "memo_glob"),
    mesg!(148, "segment_id"),
    mesg!(149, "segment_leaderboard_entry"),
    mesg!(150, "segment_point"),
    mesg!(151, "segment_file"),
    mesg!(158, "workout_session"),
    mesg!(159, "watchface_settings"),
    mesg!(160, "gps_metadata"),
    mesg!(161, "camera_event"),
    mesg!(162, "timestamp_correlation"),
    mesg!(164, "gyroscope_data"),
    mesg!(165, "accelerometer_data"),
    mesg!(167, "three_d_sensor_calibration"),
    mesg!(169, "video_frame"),
    mesg!(174, "obdii_data"),
    mesg!(177, "nmea_sentence"),
    mesg!(178, "aviation_attitude"),
    mesg!(184, "video"),
    mesg!(185, "video_title"),
    mesg!(186, "video_description"),
    mesg!(187, "video_clip"),
    mesg!(188, "ohr_settings"),
    mesg!(200, "exd_screen_configuration"),
    mesg!(201, "exd_data_field_configuration"),
    mesg!(202, "exd_data_concept_configuration"),
    mesg!(206, "field_description", &[
        (0, "developer_data_index"), (1, "field_definition_number"), (2, "fit_base_type_id"),
        (3, "field_name"), (8, "units"),
    ]),
    mesg!(207, "developer_data_id", &[
        (0, "developer_id"), (1, "application_id"), (2, "manufacturer_id"),
        (3, "developer_data_index"), (4, "application_version"),
    ]),
    mesg!(208, "magnetometer_data"),
    mesg!(209, "barometer_data"),
    mesg!(210, "one_d_sensor_calibration"),
    mesg!(225, "set"),
    mesg!(227, "stress_level"),
    mesg!(258, "dive_settings"),
    mesg!(259, "dive_gas"),
    mesg!(262, "dive_alarm"),
    mesg!(264, "exercise_title"),
    mesg!(268, "dive_summary"),
    mesg!(285, "jump"),
    mesg!(317, "climb_pro"),
    mesg!(0xFF00, "mfg_range_min"),
    mesg!(0xFFFE, "mfg_range_max"),
];
