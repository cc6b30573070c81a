//! Offset table of the decrypted GT7 buffer.
//!
//! Every field the decoder reads is listed here with its offset, wire type
//! and the first layout that carries it. Scaling lives in `decode`.

use byteorder::{ByteOrder, LittleEndian};
use ingest_core::IngestError;
use model::{PacketLayout, Wheels};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    U8,
    I16,
    U16,
    I32,
    F32,
}

impl Kind {
    pub const fn size(self) -> usize {
        match self {
            Kind::U8 => 1,
            Kind::I16 | Kind::U16 => 2,
            Kind::I32 | Kind::F32 => 4,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub offset: usize,
    pub kind: Kind,
    /// Oldest layout carrying this field.
    pub since: PacketLayout,
}

impl Field {
    pub const fn end(&self) -> usize {
        self.offset + self.kind.size()
    }

    pub const fn in_layout(&self, layout: PacketLayout) -> bool {
        self.since as u8 <= layout as u8
    }
}

const fn legacy(name: &'static str, offset: usize, kind: Kind) -> Field {
    Field { name, offset, kind, since: PacketLayout::Legacy }
}

const fn extended(name: &'static str, offset: usize, kind: Kind) -> Field {
    Field { name, offset, kind, since: PacketLayout::Extended }
}

/// Four consecutive f32 values, FL FR RL RR.
const fn wheels(names: [&'static str; 4], offset: usize, since: PacketLayout) -> Wheels<Field> {
    Wheels::new(
        Field { name: names[0], offset, kind: Kind::F32, since },
        Field { name: names[1], offset: offset + 4, kind: Kind::F32, since },
        Field { name: names[2], offset: offset + 8, kind: Kind::F32, since },
        Field { name: names[3], offset: offset + 12, kind: Kind::F32, since },
    )
}

pub const MAGIC: Field = legacy("magic", 0x00, Kind::I32);
pub const POSITION: [Field; 3] = [
    legacy("position_x", 0x04, Kind::F32),
    legacy("position_y", 0x08, Kind::F32),
    legacy("position_z", 0x0C, Kind::F32),
];
pub const VELOCITY: [Field; 3] = [
    legacy("velocity_x", 0x10, Kind::F32),
    legacy("velocity_y", 0x14, Kind::F32),
    legacy("velocity_z", 0x18, Kind::F32),
];
/// Pitch, yaw, roll in the legacy reading; quaternion x, y, z in the
/// extended one.
pub const ROTATION: [Field; 3] = [
    legacy("rotation_pitch", 0x1C, Kind::F32),
    legacy("rotation_yaw", 0x20, Kind::F32),
    legacy("rotation_roll", 0x24, Kind::F32),
];
/// Quaternion scalar.
pub const ROTATION_W: Field = extended("rotation_w", 0x28, Kind::F32);
pub const ANGULAR_VELOCITY: [Field; 3] = [
    legacy("angular_velocity_x", 0x2C, Kind::F32),
    legacy("angular_velocity_y", 0x30, Kind::F32),
    legacy("angular_velocity_z", 0x34, Kind::F32),
];
pub const RIDE_HEIGHT: Field = legacy("ride_height", 0x38, Kind::F32);
pub const RPM: Field = legacy("rpm", 0x3C, Kind::F32);
// 0x40..0x44 holds the IV seed and decrypts to noise.
pub const FUEL_LEVEL: Field = legacy("fuel_level", 0x44, Kind::F32);
pub const FUEL_CAPACITY: Field = legacy("fuel_capacity", 0x48, Kind::F32);
pub const CAR_SPEED: Field = legacy("car_speed", 0x4C, Kind::F32);
pub const BOOST: Field = legacy("boost", 0x50, Kind::F32);
pub const OIL_PRESSURE: Field = legacy("oil_pressure", 0x54, Kind::F32);
pub const WATER_TEMP: Field = legacy("water_temp", 0x58, Kind::F32);
pub const OIL_TEMP: Field = legacy("oil_temp", 0x5C, Kind::F32);
pub const TIRE_TEMP: Wheels<Field> = wheels(
    ["tire_temp_fl", "tire_temp_fr", "tire_temp_rl", "tire_temp_rr"],
    0x60,
    PacketLayout::Legacy,
);
pub const PACKAGE_ID: Field = legacy("package_id", 0x70, Kind::I32);
pub const CURRENT_LAP: Field = legacy("current_lap", 0x74, Kind::I16);
pub const TOTAL_LAPS: Field = legacy("total_laps", 0x76, Kind::I16);
pub const BEST_LAP: Field = legacy("best_lap_ms", 0x78, Kind::I32);
pub const LAST_LAP: Field = legacy("last_lap_ms", 0x7C, Kind::I32);
pub const TIME_ON_TRACK: Field = legacy("time_on_track_ms", 0x80, Kind::I32);
pub const CURRENT_POSITION: Field = legacy("current_position", 0x84, Kind::I16);
pub const TOTAL_POSITIONS: Field = legacy("total_positions", 0x86, Kind::I16);
pub const RPM_REV_WARNING: Field = legacy("rpm_rev_warning", 0x88, Kind::U16);
pub const RPM_REV_LIMITER: Field = legacy("rpm_rev_limiter", 0x8A, Kind::U16);
pub const ESTIMATED_TOP_SPEED: Field = legacy("estimated_top_speed", 0x8C, Kind::I16);
pub const FLAGS: Field = legacy("flags", 0x8E, Kind::U16);
/// Low nibble current gear, high nibble suggested gear.
pub const GEAR: Field = legacy("gear", 0x90, Kind::U8);
pub const THROTTLE: Field = legacy("throttle", 0x91, Kind::U8);
pub const BRAKE: Field = legacy("brake", 0x92, Kind::U8);
pub const WHEEL_ANGULAR_SPEED: Wheels<Field> = wheels(
    ["wheel_speed_fl", "wheel_speed_fr", "wheel_speed_rl", "wheel_speed_rr"],
    0xA4,
    PacketLayout::Extended,
);
pub const TIRE_DIAMETER: Wheels<Field> = wheels(
    ["tire_diameter_fl", "tire_diameter_fr", "tire_diameter_rl", "tire_diameter_rr"],
    0xB4,
    PacketLayout::Extended,
);
pub const SUSPENSION: Wheels<Field> = wheels(
    ["suspension_fl", "suspension_fr", "suspension_rl", "suspension_rr"],
    0xC4,
    PacketLayout::Extended,
);
pub const CLUTCH: Field = extended("clutch", 0xF4, Kind::F32);
pub const CLUTCH_ENGAGED: Field = extended("clutch_engaged", 0xF8, Kind::F32);
pub const RPM_AFTER_CLUTCH: Field = extended("rpm_after_clutch", 0xFC, Kind::F32);
pub const GEAR_TOP_SPEED: [Field; 8] = [
    extended("gear_1", 0x104, Kind::F32),
    extended("gear_2", 0x108, Kind::F32),
    extended("gear_3", 0x10C, Kind::F32),
    extended("gear_4", 0x110, Kind::F32),
    extended("gear_5", 0x114, Kind::F32),
    extended("gear_6", 0x118, Kind::F32),
    extended("gear_7", 0x11C, Kind::F32),
    extended("gear_8", 0x120, Kind::F32),
];
pub const CAR_ID: Field = extended("car_id", 0x124, Kind::I32);

/// Every field of the buffer, in order.
pub const FIELDS: &[Field] = &[
    MAGIC,
    POSITION[0], POSITION[1], POSITION[2],
    VELOCITY[0], VELOCITY[1], VELOCITY[2],
    ROTATION[0], ROTATION[1], ROTATION[2],
    ROTATION_W,
    ANGULAR_VELOCITY[0], ANGULAR_VELOCITY[1], ANGULAR_VELOCITY[2],
    RIDE_HEIGHT,
    RPM,
    FUEL_LEVEL,
    FUEL_CAPACITY,
    CAR_SPEED,
    BOOST,
    OIL_PRESSURE,
    WATER_TEMP,
    OIL_TEMP,
    TIRE_TEMP.fl, TIRE_TEMP.fr, TIRE_TEMP.rl, TIRE_TEMP.rr,
    PACKAGE_ID,
    CURRENT_LAP,
    TOTAL_LAPS,
    BEST_LAP,
    LAST_LAP,
    TIME_ON_TRACK,
    CURRENT_POSITION,
    TOTAL_POSITIONS,
    RPM_REV_WARNING,
    RPM_REV_LIMITER,
    ESTIMATED_TOP_SPEED,
    FLAGS,
    GEAR,
    THROTTLE,
    BRAKE,
    WHEEL_ANGULAR_SPEED.fl, WHEEL_ANGULAR_SPEED.fr, WHEEL_ANGULAR_SPEED.rl, WHEEL_ANGULAR_SPEED.rr,
    TIRE_DIAMETER.fl, TIRE_DIAMETER.fr, TIRE_DIAMETER.rl, TIRE_DIAMETER.rr,
    SUSPENSION.fl, SUSPENSION.fr, SUSPENSION.rl, SUSPENSION.rr,
    CLUTCH,
    CLUTCH_ENGAGED,
    RPM_AFTER_CLUTCH,
    GEAR_TOP_SPEED[0], GEAR_TOP_SPEED[1], GEAR_TOP_SPEED[2], GEAR_TOP_SPEED[3],
    GEAR_TOP_SPEED[4], GEAR_TOP_SPEED[5], GEAR_TOP_SPEED[6], GEAR_TOP_SPEED[7],
    CAR_ID,
];

/// Shortest buffer that holds every field of `layout`, padded to a whole
/// 32-bit word the way the console sends it.
pub const fn min_len(layout: PacketLayout) -> usize {
    let mut end = 0;
    let mut i = 0;
    while i < FIELDS.len() {
        let field = FIELDS[i];
        if field.in_layout(layout) && field.end() > end {
            end = field.end();
        }
        i += 1;
    }
    (end + 3) & !3
}

pub const LEGACY_LEN: usize = min_len(PacketLayout::Legacy);
pub const EXTENDED_LEN: usize = min_len(PacketLayout::Extended);

/// Picks the richest layout a buffer of `len` bytes can hold.
pub fn detect(len: usize) -> Result<PacketLayout, IngestError> {
    if len >= EXTENDED_LEN {
        Ok(PacketLayout::Extended)
    } else if len >= LEGACY_LEN {
        Ok(PacketLayout::Legacy)
    } else {
        Err(IngestError::TruncatedPacket { needed: LEGACY_LEN, actual: len })
    }
}

/// Bounds-checked view of one plaintext under a fixed layout.
///
/// Fields the layout does not carry read as zero.
pub struct Reader<'a> {
    buf: &'a [u8],
    layout: PacketLayout,
}

impl<'a> Reader<'a> {
    /// `layout: None` detects the layout from the buffer length.
    pub fn new(buf: &'a [u8], layout: Option<PacketLayout>) -> Result<Self, IngestError> {
        let layout = match layout {
            Some(layout) => {
                let needed = min_len(layout);
                if buf.len() < needed {
                    return Err(IngestError::TruncatedPacket { needed, actual: buf.len() });
                }
                layout
            }
            None => detect(buf.len())?,
        };
        Ok(Self { buf, layout })
    }

    pub fn layout(&self) -> PacketLayout {
        self.layout
    }

    fn bytes(&self, field: Field, kind: Kind) -> Option<&'a [u8]> {
        debug_assert_eq!(field.kind, kind, "{} read with the wrong width", field.name);
        if !field.in_layout(self.layout) {
            return None;
        }
        self.buf.get(field.offset..field.end())
    }

    pub fn u8(&self, field: Field) -> u8 {
        self.bytes(field, Kind::U8).map_or(0, |b| b[0])
    }

    pub fn i16(&self, field: Field) -> i16 {
        self.bytes(field, Kind::I16).map_or(0, LittleEndian::read_i16)
    }

    pub fn u16(&self, field: Field) -> u16 {
        self.bytes(field, Kind::U16).map_or(0, LittleEndian::read_u16)
    }

    pub fn i32(&self, field: Field) -> i32 {
        self.bytes(field, Kind::I32).map_or(0, LittleEndian::read_i32)
    }

    pub fn f32(&self, field: Field) -> f32 {
        self.bytes(field, Kind::F32).map_or(0.0, LittleEndian::read_f32)
    }

    pub fn wheels(&self, fields: Wheels<Field>) -> Wheels<f32> {
        fields.map(|f| self.f32(f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_lengths_from_table() {
        assert_eq!(LEGACY_LEN, 0x94);
        assert_eq!(EXTENDED_LEN, 0x128);
    }

    #[test]
    fn test_fields_do_not_overlap() {
        let mut sorted = FIELDS.to_vec();
        sorted.sort_by_key(|f| f.offset);
        for pair in sorted.windows(2) {
            assert!(
                pair[0].end() <= pair[1].offset,
                "{} overlaps {}",
                pair[0].name,
                pair[1].name
            );
        }
    }

    #[test]
    fn test_seed_window_is_not_a_field() {
        assert!(FIELDS.iter().all(|f| f.end() <= 0x40 || f.offset >= 0x44));
    }

    #[test]
    fn test_detect() {
        assert_eq!(detect(296).unwrap(), PacketLayout::Extended);
        assert_eq!(detect(400).unwrap(), PacketLayout::Extended);
        assert_eq!(detect(295).unwrap(), PacketLayout::Legacy);
        assert_eq!(detect(148).unwrap(), PacketLayout::Legacy);
        assert!(matches!(
            detect(147),
            Err(IngestError::TruncatedPacket { needed: 148, actual: 147 })
        ));
    }

    #[test]
    fn test_forced_layout_still_checks_length() {
        let buf = [0u8; 200];
        assert!(matches!(
            Reader::new(&buf, Some(PacketLayout::Extended)),
            Err(IngestError::TruncatedPacket { needed: 296, actual: 200 })
        ));
        let reader = Reader::new(&buf, Some(PacketLayout::Legacy)).unwrap();
        assert_eq!(reader.layout(), PacketLayout::Legacy);
    }

    #[test]
    fn test_absent_fields_read_zero() {
        let mut buf = vec![0xFFu8; 296];
        buf[0x124..0x128].copy_from_slice(&77i32.to_le_bytes());
        let forced = Reader::new(&buf, Some(PacketLayout::Legacy)).unwrap();
        assert_eq!(forced.i32(CAR_ID), 0);
        assert_eq!(forced.wheels(SUSPENSION), Wheels::splat(0.0));
        assert_eq!(forced.u8(GEAR), 0xFF);

        let full = Reader::new(&buf, None).unwrap();
        assert_eq!(full.i32(CAR_ID), 77);
    }

    #[test]
    fn test_signed_and_unsigned_reads() {
        let mut buf = vec![0u8; 148];
        buf[0x74..0x76].copy_from_slice(&(-1i16).to_le_bytes());
        buf[0x88..0x8A].copy_from_slice(&0xFFFFu16.to_le_bytes());
        buf[0x3C..0x40].copy_from_slice(&7250.5f32.to_le_bytes());
        let r = Reader::new(&buf, None).unwrap();
        assert_eq!(r.i16(CURRENT_LAP), -1);
        assert_eq!(r.u16(RPM_REV_WARNING), 0xFFFF);
        assert_eq!(r.f32(RPM), 7250.5);
    }
}
