use ingest_core::IngestError;
use model::{Orientation, PacketLayout, TelemetrySnapshot, Vec3};

use crate::crypto;
use crate::layout::{self as l, Reader};

/// Decrypts and decodes one raw datagram.
pub fn decode_datagram(
    datagram: &[u8],
    layout: Option<PacketLayout>,
) -> Result<TelemetrySnapshot, IngestError> {
    let plain = crypto::decrypt(datagram)?;
    decode(&plain, layout)
}

/// Builds a snapshot from one decrypted buffer.
///
/// `layout: None` picks the layout from the buffer length. Derived values
/// (tire speed, slip, orientation) are filled in before returning.
pub fn decode(plain: &[u8], layout: Option<PacketLayout>) -> Result<TelemetrySnapshot, IngestError> {
    let r = Reader::new(plain, layout)?;
    let layout = r.layout();

    let vec3 = |fields: [l::Field; 3]| Vec3::new(r.f32(fields[0]), r.f32(fields[1]), r.f32(fields[2]));
    let rotation_raw = vec3(l::ROTATION);

    let (quaternion, rotation) = match layout {
        PacketLayout::Extended => {
            let q = [rotation_raw.x, rotation_raw.y, rotation_raw.z, r.f32(l::ROTATION_W)];
            (q, dynamics::orientation(q))
        }
        PacketLayout::Legacy => (
            [0.0; 4],
            Orientation { pitch: rotation_raw.x, yaw: rotation_raw.y, roll: rotation_raw.z },
        ),
    };

    let gear = r.u8(l::GEAR);
    let flags = r.u16(l::FLAGS);
    let car_speed = r.f32(l::CAR_SPEED) * dynamics::KMH_PER_MPS;
    let tire_diameter = r.wheels(l::TIRE_DIAMETER);
    let wheel_angular_speed = r.wheels(l::WHEEL_ANGULAR_SPEED);
    let tire_speed = dynamics::tire_speeds(tire_diameter, wheel_angular_speed);

    Ok(TelemetrySnapshot {
        layout,
        package_id: r.i32(l::PACKAGE_ID),
        car_id: r.i32(l::CAR_ID),
        best_lap_ms: r.i32(l::BEST_LAP),
        last_lap_ms: r.i32(l::LAST_LAP),
        current_lap: r.i16(l::CURRENT_LAP),
        total_laps: r.i16(l::TOTAL_LAPS),
        current_position: r.i16(l::CURRENT_POSITION),
        total_positions: r.i16(l::TOTAL_POSITIONS),
        time_on_track_ms: r.i32(l::TIME_ON_TRACK),
        paused: flags & model::FLAG_PAUSED != 0,
        in_race: flags & model::FLAG_IN_RACE != 0,
        flags,
        rpm: r.f32(l::RPM),
        rpm_rev_warning: r.u16(l::RPM_REV_WARNING),
        rpm_rev_limiter: r.u16(l::RPM_REV_LIMITER),
        throttle: pedal(r.u8(l::THROTTLE)),
        brake: pedal(r.u8(l::BRAKE)),
        clutch: r.f32(l::CLUTCH),
        clutch_engaged: r.f32(l::CLUTCH_ENGAGED),
        rpm_after_clutch: r.f32(l::RPM_AFTER_CLUTCH),
        current_gear: gear & 0x0F,
        suggested_gear: gear >> 4,
        boost: r.f32(l::BOOST) - 1.0,
        oil_temp: r.f32(l::OIL_TEMP),
        oil_pressure: r.f32(l::OIL_PRESSURE),
        water_temp: r.f32(l::WATER_TEMP),
        fuel_level: r.f32(l::FUEL_LEVEL),
        fuel_capacity: r.f32(l::FUEL_CAPACITY),
        gear_top_speeds: l::GEAR_TOP_SPEED.map(|f| r.f32(f)),
        car_speed,
        ride_height_mm: r.f32(l::RIDE_HEIGHT) * 1000.0,
        suspension: r.wheels(l::SUSPENSION),
        tire_temp: r.wheels(l::TIRE_TEMP),
        tire_diameter,
        wheel_angular_speed,
        tire_speed,
        tire_slip_ratio: dynamics::slip_ratios(tire_speed, car_speed),
        position: vec3(l::POSITION),
        velocity: vec3(l::VELOCITY),
        angular_velocity: vec3(l::ANGULAR_VELOCITY),
        quaternion,
        rotation,
        estimated_top_speed: r.i16(l::ESTIMATED_TOP_SPEED),
    })
}

/// Pedal byte as a 0..1 fraction (raw / 2.55 gives percent).
fn pedal(raw: u8) -> f32 {
    f32::from(raw) / 255.0
}
