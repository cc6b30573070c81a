use serde::{Deserialize, Serialize};

/// Which of the two known buffer layouts a snapshot was decoded from.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PacketLayout {
    /// Short buffer: no wheel speed, tire diameter, suspension, clutch,
    /// gear table, car id or quaternion scalar.
    Legacy,
    /// Full 296 byte buffer.
    #[default]
    Extended,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// One value per wheel: front-left, front-right, rear-left, rear-right.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct Wheels<T> {
    pub fl: T,
    pub fr: T,
    pub rl: T,
    pub rr: T,
}

impl<T: Copy> Wheels<T> {
    pub const fn new(fl: T, fr: T, rl: T, rr: T) -> Self {
        Self { fl, fr, rl, rr }
    }

    pub const fn splat(v: T) -> Self {
        Self { fl: v, fr: v, rl: v, rr: v }
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Wheels<U> {
        Wheels { fl: f(self.fl), fr: f(self.fr), rl: f(self.rl), rr: f(self.rr) }
    }

    pub fn zip<U: Copy>(self, other: Wheels<U>) -> Wheels<(T, U)> {
        Wheels {
            fl: (self.fl, other.fl),
            fr: (self.fr, other.fr),
            rl: (self.rl, other.rl),
            rr: (self.rr, other.rr),
        }
    }

    pub fn to_array(self) -> [T; 4] {
        [self.fl, self.fr, self.rl, self.rr]
    }
}

/// Euler angles in radians.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct Orientation {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

/// Bits of the 16-bit flag word.
pub const FLAG_IN_RACE: u16 = 1 << 0;
pub const FLAG_PAUSED: u16 = 1 << 1;
pub const FLAG_REV_LIMIT: u16 = 1 << 5;
pub const FLAG_ASM_ACTIVE: u16 = 1 << 10;
pub const FLAG_TCS_ACTIVE: u16 = 1 << 11;

/// One decoded telemetry packet.
///
/// Built in a single pass from one decrypted datagram; nothing mutates it
/// afterwards. Fields the active [`PacketLayout`] does not carry are zero.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct TelemetrySnapshot {
    pub layout: PacketLayout,

    // identity
    pub package_id: i32,
    pub car_id: i32,

    // lap / race
    pub best_lap_ms: i32,
    pub last_lap_ms: i32,
    pub current_lap: i16,
    pub total_laps: i16,
    pub current_position: i16,
    pub total_positions: i16,
    pub time_on_track_ms: i32,
    pub paused: bool,
    pub in_race: bool,
    /// Raw 16-bit flag word the two booleans above are taken from.
    pub flags: u16,

    // powertrain
    pub rpm: f32,
    pub rpm_rev_warning: u16,
    pub rpm_rev_limiter: u16,
    pub throttle: f32, // 0..1
    pub brake: f32,    // 0..1
    pub clutch: f32,
    pub clutch_engaged: f32,
    pub rpm_after_clutch: f32,
    pub current_gear: u8,
    pub suggested_gear: u8,
    /// Bar, relative to atmosphere.
    pub boost: f32,
    pub oil_temp: f32,
    pub oil_pressure: f32,
    pub water_temp: f32,
    pub fuel_level: f32,
    pub fuel_capacity: f32,
    /// Gears 1..=8.
    pub gear_top_speeds: [f32; 8],
    /// km/h
    pub car_speed: f32,

    // chassis
    pub ride_height_mm: f32,
    pub suspension: Wheels<f32>,
    pub tire_temp: Wheels<f32>,
    /// Meters.
    pub tire_diameter: Wheels<f32>,
    /// Raw wheel angular speed as sent by the console.
    pub wheel_angular_speed: Wheels<f32>,
    /// km/h, derived from diameter and angular speed.
    pub tire_speed: Wheels<f32>,
    /// Tire speed over car speed, or -1 when the car is not moving forward.
    pub tire_slip_ratio: Wheels<f32>,

    // kinematics
    pub position: Vec3,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    /// x, y, z, w as read from the buffer. Zero in the legacy layout.
    pub quaternion: [f32; 4],
    pub rotation: Orientation,

    pub estimated_top_speed: i16,
}

impl TelemetrySnapshot {
    pub fn rev_limiter_active(&self) -> bool {
        self.flags & FLAG_REV_LIMIT != 0
    }

    pub fn asm_active(&self) -> bool {
        self.flags & FLAG_ASM_ACTIVE != 0
    }

    pub fn tcs_active(&self) -> bool {
        self.flags & FLAG_TCS_ACTIVE != 0
    }

    /// Same bit the decoder takes `in_race` from.
    pub fn in_race_flag(&self) -> bool {
        self.flags & FLAG_IN_RACE != 0
    }

    pub fn paused_flag(&self) -> bool {
        self.flags & FLAG_PAUSED != 0
    }
}
