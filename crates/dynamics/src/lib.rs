//! Quantities derived from raw GT7 sensor values: tire surface speed, slip
//! ratio and orientation.

use model::{Orientation, Wheels};

mod quat;

pub use quat::{Quat, Vector3};

/// m/s -> km/h
pub const KMH_PER_MPS: f32 = 3.6;

/// Slip ratio reported for every wheel while the car is not moving forward.
pub const SLIP_UNDEFINED: f32 = -1.0;

/// Surface speed of one tire in km/h.
///
/// Angular speed sign depends on the direction of travel, so the result is
/// always taken as a magnitude.
pub fn tire_speed(diameter: f32, angular_speed: f32) -> f32 {
    (KMH_PER_MPS * diameter * angular_speed).abs()
}

pub fn tire_speeds(diameter: Wheels<f32>, angular_speed: Wheels<f32>) -> Wheels<f32> {
    diameter.zip(angular_speed).map(|(d, w)| tire_speed(d, w))
}

/// Per-wheel tire speed over car speed.
///
/// When `car_speed <= 0` all four wheels get [`SLIP_UNDEFINED`].
pub fn slip_ratios(tire_speed: Wheels<f32>, car_speed: f32) -> Wheels<f32> {
    if car_speed <= 0.0 {
        return Wheels::splat(SLIP_UNDEFINED);
    }
    tire_speed.map(|s| s / car_speed)
}

/// Euler angles for a buffer quaternion given as `[x, y, z, w]`.
pub fn orientation(q: [f32; 4]) -> Orientation {
    let (roll, pitch, yaw) = Quat::from_f32(q).roll_pitch_yaw();
    Orientation { pitch: pitch as f32, yaw: yaw as f32, roll: roll as f32 }
}
