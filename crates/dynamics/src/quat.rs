pub type Vector3 = [f64; 3];

const NORM_EPSILON: f64 = 1e-10;
const GIMBAL_EPSILON: f64 = 1e-6;

/// Quaternion stored as `x, y, z, w` with `w` the scalar part.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quat {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Quat = Quat { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };

    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    pub fn from_f32(q: [f32; 4]) -> Self {
        Self::new(q[0] as f64, q[1] as f64, q[2] as f64, q[3] as f64)
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt()
    }

    /// Unit quaternion in the same direction. Near-zero input is returned as is.
    pub fn normalize(self) -> Self {
        let m = self.magnitude();
        if m < NORM_EPSILON {
            return self;
        }
        Self::new(self.x / m, self.y / m, self.z / m, self.w / m)
    }

    pub fn conjugate(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    pub fn vector(&self) -> Vector3 {
        [self.x, self.y, self.z]
    }

    /// Rotate `v` by this quaternion: `v + 2 * (q_v x (q_v x v + w * v))`.
    pub fn rotate(&self, v: Vector3) -> Vector3 {
        let qv = self.vector();
        let p = add(cross(qv, v), scale(v, self.w));
        add(v, cross(scale(qv, 2.0), p))
    }

    /// Roll, pitch and yaw in radians.
    ///
    /// The components are permuted to `(w, z, x, y)` before decomposition so
    /// the rotation axes come out in roll/pitch/yaw order, and the results are
    /// negated to match the console's axis handedness.
    pub fn roll_pitch_yaw(&self) -> (f64, f64, f64) {
        let p = Quat::new(self.w, self.z, self.x, self.y).normalize();
        // p.x..p.w here hold p0..p3 of the permuted quaternion
        let (p0, p1, p2, p3) = (p.x, p.y, p.z, p.w);

        let pitch = (2.0 * (p0 * p2 - p1 * p3)).clamp(-1.0, 1.0).asin();

        let (roll, yaw) = if pitch.abs() > std::f64::consts::FRAC_PI_2 - GIMBAL_EPSILON {
            (p1.atan2(p0), 0.0)
        } else {
            let roll = (2.0 * (p0 * p1 + p2 * p3)).atan2(1.0 - 2.0 * (p1 * p1 + p2 * p2));
            let yaw = (2.0 * (p0 * p3 + p1 * p2)).atan2(1.0 - 2.0 * (p2 * p2 + p3 * p3));
            (roll, yaw)
        };

        (-roll, -pitch, -yaw)
    }
}

fn cross(a: Vector3, b: Vector3) -> Vector3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn add(a: Vector3, b: Vector3) -> Vector3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

fn scale(a: Vector3, s: f64) -> Vector3 {
    [a[0] * s, a[1] * s, a[2] * s]
}
