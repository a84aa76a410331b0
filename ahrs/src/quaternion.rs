use nalgebra::{Quaternion, UnitQuaternion};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Orientation quaternion laid out as vector part `(x, y, z)` followed by scalar part `s`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quat {
	pub x: f32,
	pub y: f32,
	pub z: f32,
	pub s: f32,
}

impl Quat {
	pub const IDENTITY: Quat = Quat { x: 0.0, y: 0.0, z: 0.0, s: 1.0 };

	pub const fn new(x: f32, y: f32, z: f32, s: f32) -> Self {
		Quat { x, y, z, s }
	}

	pub fn norm_squared(&self) -> f32 {
		self.x * self.x + self.y * self.y + self.z * self.z + self.s * self.s
	}

	/// Roll, pitch and yaw in radians. The quaternion is renormalized first.
	pub fn euler_angles(&self) -> (f32, f32, f32) {
		UnitQuaternion::from_quaternion(Quaternion::from(*self)).euler_angles()
	}
}

impl Default for Quat {
	fn default() -> Self {
		Quat::IDENTITY
	}
}

impl From<Quat> for Quaternion<f32> {
	fn from(q: Quat) -> Self {
		Quaternion::new(q.s, q.x, q.y, q.z)
	}
}

impl From<Quaternion<f32>> for Quat {
	fn from(q: Quaternion<f32>) -> Self {
		Quat::new(q.i, q.j, q.k, q.w)
	}
}

impl fmt::Display for Quat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}, {}, {}, {}", self.x, self.y, self.z, self.s)
	}
}

#[cfg(test)]
mod tests {
	use super::Quat;
	use nalgebra::Quaternion;

	#[test]
	fn scalar_part_mapping_test() {
		let q: Quaternion<f32> = Quat::new(0.1, 0.2, 0.3, 0.9).into();
		assert_eq!((q.w, q.i, q.j, q.k), (0.9, 0.1, 0.2, 0.3));

		let back = Quat::from(q);
		assert_eq!(back, Quat::new(0.1, 0.2, 0.3, 0.9));
	}

	#[test]
	fn display_test() {
		assert_eq!(Quat::new(0.5, -0.25, 0.0, 1.0).to_string(), "0.5, -0.25, 0, 1");
	}

	#[test]
	fn identity_euler_angles_test() {
		let (roll, pitch, yaw) = Quat::IDENTITY.euler_angles();
		assert!(roll.abs() < 1e-6);
		assert!(pitch.abs() < 1e-6);
		assert!(yaw.abs() < 1e-6);
	}

	#[test]
	fn quarter_turn_yaw_test() {
		let half_angle = std::f32::consts::FRAC_PI_4;
		let (roll, pitch, yaw) = Quat::new(0.0, 0.0, half_angle.sin(), half_angle.cos()).euler_angles();

		assert!(roll.abs() < 1e-5);
		assert!(pitch.abs() < 1e-5);
		assert!((yaw - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
	}
}
