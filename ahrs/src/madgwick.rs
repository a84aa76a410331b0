#![allow(clippy::many_single_char_names)]

use nalgebra::{Quaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::{inv_sqrt, Ahrs, AhrsError, Quat};

/// About 66.7 Hz.
pub const DEFAULT_SAMPLE_PERIOD: f32 = 0.015;
/// 2 * proportional gain (Kp).
pub const DEFAULT_BETA: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MadgwickConfig {
	/// Time between two successive updates, in seconds.
	pub sample_period: f32,
	/// Gradient descent gain. Higher values converge faster towards the accelerometer but let
	/// more of its noise through.
	pub beta: f32,
}

impl MadgwickConfig {
	pub fn validate(&self) -> Result<(), AhrsError> {
		if !(self.sample_period.is_finite() && self.sample_period > 0.0) {
			return Err(AhrsError::InvalidSamplePeriod(self.sample_period));
		}

		validate_beta(self.beta)
	}
}

impl Default for MadgwickConfig {
	fn default() -> Self {
		MadgwickConfig {
			sample_period: DEFAULT_SAMPLE_PERIOD,
			beta: DEFAULT_BETA,
		}
	}
}

fn validate_beta(beta: f32) -> Result<(), AhrsError> {
	if beta.is_finite() && beta >= 0.0 {
		Ok(())
	} else {
		Err(AhrsError::InvalidBeta(beta))
	}
}

/// Madgwick's gradient descent orientation filter, IMU variant.
///
/// The state is the quaternion of the sensor frame relative to the earth frame. Each call to
/// [`Madgwick::update`] integrates one gyroscope sample, corrected towards the gravity direction
/// measured by the accelerometer, over a fixed sample period.
#[derive(Debug, Clone)]
pub struct Madgwick {
	config: MadgwickConfig,
	quaternion: Quaternion<f32>,
}

impl Madgwick {
	pub fn new() -> Self {
		Madgwick {
			config: MadgwickConfig::default(),
			quaternion: Quaternion::identity(),
		}
	}

	pub fn with_config(config: MadgwickConfig) -> Result<Self, AhrsError> {
		Madgwick::with_quaternion(config, Quat::IDENTITY)
	}

	pub fn with_quaternion(config: MadgwickConfig, quaternion: Quat) -> Result<Self, AhrsError> {
		config.validate()?;

		debug!("Madgwick filter: sample period {} s, beta {}", config.sample_period, config.beta);

		Ok(Madgwick {
			config,
			quaternion: quaternion.into(),
		})
	}

	pub fn config(&self) -> MadgwickConfig {
		self.config
	}

	pub fn sample_period(&self) -> f32 {
		self.config.sample_period
	}

	pub fn beta(&self) -> f32 {
		self.config.beta
	}

	pub fn set_beta(&mut self, beta: f32) -> Result<(), AhrsError> {
		validate_beta(beta)?;
		debug!("Madgwick beta {} -> {}", self.config.beta, beta);
		self.config.beta = beta;
		Ok(())
	}

	pub fn orientation(&self) -> Quat {
		Quat::from(self.quaternion)
	}

	pub fn reset(&mut self) {
		self.quaternion = Quaternion::identity();
	}

	/// Fuses one gyroscope (rad/s) and accelerometer sample and returns the new orientation.
	///
	/// An accelerometer reading of exactly zero on all axes disables the gradient descent
	/// correction for this sample. Non-finite inputs are not checked and propagate into the state.
	pub fn update(&mut self, gyroscope: Vector3<f32>, accelerometer: Vector3<f32>) -> Quat {
		let q = &self.quaternion;
		let (q0, q1, q2, q3) = (q.w, q.i, q.j, q.k);
		let (gx, gy, gz) = (gyroscope.x, gyroscope.y, gyroscope.z);
		let (mut ax, mut ay, mut az) = (accelerometer.x, accelerometer.y, accelerometer.z);

		// Rate of change of quaternion from gyroscope
		let mut q_dot1 = 0.5 * (-q1 * gx - q2 * gy - q3 * gz);
		let mut q_dot2 = 0.5 * (q0 * gx + q2 * gz - q3 * gy);
		let mut q_dot3 = 0.5 * (q0 * gy - q1 * gz + q3 * gx);
		let mut q_dot4 = 0.5 * (q0 * gz + q1 * gy - q2 * gx);

		// A zero reading cannot be normalized
		if !(ax == 0.0 && ay == 0.0 && az == 0.0) {
			let recip_norm = inv_sqrt(ax * ax + ay * ay + az * az);
			ax *= recip_norm;
			ay *= recip_norm;
			az *= recip_norm;

			let _2q0 = 2.0 * q0;
			let _2q1 = 2.0 * q1;
			let _2q2 = 2.0 * q2;
			let _2q3 = 2.0 * q3;
			let _4q0 = 4.0 * q0;
			let _4q1 = 4.0 * q1;
			let _4q2 = 4.0 * q2;
			let _8q1 = 8.0 * q1;
			let _8q2 = 8.0 * q2;
			let q0q0 = q0 * q0;
			let q1q1 = q1 * q1;
			let q2q2 = q2 * q2;
			let q3q3 = q3 * q3;

			// Gradient of f(q, a) = R(q)^T * [0, 0, 1]^T - a
			#[rustfmt::skip]
			let (mut s0, mut s1, mut s2, mut s3) = (
				_4q0 * q2q2 + _2q2 * ax + _4q0 * q1q1 - _2q1 * ay,
				_4q1 * q3q3 - _2q3 * ax + 4.0 * q0q0 * q1 - _2q0 * ay - _4q1 + _8q1 * q1q1 + _8q1 * q2q2 + _4q1 * az,
				4.0 * q0q0 * q2 + _2q0 * ax + _4q2 * q3q3 - _2q3 * ay - _4q2 + _8q2 * q1q1 + _8q2 * q2q2 + _4q2 * az,
				4.0 * q1q1 * q3 - _2q1 * ax + 4.0 * q2q2 * q3 - _2q2 * ay,
			);

			// Zero when the estimate already matches gravity, in which case the step stays zero
			let recip_norm = inv_sqrt(s0 * s0 + s1 * s1 + s2 * s2 + s3 * s3);
			s0 *= recip_norm;
			s1 *= recip_norm;
			s2 *= recip_norm;
			s3 *= recip_norm;

			let beta = self.config.beta;
			q_dot1 -= beta * s0;
			q_dot2 -= beta * s1;
			q_dot3 -= beta * s2;
			q_dot4 -= beta * s3;
		} else {
			trace!("Zero accelerometer reading, gyroscope integration only");
		}

		// Integrate rate of change of quaternion
		let step = 1.0 / self.config.sample_period;
		let q0 = q0 + q_dot1 * step;
		let q1 = q1 + q_dot2 * step;
		let q2 = q2 + q_dot3 * step;
		let q3 = q3 + q_dot4 * step;

		let recip_norm = inv_sqrt(q0 * q0 + q1 * q1 + q2 * q2 + q3 * q3);
		self.quaternion = Quaternion::new(
			q0 * recip_norm,
			q1 * recip_norm,
			q2 * recip_norm,
			q3 * recip_norm,
		);

		self.orientation()
	}
}

impl Default for Madgwick {
	fn default() -> Self {
		Madgwick::new()
	}
}

impl Ahrs for Madgwick {
	fn update_imu(&mut self,
				  gyroscope: &Vector3<f32>,
				  accelerometer: &Vector3<f32>) -> Quat {
		self.update(*gyroscope, *accelerometer)
	}

	fn orientation(&self) -> Quat {
		Madgwick::orientation(self)
	}
}
