//! IMU-only orientation estimation.
//!
//! Gyroscope and accelerometer readings are fused into a unit quaternion describing the sensor
//! frame relative to the earth frame. No magnetometer is used, so heading drifts freely.

#[macro_use]
extern crate log;

pub use crate::inv_sqrt::inv_sqrt;
pub use crate::madgwick::{Madgwick, MadgwickConfig, DEFAULT_BETA, DEFAULT_SAMPLE_PERIOD};
pub use crate::quaternion::Quat;
pub use nalgebra::Vector3;

use std::{error::Error, fmt};

mod inv_sqrt;
mod madgwick;
mod quaternion;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AhrsError {
	/// Sample period must be finite and strictly positive (seconds).
	InvalidSamplePeriod(f32),
	/// Gain must be finite and non-negative.
	InvalidBeta(f32),
}

impl fmt::Display for AhrsError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AhrsError::InvalidSamplePeriod(period) => write!(f, "Invalid sample period {} s", period),
			AhrsError::InvalidBeta(beta) => write!(f, "Invalid filter gain {}", beta),
		}
	}
}

impl Error for AhrsError {}

pub trait Ahrs where Self: Send + Sync + 'static {
	/// Consumes one gyroscope (rad/s) and accelerometer sample and returns the new orientation.
	/// Must be called once per sample period.
	fn update_imu(&mut self,
				  gyroscope: &Vector3<f32>,
				  accelerometer: &Vector3<f32>) -> Quat;

	fn orientation(&self) -> Quat;
}
