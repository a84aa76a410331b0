#[macro_use]
extern crate anyhow;

#[macro_use]
extern crate log;

use std::path::Path;
use std::time::Duration;

use clap::{Arg, Command};
use crossbeam_channel::unbounded;

use ahrs::{Madgwick, Vector3};
use black_box::BlackBox;

use crate::demo_config::TryIntoLevelFilter;
use crate::samples::{Sample, SampleReplay};

mod demo_config;
mod samples;

fn main() -> anyhow::Result<()> {
	// Command line arguments
	const CONFIG_ARG: &str = "config";
	const GYRO_ARG: &str = "gyro";
	const ACCEL_ARG: &str = "accel";
	const REPEAT_ARG: &str = "repeat";
	const SAMPLES_ARG: &str = "samples";
	const REALTIME_ARG: &str = "realtime";
	const SAVE_CONFIG_ARG: &str = "save-config";

	let args = Command::new("Madgwick IMU filter")
		.version(env!("CARGO_PKG_VERSION"))
		.about("Fuses gyroscope and accelerometer samples and prints the orientation as x, y, z, s")
		.arg(Arg::new(CONFIG_ARG)
			.long("config")
			.value_name("FILE")
			.default_value("madgwick.json")
			.help("JSON configuration file, defaults are used if it does not exist")
			.takes_value(true))
		.arg(Arg::new(GYRO_ARG)
			.long("gyro")
			.value_name("X,Y,Z")
			.help("Gyroscope sample in rad/s")
			.allow_hyphen_values(true)
			.takes_value(true))
		.arg(Arg::new(ACCEL_ARG)
			.long("accel")
			.value_name("X,Y,Z")
			.help("Accelerometer sample")
			.allow_hyphen_values(true)
			.takes_value(true))
		.arg(Arg::new(REPEAT_ARG)
			.long("repeat")
			.value_name("N")
			.help("Number of updates with the single sample, 1 by default")
			.takes_value(true))
		.arg(Arg::new(SAMPLES_ARG)
			.long("samples")
			.value_name("FILE")
			.help("Replay samples from a file, one gx,gy,gz,ax,ay,az line per update")
			.conflicts_with_all(&[GYRO_ARG, ACCEL_ARG, REPEAT_ARG])
			.takes_value(true))
		.arg(Arg::new(REALTIME_ARG)
			.long("realtime")
			.help("Pace updates at the configured sample period")
			.takes_value(false))
		.arg(Arg::new(SAVE_CONFIG_ARG)
			.long("save-config")
			.help("Write the effective configuration back to the configuration file")
			.takes_value(false))
		.get_matches();

	// Configuration
	let config_path = Path::new(args.value_of(CONFIG_ARG).unwrap_or("madgwick.json"));
	let config = demo_config::read(config_path)?;

	// Log
	let level_filter = config.log_level_filter
		.try_into_level_filter()
		.map_err(|_| anyhow!("Invalid log level filter \"{}\"", config.log_level_filter))?;

	let black_box = match &config.log_directory {
		Some(directory) => BlackBox::with_directory(directory)?,
		None => BlackBox::new(),
	};
	let log_path = black_box.log_path().map(Path::to_path_buf);

	black_box.spawn(level_filter)
		.map_err(|e| anyhow!("Failed to install logger: {}", e))?;

	info!("Madgwick demo {}", env!("CARGO_PKG_VERSION"));
	if let Some(log_path) = log_path {
		info!("Logging to {:?}", log_path);
	}

	if args.is_present(SAVE_CONFIG_ARG) {
		demo_config::save(config_path, &config)?;
		info!("Configuration saved to {:?}", config_path);
	}

	// Samples
	let samples: Vec<Sample> = match args.value_of(SAMPLES_ARG) {
		Some(path) => samples::read_samples(Path::new(path))?,
		None => {
			let gyroscope = match args.value_of(GYRO_ARG) {
				Some(text) => samples::parse_vector(text)?,
				None => Vector3::new(0.05, 0.065, 0.9),
			};
			let accelerometer = match args.value_of(ACCEL_ARG) {
				Some(text) => samples::parse_vector(text)?,
				None => Vector3::new(0.0, 0.0, 0.0),
			};
			let repeat: usize = args.value_of(REPEAT_ARG)
				.unwrap_or("1")
				.parse()
				.map_err(|e| anyhow!("Invalid repeat count: {}", e))?;

			vec![Sample { gyroscope, accelerometer }; repeat]
		}
	};

	info!("{} sample(s), sample period {} s, beta {}",
		  samples.len(), config.filter.sample_period, config.filter.beta);

	// Filter
	let mut filter = Madgwick::with_config(config.filter)?;

	let pace = if args.is_present(REALTIME_ARG) {
		Some(Duration::from_secs_f32(config.filter.sample_period))
	} else {
		None
	};

	let (sample_sender, sample_receiver) = unbounded::<Sample>();
	let replay = SampleReplay::new(samples, pace).spawn(sample_sender);

	for sample in sample_receiver {
		let orientation = filter.update(sample.gyroscope, sample.accelerometer);
		println!("{}", orientation);

		let (roll, pitch, yaw) = orientation.euler_angles();
		debug!("roll {:.3} pitch {:.3} yaw {:.3} (rad)", roll, pitch, yaw);
	}

	replay.join().map_err(|_| anyhow!("Sample replay thread panicked"))?;

	log::logger().flush();

	Ok(())
}
