use ahrs::MadgwickConfig;
use anyhow::Context;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
	pub log_level_filter: String,
	pub filter: MadgwickConfig,
	/// Log records are also written to a file in this directory when set.
	pub log_directory: Option<PathBuf>,
}

pub trait TryIntoLevelFilter {
	fn try_into_level_filter(&self) -> Result<LevelFilter, ()>;
}

impl TryIntoLevelFilter for String {
	fn try_into_level_filter(&self) -> Result<LevelFilter, ()> {
		Ok(match self.as_str() {
			"none" => LevelFilter::Off,
			"error" => LevelFilter::Error,
			"warn" => LevelFilter::Warn,
			"info" => LevelFilter::Info,
			"debug" => LevelFilter::Debug,
			"all" => LevelFilter::Trace,
			_ => return Err(()),
		})
	}
}

impl Default for DemoConfig {
	fn default() -> Self {
		DemoConfig {
			log_level_filter: String::from("info"),
			filter: MadgwickConfig::default(),
			log_directory: None,
		}
	}
}

/// Reads the configuration file, falling back to defaults when it does not exist.
pub fn read(path: &Path) -> anyhow::Result<DemoConfig> {
	let config_file = match File::open(path) {
		Ok(file) => file,
		Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(DemoConfig::default()),
		Err(e) => return Err(e).with_context(|| format!("Failed to open {:?}", path)),
	};

	let config: DemoConfig = serde_json::from_reader(config_file)
		.with_context(|| format!("Failed to parse {:?}", path))?;

	config.filter.validate()?;

	Ok(config)
}

pub fn save(path: &Path, config: &DemoConfig) -> anyhow::Result<()> {
	let mut config_file = OpenOptions::new()
		.create(true)
		.write(true)
		.truncate(true)
		.open(path)?;

	write!(config_file, "{}", serde_json::to_string_pretty(config)?)?;

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn level_filter_test() {
		assert_eq!(String::from("none").try_into_level_filter(), Ok(LevelFilter::Off));
		assert_eq!(String::from("all").try_into_level_filter(), Ok(LevelFilter::Trace));
		assert_eq!(String::from("verbose").try_into_level_filter(), Err(()));
	}

	#[test]
	fn parse_test() {
		let config: DemoConfig = serde_json::from_str(
			r#"{
				"log_level_filter": "debug",
				"filter": { "sample_period": 0.002, "beta": 0.041 },
				"log_directory": "/var/log/imu"
			}"#,
		)
		.unwrap();

		assert_eq!(config.log_level_filter, "debug");
		assert_eq!(config.filter, MadgwickConfig { sample_period: 0.002, beta: 0.041 });
		assert_eq!(config.log_directory, Some(PathBuf::from("/var/log/imu")));
	}

	#[test]
	fn missing_fields_use_defaults_test() {
		let config: DemoConfig = serde_json::from_str(r#"{ "log_level_filter": "warn" }"#).unwrap();

		assert_eq!(config.log_level_filter, "warn");
		assert_eq!(config.filter, MadgwickConfig::default());
		assert_eq!(config.log_directory, None);
	}

	#[test]
	fn missing_file_test() {
		let path = std::env::temp_dir().join("madgwick_demo_missing_config.json");
		let _ = std::fs::remove_file(&path);

		assert_eq!(read(&path).unwrap(), DemoConfig::default());
	}

	#[test]
	fn save_then_read_test() {
		let path = std::env::temp_dir().join(format!("madgwick_demo_config_{}.json", std::process::id()));
		let config = DemoConfig {
			log_level_filter: String::from("error"),
			filter: MadgwickConfig { sample_period: 0.01, beta: 0.5 },
			log_directory: None,
		};

		save(&path, &config).unwrap();
		let read_back = read(&path).unwrap();
		std::fs::remove_file(&path).unwrap();

		assert_eq!(read_back, config);
	}

	#[test]
	fn invalid_filter_is_rejected_test() {
		let path = std::env::temp_dir().join(format!("madgwick_demo_invalid_{}.json", std::process::id()));
		std::fs::write(&path, r#"{ "filter": { "sample_period": 0.0, "beta": 0.1 } }"#).unwrap();

		let result = read(&path);
		std::fs::remove_file(&path).unwrap();

		assert!(result.is_err());
	}
}
