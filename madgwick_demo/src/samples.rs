use ahrs::Vector3;
use crossbeam_channel::Sender;
use std::fs;
use std::path::Path;
use std::{thread, time::Duration};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
	/// rad/s
	pub gyroscope: Vector3<f32>,
	pub accelerometer: Vector3<f32>,
}

/// Parses `x,y,z`.
pub fn parse_vector(text: &str) -> anyhow::Result<Vector3<f32>> {
	let values = parse_values(text)?;

	if values.len() != 3 {
		return Err(anyhow!("Expected 3 components, found {} in \"{}\"", values.len(), text));
	}

	Ok(Vector3::new(values[0], values[1], values[2]))
}

/// Parses `gx,gy,gz,ax,ay,az`.
pub fn parse_sample(line: &str) -> anyhow::Result<Sample> {
	let values = parse_values(line)?;

	if values.len() != 6 {
		return Err(anyhow!("Expected 6 values (gx,gy,gz,ax,ay,az), found {}", values.len()));
	}

	Ok(Sample {
		gyroscope: Vector3::new(values[0], values[1], values[2]),
		accelerometer: Vector3::new(values[3], values[4], values[5]),
	})
}

fn parse_values(text: &str) -> anyhow::Result<Vec<f32>> {
	text.split(',')
		.map(|value| {
			let value = value.trim();
			value
				.parse::<f32>()
				.map_err(|e| anyhow!("Invalid number \"{}\": {}", value, e))
		})
		.collect()
}

/// One sample per line. Blank lines and lines starting with `#` are skipped.
pub fn parse_samples(content: &str) -> anyhow::Result<Vec<Sample>> {
	content
		.lines()
		.enumerate()
		.map(|(index, line)| (index + 1, line.trim()))
		.filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
		.map(|(line_number, line)| {
			parse_sample(line).map_err(|e| anyhow!("Line {}: {}", line_number, e))
		})
		.collect()
}

pub fn read_samples(path: &Path) -> anyhow::Result<Vec<Sample>> {
	let content = fs::read_to_string(path)
		.map_err(|e| anyhow!("Failed to read samples from {:?}: {}", path, e))?;

	parse_samples(&content)
}

/// Feeds recorded samples to the filter thread, optionally paced at the sample period.
pub struct SampleReplay {
	samples: Vec<Sample>,
	period: Option<Duration>,
}

impl SampleReplay {
	pub fn new(samples: Vec<Sample>, period: Option<Duration>) -> Self {
		Self { samples, period }
	}

	fn replay(self, sender: Sender<Sample>) {
		for sample in self.samples {
			if sender.send(sample).is_err() {
				warn!("Sample receiver disconnected, stopping replay");
				return;
			}

			if let Some(period) = self.period {
				thread::sleep(period);
			}
		}

		debug!("Sample replay finished");
	}

	/// The channel is closed once every sample has been sent.
	pub fn spawn(self, sender: Sender<Sample>) -> thread::JoinHandle<()> {
		thread::spawn(move || self.replay(sender))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crossbeam_channel::unbounded;

	#[test]
	fn parse_vector_test() {
		assert_eq!(parse_vector("0.05, 0.065,0.9").unwrap(), Vector3::new(0.05, 0.065, 0.9));
		assert_eq!(parse_vector("-1,0,1e-3").unwrap(), Vector3::new(-1.0, 0.0, 0.001));
		assert!(parse_vector("1,2").is_err());
		assert!(parse_vector("1,2,z").is_err());
	}

	#[test]
	fn parse_samples_test() {
		let content = "# gx,gy,gz,ax,ay,az\n\
					   0.05,0.065,0.9,0,0,0\n\
					   \n\
					   0.1, -0.2, 0.3, 0.0, 0.0, 9.81\n";

		let samples = parse_samples(content).unwrap();

		assert_eq!(samples.len(), 2);
		assert_eq!(samples[0].gyroscope, Vector3::new(0.05, 0.065, 0.9));
		assert_eq!(samples[0].accelerometer, Vector3::new(0.0, 0.0, 0.0));
		assert_eq!(samples[1].gyroscope, Vector3::new(0.1, -0.2, 0.3));
		assert_eq!(samples[1].accelerometer, Vector3::new(0.0, 0.0, 9.81));
	}

	#[test]
	fn parse_samples_reports_line_test() {
		let content = "0,0,0,0,0,1\n# comment\n0,0,0,0,1\n";

		let message = parse_samples(content).unwrap_err().to_string();

		assert!(message.starts_with("Line 3:"), "unexpected message: {}", message);
	}

	#[test]
	fn replay_test() {
		let samples = parse_samples("0,0,0,0,0,1\n0,0,1,0,0,1\n0,1,0,0,0,1\n").unwrap();
		let (sender, receiver) = unbounded::<Sample>();

		SampleReplay::new(samples.clone(), None).spawn(sender).join().unwrap();

		assert_eq!(receiver.iter().collect::<Vec<Sample>>(), samples);
	}
}
