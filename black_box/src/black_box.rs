use chrono::Local;
use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::{
	collections::VecDeque,
	fs::{File, OpenOptions},
	io::{self, Write},
	path::{Path, PathBuf},
	thread,
	thread::JoinHandle,
	time::{Duration, Instant},
};

lazy_static! {
    static ref BLACK_BOX_CHANNEL: (Sender<Message>, Receiver<Message>) = unbounded::<Message>();
    static ref BLACK_BOX_LOGGER: BlackBoxLogger = BlackBoxLogger {
        start_instant: Instant::now()
    };
}

enum Message {
	Log(String),
	/// Acknowledged once every buffered record has been written out.
	Flush(Sender<()>),
}

/// Buffered log writer fed by the global logger. Records always go to stderr, stdout is left to
/// the application.
pub struct BlackBox {
	file: Option<(File, PathBuf)>,
	buffer: VecDeque<String>,
}

impl BlackBox {
	pub fn new() -> Self {
		BlackBox {
			file: None,
			buffer: VecDeque::<String>::new(),
		}
	}

	/// Also writes records to a new timestamped file in `directory`.
	pub fn with_directory(directory: &Path) -> io::Result<Self> {
		let log_file_name = Local::now()
			.format("madgwick_%Y-%m-%d_%H-%M-%S.log")
			.to_string();
		let path = directory.join(log_file_name);

		let file = OpenOptions::new()
			.write(true)
			.create(true)
			.truncate(true)
			.open(&path)?;

		Ok(BlackBox {
			file: Some((file, path)),
			buffer: VecDeque::<String>::new(),
		})
	}

	pub fn log_path(&self) -> Option<&Path> {
		self.file.as_ref().map(|(_, path)| path.as_path())
	}

	fn flush(&mut self) {
		let stderr = io::stderr();
		let mut stderr = stderr.lock();

		while let Some(message) = self.buffer.pop_front() {
			let _ = writeln!(stderr, "{}", message);

			if let Some((file, path)) = &mut self.file {
				if let Err(e) = writeln!(file, "{}", message) {
					let _ = writeln!(stderr, "Failed to write black box file {:?}: {}", path, e);
					self.file = None;
				}
			}
		}
	}

	fn receive_loop(&mut self, receiver: &Receiver<Message>) {
		const RECEIVE_TIMEOUT: Duration = Duration::from_millis(500);
		const MAX_BUFFER_LEN: usize = 8;

		loop {
			match receiver.recv_timeout(RECEIVE_TIMEOUT) {
				Ok(Message::Log(content)) => {
					self.buffer.push_back(content);
					if self.buffer.len() > MAX_BUFFER_LEN {
						self.flush();
					}
				}
				Ok(Message::Flush(ack)) => {
					self.flush();
					let _ = ack.send(());
				}
				Err(RecvTimeoutError::Timeout) => self.flush(),
				Err(RecvTimeoutError::Disconnected) => {
					self.flush();
					return;
				}
			}
		}
	}

	/// Installs the global logger and starts the writer thread. Fails if a logger is already set.
	pub fn spawn(mut self, level_filter: LevelFilter) -> Result<JoinHandle<()>, SetLoggerError> {
		log::set_logger(&*BLACK_BOX_LOGGER)?;
		log::set_max_level(level_filter);

		Ok(thread::spawn(move || self.receive_loop(&BLACK_BOX_CHANNEL.1)))
	}
}

impl Default for BlackBox {
	fn default() -> Self {
		BlackBox::new()
	}
}

struct BlackBoxLogger {
	start_instant: Instant,
}

impl Log for BlackBoxLogger {
	fn enabled(&self, _: &Metadata) -> bool {
		true
	}

	fn log(&self, record: &Record) {
		if self.enabled(record.metadata()) {
			let formatted = format_record(Instant::now() - self.start_instant, record);
			let _ = BLACK_BOX_CHANNEL.0.send(Message::Log(formatted));
		}
	}

	/// Blocks until the writer thread has drained its buffer, or for at most one second.
	fn flush(&self) {
		const FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

		let (ack_sender, ack_receiver) = bounded::<()>(1);
		if BLACK_BOX_CHANNEL.0.send(Message::Flush(ack_sender)).is_ok() {
			let _ = ack_receiver.recv_timeout(FLUSH_TIMEOUT);
		}
	}
}

fn format_record(elapsed: Duration, record: &Record) -> String {
	if record.level() == Level::Error {
		format!(
			"[{:.3}][{:?}][{}] {} ({}:{})",
			elapsed.as_secs_f32(),
			record.level(),
			record.module_path().unwrap_or("unknown"),
			record.args(),
			record.file().unwrap_or("unknown"),
			record.line().unwrap_or(0)
		)
	} else {
		format!(
			"[{:.3}][{:?}][{}] {}",
			elapsed.as_secs_f32(),
			record.level(),
			record.module_path().unwrap_or("unknown"),
			record.args(),
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;

	#[test]
	fn format_test() {
		let formatted = format_record(
			Duration::from_millis(1500),
			&Record::builder()
				.args(format_args!("beta {}", 0.1))
				.level(Level::Info)
				.module_path(Some("madgwick_demo"))
				.build(),
		);

		assert_eq!(formatted, "[1.500][Info][madgwick_demo] beta 0.1");
	}

	#[test]
	fn format_error_location_test() {
		let formatted = format_record(
			Duration::from_millis(250),
			&Record::builder()
				.args(format_args!("failed"))
				.level(Level::Error)
				.module_path(Some("ahrs"))
				.file(Some("src/madgwick.rs"))
				.line(Some(42))
				.build(),
		);

		assert_eq!(formatted, "[0.250][Error][ahrs] failed (src/madgwick.rs:42)");
	}

	#[test]
	fn flush_writes_buffered_records_test() {
		let directory = std::env::temp_dir().join(format!("black_box_test_{}", std::process::id()));
		fs::create_dir_all(&directory).unwrap();

		let mut black_box = BlackBox::with_directory(&directory).unwrap();
		let path = black_box.log_path().unwrap().to_path_buf();

		let (sender, receiver) = unbounded::<Message>();
		let handle = thread::spawn(move || black_box.receive_loop(&receiver));

		sender.send(Message::Log(String::from("first"))).unwrap();
		sender.send(Message::Log(String::from("second"))).unwrap();

		let (ack_sender, ack_receiver) = bounded::<()>(1);
		sender.send(Message::Flush(ack_sender)).unwrap();
		ack_receiver.recv_timeout(Duration::from_secs(5)).unwrap();

		assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");

		drop(sender);
		handle.join().unwrap();
		fs::remove_dir_all(&directory).unwrap();
	}
}
