use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::app::error::AppError;
use crate::app::frame::{Frame, FrameSlot, SlotWait};
use crate::app::keys::DeviceKey;

pub const HELP: &str = "commands:
  tap X Y          tap at device coordinates
  swipe h|v        swipe 200px right (h) or down (v) from the last tap
  key NAME         power, home, back, apps, settings, up, down
  snap [DIR]       save the latest frame as a PNG
  status           show session state
  quit             close the session";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Tap { x: i32, y: i32 },
    Swipe { horizontal: bool },
    Key(DeviceKey),
    Snapshot(Option<PathBuf>),
    Status,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = parts.collect();
    let command = match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("tap" | "t", [x, y]) => ConsoleCommand::Tap {
            x: parse_coordinate(x)?,
            y: parse_coordinate(y)?,
        },
        ("tap" | "t", _) => return Err("usage: tap X Y".to_string()),
        ("swipe" | "s", [direction]) => match direction.to_ascii_lowercase().as_str() {
            "h" | "horizontal" => ConsoleCommand::Swipe { horizontal: true },
            "v" | "vertical" => ConsoleCommand::Swipe { horizontal: false },
            other => return Err(format!("unknown swipe direction: {other}")),
        },
        ("swipe" | "s", _) => return Err("usage: swipe h|v".to_string()),
        ("key" | "k", [name]) => ConsoleCommand::Key(name.parse()?),
        ("key" | "k", _) => return Err("usage: key NAME".to_string()),
        ("snap", []) => ConsoleCommand::Snapshot(None),
        ("snap", [dir]) => ConsoleCommand::Snapshot(Some(PathBuf::from(dir))),
        ("status", []) => ConsoleCommand::Status,
        ("help" | "?", _) => ConsoleCommand::Help,
        ("quit" | "exit" | "q", _) => ConsoleCommand::Quit,
        (other, _) => return Err(format!("unknown command: {other} (try `help`)")),
    };
    Ok(Some(command))
}

fn parse_coordinate(value: &str) -> Result<i32, String> {
    value
        .parse::<i32>()
        .ok()
        .filter(|coordinate| *coordinate >= 0)
        .ok_or_else(|| format!("invalid coordinate: {value}"))
}

pub fn sanitize_filename_component(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.' {
                ch
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches(['_', '.']).is_empty() {
        "device".to_string()
    } else {
        cleaned
    }
}

pub fn snapshot_path(dir: &Path, serial: &str, captured_at: DateTime<Utc>) -> PathBuf {
    dir.join(format!(
        "screenshot_{}_{}.png",
        sanitize_filename_component(serial),
        captured_at.format("%Y%m%d_%H%M%S")
    ))
}

/// Writes through a temp file in the same directory so readers never see a partial frame.
pub fn write_frame_atomically(path: &Path, frame: &Frame, trace_id: &str) -> Result<(), AppError> {
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)
        .map_err(|err| AppError::system(format!("Failed to create frame dir: {err}"), trace_id))?;
    let mut temp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|err| AppError::system(format!("Failed to create temp frame: {err}"), trace_id))?;
    temp.write_all(frame.bytes())
        .map_err(|err| AppError::system(format!("Failed to write frame: {err}"), trace_id))?;
    temp.persist(path)
        .map_err(|err| AppError::system(format!("Failed to replace frame: {}", err.error), trace_id))?;
    Ok(())
}

pub struct FrameDisplay {
    slot: Arc<FrameSlot>,
    latest: Arc<Mutex<Option<Frame>>>,
    join: JoinHandle<u64>,
}

impl FrameDisplay {
    pub fn spawn(output: Option<PathBuf>, trace_id: &str) -> Result<Self, AppError> {
        let slot = Arc::new(FrameSlot::new());
        let latest: Arc<Mutex<Option<Frame>>> = Arc::new(Mutex::new(None));
        let slot_thread = Arc::clone(&slot);
        let latest_thread = Arc::clone(&latest);
        let trace_thread = trace_id.to_string();

        let join = thread::Builder::new()
            .name("frame-display".to_string())
            .spawn(move || {
                let mut shown = 0u64;
                loop {
                    let frame = match slot_thread.wait_timeout(Duration::from_millis(250)) {
                        SlotWait::Frame(frame) => frame,
                        SlotWait::TimedOut => continue,
                        SlotWait::Closed => break,
                    };
                    if let Some(path) = &output {
                        if let Err(err) = write_frame_atomically(path, &frame, &trace_thread) {
                            warn!(trace_id = %trace_thread, error = %err, "failed to update frame file");
                        }
                    }
                    debug!(sequence = frame.sequence, bytes = frame.len(), "frame displayed");
                    *latest_thread.lock().unwrap_or_else(PoisonError::into_inner) = Some(frame);
                    shown += 1;
                }
                shown
            })
            .map_err(|err| {
                AppError::system(format!("Failed to spawn display thread: {err}"), trace_id)
            })?;

        Ok(Self { slot, latest, join })
    }

    pub fn publish(&self, frame: Frame) {
        if self.slot.publish(frame) {
            debug!("display busy; replaced undisplayed frame");
        }
    }

    pub fn slot(&self) -> Arc<FrameSlot> {
        Arc::clone(&self.slot)
    }

    pub fn latest(&self) -> Option<Frame> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn superseded(&self) -> u64 {
        self.slot.superseded()
    }

    pub fn close(self) -> u64 {
        self.slot.close();
        self.join.join().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::frame::fake_png;
    use chrono::TimeZone;
    use std::time::Instant;

    #[test]
    fn parses_gesture_commands() {
        assert_eq!(
            parse_command("tap 100 200"),
            Ok(Some(ConsoleCommand::Tap { x: 100, y: 200 }))
        );
        assert_eq!(
            parse_command("  swipe V "),
            Ok(Some(ConsoleCommand::Swipe { horizontal: false }))
        );
        assert_eq!(
            parse_command("s h"),
            Ok(Some(ConsoleCommand::Swipe { horizontal: true }))
        );
        assert_eq!(parse_command(""), Ok(None));
    }

    #[test]
    fn parses_keys_and_session_commands() {
        assert_eq!(
            parse_command("key home"),
            Ok(Some(ConsoleCommand::Key(DeviceKey::Home)))
        );
        assert_eq!(
            parse_command("snap /tmp/shots"),
            Ok(Some(ConsoleCommand::Snapshot(Some(PathBuf::from("/tmp/shots")))))
        );
        assert_eq!(parse_command("quit"), Ok(Some(ConsoleCommand::Quit)));
        assert_eq!(parse_command("status"), Ok(Some(ConsoleCommand::Status)));
    }

    #[test]
    fn rejects_malformed_commands() {
        assert!(parse_command("tap 1").is_err());
        assert!(parse_command("tap -5 3").is_err());
        assert!(parse_command("tap x y").is_err());
        assert!(parse_command("swipe diagonal").is_err());
        assert!(parse_command("key volume").is_err());
        assert!(parse_command("dance").is_err());
    }

    #[test]
    fn snapshot_names_use_sanitized_serial_and_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        let path = snapshot_path(Path::new("/out"), "192.168.0.5:5555", at);
        assert_eq!(
            path,
            PathBuf::from("/out/screenshot_192.168.0.5_5555_20240506_070809.png")
        );
        assert_eq!(sanitize_filename_component("///"), "device");
    }

    #[test]
    fn writes_frame_atomically() {
        let tmp = tempfile::TempDir::new().expect("tmp");
        let path = tmp.path().join("nested").join("frame.png");
        let frame = Frame::new(fake_png(3, 3), 1);
        write_frame_atomically(&path, &frame, "t").expect("write");
        assert_eq!(fs::read(&path).expect("read"), frame.bytes());

        let newer = Frame::new(fake_png(5, 5), 2);
        write_frame_atomically(&path, &newer, "t").expect("overwrite");
        assert_eq!(fs::read(&path).expect("read"), newer.bytes());
    }

    #[test]
    fn display_mirrors_latest_frame_to_file() {
        let tmp = tempfile::TempDir::new().expect("tmp");
        let path = tmp.path().join("frame.png");
        let display = FrameDisplay::spawn(Some(path.clone()), "t").expect("spawn");

        display.publish(Frame::new(fake_png(8, 8), 4));
        let deadline = Instant::now() + Duration::from_secs(5);
        while display.latest().is_none() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }

        assert_eq!(display.latest().map(|frame| frame.sequence), Some(4));
        assert_eq!(fs::read(&path).expect("read"), fake_png(8, 8));
        assert_eq!(display.close(), 1);
    }
}
