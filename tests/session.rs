use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use droidpad_lib::app::adb::device::DeviceIo;
use droidpad_lib::app::capture_loop::LoopExit;
use droidpad_lib::app::config::InputSettings;
use droidpad_lib::app::error::AppError;
use droidpad_lib::app::frame::Frame;
use droidpad_lib::app::launcher::startup_exit_code;
use droidpad_lib::app::session::{RemoteSession, SessionConfig};
use droidpad_lib::app::translate::{CommandTranslator, InputCapability};

const PNG: &[u8] = b"\x89PNG\r\n\x1a\nbody";

/// Captures succeed a fixed number of times, then the screen goes away.
struct FlakyScreen {
    captures_left: AtomicUsize,
    shell: Mutex<Vec<String>>,
}

impl FlakyScreen {
    fn new(captures: usize) -> Self {
        Self {
            captures_left: AtomicUsize::new(captures),
            shell: Mutex::new(Vec::new()),
        }
    }

    fn shell(&self) -> Vec<String> {
        self.shell.lock().expect("shell").clone()
    }
}

impl DeviceIo for FlakyScreen {
    fn serial(&self) -> &str {
        "flaky"
    }

    fn capture_screen(&self) -> Result<Vec<u8>, AppError> {
        let left = self.captures_left.load(Ordering::SeqCst);
        if left == 0 {
            return Err(AppError::capture("screencap exited with 1", "it"));
        }
        self.captures_left.store(left - 1, Ordering::SeqCst);
        Ok(PNG.to_vec())
    }

    fn execute_shell(&self, command: &str) -> Result<String, AppError> {
        self.shell.lock().expect("shell").push(command.to_string());
        Ok(String::new())
    }
}

fn wait_until(mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done() {
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(5));
    }
    true
}

#[test]
fn capture_failure_leaves_input_working() {
    let device = Arc::new(FlakyScreen::new(2));
    let frames = Arc::new(Mutex::new(Vec::new()));
    let capture_exit = Arc::new(Mutex::new(None));

    let session = {
        let frames = Arc::clone(&frames);
        let capture_exit = Arc::clone(&capture_exit);
        RemoteSession::start(
            device.clone(),
            CommandTranslator::new(InputCapability::SendEvent, &InputSettings::default()),
            SessionConfig {
                capture_interval: Duration::from_millis(10),
                input_interval: Duration::from_millis(10),
                first_sequence: 1,
                trace_id: "it".to_string(),
            },
            Arc::new(move |frame: Frame| frames.lock().expect("frames").push(frame.sequence)),
            Arc::new(move |exit: &LoopExit| {
                *capture_exit.lock().expect("exit") = Some(exit.clone());
            }),
        )
        .expect("start")
    };

    assert!(wait_until(|| !session.is_capturing()));
    session.submit_tap(100, 200);
    assert!(wait_until(|| device.shell().len() >= 5));

    let report = session.join();
    assert!(matches!(report.capture, LoopExit::Failed(ref err) if err.code == "ERR_CAPTURE"));
    assert!(matches!(
        *capture_exit.lock().expect("exit"),
        Some(LoopExit::Failed(_))
    ));
    assert_eq!(*frames.lock().expect("frames"), vec![1, 2]);
    assert_eq!(report.commands.commands, 5);
    assert_eq!(
        device.shell()[1],
        "sendevent /dev/input/event0 3 53 100"
    );
}

#[cfg(unix)]
#[test]
fn no_device_fails_before_any_loop_starts() {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    use clap::Parser;
    use droidpad_lib::app::cli::Cli;
    use droidpad_lib::app::launcher::run_console;

    const EMPTY_ADB: &str = r#"#!/bin/sh
echo "$*" >> "$(dirname "$0")/calls.log"
case "$*" in
  "devices -l") printf 'List of devices attached\n\n' ;;
  *) echo "unexpected call" >&2; exit 1 ;;
esac
"#;

    let dir = tempfile::TempDir::new().expect("tmp");
    let adb = dir.path().join("adb");
    fs::write(&adb, EMPTY_ADB).expect("write script");
    fs::set_permissions(&adb, fs::Permissions::from_mode(0o755)).expect("chmod");
    let config = dir.path().join("config.json");
    let frame = dir.path().join("frame.png");

    let cli = Cli::try_parse_from([
        "droidpad",
        "--adb",
        adb.to_str().expect("utf8"),
        "--config",
        config.to_str().expect("utf8"),
        "--frame-out",
        frame.to_str().expect("utf8"),
    ])
    .expect("parse");

    let err = run_console(&cli, "it").expect_err("no device");
    assert!(err.is_connection());
    assert_eq!(startup_exit_code(&err), 1);

    let calls = fs::read_to_string(dir.path().join("calls.log")).expect("calls");
    assert_eq!(calls.lines().collect::<Vec<_>>(), vec!["devices -l"]);
    assert!(!frame.exists());
}
