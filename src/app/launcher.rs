use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::app::adb::device::{connect, AdbDevice, ConnectOptions, DeviceIo};
use crate::app::adb::locator::{resolve_adb_program, validate_adb_program};
use crate::app::capture_loop::LoopExit;
use crate::app::cli::Cli;
use crate::app::config::{load_config_from_path, save_config_to_path, AppConfig};
use crate::app::console::{
    parse_command, snapshot_path, write_frame_atomically, ConsoleCommand, FrameDisplay, HELP,
};
use crate::app::error::AppError;
use crate::app::frame::Frame;
use crate::app::session::{RemoteSession, SessionConfig};
use crate::app::translate::{CommandTranslator, InputCapability};

pub fn build_config(cli: &Cli, trace_id: &str) -> Result<AppConfig, AppError> {
    let mut config = load_config_from_path(&cli.config_file(), trace_id)?;
    cli.apply_to(&mut config);
    Ok(config)
}

pub fn write_config(cli: &Cli, trace_id: &str) -> Result<PathBuf, AppError> {
    let config = build_config(cli, trace_id)?;
    let path = cli.config_file();
    save_config_to_path(&config, &path, trace_id)?;
    Ok(path)
}

pub fn connect_options(cli: &Cli, config: &AppConfig, trace_id: &str) -> Result<ConnectOptions, AppError> {
    let adb_program = resolve_adb_program(cli.adb.as_deref(), &config.adb.command_path);
    validate_adb_program(&adb_program, trace_id)?;
    Ok(ConnectOptions {
        adb_program,
        preferred_serial: cli.serial.clone(),
        command_timeout: config.adb_timeout(),
        capture_timeout: config.capture_timeout(),
        serialize_io: config.adb.serialize_io,
    })
}

pub fn select_translator(device: &AdbDevice, config: &AppConfig, trace_id: &str) -> CommandTranslator {
    let probed = device.probe_supports_swipe().unwrap_or_else(|err| {
        warn!(trace_id = %trace_id, error = %err, "input probe failed; assuming sendevent only");
        false
    });
    let capability = InputCapability::resolve(probed, config.input.capability);
    info!(trace_id = %trace_id, capability = %capability, "input capability selected");
    CommandTranslator::new(capability, &config.input)
}

pub fn startup_exit_code(_err: &AppError) -> u8 {
    1
}

pub fn startup_message(err: &AppError) -> String {
    if err.is_connection() {
        err.error.clone()
    } else {
        err.to_string()
    }
}

pub fn run_console(cli: &Cli, trace_id: &str) -> Result<(), AppError> {
    let config = build_config(cli, trace_id)?;
    let options = connect_options(cli, &config, trace_id)?;
    let device = Arc::new(connect(&options, trace_id)?);
    println!("Connect to android device: {}", device.serial());

    let output = Some(config.display.frame_output_path.trim())
        .filter(|path| !path.is_empty())
        .map(PathBuf::from);
    let display = Arc::new(FrameDisplay::spawn(output, trace_id)?);

    match device.capture_screen() {
        Ok(bytes) => {
            let frame = Frame::new(bytes, 0);
            match frame.dimensions() {
                Some((width, height)) => info!(trace_id = %trace_id, width, height, "screen size"),
                None => warn!(trace_id = %trace_id, "could not read screen size from first frame"),
            }
            display.publish(frame);
        }
        Err(err) => warn!(trace_id = %trace_id, error = %err, "initial capture failed"),
    }

    let translator = select_translator(&device, &config, trace_id);
    let session_config = SessionConfig {
        capture_interval: config.capture_interval(),
        input_interval: config.input_interval(),
        first_sequence: 1,
        trace_id: trace_id.to_string(),
    };
    let frame_sink = Arc::clone(&display);
    let session = RemoteSession::start(
        device,
        translator,
        session_config,
        Arc::new(move |frame: Frame| frame_sink.publish(frame)),
        Arc::new(|exit: &LoopExit| {
            if let LoopExit::Failed(err) = exit {
                eprintln!("Screen capture stopped ({}); input still works.", err.error);
            }
        }),
    )?;

    println!("{HELP}");
    let snapshot_dir = PathBuf::from(config.display.snapshot_dir.trim());
    read_console(&session, &display, &snapshot_dir, cli.verbose, trace_id);

    let report = session.join();
    let superseded = display.superseded();
    let shown = match Arc::try_unwrap(display) {
        Ok(display) => display.close(),
        Err(shared) => {
            shared.slot().close();
            0
        }
    };
    info!(
        trace_id = %trace_id,
        capture = ?report.capture,
        commands = report.commands.commands,
        command_failures = report.commands.failures,
        frames_shown = shown,
        frames_superseded = superseded,
        "session closed"
    );
    Ok(())
}

/// The coordinating thread: blocks on stdin and dispatches each event.
fn read_console(
    session: &RemoteSession,
    display: &FrameDisplay,
    snapshot_dir: &Path,
    verbose: bool,
    trace_id: &str,
) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                warn!(trace_id = %trace_id, error = %err, "failed to read console input");
                break;
            }
        };
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                eprintln!("{message}");
                continue;
            }
        };
        if verbose {
            info!(event = ?command, "console event");
        }
        match command {
            ConsoleCommand::Tap { x, y } => session.submit_tap(x, y),
            ConsoleCommand::Swipe { horizontal } => session.submit_swipe(horizontal),
            ConsoleCommand::Key(key) => {
                if let Err(err) = session.send_key(key) {
                    warn!(trace_id = %trace_id, key = %key, error = %err, "key command failed");
                }
            }
            ConsoleCommand::Snapshot(dir) => {
                let dir = dir.unwrap_or_else(|| snapshot_dir.to_path_buf());
                save_snapshot(session.serial(), display.latest(), &dir, trace_id);
            }
            ConsoleCommand::Status => println!(
                "device {} capturing={} latest_frame={:?} coalesced_gestures={}",
                session.serial(),
                session.is_capturing(),
                display.latest().map(|frame| frame.sequence),
                session.mailbox().coalesced()
            ),
            ConsoleCommand::Help => println!("{HELP}"),
            ConsoleCommand::Quit => break,
        }
    }
}

fn save_snapshot(serial: &str, frame: Option<Frame>, dir: &Path, trace_id: &str) {
    let Some(frame) = frame else {
        eprintln!("no frame captured yet");
        return;
    };
    let path = snapshot_path(dir, serial, frame.captured_at);
    match write_frame_atomically(&path, &frame, trace_id) {
        Ok(()) => println!("saved {}", path.display()),
        Err(err) => eprintln!("snapshot failed: {err}"),
    }
}
