use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::app::adb::parse::{input_usage_supports_swipe, parse_adb_devices};
use crate::app::adb::runner::{run_command_with_timeout, CommandOutput};
use crate::app::error::AppError;
use crate::app::frame::validate_png;
use crate::app::models::DeviceSummary;

pub trait DeviceIo: Send + Sync {
    fn serial(&self) -> &str;

    fn capture_screen(&self) -> Result<Vec<u8>, AppError>;

    fn execute_shell(&self, command: &str) -> Result<String, AppError>;
}

#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub adb_program: String,
    pub preferred_serial: Option<String>,
    pub command_timeout: Duration,
    pub capture_timeout: Duration,
    pub serialize_io: bool,
}

#[derive(Debug)]
pub struct AdbDevice {
    serial: String,
    adb_program: String,
    command_timeout: Duration,
    capture_timeout: Duration,
    serialize_io: bool,
    channel: Mutex<()>,
    trace_id: String,
}

impl AdbDevice {
    pub fn new(serial: impl Into<String>, options: &ConnectOptions, trace_id: &str) -> Self {
        Self {
            serial: serial.into(),
            adb_program: options.adb_program.clone(),
            command_timeout: options.command_timeout,
            capture_timeout: options.capture_timeout,
            serialize_io: options.serialize_io,
            channel: Mutex::new(()),
            trace_id: trace_id.to_string(),
        }
    }

    fn lock_channel(&self) -> Option<MutexGuard<'_, ()>> {
        self.serialize_io
            .then(|| self.channel.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn run(&self, args: &[&str], timeout: Duration) -> Result<CommandOutput, AppError> {
        let mut full_args = vec!["-s".to_string(), self.serial.clone()];
        full_args.extend(args.iter().map(|arg| arg.to_string()));
        let _guard = self.lock_channel();
        run_command_with_timeout(&self.adb_program, &full_args, timeout, &self.trace_id)
    }

    /// Prints the `input` usage text and looks for the swipe verb.
    pub fn probe_supports_swipe(&self) -> Result<bool, AppError> {
        // A bare `input` exits non-zero on most builds, so only the text matters.
        let output = self.run(&["shell", "input"], self.command_timeout)?;
        let usage = format!("{}\n{}", output.stdout_text(), output.stderr);
        let supported = input_usage_supports_swipe(&usage);
        debug!(
            trace_id = %self.trace_id,
            serial = %self.serial,
            supported,
            "probed input swipe support"
        );
        Ok(supported)
    }
}

impl DeviceIo for AdbDevice {
    fn serial(&self) -> &str {
        &self.serial
    }

    fn capture_screen(&self) -> Result<Vec<u8>, AppError> {
        let output = self
            .run(&["exec-out", "screencap", "-p"], self.capture_timeout)
            .map_err(|err| AppError::capture(err.error, &self.trace_id))?;
        if !output.success() {
            return Err(AppError::capture(
                format!("screencap failed: {}", output.failure_detail()),
                &self.trace_id,
            ));
        }
        validate_png(&output.stdout).map_err(|message| AppError::capture(message, &self.trace_id))?;
        Ok(output.stdout)
    }

    fn execute_shell(&self, command: &str) -> Result<String, AppError> {
        let output = self
            .run(&["shell", command], self.command_timeout)
            .map_err(|err| AppError::exec(err.error, &self.trace_id))?;
        if !output.success() {
            return Err(AppError::exec(
                format!("`{command}` failed: {}", output.failure_detail()),
                &self.trace_id,
            ));
        }
        Ok(output.stdout_text())
    }
}

pub fn list_devices(
    adb_program: &str,
    timeout: Duration,
    trace_id: &str,
) -> Result<Vec<DeviceSummary>, AppError> {
    let args = vec!["devices".to_string(), "-l".to_string()];
    let output = run_command_with_timeout(adb_program, &args, timeout, trace_id)
        .map_err(|err| AppError::dependency(format!("Failed to run adb: {}", err.error), trace_id))?;
    if !output.success() {
        return Err(AppError::dependency(
            format!("adb devices failed: {}", output.failure_detail()),
            trace_id,
        ));
    }
    Ok(parse_adb_devices(&output.stdout_text()))
}

pub fn pick_device(
    devices: &[DeviceSummary],
    preferred: Option<&str>,
    trace_id: &str,
) -> Result<DeviceSummary, AppError> {
    let mut online = devices.iter().filter(|device| device.is_online());
    let picked = match preferred.map(str::trim).filter(|serial| !serial.is_empty()) {
        Some(serial) => online.find(|device| device.serial == serial).ok_or_else(|| {
            AppError::connection(format!("Device {serial} is not online"), trace_id)
        })?,
        None => online
            .next()
            .ok_or_else(|| AppError::connection("Not found android device", trace_id))?,
    };
    Ok(picked.clone())
}

pub fn connect(options: &ConnectOptions, trace_id: &str) -> Result<AdbDevice, AppError> {
    let devices = list_devices(&options.adb_program, options.command_timeout, trace_id)?;
    let offline = devices.iter().filter(|device| !device.is_online()).count();
    if offline > 0 {
        warn!(trace_id = %trace_id, offline, "ignoring devices that are not online");
    }
    let summary = pick_device(&devices, options.preferred_serial.as_deref(), trace_id)?;
    info!(
        trace_id = %trace_id,
        serial = %summary.serial,
        model = summary.model.as_deref().unwrap_or("unknown"),
        "connected to android device"
    );
    Ok(AdbDevice::new(summary.serial, options, trace_id))
}
