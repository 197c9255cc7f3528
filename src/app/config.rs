use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::warn;

use crate::app::error::AppError;

pub const DEFAULT_CAPTURE_FREQUENCY_HZ: f64 = 2.0;
pub const DEFAULT_INPUT_FREQUENCY_HZ: f64 = 10.0;
pub const DEFAULT_INPUT_DEVICE: &str = "/dev/input/event0";
pub const DEFAULT_SWIPE_OFFSET: i32 = 200;
pub const DEFAULT_SWIPE_DURATION_MS: u64 = 1000;
pub const DEFAULT_SWIPE_HOLD_MS: u64 = 1000;

const MIN_FREQUENCY_HZ: f64 = 0.01;
const MAX_FREQUENCY_HZ: f64 = 60.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdbSettings {
    pub command_path: String,
    pub command_timeout_secs: u64,
    /// One lock per device around each adb call.
    #[serde(default = "default_serialize_io")]
    pub serialize_io: bool,
}

fn default_serialize_io() -> bool {
    true
}

impl Default for AdbSettings {
    fn default() -> Self {
        Self {
            command_path: String::new(),
            command_timeout_secs: 10,
            serialize_io: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaptureSettings {
    pub frequency_hz: f64,
    pub timeout_secs: u64,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            frequency_hz: DEFAULT_CAPTURE_FREQUENCY_HZ,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityOverride {
    #[default]
    Auto,
    Input,
    Sendevent,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputSettings {
    pub frequency_hz: f64,
    pub device_path: String,
    pub swipe_offset: i32,
    pub swipe_duration_ms: u64,
    pub swipe_hold_ms: u64,
    pub capability: CapabilityOverride,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            frequency_hz: DEFAULT_INPUT_FREQUENCY_HZ,
            device_path: DEFAULT_INPUT_DEVICE.to_string(),
            swipe_offset: DEFAULT_SWIPE_OFFSET,
            swipe_duration_ms: DEFAULT_SWIPE_DURATION_MS,
            swipe_hold_ms: DEFAULT_SWIPE_HOLD_MS,
            capability: CapabilityOverride::Auto,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DisplaySettings {
    pub frame_output_path: String,
    pub snapshot_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub adb: AdbSettings,
    #[serde(default)]
    pub capture: CaptureSettings,
    #[serde(default)]
    pub input: InputSettings,
    #[serde(default)]
    pub display: DisplaySettings,
}

impl AppConfig {
    pub fn capture_interval(&self) -> Duration {
        interval_from_frequency(self.capture.frequency_hz, DEFAULT_CAPTURE_FREQUENCY_HZ)
    }

    pub fn input_interval(&self) -> Duration {
        interval_from_frequency(self.input.frequency_hz, DEFAULT_INPUT_FREQUENCY_HZ)
    }

    pub fn adb_timeout(&self) -> Duration {
        Duration::from_secs(self.adb.command_timeout_secs)
    }

    pub fn capture_timeout(&self) -> Duration {
        Duration::from_secs(self.capture.timeout_secs)
    }
}

pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("DROIDPAD_CONFIG_PATH") {
        return PathBuf::from(path);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".droidpad_config.json")
}

pub fn backup_config_path(path: &Path) -> PathBuf {
    path.with_extension("backup.json")
}

pub fn load_config_from_path(path: &Path, trace_id: &str) -> Result<AppConfig, AppError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let raw = fs::read_to_string(path)
        .map_err(|err| AppError::system(format!("Failed to read config: {err}"), trace_id))?;
    let config: AppConfig = serde_json::from_str(&raw)
        .map_err(|err| AppError::validation(format!("Failed to parse config: {err}"), trace_id))?;
    Ok(validate_config(config))
}

pub fn save_config_to_path(config: &AppConfig, path: &Path, trace_id: &str) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    if path.exists() {
        let _ = fs::copy(path, backup_config_path(path));
    }
    let payload = serde_json::to_string_pretty(config)
        .map_err(|err| AppError::system(format!("Failed to serialize config: {err}"), trace_id))?;
    fs::write(path, payload)
        .map_err(|err| AppError::system(format!("Failed to write config: {err}"), trace_id))?;
    Ok(())
}

pub fn validate_config(mut config: AppConfig) -> AppConfig {
    config.capture.frequency_hz =
        normalize_frequency(config.capture.frequency_hz, DEFAULT_CAPTURE_FREQUENCY_HZ);
    config.input.frequency_hz =
        normalize_frequency(config.input.frequency_hz, DEFAULT_INPUT_FREQUENCY_HZ);
    if config.adb.command_timeout_secs == 0 {
        config.adb.command_timeout_secs = 10;
    }
    if config.capture.timeout_secs == 0 {
        config.capture.timeout_secs = 10;
    }
    if config.input.device_path.trim().is_empty() {
        config.input.device_path = DEFAULT_INPUT_DEVICE.to_string();
    }
    if config.input.swipe_offset == 0 {
        config.input.swipe_offset = DEFAULT_SWIPE_OFFSET;
    }
    if config.input.swipe_duration_ms == 0 {
        config.input.swipe_duration_ms = DEFAULT_SWIPE_DURATION_MS;
    }
    config
}

pub fn normalize_frequency(value: f64, default: f64) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        warn!(value, default, "non-positive frequency; using default");
        return default;
    }
    value.clamp(MIN_FREQUENCY_HZ, MAX_FREQUENCY_HZ)
}

pub fn interval_from_frequency(frequency_hz: f64, default: f64) -> Duration {
    Duration::from_secs_f64(1.0 / normalize_frequency(frequency_hz, default))
}
