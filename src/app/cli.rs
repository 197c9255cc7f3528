use std::path::PathBuf;

use clap::Parser;

use crate::app::config::{config_path, normalize_frequency, AppConfig, DEFAULT_CAPTURE_FREQUENCY_HZ};

/// Remote desktop for Android: mirror the screen and drive it over adb.
#[derive(Debug, Clone, Parser)]
#[command(name = "droidpad", version, allow_negative_numbers = true)]
pub struct Cli {
    /// Screen refresh frequency in captures per second (default 2)
    #[arg(short = 'f', long = "freq")]
    pub freq: Option<f64>,

    /// More detailed log, including every UI event and device command
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Serial of the device to control; defaults to the first online device
    #[arg(short = 's', long, env = "ANDROID_SERIAL")]
    pub serial: Option<String>,

    /// Path to the adb executable
    #[arg(long, env = "DROIDPAD_ADB")]
    pub adb: Option<String>,

    /// Config file to use instead of ~/.droidpad_config.json
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// File that always holds the latest screen frame (PNG)
    #[arg(long)]
    pub frame_out: Option<PathBuf>,

    /// Save the effective configuration to the config file and exit
    #[arg(long)]
    pub write_config: bool,
}

impl Cli {
    pub fn config_file(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(config_path)
    }

    /// Command-line values win over the config file.
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(freq) = self.freq {
            config.capture.frequency_hz = normalize_frequency(freq, DEFAULT_CAPTURE_FREQUENCY_HZ);
        }
        if let Some(path) = &self.frame_out {
            config.display.frame_output_path = path.to_string_lossy().to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("droidpad").chain(args.iter().copied()))
            .expect("parse")
    }

    #[test]
    fn defaults_leave_config_untouched() {
        let cli = parse(&[]);
        assert!(!cli.verbose);
        let mut config = AppConfig::default();
        cli.apply_to(&mut config);
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn freq_overrides_capture_interval() {
        let cli = parse(&["--freq", "4", "-v"]);
        assert!(cli.verbose);
        let mut config = AppConfig::default();
        cli.apply_to(&mut config);
        assert_eq!(config.capture_interval(), Duration::from_millis(250));
    }

    #[test]
    fn non_positive_freq_falls_back_to_default() {
        for value in ["0", "-3"] {
            let cli = parse(&["-f", value]);
            let mut config = AppConfig::default();
            cli.apply_to(&mut config);
            assert_eq!(config.capture.frequency_hz, DEFAULT_CAPTURE_FREQUENCY_HZ);
        }
    }

    #[test]
    fn rejects_non_numeric_freq() {
        assert!(Cli::try_parse_from(["droidpad", "--freq", "fast"]).is_err());
    }
}
