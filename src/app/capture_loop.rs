use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::app::adb::device::DeviceIo;
use crate::app::error::AppError;
use crate::app::frame::Frame;
use crate::app::signal::StopSignal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopExit {
    Stopped,
    Failed(AppError),
}

pub fn throttle_delay(interval: Duration, elapsed: Duration) -> Option<Duration> {
    interval.checked_sub(elapsed).filter(|delay| !delay.is_zero())
}

/// Captures frames until stopped or until a capture fails.
/// `first_sequence` lets the startup frame keep sequence 0.
pub fn run_capture_loop(
    device: &dyn DeviceIo,
    interval: Duration,
    stop: &StopSignal,
    first_sequence: u64,
    emit: &dyn Fn(Frame),
    trace_id: &str,
) -> LoopExit {
    let mut sequence = first_sequence;
    info!(
        trace_id = %trace_id,
        serial = %device.serial(),
        interval_ms = interval.as_millis() as u64,
        "capture loop started"
    );

    while !stop.is_set() {
        let started = Instant::now();
        let bytes = match device.capture_screen() {
            Ok(bytes) => bytes,
            Err(err) => {
                error!(
                    trace_id = %trace_id,
                    error = %err,
                    frames = sequence - first_sequence,
                    "screen capture failed; display updates stop"
                );
                return LoopExit::Failed(err);
            }
        };
        emit(Frame::new(bytes, sequence));
        sequence += 1;

        let elapsed = started.elapsed();
        match throttle_delay(interval, elapsed) {
            Some(delay) => {
                debug!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    delay_ms = delay.as_millis() as u64,
                    "frame captured"
                );
                if !stop.sleep(delay) {
                    break;
                }
            }
            None => debug!(
                elapsed_ms = elapsed.as_millis() as u64,
                "capture slower than interval; continuing immediately"
            ),
        }
    }

    info!(
        trace_id = %trace_id,
        frames = sequence - first_sequence,
        "capture loop stopped"
    );
    LoopExit::Stopped
}
