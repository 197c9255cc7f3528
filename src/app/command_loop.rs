use std::time::Duration;

use tracing::{debug, info, warn};

use crate::app::adb::device::DeviceIo;
use crate::app::error::AppError;
use crate::app::gesture::{GestureMailbox, PendingGestures};
use crate::app::signal::StopSignal;
use crate::app::translate::{CommandTranslator, DeviceCommand};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandLoopStats {
    pub batches: u64,
    pub commands: u64,
    pub failures: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    Completed,
    Failed(AppError),
    Interrupted,
}

/// Runs commands strictly in order. Delays are real pauses; a failure drops the rest.
pub fn execute_batch(
    device: &dyn DeviceIo,
    commands: &[DeviceCommand],
    stop: &StopSignal,
    executed: &mut u64,
) -> BatchOutcome {
    for command in commands {
        match command {
            DeviceCommand::Shell(text) => {
                if let Err(err) = device.execute_shell(text) {
                    return BatchOutcome::Failed(err);
                }
                *executed += 1;
            }
            DeviceCommand::Delay(duration) => {
                if !stop.sleep(*duration) {
                    return BatchOutcome::Interrupted;
                }
            }
        }
        debug!(command = %command, "device command sent");
    }
    BatchOutcome::Completed
}

/// One batch per gesture; a failure drops only the rest of that gesture.
pub fn execute_gestures(
    device: &dyn DeviceIo,
    translator: &CommandTranslator,
    pending: &PendingGestures,
    stop: &StopSignal,
    stats: &mut CommandLoopStats,
    trace_id: &str,
) -> bool {
    for commands in translator.translate_groups(pending) {
        stats.batches += 1;
        match execute_batch(device, &commands, stop, &mut stats.commands) {
            BatchOutcome::Completed => {}
            BatchOutcome::Failed(err) => {
                stats.failures += 1;
                warn!(
                    trace_id = %trace_id,
                    error = %err,
                    "input command failed; gesture dropped"
                );
            }
            BatchOutcome::Interrupted => return false,
        }
    }
    true
}

pub fn run_command_loop(
    device: &dyn DeviceIo,
    mailbox: &GestureMailbox,
    translator: &CommandTranslator,
    interval: Duration,
    stop: &StopSignal,
    trace_id: &str,
) -> CommandLoopStats {
    let mut stats = CommandLoopStats::default();
    info!(
        trace_id = %trace_id,
        capability = %translator.capability(),
        interval_ms = interval.as_millis() as u64,
        "command loop started"
    );

    while !stop.is_set() {
        let pending = mailbox.drain();
        if !pending.is_empty()
            && !execute_gestures(device, translator, &pending, stop, &mut stats, trace_id)
        {
            break;
        }
        if !stop.sleep(interval) {
            break;
        }
    }

    info!(
        trace_id = %trace_id,
        batches = stats.batches,
        commands = stats.commands,
        failures = stats.failures,
        coalesced = mailbox.coalesced(),
        "command loop stopped"
    );
    stats
}
