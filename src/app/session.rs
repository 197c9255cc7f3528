use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::app::adb::device::DeviceIo;
use crate::app::capture_loop::{run_capture_loop, LoopExit};
use crate::app::command_loop::{run_command_loop, CommandLoopStats};
use crate::app::error::AppError;
use crate::app::frame::Frame;
use crate::app::gesture::GestureMailbox;
use crate::app::keys::DeviceKey;
use crate::app::signal::StopSignal;
use crate::app::translate::CommandTranslator;

pub type FrameCallback = Arc<dyn Fn(Frame) + Send + Sync>;
pub type CaptureStopCallback = Arc<dyn Fn(&LoopExit) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub capture_interval: Duration,
    pub input_interval: Duration,
    pub first_sequence: u64,
    pub trace_id: String,
}

#[derive(Debug)]
pub struct SessionReport {
    pub capture: LoopExit,
    pub commands: CommandLoopStats,
}

pub struct RemoteSession {
    device: Arc<dyn DeviceIo>,
    mailbox: Arc<GestureMailbox>,
    stop: StopSignal,
    capture: JoinHandle<LoopExit>,
    command: JoinHandle<CommandLoopStats>,
    trace_id: String,
}

impl RemoteSession {
    pub fn start(
        device: Arc<dyn DeviceIo>,
        translator: CommandTranslator,
        config: SessionConfig,
        on_frame: FrameCallback,
        on_capture_stop: CaptureStopCallback,
    ) -> Result<Self, AppError> {
        let stop = StopSignal::new();
        let mailbox = Arc::new(GestureMailbox::new());
        let trace_id = config.trace_id.clone();

        let capture = {
            let device = Arc::clone(&device);
            let stop = stop.clone();
            let config = config.clone();
            thread::Builder::new()
                .name("screen-capture".to_string())
                .spawn(move || {
                    let exit = run_capture_loop(
                        device.as_ref(),
                        config.capture_interval,
                        &stop,
                        config.first_sequence,
                        on_frame.as_ref(),
                        &config.trace_id,
                    );
                    on_capture_stop(&exit);
                    exit
                })
                .map_err(|err| {
                    AppError::system(format!("Failed to spawn capture thread: {err}"), &trace_id)
                })?
        };

        let command = {
            let device = Arc::clone(&device);
            let mailbox = Arc::clone(&mailbox);
            let stop_thread = stop.clone();
            let spawned = thread::Builder::new()
                .name("input-commands".to_string())
                .spawn(move || {
                    run_command_loop(
                        device.as_ref(),
                        &mailbox,
                        &translator,
                        config.input_interval,
                        &stop_thread,
                        &config.trace_id,
                    )
                });
            match spawned {
                Ok(handle) => handle,
                Err(err) => {
                    stop.set();
                    let _ = capture.join();
                    return Err(AppError::system(
                        format!("Failed to spawn command thread: {err}"),
                        &trace_id,
                    ));
                }
            }
        };

        Ok(Self {
            device,
            mailbox,
            stop,
            capture,
            command,
            trace_id,
        })
    }

    pub fn submit_tap(&self, x: i32, y: i32) {
        debug!(x, y, "tap requested");
        self.mailbox.request_tap(x, y);
    }

    pub fn submit_swipe(&self, horizontal: bool) {
        debug!(horizontal, "swipe requested");
        self.mailbox.request_swipe(horizontal);
    }

    /// Keys bypass the mailbox and run on the caller's thread.
    pub fn send_key(&self, key: DeviceKey) -> Result<(), AppError> {
        debug!(key = %key, "key requested");
        self.device.execute_shell(&key.shell_command()).map(|_| ())
    }

    pub fn mailbox(&self) -> &GestureMailbox {
        &self.mailbox
    }

    pub fn serial(&self) -> &str {
        self.device.serial()
    }

    pub fn is_capturing(&self) -> bool {
        !self.capture.is_finished()
    }

    pub fn request_shutdown(&self) {
        if !self.stop.is_set() {
            info!(trace_id = %self.trace_id, "shutdown requested");
        }
        self.stop.set();
    }

    pub fn join(self) -> SessionReport {
        self.request_shutdown();
        let capture = self.capture.join().unwrap_or_else(|_| {
            warn!(trace_id = %self.trace_id, "capture thread panicked");
            LoopExit::Failed(AppError::system("Capture thread panicked", &self.trace_id))
        });
        let commands = self.command.join().unwrap_or_else(|_| {
            warn!(trace_id = %self.trace_id, "command thread panicked");
            CommandLoopStats::default()
        });
        SessionReport { capture, commands }
    }
}
