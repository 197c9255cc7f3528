use std::fmt;
use std::time::Duration;

use crate::app::config::{CapabilityOverride, InputSettings};
use crate::app::gesture::{PendingGestures, Point, SwipeRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputCapability {
    InputCommand,
    SendEvent,
}

impl InputCapability {
    pub fn resolve(probed_swipe: bool, forced: CapabilityOverride) -> Self {
        match forced {
            CapabilityOverride::Input => Self::InputCommand,
            CapabilityOverride::Sendevent => Self::SendEvent,
            CapabilityOverride::Auto if probed_swipe => Self::InputCommand,
            CapabilityOverride::Auto => Self::SendEvent,
        }
    }
}

impl fmt::Display for InputCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InputCommand => f.write_str("input"),
            Self::SendEvent => f.write_str("sendevent"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCommand {
    Shell(String),
    /// A real pause between the surrounding commands.
    Delay(Duration),
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shell(command) => f.write_str(command),
            Self::Delay(duration) => write!(f, "<delay {}ms>", duration.as_millis()),
        }
    }
}

// Linux input event codes used by the multi-touch protocol B.
const EV_SYN: u16 = 0;
const EV_ABS: u16 = 3;
const ABS_MT_POSITION_X: u16 = 53;
const ABS_MT_POSITION_Y: u16 = 54;
const ABS_MT_TRACKING_ID: u16 = 57;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandTranslator {
    SendEvent {
        device_path: String,
        swipe_offset: i32,
        hold: Duration,
    },
    InputCommand {
        swipe_offset: i32,
        swipe_duration_ms: u64,
    },
}

impl CommandTranslator {
    pub fn new(capability: InputCapability, settings: &InputSettings) -> Self {
        match capability {
            InputCapability::SendEvent => Self::SendEvent {
                device_path: settings.device_path.clone(),
                swipe_offset: settings.swipe_offset,
                hold: Duration::from_millis(settings.swipe_hold_ms),
            },
            InputCapability::InputCommand => Self::InputCommand {
                swipe_offset: settings.swipe_offset,
                swipe_duration_ms: settings.swipe_duration_ms,
            },
        }
    }

    pub fn capability(&self) -> InputCapability {
        match self {
            Self::SendEvent { .. } => InputCapability::SendEvent,
            Self::InputCommand { .. } => InputCapability::InputCommand,
        }
    }

    pub fn translate_groups(&self, pending: &PendingGestures) -> Vec<Vec<DeviceCommand>> {
        let mut groups = Vec::with_capacity(pending.len());
        if let Some(point) = pending.tap {
            let mut commands = Vec::new();
            self.push_tap(point, &mut commands);
            groups.push(commands);
        }
        if let Some(swipe) = pending.swipe {
            let mut commands = Vec::new();
            self.push_swipe(swipe, &mut commands);
            groups.push(commands);
        }
        groups
    }

    pub fn translate(&self, pending: &PendingGestures) -> Vec<DeviceCommand> {
        self.translate_groups(pending).into_iter().flatten().collect()
    }

    fn push_tap(&self, point: Point, commands: &mut Vec<DeviceCommand>) {
        match self {
            Self::SendEvent { device_path, .. } => {
                commands.extend(touch_down(device_path, point));
                commands.push(touch_up(device_path));
            }
            Self::InputCommand { .. } => commands.push(DeviceCommand::Shell(format!(
                "input touchscreen tap {} {}",
                point.x, point.y
            ))),
        }
    }

    fn push_swipe(&self, swipe: SwipeRequest, commands: &mut Vec<DeviceCommand>) {
        match self {
            Self::SendEvent {
                device_path,
                swipe_offset,
                hold,
            } => {
                let end = swipe_end(swipe, *swipe_offset);
                commands.extend(touch_down(device_path, swipe.origin));
                commands.push(DeviceCommand::Delay(*hold));
                commands.extend(touch_down(device_path, end));
                commands.push(touch_up(device_path));
            }
            Self::InputCommand {
                swipe_offset,
                swipe_duration_ms,
            } => {
                let end = swipe_end(swipe, *swipe_offset);
                commands.push(DeviceCommand::Shell(format!(
                    "input touchscreen swipe {} {} {} {} {}",
                    swipe.origin.x, swipe.origin.y, end.x, end.y, swipe_duration_ms
                )));
            }
        }
    }
}

pub fn swipe_end(swipe: SwipeRequest, offset: i32) -> Point {
    let Point { x, y } = swipe.origin;
    if swipe.horizontal {
        Point::new(x.saturating_add(offset), y)
    } else {
        Point::new(x, y.saturating_add(offset))
    }
}

fn sendevent(device_path: &str, kind: u16, code: u16, value: i32) -> DeviceCommand {
    DeviceCommand::Shell(format!("sendevent {device_path} {kind} {code} {value}"))
}

fn touch_down(device_path: &str, point: Point) -> [DeviceCommand; 4] {
    [
        sendevent(device_path, EV_ABS, ABS_MT_TRACKING_ID, 0),
        sendevent(device_path, EV_ABS, ABS_MT_POSITION_X, point.x),
        sendevent(device_path, EV_ABS, ABS_MT_POSITION_Y, point.y),
        sendevent(device_path, EV_SYN, 0, 0),
    ]
}

// Release and sync in one shell call.
fn touch_up(device_path: &str) -> DeviceCommand {
    DeviceCommand::Shell(format!(
        "sendevent {device_path} {EV_ABS} {ABS_MT_TRACKING_ID} -1;sendevent {device_path} {EV_SYN} 0 0"
    ))
}
