use std::fmt;
use std::str::FromStr;

// android.view.KeyEvent codes.
const KEYCODE_HOME: u16 = 3;
const KEYCODE_BACK: u16 = 4;
const KEYCODE_POWER: u16 = 26;
const KEYCODE_PAGE_UP: u16 = 92;
const KEYCODE_PAGE_DOWN: u16 = 93;
const KEYCODE_APP_SWITCH: u16 = 187;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKey {
    Power,
    Home,
    Back,
    AppSwitch,
    Settings,
    PageUp,
    PageDown,
}

impl DeviceKey {
    pub const ALL: [DeviceKey; 7] = [
        Self::Power,
        Self::Home,
        Self::Back,
        Self::AppSwitch,
        Self::Settings,
        Self::PageUp,
        Self::PageDown,
    ];

    pub fn shell_command(self) -> String {
        match self {
            Self::Power => format!("input keyevent --longpress {KEYCODE_POWER}"),
            Self::Home => format!("input keyevent {KEYCODE_HOME}"),
            Self::Back => format!("input keyevent {KEYCODE_BACK}"),
            Self::AppSwitch => format!("input keyevent {KEYCODE_APP_SWITCH}"),
            Self::Settings => "am start com.android.settings".to_string(),
            Self::PageUp => format!("input keyevent {KEYCODE_PAGE_UP}"),
            Self::PageDown => format!("input keyevent {KEYCODE_PAGE_DOWN}"),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Power => "power",
            Self::Home => "home",
            Self::Back => "back",
            Self::AppSwitch => "apps",
            Self::Settings => "settings",
            Self::PageUp => "up",
            Self::PageDown => "down",
        }
    }
}

impl fmt::Display for DeviceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DeviceKey {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let lowered = value.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "app" | "app_switch" | "recents" => return Ok(Self::AppSwitch),
            "page_up" | "pageup" => return Ok(Self::PageUp),
            "page_down" | "pagedown" => return Ok(Self::PageDown),
            _ => {}
        }
        Self::ALL
            .into_iter()
            .find(|key| key.name() == lowered)
            .ok_or_else(|| format!("unknown key: {value}"))
    }
}
