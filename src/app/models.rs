use serde::{Deserialize, Serialize};

pub const STATE_ONLINE: &str = "device";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceSummary {
    pub serial: String,
    pub state: String,
    pub model: Option<String>,
    pub product: Option<String>,
    pub device: Option<String>,
    pub transport_id: Option<String>,
}

impl DeviceSummary {
    pub fn is_online(&self) -> bool {
        self.state == STATE_ONLINE
    }
}
