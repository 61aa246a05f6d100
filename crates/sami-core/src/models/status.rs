//! Per-subsystem view of the backend `/status` report.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Coarse health of one subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    Online,
    Offline,
    /// Reported, but with a value we don't recognize
    Degraded,
}

impl ServiceState {
    /// Single-character marker for terminal output.
    pub fn symbol(&self) -> &'static str {
        match self {
            ServiceState::Online => "✓",
            ServiceState::Offline => "✗",
            ServiceState::Degraded => "!",
        }
    }

    /// `"connected"` is online; missing or a known negative is offline.
    fn from_connection(value: Option<&Value>) -> Self {
        match value.and_then(Value::as_str) {
            Some("connected") => ServiceState::Online,
            None | Some("disconnected") | Some("error") => ServiceState::Offline,
            Some(_) => ServiceState::Degraded,
        }
    }

    /// Boolean flags: true is online, false or missing is offline.
    fn from_flag(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Bool(true)) => ServiceState::Online,
            None | Some(Value::Null) | Some(Value::Bool(false)) => ServiceState::Offline,
            Some(_) => ServiceState::Degraded,
        }
    }
}

impl std::fmt::Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceState::Online => write!(f, "online"),
            ServiceState::Offline => write!(f, "offline"),
            ServiceState::Degraded => write!(f, "degraded"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    pub name: &'static str,
    pub state: ServiceState,
    pub description: String,
}

/// Typed summary of the `/status` body. The raw body is kept as well.
#[derive(Debug, Clone)]
pub struct SystemStatus {
    pub services: Vec<ServiceStatus>,
    pub raw: Value,
}

impl SystemStatus {
    pub fn from_value(raw: Value) -> Self {
        let camera = raw.get("camera_service");
        let rfid = raw.get("rfid_service");
        let active_cameras = camera
            .and_then(|c| c.get("active_cameras"))
            .and_then(Value::as_u64)
            .unwrap_or(0);
        let active_readers = rfid
            .and_then(|r| r.get("active_readers"))
            .and_then(Value::as_u64)
            .unwrap_or(0);

        let services = vec![
            ServiceStatus {
                name: "Database",
                state: ServiceState::from_connection(raw.get("database")),
                description: "PostgreSQL connection".to_string(),
            },
            ServiceStatus {
                name: "Redis Cache",
                state: ServiceState::from_connection(raw.get("redis")),
                description: "In-memory cache".to_string(),
            },
            ServiceStatus {
                name: "AI Service",
                state: ServiceState::from_flag(
                    raw.get("ai_service").and_then(|s| s.get("is_initialized")),
                ),
                description: "Face recognition and detection".to_string(),
            },
            ServiceStatus {
                name: "Voice Service",
                state: ServiceState::from_flag(
                    raw.get("voice_service").and_then(|s| s.get("is_initialized")),
                ),
                description: "Voice interaction".to_string(),
            },
            ServiceStatus {
                name: "Cameras",
                state: ServiceState::from_flag(camera.and_then(|c| c.get("running"))),
                description: format!("{} active cameras", active_cameras),
            },
            ServiceStatus {
                name: "RFID",
                state: ServiceState::from_flag(rfid.and_then(|r| r.get("running"))),
                description: format!("{} active readers", active_readers),
            },
        ];

        Self { services, raw }
    }

    pub fn all_online(&self) -> bool {
        self.services.iter().all(|s| s.state == ServiceState::Online)
    }

    pub fn online_count(&self) -> usize {
        self.services
            .iter()
            .filter(|s| s.state == ServiceState::Online)
            .count()
    }
}
