use serde::{Deserialize, Serialize};

/// A single mission waypoint as received on the uplink.
///
/// Longitude/latitude are WGS84 degrees, altitude is meters relative to the
/// take-off point and speed is meters per second. Field names on the wire are
/// the short uplink keys; derived values (heading, leg distance) never live here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    #[serde(rename = "JD", default)]
    pub longitude: f64,
    #[serde(rename = "WD", default)]
    pub latitude: f64,
    #[serde(rename = "GD", default)]
    pub altitude: f64,
    #[serde(rename = "SD", default)]
    pub speed: f64,
    #[serde(rename = "YTFYJ", default, skip_serializing_if = "Option::is_none")]
    pub gimbal_pitch: Option<f64>,
    #[serde(rename = "PHJ", default, skip_serializing_if = "Option::is_none")]
    pub yaw_angle: Option<f64>,
    #[serde(rename = "SFTY", default, skip_serializing_if = "Option::is_none")]
    pub flythrough: Option<bool>,
    #[serde(rename = "DZJ", default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<WaypointAction>>,
}

impl Waypoint {
    pub fn new(longitude: f64, latitude: f64, altitude: f64, speed: f64) -> Self {
        Self {
            longitude,
            latitude,
            altitude,
            speed,
            gimbal_pitch: None,
            yaw_angle: None,
            flythrough: None,
            actions: None,
        }
    }

    pub fn with_gimbal_pitch(mut self, pitch: f64) -> Self {
        self.gimbal_pitch = Some(pitch);
        self
    }
}

/// Per-point action hint (`{LX, CS}` on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaypointAction {
    #[serde(rename = "LX")]
    pub kind: i32,
    #[serde(rename = "CS")]
    pub param: i32,
}

/// Mission upload payload: optional mission id plus the ordered waypoint set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaypointPayload {
    #[serde(rename = "RWID", default, skip_serializing_if = "Option::is_none")]
    pub mission_id: Option<String>,
    #[serde(rename = "HDJ", default)]
    pub waypoints: Vec<Waypoint>,
}

impl WaypointPayload {
    pub fn metadata(&self) -> MissionMetadata {
        MissionMetadata {
            mission_id: self.mission_id.clone(),
            created_at_ms: None,
        }
    }
}

/// Caller-side context for one conversion.
///
/// `mission_id` is only ever logged. `created_at_ms` stamps the template's
/// create/update time; leave it `None` to use the current time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissionMetadata {
    pub mission_id: Option<String>,
    pub created_at_ms: Option<i64>,
}

impl MissionMetadata {
    pub fn with_mission_id(id: impl Into<String>) -> Self {
        Self {
            mission_id: Some(id.into()),
            created_at_ms: None,
        }
    }

    pub fn created_at(mut self, epoch_ms: i64) -> Self {
        self.created_at_ms = Some(epoch_ms);
        self
    }

    pub(crate) fn mission_label(&self) -> &str {
        self.mission_id.as_deref().unwrap_or("mission_unknown")
    }
}
