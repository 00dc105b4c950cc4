use crate::error::{KmzError, Result};
use crate::waypoint::WaypointPayload;

/// Parse a JSON mission payload (`{"RWID": ..., "HDJ": [...]}`) into a
/// `WaypointPayload`.
///
/// An empty waypoint list is accepted here; the builder is the one place that
/// rejects empty missions.
pub fn parse_waypoint_payload(json: &str) -> Result<WaypointPayload> {
    serde_json::from_str(json).map_err(KmzError::Payload)
}
