use log::{debug, warn};

use crate::document::{
    MissionConfig, Placemark, TemplateDocument, TemplatePlacemark, WaylinesDocument,
};
use crate::error::{KmzError, Result};
use crate::geodesy;
use crate::options::CompilerConfig;
use crate::policy::ActionPolicy;
use crate::waypoint::{MissionMetadata, Waypoint};

/// The two documents that make up a KMZ package.
#[derive(Debug, Clone, PartialEq)]
pub struct MissionDocuments {
    pub waylines: WaylinesDocument,
    pub template: TemplateDocument,
}

/// Build both document trees for a mission. Fails only on an empty waypoint list.
pub fn build_documents(
    waypoints: &[Waypoint],
    metadata: &MissionMetadata,
    config: &CompilerConfig,
    policy: &dyn ActionPolicy,
) -> Result<MissionDocuments> {
    let first = waypoints.first().ok_or(KmzError::EmptyMission)?;

    let speed = global_speed(first, config.default_speed);
    let mission_config = MissionConfig::new(
        speed,
        config.drone_enum_value,
        config.drone_sub_enum_value,
        config.payload_position_index,
    );

    let waylines = build_waylines(waypoints, mission_config.clone(), policy);
    let template = build_template(waypoints, metadata, config, mission_config);

    debug!(
        "Built documents for '{}': {} placemarks, {:.1} m, {:.1} s, policy '{}'",
        metadata.mission_label(),
        waylines.placemarks.len(),
        waylines.distance,
        waylines.duration,
        policy.name()
    );

    Ok(MissionDocuments { waylines, template })
}

fn global_speed(first: &Waypoint, default_speed: f64) -> f64 {
    if first.speed.is_finite() && first.speed > 0.0 {
        first.speed
    } else {
        default_speed
    }
}

fn build_waylines(
    waypoints: &[Waypoint],
    mission_config: MissionConfig,
    policy: &dyn ActionPolicy,
) -> WaylinesDocument {
    let count = waypoints.len();

    let mut placemarks: Vec<Placemark> = waypoints
        .iter()
        .enumerate()
        .map(|(index, wp)| Placemark {
            index,
            longitude: wp.longitude,
            latitude: wp.latitude,
            execute_height: wp.altitude,
            speed: wp.speed,
            heading_angle: match waypoints.get(index + 1) {
                Some(next) => geodesy::bearing(wp, next),
                None => 0.0,
            },
            action_groups: Vec::new(),
        })
        .collect();

    for group in policy.action_groups(waypoints, mission_config.payload_position_index) {
        if group.start_index > group.end_index || group.end_index >= count {
            warn!(
                "Policy '{}' group {} range {}..={} is outside {} placemarks, dropping it",
                policy.name(),
                group.group_id,
                group.start_index,
                group.end_index,
                count
            );
            continue;
        }
        placemarks[group.start_index].action_groups.push(group);
    }

    let auto_flight_speed = mission_config.global_transitional_speed;
    WaylinesDocument {
        mission_config,
        distance: geodesy::total_distance(waypoints),
        duration: geodesy::total_duration(waypoints),
        auto_flight_speed,
        placemarks,
    }
}

fn build_template(
    waypoints: &[Waypoint],
    metadata: &MissionMetadata,
    config: &CompilerConfig,
    mission_config: MissionConfig,
) -> TemplateDocument {
    let placemarks = waypoints
        .iter()
        .enumerate()
        .map(|(index, wp)| TemplatePlacemark {
            index,
            longitude: wp.longitude,
            latitude: wp.latitude,
            height: wp.altitude,
        })
        .collect();

    TemplateDocument {
        author: config.author.clone(),
        created_at_ms: metadata
            .created_at_ms
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis()),
        auto_flight_speed: mission_config.global_transitional_speed,
        global_height: waypoints.first().map_or(0.0, |wp| wp.altitude),
        mission_config,
        placemarks,
    }
}
