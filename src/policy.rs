//! Action-group templates applied by the builder.
//!
//! A policy decides which action groups a mission carries. The builder attaches
//! each group to the placemark at its `start_index`.

use crate::document::{ActionGroup, ActionParam, ActionTrigger, ActuatorFunc};
use crate::waypoint::Waypoint;

pub const DEFAULT_GIMBAL_PITCH: f64 = -90.0;
const TAKEOFF_HOVER_SECONDS: f64 = 0.5;
const TIME_LAPSE_INTERVAL_SECONDS: f64 = 2.0;
const LENS_INDEX: &str = "visable";

/// Produces the action groups of a mission.
pub trait ActionPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Groups for a non-empty mission, with `start_index`/`end_index` inside
    /// `0..waypoints.len()`.
    fn action_groups(
        &self,
        waypoints: &[Waypoint],
        payload_position_index: u32,
    ) -> Vec<ActionGroup>;
}

/// Fixed survey template expected by the time-lapse capture consumer:
///
/// - point 0: `takeoff` group rotating the gimbal, then hovering;
/// - 3+ points: `betweenAdjacentPoints` group over `1..=len-2` locking the
///   gimbal and starting the time-lapse;
/// - 2+ points: `reachPoint` group on the last point stopping the time-lapse
///   and unlocking the gimbal.
///
/// This is not a general planner; other templates implement [`ActionPolicy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeLapseSurveyPolicy;

impl ActionPolicy for TimeLapseSurveyPolicy {
    fn name(&self) -> &'static str {
        "time-lapse-survey"
    }

    fn action_groups(
        &self,
        waypoints: &[Waypoint],
        payload_position_index: u32,
    ) -> Vec<ActionGroup> {
        let count = waypoints.len();
        let Some(first) = waypoints.first() else {
            return Vec::new();
        };
        let payload = i64::from(payload_position_index);
        let mut groups = Vec::with_capacity(3);

        let pitch = first.gimbal_pitch.unwrap_or(DEFAULT_GIMBAL_PITCH);
        groups.push(
            ActionGroup::new(0, ActionTrigger::Takeoff, 0, 0)
                .with_action(ActuatorFunc::GimbalRotate, gimbal_rotate_params(pitch, payload))
                .with_action(
                    ActuatorFunc::Hover,
                    vec![ActionParam::float("hoverTime", TAKEOFF_HOVER_SECONDS)],
                ),
        );

        if count >= 3 {
            let group_id = groups.len() as u32;
            groups.push(
                ActionGroup::new(group_id, ActionTrigger::BetweenAdjacentPoints, 1, count - 2)
                    .with_action(ActuatorFunc::GimbalAngleLock, vec![])
                    .with_action(
                        ActuatorFunc::StartTimeLapse,
                        vec![
                            ActionParam::int("payloadPositionIndex", payload),
                            ActionParam::int("useGlobalPayloadLensIndex", 0),
                            ActionParam::text("payloadLensIndex", LENS_INDEX),
                            ActionParam::float("minShootInterval", TIME_LAPSE_INTERVAL_SECONDS),
                        ],
                    ),
            );
        }

        if count >= 2 {
            let group_id = groups.len() as u32;
            let last = count - 1;
            groups.push(
                ActionGroup::new(group_id, ActionTrigger::ReachPoint, last, last)
                    .with_action(
                        ActuatorFunc::StopTimeLapse,
                        vec![
                            ActionParam::int("payloadPositionIndex", payload),
                            ActionParam::text("payloadLensIndex", LENS_INDEX),
                        ],
                    )
                    .with_action(ActuatorFunc::GimbalAngleUnlock, vec![]),
            );
        }

        groups
    }
}

fn gimbal_rotate_params(pitch: f64, payload: i64) -> Vec<ActionParam> {
    vec![
        ActionParam::text("gimbalHeadingYawBase", "aircraft"),
        ActionParam::text("gimbalRotateMode", "absoluteAngle"),
        ActionParam::int("gimbalPitchRotateEnable", 1),
        ActionParam::float("gimbalPitchRotateAngle", pitch),
        ActionParam::int("gimbalRollRotateEnable", 0),
        ActionParam::float("gimbalRollRotateAngle", 0.0),
        ActionParam::int("gimbalYawRotateEnable", 1),
        ActionParam::float("gimbalYawRotateAngle", 0.0),
        ActionParam::int("gimbalRotateTimeEnable", 0),
        ActionParam::int("gimbalRotateTime", 10),
        ActionParam::int("payloadPositionIndex", payload),
    ]
}

/// Plain flight path with no actions at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct BareWaylinePolicy;

impl ActionPolicy for BareWaylinePolicy {
    fn name(&self) -> &'static str {
        "bare-wayline"
    }

    fn action_groups(
        &self,
        _waypoints: &[Waypoint],
        _payload_position_index: u32,
    ) -> Vec<ActionGroup> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ParamValue;

    fn line(n: usize) -> Vec<Waypoint> {
        (0..n)
            .map(|i| Waypoint::new(i as f64 * 0.001, 0.0, 20.0, 5.0))
            .collect()
    }

    fn triggers(groups: &[ActionGroup]) -> Vec<ActionTrigger> {
        groups.iter().map(|g| g.trigger).collect()
    }

    #[test]
    fn test_single_point_only_takeoff() {
        let groups = TimeLapseSurveyPolicy.action_groups(&line(1), 7);
        assert_eq!(triggers(&groups), vec![ActionTrigger::Takeoff]);
    }

    #[test]
    fn test_two_points_no_window() {
        let groups = TimeLapseSurveyPolicy.action_groups(&line(2), 7);
        assert_eq!(
            triggers(&groups),
            vec![ActionTrigger::Takeoff, ActionTrigger::ReachPoint]
        );
        assert_eq!(groups[1].start_index, 1);
        assert_eq!(groups[1].end_index, 1);
    }

    #[test]
    fn test_window_spans_inner_points() {
        let groups = TimeLapseSurveyPolicy.action_groups(&line(6), 7);
        assert_eq!(groups.len(), 3);

        let window = &groups[1];
        assert_eq!(window.trigger, ActionTrigger::BetweenAdjacentPoints);
        assert_eq!((window.start_index, window.end_index), (1, 4));
        assert_eq!(window.actions[0].actuator_func, ActuatorFunc::GimbalAngleLock);
        assert_eq!(window.actions[1].actuator_func, ActuatorFunc::StartTimeLapse);

        let end = &groups[2];
        assert_eq!((end.start_index, end.end_index), (5, 5));

        let ids: Vec<u32> = groups.iter().map(|g| g.group_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_takeoff_pitch_from_first_waypoint() {
        let mut pts = line(2);
        pts[0] = pts[0].clone().with_gimbal_pitch(-45.0);
        let groups = TimeLapseSurveyPolicy.action_groups(&pts, 7);
        let rotate = &groups[0].actions[0];
        let pitch = rotate
            .params
            .iter()
            .find(|p| p.name == "gimbalPitchRotateAngle")
            .unwrap();
        assert_eq!(pitch.value, ParamValue::Float(-45.0));
    }

    #[test]
    fn test_takeoff_pitch_default() {
        let groups = TimeLapseSurveyPolicy.action_groups(&line(1), 3);
        let rotate = &groups[0].actions[0];
        assert!(rotate.params.contains(&ActionParam::float(
            "gimbalPitchRotateAngle",
            DEFAULT_GIMBAL_PITCH
        )));
        assert!(rotate.params.contains(&ActionParam::int("gimbalYawRotateEnable", 1)));
        assert!(rotate.params.contains(&ActionParam::int("payloadPositionIndex", 3)));
        assert_eq!(groups[0].actions[1].actuator_func, ActuatorFunc::Hover);
    }

    #[test]
    fn test_empty_mission_yields_nothing() {
        assert!(TimeLapseSurveyPolicy.action_groups(&[], 7).is_empty());
        assert!(BareWaylinePolicy.action_groups(&line(4), 7).is_empty());
    }
}
