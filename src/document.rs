//! The two mission document trees and their XML shapes.
//!
//! Both trees are built once by the builder and only read afterwards.

use crate::xml::{ToXml, XmlElement, fixed};

const COORD_DECIMALS: usize = 12;
const MEASURE_DECIMALS: usize = 12;
const ANGLE_DECIMALS: usize = 6;
const SETTING_DECIMALS: usize = 6;

const TAKE_OFF_SECURITY_HEIGHT: f64 = 20.0;
const PAYLOAD_ENUM_VALUE: u32 = 65_535;
const HEIGHT_MODE: &str = "relativeToStartPoint";

/// Mission-level settings shared by both documents.
#[derive(Debug, Clone, PartialEq)]
pub struct MissionConfig {
    pub global_transitional_speed: f64,
    pub take_off_security_height: f64,
    pub drone_enum_value: u32,
    pub drone_sub_enum_value: u32,
    pub payload_position_index: u32,
}

impl MissionConfig {
    pub fn new(
        global_speed: f64,
        drone_enum_value: u32,
        drone_sub_enum_value: u32,
        payload_position_index: u32,
    ) -> Self {
        Self {
            global_transitional_speed: global_speed,
            take_off_security_height: TAKE_OFF_SECURITY_HEIGHT,
            drone_enum_value,
            drone_sub_enum_value,
            payload_position_index,
        }
    }

    fn to_xml(&self) -> XmlElement {
        XmlElement::new("wpml:missionConfig")
            .text("wpml:flyToWaylineMode", "safely")
            .text("wpml:finishAction", "noAction")
            .text("wpml:exitOnRCLost", "goContinue")
            .text(
                "wpml:takeOffSecurityHeight",
                fixed(self.take_off_security_height, SETTING_DECIMALS),
            )
            .text(
                "wpml:globalTransitionalSpeed",
                fixed(self.global_transitional_speed, SETTING_DECIMALS),
            )
            .child(
                XmlElement::new("wpml:droneInfo")
                    .text("wpml:droneEnumValue", self.drone_enum_value.to_string())
                    .text("wpml:droneSubEnumValue", self.drone_sub_enum_value.to_string()),
            )
            .child(
                XmlElement::new("wpml:payloadInfo")
                    .text("wpml:payloadEnumValue", PAYLOAD_ENUM_VALUE.to_string())
                    .text("wpml:payloadSubEnumValue", "0")
                    .text(
                        "wpml:payloadPositionIndex",
                        self.payload_position_index.to_string(),
                    ),
            )
    }
}

fn point(longitude: f64, latitude: f64) -> XmlElement {
    XmlElement::new("Point").text(
        "coordinates",
        format!(
            "{},{}",
            fixed(longitude, COORD_DECIMALS),
            fixed(latitude, COORD_DECIMALS)
        ),
    )
}

fn poi_point() -> String {
    let zero = fixed(0.0, ANGLE_DECIMALS);
    format!("{zero},{zero},{zero}")
}

/// When an action group fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionTrigger {
    Takeoff,
    BetweenAdjacentPoints,
    ReachPoint,
}

impl ActionTrigger {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Takeoff => "takeoff",
            Self::BetweenAdjacentPoints => "betweenAdjacentPoints",
            Self::ReachPoint => "reachPoint",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorFunc {
    GimbalRotate,
    Hover,
    GimbalAngleLock,
    GimbalAngleUnlock,
    StartTimeLapse,
    StopTimeLapse,
}

impl ActuatorFunc {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GimbalRotate => "gimbalRotate",
            Self::Hover => "hover",
            Self::GimbalAngleLock => "gimbalAngleLock",
            Self::GimbalAngleUnlock => "gimbalAngleUnlock",
            Self::StartTimeLapse => "startTimeLapse",
            Self::StopTimeLapse => "stopTimeLapse",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    fn render(&self) -> String {
        match self {
            Self::Int(v) => v.to_string(),
            Self::Float(v) => fixed(*v, ANGLE_DECIMALS),
            Self::Text(v) => v.clone(),
        }
    }
}

/// One named entry of an actuator parameter bag.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionParam {
    pub name: &'static str,
    pub value: ParamValue,
}

impl ActionParam {
    pub fn int(name: &'static str, value: i64) -> Self {
        Self { name, value: ParamValue::Int(value) }
    }

    pub fn float(name: &'static str, value: f64) -> Self {
        Self { name, value: ParamValue::Float(value) }
    }

    pub fn text(name: &'static str, value: impl Into<String>) -> Self {
        Self { name, value: ParamValue::Text(value.into()) }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub action_id: u32,
    pub actuator_func: ActuatorFunc,
    pub params: Vec<ActionParam>,
}

impl Action {
    fn to_xml(&self) -> XmlElement {
        let params = self
            .params
            .iter()
            .map(|p| XmlElement::leaf(format!("wpml:{}", p.name), p.value.render()));

        XmlElement::new("wpml:action")
            .text("wpml:actionId", self.action_id.to_string())
            .text("wpml:actionActuatorFunc", self.actuator_func.as_str())
            .child(XmlElement::new("wpml:actionActuatorFuncParam").children(params))
    }
}

/// Actions sharing a trigger over a placemark index range.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionGroup {
    pub group_id: u32,
    pub start_index: usize,
    pub end_index: usize,
    pub trigger: ActionTrigger,
    pub actions: Vec<Action>,
}

impl ActionGroup {
    pub fn new(
        group_id: u32,
        trigger: ActionTrigger,
        start_index: usize,
        end_index: usize,
    ) -> Self {
        Self {
            group_id,
            start_index,
            end_index,
            trigger,
            actions: Vec::new(),
        }
    }

    /// Append an action; ids are assigned in insertion order starting at 0.
    pub fn with_action(mut self, actuator_func: ActuatorFunc, params: Vec<ActionParam>) -> Self {
        let action_id = self.actions.len() as u32;
        self.actions.push(Action {
            action_id,
            actuator_func,
            params,
        });
        self
    }

    fn to_xml(&self) -> XmlElement {
        XmlElement::new("wpml:actionGroup")
            .text("wpml:actionGroupId", self.group_id.to_string())
            .text("wpml:actionGroupStartIndex", self.start_index.to_string())
            .text("wpml:actionGroupEndIndex", self.end_index.to_string())
            .text("wpml:actionGroupMode", "sequence")
            .child(
                XmlElement::new("wpml:actionTrigger")
                    .text("wpml:actionTriggerType", self.trigger.as_str()),
            )
            .children(self.actions.iter().map(Action::to_xml))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Placemark {
    pub index: usize,
    pub longitude: f64,
    pub latitude: f64,
    pub execute_height: f64,
    pub speed: f64,
    pub heading_angle: f64,
    pub action_groups: Vec<ActionGroup>,
}

impl Placemark {
    fn to_xml(&self) -> XmlElement {
        XmlElement::new("Placemark")
            .child(point(self.longitude, self.latitude))
            .text("wpml:index", self.index.to_string())
            .text("wpml:executeHeight", fixed(self.execute_height, MEASURE_DECIMALS))
            .text("wpml:waypointSpeed", fixed(self.speed, MEASURE_DECIMALS))
            .child(
                XmlElement::new("wpml:waypointHeadingParam")
                    .text("wpml:waypointHeadingMode", "followWayline")
                    .text(
                        "wpml:waypointHeadingAngle",
                        fixed(self.heading_angle, ANGLE_DECIMALS),
                    )
                    .text("wpml:waypointPoiPoint", poi_point())
                    .text("wpml:waypointHeadingAngleEnable", "0")
                    .text("wpml:waypointHeadingPoiIndex", "0"),
            )
            .child(
                XmlElement::new("wpml:waypointTurnParam")
                    .text("wpml:waypointTurnMode", "toPointAndStopWithContinuityCurvature")
                    .text("wpml:waypointTurnDampingDist", fixed(0.0, SETTING_DECIMALS)),
            )
            .text("wpml:useStraightLine", "0")
            .children(self.action_groups.iter().map(ActionGroup::to_xml))
            .child(
                XmlElement::new("wpml:waypointGimbalHeadingParam")
                    .text("wpml:waypointGimbalPitchAngle", fixed(0.0, ANGLE_DECIMALS))
                    .text("wpml:waypointGimbalYawAngle", fixed(0.0, ANGLE_DECIMALS)),
            )
            .text("wpml:isRisky", "0")
            .text("wpml:waypointWorkType", "0")
    }
}

/// Executable mission: config, totals and one placemark per waypoint.
#[derive(Debug, Clone, PartialEq)]
pub struct WaylinesDocument {
    pub mission_config: MissionConfig,
    pub distance: f64,
    pub duration: f64,
    pub auto_flight_speed: f64,
    pub placemarks: Vec<Placemark>,
}

impl WaylinesDocument {
    /// All action groups in placemark order.
    pub fn action_groups(&self) -> impl Iterator<Item = &ActionGroup> {
        self.placemarks.iter().flat_map(|p| p.action_groups.iter())
    }
}

impl ToXml for WaylinesDocument {
    fn to_xml(&self) -> XmlElement {
        let folder = XmlElement::new("Folder")
            .text("wpml:templateId", "0")
            .text("wpml:executeHeightMode", HEIGHT_MODE)
            .text("wpml:waylineId", "0")
            .text("wpml:distance", fixed(self.distance, MEASURE_DECIMALS))
            .text("wpml:duration", fixed(self.duration, MEASURE_DECIMALS))
            .text(
                "wpml:autoFlightSpeed",
                fixed(self.auto_flight_speed, SETTING_DECIMALS),
            )
            .children(self.placemarks.iter().map(Placemark::to_xml));

        XmlElement::new("Document")
            .child(self.mission_config.to_xml())
            .child(folder)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplatePlacemark {
    pub index: usize,
    pub longitude: f64,
    pub latitude: f64,
    pub height: f64,
}

impl TemplatePlacemark {
    fn to_xml(&self) -> XmlElement {
        let height = fixed(self.height, SETTING_DECIMALS);
        XmlElement::new("Placemark")
            .child(point(self.longitude, self.latitude))
            .text("wpml:index", self.index.to_string())
            .text("wpml:ellipsoidHeight", height.clone())
            .text("wpml:height", height)
            .text("wpml:useGlobalHeight", "1")
            .text("wpml:useGlobalSpeed", "1")
            .text("wpml:useGlobalHeadingParam", "1")
            .text("wpml:useGlobalTurnParam", "1")
            .text("wpml:useStraightLine", "0")
            .text("wpml:isRisky", "0")
    }
}

/// Editable mission template: geometry only, no actions.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateDocument {
    pub author: Option<String>,
    pub created_at_ms: i64,
    pub mission_config: MissionConfig,
    pub auto_flight_speed: f64,
    pub global_height: f64,
    pub placemarks: Vec<TemplatePlacemark>,
}

impl ToXml for TemplateDocument {
    fn to_xml(&self) -> XmlElement {
        let cfg = &self.mission_config;

        let folder = XmlElement::new("Folder")
            .text("wpml:templateType", "waypoint")
            .text("wpml:templateId", "0")
            .child(
                XmlElement::new("wpml:waylineCoordinateSysParam")
                    .text("wpml:coordinateMode", "WGS84")
                    .text("wpml:heightMode", HEIGHT_MODE)
                    .text("wpml:positioningType", "GPS"),
            )
            .text(
                "wpml:autoFlightSpeed",
                fixed(self.auto_flight_speed, SETTING_DECIMALS),
            )
            .text("wpml:globalHeight", fixed(self.global_height, SETTING_DECIMALS))
            .text("wpml:caliFlightEnable", "0")
            .text("wpml:gimbalPitchMode", "manual")
            .child(
                XmlElement::new("wpml:globalWaypointHeadingParam")
                    .text("wpml:waypointHeadingMode", "followWayline")
                    .text("wpml:waypointHeadingAngle", fixed(0.0, ANGLE_DECIMALS))
                    .text("wpml:waypointPoiPoint", poi_point())
                    .text("wpml:waypointHeadingPoiIndex", "0"),
            )
            .text(
                "wpml:globalWaypointTurnMode",
                "toPointAndPassWithContinuityCurvature",
            )
            .text("wpml:globalUseStraightLine", "1")
            .children(self.placemarks.iter().map(TemplatePlacemark::to_xml))
            .child(
                XmlElement::new("wpml:payloadParam").text(
                    "wpml:payloadPositionIndex",
                    cfg.payload_position_index.to_string(),
                ),
            );

        let mut doc = XmlElement::new("Document");
        if let Some(author) = &self.author {
            doc.push(XmlElement::leaf("wpml:author", author.as_str()));
        }
        let stamp = self.created_at_ms.to_string();
        doc.text("wpml:createTime", stamp.clone())
            .text("wpml:updateTime", stamp)
            .child(cfg.to_xml())
            .child(folder)
    }
}
