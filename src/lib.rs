pub mod archive;
pub mod builder;
pub mod converter;
pub mod document;
pub mod error;
pub mod geodesy;
pub mod options;
pub mod parser;
pub mod policy;
pub mod storage;
pub mod waypoint;
pub mod xml;

use wasm_bindgen::prelude::*;

pub use crate::converter::{KmzCompiler, KmzOutput, convert_waypoints_to_kmz};
pub use crate::error::{KmzError, Result};
pub use crate::options::CompilerConfig;
pub use crate::policy::{ActionPolicy, BareWaylinePolicy, TimeLapseSurveyPolicy};
pub use crate::storage::LatestKmzPath;
pub use crate::waypoint::{MissionMetadata, Waypoint, WaypointAction, WaypointPayload};

/// Compile a mission payload object (`{RWID?, HDJ: [...]}`) into KMZ bytes.
#[wasm_bindgen(js_name = waypointsToKmz)]
pub fn waypoints_to_kmz(
    payload: JsValue,
    options: JsValue,
) -> std::result::Result<js_sys::Uint8Array, JsValue> {
    console_error_panic_hook::set_once();

    let config = parse_options(options)?;
    let payload: WaypointPayload =
        serde_wasm_bindgen::from_value(payload).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let output = KmzCompiler::new(config).convert(&payload.waypoints, &payload.metadata())?;
    Ok(js_sys::Uint8Array::from(output.bytes.as_slice()))
}

/// Compile a JSON mission payload string into KMZ bytes.
#[wasm_bindgen(js_name = waypointsJsonToKmz)]
pub fn waypoints_json_to_kmz(
    json: &str,
    options: JsValue,
) -> std::result::Result<js_sys::Uint8Array, JsValue> {
    console_error_panic_hook::set_once();

    let config = parse_options(options)?;
    let output = KmzCompiler::new(config).convert_payload_json(json)?;
    Ok(js_sys::Uint8Array::from(output.bytes.as_slice()))
}

fn parse_options(options: JsValue) -> std::result::Result<CompilerConfig, JsValue> {
    if options.is_undefined() || options.is_null() {
        Ok(CompilerConfig::default())
    } else {
        serde_wasm_bindgen::from_value(options).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}
