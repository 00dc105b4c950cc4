use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;
use wpmz_kmz::archive::{TEMPLATE_ENTRY, WAYLINES_ENTRY};
use wpmz_kmz::parser::parse_waypoint_payload;
use wpmz_kmz::{CompilerConfig, KmzCompiler};

const WAYLINES_TAGS: &[&str] = &[
    "autoFlightSpeed",
    "droneEnumValue",
    "payloadPositionIndex",
    "index",
    "coordinates",
    "executeHeight",
    "waypointSpeed",
    "actionGroupId",
    "actionGroupStartIndex",
    "actionGroupEndIndex",
    "actionTriggerType",
    "actionActuatorFunc",
    "gimbalPitchRotateAngle",
    "hoverTime",
];

const TEMPLATE_TAGS: &[&str] = &[
    "autoFlightSpeed",
    "globalHeight",
    "index",
    "height",
    "createTime",
];

fn load_fixture(path: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/missions/{path}")).unwrap()
}

fn convert(json: &str) -> BTreeMap<String, String> {
    let payload = parse_waypoint_payload(json).unwrap();
    let metadata = payload.metadata().created_at(1_700_000_000_000);
    let out = KmzCompiler::new(CompilerConfig::default())
        .convert(&payload.waypoints, &metadata)
        .unwrap();

    let mut zip = zip::ZipArchive::new(Cursor::new(out.bytes)).unwrap();
    let mut entries = BTreeMap::new();
    for i in 0..zip.len() {
        let mut file = zip.by_index(i).unwrap();
        let mut text = String::new();
        file.read_to_string(&mut text).unwrap();
        entries.insert(file.name().to_string(), text);
    }
    entries
}

/// Collect the text of the listed elements (by local name) in document order.
fn summarize(xml: &str, tags: &[&str]) -> serde_json::Value {
    let mut found: BTreeMap<&str, Vec<String>> = tags.iter().map(|t| (*t, Vec::new())).collect();
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let local = e.local_name();
                let Some(tag) = tags.iter().find(|t| t.as_bytes() == local.as_ref()) else {
                    continue;
                };
                let text = reader.read_text(e.name()).unwrap();
                if let Some(list) = found.get_mut(tag) {
                    list.push(text.to_string());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => panic!("invalid XML: {e}"),
            _ => {}
        }
    }
    serde_json::to_value(found).unwrap()
}

fn snapshot_of(json: &str) -> serde_json::Value {
    let entries = convert(json);
    serde_json::json!({
        "waylines": summarize(&entries[WAYLINES_ENTRY], WAYLINES_TAGS),
        "template": summarize(&entries[TEMPLATE_ENTRY], TEMPLATE_TAGS),
    })
}

/// Compare the document summary against the expected snapshot file.
/// When `UPDATE_SNAPSHOTS=1` is set, write/overwrite the expected file instead.
fn assert_snapshot(actual: &serde_json::Value, expected_path: &str) {
    let path = format!("tests/fixtures/expected/{expected_path}");

    if matches!(std::env::var("UPDATE_SNAPSHOTS").as_deref(), Ok("1")) {
        let dir = Path::new(&path).parent().unwrap();
        std::fs::create_dir_all(dir).unwrap();
        let pretty = serde_json::to_string_pretty(actual).unwrap();
        std::fs::write(&path, pretty.as_bytes()).unwrap();
        eprintln!("Updated snapshot: {path}");
        return;
    }

    let expected_str = std::fs::read_to_string(&path).unwrap_or_else(|_| {
        panic!("Expected file not found: {path}. Run with UPDATE_SNAPSHOTS=1 to generate.")
    });
    let expected: serde_json::Value = serde_json::from_str(&expected_str)
        .unwrap_or_else(|e| panic!("Failed to parse {path}: {e}"));

    assert_eq!(
        *actual, expected,
        "Snapshot mismatch for {path}.\nRun with UPDATE_SNAPSHOTS=1 to update."
    );
}

fn assert_fixture(name: &str) {
    let json = load_fixture(name);
    assert_snapshot(&snapshot_of(&json), name);
}

#[test]
fn snapshot_single_point() {
    assert_fixture("single_point.json");
}

#[test]
fn snapshot_survey_line() {
    assert_fixture("survey_line.json");
}

#[test]
fn snapshot_zero_start_speed() {
    assert_fixture("zero_start_speed.json");
}
