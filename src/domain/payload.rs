//! Defensive readers for `run_gcloud_command` output
//!
//! gcloud prints JSON when asked to, but nothing guarantees it: a missing
//! permission or an empty project produces plain text instead. Every reader
//! here degrades to a "nothing found" answer rather than an error.

use rust_mcp_sdk::schema::ContentBlock;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::utils::last_path_segment;

pub const RUNNING_STATUS: &str = "RUNNING";

/// Text of every textual content block, in order. Other block kinds are skipped.
pub fn text_blocks(content: &[ContentBlock]) -> impl Iterator<Item = &str> {
    content.iter().filter_map(|block| match block {
        ContentBlock::TextContent(text) => Some(text.text.as_str()),
        _ => None,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Parsed(Value),
    Raw(String),
}

impl Payload {
    /// The first text block that parses as JSON, or all text joined by newlines.
    pub fn from_content(content: &[ContentBlock]) -> Self {
        text_blocks(content)
            .find_map(|text| serde_json::from_str::<Value>(text).ok())
            .map(Payload::Parsed)
            .unwrap_or_else(|| Payload::Raw(text_blocks(content).collect::<Vec<_>>().join("\n")))
    }

    /// Elements of a parsed, non-empty JSON array.
    pub fn records(&self) -> Option<&[Value]> {
        match self {
            Payload::Parsed(Value::Array(items)) if !items.is_empty() => Some(items),
            _ => None,
        }
    }
}

/// The subset of a `compute instances list` entry the probe reads.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawInstance {
    name: Option<String>,
    zone: Option<String>,
    status: Option<String>,
    id: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmRecord {
    pub name: String,
    pub zone: String,
    pub status: String,
    pub id: Option<String>,
}

impl VmRecord {
    /// Anything that does not look like an instance object degrades to the
    /// defaults rather than failing.
    pub fn from_value(value: &Value) -> Self {
        let raw = RawInstance::deserialize(value).unwrap_or_default();

        Self {
            name: raw.name.unwrap_or_else(|| "unknown".to_string()),
            zone: last_path_segment(raw.zone.as_deref().unwrap_or_default()).to_string(),
            status: raw.status.unwrap_or_else(|| "UNKNOWN".to_string()),
            id: raw.id.as_ref().and_then(scalar_to_string),
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == RUNNING_STATUS
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CpuReading {
    Utilization(f64),
    /// A series came back but its first point has no numeric value.
    UnreadablePoint,
    NoPoints,
    NoData,
}

/// Reads the first point of the first series in a `monitoring read` response.
pub fn read_cpu_utilization(payload: &Payload) -> CpuReading {
    let Some(series) = payload.records().and_then(<[Value]>::first) else {
        return CpuReading::NoData;
    };

    let Some(point) = series
        .get("points")
        .and_then(Value::as_array)
        .and_then(|points| points.first())
    else {
        return CpuReading::NoPoints;
    };

    let value = point.get("value");
    value
        .and_then(|value| value.get("doubleValue"))
        .and_then(scalar_to_f64)
        .or_else(|| {
            value
                .and_then(|value| value.get("int64Value"))
                .and_then(scalar_to_f64)
        })
        .map(CpuReading::Utilization)
        .unwrap_or(CpuReading::UnreadablePoint)
}

// The monitoring API encodes int64 as a JSON string.
fn scalar_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use rust_mcp_sdk::schema::{ContentBlock, TextContent};
    use serde_json::json;

    use super::*;

    fn text(value: &str) -> ContentBlock {
        ContentBlock::from(TextContent::new(value.to_string(), None, None))
    }

    #[test]
    fn parses_first_json_text_block() {
        let payload = Payload::from_content(&[
            text("WARNING: listing may be incomplete"),
            text(r#"[{"name": "vm-1"}]"#),
            text(r#"[{"name": "ignored"}]"#),
        ]);

        assert_eq!(payload, Payload::Parsed(json!([{"name": "vm-1"}])));
        assert_eq!(payload.records().map(<[Value]>::len), Some(1));
    }

    #[test]
    fn falls_back_to_raw_text() {
        let payload = Payload::from_content(&[
            text("Listed 0 items."),
            text("ERROR: permission denied"),
        ]);

        assert_eq!(
            payload,
            Payload::Raw("Listed 0 items.\nERROR: permission denied".to_string())
        );
        assert!(payload.records().is_none());
    }

    #[test]
    fn empty_array_and_objects_have_no_records() {
        assert!(Payload::Parsed(json!([])).records().is_none());
        assert!(Payload::Parsed(json!({"items": []})).records().is_none());
        assert!(Payload::Parsed(json!(null)).records().is_none());
    }

    #[test]
    fn reads_vm_record_defensively() {
        let vm = VmRecord::from_value(&json!({
            "name": "web-1",
            "zone": "https://www.googleapis.com/compute/v1/projects/demo/zones/us-east1-b",
            "status": "RUNNING",
            "id": "4561237890123"
        }));
        assert_eq!(vm.name, "web-1");
        assert_eq!(vm.zone, "us-east1-b");
        assert!(vm.is_running());
        assert_eq!(vm.id.as_deref(), Some("4561237890123"));

        let sparse = VmRecord::from_value(&json!({"id": 42, "status": "TERMINATED"}));
        assert_eq!(sparse.name, "unknown");
        assert_eq!(sparse.zone, "");
        assert!(!sparse.is_running());
        assert_eq!(sparse.id.as_deref(), Some("42"));

        let junk = VmRecord::from_value(&json!("not an object"));
        assert_eq!(junk.status, "UNKNOWN");
        assert!(junk.id.is_none());

        let mistyped = VmRecord::from_value(&json!({"name": 7, "status": "RUNNING", "id": "1"}));
        assert_eq!(mistyped.name, "unknown");
        assert!(!mistyped.is_running());
    }

    #[test]
    fn reads_first_point_of_first_series() {
        let payload = Payload::Parsed(json!([
            {"points": [{"value": {"doubleValue": 0.4567}}, {"value": {"doubleValue": 0.9}}]},
            {"points": [{"value": {"doubleValue": 0.1}}]}
        ]));
        assert_eq!(read_cpu_utilization(&payload), CpuReading::Utilization(0.4567));
    }

    #[test]
    fn reads_int64_values_encoded_as_strings() {
        let payload = Payload::Parsed(json!([{"points": [{"value": {"int64Value": "1"}}]}]));
        assert_eq!(read_cpu_utilization(&payload), CpuReading::Utilization(1.0));
    }

    #[test]
    fn distinguishes_missing_points_from_missing_data() {
        let empty_points = Payload::Parsed(json!([{"points": []}]));
        assert_eq!(read_cpu_utilization(&empty_points), CpuReading::NoPoints);

        let no_points_key = Payload::Parsed(json!([{"metric": {}}]));
        assert_eq!(read_cpu_utilization(&no_points_key), CpuReading::NoPoints);

        let bad_value = Payload::Parsed(json!([{"points": [{"value": {}}]}]));
        assert_eq!(read_cpu_utilization(&bad_value), CpuReading::UnreadablePoint);

        assert_eq!(
            read_cpu_utilization(&Payload::Parsed(json!([]))),
            CpuReading::NoData
        );
        assert_eq!(
            read_cpu_utilization(&Payload::Raw("no output".to_string())),
            CpuReading::NoData
        );
    }
}
