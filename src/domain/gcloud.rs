use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{json, Value};

pub const RUN_GCLOUD_COMMAND: &str = "run_gcloud_command";
pub const CPU_UTILIZATION_METRIC: &str = "compute.googleapis.com/instance/cpu/utilization";
pub const METRIC_WINDOW_MINUTES: i64 = 5;

/// Arguments object for `run_gcloud_command`: the gcloud argv without the
/// leading `gcloud`.
pub fn command_arguments(args: &[String]) -> Value {
    json!({ "args": args })
}

pub fn projects_list() -> Vec<String> {
    to_args(&["projects", "list"])
}

pub fn storage_buckets_list() -> Vec<String> {
    to_args(&["storage", "buckets", "list", "--format=json"])
}

pub fn compute_instances_list(project_id: &str) -> Vec<String> {
    to_args(&[
        "compute",
        "instances",
        "list",
        "--project",
        project_id,
        "--format=json",
    ])
}

pub fn cpu_utilization_query(instance_id: &str) -> String {
    format!("{CPU_UTILIZATION_METRIC}{{resource.instance_id=\"{instance_id}\"}}")
}

pub fn monitoring_read(query: &str, window: &MetricWindow, project_id: &str) -> Vec<String> {
    let start = window.start_rfc3339();
    let end = window.end_rfc3339();
    to_args(&[
        "monitoring",
        "read",
        query,
        "--start",
        start.as_str(),
        "--end",
        end.as_str(),
        "--project",
        project_id,
        "--format=json",
    ])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl MetricWindow {
    fn trailing(end: DateTime<Utc>, length: Duration) -> Self {
        Self {
            start: end - length,
            end,
        }
    }

    pub fn last_minutes(end: DateTime<Utc>) -> Self {
        Self::trailing(end, Duration::minutes(METRIC_WINDOW_MINUTES))
    }

    pub fn start_rfc3339(&self) -> String {
        self.start.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    pub fn end_rfc3339(&self) -> String {
        self.end.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

fn to_args(args: &[&str]) -> Vec<String> {
    args.iter().map(|arg| arg.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::*;

    #[test]
    fn wraps_args_for_the_tool() {
        assert_eq!(
            command_arguments(&projects_list()),
            json!({"args": ["projects", "list"]})
        );
    }

    #[test]
    fn instances_list_targets_project() {
        assert_eq!(
            compute_instances_list("demo-123"),
            vec!["compute", "instances", "list", "--project", "demo-123", "--format=json"]
        );
    }

    #[test]
    fn builds_instance_scoped_query() {
        assert_eq!(
            cpu_utilization_query("987"),
            r#"compute.googleapis.com/instance/cpu/utilization{resource.instance_id="987"}"#
        );
    }

    #[test]
    fn window_spans_five_minutes_in_utc() {
        let end = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let window = MetricWindow::last_minutes(end);

        assert_eq!(window.start_rfc3339(), "2026-03-01T11:55:00Z");
        assert_eq!(window.end_rfc3339(), "2026-03-01T12:00:00Z");
    }

    #[test]
    fn monitoring_read_carries_window_and_project() {
        let end = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let args = monitoring_read("q", &MetricWindow::last_minutes(end), "demo");

        assert_eq!(
            args,
            vec![
                "monitoring",
                "read",
                "q",
                "--start",
                "2026-03-01T11:55:00Z",
                "--end",
                "2026-03-01T12:00:00Z",
                "--project",
                "demo",
                "--format=json"
            ]
        );
    }
}
