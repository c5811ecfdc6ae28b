//! Render context construction.
//!
//! The context is the raw stdin object with derived display fields layered on
//! top, so every input field stays addressable from a template.

pub mod format;

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};

use format::{format_cost, format_date, format_duration, format_time, format_timestamp, shorten_path};

/// Field name to value, in insertion order.
pub type RenderContext = Map<String, Value>;

/// Process-level facts the context depends on.
#[derive(Debug, Clone)]
pub struct Ambient {
    pub home: String,
    pub cwd: String,
    pub now: DateTime<Utc>,
}

impl Ambient {
    pub fn detect() -> Self {
        Self {
            home: dirs::home_dir()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
            cwd: std::env::current_dir()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
            now: Utc::now(),
        }
    }
}

fn field<'a>(input: &'a Map<String, Value>, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    rest.iter()
        .try_fold(input.get(*first)?, |value, key| value.get(*key))
}

/// Non-empty string at `path`.
fn text(input: &Map<String, Value>, path: &[&str]) -> Option<String> {
    field(input, path)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn number(input: &Map<String, Value>, path: &[&str]) -> Option<f64> {
    field(input, path).and_then(Value::as_f64)
}

fn count(input: &Map<String, Value>, path: &[&str]) -> u64 {
    match field(input, path) {
        Some(value) => value
            .as_u64()
            .or_else(|| value.as_f64().filter(|n| *n > 0.0).map(|n| n as u64))
            .unwrap_or(0),
        None => 0,
    }
}

/// Build the render context from the parsed stdin object.
pub fn build(input: Map<String, Value>, ambient: &Ambient) -> RenderContext {
    let processed_cwd = text(&input, &["cwd"])
        .or_else(|| text(&input, &["workspace", "current_dir"]))
        .unwrap_or_else(|| ambient.cwd.clone());
    let project_dir =
        text(&input, &["workspace", "project_dir"]).unwrap_or_else(|| processed_cwd.clone());

    let lines_added = count(&input, &["cost", "total_lines_added"]);
    let lines_removed = count(&input, &["cost", "total_lines_removed"]);

    let derived = [
        ("shortCwd", json!(shorten_path(&processed_cwd, &ambient.home))),
        ("shortProjectDir", json!(shorten_path(&project_dir, &ambient.home))),
        ("processedCwd", json!(processed_cwd)),
        ("projectDir", json!(project_dir)),
        (
            "modelName",
            json!(text(&input, &["model", "display_name"]).unwrap_or_else(|| "Unknown".into())),
        ),
        (
            "modelId",
            json!(text(&input, &["model", "id"]).unwrap_or_else(|| "unknown".into())),
        ),
        ("gitBranch", json!(text(&input, &["git", "branch"]).unwrap_or_default())),
        ("gitStatus", json!(text(&input, &["git", "status"]).unwrap_or_default())),
        ("gitStatusShort", json!("")),
        ("timestamp", json!(format_timestamp(&ambient.now))),
        ("date", json!(format_date(&ambient.now))),
        ("time", json!(format_time(&ambient.now))),
        ("totalCostUsd", json!(format_cost(number(&input, &["cost", "total_cost_usd"])))),
        (
            "totalDurationSec",
            json!(format_duration(number(&input, &["cost", "total_duration_ms"]))),
        ),
        (
            "totalApiDurationSec",
            json!(format_duration(number(&input, &["cost", "total_api_duration_ms"]))),
        ),
        ("totalLinesAdded", json!(lines_added)),
        ("totalLinesRemoved", json!(lines_removed)),
        ("totalLinesChanged", json!(lines_added.saturating_add(lines_removed))),
        ("hookEventName", json!(text(&input, &["hook_event_name"]).unwrap_or_default())),
        ("sessionId", json!(text(&input, &["session_id"]).unwrap_or_default())),
        ("transcriptPath", json!(text(&input, &["transcript_path"]).unwrap_or_default())),
        ("version", json!(text(&input, &["version"]).unwrap_or_default())),
        ("outputStyleName", json!(text(&input, &["output_style", "name"]).unwrap_or_default())),
    ];

    let mut context = input;
    for (key, value) in derived {
        context.insert(key.to_string(), value);
    }
    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ambient() -> Ambient {
        Ambient {
            home: "/home/user".to_string(),
            cwd: "/current/working/dir".to_string(),
            now: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn build_from(value: Value) -> RenderContext {
        match value {
            Value::Object(map) => build(map, &ambient()),
            _ => panic!("input must be an object"),
        }
    }

    fn s<'a>(ctx: &'a RenderContext, key: &str) -> &'a str {
        ctx.get(key).and_then(Value::as_str).unwrap_or_else(|| panic!("{} missing", key))
    }

    #[test]
    fn test_model_and_workspace() {
        let ctx = build_from(json!({
            "model": {"id": "claude-3", "display_name": "Claude 3"},
            "workspace": {"current_dir": "/home/user/projects/test", "project_dir": "/home/user/projects"}
        }));
        assert_eq!(s(&ctx, "modelName"), "Claude 3");
        assert_eq!(s(&ctx, "modelId"), "claude-3");
        assert_eq!(s(&ctx, "processedCwd"), "/home/user/projects/test");
        assert_eq!(s(&ctx, "shortCwd"), "~/projects/test");
        assert_eq!(s(&ctx, "projectDir"), "/home/user/projects");
        assert_eq!(s(&ctx, "shortProjectDir"), "~/projects");
    }

    #[test]
    fn test_missing_model_defaults() {
        let ctx = build_from(json!({"workspace": {"current_dir": "/home/user/work"}}));
        assert_eq!(s(&ctx, "modelName"), "Unknown");
        assert_eq!(s(&ctx, "modelId"), "unknown");
        assert_eq!(s(&ctx, "shortCwd"), "~/work");
    }

    #[test]
    fn test_model_with_wrong_shape_defaults() {
        let ctx = build_from(json!({"model": "claude-opus"}));
        assert_eq!(s(&ctx, "modelName"), "Unknown");
        assert_eq!(ctx["model"], json!("claude-opus"));
    }

    #[test]
    fn test_git_fields() {
        let ctx = build_from(json!({"git": {"branch": "main", "status": "clean"}}));
        assert_eq!(s(&ctx, "gitBranch"), "main");
        assert_eq!(s(&ctx, "gitStatus"), "clean");
        assert_eq!(s(&ctx, "gitStatusShort"), "");
    }

    #[test]
    fn test_cost_fields() {
        let ctx = build_from(json!({
            "cost": {
                "total_cost_usd": 0.0234,
                "total_duration_ms": 125000,
                "total_api_duration_ms": 45000,
                "total_lines_added": 150,
                "total_lines_removed": 30
            }
        }));
        assert_eq!(s(&ctx, "totalCostUsd"), "$0.0234");
        assert_eq!(s(&ctx, "totalDurationSec"), "2m5s");
        assert_eq!(s(&ctx, "totalApiDurationSec"), "45.0s");
        assert_eq!(ctx["totalLinesAdded"], json!(150));
        assert_eq!(ctx["totalLinesRemoved"], json!(30));
        assert_eq!(ctx["totalLinesChanged"], json!(180));
    }

    #[test]
    fn test_zero_cost_fields() {
        let ctx = build_from(json!({
            "cost": {
                "total_cost_usd": 0,
                "total_duration_ms": 0,
                "total_api_duration_ms": 0,
                "total_lines_added": 0,
                "total_lines_removed": 0
            }
        }));
        assert_eq!(s(&ctx, "totalCostUsd"), "$0.00");
        assert_eq!(s(&ctx, "totalDurationSec"), "0s");
        assert_eq!(s(&ctx, "totalApiDurationSec"), "0s");
        assert_eq!(ctx["totalLinesChanged"], json!(0));
    }

    #[test]
    fn test_short_durations() {
        let ctx = build_from(json!({
            "cost": {
                "total_cost_usd": 0.001,
                "total_duration_ms": 1500,
                "total_api_duration_ms": 500,
                "total_lines_added": 5,
                "total_lines_removed": 2
            }
        }));
        assert_eq!(s(&ctx, "totalCostUsd"), "$0.0010");
        assert_eq!(s(&ctx, "totalDurationSec"), "1.5s");
        assert_eq!(s(&ctx, "totalApiDurationSec"), "0.5s");
        assert_eq!(ctx["totalLinesChanged"], json!(7));
    }

    #[test]
    fn test_session_fields() {
        let ctx = build_from(json!({
            "hook_event_name": "status_update",
            "session_id": "abc-123",
            "transcript_path": "/path/to/transcript",
            "version": "1.2.3",
            "output_style": {"name": "minimal"}
        }));
        assert_eq!(s(&ctx, "hookEventName"), "status_update");
        assert_eq!(s(&ctx, "sessionId"), "abc-123");
        assert_eq!(s(&ctx, "transcriptPath"), "/path/to/transcript");
        assert_eq!(s(&ctx, "version"), "1.2.3");
        assert_eq!(s(&ctx, "outputStyleName"), "minimal");
    }

    #[test]
    fn test_cwd_field_wins() {
        let ctx = build_from(json!({
            "cwd": "/direct/cwd/path",
            "workspace": {"current_dir": "/workspace/path"}
        }));
        assert_eq!(s(&ctx, "processedCwd"), "/direct/cwd/path");
        assert_eq!(s(&ctx, "projectDir"), "/direct/cwd/path");
    }

    #[test]
    fn test_process_cwd_fallback() {
        let ctx = build_from(json!({}));
        assert_eq!(s(&ctx, "processedCwd"), "/current/working/dir");
    }

    #[test]
    fn test_time_fields() {
        let ctx = build_from(json!({}));
        assert_eq!(s(&ctx, "timestamp"), "2024-01-01T00:00:00.000Z");
        assert!(!s(&ctx, "date").is_empty());
        assert!(!s(&ctx, "time").is_empty());
    }

    #[test]
    fn test_unknown_fields_pass_through() {
        let ctx = build_from(json!({"customField": "customValue", "anotherField": 123}));
        assert_eq!(ctx["customField"], json!("customValue"));
        assert_eq!(ctx["anotherField"], json!(123));
    }

    #[test]
    fn test_derived_fields_override_input() {
        let ctx = build_from(json!({"modelName": "spoofed", "model": {"display_name": "Claude"}}));
        assert_eq!(s(&ctx, "modelName"), "Claude");
    }

    #[test]
    fn test_path_without_home_prefix() {
        let ctx = build_from(json!({"workspace": {"current_dir": "/var/log/application"}}));
        assert_eq!(s(&ctx, "processedCwd"), "/var/log/application");
        assert_eq!(s(&ctx, "shortCwd"), "/var/log/application");
    }
}
