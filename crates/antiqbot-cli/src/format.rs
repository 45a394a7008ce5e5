use antiqbot_core::models::value::text;
use antiqbot_core::models::{AnalysisResult, UserProfile};
use serde_json::Value;

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format an optional string, returning a default if None
pub fn format_optional(value: Option<&str>, default: &str) -> String {
    value.filter(|v| !v.is_empty()).unwrap_or(default).to_string()
}

/// Format a date string to a more readable format
pub fn format_date(date: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(date) {
        dt.format("%d %b %Y").to_string()
    } else if date.len() >= 10 && date.is_char_boundary(10) {
        // Keep the YYYY-MM-DD part
        date[..10].to_string()
    } else {
        date.to_string()
    }
}

pub fn profile_lines(profile: &UserProfile) -> Vec<String> {
    let name = profile.full_name();
    vec![
        format!("Name:    {}", if name.is_empty() { "Unknown".to_string() } else { name }),
        format!("Email:   {}", format_optional(profile.email().as_deref(), "Unknown")),
        format!(
            "Member since: {}",
            profile
                .created_at_text()
                .map(|d| format_date(&d))
                .unwrap_or_else(|| "Unknown".to_string())
        ),
    ]
}

pub fn analysis_lines(result: &AnalysisResult) -> Vec<String> {
    let mut lines = vec![
        format!("Object:          {}", format_optional(result.object_type().as_deref(), "Unknown")),
        format!("Period:          {}", format_optional(result.period().as_deref(), "Unknown")),
        format!("Estimated value: {}", result.display_estimated_value()),
        format!("Description:     {}", format_optional(result.description().as_deref(), "-")),
    ];
    if let Some(info) = result.additional_info() {
        lines.push(format!("Additional info: {}", info));
    }
    lines
}

/// One line per entry of an analysis history response.
///
/// Accepts a bare array or an object wrapping one (`analyses`, `history`
/// or `items`); returns `None` for any other shape.
pub fn history_lines(history: &Value) -> Option<Vec<String>> {
    let entries = match history {
        Value::Array(entries) => entries,
        Value::Object(map) => ["analyses", "history", "items"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))?,
        _ => return None,
    };

    let lines = entries
        .iter()
        .map(|entry| {
            let id = text(entry.get("id")).unwrap_or_else(|| "?".to_string());
            let object = text(entry.get("object_type")).unwrap_or_else(|| "Unknown".to_string());
            let date = text(entry.get("created_at"))
                .map(|d| format_date(&d))
                .unwrap_or_default();
            format!("{:>6}  {:<12}  {}", id, date, truncate_string(&object, 50))
        })
        .collect();

    Some(lines)
}
