use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::value;

/// Appraisal returned by `POST /analyze/image` and `GET /analysis/{id}`.
///
/// Passed through from the backend as-is. The appraisal is model output, so
/// no field has a guaranteed type (`period` may be `"Ming"` or `1750`);
/// every field is kept as raw JSON and read through the text accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AnalysisResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_type: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnalysisResult {
    pub fn object_type(&self) -> Option<String> {
        value::text(self.object_type.as_ref())
    }

    pub fn period(&self) -> Option<String> {
        value::text(self.period.as_ref())
    }

    pub fn description(&self) -> Option<String> {
        value::text(self.description.as_ref())
    }

    pub fn additional_info(&self) -> Option<String> {
        value::text(self.additional_info.as_ref())
    }

    pub fn display_estimated_value(&self) -> String {
        match &self.estimated_value {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => "Unknown".to_string(),
            Some(other) => other.to_string(),
        }
    }
}
