use rmcp::model::JsonObject;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::ToolError;
use crate::tools::catalog::ToolDescriptor;

const MAX_REASON_CHARS: usize = 600;

/// Deserialize tool arguments, applying schema defaults. Failures name the tool and, for
/// missing fields, the schema's required set.
pub(super) fn parse_args<T: DeserializeOwned>(
    tool: &ToolDescriptor,
    arguments: Option<JsonObject>,
) -> Result<T, ToolError> {
    let value = Value::Object(arguments.unwrap_or_default());
    serde_json::from_value(value).map_err(|err| ToolError::InvalidArguments {
        tool: tool.name,
        reason: reason_with_hint(tool, &err.to_string()),
    })
}

fn reason_with_hint(tool: &ToolDescriptor, message: &str) -> String {
    let mut reason = message.to_string();
    if message.starts_with("missing field") {
        let required = tool.required_fields();
        if !required.is_empty() {
            reason.push_str(". Required: ");
            reason.push_str(&required.join(", "));
        }
    }
    if reason.chars().count() > MAX_REASON_CHARS {
        reason = reason.chars().take(MAX_REASON_CHARS).collect();
        reason.push('…');
    }
    reason
}
