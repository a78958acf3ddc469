use serde_json::{json, Value};

use crate::api::ShipmentError;
use crate::cli::OutputFormat;
use crate::error::ApiError;

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            match data {
                Some(Value::Object(fields)) => {
                    if let Value::Object(map) = &mut response {
                        map.extend(fields);
                    }
                }
                Some(Value::Null) | None => {}
                Some(other) => response["data"] = other,
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(
    output_format: &OutputFormat,
    message: &str,
    error_code: Option<&str>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });

            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(
    output_format: &OutputFormat,
    collection_name: &str,
    message: &str,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({
                collection_name: []
            }))?);
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}

/// Machine-readable code for a command failure
pub fn error_code(error: &anyhow::Error) -> &'static str {
    if let Some(api) = error.downcast_ref::<ApiError>() {
        return api.error_code();
    }
    match error.downcast_ref::<ShipmentError>() {
        Some(ShipmentError::Blocked { .. }) => "ACTION_BLOCKED",
        Some(ShipmentError::Api(api)) => api.error_code(),
        None => "CLI_ERROR",
    }
}

pub fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}
