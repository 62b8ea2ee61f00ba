use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Output a success message in the appropriate format
pub fn output_success(output_format: OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });
            if let Some(data_value) = data {
                response["data"] = data_value;
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Render rows as `key: value` lines or a JSON array
pub fn output_rows(output_format: OutputFormat, rows: &[Value]) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(rows)?),
        OutputFormat::Text => {
            for row in rows {
                if let Some(map) = row.as_object() {
                    let line: Vec<String> = map
                        .iter()
                        .map(|(k, v)| format!("{}: {}", k, v.as_str().map(String::from).unwrap_or_else(|| v.to_string())))
                        .collect();
                    println!("{}", line.join("  "));
                }
            }
        }
    }
    Ok(())
}
