//! Output formatting for CLI commands.

use serde::Serialize;
use serde_json::Value;

use crate::cli::args::{KindredArgs, OutputFormat};
use crate::error::Result;

/// Result structure for collection creation.
#[derive(Debug, Serialize)]
pub struct CollectionResult {
    pub collection: String,
    pub created: bool,
}

/// Result structure for a mapping declaration.
#[derive(Debug, Serialize)]
pub struct MappingResult {
    pub collection: String,
    pub doc_type: String,
    pub parent_type: Option<String>,
    pub nested_paths: Vec<String>,
}

/// Result structure for a single write.
#[derive(Debug, Serialize)]
pub struct WriteResult {
    pub collection: String,
    pub action: String,
    pub doc_type: String,
    pub id: String,
    pub generation: u64,
}

/// Result structure for bulk ingestion.
#[derive(Debug, Serialize)]
pub struct BulkResult {
    pub collection: String,
    pub operations: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<String>,
    pub duration_ms: u64,
    pub generation: u64,
}

/// Result structure for a document lookup.
#[derive(Debug, Serialize)]
pub struct DocumentResult {
    pub found: bool,
    pub doc_type: String,
    pub id: String,
    pub parent: Option<String>,
    pub source: Option<Value>,
}

/// Result structure for listing collections.
#[derive(Debug, Serialize)]
pub struct CollectionList {
    pub collections: Vec<String>,
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize>(message: &str, result: &T, args: &KindredArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output a rendered search response.
pub fn output_search(response: &Value, args: &KindredArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => {
            output_search_results_human(response);
            Ok(())
        }
        OutputFormat::Json => output_json(response, args),
    }
}

/// Output in human-readable format.
fn output_human<T: Serialize>(message: &str, result: &T, args: &KindredArgs) -> Result<()> {
    if args.verbosity() > 0 {
        println!("{message}");
        println!();
    }

    let value = serde_json::to_value(result)?;
    output_generic_human(&value, 0);
    Ok(())
}

/// Output search results in human format.
fn output_search_results_human(value: &Value) {
    let hits = value
        .pointer("/hits/hits")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    println!("Search Results:");
    println!("═══════════════");

    for (i, hit) in hits.iter().enumerate() {
        println!();
        let doc_type = hit.get("_type").and_then(Value::as_str).unwrap_or("?");
        let id = hit.get("_id").and_then(Value::as_str).unwrap_or("?");
        match hit.get("_parent").and_then(Value::as_str) {
            Some(parent) => println!("Result {}: {doc_type}/{id} (parent {parent})", i + 1),
            None => println!("Result {}: {doc_type}/{id}", i + 1),
        }
        println!("─────────────");
        if let Some(source) = hit.get("_source") {
            output_generic_human(source, 1);
        }
    }

    println!();
    if let Some(total) = value.pointer("/hits/total").and_then(Value::as_u64) {
        println!("Total hits: {total}");
    }
    if let Some(took) = value.get("took").and_then(Value::as_u64) {
        println!("Search time: {took}ms");
    }
}

/// Output generic data in human format.
fn output_generic_human(value: &Value, indent: usize) {
    let spaces = "  ".repeat(indent);
    match value {
        Value::Object(obj) => {
            for (key, val) in obj {
                match val {
                    Value::Object(inner) if !inner.is_empty() => {
                        println!("{spaces}{key}:");
                        output_generic_human(val, indent + 1);
                    }
                    Value::Array(items) if items.iter().any(Value::is_object) => {
                        println!("{spaces}{key}:");
                        for item in items {
                            println!("{spaces}  -");
                            output_generic_human(item, indent + 2);
                        }
                    }
                    _ => println!("{spaces}{key}: {}", format_value(val)),
                }
            }
        }
        _ => println!("{spaces}{}", format_value(value)),
    }
}

/// Output in JSON format.
fn output_json<T: Serialize + ?Sized>(result: &T, args: &KindredArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

/// Format a JSON value for display.
fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(arr) => {
            let formatted_values = arr.iter().map(format_value).collect::<Vec<_>>().join(", ");
            format!("[{formatted_values}]")
        }
        Value::Object(_) => "[object]".to_string(),
        Value::Null => "null".to_string(),
    }
}
