//! Command implementations for the Kindred CLI.

use std::fs;
use std::io::{self, Read};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use log::{debug, info};
use serde_json::Value;

use crate::cli::args::*;
use crate::cli::output::*;
use crate::document::JsonDocumentConverter;
use crate::engine::{Engine, EngineConfig};
use crate::index::BulkRequest;
use crate::schema::Mapping;
use crate::search::SearchRequest;

/// Execute a CLI command.
pub fn execute_command(args: KindredArgs) -> Result<()> {
    let config = EngineConfig::builder().data_dir(&args.data_dir).build()?;
    let engine = Engine::new(config)
        .with_context(|| format!("failed to open data directory {}", args.data_dir.display()))?;
    debug!("Opened engine at {}", args.data_dir.display());

    match &args.command {
        Command::CreateCollection(create_args) => create_collection(&engine, create_args, &args),
        Command::PutMapping(mapping_args) => put_mapping(&engine, mapping_args, &args),
        Command::Index(index_args) => index_document(&engine, index_args, &args),
        Command::Delete(delete_args) => delete_document(&engine, delete_args, &args),
        Command::Bulk(bulk_args) => bulk(&engine, bulk_args, &args),
        Command::Search(search_args) => search(&engine, search_args, &args),
        Command::Get(get_args) => get_document(&engine, get_args, &args),
        Command::Health => health(&engine, &args),
        Command::List => list_collections(&engine, &args),
    }
}

/// Read an argument that is inline text, `@path`, or `-` for stdin.
fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read stdin")?;
        Ok(buffer)
    } else if let Some(path) = input.strip_prefix('@') {
        fs::read_to_string(path).with_context(|| format!("failed to read {path}"))
    } else {
        Ok(input.to_string())
    }
}

fn read_json(input: &str) -> Result<Value> {
    let text = read_input(input)?;
    serde_json::from_str(&text).context("input is not valid JSON")
}

fn create_collection(engine: &Engine, args: &CreateCollectionArgs, cli_args: &KindredArgs) -> Result<()> {
    engine.create_collection(&args.collection)?;
    info!("Created collection '{}'", args.collection);

    output_result(
        "Collection created successfully",
        &CollectionResult {
            collection: args.collection.clone(),
            created: true,
        },
        cli_args,
    )?;
    Ok(())
}

fn put_mapping(engine: &Engine, args: &PutMappingArgs, cli_args: &KindredArgs) -> Result<()> {
    let value = read_json(&args.mapping)?;
    let mapping = Mapping::from_json(&args.doc_type, &value)
        .with_context(|| format!("invalid mapping for type '{}'", args.doc_type))?;
    engine.declare_mapping(&args.collection, mapping)?;

    let declared = engine
        .collection(&args.collection)?
        .mapping(&args.doc_type)
        .context("mapping vanished after declaration")?;

    output_result(
        "Mapping declared successfully",
        &MappingResult {
            collection: args.collection.clone(),
            doc_type: args.doc_type.clone(),
            parent_type: declared.parent_type().map(str::to_string),
            nested_paths: declared.nested_paths(),
        },
        cli_args,
    )?;
    Ok(())
}

fn index_document(engine: &Engine, args: &IndexArgs, cli_args: &KindredArgs) -> Result<()> {
    let source = JsonDocumentConverter::new().convert(&read_json(&args.source)?)?;
    let id = engine.index(
        &args.collection,
        &args.doc_type,
        args.id.as_deref(),
        args.parent.as_deref(),
        source,
    )?;
    let generation = engine.commit(&args.collection)?;

    output_result(
        "Document indexed successfully",
        &WriteResult {
            collection: args.collection.clone(),
            action: "index".to_string(),
            doc_type: args.doc_type.clone(),
            id,
            generation,
        },
        cli_args,
    )?;
    Ok(())
}

fn delete_document(engine: &Engine, args: &DeleteArgs, cli_args: &KindredArgs) -> Result<()> {
    engine.delete(&args.collection, &args.doc_type, &args.id)?;
    let generation = engine.commit(&args.collection)?;

    output_result(
        "Document deleted successfully",
        &WriteResult {
            collection: args.collection.clone(),
            action: "delete".to_string(),
            doc_type: args.doc_type.clone(),
            id: args.id.clone(),
            generation,
        },
        cli_args,
    )?;
    Ok(())
}

fn bulk(engine: &Engine, args: &BulkArgs, cli_args: &KindredArgs) -> Result<()> {
    let start_time = Instant::now();
    let input = if args.file == "-" {
        read_input("-")?
    } else {
        read_input(&format!("@{}", args.file))?
    };
    let request = BulkRequest::from_ndjson(&input)?;
    let operations = request.len();

    let response = engine.bulk(&args.collection, request)?;
    let generation = engine.commit(&args.collection)?;

    let errors: Vec<String> = response
        .failures()
        .map(|item| {
            let reason = item.error.as_ref().map(ToString::to_string).unwrap_or_default();
            format!("[{}] {} {}: {}", item.position, item.action, item.doc_type, reason)
        })
        .collect();

    output_result(
        "Bulk request applied",
        &BulkResult {
            collection: args.collection.clone(),
            operations,
            succeeded: response.succeeded(),
            failed: errors.len(),
            errors,
            duration_ms: start_time.elapsed().as_millis() as u64,
            generation,
        },
        cli_args,
    )?;
    Ok(())
}

fn search(engine: &Engine, args: &SearchArgs, cli_args: &KindredArgs) -> Result<()> {
    let mut request = match &args.request {
        Some(input) => SearchRequest::from_json(&read_json(input)?, engine.query_parser())?,
        None => SearchRequest::match_all(),
    };
    if !args.types.is_empty() {
        request = request.with_types(args.types.clone());
    }
    if let Some(size) = args.size {
        request = request.with_size(size);
    }
    if let Some(from) = args.from {
        request = request.with_from(from);
    }

    let response = engine.search(&args.collection, &request)?;
    output_search(&response.to_json(), cli_args)?;
    Ok(())
}

fn get_document(engine: &Engine, args: &GetArgs, cli_args: &KindredArgs) -> Result<()> {
    let document = engine.get(&args.collection, &args.doc_type, &args.id)?;
    let converter = JsonDocumentConverter::new();

    let result = DocumentResult {
        found: document.is_some(),
        doc_type: args.doc_type.clone(),
        id: args.id.clone(),
        parent: document.as_ref().and_then(|doc| doc.parent.clone()),
        source: document.as_ref().map(|doc| converter.to_json(&doc.source)),
    };
    output_result("Document lookup", &result, cli_args)?;

    if !result.found {
        bail!("document {}/{} not found", args.doc_type, args.id);
    }
    Ok(())
}

fn health(engine: &Engine, cli_args: &KindredArgs) -> Result<()> {
    let report = engine.health();
    output_result("Engine health", &report, cli_args)?;
    Ok(())
}

fn list_collections(engine: &Engine, cli_args: &KindredArgs) -> Result<()> {
    output_result(
        "Collections",
        &CollectionList {
            collections: engine.collection_names(),
        },
        cli_args,
    )?;
    Ok(())
}
