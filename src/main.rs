//! Pixelblocks CLI
//!
//! A demonstration CLI that runs the built-in components against files on
//! disk through an in-memory content store.

use anyhow::{anyhow, bail, Context, Result};
use pixelblocks::prelude::*;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("pixelblocks");

    match args.get(1).map(String::as_str) {
        Some("list") => list_components(),
        Some("info") => {
            let key = args.get(2).ok_or_else(|| anyhow!("please specify a component key"))?;
            component_info(key)
        }
        Some("schema") => print_schema(args.get(2).map(String::as_str)),
        Some("run") => {
            if args.len() < 5 {
                bail!("usage: {} run <key> <input> <output> [name=value ...]", program);
            }
            run(&args[2], Path::new(&args[3]), Path::new(&args[4]), &args[5..])
        }
        Some("help") | Some("--help") | Some("-h") | None => {
            print_usage(program);
            Ok(())
        }
        Some(other) => {
            print_usage(program);
            bail!("unknown command: {}", other)
        }
    }
}

fn print_usage(program: &str) {
    println!("Pixelblocks v{}", pixelblocks::VERSION);
    println!();
    println!("Usage: {} <command> [options]", program);
    println!();
    println!("Commands:");
    println!("  list                                  List all components");
    println!("  info <key>                            Show details of a component");
    println!("  schema [key]                          Print host registration JSON");
    println!("  run <key> <in> <out> [name=value...]  Run a component on a file");
    println!("  help                                  Show this help message");
    println!();
    println!("Parameter values are parsed as JSON when possible, otherwise as text.");
    println!("A value of the form @path loads that file as an image sequence,");
    println!("e.g. compositeImages=@logo.png.");
}

fn list_components() -> Result<()> {
    let registry = ComponentRegistry::with_builtins();
    println!("Available components ({} total):", registry.len());
    println!();

    for category in Category::all() {
        let keys = registry.by_category(*category);
        if keys.is_empty() {
            continue;
        }
        println!("  {}", category.display_name());
        for key in keys {
            if let Some(descriptor) = registry.get(key) {
                println!("      {} - {}", key, descriptor.schema.title);
            }
        }
        println!();
    }
    Ok(())
}

fn component_info(key: &str) -> Result<()> {
    let registry = ComponentRegistry::with_builtins();
    let schema = &registry
        .get(key)
        .ok_or_else(|| anyhow!("component not found: {} (use 'list')", key))?
        .schema;

    println!("Component: {}", schema.title);
    println!("Key: {}:{}", schema.namespace, schema.key);
    println!("Category: {}", schema.category.display_name());
    println!();
    println!("Description:");
    println!("  {}", schema.description);
    println!();

    println!("Inputs:");
    for port in &schema.inputs {
        let optional = if port.required { "" } else { " (optional)" };
        println!("  {} [{}]{}", port.name, port.port_type, optional);
    }
    println!();

    if !schema.parameters.is_empty() {
        println!("Parameters:");
        for param in &schema.parameters {
            let default = param
                .default_value
                .as_ref()
                .map(|v| format!(" = {}", v))
                .unwrap_or_else(|| if param.required { " (required)".into() } else { String::new() });
            println!("  {} [{}]{}", param.name, param.param_type, default);
            if !param.description.is_empty() {
                println!("    {}", param.description);
            }
        }
        println!();
    }

    println!("Output: {}", schema.result_field());
    Ok(())
}

fn print_schema(key: Option<&str>) -> Result<()> {
    let registry = ComponentRegistry::with_builtins();
    let doc = match key {
        Some(key) => registry
            .get(key)
            .ok_or_else(|| anyhow!("component not found: {}", key))?
            .schema
            .to_json(),
        None => Value::Array(registry.schemas().map(ComponentSchema::to_json).collect()),
    };
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}

/// Load a file into the store and return its reference list.
fn load(store: &MemoryStore, path: &Path) -> Result<Value> {
    let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let format = image::guess_format(&data)
        .map(ImageFormat::from_image_format)
        .unwrap_or(ImageFormat::Unknown);
    let ticket = store.insert(data, format.mime_type(), Meta::new());
    Ok(json!([{ "ticket": ticket }]))
}

fn run(key: &str, input: &Path, output: &Path, params: &[String]) -> Result<()> {
    let registry = ComponentRegistry::with_builtins();
    let store = Arc::new(MemoryStore::new());
    let ctx = ExecutionContext::new(store.clone()).with_user(UserIdentity::new("cli"));

    let mut payload = Payload::new().with("images", load(&store, input)?);
    for param in params {
        let (name, raw) = param
            .split_once('=')
            .ok_or_else(|| anyhow!("expected name=value, got '{}'", param))?;
        let value = match raw.strip_prefix('@') {
            Some(path) => load(&store, Path::new(path))?,
            None => serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string())),
        };
        payload.insert(name, value);
    }

    log::info!("running {} on {}", key, input.display());
    let result = registry.invoke(key, payload, &ctx)?;

    match result.image_refs("images")?.and_then(|refs| refs.into_iter().next()) {
        Some(reference) => {
            let object = store.get(&reference.ticket)?;
            std::fs::write(output, &object.data)
                .with_context(|| format!("writing {}", output.display()))?;
            println!("{} -> {} ({})", input.display(), output.display(), object.mime_type);
            println!("{}", serde_json::to_string_pretty(&object.meta)?);
        }
        None => {
            let report = serde_json::to_string_pretty(&result.into_value())?;
            std::fs::write(output, &report)
                .with_context(|| format!("writing {}", output.display()))?;
            println!("{}", report);
        }
    }
    Ok(())
}
