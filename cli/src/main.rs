mod config;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use schema_check_core::{
    Object, ObjectMut, SchemaChecker, TracingDiagnostics, Value, WriteOutcome,
    from_json_with_patterns,
};
use serde::{Deserialize, Deserializer};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Debug, Parser)]
#[command(name = "schema-check")]
#[command(about = "Apply declarative schemas to JSON objects and replay validated writes")]
struct Cli {
    /// Log debug diagnostics to stderr (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply a schema to an object and print the governed object.
    Check(CheckArgs),
    /// Apply a schema, then replay a list of writes against the object.
    Write(WriteArgs),
}

#[derive(Debug, Args)]
struct SchemaArgs {
    /// JSON file holding the object to govern.
    #[arg(long)]
    object: PathBuf,
    /// JSON schema file. Patterns are written as {"$regex": "<source>"}.
    #[arg(long)]
    schema: PathBuf,
    /// YAML config file with check options.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Drop rejected writes instead of failing them.
    #[arg(long)]
    silent: bool,
    /// Request strict mode (accepted, not enforced).
    #[arg(long)]
    strict: bool,
}

#[derive(Debug, Args)]
struct CheckArgs {
    #[command(flatten)]
    schema: SchemaArgs,
}

#[derive(Debug, Args)]
struct WriteArgs {
    #[command(flatten)]
    schema: SchemaArgs,
    /// JSON array of writes: {"path": "a.b", "value": ...} or {"path": "a", "delete": true}.
    #[arg(long)]
    writes: PathBuf,
}

/// One write replayed by the `write` command.
#[derive(Debug, Deserialize)]
struct WriteOp {
    path: String,
    /// `None` when the key is absent; an explicit `null` is `Some(Null)`.
    #[serde(default, deserialize_with = "present")]
    value: Option<serde_json::Value>,
    #[serde(default)]
    delete: bool,
}

fn present<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Check(args) => run_check(args),
        Command::Write(args) => run_write(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_check(args: CheckArgs) -> Result<(), String> {
    let target = load_governed(&args.schema)?;
    print_json(&target)
}

fn run_write(args: WriteArgs) -> Result<(), String> {
    let mut target = load_governed(&args.schema)?;
    let raw = read_json(&args.writes)?;
    let ops: Vec<WriteOp> = serde_json::from_value(raw)
        .map_err(|err| format!("Invalid writes in '{}': {err}", args.writes.display()))?;

    let Value::Object(root) = &mut target else {
        return Err("governed value is not an object".to_string());
    };

    let mut failures = 0;
    for op in ops {
        match apply_op(root, &op) {
            Ok(status) => println!("{}: {status}", op.path),
            Err(err) => {
                failures += 1;
                println!("{}: error: {err}", op.path);
            }
        }
    }

    print_json(&target)?;
    if failures > 0 {
        return Err(format!("{failures} write(s) failed"));
    }
    Ok(())
}

fn apply_op(root: &mut Object, op: &WriteOp) -> Result<&'static str, String> {
    let (mut object, field) = resolve_path(root, &op.path)?;
    if op.delete {
        return match object.remove(field).map_err(|err| err.to_string())? {
            Some(_) => Ok("removed"),
            None => Ok("unchanged"),
        };
    }
    let value = op.value.clone().map(Value::from).unwrap_or(Value::Null);
    let outcome = object.set(field, value).map_err(|err| err.to_string())?;
    Ok(match outcome {
        WriteOutcome::Committed => "committed",
        WriteOutcome::Rejected => "rejected",
        WriteOutcome::Ignored => "ignored",
    })
}

/// Walks a dotted path down nested objects and returns the object holding
/// the last segment together with that segment.
fn resolve_path<'a, 'p>(
    root: &'a mut Object,
    path: &'p str,
) -> Result<(ObjectMut<'a>, &'p str), String> {
    let mut segments: Vec<&str> = path.split('.').collect();
    let field = segments
        .pop()
        .filter(|field| !field.is_empty())
        .ok_or_else(|| format!("invalid path '{path}'"))?;

    let mut object = ObjectMut::from(root);
    for segment in segments {
        object = object
            .into_object_mut(segment)
            .ok_or_else(|| format!("'{segment}' in '{path}' is not an object"))?;
    }
    Ok((object, field))
}

fn load_governed(args: &SchemaArgs) -> Result<Value, String> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let options = config.resolve(args.silent, args.strict);

    let mut target = Value::from(read_json(&args.object)?);
    let schema = from_json_with_patterns(read_json(&args.schema)?)
        .map_err(|err| format!("Invalid pattern in '{}': {err}", args.schema.display()))?;

    SchemaChecker::new()
        .with_options(options)
        .with_diagnostics(Arc::new(TracingDiagnostics))
        .check(&mut target, &schema)
        .map_err(|err| err.to_string())?;
    tracing::debug!(object = %args.object.display(), ?options, "schema applied");
    Ok(target)
}

fn read_json(path: &Path) -> Result<serde_json::Value, String> {
    let raw = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read '{}': {err}", path.display()))?;
    serde_json::from_str(&raw).map_err(|err| format!("Failed to parse '{}': {err}", path.display()))
}

fn print_json(value: &Value) -> Result<(), String> {
    let raw = serde_json::to_string_pretty(&value.to_json())
        .map_err(|err| format!("Failed to serialize object: {err}"))?;
    println!("{raw}");
    Ok(())
}
