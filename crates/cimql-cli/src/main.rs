//! CIM query command-line interface

use anyhow::{Context, Result};
use cimql_diagnostics::QueryError;
use cimql_eval::{
    ApplyContext, QueryDocument, ScanErrorPolicy, Scanner, SchemaDocument, instances_from_json,
};
use cimql_types::Instance;
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt};

/// CIM query command-line tool
#[derive(Parser)]
#[command(name = "cimql")]
#[command(author, version, about = "CIM Query Language (CQL) tools", long_about = None)]
struct Cli {
    /// Log evaluation details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a query against candidate instances
    Eval(EvalArgs),
    /// Print a query after binding it to its schema
    Show(ShowArgs),
}

#[derive(Args)]
struct EvalArgs {
    /// Query document (JSON)
    query: PathBuf,
    /// Candidate instances (JSON array)
    instances: PathBuf,
    /// Schema document with classes and referenced instances (JSON)
    #[arg(short, long)]
    schema: Option<PathBuf>,
    /// What to do with candidates that fail to evaluate
    #[arg(short, long, value_enum, default_value_t = Policy::Exclude)]
    policy: Policy,
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Args)]
struct ShowArgs {
    /// Query document (JSON)
    query: PathBuf,
    /// Schema document (JSON)
    #[arg(short, long)]
    schema: Option<PathBuf>,
    /// Print the WHERE clause in disjunctive normal form
    #[arg(long)]
    dnf: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Policy {
    Exclude,
    Abort,
}

impl From<Policy> for ScanErrorPolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Exclude => ScanErrorPolicy::Exclude,
            Policy::Abort => ScanErrorPolicy::Abort,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn init_logging(verbose: bool) {
    let filter = if std::env::var_os("RUST_LOG").is_some() {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    } else if verbose {
        EnvFilter::new("cimql_eval=debug")
    } else {
        EnvFilter::new("warn")
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn load_schema(path: Option<&Path>) -> Result<SchemaDocument> {
    match path {
        Some(path) => Ok(SchemaDocument::from_json(&read(path)?)?),
        None => Ok(SchemaDocument::default()),
    }
}

fn describe(instance: &Instance) -> String {
    match &instance.path {
        Some(path) => path.to_string(),
        None => instance.class_name.clone(),
    }
}

fn eval_command(args: &EvalArgs) -> Result<String> {
    let document = QueryDocument::from_json(&read(&args.query)?)?;
    let ctx = document.context(load_schema(args.schema.as_deref())?);
    let instances = instances_from_json(&read(&args.instances)?)?;

    let mut statement = document.statement();
    statement.apply_context(&ctx).map_err(QueryError::from)?;

    let selected = Scanner::new(args.policy.into())
        .filter(&statement, &instances, &ctx)
        .map_err(QueryError::from)?;

    Ok(match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&selected)?,
        OutputFormat::Text => selected
            .iter()
            .map(|instance| describe(instance))
            .collect::<Vec<_>>()
            .join("\n"),
    })
}

fn show_command(args: &ShowArgs) -> Result<String> {
    let document = QueryDocument::from_json(&read(&args.query)?)?;
    let ctx = document.context(load_schema(args.schema.as_deref())?);

    let mut statement = document.statement();
    statement.apply_context(&ctx).map_err(QueryError::from)?;
    if args.dnf {
        statement.normalize_to_dnf().map_err(QueryError::from)?;
    }
    Ok(statement.to_string())
}

fn report(err: &anyhow::Error) {
    match err.downcast_ref::<QueryError>() {
        Some(query_error) => eprintln!("{}", query_error.to_diagnostic().render_colored()),
        None => eprintln!("{} {:#}", "error:".red().bold(), err),
    }
}

fn main() {
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match &cli.command {
        Commands::Eval(args) => eval_command(args),
        Commands::Show(args) => show_command(args),
    };

    match result {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(err) => {
            report(&err);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cimql_diagnostics::ErrorKind;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    // ============================================================================
    // Test Helpers
    // ============================================================================

    const QUERY: &str = r##"{
        "from": "CIM_Disk",
        "select": ["Name"],
        "where": {
            "body": {
                "kind": "Compound",
                "children": [
                    { "body": { "kind": "Simple", "predicate": {
                        "left": { "terms": [{ "factors": [{ "kind": { "kind": "Value", "node": { "type": "Identifier", "value": "Status" } } }] }] },
                        "op": "Eq",
                        "right": { "terms": [{ "factors": [{ "kind": { "kind": "Value", "node": { "type": "Identifier", "value": "#'OK'" } } }] }] }
                    } } },
                    { "body": { "kind": "Simple", "predicate": {
                        "left": { "terms": [{ "factors": [{ "kind": { "kind": "Value", "node": { "type": "Identifier", "value": "Name" } } }] }] },
                        "op": "Like",
                        "right": { "terms": [{ "factors": [{ "kind": { "kind": "Value", "node": { "type": "String", "value": "Disk%" } } }] }] }
                    } } }
                ],
                "operators": ["And"]
            }
        }
    }"##;

    const SCHEMA: &str = r#"{
        "classes": [
            {
                "name": "CIM_Disk",
                "properties": [
                    {
                        "name": "Status",
                        "cim_type": "Uint16",
                        "qualifiers": [
                            { "name": "Values", "value": { "type": "Array", "value": {
                                "element_type": "String",
                                "items": [
                                    { "type": "String", "value": "Unknown" },
                                    { "type": "String", "value": "Other" },
                                    { "type": "String", "value": "OK" }
                                ]
                            } } }
                        ]
                    },
                    { "name": "Name", "cim_type": "String" }
                ]
            }
        ]
    }"#;

    const INSTANCES: &str = r#"[
        { "class_name": "CIM_Disk", "properties": [
            { "name": "Status", "value": { "type": "Uint16", "value": 2 } },
            { "name": "Name", "value": { "type": "String", "value": "DiskDrive1" } }
        ] },
        { "class_name": "CIM_Disk", "properties": [
            { "name": "Status", "value": { "type": "Uint16", "value": 2 } },
            { "name": "Name", "value": { "type": "String", "value": "TapeDrive1" } }
        ] },
        { "class_name": "CIM_Disk", "properties": [
            { "name": "Status", "value": { "type": "String", "value": "broken" } },
            { "name": "Name", "value": { "type": "String", "value": "DiskDrive2" } }
        ] }
    ]"#;

    struct Fixture {
        dir: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            fs::write(dir.path().join("query.json"), QUERY).unwrap();
            fs::write(dir.path().join("schema.json"), SCHEMA).unwrap();
            fs::write(dir.path().join("instances.json"), INSTANCES).unwrap();
            Self { dir }
        }

        fn path(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }

        fn eval_args(&self, policy: Policy, format: OutputFormat) -> EvalArgs {
            EvalArgs {
                query: self.path("query.json"),
                instances: self.path("instances.json"),
                schema: Some(self.path("schema.json")),
                policy,
                format,
            }
        }
    }

    #[test]
    fn test_eval_text() {
        let fixture = Fixture::new();
        let output = eval_command(&fixture.eval_args(Policy::Exclude, OutputFormat::Text)).unwrap();
        assert_eq!(output, "CIM_Disk");
    }

    #[test]
    fn test_eval_json() {
        let fixture = Fixture::new();
        let output = eval_command(&fixture.eval_args(Policy::Exclude, OutputFormat::Json)).unwrap();
        let selected: Vec<Instance> = serde_json::from_str(&output).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(
            selected[0].property("Name").unwrap().value,
            cimql_types::CimValue::String("DiskDrive1".into())
        );
    }

    #[test]
    fn test_eval_abort_reports_query_error() {
        let fixture = Fixture::new();
        let err = eval_command(&fixture.eval_args(Policy::Abort, OutputFormat::Text)).unwrap_err();
        let query_error = err.downcast_ref::<QueryError>().unwrap();
        assert_eq!(query_error.kind(), ErrorKind::Runtime);
    }

    #[test]
    fn test_show_binds_the_statement() {
        let fixture = Fixture::new();
        let output = show_command(&ShowArgs {
            query: fixture.path("query.json"),
            schema: Some(fixture.path("schema.json")),
            dnf: false,
        })
        .unwrap();
        assert_eq!(
            output,
            "SELECT CIM_Disk.Name FROM CIM_Disk WHERE CIM_Disk.Status = CIM_Disk.Status#'OK' AND CIM_Disk.Name LIKE 'Disk%'"
        );
    }

    #[test]
    fn test_missing_file_has_context() {
        let fixture = Fixture::new();
        let err = show_command(&ShowArgs {
            query: fixture.path("missing.json"),
            schema: None,
            dnf: true,
        })
        .unwrap_err();
        assert!(err.to_string().starts_with("Failed to read"));
    }
}
