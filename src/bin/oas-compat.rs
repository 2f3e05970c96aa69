//! oas-compat CLI
//!
//! Command-line interface for comparing OpenAPI documents, validating
//! payloads against component schemas, and printing resolved schemas.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use oas_compat::{
    compare_specs_with, load_document, load_json, normalize, resolve_root,
    CompareOptions, CompareResult, Document, NullableDialect, SchemaRegistry, ValidateOptions,
    Validator,
};

#[derive(Parser)]
#[command(name = "oas-compat")]
#[command(about = "Resolve, validate and compare OpenAPI documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two documents and report breaking changes
    Compare {
        /// Base document: file path or URL (http:// or https://)
        base: String,

        /// Head document: file path or URL
        head: String,

        /// Output the result as JSON (for automation)
        #[arg(long)]
        json: bool,

        /// Report newly required response properties as non-breaking
        #[arg(long)]
        no_response_required_breaking: bool,

        /// Don't flag newly added required parameters
        #[arg(long)]
        allow_required_param_addition: bool,
    },

    /// Validate a JSON payload against a component schema
    Validate {
        /// Document containing the schema: file path or URL
        document: String,

        /// Payload file to validate
        payload: PathBuf,

        /// Component schema name (under #/components/schemas/)
        #[arg(long, short)]
        schema: String,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,

        /// Strict mode: reject properties not declared by the schema
        #[arg(long)]
        strict: bool,
    },

    /// Print a component schema with every $ref resolved
    Resolve {
        /// Document containing the schema: file path or URL
        document: String,

        /// Component schema name (under #/components/schemas/)
        #[arg(long, short)]
        schema: String,

        /// Nullable dialect of the output: flag (3.0) or union (3.1)
        #[arg(long, value_parser = parse_dialect)]
        dialect: Option<NullableDialect>,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("OAS_COMPAT_LOG")
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compare {
            base,
            head,
            json,
            no_response_required_breaking,
            allow_required_param_addition,
        } => {
            let options = CompareOptions::new()
                .response_required_is_breaking(!no_response_required_breaking)
                .required_parameter_addition_is_breaking(!allow_required_param_addition);
            run_compare(&base, &head, json, &options)
        }

        Commands::Validate {
            document,
            payload,
            schema,
            json,
            strict,
        } => run_validate(&document, &payload, &schema, json, strict),

        Commands::Resolve {
            document,
            schema,
            dialect,
            output,
            pretty,
        } => run_resolve(&document, &schema, dialect, output, pretty),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn parse_dialect(s: &str) -> Result<NullableDialect, String> {
    NullableDialect::parse(s)
        .ok_or_else(|| format!("unknown dialect '{}' (expected flag or union)", s))
}

fn load(source: &str) -> Result<Document, u8> {
    load_document(source).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })
}

fn run_compare(
    base: &str,
    head: &str,
    json_output: bool,
    options: &CompareOptions,
) -> Result<(), u8> {
    let base = load(base)?;
    let head = load(head)?;

    let result = compare_specs_with(&base, &head, options);

    if json_output {
        let output = serde_json::to_string_pretty(&result).map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        })?;
        println!("{}", output);
    } else {
        print_compare_report(&result);
    }

    if result.has_breaking() {
        Err(1)
    } else {
        Ok(())
    }
}

fn print_compare_report(result: &CompareResult) {
    if result.is_empty() {
        println!("No changes");
        return;
    }

    for (title, entries) in [
        ("Breaking changes", &result.breaking),
        ("Non-breaking changes", &result.non_breaking),
        ("Deprecations", &result.deprecated),
    ] {
        if entries.is_empty() {
            continue;
        }
        println!("{} ({}):", title, entries.len());
        for entry in entries {
            println!("  {}", entry);
        }
    }
}

fn run_validate(
    document_source: &str,
    payload_path: &std::path::Path,
    schema_name: &str,
    json_output: bool,
    strict: bool,
) -> Result<(), u8> {
    let document = load_document(document_source).map_err(|e| {
        report_error(json_output, &format!("loading document: {}", e));
        e.exit_code() as u8
    })?;

    let payload = load_json(payload_path).map_err(|e| {
        report_error(json_output, &format!("loading payload: {}", e));
        e.exit_code() as u8
    })?;

    let Some(schema) = document.schema(schema_name) else {
        report_error(
            json_output,
            &format!("schema not found in components: {}", schema_name),
        );
        return Err(2);
    };

    let registry = SchemaRegistry::from_document(&document);
    let mut validator = Validator::with_options(&registry, ValidateOptions::new().strict(strict));
    let errors = validator.validate_composite_schema(&payload, schema);

    for warning in validator.take_warnings() {
        eprintln!("Warning: {}", warning);
    }

    if errors.is_empty() {
        if json_output {
            println!(r#"{{"valid":true}}"#);
        } else {
            println!("Valid");
        }
        return Ok(());
    }

    if json_output {
        let output = serde_json::json!({
            "valid": false,
            "errors": errors
        });
        println!("{}", output);
    } else {
        eprintln!("Validation failed:");
        for error in errors {
            eprintln!("  {}", error);
        }
    }
    Err(1)
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!("{}", serde_json::json!({ "valid": false, "error": msg }));
    } else {
        eprintln!("Error: {}", msg);
    }
}

fn run_resolve(
    document_source: &str,
    schema_name: &str,
    dialect: Option<NullableDialect>,
    output: Option<PathBuf>,
    pretty: bool,
) -> Result<(), u8> {
    let document = load(document_source)?;

    let Some(schema) = document.schema(schema_name) else {
        eprintln!("Error: schema not found in components: {}", schema_name);
        return Err(2);
    };

    let registry = SchemaRegistry::from_document(&document);
    let resolved = resolve_root(schema, &registry);
    let resolved = match dialect {
        Some(dialect) => normalize(&resolved, dialect),
        None => resolved,
    };

    let value = resolved.to_value();
    let json_output = if pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(&path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}
