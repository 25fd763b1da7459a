//! immosieve CLI: run listing queries over a JSON file of records.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use immosieve_core::config::{ConfigPatch, QueryConfig};
use immosieve_core::manifest::QueryManifest;
use immosieve_core::record::RealEstate;
use immosieve_exec::{Engine, ExecError};
use immosieve_planner::{compile, parse_query_yaml, PlanError, QueryOptions};

#[derive(Parser)]
#[command(name = "immosieve")]
#[command(about = "Filter, sort, page, and budget real-estate listings", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a query and print the matching listings as JSON
    Query {
        /// JSON file holding an array of listings
        #[arg(short, long)]
        records: PathBuf,

        #[command(flatten)]
        query: QueryArgs,

        /// Also print the query manifest to stderr
        #[arg(long)]
        manifest: bool,
    },

    /// Check a query for errors without touching any records
    Validate {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Show the compiled query plan
    Explain {
        #[command(flatten)]
        query: QueryArgs,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Query sources: a YAML document, flags, or both (flags win).
#[derive(Args, Debug, Default)]
struct QueryArgs {
    /// YAML query document
    #[arg(short, long)]
    query: Option<PathBuf>,

    #[arg(long)]
    filter: Option<String>,

    /// e.g. `kaltmiete,zimmer:desc`
    #[arg(long)]
    sort: Option<String>,

    /// e.g. `limit:10,page:0`
    #[arg(long)]
    paging: Option<String>,

    /// e.g. `pictures:2,bytes:1048576`
    #[arg(long)]
    attachments: Option<String>,

    /// e.g. `freitexte,attachments`
    #[arg(long)]
    include: Option<String>,

    /// Longest accepted filter (overrides env and document)
    #[arg(long)]
    max_filter_len: Option<usize>,

    /// Deepest accepted filter nesting (overrides env and document)
    #[arg(long)]
    max_filter_depth: Option<usize>,

    /// Default attachment byte cap (overrides env and document)
    #[arg(long)]
    attachment_byte_cap: Option<u64>,

    /// Paging limit ceiling (overrides env and document)
    #[arg(long)]
    max_page_size: Option<usize>,
}

impl QueryArgs {
    /// Options and config with precedence flags > document > environment.
    /// A document can only tighten the filter bounds.
    fn resolve(&self) -> Result<(QueryOptions, QueryConfig), Box<dyn std::error::Error>> {
        let mut config = QueryConfig::from_env();
        let mut options = QueryOptions::default();

        if let Some(path) = &self.query {
            let parsed = parse_query_yaml(&fs::read_to_string(path)?)?;
            config = config.merged(&parsed.config);
            options = parsed.options;
        }

        config = config.overridden(&ConfigPatch {
            max_filter_len: self.max_filter_len,
            max_filter_depth: self.max_filter_depth,
            default_byte_cap: self.attachment_byte_cap,
            max_page_size: self.max_page_size,
            ..Default::default()
        });
        overlay(&mut options.filter, &self.filter);
        overlay(&mut options.sort, &self.sort);
        overlay(&mut options.paging, &self.paging);
        overlay(&mut options.attachments, &self.attachments);
        overlay(&mut options.include, &self.include);

        Ok((options, config))
    }
}

fn overlay(slot: &mut Option<String>, flag: &Option<String>) {
    if let Some(v) = flag {
        *slot = Some(v.clone());
    }
}

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.debug { "debug" } else { "warn" })
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match cli.command {
        Commands::Query {
            records,
            query,
            manifest,
        } => run_query(&records, &query, manifest),
        Commands::Validate { query } => validate_query(&query),
        Commands::Explain { query, json } => explain_query(&query, json),
    };

    if let Err(e) = result {
        eprintln!("{}", report(e.as_ref()));
        std::process::exit(1);
    }
}

/// `code: message` for query errors, plain text for everything else.
fn report(e: &(dyn std::error::Error + 'static)) -> String {
    if let Some(x) = e.downcast_ref::<ExecError>() {
        return format!("{}: {}", x.code(), x);
    }
    if let Some(x) = e.downcast_ref::<PlanError>() {
        return format!("{}: {}", x.code(), x);
    }
    format!("error: {}", e)
}

#[derive(Serialize)]
struct Report<'a> {
    manifest: &'a QueryManifest,
}

fn run_query(
    records_path: &Path,
    args: &QueryArgs,
    print_manifest: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (options, config) = args.resolve()?;
    let engine = Engine::new(config);
    let plan = engine.plan(&options)?;

    let records: Vec<RealEstate> = serde_json::from_str(&fs::read_to_string(records_path)?)?;
    let output = engine.run(&records, &plan)?;

    let rendered: Vec<RealEstate> = output.hits.iter().map(|h| h.render(&plan)).collect();
    println!("{}", serde_json::to_string_pretty(&rendered)?);

    tracing::info!(
        manifest_id = %output.manifest.id.0,
        plan_hash = %output.manifest.plan_hash,
        records_out = output.manifest.records_out,
        "query finished"
    );
    if print_manifest {
        let report = Report {
            manifest: &output.manifest,
        };
        eprintln!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

fn validate_query(args: &QueryArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (options, config) = args.resolve()?;
    compile(&options, &config)?;
    println!("✓ Query is valid");
    Ok(())
}

fn explain_query(args: &QueryArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (options, config) = args.resolve()?;
    let plan = compile(&options, &config)?;
    if json {
        println!("{}", plan.to_json_pretty()?);
    } else {
        println!("Query Plan");
        println!("==========");
        print!("{}", plan.explain());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let args = QueryArgs {
            filter: Some("zimmer>=3".into()),
            max_filter_depth: Some(3),
            attachment_byte_cap: Some(4096),
            ..Default::default()
        };
        let (options, config) = args.resolve().unwrap();
        assert_eq!(options.filter.as_deref(), Some("zimmer>=3"));
        assert_eq!(config.max_filter_depth, 3);
        assert_eq!(config.default_byte_cap, Some(4096));
    }

    #[test]
    fn report_prefixes_code() {
        let err: Box<dyn std::error::Error> = Box::new(PlanError::Query(
            immosieve_core::error::Error::InvalidSortingOption("preis".into()),
        ));
        assert_eq!(report(err.as_ref()), "201: Invalid sorting option: \"preis\"");
    }
}
