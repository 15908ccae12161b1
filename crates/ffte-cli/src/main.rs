//! ffte CLI - failure-first API probing with curl reproductions

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use ffte_core::config::DEFAULT_FILES;
use ffte_core::{
    Config, FailureKind, OutputSchema, Report, VerdictPolicy, VerdictStatus, format_report,
    generate_schema, leaves_only, load_log, walk, write_log,
};
use ffte_runner::{ReqwestTransport, Scanner, load_operations};

#[derive(Parser)]
#[command(name = "ffte")]
#[command(about = "Failure-first API probing: edge-case inputs, failure taxonomy, curl reproductions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "terminal")]
    output: OutputFormat,

    /// Client errors (4xx) do not fail the run
    #[arg(long, global = true)]
    lenient: bool,

    /// Debug logging (every request)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe every operation of an OpenAPI document
    Scan {
        /// OpenAPI document (path or URL); overrides the config
        spec: Option<String>,

        /// Config file (default: .ffte.toml, .ffte.json, ffte.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Server to probe (default: origin of a spec URL)
        #[arg(long)]
        base_url: Option<String>,

        /// Extra header, `Name: value` (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Per-request timeout in seconds
        #[arg(long)]
        timeout: Option<f64>,

        /// Candidates per body field
        #[arg(long)]
        max_candidates: Option<usize>,

        /// Probe only the first N operations
        #[arg(long)]
        limit_endpoints: Option<usize>,

        /// Requests in flight at once
        #[arg(long)]
        concurrency: Option<usize>,

        /// Drop a failure kind from the report (repeatable)
        #[arg(long, value_parser = parse_kind)]
        ignore: Vec<FailureKind>,

        /// Write every execution as JSONL
        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Write the text report to a file
        #[arg(long)]
        report_file: Option<PathBuf>,

        /// Keep auth headers readable in the execution log
        #[arg(long)]
        no_mask: bool,

        /// Show the request plan without sending anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Rebuild the report from an execution log
    Report {
        /// JSONL log or JSON array of log entries
        log: PathBuf,

        /// Drop a failure kind from the report (repeatable)
        #[arg(long, value_parser = parse_kind)]
        ignore: Vec<FailureKind>,
    },

    /// Print edge-case candidates for a JSON Schema
    Candidates {
        /// JSON Schema file
        schema: PathBuf,

        /// Only fields with no nested fields
        #[arg(long)]
        leaves: bool,
    },

    /// Initialize config file
    Init,

    /// Export JSON Schema for an output format
    Schema {
        #[arg(default_value = "report")]
        kind: SchemaKindArg,
    },
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Terminal,
    Json,
    Silent,
}

#[derive(Clone, Copy, ValueEnum)]
enum SchemaKindArg {
    Report,
    LogEntry,
    DryRunPlan,
}

impl From<SchemaKindArg> for OutputSchema {
    fn from(arg: SchemaKindArg) -> Self {
        match arg {
            SchemaKindArg::Report => Self::Report,
            SchemaKindArg::LogEntry => Self::LogEntry,
            SchemaKindArg::DryRunPlan => Self::DryRunPlan,
        }
    }
}

fn parse_kind(text: &str) -> Result<FailureKind, String> {
    FailureKind::from_name(text)
        .filter(|kind| kind.is_failure())
        .ok_or_else(|| {
            let names: Vec<&str> = FailureKind::FAILURES.iter().map(|k| k.as_str()).collect();
            format!("unknown failure kind '{text}' (expected one of: {})", names.join(", "))
        })
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.output);

    match run(cli) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(3)
        }
    }
}

/// Logs go to stderr so `--output json` stays parseable.
fn init_tracing(verbose: bool, output: OutputFormat) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else if output == OutputFormat::Silent {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli) -> Result<i32> {
    let policy = if cli.lenient {
        VerdictPolicy::lenient()
    } else {
        VerdictPolicy::default()
    };

    match cli.command {
        Commands::Scan {
            spec,
            config,
            base_url,
            headers,
            timeout,
            max_candidates,
            limit_endpoints,
            concurrency,
            ignore,
            log_file,
            report_file,
            no_mask,
            dry_run,
        } => {
            let mut cfg = match config {
                Some(path) => Config::load(&path)?,
                None => Config::load_default()?.unwrap_or_default(),
            };

            // Flags win over the config file
            if let Some(spec) = spec {
                cfg.spec = spec;
            }
            if base_url.is_some() {
                cfg.base_url = base_url;
            }
            for header in &headers {
                let (name, value) = parse_header(header)?;
                cfg.headers.insert(name, value);
            }
            if let Some(timeout) = timeout {
                cfg.timeout_secs = timeout;
            }
            if let Some(max) = max_candidates {
                cfg.max_candidates_per_field = max;
            }
            if limit_endpoints.is_some() {
                cfg.limit_endpoints = limit_endpoints;
            }
            if let Some(concurrency) = concurrency {
                cfg.concurrency = concurrency;
            }
            cfg.ignore.extend(ignore);
            if log_file.is_some() {
                cfg.log_file = log_file;
            }
            if report_file.is_some() {
                cfg.report_file = report_file;
            }
            if no_mask {
                cfg.mask_headers = false;
            }

            if !(cfg.timeout_secs.is_finite() && cfg.timeout_secs > 0.0) {
                bail!("timeout must be a positive number of seconds, got {}", cfg.timeout_secs);
            }
            let timeout = Duration::from_secs_f64(cfg.timeout_secs);

            let operations = load_operations(&cfg.spec, timeout)
                .with_context(|| format!("loading {}", cfg.spec))?;
            let scanner = Scanner::from_config(&cfg);

            if dry_run {
                let plan = scanner.plan(&operations, &cfg);
                match cli.output {
                    OutputFormat::Terminal => println!("{}", plan.to_terminal()),
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
                    OutputFormat::Silent => {}
                }
                return Ok(i32::from(plan.has_errors()));
            }

            let transport = ReqwestTransport::new(timeout)?;
            let output = scanner.run(&operations, &transport)?;

            if let Some(path) = &cfg.log_file {
                let written = write_log(&output.records, path, cfg.mask_headers)?;
                tracing::info!(entries = written, path = %path.display(), "wrote execution log");
            }

            let policy = policy.with_ignored(cfg.ignore.iter().copied());
            let report = policy.filter(output.report);

            if let Some(path) = &cfg.report_file {
                std::fs::write(path, report_text(&report) + "\n")
                    .with_context(|| format!("writing {}", path.display()))?;
                tracing::info!(path = %path.display(), "wrote report");
            }

            emit(&report, output.records.len(), &policy, cli.output)
        }

        Commands::Report { log, ignore } => {
            let records = load_log(&log)?;
            if records.is_empty() {
                bail!("{} contains no executions with a result", log.display());
            }
            let policy = policy.with_ignored(ignore);
            let report = policy.filter(ffte_core::aggregate(&records));
            emit(&report, records.len(), &policy, cli.output)
        }

        Commands::Candidates { schema, leaves } => {
            let content = std::fs::read_to_string(&schema)
                .with_context(|| format!("reading {}", schema.display()))?;
            let node: serde_json::Value = serde_json::from_str(&content)
                .with_context(|| format!("parsing {}", schema.display()))?;

            let mut fields = walk(&node);
            if leaves {
                fields = leaves_only(&fields);
            }

            match cli.output {
                OutputFormat::Terminal => {
                    for (path, set) in fields.iter() {
                        let values: Vec<String> = set.iter().map(ToString::to_string).collect();
                        println!("{path} ({}): {}", set.len(), values.join(", "));
                    }
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&fields)?),
                OutputFormat::Silent => {}
            }
            Ok(0)
        }

        Commands::Init => {
            let config_path = DEFAULT_FILES[0];
            if Path::new(config_path).exists() {
                eprintln!("{config_path} already exists");
                return Ok(1);
            }

            std::fs::write(config_path, Config::example())?;
            println!("Created {config_path}");
            println!("\nEdit the file to configure:");
            println!("  - spec: path or URL of your OpenAPI document");
            println!("  - base_url: server to probe");
            println!("  - headers: auth tokens, API keys");
            println!("  - path_params: entity IDs for testing");
            Ok(0)
        }

        Commands::Schema { kind } => {
            println!("{}", generate_schema(kind.into())?);
            Ok(0)
        }
    }
}

/// Print the report and verdict; returns the exit code.
fn emit(report: &Report, total: usize, policy: &VerdictPolicy, output: OutputFormat) -> Result<i32> {
    let verdict = policy.verdict(report, total);
    if total == 0 {
        eprintln!("Error: No requests were made. Check spec and base_url.");
        return Ok(3);
    }

    match output {
        OutputFormat::Terminal => {
            println!("{}\n", report_text(report));
            let icon = if verdict.status == VerdictStatus::Pass {
                "PASS"
            } else {
                "FAIL"
            };
            println!("{icon}: {}", verdict.reason);
            println!("  Requests: {total} total, {} failures", report.total());
            println!("  Exit code: {}", verdict.exit_code);
        }
        OutputFormat::Json => {
            let json_output = serde_json::json!({
                "verdict": {
                    "status": verdict.status.to_string(),
                    "exit_code": verdict.exit_code,
                    "reason": verdict.reason,
                },
                "stats": {
                    "total": total,
                    "failures": report.total(),
                },
                "failures": report,
            });
            println!("{}", serde_json::to_string_pretty(&json_output)?);
        }
        OutputFormat::Silent => {}
    }

    Ok(verdict.exit_code)
}

fn report_text(report: &Report) -> String {
    if report.is_empty() {
        "No failures detected.".to_string()
    } else {
        format_report(report)
    }
}

/// `Name: value` or `Name=value`
fn parse_header(text: &str) -> Result<(String, String)> {
    let Some((name, value)) = text.split_once(':').or_else(|| text.split_once('=')) else {
        bail!("invalid header '{text}' (expected 'Name: value')");
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("invalid header '{text}' (empty name)");
    }
    Ok((name.to_string(), value.trim().to_string()))
}
