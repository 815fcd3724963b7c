//! Insights CLI - Command-line interface for Session Insights
//!
//! Commands:
//! - summarize: Compute history, streak and weekly activity as JSON
//! - history: Print the grouped session history
//! - validate: Report records that would be left out of aggregation
//! - schema: Print the accepted session record shape

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{DateTime, Utc};
use session_insights::adapter::{ParsedSessions, SessionAdapter};
use session_insights::normalizer::sanitize_duration;
use session_insights::types::ExcludedRecord;
use session_insights::{
    InsightsConfig, InsightsError, InsightsProcessor, SessionNormalizer, INSIGHTS_VERSION,
    PRODUCER_NAME,
};
use tracing_subscriber::EnvFilter;

/// Insights - On-device session history, streak and weekly activity statistics
#[derive(Parser)]
#[command(name = "insights")]
#[command(author = "Synheart AI Inc")]
#[command(version = INSIGHTS_VERSION)]
#[command(about = "Aggregate wellness session history into profile statistics", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute history, streak and weekly activity as JSON
    Summarize {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,

        /// User timezone (IANA format, e.g., "America/New_York")
        #[arg(long, default_value = "UTC")]
        timezone: String,

        /// Reference instant (RFC 3339); defaults to the current time
        #[arg(long)]
        now: Option<String>,

        /// Height of the tallest weekly bar
        #[arg(long, default_value = "80")]
        bar_height: f64,
    },

    /// Print the grouped session history
    History {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// User timezone
        #[arg(long, default_value = "UTC")]
        timezone: String,

        /// Reference instant (RFC 3339); defaults to the current time
        #[arg(long)]
        now: Option<String>,
    },

    /// Report records that would be left out of aggregation
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Timezone used to resolve offset-less timestamps
        #[arg(long, default_value = "UTC")]
        timezone: String,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the accepted session record shape
    Schema {
        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// JSON array of sessions
    Json,
    /// Newline-delimited JSON (one session per line)
    Ndjson,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr so stdout stays machine-readable
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli) -> Result<(), InsightsCliError> {
    match cli.command {
        Commands::Summarize {
            input,
            output,
            input_format,
            output_format,
            timezone,
            now,
            bar_height,
        } => cmd_summarize(
            &input,
            &output,
            input_format,
            output_format,
            timezone,
            now.as_deref(),
            bar_height,
        ),

        Commands::History {
            input,
            input_format,
            timezone,
            now,
        } => cmd_history(&input, input_format, timezone, now.as_deref()),

        Commands::Validate {
            input,
            input_format,
            timezone,
            json,
        } => cmd_validate(&input, input_format, timezone, json),

        Commands::Schema { json_schema } => cmd_schema(json_schema),
    }
}

fn cmd_summarize(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    timezone: String,
    now: Option<&str>,
    bar_height: f64,
) -> Result<(), InsightsCliError> {
    let parsed = read_sessions(input, &input_format)?;
    let now = parse_now(now)?;

    let processor = InsightsProcessor::new(InsightsConfig {
        timezone,
        bar_max_height: bar_height,
        ..Default::default()
    })?;

    tracing::info!(
        records = parsed.records.len(),
        skipped = parsed.skipped.len(),
        timezone = processor.calendar().name(),
        now = %now,
        "Summarizing sessions"
    );

    let summary = processor.summarize(&parsed.records, now);

    let output_data = match output_format {
        OutputFormat::Json => serde_json::to_string(&summary)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&summary)?,
    };

    if output.to_string_lossy() == "-" {
        println!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_history(
    input: &Path,
    input_format: InputFormat,
    timezone: String,
    now: Option<&str>,
) -> Result<(), InsightsCliError> {
    let parsed = read_sessions(input, &input_format)?;
    let now = parse_now(now)?;
    let processor = InsightsProcessor::new(InsightsConfig::with_timezone(timezone))?;

    let sections = processor.group(&parsed.records, now);
    if sections.is_empty() {
        println!("No sessions yet");
        return Ok(());
    }

    for section in &sections {
        println!("{}", section.label.as_str());
        for record in &section.sessions {
            let minutes = sanitize_duration(record.duration_seconds) / 60.0;
            println!(
                "  {:<32} {:>6.1} min  {}",
                record.title.as_deref().unwrap_or("Session"),
                minutes,
                record.id
            );
        }
    }

    Ok(())
}

fn cmd_validate(
    input: &Path,
    input_format: InputFormat,
    timezone: String,
    json: bool,
) -> Result<(), InsightsCliError> {
    let parsed = read_sessions(input, &input_format)?;
    let processor = InsightsProcessor::new(InsightsConfig::with_timezone(timezone))?;
    let report = SessionNormalizer::new(*processor.calendar()).normalize(&parsed.records);

    let validation = ValidationReport {
        total_elements: parsed.records.len() + parsed.skipped.len(),
        valid_records: report.sessions.len(),
        skipped_elements: parsed
            .skipped
            .iter()
            .map(|s| SkippedDetail {
                position: s.position,
                error: s.error.clone(),
            })
            .collect(),
        excluded_records: report.excluded,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&validation)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total elements:    {}", validation.total_elements);
        println!("Valid records:     {}", validation.valid_records);
        println!("Skipped elements:  {}", validation.skipped_elements.len());
        println!("Excluded records:  {}", validation.excluded_records.len());

        if !validation.skipped_elements.is_empty() {
            println!("\nSkipped:");
            for skipped in &validation.skipped_elements {
                println!("  - Element {}: {}", skipped.position, skipped.error);
            }
        }

        if !validation.excluded_records.is_empty() {
            println!("\nExcluded:");
            for excluded in &validation.excluded_records {
                println!(
                    "  - Record {} (index {}): {}",
                    if excluded.id.is_empty() { "unknown" } else { excluded.id.as_str() },
                    excluded.index,
                    excluded.reason
                );
            }
        }
    }

    let invalid = validation.skipped_elements.len() + validation.excluded_records.len();
    if invalid > 0 {
        Err(InsightsCliError::ValidationFailed(invalid))
    } else {
        Ok(())
    }
}

fn cmd_schema(json_schema: bool) -> Result<(), InsightsCliError> {
    if json_schema {
        println!("{}", get_input_json_schema());
    } else {
        println!("Session record ({} {})", PRODUCER_NAME, INSIGHTS_VERSION);
        println!();
        println!("- id: string or number");
        println!("- createdAt (aliases: created_at, timestamp, date), one of:");
        println!("  - ISO-8601 text, e.g. \"2024-06-10T09:00:00Z\"");
        println!("    (text without an offset is read in --timezone)");
        println!("  - Unix epoch seconds, e.g. 1718010000");
        println!("  - {{\"seconds\": 1718010000, \"nanoseconds\": 0}} (or _seconds/_nanoseconds)");
        println!("- durationSeconds (aliases: duration_seconds, duration): optional, >= 0");
        println!("- title: optional");
        println!();
        println!("Give each field under one name only: an object carrying both createdAt");
        println!("and created_at (or both durationSeconds and duration) is skipped whole.");
        println!();
        println!("Records with an unreadable createdAt are left out of every statistic.");
    }

    Ok(())
}

// Helper functions

fn read_sessions(input: &Path, input_format: &InputFormat) -> Result<ParsedSessions, InsightsCliError> {
    let input_data = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let parsed = match input_format {
        InputFormat::Json => SessionAdapter::parse_array(&input_data)?,
        InputFormat::Ndjson => SessionAdapter::parse_ndjson(&input_data)?,
    };
    Ok(parsed)
}

fn parse_now(now: Option<&str>) -> Result<DateTime<Utc>, InsightsCliError> {
    match now {
        None => Ok(Utc::now()),
        Some(text) => DateTime::parse_from_rfc3339(text.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                InsightsCliError::Insights(InsightsError::InvalidTimestamp(format!("{}: {}", text, e)))
            }),
    }
}

fn get_input_json_schema() -> String {
    let timestamp = serde_json::json!({
        "oneOf": [
            { "type": "string", "format": "date-time" },
            { "type": "number", "description": "Unix epoch seconds" },
            {
                "type": "object",
                "properties": {
                    "seconds": { "type": "integer" },
                    "nanoseconds": { "type": "integer", "minimum": 0, "maximum": 999999999 }
                },
                "required": ["seconds"]
            }
        ]
    });

    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "session_record",
        "description": "Wellness session record consumed by session-insights",
        "type": "array",
        "items": {
            "type": "object",
            "properties": {
                "id": { "type": ["string", "number"] },
                "createdAt": timestamp,
                "durationSeconds": { "type": ["number", "null"], "minimum": 0 },
                "title": { "type": ["string", "null"] }
            }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum InsightsCliError {
    Io(io::Error),
    Insights(InsightsError),
    Json(serde_json::Error),
    ValidationFailed(usize),
}

impl From<io::Error> for InsightsCliError {
    fn from(e: io::Error) -> Self {
        InsightsCliError::Io(e)
    }
}

impl From<InsightsError> for InsightsCliError {
    fn from(e: InsightsError) -> Self {
        InsightsCliError::Insights(e)
    }
}

impl From<serde_json::Error> for InsightsCliError {
    fn from(e: serde_json::Error) -> Self {
        InsightsCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<InsightsCliError> for CliError {
    fn from(e: InsightsCliError) -> Self {
        match e {
            InsightsCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            InsightsCliError::Insights(e) => {
                let hint = match &e {
                    InsightsError::InvalidTimezone(_) => "Use an IANA zone such as Europe/Berlin",
                    InsightsError::InvalidTimestamp(_) => "Pass --now as RFC 3339, e.g. 2024-06-10T12:00:00Z",
                    InsightsError::InvalidConfig(_) => "Check numeric options",
                    _ => "Run 'insights schema' for the accepted input shape",
                };
                CliError {
                    code: "INSIGHTS_ERROR".to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            InsightsCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            InsightsCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records would be left out", count),
                hint: Some("Fix the reported timestamps and retry".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_elements: usize,
    valid_records: usize,
    skipped_elements: Vec<SkippedDetail>,
    excluded_records: Vec<ExcludedRecord>,
}

#[derive(serde::Serialize)]
struct SkippedDetail {
    position: usize,
    error: String,
}
