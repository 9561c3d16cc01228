//! TouchCare CLI - Command-line interface for TouchCare Core
//!
//! Commands:
//! - report: Aggregate records into a period report
//! - log: Browse records grouped by day
//! - trend: Classify a current count against a previous one
//! - validate: Validate raw record schema
//! - seed: Print the demo record set
//! - devices: Manage paired devices in a local store

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use touchcare_core::aggregate::{compute_trend, group_by_date, records_on};
use touchcare_core::calendar::parse_local_datetime;
use touchcare_core::device::{DeviceProvider, MockDeviceProvider};
use touchcare_core::schema::{RawTouchRecord, RecordAdapter, SCHEMA_VERSION};
use touchcare_core::seed::seed_records;
use touchcare_core::types::TrendSummary;
use touchcare_core::{
    AppState, CareConfig, CareError, FileStore, Locale, PeriodKind, RecordProcessor, TouchRecord,
    CORE_VERSION,
};

/// TouchCare - On-device record engine for the TouchCare touch-counting device
#[derive(Parser)]
#[command(name = "touchcare")]
#[command(author = "TouchCare Team")]
#[command(version = CORE_VERSION)]
#[command(about = "Aggregate TouchCare touch records into period reports", long_about = None)]
struct Cli {
    /// JSON config file (utc_offset_minutes, locale)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Calendar offset east of UTC in minutes (overrides config)
    #[arg(long, global = true, allow_hyphen_values = true)]
    utc_offset: Option<i32>,

    /// Label language: ko or en (overrides config)
    #[arg(long, global = true)]
    locale: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate records into a period report
    Report {
        #[command(flatten)]
        input: InputArgs,

        /// Reporting period
        #[arg(long, default_value = "week")]
        period: PeriodArg,

        /// Reference local time (e.g. "2026-02-20T21:00:00"); defaults to now
        #[arg(long)]
        now: Option<String>,

        /// Pretty-print the report
        #[arg(long)]
        pretty: bool,
    },

    /// Browse records grouped by day, newest first
    Log {
        #[command(flatten)]
        input: InputArgs,

        /// Only show records on this date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify a current count against a previous one
    Trend {
        /// Count for the current window
        current: usize,

        /// Count for the previous window
        previous: usize,
    },

    /// Validate raw record schema
    Validate {
        #[command(flatten)]
        input: InputArgs,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the demo record set as a JSON array
    Seed {
        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,
    },

    /// Manage paired devices
    Devices {
        /// Directory backing the device store
        #[arg(long, default_value = ".touchcare")]
        store_dir: PathBuf,

        #[command(subcommand)]
        action: DeviceAction,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Input file path (use - for stdin)
    #[arg(short, long, default_value = "-")]
    input: PathBuf,

    /// Input format
    #[arg(long, default_value = "json")]
    input_format: InputFormat,
}

#[derive(Subcommand)]
enum DeviceAction {
    /// List paired devices
    List,
    /// Show devices in range that are not paired yet
    Scan,
    /// Pair a device found by scan
    Add {
        /// Device ID from scan
        id: String,
    },
    /// Unpair a device
    Remove {
        /// Device ID
        id: String,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// JSON array of records
    Json,
    /// Newline-delimited JSON (one record per line)
    Ndjson,
}

#[derive(Clone, Copy, ValueEnum)]
enum PeriodArg {
    Week,
    Month,
}

impl From<PeriodArg> for PeriodKind {
    fn from(p: PeriodArg) -> Self {
        match p {
            PeriodArg::Week => PeriodKind::Week,
            PeriodArg::Month => PeriodKind::Month,
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", error_json(e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), TouchCareCliError> {
    let config = resolve_config(cli.config.as_deref(), cli.utc_offset, cli.locale.as_deref())?;
    log::debug!(
        "config: utc_offset_minutes={} locale={:?}",
        config.utc_offset_minutes,
        config.locale
    );

    match cli.command {
        Commands::Report {
            input,
            period,
            now,
            pretty,
        } => cmd_report(&config, &input, period.into(), now.as_deref(), pretty),

        Commands::Log { input, date, json } => cmd_log(&config, &input, date.as_deref(), json),

        Commands::Trend { current, previous } => cmd_trend(&config, current, previous),

        Commands::Validate { input, json } => cmd_validate(&config, &input, json),

        Commands::Seed { output } => cmd_seed(&config, &output),

        Commands::Devices { store_dir, action } => cmd_devices(&store_dir, action),
    }
}

/// File config, then flag overrides, validated once at the end
fn resolve_config(
    path: Option<&Path>,
    utc_offset: Option<i32>,
    locale: Option<&str>,
) -> Result<CareConfig, TouchCareCliError> {
    let mut config = match path {
        Some(path) => CareConfig::load(path)?,
        None => CareConfig::default(),
    };
    if let Some(minutes) = utc_offset {
        config = config.with_utc_offset(minutes);
    }
    if let Some(locale) = locale {
        config = config.with_locale(locale.parse::<Locale>()?);
    }
    config.validate()?;
    Ok(config)
}

fn read_input(input: &Path) -> Result<String, TouchCareCliError> {
    if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            log::warn!("reading records from an interactive terminal; end input with Ctrl-D");
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn parse_raw(args: &InputArgs) -> Result<Vec<RawTouchRecord>, TouchCareCliError> {
    let input_data = read_input(&args.input)?;
    let raw = match args.input_format {
        InputFormat::Json => RecordAdapter::parse_array(&input_data)?,
        InputFormat::Ndjson => RecordAdapter::parse_ndjson(&input_data)?,
    };
    Ok(raw)
}

fn load_processor(config: &CareConfig, args: &InputArgs) -> Result<RecordProcessor, TouchCareCliError> {
    let raw = parse_raw(args)?;
    let mut processor = RecordProcessor::with_config(config)?;
    let count = processor.load_raw(&raw)?;
    log::debug!("loaded {} records from {}", count, args.input.display());
    Ok(processor)
}

fn cmd_report(
    config: &CareConfig,
    input: &InputArgs,
    period: PeriodKind,
    now: Option<&str>,
    pretty: bool,
) -> Result<(), TouchCareCliError> {
    let processor = load_processor(config, input)?;

    let now = match now {
        Some(s) => parse_local_datetime(s)?,
        None => processor.calendar().now(),
    };
    let report = processor.report(period, now);

    if pretty {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", serde_json::to_string(&report)?);
    }
    Ok(())
}

fn cmd_log(
    config: &CareConfig,
    input: &InputArgs,
    date: Option<&str>,
    json: bool,
) -> Result<(), TouchCareCliError> {
    let processor = load_processor(config, input)?;

    if let Some(date) = date {
        let records = records_on(processor.records(), date);
        if json {
            println!("{}", serde_json::to_string_pretty(&records)?);
        } else {
            println!("{} ({} records)", date, records.len());
            for record in &records {
                print_record(record);
            }
        }
        return Ok(());
    }

    let days = group_by_date(processor.records());
    if json {
        println!("{}", serde_json::to_string_pretty(&days)?);
    } else {
        for day in &days {
            println!("{} ({} records)", day.date, day.records.len());
            for record in &day.records {
                print_record(record);
            }
        }
    }
    Ok(())
}

fn print_record(record: &TouchRecord) {
    println!("  - [{}] {}", record.id(), record.full_date_time());
}

fn cmd_trend(config: &CareConfig, current: usize, previous: usize) -> Result<(), TouchCareCliError> {
    let summary = TrendSummary {
        current,
        previous,
        classification: compute_trend(current, previous),
    };
    let output = serde_json::json!({
        "trend": summary,
        "label": summary.classification.label(config.locale),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn cmd_validate(config: &CareConfig, input: &InputArgs, json: bool) -> Result<(), TouchCareCliError> {
    let raw = parse_raw(input)?;
    let calendar = config.calendar()?;

    let results = RecordAdapter::validate_records(&raw, &calendar);

    let report = ValidationReport {
        schema_version: SCHEMA_VERSION.to_string(),
        total_records: raw.len(),
        valid_records: raw.len() - results.len(),
        invalid_records: results.len(),
        errors: results
            .iter()
            .map(|r| ValidationErrorDetail {
                index: r.index,
                record_id: r.record_id.clone(),
                error: r.error.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Schema:           {}", report.schema_version);
        println!("Total records:    {}", report.total_records);
        println!("Valid records:    {}", report.valid_records);
        println!("Invalid records:  {}", report.invalid_records);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - Record {} (index {}): {}", err.record_id, err.index, err.error);
            }
        }
    }

    if report.invalid_records > 0 {
        Err(TouchCareCliError::ValidationFailed(report.invalid_records))
    } else {
        Ok(())
    }
}

fn cmd_seed(config: &CareConfig, output: &Path) -> Result<(), TouchCareCliError> {
    let records = seed_records(&config.calendar()?)?;
    let output_data = serde_json::to_string_pretty(&records)?;

    if output.to_string_lossy() == "-" {
        println!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }
    Ok(())
}

fn cmd_devices(store_dir: &Path, action: DeviceAction) -> Result<(), TouchCareCliError> {
    let mut state = AppState::open(FileStore::open(store_dir)?)?;
    let mut provider = MockDeviceProvider::new();

    match action {
        DeviceAction::List => {
            println!("{}", serde_json::to_string_pretty(state.devices())?);
        }
        DeviceAction::Scan => {
            provider.activate_bluetooth()?;
            let found = state.discover_devices(&provider)?;
            println!("{}", serde_json::to_string_pretty(&found)?);
        }
        DeviceAction::Add { id } => {
            provider.activate_bluetooth()?;
            let device = provider
                .discover()?
                .into_iter()
                .find(|d| d.id == id)
                .ok_or_else(|| TouchCareCliError::UnknownDevice(id.clone()))?;
            let added = state.add_device(device)?;
            println!("{}", serde_json::to_string_pretty(added)?);
        }
        DeviceAction::Remove { id } => {
            if !state.remove_device(&id)? {
                return Err(TouchCareCliError::UnknownDevice(id));
            }
            println!("{}", serde_json::to_string_pretty(state.devices())?);
        }
    }
    Ok(())
}

// Error types

#[derive(Debug)]
enum TouchCareCliError {
    Io(io::Error),
    Core(CareError),
    Json(serde_json::Error),
    ValidationFailed(usize),
    UnknownDevice(String),
}

impl From<io::Error> for TouchCareCliError {
    fn from(e: io::Error) -> Self {
        TouchCareCliError::Io(e)
    }
}

impl From<CareError> for TouchCareCliError {
    fn from(e: CareError) -> Self {
        TouchCareCliError::Core(e)
    }
}

impl From<serde_json::Error> for TouchCareCliError {
    fn from(e: serde_json::Error) -> Self {
        TouchCareCliError::Json(e)
    }
}

/// Error payload written to stderr
fn error_json(e: TouchCareCliError) -> String {
    serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<TouchCareCliError> for CliError {
    fn from(e: TouchCareCliError) -> Self {
        match e {
            TouchCareCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            TouchCareCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            TouchCareCliError::Core(e) => core_error(e),
            TouchCareCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            TouchCareCliError::UnknownDevice(id) => CliError {
                code: "UNKNOWN_DEVICE".to_string(),
                message: format!("No device with id {}", id),
                hint: Some("Run 'touchcare devices scan' to see available devices".to_string()),
            },
        }
    }
}

fn core_error(e: CareError) -> CliError {
    let (code, hint) = match &e {
        CareError::InvalidRecord(_) => ("VALIDATION_ERROR", "Run 'touchcare validate' for details"),
        CareError::JsonError(_) | CareError::ParseError(_) => {
            ("PARSE_ERROR", "Ensure input matches the touchcare.record.v1 shape")
        }
        CareError::InvalidPeriod(_) => ("INVALID_PERIOD", "Use week or month"),
        CareError::InvalidTimestamp(_) => ("INVALID_TIMESTAMP", "Check record timestamps"),
        CareError::InvalidConfig(_) => ("INVALID_CONFIG", "Check --config, --utc-offset and --locale"),
        CareError::StorageError(_) | CareError::Io(_) => {
            ("STORAGE_ERROR", "Check the --store-dir path and permissions")
        }
        CareError::DeviceError(_) => ("DEVICE_ERROR", "Check that bluetooth is available"),
        CareError::AuthError(_) => ("AUTH_ERROR", "Check the login credentials"),
    };
    CliError {
        code: code.to_string(),
        message: e.to_string(),
        hint: Some(hint.to_string()),
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    schema_version: String,
    total_records: usize,
    valid_records: usize,
    invalid_records: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    record_id: String,
    error: String,
}
