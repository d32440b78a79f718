//! Blinksense CLI - Command-line interface for the blink detection engine
//!
//! Commands:
//! - transform: Process recorded frame samples into frame updates (batch mode)
//! - run: Process streaming frame samples from stdin (streaming mode)
//! - validate: Validate frame sample input
//! - schema: Print schema information

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use blinksense::config::{EngineConfig, LandmarkTopology};
use blinksense::report::ReportEncoder;
use blinksense::session::BlinkSession;
use blinksense::types::{FrameSample, FrameUpdate};
use blinksense::{EngineError, ENGINE_VERSION};

/// Blinksense - On-device blink detection and eye-fatigue alert engine
#[derive(Parser)]
#[command(name = "blinksense")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Turn facial-landmark frames into blink events and fatigue alerts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transform recorded frame samples into frame updates (batch mode)
    Transform {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Engine configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the EAR closed-eye threshold
        #[arg(long)]
        ear_threshold: Option<f64>,

        /// Override the low-rate alert threshold (blinks per minute)
        #[arg(long)]
        low_rate_threshold: Option<u32>,

        /// Emit a session report instead of per-frame updates
        #[arg(long)]
        summary: bool,
    },

    /// Process streaming frame samples from stdin (streaming mode)
    Run {
        /// Engine configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the EAR closed-eye threshold
        #[arg(long)]
        ear_threshold: Option<f64>,

        /// Override the low-rate alert threshold (blinks per minute)
        #[arg(long)]
        low_rate_threshold: Option<u32>,

        /// Flush output after each record
        #[arg(long, default_value = "true")]
        flush: bool,

        /// Emit a session report on end of stream
        #[arg(long)]
        summary: bool,
    },

    /// Validate frame sample input
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one frame per line)
    Ndjson,
    /// JSON array of frames
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one update per line)
    Ndjson,
    /// JSON array of updates
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (frame samples)
    Input,
    /// Output schema (frame updates and session reports)
    Output,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), BlinkCliError> {
    match cli.command {
        Commands::Transform {
            input,
            output,
            input_format,
            output_format,
            config,
            ear_threshold,
            low_rate_threshold,
            summary,
        } => cmd_transform(
            &input,
            &output,
            input_format,
            output_format,
            config.as_deref(),
            ear_threshold,
            low_rate_threshold,
            summary,
        ),

        Commands::Run {
            config,
            ear_threshold,
            low_rate_threshold,
            flush,
            summary,
        } => cmd_run(
            config.as_deref(),
            ear_threshold,
            low_rate_threshold,
            flush,
            summary,
        ),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Schema { schema_type } => cmd_schema(schema_type),
    }
}

fn cmd_transform(
    input: &PathBuf,
    output: &PathBuf,
    input_format: InputFormat,
    output_format: OutputFormat,
    config: Option<&std::path::Path>,
    ear_threshold: Option<f64>,
    low_rate_threshold: Option<u32>,
    summary: bool,
) -> Result<(), BlinkCliError> {
    let input_data = read_input(input)?;
    let frames = parse_frames(&input_data, &input_format)?;

    if frames.is_empty() {
        return Err(BlinkCliError::NoFrames);
    }

    let engine_config = load_config(config, ear_threshold, low_rate_threshold)?;
    let mut session = BlinkSession::new(engine_config)?;

    let mut updates: Vec<FrameUpdate> = Vec::with_capacity(frames.len());
    for frame in &frames {
        updates.push(session.process_frame(frame));
    }

    let output_data = if summary {
        let as_of = frames.last().map(|f| f.timestamp_ms).unwrap_or(0);
        let report = ReportEncoder::new().encode_to_json(&session, as_of)?;
        report + "\n"
    } else {
        format_output(&updates, &output_format)?
    };

    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_run(
    config: Option<&std::path::Path>,
    ear_threshold: Option<f64>,
    low_rate_threshold: Option<u32>,
    flush: bool,
    summary: bool,
) -> Result<(), BlinkCliError> {
    let engine_config = load_config(config, ear_threshold, low_rate_threshold)?;
    let mut session = BlinkSession::new(engine_config)?;

    if atty::is(atty::Stream::Stdin) {
        eprintln!("blinksense run: reading frame samples from terminal; pipe NDJSON or press Ctrl-D to end");
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut last_timestamp = 0;

    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        let frame: FrameSample = serde_json::from_str(trimmed)
            .map_err(|e| BlinkCliError::ParseError(format!("Failed to parse frame: {}", e)))?;
        last_timestamp = frame.timestamp_ms;

        let update = session.process_frame(&frame);
        writeln!(stdout, "{}", serde_json::to_string(&update)?)?;
        if flush {
            stdout.flush()?;
        }
    }

    if summary {
        let report = ReportEncoder::new().encode_to_json(&session, last_timestamp)?;
        writeln!(stdout, "{}", report)?;
        stdout.flush()?;
    }

    Ok(())
}

fn cmd_validate(
    input: &PathBuf,
    input_format: InputFormat,
    json: bool,
) -> Result<(), BlinkCliError> {
    let input_data = read_input(input)?;
    let required = LandmarkTopology::default().required_landmarks();

    let lines: Vec<&str> = match input_format {
        InputFormat::Ndjson => input_data
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect(),
        InputFormat::Json => Vec::new(),
    };

    let mut report = ValidationReport {
        total_frames: 0,
        valid_frames: 0,
        invalid_frames: 0,
        errors: Vec::new(),
    };

    let mut check = |index: usize, frame: Result<FrameSample, String>, prev: &mut Option<u64>| {
        report.total_frames += 1;
        let frame = match frame {
            Ok(f) => f,
            Err(e) => {
                report.invalid_frames += 1;
                report.errors.push(ValidationErrorDetail { index, error: e });
                return;
            }
        };
        if let Some(p) = prev {
            if frame.timestamp_ms < *p {
                report.invalid_frames += 1;
                report.errors.push(ValidationErrorDetail {
                    index,
                    error: format!(
                        "timestamp {} goes backwards (previous {})",
                        frame.timestamp_ms, p
                    ),
                });
                return;
            }
        }
        *prev = Some(frame.timestamp_ms);
        if let Some(landmarks) = &frame.landmarks {
            if landmarks.len() < required {
                report.invalid_frames += 1;
                report.errors.push(ValidationErrorDetail {
                    index,
                    error: format!(
                        "only {} landmarks present, topology needs {}",
                        landmarks.len(),
                        required
                    ),
                });
                return;
            }
        }
        report.valid_frames += 1;
    };

    let mut prev: Option<u64> = None;
    match input_format {
        InputFormat::Ndjson => {
            for (index, line) in lines.iter().enumerate() {
                let parsed: Result<FrameSample, String> =
                    serde_json::from_str(line).map_err(|e| e.to_string());
                check(index, parsed, &mut prev);
            }
        }
        InputFormat::Json => {
            let frames: Vec<serde_json::Value> = serde_json::from_str(&input_data)?;
            for (index, value) in frames.into_iter().enumerate() {
                let parsed: Result<FrameSample, String> =
                    serde_json::from_value(value).map_err(|e| e.to_string());
                check(index, parsed, &mut prev);
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("  Total frames:   {}", report.total_frames);
        println!("  Valid frames:   {}", report.valid_frames);
        println!("  Invalid frames: {}", report.invalid_frames);
        for detail in &report.errors {
            println!("  [{}] {}", detail.index, detail.error);
        }
    }

    if report.invalid_frames > 0 {
        return Err(BlinkCliError::ValidationFailed(report.invalid_frames));
    }

    Ok(())
}

fn cmd_schema(schema_type: SchemaType) -> Result<(), BlinkCliError> {
    match schema_type {
        SchemaType::Input => {
            println!("Input Schema: frame samples");
            println!();
            println!("One frame sample per NDJSON line (or a JSON array with --input-format json):");
            println!();
            println!("- timestamp_ms: Milliseconds on the session's monotonic frame clock");
            println!("- landmarks: Array of normalized face-mesh points, or null when no face");
            println!("  - x, y: Normalized [0,1] frame coordinates");
            println!("  - z: Optional relative depth (ignored by the engine)");
            println!();
            println!("The default topology reads MediaPipe FaceMesh indices:");
            println!("  left eye  [33, 160, 158, 133, 153, 144]");
            println!("  right eye [362, 385, 387, 263, 373, 380]");
            println!();
            println!("Example:");
            let example = serde_json::json!({
                "timestamp_ms": 1000,
                "landmarks": [{ "x": 0.42, "y": 0.37, "z": -0.01 }]
            });
            println!("{}", serde_json::to_string_pretty(&example)?);
        }
        SchemaType::Output => {
            println!("Output Schema: frame updates and session reports");
            println!();
            println!("Each processed frame yields one update:");
            println!();
            println!("- timestamp_ms, paused, face_detected");
            println!("- ear: Averaged Eye Aspect Ratio (absent when not computable)");
            println!("- bounding_box: {{ x, y, width, height }} padded face box");
            println!("- zoom: {{ scale, translate_x_pct, translate_y_pct }}");
            println!("- blink: Present only on the frame that confirms a blink:");
            println!("  - event: {{ timestamp_ms }}");
            println!("  - total_blinks, rate_per_minute");
            println!("  - history: Trailing 10-minute rate buckets");
            println!("  - alert_raised: Low-rate fatigue alert, when newly raised");
            println!();
            println!("A session report (--summary) contains:");
            println!("- report_version: Schema version ({})", blinksense::report::REPORT_VERSION);
            println!("- producer: {{ name, version, instance_id }}");
            println!("- as_of_ms, computed_at_utc");
            println!("- totals: {{ total_blinks, rate_per_minute, last_blink_at_ms, alerts_raised, alert_asserted }}");
            println!("- history: Trailing rate buckets with display labels");
        }
    }

    Ok(())
}

// Helper functions

fn read_input(input: &PathBuf) -> Result<String, BlinkCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn parse_frames(data: &str, format: &InputFormat) -> Result<Vec<FrameSample>, BlinkCliError> {
    match format {
        InputFormat::Ndjson => {
            let mut frames = Vec::new();
            for line in data.lines() {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let frame: FrameSample = serde_json::from_str(trimmed).map_err(|e| {
                    BlinkCliError::ParseError(format!("Failed to parse frame: {}", e))
                })?;
                frames.push(frame);
            }
            Ok(frames)
        }
        InputFormat::Json => Ok(serde_json::from_str(data)?),
    }
}

fn format_output(updates: &[FrameUpdate], format: &OutputFormat) -> Result<String, BlinkCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for update in updates {
                lines.push(serde_json::to_string(update)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(updates)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(updates)?),
    }
}

fn load_config(
    path: Option<&std::path::Path>,
    ear_threshold: Option<f64>,
    low_rate_threshold: Option<u32>,
) -> Result<EngineConfig, BlinkCliError> {
    let mut config = match path {
        Some(p) => EngineConfig::from_json(&fs::read_to_string(p)?)?,
        None => EngineConfig::default(),
    };

    if let Some(threshold) = ear_threshold {
        config.ear_threshold = threshold;
    }
    if let Some(threshold) = low_rate_threshold {
        config.low_rate_alert_threshold = threshold;
    }

    config.validate()?;
    Ok(config)
}

// Error types

#[derive(Debug)]
enum BlinkCliError {
    Io(io::Error),
    Engine(EngineError),
    Json(serde_json::Error),
    NoFrames,
    ValidationFailed(usize),
    ParseError(String),
}

impl From<io::Error> for BlinkCliError {
    fn from(e: io::Error) -> Self {
        BlinkCliError::Io(e)
    }
}

impl From<EngineError> for BlinkCliError {
    fn from(e: EngineError) -> Self {
        BlinkCliError::Engine(e)
    }
}

impl From<serde_json::Error> for BlinkCliError {
    fn from(e: serde_json::Error) -> Self {
        BlinkCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<BlinkCliError> for CliError {
    fn from(e: BlinkCliError) -> Self {
        match e {
            BlinkCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            BlinkCliError::Engine(e) => CliError {
                code: "ENGINE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check the engine configuration values".to_string()),
            },
            BlinkCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            BlinkCliError::NoFrames => CliError {
                code: "NO_FRAMES".to_string(),
                message: "No frame samples found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            BlinkCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} frames failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            BlinkCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Check input format".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_frames: usize,
    valid_frames: usize,
    invalid_frames: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    error: String,
}
