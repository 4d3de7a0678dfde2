use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use m3850_core::{
    CaptureSource, MeterStream, Reading, SerialPortSource, StreamError, StreamEvent, SyncConfig,
};

#[derive(Parser, Debug)]
#[command(name = "m3850")]
#[command(version)]
#[command(long_version = concat!(
    env!("CARGO_PKG_VERSION"),
    " (", env!("M3850_BUILD_COMMIT"), " ", env!("M3850_BUILD_DATE"), ")"
))]
#[command(
    about = "Serial reader and decoder for Metex/Voltcraft M-3850 multimeters.",
    long_about = None,
    after_help = "Examples:\n  m3850 ports\n  m3850 read /dev/ttyUSB0 --count 10\n  m3850 decode dump.bin --jsonl -o readings.jsonl"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Stream readings live from a meter on a serial port.
    #[command(
        after_help = "Switch the meter into COM mode first (press FUNCTION repeatedly).\nExamples:\n  m3850 read /dev/ttyUSB0\n  m3850 read /dev/ttyUSB0 --count 10 --jsonl"
    )]
    Read {
        /// Serial port device path (e.g. /dev/ttyUSB0)
        port: String,

        /// Stop after this many readings
        #[arg(short = 'n', long)]
        count: Option<u64>,

        /// Emit JSON lines instead of text
        #[arg(long)]
        jsonl: bool,

        /// Skip sending the "D" trigger (meter already streaming)
        #[arg(long)]
        no_trigger: bool,

        /// Give up synchronization after scanning this many bytes
        #[arg(long, default_value_t = 256)]
        max_sync_bytes: usize,

        /// Suppress the sync echo and per-record diagnostics
        #[arg(long)]
        quiet: bool,
    },
    /// Decode a raw byte dump captured from the meter.
    #[command(
        after_help = "Examples:\n  m3850 decode dump.bin\n  m3850 decode dump.bin --jsonl -o readings.jsonl"
    )]
    Decode {
        /// Path to a raw byte dump
        input: PathBuf,

        /// Output path (defaults to stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Emit JSON lines instead of text
        #[arg(long)]
        jsonl: bool,

        /// Suppress per-record diagnostics
        #[arg(long)]
        quiet: bool,
    },
    /// List serial ports visible to the OS.
    Ports,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Read {
            port,
            count,
            jsonl,
            no_trigger,
            max_sync_bytes,
            quiet,
        } => cmd_read(port, count, jsonl, no_trigger, max_sync_bytes, quiet),
        Commands::Decode {
            input,
            output,
            jsonl,
            quiet,
        } => cmd_decode(input, output, jsonl, quiet),
        Commands::Ports => cmd_ports(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(err.to_string(), None)
    }
}

fn cmd_read(
    port: String,
    count: Option<u64>,
    jsonl: bool,
    no_trigger: bool,
    max_sync_bytes: usize,
    quiet: bool,
) -> Result<(), CliError> {
    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst))
        .context("failed to install Ctrl-C handler")?;

    let source = SerialPortSource::open(&port)
        .with_context(|| format!("failed to open serial port {port}"))?;
    let sync = SyncConfig {
        max_scan_bytes: max_sync_bytes,
        ..SyncConfig::default()
    };
    let mut stream = MeterStream::with_config(source, sync);

    if !no_trigger {
        stream
            .trigger()
            .context("failed to send the trigger command")?;
    }

    // Echo the discarded startup bytes, so a confused port is visible.
    let sync_result = if quiet {
        stream.synchronize()
    } else {
        let result = stream.synchronize_with(|b| {
            eprint!("{}", char::from(b));
        });
        eprintln!();
        result
    };
    let discarded = sync_result.map_err(sync_error)?;
    if !quiet {
        eprintln!("synchronized after {discarded} bytes");
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut emitted = 0u64;

    // Stop flag is checked at the top of each turn; an in-flight blocking
    // read only ends when the port timeout elapses.
    while running.load(Ordering::SeqCst) {
        if count.is_some_and(|limit| emitted >= limit) {
            break;
        }
        match stream.next_event().context("read failed")? {
            Some(StreamEvent::Reading(reading)) => {
                if !quiet {
                    for issue in &reading.issues {
                        eprintln!("warning: {issue}");
                    }
                }
                let line = format_reading(&reading, jsonl)?;
                writeln!(out, "{line}").context("failed to write reading")?;
                emitted += 1;
            }
            Some(StreamEvent::ShortRead { expected, actual }) => {
                if !quiet {
                    eprintln!("warning: short read ({actual} of {expected} bytes)");
                }
            }
            // Nothing arrived before the port timeout; poll again.
            None => {}
        }
    }
    Ok(())
}

fn cmd_decode(
    input: PathBuf,
    output: Option<PathBuf>,
    jsonl: bool,
    quiet: bool,
) -> Result<(), CliError> {
    validate_input_file(&input)?;

    let source = CaptureSource::open(&input)
        .with_context(|| format!("failed to open dump: {}", input.display()))?;
    let mut stream = MeterStream::new(source);

    let discarded = stream.synchronize().map_err(sync_error)?;
    if !quiet {
        eprintln!("synchronized after {discarded} bytes");
    }

    let mut lines = Vec::new();
    loop {
        match stream.next_event().context("decode failed")? {
            Some(StreamEvent::Reading(reading)) => {
                if !quiet {
                    for issue in &reading.issues {
                        eprintln!("warning: {issue}");
                    }
                }
                lines.push(format_reading(&reading, jsonl)?);
            }
            Some(StreamEvent::ShortRead { expected, actual }) => {
                if !quiet {
                    eprintln!("warning: short read ({actual} of {expected} bytes)");
                }
            }
            None => break,
        }
    }

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).with_context(|| {
                        format!("failed to create output directory: {}", parent.display())
                    })?;
                }
            }
            let mut body = lines.join("\n");
            if !body.is_empty() {
                body.push('\n');
            }
            fs::write(&path, body)
                .with_context(|| format!("failed to write output: {}", path.display()))?;
            if !quiet {
                eprintln!("OK: {} readings written -> {}", lines.len(), path.display());
            }
        }
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            for line in &lines {
                writeln!(out, "{line}").context("failed to write reading")?;
            }
        }
    }
    Ok(())
}

fn cmd_ports() -> Result<(), CliError> {
    let ports = m3850_core::available_ports().context("failed to enumerate serial ports")?;
    if ports.is_empty() {
        eprintln!("no serial ports found");
        return Ok(());
    }
    for port in ports {
        println!("{port}");
    }
    Ok(())
}

fn format_reading(reading: &Reading, jsonl: bool) -> Result<String, CliError> {
    if jsonl {
        serde_json::to_string(reading)
            .context("JSON serialization failed")
            .map_err(Into::into)
    } else {
        Ok(format!(
            "{} {} {} {}",
            reading.captured_at,
            reading.measurement.mode,
            reading.measurement.value,
            reading.measurement.unit
        ))
    }
}

fn sync_error(err: StreamError) -> CliError {
    match err {
        StreamError::SyncTimeout { scanned } => CliError::new(
            format!("synchronization failed after scanning {scanned} bytes"),
            Some(
                "check the meter is in COM mode; Temperature mode never sends a terminator"
                    .to_string(),
            ),
        ),
        other => CliError::new(format!("synchronization failed: {other}"), None),
    }
}

fn validate_input_file(input: &PathBuf) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("pass a raw byte dump captured from the meter".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("pass a raw byte dump captured from the meter".to_string()),
        ));
    }
    Ok(())
}
