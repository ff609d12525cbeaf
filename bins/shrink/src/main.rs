//! shrink: compress an image under a size and dimension cap.

use anyhow::Result;
use clap::{Parser, Subcommand};
use shrink_cli::output::{format_dimensions, format_ratio, format_size, Status};
use shrink_cli::progress;
use shrink_core::config::Config;
use shrink_core::error::exit_codes;
use shrink_core::{CompressionOptions, CompressionRate, ImageCompressor, Session, SourceImage};
use shrink_image::detect_format;
use shrink_telemetry::{TelemetryConfig, Timer};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "shrink")]
#[command(about = "Compress images under a size and dimension cap")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file
    #[arg(long, global = true, env = "SHRINK_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress an image and save it as compressed_<name>
    Compress {
        /// Image to compress
        path: PathBuf,
        /// Compression rate in percent; higher means smaller and lower quality
        #[arg(short, long, default_value_t = CompressionRate::DEFAULT,
              value_parser = clap::value_parser!(u8).range(10..=100))]
        rate: u8,
        /// Output directory (defaults to the configured one)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the compressor options a rate maps to
    Options {
        /// Compression rate in percent
        #[arg(short, long, default_value_t = CompressionRate::DEFAULT,
              value_parser = clap::value_parser!(u8).range(10..=100))]
        rate: u8,
    },
    /// Detect image format from file
    Detect {
        /// Path to image file
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            Status::error(&e.to_string());
            std::process::exit(exit_codes::CONFIG_ERROR);
        }
    };

    let logging = &config.schema.logging;
    shrink_telemetry::init_with_config(TelemetryConfig {
        log_level: if cli.verbose { "debug".to_string() } else { logging.level.clone() },
        json: logging.json,
        show_target: cli.verbose,
    })?;

    match &config.path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "Configuration loaded");
            if cli.verbose {
                Status::info(&format!("Using config {}", path.display()));
            }
        }
        None => tracing::debug!("No configuration file, using defaults"),
    }

    let code = match cli.command {
        Commands::Compress { path, rate, out, json } => {
            let out = out.unwrap_or_else(|| config.schema.output.directory.clone());
            compress(path, CompressionRate::new(rate)?, out, json).await?
        }

        Commands::Options { rate } => {
            let options = CompressionOptions::for_rate(CompressionRate::new(rate)?);
            println!("{}", serde_json::to_string_pretty(&options)?);
            exit_codes::SUCCESS
        }

        Commands::Detect { path } => {
            let data = std::fs::read(&path)?;
            match detect_format(&data) {
                Ok(format) => {
                    println!("Format: {:?}", format);
                    println!("MIME: {}", format.mime_type());
                    exit_codes::SUCCESS
                }
                Err(e) => {
                    Status::error(&e.to_string());
                    exit_codes::FAILURE
                }
            }
        }
    };

    std::process::exit(code);
}

async fn compress(path: PathBuf, rate: CompressionRate, out: PathBuf, json: bool) -> Result<i32> {
    let source = match SourceImage::from_path(&path) {
        Ok(source) => source,
        Err(e) => {
            report_error(json, &serde_json::to_value(e.to_report())?, &e.to_string());
            return Ok(exit_codes::VALIDATION_ERROR);
        }
    };
    let name = source.name().to_string();

    let mut session = Session::new(ImageCompressor);
    session.select_file(source);
    session.set_rate(rate);

    let spinner = (!json).then(|| progress::spinner(&format!("Compressing {} at {}", name, rate)));
    let timer = Timer::start("compress");
    let outcome = session.compress().await;
    let elapsed = timer.stop();

    let result = match outcome {
        Some(Ok(result)) => result,
        Some(Err(failure)) => {
            if let Some(pb) = &spinner {
                progress::finish_error(pb, "Compression failed");
            }
            report_error(json, &serde_json::to_value(&failure)?, &failure.to_string());
            return Ok(exit_codes::FAILURE);
        }
        None => anyhow::bail!("No file selected"),
    };
    if let Some(pb) = &spinner {
        progress::finish_success(pb, &format!("Compressed {}", name));
    }

    let saved = match session.download(&out) {
        Ok(saved) => saved,
        Err(e) => {
            report_error(json, &serde_json::to_value(e.to_report())?, &e.to_string());
            return Ok(exit_codes::FAILURE);
        }
    };

    let image = &result.image;
    let preview = session.preview().map(|handle| handle.url());
    let saved_display = saved.as_ref().map(|p| p.display().to_string());

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "source": name,
                "rate": rate.percent(),
                "initial_quality": rate.initial_quality(),
                "original_bytes": result.source_len,
                "compressed_bytes": image.len(),
                "width": image.width,
                "height": image.height,
                "mime": image.mime_type(),
                "preview": preview,
                "saved": saved_display,
                "elapsed_ms": elapsed.as_millis() as u64,
            }))?
        );
    } else {
        Status::header(&name);
        Status::field("Rate", &format!("{} (quality {:.2})", rate, rate.initial_quality()));
        Status::field("Original", &format_size(result.source_len as u64));
        Status::field(
            "Compressed",
            &format!(
                "{} ({})",
                format_size(image.len() as u64),
                format_ratio(result.source_len as u64, image.len() as u64)
            ),
        );
        Status::field("Dimensions", &format_dimensions(image.width, image.height));
        Status::field("Type", image.mime_type());
        if let Some(url) = &preview {
            Status::field("Preview", url);
        }
        Status::field("Time", &format!("{} ms", elapsed.as_millis()));
        if image.len() >= result.source_len {
            Status::warning("Could not make the image smaller; kept the original encoding");
        }
        if let Some(path) = &saved_display {
            Status::success(&format!("Saved {}", path));
        }
    }

    Ok(exit_codes::SUCCESS)
}

fn report_error(json: bool, report: &serde_json::Value, message: &str) {
    if json {
        println!("{}", serde_json::json!({ "error": report }));
    } else {
        Status::error(message);
    }
    tracing::debug!(error = %report, "Command failed");
}
