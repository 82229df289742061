//! Process command - extract shift records or visits from an OCR text file.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info, warn};

use drivelog_core::models::config::DriveLogConfig;
use drivelog_core::models::log::{DocumentResult, LocationVisit};
use drivelog_core::models::reference::ReferenceData;
use drivelog_core::DriverLogExtractor;

use super::reference::default_reference_path;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file holding OCR text
    #[arg(required = true)]
    input: PathBuf,

    /// Document identifier (default: input file name)
    #[arg(long)]
    document_id: Option<String>,

    /// OCR confidence reported for the source image (0.0 - 1.0)
    #[arg(long)]
    ocr_confidence: Option<f32>,

    /// Reference data file (names, vehicles, locations, corrections)
    #[arg(short, long)]
    reference: Option<PathBuf>,

    /// Extract location visits instead of shift records
    #[arg(long)]
    visits: bool,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Minimum record confidence (overrides config)
    #[arg(long)]
    min_confidence: Option<f32>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = if let Some(path) = config_path {
        DriveLogConfig::from_file(Path::new(path))?
    } else {
        DriveLogConfig::default()
    };

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());
    let text = tokio::fs::read_to_string(&args.input).await?;

    let reference = load_reference(args.reference.as_deref(), &config).await?;

    let mut extractor = DriverLogExtractor::new(Arc::new(reference)).with_config(config.extraction);
    if let Some(minimum) = args.min_confidence {
        extractor = extractor.with_min_confidence(minimum);
    }

    let document_id = args.document_id.clone().unwrap_or_else(|| {
        args.input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| args.input.display().to_string())
    });

    let output = if args.visits {
        let visits = extractor.extract_visits(&text, &document_id);
        match args.format {
            OutputFormat::Json => serde_json::to_string_pretty(&visits)?,
            OutputFormat::Text => format_visits(&document_id, &visits),
        }
    } else {
        let result = extractor.extract_document(&text, &document_id, args.ocr_confidence);
        match args.format {
            OutputFormat::Json => serde_json::to_string_pretty(&result)?,
            OutputFormat::Text => format_document(&result),
        }
    };

    if let Some(output_path) = &args.output {
        tokio::fs::write(output_path, &output).await?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Reference data from `--reference`, the config, or the default location.
async fn load_reference(explicit: Option<&Path>, config: &DriveLogConfig) -> anyhow::Result<ReferenceData> {
    let path = match explicit.or(config.reference_file.as_deref()) {
        Some(path) => path.to_path_buf(),
        None => {
            let default = default_reference_path();
            if !tokio::fs::try_exists(&default).await.unwrap_or(false) {
                warn!("No reference file found, matching against an empty reference set");
                return Ok(ReferenceData::default());
            }
            default
        }
    };

    if !path.exists() {
        anyhow::bail!("Reference file not found: {}", path.display());
    }

    Ok(ReferenceData::from_file(&path)?)
}

fn format_document(result: &DocumentResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("Document: {}\n", result.document_id));
    output.push_str(&format!("Extracted: {}\n", result.extraction_date));
    if let Some(confidence) = result.ocr_confidence {
        output.push_str(&format!("OCR confidence: {:.1}%\n", confidence * 100.0));
    }
    output.push('\n');

    for (i, entry) in result.entries.iter().enumerate() {
        output.push_str(&format!(
            "Entry {} ({:.0}%):\n",
            i + 1,
            entry.confidence * 100.0
        ));
        output.push_str(&format!("  Driver:   {}\n", entry.driver_name));
        output.push_str(&format!("  Date:     {}\n", entry.log_date));
        if let Some(vehicle) = &entry.vehicle_id {
            output.push_str(&format!("  Vehicle:  {}\n", vehicle));
        }
        if let Some(labor) = &entry.labor_name {
            output.push_str(&format!("  Labor:    {}\n", labor));
        }
        match (entry.start_time, entry.end_time) {
            (Some(start), Some(end)) => {
                output.push_str(&format!("  Time:     {} - {}\n", start.format("%H:%M"), end.format("%H:%M")))
            }
            (Some(start), None) => output.push_str(&format!("  Time:     {}\n", start.format("%H:%M"))),
            _ => {}
        }
        if let Some(from) = &entry.start_location {
            let to = entry.end_location.as_deref().unwrap_or("-");
            output.push_str(&format!("  Route:    {} -> {}\n", from, to));
        }
        if let Some(distance) = entry.distance {
            output.push_str(&format!("  Distance: {}\n", distance));
        }
        if let Some(fuel) = entry.fuel_used {
            output.push_str(&format!("  Fuel:     {}\n", fuel));
        }
        if let Some(notes) = &entry.notes {
            output.push_str(&format!("  Notes:    {}\n", notes));
        }
        output.push('\n');
    }

    output.push_str("Processing notes:\n");
    for note in &result.processing_notes {
        output.push_str(&format!("  - {}\n", note));
    }

    output
}

fn format_visits(document_id: &str, visits: &[LocationVisit]) -> String {
    let mut output = format!("Document: {}\n", document_id);

    let Some(first) = visits.first() else {
        output.push_str("No location visits found\n");
        return output;
    };

    output.push_str(&format!("Driver: {}\n", first.driver_name));
    output.push_str(&format!("Date: {}\n\n", first.visit_date));

    for visit in visits {
        let time = |t: Option<chrono::NaiveTime>| {
            t.map_or_else(|| "--:--".to_string(), |t| t.format("%H:%M").to_string())
        };
        output.push_str(&format!(
            "{:>3}. {} - {}  {} [{}]\n",
            visit.visit_sequence,
            time(visit.arrival_time),
            time(visit.departure_time),
            visit.location,
            visit.location_category
        ));
    }

    output
}
