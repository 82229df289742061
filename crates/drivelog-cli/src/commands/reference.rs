//! Reference command - manage the reference data file.

use std::fs;
use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

use drivelog_core::models::reference::ReferenceData;

const SAMPLE_REFERENCE: &str = include_str!("../../assets/reference.sample.json");

/// Arguments for the reference command.
#[derive(Args)]
pub struct ReferenceArgs {
    #[command(subcommand)]
    command: ReferenceCommand,
}

#[derive(Subcommand)]
enum ReferenceCommand {
    /// Validate a reference file and summarize its contents
    Check {
        /// Reference file (default: the standard location)
        file: Option<PathBuf>,
    },

    /// Write a sample reference file
    Init(InitArgs),

    /// Show reference file path
    Path,
}

#[derive(Args)]
struct InitArgs {
    /// Output path for the reference file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite existing file
    #[arg(long)]
    force: bool,
}

pub async fn run(args: ReferenceArgs) -> anyhow::Result<()> {
    match args.command {
        ReferenceCommand::Check { file } => check_reference(file),
        ReferenceCommand::Init(init_args) => init_reference(init_args),
        ReferenceCommand::Path => show_path(),
    }
}

/// Standard location of the reference file.
pub fn default_reference_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("drivelog")
        .join("reference.json")
}

fn check_reference(file: Option<PathBuf>) -> anyhow::Result<()> {
    let path = file.unwrap_or_else(default_reference_path);

    if !path.exists() {
        anyhow::bail!("Reference file not found: {}", path.display());
    }

    let reference = ReferenceData::from_file(&path)?;

    println!("{} {} is valid", style("✓").green(), path.display());
    println!("  Names:                {}", reference.names().len());
    println!("  Vehicles:             {}", reference.vehicles().len());
    println!("  Locations:            {}", reference.locations().len());
    println!("  Name corrections:     {}", reference.name_corrections().len());
    println!("  Vehicle corrections:  {}", reference.vehicle_corrections().len());
    println!("  Location corrections: {}", reference.location_corrections().len());

    Ok(())
}

fn init_reference(args: InitArgs) -> anyhow::Result<()> {
    let output_path = args.output.unwrap_or_else(default_reference_path);

    if output_path.exists() && !args.force {
        anyhow::bail!(
            "Reference file already exists at {}. Use --force to overwrite.",
            output_path.display()
        );
    }

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(&output_path, SAMPLE_REFERENCE)?;

    println!(
        "{} Created reference file at {}",
        style("✓").green(),
        output_path.display()
    );

    Ok(())
}

fn show_path() -> anyhow::Result<()> {
    let reference_path = default_reference_path();

    println!("Reference file: {}", reference_path.display());

    if reference_path.exists() {
        println!("Status: {}", style("exists").green());
    } else {
        println!("Status: {}", style("not created").yellow());
        println!();
        println!("Run 'drivelog reference init' to create a reference file.");
    }

    Ok(())
}
