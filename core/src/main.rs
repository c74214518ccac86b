use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use log::{error, info, warn};
use serde_json::Value;

use dicom2fhir_core::{
    collect_dicom_files, fhir, read_instance, ConverterConfig, Dicom2FhirError, StudyAggregator,
    Terminology,
};

/// CLI tool for converting a directory of DICOM files into FHIR resources
#[derive(Parser, Debug)]
#[command(name = "dicom2fhir")]
#[command(about = "Convert a DICOM study directory into FHIR ImagingStudy resources")]
#[command(version)]
struct Cli {
    /// Directory containing the DICOM files of one study
    #[arg(value_name = "DIRECTORY")]
    directory: PathBuf,

    /// Output directory for the generated JSON files
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Skip per-instance detail in the series output
    #[arg(long)]
    no_instances: bool,

    /// Write the ImagingStudy alone instead of a transaction bundle
    #[arg(long)]
    no_bundle: bool,

    /// Write one Device resource per distinct acquisition device
    #[arg(short, long)]
    devices: bool,

    /// Timezone offset attached to reconciled timestamps
    #[arg(long, value_name = "+HH:MM")]
    timezone_offset: Option<chrono::FixedOffset>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    if !cli.directory.is_dir() {
        eprintln!("Error: {} is not a directory", cli.directory.display());
        process::exit(1);
    }

    if let Err(e) = run(&cli) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> dicom2fhir_core::Result<()> {
    let mut config = ConverterConfig::default();
    if let Some(offset) = cli.timezone_offset {
        config.timezone_offset = offset;
    }
    let terminology = Terminology::load()?;

    info!("Processing directory: {}", cli.directory.display());
    let dicom_files = collect_dicom_files(&cli.directory)?;
    if dicom_files.is_empty() {
        return Err(Dicom2FhirError::EmptyStudy);
    }
    info!("Found {} DICOM files", dicom_files.len());

    let mut aggregator = StudyAggregator::new(&terminology, &config);
    for file_path in &dicom_files {
        let record = match read_instance(file_path) {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping {}: {}", file_path.display(), e);
                continue;
            }
        };
        if let Err(e) = aggregator.add_record(&record) {
            if e.is_fatal() {
                return Err(e);
            }
            warn!("Skipping {}: {}", file_path.display(), e);
        }
    }

    let mut output = aggregator.finish()?;
    output.study.endpoint = Some(format!("file://{}", cli.directory.display()));
    info!(
        "Aggregated {} series / {} instances",
        output.study.number_of_series(),
        output.study.number_of_instances()
    );

    let study_id = fhir::artifact_name(&output.study)?;
    let imaging_study = fhir::imaging_study_resource(&output.study, &config, !cli.no_instances);

    fs::create_dir_all(&cli.output)?;

    if cli.no_bundle {
        let path = cli.output.join(format!("{}_imagingStudy.json", study_id));
        write_json(&path, &imaging_study)?;
    } else {
        let bundle = fhir::transaction_bundle(&study_id, vec![imaging_study]);
        let path = cli.output.join(format!("{}_bundle.json", study_id));
        write_json(&path, &bundle)?;
    }

    if cli.devices {
        for device in &output.devices {
            let resource = fhir::device_resource(device, &config);
            let path = cli.output.join(format!("Device_{}.json", device.id));
            write_json(&path, &resource)?;
        }
        info!("Wrote {} device resources", output.devices.len());
    }

    Ok(())
}

fn write_json(path: &PathBuf, value: &Value) -> dicom2fhir_core::Result<()> {
    let pretty = serde_json::to_string_pretty(value)
        .map_err(|e| Dicom2FhirError::InvalidValue(e.to_string()))?;
    fs::write(path, pretty)?;
    info!("Wrote {}", path.display());
    Ok(())
}

fn setup_logging(verbose: bool) {
    if verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }
}
