use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result};
use std::path::{Path, PathBuf};
use textdet::{DetectionConfig, Detector, PrecomputedModel, SegmentationModel};
use textdet_cli::{BatchConfig, CliError, OutputFormat};
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect text boxes in a single image
    Detect {
        /// Path to the input image
        #[arg(short, long)]
        image: PathBuf,
        /// Grayscale probability map to use instead of a model
        #[arg(short, long)]
        probability_map: Option<PathBuf>,
        /// ONNX segmentation model (requires the `onnx` feature)
        #[arg(short, long)]
        model: Option<PathBuf>,
        /// Longer canvas side limit (defaults to LIMIT_SIDE_LENGTH or 1280)
        #[arg(long)]
        side_length_limit: Option<u32>,
        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run every job of a TOML or JSON batch configuration
    Batch {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print a JSON schema
    Schema {
        /// Print the batch configuration schema instead of the result schema
        #[arg(long)]
        config: bool,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Detect {
            image,
            probability_map,
            model,
            side_length_limit,
            format,
            output,
        } => {
            let config = side_length_limit
                .map(DetectionConfig::new)
                .unwrap_or_else(DetectionConfig::from_env);
            let mut model = load_model(probability_map.as_deref(), model.as_deref())?;
            detect_one(&image, config, model.as_mut(), format, output.as_deref())?;
        }
        Commands::Batch { config } => {
            run_batch(&config)?;
        }
        Commands::Schema { config } => {
            let schema = if config {
                serde_json::to_string_pretty(&BatchConfig::schema())?
            } else {
                serde_json::to_string_pretty(&textdet::result_schema())?
            };
            println!("{schema}");
        }
    }

    Ok(())
}

fn load_model(
    probability_map: Option<&Path>,
    model: Option<&Path>,
) -> Result<Box<dyn SegmentationModel>> {
    if let Some(path) = probability_map {
        return Ok(Box::new(PrecomputedModel::open(path)?));
    }
    match model {
        Some(path) => load_onnx(path),
        None => Err(eyre!("Provide --probability-map or --model")),
    }
}

#[cfg(feature = "onnx")]
fn load_onnx(path: &Path) -> Result<Box<dyn SegmentationModel>> {
    Ok(Box::new(textdet::OnnxSegmentationModel::load(path)?))
}

#[cfg(not(feature = "onnx"))]
fn load_onnx(path: &Path) -> Result<Box<dyn SegmentationModel>> {
    Err(eyre!(
        "Cannot load {}: textdet was built without the `onnx` feature",
        path.display()
    ))
}

fn detect_one(
    image_path: &Path,
    config: DetectionConfig,
    model: &mut dyn SegmentationModel,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let detector = Detector::new(config)?;
    let image = textdet::preprocessing::Preprocessor::open(image_path)?;
    let result = detector.detect(&image, model)?;
    info!("Detected {} text boxes in {:?}", result.boxes.len(), image_path);

    match output {
        Some(path) => {
            format.write(&result, path)?;
            info!("Saved {} to {:?}", format, path);
        }
        None => println!("{}", format.render(&result)?),
    }
    Ok(())
}

fn run_batch(config_path: &Path) -> Result<()> {
    let batch = BatchConfig::from_file(config_path)?;
    info!("Batch with {} jobs", batch.jobs.len());

    std::fs::create_dir_all(&batch.output_dir)?;
    let detector = Detector::new(batch.detection)?;

    let mut shared_model = match batch.model.as_deref() {
        Some(path) => Some(load_onnx(Path::new(path))?),
        None => None,
    };

    for job in &batch.jobs {
        match (&job.probability_map, shared_model.as_mut()) {
            (Some(map), _) => {
                let mut model = PrecomputedModel::open(map)?;
                run_job(&detector, &batch, job, &mut model)?;
            }
            (None, Some(model)) => run_job(&detector, &batch, job, model.as_mut())?,
            (None, None) => warn!("Skipping: {}", CliError::MissingModel(job.name.clone())),
        }
    }

    info!("Batch completed");
    Ok(())
}

fn run_job(
    detector: &Detector,
    batch: &BatchConfig,
    job: &textdet_cli::ImageJob,
    model: &mut dyn SegmentationModel,
) -> Result<()> {
    let image = textdet::preprocessing::Preprocessor::open(&job.image)?;
    let result = detector.detect(&image, model)?;

    let output = batch.output_path(job);
    batch.format.write(&result, &output)?;
    info!("Job '{}': {} boxes -> {:?}", job.name, result.boxes.len(), output);
    Ok(())
}
