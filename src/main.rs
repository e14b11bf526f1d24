use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use id_document_verifier::adapters::{
    ExclusiveRegionDetector, TesseractTextExtractor, YoloRegionDetector,
};
use id_document_verifier::core::interfaces::adapters::RegionDetector;
use id_document_verifier::global_constants::{ACCEPTED_IMAGE_EXTENSIONS, LOG_TAG_MAIN};
use id_document_verifier::{PipelineSettings, Verdict, VerificationOrchestrator, VerificationReport};

/// Verifies the identity number printed on a scanned ID card
#[derive(Parser, Debug)]
#[command(name = "id-document-verifier")]
#[command(about = "Detects, reads and checksum-validates the number on an ID card image")]
struct Args {
    /// Card image (jpg, jpeg or png)
    image: PathBuf,

    /// Settings file to use instead of the per-user one
    #[arg(long)]
    config: Option<PathBuf>,

    /// Detection model, overriding the configured path
    #[arg(long)]
    model: Option<PathBuf>,

    /// Abort the run after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

fn has_accepted_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| {
            ACCEPTED_IMAGE_EXTENSIONS
                .iter()
                .any(|accepted| extension.eq_ignore_ascii_case(accepted))
        })
        .unwrap_or(false)
}

fn exit_code_for(verdict: &Verdict) -> u8 {
    match verdict {
        Verdict::Valid(_) => 0,
        Verdict::Invalid(_) | Verdict::NotDetected => 1,
        Verdict::Error(_) => 2,
    }
}

fn load_settings(args: &Args) -> Result<PipelineSettings> {
    let mut settings = match &args.config {
        Some(config_path) => PipelineSettings::load_from(config_path)?,
        None => PipelineSettings::load().unwrap_or_else(|error| {
            log::warn!(
                "{} Failed to load settings, using defaults: {:#}",
                LOG_TAG_MAIN,
                error
            );
            PipelineSettings::default()
        }),
    };

    if let Some(model_path) = &args.model {
        settings.detection_model_path = model_path.clone();
    }
    if let Some(timeout_secs) = args.timeout_secs {
        settings.timeout_seconds = Some(timeout_secs);
    }

    settings.validate()?;
    Ok(settings)
}

fn build_orchestrator(settings: &PipelineSettings) -> Result<VerificationOrchestrator> {
    let yolo_detector: Arc<dyn RegionDetector> = Arc::new(
        YoloRegionDetector::build(settings).context("Failed to initialize region detector")?,
    );
    let region_detector: Arc<dyn RegionDetector> = if settings.serialize_detector {
        Arc::new(ExclusiveRegionDetector::wrap(yolo_detector))
    } else {
        yolo_detector
    };

    let text_extractor = Arc::new(
        TesseractTextExtractor::build(&settings.ocr_language)
            .context("Failed to initialize text extractor")?,
    );

    Ok(VerificationOrchestrator::build(
        region_detector,
        text_extractor,
        settings,
    ))
}

async fn run(args: &Args) -> Result<VerificationReport> {
    if !has_accepted_extension(&args.image) {
        anyhow::bail!(
            "Unsupported file type {:?}, expected one of {:?}",
            args.image,
            ACCEPTED_IMAGE_EXTENSIONS
        );
    }

    let settings = load_settings(args)?;
    let orchestrator = build_orchestrator(&settings)?;
    Ok(orchestrator.verify_path(&args.image).await)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();
    log::info!("{} Verifying {:?}", LOG_TAG_MAIN, args.image);

    let report = match run(&args).await {
        Ok(report) => report,
        Err(error) => {
            log::error!("{} {:#}", LOG_TAG_MAIN, error);
            eprintln!("{:#}", error);
            return ExitCode::from(2);
        }
    };

    match serde_json::to_string_pretty(&report) {
        Ok(rendered) => println!("{}", rendered),
        Err(error) => {
            log::error!("{} Failed to render report: {}", LOG_TAG_MAIN, error);
            return ExitCode::from(2);
        }
    }

    log::info!("{} {}", LOG_TAG_MAIN, report.verdict.public_message());
    ExitCode::from(exit_code_for(&report.verdict))
}

#[cfg(test)]
mod tests {
    use super::*;
    use id_document_verifier::FailureReason;

    #[test]
    fn test_has_accepted_extension_allows_only_raster_formats() {
        assert!(has_accepted_extension(Path::new("card.jpg")));
        assert!(has_accepted_extension(Path::new("card.JPEG")));
        assert!(has_accepted_extension(Path::new("/tmp/scan.png")));
        assert!(!has_accepted_extension(Path::new("card.pdf")));
        assert!(!has_accepted_extension(Path::new("card")));
    }

    #[test]
    fn test_exit_code_for_each_verdict() {
        assert_eq!(exit_code_for(&Verdict::Valid("2363".to_string())), 0);
        assert_eq!(exit_code_for(&Verdict::Invalid("2364".to_string())), 1);
        assert_eq!(exit_code_for(&Verdict::NotDetected), 1);
        assert_eq!(exit_code_for(&Verdict::Error(FailureReason::Timeout)), 2);
    }

    #[test]
    fn test_args_parse_overrides() {
        let args = Args::parse_from([
            "id-document-verifier",
            "card.png",
            "--model",
            "/models/card.rten",
            "--timeout-secs",
            "5",
        ]);

        assert_eq!(args.image, PathBuf::from("card.png"));
        assert_eq!(args.model, Some(PathBuf::from("/models/card.rten")));
        assert_eq!(args.timeout_secs, Some(5));
        assert!(args.config.is_none());
    }

    #[test]
    fn test_load_settings_applies_cli_overrides() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let args = Args::parse_from([
            "id-document-verifier",
            "card.png",
            "--config",
            temp_dir.path().join("settings.json").to_str().unwrap(),
            "--model",
            "/models/card.rten",
            "--timeout-secs",
            "9",
        ]);

        let settings = load_settings(&args).unwrap();

        assert_eq!(settings.detection_model_path, PathBuf::from("/models/card.rten"));
        assert_eq!(settings.timeout_seconds, Some(9));
    }
}
