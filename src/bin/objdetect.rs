use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use objdetect::config::parse_label_list;
use objdetect::{DetectError, DetectorConfig, Frame, ObjectDetector};

#[derive(Parser, Debug)]
#[command(name = "objdetect", about = "Run SSD object detection on an image")]
struct Args {
    /// Image to run detection on
    image: PathBuf,

    /// ONNX model path
    #[arg(long, env = "OBJDETECT_MODEL_PATH")]
    model: Option<PathBuf>,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Comma-separated allow-list of labels
    #[arg(long)]
    labels: Option<String>,

    /// Minimum confidence for reported labels
    #[arg(long)]
    min_score: Option<f32>,

    /// Write the annotated frame to this path
    #[arg(long)]
    draw: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn build_config(args: &Args) -> Result<DetectorConfig, DetectError> {
    let mut cfg = match (&args.config, &args.model) {
        (Some(path), _) => DetectorConfig::load(path)?,
        (None, Some(model)) => DetectorConfig::new(model),
        (None, None) => {
            return Err(DetectError::Configuration(
                "either --model or --config is required".to_string(),
            ));
        }
    };
    if let (Some(_), Some(model)) = (&args.config, &args.model) {
        cfg.model_path = model.clone();
    }
    if let Some(labels) = &args.labels {
        cfg = cfg.with_valid_labels(parse_label_list(labels));
    }
    if let Some(min_score) = args.min_score {
        cfg = cfg.with_min_score(min_score);
    }
    cfg.validate()?;
    Ok(cfg)
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = build_config(&args)?;
    let mut detector = ObjectDetector::from_config(&cfg)?;

    let image = image::open(&args.image)
        .map_err(|e| DetectError::InvalidInput(format!("{}: {e}", args.image.display())))?
        .to_rgb8();
    let mut frame = Frame::from_rgb_image(&image);
    log::info!("frame {}x{} from {}", frame.width(), frame.height(), args.image.display());

    let detections = detector.detect_frame(&mut frame, args.draw.is_some())?;
    println!("{}", serde_json::to_string_pretty(&detections)?);

    if let Some(out) = &args.draw {
        frame.to_rgb_image().save(out)?;
        log::info!("annotated frame written to {}", out.display());
    }
    Ok(())
}
