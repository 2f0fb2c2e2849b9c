use clap::Parser;
use rgenimg::{
    logger::{self, LogLevel, LoggerConfig},
    AppConfig, AspectRatio, GeminiClient, GenImageError, GenerationClient, GenerationOptions,
    ImageModel, OutputFormat, PersistOptions, PersistOutcome, PersistenceSelector, Session, Slot,
    DEFAULT_THUMBNAIL_SIZE,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "rgenimg", version, about = "Transform your images with Gemini image models")]
struct Args {
    /// What you want to create.
    #[arg(short, long)]
    prompt: String,

    /// Input image (PNG or JPEG). The first is required; up to four in total.
    #[arg(short, long = "image", required = true)]
    images: Vec<PathBuf>,

    /// pro (gemini-3-pro-image-preview) or flash (gemini-2.5-flash-image-preview).
    #[arg(short, long, default_value = "pro")]
    model: ImageModel,

    /// Only used by models that accept an aspect-ratio hint.
    #[arg(long, default_value = "1:1")]
    aspect_ratio: AspectRatio,

    #[arg(long, default_value = "png")]
    format: OutputFormat,

    /// Save under a YYYY-MM-DD folder.
    #[arg(long)]
    date_folder: bool,

    #[arg(long, default_value_t = DEFAULT_THUMBNAIL_SIZE, value_parser = clap::value_parser!(u32).range(100..=600))]
    thumb_size: u32,

    /// Write input and output thumbnails here.
    #[arg(long)]
    preview_dir: Option<PathBuf>,

    /// Where to put the generated image for download. Defaults to the current
    /// directory when nothing is stored persistently.
    #[arg(long)]
    download_to: Option<PathBuf>,

    #[arg(long, default_value = "info")]
    log_level: LogLevel,

    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    let args = Args::parse();

    let logger_config = LoggerConfig::new()
        .with_level(args.log_level)
        .with_json_output(args.json_logs);
    if let Err(e) = logger::init_with_config(logger_config) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }
    logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    if dotenv_loaded {
        log::info!("✅ .env file loaded");
    } else {
        log::debug!("No .env file found, using system environment variables");
    }

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("🚨 {}", e);
            ExitCode::FAILURE
        }
    }
}

/// `Err` only for fatal startup problems; everything else is reported and
/// turned into `Ok(false)`.
async fn run(args: Args) -> Result<bool, GenImageError> {
    let config = AppConfig::from_env()?;
    let gemini = GeminiClient::new(&config.gemini)?;

    let backend = Arc::new(PersistenceSelector::new().select(&config.storage).await);
    logger::log_storage_info(&backend);

    let mut session = Session::new(GenerationClient::new(Arc::new(gemini)), backend.clone());

    if args.images.len() > usize::from(rgenimg::models::MAX_SLOTS) {
        log::error!("⚠️  At most 4 images are allowed, got {}", args.images.len());
        return Ok(false);
    }
    for (index, path) in args.images.iter().enumerate() {
        let slot = Slot::new(index as u8 + 1)?;
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                log::error!("❌ Cannot read {}: {}", path.display(), e);
                continue;
            }
        };
        match session.intake.upload(slot, &bytes) {
            Ok(asset) => {
                let (width, height) = asset.dimensions();
                log::info!("✓ {} ready: {} ({}x{})", slot, path.display(), width, height);
            }
            Err(e) => log::error!("❌ {}: {}", path.display(), e),
        }
    }

    if let Some(dir) = &args.preview_dir {
        for slot in Slot::all() {
            if let Some(thumb) = session.intake.thumbnail(slot, args.thumb_size) {
                save_preview(&thumb, &dir.join(format!("input_{}_thumb.png", slot.index())));
            }
        }
    }

    let options = GenerationOptions::new(args.model).with_aspect_ratio(args.aspect_ratio);
    let persist_options = PersistOptions::new()
        .with_format(args.format)
        .with_date_folder(args.date_folder);

    log::info!("✨ Creating your masterpiece...");
    let report = match session.generate(&args.prompt, &options, &persist_options).await {
        Ok(report) => report,
        Err(e @ GenImageError::ValidationError(_)) => {
            log::warn!("⚠️  {}", e);
            return Ok(false);
        }
        Err(e) => {
            log::error!("❌ {}", e);
            return Ok(false);
        }
    };

    let mut all_saved = true;
    for outcome in &report.persisted {
        match outcome {
            Ok(PersistOutcome::Stored(artifact)) => {
                log::info!("✅ Saved: {}", artifact.location);
            }
            Ok(PersistOutcome::DownloadOnly(_)) => {
                log::info!("ℹ️  Image is available for download only (not stored permanently)");
            }
            Err(e) => {
                all_saved = false;
                log::error!("❌ {}", e);
            }
        }
    }
    log::info!(
        "🎉 Successfully generated image using {} input image(s)!",
        report.input_count
    );
    if let Some(text) = &report.commentary {
        println!("{}", text);
    }

    let download_dir = args.download_to.clone().or_else(|| {
        (!backend.target().is_persistent() || !all_saved).then(|| PathBuf::from("."))
    });
    if let (Some(dir), Some(encoded)) = (download_dir, session.last_download()) {
        let path = dir.join(encoded.file_name());
        match tokio::fs::write(&path, &encoded.bytes).await {
            Ok(()) => log::info!("⬇️  Downloaded generated image to {}", path.display()),
            Err(e) => {
                all_saved = false;
                log::error!("❌ Cannot write {}: {}", path.display(), e);
            }
        }
    }

    if let (Some(dir), Some(image)) = (
        &args.preview_dir,
        session.last_result().and_then(|r| r.latest_image()),
    ) {
        let thumb = rgenimg::intake::thumbnail(image, args.thumb_size);
        save_preview(&thumb, &dir.join("generated_thumb.png"));
    }

    Ok(all_saved)
}

fn save_preview(image: &image::DynamicImage, path: &Path) {
    match rgenimg::intake::save_thumbnail(image, path) {
        Ok(()) => log::debug!("Preview written to {}", path.display()),
        Err(e) => log::warn!("⚠️  Could not write preview: {}", e),
    }
}
