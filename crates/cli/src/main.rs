use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

use facegraph_core::detection::domain::face_detector::FaceDetector;
use facegraph_core::detection::domain::scaled_face_detector::ScaledFaceDetector;
use facegraph_core::detection::infrastructure::onnx_face_encoder::OnnxFaceEncoder;
use facegraph_core::detection::infrastructure::onnx_yolo_locator::OnnxYoloLocator;
use facegraph_core::identity::domain::identity::IdentityId;
use facegraph_core::identity::domain::identity_seeder::{IdentitySeeder, SeedRequest};
use facegraph_core::identity::domain::identity_store::IdentityStore;
use facegraph_core::identity::infrastructure::json_identity_store::JsonIdentityStore;
use facegraph_core::pipeline::analysis_store::AnalysisStore;
use facegraph_core::pipeline::analyze_video_use_case::{AnalysisRequest, AnalyzeVideoUseCase};
use facegraph_core::pipeline::detection_executor::DetectionExecutor;
use facegraph_core::pipeline::infrastructure::http_analysis_notifier::HttpAnalysisNotifier;
use facegraph_core::pipeline::infrastructure::json_analysis_store::JsonAnalysisStore;
use facegraph_core::pipeline::infrastructure::sequential_detection_executor::SequentialDetectionExecutor;
use facegraph_core::pipeline::infrastructure::threaded_detection_executor::ThreadedDetectionExecutor;
use facegraph_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use facegraph_core::shared::config::AnalysisConfig;
use facegraph_core::shared::constants::IMAGE_EXTENSIONS;
use facegraph_core::shared::error::AnalysisError;
use facegraph_core::shared::model_resolver::{self, FACE_ENCODER_MODEL, FACE_LOCATOR_MODEL};
use facegraph_core::storage::infrastructure::jsonl_search_index::JsonlSearchIndex;
use facegraph_core::storage::infrastructure::local_object_store::LocalObjectStore;
use facegraph_core::video::infrastructure::ffmpeg_chunk_decoder::FfmpegChunkDecoder;
use facegraph_core::video::infrastructure::ffmpeg_transcoder::FfmpegTranscoder;
use facegraph_core::video::infrastructure::image_codec::ImageCrateCodec;

/// Builds face interaction graphs from videos.
#[derive(Parser)]
#[command(name = "facegraph")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyse a video and print its interaction graph as JSON.
    Analyze(AnalyzeArgs),
    /// Register people from reference photos.
    Seed(SeedArgs),
    /// List the identities stored for an owner.
    Identities(IdentitiesArgs),
    /// Print a stored analysis as JSON.
    Analysis(AnalysisArgs),
}

#[derive(Args)]
struct StoreArgs {
    /// Identity and analysis store directory (defaults to the platform data
    /// directory).
    #[arg(long)]
    store: Option<PathBuf>,

    /// Directory holding bundled ONNX models, checked before downloading.
    #[arg(long)]
    models_dir: Option<PathBuf>,
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Input video file.
    video: PathBuf,

    /// Owner whose identities the video is matched against.
    #[arg(long)]
    owner: String,

    /// Video id used in results and chunk keys (random when omitted).
    #[arg(long)]
    video_id: Option<String>,

    #[command(flatten)]
    store: StoreArgs,

    /// Analysis config JSON (defaults to the platform config file).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the result here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Upload each chunk into this directory.
    #[arg(long)]
    chunks_dir: Option<PathBuf>,

    /// Write chunk summaries to this JSON-lines search index.
    #[arg(long)]
    index: Option<PathBuf>,

    /// POST the finished analysis to this URL (best-effort).
    #[arg(long)]
    notify_url: Option<String>,

    /// Chunk length in seconds.
    #[arg(long)]
    chunk_duration: Option<f64>,

    /// Detect on every Nth decoded frame.
    #[arg(long)]
    frame_skip: Option<usize>,

    /// Max cosine distance for two faces in a chunk to be one person.
    #[arg(long)]
    grouping_threshold: Option<f64>,

    /// Min cosine similarity to match a known identity (0.0-1.0).
    #[arg(long)]
    match_threshold: Option<f64>,

    /// Min face quality to create a new identity (0.0-1.0).
    #[arg(long)]
    new_identity_threshold: Option<f64>,

    /// Detection worker threads (1 = detect inline).
    #[arg(long)]
    workers: Option<usize>,
}

#[derive(Args)]
struct SeedArgs {
    /// Owner the identities belong to.
    #[arg(long)]
    scope: String,

    #[command(flatten)]
    store: StoreArgs,

    /// Identity id (with --image).
    #[arg(long, requires = "image")]
    id: Option<String>,

    /// Reference photo (with --id).
    #[arg(long, requires = "id")]
    image: Option<PathBuf>,

    /// Display name (with --id).
    #[arg(long)]
    name: Option<String>,

    /// JSON list of `{"id", "name", "image"}` entries; image paths are
    /// relative to the manifest.
    #[arg(long, conflicts_with = "id")]
    manifest: Option<PathBuf>,

    /// Store photos only and embed them on the next analysis.
    #[arg(long)]
    defer: bool,
}

#[derive(Args)]
struct IdentitiesArgs {
    #[arg(long)]
    scope: String,

    #[arg(long)]
    store: Option<PathBuf>,
}

#[derive(Args)]
struct AnalysisArgs {
    #[arg(long)]
    owner: String,

    #[arg(long)]
    video_id: String,

    #[arg(long)]
    store: Option<PathBuf>,
}

#[derive(Deserialize)]
struct ManifestEntry {
    id: String,
    #[serde(default)]
    name: Option<String>,
    image: PathBuf,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {
        Command::Analyze(args) => run_analyze(args),
        Command::Seed(args) => run_seed(args),
        Command::Identities(args) => run_identities(args),
        Command::Analysis(args) => run_analysis(args),
    }
}

fn run_analyze(args: AnalyzeArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.video.exists() {
        return Err(format!("Input file not found: {}", args.video.display()).into());
    }
    let config = build_config(&args)?;
    let media = fs::read(&args.video)?;

    let executor = build_executor(&config, args.store.models_dir.as_deref())?;
    let seeder = build_seeder(&config, args.store.models_dir.as_deref())?;
    let root = store_root(args.store.store.as_deref())?;

    let mut use_case = AnalyzeVideoUseCase::new(
        config,
        Box::new(FfmpegTranscoder::new()),
        Box::new(FfmpegChunkDecoder::new()),
        executor,
        Box::new(JsonIdentityStore::new(&root)),
        Box::new(ImageCrateCodec::new()),
    )?
    .with_seeder(seeder)
    .with_analysis_store(Box::new(JsonAnalysisStore::new(&root)))
    .with_logger(Box::new(StdoutPipelineLogger::new()));
    if let Some(dir) = args.chunks_dir {
        use_case = use_case.with_object_store(Box::new(LocalObjectStore::new(dir)));
    }
    if let Some(path) = args.index {
        use_case = use_case.with_search_index(Box::new(JsonlSearchIndex::new(path)));
    }
    if let Some(url) = args.notify_url {
        use_case = use_case.with_notifier(Box::new(HttpAnalysisNotifier::new(url)));
    }

    let request = AnalysisRequest {
        owner: args.owner,
        video_id: args
            .video_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        media,
    };
    let analysis = use_case.execute(&request)?;

    let json = serde_json::to_string_pretty(&analysis)?;
    match args.output {
        Some(path) => {
            fs::write(&path, json)?;
            log::info!("Analysis written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn run_seed(args: SeedArgs) -> Result<(), Box<dyn std::error::Error>> {
    let requests = match (&args.manifest, &args.id, &args.image) {
        (Some(manifest), _, _) => read_manifest(manifest)?,
        (None, Some(id), Some(image)) => vec![SeedRequest {
            id: IdentityId::new(id.as_str()),
            display_name: args.name.clone(),
            image: read_image(image)?,
        }],
        _ => return Err("Provide --id with --image, or --manifest".into()),
    };
    let mut store = open_store(args.store.store.as_deref())?;
    let total = requests.len();

    let outcomes: Vec<(IdentityId, Result<(), AnalysisError>)> = if args.defer {
        requests
            .into_iter()
            .map(|r| {
                let id = r.id.clone();
                (id, IdentitySeeder::register_deferred(&args.scope, r, &mut store))
            })
            .collect()
    } else {
        let config = AnalysisConfig::load_or_default();
        let mut seeder = build_seeder(&config, args.store.models_dir.as_deref())?;
        seeder.seed(&args.scope, requests, &mut store)
    };

    let mut failed = 0;
    for (id, outcome) in &outcomes {
        match outcome {
            Ok(()) => log::info!("Seeded identity {id}"),
            Err(e) => {
                failed += 1;
                eprintln!("{id}: {e}");
            }
        }
    }
    if failed > 0 {
        return Err(format!("{failed} of {total} identities could not be seeded").into());
    }
    Ok(())
}

fn run_identities(args: IdentitiesArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(args.store.as_deref())?;
    for identity in store.load_known_identities(&args.scope)? {
        let name = identity.display_name.as_deref().unwrap_or("-");
        let source = identity
            .metadata
            .get("source")
            .and_then(|v| v.as_str())
            .unwrap_or("seeded");
        let embedded = if identity.embedding.is_some() {
            "embedded"
        } else {
            "pending"
        };
        println!("{}\t{name}\t{source}\t{embedded}", identity.id);
    }
    Ok(())
}

fn run_analysis(args: AnalysisArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = JsonAnalysisStore::new(store_root(args.store.as_deref())?);
    let analysis = store
        .load_analysis(&args.owner, &args.video_id)?
        .ok_or_else(|| format!("No analysis stored for video {} of {}", args.video_id, args.owner))?;
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}

fn build_config(args: &AnalyzeArgs) -> Result<AnalysisConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::load_or_default(),
    };
    if let Some(v) = args.chunk_duration {
        config.chunk_duration_secs = v;
    }
    if let Some(v) = args.frame_skip {
        config.frame_skip = v;
    }
    if let Some(v) = args.grouping_threshold {
        config.face_grouping_threshold = v;
    }
    if let Some(v) = args.match_threshold {
        config.face_match_threshold = v;
    }
    if let Some(v) = args.new_identity_threshold {
        config.new_identity_threshold = v;
    }
    if let Some(v) = args.workers {
        config.detection_workers = v;
    }
    config.validate()?;
    Ok(config)
}

/// Builds a locator + encoder detector at `detection_scale`.
fn build_detector(
    config: &AnalysisConfig,
    detection_scale: f64,
    models_dir: Option<&Path>,
    intra_threads: usize,
) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
    let locator_path = model_resolver::resolve(
        FACE_LOCATOR_MODEL,
        models_dir,
        Some(Box::new(download_progress)),
    )?;
    let encoder_path = model_resolver::resolve(
        FACE_ENCODER_MODEL,
        models_dir,
        Some(Box::new(download_progress)),
    )?;

    let locator = OnnxYoloLocator::new(&locator_path, config.detector_confidence, intra_threads)?;
    let encoder = OnnxFaceEncoder::new(&encoder_path, intra_threads)?;
    Ok(Box::new(ScaledFaceDetector::new(
        Box::new(locator),
        Box::new(encoder),
        detection_scale,
        config.min_face_size,
        config.reference_face_area,
    )?))
}

fn build_executor(
    config: &AnalysisConfig,
    models_dir: Option<&Path>,
) -> Result<Box<dyn DetectionExecutor>, Box<dyn std::error::Error>> {
    let cores = std::thread::available_parallelism().map_or(1, |n| n.get());
    let workers = config.detection_workers;
    let intra_threads = (cores / workers).max(1);

    if workers == 1 {
        let detector = build_detector(config, config.detection_scale, models_dir, intra_threads)?;
        return Ok(Box::new(SequentialDetectionExecutor::new(
            detector,
            config.frame_timeout(),
        )));
    }

    let detectors = (0..workers)
        .map(|_| build_detector(config, config.detection_scale, models_dir, intra_threads))
        .collect::<Result<Vec<_>, _>>()?;
    log::info!("Detecting with {workers} workers, {intra_threads} threads each");
    Ok(Box::new(ThreadedDetectionExecutor::new(
        detectors,
        config.frame_timeout(),
    )?))
}

/// Reference photos are embedded at full resolution.
fn build_seeder(
    config: &AnalysisConfig,
    models_dir: Option<&Path>,
) -> Result<IdentitySeeder, Box<dyn std::error::Error>> {
    let cores = std::thread::available_parallelism().map_or(1, |n| n.get());
    let detector = build_detector(config, 1.0, models_dir, cores)?;
    Ok(IdentitySeeder::new(detector, Box::new(ImageCrateCodec::new())))
}

/// Identities and analyses share one root directory.
fn store_root(root: Option<&Path>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match root {
        Some(r) => Ok(r.to_path_buf()),
        None => Ok(JsonIdentityStore::default_root().ok_or("could not determine data directory")?),
    }
}

fn open_store(root: Option<&Path>) -> Result<JsonIdentityStore, Box<dyn std::error::Error>> {
    Ok(JsonIdentityStore::new(store_root(root)?))
}

fn read_manifest(path: &Path) -> Result<Vec<SeedRequest>, Box<dyn std::error::Error>> {
    let entries: Vec<ManifestEntry> = serde_json::from_str(&fs::read_to_string(path)?)
        .map_err(|e| format!("malformed manifest {}: {e}", path.display()))?;
    let base = path.parent().unwrap_or(Path::new("."));
    entries
        .into_iter()
        .map(|entry| -> Result<SeedRequest, Box<dyn std::error::Error>> {
            Ok(SeedRequest {
                id: IdentityId::new(entry.id),
                display_name: entry.name,
                image: read_image(&base.join(entry.image))?,
            })
        })
        .collect()
}

fn read_image(path: &Path) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    if !is_image(path) {
        return Err(format!("Not a supported image file: {}", path.display()).into());
    }
    fs::read(path).map_err(|e| format!("cannot read {}: {e}", path.display()).into())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face model... {pct}%");
    } else {
        eprint!("\rDownloading face model... {downloaded} bytes");
    }
}
