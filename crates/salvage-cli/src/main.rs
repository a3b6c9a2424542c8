use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

use anyhow::{bail, Context, Result};
use chrono::{SecondsFormat, Utc};
use clap::{Args, Parser, Subcommand};
use salvage_contracts::analysis::AnalysisResult;
use salvage_contracts::events::EventWriter;
use salvage_contracts::recommendations::{
    extract_from_analysis, parse_recommendations, Coverage, RecommendationSet,
};
use salvage_contracts::runs::{write_result, write_summary, BatchSummary};
use salvage_engine::config::{timeout_from_seconds, PipelineConfig};
use salvage_engine::Pipeline;
use serde_json::{json, Map, Value};
use uuid::Uuid;

const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];
const MAX_UPLOAD_BYTES: u64 = 16 * 1024 * 1024;
const DRYRUN_MODEL: &str = "dryrun-vision-1";

#[derive(Debug, Parser)]
#[command(
    name = "salvage",
    version,
    about = "Analyze photos of salvaged objects and suggest reuse ideas"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Analyze one image and write result.json.
    Analyze(AnalyzeArgs),
    /// Analyze many images on worker threads and write batch.json.
    Batch(BatchArgs),
    /// Run the recommendation parser over a saved model response.
    Parse(ParseArgs),
}

#[derive(Debug, Args)]
struct PipelineArgs {
    #[arg(long)]
    out: PathBuf,
    #[arg(long)]
    events: Option<PathBuf>,
    #[arg(long)]
    processed_dir: Option<PathBuf>,
    #[arg(long)]
    vision_model: Option<String>,
    #[arg(long)]
    text_model: Option<String>,
    /// Per-request timeout in seconds.
    #[arg(long)]
    timeout: Option<f64>,
    /// Use the offline provider for both model calls.
    #[arg(long)]
    dryrun: bool,
}

#[derive(Debug, Parser)]
struct AnalyzeArgs {
    #[arg(long)]
    image: PathBuf,
    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(Debug, Parser)]
struct BatchArgs {
    #[arg(required = true)]
    images: Vec<PathBuf>,
    #[arg(long, default_value_t = 4)]
    workers: usize,
    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(Debug, Parser)]
struct ParseArgs {
    #[arg(long)]
    input: PathBuf,
    /// Analysis text for the heuristic pass. Defaults to the input text.
    #[arg(long)]
    analysis: Option<PathBuf>,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("salvage error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Analyze(args) => run_analyze(args),
        Command::Batch(args) => run_batch(args),
        Command::Parse(args) => run_parse(args),
    }
}

fn run_analyze(args: AnalyzeArgs) -> Result<i32> {
    validate_upload(&args.image)?;
    let run_id = Uuid::new_v4().to_string();
    let pipeline = build_pipeline(&args.pipeline, &run_id)?;
    eprintln!(
        "Analyzing {} (vision: {}, text: {})",
        args.image.display(),
        pipeline.vision_model(),
        pipeline.text_model()
    );

    let result = pipeline.run(&args.image);
    let result_path = args.pipeline.out.join("result.json");
    let mut metadata = model_metadata(&pipeline);
    metadata.insert("run_id".to_string(), json!(run_id));
    write_result(&result_path, &result, Some(&metadata))?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    eprintln!(
        "{} ({}% confidence) -> {}",
        result.category,
        result.confidence,
        result_path.display()
    );
    Ok(if result.is_error() { 1 } else { 0 })
}

fn run_batch(args: BatchArgs) -> Result<i32> {
    let run_id = Uuid::new_v4().to_string();
    let started_at = now_utc_iso();
    let pipeline = build_pipeline(&args.pipeline, &run_id)?;
    let results = analyze_all(&pipeline, &args.images, args.workers);

    let results_dir = args.pipeline.out.join("results");
    for (idx, (image, result)) in args.images.iter().zip(&results).enumerate() {
        let path = results_dir.join(result_file_name(idx, image));
        let metadata = Map::from_iter([
            ("run_id".to_string(), json!(run_id)),
            ("image_index".to_string(), json!(idx + 1)),
        ]);
        write_result(&path, result, Some(&metadata))?;
    }

    let summary = BatchSummary::from_results(&run_id, started_at, &results);
    let summary_path = args.pipeline.out.join("batch.json");
    let mut metadata = model_metadata(&pipeline);
    metadata.insert("workers".to_string(), json!(args.workers));
    write_summary(&summary_path, &summary, Some(&metadata))?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    eprintln!(
        "Analyzed {} image(s), {} failed -> {}",
        summary.total_images,
        summary.failed_images,
        summary_path.display()
    );
    Ok(if summary.failed_images > 0 { 1 } else { 0 })
}

fn run_parse(args: ParseArgs) -> Result<i32> {
    let text = fs::read_to_string(&args.input)
        .with_context(|| format!("failed reading {}", args.input.display()))?;
    let analysis = match &args.analysis {
        Some(path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("failed reading {}", path.display()))?,
        ),
        None => None,
    };
    let report = parse_report(&text, analysis.as_deref());
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(0)
}

fn parse_report(text: &str, analysis: Option<&str>) -> Value {
    let parsed = parse_recommendations(text);
    let coverage = parsed.coverage();
    let heuristics: Option<RecommendationSet> = (coverage == Coverage::Empty)
        .then(|| extract_from_analysis(analysis.unwrap_or(text)));
    json!({
        "coverage": coverage.as_str(),
        "recommendations": parsed,
        "heuristics": heuristics,
    })
}

fn build_pipeline(args: &PipelineArgs, run_id: &str) -> Result<Pipeline> {
    let processed_dir = args
        .processed_dir
        .clone()
        .unwrap_or_else(|| args.out.join("processed"));
    let mut config = PipelineConfig::from_env(processed_dir);
    if args.dryrun {
        config = config.with_models(Some(DRYRUN_MODEL.to_string()), Some(DRYRUN_MODEL.to_string()));
    }
    config = config.with_models(args.vision_model.clone(), args.text_model.clone());
    if let Some(seconds) = args.timeout {
        config.request_timeout = timeout_from_seconds(seconds)
            .with_context(|| format!("invalid --timeout value {seconds}"))?;
    }

    fs::create_dir_all(&args.out)
        .with_context(|| format!("failed creating {}", args.out.display()))?;
    let events_path = args
        .events
        .clone()
        .unwrap_or_else(|| args.out.join("events.jsonl"));
    Pipeline::new(config, EventWriter::new(events_path, run_id))
}

fn model_metadata(pipeline: &Pipeline) -> Map<String, Value> {
    Map::from_iter([
        ("vision_model".to_string(), json!(pipeline.vision_model())),
        ("text_model".to_string(), json!(pipeline.text_model())),
    ])
}

/// Results come back in input order. Rejected uploads become error results.
fn analyze_all(pipeline: &Pipeline, images: &[PathBuf], workers: usize) -> Vec<AnalysisResult> {
    let workers = workers.clamp(1, images.len().max(1));
    let next = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel();

    thread::scope(|scope| {
        for _ in 0..workers {
            let tx = tx.clone();
            let next = &next;
            scope.spawn(move || loop {
                let idx = next.fetch_add(1, Ordering::SeqCst);
                let Some(image) = images.get(idx) else {
                    break;
                };
                let result = match validate_upload(image) {
                    Ok(()) => {
                        eprintln!("[{}/{}] {}", idx + 1, images.len(), image.display());
                        pipeline.run(image)
                    }
                    Err(err) => AnalysisResult::failed(image, &format!("{err:#}")),
                };
                if tx.send((idx, result)).is_err() {
                    break;
                }
            });
        }
    });
    drop(tx);

    let mut ordered: Vec<Option<AnalysisResult>> = vec![None; images.len()];
    for (idx, result) in rx {
        ordered[idx] = Some(result);
    }
    ordered
        .into_iter()
        .zip(images)
        .map(|(result, image)| {
            result.unwrap_or_else(|| AnalysisResult::failed(image, "worker exited early"))
        })
        .collect()
}

/// Caller-side checks: allowed extension, existing file, size cap.
fn validate_upload(path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())
        .unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        bail!(
            "unsupported file type for {} (allowed: {})",
            path.display(),
            ALLOWED_EXTENSIONS.join(", ")
        );
    }
    let metadata =
        fs::metadata(path).with_context(|| format!("failed reading {}", path.display()))?;
    if !metadata.is_file() {
        bail!("{} is not a file", path.display());
    }
    if metadata.len() > MAX_UPLOAD_BYTES {
        bail!(
            "{} is {} bytes; the limit is {MAX_UPLOAD_BYTES}",
            path.display(),
            metadata.len()
        );
    }
    Ok(())
}

fn result_file_name(idx: usize, image: &Path) -> String {
    let stem = image
        .file_stem()
        .map(|value| value.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    format!("{:03}_{stem}.json", idx + 1)
}

fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}
