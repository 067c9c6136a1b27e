use clap::{ArgGroup, Parser};
use std::error::Error;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use sprite_slicer::overlay::render_overlay;
use sprite_slicer::synth::generate_demo_sheet;
use sprite_slicer::{CoreVsFxClassifier, SheetOutcome, SheetPipeline, SlicerConfig, SpriteSheet};

#[derive(Parser, Debug)]
#[command(
    name = "slicer",
    about = "Split packed sprite sheets into trimmed, pivoted animation frames",
    version,
    group(
        ArgGroup::new("input")
            .required(true)
            .args(["dir", "demo"])
    )
)]
struct Cli {
    /// Directory containing sprite sheets
    #[arg(short = 'd', long = "dir")]
    dir: Option<PathBuf>,

    /// Output directory for frames and diagnostics
    #[arg(short = 'o', long = "out", default_value = "frames")]
    out: PathBuf,

    /// JSON configuration file
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Write an annotated overlay PNG per sheet
    #[arg(long = "overlay")]
    overlay: bool,

    /// Write a stats JSON file per sheet
    #[arg(long = "stats")]
    stats: bool,

    /// Process all sheets in parallel
    #[arg(long = "parallel", short = 'j')]
    parallel: bool,

    /// Write a synthetic demo sheet to this path and exit
    #[arg(long = "demo")]
    demo: Option<PathBuf>,
}

fn is_image_file(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(OsStr::to_str) else {
        return false;
    };
    matches!(
        ext.to_ascii_lowercase().as_str(),
        "png" | "bmp" | "gif" | "tga" | "tif" | "tiff" | "webp"
    )
}

fn load_config(path: Option<&Path>) -> Result<SlicerConfig, Box<dyn Error>> {
    let Some(path) = path else {
        return Ok(SlicerConfig::default());
    };
    let text = fs::read_to_string(path)?;
    let config: SlicerConfig = serde_json::from_str(&text)?;
    Ok(config)
}

fn write_outputs(cli: &Cli, sheet: &SpriteSheet, outcome: &SheetOutcome) -> Result<(), Box<dyn Error>> {
    let stem = sheet.stem();
    for frame in &outcome.frames {
        let path = cli.out.join(format!("{stem}_{}.png", frame.index));
        frame.image.save(&path)?;
    }

    if cli.overlay {
        let path = cli.out.join(format!("{stem}_overlay.png"));
        render_overlay(sheet, outcome).save(&path)?;
    }

    if cli.stats {
        let path = cli.out.join(format!("{stem}_stats.json"));
        let frames: Vec<serde_json::Value> = outcome
            .frames
            .iter()
            .map(|f| {
                serde_json::json!({
                    "index": f.index,
                    "rect": f.rect,
                    "pivot": [f.pivot.0, f.pivot.1],
                })
            })
            .collect();
        let report = serde_json::json!({
            "source": outcome.source,
            "decision": outcome.decision,
            "reason": outcome.reason,
            "stats": outcome.stats,
            "clips": outcome.clips,
            "frames": frames,
        });
        fs::write(&path, serde_json::to_string_pretty(&report)?)?;
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    if let Some(demo) = &cli.demo {
        generate_demo_sheet(&demo.to_string_lossy(), 4)?;
        info!(path = %demo.display(), "wrote demo sheet");
        return Ok(());
    }

    let Some(dir) = cli.dir.as_deref() else {
        return Err("--dir is required".into());
    };
    if !dir.is_dir() {
        return Err(format!("Not a directory: {}", dir.display()).into());
    }

    let pipeline = SheetPipeline::new(load_config(cli.config.as_deref())?)?;

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_image_file(p))
        .collect();
    paths.sort();

    if paths.is_empty() {
        warn!("No images found in {}", dir.display());
        return Ok(());
    }
    fs::create_dir_all(&cli.out)?;

    let mut sheets = Vec::with_capacity(paths.len());
    for path in &paths {
        match image::open(path) {
            Ok(img) => sheets.push(SpriteSheet::from_dynamic(&img, path)),
            Err(e) => error!("Failed to open {}: {e}", path.display()),
        }
    }

    let mut classifier = CoreVsFxClassifier::new();
    let outcomes = if cli.parallel {
        pipeline.process_batch(&sheets, &mut classifier)
    } else {
        sheets
            .iter()
            .map(|sheet| pipeline.process(sheet, &mut classifier))
            .collect()
    };

    let mut total_frames = 0usize;
    for (sheet, outcome) in sheets.iter().zip(&outcomes) {
        total_frames += outcome.frames.len();
        if let Err(e) = write_outputs(&cli, sheet, outcome) {
            error!("Failed to write outputs for {}: {e}", sheet.source().display());
        }
    }

    info!(
        sheets = sheets.len(),
        frames = total_frames,
        out = %cli.out.display(),
        "done"
    );
    Ok(())
}
