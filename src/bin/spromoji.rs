use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "spromoji", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Animate an avatar from a tracking log and write one PNG per sample.
    Render(RenderArgs),
    /// Run the region detector chain and print the result as JSON.
    Detect(DetectArgs),
    /// Build a minimal rig from detected (or given) regions and write it as rig JSON.
    BuildRig(BuildRigArgs),
    /// Align the canonical template to three taps and write the calibrated rig.
    Calibrate(CalibrateArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Avatar image (PNG/JPEG/...).
    #[arg(long)]
    avatar: PathBuf,

    /// Tracking log: one JSON `TrackingFrame` per line.
    #[arg(long)]
    tracking: PathBuf,

    /// Output directory for `frame_NNNNN.png`.
    #[arg(long)]
    out_dir: PathBuf,

    /// Authored rig JSON.
    #[arg(long)]
    rig: Option<PathBuf>,

    /// Regions JSON (as printed by `detect`).
    #[arg(long)]
    regions: Option<PathBuf>,

    /// Calibration taps `x,y` for left eye, right eye, and mouth (in that order).
    #[arg(long = "tap", value_parser = parse_point, num_args = 1)]
    taps: Vec<spromoji::Point>,

    /// Engine config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fall back to the generic layout when detection finds nothing.
    #[arg(long)]
    generic: bool,
}

#[derive(Parser, Debug)]
struct DetectArgs {
    /// Avatar image.
    #[arg(long)]
    avatar: PathBuf,
}

#[derive(Parser, Debug)]
struct BuildRigArgs {
    /// Avatar image.
    #[arg(long)]
    avatar: PathBuf,

    /// Regions JSON; detected from the avatar when omitted.
    #[arg(long)]
    regions: Option<PathBuf>,

    /// Output rig JSON path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct CalibrateArgs {
    /// Avatar image.
    #[arg(long)]
    avatar: PathBuf,

    /// Taps `x,y` for left eye, right eye, and mouth (in that order).
    #[arg(long = "tap", value_parser = parse_point, num_args = 1, required = true)]
    taps: Vec<spromoji::Point>,

    /// Output rig JSON path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Detect(args) => cmd_detect(args),
        Command::BuildRig(args) => cmd_build_rig(args),
        Command::Calibrate(args) => cmd_calibrate(args),
    }
}

fn parse_point(s: &str) -> Result<spromoji::Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got '{s}'"))?;
    let x: f64 = x.trim().parse().map_err(|e| format!("bad x in '{s}': {e}"))?;
    let y: f64 = y.trim().parse().map_err(|e| format!("bad y in '{s}': {e}"))?;
    Ok(spromoji::Point::new(x, y))
}

fn read_regions(path: &Path) -> anyhow::Result<spromoji::RegionSet> {
    let f = File::open(path).with_context(|| format!("open regions '{}'", path.display()))?;
    let regions: spromoji::RegionSet =
        serde_json::from_reader(BufReader::new(f)).with_context(|| "parse regions JSON")?;
    Ok(regions)
}

fn write_text(path: &Path, text: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, text).with_context(|| format!("write '{}'", path.display()))?;
    eprintln!("wrote {}", path.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => spromoji::EngineConfig::from_path(path)?,
        None => spromoji::EngineConfig::default(),
    };
    if args.generic {
        config.allow_generic_rig = true;
    }
    let config = config.with_env_overrides();

    let avatar = spromoji::load_avatar(&args.avatar)?;
    let acquisition = spromoji::RigAcquisition {
        rig: args.rig.map(spromoji::RigSource::Path),
        calibration_points: (!args.taps.is_empty()).then_some(args.taps),
        regions: args.regions.as_deref().map(read_regions).transpose()?,
        ..Default::default()
    };

    let size = avatar.size();
    let mut engine = spromoji::Engine::init(config, avatar, acquisition)?;
    eprintln!(
        "rig: {:?}, {} vertices, {} triangles",
        engine.origin(),
        engine.rig().vertices().len(),
        engine.rig().triangles().len()
    );

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;
    let mut surface = spromoji::CpuSurface::new(size.width, size.height)?;

    let f = File::open(&args.tracking)
        .with_context(|| format!("open tracking log '{}'", args.tracking.display()))?;
    let mut written = 0usize;
    for (lineno, line) in BufReader::new(f).lines().enumerate() {
        let line = line.with_context(|| format!("read tracking line {}", lineno + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let frame: spromoji::TrackingFrame = serde_json::from_str(&line)
            .with_context(|| format!("parse tracking line {}", lineno + 1))?;

        let stats = engine.tick(&frame, &mut surface)?;
        let out = args.out_dir.join(format!("frame_{written:05}.png"));
        surface.finish().save_png(&out)?;
        tracing::debug!(
            frame = written,
            drawn = stats.triangles_drawn,
            skipped = stats.triangles_skipped,
            "frame written"
        );
        written += 1;
    }

    eprintln!("wrote {written} frames to {}", args.out_dir.display());
    Ok(())
}

fn cmd_detect(args: DetectArgs) -> anyhow::Result<()> {
    let avatar = spromoji::load_avatar(&args.avatar)?;
    let regions = spromoji::detect_regions(avatar.pixels(), None)
        .with_context(|| format!("no facial regions found in '{}'", args.avatar.display()))?;
    println!("{}", serde_json::to_string_pretty(&regions)?);
    Ok(())
}

fn cmd_build_rig(args: BuildRigArgs) -> anyhow::Result<()> {
    let avatar = spromoji::load_avatar(&args.avatar)?;
    let regions = match &args.regions {
        Some(path) => read_regions(path)?,
        None => spromoji::detect_regions(avatar.pixels(), None).with_context(|| {
            format!("no facial regions found in '{}'", args.avatar.display())
        })?,
    };
    let rig = spromoji::rig_from_regions(&regions, avatar.size())?;
    write_text(&args.out, &rig.to_json()?)
}

fn cmd_calibrate(args: CalibrateArgs) -> anyhow::Result<()> {
    let avatar = spromoji::load_avatar(&args.avatar)?;
    let aligned = spromoji::align_template(&args.taps, avatar.size())?;
    eprintln!(
        "scale {:.4}, rotation {:.4} rad, rms {:.2}px",
        aligned.transform.scale, aligned.transform.rotation, aligned.transform.rms_error
    );
    let rig = spromoji::rig_from_aligned_template(&aligned, avatar.size())?;
    write_text(&args.out, &rig.to_json()?)
}
