use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "stickerbake", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bake every mesh of a scene into PNG textures.
    Bake(BakeArgs),
    /// Print the scene's validated sticker stack as JSON.
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
struct BakeArgs {
    /// Input scene JSON. Image paths are relative to its directory.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path. With several meshes, `_<index>` is appended to the file stem.
    #[arg(long)]
    out: PathBuf,

    /// Editor config JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Editor config JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Bake(args) => cmd_bake(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn load_session(
    in_path: &Path,
    config: Option<&Path>,
) -> anyhow::Result<stickerbake::EditorSession> {
    let scene = stickerbake::SceneDef::from_path(in_path)?;
    let config = match config {
        Some(p) => stickerbake::EditorConfig::from_path(p)?,
        None => stickerbake::EditorConfig::default(),
    };
    let assets_root = in_path.parent().unwrap_or_else(|| Path::new("."));
    let store = stickerbake::ImageStore::new(stickerbake::FsFetcher::new(assets_root));
    let session = scene
        .build_session(config, store)
        .with_context(|| format!("load scene '{}'", in_path.display()))?;
    Ok(session)
}

fn cmd_bake(args: BakeArgs) -> anyhow::Result<()> {
    let mut session = load_session(&args.in_path, args.config.as_deref())?;
    let applied = session.rebake()?;
    let meshes = session.materials().len();
    tracing::info!(meshes, applied, "bake finished");

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    for (index, mesh) in session.materials().mesh_ids().enumerate() {
        let Some(map) = session.materials().get(mesh).and_then(|m| m.map.as_ref()) else {
            tracing::warn!(mesh = mesh.0, "mesh has no color map; nothing written");
            continue;
        };
        let out = output_path(&args.out, index, meshes);
        let png = stickerbake::encode_png(&map.image)?;
        std::fs::write(&out, png).with_context(|| format!("write png '{}'", out.display()))?;
        eprintln!("wrote {}", out.display());
    }
    Ok(())
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let session = load_session(&args.in_path, args.config.as_deref())?;
    let json = serde_json::to_string_pretty(session.stack().paint_order())
        .context("serialize sticker stack")?;
    println!("{json}");
    Ok(())
}

fn output_path(out: &Path, index: usize, total: usize) -> PathBuf {
    if total <= 1 {
        return out.to_path_buf();
    }
    let stem = out
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "bake".to_owned());
    let name = match out.extension() {
        Some(ext) => format!("{stem}_{index}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{index}"),
    };
    out.with_file_name(name)
}
