use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use mosaic_wm::common::config::{config_file, Config};
use mosaic_wm::common::log;
use mosaic_wm::layout_engine::{CustomLayout, LayoutDescriptor, LayoutKind, generate_layout};
use mosaic_wm::model::geometry::Rect;

#[derive(Parser)]
#[command(name = "mosaic", version, about = "Zone layout inspection tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a layout for a given work area and print its zone table.
    Inspect {
        /// Layout kind: focus, columns, rows, grid, priority_grid.
        #[arg(long)]
        kind: Option<String>,

        /// Number of zones to generate.
        #[arg(long)]
        zones: Option<usize>,

        /// Work area width in pixels.
        #[arg(long, default_value_t = 1920)]
        width: i32,

        /// Work area height in pixels.
        #[arg(long, default_value_t = 1080)]
        height: i32,

        /// Display scale factor.
        #[arg(long, default_value_t = 1.0)]
        scale: f64,

        /// JSON file holding an editor-authored custom layout.
        #[arg(long)]
        custom: Option<PathBuf>,
    },

    /// Validate a configuration file and report every issue found.
    CheckConfig {
        /// Path to the config; defaults to ~/.mosaic.toml.
        path: Option<PathBuf>,

        /// Apply automatic fixes and write the file back.
        #[arg(long)]
        fix: bool,
    },
}

fn main() -> anyhow::Result<()> {
    log::init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Inspect { kind, zones, width, height, scale, custom } => {
            inspect(kind, zones, width, height, scale, custom)
        }
        Command::CheckConfig { path, fix } => check_config(path, fix),
    }
}

fn load_config() -> Config {
    let path = config_file();
    if path.exists() {
        match Config::read(&path) {
            Ok(config) => return config,
            Err(e) => tracing::warn!("ignoring unreadable config: {e}"),
        }
    }
    Config::default()
}

fn inspect(
    kind: Option<String>,
    zones: Option<usize>,
    width: i32,
    height: i32,
    scale: f64,
    custom: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = load_config();
    let mut descriptor: LayoutDescriptor = config.settings.layout.to_descriptor();

    if let Some(path) = custom {
        let buf = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let layout: CustomLayout = serde_json::from_str(&buf)
            .with_context(|| format!("parsing {}", path.display()))?;
        descriptor.kind = LayoutKind::Custom;
        descriptor.uuid = path.display().to_string();
        descriptor.custom = Some(layout);
    } else if let Some(kind) = kind {
        let kind = LayoutKind::from_str(&kind)
            .map_err(|_| anyhow::anyhow!("unknown layout kind: {kind}"))?;
        if kind == LayoutKind::Custom {
            bail!("custom layouts need --custom <file>");
        }
        descriptor.kind = kind;
    }
    if let Some(zones) = zones {
        descriptor.zone_count = zones;
        descriptor.uuid = format!("{}-{}", descriptor.kind, zones);
    }

    let work_rect = Rect::from_size(0, 0, width, height);
    let map = generate_layout(&descriptor, work_rect, scale);
    if map.is_empty() {
        bail!("layout generation failed for {}", descriptor.uuid);
    }

    println!(
        "{} ({} zones, {}x{} @ {:.2}x)",
        descriptor.uuid,
        map.len(),
        width,
        height,
        scale
    );
    println!("{:>4}  {:>6} {:>6} {:>6} {:>6}  {:>10}", "zone", "left", "top", "right", "bottom", "area");
    for zone in map.values() {
        let r = zone.rect();
        println!(
            "{:>4}  {:>6} {:>6} {:>6} {:>6}  {:>10}",
            zone.id(),
            r.left,
            r.top,
            r.right,
            r.bottom,
            zone.area()
        );
    }
    Ok(())
}

fn check_config(path: Option<PathBuf>, fix: bool) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(config_file);
    let mut config =
        Config::read(&path).with_context(|| format!("reading {}", path.display()))?;

    let issues = config.validate();
    if issues.is_empty() {
        println!("{}: ok", path.display());
        return Ok(());
    }

    for issue in &issues {
        println!("{}: {}", path.display(), issue);
    }
    if fix {
        let fixes = config.auto_fix_values();
        config.save(&path)?;
        println!("applied {fixes} automatic fixes");
        let remaining = config.validate();
        if !remaining.is_empty() {
            bail!("{} issues could not be fixed automatically", remaining.len());
        }
        return Ok(());
    }
    bail!("{} issues found", issues.len());
}
