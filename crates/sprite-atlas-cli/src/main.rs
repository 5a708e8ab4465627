use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use globset::{Glob, GlobSetBuilder};
use serde::Deserialize;
use sprite_atlas_core::config::{AtlasConfig, Background, OutputFormat};
use sprite_atlas_core::{ItemSet, composite, composite_with_progress, plan_grid, write_output};
use tracing::{info, warn};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "sprite-atlas",
    about = "Pack icons into a grid sprite atlas with a CSS stylesheet",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --progress false or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the atlas image and its stylesheet
    Pack(PackArgs),
    /// Print the grid plan and cell offsets without decoding any image
    Plan(PlanArgs),
}

#[derive(Parser, Debug, Clone)]
struct InputArgs {
    /// Include patterns (glob). If set, only files matching any pattern are considered
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob). Files matching any pattern will be ignored
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
struct GridArgs {
    /// Cell width in pixels
    #[arg(long, default_value_t = 32, help_heading = "Layout")]
    cell_width: u32,
    /// Cell height in pixels
    #[arg(long, default_value_t = 32, help_heading = "Layout")]
    cell_height: u32,
    /// Gap before each cell, from the top-left corner
    #[arg(long, default_value_t = 2, help_heading = "Layout")]
    padding: u32,
}

#[derive(Parser, Debug, Clone)]
struct PackArgs {
    // Input/Output
    /// Input file or directory (png, jpg, jpeg, gif)
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Base name (files will be name.png|jpg and name.css)
    #[arg(short, long, default_value = "sprite", help_heading = "Input/Output")]
    name: String,
    /// Explicit atlas image path (overrides out_dir/name)
    #[arg(long, help_heading = "Input/Output")]
    out_image: Option<PathBuf>,
    /// Explicit stylesheet path (overrides out_dir/name)
    #[arg(long, help_heading = "Input/Output")]
    out_css: Option<PathBuf>,
    /// YAML config file path (overrides command-line options)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,
    #[command(flatten)]
    filters: InputArgs,

    #[command(flatten)]
    grid: GridArgs,

    // Image
    /// Atlas format: png | jpg
    #[arg(long, value_parser = ["png", "jpg", "jpeg"], default_value = "jpg", help_heading = "Image")]
    format: String,
    /// JPEG quality (1..=100)
    #[arg(long, default_value_t = 85, help_heading = "Image")]
    jpeg_quality: u8,
    /// Background color: #rrggbb or r,g,b
    #[arg(long, default_value = "#ffffff", help_heading = "Image")]
    background: String,

    // Stylesheet
    /// Selector prefix; `.icon` yields `.icon.icon-<name>` rules
    #[arg(long, default_value = ".sprite", help_heading = "Stylesheet")]
    css_class: String,
    /// Image URL written into the container rule (defaults to the atlas file name)
    #[arg(long, help_heading = "Stylesheet")]
    css_path: Option<String>,

    // Export
    /// Export run stats and skipped items (JSON) to this file
    #[arg(long, help_heading = "Export")]
    export_stats: Option<PathBuf>,
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: composite and report but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
struct PlanArgs {
    /// Input file or directory
    #[arg(required_unless_present = "count")]
    input: Option<PathBuf>,
    /// Plan for this many anonymous items instead of an input folder
    #[arg(long, conflicts_with = "input")]
    count: Option<usize>,
    #[command(flatten)]
    filters: InputArgs,
    #[command(flatten)]
    grid: GridArgs,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Pack(args) => run_pack(args, cli.progress && !cli.quiet),
        Commands::Plan(args) => run_plan(args),
    }
}

fn run_pack(cli: &PackArgs, show_progress: bool) -> anyhow::Result<()> {
    let cfg = build_config(cli)?;

    if cli.print_config {
        match cli.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(());
    }

    let items = gather_items(&cli.input, &cli.filters.include, &cli.filters.exclude)?;
    if items.is_empty() {
        anyhow::bail!("no gif/jpeg/png images found under {}", cli.input.display());
    }
    info!(count = items.len(), "collected input images");

    let out = if show_progress {
        use indicatif::{ProgressBar, ProgressStyle};
        let bar = ProgressBar::new(items.len() as u64);
        bar.set_style(ProgressStyle::with_template(
            "{spinner:.green} compositing {pos}/{len} [{elapsed_precise}] {wide_msg}",
        )?);
        let res = composite_with_progress(&items, &cfg, |_, name| {
            bar.set_message(name.to_string());
            bar.inc(1);
        });
        bar.finish_and_clear();
        res?
    } else {
        composite(&items, &cfg)?
    };

    if !cli.dry_run {
        for path in [&cfg.out_image, &cfg.out_css] {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create {}", parent.display()))?;
            }
        }
        write_output(&out, &cfg).with_context(|| {
            format!("write {} / {}", cfg.out_image.display(), cfg.out_css.display())
        })?;
    }

    let stats = out.stats();
    for s in &out.skipped {
        warn!(item = %s.name, path = ?s.path, reason = %s.reason, "not in atlas");
    }
    info!(
        width = stats.atlas_width,
        height = stats.atlas_height,
        placed = stats.placed,
        skipped = stats.skipped,
        fill = format!("{:.2}%", stats.fill_ratio * 100.0),
        "stats"
    );

    if let Some(stats_path) = &cli.export_stats {
        let value = serde_json::json!({
            "stats": stats,
            "skipped": out.skipped,
        });
        if !cli.dry_run {
            fs::write(stats_path, serde_json::to_string_pretty(&value)?)
                .with_context(|| format!("write {}", stats_path.display()))?;
            info!(?stats_path, "stats exported");
        } else {
            println!("{}", stats.summary());
        }
    }
    Ok(())
}

fn run_plan(args: &PlanArgs) -> anyhow::Result<()> {
    let names: Vec<String> = match (&args.input, args.count) {
        (_, Some(n)) => (0..n).map(|i| format!("#{}", i)).collect(),
        (Some(input), None) => gather_items(input, &args.filters.include, &args.filters.exclude)?
            .iter()
            .map(|(name, _)| name.to_string())
            .collect(),
        (None, None) => anyhow::bail!("either an input path or --count is required"),
    };
    let g = &args.grid;
    let plan = plan_grid(names.len(), g.cell_width, g.cell_height, g.padding);
    println!(
        "grid {}x{} ({} cells) atlas {}x{} px",
        plan.cols,
        plan.rows,
        plan.capacity(),
        plan.width,
        plan.height
    );
    for (i, name) in names.iter().enumerate() {
        let (x, y) = plan.coordinate_for(i);
        println!("{:>5} {:>6} {:>6}  {}", i, x, y, name);
    }
    Ok(())
}

fn build_config(cli: &PackArgs) -> anyhow::Result<AtlasConfig> {
    let yaml = match &cli.config {
        Some(path) => {
            let file =
                fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
            serde_yaml::from_str(&file).with_context(|| format!("parse {}", path.display()))?
        }
        None => YamlConfig::default(),
    };
    let cfg = merge_config(cli, yaml)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Layers `yaml` over the command line; derived image paths follow the final format.
fn merge_config(cli: &PackArgs, yaml: YamlConfig) -> anyhow::Result<AtlasConfig> {
    let out_format: OutputFormat = cli
        .format
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown format: {}", cli.format))?;
    let background: Background = cli
        .background
        .parse()
        .map_err(|e: String| anyhow::anyhow!("invalid --background: {}", e))?;
    let explicit_image = cli.out_image.is_some() || yaml.out_image.is_some();
    let explicit_css_path = cli.css_path.is_some() || yaml.css_path.is_some();
    let image_name = format!("{}.{}", cli.name, out_format.extension());
    let cfg = AtlasConfig {
        out_image: cli
            .out_image
            .clone()
            .unwrap_or_else(|| cli.out_dir.join(&image_name)),
        out_css: cli
            .out_css
            .clone()
            .unwrap_or_else(|| cli.out_dir.join(format!("{}.css", cli.name))),
        out_format,
        css_class: cli.css_class.clone(),
        css_path: cli.css_path.clone().unwrap_or(image_name),
        cell_padding: cli.grid.padding,
        cell_width: cli.grid.cell_width,
        cell_height: cli.grid.cell_height,
        background,
        jpeg_quality: cli.jpeg_quality,
    };
    let mut cfg = yaml.into_atlas_config(cfg)?;

    // out_format may have changed in the YAML file
    let image_name = format!("{}.{}", cli.name, cfg.out_format.extension());
    if !explicit_image {
        cfg.out_image = cli.out_dir.join(&image_name);
    }
    if !explicit_css_path {
        cfg.css_path = image_name;
    }
    Ok(cfg)
}

fn gather_items(path: &Path, include: &[String], exclude: &[String]) -> anyhow::Result<ItemSet> {
    // Build glob matchers
    let mut inc_set = None;
    if !include.is_empty() {
        let mut b = GlobSetBuilder::new();
        for pat in include {
            b.add(Glob::new(pat)?);
        }
        inc_set = Some(b.build()?);
    }
    let mut exc_set = None;
    if !exclude.is_empty() {
        let mut b = GlobSetBuilder::new();
        for pat in exclude {
            b.add(Glob::new(pat)?);
        }
        exc_set = Some(b.build()?);
    }
    let mut list: Vec<PathBuf> = Vec::new();
    if path.is_file() {
        if !should_skip(path, inc_set.as_ref(), exc_set.as_ref()) && is_image(path) {
            list.push(path.to_path_buf());
        }
    } else {
        for entry in WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let p = entry.path();
            if p.is_file() && !should_skip(p, inc_set.as_ref(), exc_set.as_ref()) && is_image(p) {
                list.push(p.to_path_buf());
            }
        }
    }

    let mut items = ItemSet::new();
    for p in list {
        let Some(stem) = p.file_stem().and_then(|s| s.to_str()) else {
            warn!(?p, "skip file with non UTF-8 name");
            continue;
        };
        if items.contains(stem) {
            warn!(?p, name = stem, "duplicate sprite name, keeping the first file");
            continue;
        }
        items.insert(stem, p.clone());
    }
    Ok(items)
}

fn should_skip(
    p: &Path,
    include: Option<&globset::GlobSet>,
    exclude: Option<&globset::GlobSet>,
) -> bool {
    let s = p.to_string_lossy().replace('\\', "/");
    if let Some(ex) = exclude {
        if ex.is_match(&s) {
            return true;
        }
    }
    if let Some(inc) = include {
        if !inc.is_match(&s) {
            return true;
        }
    }
    false
}

fn is_image(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase()),
        Some(ext) if matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "gif")
    )
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}

/// Color in a YAML config: `[r, g, b]` or a `#rrggbb` / `r,g,b` string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum YamlColor {
    Rgb([u8; 3]),
    Text(String),
}

#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    out_image: Option<PathBuf>,
    out_css: Option<PathBuf>,
    out_format: Option<String>,
    css_class: Option<String>,
    css_path: Option<String>,
    cell_padding: Option<u32>,
    cell_width: Option<u32>,
    cell_height: Option<u32>,
    background: Option<YamlColor>,
    jpeg_quality: Option<u8>,
}

impl YamlConfig {
    fn into_atlas_config(self, mut cfg: AtlasConfig) -> anyhow::Result<AtlasConfig> {
        if let Some(v) = self.out_image {
            cfg.out_image = v;
        }
        if let Some(v) = self.out_css {
            cfg.out_css = v;
        }
        if let Some(v) = self.out_format {
            cfg.out_format = v
                .parse()
                .map_err(|_| anyhow::anyhow!("unknown out_format: {}", v))?;
        }
        if let Some(v) = self.css_class {
            cfg.css_class = v;
        }
        if let Some(v) = self.css_path {
            cfg.css_path = v;
        }
        if let Some(v) = self.cell_padding {
            cfg.cell_padding = v;
        }
        if let Some(v) = self.cell_width {
            cfg.cell_width = v;
        }
        if let Some(v) = self.cell_height {
            cfg.cell_height = v;
        }
        if let Some(v) = self.background {
            cfg.background = match v {
                YamlColor::Rgb(rgb) => Background(rgb),
                YamlColor::Text(s) => s
                    .parse()
                    .map_err(|e: String| anyhow::anyhow!("invalid background: {}", e))?,
            };
        }
        if let Some(v) = self.jpeg_quality {
            cfg.jpeg_quality = v;
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_overrides_only_given_keys() {
        let y: YamlConfig = serde_yaml::from_str(
            "out_format: png\ncss_class: .language\ncell_width: 48\nbackground: [0, 0, 0]\n",
        )
        .expect("yaml");
        let cfg = y.into_atlas_config(AtlasConfig::default()).expect("merge");
        assert_eq!(cfg.out_format, OutputFormat::Png);
        assert_eq!(cfg.css_class, ".language");
        assert_eq!((cfg.cell_width, cfg.cell_height), (48, 32));
        assert_eq!(cfg.background, Background::BLACK);
        assert_eq!(cfg.jpeg_quality, 85);
    }

    fn pack_args(argv: &[&str]) -> PackArgs {
        match Cli::parse_from(argv).command {
            Commands::Pack(args) => args,
            _ => panic!("expected pack"),
        }
    }

    #[test]
    fn yaml_format_drives_default_image_paths() {
        let args = pack_args(&["sprite-atlas", "pack", "icons"]);
        let y: YamlConfig = serde_yaml::from_str("out_format: png\n").expect("yaml");
        let cfg = merge_config(&args, y).expect("merge");
        assert_eq!(cfg.out_format, OutputFormat::Png);
        assert_eq!(cfg.out_image, Path::new("out").join("sprite.png"));
        assert_eq!(cfg.css_path, "sprite.png");
        assert_eq!(cfg.out_css, Path::new("out").join("sprite.css"));
    }

    #[test]
    fn explicit_paths_survive_yaml_format() {
        let args = pack_args(&[
            "sprite-atlas",
            "pack",
            "icons",
            "--css-path",
            "/static/atlas.jpg",
        ]);
        let y: YamlConfig =
            serde_yaml::from_str("out_format: png\nout_image: build/a.img\n").expect("yaml");
        let cfg = merge_config(&args, y).expect("merge");
        assert_eq!(cfg.out_image, PathBuf::from("build/a.img"));
        assert_eq!(cfg.css_path, "/static/atlas.jpg");
    }

    #[test]
    fn without_yaml_paths_follow_cli_format() {
        let args = pack_args(&["sprite-atlas", "pack", "icons", "--name", "flags"]);
        let cfg = merge_config(&args, YamlConfig::default()).expect("merge");
        assert_eq!(cfg.out_format, OutputFormat::Jpg);
        assert_eq!(cfg.out_image, Path::new("out").join("flags.jpg"));
        assert_eq!(cfg.css_path, "flags.jpg");
    }

    #[test]
    fn yaml_background_accepts_hex_string() {
        let y: YamlConfig = serde_yaml::from_str("background: '#102030'\n").expect("yaml");
        let cfg = y.into_atlas_config(AtlasConfig::default()).expect("merge");
        assert_eq!(cfg.background, Background([0x10, 0x20, 0x30]));
    }

    #[test]
    fn yaml_rejects_unknown_format() {
        let y: YamlConfig = serde_yaml::from_str("out_format: webp\n").expect("yaml");
        assert!(y.into_atlas_config(AtlasConfig::default()).is_err());
    }

    #[test]
    fn only_supported_extensions_are_collected() {
        assert!(is_image(Path::new("a/b/Icon.PNG")));
        assert!(is_image(Path::new("x.jpeg")));
        assert!(is_image(Path::new("x.gif")));
        assert!(!is_image(Path::new("x.bmp")));
        assert!(!is_image(Path::new("x")));
    }
}
