//! tikzrender CLI - render TikZ pictures with the installed TeX toolchain

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use tikzrender::pipeline::tool_available;
use tikzrender::{
    Document, Picture, RenderConfig, RenderJob, Renderer, SaveTarget, SvgStrategy, TargetKind,
};

#[derive(Parser)]
#[command(name = "tikzrender")]
#[command(version)]
#[command(about = "Render TikZ pictures to PDF, SVG and LaTeX source", long_about = None)]
struct Cli {
    /// TeX engine to run
    #[arg(long, global = true, env = "TIKZRENDER_ENGINE")]
    engine: Option<String>,

    /// Keep scratch directories for inspection
    #[arg(long, global = true)]
    keep_intermediate: bool,

    /// Convert to SVG through DVI with dvisvgm instead of PDF with pdftocairo
    #[arg(long, global = true)]
    via_dvi: bool,

    /// JSON configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Typeset a picture to PDF
    Pdf {
        /// Picture description (.json) or TikZ body
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output file (input name if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Typeset a picture and convert it to SVG
    Svg {
        /// Picture description (.json) or TikZ body
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output file (input name if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Write standalone LaTeX source
    #[command(alias = "tex")]
    Source {
        /// Picture description (.json) or TikZ body
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Write the tikzpicture environment only
    Fragment {
        /// Picture description (.json) or TikZ body
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Print SVG markup ready to embed in HTML
    Inline {
        /// Picture description (.json) or TikZ body
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },

    /// Save a captioned document
    Document {
        /// Document description (.json)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Write LaTeX source instead of PDF
        #[arg(long)]
        source: bool,
    },

    /// Render many pictures in parallel
    Batch {
        /// Picture descriptions (.json) or TikZ bodies
        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "pdf")]
        format: BatchFormat,

        /// Output directory
        #[arg(long, value_name = "DIR", default_value = ".")]
        out_dir: PathBuf,
    },

    /// Check that the engine and converters are installed
    Check,

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum BatchFormat {
    /// PDF files
    Pdf,
    /// SVG files
    Svg,
    /// Standalone LaTeX source
    Tex,
}

impl From<BatchFormat> for TargetKind {
    fn from(format: BatchFormat) -> Self {
        match format {
            BatchFormat::Pdf => TargetKind::Pdf,
            BatchFormat::Svg => TargetKind::Svg,
            BatchFormat::Tex => TargetKind::Source,
        }
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match build_config(&cli) {
        Ok(config) => run(cli.command, config),
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(command: Commands, config: RenderConfig) -> CliResult {
    match command {
        Commands::Pdf { input, output } => {
            cmd_render(&input, output.as_deref(), TargetKind::Pdf, config)
        }
        Commands::Svg { input, output } => {
            cmd_render(&input, output.as_deref(), TargetKind::Svg, config)
        }
        Commands::Source { input, output } => {
            cmd_source(&input, output.as_deref(), true, config)
        }
        Commands::Fragment { input, output } => {
            cmd_source(&input, output.as_deref(), false, config)
        }
        Commands::Inline { input } => cmd_inline(&input, config),
        Commands::Document {
            input,
            output,
            source,
        } => cmd_document(&input, &output, source, config),
        Commands::Batch {
            inputs,
            format,
            out_dir,
        } => cmd_batch(&inputs, format, &out_dir, config),
        Commands::Check => cmd_check(&config),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    }
}

fn build_config(cli: &Cli) -> Result<RenderConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => RenderConfig::from_json_file(path)?,
        None => RenderConfig::from_env(),
    };

    if let Some(engine) = &cli.engine {
        config.set_engine(engine.as_str());
    }
    if cli.keep_intermediate {
        config.set_delete_intermediate(false);
    }
    if cli.via_dvi {
        config.set_svg_strategy(SvgStrategy::ViaDvi);
    }

    config.validate()?;
    log::debug!("engine {}, svg strategy {:?}", config.engine(), config.svg_strategy());
    Ok(config)
}

/// Read a picture from JSON, or use the file's text as the TikZ body.
fn load_picture(input: &Path) -> Result<Picture, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(input)?;
    if is_json(input) {
        Ok(serde_json::from_str(&text)?)
    } else {
        Ok(Picture::new(text.trim_end()))
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

/// Output name for an input: its stem, inside `dir` when given.
fn default_output(input: &Path, dir: Option<&Path>) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default();
    match dir {
        Some(dir) => dir.join(stem),
        None => PathBuf::from(stem),
    }
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn cmd_render(input: &Path, output: Option<&Path>, kind: TargetKind, config: RenderConfig) -> CliResult {
    let picture = load_picture(input)?;
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output(input, None));
    let target = SaveTarget::of_kind(kind, &output.to_string_lossy());

    let renderer = Renderer::new(config);
    let pb = spinner(&format!("Running {}...", renderer.config().engine()));
    let result = renderer.save(&target, &picture);
    pb.finish_and_clear();

    let path = result?;
    println!("{} {}", "Saved to".green(), path.display());
    Ok(())
}

fn cmd_source(
    input: &Path,
    output: Option<&Path>,
    include_preamble: bool,
    config: RenderConfig,
) -> CliResult {
    let picture = load_picture(input)?;
    let renderer = Renderer::new(config);

    match output {
        Some(path) => {
            let name = path.to_string_lossy();
            let target = if include_preamble {
                SaveTarget::source(name)
            } else {
                SaveTarget::fragment(name)
            };
            let path = renderer.save(&target, &picture)?;
            println!("{} {}", "Saved to".green(), path.display());
        }
        None => print!(
            "{}",
            tikzrender::picture_source(&picture, include_preamble, renderer.workaround_enabled())
        ),
    }

    Ok(())
}

fn cmd_inline(input: &Path, config: RenderConfig) -> CliResult {
    let picture = load_picture(input)?;
    let renderer = Renderer::new(config);
    let svg = renderer.display_svg(&picture)?;
    println!("{}", svg);
    Ok(())
}

fn cmd_document(input: &Path, output: &Path, source: bool, config: RenderConfig) -> CliResult {
    let document: Document = serde_json::from_str(&fs::read_to_string(input)?)?;
    let name = output.to_string_lossy();
    let target = if source {
        SaveTarget::source(name)
    } else {
        SaveTarget::pdf(name)
    };

    let renderer = Renderer::new(config);
    let pb = spinner(&format!("Typesetting {} pictures...", document.len()));
    let result = renderer.save_document(&target, &document);
    pb.finish_and_clear();

    let path = result?;
    println!("{} {}", "Saved to".green(), path.display());
    Ok(())
}

fn cmd_batch(inputs: &[PathBuf], format: BatchFormat, out_dir: &Path, config: RenderConfig) -> CliResult {
    fs::create_dir_all(out_dir)?;

    let kind = TargetKind::from(format);
    let mut jobs = Vec::with_capacity(inputs.len());
    for input in inputs {
        let output = default_output(input, Some(out_dir));
        jobs.push(RenderJob::new(
            SaveTarget::of_kind(kind, &output.to_string_lossy()),
            load_picture(input)?,
        ));
    }

    let renderer = Renderer::new(config);
    let pb = spinner(&format!("Rendering {} pictures...", jobs.len()));
    let results = renderer.save_all(&jobs);
    pb.finish_and_clear();

    let mut failed = 0;
    for (input, result) in inputs.iter().zip(&results) {
        match result {
            Ok(path) => println!("  {} {}", "✓".green(), path.display()),
            Err(e) => {
                failed += 1;
                println!("  {} {}: {}", "✗".red(), input.display(), e);
            }
        }
    }

    println!(
        "\n{} {} rendered, {} failed",
        "Done!".green().bold(),
        results.len() - failed,
        failed
    );

    if failed > 0 {
        return Err(format!("{} of {} pictures failed", failed, results.len()).into());
    }
    Ok(())
}

fn cmd_check(config: &RenderConfig) -> CliResult {
    println!("{}", "Toolchain".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let tools = [
        ("Engine", config.engine(), true),
        (
            "PDF to SVG",
            config.pdf_to_svg.as_str(),
            config.svg_strategy() == SvgStrategy::ViaPdf,
        ),
        (
            "DVI to SVG",
            config.dvi_to_svg.as_str(),
            config.svg_strategy() == SvgStrategy::ViaDvi,
        ),
    ];

    let mut missing = Vec::new();
    for (label, program, required) in tools {
        let status = if tool_available(program) {
            "found".green()
        } else if required {
            missing.push(program);
            "missing".red()
        } else {
            "missing".yellow()
        };
        println!("{}: {} ({})", label.bold(), program, status);
    }

    println!(
        "{}: {:?}",
        "SVG strategy".bold(),
        config.svg_strategy()
    );

    if !missing.is_empty() {
        return Err(format!("required tools not found: {}", missing.join(", ")).into());
    }
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "tikzrender".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("TikZ rendering tool");
    println!();
    println!("License: MIT");
}
