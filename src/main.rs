use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use strokeharvest::core::config::{load_hints, load_page_configs, DetectionConfig};
use strokeharvest::export::TsModuleExporter;
use strokeharvest::pipeline::{export_report, run_extraction, PageSource, PipelineConfig};
use strokeharvest::raster::{PageRenderer, PdfReader, DEFAULT_DPI};
use strokeharvest::retouch::{thicken_labels, RetouchOptions};
use strokeharvest::trace::{SvgTracer, TraceOptions};

#[derive(Parser, Debug)]
#[command(name = "strokeharvest")]
#[command(version, long_about = None)]
#[command(about = "Extract shorthand stroke glyphs from reference textbook pages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Detect strokes on reference pages and crop one image per label
    Extract {
        /// Hint table: { "<page_id>": [{ "label": "P", "x": 800, "y": 1000 }] }
        #[arg(long)]
        hints: PathBuf,

        /// Directory of rendered page images
        #[arg(long, conflicts_with = "pdf", required_unless_present = "pdf")]
        pages: Option<PathBuf>,

        /// Render pages from this PDF instead (page ids are page numbers)
        #[arg(long)]
        pdf: Option<PathBuf>,

        /// Rendering DPI when reading from a PDF
        #[arg(long, default_value_t = DEFAULT_DPI)]
        dpi: u32,

        /// Output directory (default: ./extracted-strokes)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Detection parameters JSON
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Per-page detection parameters: { "<page_id>": { ... } }
        #[arg(long)]
        page_config: Option<PathBuf>,

        /// Pixels added around each crop, overriding the config
        #[arg(long)]
        padding: Option<u32>,

        /// Appended to each label in file names, e.g. _professional
        #[arg(long, default_value = "")]
        suffix: String,

        /// Write detection overlays to <output>/debug
        #[arg(long)]
        debug: bool,

        /// Only print the summary
        #[arg(short, long)]
        quiet: bool,
    },

    /// Render PDF pages to PNG
    Rasterize {
        /// Input PDF file path
        input: PathBuf,

        /// Comma-separated 1-based page numbers (default: all pages)
        #[arg(long, value_delimiter = ',')]
        pages: Vec<usize>,

        /// Rendering DPI
        #[arg(long, default_value_t = DEFAULT_DPI)]
        dpi: u32,

        /// Output directory (default: ./pages)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Trace stroke PNGs to SVG with potrace
    Trace {
        /// Directory of stroke PNGs
        input: PathBuf,

        /// Output directory (default: ./stroke-svgs)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// potrace settings JSON
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Inline traced SVGs into a TypeScript module
    Bundle {
        /// Directory of SVG files
        input: PathBuf,

        /// Output file (default: ./svg-stroke-data.ts)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Darken and thicken heavy strokes in place
    Thicken {
        /// Directory holding <label>.png files
        dir: PathBuf,

        /// Labels to retouch
        #[arg(required = true)]
        labels: Vec<String>,
    },

    /// Show information about a PDF file
    Info {
        /// Input PDF file path
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            hints,
            pages,
            pdf,
            dpi,
            output,
            config,
            page_config,
            padding,
            suffix,
            debug,
            quiet,
        } => {
            let source = match (pages, pdf) {
                (_, Some(path)) => PageSource::Pdf { path, dpi },
                (Some(dir), None) => PageSource::Directory(dir),
                (None, None) => anyhow::bail!("either --pages or --pdf is required"),
            };
            let options = ExtractOptions {
                output,
                config,
                page_config,
                padding,
                suffix,
                debug,
                quiet,
            };
            extract(hints, source, options)
        }
        Commands::Rasterize {
            input,
            pages,
            dpi,
            output,
        } => rasterize(input, pages, dpi, output),
        Commands::Trace {
            input,
            output,
            config,
        } => trace(input, output, config),
        Commands::Bundle { input, output } => bundle(input, output),
        Commands::Thicken { dir, labels } => thicken(dir, labels),
        Commands::Info { input } => show_info(input),
    }
}

struct ExtractOptions {
    output: Option<PathBuf>,
    config: Option<PathBuf>,
    page_config: Option<PathBuf>,
    padding: Option<u32>,
    suffix: String,
    debug: bool,
    quiet: bool,
}

fn extract(hints_path: PathBuf, source: PageSource, options: ExtractOptions) -> Result<()> {
    let ExtractOptions {
        output,
        config: config_path,
        page_config,
        padding,
        suffix,
        debug,
        quiet,
    } = options;

    let hints = load_hints(&hints_path)
        .with_context(|| format!("Failed to load hints: {}", hints_path.display()))?;

    let mut detection = match &config_path {
        Some(path) => DetectionConfig::from_path(path)
            .with_context(|| format!("Failed to load detection config: {}", path.display()))?,
        None => DetectionConfig::default(),
    };
    let mut page_configs = match &page_config {
        Some(path) => load_page_configs(path)
            .with_context(|| format!("Failed to load page configs: {}", path.display()))?,
        None => Default::default(),
    };
    if let Some(padding) = padding {
        detection.padding = padding;
        for page in page_configs.values_mut() {
            page.padding = padding;
        }
    }

    let output_dir = output.unwrap_or_else(|| PathBuf::from("extracted-strokes"));

    if !quiet {
        println!("[*] Hints: {} ({} page(s))", hints_path.display(), hints.len());
        println!("[*] Output: {}", output_dir.display());
    }

    let config = PipelineConfig::new(source, output_dir.clone(), hints)
        .with_detection(detection)
        .with_page_configs(page_configs)
        .with_suffix(suffix)
        .with_debug(debug);

    if !quiet {
        println!("\n[+] Detecting strokes...");
    }

    let report = run_extraction(&config)?;

    if !quiet {
        for page in &report.pages {
            println!(
                "  page {}: {} region(s) detected, {} kept, {} assigned",
                page.page_id, page.detected, page.kept, page.assigned
            );
            if let Some(overlay) = &page.debug_image {
                println!("    [*] debug: {}", overlay.display());
            }
            for missing in &page.unassigned {
                println!("    [!] {}: {}", missing.label, missing.reason.describe());
            }
        }
        println!("\n[+] Writing manifest...");
    }

    export_report(&report, &output_dir)
        .with_context(|| format!("Failed to export to: {}", output_dir.display()))?;

    println!(
        "\n[*] Summary: {}/{} stroke(s) extracted to {}",
        report.manifest.extracted_count,
        report.expected(),
        output_dir.display()
    );

    if !report.is_complete() {
        anyhow::bail!(
            "{} label(s) were not assigned",
            report.manifest.unassigned.len()
        );
    }

    println!("[✓] Done!");
    Ok(())
}

fn rasterize(input: PathBuf, pages: Vec<usize>, dpi: u32, output: Option<PathBuf>) -> Result<()> {
    let reader = PdfReader::new(input.clone())
        .with_context(|| format!("Failed to open PDF: {}", input.display()))?;
    let page_count = reader.page_count()?;

    let pages = if pages.is_empty() {
        (1..=page_count).collect::<Vec<_>>()
    } else {
        pages
    };
    if let Some(bad) = pages.iter().find(|&&p| p == 0 || p > page_count) {
        anyhow::bail!("page {bad} is out of range (1-{page_count})");
    }

    let output_dir = output.unwrap_or_else(|| PathBuf::from("pages"));
    println!("[*] Rendering {} page(s) at {} DPI", pages.len(), dpi);

    let renderer = PageRenderer::new(output_dir, dpi);
    let mut failed = 0;
    for (page, rendered) in pages.iter().zip(renderer.render_pages(&input, &pages)) {
        match rendered {
            Ok(rendered) => println!(
                "  [✓] page {}: {} ({}x{})",
                page,
                rendered.path.display(),
                rendered.width,
                rendered.height
            ),
            Err(e) => {
                eprintln!("  [✗] page {}: {:#}", page, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} page(s) failed to render", failed);
    }
    Ok(())
}

fn trace(input: PathBuf, output: Option<PathBuf>, config: Option<PathBuf>) -> Result<()> {
    let options = match &config {
        Some(path) => TraceOptions::from_path(path)
            .with_context(|| format!("Failed to load trace options: {}", path.display()))?,
        None => TraceOptions::default(),
    };
    let output_dir = output.unwrap_or_else(|| PathBuf::from("stroke-svgs"));
    let work_dir = std::env::temp_dir().join(format!("strokeharvest-trace-{}", std::process::id()));

    println!("[*] Tracing PNGs in {}", input.display());
    let summary = SvgTracer::new(work_dir, output_dir.clone())
        .with_options(options)
        .trace_dir(&input)?;

    for traced in &summary.traced {
        println!("  [✓] {} ({} bytes)", traced.path.display(), traced.bytes);
    }
    for (path, message) in &summary.failed {
        eprintln!("  [✗] {}: {}", path.display(), message);
    }
    println!(
        "\n[*] Summary: {} succeeded, {} failed; SVGs in {}",
        summary.traced.len(),
        summary.failed.len(),
        output_dir.display()
    );

    if !summary.failed.is_empty() {
        anyhow::bail!("{} file(s) failed to trace", summary.failed.len());
    }
    Ok(())
}

fn bundle(input: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let output = output.unwrap_or_else(|| PathBuf::from("svg-stroke-data.ts"));
    let count = TsModuleExporter::new(output.clone()).bundle(&input)?;
    println!("[✓] Bundled {} stroke(s) into {}", count, output.display());
    Ok(())
}

fn thicken(dir: PathBuf, labels: Vec<String>) -> Result<()> {
    let summary = thicken_labels(&dir, &labels, &RetouchOptions::default())?;
    for path in &summary.processed {
        println!("  [✓] {}", path.display());
    }
    for label in &summary.missing {
        eprintln!("  [!] not found: {label}.png");
    }
    println!(
        "\n[*] Summary: {} retouched, {} missing",
        summary.processed.len(),
        summary.missing.len()
    );

    if !summary.missing.is_empty() {
        anyhow::bail!("{} stroke image(s) not found", summary.missing.len());
    }
    Ok(())
}

fn show_info(input: PathBuf) -> Result<()> {
    let reader = PdfReader::new(input.clone())
        .with_context(|| format!("Failed to open PDF: {}", input.display()))?;

    let page_count = reader.page_count()?;

    println!("PDF Information");
    println!("===============");
    println!("File: {}", input.display());
    println!("Pages: {}", page_count);

    Ok(())
}
