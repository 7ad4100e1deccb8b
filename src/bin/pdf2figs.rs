//! CLI binary for pdf2figs.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig`, drives a batch of PDFs concurrently, and prints
//! results.

use anyhow::{bail, Context, Result};
use clap::Parser;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use pdf2figs::{
    collect_figures, extract, CommandCaptionTool, CommandFigureDetector, ExtractionConfig,
    ServiceDirs,
};
use std::collections::HashSet;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

/// First free variant of `name` among `taken`: the name itself, then
/// `{stem}-1.{ext}`, `{stem}-2.{ext}`, and so on.
fn unique_upload_name(name: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(name) {
        return name.to_string();
    }
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) => (stem, Some(ext)),
        None => (name, None),
    };
    let mut n = 1u32;
    loop {
        let candidate = match ext {
            Some(ext) => format!("{stem}-{n}.{ext}"),
            None => format!("{stem}-{n}"),
        };
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract figures from one paper
  pdf2figs paper.pdf --caption-cmd pdffigures2 --detector-cmd deepfigures-detect

  # A batch of papers, four at a time
  pdf2figs papers/*.pdf -c 4 --caption-cmd pdffigures2 --detector-cmd deepfigures-detect

  # Custom resolutions (coordinate scaling follows automatically)
  pdf2figs paper.pdf --detection-dpi 72 --crop-dpi 300 \
      --caption-cmd pdffigures2 --detector-cmd deepfigures-detect

  # Machine-readable summary
  pdf2figs --json paper.pdf --caption-cmd pdffigures2 --detector-cmd deepfigures-detect

DIRECTORY LAYOUT:
  {upload-dir}/                     incoming PDF copies
  {output-dir}/{sha1}/              per-PDF workspace
      {name}.pdf                    staged copy
      page-renderings/              rasters at both DPIs
      pdffigures-output/            raw caption-tool document
      deepfigures-output/           detector JSON
      figure-images/                crops + figures.json
  {final-dir}/{sha1}/               collected figure images

BACKEND CONTRACTS:
  caption-cmd  is invoked as:  CMD <pdf> <output-dir>
               and must write  {output-dir}/{pdf-stem}.json
  detector-cmd is invoked as:  CMD <pdf> <renderings-dir> <captions-json> <output-dir>
               and must write  {output-dir}/figures.json
"#;

/// Extract figures, tables, and captions from scientific PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2figs",
    version,
    about = "Extract figures, tables, and captions from scientific PDFs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF files to process.
    #[arg(required = true)]
    pdfs: Vec<PathBuf>,

    /// Directory receiving a copy of each incoming PDF.
    #[arg(long, env = "PDF2FIGS_UPLOAD_DIR", default_value = "uploads")]
    upload_dir: PathBuf,

    /// Parent directory for per-PDF workspaces.
    #[arg(short, long, env = "PDF2FIGS_OUTPUT_DIR", default_value = "output")]
    output_dir: PathBuf,

    /// Directory collecting the finished figure images.
    #[arg(long, env = "PDF2FIGS_FINAL_DIR", default_value = "processed-images")]
    final_dir: PathBuf,

    /// DPI of the low-resolution rendering used for detection.
    #[arg(long, env = "PDF2FIGS_DETECTION_DPI", default_value_t = 100)]
    detection_dpi: u32,

    /// DPI of the high-resolution rendering used for cropping.
    #[arg(long, env = "PDF2FIGS_CROP_DPI", default_value_t = 200)]
    crop_dpi: u32,

    /// Caption/figure-location tool command.
    #[arg(long, env = "PDF2FIGS_CAPTION_CMD")]
    caption_cmd: PathBuf,

    /// Learned figure-detector command.
    #[arg(long, env = "PDF2FIGS_DETECTOR_CMD")]
    detector_cmd: PathBuf,

    /// Number of PDFs processed concurrently.
    #[arg(short, long, env = "PDF2FIGS_CONCURRENCY", default_value_t = 2)]
    concurrency: usize,

    /// Output a structured JSON summary instead of human-readable lines.
    #[arg(long, env = "PDF2FIGS_JSON")]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "PDF2FIGS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2FIGS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2FIGS_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides the feedback that matters.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Directories & config ─────────────────────────────────────────────
    let dirs = ServiceDirs::new(&cli.upload_dir, &cli.output_dir, &cli.final_dir);
    dirs.create_all().context("Failed to create directories")?;

    let config = ExtractionConfig::builder()
        .detection_dpi(cli.detection_dpi)
        .crop_dpi(cli.crop_dpi)
        .caption_tool(std::sync::Arc::new(CommandCaptionTool::new(
            &cli.caption_cmd,
        )))
        .detector(std::sync::Arc::new(CommandFigureDetector::new(
            &cli.detector_cmd,
        )))
        .build()
        .context("Invalid configuration")?;

    // ── Stage inputs into the upload directory ───────────────────────────
    // The pipeline runs against these copies, matching the service layout
    // where extraction never reads caller-owned paths. Inputs from
    // different directories may share a bare filename, so colliding names
    // get a numeric suffix instead of overwriting each other.
    let mut staged = Vec::with_capacity(cli.pdfs.len());
    let mut taken = HashSet::new();
    for pdf in &cli.pdfs {
        let name = pdf
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("Input has no file name: {}", pdf.display()))?;
        let unique = unique_upload_name(&name, &taken);
        if unique != name {
            warn!(
                "Upload name collision: staging {} as {unique}",
                pdf.display()
            );
        }
        taken.insert(unique.clone());
        let upload_copy = dirs.upload_dir.join(&unique);
        std::fs::copy(pdf, &upload_copy)
            .with_context(|| format!("Failed to copy {} into upload dir", pdf.display()))?;
        staged.push(upload_copy);
    }

    // ── Progress bar ─────────────────────────────────────────────────────
    let bar = if show_progress {
        let bar = ProgressBar::new(staged.len() as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} PDFs  ⏱ {elapsed_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        bar.set_prefix("Extracting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    } else {
        None
    };

    // ── Run the batch ────────────────────────────────────────────────────
    let results: Vec<_> = stream::iter(staged.iter().cloned().map(|pdf| {
        let config = config.clone();
        let output_dir = dirs.output_dir.clone();
        let final_dir = dirs.final_dir.clone();
        let bar = bar.clone();
        async move {
            let result = extract(&pdf, &output_dir, &config).await.and_then(|ex| {
                let collected = collect_figures(&ex, &final_dir)?;
                Ok((ex, collected))
            });
            if let Some(ref bar) = bar {
                match &result {
                    Ok((ex, collected)) => bar.println(format!(
                        "  {} {}  {}  {}",
                        green("✓"),
                        pdf.display(),
                        bold(&format!("{} figures", collected.len())),
                        dim(&format!(
                            "{} skipped, {}ms",
                            ex.stats.figures_skipped, ex.stats.total_duration_ms
                        )),
                    )),
                    Err(e) => bar.println(format!("  {} {}  {}", red("✗"), pdf.display(), red(&e.to_string()))),
                }
                bar.inc(1);
            }
            (pdf, result)
        }
    }))
    .buffer_unordered(cli.concurrency.max(1))
    .collect()
    .await;

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    // ── Summaries ────────────────────────────────────────────────────────
    let failed = results.iter().filter(|(_, r)| r.is_err()).count();
    let succeeded = results.len() - failed;

    if cli.json {
        let summary: Vec<serde_json::Value> = results
            .iter()
            .map(|(pdf, result)| match result {
                Ok((ex, collected)) => serde_json::json!({
                    "input": pdf,
                    "identity": ex.identity,
                    "workspace": ex.workspace.root,
                    "figures": collected,
                    "result": ex.result,
                    "skipped": ex.skipped,
                    "stats": ex.stats,
                }),
                Err(e) => serde_json::json!({
                    "input": pdf,
                    "error": e.to_string(),
                }),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if !cli.quiet {
        if failed == 0 {
            eprintln!(
                "{} {} PDFs extracted successfully",
                green("✔"),
                bold(&succeeded.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} PDFs extracted  ({} failed)",
                red("✘"),
                bold(&succeeded.to_string()),
                results.len(),
                red(&failed.to_string()),
            );
        }
    }

    if succeeded == 0 {
        bail!("All {} PDFs failed", results.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_name_is_kept_verbatim() {
        let taken = HashSet::new();
        assert_eq!(unique_upload_name("paper.pdf", &taken), "paper.pdf");
    }

    #[test]
    fn colliding_names_get_numeric_suffixes() {
        let mut taken = HashSet::new();
        taken.insert("paper.pdf".to_string());
        assert_eq!(unique_upload_name("paper.pdf", &taken), "paper-1.pdf");
        taken.insert("paper-1.pdf".to_string());
        assert_eq!(unique_upload_name("paper.pdf", &taken), "paper-2.pdf");
    }

    #[test]
    fn extensionless_names_still_disambiguate() {
        let mut taken = HashSet::new();
        taken.insert("paper".to_string());
        assert_eq!(unique_upload_name("paper", &taken), "paper-1");
    }
}
