mod audio;
mod cli;
mod config;
mod error;
mod report;
mod scoring;
#[cfg(test)]
mod test_util;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;

use audio::labels::{parse_label_args, LabelOverrides};
use audio::spectrogram::AnalysisParams;
use cli::Cli;
use report::OutputFormat;
use scoring::scanner::{scan_corpus_with, Corpus, DEFAULT_STRIDE};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();
    let mut params = AnalysisParams::default();
    let mut labels = LabelOverrides::default();

    if let Some(ref path) = config::find_config(cli.config.clone()) {
        if let Some(cfg) = config::load_config(path) {
            log::info!("Loaded config from {}", path.display());
            // Merge: config values apply only when CLI is at its default
            if cli.stride == DEFAULT_STRIDE { cli.stride = cfg.scan.stride; }
            if cli.format == OutputFormat::Table { cli.format = cfg.output.format; }
            params = cfg.analysis;
            for (file, label) in cfg.labels {
                labels.insert(file, label);
            }
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }
    for (file, label) in parse_label_args(&cli.labels) {
        labels.insert(file, label);
    }

    for dir in [&cli.sentences, &cli.queries] {
        if !dir.is_dir() {
            anyhow::bail!("Not a directory: {}", dir.display());
        }
    }

    log::info!("wordspot - keyword spotting by spectral correlation");
    log::info!("Sentences: {}", cli.sentences.display());
    log::info!("Queries: {}", cli.queries.display());
    log::info!(
        "Frames: {}ms / hop {}ms, FFT {}, stride {}",
        params.frame_ms, params.hop_ms, params.nfft, cli.stride
    );
    if !labels.is_empty() {
        log::info!("Label overrides: {}", labels.len());
    }

    // 1. Decode and analyze every recording
    log::info!("Loading corpus...");
    let corpus = Corpus::load(&cli.sentences, &cli.queries, &params, &labels)?;

    // 2. Scan each query across each sentence
    log::info!("Scanning {} sentence/query pairs...", corpus.pair_count());
    let pb = ProgressBar::new(corpus.pair_count() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} pairs ({eta} remaining)")
            .context("Invalid progress bar template")?
            .progress_chars("=>-"),
    );
    let results = scan_corpus_with(&corpus, cli.stride, |_| pb.inc(1))?;
    pb.finish_with_message("Scan complete");

    // 3. Report
    match cli.output {
        Some(ref path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            let mut writer = std::io::BufWriter::new(file);
            report::write_report(&mut writer, cli.format, &corpus, &results)?;
            writer.flush()?;
            log::info!("Done! Output: {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            report::write_report(&mut lock, cli.format, &corpus, &results)?;
        }
    }

    Ok(())
}
