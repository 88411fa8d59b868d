use anyhow::Result;
use serde::Deserialize;
use std::io::Write;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::scoring::scanner::{Corpus, PairScan};

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown tables: corpus overview and best match per pair
    #[default]
    Table,
    /// Every score curve as JSON
    Json,
    /// One `sentence,query,time,score` row per point
    Csv,
}

#[derive(Tabled)]
struct AssetRow {
    #[tabled(rename = "Recording")]
    label: String,
    #[tabled(rename = "Sample rate")]
    sample_rate: u32,
    #[tabled(rename = "Samples")]
    samples: usize,
    #[tabled(rename = "Duration (s)")]
    duration: String,
    #[tabled(rename = "Frames")]
    frames: usize,
}

#[derive(Tabled)]
struct PairRow {
    #[tabled(rename = "Sentence")]
    sentence: String,
    #[tabled(rename = "Query")]
    query: String,
    #[tabled(rename = "Best time (s)")]
    time: String,
    #[tabled(rename = "Best score")]
    score: String,
    #[tabled(rename = "Points")]
    points: usize,
}

pub fn write_report(
    out: &mut dyn Write,
    format: OutputFormat,
    corpus: &Corpus,
    results: &[PairScan],
) -> Result<()> {
    match format {
        OutputFormat::Table => write_tables(out, corpus, results),
        OutputFormat::Json => write_json(out, results),
        OutputFormat::Csv => write_csv(out, results),
    }
}

fn write_tables(out: &mut dyn Write, corpus: &Corpus, results: &[PairScan]) -> Result<()> {
    let assets: Vec<AssetRow> = corpus
        .sentences
        .iter()
        .chain(&corpus.queries)
        .map(|asset| AssetRow {
            label: asset.label().to_string(),
            sample_rate: asset.waveform().sample_rate(),
            samples: asset.waveform().len(),
            duration: format!("{:.3}", asset.waveform().duration()),
            frames: asset.features().num_frames(),
        })
        .collect();

    let pairs: Vec<PairRow> = results
        .iter()
        .map(|pair| {
            let (time, score) = match pair.curve.peak() {
                Some(p) => (format!("{:.3}", p.time), format!("{:.4}", p.score)),
                None => ("-".to_string(), "-".to_string()),
            };
            PairRow {
                sentence: pair.sentence.clone(),
                query: pair.query.clone(),
                time,
                score,
                points: pair.curve.len(),
            }
        })
        .collect();

    writeln!(out, "{}", Table::new(assets).with(Style::markdown()))?;
    writeln!(out)?;
    writeln!(out, "{}", Table::new(pairs).with(Style::markdown()))?;
    Ok(())
}

fn write_json(out: &mut dyn Write, results: &[PairScan]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, results)?;
    writeln!(out)?;
    Ok(())
}

fn write_csv(out: &mut dyn Write, results: &[PairScan]) -> Result<()> {
    writeln!(out, "sentence,query,time,score")?;
    for pair in results {
        for point in pair.curve.points() {
            writeln!(
                out,
                "{},{},{:.4},{}",
                csv_field(&pair.sentence),
                csv_field(&pair.query),
                point.time,
                point.score
            )?;
        }
    }
    Ok(())
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
