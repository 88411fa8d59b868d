use anyhow::{bail, Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::correlation::score_at;
use crate::audio::asset::AudioAsset;
use crate::audio::decode::{decode_audio, is_supported};
use crate::audio::labels::LabelResolver;
use crate::audio::spectrogram::AnalysisParams;
use crate::error::{AnalysisError, AnalysisResult};

/// Stride used when the caller does not pick one: every 5th target frame.
pub const DEFAULT_STRIDE: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ScorePoint {
    /// Target frame time in seconds
    pub time: f64,
    pub score: f64,
}

/// Scores of one query over one target, in increasing time order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ScoreCurve {
    points: Vec<ScorePoint>,
}

impl ScoreCurve {
    pub fn points(&self) -> &[ScorePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Highest-scoring point, ignoring undefined scores.
    pub fn peak(&self) -> Option<ScorePoint> {
        self.points
            .iter()
            .filter(|p| !p.score.is_nan())
            .copied()
            .max_by(|a, b| a.score.total_cmp(&b.score))
    }
}

/// Slide `query` over `target`, scoring every `stride`-th target frame.
///
/// Offsets where the query does not fit are skipped.
pub fn scan(
    target: &AudioAsset,
    query: &AudioAsset,
    stride: usize,
) -> AnalysisResult<ScoreCurve> {
    if stride == 0 {
        return Err(AnalysisError::InvalidStride(stride));
    }

    let times = &target.features().frame_times;

    let offsets: Vec<usize> = (0..times.len()).step_by(stride).collect();
    let points: Vec<ScorePoint> = offsets
        .into_par_iter()
        .filter_map(|i| {
            score_at(query, target, i as isize).map(|score| ScorePoint {
                time: times[i],
                score,
            })
        })
        .collect();

    Ok(ScoreCurve { points })
}

/// All sentence and query recordings for one run.
#[derive(Clone, Debug)]
pub struct Corpus {
    pub sentences: Vec<AudioAsset>,
    pub queries: Vec<AudioAsset>,
}

#[derive(Clone, Debug, Serialize)]
pub struct PairScan {
    pub sentence: String,
    pub query: String,
    pub curve: ScoreCurve,
}

impl Corpus {
    #[allow(dead_code)]
    pub fn from_assets(sentences: Vec<AudioAsset>, queries: Vec<AudioAsset>) -> Self {
        Self { sentences, queries }
    }

    pub fn load(
        sentences_dir: &Path,
        queries_dir: &Path,
        params: &AnalysisParams,
        labels: &dyn LabelResolver,
    ) -> Result<Self> {
        let sentences = load_dir(sentences_dir, params, labels)
            .with_context(|| format!("Failed to load sentences from {}", sentences_dir.display()))?;
        let queries = load_dir(queries_dir, params, labels)
            .with_context(|| format!("Failed to load queries from {}", queries_dir.display()))?;

        log::info!(
            "Loaded {} sentences and {} queries",
            sentences.len(),
            queries.len()
        );
        Ok(Self { sentences, queries })
    }

    pub fn pair_count(&self) -> usize {
        self.sentences.len() * self.queries.len()
    }
}

/// Scan every query over every sentence. Sentences are the outer loop.
#[allow(dead_code)]
pub fn scan_corpus(corpus: &Corpus, stride: usize) -> AnalysisResult<Vec<PairScan>> {
    scan_corpus_with(corpus, stride, |_| {})
}

/// Like [`scan_corpus`], calling `on_pair` after each pair finishes.
pub fn scan_corpus_with<F>(
    corpus: &Corpus,
    stride: usize,
    mut on_pair: F,
) -> AnalysisResult<Vec<PairScan>>
where
    F: FnMut(&PairScan),
{
    let mut results = Vec::with_capacity(corpus.pair_count());
    for sentence in &corpus.sentences {
        for query in &corpus.queries {
            let curve = scan(sentence, query, stride)?;
            let pair = PairScan {
                sentence: sentence.label().to_string(),
                query: query.label().to_string(),
                curve,
            };
            log::debug!(
                "Scanned '{}' in '{}': {} points",
                pair.query,
                pair.sentence,
                pair.curve.len()
            );
            on_pair(&pair);
            results.push(pair);
        }
    }
    Ok(results)
}

fn load_dir(
    dir: &Path,
    params: &AnalysisParams,
    labels: &dyn LabelResolver,
) -> Result<Vec<AudioAsset>> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if is_supported(&path) {
            paths.push(path);
        } else {
            log::debug!("Skipping non-audio file {}", path.display());
        }
    }
    paths.sort();

    if paths.is_empty() {
        bail!("No audio files found in {}", dir.display());
    }

    paths
        .par_iter()
        .map(|path| -> Result<AudioAsset> {
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .with_context(|| format!("Invalid file name: {}", path.display()))?;
            let waveform = decode_audio(path)?;
            let asset = AudioAsset::with_params(labels.label(file_name), waveform, params)
                .with_context(|| format!("Failed to analyze {}", path.display()))?;
            log::debug!(
                "{} -> '{}': {} frames x {} groups",
                file_name,
                asset.label(),
                asset.features().num_frames(),
                asset.features().num_groups()
            );
            Ok(asset)
        })
        .collect()
}
