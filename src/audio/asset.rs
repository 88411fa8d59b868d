use super::features::{self, FeatureSequence};
use super::spectrogram::{self, AnalysisParams, Spectrogram};
use super::waveform::Waveform;
use crate::error::AnalysisResult;

/// One recording together with its derived spectrogram and feature sequence.
///
/// Everything is computed at construction and never changes afterwards.
#[derive(Clone, Debug)]
pub struct AudioAsset {
    label: String,
    waveform: Waveform,
    spectrogram: Spectrogram,
    features: FeatureSequence,
}

impl AudioAsset {
    pub fn create(label: impl Into<String>, waveform: Waveform) -> AnalysisResult<Self> {
        Self::with_params(label, waveform, &AnalysisParams::default())
    }

    pub fn with_params(
        label: impl Into<String>,
        waveform: Waveform,
        params: &AnalysisParams,
    ) -> AnalysisResult<Self> {
        let spectrogram = spectrogram::build(&waveform, params)?;
        let features = features::compress(&spectrogram);
        Ok(Self {
            label: label.into(),
            waveform,
            spectrogram,
            features,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn waveform(&self) -> &Waveform {
        &self.waveform
    }

    #[allow(dead_code)]
    pub fn spectrogram(&self) -> &Spectrogram {
        &self.spectrogram
    }

    pub fn features(&self) -> &FeatureSequence {
        &self.features
    }
}
