use rustfft::{num_complex::Complex, FftPlanner};
use serde::Deserialize;

use super::waveform::Waveform;
use crate::error::{AnalysisError, AnalysisResult};

/// Floor added to power before taking the log so silent bins stay finite.
const LOG_EPSILON: f64 = 1e-20;

/// STFT framing parameters.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct AnalysisParams {
    /// Frame duration in milliseconds
    #[serde(default = "default_frame_ms")]
    pub frame_ms: f64,
    /// Hop between frame starts in milliseconds
    #[serde(default = "default_hop_ms")]
    pub hop_ms: f64,
    /// FFT size; frames shorter than this are zero-padded
    #[serde(default = "default_nfft")]
    pub nfft: usize,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            frame_ms: default_frame_ms(),
            hop_ms: default_hop_ms(),
            nfft: default_nfft(),
        }
    }
}

fn default_frame_ms() -> f64 { 25.0 }
fn default_hop_ms() -> f64 { 10.0 }
fn default_nfft() -> usize { 512 }

impl AnalysisParams {
    pub fn frame_length(&self, sample_rate: u32) -> usize {
        (self.frame_ms * 1e-3 * sample_rate as f64).round() as usize
    }

    pub fn hop_length(&self, sample_rate: u32) -> usize {
        (self.hop_ms * 1e-3 * sample_rate as f64).round() as usize
    }
}

/// Log-power time-frequency representation.
///
/// `power` is indexed `[frequency_bin][frame]`.
#[derive(Clone, Debug)]
pub struct Spectrogram {
    pub frequencies: Vec<f64>,
    pub frame_times: Vec<f64>,
    pub power: Vec<Vec<f64>>,
}

impl Spectrogram {
    #[allow(dead_code)]
    pub fn num_bins(&self) -> usize {
        self.frequencies.len()
    }

    pub fn num_frames(&self) -> usize {
        self.frame_times.len()
    }
}

/// One-sided PSD spectrogram with a periodic Hamming window, per-segment
/// mean removal and density scaling, converted to `10 * log10(p + 1e-20)`.
pub fn build(waveform: &Waveform, params: &AnalysisParams) -> AnalysisResult<Spectrogram> {
    let sample_rate = waveform.sample_rate();
    if sample_rate == 0 {
        return Err(AnalysisError::InvalidInput("sample rate must be positive".into()));
    }
    if waveform.is_empty() {
        return Err(AnalysisError::InvalidInput("waveform is empty".into()));
    }

    let frame_len = params.frame_length(sample_rate);
    let hop = params.hop_length(sample_rate);
    let nfft = params.nfft;

    if frame_len == 0 || hop == 0 {
        return Err(AnalysisError::InvalidInput(format!(
            "frame/hop length rounds to zero at {}Hz",
            sample_rate
        )));
    }
    if frame_len > nfft {
        return Err(AnalysisError::InvalidInput(format!(
            "frame length {} exceeds FFT size {}",
            frame_len, nfft
        )));
    }

    let samples = waveform.samples();
    if samples.len() < frame_len {
        return Err(AnalysisError::InvalidInput(format!(
            "waveform has {} samples, shorter than one {}-sample frame",
            samples.len(),
            frame_len
        )));
    }

    let num_frames = (samples.len() - frame_len) / hop + 1;
    let num_bins = nfft / 2 + 1;
    let sr = sample_rate as f64;

    let window = hamming_window(frame_len);
    let window_power: f64 = window.iter().map(|w| w * w).sum();
    let scale = 1.0 / (sr * window_power);

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(nfft);

    let mut power = vec![vec![0.0f64; num_frames]; num_bins];
    let mut buffer = vec![Complex::new(0.0f64, 0.0); nfft];

    for frame_idx in 0..num_frames {
        let start = frame_idx * hop;
        let segment = &samples[start..start + frame_len];
        let mean = segment.iter().map(|&s| s as f64).sum::<f64>() / frame_len as f64;

        for (i, slot) in buffer.iter_mut().enumerate() {
            *slot = if i < frame_len {
                Complex::new((segment[i] as f64 - mean) * window[i], 0.0)
            } else {
                Complex::new(0.0, 0.0)
            };
        }
        fft.process(&mut buffer);

        for (bin, row) in power.iter_mut().enumerate() {
            let mut p = buffer[bin].norm_sqr() * scale;
            let is_nyquist = nfft % 2 == 0 && bin == num_bins - 1;
            if bin != 0 && !is_nyquist {
                p *= 2.0;
            }
            row[frame_idx] = 10.0 * (p + LOG_EPSILON).log10();
        }
    }

    let frequencies = (0..num_bins).map(|k| k as f64 * sr / nfft as f64).collect();
    let half = frame_len as f64 / 2.0;
    let frame_times = (0..num_frames)
        .map(|k| (half + (k * hop) as f64) / sr)
        .collect();

    Ok(Spectrogram {
        frequencies,
        frame_times,
        power,
    })
}

/// Periodic Hamming window, the DFT-even variant used for spectral analysis.
fn hamming_window(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 0.54 - 0.46 * (2.0 * std::f64::consts::PI * i as f64 / size as f64).cos())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freq: f32, sample_rate: u32, seconds: f32) -> Waveform {
        let n = (sample_rate as f32 * seconds) as usize;
        let samples = (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect();
        Waveform::new(sample_rate, samples)
    }

    fn stft_frames(num_samples: usize, frame_len: usize, hop: usize) -> usize {
        (num_samples - frame_len) / hop + 1
    }

    #[test]
    fn frame_count_matches_stft_formula() {
        let params = AnalysisParams::default();
        for seconds in [1.0f32, 0.5] {
            let wave = tone(440.0, 16000, seconds);
            let spec = build(&wave, &params).unwrap();
            assert_eq!(params.frame_length(16000), 400);
            assert_eq!(params.hop_length(16000), 160);
            assert_eq!(spec.num_frames(), stft_frames(wave.len(), 400, 160));
        }
        assert_eq!(build(&tone(440.0, 16000, 1.0), &params).unwrap().num_frames(), 98);
        assert_eq!(build(&tone(440.0, 16000, 0.5), &params).unwrap().num_frames(), 48);
    }

    #[test]
    fn bins_and_times() {
        let spec = build(&tone(440.0, 16000, 0.5), &AnalysisParams::default()).unwrap();
        assert_eq!(spec.num_bins(), 257);
        assert_eq!(spec.power.len(), 257);
        assert!(spec.power.iter().all(|row| row.len() == spec.num_frames()));
        assert_eq!(spec.frequencies[0], 0.0);
        assert!((spec.frequencies[1] - 31.25).abs() < 1e-9);
        assert!((spec.frequencies[256] - 8000.0).abs() < 1e-9);
        assert!((spec.frame_times[0] - 0.0125).abs() < 1e-12);
        assert!((spec.frame_times[1] - 0.0225).abs() < 1e-12);
    }

    #[test]
    fn tone_peaks_at_its_bin() {
        // 1000 Hz sits exactly on bin 32 at 16 kHz / 512
        let spec = build(&tone(1000.0, 16000, 0.2), &AnalysisParams::default()).unwrap();
        for frame in 0..spec.num_frames() {
            let peak = (0..spec.num_bins())
                .max_by(|&a, &b| spec.power[a][frame].total_cmp(&spec.power[b][frame]))
                .unwrap();
            assert_eq!(peak, 32);
        }
    }

    #[test]
    fn silence_hits_log_floor() {
        let wave = Waveform::new(16000, vec![0.0; 1600]);
        let spec = build(&wave, &AnalysisParams::default()).unwrap();
        assert!(spec
            .power
            .iter()
            .flatten()
            .all(|&p| (p + 200.0).abs() < 1e-9));
    }

    #[test]
    fn dc_offset_is_removed_per_segment() {
        for level in [0.3f32, 1234.0] {
            let wave = Waveform::new(16000, vec![level; 1600]);
            let spec = build(&wave, &AnalysisParams::default()).unwrap();
            let max = spec.power.iter().flatten().copied().fold(f64::MIN, f64::max);
            assert!((max + 200.0).abs() < 1e-9, "level {}: max {}", level, max);
        }
    }

    /// `|X|^2 / (fs * sum(w^2))`, the density-scaled power of one bin.
    fn density(amplitude_at_bin: f64, window: &[f64], sample_rate: f64) -> f64 {
        let sum_w: f64 = window.iter().sum();
        let sum_w2: f64 = window.iter().map(|w| w * w).sum();
        (amplitude_at_bin * sum_w).powi(2) / (sample_rate * sum_w2)
    }

    #[test]
    fn sine_peak_matches_one_sided_density() {
        let amplitude = 0.5;
        let samples = (0..3200)
            .map(|i| {
                let phase = 2.0 * std::f64::consts::PI * 1000.0 * i as f64 / 16000.0;
                (amplitude * phase.sin()) as f32
            })
            .collect();
        let spec = build(&Waveform::new(16000, samples), &AnalysisParams::default()).unwrap();

        // Half the amplitude lands on +f; the one-sided spectrum doubles it
        let window = hamming_window(400);
        let expected = 10.0 * (2.0 * density(amplitude / 2.0, &window, 16000.0)).log10();
        assert!(
            (spec.power[32][0] - expected).abs() < 1e-4,
            "peak {} expected {}",
            spec.power[32][0],
            expected
        );
    }

    #[test]
    fn nyquist_bin_is_not_doubled() {
        let amplitude = 0.5;
        let samples = (0..1600)
            .map(|i| if i % 2 == 0 { amplitude } else { -amplitude })
            .collect();
        let spec = build(&Waveform::new(16000, samples), &AnalysisParams::default()).unwrap();

        let window = hamming_window(400);
        let expected = 10.0 * density(amplitude as f64, &window, 16000.0).log10();
        for frame in 0..spec.num_frames() {
            assert!((spec.power[256][frame] - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn rejects_invalid_input() {
        let params = AnalysisParams::default();
        assert!(matches!(
            build(&Waveform::new(16000, vec![]), &params),
            Err(AnalysisError::InvalidInput(_))
        ));
        assert!(matches!(
            build(&Waveform::new(0, vec![0.1; 1000]), &params),
            Err(AnalysisError::InvalidInput(_))
        ));
        assert!(matches!(
            build(&Waveform::new(16000, vec![0.1; 100]), &params),
            Err(AnalysisError::InvalidInput(_))
        ));
        // 25 ms at 48 kHz is 1200 samples, larger than a 512-point FFT
        assert!(matches!(
            build(&Waveform::new(48000, vec![0.1; 48000]), &params),
            Err(AnalysisError::InvalidInput(_))
        ));
    }

    #[test]
    fn hamming_is_periodic() {
        let w = hamming_window(8);
        assert!((w[0] - 0.08).abs() < 1e-12);
        assert!((w[4] - 1.0).abs() < 1e-12);
        assert!((w[1] - w[7]).abs() < 1e-12);
    }
}
