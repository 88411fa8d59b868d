use super::spectrogram::Spectrogram;

/// Number of consecutive frequency bins summed into one feature value.
pub const GROUP_SIZE: usize = 16;

/// Frequency-compressed spectrogram.
#[allow(dead_code)]
#[derive(Clone, Debug)]
pub struct FeatureSequence {
    /// Display labels: every 16th source frequency, minus the trailing one.
    /// Never used for scoring.
    pub frequencies: Vec<f64>,
    /// Frame times (s), copied from the source spectrogram
    pub frame_times: Vec<f64>,
    /// One vector per frequency group, each with one summed value per frame.
    /// Indexed `[group][frame]`.
    pub vectors: Vec<Vec<f64>>,
    /// `vectors` transposed to `[frame][group]`
    frames: Vec<Vec<f64>>,
}

impl FeatureSequence {
    pub fn num_groups(&self) -> usize {
        self.vectors.len()
    }

    pub fn num_frames(&self) -> usize {
        self.frame_times.len()
    }

    /// Transposed view indexed `[frame][group]`: one feature vector per time step.
    pub fn frame_major(&self) -> &[Vec<f64>] {
        &self.frames
    }
}

/// Sum the spectrogram's frequency rows in groups of [`GROUP_SIZE`].
///
/// Produces `ceil(bins / 16)` vectors; the last group keeps whatever rows
/// remain past the final full boundary.
pub fn compress(spectrogram: &Spectrogram) -> FeatureSequence {
    let num_frames = spectrogram.num_frames();

    let vectors: Vec<Vec<f64>> = spectrogram
        .power
        .chunks(GROUP_SIZE)
        .map(|rows| {
            let mut sum = vec![0.0f64; num_frames];
            for row in rows {
                for (acc, &value) in sum.iter_mut().zip(row) {
                    *acc += value;
                }
            }
            sum
        })
        .collect();

    let mut frequencies: Vec<f64> = spectrogram
        .frequencies
        .iter()
        .step_by(GROUP_SIZE)
        .copied()
        .collect();
    frequencies.pop();

    let frames = (0..num_frames)
        .map(|frame| vectors.iter().map(|group| group[frame]).collect())
        .collect();

    FeatureSequence {
        frequencies,
        frame_times: spectrogram.frame_times.clone(),
        vectors,
        frames,
    }
}
