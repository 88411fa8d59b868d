pub mod asset;
pub mod decode;
pub mod features;
pub mod labels;
pub mod spectrogram;
pub mod waveform;
