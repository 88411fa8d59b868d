use anyhow::{Context, Result};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{self, CodecParameters, CodecType, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::waveform::Waveform;

/// File extensions the corpus loader will try to decode.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["wav", "flac", "mp3", "ogg"];

/// Integer codecs and their native sample width in bits.
const INTEGER_CODECS: &[(CodecType, u32)] = &[
    (codecs::CODEC_TYPE_PCM_S8, 8),
    (codecs::CODEC_TYPE_PCM_U8, 8),
    (codecs::CODEC_TYPE_PCM_S16LE, 16),
    (codecs::CODEC_TYPE_PCM_S16BE, 16),
    (codecs::CODEC_TYPE_PCM_U16LE, 16),
    (codecs::CODEC_TYPE_PCM_U16BE, 16),
    (codecs::CODEC_TYPE_PCM_S24LE, 24),
    (codecs::CODEC_TYPE_PCM_S24BE, 24),
    (codecs::CODEC_TYPE_PCM_U24LE, 24),
    (codecs::CODEC_TYPE_PCM_U24BE, 24),
    (codecs::CODEC_TYPE_PCM_S32LE, 32),
    (codecs::CODEC_TYPE_PCM_S32BE, 32),
    (codecs::CODEC_TYPE_PCM_U32LE, 32),
    (codecs::CODEC_TYPE_PCM_U32BE, 32),
    (codecs::CODEC_TYPE_FLAC, 16),
];

pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Gain that undoes symphonia's float normalisation for integer PCM, so a
/// 16-bit file yields its raw `i16` values. Float and lossy codecs keep 1.0.
fn pcm_full_scale(params: &CodecParameters) -> f32 {
    let native_bits = INTEGER_CODECS
        .iter()
        .find(|(codec, _)| *codec == params.codec)
        .map(|&(_, bits)| bits);

    match native_bits {
        Some(bits) => {
            let bits = params.bits_per_sample.unwrap_or(bits);
            2f32.powi(bits as i32 - 1)
        }
        None => 1.0,
    }
}

/// Average interleaved frames down to one channel.
fn downmix_into(out: &mut Vec<f32>, interleaved: &[f32], channels: usize, gain: f32) {
    if channels == 1 {
        out.extend(interleaved.iter().map(|s| s * gain));
    } else {
        out.extend(
            interleaved
                .chunks(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32 * gain),
        );
    }
}

/// Decode an audio file into a mono waveform.
///
/// Integer PCM comes back at its native scale (a 16-bit WAV spans
/// -32768..32767), matching what a plain WAV reader returns.
pub fn decode_audio(path: &Path) -> Result<Waveform> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open audio file: {}", path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let mut format = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .with_context(|| format!("Failed to probe audio format: {}", path.display()))?
        .format;

    let track = format
        .default_track()
        .filter(|t| t.codec_params.codec != codecs::CODEC_TYPE_NULL)
        .or_else(|| {
            format
                .tracks()
                .iter()
                .find(|t| t.codec_params.codec != codecs::CODEC_TYPE_NULL)
        })
        .with_context(|| format!("No audio track in {}", path.display()))?;

    let track_id = track.id;
    let params = track.codec_params.clone();
    let channels = params.channels.map_or(1, |c| c.count());
    let sample_rate = params
        .sample_rate
        .with_context(|| format!("Unknown sample rate in {}", path.display()))?;
    let gain = pcm_full_scale(&params);

    let mut decoder = symphonia::default::get_codecs()
        .make(&params, &DecoderOptions::default())
        .context("Failed to create audio decoder")?;

    let mut samples: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(e.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(err)) => {
                log::debug!("Skipping undecodable packet in {}: {}", path.display(), err);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let buf = sample_buf.get_or_insert_with(|| {
            SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec())
        });
        buf.copy_interleaved_ref(decoded);
        downmix_into(&mut samples, buf.samples(), channels, gain);
    }

    log::debug!(
        "Decoded {}: {} samples, {}Hz, {:.2}s, gain {}",
        path.display(),
        samples.len(),
        sample_rate,
        samples.len() as f32 / sample_rate as f32,
        gain
    );

    Ok(Waveform::new(sample_rate, samples))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::asset::AudioAsset;
    use crate::scoring::correlation::score_at;
    use crate::test_util::noise;

    fn write_wav(path: &Path, channels: u16, sample_rate: u32, frames: &[Vec<i16>]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for frame in frames {
            for &s in frame {
                writer.write_sample(s).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    fn noise_i16(seed: u64, n: usize) -> Vec<i16> {
        noise(seed, n).iter().map(|s| (s * 20000.0) as i16).collect()
    }

    #[test]
    fn decodes_mono_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let frames: Vec<Vec<i16>> = (0..1600).map(|i| vec![(i % 100) as i16 * 100]).collect();
        write_wav(&path, 1, 16000, &frames);

        let waveform = decode_audio(&path).unwrap();
        assert_eq!(waveform.sample_rate(), 16000);
        assert_eq!(waveform.len(), 1600);
    }

    #[test]
    fn int16_keeps_native_scale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scale.wav");
        let raw: Vec<i16> = vec![0, 1, -1, 32767, -32768, 12345, -20000];
        let frames: Vec<Vec<i16>> = raw.iter().map(|&s| vec![s]).collect();
        write_wav(&path, 1, 16000, &frames);

        let waveform = decode_audio(&path).unwrap();
        let expected: Vec<f32> = raw.iter().map(|&s| s as f32).collect();
        assert_eq!(waveform.samples(), expected.as_slice());
    }

    #[test]
    fn decoded_wav_scores_like_raw_integers() {
        let dir = tempfile::tempdir().unwrap();
        let sentence_raw = noise_i16(11, 8000);
        // A near-silent stretch where the group sums are most scale sensitive
        let mut query_raw = sentence_raw[800..4000].to_vec();
        for (i, s) in query_raw.iter_mut().enumerate().take(1200) {
            *s = if i % 2 == 0 { 1 } else { -1 };
        }

        let sentence_path = dir.path().join("sentence.wav");
        let query_path = dir.path().join("q1.wav");
        let as_frames = |raw: &[i16]| raw.iter().map(|&s| vec![s]).collect::<Vec<_>>();
        write_wav(&sentence_path, 1, 16000, &as_frames(&sentence_raw[..]));
        write_wav(&query_path, 1, 16000, &as_frames(&query_raw[..]));

        let from_file =
            |path: &Path| AudioAsset::create("f", decode_audio(path).unwrap()).unwrap();
        let from_raw = |raw: &[i16]| {
            let samples = raw.iter().map(|&s| s as f32).collect();
            AudioAsset::create("r", Waveform::new(16000, samples)).unwrap()
        };

        let sentence_file = from_file(sentence_path.as_path());
        let query_file = from_file(query_path.as_path());
        let sentence_int = from_raw(&sentence_raw[..]);
        let query_int = from_raw(&query_raw[..]);

        for offset in [0, 3, 5, 20] {
            let decoded = score_at(&query_file, &sentence_file, offset).unwrap();
            let raw = score_at(&query_int, &sentence_int, offset).unwrap();
            assert!(
                (decoded - raw).abs() < 1e-9,
                "offset {}: {} vs {}",
                offset,
                decoded,
                raw
            );
        }
    }

    #[test]
    fn downmixes_stereo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let frames: Vec<Vec<i16>> = (0..800).map(|_| vec![16384, -16384]).collect();
        write_wav(&path, 2, 8000, &frames);

        let waveform = decode_audio(&path).unwrap();
        assert_eq!(waveform.len(), 800);
        assert!(waveform.samples().iter().all(|s| s.abs() < 1e-3));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = decode_audio(Path::new("/nonexistent/q1.wav")).unwrap_err();
        assert!(err.to_string().contains("q1.wav"));
    }

    #[test]
    fn supported_extensions() {
        assert!(is_supported(Path::new("a.wav")));
        assert!(is_supported(Path::new("a.WAV")));
        assert!(is_supported(Path::new("b.flac")));
        assert!(!is_supported(Path::new("notes.txt")));
        assert!(!is_supported(Path::new("README")));
    }
}
