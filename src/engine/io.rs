//! Audio file I/O for the offline host
//!
//! WAV in, WAV out. Files keep their own sample rate; the processor is prepared
//! at whatever rate the file carries, so no resampling happens here.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::engine::buffer::{AudioBuffer, ChannelLayout};
use crate::error::{FxError, Result};

/// Import a WAV file into an AudioBuffer
///
/// Mono files are upmixed to stereo (both channels identical) because the
/// processor only runs stereo.
///
/// # Errors
/// * `FileNotFound` - If the file does not exist
/// * `Wav` - If the file is not a readable WAV file
/// * `UnsupportedFormat` - More than 2 channels or an odd integer bit depth
/// * `InvalidAudio` - The file holds no samples
pub fn import_audio(path: &Path) -> Result<AudioBuffer> {
    if !path.exists() {
        return Err(FxError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels as usize;

    let layout = ChannelLayout::from_count(channels).ok_or_else(|| FxError::UnsupportedFormat {
        format: format!("{}-channel audio (only mono/stereo supported)", channels),
    })?;

    let interleaved = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)?;
    if interleaved.is_empty() {
        return Err(FxError::InvalidAudio {
            reason: "file contains no samples".to_string(),
        });
    }

    let mut buffer = AudioBuffer::from_interleaved(&interleaved, layout, spec.sample_rate)?;
    if layout == ChannelLayout::Mono {
        let mono = buffer.samples[0].clone();
        buffer.samples.push(mono);
    }

    Ok(buffer)
}

/// Export an AudioBuffer to a WAV file
///
/// `bit_depth` selects 16/24-bit integer or 32-bit float output.
pub fn export_audio(buffer: &AudioBuffer, path: &Path, bit_depth: u16) -> Result<()> {
    let spec = WavSpec {
        channels: buffer.channels() as u16,
        sample_rate: buffer.sample_rate,
        bits_per_sample: bit_depth,
        sample_format: if bit_depth == 32 {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    };

    let interleaved = buffer.to_interleaved();
    let mut writer = WavWriter::create(path, spec)?;

    match bit_depth {
        16 => {
            for sample in interleaved {
                let scaled = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
                writer.write_sample(scaled)?;
            }
        }
        24 => {
            for sample in interleaved {
                // 24-bit stored as i32 in hound
                let scaled = (sample * 8388607.0).clamp(-8388608.0, 8388607.0) as i32;
                writer.write_sample(scaled)?;
            }
        }
        32 => {
            for sample in interleaved {
                writer.write_sample(sample)?;
            }
        }
        _ => {
            return Err(FxError::UnsupportedFormat {
                format: format!("{}-bit audio (only 16, 24, 32 supported)", bit_depth),
            });
        }
    }

    writer.finalize()?;
    Ok(())
}

/// Generate a stereo test tone with different frequencies per channel
pub fn generate_stereo_test_tone(
    freq_left: f32,
    freq_right: f32,
    duration_secs: f32,
    sample_rate: u32,
) -> AudioBuffer {
    let num_samples = (duration_secs * sample_rate as f32) as usize;
    let mut buffer =
        AudioBuffer::new(num_samples, ChannelLayout::Stereo).with_sample_rate(sample_rate);

    for (channel, freq) in [freq_left, freq_right].into_iter().enumerate() {
        let angular_freq = 2.0 * std::f32::consts::PI * freq / sample_rate as f32;
        for (i, sample) in buffer.samples[channel].iter_mut().enumerate() {
            *sample = 0.5 * (angular_freq * i as f32).sin();
        }
    }

    buffer
}

/// Read samples from WAV reader and convert to f32
fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    let samples = match sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<std::result::Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = match bits_per_sample {
                8 => 128.0,
                16 => 32768.0,
                24 => 8388608.0,
                32 => 2147483648.0,
                _ => {
                    return Err(FxError::UnsupportedFormat {
                        format: format!("{}-bit integer audio", bits_per_sample),
                    })
                }
            };
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    Ok(samples)
}
