//! Offline rendering of a preset into a 16-bit WAV file.
//!
//! Renders are always WAV whatever the source container. Only the decoder
//! side of rodio is available here, and the device plays WAV like any other
//! source, so the rendition does not keep the source extension.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use biquad::{Biquad, Coefficients, DirectForm1, ToHertz, Type};
use rodio::{Decoder, Source};

use super::ShapingError;
use super::preset::{FilterKind, Preset, Shape, db_to_gain};

/// Interleaved PCM decoded from a source file.
pub(super) struct Pcm {
    pub channels: u16,
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

pub(super) fn decode(source: &Path) -> Result<Pcm, ShapingError> {
    let file = File::open(source)?;
    let decoder = Decoder::new(BufReader::new(file))
        .map_err(|e| ShapingError::Decode(e.to_string()))?;

    let channels = u16::from(decoder.channels());
    let sample_rate = u32::from(decoder.sample_rate());
    if channels == 0 || sample_rate == 0 {
        return Err(ShapingError::Decode("stream reports no audio".into()));
    }
    let samples: Vec<f32> = decoder.collect();

    Ok(Pcm {
        channels,
        sample_rate,
        samples,
    })
}

fn filter_type(kind: FilterKind) -> Type<f32> {
    match kind {
        FilterKind::LowPass => Type::LowPass,
        FilterKind::HighPass => Type::HighPass,
        FilterKind::BandPass => Type::BandPass,
    }
}

/// Apply `preset` to `pcm` in place. Length and channel layout are unchanged.
pub(super) fn apply(preset: Preset, pcm: &mut Pcm) -> Result<(), ShapingError> {
    match preset.shape() {
        Shape::Identity => {}
        Shape::Gain { db } => {
            let g = db_to_gain(db);
            pcm.samples.iter_mut().for_each(|s| *s *= g);
        }
        Shape::Overlay {
            filter,
            freq_hz,
            q,
            db,
        } => {
            // Keep the corner below Nyquist for low sample rates.
            let nyquist = pcm.sample_rate as f32 / 2.0;
            let freq_hz = freq_hz.min(nyquist * 0.95);
            let coeffs = Coefficients::<f32>::from_params(
                filter_type(filter),
                (pcm.sample_rate as f32).hz(),
                freq_hz.hz(),
                q,
            )
            .map_err(|e| ShapingError::Filter(format!("{e:?}")))?;

            let g = db_to_gain(db);
            let channels = usize::from(pcm.channels);
            let mut filters: Vec<DirectForm1<f32>> =
                (0..channels).map(|_| DirectForm1::<f32>::new(coeffs)).collect();

            for frame in pcm.samples.chunks_mut(channels) {
                for (sample, f) in frame.iter_mut().zip(filters.iter_mut()) {
                    *sample += f.run(*sample) * g;
                }
            }
        }
    }
    Ok(())
}

/// Write `pcm` as 16-bit WAV. The file appears at `dest` only once complete.
pub(super) fn write_wav(pcm: &Pcm, dest: &Path) -> Result<(), ShapingError> {
    let spec = hound::WavSpec {
        channels: pcm.channels,
        sample_rate: pcm.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let partial = dest.with_extension("part");
    let result = (|| -> Result<(), ShapingError> {
        let mut writer = hound::WavWriter::create(&partial, spec)?;
        for s in &pcm.samples {
            let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer.write_sample(v)?;
        }
        writer.finalize()?;
        fs::rename(&partial, dest)?;
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&partial);
    }
    result
}

/// Decode `source`, shape it with `preset` and store the result at `dest`.
pub(super) fn render(source: &Path, dest: &Path, preset: Preset) -> Result<(), ShapingError> {
    let mut pcm = decode(source)?;
    apply(preset, &mut pcm)?;
    write_wav(&pcm, dest)
}
