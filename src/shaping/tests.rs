use std::fs::{self, File};
use std::path::Path;
use std::time::{Duration, SystemTime};

use tempfile::tempdir;

use super::preset::{Shape, db_to_gain};
use super::render::{Pcm, apply};
use super::*;

fn write_sine(path: &Path, seconds: f32, freq: f32) {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: 8_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    let frames = (spec.sample_rate as f32 * seconds) as usize;
    for i in 0..frames {
        let t = i as f32 / spec.sample_rate as f32;
        let v = (t * freq * 2.0 * std::f32::consts::PI).sin();
        let amplitude = (i16::MAX as f32 * 0.5 * v) as i16;
        writer.write_sample(amplitude).unwrap();
        writer.write_sample(amplitude).unwrap();
    }
    writer.finalize().unwrap();
}

fn wav_frames(path: &Path) -> u32 {
    hound::WavReader::open(path).unwrap().duration()
}

#[test]
fn preset_names_round_trip_and_unknown_is_flat() {
    for p in Preset::ALL {
        assert_eq!(Preset::from_name(p.name()), p);
    }
    assert_eq!(Preset::from_name("bass boost"), Preset::BassBoost);
    assert_eq!(Preset::from_name("Loudness War"), Preset::Flat);
    assert!(Preset::Flat.is_identity());
    assert!(!Preset::Soft.is_identity());
}

#[test]
fn preset_cycle_visits_every_preset() {
    let mut p = Preset::Flat;
    let mut seen = vec![p];
    for _ in 0..4 {
        p = p.cycle();
        seen.push(p);
    }
    assert_eq!(seen, Preset::ALL.to_vec());
    assert_eq!(p.cycle(), Preset::Flat);
}

#[test]
fn soft_preset_lowers_level_by_three_db() {
    assert_eq!(Preset::Soft.shape(), Shape::Gain { db: -3.0 });
    let mut pcm = Pcm {
        channels: 1,
        sample_rate: 8_000,
        samples: vec![0.5, -0.5, 0.25],
    };
    apply(Preset::Soft, &mut pcm).unwrap();
    let g = db_to_gain(-3.0);
    assert!((pcm.samples[0] - 0.5 * g).abs() < 1e-6);
    assert!((pcm.samples[1] + 0.5 * g).abs() < 1e-6);
    assert_eq!(pcm.samples.len(), 3);
}

#[test]
fn bass_boost_raises_low_frequency_content() {
    // A 60 Hz tone sits well inside the low-pass band.
    let rate = 8_000u32;
    let samples: Vec<f32> = (0..rate)
        .map(|i| 0.25 * (i as f32 / rate as f32 * 60.0 * 2.0 * std::f32::consts::PI).sin())
        .collect();
    let peak_before = samples.iter().fold(0f32, |m, s| m.max(s.abs()));

    let mut pcm = Pcm {
        channels: 1,
        sample_rate: rate,
        samples,
    };
    apply(Preset::BassBoost, &mut pcm).unwrap();
    let peak_after = pcm.samples[rate as usize / 2..]
        .iter()
        .fold(0f32, |m, s| m.max(s.abs()));

    assert!(peak_after > peak_before * 2.0, "{peak_after} vs {peak_before}");
}

#[test]
fn flat_and_unknown_presets_return_the_source() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("a.wav");
    write_sine(&src, 0.1, 440.0);
    let cache = ShapingCache::new(dir.path().join("cache"));

    assert_eq!(cache.prepare(&src, "Flat"), src);
    assert_eq!(cache.prepare(&src, "Nope"), src);
    assert!(!cache.dir().exists());
}

#[test]
fn prepare_renders_once_and_reuses_the_artifact() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("a.wav");
    write_sine(&src, 0.25, 440.0);
    let cache = ShapingCache::new(dir.path().join("cache"));

    let first = cache.prepare(&src, "Bass Boost");
    assert_ne!(first, src);
    assert!(first.starts_with(cache.dir()));
    assert_eq!(first.extension().and_then(|e| e.to_str()), Some("wav"));
    let rendered_at = fs::metadata(&first).unwrap().modified().unwrap();

    let second = cache.prepare(&src, "Bass Boost");
    assert_eq!(first, second);
    assert_eq!(fs::metadata(&second).unwrap().modified().unwrap(), rendered_at);

    // Same timing as the source.
    assert_eq!(wav_frames(&first), wav_frames(&src));
}

#[test]
fn presets_get_distinct_artifacts() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("a.wav");
    write_sine(&src, 0.1, 440.0);
    let cache = ShapingCache::new(dir.path().join("cache"));

    let bass = cache.prepare(&src, "Bass Boost");
    let vocal = cache.prepare(&src, "Vocal");
    let treble = cache.prepare(&src, "Treble Boost");
    assert_ne!(bass, vocal);
    assert_ne!(vocal, treble);
    assert!(bass.exists() && vocal.exists() && treble.exists());
}

#[test]
fn touching_the_source_invalidates_the_cache() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("a.wav");
    write_sine(&src, 0.1, 440.0);
    let cache = ShapingCache::new(dir.path().join("cache"));

    let before = cache.prepare(&src, "Bass Boost");

    let earlier = SystemTime::now() - Duration::from_secs(3600);
    File::options()
        .write(true)
        .open(&src)
        .unwrap()
        .set_modified(earlier)
        .unwrap();

    let after = cache.prepare(&src, "Bass Boost");
    assert_ne!(before, after);
    assert!(after.exists());
}

#[test]
fn undecodable_source_falls_back_without_leftovers() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("notes.mp3");
    fs::write(&src, b"definitely not audio").unwrap();
    let cache = ShapingCache::new(dir.path().join("cache"));

    assert_eq!(cache.prepare(&src, "Soft"), src);
    let leftovers = fs::read_dir(cache.dir())
        .map(|rd| rd.count())
        .unwrap_or(0);
    assert_eq!(leftovers, 0);
}

#[test]
fn missing_source_falls_back() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("gone.wav");
    let cache = ShapingCache::new(dir.path().join("cache"));
    assert_eq!(cache.prepare(&src, "Bass Boost"), src);
}

#[test]
fn clear_cache_removes_artifacts_and_tolerates_missing_dir() {
    let dir = tempdir().unwrap();
    let cache = ShapingCache::new(dir.path().join("cache"));
    assert_eq!(cache.clear_cache(), 0);

    let src = dir.path().join("a.wav");
    write_sine(&src, 0.1, 440.0);
    cache.prepare(&src, "Bass Boost");
    cache.prepare(&src, "Soft");
    fs::create_dir_all(cache.dir().join("nested")).unwrap();

    assert_eq!(cache.clear_cache(), 2);
    assert_eq!(fs::read_dir(cache.dir()).unwrap().count(), 1);
}
