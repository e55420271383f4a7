use crate::store::PlaybackState;

/// Output gain for a track with `gain_db`, given the playback preferences.
///
/// Mute wins; normalization scales by `10^(gain/20)`; the result is clamped
/// to `[0, 1]`.
pub fn effective_volume(state: &PlaybackState, gain_db: f32) -> f32 {
    let base = if state.muted { 0.0 } else { state.volume };
    if !state.normalization || gain_db == 0.0 {
        return base.clamp(0.0, 1.0);
    }
    (base * 10f32.powf(gain_db / 20.0)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(volume: f32, muted: bool, normalization: bool) -> PlaybackState {
        PlaybackState {
            volume,
            muted,
            normalization,
            ..PlaybackState::default()
        }
    }

    #[test]
    fn normalization_scales_by_gain() {
        let v = effective_volume(&state(0.8, false, true), -6.0);
        assert!((v - 0.4009).abs() < 1e-3, "{v}");
    }

    #[test]
    fn large_gain_clamps_to_one() {
        assert_eq!(effective_volume(&state(0.8, false, true), 40.0), 1.0);
    }

    #[test]
    fn disabled_normalization_ignores_gain() {
        assert_eq!(effective_volume(&state(0.8, false, false), -6.0), 0.8);
        assert_eq!(effective_volume(&state(0.8, false, true), 0.0), 0.8);
    }

    #[test]
    fn mute_is_silent() {
        assert_eq!(effective_volume(&state(0.8, true, true), 12.0), 0.0);
    }
}
