/// Named equalizer-style presets.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Preset {
    /// No change; the source file is played as is.
    #[default]
    Flat,
    BassBoost,
    TrebleBoost,
    Vocal,
    Soft,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(super) enum FilterKind {
    LowPass,
    HighPass,
    BandPass,
}

/// What a preset does to the signal.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(super) enum Shape {
    Identity,
    /// Plain gain on the whole signal.
    Gain { db: f32 },
    /// Filtered copy of the signal, boosted and mixed over the dry signal.
    Overlay {
        filter: FilterKind,
        freq_hz: f32,
        q: f32,
        db: f32,
    },
}

impl Preset {
    pub const ALL: [Preset; 5] = [
        Preset::Flat,
        Preset::BassBoost,
        Preset::TrebleBoost,
        Preset::Vocal,
        Preset::Soft,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Flat => "Flat",
            Preset::BassBoost => "Bass Boost",
            Preset::TrebleBoost => "Treble Boost",
            Preset::Vocal => "Vocal",
            Preset::Soft => "Soft",
        }
    }

    /// Look a preset up by display name. Unknown names map to [`Preset::Flat`].
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name.trim()))
            .unwrap_or_default()
    }

    pub fn is_identity(self) -> bool {
        self.shape() == Shape::Identity
    }

    /// Next preset in display order, wrapping around.
    pub fn cycle(self) -> Self {
        let i = Self::ALL.iter().position(|p| *p == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    pub(super) fn shape(self) -> Shape {
        match self {
            Preset::Flat => Shape::Identity,
            Preset::BassBoost => Shape::Overlay {
                filter: FilterKind::LowPass,
                freq_hz: 120.0,
                q: biquad::Q_BUTTERWORTH_F32,
                db: 6.0,
            },
            Preset::TrebleBoost => Shape::Overlay {
                filter: FilterKind::HighPass,
                freq_hz: 4_000.0,
                q: biquad::Q_BUTTERWORTH_F32,
                db: 4.0,
            },
            // 1000..1200 Hz: centre at the geometric mean, Q = centre / bandwidth.
            Preset::Vocal => {
                let centre = (1_000.0f32 * 1_200.0).sqrt();
                Shape::Overlay {
                    filter: FilterKind::BandPass,
                    freq_hz: centre,
                    q: centre / 200.0,
                    db: 5.0,
                }
            }
            Preset::Soft => Shape::Gain { db: -3.0 },
        }
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

pub(super) fn db_to_gain(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}
