use super::PitchTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridlineKind {
    /// A whole number of octaves above the base frequency.
    Octave,
    /// One semitone above an octave line.
    MinorSecond,
    Semitone,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gridline {
    /// Semitones above the base frequency.
    pub semitone: u32,
    pub frequency: f32,
    pub coordinate: f32,
    pub kind: GridlineKind,
}

/// Iterator over semitone gridlines, see [PitchTable::gridlines].
pub struct Gridlines {
    base_frequency: f64,
    max_display_pitch: f64,
    octave_span: f64,
    semitone: u32,
}

impl Gridlines {
    pub(super) fn new(table: &PitchTable) -> Self {
        let base_frequency = table.base_frequency() as f64;
        let max_display_pitch = table.max_display_pitch() as f64;
        Gridlines {
            base_frequency,
            max_display_pitch,
            octave_span: (max_display_pitch / base_frequency).log2(),
            semitone: 0,
        }
    }
}

impl Iterator for Gridlines {
    type Item = Gridline;

    fn next(&mut self) -> Option<Gridline> {
        let octaves = self.semitone as f64 / 12.0;
        let frequency = self.base_frequency * 2f64.powf(octaves);
        // Allow for rounding so a maximum pitch a whole number of semitones up is included.
        if frequency > self.max_display_pitch * (1.0 + 1e-9) {
            return None;
        }

        let kind = match self.semitone % 12 {
            0 => GridlineKind::Octave,
            1 => GridlineKind::MinorSecond,
            _ => GridlineKind::Semitone,
        };
        let gridline = Gridline {
            semitone: self.semitone,
            frequency: frequency as f32,
            coordinate: (octaves / self.octave_span) as f32,
            kind,
        };
        self.semitone += 1;
        Some(gridline)
    }
}
