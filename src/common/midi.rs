use micromath::F32Ext;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#/D♭", "D", "D#/E♭", "E", "F", "F#/G♭", "G", "G#/A♭", "A", "A#/B♭", "B",
];

/// `69 - 12 * log2(440)`, the note number of 1 Hz.
const NOTE_NUMBER_OF_1_HZ: f32 = -36.376316562295926;

/// The lowest note that gets a label of its own, A0.
const LOWEST_LABELED_NOTE: usize = 21;

/// Converts a frequency in Hz to a [MIDI](https://en.wikipedia.org/wiki/MIDI)
/// note number with a fractional part. A4 at 440 Hz is note 69.
pub fn freq_to_midi_note(freq: f32) -> f32 {
    NOTE_NUMBER_OF_1_HZ + 12.0 * F32Ext::log2(freq)
}

/// Formats a MIDI note number as note name, octave and cent offset from the
/// nearest note, e.g. `A-3 | +04 cents`. Octaves follow scientific pitch
/// notation, starting at C. Notes below A0 are labeled relative to A0.
pub fn note_number_to_string(note_number: f32) -> String {
    let nearest = (note_number.round().max(0.0) as usize).max(LOWEST_LABELED_NOTE);
    let cents = (100.0 * (note_number - nearest as f32)).round() as i32;
    format!(
        "{}-{} | {}{:02} cents",
        NOTE_NAMES[nearest % 12],
        nearest / 12 - 1,
        if cents >= 0 { "+" } else { "-" },
        cents.abs()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::PitchTable;

    #[test]
    fn test_note_number_matches_std_log2() {
        // micromath's log2 is an approximation. Within 0.11 cents of the
        // exact value is close enough for labels.
        let max_cent_error = 0.11_f32;
        for i in 1..10000 {
            let frequency = i as f32;
            let exact = 12.0 * (frequency / 440.0).log2() + 69.0;
            let delta_cents = 100.0 * (exact - freq_to_midi_note(frequency));
            assert!(
                delta_cents.abs() <= max_cent_error,
                "{} Hz is off by {} cents",
                frequency,
                delta_cents
            );
        }
    }

    #[test]
    fn test_note_labels() {
        assert_eq!(note_number_to_string(69.0), "A-4 | +00 cents");
        assert_eq!(note_number_to_string(57.04), "A-3 | +04 cents");
        assert_eq!(note_number_to_string(60.0), "C-4 | +00 cents");
        assert_eq!(note_number_to_string(60.9), "C#/D♭-4 | -10 cents");
        assert_eq!(note_number_to_string(59.0), "B-3 | +00 cents");
        assert!(note_number_to_string(5.0).starts_with("A-0"));
    }

    #[test]
    fn test_labels_of_table_coordinates() {
        let table = PitchTable::from_bounds(48000.0, 55.0, 880.0).unwrap();
        // Four octaves, one per quarter of the coordinate range.
        let expected = [
            (0.0, "A-1 | +00 cents"),
            (0.25, "A-2 | +00 cents"),
            (0.5, "A-3 | +00 cents"),
            (0.75, "A-4 | +00 cents"),
            (1.0, "A-5 | +00 cents"),
        ];
        for &(coordinate, label) in expected.iter() {
            let frequency = table.coordinate_to_frequency(coordinate);
            assert_eq!(note_number_to_string(freq_to_midi_note(frequency)), label);
        }
        assert!((table.coordinate_to_frequency(0.5) - 220.0).abs() < 1e-3);
        // Three semitones above A3.
        let c4 = table.frequency_to_coordinate(261.6256);
        assert_eq!(
            note_number_to_string(freq_to_midi_note(table.coordinate_to_frequency(c4))),
            "C-4 | +00 cents"
        );
    }
}
