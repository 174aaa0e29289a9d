//! Text format for precomputed pitch tables.
//!
//! ```text
//! # pitch-trace table sample_rate=48000 base_frequency=55 max_display_pitch=880
//! 9.97137e-1
//! 9.93403e-1
//! ...
//! ```
//!
//! The header names the three scaling constants. It is followed by one
//! coordinate per line, in ascending lag order starting at `lag_min`. Values
//! are written with enough digits to be read back exactly. Loading checks
//! that every value lies in `[0, 1]` and that values strictly decrease.

use std::fmt::{self, Write};

use super::PitchTable;
use crate::error::TableError;

const HEADER_PREFIX: &str = "# pitch-trace table";

/// Writes `table` in the artifact format.
pub fn write_artifact<W: Write>(table: &PitchTable, out: &mut W) -> fmt::Result {
    writeln!(
        out,
        "{} sample_rate={} base_frequency={} max_display_pitch={}",
        HEADER_PREFIX,
        table.sample_rate(),
        table.base_frequency(),
        table.max_display_pitch()
    )?;
    for coordinate in table.coordinates() {
        writeln!(out, "{:e}", coordinate)?;
    }
    Ok(())
}

/// Convenience wrapper around [write_artifact].
pub fn artifact_to_string(table: &PitchTable) -> String {
    let mut result = String::new();
    // Writing to a String cannot fail.
    let _ = write_artifact(table, &mut result);
    result
}

/// Loads a table written by [write_artifact]. Blank lines are ignored.
pub fn parse_artifact(text: &str) -> Result<PitchTable, TableError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty());

    let header = match lines.next() {
        Some((_, line)) if line.starts_with(HEADER_PREFIX) => &line[HEADER_PREFIX.len()..],
        _ => return Err(TableError::MissingHeader),
    };
    let sample_rate = header_field(header, "sample_rate")?;
    let base_frequency = header_field(header, "base_frequency")?;
    let max_display_pitch = header_field(header, "max_display_pitch")?;

    let mut coordinates: Vec<f32> = Vec::new();
    for (line_number, line) in lines {
        let value: f32 = line.parse().map_err(|_| TableError::InvalidValue {
            line: line_number,
            text: line.to_string(),
        })?;
        // Also rejects NaN.
        if !(0.0..=1.0).contains(&value) {
            return Err(TableError::CoordinateOutOfRange {
                line: line_number,
                value,
            });
        }
        if let Some(&previous) = coordinates.last() {
            if value >= previous {
                return Err(TableError::NotDecreasing {
                    line: line_number,
                    value,
                    previous,
                });
            }
        }
        coordinates.push(value);
    }

    let expected = PitchTable::from_bounds(sample_rate, base_frequency, max_display_pitch)?.len();
    if coordinates.len() != expected {
        return Err(TableError::LengthMismatch {
            expected,
            actual: coordinates.len(),
        });
    }

    Ok(PitchTable::from_parts(
        sample_rate,
        base_frequency,
        max_display_pitch,
        coordinates.into_boxed_slice(),
    )?)
}

fn header_field(header: &str, name: &str) -> Result<f32, TableError> {
    header
        .split_whitespace()
        .filter_map(|field| field.split_once('='))
        .find(|(key, _)| *key == name)
        .and_then(|(_, value)| value.parse::<f32>().ok())
        .ok_or_else(|| TableError::InvalidHeader(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackerConfig;

    #[test]
    fn test_written_table_loads_back_exactly() {
        let table = PitchTable::build(&TrackerConfig::default()).unwrap();
        let text = artifact_to_string(&table);
        assert!(text.starts_with(
            "# pitch-trace table sample_rate=48000 base_frequency=55 max_display_pitch=880\n"
        ));
        assert_eq!(text.lines().count(), 1 + 818);

        let loaded = parse_artifact(&text).unwrap();
        assert_eq!(loaded, table);
    }

    #[test]
    fn test_length_mismatch() {
        let table = PitchTable::build(&TrackerConfig::default()).unwrap();
        let mut text = artifact_to_string(&table);
        text.push_str("0.0\n");
        assert_eq!(
            parse_artifact(&text),
            Err(TableError::LengthMismatch {
                expected: 818,
                actual: 819
            })
        );
    }

    const HEADER: &str =
        "# pitch-trace table sample_rate=48000 base_frequency=55 max_display_pitch=880\n";

    #[test]
    fn test_values_outside_unit_range() {
        for &text in ["NaN", "inf", "-inf", "1.5", "-0.01"].iter() {
            let artifact = format!("{}0.9\n{}\n", HEADER, text);
            match parse_artifact(&artifact) {
                Err(TableError::CoordinateOutOfRange { line, value }) => {
                    assert_eq!(line, 3);
                    assert_eq!(value.to_string(), text.parse::<f32>().unwrap().to_string());
                }
                other => panic!("`{}` gave {:?}", text, other),
            }
        }
    }

    #[test]
    fn test_values_must_decrease() {
        assert_eq!(
            parse_artifact(&format!("{}0.9\n0.8\n0.8\n", HEADER)),
            Err(TableError::NotDecreasing {
                line: 4,
                value: 0.8,
                previous: 0.8
            })
        );

        // A valid table with two neighbors swapped.
        let table = PitchTable::build(&TrackerConfig::default()).unwrap();
        let mut lines: Vec<String> = artifact_to_string(&table).lines().map(String::from).collect();
        // Lines 101 and 102 of the artifact.
        lines.swap(100, 101);
        let text = lines.join("\n");
        assert!(matches!(
            parse_artifact(&text),
            Err(TableError::NotDecreasing { line: 102, .. })
        ));
    }

    #[test]
    fn test_invalid_input() {
        assert_eq!(parse_artifact(""), Err(TableError::MissingHeader));
        assert_eq!(parse_artifact("1.0\n"), Err(TableError::MissingHeader));
        assert_eq!(
            parse_artifact("# pitch-trace table sample_rate=48000 base_frequency=55\n"),
            Err(TableError::InvalidHeader("max_display_pitch".to_string()))
        );
        assert!(matches!(
            parse_artifact(
                "# pitch-trace table sample_rate=48000 base_frequency=880 max_display_pitch=55\n"
            ),
            Err(TableError::InvalidConstants(_))
        ));
        assert_eq!(
            parse_artifact(
                "# pitch-trace table sample_rate=48000 base_frequency=55 max_display_pitch=880\n\n0.5\nabc\n"
            ),
            Err(TableError::InvalidValue {
                line: 4,
                text: "abc".to_string()
            })
        );
    }
}
