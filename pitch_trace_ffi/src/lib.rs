//! C interface to `pitch_trace`.
//!
//! A session owns a pipeline and is driven from the audio thread. Functions
//! taking a session must not be called while `pitch_trace_session_process`
//! runs on the same session. Readers are created from a session and may be
//! used from any one other thread each, concurrently with processing.
//! Readers stay valid after their session is freed. Unvoiced entries are
//! read as `-1.0`.

use std::ptr;
use std::sync::Arc;

use log::warn;
use pitch_trace::{Pipeline, PipelineOutputs, Pitch, PitchTable, Reader, TrackerConfig};

const READ_CHUNK_SIZE: usize = 256;

pub struct Session {
    pipeline: Pipeline,
    outputs: PipelineOutputs,
}

pub struct ReaderHandle {
    reader: Reader,
    table: Arc<PitchTable>,
}

#[no_mangle]
pub extern "C" fn allocate_f32_array(size: usize) -> *mut f32 {
    let mut buf = Vec::<f32>::with_capacity(size);
    let ptr = buf.as_mut_ptr();
    std::mem::forget(buf);
    ptr as *mut f32
}

/// Frees an array returned by [allocate_f32_array] with the same `size`.
///
/// # Safety
/// `ptr` must come from `allocate_f32_array(size)` and not have been freed.
#[no_mangle]
pub unsafe extern "C" fn free_f32_array(ptr: *mut f32, size: usize) {
    if !ptr.is_null() {
        drop(Vec::from_raw_parts(ptr, 0, size));
    }
}

/// Creates a session. A `channel_capacity` of 0 means one second of
/// entries. Returns null if the configuration is invalid.
#[no_mangle]
pub extern "C" fn pitch_trace_session_new(
    sample_rate: f32,
    base_frequency: f32,
    max_display_pitch: f32,
    amplitude_threshold: f32,
    channel_capacity: usize,
    publish_raw: bool,
) -> *mut Session {
    let config = TrackerConfig {
        sample_rate,
        base_frequency,
        max_display_pitch,
        amplitude_threshold,
        channel_capacity: if channel_capacity == 0 {
            None
        } else {
            Some(channel_capacity)
        },
        publish_raw,
        ..TrackerConfig::default()
    };
    match Pipeline::new(config) {
        Ok((pipeline, outputs)) => Box::into_raw(Box::new(Session { pipeline, outputs })),
        Err(err) => {
            warn!("Could not create pitch trace session: {}", err);
            ptr::null_mut()
        }
    }
}

/// # Safety
/// `session` must be null or come from [pitch_trace_session_new] and not have been freed.
#[no_mangle]
pub unsafe extern "C" fn pitch_trace_session_free(session: *mut Session) {
    if !session.is_null() {
        drop(Box::from_raw(session));
    }
}

/// Processes a chunk of samples. A null `samples` pointer or a zero
/// `sample_count` skips the chunk. Returns false if the chunk was skipped.
///
/// # Safety
/// `session` must be a live session. `samples` must be null or point to
/// `sample_count` readable floats.
#[no_mangle]
pub unsafe extern "C" fn pitch_trace_session_process(
    session: *mut Session,
    samples: *const f32,
    sample_count: usize,
) -> bool {
    let session = match session.as_mut() {
        Some(session) => session,
        None => return false,
    };
    let frame = if samples.is_null() {
        None
    } else {
        Some(std::slice::from_raw_parts(samples, sample_count))
    };
    session.pipeline.process_frame(frame) != pitch_trace::FrameOutcome::Skipped
}

/// The number of table entries, i.e. `lag_max - lag_min`.
///
/// # Safety
/// `session` must be a live session.
#[no_mangle]
pub unsafe extern "C" fn pitch_trace_session_table_len(session: *const Session) -> usize {
    session
        .as_ref()
        .map(|session| session.outputs.table.len())
        .unwrap_or(0)
}

/// Copies up to `max_count` table entries, starting at `lag_min`, and
/// returns the number copied.
///
/// # Safety
/// `session` must be a live session. `result` must point to `max_count` writable floats.
#[no_mangle]
pub unsafe extern "C" fn pitch_trace_session_copy_table(
    session: *const Session,
    result: *mut f32,
    max_count: usize,
) -> usize {
    let session = match session.as_ref() {
        Some(session) if !result.is_null() => session,
        _ => return 0,
    };
    let coordinates = session.outputs.table.coordinates();
    let count = coordinates.len().min(max_count);
    let result: &mut [f32] = std::slice::from_raw_parts_mut(result, count);
    result.copy_from_slice(&coordinates[..count]);
    count
}

/// Subscribes a reader to the pitch channel, or to the raw channel if
/// `raw` is set. Returns null if the session does not publish raw pitch.
///
/// # Safety
/// `session` must be a live session.
#[no_mangle]
pub unsafe extern "C" fn pitch_trace_reader_new(session: *const Session, raw: bool) -> *mut ReaderHandle {
    let session = match session.as_ref() {
        Some(session) => session,
        None => return ptr::null_mut(),
    };
    let channel = if raw {
        session.outputs.raw.as_ref()
    } else {
        Some(&session.outputs.pitch)
    };
    match channel {
        Some(channel) => Box::into_raw(Box::new(ReaderHandle {
            reader: channel.subscribe(),
            table: session.outputs.table.clone(),
        })),
        None => ptr::null_mut(),
    }
}

/// # Safety
/// `reader` must be null or come from [pitch_trace_reader_new] and not have been freed.
#[no_mangle]
pub unsafe extern "C" fn pitch_trace_reader_free(reader: *mut ReaderHandle) {
    if !reader.is_null() {
        drop(Box::from_raw(reader));
    }
}

/// Reads up to `max_count` of the oldest unread entries and returns the
/// number read.
///
/// # Safety
/// `reader` must be a live reader. `result` must point to `max_count` writable floats.
#[no_mangle]
pub unsafe extern "C" fn pitch_trace_reader_read(
    reader: *mut ReaderHandle,
    result: *mut f32,
    max_count: usize,
) -> usize {
    let handle = match reader.as_mut() {
        Some(handle) if !result.is_null() => handle,
        _ => return 0,
    };
    let result: &mut [f32] = std::slice::from_raw_parts_mut(result, max_count);
    let mut buffer = [Pitch::Unvoiced; READ_CHUNK_SIZE];
    let mut count = 0;
    while count < max_count {
        let chunk_size = (max_count - count).min(READ_CHUNK_SIZE);
        let report = handle.reader.read_into_slice(&mut buffer[..chunk_size]);
        for (target, entry) in result[count..].iter_mut().zip(buffer[..report.read].iter()) {
            *target = entry.to_f32();
        }
        count += report.read;
        if report.read < chunk_size {
            break;
        }
    }
    count
}

/// Maps a coordinate read from `reader` back to a frequency in Hz.
///
/// # Safety
/// `reader` must be a live reader.
#[no_mangle]
pub unsafe extern "C" fn pitch_trace_reader_coordinate_to_frequency(
    reader: *const ReaderHandle,
    coordinate: f32,
) -> f32 {
    reader
        .as_ref()
        .map(|handle| handle.table.coordinate_to_frequency(coordinate))
        .unwrap_or(0.0)
}

/// The total number of entries the reader lost by falling behind.
///
/// # Safety
/// `reader` must be a live reader.
#[no_mangle]
pub unsafe extern "C" fn pitch_trace_reader_dropped_count(reader: *const ReaderHandle) -> u64 {
    reader
        .as_ref()
        .map(|handle| handle.reader.dropped_count())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(sample_count: usize) -> Vec<f32> {
        (0..sample_count)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 220.0 * i as f32 / 48000.0).sin())
            .collect()
    }

    #[test]
    fn test_session_round_trip() {
        unsafe {
            let session = pitch_trace_session_new(48000.0, 55.0, 880.0, 0.005, 0, false);
            assert!(!session.is_null());
            assert!(pitch_trace_reader_new(session, true).is_null());
            let reader = pitch_trace_reader_new(session, false);
            assert!(!reader.is_null());

            let samples = tone(4000);
            assert!(pitch_trace_session_process(session, samples.as_ptr(), samples.len()));
            assert!(!pitch_trace_session_process(session, ptr::null(), 128));
            assert!(!pitch_trace_session_process(session, samples.as_ptr(), 0));

            let frequency_at_half = pitch_trace_reader_coordinate_to_frequency(reader, 0.5);
            assert!((frequency_at_half - 220.0).abs() < 1e-3);
            assert_eq!(pitch_trace_reader_coordinate_to_frequency(ptr::null(), 0.5), 0.0);

            let mut result = vec![0.0f32; 8000];
            let count = pitch_trace_reader_read(reader, result.as_mut_ptr(), result.len());
            assert_eq!(count, 4000);
            assert_eq!(result[0], -1.0);
            let last = result[count - 1];
            let frequency = pitch_trace_reader_coordinate_to_frequency(reader, last);
            assert!((frequency - 220.0).abs() < 5.0);
            assert_eq!(pitch_trace_reader_dropped_count(reader), 0);

            pitch_trace_session_free(session);
            // Readers outlive their session, table included.
            assert_eq!(pitch_trace_reader_read(reader, result.as_mut_ptr(), result.len()), 0);
            assert_eq!(pitch_trace_reader_coordinate_to_frequency(reader, 0.5), frequency_at_half);
            pitch_trace_reader_free(reader);
        }
    }

    #[test]
    fn test_table_copy() {
        unsafe {
            let session = pitch_trace_session_new(48000.0, 55.0, 880.0, 0.005, 16, true);
            assert_eq!(pitch_trace_session_table_len(session), 818);
            let mut table = vec![0.0f32; 1000];
            assert_eq!(
                pitch_trace_session_copy_table(session, table.as_mut_ptr(), table.len()),
                818
            );
            assert!(table[0] > table[817]);
            let raw = pitch_trace_reader_new(session, true);
            assert!(!raw.is_null());
            pitch_trace_reader_free(raw);
            pitch_trace_session_free(session);
        }
    }

    #[test]
    fn test_reader_used_while_processing() {
        // Readers only share the channel and the table with the session, so
        // a consumer thread may use them while the audio thread processes.
        struct SendPtr<T>(*mut T);
        unsafe impl<T> Send for SendPtr<T> {}

        unsafe {
            let session = pitch_trace_session_new(48000.0, 55.0, 880.0, 0.005, 0, false);
            let reader = SendPtr(pitch_trace_reader_new(session, false));
            let samples = tone(48000);

            let consumer = std::thread::spawn(move || {
                let reader = reader;
                let mut result = vec![0.0f32; 1024];
                let mut total = 0;
                let mut last_frequency = 0.0;
                while total < 48000 {
                    let count = pitch_trace_reader_read(reader.0, result.as_mut_ptr(), result.len());
                    if count > 0 && result[count - 1] >= 0.0 {
                        last_frequency =
                            pitch_trace_reader_coordinate_to_frequency(reader.0, result[count - 1]);
                    }
                    total += count;
                    std::thread::yield_now();
                }
                pitch_trace_reader_free(reader.0);
                last_frequency
            });

            for chunk in samples.chunks(480) {
                pitch_trace_session_process(session, chunk.as_ptr(), chunk.len());
            }
            let last_frequency = consumer.join().unwrap();
            assert!((last_frequency - 220.0).abs() < 5.0);
            pitch_trace_session_free(session);
        }
    }

    #[test]
    fn test_invalid_config_gives_null() {
        let session = pitch_trace_session_new(48000.0, 880.0, 55.0, 0.005, 0, false);
        assert!(session.is_null());
    }
}
