//! Beat position → elapsed seconds across a tempo change
//!
//! The tempo at the end of the previous segment may differ from the tempo
//! at the end of this one. To avoid an audible jump at the boundary, the
//! velocity (seconds per beat, `60 / BPM`) is interpolated linearly over the
//! whole segment as a function of `position / total_beats`, and elapsed time
//! is the numerical integral of that velocity.
//!
//! # Time Map
//!
//! The integral is computed once, at construction, by stepping forward in
//! increments of `1 / frames_per_beat` beats:
//!
//! ```text
//! frame:  0      1      2      ...   total_beats × frames_per_beat
//! time:   0.0    t1     t2     ...   t_end
//!         └─ time += step × velocity_at(frame × step)
//! ```
//!
//! Each stored time is floored to a multiple of `1 / resolution_hz`, so
//! repeated lookups are bit-stable.
//!
//! # Outside the Segment
//!
//! - Before position 0: linear at the previous segment's velocity
//! - After `total_beats`: time at `total_beats` plus linear at this
//!   segment's velocity
//!
//! # Examples
//!
//! ```rust
//! use chainweave_fab::time_computer::TimeComputer;
//!
//! // 16 beats accelerating from 60 to 120 BPM
//! let tc = TimeComputer::new(16.0, 60.0, 120.0).unwrap();
//! assert_eq!(tc.seconds_at_position(0.0), 0.0);
//! assert!((tc.seconds_at_position(16.0) - 12.0039).abs() < 0.0001);
//! ```

use chainweave_common::config::{DEFAULT_FRAMES_PER_BEAT, DEFAULT_RESOLUTION_HZ};
use thiserror::Error;

/// Seconds in one minute, for BPM conversions
const SECONDS_PER_MINUTE: f64 = 60.0;

/// Invalid time computer configuration
#[derive(Debug, Error, PartialEq)]
pub enum TimeComputerError {
    #[error("Total beats must be positive and finite, got {0}")]
    InvalidTotal(f64),

    #[error("Tempo must be positive and finite, got {0} BPM")]
    InvalidTempo(f64),

    #[error("Frames per beat must be positive")]
    InvalidFramesPerBeat,

    #[error("Resolution must be positive")]
    InvalidResolution,
}

/// Seconds per beat at the given tempo
pub fn velocity(tempo_bpm: f64) -> f64 {
    SECONDS_PER_MINUTE / tempo_bpm
}

/// Memoized beat-position → seconds table for one segment
#[derive(Debug, Clone)]
pub struct TimeComputer {
    total_beats: f64,
    from_tempo: f64,
    to_tempo: f64,
    from_velocity: f64,
    to_velocity: f64,
    frames_per_beat: f64,
    /// Quantized seconds indexed by frame, starting at frame 0
    time_map: Vec<f64>,
}

impl TimeComputer {
    /// Create a time computer at the default resolution
    pub fn new(total_beats: f64, from_tempo: f64, to_tempo: f64) -> Result<Self, TimeComputerError> {
        Self::with_resolution(
            total_beats,
            from_tempo,
            to_tempo,
            DEFAULT_FRAMES_PER_BEAT,
            DEFAULT_RESOLUTION_HZ,
        )
    }

    /// Create a time computer with explicit frames per beat and resolution
    pub fn with_resolution(
        total_beats: f64,
        from_tempo: f64,
        to_tempo: f64,
        frames_per_beat: u32,
        resolution_hz: u32,
    ) -> Result<Self, TimeComputerError> {
        if !(total_beats.is_finite() && total_beats > 0.0) {
            return Err(TimeComputerError::InvalidTotal(total_beats));
        }
        for tempo in [from_tempo, to_tempo] {
            if !(tempo.is_finite() && tempo > 0.0) {
                return Err(TimeComputerError::InvalidTempo(tempo));
            }
        }
        if frames_per_beat == 0 {
            return Err(TimeComputerError::InvalidFramesPerBeat);
        }
        if resolution_hz == 0 {
            return Err(TimeComputerError::InvalidResolution);
        }

        let from_velocity = velocity(from_tempo);
        let to_velocity = velocity(to_tempo);
        let velocity_delta = to_velocity - from_velocity;
        let frames_per_beat = f64::from(frames_per_beat);
        let resolution = f64::from(resolution_hz);
        let step = 1.0 / frames_per_beat;
        let total_frames = (total_beats * frames_per_beat).floor() as usize;

        let mut time_map = Vec::with_capacity(total_frames + 1);
        let mut time = 0.0;
        for frame in 0..=total_frames {
            time_map.push((time * resolution).floor() / resolution);
            let position = frame as f64 * step;
            time += step * (from_velocity + velocity_delta * position / total_beats);
        }

        Ok(Self {
            total_beats,
            from_tempo,
            to_tempo,
            from_velocity,
            to_velocity,
            frames_per_beat,
            time_map,
        })
    }

    /// Seconds elapsed from the segment start at a beat position
    ///
    /// Negative positions extrapolate at the previous segment's tempo;
    /// positions past the end extrapolate at this segment's tempo.
    pub fn seconds_at_position(&self, position: f64) -> f64 {
        if position < 0.0 {
            return position * self.from_velocity;
        }

        if position > self.total_beats {
            // one level of recursion at most: total_beats > total_beats is impossible
            return self.seconds_at_position(self.total_beats)
                + (position - self.total_beats) * self.to_velocity;
        }

        let frame = ((position * self.frames_per_beat).floor() as usize).min(self.time_map.len() - 1);
        self.time_map[frame]
    }

    pub fn total_beats(&self) -> f64 {
        self.total_beats
    }

    pub fn from_tempo(&self) -> f64 {
        self.from_tempo
    }

    pub fn to_tempo(&self) -> f64 {
        self.to_tempo
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One step of the default quantization, plus float slack
    const TOLERANCE: f64 = 2.0 / DEFAULT_RESOLUTION_HZ as f64;

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {} ± {}, got {}",
            expected,
            tolerance,
            actual
        );
    }

    #[test]
    fn test_velocity_of_common_tempos() {
        assert_eq!(velocity(60.0), 1.0);
        assert_eq!(velocity(120.0), 0.5);
    }

    #[test]
    fn test_position_zero_is_exactly_zero() {
        for (from, to) in [(120.0, 120.0), (60.0, 120.0), (140.0, 90.0)] {
            let tc = TimeComputer::new(8.0, from, to).unwrap();
            assert_eq!(tc.seconds_at_position(0.0), 0.0);
        }
    }

    #[test]
    fn test_constant_tempo_boundaries() {
        for (total, bpm) in [(16.0, 120.0), (32.0, 90.0), (4.0, 133.0), (7.0, 60.0)] {
            let tc = TimeComputer::new(total, bpm, bpm).unwrap();
            let v = 60.0 / bpm;

            assert_close(tc.seconds_at_position(total), total * v, TOLERANCE);
            assert_close(tc.seconds_at_position(-1.0), -v, 1e-12);

            let end = tc.seconds_at_position(total);
            for k in [0.5, 1.0, 3.0] {
                assert_close(tc.seconds_at_position(total + k), end + k * v, 1e-9);
            }
        }
    }

    #[test]
    fn test_accelerating_tempo_integrates_velocity() {
        let tc = TimeComputer::new(16.0, 60.0, 120.0).unwrap();
        let end = tc.seconds_at_position(16.0);

        assert_close(end, 12.0039, 0.0001);
        // neither the average-tempo nor the from-tempo shortcut
        assert!((end - 8.0).abs() > 1.0);
        assert!((end - 16.0).abs() > 1.0);
    }

    #[test]
    fn test_accelerating_tempo_is_monotonic_and_concave() {
        let tc = TimeComputer::new(16.0, 60.0, 120.0).unwrap();

        let mut previous_time = tc.seconds_at_position(0.0);
        let mut previous_beat_length = f64::INFINITY;
        for beat in 1..=16 {
            let time = tc.seconds_at_position(beat as f64);
            let beat_length = time - previous_time;
            assert!(beat_length > 0.0, "beat {} did not advance", beat);
            assert!(
                beat_length < previous_beat_length,
                "beat {} took {} after {}",
                beat,
                beat_length,
                previous_beat_length
            );
            previous_time = time;
            previous_beat_length = beat_length;
        }
    }

    #[test]
    fn test_decelerating_tempo_lengthens_beats() {
        let tc = TimeComputer::new(8.0, 120.0, 60.0).unwrap();
        let first = tc.seconds_at_position(1.0);
        let last = tc.seconds_at_position(8.0) - tc.seconds_at_position(7.0);
        assert!(last > first);
    }

    #[test]
    fn test_before_start_uses_previous_tempo() {
        let tc = TimeComputer::new(16.0, 60.0, 120.0).unwrap();
        assert_close(tc.seconds_at_position(-2.0), -2.0, 1e-12);
    }

    #[test]
    fn test_after_end_uses_current_tempo() {
        let tc = TimeComputer::new(16.0, 60.0, 120.0).unwrap();
        let end = tc.seconds_at_position(16.0);
        assert_close(tc.seconds_at_position(18.0), end + 1.0, 1e-9);
    }

    #[test]
    fn test_lookup_is_stable_within_a_frame() {
        let tc = TimeComputer::with_resolution(4.0, 100.0, 100.0, 4, 1000).unwrap();
        assert_eq!(tc.seconds_at_position(1.0), tc.seconds_at_position(1.2));
        assert!(tc.seconds_at_position(1.25) > tc.seconds_at_position(1.2));
    }

    #[test]
    fn test_results_are_quantized_to_resolution() {
        let tc = TimeComputer::with_resolution(3.0, 70.0, 110.0, 24, 1000).unwrap();
        for beat in [0.5, 1.0, 2.75, 3.0] {
            let millis = tc.seconds_at_position(beat) * 1000.0;
            assert!((millis - millis.round()).abs() < 1e-6, "{} not quantized", millis);
        }
    }

    #[test]
    fn test_fractional_total_beats() {
        let tc = TimeComputer::new(3.5, 120.0, 120.0).unwrap();
        assert_close(tc.seconds_at_position(3.5), 1.75, TOLERANCE);
    }

    #[test]
    fn test_invalid_configuration_rejected() {
        assert_eq!(
            TimeComputer::new(0.0, 120.0, 120.0).unwrap_err(),
            TimeComputerError::InvalidTotal(0.0)
        );
        assert_eq!(
            TimeComputer::new(16.0, -1.0, 120.0).unwrap_err(),
            TimeComputerError::InvalidTempo(-1.0)
        );
        assert_eq!(
            TimeComputer::with_resolution(16.0, 120.0, 120.0, 0, 1000).unwrap_err(),
            TimeComputerError::InvalidFramesPerBeat
        );
        assert_eq!(
            TimeComputer::with_resolution(16.0, 120.0, 120.0, 64, 0).unwrap_err(),
            TimeComputerError::InvalidResolution
        );
    }

    #[test]
    fn test_exposes_basis() {
        let tc = TimeComputer::new(16.0, 60.0, 120.0).unwrap();
        assert_eq!(tc.total_beats(), 16.0);
        assert_eq!(tc.from_tempo(), 60.0);
        assert_eq!(tc.to_tempo(), 120.0);
    }
}
