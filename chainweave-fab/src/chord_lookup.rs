//! Chord sounding at a beat position
//!
//! Answers "which chord governs the moment leading up to this position": a
//! chord placed exactly at the queried position has not started yet.

use chainweave_common::models::SegmentChord;

/// Name of the last chord positioned strictly before `position`
///
/// Entries are `(position, name)` pairs in ascending position order. Returns
/// `fallback` when no chord precedes `position`.
pub fn chord_name_at<'a, I>(entries: I, fallback: &'a str, position: f64) -> &'a str
where
    I: IntoIterator<Item = (f64, &'a str)>,
{
    let mut best: Option<(f64, &'a str)> = None;
    for (chord_position, name) in entries {
        if chord_position >= position {
            continue;
        }
        match best {
            Some((best_position, _)) if chord_position < best_position => {}
            _ => best = Some((chord_position, name)),
        }
    }
    best.map(|(_, name)| name).unwrap_or(fallback)
}

/// [`chord_name_at`] over a segment's chords
pub fn segment_chord_at<'a>(chords: &'a [SegmentChord], fallback: &'a str, position: f64) -> &'a str {
    chord_name_at(
        chords.iter().map(|c| (c.position, c.name.as_str())),
        fallback,
        position,
    )
}
