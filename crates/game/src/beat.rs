//! Beat schedule: the timeline that slaves the ball's vertical motion to the
//! music.
//!
//! The schedule is an ordered list of keyframe timestamps, each tagged with
//! where the ball must be at that instant (bottom of its travel or top). The
//! interval between two consecutive keyframes is a segment; the ball's height
//! inside a segment is a pure function of the fractional progress through it.

/// Where the ball is at a keyframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyframeAction {
    Bottom,
    Top,
}

/// One segment of the schedule: `[start, end)` with the ball travelling from
/// `origin` to `destination`.
#[derive(Debug, Clone, Copy)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub origin: KeyframeAction,
    pub destination: KeyframeAction,
}

impl Segment {
    /// Fractional progress through the segment at time `t`. Segments are
    /// non-degenerate by construction.
    pub fn fraction(&self, t: f64) -> f64 {
        (t - self.start) / (self.end - self.start)
    }
}

/// Immutable keyframe timeline plus a forward-scanning cursor.
///
/// Construction appends a sentinel keyframe far past the end of the timeline,
/// repeating the last action, so the final authored segment behaves as an
/// unbounded hold and `segment()` never reads out of range.
#[derive(Debug, Clone)]
pub struct BeatSchedule {
    timestamps: Vec<f64>,
    actions: Vec<KeyframeAction>,
    cursor: usize,
}

/// Sentinel distance past the final authored keyframe (seconds).
const SENTINEL_GAP: f64 = 3600.0;

impl BeatSchedule {
    /// Build a schedule from `(timestamp, action)` pairs. Timestamps must be
    /// strictly increasing and there must be at least two entries; anything
    /// else is a bug in trusted initialization code and panics here.
    pub fn new(entries: Vec<(f64, KeyframeAction)>) -> Self {
        assert!(
            entries.len() >= 2,
            "beat schedule needs at least two keyframes"
        );
        for pair in entries.windows(2) {
            assert!(
                pair[1].0 > pair[0].0,
                "beat schedule timestamps must be strictly increasing"
            );
        }

        let mut timestamps: Vec<f64> = entries.iter().map(|(t, _)| *t).collect();
        let mut actions: Vec<KeyframeAction> = entries.iter().map(|(_, a)| *a).collect();

        let last_time = *timestamps.last().unwrap_or(&0.0);
        let last_action = *actions.last().unwrap_or(&KeyframeAction::Bottom);
        timestamps.push(last_time + SENTINEL_GAP);
        actions.push(last_action);

        Self {
            timestamps,
            actions,
            cursor: 0,
        }
    }

    /// Advance the cursor past every keyframe whose timestamp `game_time` has
    /// reached. Forward scan only; the cursor never exceeds the last real
    /// segment. Returns true when the cursor moved.
    pub fn advance(&mut self, game_time: f64) -> bool {
        let before = self.cursor;
        while self.cursor + 2 < self.timestamps.len()
            && game_time >= self.timestamps[self.cursor + 1]
        {
            self.cursor += 1;
        }
        self.cursor != before
    }

    /// The segment the cursor currently sits in.
    pub fn segment(&self) -> Segment {
        Segment {
            start: self.timestamps[self.cursor],
            end: self.timestamps[self.cursor + 1],
            origin: self.actions[self.cursor],
            destination: self.actions[self.cursor + 1],
        }
    }

    /// Rewind the cursor to the start of the timeline.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Timestamps at which the ball contacts the bottom, i.e. the audible
    /// beats.
    /// The initial rest and the sentinel are not beats.
    pub fn beat_times(&self) -> Vec<f64> {
        let real = self.timestamps.len() - 1;
        self.timestamps[..real]
            .iter()
            .zip(self.actions[..real].iter())
            .filter(|&(t, a)| *a == KeyframeAction::Bottom && *t > 0.0)
            .map(|(t, _)| *t)
            .collect()
    }
}

/// Lead-in before the first bounce (seconds).
const LEAD_IN: f64 = 2.0;

/// The track timeline: staged accelerando of full bounces in the manner of
/// "In the Hall of the Mountain King", ending in a held rest.
pub fn hall_of_the_mountain_king() -> BeatSchedule {
    use KeyframeAction::{Bottom, Top};

    let mut entries = vec![(0.0, Bottom), (LEAD_IN, Bottom)];
    let mut t = LEAD_IN;

    // (bpm, bounces) per stage; each bounce is an up keyframe at the half
    // beat and a down keyframe on the beat.
    let stages: [(f64, u32); 5] = [
        (110.0, 24),
        (126.0, 24),
        (144.0, 24),
        (168.0, 16),
        (184.0, 12),
    ];

    for (bpm, bounces) in stages {
        let period = 60.0 / bpm;
        for _ in 0..bounces {
            entries.push((t + period / 2.0, Top));
            entries.push((t + period, Bottom));
            t += period;
        }
    }

    // Closing rest: hold the ball at the bottom for two seconds of silence.
    entries.push((t + 2.0, Bottom));

    BeatSchedule::new(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use KeyframeAction::{Bottom, Top};

    fn simple_schedule() -> BeatSchedule {
        BeatSchedule::new(vec![
            (0.0, Bottom),
            (1.0, Bottom),
            (1.5, Top),
            (2.0, Bottom),
        ])
    }

    #[test]
    fn test_cursor_advances_monotonically() {
        let mut schedule = simple_schedule();
        assert!(!schedule.advance(0.5));
        assert_eq!(schedule.segment().start, 0.0);

        assert!(schedule.advance(1.2));
        let seg = schedule.segment();
        assert_eq!(seg.start, 1.0);
        assert_eq!(seg.end, 1.5);
        assert_eq!(seg.origin, Bottom);
        assert_eq!(seg.destination, Top);

        // Time moving backward never rewinds the cursor.
        assert!(!schedule.advance(0.1));
        assert_eq!(schedule.segment().start, 1.0);
    }

    #[test]
    fn test_cursor_skips_multiple_keyframes() {
        let mut schedule = simple_schedule();
        assert!(schedule.advance(1.7));
        assert_eq!(schedule.segment().start, 1.5);
    }

    #[test]
    fn test_sentinel_extends_last_segment() {
        let mut schedule = simple_schedule();
        // Far past the last authored keyframe: the cursor parks in the final
        // segment (last keyframe → sentinel) instead of running off the end.
        schedule.advance(1e6);
        let seg = schedule.segment();
        assert_eq!(seg.start, 2.0);
        assert!(seg.end > 1e5);
        assert_eq!(seg.origin, Bottom);
        assert_eq!(seg.destination, Bottom);
    }

    #[test]
    fn test_reset_rewinds() {
        let mut schedule = simple_schedule();
        schedule.advance(1.8);
        schedule.reset();
        assert_eq!(schedule.segment().start, 0.0);
    }

    #[test]
    fn test_segment_fraction_endpoints() {
        let seg = Segment {
            start: 2.0,
            end: 4.0,
            origin: Bottom,
            destination: Top,
        };
        assert_eq!(seg.fraction(2.0), 0.0);
        assert_eq!(seg.fraction(3.0), 0.5);
        assert_eq!(seg.fraction(4.0), 1.0);
    }

    #[test]
    #[should_panic]
    fn test_single_entry_schedule_rejected() {
        BeatSchedule::new(vec![(0.0, Bottom)]);
    }

    #[test]
    fn test_beat_times_are_bottom_contacts() {
        let schedule = simple_schedule();
        assert_eq!(schedule.beat_times(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_song_schedule_is_well_formed() {
        let schedule = hall_of_the_mountain_king();
        let beats = schedule.beat_times();
        // Lead-in contact + one landing per bounce + the closing rest.
        assert_eq!(beats.len() as u32, 1 + (24 + 24 + 24 + 16 + 12) + 1);
        for pair in beats.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }
}
