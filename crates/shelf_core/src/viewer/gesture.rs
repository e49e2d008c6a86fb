//! crates/shelf_core/src/viewer/gesture.rs
//!
//! Turns raw touch sequences into viewer gestures. Classification is a pure
//! function over a completed [`GestureSample`]; the stateful part
//! ([`TouchTracker`]) only tracks the in-flight sequence and the long-press
//! deadline.

use std::time::{Duration, Instant};

/// Minimum horizontal travel for a swipe.
pub const SWIPE_THRESHOLD_PX: f32 = 50.0;
/// Movement beyond this on either axis cancels a pending long-press.
pub const JITTER_THRESHOLD_PX: f32 = 10.0;
/// How long a touch must be held (without jitter) to fire a long-press.
pub const LONG_PRESS_DURATION: Duration = Duration::from_millis(500);

// Tap zones: leftmost 30% / middle 40% / rightmost 30% of the surface.
const LEFT_ZONE_END: f32 = 0.3;
const RIGHT_ZONE_START: f32 = 0.7;

/// A classified gesture. Taps are bucketed by where on the viewing surface
/// the touch landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    SwipeLeft,
    SwipeRight,
    TapLeft,
    TapCenter,
    TapRight,
    LongPress,
}

/// Everything known about a completed touch sequence.
#[derive(Debug, Clone, Copy)]
pub struct GestureSample {
    pub start_x: f32,
    pub start_y: f32,
    pub end_x: f32,
    pub end_y: f32,
    /// Width of the viewing surface, for tap-zone bucketing.
    pub surface_width: f32,
    /// Whether the long-press timer fired during this sequence.
    pub long_press_fired: bool,
}

/// Classifies a completed touch sequence into at most one gesture.
///
/// Rules, in order:
/// - a fired long-press consumes the sequence (`LongPress`), so the lift
///   never doubles as a tap or swipe;
/// - horizontal travel past the swipe threshold that also dominates the
///   vertical travel is a swipe, by sign of the displacement. A perfect
///   diagonal counts as horizontal;
/// - horizontal travel within the threshold is a tap, bucketed by the
///   start position;
/// - anything else (a vertically dominated drag) is no gesture at all:
///   that movement belongs to native scrolling.
pub fn classify(sample: &GestureSample) -> Option<Gesture> {
    if sample.long_press_fired {
        return Some(Gesture::LongPress);
    }

    let dx = sample.end_x - sample.start_x;
    let dy = sample.end_y - sample.start_y;

    if dx.abs() > SWIPE_THRESHOLD_PX && dx.abs() >= dy.abs() {
        return Some(if dx < 0.0 {
            Gesture::SwipeLeft
        } else {
            Gesture::SwipeRight
        });
    }

    if dx.abs() <= SWIPE_THRESHOLD_PX {
        if sample.surface_width <= 0.0 {
            // No usable width to bucket against.
            return Some(Gesture::TapCenter);
        }
        let position = sample.start_x / sample.surface_width;
        return Some(if position < LEFT_ZONE_END {
            Gesture::TapLeft
        } else if position > RIGHT_ZONE_START {
            Gesture::TapRight
        } else {
            Gesture::TapCenter
        });
    }

    None
}

struct ActiveTouch {
    start_x: f32,
    start_y: f32,
    long_press_deadline: Option<Instant>,
    long_press_fired: bool,
}

/// Tracks one in-flight touch sequence.
///
/// The host loop is expected to call [`poll_long_press`](Self::poll_long_press)
/// once the deadline from [`long_press_deadline`](Self::long_press_deadline)
/// elapses; the long-press action happens while the finger is still down,
/// not on lift.
#[derive(Default)]
pub struct TouchTracker {
    active: Option<ActiveTouch>,
}

impl TouchTracker {
    pub fn new() -> Self {
        Self { active: None }
    }

    /// Begins a sequence. A second touch-start replaces any sequence still
    /// in flight.
    pub fn touch_start(&mut self, x: f32, y: f32, at: Instant) {
        self.active = Some(ActiveTouch {
            start_x: x,
            start_y: y,
            long_press_deadline: Some(at + LONG_PRESS_DURATION),
            long_press_fired: false,
        });
    }

    /// Records movement. Once the touch drifts past the jitter threshold on
    /// either axis the pending long-press is cancelled; the intent is
    /// clearly a drag.
    pub fn touch_move(&mut self, x: f32, y: f32) {
        if let Some(touch) = self.active.as_mut() {
            if (x - touch.start_x).abs() > JITTER_THRESHOLD_PX
                || (y - touch.start_y).abs() > JITTER_THRESHOLD_PX
            {
                touch.long_press_deadline = None;
            }
        }
    }

    /// The instant at which the pending long-press fires, if one is armed.
    pub fn long_press_deadline(&self) -> Option<Instant> {
        self.active
            .as_ref()
            .filter(|t| !t.long_press_fired)
            .and_then(|t| t.long_press_deadline)
    }

    /// Fires the long-press if its deadline has elapsed. Fires at most once
    /// per sequence.
    pub fn poll_long_press(&mut self, now: Instant) -> bool {
        let Some(touch) = self.active.as_mut() else {
            return false;
        };
        match touch.long_press_deadline {
            Some(deadline) if !touch.long_press_fired && now >= deadline => {
                touch.long_press_fired = true;
                true
            }
            _ => false,
        }
    }

    /// Ends the sequence and classifies it. A stray touch-end with no
    /// matching start yields nothing.
    pub fn touch_end(&mut self, x: f32, y: f32, surface_width: f32) -> Option<Gesture> {
        let touch = self.active.take()?;
        classify(&GestureSample {
            start_x: touch.start_x,
            start_y: touch.start_y,
            end_x: x,
            end_y: y,
            surface_width,
            long_press_fired: touch.long_press_fired,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(start_x: f32, start_y: f32, end_x: f32, end_y: f32) -> GestureSample {
        GestureSample {
            start_x,
            start_y,
            end_x,
            end_y,
            surface_width: 400.0,
            long_press_fired: false,
        }
    }

    #[test]
    fn horizontal_drag_past_threshold_is_a_swipe() {
        assert_eq!(classify(&sample(300.0, 400.0, 100.0, 405.0)), Some(Gesture::SwipeLeft));
        assert_eq!(classify(&sample(100.0, 400.0, 300.0, 395.0)), Some(Gesture::SwipeRight));
    }

    #[test]
    fn short_horizontal_travel_is_always_a_tap() {
        // Anything under the swipe threshold must classify as a tap,
        // never a swipe, wherever it lands.
        for dx in [-49.0, -20.0, 0.0, 3.0, 49.0] {
            let got = classify(&sample(200.0, 100.0, 200.0 + dx, 100.0));
            assert_eq!(got, Some(Gesture::TapCenter), "dx = {}", dx);
        }
    }

    #[test]
    fn exactly_threshold_travel_does_not_swipe() {
        // "Past the threshold" is strict.
        assert_eq!(classify(&sample(200.0, 100.0, 250.0, 100.0)), Some(Gesture::TapCenter));
    }

    #[test]
    fn taps_bucket_by_start_position() {
        assert_eq!(classify(&sample(40.0, 100.0, 42.0, 101.0)), Some(Gesture::TapLeft));
        assert_eq!(classify(&sample(200.0, 100.0, 200.0, 100.0)), Some(Gesture::TapCenter));
        assert_eq!(classify(&sample(390.0, 100.0, 388.0, 99.0)), Some(Gesture::TapRight));
        // Zone edges belong to the center.
        assert_eq!(classify(&sample(120.0, 0.0, 120.0, 0.0)), Some(Gesture::TapCenter));
        assert_eq!(classify(&sample(280.0, 0.0, 280.0, 0.0)), Some(Gesture::TapCenter));
    }

    #[test]
    fn vertically_dominated_drags_are_no_gesture() {
        // 60px across but 200px down: the user is scrolling.
        assert_eq!(classify(&sample(200.0, 100.0, 260.0, 300.0)), None);
    }

    #[test]
    fn perfect_diagonal_counts_as_horizontal() {
        assert_eq!(classify(&sample(300.0, 100.0, 220.0, 180.0)), Some(Gesture::SwipeLeft));
    }

    #[test]
    fn fired_long_press_suppresses_tap_and_swipe() {
        let mut s = sample(300.0, 400.0, 100.0, 405.0);
        s.long_press_fired = true;
        assert_eq!(classify(&s), Some(Gesture::LongPress));

        let mut s = sample(200.0, 100.0, 201.0, 100.0);
        s.long_press_fired = true;
        assert_eq!(classify(&s), Some(Gesture::LongPress));
    }

    #[test]
    fn tracker_fires_long_press_after_the_hold_duration() {
        let t0 = Instant::now();
        let mut tracker = TouchTracker::new();
        tracker.touch_start(100.0, 100.0, t0);

        assert!(!tracker.poll_long_press(t0 + Duration::from_millis(499)));
        assert!(tracker.poll_long_press(t0 + LONG_PRESS_DURATION));
        // Only once per sequence.
        assert!(!tracker.poll_long_press(t0 + Duration::from_secs(2)));
        // And the lift is consumed by the long-press.
        assert_eq!(tracker.touch_end(101.0, 100.0, 400.0), Some(Gesture::LongPress));
    }

    #[test]
    fn jitter_cancels_the_pending_long_press() {
        let t0 = Instant::now();
        let mut tracker = TouchTracker::new();
        tracker.touch_start(100.0, 100.0, t0);
        tracker.touch_move(100.0, 115.0);

        assert_eq!(tracker.long_press_deadline(), None);
        assert!(!tracker.poll_long_press(t0 + Duration::from_secs(1)));
        // The sequence still classifies normally on lift.
        assert_eq!(tracker.touch_end(100.0, 115.0, 400.0), Some(Gesture::TapLeft));
    }

    #[test]
    fn movement_within_jitter_keeps_the_long_press_armed() {
        let t0 = Instant::now();
        let mut tracker = TouchTracker::new();
        tracker.touch_start(100.0, 100.0, t0);
        tracker.touch_move(105.0, 95.0);

        assert!(tracker.long_press_deadline().is_some());
        assert!(tracker.poll_long_press(t0 + LONG_PRESS_DURATION));
    }

    #[test]
    fn stray_touch_end_is_ignored() {
        let mut tracker = TouchTracker::new();
        assert_eq!(tracker.touch_end(10.0, 10.0, 400.0), None);
    }
}
