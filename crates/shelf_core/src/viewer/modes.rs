//! crates/shelf_core/src/viewer/modes.rs
//!
//! Display-mode state for the viewer: zoom scale, fullscreen mirroring,
//! immersive reading mode, and the mobile controls/hint timers. Deadlines
//! are plain `Instant`s; the host loop asks for the earliest one and polls
//! when it elapses.

use std::time::{Duration, Instant};

pub const MIN_SCALE: f32 = 0.5;
pub const MAX_SCALE: f32 = 3.0;
pub const SCALE_STEP: f32 = 0.25;

/// Below this window width the layout is treated as mobile.
pub const MOBILE_BREAKPOINT_PX: f32 = 768.0;
/// How long mobile controls stay on screen before auto-hiding.
pub const CONTROLS_HIDE_DELAY: Duration = Duration::from_secs(3);
/// How long the immersive-mode hint stays up before dismissing itself.
pub const IMMERSIVE_HINT_DURATION: Duration = Duration::from_secs(3);

// Width-fit layout on mobile: container minus gutters, but never narrower
// than a readable floor.
const MOBILE_PAGE_GUTTER_PX: f32 = 32.0;
const MIN_PAGE_WIDTH_PX: f32 = 300.0;

/// The independent display toggles of one viewer session.
///
/// Scale only applies on desktop (mobile always width-fits), immersive mode
/// only exists on mobile, and fullscreen state is owned by the platform and
/// merely mirrored here.
#[derive(Debug, Clone)]
pub struct ViewModes {
    scale: f32,
    fullscreen: bool,
    immersive: bool,
    controls_visible: bool,
    controls_deadline: Option<Instant>,
    hint_deadline: Option<Instant>,
    window_width: f32,
    container_width: f32,
}

impl ViewModes {
    /// Starts out as a desktop layout; the first viewport report corrects
    /// this if the client is actually mobile.
    pub fn new() -> Self {
        Self {
            scale: 1.0,
            fullscreen: false,
            immersive: false,
            controls_visible: true,
            controls_deadline: None,
            hint_deadline: None,
            window_width: 1024.0,
            container_width: 1024.0,
        }
    }

    pub fn is_mobile(&self) -> bool {
        self.window_width < MOBILE_BREAKPOINT_PX
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn immersive(&self) -> bool {
        self.immersive
    }

    pub fn controls_visible(&self) -> bool {
        self.controls_visible
    }

    pub fn hint_active(&self) -> bool {
        self.hint_deadline.is_some()
    }

    pub fn container_width(&self) -> f32 {
        self.container_width
    }

    /// Records a viewport report. Leaving the mobile breakpoint force-exits
    /// immersive mode (it is mobile-only) and pins the controls back on.
    pub fn set_viewport(&mut self, window_width: f32, container_width: f32) {
        self.window_width = window_width;
        self.container_width = container_width;
        if !self.is_mobile() {
            self.immersive = false;
            self.controls_visible = true;
            self.controls_deadline = None;
            self.hint_deadline = None;
        }
    }

    //--- Zoom (desktop only; mobile width-fits) ------------------------------

    pub fn zoom_in(&mut self) -> bool {
        self.apply_scale((self.scale + SCALE_STEP).min(MAX_SCALE))
    }

    pub fn zoom_out(&mut self) -> bool {
        self.apply_scale((self.scale - SCALE_STEP).max(MIN_SCALE))
    }

    pub fn reset_zoom(&mut self) -> bool {
        self.apply_scale(1.0)
    }

    fn apply_scale(&mut self, new_scale: f32) -> bool {
        if self.is_mobile() || new_scale == self.scale {
            return false;
        }
        self.scale = new_scale;
        true
    }

    //--- Fullscreen ----------------------------------------------------------

    /// Mirrors a platform fullscreen notification into the session.
    pub fn set_fullscreen(&mut self, active: bool) {
        self.fullscreen = active;
    }

    //--- Immersive mode (mobile only) ---------------------------------------

    /// Enters immersive mode: controls disappear and the exit hint goes up
    /// for a few seconds. Returns false on desktop or when already
    /// immersive.
    pub fn enter_immersive(&mut self, now: Instant) -> bool {
        if !self.is_mobile() || self.immersive {
            return false;
        }
        self.immersive = true;
        self.controls_visible = false;
        self.controls_deadline = None;
        self.hint_deadline = Some(now + IMMERSIVE_HINT_DURATION);
        true
    }

    /// Leaves immersive mode and brings the controls back.
    pub fn exit_immersive(&mut self, now: Instant) -> bool {
        if !self.immersive {
            return false;
        }
        self.immersive = false;
        self.hint_deadline = None;
        self.show_controls(now);
        true
    }

    //--- Controls visibility -------------------------------------------------

    /// Shows the controls. On mobile this also (re)arms the auto-hide
    /// timer; desktop controls are pinned and never expire.
    pub fn show_controls(&mut self, now: Instant) {
        self.controls_visible = true;
        self.controls_deadline = if self.is_mobile() {
            Some(now + CONTROLS_HIDE_DELAY)
        } else {
            None
        };
    }

    /// Flips controls visibility (mobile only, where hiding them means
    /// something). Returns the new visibility, or `None` for a desktop
    /// no-op.
    pub fn toggle_controls(&mut self, now: Instant) -> Option<bool> {
        if !self.is_mobile() {
            return None;
        }
        if self.controls_visible {
            self.controls_visible = false;
            self.controls_deadline = None;
            Some(false)
        } else {
            self.show_controls(now);
            Some(true)
        }
    }

    //--- Deadline polling ----------------------------------------------------

    /// Auto-hides the controls once their deadline elapses. Returns whether
    /// they were hidden by this call.
    pub fn poll_controls(&mut self, now: Instant) -> bool {
        match self.controls_deadline {
            Some(deadline) if now >= deadline => {
                self.controls_visible = false;
                self.controls_deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Dismisses the immersive hint once its deadline elapses. Returns
    /// whether it was dismissed by this call.
    pub fn poll_hint(&mut self, now: Instant) -> bool {
        match self.hint_deadline {
            Some(deadline) if now >= deadline => {
                self.hint_deadline = None;
                true
            }
            _ => false,
        }
    }

    /// The earliest pending deadline, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.controls_deadline, self.hint_deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    //--- Layout --------------------------------------------------------------

    /// The width the page should render at, or `None` on desktop where the
    /// explicit zoom scale applies instead. Immersive mode spans the whole
    /// viewport.
    pub fn page_render_width(&self) -> Option<f32> {
        if !self.is_mobile() {
            return None;
        }
        if self.immersive {
            Some(self.window_width)
        } else {
            Some((self.container_width - MOBILE_PAGE_GUTTER_PX).max(MIN_PAGE_WIDTH_PX))
        }
    }
}

impl Default for ViewModes {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mobile() -> ViewModes {
        let mut modes = ViewModes::new();
        modes.set_viewport(390.0, 390.0);
        modes
    }

    #[test]
    fn zoom_steps_and_clamps_on_desktop() {
        let mut modes = ViewModes::new();
        assert!(modes.zoom_in());
        assert_eq!(modes.scale(), 1.25);
        for _ in 0..20 {
            modes.zoom_in();
        }
        assert_eq!(modes.scale(), MAX_SCALE);
        assert!(!modes.zoom_in());

        for _ in 0..20 {
            modes.zoom_out();
        }
        assert_eq!(modes.scale(), MIN_SCALE);
        assert!(modes.reset_zoom());
        assert_eq!(modes.scale(), 1.0);
    }

    #[test]
    fn zoom_is_a_noop_on_mobile() {
        let mut modes = mobile();
        assert!(!modes.zoom_in());
        assert!(!modes.zoom_out());
        assert_eq!(modes.scale(), 1.0);
    }

    #[test]
    fn immersive_mode_requires_mobile() {
        let now = Instant::now();
        let mut modes = ViewModes::new();
        assert!(!modes.enter_immersive(now));

        let mut modes = mobile();
        assert!(modes.enter_immersive(now));
        assert!(!modes.controls_visible());
        assert!(modes.hint_active());
        // Re-entry is a no-op.
        assert!(!modes.enter_immersive(now));
    }

    #[test]
    fn hint_dismisses_itself_after_three_seconds() {
        let now = Instant::now();
        let mut modes = mobile();
        modes.enter_immersive(now);

        assert!(!modes.poll_hint(now + Duration::from_secs(2)));
        assert!(modes.poll_hint(now + IMMERSIVE_HINT_DURATION));
        assert!(!modes.hint_active());
    }

    #[test]
    fn mobile_controls_auto_hide_after_the_delay() {
        let now = Instant::now();
        let mut modes = mobile();
        modes.show_controls(now);

        assert!(!modes.poll_controls(now + Duration::from_secs(2)));
        assert!(modes.poll_controls(now + CONTROLS_HIDE_DELAY));
        assert!(!modes.controls_visible());
        // Showing again re-arms the deadline.
        modes.show_controls(now + Duration::from_secs(10));
        assert!(modes.next_deadline().is_some());
    }

    #[test]
    fn desktop_controls_never_expire() {
        let now = Instant::now();
        let mut modes = ViewModes::new();
        modes.show_controls(now);
        assert_eq!(modes.next_deadline(), None);
        assert_eq!(modes.toggle_controls(now), None);
        assert!(modes.controls_visible());
    }

    #[test]
    fn leaving_mobile_force_exits_immersive_mode() {
        let now = Instant::now();
        let mut modes = mobile();
        modes.enter_immersive(now);

        modes.set_viewport(1280.0, 900.0);
        assert!(!modes.immersive());
        assert!(modes.controls_visible());
        assert!(!modes.hint_active());
        assert_eq!(modes.next_deadline(), None);
    }

    #[test]
    fn page_width_fits_the_mobile_container() {
        let mut modes = mobile();
        assert_eq!(modes.page_render_width(), Some(390.0 - 32.0));

        // Narrow containers bottom out at the readable floor.
        modes.set_viewport(320.0, 310.0);
        assert_eq!(modes.page_render_width(), Some(300.0));

        // Immersive mode spans the whole viewport.
        modes.enter_immersive(Instant::now());
        assert_eq!(modes.page_render_width(), Some(320.0));
    }

    #[test]
    fn desktop_has_no_fitted_width() {
        assert_eq!(ViewModes::new().page_render_width(), None);
    }
}
