//! crates/shelf_core/src/viewer/session.rs
//!
//! The viewer session state machine. Raw client input (touches, button
//! intents, viewport and platform notifications) goes in; state-change
//! events come out. The session holds no IO: persistence and note
//! fetching are driven by the host reacting to `ProgressDirty` and
//! `NotesInvalidated` events.

use crate::viewer::gesture::{Gesture, TouchTracker};
use crate::viewer::modes::ViewModes;
use crate::viewer::nav::PageNavigator;
use std::time::Instant;

/// One unit of client input, already decoded from the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerInput {
    /// The document finished loading and reported its page count.
    DocumentLoaded { total_pages: u32 },
    /// The document failed to load or render.
    DocumentFailed { message: String },
    /// The client's window and viewing-surface widths, reported on open
    /// and on resize.
    Viewport { window_width: f32, container_width: f32 },
    TouchStart { x: f32, y: f32 },
    TouchMove { x: f32, y: f32 },
    TouchEnd { x: f32, y: f32 },
    NextPage,
    PreviousPage,
    JumpToPage { page: u32 },
    ZoomIn,
    ZoomOut,
    ResetZoom,
    ToggleFullscreen,
    /// The platform granted or revoked fullscreen; the session mirrors it.
    FullscreenChanged { active: bool },
    EnterImmersive,
    ExitImmersive,
    OpenNotes,
    CloseNotes,
}

/// A state change the host should act on or forward to the client.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    /// The committed page changed (navigation or load).
    PageChanged {
        page: u32,
        total_pages: u32,
        percent: f32,
    },
    /// The position should be persisted once the reader settles.
    ProgressDirty { page: u32, total_pages: u32 },
    /// The notes overlay is open and its page changed; re-fetch.
    NotesInvalidated { page: u32 },
    ScaleChanged { scale: f32 },
    /// The fitted page width changed; `None` means the desktop scale
    /// applies instead.
    LayoutChanged { page_width: Option<f32> },
    ControlsChanged { visible: bool },
    ImmersiveChanged { active: bool },
    HintShown,
    HintDismissed,
    /// Ask the client to enter or leave platform fullscreen.
    FullscreenRequested { enter: bool },
    LoadFailed { message: String },
}

/// All ephemeral state of one open viewer.
///
/// Inputs are applied strictly in arrival order; the caller supplies the
/// clock, which keeps every transition deterministic and testable.
pub struct ViewerSession {
    nav: PageNavigator,
    modes: ViewModes,
    touch: TouchTracker,
    notes_open: bool,
}

impl ViewerSession {
    /// Starts a session at the stored reading position (or page 1).
    pub fn new(starting_page: u32) -> Self {
        Self {
            nav: PageNavigator::new(starting_page),
            modes: ViewModes::new(),
            touch: TouchTracker::new(),
            notes_open: false,
        }
    }

    pub fn page(&self) -> u32 {
        self.nav.page()
    }

    pub fn total_pages(&self) -> Option<u32> {
        self.nav.total_pages()
    }

    pub fn scale(&self) -> f32 {
        self.modes.scale()
    }

    pub fn immersive(&self) -> bool {
        self.modes.immersive()
    }

    pub fn controls_visible(&self) -> bool {
        self.modes.controls_visible()
    }

    pub fn notes_open(&self) -> bool {
        self.notes_open
    }

    pub fn is_mobile(&self) -> bool {
        self.modes.is_mobile()
    }

    /// Applies one input and returns the resulting events, in order.
    pub fn handle(&mut self, input: ViewerInput, now: Instant) -> Vec<ViewerEvent> {
        match input {
            ViewerInput::DocumentLoaded { total_pages } => {
                self.nav.set_total_pages(total_pages);
                let mut events = self.position_events();
                events.push(ViewerEvent::LayoutChanged {
                    page_width: self.modes.page_render_width(),
                });
                if self.notes_open {
                    events.push(ViewerEvent::NotesInvalidated {
                        page: self.nav.page(),
                    });
                }
                events
            }
            ViewerInput::DocumentFailed { message } => {
                vec![ViewerEvent::LoadFailed { message }]
            }
            ViewerInput::Viewport {
                window_width,
                container_width,
            } => self.apply_viewport(window_width, container_width),
            ViewerInput::TouchStart { x, y } => {
                self.touch.touch_start(x, y, now);
                Vec::new()
            }
            ViewerInput::TouchMove { x, y } => {
                self.touch.touch_move(x, y);
                Vec::new()
            }
            ViewerInput::TouchEnd { x, y } => {
                match self.touch.touch_end(x, y, self.modes.container_width()) {
                    // A fired long-press already acted when the timer
                    // elapsed; the lift is inert.
                    Some(Gesture::LongPress) | None => Vec::new(),
                    Some(gesture) => self.apply_gesture(gesture, now),
                }
            }
            ViewerInput::NextPage => self.advance(now),
            ViewerInput::PreviousPage => self.go_back(now),
            ViewerInput::JumpToPage { page } => {
                if self.nav.jump_to(page) {
                    self.page_changed_events(now)
                } else {
                    Vec::new()
                }
            }
            ViewerInput::ZoomIn => self.scale_events(|m| m.zoom_in()),
            ViewerInput::ZoomOut => self.scale_events(|m| m.zoom_out()),
            ViewerInput::ResetZoom => self.scale_events(|m| m.reset_zoom()),
            ViewerInput::ToggleFullscreen => {
                vec![ViewerEvent::FullscreenRequested {
                    enter: !self.modes.fullscreen(),
                }]
            }
            ViewerInput::FullscreenChanged { active } => {
                self.modes.set_fullscreen(active);
                Vec::new()
            }
            ViewerInput::EnterImmersive => self.enter_immersive(now),
            ViewerInput::ExitImmersive => self.exit_immersive(now),
            ViewerInput::OpenNotes => {
                self.notes_open = true;
                vec![ViewerEvent::NotesInvalidated {
                    page: self.nav.page(),
                }]
            }
            ViewerInput::CloseNotes => {
                self.notes_open = false;
                Vec::new()
            }
        }
    }

    /// Fires whatever deadlines have elapsed: the long-press (which acts
    /// while the finger is still down), the immersive hint, and the mobile
    /// controls auto-hide.
    pub fn poll(&mut self, now: Instant) -> Vec<ViewerEvent> {
        let mut events = Vec::new();
        if self.touch.poll_long_press(now) {
            events.extend(self.long_press(now));
        }
        if self.modes.poll_hint(now) {
            events.push(ViewerEvent::HintDismissed);
        }
        if self.modes.poll_controls(now) {
            events.push(ViewerEvent::ControlsChanged { visible: false });
        }
        events
    }

    /// The earliest pending deadline the host loop should wake up for.
    pub fn next_deadline(&self) -> Option<Instant> {
        [self.touch.long_press_deadline(), self.modes.next_deadline()]
            .into_iter()
            .flatten()
            .min()
    }

    //--- Transition helpers --------------------------------------------------

    fn advance(&mut self, now: Instant) -> Vec<ViewerEvent> {
        if self.nav.next() {
            self.page_changed_events(now)
        } else {
            Vec::new()
        }
    }

    fn go_back(&mut self, now: Instant) -> Vec<ViewerEvent> {
        if self.nav.previous() {
            self.page_changed_events(now)
        } else {
            Vec::new()
        }
    }

    /// The position report emitted on load and after every committed
    /// change: the new page plus a persistence request.
    fn position_events(&self) -> Vec<ViewerEvent> {
        let page = self.nav.page();
        let total_pages = self.nav.total_pages().unwrap_or(page);
        let percent = (page as f32 / total_pages as f32) * 100.0;
        vec![
            ViewerEvent::PageChanged {
                page,
                total_pages,
                percent,
            },
            ViewerEvent::ProgressDirty { page, total_pages },
        ]
    }

    fn page_changed_events(&mut self, now: Instant) -> Vec<ViewerEvent> {
        let mut events = self.position_events();
        // Every successful page change re-shows the mobile controls and
        // restarts their auto-hide timer.
        if self.modes.is_mobile() {
            let was_visible = self.modes.controls_visible();
            self.modes.show_controls(now);
            if !was_visible {
                events.push(ViewerEvent::ControlsChanged { visible: true });
            }
        }
        if self.notes_open {
            events.push(ViewerEvent::NotesInvalidated {
                page: self.nav.page(),
            });
        }
        events
    }

    fn apply_gesture(&mut self, gesture: Gesture, now: Instant) -> Vec<ViewerEvent> {
        match gesture {
            // Swiping the content left reads forward.
            Gesture::SwipeLeft | Gesture::TapRight => self.advance(now),
            Gesture::SwipeRight | Gesture::TapLeft => self.go_back(now),
            Gesture::TapCenter => match self.modes.toggle_controls(now) {
                Some(visible) => vec![ViewerEvent::ControlsChanged { visible }],
                None => Vec::new(),
            },
            // Handled when the timer fires, never on lift.
            Gesture::LongPress => Vec::new(),
        }
    }

    fn long_press(&mut self, now: Instant) -> Vec<ViewerEvent> {
        if !self.modes.is_mobile() {
            return Vec::new();
        }
        if self.modes.immersive() {
            // Peek the controls without leaving immersive mode.
            let was_visible = self.modes.controls_visible();
            self.modes.show_controls(now);
            if was_visible {
                Vec::new()
            } else {
                vec![ViewerEvent::ControlsChanged { visible: true }]
            }
        } else {
            self.enter_immersive(now)
        }
    }

    fn enter_immersive(&mut self, now: Instant) -> Vec<ViewerEvent> {
        let was_visible = self.modes.controls_visible();
        if !self.modes.enter_immersive(now) {
            return Vec::new();
        }
        let mut events = vec![ViewerEvent::ImmersiveChanged { active: true }];
        if was_visible {
            events.push(ViewerEvent::ControlsChanged { visible: false });
        }
        events.push(ViewerEvent::HintShown);
        events.push(ViewerEvent::LayoutChanged {
            page_width: self.modes.page_render_width(),
        });
        events
    }

    fn exit_immersive(&mut self, now: Instant) -> Vec<ViewerEvent> {
        let had_hint = self.modes.hint_active();
        let was_visible = self.modes.controls_visible();
        if !self.modes.exit_immersive(now) {
            return Vec::new();
        }
        let mut events = vec![ViewerEvent::ImmersiveChanged { active: false }];
        if !was_visible {
            events.push(ViewerEvent::ControlsChanged { visible: true });
        }
        if had_hint {
            events.push(ViewerEvent::HintDismissed);
        }
        events.push(ViewerEvent::LayoutChanged {
            page_width: self.modes.page_render_width(),
        });
        events
    }

    fn apply_viewport(&mut self, window_width: f32, container_width: f32) -> Vec<ViewerEvent> {
        let was_immersive = self.modes.immersive();
        let was_visible = self.modes.controls_visible();
        let had_hint = self.modes.hint_active();
        self.modes.set_viewport(window_width, container_width);

        let mut events = Vec::new();
        if was_immersive && !self.modes.immersive() {
            events.push(ViewerEvent::ImmersiveChanged { active: false });
        }
        if self.modes.controls_visible() != was_visible {
            events.push(ViewerEvent::ControlsChanged {
                visible: self.modes.controls_visible(),
            });
        }
        if had_hint && !self.modes.hint_active() {
            events.push(ViewerEvent::HintDismissed);
        }
        events.push(ViewerEvent::LayoutChanged {
            page_width: self.modes.page_render_width(),
        });
        events
    }

    fn scale_events<F>(&mut self, op: F) -> Vec<ViewerEvent>
    where
        F: FnOnce(&mut ViewModes) -> bool,
    {
        if op(&mut self.modes) {
            vec![ViewerEvent::ScaleChanged {
                scale: self.modes.scale(),
            }]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewer::gesture::LONG_PRESS_DURATION;
    use crate::viewer::modes::{CONTROLS_HIDE_DELAY, IMMERSIVE_HINT_DURATION};
    use std::time::Duration;

    const MOBILE_WIDTH: f32 = 390.0;

    fn mobile_session(total_pages: u32) -> (ViewerSession, Instant) {
        let now = Instant::now();
        let mut session = ViewerSession::new(1);
        session.handle(
            ViewerInput::Viewport {
                window_width: MOBILE_WIDTH,
                container_width: MOBILE_WIDTH,
            },
            now,
        );
        session.handle(ViewerInput::DocumentLoaded { total_pages }, now);
        (session, now)
    }

    fn desktop_session(total_pages: u32) -> (ViewerSession, Instant) {
        let now = Instant::now();
        let mut session = ViewerSession::new(1);
        session.handle(
            ViewerInput::Viewport {
                window_width: 1280.0,
                container_width: 900.0,
            },
            now,
        );
        session.handle(ViewerInput::DocumentLoaded { total_pages }, now);
        (session, now)
    }

    fn page_changed(events: &[ViewerEvent]) -> Option<u32> {
        events.iter().find_map(|e| match e {
            ViewerEvent::PageChanged { page, .. } => Some(*page),
            _ => None,
        })
    }

    fn swipe(session: &mut ViewerSession, from_x: f32, to_x: f32, now: Instant) -> Vec<ViewerEvent> {
        session.handle(ViewerInput::TouchStart { x: from_x, y: 400.0 }, now);
        session.handle(ViewerInput::TouchEnd { x: to_x, y: 405.0 }, now)
    }

    #[test]
    fn swipe_left_reads_forward() {
        let (mut session, now) = mobile_session(10);
        let events = swipe(&mut session, 300.0, 100.0, now);
        assert_eq!(page_changed(&events), Some(2));
        assert!(events.contains(&ViewerEvent::ProgressDirty { page: 2, total_pages: 10 }));
    }

    #[test]
    fn swipe_right_goes_back() {
        let (mut session, now) = mobile_session(10);
        session.handle(ViewerInput::JumpToPage { page: 5 }, now);
        let events = swipe(&mut session, 100.0, 300.0, now);
        assert_eq!(page_changed(&events), Some(4));
    }

    #[test]
    fn swipe_at_the_last_page_is_ignored() {
        let (mut session, now) = mobile_session(3);
        session.handle(ViewerInput::JumpToPage { page: 3 }, now);
        let events = swipe(&mut session, 300.0, 100.0, now);
        assert_eq!(page_changed(&events), None);
        assert_eq!(session.page(), 3);
    }

    #[test]
    fn left_zone_tap_at_page_one_does_nothing() {
        let (mut session, now) = mobile_session(10);
        // 10% of the surface width: squarely in the previous-page zone.
        session.handle(ViewerInput::TouchStart { x: 39.0, y: 200.0 }, now);
        let events = session.handle(ViewerInput::TouchEnd { x: 39.0, y: 201.0 }, now);
        assert!(events.is_empty());
        assert_eq!(session.page(), 1);
    }

    #[test]
    fn right_zone_tap_reads_forward() {
        let (mut session, now) = mobile_session(10);
        session.handle(ViewerInput::TouchStart { x: 360.0, y: 200.0 }, now);
        let events = session.handle(ViewerInput::TouchEnd { x: 361.0, y: 200.0 }, now);
        assert_eq!(page_changed(&events), Some(2));
    }

    #[test]
    fn center_tap_toggles_the_mobile_controls() {
        let (mut session, now) = mobile_session(10);
        assert!(session.controls_visible());
        session.handle(ViewerInput::TouchStart { x: 195.0, y: 200.0 }, now);
        let events = session.handle(ViewerInput::TouchEnd { x: 195.0, y: 200.0 }, now);
        assert_eq!(events, vec![ViewerEvent::ControlsChanged { visible: false }]);
        assert!(!session.controls_visible());
    }

    #[test]
    fn jump_requests_clamp_to_the_page_range() {
        let (mut session, now) = mobile_session(10);
        let events = session.handle(ViewerInput::JumpToPage { page: 15 }, now);
        assert_eq!(page_changed(&events), Some(10));

        let events = session.handle(ViewerInput::JumpToPage { page: 0 }, now);
        assert_eq!(page_changed(&events), Some(1));
    }

    #[test]
    fn navigation_before_the_document_loads_is_inert() {
        let now = Instant::now();
        let mut session = ViewerSession::new(1);
        assert!(session.handle(ViewerInput::NextPage, now).is_empty());
        assert!(session
            .handle(ViewerInput::JumpToPage { page: 7 }, now)
            .is_empty());
    }

    #[test]
    fn loading_reports_the_clamped_stored_position() {
        let now = Instant::now();
        let mut session = ViewerSession::new(50);
        let events = session.handle(ViewerInput::DocumentLoaded { total_pages: 20 }, now);
        assert_eq!(page_changed(&events), Some(20));
        assert!(events.contains(&ViewerEvent::ProgressDirty { page: 20, total_pages: 20 }));
    }

    #[test]
    fn load_failure_is_reported() {
        let now = Instant::now();
        let mut session = ViewerSession::new(1);
        let events = session.handle(
            ViewerInput::DocumentFailed {
                message: "corrupt xref table".into(),
            },
            now,
        );
        assert_eq!(
            events,
            vec![ViewerEvent::LoadFailed {
                message: "corrupt xref table".into()
            }]
        );
    }

    #[test]
    fn long_press_enters_immersive_mode_on_mobile() {
        let (mut session, now) = mobile_session(10);
        session.handle(ViewerInput::TouchStart { x: 200.0, y: 300.0 }, now);
        let events = session.poll(now + LONG_PRESS_DURATION);

        assert!(events.contains(&ViewerEvent::ImmersiveChanged { active: true }));
        assert!(events.contains(&ViewerEvent::HintShown));
        assert!(session.immersive());
        assert!(!session.controls_visible());

        // The lift must not re-trigger anything.
        let events = session.handle(ViewerInput::TouchEnd { x: 200.0, y: 300.0 }, now + Duration::from_secs(1));
        assert!(events.is_empty());
    }

    #[test]
    fn long_press_in_immersive_mode_peeks_the_controls() {
        let (mut session, t0) = mobile_session(10);
        session.handle(ViewerInput::EnterImmersive, t0);

        let press = t0 + Duration::from_secs(10);
        session.handle(ViewerInput::TouchStart { x: 200.0, y: 300.0 }, press);
        let fired = press + LONG_PRESS_DURATION;
        let events = session.poll(fired);
        assert!(events.contains(&ViewerEvent::ControlsChanged { visible: true }));
        assert!(session.immersive(), "peek must not exit immersive mode");

        session.handle(ViewerInput::TouchEnd { x: 200.0, y: 300.0 }, fired);

        // Controls stay up for the hide delay, then go away on their own.
        assert!(session.poll(fired + CONTROLS_HIDE_DELAY - Duration::from_millis(1)).is_empty());
        let events = session.poll(fired + CONTROLS_HIDE_DELAY);
        assert!(events.contains(&ViewerEvent::ControlsChanged { visible: false }));
        assert!(session.immersive());
    }

    #[test]
    fn long_press_on_desktop_does_nothing() {
        let (mut session, now) = desktop_session(10);
        session.handle(ViewerInput::TouchStart { x: 400.0, y: 300.0 }, now);
        assert!(session.poll(now + LONG_PRESS_DURATION).is_empty());
        assert!(!session.immersive());
    }

    #[test]
    fn immersive_hint_dismisses_itself() {
        let (mut session, now) = mobile_session(10);
        session.handle(ViewerInput::EnterImmersive, now);
        let events = session.poll(now + IMMERSIVE_HINT_DURATION);
        assert_eq!(events, vec![ViewerEvent::HintDismissed]);
    }

    #[test]
    fn explicit_exit_leaves_immersive_mode() {
        let (mut session, now) = mobile_session(10);
        session.handle(ViewerInput::EnterImmersive, now);
        let events = session.handle(ViewerInput::ExitImmersive, now + Duration::from_secs(1));

        assert!(events.contains(&ViewerEvent::ImmersiveChanged { active: false }));
        assert!(events.contains(&ViewerEvent::ControlsChanged { visible: true }));
        assert!(!session.immersive());
    }

    #[test]
    fn immersive_mode_is_rejected_on_desktop() {
        let (mut session, now) = desktop_session(10);
        assert!(session.handle(ViewerInput::EnterImmersive, now).is_empty());
        assert!(!session.immersive());
    }

    #[test]
    fn resizing_to_desktop_force_exits_immersive_mode() {
        let (mut session, now) = mobile_session(10);
        session.handle(ViewerInput::EnterImmersive, now);
        let events = session.handle(
            ViewerInput::Viewport {
                window_width: 1280.0,
                container_width: 900.0,
            },
            now,
        );

        assert!(events.contains(&ViewerEvent::ImmersiveChanged { active: false }));
        assert!(events.contains(&ViewerEvent::ControlsChanged { visible: true }));
        assert!(events.contains(&ViewerEvent::LayoutChanged { page_width: None }));
    }

    #[test]
    fn zoom_applies_on_desktop_only() {
        let (mut session, now) = desktop_session(10);
        let events = session.handle(ViewerInput::ZoomIn, now);
        assert_eq!(events, vec![ViewerEvent::ScaleChanged { scale: 1.25 }]);

        let (mut session, now) = mobile_session(10);
        assert!(session.handle(ViewerInput::ZoomIn, now).is_empty());
    }

    #[test]
    fn fullscreen_is_requested_then_mirrored() {
        let (mut session, now) = desktop_session(10);
        let events = session.handle(ViewerInput::ToggleFullscreen, now);
        assert_eq!(events, vec![ViewerEvent::FullscreenRequested { enter: true }]);

        // Until the platform confirms, another toggle still asks to enter.
        let events = session.handle(ViewerInput::ToggleFullscreen, now);
        assert_eq!(events, vec![ViewerEvent::FullscreenRequested { enter: true }]);

        session.handle(ViewerInput::FullscreenChanged { active: true }, now);
        let events = session.handle(ViewerInput::ToggleFullscreen, now);
        assert_eq!(events, vec![ViewerEvent::FullscreenRequested { enter: false }]);
    }

    #[test]
    fn open_notes_follow_the_current_page() {
        let (mut session, now) = mobile_session(10);
        let events = session.handle(ViewerInput::OpenNotes, now);
        assert_eq!(events, vec![ViewerEvent::NotesInvalidated { page: 1 }]);

        let events = session.handle(ViewerInput::NextPage, now);
        assert!(events.contains(&ViewerEvent::NotesInvalidated { page: 2 }));

        session.handle(ViewerInput::CloseNotes, now);
        let events = session.handle(ViewerInput::NextPage, now);
        assert!(!events
            .iter()
            .any(|e| matches!(e, ViewerEvent::NotesInvalidated { .. })));
    }

    #[test]
    fn page_changes_reshow_hidden_mobile_controls() {
        let (mut session, now) = mobile_session(10);
        // Hide via center tap.
        session.handle(ViewerInput::TouchStart { x: 195.0, y: 200.0 }, now);
        session.handle(ViewerInput::TouchEnd { x: 195.0, y: 200.0 }, now);
        assert!(!session.controls_visible());

        let events = session.handle(ViewerInput::NextPage, now);
        assert!(events.contains(&ViewerEvent::ControlsChanged { visible: true }));

        // And the auto-hide timer is armed again.
        let events = session.poll(now + CONTROLS_HIDE_DELAY);
        assert!(events.contains(&ViewerEvent::ControlsChanged { visible: false }));
    }

    #[test]
    fn deadlines_surface_the_earliest_timer() {
        let (mut session, now) = mobile_session(10);
        assert_eq!(session.next_deadline(), None);

        session.handle(ViewerInput::NextPage, now); // arms controls hide at +3s
        session.handle(ViewerInput::TouchStart { x: 200.0, y: 300.0 }, now); // long-press at +500ms
        assert_eq!(session.next_deadline(), Some(now + LONG_PRESS_DURATION));
    }
}
