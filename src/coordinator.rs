//! Hover trigger state machine
//!
//! Every pointer sample, timer expiry and control call lands here on the same
//! thread. The coordinator owns the overlay state and both timers; the overlay
//! surface only ever sees `present`, `dismiss` and `retarget`.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::constants::{trigger, validation};
use crate::display::{resolve_display, Display, DisplayId, DisplaySource};
use crate::geometry::{Point, Rect};
use crate::overlay::{OverlayLayout, OverlaySurface, SwitchPanel};
use crate::scheduler::DebounceScheduler;
use crate::trigger_zone;

/// Runtime-tunable trigger settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerConfig {
    pub trigger_width_ratio: f64,
    pub show_delay: Duration,
    pub hide_delay: Duration,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            trigger_width_ratio: trigger::DEFAULT_WIDTH_RATIO,
            show_delay: Duration::ZERO,
            hide_delay: Duration::from_millis(trigger::DEFAULT_HIDE_DELAY_MS),
        }
    }
}

/// Seconds to a delay at microsecond resolution. Negative and NaN become
/// zero, anything past `validation::MAX_DELAY_MS` is capped there.
pub fn clamp_delay(seconds: f64) -> Duration {
    let micros = (seconds * 1_000_000.0).round();
    if micros.is_nan() || micros <= 0.0 {
        return Duration::ZERO;
    }
    let max_micros = validation::MAX_DELAY_MS * 1000.0;
    Duration::from_micros(micros.min(max_micros) as u64)
}

/// Ratios outside (0, 1] are pulled back in; garbage falls back to the default
pub fn clamp_ratio(ratio: f64) -> f64 {
    if !ratio.is_finite() || ratio <= 0.0 {
        trigger::DEFAULT_WIDTH_RATIO
    } else {
        ratio.min(1.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TimerAction {
    Present(Display),
    Dismiss,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayState {
    Hidden,
    PendingShow {
        display: DisplayId,
        deadline: Instant,
    },
    Visible {
        display: Display,
        bounds: Rect,
    },
    /// `pinned` marks a self-expiring `show_once` presentation that pointer
    /// movement must not extend or cut short
    PendingHide {
        display: Display,
        bounds: Rect,
        deadline: Instant,
        pinned: bool,
    },
}

impl OverlayState {
    pub fn phase(&self) -> OverlayPhase {
        match self {
            OverlayState::Hidden => OverlayPhase::Hidden,
            OverlayState::PendingShow { .. } => OverlayPhase::PendingShow,
            OverlayState::Visible { .. } => OverlayPhase::Visible,
            OverlayState::PendingHide { .. } => OverlayPhase::PendingHide,
        }
    }

    pub fn overlay_bounds(&self) -> Option<Rect> {
        match self {
            OverlayState::Visible { bounds, .. } | OverlayState::PendingHide { bounds, .. } => {
                Some(*bounds)
            }
            _ => None,
        }
    }

    pub fn shown_display(&self) -> Option<&Display> {
        match self {
            OverlayState::Visible { display, .. } | OverlayState::PendingHide { display, .. } => {
                Some(display)
            }
            _ => None,
        }
    }
}

/// Payload-free view of [`OverlayState`] for status reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverlayPhase {
    Hidden,
    PendingShow,
    Visible,
    PendingHide,
}

pub struct HoverTriggerCoordinator<D, O> {
    displays: D,
    overlay: O,
    config: TriggerConfig,
    layout: OverlayLayout,
    content: SwitchPanel,
    scheduler: DebounceScheduler<TimerAction>,
    state: OverlayState,
}

impl<D: DisplaySource, O: OverlaySurface> HoverTriggerCoordinator<D, O> {
    pub fn new(
        config: TriggerConfig,
        layout: OverlayLayout,
        content: SwitchPanel,
        displays: D,
        overlay: O,
    ) -> Self {
        let config = TriggerConfig {
            trigger_width_ratio: clamp_ratio(config.trigger_width_ratio),
            ..config
        };
        Self {
            displays,
            overlay,
            config,
            layout,
            content,
            scheduler: DebounceScheduler::new(),
            state: OverlayState::Hidden,
        }
    }

    pub fn state(&self) -> &OverlayState {
        &self.state
    }

    pub fn config(&self) -> &TriggerConfig {
        &self.config
    }

    pub fn content(&self) -> &SwitchPanel {
        &self.content
    }

    pub fn overlay(&self) -> &O {
        &self.overlay
    }

    pub fn overlay_mut(&mut self) -> &mut O {
        &mut self.overlay
    }

    pub fn displays_mut(&mut self) -> &mut D {
        &mut self.displays
    }

    /// Takes effect on the next presentation; a visible panel keeps its frame
    pub fn set_layout(&mut self, layout: OverlayLayout) {
        self.layout = layout;
    }

    pub fn scheduler(&self) -> &DebounceScheduler<TimerAction> {
        &self.scheduler
    }

    /// Earliest instant at which [`Self::fire_due_timers`] has work to do
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    /// Feed one pointer sample through the transition table. Timers due at
    /// or before `now` are fired first so they keep their place in line.
    pub fn handle_pointer(&mut self, point: Point, now: Instant) {
        self.fire_due_timers(now);

        let displays = self.displays.displays();
        self.follow_geometry_change(&displays);
        let Some(display) = resolve_display(&displays, point).cloned() else {
            trace!(x = point.x, y = point.y, "no displays known, ignoring sample");
            return;
        };

        let ratio = self.layout.trigger_ratio(&display, self.config.trigger_width_ratio);
        let hit = trigger_zone::evaluate(point, &display, ratio, self.state.overlay_bounds());
        let display_name = &display.name;
        trace!(
            x = point.x,
            y = point.y,
            display = %display_name,
            in_trigger_zone = hit.in_trigger_zone,
            in_overlay = hit.in_overlay,
            "pointer sample"
        );

        if hit.wants_overlay() {
            self.on_show_intent(display, now);
        } else {
            self.on_hide_intent(now);
        }
    }

    /// The shown display changed size or strip geometry under the same
    /// identity: move the panel to the new frame, keeping any pending hide
    fn follow_geometry_change(&mut self, displays: &[Display]) {
        let Some(shown) = self.state.shown_display() else {
            return;
        };
        let Some(fresh) = displays.iter().find(|d| d.same_output(shown)) else {
            return;
        };
        if fresh.same_geometry(shown) {
            return;
        }
        info!(
            display = %fresh.name,
            from = ?shown.bounds,
            to = ?fresh.bounds,
            "display geometry changed, moving overlay"
        );
        let fresh = fresh.clone();

        self.overlay.retarget(&fresh, &self.content);
        if !self.overlay.is_visible() {
            warn!(display = %fresh.name, "overlay surface did not come back after geometry change");
            self.scheduler.cancel_all();
            self.state = OverlayState::Hidden;
            return;
        }
        let new_bounds = self
            .overlay
            .current_bounds()
            .unwrap_or_else(|| self.layout.frame(&fresh));
        if let OverlayState::Visible { display, bounds }
        | OverlayState::PendingHide { display, bounds, .. } = &mut self.state
        {
            *display = fresh;
            *bounds = new_bounds;
        }
    }

    fn on_show_intent(&mut self, display: Display, now: Instant) {
        match self.state.clone() {
            OverlayState::Visible { display: current, .. }
                if current.same_output(&display) && current.same_geometry(&display) => {}
            OverlayState::Visible { .. } => self.retarget(display),
            OverlayState::PendingHide { pinned: true, .. } => {}
            OverlayState::PendingHide {
                display: current,
                bounds,
                ..
            } => {
                self.scheduler.cancel_hide();
                if current.same_output(&display) && current.same_geometry(&display) {
                    debug!(display = %current.name, "pointer returned, keeping overlay");
                    self.state = OverlayState::Visible {
                        display: current,
                        bounds,
                    };
                } else {
                    self.retarget(display);
                }
            }
            OverlayState::Hidden | OverlayState::PendingShow { .. } => {
                let id = display.id;
                let name = display.name.clone();
                self.scheduler.request_show(
                    id,
                    self.config.show_delay,
                    now,
                    TimerAction::Present(display),
                );
                if let Some((display, deadline)) = self.scheduler.pending_show() {
                    if self.state.phase() == OverlayPhase::Hidden {
                        debug!(display = %name, delay = ?self.config.show_delay, "show scheduled");
                    }
                    self.state = OverlayState::PendingShow { display, deadline };
                }
            }
        }
    }

    fn on_hide_intent(&mut self, now: Instant) {
        match self.state.clone() {
            OverlayState::Hidden => {}
            OverlayState::PendingShow { display, .. } => {
                self.scheduler.cancel_show();
                let display_id = &display;
                debug!(display = %display_id, "pointer left before reveal, show cancelled");
                self.state = OverlayState::Hidden;
            }
            OverlayState::Visible { display, bounds } => {
                self.scheduler
                    .request_hide(self.config.hide_delay, now, TimerAction::Dismiss);
                if let Some(deadline) = self.scheduler.pending_hide() {
                    let display_name = &display.name;
                    debug!(display = %display_name, delay = ?self.config.hide_delay, "hide scheduled");
                    self.state = OverlayState::PendingHide {
                        display,
                        bounds,
                        deadline,
                        pinned: false,
                    };
                }
            }
            // First hide intent wins, pinned or not
            OverlayState::PendingHide { .. } => {}
        }
    }

    /// Run every timer that is due at `now`
    pub fn fire_due_timers(&mut self, now: Instant) {
        while let Some(fired) = self.scheduler.fire_due(now) {
            match fired.action {
                TimerAction::Present(display) => self.present_on(display),
                TimerAction::Dismiss => self.dismiss_now(),
            }
        }
    }

    /// Cancel both timers and take the overlay down right now
    pub fn hide_immediately(&mut self) {
        self.scheduler.cancel_all();
        if self.overlay.is_visible() {
            self.overlay.dismiss();
        }
        if self.state != OverlayState::Hidden {
            info!(from = ?self.state.phase(), "overlay hidden immediately");
        }
        self.state = OverlayState::Hidden;
    }

    /// Present right away on `target` (or the primary display) and dismiss
    /// unconditionally after `duration`
    pub fn show_once(&mut self, duration: Duration, target: Option<DisplayId>, now: Instant) {
        let displays = self.displays.displays();
        let display = target
            .and_then(|id| displays.iter().find(|d| d.id == id))
            .or_else(|| displays.iter().find(|d| d.primary))
            .or_else(|| displays.first())
            .cloned();
        let Some(display) = display else {
            warn!("show_once requested but no display is available");
            return;
        };

        self.scheduler.cancel_all();
        match self.state.clone() {
            OverlayState::Visible { display: current, bounds }
            | OverlayState::PendingHide {
                display: current,
                bounds,
                ..
            } if current.same_output(&display) => {
                self.state = OverlayState::Visible {
                    display: current,
                    bounds,
                };
            }
            OverlayState::Visible { .. } | OverlayState::PendingHide { .. } => self.retarget(display),
            OverlayState::Hidden | OverlayState::PendingShow { .. } => self.present_on(display),
        }

        if let OverlayState::Visible { display, bounds } = self.state.clone() {
            self.scheduler.request_hide(duration, now, TimerAction::Dismiss);
            if let Some(deadline) = self.scheduler.pending_hide() {
                let display_name = &display.name;
                info!(display = %display_name, duration = ?duration, "overlay shown once");
                self.state = OverlayState::PendingHide {
                    display,
                    bounds,
                    deadline,
                    pinned: true,
                };
            }
        }
    }

    /// New delays apply to timers armed from now on
    pub fn update_delays(&mut self, show_seconds: f64, hide_seconds: f64) {
        self.config.show_delay = clamp_delay(show_seconds);
        self.config.hide_delay = clamp_delay(hide_seconds);
        info!(
            show = ?self.config.show_delay,
            hide = ?self.config.hide_delay,
            "hover delays updated"
        );
    }

    pub fn update_trigger_ratio(&mut self, ratio: f64) {
        let clamped = clamp_ratio(ratio);
        if clamped != ratio {
            warn!(requested = ratio, using = clamped, "trigger width ratio out of range");
        }
        self.config.trigger_width_ratio = clamped;
    }

    fn present_on(&mut self, display: Display) {
        self.overlay.present(&display, &self.content);
        self.sync_after_present(display);
    }

    fn retarget(&mut self, display: Display) {
        self.scheduler.cancel_all();
        if let Some(current) = self.state.shown_display() {
            let display_name = &display.name;
            info!(from = %current.name, to = %display_name, "moving overlay to another display");
        }
        self.overlay.retarget(&display, &self.content);
        self.sync_after_present(display);
    }

    fn sync_after_present(&mut self, display: Display) {
        if self.overlay.is_visible() {
            let bounds = self
                .overlay
                .current_bounds()
                .unwrap_or_else(|| self.layout.frame(&display));
            let display_name = &display.name;
            debug!(display = %display_name, ?bounds, "overlay presented");
            self.state = OverlayState::Visible { display, bounds };
        } else {
            let display_name = &display.name;
            warn!(display = %display_name, "overlay surface did not become visible");
            self.state = OverlayState::Hidden;
        }
    }

    fn dismiss_now(&mut self) {
        self.overlay.dismiss();
        debug!("overlay dismissed");
        self.state = OverlayState::Hidden;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::testing::{display, StaticDisplays};
    use crate::overlay::testing::{OverlayCall, RecordingOverlay};

    type Coordinator = HoverTriggerCoordinator<StaticDisplays, RecordingOverlay>;

    const A: DisplayId = DisplayId(1);
    const B: DisplayId = DisplayId(2);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn coordinator(show_ms: u64, hide_ms: u64) -> Coordinator {
        let layout = OverlayLayout::default();
        HoverTriggerCoordinator::new(
            TriggerConfig {
                trigger_width_ratio: 0.2,
                show_delay: ms(show_ms),
                hide_delay: ms(hide_ms),
            },
            layout,
            SwitchPanel::default(),
            StaticDisplays(vec![
                display(1, 0.0, 1920.0, true),
                display(2, 1920.0, 1920.0, false),
            ]),
            RecordingOverlay {
                layout,
                ..Default::default()
            },
        )
    }

    // Band for display A is [768, 1152] x [0, 30], for B [2688, 3072] x [0, 30]
    fn in_band_a() -> Point {
        Point::new(960.0, 5.0)
    }

    fn in_band_b() -> Point {
        Point::new(2880.0, 5.0)
    }

    fn far_away() -> Point {
        Point::new(400.0, 700.0)
    }

    fn assert_single_timer(c: &Coordinator) {
        let s = c.scheduler();
        assert!(!(s.pending_show().is_some() && s.pending_hide().is_some()));
    }

    #[test]
    fn test_enter_band_presents_after_show_delay() {
        let t0 = Instant::now();
        let mut c = coordinator(100, 80);

        c.handle_pointer(in_band_a(), t0);
        assert_eq!(c.state().phase(), OverlayPhase::PendingShow);
        assert!(!c.overlay().is_visible());

        c.fire_due_timers(t0 + ms(99));
        assert_eq!(c.overlay().presents(), 0);

        c.fire_due_timers(t0 + ms(100));
        assert_eq!(c.overlay().calls, vec![OverlayCall::Present(A)]);
        assert_eq!(c.state().phase(), OverlayPhase::Visible);
        assert!(c.overlay().is_visible());
    }

    #[test]
    fn test_leaving_before_delay_cancels_show() {
        let t0 = Instant::now();
        let mut c = coordinator(100, 80);

        c.handle_pointer(in_band_a(), t0);
        c.handle_pointer(far_away(), t0 + ms(50));
        c.fire_due_timers(t0 + ms(1000));

        assert_eq!(c.overlay().presents(), 0);
        assert_eq!(c.state(), &OverlayState::Hidden);
        assert!(c.scheduler().is_idle());
    }

    #[test]
    fn test_hovering_inside_band_does_not_postpone_reveal() {
        let t0 = Instant::now();
        let mut c = coordinator(100, 80);

        c.handle_pointer(in_band_a(), t0);
        c.handle_pointer(Point::new(970.0, 6.0), t0 + ms(40));
        c.handle_pointer(Point::new(980.0, 7.0), t0 + ms(90));
        c.fire_due_timers(t0 + ms(100));

        assert_eq!(c.overlay().presents(), 1);
    }

    #[test]
    fn test_repeated_show_intent_presents_once() {
        let t0 = Instant::now();
        let mut c = coordinator(0, 80);

        c.handle_pointer(in_band_a(), t0);
        c.handle_pointer(in_band_a(), t0);
        c.fire_due_timers(t0);
        c.handle_pointer(in_band_a(), t0 + ms(5));
        c.fire_due_timers(t0 + ms(5));

        assert_eq!(c.overlay().presents(), 1);
        assert_eq!(c.overlay().dismisses(), 0);
    }

    #[test]
    fn test_zero_show_delay_waits_for_timer_pass() {
        let t0 = Instant::now();
        let mut c = coordinator(0, 80);

        c.handle_pointer(in_band_a(), t0);
        assert_eq!(c.overlay().presents(), 0);
        assert_eq!(c.next_deadline(), Some(t0));

        c.fire_due_timers(t0);
        assert_eq!(c.overlay().presents(), 1);
    }

    #[test]
    fn test_leaving_visible_overlay_hides_after_delay() {
        let t0 = Instant::now();
        let mut c = coordinator(0, 80);
        c.handle_pointer(in_band_a(), t0);
        c.fire_due_timers(t0);

        c.handle_pointer(far_away(), t0 + ms(10));
        assert_eq!(c.state().phase(), OverlayPhase::PendingHide);
        assert!(c.overlay().is_visible());

        c.fire_due_timers(t0 + ms(89));
        assert_eq!(c.overlay().dismisses(), 0);
        c.fire_due_timers(t0 + ms(90));
        assert_eq!(c.overlay().dismisses(), 1);
        assert_eq!(c.state(), &OverlayState::Hidden);
        assert!(!c.overlay().is_visible());
    }

    #[test]
    fn test_repeated_hide_intent_keeps_first_deadline() {
        let t0 = Instant::now();
        let mut c = coordinator(0, 80);
        c.handle_pointer(in_band_a(), t0);
        c.fire_due_timers(t0);

        c.handle_pointer(far_away(), t0 + ms(10));
        c.handle_pointer(Point::new(300.0, 800.0), t0 + ms(50));
        c.handle_pointer(Point::new(200.0, 900.0), t0 + ms(85));
        assert_eq!(c.scheduler().pending_hide(), Some(t0 + ms(90)));

        c.fire_due_timers(t0 + ms(90));
        assert_eq!(c.overlay().dismisses(), 1);
    }

    #[test]
    fn test_pointer_inside_overlay_keeps_it_open() {
        let t0 = Instant::now();
        let mut c = coordinator(0, 80);
        c.handle_pointer(in_band_a(), t0);
        c.fire_due_timers(t0);

        // Below the reserved strip but inside the opened panel
        let bounds = c.state().overlay_bounds().unwrap();
        let inside_panel = Point::new(bounds.center_x(), bounds.bottom() - 1.0);
        assert!(inside_panel.y > 30.0);
        c.handle_pointer(inside_panel, t0 + ms(10));

        assert_eq!(c.state().phase(), OverlayPhase::Visible);
        assert!(c.scheduler().is_idle());
    }

    #[test]
    fn test_returning_during_pending_hide_keeps_overlay() {
        let t0 = Instant::now();
        let mut c = coordinator(0, 80);
        c.handle_pointer(in_band_a(), t0);
        c.fire_due_timers(t0);

        c.handle_pointer(far_away(), t0 + ms(10));
        c.handle_pointer(in_band_a(), t0 + ms(40));
        c.fire_due_timers(t0 + ms(500));

        assert_eq!(c.state().phase(), OverlayPhase::Visible);
        assert_eq!(c.overlay().calls, vec![OverlayCall::Present(A)]);
    }

    #[test]
    fn test_jump_to_other_display_retargets_without_gap() {
        let t0 = Instant::now();
        let mut c = coordinator(0, 80);
        c.handle_pointer(in_band_a(), t0);
        c.fire_due_timers(t0);
        let trace_before = c.overlay().visibility_trace.len();

        c.handle_pointer(in_band_b(), t0 + ms(20));

        assert_eq!(
            c.overlay().calls,
            vec![OverlayCall::Present(A), OverlayCall::Dismiss, OverlayCall::Present(B)]
        );
        // The recording overlay only samples after whole calls; retarget is one
        assert_eq!(&c.overlay().visibility_trace[trace_before..], &[true]);
        match c.state() {
            OverlayState::Visible { display, .. } => assert_eq!(display.id, B),
            other => panic!("expected visible on B, got {other:?}"),
        }
        assert!(c.scheduler().is_idle());
    }

    #[test]
    fn test_retarget_from_pending_hide() {
        let t0 = Instant::now();
        let mut c = coordinator(0, 80);
        c.handle_pointer(in_band_a(), t0);
        c.fire_due_timers(t0);
        c.handle_pointer(far_away(), t0 + ms(10));

        c.handle_pointer(in_band_b(), t0 + ms(20));
        c.fire_due_timers(t0 + ms(1000));

        assert_eq!(c.overlay().presents(), 2);
        assert_eq!(c.overlay().dismisses(), 1);
        assert_eq!(c.state().shown_display().map(|d| d.id), Some(B));
    }

    #[test]
    fn test_pending_show_moves_with_pointer() {
        let t0 = Instant::now();
        let mut c = coordinator(100, 80);
        c.handle_pointer(in_band_a(), t0);
        c.handle_pointer(in_band_b(), t0 + ms(50));

        c.fire_due_timers(t0 + ms(100));
        assert_eq!(c.overlay().presents(), 0);
        c.fire_due_timers(t0 + ms(150));
        assert_eq!(c.overlay().calls, vec![OverlayCall::Present(B)]);
    }

    #[test]
    fn test_hide_immediately_from_every_state() {
        let t0 = Instant::now();

        let mut hidden = coordinator(100, 80);
        hidden.hide_immediately();
        assert!(!hidden.overlay().is_visible());
        assert!(hidden.scheduler().is_idle());

        let mut pending_show = coordinator(100, 80);
        pending_show.handle_pointer(in_band_a(), t0);
        pending_show.hide_immediately();
        pending_show.fire_due_timers(t0 + ms(1000));
        assert_eq!(pending_show.overlay().presents(), 0);
        assert!(pending_show.scheduler().is_idle());

        let mut visible = coordinator(0, 80);
        visible.handle_pointer(in_band_a(), t0);
        visible.fire_due_timers(t0);
        visible.hide_immediately();
        assert!(!visible.overlay().is_visible());
        assert_eq!(visible.state(), &OverlayState::Hidden);

        let mut pending_hide = coordinator(0, 80);
        pending_hide.handle_pointer(in_band_a(), t0);
        pending_hide.fire_due_timers(t0);
        pending_hide.handle_pointer(far_away(), t0 + ms(10));
        pending_hide.hide_immediately();
        assert!(!pending_hide.overlay().is_visible());
        assert!(pending_hide.scheduler().is_idle());
        pending_hide.fire_due_timers(t0 + ms(1000));
        assert_eq!(pending_hide.overlay().dismisses(), 1);
    }

    #[test]
    fn test_show_once_expires_regardless_of_pointer() {
        let t0 = Instant::now();
        let mut c = coordinator(100, 80);

        c.show_once(ms(1200), None, t0);
        assert_eq!(c.overlay().calls, vec![OverlayCall::Present(A)]);
        assert_eq!(c.state().phase(), OverlayPhase::PendingHide);

        c.handle_pointer(in_band_a(), t0 + ms(100));
        c.handle_pointer(far_away(), t0 + ms(200));
        c.handle_pointer(in_band_b(), t0 + ms(300));
        c.fire_due_timers(t0 + ms(1199));
        assert_eq!(c.overlay().dismisses(), 0);

        c.fire_due_timers(t0 + ms(1200));
        assert_eq!(c.overlay().calls, vec![OverlayCall::Present(A), OverlayCall::Dismiss]);
        assert_eq!(c.state(), &OverlayState::Hidden);
    }

    #[test]
    fn test_show_once_on_requested_display() {
        let t0 = Instant::now();
        let mut c = coordinator(100, 80);
        c.show_once(ms(500), Some(B), t0);
        assert_eq!(c.overlay().calls, vec![OverlayCall::Present(B)]);

        // Unknown ids fall back to the primary display
        let mut c = coordinator(100, 80);
        c.show_once(ms(500), Some(DisplayId(99)), t0);
        assert_eq!(c.overlay().calls, vec![OverlayCall::Present(A)]);
    }

    #[test]
    fn test_show_once_cancels_pending_show() {
        let t0 = Instant::now();
        let mut c = coordinator(100, 80);
        c.handle_pointer(in_band_b(), t0);
        c.show_once(ms(300), None, t0 + ms(10));
        assert_single_timer(&c);

        c.fire_due_timers(t0 + ms(110));
        assert_eq!(c.overlay().calls, vec![OverlayCall::Present(A)]);
        c.fire_due_timers(t0 + ms(310));
        assert_eq!(c.overlay().dismisses(), 1);
    }

    #[test]
    fn test_show_once_while_visible_on_same_display_does_not_represent() {
        let t0 = Instant::now();
        let mut c = coordinator(0, 80);
        c.handle_pointer(in_band_a(), t0);
        c.fire_due_timers(t0);

        c.show_once(ms(300), Some(A), t0 + ms(10));
        assert_eq!(c.overlay().presents(), 1);
        assert_eq!(c.scheduler().pending_hide(), Some(t0 + ms(310)));
    }

    #[test]
    fn test_update_delays_clamps_and_spares_armed_timers() {
        let t0 = Instant::now();
        let mut c = coordinator(100, 80);
        c.handle_pointer(in_band_a(), t0);

        c.update_delays(-1.0, f64::NAN);
        assert_eq!(c.config().show_delay, Duration::ZERO);
        assert_eq!(c.config().hide_delay, Duration::ZERO);

        // The show armed before the update still waits its original 100ms
        c.fire_due_timers(t0 + ms(50));
        assert_eq!(c.overlay().presents(), 0);
        c.fire_due_timers(t0 + ms(100));
        assert_eq!(c.overlay().presents(), 1);

        // New hide intents use the new zero delay
        c.handle_pointer(far_away(), t0 + ms(200));
        assert_eq!(c.scheduler().pending_hide(), Some(t0 + ms(200)));
    }

    #[test]
    fn test_update_delays_keeps_in_flight_presentation() {
        let t0 = Instant::now();
        let mut c = coordinator(0, 80);
        c.handle_pointer(in_band_a(), t0);
        c.fire_due_timers(t0);

        c.update_delays(0.5, 0.5);
        assert!(c.overlay().is_visible());
        assert_eq!(c.overlay().dismisses(), 0);
    }

    #[test]
    fn test_due_show_fires_before_a_sample_at_the_same_instant() {
        let t0 = Instant::now();
        let mut c = coordinator(100, 80);
        c.handle_pointer(in_band_a(), t0);

        // The loop wakes at the deadline and samples before its timer pass
        c.handle_pointer(far_away(), t0 + ms(100));
        c.fire_due_timers(t0 + ms(100));

        assert_eq!(c.overlay().calls, vec![OverlayCall::Present(A)]);
        assert_eq!(c.state().phase(), OverlayPhase::PendingHide);
        c.fire_due_timers(t0 + ms(180));
        assert_eq!(c.overlay().dismisses(), 1);
    }

    #[test]
    fn test_due_hide_fires_before_a_returning_sample() {
        let t0 = Instant::now();
        let mut c = coordinator(0, 80);
        c.handle_pointer(in_band_a(), t0);
        c.fire_due_timers(t0);
        c.handle_pointer(far_away(), t0 + ms(10));

        // Hide came due at 90; a sample back in the band at 95 starts over
        c.handle_pointer(in_band_a(), t0 + ms(95));
        assert_eq!(c.overlay().dismisses(), 1);
        assert_eq!(c.state().phase(), OverlayPhase::PendingShow);
    }

    #[test]
    fn test_resized_display_moves_visible_overlay() {
        let t0 = Instant::now();
        let mut c = coordinator(0, 80);
        c.handle_pointer(in_band_a(), t0);
        c.fire_due_timers(t0);
        let before = c.state().overlay_bounds().unwrap();

        let resized = display(1, 0.0, 1280.0, true);
        c.displays_mut().0[0] = resized.clone();
        c.handle_pointer(Point::new(640.0, 5.0), t0 + ms(10));

        let after = c.state().overlay_bounds().unwrap();
        assert_ne!(before, after);
        assert_eq!(after, OverlayLayout::default().frame(&resized));
        assert_eq!(c.state().shown_display(), Some(&resized));
        assert_eq!(
            c.overlay().calls,
            vec![OverlayCall::Present(A), OverlayCall::Dismiss, OverlayCall::Present(A)]
        );
        assert_eq!(c.state().phase(), OverlayPhase::Visible);
    }

    #[test]
    fn test_strip_change_moves_overlay_and_keeps_pending_hide() {
        let t0 = Instant::now();
        let mut c = coordinator(0, 80);
        c.handle_pointer(in_band_a(), t0);
        c.fire_due_timers(t0);
        c.handle_pointer(far_away(), t0 + ms(10));

        let mut taller = display(1, 0.0, 1920.0, true);
        taller.reserved_strip_height = 60.0;
        c.displays_mut().0[0] = taller.clone();
        c.handle_pointer(Point::new(300.0, 800.0), t0 + ms(20));

        assert_eq!(c.overlay().presents(), 2);
        assert_eq!(c.state().phase(), OverlayPhase::PendingHide);
        assert_eq!(c.state().overlay_bounds(), Some(OverlayLayout::default().frame(&taller)));
        assert_eq!(c.scheduler().pending_hide(), Some(t0 + ms(90)));

        c.fire_due_timers(t0 + ms(90));
        assert_eq!(c.state(), &OverlayState::Hidden);
    }

    #[test]
    fn test_update_delays_caps_at_maximum() {
        let mut c = coordinator(0, 80);
        c.update_delays(3600.0, 0.25);
        assert_eq!(c.config().show_delay, Duration::from_millis(validation::MAX_DELAY_MS as u64));
        assert_eq!(c.config().hide_delay, ms(250));
    }

    #[test]
    fn test_clamp_delay() {
        assert_eq!(clamp_delay(0.18), ms(180));
        assert_eq!(clamp_delay(0.28), ms(280));
        assert_eq!(clamp_delay(0.0), Duration::ZERO);
        assert_eq!(clamp_delay(-2.0), Duration::ZERO);
        assert_eq!(clamp_delay(f64::NAN), Duration::ZERO);
        assert_eq!(clamp_delay(f64::INFINITY), Duration::from_millis(10_000));
        assert_eq!(clamp_delay(3600.0), Duration::from_millis(10_000));
        assert_eq!(clamp_delay(9.5), Duration::from_millis(9_500));
    }

    #[test]
    fn test_update_trigger_ratio() {
        let mut c = coordinator(0, 80);
        c.update_trigger_ratio(2.0);
        assert_eq!(c.config().trigger_width_ratio, 1.0);
        c.update_trigger_ratio(-0.3);
        assert_eq!(c.config().trigger_width_ratio, trigger::DEFAULT_WIDTH_RATIO);

        // A full-width band now catches the strip corner
        let t0 = Instant::now();
        c.update_trigger_ratio(1.0);
        c.handle_pointer(Point::new(1.0, 1.0), t0);
        assert_eq!(c.state().phase(), OverlayPhase::PendingShow);
    }

    #[test]
    fn test_no_samples_means_no_change() {
        let t0 = Instant::now();
        let mut c = coordinator(0, 80);
        c.handle_pointer(in_band_a(), t0);
        c.fire_due_timers(t0);

        // A long silence from the pointer source must not hide the overlay
        c.fire_due_timers(t0 + Duration::from_secs(60));
        assert_eq!(c.state().phase(), OverlayPhase::Visible);
    }

    #[test]
    fn test_without_displays_samples_are_ignored() {
        let t0 = Instant::now();
        let layout = OverlayLayout::default();
        let mut c = HoverTriggerCoordinator::new(
            TriggerConfig::default(),
            layout,
            SwitchPanel::default(),
            StaticDisplays(vec![]),
            RecordingOverlay::default(),
        );
        c.handle_pointer(Point::new(0.0, 0.0), t0);
        c.show_once(ms(100), None, t0);
        assert_eq!(c.state(), &OverlayState::Hidden);
        assert!(c.overlay().calls.is_empty());
    }

    #[test]
    fn test_pointer_off_every_display_uses_primary() {
        let t0 = Instant::now();
        let mut c = coordinator(0, 80);
        // Off-screen to the left but vertically in the strip: resolves to A,
        // and is outside A's band, so nothing happens
        c.handle_pointer(Point::new(-500.0, 5.0), t0);
        assert_eq!(c.state(), &OverlayState::Hidden);
    }

    #[test]
    fn test_timer_invariant_through_session() {
        let t0 = Instant::now();
        let mut c = coordinator(50, 50);
        let path = [
            (in_band_a(), 0),
            (far_away(), 10),
            (in_band_a(), 20),
            (in_band_b(), 30),
            (far_away(), 200),
            (in_band_b(), 220),
        ];
        for (point, at) in path {
            c.handle_pointer(point, t0 + ms(at));
            assert_single_timer(&c);
            c.fire_due_timers(t0 + ms(at));
            assert_single_timer(&c);
            let visible = c.overlay().is_visible();
            match c.state().phase() {
                OverlayPhase::Visible | OverlayPhase::PendingHide => assert!(visible),
                OverlayPhase::Hidden | OverlayPhase::PendingShow => assert!(!visible),
            }
        }
    }
}
