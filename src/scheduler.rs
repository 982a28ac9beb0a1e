//! Debounced show/hide timers on a single logical timeline
//!
//! The scheduler never runs anything itself. The event loop asks for the next
//! deadline, sleeps, and then drains due timers with [`DebounceScheduler::fire_due`],
//! which hands back the payload that was registered with the timer. A timer's
//! slot is cleared before its payload is returned, so whatever the caller does
//! with it (including scheduling again) starts from a clean slate.

use std::time::{Duration, Instant};

use tracing::trace;

use crate::display::DisplayId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Show,
    Hide,
}

/// Opaque handle to an armed timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle {
    kind: TimerKind,
    seq: u64,
}

impl TimerHandle {
    pub fn kind(&self) -> TimerKind {
        self.kind
    }
}

#[derive(Debug)]
struct PendingTimer<A> {
    handle: TimerHandle,
    deadline: Instant,
    action: A,
}

/// A timer that reached its deadline
#[derive(Debug, PartialEq)]
pub struct Fired<A> {
    pub kind: TimerKind,
    pub action: A,
}

/// Holds at most one pending show and one pending hide
#[derive(Debug)]
pub struct DebounceScheduler<A> {
    show: Option<(DisplayId, PendingTimer<A>)>,
    hide: Option<PendingTimer<A>>,
    next_seq: u64,
}

impl<A> Default for DebounceScheduler<A> {
    fn default() -> Self {
        Self {
            show: None,
            hide: None,
            next_seq: 0,
        }
    }
}

impl<A> DebounceScheduler<A> {
    pub fn new() -> Self {
        Self::default()
    }

    fn arm(&mut self, kind: TimerKind, delay: Duration, now: Instant, action: A) -> PendingTimer<A> {
        self.next_seq += 1;
        PendingTimer {
            handle: TimerHandle {
                kind,
                seq: self.next_seq,
            },
            deadline: now + delay,
            action,
        }
    }

    /// Ask for the overlay on `display` after `delay`.
    ///
    /// Cancels a pending hide. A show already pending for the same display is
    /// kept with its original deadline, otherwise hovering inside the zone would
    /// postpone the reveal forever. A show pending for another display is
    /// replaced.
    pub fn request_show(
        &mut self,
        display: DisplayId,
        delay: Duration,
        now: Instant,
        action: A,
    ) -> TimerHandle {
        self.cancel_hide();

        if let Some((pending_display, pending)) = &self.show {
            if *pending_display == display {
                let display_id = &display;
                trace!(display = %display_id, "show already pending, keeping deadline");
                return pending.handle;
            }
            let display_id = &display;
            trace!(from = %pending_display, to = %display_id, "rescheduling show for another display");
        }

        let timer = self.arm(TimerKind::Show, delay, now, action);
        let handle = timer.handle;
        self.show = Some((display, timer));
        handle
    }

    /// Ask for the overlay to go away after `delay`.
    ///
    /// Cancels a pending show. The first hide intent wins: an already pending
    /// hide keeps its deadline.
    pub fn request_hide(&mut self, delay: Duration, now: Instant, action: A) -> TimerHandle {
        self.cancel_show();

        if let Some(pending) = &self.hide {
            trace!("hide already pending, keeping deadline");
            return pending.handle;
        }

        let timer = self.arm(TimerKind::Hide, delay, now, action);
        let handle = timer.handle;
        self.hide = Some(timer);
        handle
    }

    /// Returns whether a show timer was actually disarmed
    pub fn cancel_show(&mut self) -> bool {
        self.show.take().is_some()
    }

    /// Returns whether a hide timer was actually disarmed
    pub fn cancel_hide(&mut self) -> bool {
        self.hide.take().is_some()
    }

    pub fn cancel_all(&mut self) {
        self.cancel_show();
        self.cancel_hide();
    }

    /// Disarm the timer behind `handle` if it is still the armed one.
    /// Stale or already-fired handles are ignored.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match handle.kind {
            TimerKind::Show => {
                if self.show.as_ref().is_some_and(|(_, t)| t.handle == handle) {
                    self.show = None;
                    return true;
                }
            }
            TimerKind::Hide => {
                if self.hide.as_ref().is_some_and(|t| t.handle == handle) {
                    self.hide = None;
                    return true;
                }
            }
        }
        false
    }

    pub fn pending_show(&self) -> Option<(DisplayId, Instant)> {
        self.show.as_ref().map(|(display, t)| (*display, t.deadline))
    }

    pub fn pending_hide(&self) -> Option<Instant> {
        self.hide.as_ref().map(|t| t.deadline)
    }

    pub fn is_idle(&self) -> bool {
        self.show.is_none() && self.hide.is_none()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        let show = self.show.as_ref().map(|(_, t)| t.deadline);
        let hide = self.hide.as_ref().map(|t| t.deadline);
        match (show, hide) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Pop the earliest timer whose deadline is at or before `now`.
    /// Call repeatedly until it returns `None`.
    pub fn fire_due(&mut self, now: Instant) -> Option<Fired<A>> {
        let show_due = self.show.as_ref().map(|(_, t)| t.deadline).filter(|d| *d <= now);
        let hide_due = self.hide.as_ref().map(|t| t.deadline).filter(|d| *d <= now);

        let kind = match (show_due, hide_due) {
            (Some(show), Some(hide)) if hide < show => TimerKind::Hide,
            (Some(_), _) => TimerKind::Show,
            (None, Some(_)) => TimerKind::Hide,
            (None, None) => return None,
        };

        let timer = match kind {
            TimerKind::Show => self.show.take().map(|(_, t)| t),
            TimerKind::Hide => self.hide.take(),
        }?;
        trace!(kind = ?kind, "timer fired");
        Some(Fired {
            kind,
            action: timer.action,
        })
    }
}
