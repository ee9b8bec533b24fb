//! Redraw scheduling: a single-producer idempotent request flag plus a
//! monotonically increasing render-version token that makes late results
//! discardable.

/// Coalesces redraw requests into at most one in-flight frame.
///
/// A request while idle schedules one frame. A request during rendering
/// does not preempt; it marks the scheduler so one more frame follows the
/// current one. Completion with no pending request goes idle
#[derive(Debug, Default)]
pub struct RedrawScheduler {
    requested: bool,
    in_flight: bool,
    version: u64,
}

impl RedrawScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for a redraw. Returns `true` when the caller should schedule a
    /// frame now; repeated requests coalesce
    pub fn request(&mut self) -> bool {
        if self.in_flight {
            self.requested = true;
            return false;
        }

        if self.requested {
            return false;
        }

        self.requested = true;
        true
    }

    /// Start the scheduled frame, returning its version token
    pub fn begin_frame(&mut self) -> u64 {
        self.requested = false;
        self.in_flight = true;
        self.version += 1;
        self.version
    }

    /// Finish the in-flight frame. Returns `true` when another request
    /// arrived during rendering and one more frame should be scheduled
    pub fn complete_frame(&mut self) -> bool {
        self.in_flight = false;

        if self.requested {
            // leave `requested` set: the follow-up frame is the one that
            // consumes it in begin_frame
            return true;
        }

        false
    }

    /// Whether a finished frame's token is still the newest. Obsolete
    /// in-flight frames are dropped by this check rather than cancelled
    pub fn is_current(&self, version: u64) -> bool {
        version == self.version
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn first_request_schedules_a_frame() {
        let mut scheduler = RedrawScheduler::new();

        assert!(scheduler.request());
        // a second request before the frame starts coalesces
        assert!(!scheduler.request());
    }

    #[test]
    fn request_during_render_defers_one_frame() {
        let mut scheduler = RedrawScheduler::new();

        assert!(scheduler.request());
        let first = scheduler.begin_frame();

        // arrives mid-render: no preemption
        assert!(!scheduler.request());

        // completion says one more frame is owed
        assert!(scheduler.complete_frame());

        let second = scheduler.begin_frame();
        assert!(second > first);
        assert!(!scheduler.complete_frame());
    }

    #[test]
    fn stale_versions_are_discardable() {
        let mut scheduler = RedrawScheduler::new();

        scheduler.request();
        let first = scheduler.begin_frame();
        scheduler.complete_frame();

        scheduler.request();
        let second = scheduler.begin_frame();

        assert!(!scheduler.is_current(first));
        assert!(scheduler.is_current(second));
    }

    #[test]
    fn completion_without_request_goes_idle() {
        let mut scheduler = RedrawScheduler::new();

        scheduler.request();
        scheduler.begin_frame();
        assert!(!scheduler.complete_frame());

        // idle again: a new request schedules
        assert!(scheduler.request());
    }
}
