//! View state and load lifecycle

use cm_core::Seq;
use serde::Serialize;

/// `Idle -> Loading -> Ready | Errored`.
///
/// `Ready` is re-entrant: background refreshes keep it. `Errored` is only
/// entered from `Loading`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Errored,
}

/// Snapshot published by a view after every processed message
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState<D> {
    pub status: LoadStatus,
    pub data: Option<D>,
    /// Blocking error shown instead of data
    pub error: Option<String>,
    /// Non-blocking error from a background refresh; data stays visible
    pub notice: Option<String>,
    /// Error from the most recent manual mutation
    pub mutation_error: Option<String>,
    /// Highest sequence number processed
    pub last_seq: Seq,
}

impl<D> Default for ViewState<D> {
    fn default() -> Self {
        Self {
            status: LoadStatus::Idle,
            data: None,
            error: None,
            notice: None,
            mutation_error: None,
            last_seq: 0,
        }
    }
}

impl<D> ViewState<D> {
    pub fn is_ready(&self) -> bool {
        self.status == LoadStatus::Ready
    }

    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }

    pub fn is_errored(&self) -> bool {
        self.status == LoadStatus::Errored
    }

    /// Start a load. Returns `true` when data is already displayed, in
    /// which case the status stays `Ready` and this is a background refresh.
    pub fn begin_load(&mut self) -> bool {
        if self.data.is_some() {
            return true;
        }
        self.status = LoadStatus::Loading;
        self.error = None;
        false
    }

    pub fn load_succeeded(&mut self, data: D) {
        self.data = Some(data);
        self.refresh_succeeded();
    }

    /// Data was updated in place by a successful refresh
    pub fn refresh_succeeded(&mut self) {
        self.status = LoadStatus::Ready;
        self.error = None;
        self.notice = None;
    }

    /// Background failures keep the data and raise a notice; a failed
    /// first load moves to `Errored` with nothing displayed.
    pub fn load_failed(&mut self, message: impl Into<String>) {
        let message = message.into();
        if self.data.is_some() {
            self.notice = Some(message);
        } else {
            self.status = LoadStatus::Errored;
            self.error = Some(message);
        }
    }
}

/// Tracks the single in-flight load of a view and the newest applied one
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadTracker {
    in_flight: Option<Seq>,
    applied: Seq,
}

impl LoadTracker {
    /// Returns `false` when a load is already running
    pub fn start(&mut self, seq: Seq) -> bool {
        if self.in_flight.is_some() {
            return false;
        }
        self.in_flight = Some(seq);
        true
    }

    /// Returns `false` for results older than the last applied load
    pub fn finish(&mut self, seq: Seq) -> bool {
        if self.in_flight == Some(seq) {
            self.in_flight = None;
        }
        if seq <= self.applied {
            return false;
        }
        self.applied = seq;
        true
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn applied(&self) -> Seq {
        self.applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_load_failure_is_blocking() {
        let mut state: ViewState<Vec<u32>> = ViewState::default();
        assert!(!state.begin_load());
        assert!(state.is_loading());

        state.load_failed("boom");
        assert!(state.is_errored());
        assert_eq!(state.error.as_deref(), Some("boom"));
        assert!(state.data.is_none());
    }

    #[test]
    fn test_background_failure_preserves_data() {
        let mut state = ViewState::default();
        state.begin_load();
        state.load_succeeded(vec![1, 2]);

        assert!(state.begin_load());
        assert!(state.is_ready());
        state.load_failed("offline");

        assert!(state.is_ready());
        assert_eq!(state.data, Some(vec![1, 2]));
        assert_eq!(state.notice.as_deref(), Some("offline"));
        assert!(state.error.is_none());

        state.refresh_succeeded();
        assert!(state.notice.is_none());
    }

    #[test]
    fn test_retry_after_error_clears_it() {
        let mut state: ViewState<()> = ViewState::default();
        state.begin_load();
        state.load_failed("boom");
        assert!(!state.begin_load());
        assert!(state.is_loading());
        assert!(state.error.is_none());
    }

    #[test]
    fn test_load_tracker() {
        let mut tracker = LoadTracker::default();
        assert!(tracker.start(3));
        assert!(!tracker.start(4));
        assert!(tracker.finish(3));
        assert!(!tracker.in_flight());
        assert!(!tracker.finish(2));
        assert_eq!(tracker.applied(), 3);
    }
}
