use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use super::error::SessionError;
use super::session::{SessionOutcome, SessionReport};

/// Where terminal session outcomes go.
///
/// Always logs through `tracing`; optionally forwards the report to a channel
/// (the UI's outcome list).
#[derive(Clone, Debug, Default)]
pub struct ReportSink {
    forward: Option<mpsc::Sender<SessionReport>>,
}

impl ReportSink {
    pub fn log_only() -> Self {
        Self { forward: None }
    }

    pub fn with_channel(forward: mpsc::Sender<SessionReport>) -> Self {
        Self {
            forward: Some(forward),
        }
    }

    pub fn report(&self, report: &SessionReport) {
        let who = report
            .identity
            .as_ref()
            .map(|i| i.as_str())
            .unwrap_or("-");

        match &report.outcome {
            SessionOutcome::Published => {
                info!("Session {} published color '{}'", who, report.color)
            }
            SessionOutcome::Failed(e @ SessionError::ConnectFailure { .. }) => {
                error!("Session {} for '{}': {}", who, report.color, e)
            }
            SessionOutcome::Failed(e @ SessionError::ConnectionLost { .. }) => {
                warn!("Session {} for '{}': {}", who, report.color, e)
            }
            SessionOutcome::Failed(e) => {
                error!("Session {} for '{}': {}", who, report.color, e)
            }
        }

        if let Some(forward) = &self.forward {
            if let Err(e) = forward.try_send(report.clone()) {
                warn!("Failed to forward session report: {}", e);
            }
        }
    }
}

/// Without any session activity for this long, pending sessions are treated
/// as stalled and no longer keep the UI polling.
pub const QUIET_PERIOD: Duration = Duration::from_secs(5);

/// Running tally of finished sessions for display.
#[derive(Clone, Debug)]
pub struct SessionStatus {
    pub in_flight: usize,
    pub messages_sent: usize,
    pub failures: usize,
    pub last_color: Option<String>,
    pub last_activity: Option<DateTime<Local>>,
    history: VecDeque<SessionReport>,
    history_len: usize,
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self::with_history(50)
    }
}

impl SessionStatus {
    pub fn with_history(history_len: usize) -> Self {
        Self {
            in_flight: 0,
            messages_sent: 0,
            failures: 0,
            last_color: None,
            last_activity: None,
            history: VecDeque::with_capacity(history_len),
            history_len: history_len.max(1),
        }
    }

    /// Call when a session was started.
    pub fn started(&mut self) {
        self.in_flight += 1;
        self.last_activity = Some(Local::now());
    }

    pub fn record(&mut self, report: SessionReport) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match report.outcome {
            SessionOutcome::Published => {
                self.messages_sent += 1;
                self.last_color = Some(report.color.to_string());
            }
            SessionOutcome::Failed(_) => self.failures += 1,
        }
        self.last_activity = Some(report.finished_at);

        if self.history.len() == self.history_len {
            self.history.pop_front();
        }
        self.history.push_back(report);
    }

    /// Overwrites the in-flight count with the number of unfinished session
    /// tasks, which stays correct when a report never reaches [`record`].
    ///
    /// [`record`]: SessionStatus::record
    pub fn set_in_flight(&mut self, pending: usize) {
        self.in_flight = pending;
    }

    /// Whether the UI should keep polling for reports at `now`.
    pub fn needs_repaint(&self, now: DateTime<Local>) -> bool {
        if self.in_flight == 0 {
            return false;
        }
        let Some(at) = self.last_activity else {
            return false;
        };
        // clock went backwards: still recent
        now.signed_duration_since(at)
            .to_std()
            .map_or(true, |age| age < QUIET_PERIOD)
    }

    /// Newest first
    pub fn history(&self) -> impl Iterator<Item = &SessionReport> {
        self.history.iter().rev()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mqtt::factory::ClientIdentity;
    use crate::mqtt::message::ColorSelection;

    fn report(color: &str, outcome: SessionOutcome) -> SessionReport {
        SessionReport::new(
            Some(ClientIdentity::from_suffix(1)),
            ColorSelection::new(color).unwrap(),
            outcome,
        )
    }

    #[test]
    fn status_counts_outcomes() {
        let mut status = SessionStatus::default();
        status.started();
        status.started();
        assert_eq!(status.in_flight, 2);

        status.record(report("blue", SessionOutcome::Published));
        status.record(report(
            "red",
            SessionOutcome::Failed(SessionError::connect_failure("Not authorized")),
        ));

        assert_eq!(status.in_flight, 0);
        assert_eq!(status.messages_sent, 1);
        assert_eq!(status.failures, 1);
        assert_eq!(status.last_color.as_deref(), Some("blue"));
        assert_eq!(status.history().next().map(|r| r.color.as_str()), Some("red"));
    }

    #[test]
    fn pending_count_overrides_lost_reports() {
        let mut status = SessionStatus::default();
        status.started();
        status.started();
        status.record(report("blue", SessionOutcome::Published));
        // second report was dropped by a full channel, its task is done
        status.set_in_flight(0);

        assert_eq!(status.in_flight, 0);
        assert!(!status.needs_repaint(Local::now()));
    }

    #[test]
    fn stalled_sessions_stop_repainting_after_quiet_period() {
        let mut status = SessionStatus::default();
        assert!(!status.needs_repaint(Local::now()));

        status.started();
        let started = status.last_activity.unwrap();
        assert!(status.needs_repaint(started + chrono::Duration::seconds(1)));
        assert!(status.needs_repaint(started - chrono::Duration::seconds(1)));
        assert!(!status.needs_repaint(started + chrono::Duration::seconds(6)));
    }

    #[test]
    fn history_is_bounded() {
        let mut status = SessionStatus::with_history(2);
        for color in ["red", "green", "blue"] {
            status.record(report(color, SessionOutcome::Published));
        }
        let colors: Vec<_> = status.history().map(|r| r.color.as_str()).collect();
        assert_eq!(colors, vec!["blue", "green"]);
    }

    #[tokio::test]
    async fn sink_forwards_reports() {
        let (tx, mut rx) = mpsc::channel(1);
        let sink = ReportSink::with_channel(tx);
        let sent = report("white", SessionOutcome::Published);

        sink.report(&sent);
        // channel full: logged and dropped, never blocks
        sink.report(&sent);

        assert_eq!(rx.recv().await, Some(sent));
        assert!(rx.try_recv().is_err());
    }
}
