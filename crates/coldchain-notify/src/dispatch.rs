use crate::cancel::Pacer;
use crate::error::{NotifyError, Result};
use crate::transport::{CallRequest, CallTransport};
use chrono::Utc;
use coldchain_core::{CallId, CallRecord, CallStatus, ShipmentDetails};
use coldchain_store::CallHistory;
use serde::Serialize;
use std::cell::Cell;
use std::time::Duration;
use tracing::{debug, warn};

pub const FALLBACK_FROM: &str = "system";
pub const FALLBACK_MESSAGE: &str = "Call failed - server error";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            interval: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DispatchState {
    Idle,
    Dispatching,
    Polling { attempt: u32 },
    Completed,
    Failed,
    Stale,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FollowOutcome {
    Completed,
    Failed,
    /// Attempts ran out before a terminal status was seen.
    Stale,
    Cancelled,
}

impl FollowOutcome {
    fn from_terminal(status: CallStatus) -> Self {
        if status == CallStatus::Completed {
            FollowOutcome::Completed
        } else {
            FollowOutcome::Failed
        }
    }

    fn state(self) -> DispatchState {
        match self {
            FollowOutcome::Completed => DispatchState::Completed,
            FollowOutcome::Failed => DispatchState::Failed,
            FollowOutcome::Stale => DispatchState::Stale,
            FollowOutcome::Cancelled => DispatchState::Cancelled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FollowReport {
    pub record: CallRecord,
    pub outcome: FollowOutcome,
    pub attempts: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HistorySource {
    Transport,
    Cache,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallHistoryView {
    pub source: HistorySource,
    pub calls: Vec<CallRecord>,
}

/// Polls the transport until the call reaches a terminal status, the attempt
/// cap is spent, or the pacer reports cancellation. Every applied update is
/// handed to `on_update`.
pub fn poll_until_terminal<T, F>(
    transport: &T,
    mut record: CallRecord,
    policy: PollPolicy,
    pacer: &dyn Pacer,
    mut on_update: F,
) -> FollowReport
where
    T: CallTransport + ?Sized,
    F: FnMut(u32, &CallRecord),
{
    if record.is_terminal() {
        let outcome = FollowOutcome::from_terminal(record.status);
        return FollowReport {
            record,
            outcome,
            attempts: 0,
        };
    }

    for attempt in 1..=policy.max_attempts {
        if !pacer.pause(policy.interval) {
            debug!(call = %record.id, attempt, "polling cancelled");
            return FollowReport {
                record,
                outcome: FollowOutcome::Cancelled,
                attempts: attempt - 1,
            };
        }
        match transport.call_status(&record.id) {
            Ok(update) => {
                record.status = update.status;
                if let Some(duration) = update.duration {
                    record.duration = duration;
                }
                debug!(call = %record.id, attempt, status = record.status.as_str(), "call status");
                on_update(attempt, &record);
                if record.is_terminal() {
                    let outcome = FollowOutcome::from_terminal(record.status);
                    return FollowReport {
                        record,
                        outcome,
                        attempts: attempt,
                    };
                }
            }
            Err(err) => {
                warn!(call = %record.id, attempt, error = %err, "call status poll failed");
            }
        }
    }

    debug!(call = %record.id, status = record.status.as_str(), "polling gave up");
    FollowReport {
        record,
        outcome: FollowOutcome::Stale,
        attempts: policy.max_attempts,
    }
}

/// Places calls through a transport and keeps the call cache current.
pub struct Dispatcher<'a, T: CallTransport> {
    transport: T,
    cache: &'a dyn CallHistory,
    policy: PollPolicy,
    state: Cell<DispatchState>,
}

impl<'a, T: CallTransport> Dispatcher<'a, T> {
    pub fn new(transport: T, cache: &'a dyn CallHistory, policy: PollPolicy) -> Self {
        Self {
            transport,
            cache,
            policy,
            state: Cell::new(DispatchState::Idle),
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state.get()
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn dispatch(
        &self,
        to: &str,
        message: &str,
        shipment_details: Option<ShipmentDetails>,
    ) -> CallRecord {
        self.state.set(DispatchState::Dispatching);
        let request = CallRequest {
            to: to.to_string(),
            message: message.to_string(),
            shipment_details,
        };
        let record = match self.transport.place_call(&request) {
            Ok(record) => {
                debug!(call = %record.id, status = record.status.as_str(), "call placed");
                self.state.set(if record.is_terminal() {
                    FollowOutcome::from_terminal(record.status).state()
                } else {
                    DispatchState::Polling { attempt: 0 }
                });
                record
            }
            Err(err) => {
                warn!(to = %request.to, error = %err, "call transport failed, storing local record");
                self.state.set(DispatchState::Failed);
                fallback_record(request)
            }
        };
        self.persist(&record);
        record
    }

    /// Polls `record` to completion on the current thread.
    pub fn follow(&self, record: CallRecord, pacer: &dyn Pacer) -> FollowReport {
        if !record.is_terminal() {
            self.state.set(DispatchState::Polling { attempt: 0 });
        }
        let report = poll_until_terminal(&self.transport, record, self.policy, pacer, |attempt, update| {
            self.state.set(DispatchState::Polling { attempt });
            self.persist(update);
        });
        self.state.set(report.outcome.state());
        report
    }

    pub fn dispatch_and_follow(
        &self,
        to: &str,
        message: &str,
        shipment_details: Option<ShipmentDetails>,
        pacer: &dyn Pacer,
    ) -> FollowReport {
        let record = self.dispatch(to, message, shipment_details);
        self.follow(record, pacer)
    }

    /// Applies an update produced elsewhere, e.g. by a polling worker. A cache
    /// failure is logged and the update is dropped, as in [`Dispatcher::follow`].
    pub fn record_update(&self, record: &CallRecord) {
        self.persist(record);
    }

    pub(crate) fn settle(&self, outcome: FollowOutcome) {
        self.state.set(outcome.state());
    }

    /// Calls known to the transport, or the local cache when it cannot be
    /// reached.
    pub fn call_history(&self) -> Result<CallHistoryView> {
        match self.transport.list_calls() {
            Ok(calls) => Ok(CallHistoryView {
                source: HistorySource::Transport,
                calls,
            }),
            Err(err) => {
                warn!(error = %err, "call history unavailable, using local cache");
                let calls = self.cache.list().map_err(NotifyError::Store)?;
                Ok(CallHistoryView {
                    source: HistorySource::Cache,
                    calls,
                })
            }
        }
    }

    fn persist(&self, record: &CallRecord) {
        if let Err(err) = self.cache.upsert(record) {
            warn!(call = %record.id, error = %err, "failed to cache call record");
        }
    }
}

fn fallback_record(request: CallRequest) -> CallRecord {
    let message = if request.message.trim().is_empty() {
        FALLBACK_MESSAGE.to_string()
    } else {
        request.message
    };
    CallRecord {
        id: CallId::local(),
        to: request.to,
        from: FALLBACK_FROM.to_string(),
        status: CallStatus::Failed,
        duration: 0,
        timestamp: Utc::now().timestamp(),
        message,
        shipment_details: request.shipment_details,
    }
}
