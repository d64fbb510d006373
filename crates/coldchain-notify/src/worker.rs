use crate::cancel::CancelToken;
use crate::dispatch::{poll_until_terminal, Dispatcher, FollowReport};
use crate::error::{NotifyError, Result};
use crate::transport::CallTransport;
use coldchain_core::CallRecord;
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

/// Polling running on a background thread.
///
/// The worker only talks to the transport. Updates come back over a channel
/// and are written to the cache by whoever drains the handle.
pub struct FollowHandle {
    updates: Receiver<CallRecord>,
    join: JoinHandle<FollowReport>,
    token: CancelToken,
}

impl FollowHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    pub fn updates(&self) -> &Receiver<CallRecord> {
        &self.updates
    }

    /// Applies every pending update through `dispatcher` and waits for the
    /// worker to finish. Only a panicked worker is an error.
    pub fn finish<T: CallTransport>(self, dispatcher: &Dispatcher<'_, T>) -> Result<FollowReport> {
        for update in self.updates.iter() {
            dispatcher.record_update(&update);
        }
        let report = self.join.join().map_err(|_| NotifyError::Worker)?;
        dispatcher.settle(report.outcome);
        Ok(report)
    }
}

impl<T> Dispatcher<'_, T>
where
    T: CallTransport + Clone + Send + 'static,
{
    pub fn spawn_follow(&self, record: CallRecord) -> FollowHandle {
        let token = CancelToken::new();
        let pacer = token.clone();
        let transport = self.transport().clone();
        let policy = self.policy();
        let (tx, updates) = mpsc::channel();
        let join = thread::spawn(move || {
            poll_until_terminal(&transport, record, policy, &pacer, |_, update| {
                let _ = tx.send(update.clone());
            })
        });
        FollowHandle {
            updates,
            join,
            token,
        }
    }
}
