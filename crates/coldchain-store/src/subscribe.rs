use coldchain_core::ShipmentRecord;
use std::cell::RefCell;
use std::sync::mpsc::{channel, Receiver, Sender};

/// Full shipment set of one owner, in stored order.
pub type Snapshot = Vec<ShipmentRecord>;

struct Subscriber {
    owner: String,
    tx: Sender<Snapshot>,
}

/// Live listeners keyed by owner. Disconnected receivers are pruned on publish.
#[derive(Default)]
pub struct Subscribers {
    inner: RefCell<Vec<Subscriber>>,
}

impl Subscribers {
    pub fn add(&self, owner: &str, initial: Snapshot) -> Receiver<Snapshot> {
        let (tx, rx) = channel();
        // The receiver is still in scope, so this send cannot fail.
        let _ = tx.send(initial);
        self.inner.borrow_mut().push(Subscriber {
            owner: owner.to_string(),
            tx,
        });
        rx
    }

    pub fn watches(&self, owner: &str) -> bool {
        self.inner.borrow().iter().any(|sub| sub.owner == owner)
    }

    pub fn publish(&self, owner: &str, snapshot: &[ShipmentRecord]) {
        self.inner
            .borrow_mut()
            .retain(|sub| sub.owner != owner || sub.tx.send(snapshot.to_vec()).is_ok());
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::Subscribers;

    #[test]
    fn publish_reaches_matching_owner_only() {
        let subs = Subscribers::default();
        let ops = subs.add("ops", Vec::new());
        let other = subs.add("other", Vec::new());
        assert!(ops.recv().expect("initial").is_empty());
        assert!(other.recv().expect("initial").is_empty());

        subs.publish("ops", &[]);
        assert!(ops.try_recv().is_ok());
        assert!(other.try_recv().is_err());
    }

    #[test]
    fn publish_prunes_dropped_receivers() {
        let subs = Subscribers::default();
        let rx = subs.add("ops", Vec::new());
        drop(rx);
        assert!(subs.watches("ops"));
        subs.publish("ops", &[]);
        assert!(!subs.watches("ops"));
        assert!(subs.is_empty());
    }
}
