use parking_lot::Mutex;

use super::subscribe::{Subscription, Unsubscribeable};

enum SlotState {
    Empty,
    Held(Subscription),
    Disposed,
}

/// Holds a subscription that may be disposed before it is known.
///
/// A source that terminates synchronously inside `subscribe` asks for disposal
/// before its `Subscription` has been returned. The slot remembers that request
/// and unsubscribes the late subscription as soon as it is stored.
pub(crate) struct SubscriptionSlot {
    state: Mutex<SlotState>,
}

impl SubscriptionSlot {
    pub(crate) fn new() -> Self {
        SubscriptionSlot {
            state: Mutex::new(SlotState::Empty),
        }
    }

    /// Stores `s`, or unsubscribes it right away if the slot was disposed.
    pub(crate) fn set(&self, s: Subscription) {
        let mut state = self.state.lock();
        if let SlotState::Disposed = *state {
            drop(state);
            s.unsubscribe();
            return;
        }
        let previous = std::mem::replace(&mut *state, SlotState::Held(s));
        drop(state);
        if let SlotState::Held(previous) = previous {
            previous.unsubscribe();
        }
    }

    /// Unsubscribes the held subscription. Calling it again is a no-op.
    pub(crate) fn dispose(&self) {
        let previous = std::mem::replace(&mut *self.state.lock(), SlotState::Disposed);
        // Unsubscribe outside the lock, unsubscribe logic may call back into us.
        if let SlotState::Held(s) = previous {
            s.unsubscribe();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::*;
    use crate::subscribe::{SubscriptionHandle, UnsubscribeLogic};

    fn counted(count: &Arc<AtomicUsize>) -> Subscription {
        let count = Arc::clone(count);
        Subscription::new(
            UnsubscribeLogic::Logic(Box::new(move || {
                count.fetch_add(1, Ordering::SeqCst);
            })),
            SubscriptionHandle::Nil,
        )
    }

    #[test]
    fn dispose_before_set_unsubscribes_on_set() {
        let count = Arc::new(AtomicUsize::new(0));
        let slot = SubscriptionSlot::new();

        slot.dispose();
        assert_eq!(count.load(Ordering::SeqCst), 0);

        slot.set(counted(&count));
        assert_eq!(count.load(Ordering::SeqCst), 1);

        // Still disposed: later subscriptions are released too.
        slot.set(counted(&count));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn dispose_is_idempotent() {
        let count = Arc::new(AtomicUsize::new(0));
        let slot = SubscriptionSlot::new();

        slot.set(counted(&count));
        slot.dispose();
        slot.dispose();

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
