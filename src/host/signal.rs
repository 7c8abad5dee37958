//! Render-complete signal registry

use super::{CompletionListener, SceneId};

/// Token returned by [`CompletionBus::subscribe`]; needed to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

impl SubscriptionHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// A finished render, as delivered to one subscriber
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderComplete {
    /// Scene that was active when the render was requested
    pub scene: SceneId,
    /// Subscription the signal was delivered through
    pub subscription: SubscriptionHandle,
}

/// Explicit subscribe/unsubscribe registry for render-complete listeners.
///
/// Listeners are removed by handle, never by comparing callbacks.
#[derive(Debug, Default)]
pub struct CompletionBus {
    next_id: u64,
    listeners: Vec<(SubscriptionHandle, CompletionListener)>,
}

impl CompletionBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: CompletionListener) -> SubscriptionHandle {
        self.next_id += 1;
        let handle = SubscriptionHandle(self.next_id);
        self.listeners.push((handle, listener));
        log::debug!("render_complete: subscribed #{}", handle.0);
        handle
    }

    /// Idempotent: unsubscribing an unknown handle returns `false`
    pub fn unsubscribe(&mut self, handle: SubscriptionHandle) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(h, _)| *h != handle);
        let removed = self.listeners.len() != before;
        if removed {
            log::debug!("render_complete: unsubscribed #{}", handle.0);
        }
        removed
    }

    /// Deliver a completion to every listener. Listeners whose receiving end
    /// is gone are dropped. Returns the number of deliveries.
    pub fn notify(&mut self, scene: &SceneId) -> usize {
        let mut delivered = 0;
        self.listeners.retain(|(handle, tx)| {
            let signal = RenderComplete {
                scene: scene.clone(),
                subscription: *handle,
            };
            match tx.send(signal) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => {
                    log::debug!("render_complete: pruning closed listener #{}", handle.0);
                    false
                }
            }
        });
        delivered
    }

    pub fn is_subscribed(&self, handle: SubscriptionHandle) -> bool {
        self.listeners.iter().any(|(h, _)| *h == handle)
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn handles_are_unique_and_unsubscribe_is_idempotent() {
        let mut bus = CompletionBus::new();
        let (tx, _rx) = mpsc::channel();
        let a = bus.subscribe(tx.clone());
        let b = bus.subscribe(tx);
        assert_ne!(a, b);
        assert_eq!(bus.len(), 2);

        assert!(bus.unsubscribe(a));
        assert!(!bus.unsubscribe(a));
        assert!(!bus.is_subscribed(a));
        assert!(bus.is_subscribed(b));
    }

    #[test]
    fn notify_tags_each_delivery_with_its_subscription() {
        let mut bus = CompletionBus::new();
        let (tx, rx) = mpsc::channel();
        let handle = bus.subscribe(tx);

        assert_eq!(bus.notify(&SceneId::from("A")), 1);
        let got = rx.try_recv().unwrap();
        assert_eq!(got.scene, SceneId::from("A"));
        assert_eq!(got.subscription, handle);
    }

    #[test]
    fn closed_listeners_are_pruned() {
        let mut bus = CompletionBus::new();
        let (tx, rx) = mpsc::channel();
        bus.subscribe(tx);
        drop(rx);
        assert_eq!(bus.notify(&SceneId::from("A")), 0);
        assert!(bus.is_empty());
    }
}
