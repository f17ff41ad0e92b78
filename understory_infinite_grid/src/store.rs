// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The backing collection facade and its change subscriptions.
//!
//! The grid only needs three things from the backing collection: how many
//! items it holds, the item at a backing index, and a payload-free "changed"
//! signal. Change listeners are registered explicitly through
//! [`BackingStore::subscribe`] and removed with [`BackingStore::unsubscribe`];
//! there is no global notification bus.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

/// Handle identifying one change subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// An ordered, finite collection of items that can announce changes.
pub trait BackingStore {
    /// The item type handed to the presentation layer.
    type Item;

    /// Number of items currently in the collection.
    fn count(&self) -> usize;

    /// Returns `true` if the collection is empty.
    fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// The item at `backing_index`, if it is in range.
    fn item_at(&self, backing_index: usize) -> Option<&Self::Item>;

    /// Registers `on_changed` to run after every change to the collection.
    fn subscribe(&mut self, on_changed: Box<dyn FnMut()>) -> SubscriptionId;

    /// Removes a subscription. Returns `false` if `id` was not registered.
    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;
}

/// A list of change callbacks, for implementing [`BackingStore`] subscriptions.
#[derive(Default)]
pub struct ChangeNotifier {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Box<dyn FnMut()>)>,
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("next_id", &self.next_id)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl ChangeNotifier {
    /// Creates a notifier with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback and returns its handle.
    pub fn subscribe(&mut self, on_changed: Box<dyn FnMut()>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, on_changed));
        id
    }

    /// Removes the callback registered under `id`.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Returns `true` if nobody is subscribed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Runs every callback, in subscription order.
    pub fn notify(&mut self) {
        for (_, on_changed) in &mut self.subscribers {
            on_changed();
        }
    }
}

/// An in-memory [`BackingStore`] over a `Vec`.
///
/// Every mutation notifies subscribers once, after the change is applied.
#[derive(Debug, Default)]
pub struct VecStore<T> {
    items: Vec<T>,
    notifier: ChangeNotifier,
}

impl<T> VecStore<T> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            notifier: ChangeNotifier::new(),
        }
    }

    /// Creates a store holding `items`.
    #[must_use]
    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            items,
            notifier: ChangeNotifier::new(),
        }
    }

    /// The items, in backing order.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Appends an item.
    pub fn push(&mut self, item: T) {
        self.items.push(item);
        self.notifier.notify();
    }

    /// Inserts an item at `index`, clamped to the current length.
    pub fn insert(&mut self, index: usize, item: T) {
        let index = index.min(self.items.len());
        self.items.insert(index, item);
        self.notifier.notify();
    }

    /// Removes and returns the item at `index`, if any.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        if index >= self.items.len() {
            return None;
        }
        let item = self.items.remove(index);
        self.notifier.notify();
        Some(item)
    }

    /// Replaces the whole collection, as after a fresh fetch.
    pub fn replace_all(&mut self, items: Vec<T>) {
        self.items = items;
        self.notifier.notify();
    }

    /// Removes every item.
    pub fn clear(&mut self) {
        self.items.clear();
        self.notifier.notify();
    }
}

impl<T> BackingStore for VecStore<T> {
    type Item = T;

    fn count(&self) -> usize {
        self.items.len()
    }

    fn item_at(&self, backing_index: usize) -> Option<&T> {
        self.items.get(backing_index)
    }

    fn subscribe(&mut self, on_changed: Box<dyn FnMut()>) -> SubscriptionId {
        self.notifier.subscribe(on_changed)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::rc::Rc;
    use alloc::vec;
    use core::cell::Cell;

    use super::{BackingStore, ChangeNotifier, VecStore};

    #[test]
    fn mutations_notify_subscribers() {
        let hits = Rc::new(Cell::new(0_u32));
        let mut store = VecStore::from_vec(vec!['a', 'b']);
        let counter = Rc::clone(&hits);
        let id = store.subscribe(Box::new(move || counter.set(counter.get() + 1)));

        store.push('c');
        store.insert(99, 'd');
        assert_eq!(store.remove(0), Some('a'));
        assert_eq!(store.remove(10), None);
        assert_eq!(hits.get(), 3);
        assert_eq!(store.items(), &['b', 'c', 'd']);

        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.clear();
        assert_eq!(hits.get(), 3);
        assert!(store.is_empty());
    }

    #[test]
    fn item_lookup_is_bounds_checked() {
        let store = VecStore::from_vec(vec![10, 20, 30]);
        assert_eq!(store.count(), 3);
        assert_eq!(store.item_at(2), Some(&30));
        assert_eq!(store.item_at(3), None);
    }

    #[test]
    fn notifier_runs_callbacks_in_order() {
        let log = Rc::new(Cell::new(0_u32));
        let mut notifier = ChangeNotifier::new();
        let first = Rc::clone(&log);
        let second = Rc::clone(&log);
        notifier.subscribe(Box::new(move || first.set(first.get() * 10 + 1)));
        let id = notifier.subscribe(Box::new(move || second.set(second.get() * 10 + 2)));
        notifier.notify();
        assert_eq!(log.get(), 12);
        assert_eq!(notifier.len(), 2);
        notifier.unsubscribe(id);
        notifier.notify();
        assert_eq!(log.get(), 121);
    }
}
