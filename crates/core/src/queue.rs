use std::collections::VecDeque;

use barrage_protocol::{ItemConfig, ItemId};

/// A bullet waiting for a lane.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingItem<C> {
    pub id: ItemId,
    pub content: C,
    pub config: ItemConfig,
}

/// Arrival-ordered holding area for bullets that could not be admitted.
///
/// Unbounded: a producer that outpaces the screen grows the queue without
/// limit until `clear`.
#[derive(Debug, Clone)]
pub struct PendingQueue<C> {
    items: VecDeque<PendingItem<C>>,
}

impl<C> PendingQueue<C> {
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    pub fn enqueue(&mut self, item: PendingItem<C>) {
        self.items.push_back(item);
    }

    pub fn dequeue(&mut self) -> Option<PendingItem<C>> {
        self.items.pop_front()
    }

    /// The oldest waiting bullet.
    pub fn front(&self) -> Option<&PendingItem<C>> {
        self.items.front()
    }

    /// Drop a specific bullet, wherever it sits in the queue.
    pub fn remove(&mut self, id: ItemId) -> Option<PendingItem<C>> {
        let pos = self.items.iter().position(|item| item.id == id)?;
        self.items.remove(pos)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.iter().any(|item| item.id == id)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Queued ids, oldest first.
    pub fn ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.items.iter().map(|item| item.id)
    }
}

impl<C> Default for PendingQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}
