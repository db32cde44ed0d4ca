//! Live item instances.

use crate::template::ItemTemplate;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Hands out object ids for new instances
pub trait IdAllocator: Send + Sync {
    /// Next unused object id; never 0
    fn next_id(&self) -> u32;
}

/// Monotonic in-process allocator
#[derive(Debug)]
pub struct SequentialIds {
    next: AtomicU32,
}

impl SequentialIds {
    /// Start handing out ids at `first` (0 is bumped to 1)
    pub fn starting_at(first: u32) -> Self {
        Self {
            next: AtomicU32::new(first.max(1)),
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl IdAllocator for SequentialIds {
    fn next_id(&self) -> u32 {
        loop {
            let id = self.next.fetch_add(1, Ordering::Relaxed);
            // 0 only comes back after wrapping
            if id != 0 {
                return id;
            }
        }
    }
}

/// An item in the world, sharing its template with every other instance
#[derive(Debug, Clone)]
pub struct ItemInstance {
    pub object_id: u32,
    pub template: Arc<ItemTemplate>,
}

impl ItemInstance {
    pub fn new(object_id: u32, template: Arc<ItemTemplate>) -> Self {
        Self {
            object_id,
            template,
        }
    }

    pub fn item_id(&self) -> u32 {
        self.template.id()
    }
}
