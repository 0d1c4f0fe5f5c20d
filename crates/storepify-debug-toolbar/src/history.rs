//! Bounded store of recorded requests

use crate::context::{HistoryEntry, ToolbarContext};
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Most recent requests, oldest evicted first
pub struct ToolbarHistory {
	capacity: usize,
	next_id: AtomicU64,
	entries: RwLock<VecDeque<Arc<ToolbarContext>>>,
}

impl ToolbarHistory {
	pub fn new(capacity: usize) -> Self {
		Self {
			capacity: capacity.max(1),
			next_id: AtomicU64::new(1),
			entries: RwLock::new(VecDeque::new()),
		}
	}

	/// Reserve the id of a request about to be recorded
	pub fn next_id(&self) -> u64 {
		self.next_id.fetch_add(1, Ordering::Relaxed)
	}

	pub fn push(&self, ctx: ToolbarContext) {
		let mut entries = self.entries.write();
		while entries.len() >= self.capacity {
			entries.pop_front();
		}
		entries.push_back(Arc::new(ctx));
	}

	pub fn get(&self, id: u64) -> Option<Arc<ToolbarContext>> {
		self.entries.read().iter().find(|ctx| ctx.id == id).cloned()
	}

	/// Newest first
	pub fn entries(&self) -> Vec<HistoryEntry> {
		self.entries
			.read()
			.iter()
			.rev()
			.map(|ctx| HistoryEntry::from(ctx.as_ref()))
			.collect()
	}

	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn clear(&self) {
		self.entries.write().clear();
	}
}
