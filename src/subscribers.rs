use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::rc::Weak;

use smallvec::SmallVec;

use crate::Observer;

/// The identity of an observer is the address of its shared body, taken
/// as a thin pointer so that two references to the same allocation
/// always compare equal regardless of vtable.
pub(crate) fn address(observer: &Weak<dyn Observer>) -> *const () {
	Weak::as_ptr(observer) as *const ()
}

/// Per-source registry of observers, held weakly: a registration never
/// extends the observer's lifetime. Entries whose observer is gone are
/// reaped on every mutating access, which bounds growth from long-dead
/// registrations.
pub(crate) struct Subscribers {
	registered: BTreeSet<ObserverRef>,
}

impl Subscribers {
	pub fn new() -> Self {
		Subscribers {
			registered: BTreeSet::new(),
		}
	}

	pub fn add(&mut self, observer: Weak<dyn Observer>) {
		self.reap();
		self.registered.insert(ObserverRef(observer));
	}

	pub fn remove(&mut self, observer: &Weak<dyn Observer>) {
		self.reap();
		self.registered.remove(&ObserverRef(observer.clone()));
	}

	/// A copy of the live entries, for notification walks. The caller
	/// must not hold any borrow of the registry while it notifies, since
	/// an observer may subscribe or unsubscribe from within its handler.
	pub fn snapshot(&mut self) -> SmallVec<[Weak<dyn Observer>; 4]> {
		self.reap();
		self.registered.iter().map(|entry| entry.0.clone()).collect()
	}

	fn reap(&mut self) {
		let before = self.registered.len();
		self.registered.retain(|entry| entry.0.strong_count() > 0);
		let reaped = before - self.registered.len();
		if reaped > 0 {
			tracing::trace!(reaped, "dropped dead subscriber entries");
		}
	}

	#[cfg(debug_assertions)]
	pub fn len(&self) -> usize {
		self.registered
			.iter()
			.filter(|entry| entry.0.strong_count() > 0)
			.count()
	}
}

struct ObserverRef(Weak<dyn Observer>);

impl PartialEq for ObserverRef {
	fn eq(&self, other: &Self) -> bool {
		address(&self.0) == address(&other.0)
	}
}

impl Eq for ObserverRef {}

impl Ord for ObserverRef {
	fn cmp(&self, other: &Self) -> Ordering {
		address(&self.0).cmp(&address(&other.0))
	}
}

impl PartialOrd for ObserverRef {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}
