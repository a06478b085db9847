use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::{Observer, Source};

/// The dependency half of the subscription edges, owned by the observer.
/// Sources are held strongly: a derived value keeps its inputs alive.
pub(crate) struct Sources {
	tracked: BTreeSet<SourceRef>,
}

impl Sources {
	pub fn new() -> Self {
		Sources {
			tracked: BTreeSet::new(),
		}
	}

	pub fn add(&mut self, source: Rc<dyn Source>) {
		self.tracked.insert(SourceRef(source));
	}

	/// Tear down `owner`'s half of every edge: unsubscribe from each
	/// tracked source and forget it.
	pub fn clear(&mut self, owner: &Weak<dyn Observer>) {
		for source in std::mem::take(&mut self.tracked) {
			source.0.unsubscribe(owner);
		}
	}

	/// Ask every tracked source, on behalf of `asking`, whether it
	/// actually changed. Stops at the first source that did. Works on a
	/// snapshot: verification may recompute sources, and a recompute is
	/// allowed to reshape this very set.
	pub fn any_changed(cell: &RefCell<Sources>, asking: &Weak<dyn Observer>) -> bool {
		let tracked: SmallVec<[Rc<dyn Source>; 4]> = cell
			.borrow()
			.tracked
			.iter()
			.map(|entry| entry.0.clone())
			.collect();

		tracked.iter().any(|source| source.query_changed(asking))
	}

	#[cfg(debug_assertions)]
	pub fn len(&self) -> usize {
		self.tracked.len()
	}
}

struct SourceRef(Rc<dyn Source>);

impl SourceRef {
	fn address(&self) -> *const () {
		Rc::as_ptr(&self.0) as *const ()
	}
}

impl PartialEq for SourceRef {
	fn eq(&self, other: &Self) -> bool {
		self.address() == other.address()
	}
}

impl Eq for SourceRef {}

impl Ord for SourceRef {
	fn cmp(&self, other: &Self) -> Ordering {
		self.address().cmp(&other.address())
	}
}

impl PartialOrd for SourceRef {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}
