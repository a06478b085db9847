use std::cell::RefCell;
use std::rc::Weak;

use crate::subscribers::address;
use crate::Observer;

thread_local! {
	static ACTIVE: RefCell<Vec<Weak<dyn Observer>>> = RefCell::new(Vec::new());
}

/// Evaluate `body` with `observer` installed as the active tracking
/// context, so that every tracked read inside `body` registers an edge
/// back to `observer`. Nesting is legal; the previous context is restored
/// on every exit path, including a panic inside `body`.
///
/// Panics if `observer` is already evaluating somewhere on the current
/// call stack. Allowing that would mean a computation reads (directly or
/// through a dependency cycle) its own not-yet-computed value, which can
/// only recurse without bound.
pub fn scope<R>(observer: Weak<dyn Observer>, body: impl FnOnce() -> R) -> R {
	ACTIVE.with(|active| {
		let mut active = active.borrow_mut();
		if active.iter().any(|entry| address(entry) == address(&observer)) {
			panic!("re-entrant evaluation: an observer read its own value while evaluating");
		}
		active.push(observer);
	});

	let _restore = Restore;
	body()
}

/// The innermost observer currently evaluating, if any.
pub(crate) fn current() -> Option<Weak<dyn Observer>> {
	ACTIVE.with(|active| active.borrow().last().cloned())
}

struct Restore;

impl Drop for Restore {
	fn drop(&mut self) {
		ACTIVE.with(|active| {
			active.borrow_mut().pop();
		});
	}
}
