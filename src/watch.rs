use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::value::Value;
use crate::{Observer, Source};

/// An observer bound to exactly one source. The callback receives
/// `(new, old)` pairs, and only for verified value changes: a
/// notification that washes out upstream never reaches it.
pub struct Watch<T>
where
	T: Clone + PartialEq + 'static,
{
	body: Rc<WatchBody<T>>,
}

struct WatchBody<T>
where
	T: Clone + PartialEq + 'static,
{
	source: Value<T>,
	func: Box<dyn Fn(&T, &T)>,
	baseline: RefCell<T>,
	this: Weak<WatchBody<T>>,
}

impl<T> Watch<T>
where
	T: Clone + PartialEq + 'static,
{
	/// Bind to `source` and record its current value as the baseline.
	/// The callback is not invoked for the baseline read.
	#[must_use]
	pub fn new(source: impl Into<Value<T>>, func: Box<dyn Fn(&T, &T)>) -> Self {
		let source = source.into();
		let baseline = source.get_once().clone();

		let body = Rc::new_cyclic(|this| WatchBody {
			source,
			func,
			baseline: RefCell::new(baseline),
			this: this.clone(),
		});

		let observer = body.this.clone() as Weak<dyn Observer>;
		body.source.subscribe(observer);

		Watch { body }
	}
}

impl<T> Observer for WatchBody<T>
where
	T: Clone + PartialEq + 'static,
{
	fn on_notify(&self, source_changed: bool) {
		let this = self.this.clone() as Weak<dyn Observer>;
		if !source_changed && !self.source.query_changed(&this) {
			return;
		}

		let new = self.source.get_once().clone();
		let old = self.baseline.borrow().clone();
		(self.func)(&new, &old);
		*self.baseline.borrow_mut() = new;
	}

	fn add_source(&self, _source: Rc<dyn Source>) {
		// A watch never evaluates user code under its own scope; its one
		// subscription is established explicitly at construction.
	}
}

impl<T> Drop for WatchBody<T>
where
	T: Clone + PartialEq + 'static,
{
	fn drop(&mut self) {
		let this = self.this.clone() as Weak<dyn Observer>;
		self.source.unsubscribe(&this);
	}
}
