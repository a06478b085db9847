use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::sources::Sources;
use crate::{context, Observer, Source};

/// An eager observer with no cached value: the body runs once at
/// construction and again whenever a tracked source verifiably changes.
/// Dropping the last handle unsubscribes everywhere; nothing re-runs
/// afterwards.
#[derive(Clone)]
pub struct Effect {
	body: Rc<EffectBody>,
}

struct EffectBody {
	func: Box<dyn Fn()>,
	sources: RefCell<Sources>,
	this: Weak<EffectBody>,
}

impl Effect {
	#[must_use]
	pub fn new(func: Box<dyn Fn()>) -> Self {
		let body = Rc::new_cyclic(|this| EffectBody {
			func,
			sources: RefCell::new(Sources::new()),
			this: this.clone(),
		});

		body.run();
		Effect { body }
	}

	#[cfg(debug_assertions)]
	pub fn source_count(&self) -> usize {
		self.body.sources.borrow().len()
	}
}

impl EffectBody {
	fn run(&self) {
		tracing::trace!("running effect");

		let this = self.this.clone() as Weak<dyn Observer>;
		self.sources.borrow_mut().clear(&this);
		context::scope(this, || (self.func)());
	}
}

impl Observer for EffectBody {
	fn on_notify(&self, source_changed: bool) {
		let this = self.this.clone() as Weak<dyn Observer>;
		if source_changed || Sources::any_changed(&self.sources, &this) {
			self.run();
		}
	}

	fn add_source(&self, source: Rc<dyn Source>) {
		self.sources.borrow_mut().add(source);
	}
}

impl Drop for EffectBody {
	fn drop(&mut self) {
		let this = self.this.clone() as Weak<dyn Observer>;
		self.sources.get_mut().clear(&this);
	}
}
