use std::cell::Ref;
use std::rc::{Rc, Weak};

use crate::{Observer, Source};

/// Tracked and untracked read access, layered on the source capability.
pub trait Access<T>: Source {
	fn get(&self) -> Ref<'_, T>;
	fn get_once(&self) -> Ref<'_, T>;
}

/// A readable handle that erases whether the underlying source is a
/// signal or a computed. This is what collaborators that only care about
/// "some observable value of `T`" hold on to.
pub struct Value<T> {
	value: Rc<dyn Access<T>>,
}

impl<T> Clone for Value<T> {
	fn clone(&self) -> Self {
		Value {
			value: self.value.clone(),
		}
	}
}

impl<T> Value<T>
where
	T: 'static,
{
	pub fn new(value: Rc<dyn Access<T>>) -> Self {
		Value { value }
	}

	pub fn get(&self) -> Ref<'_, T> {
		self.value.get()
	}

	pub fn get_once(&self) -> Ref<'_, T> {
		self.value.get_once()
	}

	pub fn subscribe(&self, observer: Weak<dyn Observer>) {
		self.value.subscribe(observer)
	}

	pub fn unsubscribe(&self, observer: &Weak<dyn Observer>) {
		self.value.unsubscribe(observer)
	}

	pub fn query_changed(&self, asking: &Weak<dyn Observer>) -> bool {
		self.value.query_changed(asking)
	}
}
