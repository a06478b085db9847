use std::cell::{Ref, RefCell};
use std::fmt::Debug;
use std::rc::{Rc, Weak};

use crate::subscribers::Subscribers;
use crate::value::{Access, Value};
use crate::{context, Computed, Observer, Source};

/// A mutable value cell, the ultimate origin of change in the graph.
/// Cloning the handle shares the cell.
pub struct Signal<T> {
	body: Rc<SignalBody<T>>,
}

impl<T> Clone for Signal<T> {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

impl<T> Default for Signal<T>
where
	T: Default + PartialEq + 'static,
{
	fn default() -> Self {
		Signal::new(Default::default())
	}
}

pub struct SignalBody<T> {
	value: RefCell<T>,
	subscribers: RefCell<Subscribers>,
	this: Weak<SignalBody<T>>,
}

pub trait Toggle {
	fn toggle(&mut self);
}

impl Toggle for bool {
	fn toggle(&mut self) {
		*self = !*self
	}
}

impl<T> Signal<T>
where
	T: PartialEq + 'static,
{
	pub fn new(value: T) -> Self {
		Signal {
			body: Rc::new_cyclic(|this| SignalBody {
				value: RefCell::new(value),
				subscribers: RefCell::new(Subscribers::new()),
				this: this.clone(),
			}),
		}
	}

	/// Derive a computed value from this cell.
	pub fn map<F, R>(&self, func: F) -> Computed<R>
	where
		F: Fn(&T) -> R + 'static,
		R: PartialEq + 'static,
	{
		let this = self.clone();
		Computed::new(Box::new(move || func(&*this.get())))
	}

	#[inline]
	pub fn set(&self, value: T) {
		let _ = self.body.replace(value);
	}

	#[inline]
	pub fn replace(&self, value: T) -> T {
		self.body.replace(value)
	}

	#[inline]
	pub fn update(&self, func: impl FnOnce(&mut T))
	where
		T: Clone,
	{
		self.body.update(func)
	}

	#[inline]
	pub fn toggle(&self)
	where
		T: Toggle + Clone,
	{
		self.update(T::toggle)
	}

}

impl<T> Signal<T>
where
	T: 'static,
{
	/// Read the current value. When an observer is evaluating, this
	/// registers the subscription edge between the cell and the observer.
	#[inline]
	pub fn get(&self) -> Ref<'_, T> {
		self.body.get()
	}

	/// Read the current value without registering anything, even inside
	/// an active evaluation.
	#[inline]
	pub fn get_once(&self) -> Ref<'_, T> {
		self.body.get_once()
	}

	#[cfg(debug_assertions)]
	pub fn observer_count(&self) -> usize {
		self.body.subscribers.borrow().len()
	}
}

impl<T> SignalBody<T>
where
	T: 'static,
{
	pub fn get(&self) -> Ref<'_, T> {
		self.track();
		self.value.borrow()
	}

	pub fn get_once(&self) -> Ref<'_, T> {
		self.value.borrow()
	}

	fn track(&self) {
		let observer = match context::current() {
			Some(observer) => observer,
			None => return,
		};

		self.subscribers.borrow_mut().add(observer.clone());
		if let Some(observer) = observer.upgrade() {
			observer.add_source(self.this.upgrade().unwrap());
		}
	}

	pub fn replace(&self, value: T) -> T
	where
		T: PartialEq,
	{
		if *self.value.borrow() == value {
			// Not a change under domain equality: keep the stored value
			// untouched and stay silent.
			return value;
		}

		let old = std::mem::replace(&mut *self.value.borrow_mut(), value);
		self.notify();
		old
	}

	pub fn update(&self, func: impl FnOnce(&mut T))
	where
		T: Clone + PartialEq,
	{
		let old = self.value.borrow().clone();
		{
			let mut value = self.value.borrow_mut();
			func(&mut value);
			if *value == old {
				return;
			}
		}
		self.notify();
	}

	fn notify(&self) {
		tracing::trace!("signal changed, notifying subscribers");
		let subscribers = self.subscribers.borrow_mut().snapshot();
		for subscriber in subscribers {
			if let Some(subscriber) = subscriber.upgrade() {
				subscriber.on_notify(true);
			}
		}
	}
}

impl<T> Source for SignalBody<T>
where
	T: 'static,
{
	fn subscribe(&self, observer: Weak<dyn Observer>) {
		self.subscribers.borrow_mut().add(observer);
	}

	fn unsubscribe(&self, observer: &Weak<dyn Observer>) {
		self.subscribers.borrow_mut().remove(observer);
	}

	fn query_changed(&self, _asking: &Weak<dyn Observer>) -> bool {
		// A signal only ever notifies after a real change, so when asked
		// it can always vouch for one.
		true
	}
}

impl<T> Access<T> for SignalBody<T>
where
	T: 'static,
{
	fn get(&self) -> Ref<'_, T> {
		SignalBody::get(self)
	}

	fn get_once(&self) -> Ref<'_, T> {
		SignalBody::get_once(self)
	}
}

impl<T> From<Signal<T>> for Value<T>
where
	T: 'static,
{
	fn from(signal: Signal<T>) -> Self {
		Value::new(signal.body)
	}
}

impl<T> Debug for Signal<T>
where
	T: Debug + 'static,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.get_once().fmt(f)
	}
}
