use std::cell::{Cell, Ref, RefCell};
use std::rc::{Rc, Weak};

use crate::sources::Sources;
use crate::subscribers::{address, Subscribers};
use crate::value::{Access, Value};
use crate::{context, Observer, Source};

/// How much the cache can be trusted. Notifications only ever escalate
/// the status; a successful recompute is the only way back to `Clean`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Status {
	/// The cached value is trustworthy as-is.
	Clean,
	/// An upstream computed reported a possible change; verify with the
	/// tracked sources before deciding whether to recompute.
	MaybeDirty,
	/// A directly-read source reported an authoritative change;
	/// recompute unconditionally on next access.
	SourcesChanged,
}

/// A derived, memoizing value. The expression is not evaluated until the
/// first read; every recompute rediscovers the dependency set from the
/// reads the expression actually performs.
pub struct Computed<T>
where
	T: PartialEq + 'static,
{
	body: Rc<ComputedBody<T>>,
}

impl<T> Clone for Computed<T>
where
	T: PartialEq + 'static,
{
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

pub struct ComputedBody<T>
where
	T: PartialEq + 'static,
{
	func: Box<dyn Fn() -> T>,
	value: RefCell<Option<T>>,
	status: Cell<Status>,
	subscribers: RefCell<Subscribers>,
	sources: RefCell<Sources>,
	this: Weak<ComputedBody<T>>,
}

impl<T> Drop for ComputedBody<T>
where
	T: PartialEq + 'static,
{
	fn drop(&mut self) {
		let this = self.this.clone() as Weak<dyn Observer>;
		self.sources.get_mut().clear(&this);
	}
}

impl<T> Computed<T>
where
	T: PartialEq + 'static,
{
	pub fn new(func: Box<dyn Fn() -> T>) -> Self {
		Computed {
			body: Rc::new_cyclic(|this| ComputedBody {
				func,
				value: RefCell::new(None),
				status: Cell::new(Status::SourcesChanged),
				subscribers: RefCell::new(Subscribers::new()),
				sources: RefCell::new(Sources::new()),
				this: this.clone(),
			}),
		}
	}

	/// Read the value, recomputing only if a tracked source verifiably
	/// changed. When an observer is evaluating, this also registers the
	/// subscription edge between it and this computed.
	#[inline]
	pub fn get(&self) -> Ref<'_, T> {
		self.body.get()
	}

	/// Read the value without registering anything, even inside an
	/// active evaluation. Still recomputes when stale.
	#[inline]
	pub fn get_once(&self) -> Ref<'_, T> {
		self.body.get_once()
	}

	#[cfg(debug_assertions)]
	pub fn observer_count(&self) -> usize {
		self.body.subscribers.borrow().len()
	}

	#[cfg(debug_assertions)]
	pub fn source_count(&self) -> usize {
		self.body.sources.borrow().len()
	}
}

impl<T> ComputedBody<T>
where
	T: PartialEq + 'static,
{
	pub fn get(&self) -> Ref<'_, T> {
		self.track();
		self.ensure_fresh();
		Ref::map(self.value.borrow(), |value| value.as_ref().unwrap())
	}

	pub fn get_once(&self) -> Ref<'_, T> {
		self.ensure_fresh();
		Ref::map(self.value.borrow(), |value| value.as_ref().unwrap())
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

	/// Bring the cache up to date, recomputing as conservatively as the
	/// status allows.
	fn ensure_fresh(&self) {
		match self.status.get() {
			Status::Clean => {}
			Status::SourcesChanged => {
				self.recompute();
			}
			Status::MaybeDirty => {
				let this = self.this.clone() as Weak<dyn Observer>;
				if Sources::any_changed(&self.sources, &this) {
					self.recompute();
				} else {
					// Every upstream change washed out before it reached
					// this expression's inputs.
					self.status.set(Status::Clean);
				}
			}
		}
	}

	/// Tear down the dependency set, re-evaluate the expression under
	/// this computed's own tracking scope, cache the result. Reports
	/// whether the externally visible value changed; the first
	/// evaluation counts as a change.
	fn recompute(&self) -> bool {
		tracing::trace!("recomputing");

		let this = self.this.clone() as Weak<dyn Observer>;
		self.sources.borrow_mut().clear(&this);

		let value = context::scope(this, || (self.func)());
		self.status.set(Status::Clean);

		let mut cache = self.value.borrow_mut();
		let changed = cache.as_ref() != Some(&value);
		*cache = Some(value);
		changed
	}

	fn query_changed(&self, asking: &Weak<dyn Observer>) -> bool {
		let changed = match self.status.get() {
			Status::Clean => return false,
			Status::SourcesChanged => self.recompute(),
			Status::MaybeDirty => {
				let this = self.this.clone() as Weak<dyn Observer>;
				if Sources::any_changed(&self.sources, &this) {
					self.recompute()
				} else {
					self.status.set(Status::Clean);
					return false;
				}
			}
		};

		if changed {
			// The asker already knows; everyone else gets the verified
			// change so they can skip their own verification.
			self.notify(true, Some(asking));
		}

		changed
	}

	fn notify(&self, source_changed: bool, except: Option<&Weak<dyn Observer>>) {
		let subscribers = self.subscribers.borrow_mut().snapshot();
		for subscriber in subscribers {
			if let Some(except) = except {
				if address(&subscriber) == address(except) {
					continue;
				}
			}
			if let Some(subscriber) = subscriber.upgrade() {
				subscriber.on_notify(source_changed);
			}
		}
	}
}

impl<T> Observer for ComputedBody<T>
where
	T: PartialEq + 'static,
{
	fn on_notify(&self, source_changed: bool) {
		let incoming = if source_changed {
			Status::SourcesChanged
		} else {
			Status::MaybeDirty
		};
		self.status.set(self.status.get().max(incoming));

		// Downstream must verify, never assume: forward a weaker
		// notification regardless of how authoritative the incoming
		// one was.
		self.notify(false, None);
	}

	fn add_source(&self, source: Rc<dyn Source>) {
		self.sources.borrow_mut().add(source);
	}
}

impl<T> Source for ComputedBody<T>
where
	T: PartialEq + 'static,
{
	fn subscribe(&self, observer: Weak<dyn Observer>) {
		self.subscribers.borrow_mut().add(observer);
	}

	fn unsubscribe(&self, observer: &Weak<dyn Observer>) {
		self.subscribers.borrow_mut().remove(observer);
	}

	fn query_changed(&self, asking: &Weak<dyn Observer>) -> bool {
		ComputedBody::query_changed(self, asking)
	}
}

impl<T> Access<T> for ComputedBody<T>
where
	T: PartialEq + 'static,
{
	fn get(&self) -> Ref<'_, T> {
		ComputedBody::get(self)
	}

	fn get_once(&self) -> Ref<'_, T> {
		ComputedBody::get_once(self)
	}
}

impl<T> From<Computed<T>> for Value<T>
where
	T: PartialEq + 'static,
{
	fn from(computed: Computed<T>) -> Self {
		Value::new(computed.body)
	}
}
