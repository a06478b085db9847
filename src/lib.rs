pub mod macros;

mod computed;
mod context;
mod effect;
mod signal;
mod sources;
mod subscribers;
mod value;
mod watch;

use std::rc::{Rc, Weak};

pub use computed::Computed;
pub use context::scope;
pub use effect::Effect;
pub use signal::{Signal, Toggle};
pub use value::{Access, Value};
pub use watch::Watch;

/// Something that receives change notifications and accumulates the
/// sources it reads while it evaluates. Implemented by computed values,
/// effects and watches.
pub trait Observer: 'static {
	/// A tracked source reports a change. `source_changed` is authoritative:
	/// `true` means the source's value really did change, `false` means a
	/// dependency somewhere upstream changed and this observer has to
	/// verify through [`Source::query_changed`] before reacting.
	fn on_notify(&self, source_changed: bool);

	/// Record `source` into the dependency set of the evaluation
	/// currently in progress.
	fn add_source(&self, source: Rc<dyn Source>);
}

/// A readable, subscribable value holder. Implemented by signals and
/// computed values.
pub trait Source: 'static {
	/// Add `observer` to the subscriber registry. Idempotent.
	fn subscribe(&self, observer: Weak<dyn Observer>);

	/// Remove `observer` from the subscriber registry. Removing an
	/// observer that was never subscribed is a no-op.
	fn unsubscribe(&self, observer: &Weak<dyn Observer>);

	/// Verify whether this source's value actually changed since the
	/// asking observer last saw it, recomputing if that is the only way
	/// to find out. A signal always answers `true`.
	fn query_changed(&self, asking: &Weak<dyn Observer>) -> bool;
}
