//! Lifecycle capability traits.
//!
//! Instances opt into lifecycle dispatch by implementing these traits and
//! attaching them to a descriptor with
//! [`ServiceDescriptor::with_initializer`](crate::ServiceDescriptor::with_initializer)
//! and [`ServiceDescriptor::with_disposer`](crate::ServiceDescriptor::with_disposer).
//! There is no runtime name probing; the capability is a trait bound checked
//! where the concrete type is still known.

use crate::error::DiResult;

/// Post-construction hook.
///
/// Invoked once, immediately after construction and before the instance is
/// returned or cached. A failing initializer aborts the resolution and
/// propagates the error; nothing is cached.
///
/// # Examples
///
/// ```rust
/// use tangle_di::{ServiceCollection, ServiceDescriptor, Initialize, Lifetime, DiResult, Resolver};
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// struct Pool {
///     warmed: AtomicBool,
/// }
///
/// impl Initialize for Pool {
///     fn initialize(&self) -> DiResult<()> {
///         self.warmed.store(true, Ordering::SeqCst);
///         Ok(())
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.register(
///     ServiceDescriptor::factory::<Pool, _>(Lifetime::Singleton, |_| {
///         Ok(Pool { warmed: AtomicBool::new(false) })
///     })
///     .with_initializer::<Pool>(),
/// );
///
/// let provider = services.build();
/// let pool = provider.get_required::<Pool>().unwrap();
/// assert!(pool.warmed.load(Ordering::SeqCst));
/// ```
pub trait Initialize: Send + Sync {
    /// Perform post-construction setup.
    fn initialize(&self) -> DiResult<()>;
}

/// Pre-teardown hook.
///
/// Invoked once per cached instance during `dispose()`, in LIFO order. A
/// panicking hook is caught and logged; the remaining instances in the same
/// disposal batch are still torn down.
pub trait Dispose: Send + Sync {
    /// Perform teardown of resources.
    fn dispose(&self);
}
