//! Public traits for resolution and lifecycle dispatch.

mod lifecycle;
mod resolver;

pub use lifecycle::{Dispose, Initialize};
pub use resolver::{Resolver, ResolverCore};
