//! Internal infrastructure modules.

mod dispose_bag;
mod slot;

pub(crate) use dispose_bag::DisposeBag;
pub(crate) use slot::{AnyArc, SlotHandle};
pub use slot::ServiceRef;
