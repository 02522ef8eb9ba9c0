//! Reference-counted handle protocol over `ngs-itf`.
//!
//! Every boundary object starts with an [`ObjectHeader`] and implements the
//! root interface `NGS_Refcount_v1`. Callers hold [`Handle`]s, which own one
//! reference each; engines implement [`Refcounted`] and let [`RcObject`]
//! supply the refcount function table.

pub mod adapter;
pub mod handle;
pub mod header;
pub mod itf;
pub mod protocol;

pub use adapter::{RcObject, Refcounted, catch_panic, complete, trampoline};
pub use handle::Handle;
pub use header::{ObjectHeader, RawHandle};
pub use itf::{
	Access, DuplicateFn, Interface, NGS_REFCOUNT_V1, Refcount, RefcountFns, ReleaseFn, access,
};
pub use protocol::{duplicate, release};
