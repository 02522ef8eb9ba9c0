//! The root `NGS_Refcount_v1` interface and typed interface access.

use std::any::Any;
use std::marker::PhantomData;

use ngs_itf::{DispatchError, DispatchTable, ErrBlock, HierarchyFault, InterfaceToken};

use crate::header::ObjectHeader;

/// Root of every interface family exposed across the boundary.
pub static NGS_REFCOUNT_V1: InterfaceToken = InterfaceToken::root("NGS_Refcount_v1");

/// Drops one reference; destroys the object when the count reaches zero.
pub type ReleaseFn = unsafe extern "C" fn(this: *const ObjectHeader, err: *mut ErrBlock);

/// Adds one reference and returns the (same) object pointer.
pub type DuplicateFn =
	unsafe extern "C" fn(this: *const ObjectHeader, err: *mut ErrBlock) -> *mut ObjectHeader;

/// Function table of `NGS_Refcount_v1`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RefcountFns {
	pub release: ReleaseFn,
	pub duplicate: DuplicateFn,
}

/// A caller-side view of one interface.
///
/// `Fns` is the `#[repr(C)]` function table the interface's descriptors
/// carry; [`access`] downcasts to it after casting.
pub trait Interface: 'static {
	/// Function table layout.
	type Fns: Any + Send + Sync;

	/// Token identifying the interface.
	fn token() -> &'static InterfaceToken;
}

/// Marker for the `NGS_Refcount_v1` interface.
#[derive(Debug)]
pub enum Refcount {}

impl Interface for Refcount {
	type Fns = RefcountFns;

	fn token() -> &'static InterfaceToken {
		&NGS_REFCOUNT_V1
	}
}

/// Result of casting a descriptor to interface `I`.
pub struct Access<I: Interface> {
	/// Descriptor at `I`'s level.
	pub table: &'static DispatchTable,
	/// `I`'s function table.
	pub fns: &'static I::Fns,
	_itf: PhantomData<fn() -> I>,
}

impl<I: Interface> Clone for Access<I> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<I: Interface> Copy for Access<I> {}

impl<I: Interface> std::fmt::Debug for Access<I> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Access").field("table", self.table).finish()
	}
}

impl<I: Interface> Access<I> {
	/// Fails unless the table carries revision `1.required` or later.
	#[inline]
	pub fn require_minor(&self, required: u32) -> Result<(), DispatchError> {
		self.table.require_minor(required)
	}
}

/// Casts `vt` to `I` and recovers `I`'s function table.
pub fn access<I: Interface>(vt: &'static DispatchTable) -> Result<Access<I>, DispatchError> {
	let table = vt.cast(I::token())?;
	let Some(fns) = table.functions::<I::Fns>() else {
		return Err(HierarchyFault::TableType {
			class: table.class_name(),
			interface: table.itf_name(),
		}
		.into());
	};
	Ok(Access {
		table,
		fns,
		_itf: PhantomData,
	})
}
