use std::fmt;
use std::mem::ManuallyDrop;

use ngs_itf::{DispatchError, DispatchTable, ErrBlock};

use crate::header::{ObjectHeader, RawHandle};
use crate::itf::{Access, Interface, access};
use crate::protocol::{duplicate, release};

/// Owning handle viewed through interface `I`.
///
/// Holds exactly one reference; dropping the handle releases it. The cast to
/// `I` happens once, when the handle is formed.
pub struct Handle<I: Interface> {
	raw: RawHandle,
	access: Access<I>,
}

// SAFETY: `RawHandle` is Send + Sync and `Access` holds only `'static`
// shared references to thread-safe descriptors.
unsafe impl<I: Interface> Send for Handle<I> {}
// SAFETY: see above.
unsafe impl<I: Interface> Sync for Handle<I> {}

impl<I: Interface> Handle<I> {
	/// Adopts one reference to `raw`.
	///
	/// If `raw` does not implement `I` the reference is released and the cast
	/// error returned.
	///
	/// # Safety
	/// `raw` must refer to a live object and the caller must own the
	/// reference being transferred.
	pub unsafe fn from_raw(raw: RawHandle) -> Result<Self, DispatchError> {
		// SAFETY: caller guarantees liveness.
		match access::<I>(unsafe { raw.vt() }) {
			Ok(access) => Ok(Self { raw, access }),
			Err(err) => {
				// SAFETY: the caller's reference is ours to give up.
				unsafe { release(Some(raw)) };
				Err(err)
			}
		}
	}

	/// Gives up ownership without releasing.
	pub fn into_raw(self) -> RawHandle {
		ManuallyDrop::new(self).raw
	}

	/// Borrowed raw pointer; no reference is transferred.
	#[inline]
	pub fn raw(&self) -> RawHandle {
		self.raw
	}

	/// Leaf descriptor of the object.
	pub fn vt(&self) -> &'static DispatchTable {
		// SAFETY: we hold a reference.
		unsafe { self.raw.vt() }
	}

	/// Concrete type name of the object.
	pub fn class_name(&self) -> &'static str {
		self.vt().class_name()
	}

	/// Descriptor at `I`'s level.
	#[inline]
	pub fn table(&self) -> &'static DispatchTable {
		self.access.table
	}

	/// `I`'s function table.
	#[inline]
	pub fn fns(&self) -> &'static I::Fns {
		self.access.fns
	}

	/// See [`Access::require_minor`].
	pub fn require_minor(&self, required: u32) -> Result<(), DispatchError> {
		self.access.require_minor(required)
	}

	/// Invokes one function-table entry with a fresh error block.
	///
	/// `f` receives the function table, the object pointer and the block;
	/// anything it records there becomes the returned error.
	pub fn call<R>(
		&self,
		f: impl FnOnce(&'static I::Fns, *const ObjectHeader, &mut ErrBlock) -> R,
	) -> Result<R, DispatchError> {
		let mut err = ErrBlock::new();
		let out = f(self.access.fns, self.raw.as_ptr().cast_const(), &mut err);
		err.check()?;
		Ok(out)
	}

	/// Takes a second reference to the same object.
	pub fn duplicate(&self) -> Result<Self, DispatchError> {
		// SAFETY: we hold a reference.
		let raw = unsafe { duplicate(Some(self.raw)) }?;
		Ok(Self {
			raw,
			access: self.access,
		})
	}

	/// Views the same object through interface `J`, taking a new reference.
	///
	/// The cast runs first; an unsupported interface leaves the reference
	/// count untouched.
	pub fn cast<J: Interface>(&self) -> Result<Handle<J>, DispatchError> {
		let access = access::<J>(self.vt())?;
		// SAFETY: we hold a reference.
		let raw = unsafe { duplicate(Some(self.raw)) }?;
		Ok(Handle { raw, access })
	}
}

impl<I: Interface> Drop for Handle<I> {
	fn drop(&mut self) {
		// SAFETY: the handle owns exactly one reference.
		unsafe { release(Some(self.raw)) };
	}
}

impl<I: Interface> fmt::Debug for Handle<I> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Handle")
			.field("class", &self.class_name())
			.field("itf", &self.access.table.itf_name())
			.field("ptr", &self.raw.as_ptr())
			.finish()
	}
}
