//! Caller side of `NGS_Refcount_v1`.

use ngs_itf::{DispatchError, ErrBlock};

use crate::header::RawHandle;
use crate::itf::{Refcount, access};

/// Gives up one reference to `handle`.
///
/// `None` is a no-op. Failures are logged and swallowed; this never panics
/// and never reports an error to the caller.
///
/// # Safety
/// `handle` must refer to a live object on which the caller holds a
/// reference. The reference is consumed.
pub unsafe fn release(handle: Option<RawHandle>) {
	let Some(handle) = handle else {
		return;
	};
	// SAFETY: caller holds a reference, so the object is live.
	let vt = unsafe { handle.vt() };
	let refcount = match access::<Refcount>(vt) {
		Ok(refcount) => refcount,
		Err(error) => {
			tracing::warn!(class = vt.class_name(), %error, "release: object is not refcounted");
			return;
		}
	};

	let mut err = ErrBlock::new();
	// SAFETY: the table at the refcount level belongs to this object.
	unsafe { (refcount.fns.release)(handle.as_ptr(), &mut err) };
	if let Err(error) = err.check() {
		tracing::warn!(class = vt.class_name(), %error, "release failed");
	}
}

/// Adds one reference to `handle` and returns the new handle.
///
/// # Errors
/// [`DispatchError::NullObjectAccess`] for `None`; cast failures if the
/// object does not implement `NGS_Refcount_v1`; whatever the implementation
/// reported through its error block.
///
/// # Safety
/// `handle`, if present, must refer to a live object.
pub unsafe fn duplicate(handle: Option<RawHandle>) -> Result<RawHandle, DispatchError> {
	let handle = handle.ok_or(DispatchError::NullObjectAccess)?;
	// SAFETY: caller guarantees liveness.
	let refcount = access::<Refcount>(unsafe { handle.vt() })?;

	let mut err = ErrBlock::new();
	// SAFETY: as in `release`.
	let dup = unsafe { (refcount.fns.duplicate)(handle.as_ptr(), &mut err) };
	err.check()?;
	RawHandle::from_ptr(dup)
		.ok_or_else(|| DispatchError::internal("duplicate returned NULL without reporting an error"))
}
