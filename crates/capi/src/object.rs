use ngs_itf::{DispatchError, ErrBlock};
use ngs_refcount::{ObjectHeader, RawHandle, duplicate, release};

use crate::entry;
use crate::status::NgsStatus;
use crate::strings::{NgsOwnedStr, NgsStr};

#[unsafe(no_mangle)]
/// Gives up one reference. Null is ignored; failures are logged, never
/// reported.
///
/// # Safety
/// `handle` must be null or a live object the caller holds a reference on.
pub unsafe extern "C" fn ngs_refcount_release(handle: *mut ObjectHeader) {
	// SAFETY: caller contract.
	unsafe { release(RawHandle::from_ptr(handle)) };
}

#[unsafe(no_mangle)]
/// Takes another reference and writes the resulting handle to `out`.
///
/// # Safety
/// `handle` must be null or live; `out` writable; `err` null or writable.
pub unsafe extern "C" fn ngs_refcount_duplicate(
	handle: *mut ObjectHeader,
	out: *mut *mut ObjectHeader,
	err: *mut ErrBlock,
) -> NgsStatus {
	// SAFETY: caller contract.
	unsafe { entry(out, err, || duplicate(RawHandle::from_ptr(handle)).map(RawHandle::as_ptr)) }
}

#[unsafe(no_mangle)]
/// Concrete type name of `handle`; empty for null.
///
/// The text is static and never freed.
///
/// # Safety
/// `handle` must be null or live.
pub unsafe extern "C" fn ngs_class_name(handle: *const ObjectHeader) -> NgsStr {
	// SAFETY: caller contract.
	match unsafe { handle.as_ref() } {
		Some(header) => header.vt().class_name().into(),
		None => NgsStr::EMPTY,
	}
}

#[unsafe(no_mangle)]
/// Describes the descriptor chain of `handle`, leaf first, e.g.
/// `EngineString: NGS_String_v1 1.1 > NGS_Refcount_v1 1.0`.
///
/// # Safety
/// `handle` must be live; `out` writable; `err` null or writable. Free the
/// result with [`ngs_owned_str_free`](crate::ngs_owned_str_free).
pub unsafe extern "C" fn ngs_describe_object(
	handle: *const ObjectHeader,
	out: *mut NgsOwnedStr,
	err: *mut ErrBlock,
) -> NgsStatus {
	// SAFETY: caller contract.
	unsafe {
		entry(out, err, || {
			let header = handle.as_ref().ok_or(DispatchError::NullObjectAccess)?;
			Ok(NgsOwnedStr::new(describe(header)))
		})
	}
}

fn describe(header: &ObjectHeader) -> String {
	let vt = header.vt();
	let levels: Vec<String> = vt
		.ancestors()
		.map(|level| format!("{} 1.{}", level.itf_name(), level.minor_version()))
		.collect();
	format!("{}: {}", vt.class_name(), levels.join(" > "))
}
