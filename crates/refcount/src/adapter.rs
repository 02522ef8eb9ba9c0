//! Implementer side: turning a Rust type into a refcounted boundary object.
//!
//! An engine type implements [`Refcounted`], declares its descriptor chain as
//! statics (the refcount level carrying [`RefcountFns::of`]), and hands
//! objects out through [`RcObject::new_handle`]. Function-table entries are
//! `extern "C"` thunks built on [`trampoline`], which converts returned
//! errors and panics into [`ErrBlock`] entries.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicUsize, Ordering, fence};

use ngs_itf::{DispatchError, DispatchTable, ErrBlock, ErrorKind};

use crate::handle::Handle;
use crate::header::{ObjectHeader, RawHandle};
use crate::itf::{Interface, RefcountFns};

const MAX_REFCOUNT: usize = isize::MAX as usize;

/// A type that can live behind an [`ObjectHeader`].
///
/// # Safety
/// [`dispatch_table`](Self::dispatch_table) must return a leaf descriptor
/// whose function tables were built for `Self` (its refcount level from
/// [`RefcountFns::of::<Self>`]).
pub unsafe trait Refcounted: Send + Sync + Sized + 'static {
	/// Leaf descriptor stamped into every object of this type.
	fn dispatch_table() -> &'static DispatchTable;

	/// Teardown hook run once, when the last reference is released and before
	/// the value is dropped. An error is reported to the releasing caller,
	/// which logs it.
	fn whack(&mut self) -> Result<(), DispatchError> {
		Ok(())
	}
}

/// Heap layout of an adapted object: header first, then the count.
#[repr(C)]
pub struct RcObject<T> {
	header: ObjectHeader,
	refcount: AtomicUsize,
	value: T,
}

impl<T: Refcounted> RcObject<T> {
	/// Allocates a new object with one reference owned by the caller.
	pub fn new_raw(value: T) -> RawHandle {
		let obj = Box::new(RcObject {
			header: ObjectHeader::new(T::dispatch_table()),
			refcount: AtomicUsize::new(1),
			value,
		});
		tracing::trace!(class = T::dispatch_table().class_name(), "object created");
		RawHandle::from_non_null(NonNull::from(Box::leak(obj)).cast())
	}

	/// Allocates a new object and views it through `I`.
	pub fn new_handle<I: Interface>(value: T) -> Result<Handle<I>, DispatchError> {
		// SAFETY: freshly allocated, and the single reference is ours.
		unsafe { Handle::from_raw(Self::new_raw(value)) }
	}

	/// # Safety
	/// `this` must be non-null and point at a live `RcObject<T>`.
	unsafe fn from_header<'a>(this: *const ObjectHeader) -> &'a Self {
		// SAFETY: `header` is the first field of a `repr(C)` struct.
		unsafe { &*this.cast::<Self>() }
	}
}

impl RefcountFns {
	/// Refcount function table for adapted type `T`.
	pub const fn of<T: Refcounted>() -> Self {
		Self {
			release: release_thunk::<T>,
			duplicate: duplicate_thunk::<T>,
		}
	}
}

unsafe extern "C" fn release_thunk<T: Refcounted>(this: *const ObjectHeader, err: *mut ErrBlock) {
	if this.is_null() {
		return;
	}
	// SAFETY: non-null pointers handed to this table point at `RcObject<T>`.
	let obj = unsafe { RcObject::<T>::from_header(this) };
	if obj.refcount.fetch_sub(1, Ordering::Release) != 1 {
		return;
	}
	fence(Ordering::Acquire);

	let result = catch_panic(|| {
		// SAFETY: the count reached zero; no other reference exists and the
		// allocation came from `Box` in `new_raw`.
		let mut boxed = unsafe { Box::from_raw(this.cast_mut().cast::<RcObject<T>>()) };
		let whacked = boxed.value.whack();
		drop(boxed);
		whacked
	});
	tracing::trace!(class = T::dispatch_table().class_name(), "object destroyed");
	// SAFETY: `err` comes straight from the caller.
	unsafe { complete(err, result, ()) }
}

unsafe extern "C" fn duplicate_thunk<T: Refcounted>(
	this: *const ObjectHeader,
	err: *mut ErrBlock,
) -> *mut ObjectHeader {
	// SAFETY: forwarded caller contract.
	unsafe {
		enter::<T, _>(this, err, ptr::null_mut(), |obj| {
			let old = obj.refcount.fetch_add(1, Ordering::Relaxed);
			if old >= MAX_REFCOUNT {
				obj.refcount.fetch_sub(1, Ordering::Relaxed);
				return Err(DispatchError::internal("reference count overflow"));
			}
			Ok(this.cast_mut())
		})
	}
}

/// Runs an engine method behind an `extern "C"` entry point.
///
/// A null `this` records [`DispatchError::NullObjectAccess`]. An `Err` from
/// `f` is recorded in `err`; a panic is caught and recorded as
/// [`ErrorKind::Runtime`]. In every failure case `default` is returned.
///
/// # Safety
/// A non-null `this` must point at a live `RcObject<T>`; `err` must be null
/// or point at a writable [`ErrBlock`].
pub unsafe fn trampoline<T: Refcounted, R>(
	this: *const ObjectHeader,
	err: *mut ErrBlock,
	default: R,
	f: impl FnOnce(&T) -> Result<R, DispatchError>,
) -> R {
	// SAFETY: forwarded caller contract.
	unsafe { enter::<T, R>(this, err, default, |obj| f(&obj.value)) }
}

unsafe fn enter<T: Refcounted, R>(
	this: *const ObjectHeader,
	err: *mut ErrBlock,
	default: R,
	f: impl FnOnce(&RcObject<T>) -> Result<R, DispatchError>,
) -> R {
	let result = if this.is_null() {
		Err(DispatchError::NullObjectAccess)
	} else {
		// SAFETY: caller contract on `this`.
		let obj = unsafe { RcObject::<T>::from_header(this) };
		catch_panic(|| f(obj))
	};
	// SAFETY: caller contract on `err`.
	unsafe { complete(err, result, default) }
}

/// Runs `f`, turning a panic into [`ErrorKind::Runtime`] failure.
pub fn catch_panic<R>(f: impl FnOnce() -> Result<R, DispatchError>) -> Result<R, DispatchError> {
	panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
		let message = panic_message(payload.as_ref());
		tracing::error!(%message, "engine method panicked");
		Err(DispatchError::Failed {
			kind: ErrorKind::Runtime,
			message,
		})
	})
}

/// Writes a failure into `err` and substitutes `default`.
///
/// # Safety
/// `err` must be null or point at a writable [`ErrBlock`].
pub unsafe fn complete<R>(err: *mut ErrBlock, result: Result<R, DispatchError>, default: R) -> R {
	match result {
		Ok(value) => value,
		Err(error) => {
			// SAFETY: caller contract on `err`.
			match unsafe { err.as_mut() } {
				Some(block) => {
					block.record(&error);
				}
				None => tracing::warn!(%error, "failure with no error block"),
			}
			default
		}
	}
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(s) = payload.downcast_ref::<&str>() {
		(*s).to_owned()
	} else if let Some(s) = payload.downcast_ref::<String>() {
		s.clone()
	} else {
		"<unknown panic>".to_owned()
	}
}

impl<I: Interface> Handle<I> {
	/// Borrows the adapted value if the object's concrete type is `T`.
	pub fn downcast_ref<T: Refcounted>(&self) -> Option<&T> {
		if !ptr::eq(self.vt(), T::dispatch_table()) {
			return None;
		}
		// SAFETY: the leaf descriptor identifies the concrete layout and we
		// hold a reference.
		Some(unsafe { &RcObject::<T>::from_header(self.raw().as_ptr()).value })
	}

	/// Current reference count if the object's concrete type is `T`.
	pub fn strong_count<T: Refcounted>(&self) -> Option<usize> {
		if !ptr::eq(self.vt(), T::dispatch_table()) {
			return None;
		}
		// SAFETY: as in `downcast_ref`.
		let obj = unsafe { RcObject::<T>::from_header(self.raw().as_ptr()) };
		Some(obj.refcount.load(Ordering::Acquire))
	}
}

#[cfg(test)]
mod tests;
