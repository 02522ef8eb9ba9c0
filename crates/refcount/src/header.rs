use std::ptr::NonNull;

use ngs_itf::DispatchTable;

/// Fixed-layout prefix of every object crossing the binding boundary.
///
/// The first machine word of an object is the address of its leaf
/// [`DispatchTable`].
#[repr(C)]
#[derive(Debug)]
pub struct ObjectHeader {
	vt: &'static DispatchTable,
}

impl ObjectHeader {
	/// Creates a header pointing at `vt`.
	pub const fn new(vt: &'static DispatchTable) -> Self {
		Self { vt }
	}

	/// Returns the leaf descriptor.
	#[inline]
	pub fn vt(&self) -> &'static DispatchTable {
		self.vt
	}
}

/// Non-owning, non-null object pointer.
///
/// A raw handle carries no reference of its own; ownership is tracked by the
/// caller through [`duplicate`](crate::duplicate) and
/// [`release`](crate::release). Use [`Handle`](crate::Handle) for an owning
/// wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct RawHandle(NonNull<ObjectHeader>);

// SAFETY: objects behind handles are required to be thread-safe; reference
// counts are atomic and descriptors are immutable apart from `OnceLock`s.
unsafe impl Send for RawHandle {}
// SAFETY: see above.
unsafe impl Sync for RawHandle {}

impl RawHandle {
	/// Wraps a pointer received from across the boundary; null yields `None`.
	#[inline]
	pub fn from_ptr(ptr: *mut ObjectHeader) -> Option<Self> {
		NonNull::new(ptr).map(Self)
	}

	#[inline]
	pub(crate) fn from_non_null(ptr: NonNull<ObjectHeader>) -> Self {
		Self(ptr)
	}

	/// Returns the pointer handed to function-table entries.
	#[inline]
	pub fn as_ptr(self) -> *mut ObjectHeader {
		self.0.as_ptr()
	}

	/// Reads the object's leaf descriptor.
	///
	/// # Safety
	/// The handle must refer to a live object.
	#[inline]
	pub unsafe fn vt(self) -> &'static DispatchTable {
		// SAFETY: caller guarantees the object is live; the header is its
		// first field.
		unsafe { self.0.as_ref().vt }
	}
}
