use std::ptr;

use ngs_itf::DispatchError;

/// Borrowed UTF-8 text; not NUL-terminated.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct NgsStr {
	pub ptr: *const u8,
	pub len: usize,
}

impl NgsStr {
	pub const EMPTY: Self = Self {
		ptr: ptr::null(),
		len: 0,
	};

	/// Borrows `bytes` for as long as the caller keeps them alive.
	pub fn from_bytes(bytes: &[u8]) -> Self {
		Self {
			ptr: bytes.as_ptr(),
			len: bytes.len(),
		}
	}

	/// Reads the text back.
	///
	/// A null pointer is accepted only with a zero length.
	///
	/// # Safety
	/// A non-null `ptr` must be valid for `len` bytes during `'a`.
	pub unsafe fn as_str<'a>(self) -> Result<&'a str, DispatchError> {
		if self.ptr.is_null() {
			return match self.len {
				0 => Ok(""),
				_ => Err(DispatchError::NullObjectAccess),
			};
		}
		// SAFETY: caller contract.
		let bytes = unsafe { std::slice::from_raw_parts(self.ptr, self.len) };
		std::str::from_utf8(bytes).map_err(|e| DispatchError::msg(format!("string argument is not UTF-8: {e}")))
	}
}

impl From<&'static str> for NgsStr {
	fn from(s: &'static str) -> Self {
		Self::from_bytes(s.as_bytes())
	}
}

/// Text allocated by this library; free with [`ngs_owned_str_free`].
#[repr(C)]
#[derive(Debug)]
pub struct NgsOwnedStr {
	pub ptr: *mut u8,
	pub len: usize,
}

impl NgsOwnedStr {
	pub fn new(s: String) -> Self {
		let boxed = Box::leak(s.into_boxed_str());
		Self {
			ptr: boxed.as_mut_ptr(),
			len: boxed.len(),
		}
	}

	/// Borrowed view of the same bytes.
	pub fn as_ngs_str(&self) -> NgsStr {
		NgsStr {
			ptr: self.ptr,
			len: self.len,
		}
	}
}

#[unsafe(no_mangle)]
/// # Safety
/// `s` must come from this library and must not have been freed already.
pub unsafe extern "C" fn ngs_owned_str_free(s: NgsOwnedStr) {
	if s.ptr.is_null() {
		return;
	}
	// SAFETY: `ptr`/`len` were produced by `NgsOwnedStr::new` from a `Box<str>`.
	drop(unsafe { Box::from_raw(ptr::slice_from_raw_parts_mut(s.ptr, s.len)) });
}
