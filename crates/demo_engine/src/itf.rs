//! `NGS_String_v1`: the caller-side contract.

use std::fmt;

use ngs_itf::{DispatchError, ErrBlock, InterfaceToken};
use ngs_refcount::{Handle, Interface, NGS_REFCOUNT_V1, ObjectHeader, RawHandle};

pub static NGS_STRING_V1: InterfaceToken = InterfaceToken::derived("NGS_String_v1", &NGS_REFCOUNT_V1);

pub type DataFn = unsafe extern "C" fn(this: *const ObjectHeader, err: *mut ErrBlock) -> *const u8;
pub type SizeFn = unsafe extern "C" fn(this: *const ObjectHeader, err: *mut ErrBlock) -> usize;
pub type SubstrFn = unsafe extern "C" fn(
	this: *const ObjectHeader,
	err: *mut ErrBlock,
	offset: usize,
	size: usize,
) -> *mut ObjectHeader;

/// Function table of `NGS_String_v1`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct StringFns {
	pub data: DataFn,
	pub size: SizeFn,

	/// 1.1
	pub substr: Option<SubstrFn>,
}

/// Marker for `NGS_String_v1`.
#[derive(Debug)]
pub enum StringItf {}

impl Interface for StringItf {
	type Fns = StringFns;

	fn token() -> &'static InterfaceToken {
		&NGS_STRING_V1
	}
}

/// Owning reference to any object implementing `NGS_String_v1`.
#[derive(Debug)]
pub struct NgsString {
	handle: Handle<StringItf>,
}

impl NgsString {
	pub fn new(handle: Handle<StringItf>) -> Self {
		Self { handle }
	}

	pub fn handle(&self) -> &Handle<StringItf> {
		&self.handle
	}

	pub fn into_handle(self) -> Handle<StringItf> {
		self.handle
	}

	/// Byte length of the text.
	pub fn size(&self) -> Result<usize, DispatchError> {
		self.handle.call(|fns, this, err| {
			// SAFETY: `fns` is this object's `NGS_String_v1` table and the
			// handle keeps `this` alive for the call.
			unsafe { (fns.size)(this, err) }
		})
	}

	/// Borrows the text; valid for as long as this reference is held.
	pub fn data(&self) -> Result<&str, DispatchError> {
		let size = self.size()?;
		let ptr = self.handle.call(|fns, this, err| {
			// SAFETY: as in `size`.
			unsafe { (fns.data)(this, err) }
		})?;
		if size == 0 {
			return Ok("");
		}
		if ptr.is_null() {
			return Err(DispatchError::internal("NGS_String_v1 data returned NULL"));
		}
		// SAFETY: the engine keeps `size` bytes at `ptr` alive with the object.
		let bytes = unsafe { std::slice::from_raw_parts(ptr, size) };
		std::str::from_utf8(bytes).map_err(|e| DispatchError::internal(format!("engine string is not UTF-8: {e}")))
	}

	/// A new string holding `size` bytes starting at `offset`. Requires 1.1.
	pub fn substr(&self, offset: usize, size: usize) -> Result<Self, DispatchError> {
		self.handle.require_minor(1)?;
		let Some(substr) = self.handle.fns().substr else {
			return Err(DispatchError::internal(format!(
				"{}: NGS_String_v1 1.1 table has no substr",
				self.handle.class_name()
			)));
		};
		let ptr = self.handle.call(|_, this, err| {
			// SAFETY: `substr` came from the same table, whose minor version
			// was checked above; the handle keeps `this` alive.
			unsafe { substr(this, err, offset, size) }
		})?;
		let raw = RawHandle::from_ptr(ptr).ok_or_else(|| DispatchError::internal("substr returned NULL"))?;
		// SAFETY: the engine hands us the only reference to a new object.
		unsafe { Handle::from_raw(raw) }.map(Self::new)
	}

	/// Takes another reference to the same string.
	pub fn duplicate(&self) -> Result<Self, DispatchError> {
		self.handle.duplicate().map(Self::new)
	}
}

impl fmt::Display for NgsString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.data() {
			Ok(text) => f.write_str(text),
			Err(err) => write!(f, "<{err}>"),
		}
	}
}
