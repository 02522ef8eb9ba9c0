//! Out-parameter carrying failure information across the dispatch boundary.

use std::borrow::Cow;
use std::fmt;

use crate::error::{DispatchError, ErrorKind};

/// Capacity of the message buffer, including the terminating NUL.
pub const ERR_MSG_CAPACITY: usize = 4096;

/// Stack-allocated error block passed to every function-table entry.
///
/// The layout is fixed so foreign callers can allocate one themselves. A
/// block is written at most once per call; the first failure wins.
#[repr(C)]
pub struct ErrBlock {
	msg: [u8; ERR_MSG_CAPACITY],
	xtype: u32,
}

impl ErrBlock {
	/// Creates an empty block.
	pub const fn new() -> Self {
		Self {
			msg: [0; ERR_MSG_CAPACITY],
			xtype: 0,
		}
	}

	/// Records a failure. Returns false if the block already held one.
	pub fn throw(&mut self, kind: ErrorKind, message: &str) -> bool {
		if self.is_set() {
			tracing::debug!(
				kind = ?kind,
				dropped = message,
				"error block already set; keeping first failure"
			);
			return false;
		}

		let mut end = message.len().min(ERR_MSG_CAPACITY - 1);
		while !message.is_char_boundary(end) {
			end -= 1;
		}
		self.msg[..end].copy_from_slice(&message.as_bytes()[..end]);
		self.msg[end] = 0;
		self.xtype = kind.code();
		true
	}

	/// Records a typed failure.
	pub fn record(&mut self, err: &DispatchError) -> bool {
		self.throw(err.kind(), &err.to_string())
	}

	/// Returns true once a failure was recorded.
	#[inline]
	pub fn is_set(&self) -> bool {
		self.xtype != 0
	}

	/// Returns the raw `xtype` code.
	#[inline]
	pub fn code(&self) -> u32 {
		self.xtype
	}

	/// Returns the failure class, if any.
	///
	/// Codes this crate does not know are reported as [`ErrorKind::ErrorMsg`].
	pub fn kind(&self) -> Option<ErrorKind> {
		if !self.is_set() {
			return None;
		}
		Some(ErrorKind::from_code(self.xtype).unwrap_or(ErrorKind::ErrorMsg))
	}

	/// Returns the recorded message (empty when unset).
	pub fn message(&self) -> Cow<'_, str> {
		String::from_utf8_lossy(self.message_bytes())
	}

	/// Raw message bytes up to the terminator.
	pub fn message_bytes(&self) -> &[u8] {
		let len = self
			.msg
			.iter()
			.position(|&b| b == 0)
			.unwrap_or(ERR_MSG_CAPACITY);
		&self.msg[..len]
	}

	/// Resets the block for reuse.
	pub fn clear(&mut self) {
		self.msg[0] = 0;
		self.xtype = 0;
	}

	/// Converts the block into a typed result at the call site.
	pub fn check(&self) -> Result<(), DispatchError> {
		match self.kind() {
			None => Ok(()),
			Some(kind) => Err(DispatchError::Failed {
				kind,
				message: self.message().into_owned(),
			}),
		}
	}
}

impl Default for ErrBlock {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for ErrBlock {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ErrBlock")
			.field("kind", &self.kind())
			.field("message", &self.message())
			.finish()
	}
}
