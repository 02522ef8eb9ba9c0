use thiserror::Error;

/// Class of a failure carried across the dispatch boundary.
///
/// The discriminants are the `xtype` codes written into an
/// [`ErrBlock`](crate::ErrBlock); `0` means "no error".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorKind {
	/// Failure reported by the engine itself.
	ErrorMsg = 1,
	/// A panic caught at a trampoline.
	Runtime = 2,
	/// The dispatch protocol itself was violated.
	Internal = 3,
}

impl ErrorKind {
	/// Decodes an `xtype` code; `0` and unknown codes yield `None`.
	pub const fn from_code(code: u32) -> Option<Self> {
		match code {
			1 => Some(Self::ErrorMsg),
			2 => Some(Self::Runtime),
			3 => Some(Self::Internal),
			_ => None,
		}
	}

	/// Returns the `xtype` code.
	#[inline]
	pub const fn code(self) -> u32 {
		self as u32
	}
}

/// Inconsistency between the static interface graph and the runtime
/// dispatch-table graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HierarchyFault {
	/// A descriptor's cached column has a different length than its chain.
	#[error("{class}: hierarchy cache has {found} levels, chain has {expected}")]
	CacheLength {
		class: &'static str,
		expected: u32,
		found: u32,
	},
	/// The descriptor at some level names another interface than the token.
	#[error("{class}: level {depth} implements {found}, expected {expected}")]
	NameMismatch {
		class: &'static str,
		depth: u32,
		expected: &'static str,
		found: &'static str,
	},
	/// Two distinct tokens share one name at the same level.
	#[error("{class}: two distinct tokens named {name} at level {depth}")]
	DuplicateToken {
		class: &'static str,
		name: &'static str,
		depth: u32,
	},
	/// The function table at a level is not the type the interface declares.
	#[error("{class}: function table for {interface} has the wrong layout")]
	TableType {
		class: &'static str,
		interface: &'static str,
	},
	/// A descriptor chain is shallower or deeper than its interface.
	#[error("{class}: chain for {interface} has {found} levels, interface has {expected}")]
	ChainDepth {
		class: &'static str,
		interface: &'static str,
		expected: u32,
		found: u32,
	},
	/// A descriptor names an interface that was never declared.
	#[error("{class}: unknown interface {interface}")]
	UnknownInterface {
		class: &'static str,
		interface: &'static str,
	},
}

/// Failures raised by the dispatch layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
	/// The object does not implement the requested interface.
	#[error("object is not of type {interface}")]
	InterfaceNotSupported { interface: &'static str },
	/// The dispatch tables do not match the interface declarations.
	#[error("corrupt interface hierarchy: {0}")]
	CorruptHierarchy(#[from] HierarchyFault),
	/// A method other than release was invoked through a null handle.
	#[error("NULL object access")]
	NullObjectAccess,
	/// Allocation failed while building dispatch state.
	#[error("allocation failure: {0}")]
	AllocationFailure(String),
	/// The engine's function table predates the requested revision.
	#[error(
		"the {interface} interface provided by this engine is too old to support this message (has 1.{provided}, needs 1.{required})"
	)]
	InterfaceTooOld {
		interface: &'static str,
		required: u32,
		provided: u32,
	},
	/// Failure reported by the callee through an error block.
	#[error("{message}")]
	Failed { kind: ErrorKind, message: String },
}

impl DispatchError {
	/// Creates an engine-reported failure.
	pub fn msg(message: impl Into<String>) -> Self {
		Self::Failed {
			kind: ErrorKind::ErrorMsg,
			message: message.into(),
		}
	}

	/// Creates a protocol-violation failure.
	pub fn internal(message: impl Into<String>) -> Self {
		Self::Failed {
			kind: ErrorKind::Internal,
			message: message.into(),
		}
	}

	/// Returns the error-block class this failure travels as.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Failed { kind, .. } => *kind,
			Self::CorruptHierarchy(_) | Self::AllocationFailure(_) => ErrorKind::Internal,
			Self::InterfaceNotSupported { .. }
			| Self::NullObjectAccess
			| Self::InterfaceTooOld { .. } => ErrorKind::ErrorMsg,
		}
	}

	/// Returns true for failures that must not be retried.
	pub fn is_fatal(&self) -> bool {
		matches!(
			self,
			Self::CorruptHierarchy(_) | Self::AllocationFailure(_)
		)
	}
}

impl From<std::collections::TryReserveError> for DispatchError {
	fn from(err: std::collections::TryReserveError) -> Self {
		Self::AllocationFailure(err.to_string())
	}
}
