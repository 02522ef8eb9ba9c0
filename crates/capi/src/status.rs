use ngs_itf::DispatchError;

/// Outcome of an out-parameter entry point.
///
/// Anything other than `Ok` is accompanied by a message in the caller's
/// error block.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NgsStatus {
	Ok = 0,
	NotSupported = 1,
	CorruptHierarchy = 2,
	NullObject = 3,
	AllocationFailure = 4,
	TooOld = 5,
	Failed = 6,
}

impl From<&DispatchError> for NgsStatus {
	fn from(err: &DispatchError) -> Self {
		match err {
			DispatchError::InterfaceNotSupported { .. } => Self::NotSupported,
			DispatchError::CorruptHierarchy(_) => Self::CorruptHierarchy,
			DispatchError::NullObjectAccess => Self::NullObject,
			DispatchError::AllocationFailure(_) => Self::AllocationFailure,
			DispatchError::InterfaceTooOld { .. } => Self::TooOld,
			DispatchError::Failed { .. } => Self::Failed,
		}
	}
}

impl NgsStatus {
	pub fn of<T>(result: &Result<T, DispatchError>) -> Self {
		match result {
			Ok(_) => Self::Ok,
			Err(err) => err.into(),
		}
	}
}
