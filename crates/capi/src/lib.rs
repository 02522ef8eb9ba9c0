//! C ABI surface for language bindings.
//!
//! Entry points that produce a value write it through an out-parameter and
//! return an [`NgsStatus`]; on failure the caller's [`ErrBlock`] carries the
//! message. Nothing unwinds across this boundary.

pub mod err_block;
pub mod object;
pub mod runtime;
pub mod status;
pub mod strings;
pub mod table;

use ngs_itf::{DispatchError, ErrBlock};
use ngs_refcount::{catch_panic, complete};

pub use err_block::{ngs_err_block_init, ngs_err_block_message, ngs_err_block_status};
pub use object::{ngs_class_name, ngs_describe_object, ngs_refcount_duplicate, ngs_refcount_release};
pub use runtime::{NgsRuntime, RuntimeError, ngs_cast, ngs_runtime_free, ngs_runtime_new};
pub use status::NgsStatus;
pub use strings::{NgsOwnedStr, NgsStr, ngs_owned_str_free};
pub use table::{ngs_table_functions, ngs_table_itf_name, ngs_table_minor_version};

/// Runs `f` for an out-parameter entry point.
///
/// # Safety
/// `out` must be null or writable; `err` must be null or writable.
unsafe fn entry<T>(out: *mut T, err: *mut ErrBlock, f: impl FnOnce() -> Result<T, DispatchError>) -> NgsStatus {
	let result = if out.is_null() {
		Err(DispatchError::NullObjectAccess)
	} else {
		catch_panic(f)
	};
	let status = NgsStatus::of(&result);
	// SAFETY: caller contract on `err`.
	if let Some(value) = unsafe { complete(err, result.map(Some), None) } {
		// SAFETY: `out` is non-null here and writable per caller contract.
		unsafe { out.write(value) };
	}
	status
}
