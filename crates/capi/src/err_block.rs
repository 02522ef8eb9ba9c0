use ngs_itf::ErrBlock;

use crate::strings::NgsStr;

#[unsafe(no_mangle)]
/// Resets a caller-allocated block.
///
/// # Safety
/// `err` must be null or point at writable storage for an [`ErrBlock`].
pub unsafe extern "C" fn ngs_err_block_init(err: *mut ErrBlock) {
	if !err.is_null() {
		// SAFETY: caller contract; the storage may be uninitialized.
		unsafe { err.write(ErrBlock::new()) };
	}
}

#[unsafe(no_mangle)]
/// Error class code, `0` when nothing was recorded.
///
/// # Safety
/// `err` must be null or point at an initialized block.
pub unsafe extern "C" fn ngs_err_block_status(err: *const ErrBlock) -> u32 {
	// SAFETY: caller contract.
	unsafe { err.as_ref() }.map_or(0, ErrBlock::code)
}

#[unsafe(no_mangle)]
/// Recorded message, borrowed from the block.
///
/// # Safety
/// `err` must be null or point at an initialized block that outlives every
/// use of the returned text.
pub unsafe extern "C" fn ngs_err_block_message(err: *const ErrBlock) -> NgsStr {
	// SAFETY: caller contract.
	match unsafe { err.as_ref() } {
		Some(block) => NgsStr::from_bytes(block.message_bytes()),
		None => NgsStr::EMPTY,
	}
}
