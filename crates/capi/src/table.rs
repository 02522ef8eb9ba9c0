//! Read-only accessors for descriptors returned by [`ngs_cast`](crate::ngs_cast).

use std::ffi::c_void;

use ngs_itf::DispatchTable;

use crate::strings::NgsStr;

#[unsafe(no_mangle)]
/// Address of the function table; its layout is fixed by the interface.
///
/// # Safety
/// `table` must be null or come from [`ngs_cast`](crate::ngs_cast).
pub unsafe extern "C" fn ngs_table_functions(table: *const DispatchTable) -> *const c_void {
	// SAFETY: caller contract.
	unsafe { table.as_ref() }.map_or(std::ptr::null(), |t| t.raw_functions().cast())
}

#[unsafe(no_mangle)]
/// Minor revision of the function table.
///
/// # Safety
/// As for [`ngs_table_functions`].
pub unsafe extern "C" fn ngs_table_minor_version(table: *const DispatchTable) -> u32 {
	// SAFETY: caller contract.
	unsafe { table.as_ref() }.map_or(0, DispatchTable::minor_version)
}

#[unsafe(no_mangle)]
/// Interface implemented at this level.
///
/// # Safety
/// As for [`ngs_table_functions`].
pub unsafe extern "C" fn ngs_table_itf_name(table: *const DispatchTable) -> NgsStr {
	// SAFETY: caller contract.
	unsafe { table.as_ref() }.map_or(NgsStr::EMPTY, |t| t.itf_name().into())
}
