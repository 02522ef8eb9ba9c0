//! Runtime context handed to language bindings.

use ngs_itf::{
	ConfigError, DispatchConfig, DispatchError, DispatchTable, ErrBlock, InterfaceRegistry,
	RegistryBuilder, RegistryError,
};
use ngs_refcount::{NGS_REFCOUNT_V1, ObjectHeader, RawHandle};
use thiserror::Error;

use crate::entry;
use crate::status::NgsStatus;
use crate::strings::NgsStr;

/// Errors raised while creating an [`NgsRuntime`].
#[derive(Error, Debug)]
pub enum RuntimeError {
	#[error(transparent)]
	Config(#[from] ConfigError),
	#[error(transparent)]
	Registry(#[from] RegistryError),
}

impl From<RuntimeError> for DispatchError {
	fn from(err: RuntimeError) -> Self {
		match err {
			RuntimeError::Config(err) => DispatchError::msg(err.to_string()),
			RuntimeError::Registry(RegistryError::Hierarchy { fault, .. }) => fault.into(),
			RuntimeError::Registry(RegistryError::Dispatch { source, .. }) => source,
			RuntimeError::Registry(err @ RegistryError::DuplicateInterface { .. }) => {
				DispatchError::internal(err.to_string())
			}
		}
	}
}

/// Interface registry shared by every call a binding makes.
#[derive(Debug)]
pub struct NgsRuntime {
	registry: InterfaceRegistry,
}

impl NgsRuntime {
	/// Builds a runtime with `NGS_Refcount_v1` declared.
	pub fn new(config: DispatchConfig) -> Result<Self, RuntimeError> {
		let registry = RegistryBuilder::new("runtime")
			.config(config)
			.interface(&NGS_REFCOUNT_V1)
			.build()?;
		Ok(Self { registry })
	}

	/// Builds a runtime from TOML settings; empty text means defaults.
	pub fn from_toml(src: &str) -> Result<Self, RuntimeError> {
		let config = match src.trim() {
			"" => DispatchConfig::default(),
			_ => DispatchConfig::from_toml_str(src)?,
		};
		Self::new(config)
	}

	/// The registry bindings declare their interfaces and engines in.
	pub fn registry(&self) -> &InterfaceRegistry {
		&self.registry
	}

	/// Casts the object behind `handle` to the interface named `name`.
	///
	/// # Safety
	/// `handle`, if present, must refer to a live object.
	pub unsafe fn cast(&self, handle: Option<RawHandle>, name: &str) -> Result<&'static DispatchTable, DispatchError> {
		// SAFETY: caller contract.
		let vt = handle.map(|h| unsafe { h.vt() });
		self.registry.cast_by_name(vt, name)
	}
}

#[unsafe(no_mangle)]
/// # Safety
/// `config_toml` must be valid per [`NgsStr::as_str`]; `out` must be writable;
/// `err` must be null or writable.
pub unsafe extern "C" fn ngs_runtime_new(
	config_toml: NgsStr,
	out: *mut *mut NgsRuntime,
	err: *mut ErrBlock,
) -> NgsStatus {
	// SAFETY: caller contract.
	unsafe {
		entry(out, err, || {
			let src = config_toml.as_str()?;
			let runtime = NgsRuntime::from_toml(src)?;
			tracing::debug!("runtime created");
			Ok(Box::into_raw(Box::new(runtime)))
		})
	}
}

#[unsafe(no_mangle)]
/// # Safety
/// `runtime` must be null or come from [`ngs_runtime_new`], freed once.
pub unsafe extern "C" fn ngs_runtime_free(runtime: *mut NgsRuntime) {
	if runtime.is_null() {
		return;
	}
	// SAFETY: caller contract.
	drop(unsafe { Box::from_raw(runtime) });
}

#[unsafe(no_mangle)]
/// Writes the descriptor implementing `name` for `handle`, or fails with
/// `NotSupported` when the object does not implement it.
///
/// # Safety
/// `runtime` must be live; `handle` null or live; `name` valid; `out`
/// writable; `err` null or writable.
pub unsafe extern "C" fn ngs_cast(
	runtime: *const NgsRuntime,
	handle: *mut ObjectHeader,
	name: NgsStr,
	out: *mut *const DispatchTable,
	err: *mut ErrBlock,
) -> NgsStatus {
	// SAFETY: caller contract.
	unsafe {
		entry(out, err, || {
			let runtime = runtime.as_ref().ok_or(DispatchError::NullObjectAccess)?;
			let name = name.as_str()?;
			let table = runtime.cast(RawHandle::from_ptr(handle), name)?;
			Ok(std::ptr::from_ref(table))
		})
	}
}
