//! Implementer side: two string classes behind `NGS_String_v1`.

use ngs_itf::{DispatchError, DispatchTable, ErrBlock, InterfaceRegistry, RegistryError};
use ngs_refcount::{NGS_REFCOUNT_V1, ObjectHeader, RcObject, RefcountFns, Refcounted, trampoline};

use crate::itf::{NGS_STRING_V1, NgsString, StringFns, StringItf};

/// Text storage shared by the generic string thunks.
trait Text: Refcounted {
	fn text(&self) -> &str;
}

unsafe extern "C" fn string_data<T: Text>(this: *const ObjectHeader, err: *mut ErrBlock) -> *const u8 {
	// SAFETY: installed only in tables built for `T`.
	unsafe { trampoline::<T, _>(this, err, std::ptr::null(), |s| Ok(s.text().as_ptr())) }
}

unsafe extern "C" fn string_size<T: Text>(this: *const ObjectHeader, err: *mut ErrBlock) -> usize {
	// SAFETY: as above.
	unsafe { trampoline::<T, _>(this, err, 0, |s| Ok(s.text().len())) }
}

unsafe extern "C" fn engine_substr(
	this: *const ObjectHeader,
	err: *mut ErrBlock,
	offset: usize,
	size: usize,
) -> *mut ObjectHeader {
	// SAFETY: installed only in ENGINE_STRING_VT.
	unsafe {
		trampoline::<EngineString, _>(this, err, std::ptr::null_mut(), |s| {
			let sub = offset
				.checked_add(size)
				.and_then(|end| s.text.get(offset..end))
				.ok_or_else(|| {
					DispatchError::msg(format!(
						"substring {offset}+{size} out of range for length {}",
						s.text.len()
					))
				})?;
			Ok(RcObject::new_raw(EngineString::from(sub)).as_ptr())
		})
	}
}

impl StringFns {
	const fn v1_0<T: Text>() -> Self {
		Self {
			data: string_data::<T>,
			size: string_size::<T>,
			substr: None,
		}
	}
}

/// Current string class, revision 1.1.
#[derive(Debug)]
pub struct EngineString {
	text: Box<str>,
}

impl EngineString {
	/// Wraps `text` in a new object holding one reference.
	pub fn make(text: impl Into<Box<str>>) -> Result<NgsString, DispatchError> {
		RcObject::new_handle::<StringItf>(Self { text: text.into() }).map(NgsString::new)
	}
}

impl From<&str> for EngineString {
	fn from(text: &str) -> Self {
		Self { text: text.into() }
	}
}

impl Text for EngineString {
	fn text(&self) -> &str {
		&self.text
	}
}

static ENGINE_REFCOUNT_FNS: RefcountFns = RefcountFns::of::<EngineString>();
static ENGINE_STRING_FNS: StringFns = StringFns {
	substr: Some(engine_substr),
	..StringFns::v1_0::<EngineString>()
};
static ENGINE_REFCOUNT_VT: DispatchTable =
	DispatchTable::new("EngineString", &NGS_REFCOUNT_V1, 0, None, &ENGINE_REFCOUNT_FNS);
static ENGINE_STRING_VT: DispatchTable = DispatchTable::new(
	"EngineString",
	&NGS_STRING_V1,
	1,
	Some(&ENGINE_REFCOUNT_VT),
	&ENGINE_STRING_FNS,
);

// SAFETY: the refcount level carries RefcountFns::of::<EngineString>.
unsafe impl Refcounted for EngineString {
	fn dispatch_table() -> &'static DispatchTable {
		&ENGINE_STRING_VT
	}
}

/// String class that predates `substr`, revision 1.0.
#[derive(Debug)]
pub struct LegacyString {
	text: String,
}

impl LegacyString {
	pub fn make(text: impl Into<String>) -> Result<NgsString, DispatchError> {
		RcObject::new_handle::<StringItf>(Self { text: text.into() }).map(NgsString::new)
	}
}

impl Text for LegacyString {
	fn text(&self) -> &str {
		&self.text
	}
}

static LEGACY_REFCOUNT_FNS: RefcountFns = RefcountFns::of::<LegacyString>();
static LEGACY_STRING_FNS: StringFns = StringFns::v1_0::<LegacyString>();
static LEGACY_REFCOUNT_VT: DispatchTable =
	DispatchTable::new("LegacyString", &NGS_REFCOUNT_V1, 0, None, &LEGACY_REFCOUNT_FNS);
static LEGACY_STRING_VT: DispatchTable = DispatchTable::new(
	"LegacyString",
	&NGS_STRING_V1,
	0,
	Some(&LEGACY_REFCOUNT_VT),
	&LEGACY_STRING_FNS,
);

// SAFETY: the refcount level carries RefcountFns::of::<LegacyString>.
unsafe impl Refcounted for LegacyString {
	fn dispatch_table() -> &'static DispatchTable {
		&LEGACY_STRING_VT
	}

	fn whack(&mut self) -> Result<(), DispatchError> {
		tracing::trace!(len = self.text.len(), "legacy string whacked");
		Ok(())
	}
}

/// Declares `NGS_String_v1` and both string classes in `registry`.
pub fn register(registry: &InterfaceRegistry) -> Result<(), RegistryError> {
	registry.register_interface(&NGS_STRING_V1)?;
	registry.register_table(&ENGINE_STRING_VT)?;
	registry.register_table(&LEGACY_STRING_VT)?;
	Ok(())
}

/// Leaf descriptors of the string classes.
pub fn tables() -> [&'static DispatchTable; 2] {
	[&ENGINE_STRING_VT, &LEGACY_STRING_VT]
}
