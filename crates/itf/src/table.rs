//! Per-type dispatch table descriptors.

use std::any::Any;
use std::fmt;
use std::sync::OnceLock;

use crate::cache::HierarchyCache;
use crate::error::DispatchError;
use crate::token::InterfaceToken;

/// Descriptor for one concrete type at one interface level.
///
/// A concrete type implementing `NGS_String_v1` owns two descriptors: one at
/// the `NGS_String_v1` level (its leaf) whose `parent` is the descriptor at
/// the `NGS_Refcount_v1` level. Every object of the type points at the leaf.
///
/// Descriptors are normally `static` items. The function table is opaque here
/// and recovered by typed callers through [`functions`](Self::functions).
/// Each level records the token it implements, so a leaf descriptor knows
/// every interface its type implements.
pub struct DispatchTable {
	class_name: &'static str,
	itf: &'static InterfaceToken,
	minor_version: u32,
	parent: Option<&'static DispatchTable>,
	functions: &'static (dyn Any + Send + Sync),
	cache: OnceLock<HierarchyCache>,
}

impl DispatchTable {
	/// Declares a descriptor.
	///
	/// `minor_version` counts the trailing revisions present in `functions`
	/// (0 for a 1.0 table, 1 when the 1.1 tail is present, ...).
	pub const fn new(
		class_name: &'static str,
		itf: &'static InterfaceToken,
		minor_version: u32,
		parent: Option<&'static DispatchTable>,
		functions: &'static (dyn Any + Send + Sync),
	) -> Self {
		Self {
			class_name,
			itf,
			minor_version,
			parent,
			functions,
			cache: OnceLock::new(),
		}
	}

	/// Moves a descriptor built at runtime into static storage.
	///
	/// Descriptors are shared by every object of their type and are never
	/// freed.
	pub fn leak(self) -> &'static Self {
		Box::leak(Box::new(self))
	}

	/// Returns the concrete type name.
	#[inline]
	pub fn class_name(&self) -> &'static str {
		self.class_name
	}

	/// Returns the interface implemented at this level.
	#[inline]
	pub fn itf(&self) -> &'static InterfaceToken {
		self.itf
	}

	/// Returns the name of the interface implemented at this level.
	#[inline]
	pub fn itf_name(&self) -> &'static str {
		self.itf.name()
	}

	/// Returns the number of trailing revisions present in the table.
	#[inline]
	pub fn minor_version(&self) -> u32 {
		self.minor_version
	}

	/// Returns the descriptor one interface level up.
	#[inline]
	pub fn parent(&self) -> Option<&'static DispatchTable> {
		self.parent
	}

	/// Iterates from this descriptor up to the root level.
	pub fn ancestors(&'static self) -> TableAncestors {
		TableAncestors { next: Some(self) }
	}

	/// Number of interface levels this type implements.
	pub fn chain_depth(&self) -> u32 {
		let mut depth = 1;
		let mut cur = self.parent;
		while let Some(table) = cur {
			depth += 1;
			cur = table.parent;
		}
		depth
	}

	/// Downcasts the function table.
	pub fn functions<F: Any>(&self) -> Option<&'static F> {
		let functions: &'static (dyn Any + Send + Sync) = self.functions;
		functions.downcast_ref::<F>()
	}

	/// Address of the function table, for foreign callers that know its layout.
	pub fn raw_functions(&self) -> *const () {
		self.functions as *const (dyn Any + Send + Sync) as *const ()
	}

	/// Fails with [`DispatchError::InterfaceTooOld`] unless the table carries
	/// revision `1.required` or later.
	pub fn require_minor(&self, required: u32) -> Result<(), DispatchError> {
		if self.minor_version < required {
			return Err(DispatchError::InterfaceTooOld {
				interface: self.itf.name(),
				required,
				provided: self.minor_version,
			});
		}
		Ok(())
	}

	/// Returns the hierarchy cache once it has been built.
	#[inline]
	pub fn cache(&self) -> Option<&HierarchyCache> {
		self.cache.get()
	}

	/// Returns the ancestor implementing `itf`, resolving on first use.
	pub fn cast(
		&'static self,
		itf: &'static InterfaceToken,
	) -> Result<&'static DispatchTable, DispatchError> {
		crate::cast::cast(Some(self), itf)
	}

	/// Returns true if this type implements `itf`.
	pub fn implements(&'static self, itf: &'static InterfaceToken) -> bool {
		self.cast(itf).is_ok()
	}

	/// Returns the cache, building and publishing it first if needed.
	///
	/// The column is built completely before it is published; a racing
	/// builder's copy is discarded.
	pub(crate) fn cache_or_build(&'static self, depth: u32) -> Result<&HierarchyCache, DispatchError> {
		if let Some(cache) = self.cache.get() {
			return Ok(cache);
		}

		let built = HierarchyCache::build(self, depth)?;
		if self.cache.set(built).is_ok() {
			tracing::debug!(
				class = self.class_name,
				itf = self.itf.name(),
				depth,
				"published hierarchy cache"
			);
		}
		self.cache
			.get()
			.ok_or_else(|| DispatchError::internal("hierarchy cache vanished after publication"))
	}
}

impl PartialEq for DispatchTable {
	fn eq(&self, other: &Self) -> bool {
		std::ptr::eq(self, other)
	}
}

impl Eq for DispatchTable {}

impl fmt::Debug for DispatchTable {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DispatchTable")
			.field("class", &self.class_name)
			.field("itf", &self.itf.name())
			.field("minor", &self.minor_version)
			.field("parent", &self.parent.map(|p| p.itf.name()))
			.field("cached", &self.cache.get().is_some())
			.finish()
	}
}

/// Iterator over a descriptor and its ancestors, leaf first.
#[derive(Clone)]
pub struct TableAncestors {
	next: Option<&'static DispatchTable>,
}

impl Iterator for TableAncestors {
	type Item = &'static DispatchTable;

	fn next(&mut self) -> Option<Self::Item> {
		let cur = self.next?;
		self.next = cur.parent;
		Some(cur)
	}
}
