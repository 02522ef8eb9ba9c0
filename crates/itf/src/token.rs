//! Interface tokens.
//!
//! A token names one interface and points at its single parent. Tokens are
//! declared as `static` items so the whole ancestry is fixed at compile time:
//!
//! ```rust,ignore
//! pub static NGS_REFCOUNT_V1: InterfaceToken = InterfaceToken::root("NGS_Refcount_v1");
//! pub static NGS_STRING_V1: InterfaceToken =
//! 	InterfaceToken::derived("NGS_String_v1", &NGS_REFCOUNT_V1);
//! ```
//!
//! Depth is computed by the const constructors, so it is never written at
//! runtime and every reader observes the same value.

use std::fmt;

/// Identity of one interface type within a single-inheritance family.
///
/// Equality is address identity: two tokens with the same name declared in
/// different places are different interfaces as far as casting is concerned.
pub struct InterfaceToken {
	name: &'static str,
	parent: Option<&'static InterfaceToken>,
	depth: u32,
}

impl InterfaceToken {
	/// Declares a root interface (depth 1).
	pub const fn root(name: &'static str) -> Self {
		Self {
			name,
			parent: None,
			depth: 1,
		}
	}

	/// Declares an interface extending `parent`.
	pub const fn derived(name: &'static str, parent: &'static InterfaceToken) -> Self {
		Self {
			name,
			parent: Some(parent),
			depth: parent.depth + 1,
		}
	}

	/// Returns the interface name.
	#[inline]
	pub const fn name(&self) -> &'static str {
		self.name
	}

	/// Returns the parent interface, if any.
	#[inline]
	pub const fn parent(&self) -> Option<&'static InterfaceToken> {
		self.parent
	}

	/// Returns the depth of this interface: 1 for a root, increasing toward
	/// derived interfaces.
	#[inline]
	pub const fn depth(&self) -> u32 {
		self.depth
	}

	/// Returns true for a root interface.
	#[inline]
	pub const fn is_root(&self) -> bool {
		self.parent.is_none()
	}

	/// Iterates from this token up to the root of its family.
	pub fn ancestors(&'static self) -> Ancestors {
		Ancestors { next: Some(self) }
	}

	/// Returns the ancestor (or self) sitting at `depth`.
	pub fn ancestor_at(&'static self, depth: u32) -> Option<&'static InterfaceToken> {
		if depth == 0 || depth > self.depth {
			return None;
		}
		self.ancestors().find(|tok| tok.depth == depth)
	}

	/// Returns true if `other` is this token or one of its ancestors.
	pub fn extends(&'static self, other: &InterfaceToken) -> bool {
		self.ancestor_at(other.depth)
			.is_some_and(|tok| std::ptr::eq(tok, other))
	}

	/// Recomputes the depth by walking the parent chain.
	///
	/// Must agree with [`depth`](Self::depth); used by registry verification.
	pub fn walked_depth(&'static self) -> u32 {
		self.ancestors().count() as u32
	}
}

impl PartialEq for InterfaceToken {
	fn eq(&self, other: &Self) -> bool {
		std::ptr::eq(self, other)
	}
}

impl Eq for InterfaceToken {}

impl fmt::Debug for InterfaceToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("InterfaceToken")
			.field("name", &self.name)
			.field("parent", &self.parent.map(|p| p.name))
			.field("depth", &self.depth)
			.finish()
	}
}

impl fmt::Display for InterfaceToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name)
	}
}

/// Iterator over a token and its ancestors, leaf first.
#[derive(Clone)]
pub struct Ancestors {
	next: Option<&'static InterfaceToken>,
}

impl Iterator for Ancestors {
	type Item = &'static InterfaceToken;

	fn next(&mut self) -> Option<Self::Item> {
		let cur = self.next?;
		self.next = cur.parent;
		Some(cur)
	}
}
