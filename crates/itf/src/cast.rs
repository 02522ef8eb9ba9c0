//! Hierarchy resolution and the cast primitive.
//!
//! Resolution is lock-free. The cache column is published once through a
//! `OnceLock`, and each level's token is published through its own
//! `OnceLock`. Racing resolvers compute the same values; a loser's write is
//! dropped. Resolution walks from the leaf toward the requested level and
//! verifies every level it passes before publishing any of them, so a
//! published level was always verified together with the levels between it
//! and the leaf.

use crate::cache::CacheSlot;
use crate::error::{DispatchError, HierarchyFault};
use crate::table::DispatchTable;
use crate::token::InterfaceToken;

fn not_supported(itf: &InterfaceToken) -> DispatchError {
	DispatchError::InterfaceNotSupported {
		interface: itf.name(),
	}
}

fn duplicate_token(table: &DispatchTable, tok: &InterfaceToken) -> DispatchError {
	HierarchyFault::DuplicateToken {
		class: table.class_name(),
		name: tok.name(),
		depth: tok.depth(),
	}
	.into()
}

/// Populates `table`'s hierarchy cache from its leaf level down to `itf`.
///
/// Every level between the leaf and `itf`'s depth is checked and published
/// in one pass, so later casts to any of those interfaces are a single slot
/// read. Returns `Ok(())` without writing anything when the type implements a
/// different interface at `itf`'s depth; [`cast`] then reports
/// [`DispatchError::InterfaceNotSupported`]. Invoking it again with the same
/// arguments leaves the cache unchanged.
pub fn resolve(table: &'static DispatchTable, itf: &'static InterfaceToken) -> Result<(), DispatchError> {
	let depth = table.chain_depth();
	if itf.depth() > depth {
		return Err(not_supported(itf));
	}

	let leaf = table.itf();
	if leaf.depth() != depth {
		let fault = HierarchyFault::ChainDepth {
			class: table.class_name(),
			interface: leaf.name(),
			expected: leaf.depth(),
			found: depth,
		};
		tracing::error!(%fault, "descriptor chain does not mirror its interface");
		return Err(fault.into());
	}

	let cache = table.cache_or_build(depth)?;
	if cache.len() != depth {
		let fault = HierarchyFault::CacheLength {
			class: table.class_name(),
			expected: depth,
			found: cache.len(),
		};
		tracing::error!(%fault, "dispatch tables mixed across incompatible builds");
		return Err(fault.into());
	}

	let Some(target) = leaf.ancestor_at(itf.depth()) else {
		return Err(not_supported(itf));
	};
	if target.name() != itf.name() {
		return Ok(());
	}
	if !std::ptr::eq(target, itf) {
		return Err(duplicate_token(table, itf));
	}

	let mut pending: Vec<(&CacheSlot, &'static InterfaceToken)> = Vec::new();
	pending.try_reserve_exact((depth - itf.depth() + 1) as usize)?;

	for tok in leaf.ancestors().take_while(|tok| tok.depth() >= itf.depth()) {
		let Some(slot) = cache.slot(tok.depth()) else {
			return Err(not_supported(itf));
		};

		let found = slot.table().itf();
		if found.name() != tok.name() {
			let fault = HierarchyFault::NameMismatch {
				class: table.class_name(),
				depth: tok.depth(),
				expected: tok.name(),
				found: found.name(),
			};
			tracing::error!(%fault, "interface graph and dispatch tables diverged");
			return Err(fault.into());
		}
		if !std::ptr::eq(found, tok) {
			return Err(duplicate_token(table, tok));
		}

		match slot.token() {
			Some(held) if std::ptr::eq(held, tok) => {}
			Some(_) => return Err(duplicate_token(table, tok)),
			None => pending.push((slot, tok)),
		}
	}

	for (slot, tok) in pending {
		if !std::ptr::eq(slot.publish(tok), tok) {
			return Err(duplicate_token(table, tok));
		}
	}

	Ok(())
}

fn lookup(table: &'static DispatchTable, itf: &InterfaceToken) -> Option<&'static DispatchTable> {
	let slot = table.cache()?.slot(itf.depth())?;
	slot.holds(itf).then(|| slot.table())
}

/// Returns the ancestor of `table` implementing `itf`.
///
/// A `None` table fails exactly like an unsupported interface; rejecting null
/// handles is the caller's job. After the first resolution for a given
/// `(type, interface)` pair this is a single slot read.
pub fn cast(
	table: Option<&'static DispatchTable>,
	itf: &'static InterfaceToken,
) -> Result<&'static DispatchTable, DispatchError> {
	let Some(table) = table else {
		return Err(not_supported(itf));
	};

	if let Some(hit) = lookup(table, itf) {
		return Ok(hit);
	}

	resolve(table, itf)?;
	lookup(table, itf).ok_or_else(|| not_supported(itf))
}

/// Like [`cast`], but reports every failure as `None`.
///
/// Fatal failures are logged before being discarded.
pub fn try_cast(
	table: Option<&'static DispatchTable>,
	itf: &'static InterfaceToken,
) -> Option<&'static DispatchTable> {
	match cast(table, itf) {
		Ok(found) => Some(found),
		Err(err) => {
			if err.is_fatal() {
				tracing::error!(error = %err, itf = itf.name(), "cast failed");
			}
			None
		}
	}
}
