//! Per-type memo of ancestor descriptors.

use std::sync::OnceLock;

use crate::error::{DispatchError, HierarchyFault};
use crate::table::DispatchTable;
use crate::token::InterfaceToken;

/// One level of a [`HierarchyCache`].
///
/// The descriptor is fixed when the cache is built. The token is published
/// once the level has been verified against an interface declaration and
/// never changes afterwards.
pub struct CacheSlot {
	table: &'static DispatchTable,
	itf: OnceLock<&'static InterfaceToken>,
}

impl CacheSlot {
	/// Ancestor descriptor at this level.
	#[inline]
	pub fn table(&self) -> &'static DispatchTable {
		self.table
	}

	/// Verified token at this level, if any.
	#[inline]
	pub fn token(&self) -> Option<&'static InterfaceToken> {
		self.itf.get().copied()
	}

	/// Returns true if this level was verified for exactly `itf`.
	#[inline]
	pub fn holds(&self, itf: &InterfaceToken) -> bool {
		self.token().is_some_and(|tok| std::ptr::eq(tok, itf))
	}

	/// Publishes `itf`, returning whichever token the slot holds afterwards.
	pub(crate) fn publish(&self, itf: &'static InterfaceToken) -> &'static InterfaceToken {
		self.itf.get_or_init(|| itf)
	}
}

/// Direct map from interface depth to ancestor descriptor for one type.
pub struct HierarchyCache {
	levels: Box<[CacheSlot]>,
}

impl HierarchyCache {
	/// Builds the full ancestor column for `leaf`, whose chain is `depth` deep.
	pub(crate) fn build(leaf: &'static DispatchTable, depth: u32) -> Result<Self, DispatchError> {
		let mut column: Vec<&'static DispatchTable> = Vec::new();
		column.try_reserve_exact(depth as usize)?;
		column.extend(leaf.ancestors());
		if column.len() != depth as usize {
			return Err(HierarchyFault::CacheLength {
				class: leaf.class_name(),
				expected: depth,
				found: column.len() as u32,
			}
			.into());
		}

		let mut levels = Vec::new();
		levels.try_reserve_exact(column.len())?;
		levels.extend(column.into_iter().rev().map(|table| CacheSlot {
			table,
			itf: OnceLock::new(),
		}));

		Ok(Self {
			levels: levels.into_boxed_slice(),
		})
	}

	/// Number of levels.
	#[inline]
	pub fn len(&self) -> u32 {
		self.levels.len() as u32
	}

	/// Always false; a descriptor implements at least its own level.
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.levels.is_empty()
	}

	/// Slot for interface depth `depth` (1-based).
	#[inline]
	pub fn slot(&self, depth: u32) -> Option<&CacheSlot> {
		let idx = (depth as usize).checked_sub(1)?;
		self.levels.get(idx)
	}

	/// Number of levels with a verified token.
	pub fn resolved_levels(&self) -> usize {
		self.levels.iter().filter(|s| s.token().is_some()).count()
	}

	/// Copies the current slot contents, root first.
	pub fn snapshot(&self) -> Vec<SlotSnapshot> {
		self.levels
			.iter()
			.zip(1..)
			.map(|(slot, depth)| SlotSnapshot {
				depth,
				table: slot.table,
				token: slot.token(),
			})
			.collect()
	}
}

/// Point-in-time view of one cache slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotSnapshot {
	pub depth: u32,
	pub table: &'static DispatchTable,
	pub token: Option<&'static InterfaceToken>,
}
