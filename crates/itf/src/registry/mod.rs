//! Explicit interface registry.
//!
//! Built once at startup and passed by reference to whatever needs
//! name-based lookup (language bindings mostly):
//!
//! ```rust,ignore
//! let registry = RegistryBuilder::new("engine")
//! 	.interface(&NGS_STRING_V1)
//! 	.table(&ENGINE_STRING_VT)
//! 	.build()?;
//! let vt = registry.cast_by_name(Some(handle_vt), "NGS_Refcount_v1")?;
//! ```
//!
//! Readers load an immutable snapshot; runtime registration clones the
//! snapshot, edits the copy and swaps it in, retrying if another writer won.

mod collision;

use std::sync::Arc;

use arc_swap::ArcSwap;
use rustc_hash::FxHashMap as HashMap;
use thiserror::Error;

pub use collision::{Collision, InsertAction};

use crate::config::{DispatchConfig, DuplicatePolicy};
use crate::error::{DispatchError, HierarchyFault};
use crate::table::DispatchTable;
use crate::token::InterfaceToken;

/// Failures raised while registering interfaces or descriptors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
	/// Two distinct tokens declare the same name under [`DuplicatePolicy::Reject`].
	#[error("interface registry {registry}: duplicate interface {name}")]
	DuplicateInterface {
		registry: &'static str,
		name: &'static str,
	},
	/// A descriptor chain does not mirror its interface chain.
	#[error("interface registry {registry}: {fault}")]
	Hierarchy {
		registry: &'static str,
		#[source]
		fault: HierarchyFault,
	},
	/// Priming a descriptor's cache failed.
	#[error("interface registry {registry}: {source}")]
	Dispatch {
		registry: &'static str,
		#[source]
		source: DispatchError,
	},
}

#[derive(Clone, Default)]
struct RegistrySnapshot {
	by_name: HashMap<&'static str, &'static InterfaceToken>,
	interfaces: Vec<&'static InterfaceToken>,
	tables: Vec<&'static DispatchTable>,
	collisions: Vec<Collision>,
}

impl RegistrySnapshot {
	/// Declares `itf` and its ancestors, root first. Returns the action taken
	/// for `itf` itself.
	fn insert_interface(
		&mut self,
		label: &'static str,
		policy: DuplicatePolicy,
		itf: &'static InterfaceToken,
	) -> Result<InsertAction, RegistryError> {
		let chain: Vec<_> = itf.ancestors().collect();
		let mut action = InsertAction::KeptExisting;

		for &tok in chain.iter().rev() {
			action = match self.by_name.get(tok.name()).copied() {
				None => {
					self.by_name.insert(tok.name(), tok);
					self.interfaces.push(tok);
					InsertAction::InsertedNew
				}
				Some(existing) if std::ptr::eq(existing, tok) => InsertAction::KeptExisting,
				Some(existing) => {
					if policy == DuplicatePolicy::Reject {
						return Err(RegistryError::DuplicateInterface {
							registry: label,
							name: tok.name(),
						});
					}

					let replace = collision::new_wins(policy, label, existing, tok);
					let (action, winner, loser) = if replace {
						self.by_name.insert(tok.name(), tok);
						self.interfaces.retain(|&t| !std::ptr::eq(t, existing));
						self.interfaces.push(tok);
						(InsertAction::ReplacedExisting, tok, existing)
					} else {
						(InsertAction::KeptExisting, existing, tok)
					};

					tracing::warn!(
						registry = label,
						name = tok.name(),
						?action,
						"interface name collision"
					);
					self.collisions.push(Collision {
						name: tok.name(),
						winner,
						loser,
						action,
						registry: label,
					});
					action
				}
			};
		}

		Ok(action)
	}

	/// Checks that `table`'s chain mirrors the chain of the interface it names
	/// and that every level carries the registered token.
	fn verify_table(&self, table: &'static DispatchTable) -> Result<&'static InterfaceToken, HierarchyFault> {
		let Some(&itf) = self.by_name.get(table.itf_name()) else {
			return Err(HierarchyFault::UnknownInterface {
				class: table.class_name(),
				interface: table.itf_name(),
			});
		};

		let found = table.chain_depth();
		if found != itf.depth() {
			return Err(HierarchyFault::ChainDepth {
				class: table.class_name(),
				interface: itf.name(),
				expected: itf.depth(),
				found,
			});
		}

		for (level, tok) in table.ancestors().zip(itf.ancestors()) {
			if level.itf_name() != tok.name() {
				return Err(HierarchyFault::NameMismatch {
					class: table.class_name(),
					depth: tok.depth(),
					expected: tok.name(),
					found: level.itf_name(),
				});
			}
			if !std::ptr::eq(level.itf(), tok) {
				return Err(HierarchyFault::DuplicateToken {
					class: table.class_name(),
					name: tok.name(),
					depth: tok.depth(),
				});
			}
		}

		Ok(itf)
	}

	fn insert_table(
		&mut self,
		label: &'static str,
		config: &DispatchConfig,
		table: &'static DispatchTable,
	) -> Result<InsertAction, RegistryError> {
		if self.tables.iter().any(|&t| std::ptr::eq(t, table)) {
			return Ok(InsertAction::KeptExisting);
		}

		if config.verify_tables {
			self.verify_table(table)
				.map_err(|fault| RegistryError::Hierarchy {
					registry: label,
					fault,
				})?;
		}

		self.tables.push(table);
		Ok(InsertAction::InsertedNew)
	}

	/// Resolves every level of `table`. Casting to the root verifies the whole
	/// column from the leaf down.
	fn prime(&self, label: &'static str, table: &'static DispatchTable) -> Result<(), RegistryError> {
		let Some(root) = self
			.by_name
			.get(table.itf_name())
			.copied()
			.and_then(|itf| itf.ancestor_at(1))
		else {
			return Ok(());
		};
		table.cast(root).map(|_| ()).map_err(|source| RegistryError::Dispatch {
			registry: label,
			source,
		})
	}
}

/// Collects interface tokens and descriptors into an [`InterfaceRegistry`].
pub struct RegistryBuilder {
	label: &'static str,
	config: DispatchConfig,
	interfaces: Vec<&'static InterfaceToken>,
	tables: Vec<&'static DispatchTable>,
}

impl RegistryBuilder {
	/// Creates an empty builder with default configuration.
	pub fn new(label: &'static str) -> Self {
		Self {
			label,
			config: DispatchConfig::default(),
			interfaces: Vec::new(),
			tables: Vec::new(),
		}
	}

	/// Replaces the configuration.
	pub fn config(mut self, config: DispatchConfig) -> Self {
		self.config = config;
		self
	}

	/// Overrides the duplicate-name policy.
	pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
		self.config.duplicate_policy = policy;
		self
	}

	/// Declares an interface (and, implicitly, its ancestors).
	pub fn interface(mut self, itf: &'static InterfaceToken) -> Self {
		self.interfaces.push(itf);
		self
	}

	/// Declares several interfaces.
	pub fn interfaces<I>(mut self, itfs: I) -> Self
	where
		I: IntoIterator<Item = &'static InterfaceToken>,
	{
		self.interfaces.extend(itfs);
		self
	}

	/// Registers a concrete type by its leaf descriptor.
	pub fn table(mut self, table: &'static DispatchTable) -> Self {
		self.tables.push(table);
		self
	}

	/// Registers several concrete types.
	pub fn tables<I>(mut self, tables: I) -> Self
	where
		I: IntoIterator<Item = &'static DispatchTable>,
	{
		self.tables.extend(tables);
		self
	}

	/// Validates everything and produces the registry.
	pub fn build(self) -> Result<InterfaceRegistry, RegistryError> {
		let mut snap = RegistrySnapshot::default();
		for itf in self.interfaces {
			snap.insert_interface(self.label, self.config.duplicate_policy, itf)?;
		}
		for table in self.tables {
			snap.insert_table(self.label, &self.config, table)?;
		}
		if self.config.prime_caches {
			for &table in &snap.tables {
				snap.prime(self.label, table)?;
			}
		}

		tracing::debug!(
			registry = self.label,
			interfaces = snap.interfaces.len(),
			tables = snap.tables.len(),
			"interface registry built"
		);

		Ok(InterfaceRegistry {
			label: self.label,
			config: self.config,
			snap: ArcSwap::from_pointee(snap),
		})
	}
}

/// Name-addressable set of interface tokens and registered concrete types.
pub struct InterfaceRegistry {
	label: &'static str,
	config: DispatchConfig,
	snap: ArcSwap<RegistrySnapshot>,
}

impl InterfaceRegistry {
	/// Starts a builder.
	pub fn builder(label: &'static str) -> RegistryBuilder {
		RegistryBuilder::new(label)
	}

	/// Returns the registry label.
	pub fn label(&self) -> &'static str {
		self.label
	}

	/// Returns the configuration the registry was built with.
	pub fn config(&self) -> &DispatchConfig {
		&self.config
	}

	/// Looks up an interface by name.
	#[inline]
	pub fn interface(&self, name: &str) -> Option<&'static InterfaceToken> {
		self.snap.load().by_name.get(name).copied()
	}

	/// Returns true if `itf` itself (not merely its name) is registered.
	pub fn contains(&self, itf: &InterfaceToken) -> bool {
		self.interface(itf.name())
			.is_some_and(|tok| std::ptr::eq(tok, itf))
	}

	/// Returns every registered interface in declaration order.
	pub fn interfaces(&self) -> Vec<&'static InterfaceToken> {
		self.snap.load().interfaces.clone()
	}

	/// Returns every registered leaf descriptor.
	pub fn tables(&self) -> Vec<&'static DispatchTable> {
		self.snap.load().tables.clone()
	}

	/// Returns registered types implementing `itf`.
	pub fn tables_implementing(&self, itf: &'static InterfaceToken) -> Vec<&'static DispatchTable> {
		self.snap
			.load()
			.tables
			.iter()
			.copied()
			.filter(|table| table.implements(itf))
			.collect()
	}

	/// Returns recorded name collisions.
	pub fn collisions(&self) -> Vec<Collision> {
		self.snap.load().collisions.clone()
	}

	/// Number of registered interfaces.
	pub fn len(&self) -> usize {
		self.snap.load().interfaces.len()
	}

	/// Returns true if no interface is registered.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Declares an interface after startup.
	pub fn register_interface(&self, itf: &'static InterfaceToken) -> Result<InsertAction, RegistryError> {
		let policy = self.config.duplicate_policy;
		self.update(|snap| snap.insert_interface(self.label, policy, itf))
	}

	/// Registers a concrete type after startup.
	pub fn register_table(&self, table: &'static DispatchTable) -> Result<InsertAction, RegistryError> {
		let action = self.update(|snap| snap.insert_table(self.label, &self.config, table))?;
		if self.config.prime_caches && action == InsertAction::InsertedNew {
			self.snap.load().prime(self.label, table)?;
		}
		Ok(action)
	}

	/// Casts `table` to the interface registered under `name`.
	pub fn cast_by_name(
		&self,
		table: Option<&'static DispatchTable>,
		name: &str,
	) -> Result<&'static DispatchTable, DispatchError> {
		let Some(itf) = self.interface(name) else {
			let interface = table
				.and_then(|t| t.ancestors().find(|level| level.itf_name() == name))
				.map_or("<unregistered>", |level| level.itf_name());
			return Err(DispatchError::InterfaceNotSupported { interface });
		};
		crate::cast::cast(table, itf)
	}

	fn update<R>(
		&self,
		mut edit: impl FnMut(&mut RegistrySnapshot) -> Result<R, RegistryError>,
	) -> Result<R, RegistryError> {
		loop {
			let cur = self.snap.load_full();
			let mut next = (*cur).clone();
			let out = edit(&mut next)?;

			let prev = self.snap.compare_and_swap(&cur, Arc::new(next));
			if Arc::ptr_eq(&prev, &cur) {
				return Ok(out);
			}
		}
	}
}

impl std::fmt::Debug for InterfaceRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let snap = self.snap.load();
		f.debug_struct("InterfaceRegistry")
			.field("label", &self.label)
			.field("interfaces", &snap.interfaces.len())
			.field("tables", &snap.tables.len())
			.finish()
	}
}
