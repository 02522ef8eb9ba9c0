//! Interface dispatch core.
//!
//! Every object exposed across the binding boundary carries a pointer to a
//! per-type [`DispatchTable`]. Callers name the interface they want with an
//! [`InterfaceToken`] and [`cast`] returns the ancestor table implementing
//! it, memoizing the answer in the table's [`HierarchyCache`].
//!
//! - [`InterfaceToken`]: one interface and its single parent
//! - [`DispatchTable`]: one concrete type at one interface level
//! - [`HierarchyCache`]: depth-indexed ancestor column for a type
//! - [`resolve`] / [`cast`]: the dynamic downcast primitive
//! - [`ErrBlock`]: failure out-parameter for function-table calls
//! - [`InterfaceRegistry`]: explicit name registry built at startup
//! - [`DispatchConfig`]: registry settings loaded from TOML

pub mod cache;
pub mod cast;
pub mod config;
pub mod err_block;
pub mod error;
pub mod registry;
pub mod table;
pub mod token;

pub use cache::{CacheSlot, HierarchyCache, SlotSnapshot};
pub use cast::{cast, resolve, try_cast};
pub use config::{ConfigError, DispatchConfig, DuplicatePolicy};
pub use err_block::{ERR_MSG_CAPACITY, ErrBlock};
pub use error::{DispatchError, ErrorKind, HierarchyFault};
pub use registry::{Collision, InsertAction, InterfaceRegistry, RegistryBuilder, RegistryError};
pub use table::{DispatchTable, TableAncestors};
pub use token::{Ancestors, InterfaceToken};
