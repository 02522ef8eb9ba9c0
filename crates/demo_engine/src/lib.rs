//! Sample engine exposing `NGS_String_v1` through the refcount adapter.
//!
//! [`EngineString`] implements revision 1.1 (with `substr`); [`LegacyString`]
//! stops at 1.0. Callers see both as [`NgsString`].

pub mod engine;
pub mod itf;

pub use engine::{EngineString, LegacyString, register, tables};
pub use itf::{NGS_STRING_V1, NgsString, StringFns, StringItf};
