use crate::config::DuplicatePolicy;
use crate::token::InterfaceToken;

/// Result of a successful registration.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InsertAction {
	/// Entry was new.
	InsertedNew,
	/// An equal entry, or a policy-preferred one, was already present.
	KeptExisting,
	/// A same-named entry was replaced (policy chose the new one).
	ReplacedExisting,
}

/// Records a non-fatal name collision resolved by policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
	/// The contested interface name.
	pub name: &'static str,
	/// The token that owns the name afterwards.
	pub winner: &'static InterfaceToken,
	/// The token that lost.
	pub loser: &'static InterfaceToken,
	/// What happened to the existing entry.
	pub action: InsertAction,
	/// The registry label where this collision occurred.
	pub registry: &'static str,
}

/// Returns true if `new` should replace `existing` under `policy`.
///
/// `Reject` is handled by the caller before a winner is chosen.
pub(super) fn new_wins(
	policy: DuplicatePolicy,
	registry: &'static str,
	existing: &'static InterfaceToken,
	new: &'static InterfaceToken,
) -> bool {
	match policy {
		DuplicatePolicy::Panic => panic!(
			"interface registry {registry}: two tokens named {:?} (depths {} and {})",
			existing.name(),
			existing.depth(),
			new.depth()
		),
		DuplicatePolicy::Reject | DuplicatePolicy::FirstWins => false,
		DuplicatePolicy::LastWins => true,
	}
}
