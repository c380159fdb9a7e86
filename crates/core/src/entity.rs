//! Entity trait: identity that survives state changes.

/// A non-versioned domain object addressed by identity.
///
/// Roster entries are entities: they are referenced by id from historical
/// orders and joined back by their label when orders are reported.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;

    /// Human-readable label shown next to the id in read models.
    fn label(&self) -> &str;
}
