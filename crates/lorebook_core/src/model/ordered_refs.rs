//! Dense ordering structure over foreign-key references.
//!
//! # Responsibility
//! - Remember a stable display order for a set of referenced ids.
//! - Keep order values densely packed under append/remove/swap.
//!
//! # Invariants
//! - For n entries the order values are exactly `{0, 1, ..., n-1}`.
//! - The order value is the sole source of truth; insertion history is
//!   not retained after mutation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a referenced aggregate.
pub type ReferenceId = Uuid;

/// Errors from ordered reference mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderedRefError {
    /// Reference is already tracked by this map.
    DuplicateReference(ReferenceId),
    /// Reference is not tracked by this map.
    ReferenceNotFound(ReferenceId),
}

impl Display for OrderedRefError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateReference(id) => write!(f, "reference already present: {id}"),
            Self::ReferenceNotFound(id) => write!(f, "reference not found: {id}"),
        }
    }
}

impl Error for OrderedRefError {}

/// Reference-to-order mapping with dense `0..n-1` order values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedReferenceMap {
    orders: HashMap<ReferenceId, usize>,
}

impl OrderedReferenceMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `reference` at the end of the ordering.
    ///
    /// Returns the assigned order value.
    pub fn append(&mut self, reference: ReferenceId) -> Result<usize, OrderedRefError> {
        if self.orders.contains_key(&reference) {
            return Err(OrderedRefError::DuplicateReference(reference));
        }
        let order = self.orders.len();
        self.orders.insert(reference, order);
        Ok(order)
    }

    /// Removes `reference` and compacts every order value above it.
    ///
    /// Returns the order the reference held before removal.
    pub fn remove(&mut self, reference: ReferenceId) -> Result<usize, OrderedRefError> {
        let removed = self
            .orders
            .remove(&reference)
            .ok_or(OrderedRefError::ReferenceNotFound(reference))?;
        for order in self.orders.values_mut() {
            if *order > removed {
                *order -= 1;
            }
        }
        Ok(removed)
    }

    /// Exchanges the order values of `a` and `b`, leaving all others alone.
    pub fn swap(&mut self, a: ReferenceId, b: ReferenceId) -> Result<(), OrderedRefError> {
        let order_a = *self
            .orders
            .get(&a)
            .ok_or(OrderedRefError::ReferenceNotFound(a))?;
        let order_b = *self
            .orders
            .get(&b)
            .ok_or(OrderedRefError::ReferenceNotFound(b))?;
        self.orders.insert(a, order_b);
        self.orders.insert(b, order_a);
        Ok(())
    }

    /// Returns whether `reference` is tracked.
    pub fn contains(&self, reference: ReferenceId) -> bool {
        self.orders.contains_key(&reference)
    }

    /// Returns the order value of `reference`, if tracked.
    pub fn get(&self, reference: ReferenceId) -> Option<usize> {
        self.orders.get(&reference).copied()
    }

    /// Number of tracked references.
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Returns whether the map tracks nothing.
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// References sorted ascending by order value.
    pub fn in_order(&self) -> Vec<ReferenceId> {
        let mut pairs: Vec<(ReferenceId, usize)> =
            self.orders.iter().map(|(id, order)| (*id, *order)).collect();
        pairs.sort_by_key(|(_, order)| *order);
        pairs.into_iter().map(|(id, _)| id).collect()
    }

    /// Read-only view of the underlying mapping.
    pub fn raw(&self) -> &HashMap<ReferenceId, usize> {
        &self.orders
    }
}

#[cfg(test)]
mod tests {
    use super::{OrderedRefError, OrderedReferenceMap};
    use std::collections::BTreeSet;
    use uuid::Uuid;

    fn order_values(map: &OrderedReferenceMap) -> BTreeSet<usize> {
        map.raw().values().copied().collect()
    }

    #[test]
    fn append_assigns_dense_orders() {
        let mut map = OrderedReferenceMap::new();
        let refs: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        for (index, id) in refs.iter().enumerate() {
            assert_eq!(map.append(*id).unwrap(), index);
        }
        assert_eq!(order_values(&map), (0..5).collect());
        assert_eq!(map.in_order(), refs);
    }

    #[test]
    fn append_duplicate_is_rejected() {
        let mut map = OrderedReferenceMap::new();
        let id = Uuid::new_v4();
        map.append(id).unwrap();
        let err = map.append(id).unwrap_err();
        assert_eq!(err, OrderedRefError::DuplicateReference(id));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn remove_compacts_and_preserves_relative_order() {
        let mut map = OrderedReferenceMap::new();
        let refs: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        for id in &refs {
            map.append(*id).unwrap();
        }

        assert_eq!(map.remove(refs[1]).unwrap(), 1);
        assert_eq!(order_values(&map), (0..3).collect());
        assert_eq!(map.in_order(), vec![refs[0], refs[2], refs[3]]);
    }

    #[test]
    fn remove_absent_fails_and_does_not_mutate() {
        let mut map = OrderedReferenceMap::new();
        let kept = Uuid::new_v4();
        map.append(kept).unwrap();

        let missing = Uuid::new_v4();
        let err = map.remove(missing).unwrap_err();
        assert_eq!(err, OrderedRefError::ReferenceNotFound(missing));
        assert_eq!(map.in_order(), vec![kept]);
    }

    #[test]
    fn swap_is_an_involution() {
        let mut map = OrderedReferenceMap::new();
        let refs: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        for id in &refs {
            map.append(*id).unwrap();
        }

        let before = map.clone();
        map.swap(refs[0], refs[2]).unwrap();
        assert_eq!(map.in_order(), vec![refs[2], refs[1], refs[0]]);
        map.swap(refs[0], refs[2]).unwrap();
        assert_eq!(map, before);
    }

    #[test]
    fn serialization_keeps_order_values() {
        let mut map = OrderedReferenceMap::new();
        let refs: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        for id in &refs {
            map.append(*id).unwrap();
        }

        let json = serde_json::to_string(&map).unwrap();
        let restored: OrderedReferenceMap = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, map);
        assert_eq!(restored.in_order(), refs);
    }

    #[test]
    fn swap_names_the_missing_reference() {
        let mut map = OrderedReferenceMap::new();
        let present = Uuid::new_v4();
        map.append(present).unwrap();

        let missing = Uuid::new_v4();
        let err = map.swap(present, missing).unwrap_err();
        assert_eq!(err, OrderedRefError::ReferenceNotFound(missing));
        let err = map.swap(missing, present).unwrap_err();
        assert_eq!(err, OrderedRefError::ReferenceNotFound(missing));
    }
}
