//! Resource stock for a session.
//!
//! The ledger is the single source of truth for quantities. Every mutation
//! clamps at zero, so no sequence of ticks, builds or harvests can drive a
//! stock negative.

use crate::id::ResourceId;

/// Non-negative stock of every resource, indexed by [`ResourceId`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    stock: Vec<f64>,
}

impl Ledger {
    pub fn new() -> Self {
        Self { stock: Vec::new() }
    }

    /// Create a ledger with a zeroed slot for each of `resource_count` resources.
    pub fn with_resources(resource_count: usize) -> Self {
        Self {
            stock: vec![0.0; resource_count],
        }
    }

    /// Current stock of a resource. Unknown resources read as zero.
    pub fn get(&self, resource: ResourceId) -> f64 {
        self.stock.get(resource.0 as usize).copied().unwrap_or(0.0)
    }

    /// Apply a delta, clamping the result at zero. Non-finite deltas and
    /// unknown resources are ignored.
    pub fn add(&mut self, resource: ResourceId, delta: f64) {
        if !delta.is_finite() {
            return;
        }
        if let Some(slot) = self.stock.get_mut(resource.0 as usize) {
            *slot = (*slot + delta).max(0.0);
        }
    }

    /// Overwrite a stock value. Negative or non-finite amounts store zero.
    /// Unknown resources are ignored.
    pub fn set(&mut self, resource: ResourceId, amount: f64) {
        let amount = if amount.is_finite() { amount.max(0.0) } else { 0.0 };
        if let Some(slot) = self.stock.get_mut(resource.0 as usize) {
            *slot = amount;
        }
    }

    /// Whether at least `amount` of the resource is in stock.
    pub fn has(&self, resource: ResourceId, amount: f64) -> bool {
        self.get(resource) >= amount
    }

    /// Iterate over `(resource, amount)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, f64)> + '_ {
        self.stock
            .iter()
            .enumerate()
            .map(|(i, &amount)| (ResourceId(i as u32), amount))
    }

    /// Number of resource slots tracked.
    pub fn len(&self) -> usize {
        self.stock.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stock.is_empty()
    }
}
