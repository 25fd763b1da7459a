//! Capped running totals.
//!
//! The allocator keeps one ledger for bytes across all categories and one
//! count ledger per category. Acquisition is all-or-nothing: a request that
//! would push the total past the capacity leaves the ledger untouched.

/// `capacity: None` admits everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ledger {
    capacity: Option<u64>,
    used: u64,
}

impl Ledger {
    pub fn new(capacity: Option<u64>) -> Self {
        Self { capacity, used: 0 }
    }

    pub fn unbounded() -> Self {
        Self::new(None)
    }

    pub fn would_fit(&self, amount: u64) -> bool {
        match self.capacity {
            None => true,
            Some(cap) => self.used.saturating_add(amount) <= cap,
        }
    }

    /// Charge `amount` if it fits. Returns whether it did.
    pub fn try_acquire(&mut self, amount: u64) -> bool {
        if !self.would_fit(amount) {
            return false;
        }
        self.used = self.used.saturating_add(amount);
        true
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn remaining(&self) -> Option<u64> {
        self.capacity.map(|cap| cap.saturating_sub(self.used))
    }
}
