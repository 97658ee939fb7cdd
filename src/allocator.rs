// 🔢 Control-Number Allocator - Sequential codes with reuse of freed numbers
//
// Control numbers look like ICSO-03-15-001: prefix, month, day, and a
// three-digit sequence. Numbers freed by deletion go into a reclaim pool
// and are handed out again before any new number is minted.
//
// Pool invariant: sorted lexicographically ascending. Reuse order is
// therefore lexicographic, not deletion order.

use chrono::{Datelike, NaiveDate};

use crate::member::Member;
use crate::store::StoreError;

/// Default control-number prefix.
pub const DEFAULT_PREFIX: &str = "ICSO";

/// Highest sequence number that fits the three-digit field.
const MAX_SEQUENCE: u32 = 999;

// ============================================================================
// ALLOCATOR
// ============================================================================

pub struct ControlNumberAllocator {
    /// Prefix for minted numbers (e.g., "ICSO")
    prefix: String,

    /// Control numbers freed by deletion, sorted ascending
    reclaimed: Vec<String>,
}

impl ControlNumberAllocator {
    /// Create an allocator with the default prefix and an empty pool.
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_PREFIX)
    }

    pub fn with_prefix(prefix: &str) -> Self {
        ControlNumberAllocator {
            prefix: prefix.to_string(),
            reclaimed: Vec::new(),
        }
    }

    /// Produce a unique control number for a registration on `date`.
    ///
    /// Prefers the lexicographically smallest reclaimed number (a reused
    /// number keeps the month/day segment it was minted with). Otherwise
    /// scans sequence numbers from 001 for the first value not used by an
    /// active record. Sequences do not wrap: once 001-999 are all taken
    /// for the day, allocation fails with `SequenceExhausted`.
    pub fn allocate(&mut self, date: NaiveDate, active: &[Member]) -> Result<String, StoreError> {
        if !self.reclaimed.is_empty() {
            return Ok(self.reclaimed.remove(0));
        }

        for sequence in 1..=MAX_SEQUENCE {
            let candidate = format!(
                "{}-{:02}-{:02}-{:03}",
                self.prefix,
                date.month(),
                date.day(),
                sequence
            );
            if !active.iter().any(|m| m.control_number == candidate) {
                return Ok(candidate);
            }
        }

        Err(StoreError::SequenceExhausted)
    }

    /// Return a freed control number to the pool.
    pub fn reclaim(&mut self, control_number: String) {
        self.reclaimed.push(control_number);
        self.reclaimed.sort();
    }

    /// Drop all pooled numbers (bulk delete).
    pub fn clear(&mut self) {
        self.reclaimed.clear();
    }

    /// Pooled numbers, in reuse order.
    pub fn reclaimed(&self) -> &[String] {
        &self.reclaimed
    }

    pub fn pending(&self) -> usize {
        self.reclaimed.len()
    }

    /// Replace the pool from a persisted or imported snapshot.
    /// Re-sorted on the way in to hold the pool invariant.
    pub fn restore(&mut self, mut pool: Vec<String>) {
        pool.sort();
        self.reclaimed = pool;
    }
}

impl Default for ControlNumberAllocator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
