//! Capacity sizing strategies for `RingBuffer`.
//!
//! The policy is an argument to each capacity-affecting call rather than a
//! property of the buffer, so the same instance can be sized exactly in one
//! place and grown geometrically in another.

/// The smallest capacity the smart policy will ever produce.
pub const MIN_SMART_CAPACITY: usize = 4;

/// Strategy for turning a requested element count into an allocated capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CapacityPolicy {
    /// Allocate exactly the requested number of slots.
    Exact,
    /// Allocate the next power of two at or above the request, never less
    /// than [`MIN_SMART_CAPACITY`]. Growth doubles; shrinking waits for
    /// usage to fall to a quarter of capacity.
    Smart,
}

/// Normalizes a requested capacity under the given policy.
///
/// Requests that would overflow the next power of two saturate to
/// `usize::MAX` instead of panicking; an allocation of that size will
/// fail fatally downstream, which is the intended outcome.
///
/// # Examples
///
/// ```
/// use ringdeque::{normalize_capacity, CapacityPolicy};
///
/// assert_eq!(normalize_capacity(0, CapacityPolicy::Smart), 4);
/// assert_eq!(normalize_capacity(9, CapacityPolicy::Smart), 16);
/// assert_eq!(normalize_capacity(9, CapacityPolicy::Exact), 9);
/// ```
#[inline]
pub fn normalize_capacity(requested: usize, policy: CapacityPolicy) -> usize {
    match policy {
        CapacityPolicy::Exact => requested,
        CapacityPolicy::Smart => {
            let at_least = if requested < MIN_SMART_CAPACITY {
                MIN_SMART_CAPACITY
            } else {
                requested
            };
            at_least.checked_next_power_of_two().unwrap_or(usize::MAX)
        }
    }
}

/// Returns the doubled capacity used when a full buffer must grow.
///
/// # Panics
///
/// Panics if doubling would overflow `usize`.
#[inline]
pub fn grow_capacity(current: usize) -> usize {
    if current == 0 {
        return MIN_SMART_CAPACITY;
    }
    match current.checked_mul(2) {
        Some(doubled) => doubled,
        None => panic!("capacity overflow"),
    }
}

/// Proposes a smaller capacity for a buffer holding `len` elements, or
/// `None` when the current capacity should be kept.
///
/// Under [`CapacityPolicy::Smart`] a shrink is only proposed once usage has
/// fallen to a quarter of capacity. Growth doubles, so this 4x band keeps
/// alternating insert/remove workloads near a capacity boundary from
/// reallocating on every call.
///
/// # Examples
///
/// ```
/// use ringdeque::{shrink_candidate, CapacityPolicy};
///
/// // Usage above a quarter: keep the block.
/// assert_eq!(shrink_candidate(5, 16, CapacityPolicy::Smart), None);
/// // Usage at a quarter: shrink to the normalized fit.
/// assert_eq!(shrink_candidate(4, 16, CapacityPolicy::Smart), Some(4));
/// // Exact trims any slack at all.
/// assert_eq!(shrink_candidate(5, 16, CapacityPolicy::Exact), Some(5));
/// ```
#[inline]
pub fn shrink_candidate(len: usize, current: usize, policy: CapacityPolicy) -> Option<usize> {
    match policy {
        CapacityPolicy::Exact => {
            if current > len {
                Some(len)
            } else {
                None
            }
        }
        CapacityPolicy::Smart => {
            if current <= MIN_SMART_CAPACITY || len > current >> 2 {
                return None;
            }
            let candidate = normalize_capacity(len, CapacityPolicy::Smart);
            if candidate < current {
                Some(candidate)
            } else {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_smart() {
        assert_eq!(normalize_capacity(0, CapacityPolicy::Smart), 4);
        assert_eq!(normalize_capacity(3, CapacityPolicy::Smart), 4);
        assert_eq!(normalize_capacity(4, CapacityPolicy::Smart), 4);
        assert_eq!(normalize_capacity(5, CapacityPolicy::Smart), 8);
        assert_eq!(normalize_capacity(1023, CapacityPolicy::Smart), 1024);
        assert_eq!(normalize_capacity(usize::MAX, CapacityPolicy::Smart), usize::MAX);
    }

    #[test]
    fn normalize_exact() {
        assert_eq!(normalize_capacity(0, CapacityPolicy::Exact), 0);
        assert_eq!(normalize_capacity(7, CapacityPolicy::Exact), 7);
    }

    #[test]
    fn grow_doubles() {
        assert_eq!(grow_capacity(0), 4);
        assert_eq!(grow_capacity(4), 8);
        assert_eq!(grow_capacity(8), 16);
    }

    #[test]
    #[should_panic(expected = "capacity overflow")]
    fn grow_overflow() {
        grow_capacity(usize::MAX / 2 + 1);
    }

    #[test]
    fn shrink_hysteresis() {
        // Never shrinks at or below the minimum capacity.
        assert_eq!(shrink_candidate(0, 4, CapacityPolicy::Smart), None);
        // Above a quarter full: no change.
        assert_eq!(shrink_candidate(9, 32, CapacityPolicy::Smart), None);
        // At a quarter full: proposes the normalized fit.
        assert_eq!(shrink_candidate(8, 32, CapacityPolicy::Smart), Some(8));
        assert_eq!(shrink_candidate(3, 32, CapacityPolicy::Smart), Some(4));
        assert_eq!(shrink_candidate(0, 32, CapacityPolicy::Smart), Some(4));
    }

    #[test]
    fn shrink_exact() {
        assert_eq!(shrink_candidate(6, 6, CapacityPolicy::Exact), None);
        assert_eq!(shrink_candidate(6, 7, CapacityPolicy::Exact), Some(6));
        assert_eq!(shrink_candidate(0, 1, CapacityPolicy::Exact), Some(0));
    }
}
