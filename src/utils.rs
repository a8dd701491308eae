//! Modular index arithmetic over a ring of `capacity` slots.
//!
//! Every caller guarantees `capacity > 0`.

#[inline]
pub fn wrap_add(index: usize, addend: usize, capacity: usize) -> usize {
    debug_assert!(addend <= capacity);
    (index + addend) % capacity
}

#[inline]
pub fn wrap_sub(index: usize, subtrahend: usize, capacity: usize) -> usize {
    debug_assert!(subtrahend <= capacity);
    (index + capacity - subtrahend) % capacity
}

/// Offsets `index` by an arbitrary signed amount, wrapping with a true
/// modulo so that negative offsets larger than `capacity` land correctly.
#[inline]
pub fn wrap_offset(index: usize, by: isize, capacity: usize) -> usize {
    debug_assert!(index < capacity);
    let cap = capacity as isize;
    let shifted = (index as isize + by % cap).rem_euclid(cap);
    shifted as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_wraps_at_capacity() {
        assert_eq!(wrap_add(0, 3, 8), 3);
        assert_eq!(wrap_add(6, 3, 8), 1);
        assert_eq!(wrap_add(7, 1, 8), 0);
        assert_eq!(wrap_add(0, 8, 8), 0);
    }

    #[test]
    fn sub_wraps_below_zero() {
        assert_eq!(wrap_sub(3, 3, 8), 0);
        assert_eq!(wrap_sub(1, 3, 8), 6);
        assert_eq!(wrap_sub(0, 1, 8), 7);
        assert_eq!(wrap_sub(0, 8, 8), 0);
    }

    #[test]
    fn offset_true_modulo() {
        assert_eq!(wrap_offset(2, 3, 8), 5);
        assert_eq!(wrap_offset(2, -3, 8), 7);
        assert_eq!(wrap_offset(2, -19, 8), 7);
        assert_eq!(wrap_offset(2, 19, 8), 5);
        assert_eq!(wrap_offset(0, -1, 3), 2);
    }
}
