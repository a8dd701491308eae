//! The raw slot block and the segmented memory engine.
//!
//! `RawRing` owns an allocation of `cap` slots and knows nothing about which
//! of them are live; that bookkeeping belongs to `RingBuffer`. All wrap-around
//! reasoning is concentrated in the run primitives here, so the mutation
//! algorithms above can be written as if the buffer were linear: a run of `n`
//! logical slots starting at a physical index is split into at most two
//! contiguous segments when it crosses the end of the block.
//!
//! Run primitives return the physical index one past the last slot they
//! touched, wrapped to `0` when it reaches the capacity.

use std::alloc::{alloc, dealloc, handle_alloc_error, Layout};
use std::mem;
use std::ptr::{self, NonNull};
use std::slice;

use crate::utils::{wrap_add, wrap_sub};

/// An exclusively owned, uninitialized block of `cap` slots.
///
/// Dropping a `RawRing` releases the block without running any element
/// destructors; live slots must be torn down with [`RawRing::drop_run`]
/// first.
pub(crate) struct RawRing<T> {
    ptr: NonNull<T>,
    cap: usize,
}

unsafe impl<T: Send> Send for RawRing<T> {}
unsafe impl<T: Sync> Sync for RawRing<T> {}

impl<T> RawRing<T> {
    /// Allocates a block of exactly `cap` slots.
    ///
    /// Zero capacities and zero-sized element types never touch the
    /// allocator; allocation failure aborts.
    pub fn with_capacity(cap: usize) -> Self {
        if cap == 0 || mem::size_of::<T>() == 0 {
            return RawRing {
                ptr: NonNull::dangling(),
                cap,
            };
        }
        let layout = match Layout::array::<T>(cap) {
            Ok(layout) => layout,
            Err(_) => panic!("capacity overflow"),
        };
        let raw = unsafe { alloc(layout) } as *mut T;
        let ptr = match NonNull::new(raw) {
            Some(ptr) => ptr,
            None => handle_alloc_error(layout),
        };
        RawRing { ptr, cap }
    }

    #[inline]
    pub fn cap(&self) -> usize {
        self.cap
    }

    #[inline]
    pub fn ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    #[inline]
    pub fn ptr_mut(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    #[inline]
    pub unsafe fn as_slice(&self) -> &[T] {
        slice::from_raw_parts(self.ptr(), self.cap)
    }

    #[inline]
    pub unsafe fn as_mut_slice(&mut self) -> &mut [T] {
        slice::from_raw_parts_mut(self.ptr.as_ptr(), self.cap)
    }

    /// Moves the value out of a slot, leaving it vacant.
    #[inline]
    pub unsafe fn read(&self, offset: usize) -> T {
        debug_assert!(offset < self.cap);
        ptr::read(self.ptr().add(offset))
    }

    /// Constructs a value into a vacant slot.
    #[inline]
    pub unsafe fn write(&mut self, offset: usize, element: T) {
        debug_assert!(offset < self.cap);
        ptr::write(self.ptr_mut().add(offset), element);
    }

    /// Length of the first physical segment of a run of `len` slots
    /// starting at `start`.
    #[inline]
    fn first_seg(&self, start: usize, len: usize) -> usize {
        debug_assert!(start < self.cap || (start == 0 && len == 0));
        if len < self.cap - start {
            len
        } else {
            self.cap - start
        }
    }

    /// Constructs `len` elements pulled from `source` into the vacant run
    /// starting at `start`, wrapping past the end of the block.
    ///
    /// The iterator must yield at least `len` items; surplus items are left
    /// unconsumed.
    pub unsafe fn write_run<I>(&mut self, start: usize, len: usize, source: &mut I) -> usize
    where
        I: Iterator<Item = T>,
    {
        debug_assert!(len <= self.cap);
        if len == 0 {
            return start;
        }
        let first = self.first_seg(start, len);
        for offset in start..start + first {
            match source.next() {
                Some(element) => self.write(offset, element),
                None => panic!("iterator shorter than its claimed length"),
            }
        }
        for offset in 0..len - first {
            match source.next() {
                Some(element) => self.write(offset, element),
                None => panic!("iterator shorter than its claimed length"),
            }
        }
        wrap_add(start, len, self.cap)
    }

    /// Moves `len` elements out of `src`'s live run into this block's vacant
    /// run, leaving the source slots vacant. Both runs may wrap; the move is
    /// performed in at most three non-overlapping segment copies.
    pub unsafe fn move_run_from(
        &mut self,
        dst_start: usize,
        src: &RawRing<T>,
        src_start: usize,
        len: usize,
    ) -> usize {
        debug_assert!(len <= self.cap && len <= src.cap);
        let mut remaining = len;
        let mut dst = dst_start;
        let mut src_at = src_start;
        while remaining > 0 {
            let dst_seg = self.cap - dst;
            let src_seg = src.cap - src_at;
            let chunk = remaining.min(dst_seg).min(src_seg);
            ptr::copy_nonoverlapping(src.ptr().add(src_at), self.ptr_mut().add(dst), chunk);
            remaining -= chunk;
            dst = wrap_add(dst, chunk, self.cap);
            src_at = wrap_add(src_at, chunk, src.cap);
        }
        dst
    }

    /// Runs the destructor of every element in the live run starting at
    /// `start`, exactly once per slot, leaving the run vacant.
    pub unsafe fn drop_run(&mut self, start: usize, len: usize) -> usize {
        debug_assert!(len <= self.cap);
        if len == 0 {
            return start;
        }
        let first = self.first_seg(start, len);
        ptr::drop_in_place(slice::from_raw_parts_mut(self.ptr_mut().add(start), first));
        if first < len {
            ptr::drop_in_place(slice::from_raw_parts_mut(self.ptr_mut(), len - first));
        }
        wrap_add(start, len, self.cap)
    }

    /// Copies a contiguous block of memory `len` long from `src` to `dst`.
    #[inline]
    pub unsafe fn copy(&mut self, dst: usize, src: usize, len: usize) {
        debug_assert!(
            dst + len <= self.cap,
            "cpy dst={} src={} len={} cap={}",
            dst,
            src,
            len,
            self.cap
        );
        debug_assert!(
            src + len <= self.cap,
            "cpy dst={} src={} len={} cap={}",
            dst,
            src,
            len,
            self.cap
        );
        ptr::copy(self.ptr().add(src), self.ptr_mut().add(dst), len);
    }

    /// Copies a potentially wrapping block of memory `len` long from `src`
    /// to `dst` within this block. The circular distance between `src` and
    /// `dst` plus `len` must be no larger than the capacity (there must be
    /// at most one continuous overlapping region between the two runs).
    pub unsafe fn wrap_copy(&mut self, dst: usize, src: usize, len: usize) {
        #[allow(dead_code)]
        fn diff(a: usize, b: usize) -> usize {
            if a <= b {
                b - a
            } else {
                a - b
            }
        }
        debug_assert!(
            diff(dst, src).min(self.cap - diff(dst, src)) + len <= self.cap,
            "wrc dst={} src={} len={} cap={}",
            dst,
            src,
            len,
            self.cap
        );

        if src == dst || len == 0 {
            return;
        }

        let dst_after_src = wrap_sub(dst, src, self.cap) < len;

        let src_pre_wrap_len = self.cap - src;
        let dst_pre_wrap_len = self.cap - dst;
        let src_wraps = src_pre_wrap_len < len;
        let dst_wraps = dst_pre_wrap_len < len;

        match (dst_after_src, src_wraps, dst_wraps) {
            (_, false, false) => {
                // src doesn't wrap, dst doesn't wrap
                //
                //        S . . .
                // 1 [_ _ A A B B C C _]
                // 2 [_ _ A A A A B B _]
                //            D . . .
                //
                self.copy(dst, src, len);
            }
            (false, false, true) => {
                // dst before src, src doesn't wrap, dst wraps
                //
                //    S . . .
                // 1 [A A B B _ _ _ C C]
                // 2 [A A B B _ _ _ A A]
                // 3 [B B B B _ _ _ A A]
                //    . .           D .
                //
                self.copy(dst, src, dst_pre_wrap_len);
                self.copy(0, src + dst_pre_wrap_len, len - dst_pre_wrap_len);
            }
            (true, false, true) => {
                // src before dst, src doesn't wrap, dst wraps
                //
                //              S . . .
                // 1 [C C _ _ _ A A B B]
                // 2 [B B _ _ _ A A B B]
                // 3 [B B _ _ _ A A A A]
                //    . .           D .
                //
                self.copy(0, src + dst_pre_wrap_len, len - dst_pre_wrap_len);
                self.copy(dst, src, dst_pre_wrap_len);
            }
            (false, true, false) => {
                // dst before src, src wraps, dst doesn't wrap
                //
                //    . .           S .
                // 1 [C C _ _ _ A A B B]
                // 2 [C C _ _ _ B B B B]
                // 3 [C C _ _ _ B B C C]
                //              D . . .
                //
                self.copy(dst, src, src_pre_wrap_len);
                self.copy(dst + src_pre_wrap_len, 0, len - src_pre_wrap_len);
            }
            (true, true, false) => {
                // src before dst, src wraps, dst doesn't wrap
                //
                //    . .           S .
                // 1 [A A B B _ _ _ C C]
                // 2 [A A A A _ _ _ C C]
                // 3 [C C A A _ _ _ C C]
                //    D . . .
                //
                self.copy(dst + src_pre_wrap_len, 0, len - src_pre_wrap_len);
                self.copy(dst, src, src_pre_wrap_len);
            }
            (false, true, true) => {
                // dst before src, src wraps, dst wraps
                //
                //    . . .         S .
                // 1 [A B C D _ E F G H]
                // 2 [A B C D _ E G H H]
                // 3 [A B C D _ E G H A]
                // 4 [B C C D _ E G H A]
                //    . .         D . .
                //
                debug_assert!(dst_pre_wrap_len > src_pre_wrap_len);
                let delta = dst_pre_wrap_len - src_pre_wrap_len;
                self.copy(dst, src, src_pre_wrap_len);
                self.copy(dst + src_pre_wrap_len, 0, delta);
                self.copy(0, delta, len - dst_pre_wrap_len);
            }
            (true, true, true) => {
                // src before dst, src wraps, dst wraps
                //
                //    . .         S . .
                // 1 [A B C D _ E F G H]
                // 2 [A A B D _ E F G H]
                // 3 [H A B D _ E F G H]
                // 4 [H A B D _ E F F G]
                //    . . .         D .
                //
                debug_assert!(src_pre_wrap_len > dst_pre_wrap_len);
                let delta = src_pre_wrap_len - dst_pre_wrap_len;
                self.copy(delta, 0, len - src_pre_wrap_len);
                self.copy(0, self.cap - delta, delta);
                self.copy(dst, src, dst_pre_wrap_len);
            }
        }
    }
}

impl<T> Drop for RawRing<T> {
    fn drop(&mut self) {
        if self.cap != 0 && mem::size_of::<T>() != 0 {
            // Layout::array succeeded at allocation time, so it cannot fail
            // here with the same capacity.
            let layout = Layout::array::<T>(self.cap).unwrap();
            unsafe { dealloc(self.ptr.as_ptr() as *mut u8, layout) }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn fill(ring: &mut RawRing<u32>, values: &[u32]) {
        for (offset, &value) in values.iter().enumerate() {
            unsafe { ring.write(offset, value) }
        }
    }

    fn snapshot(ring: &RawRing<u32>) -> Vec<u32> {
        unsafe { ring.as_slice().to_vec() }
    }

    #[test]
    fn write_run_splits_at_the_end() {
        let mut ring: RawRing<u32> = RawRing::with_capacity(8);
        fill(&mut ring, &[0; 8]);

        let mut source = [1, 2, 3, 4].into_iter();
        let end = unsafe { ring.write_run(6, 4, &mut source) };

        assert_eq!(end, 2);
        assert_eq!(snapshot(&ring), vec![3, 4, 0, 0, 0, 0, 1, 2]);
    }

    #[test]
    fn write_run_end_wraps_to_zero() {
        let mut ring: RawRing<u32> = RawRing::with_capacity(4);
        fill(&mut ring, &[0; 4]);

        let mut source = [7, 8].into_iter();
        let end = unsafe { ring.write_run(2, 2, &mut source) };

        assert_eq!(end, 0);
        assert_eq!(snapshot(&ring), vec![0, 0, 7, 8]);
    }

    #[test]
    fn move_run_between_blocks_with_both_sides_wrapping() {
        let mut src: RawRing<u32> = RawRing::with_capacity(4);
        fill(&mut src, &[3, 4, 1, 2]);
        let mut dst: RawRing<u32> = RawRing::with_capacity(8);
        fill(&mut dst, &[0; 8]);

        // Live run of 4 starting at physical 2 in src lands at physical 7.
        let end = unsafe { dst.move_run_from(7, &src, 2, 4) };

        assert_eq!(end, 3);
        assert_eq!(snapshot(&dst), vec![2, 3, 4, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn drop_run_tears_down_each_slot_once() {
        struct Bump<'a>(&'a Cell<i32>);

        impl<'a> Drop for Bump<'a> {
            fn drop(&mut self) {
                let n = self.0.get();
                self.0.set(n + 1);
            }
        }

        let flag = &Cell::new(0);
        let mut ring: RawRing<Bump> = RawRing::with_capacity(4);
        for offset in 0..4 {
            unsafe { ring.write(offset, Bump(flag)) }
        }

        let end = unsafe { ring.drop_run(3, 2) };
        assert_eq!(end, 1);
        assert_eq!(flag.get(), 2);

        let end = unsafe { ring.drop_run(1, 2) };
        assert_eq!(end, 3);
        assert_eq!(flag.get(), 4);
    }

    #[test]
    fn wrap_copy_shifts_across_the_seam() {
        let mut ring: RawRing<u32> = RawRing::with_capacity(8);
        fill(&mut ring, &[1, 2, 0, 0, 0, 0, 8, 9]);

        // Shift the wrapped run [8, 9, 1, 2] back by one slot.
        unsafe { ring.wrap_copy(5, 6, 4) };

        assert_eq!(&snapshot(&ring)[5..8], &[8, 9, 1]);
        assert_eq!(snapshot(&ring)[0], 2);
    }

    #[test]
    fn zero_capacity_never_allocates() {
        let ring: RawRing<u32> = RawRing::with_capacity(0);
        assert_eq!(ring.cap(), 0);
    }
}
