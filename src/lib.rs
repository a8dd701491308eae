//! A growable circular buffer.
//!
//! This queue has `O(1)` amortized inserts and removals from both ends of
//! the container, and `O(1)` indexing like a vector. Elements are kept in a
//! single heap block addressed through wrap-around indices, so front
//! operations never shift the whole contents. The contained elements are not
//! required to be copyable.
//!
//! # Capacity
//!
//! The backing block holds exactly `capacity()` elements; unlike a classic
//! one-slot-sentinel ring, a full buffer uses every slot. When a write finds
//! the buffer full it reallocates under the *smart* capacity policy:
//! power-of-two sizes starting at 4, doubling on growth. Shrinking is never
//! implicit; call [`RingBuffer::shrink`] after removals, which under the
//! smart policy only reallocates once usage has fallen to a quarter of
//! capacity. See [`CapacityPolicy`].
//!
//! # Thread safety
//!
//! A `RingBuffer` is a plain single-threaded container: it is `Send` and
//! `Sync` exactly when `T` is, and concurrent access requires external
//! synchronization like any `&mut`-mutated structure.
//!
//! # Usage
//!
//! First, add the following to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! ringdeque = "0.1"
//! ```
//!
//! # Examples
//! ```
//! use ringdeque::RingBuffer;
//!
//! let mut vector: RingBuffer<_> = RingBuffer::new();
//!
//! vector.push_back(1);
//! vector.push_back(2);
//! assert_eq!(vector.len(), 2);
//!
//! assert_eq!(vector.pop_front(), Some(1));
//! assert_eq!(vector.pop_front(), Some(2));
//! assert_eq!(vector.pop_front(), None);
//! ```
//!
//! # Insert & Remove
//! ```
//! use ringdeque::RingBuffer;
//!
//! let mut vector: RingBuffer<_> = RingBuffer::new();
//!
//! vector.push_back(11);
//! vector.push_back(13);
//! vector.insert(1, 12);
//! vector.remove(0);
//!
//! assert_eq!(vector[0], 12);
//! assert_eq!(vector[1], 13);
//! ```
//!
//! # Append & Extend
//! ```
//! use ringdeque::RingBuffer;
//!
//! let mut vector: RingBuffer<_> = (0..5).collect();
//! let mut vector2: RingBuffer<_> = (5..7).collect();
//!
//! vector.append(&mut vector2);
//!
//! assert_eq!(format!("{:?}", vector), "[0, 1, 2, 3, 4, 5, 6]");
//! assert_eq!(format!("{:?}", vector2), "[]");
//! ```
//!
//! # Iterator
//! ```
//! use ringdeque::RingBuffer;
//!
//! let vector: RingBuffer<_> = (0..5).collect();
//!
//! let iters: Vec<_> = vector.into_iter().collect();
//! assert_eq!(iters, vec![0, 1, 2, 3, 4]);
//! ```

#![deny(missing_docs)]

use std::cmp::Ordering;
use std::convert::Infallible;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

pub use odds::IndexRange as RangeArgument;

mod policy;
mod raw;
mod utils;

pub use policy::{
    grow_capacity, normalize_capacity, shrink_candidate, CapacityPolicy, MIN_SMART_CAPACITY,
};

use raw::RawRing;
use utils::{wrap_add, wrap_offset, wrap_sub};

/// A growable ring buffer.
///
/// The "default" usage of this type as a queue is to use `push_back` to add
/// to the queue, and `pop_front` to remove from the queue. `extend` and
/// `append` push onto the back in this manner, and iterating over
/// `RingBuffer` goes front to back.
///
/// # Capacity
///
/// The buffer grows on demand under the smart capacity policy (powers of
/// two, minimum 4, doubling). It never shrinks on its own; see
/// [`RingBuffer::shrink`].
pub struct RingBuffer<T> {
    buf: RawRing<T>,
    head: usize,
    len: usize,
}

impl<T> RingBuffer<T> {
    #[inline]
    fn cap(&self) -> usize {
        self.buf.cap()
    }

    /// Physical index one past the last live element. Wraps to 0, and is 0
    /// for a capacity-0 buffer.
    #[inline]
    fn tail(&self) -> usize {
        if self.cap() == 0 {
            0
        } else {
            wrap_add(self.head, self.len, self.cap())
        }
    }

    /// Physical slot of the element at a logical position. The capacity
    /// must be non-zero.
    #[inline]
    fn physical(&self, logical: usize) -> usize {
        wrap_add(self.head, logical, self.cap())
    }

    #[inline]
    fn is_contiguous(&self) -> bool {
        self.head + self.len <= self.cap()
    }

    /// Moves every live element into a new block of `new_cap` slots,
    /// starting at physical 0. `new_cap` must hold `len` elements.
    fn realloc_to(&mut self, new_cap: usize) {
        debug_assert!(new_cap >= self.len);
        let mut new_buf = RawRing::with_capacity(new_cap);
        unsafe {
            new_buf.move_run_from(0, &self.buf, self.head, self.len);
        }
        self.buf = new_buf;
        self.head = 0;
    }

    #[inline]
    fn grow_for_push(&mut self) {
        let new_cap = grow_capacity(self.cap());
        self.realloc_to(new_cap);
    }

    fn reserve_with(&mut self, additional: usize, policy: CapacityPolicy) {
        if self.remaining_capacity() >= additional {
            return;
        }
        let needed = match self.len.checked_add(additional) {
            Some(needed) => needed,
            None => panic!("capacity overflow"),
        };
        self.realloc_to(normalize_capacity(needed, policy));
    }
}

impl<T> RingBuffer<T> {
    /// Creates an empty `RingBuffer` without allocating.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let vector: RingBuffer<usize> = RingBuffer::new();
    /// assert_eq!(vector.capacity(), 0);
    /// ```
    #[inline]
    pub fn new() -> Self {
        RingBuffer {
            buf: RawRing::with_capacity(0),
            head: 0,
            len: 0,
        }
    }

    /// Creates an empty `RingBuffer` able to hold at least `n` elements,
    /// sized under the smart capacity policy.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let vector: RingBuffer<usize> = RingBuffer::with_capacity(9);
    /// assert_eq!(vector.capacity(), 16);
    /// ```
    #[inline]
    pub fn with_capacity(n: usize) -> Self {
        Self::with_capacity_policy(n, CapacityPolicy::Smart)
    }

    /// Creates an empty `RingBuffer` with its capacity sized under the
    /// given policy; [`CapacityPolicy::Exact`] allocates precisely `n`
    /// slots.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::{CapacityPolicy, RingBuffer};
    ///
    /// let vector: RingBuffer<usize> =
    ///     RingBuffer::with_capacity_policy(9, CapacityPolicy::Exact);
    /// assert_eq!(vector.capacity(), 9);
    /// ```
    #[inline]
    pub fn with_capacity_policy(n: usize, policy: CapacityPolicy) -> Self {
        RingBuffer {
            buf: RawRing::with_capacity(normalize_capacity(n, policy)),
            head: 0,
            len: 0,
        }
    }

    /// Creates a `RingBuffer` holding `n` clones of `element`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let vector = RingBuffer::from_elem(7, 3);
    /// assert_eq!(vector, vec![7, 7, 7]);
    /// ```
    pub fn from_elem(element: T, n: usize) -> Self
    where
        T: Clone,
    {
        let mut buffer = Self::with_capacity(n);
        buffer.extend(iter::repeat(element).take(n));
        buffer
    }

    /// Returns an independent copy of this buffer with room for at least
    /// `extra` additional elements beyond the current contents.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let vector: RingBuffer<_> = (0..5).collect();
    /// let copy = vector.clone_with_capacity(20);
    ///
    /// assert_eq!(copy, vector);
    /// assert!(copy.remaining_capacity() >= 20);
    /// ```
    pub fn clone_with_capacity(&self, extra: usize) -> Self
    where
        T: Clone,
    {
        let wanted = match self.len.checked_add(extra) {
            Some(wanted) => wanted,
            None => panic!("capacity overflow"),
        };
        let mut copy = Self::with_capacity(wanted);
        copy.extend(self.iter().cloned());
        copy
    }

    /// Returns the number of elements in the `RingBuffer`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut v: RingBuffer<_> = RingBuffer::new();
    /// assert_eq!(v.len(), 0);
    /// v.push_back(1);
    /// assert_eq!(v.len(), 1);
    /// ```
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the buffer contains no elements.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut v: RingBuffer<_> = RingBuffer::new();
    /// assert!(v.is_empty());
    /// v.push_front(1);
    /// assert!(!v.is_empty());
    /// ```
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of slots in the backing block.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let vector: RingBuffer<usize> = RingBuffer::with_capacity(5);
    /// assert_eq!(vector.capacity(), 8);
    /// ```
    #[inline]
    pub fn capacity(&self) -> usize {
        self.cap()
    }

    /// Returns true if every slot of the backing block is live; the next
    /// write to either end will reallocate.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut buf: RingBuffer<_> = RingBuffer::with_capacity(4);
    /// buf.extend(0..4);
    ///
    /// assert!(buf.is_full());
    /// ```
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.cap()
    }

    /// Returns the number of additional elements the buffer can take
    /// without reallocating.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut buf: RingBuffer<_> = RingBuffer::with_capacity(8);
    /// buf.extend(0..3);
    ///
    /// assert_eq!(buf.remaining_capacity(), 5);
    /// ```
    #[inline]
    pub fn remaining_capacity(&self) -> usize {
        self.cap() - self.len
    }

    /// Retrieves an element in the `RingBuffer` by index.
    ///
    /// Element at index 0 is the front of the queue.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let deque: RingBuffer<_> = (3..6).collect();
    /// assert_eq!(deque.get(1), Some(&4));
    /// assert_eq!(deque.get(3), None);
    /// ```
    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        if index < self.len {
            let idx = self.physical(index);
            unsafe { Some(&*self.buf.ptr().add(idx)) }
        } else {
            None
        }
    }

    /// Retrieves an element in the `RingBuffer` mutably by index.
    ///
    /// Element at index 0 is the front of the queue.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut deque: RingBuffer<_> = (3..6).collect();
    /// if let Some(elem) = deque.get_mut(1) {
    ///     *elem = 7;
    /// }
    ///
    /// assert_eq!(deque[1], 7);
    /// ```
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index < self.len {
            let idx = self.physical(index);
            unsafe { Some(&mut *self.buf.ptr_mut().add(idx)) }
        } else {
            None
        }
    }

    /// Provides a reference to the front element, or `None` if the buffer
    /// is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut deque: RingBuffer<_> = RingBuffer::new();
    /// assert_eq!(deque.front(), None);
    /// deque.push_back(1);
    /// deque.push_back(2);
    /// assert_eq!(deque.front(), Some(&1));
    /// ```
    #[inline]
    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    /// Provides a mutable reference to the front element, or `None` if the
    /// buffer is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut deque: RingBuffer<_> = vec![1, 2].into();
    /// if let Some(x) = deque.front_mut() {
    ///     *x = 9;
    /// }
    /// assert_eq!(deque, vec![9, 2]);
    /// ```
    #[inline]
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.get_mut(0)
    }

    /// Provides a reference to the back element, or `None` if the buffer is
    /// empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut deque: RingBuffer<_> = RingBuffer::new();
    /// assert_eq!(deque.back(), None);
    /// deque.push_back(1);
    /// deque.push_back(2);
    /// assert_eq!(deque.back(), Some(&2));
    /// ```
    #[inline]
    pub fn back(&self) -> Option<&T> {
        if self.len == 0 {
            None
        } else {
            self.get(self.len - 1)
        }
    }

    /// Provides a mutable reference to the back element, or `None` if the
    /// buffer is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut deque: RingBuffer<_> = vec![1, 2].into();
    /// if let Some(x) = deque.back_mut() {
    ///     *x = 9;
    /// }
    /// assert_eq!(deque, vec![1, 9]);
    /// ```
    #[inline]
    pub fn back_mut(&mut self) -> Option<&mut T> {
        if self.len == 0 {
            None
        } else {
            self.get_mut(self.len - 1)
        }
    }

    /// Returns `true` if the `RingBuffer` contains an element equal to the
    /// given value.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let vector: RingBuffer<_> = (0..2).collect();
    ///
    /// assert_eq!(vector.contains(&1), true);
    /// assert_eq!(vector.contains(&10), false);
    /// ```
    pub fn contains(&self, x: &T) -> bool
    where
        T: PartialEq<T>,
    {
        let (a, b) = self.as_slices();
        a.contains(x) || b.contains(x)
    }

    /// Returns a front-to-back iterator.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let deque: RingBuffer<_> = vec![5, 3, 4].into();
    /// let b: &[_] = &[&5, &3, &4];
    /// let c: Vec<&i32> = deque.iter().collect();
    /// assert_eq!(&c[..], b);
    /// ```
    #[inline]
    pub fn iter(&self) -> Iter<T> {
        Iter {
            ring: self.buf.ptr(),
            cap: self.cap(),
            head: self.head,
            len: self.len,
            _marker: PhantomData,
        }
    }

    /// Returns a front-to-back iterator that returns mutable references.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut deque: RingBuffer<_> = vec![5, 3, 4].into();
    /// for num in deque.iter_mut() {
    ///     *num = *num - 2;
    /// }
    /// assert_eq!(deque, vec![3, 1, 2]);
    /// ```
    #[inline]
    pub fn iter_mut(&mut self) -> IterMut<T> {
        IterMut {
            ring: self.buf.ptr_mut(),
            cap: self.cap(),
            head: self.head,
            len: self.len,
            _marker: PhantomData,
        }
    }

    /// Returns a pair of slices which contain, in order, the contents of
    /// the `RingBuffer`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut vector: RingBuffer<_> = RingBuffer::with_capacity(6);
    ///
    /// vector.push_back(0);
    /// vector.push_back(1);
    /// vector.push_back(2);
    ///
    /// assert_eq!(vector.as_slices(), (&[0, 1, 2][..], &[][..]));
    ///
    /// vector.push_front(10);
    /// vector.push_front(9);
    ///
    /// assert_eq!(vector.as_slices(), (&[9, 10][..], &[0, 1, 2][..]));
    /// ```
    #[inline]
    pub fn as_slices(&self) -> (&[T], &[T]) {
        if self.len == 0 {
            return (&[], &[]);
        }
        let head = self.head;
        let len = self.len;
        let cap = self.cap();
        unsafe {
            let buf = self.buf.as_slice();
            if head + len <= cap {
                (&buf[head..head + len], &[])
            } else {
                (&buf[head..], &buf[..head + len - cap])
            }
        }
    }

    /// Returns a pair of mutable slices which contain, in order, the
    /// contents of the `RingBuffer`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut vector: RingBuffer<_> = RingBuffer::with_capacity(4);
    ///
    /// vector.push_back(0);
    /// vector.push_back(1);
    /// vector.push_front(10);
    /// vector.push_front(9);
    ///
    /// vector.as_mut_slices().0[0] = 42;
    /// vector.as_mut_slices().1[0] = 24;
    /// assert_eq!(vector.as_slices(), (&[42, 10][..], &[24, 1][..]));
    /// ```
    #[inline]
    pub fn as_mut_slices(&mut self) -> (&mut [T], &mut [T]) {
        if self.len == 0 {
            return (&mut [], &mut []);
        }
        let head = self.head;
        let len = self.len;
        let cap = self.cap();
        unsafe {
            let buf = self.buf.as_mut_slice();
            if head + len <= cap {
                (&mut buf[head..head + len], &mut [])
            } else {
                let (front, back) = buf.split_at_mut(head);
                (back, &mut front[..head + len - cap])
            }
        }
    }

    /// Rearranges the contents into one contiguous physical run and returns
    /// it as a single mutable slice.
    ///
    /// Once the borrow ends the buffer may be mutated again, which can
    /// split the contents across the seam once more.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut deque: RingBuffer<_> = RingBuffer::with_capacity(4);
    /// deque.push_back(2);
    /// deque.push_back(3);
    /// deque.push_front(1);
    ///
    /// deque.make_contiguous().sort();
    /// assert_eq!(deque.as_slices(), (&[1, 2, 3][..], &[][..]));
    /// ```
    pub fn make_contiguous(&mut self) -> &mut [T] {
        if !self.is_contiguous() {
            // One segmented move into a fresh block of the same capacity.
            let cap = self.cap();
            self.realloc_to(cap);
        }
        let head = self.head;
        let len = self.len;
        unsafe { &mut self.buf.as_mut_slice()[head..head + len] }
    }

    /// Appends an element to the back of the buffer, reallocating if it is
    /// full.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut buf: RingBuffer<_> = RingBuffer::new();
    /// buf.push_back(1);
    /// buf.push_back(3);
    /// assert_eq!(buf.back(), Some(&3));
    /// ```
    pub fn push_back(&mut self, element: T) {
        if self.is_full() {
            self.grow_for_push();
        }
        let tail = self.tail();
        unsafe {
            self.buf.write(tail, element);
        }
        self.len += 1;
    }

    /// Prepends an element to the front of the buffer, reallocating if it
    /// is full.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut buf: RingBuffer<_> = RingBuffer::new();
    /// buf.push_back(1);
    /// buf.push_front(2);
    /// assert_eq!(buf.front(), Some(&2));
    /// ```
    pub fn push_front(&mut self, element: T) {
        if self.is_full() {
            self.grow_for_push();
        }
        let new_head = wrap_sub(self.head, 1, self.cap());
        unsafe {
            self.buf.write(new_head, element);
        }
        self.head = new_head;
        self.len += 1;
    }

    /// Removes the first element and returns it, or `None` if the buffer is
    /// empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut buf: RingBuffer<_> = (1..3).collect();
    ///
    /// assert_eq!(buf.pop_front(), Some(1));
    /// assert_eq!(buf.pop_front(), Some(2));
    /// assert_eq!(buf.pop_front(), None);
    /// ```
    pub fn pop_front(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let head = self.head;
        self.head = wrap_add(head, 1, self.cap());
        self.len -= 1;
        unsafe { Some(self.buf.read(head)) }
    }

    /// Removes the last element and returns it, or `None` if the buffer is
    /// empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut buf: RingBuffer<_> = (1..3).collect();
    ///
    /// assert_eq!(buf.pop_back(), Some(2));
    /// assert_eq!(buf.pop_back(), Some(1));
    /// assert_eq!(buf.pop_back(), None);
    /// ```
    pub fn pop_back(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let slot = wrap_sub(self.tail(), 1, self.cap());
        self.len -= 1;
        unsafe { Some(self.buf.read(slot)) }
    }

    /// Inserts an element at `index` within the buffer, shifting whichever
    /// side is shorter.
    ///
    /// Element at index 0 is the front of the queue.
    ///
    /// # Panics
    ///
    /// Panics if `index` is greater than the buffer's length.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut buf: RingBuffer<_> = RingBuffer::new();
    /// buf.push_back('a');
    /// buf.push_back('c');
    /// buf.insert(1, 'b');
    ///
    /// assert_eq!(buf, vec!['a', 'b', 'c']);
    /// ```
    pub fn insert(&mut self, index: usize, element: T) {
        assert!(
            index <= self.len,
            "index out of bounds: the len is {} but the index is {}",
            self.len,
            index
        );
        if index == 0 {
            return self.push_front(element);
        }
        if index == self.len {
            return self.push_back(element);
        }
        if self.is_full() {
            self.grow_for_push();
        }
        let cap = self.cap();
        if index < self.len - index {
            // front run is shorter: pull it back one slot
            let new_head = wrap_sub(self.head, 1, cap);
            unsafe {
                self.buf.wrap_copy(new_head, self.head, index);
            }
            self.head = new_head;
        } else {
            // back run is shorter: push it forward one slot
            let src = wrap_add(self.head, index, cap);
            let dst = wrap_add(src, 1, cap);
            unsafe {
                self.buf.wrap_copy(dst, src, self.len - index);
            }
        }
        let slot = self.physical(index);
        unsafe {
            self.buf.write(slot, element);
        }
        self.len += 1;
    }

    /// Inserts every element of `sequence` at `index`, preserving their
    /// order, so the first inserted element ends up at `index`.
    ///
    /// When the batch fits the current capacity, the trailing run is parked
    /// in a scratch block while the batch is constructed in place;
    /// otherwise prefix, batch and suffix are assembled in a single pass
    /// into a freshly sized block.
    ///
    /// # Panics
    ///
    /// Panics if `index` is greater than the buffer's length.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut buf: RingBuffer<_> = vec![1, 5].into();
    /// buf.insert_many(1, vec![2, 3, 4]);
    ///
    /// assert_eq!(buf, vec![1, 2, 3, 4, 5]);
    /// ```
    pub fn insert_many<I>(&mut self, index: usize, sequence: I)
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        assert!(
            index <= self.len,
            "index out of bounds: the len is {} but the index is {}",
            self.len,
            index
        );
        if index == 0 {
            return self.extend_front(sequence);
        }
        if index == self.len {
            return self.extend(sequence);
        }
        let mut source = sequence.into_iter();
        let n = source.len();
        if n == 0 {
            return;
        }
        let len = self.len;
        let trailing = len - index;
        let split = self.physical(index);
        if len + n <= self.cap() {
            let mut scratch = RawRing::with_capacity(trailing);
            // Only the prefix is tracked while slots are in flight, so a
            // panicking source iterator leaks instead of double-freeing.
            self.len = index;
            unsafe {
                scratch.move_run_from(0, &self.buf, split, trailing);
                let end = self.buf.write_run(split, n, &mut source);
                self.buf.move_run_from(end, &scratch, 0, trailing);
            }
            self.len = len + n;
        } else {
            let new_len = match len.checked_add(n) {
                Some(new_len) => new_len,
                None => panic!("capacity overflow"),
            };
            let mut new_buf =
                RawRing::with_capacity(normalize_capacity(new_len, CapacityPolicy::Smart));
            let head = self.head;
            self.len = 0;
            unsafe {
                let mut end = new_buf.move_run_from(0, &self.buf, head, index);
                end = new_buf.write_run(end, n, &mut source);
                new_buf.move_run_from(end, &self.buf, split, trailing);
            }
            self.buf = new_buf;
            self.head = 0;
            self.len = new_len;
        }
    }

    /// Prepends every element of `sequence`, preserving their order, so the
    /// first element of the sequence becomes the new front.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut buf: RingBuffer<_> = vec![3, 4].into();
    /// buf.extend_front(vec![1, 2]);
    ///
    /// assert_eq!(buf, vec![1, 2, 3, 4]);
    /// ```
    pub fn extend_front<I>(&mut self, sequence: I)
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        let mut source = sequence.into_iter();
        let n = source.len();
        if n == 0 {
            return;
        }
        if self.len + n <= self.cap() {
            let start = wrap_sub(self.head, n, self.cap());
            unsafe {
                self.buf.write_run(start, n, &mut source);
            }
            self.head = start;
            self.len += n;
        } else {
            let new_len = match self.len.checked_add(n) {
                Some(new_len) => new_len,
                None => panic!("capacity overflow"),
            };
            let mut new_buf =
                RawRing::with_capacity(normalize_capacity(new_len, CapacityPolicy::Smart));
            unsafe {
                // The fallible construction happens before any element is
                // moved out, so a panicking iterator leaves `self` intact.
                let end = new_buf.write_run(0, n, &mut source);
                new_buf.move_run_from(end, &self.buf, self.head, self.len);
            }
            self.buf = new_buf;
            self.head = 0;
            self.len = new_len;
        }
    }

    /// Removes and returns the element at `index` from the buffer, shifting
    /// whichever side is shorter into the gap. Returns `None` if `index` is
    /// out of bounds.
    ///
    /// Element at index 0 is the front of the queue.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut buf: RingBuffer<_> = vec![1, 2, 3].into();
    ///
    /// assert_eq!(buf.remove(1), Some(2));
    /// assert_eq!(buf, vec![1, 3]);
    /// ```
    pub fn remove(&mut self, index: usize) -> Option<T> {
        if index >= self.len {
            return None;
        }
        let cap = self.cap();
        let slot = self.physical(index);
        let element = unsafe { self.buf.read(slot) };
        if index < self.len - index - 1 {
            // front run is shorter: push it forward into the gap
            let dst = wrap_add(self.head, 1, cap);
            unsafe {
                self.buf.wrap_copy(dst, self.head, index);
            }
            self.head = dst;
        } else {
            // back run is shorter: pull it back into the gap
            let src = wrap_add(slot, 1, cap);
            unsafe {
                self.buf.wrap_copy(slot, src, self.len - index - 1);
            }
        }
        self.len -= 1;
        Some(element)
    }

    /// Creates a draining iterator that removes the specified range of the
    /// `RingBuffer` and yields the removed items front to back.
    ///
    /// The capacity is kept; apply [`RingBuffer::shrink`] afterwards to
    /// give memory back.
    ///
    /// Note 1: The element range is removed even if the iterator is not
    /// consumed until the end.
    ///
    /// Note 2: It is unspecified how many elements are removed from the
    /// buffer, if the `Drain` value is not dropped, but the borrow it holds
    /// expires (eg. due to mem::forget).
    ///
    /// # Panics
    ///
    /// Panics if the starting point is greater than the end point or if the
    /// end point is greater than the length of the buffer.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut deque: RingBuffer<_> = vec![1, 2, 3].into();
    /// let drain1: Vec<_> = deque.drain(2..).collect();
    /// assert_eq!(drain1, vec![3]);
    ///
    /// let drain2: Vec<_> = deque.drain(..).collect();
    /// assert_eq!(drain2, vec![1, 2]);
    /// assert!(deque.is_empty());
    /// ```
    pub fn drain<R>(&mut self, range: R) -> Drain<T>
    where
        R: RangeArgument<usize>,
    {
        let len = self.len;
        let start = range.start().unwrap_or(0);
        let end = range.end().unwrap_or(len);
        assert!(start <= end, "drain lower bound was too large");
        assert!(end <= len, "drain upper bound was too large");

        // Only the prefix stays tracked while the drain is live: a leaked
        // `Drain` then leaks the rest instead of double-dropping what it
        // already yielded.
        self.len = start;

        Drain {
            ring: self as *mut _,
            orig_len: len,
            drain_start: start,
            drain_len: end - start,
            index: start,
            back_index: end,
            _marker: PhantomData,
        }
    }

    /// Clears the buffer, removing all values. The capacity is kept.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut v: RingBuffer<_> = RingBuffer::new();
    /// v.push_back(1);
    /// v.clear();
    /// assert!(v.is_empty());
    /// ```
    #[inline]
    pub fn clear(&mut self) {
        let head = self.head;
        let len = self.len;
        self.head = 0;
        self.len = 0;
        if len > 0 {
            unsafe {
                self.buf.drop_run(head, len);
            }
        }
    }

    /// Replaces the elements in `range` with the elements of
    /// `replace_with`, generalizing insertion (empty range) and removal
    /// (empty replacement).
    ///
    /// # Panics
    ///
    /// Panics if the range is inverted or reaches past the end of the
    /// buffer.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut buf: RingBuffer<_> = vec![1, 8, 9, 4].into();
    /// buf.replace_range(1..3, vec![2, 3]);
    ///
    /// assert_eq!(buf, vec![1, 2, 3, 4]);
    /// ```
    pub fn replace_range<R, I>(&mut self, range: R, replace_with: I)
    where
        R: RangeArgument<usize>,
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        let len = self.len;
        let start = range.start().unwrap_or(0);
        let end = range.end().unwrap_or(len);
        assert!(start <= end, "replace_range lower bound was too large");
        assert!(end <= len, "replace_range upper bound was too large");

        let mut source = replace_with.into_iter();
        let n = source.len();
        let removed = end - start;
        let trailing = len - end;
        let new_len = len - removed + n;

        if new_len == 0 {
            return self.clear();
        }
        if removed == 0 && n == 0 {
            return;
        }

        if new_len <= self.cap() {
            let cap = self.cap();
            let gap = self.physical(start);
            let old_suffix = if trailing > 0 { self.physical(end) } else { 0 };
            // Park the suffix while slots are being rearranged; a panicking
            // source iterator leaks it but leaves the prefix valid.
            self.len = start;
            unsafe {
                self.buf.drop_run(gap, removed);
                if trailing > 0 {
                    let delta = n as isize - removed as isize;
                    if delta != 0 {
                        let dst = wrap_offset(old_suffix, delta, cap);
                        self.buf.wrap_copy(dst, old_suffix, trailing);
                    }
                }
                self.buf.write_run(gap, n, &mut source);
            }
            self.len = new_len;
        } else {
            let cap = self.cap();
            let head = self.head;
            let mut new_buf =
                RawRing::with_capacity(normalize_capacity(new_len, CapacityPolicy::Smart));
            self.len = 0;
            unsafe {
                if removed > 0 {
                    self.buf.drop_run(wrap_add(head, start, cap), removed);
                }
                let mut at = new_buf.move_run_from(0, &self.buf, head, start);
                at = new_buf.write_run(at, n, &mut source);
                if trailing > 0 {
                    new_buf.move_run_from(at, &self.buf, wrap_add(head, end, cap), trailing);
                }
            }
            self.buf = new_buf;
            self.head = 0;
            self.len = new_len;
        }
    }

    /// Ensures the buffer can take at least `additional` more elements
    /// without reallocating, growing to a smart-policy capacity if not.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut buf: RingBuffer<i32> = RingBuffer::new();
    /// buf.reserve(10);
    /// assert!(buf.remaining_capacity() >= 10);
    /// ```
    #[inline]
    pub fn reserve(&mut self, additional: usize) {
        self.reserve_with(additional, CapacityPolicy::Smart);
    }

    /// Ensures the buffer can take at least `additional` more elements,
    /// growing to exactly `len + additional` slots if not.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut buf: RingBuffer<i32> = RingBuffer::new();
    /// buf.reserve_exact(10);
    /// assert_eq!(buf.capacity(), 10);
    /// ```
    #[inline]
    pub fn reserve_exact(&mut self, additional: usize) {
        self.reserve_with(additional, CapacityPolicy::Exact);
    }

    /// Gives memory back when the chosen policy proposes a smaller capacity
    /// for the current length; otherwise does nothing.
    ///
    /// Under [`CapacityPolicy::Smart`] the proposal only comes once usage
    /// has fallen to a quarter of capacity, so alternating workloads near a
    /// capacity boundary do not thrash the allocator.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::{CapacityPolicy, RingBuffer};
    ///
    /// let mut buf: RingBuffer<_> = (0..32).collect();
    /// buf.drain(4..);
    ///
    /// buf.shrink(CapacityPolicy::Smart);
    /// assert_eq!(buf.capacity(), 4);
    /// ```
    pub fn shrink(&mut self, policy: CapacityPolicy) {
        if let Some(target) = shrink_candidate(self.len, self.cap(), policy) {
            self.realloc_to(target);
        }
    }

    /// Shrinks the backing block to exactly the current length.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut buf: RingBuffer<_> = (0..5).collect();
    /// assert_eq!(buf.capacity(), 8);
    ///
    /// buf.shrink_to_fit();
    /// assert_eq!(buf.capacity(), 5);
    /// ```
    #[inline]
    pub fn shrink_to_fit(&mut self) {
        self.shrink(CapacityPolicy::Exact);
    }

    /// Moves all the elements of `other` into the back of `self`, leaving
    /// `other` empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut buf: RingBuffer<_> = (0..5).collect();
    /// let mut buf2: RingBuffer<_> = (5..7).collect();
    ///
    /// buf.append(&mut buf2);
    ///
    /// assert_eq!(buf, vec![0, 1, 2, 3, 4, 5, 6]);
    /// assert!(buf2.is_empty());
    /// ```
    pub fn append(&mut self, other: &mut Self) {
        let n = other.len;
        if n == 0 {
            return;
        }
        self.reserve(n);
        let tail = self.tail();
        unsafe {
            self.buf.move_run_from(tail, &other.buf, other.head, n);
        }
        other.head = 0;
        other.len = 0;
        self.len += n;
    }

    /// Retains only the elements specified by the predicate, visiting front
    /// to back and keeping the survivors in order.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut buf: RingBuffer<_> = (0..8).collect();
    /// buf.retain(|x| x % 2 == 0);
    ///
    /// assert_eq!(buf, vec![0, 2, 4, 6]);
    /// ```
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&T) -> bool,
    {
        let result: Result<(), Infallible> = self.try_retain(|element| Ok(f(element)));
        match result {
            Ok(()) => {}
            Err(never) => match never {},
        }
    }

    /// Retains only the elements for which the predicate returns
    /// `Ok(true)`, visiting front to back.
    ///
    /// If the predicate returns `Err`, the scan stops and the error
    /// propagates. Elements it had already rejected stay removed; the
    /// element it failed on and everything after it stay in the buffer, so
    /// the buffer is valid but partially filtered.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringdeque::RingBuffer;
    ///
    /// let mut buf: RingBuffer<_> = (1..7).collect();
    /// let result = buf.try_retain(|&x| if x == 4 { Err("boom") } else { Ok(x % 2 == 0) });
    ///
    /// assert_eq!(result, Err("boom"));
    /// assert_eq!(buf, vec![2, 4, 5, 6]);
    /// ```
    pub fn try_retain<F, E>(&mut self, mut f: F) -> Result<(), E>
    where
        F: FnMut(&T) -> Result<bool, E>,
    {
        let len = self.len;
        if len == 0 {
            return Ok(());
        }
        let cap = self.cap();
        let head = self.head;
        // Nothing is tracked while the scan rearranges slots; a panicking
        // predicate leaks the contents but leaves a valid empty buffer.
        self.len = 0;
        let mut kept = 0;
        let mut failure = None;
        let mut stopped_at = len;
        for logical in 0..len {
            let slot = wrap_add(head, logical, cap);
            let verdict = f(unsafe { &*self.buf.ptr().add(slot) });
            match verdict {
                Ok(true) => {
                    if kept != logical {
                        unsafe {
                            let element = self.buf.read(slot);
                            self.buf.write(wrap_add(head, kept, cap), element);
                        }
                    }
                    kept += 1;
                }
                Ok(false) => unsafe {
                    drop(self.buf.read(slot));
                },
                Err(error) => {
                    failure = Some(error);
                    stopped_at = logical;
                    break;
                }
            }
        }
        // The unvisited suffix, including the element the predicate failed
        // on, survives; close the gap left by the rejected elements.
        let suffix = len - stopped_at;
        if suffix > 0 && kept != stopped_at {
            unsafe {
                self.buf.wrap_copy(
                    wrap_add(head, kept, cap),
                    wrap_add(head, stopped_at, cap),
                    suffix,
                );
            }
        }
        self.len = kept + suffix;
        match failure {
            None => Ok(()),
            Some(error) => Err(error),
        }
    }
}

impl<T: Clone> Clone for RingBuffer<T> {
    fn clone(&self) -> Self {
        self.iter().cloned().collect()
    }
}

impl<T> Drop for RingBuffer<T> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T> Default for RingBuffer<T> {
    #[inline]
    fn default() -> Self {
        RingBuffer::new()
    }
}

impl<T: PartialEq> PartialEq for RingBuffer<T> {
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().zip(other.iter()).all(|(l, r)| l == r)
    }
}

#[cfg(test)]
impl<'a, T: PartialEq> PartialEq<&'a [T]> for RingBuffer<T> {
    fn eq(&self, other: &&'a [T]) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().zip(other.iter()).all(|(l, r)| l == r)
    }
}

impl<T: PartialEq> PartialEq<Vec<T>> for RingBuffer<T> {
    fn eq(&self, other: &Vec<T>) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().zip(other.iter()).all(|(l, r)| l == r)
    }
}

impl<T: Eq> Eq for RingBuffer<T> {}

impl<T: PartialOrd> PartialOrd for RingBuffer<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}

impl<T: Ord> Ord for RingBuffer<T> {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

impl<T: Hash> Hash for RingBuffer<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        let (a, b) = self.as_slices();
        Hash::hash_slice(a, state);
        Hash::hash_slice(b, state);
    }
}

impl<T> Index<usize> for RingBuffer<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &T {
        let len = self.len();
        match self.get(index) {
            Some(element) => element,
            None => panic!(
                "index out of bounds: the len is {} but the index is {}",
                len, index
            ),
        }
    }
}

impl<T> IndexMut<usize> for RingBuffer<T> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.len();
        match self.get_mut(index) {
            Some(element) => element,
            None => panic!(
                "index out of bounds: the len is {} but the index is {}",
                len, index
            ),
        }
    }
}

impl<T> iter::FromIterator<T> for RingBuffer<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let source = iter.into_iter();
        let (lower, _) = source.size_hint();
        let mut buffer = RingBuffer::with_capacity(lower);
        buffer.extend(source);
        buffer
    }
}

impl<T> From<Vec<T>> for RingBuffer<T> {
    fn from(vec: Vec<T>) -> Self {
        vec.into_iter().collect()
    }
}

impl<'a, T: Clone> From<&'a [T]> for RingBuffer<T> {
    fn from(slice: &'a [T]) -> Self {
        slice.iter().cloned().collect()
    }
}

impl<T> IntoIterator for RingBuffer<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter { inner: self }
    }
}

impl<'a, T> IntoIterator for &'a RingBuffer<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut RingBuffer<T> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// Extend the `RingBuffer` with an iterator, growing as needed.
impl<T> Extend<T> for RingBuffer<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let source = iter.into_iter();
        let (lower, _) = source.size_hint();
        self.reserve(lower);
        for element in source {
            self.push_back(element);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for RingBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self).finish()
    }
}

/// `RingBuffer` iterator
#[must_use = "iterator adaptors are lazy and do nothing unless consumed"]
pub struct Iter<'a, T: 'a> {
    ring: *const T,
    cap: usize,
    head: usize,
    len: usize,
    _marker: PhantomData<&'a T>,
}

unsafe impl<'a, T: Sync> Send for Iter<'a, T> {}
unsafe impl<'a, T: Sync> Sync for Iter<'a, T> {}

impl<'a, T> Clone for Iter<'a, T> {
    fn clone(&self) -> Self {
        Iter { ..*self }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        if self.len == 0 {
            return None;
        }
        let head = self.head;
        self.head = wrap_add(head, 1, self.cap);
        self.len -= 1;
        unsafe { Some(&*self.ring.add(head)) }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        let slot = wrap_add(self.head, self.len, self.cap);
        unsafe { Some(&*self.ring.add(slot)) }
    }
}

impl<'a, T> ExactSizeIterator for Iter<'a, T> {}

/// `RingBuffer` mutable iterator
#[must_use = "iterator adaptors are lazy and do nothing unless consumed"]
pub struct IterMut<'a, T: 'a> {
    ring: *mut T,
    cap: usize,
    head: usize,
    len: usize,
    _marker: PhantomData<&'a mut T>,
}

unsafe impl<'a, T: Send> Send for IterMut<'a, T> {}
unsafe impl<'a, T: Sync> Sync for IterMut<'a, T> {}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    #[inline]
    fn next(&mut self) -> Option<&'a mut T> {
        if self.len == 0 {
            return None;
        }
        let head = self.head;
        self.head = wrap_add(head, 1, self.cap);
        self.len -= 1;
        unsafe { Some(&mut *self.ring.add(head)) }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'a, T> DoubleEndedIterator for IterMut<'a, T> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a mut T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        let slot = wrap_add(self.head, self.len, self.cap);
        unsafe { Some(&mut *self.ring.add(slot)) }
    }
}

impl<'a, T> ExactSizeIterator for IterMut<'a, T> {}

/// By-value `RingBuffer` iterator
#[must_use = "iterator adaptors are lazy and do nothing unless consumed"]
pub struct IntoIter<T> {
    inner: RingBuffer<T>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.inner.pop_front()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.inner.len();
        (len, Some(len))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    #[inline]
    fn next_back(&mut self) -> Option<T> {
        self.inner.pop_back()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

/// Draining `RingBuffer` iterator
pub struct Drain<'a, T: 'a> {
    ring: *mut RingBuffer<T>,
    orig_len: usize,
    drain_start: usize,
    drain_len: usize,
    index: usize,
    back_index: usize,
    _marker: PhantomData<&'a mut RingBuffer<T>>,
}

impl<'a, T> Drop for Drain<'a, T> {
    fn drop(&mut self) {
        for _ in self.by_ref() {}

        let source = unsafe { &mut *self.ring };
        let front_len = self.drain_start;
        let tail_len = self.orig_len - self.drain_start - self.drain_len;

        match (front_len, tail_len) {
            (0, 0) => {
                source.head = 0;
                source.len = 0;
            }
            (_, 0) => {
                source.len = front_len;
            }
            (0, _) => {
                source.head = wrap_add(source.head, self.drain_len, source.cap());
                source.len = tail_len;
            }
            _ => unsafe {
                let cap = source.cap();
                if front_len <= tail_len {
                    // move the front run forward over the gap
                    let dst = wrap_add(source.head, self.drain_len, cap);
                    source.buf.wrap_copy(dst, source.head, front_len);
                    source.head = dst;
                } else {
                    // pull the back run backward over the gap
                    let src = wrap_add(source.head, front_len + self.drain_len, cap);
                    let dst = wrap_add(source.head, front_len, cap);
                    source.buf.wrap_copy(dst, src, tail_len);
                }
                source.len = front_len + tail_len;
            },
        }
    }
}

impl<'a, T> Iterator for Drain<'a, T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        if self.index == self.back_index {
            return None;
        }
        let source = unsafe { &*self.ring };
        let slot = wrap_add(source.head, self.index, source.cap());
        self.index += 1;
        unsafe { Some(source.buf.read(slot)) }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back_index - self.index;
        (len, Some(len))
    }
}

impl<'a, T> DoubleEndedIterator for Drain<'a, T> {
    #[inline]
    fn next_back(&mut self) -> Option<T> {
        if self.index == self.back_index {
            return None;
        }
        self.back_index -= 1;
        let source = unsafe { &*self.ring };
        let slot = wrap_add(source.head, self.back_index, source.cap());
        unsafe { Some(source.buf.read(slot)) }
    }
}

impl<'a, T> ExactSizeIterator for Drain<'a, T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::iter::FromIterator;

    #[test]
    fn simple() {
        let mut tester: RingBuffer<_> = RingBuffer::new();
        assert_eq!(tester.capacity(), 0);
        assert_eq!(tester.len(), 0);

        tester.push_back(1);
        tester.push_back(2);
        tester.push_back(3);
        tester.push_back(4);
        assert_eq!(tester.len(), 4);
        assert_eq!(tester.capacity(), 4);

        assert_eq!(tester.pop_front(), Some(1));
        assert_eq!(tester.pop_front(), Some(2));
        assert_eq!(tester.len(), 2);
        assert_eq!(tester.pop_front(), Some(3));
        assert_eq!(tester.pop_front(), Some(4));
        assert_eq!(tester.pop_front(), None);
    }

    #[test]
    fn simple_reversely() {
        let mut tester: RingBuffer<_> = RingBuffer::new();
        tester.push_front(1);
        tester.push_front(2);
        tester.push_front(3);
        tester.push_front(4);
        assert_eq!(tester.len(), 4);
        assert_eq!(tester.pop_back(), Some(1));
        assert_eq!(tester.pop_back(), Some(2));
        assert_eq!(tester.len(), 2);
        assert_eq!(tester.pop_back(), Some(3));
        assert_eq!(tester.pop_back(), Some(4));
        assert_eq!(tester.pop_back(), None);
    }

    #[test]
    fn mixed_ends_scenario() {
        let mut tester: RingBuffer<_> = RingBuffer::new();
        tester.push_back(1);
        tester.push_back(2);
        tester.push_front(0);

        assert_eq!(tester, vec![0, 1, 2]);
        assert_eq!(tester.len(), 3);

        let removed: Vec<_> = tester.drain(..2).collect();
        assert_eq!(removed, vec![0, 1]);
        assert_eq!(tester, vec![2]);
    }

    #[test]
    fn wrap_around() {
        let mut tester: RingBuffer<_> = RingBuffer::with_capacity(4);
        tester.extend(1..5);
        assert!(tester.is_full());

        assert_eq!(tester.pop_front(), Some(1));
        tester.push_back(5);

        assert_eq!(tester, vec![2, 3, 4, 5]);
        assert_eq!(tester.capacity(), 4);
        assert_eq!(tester.head, 1);
        assert_eq!(tester.tail(), 1);
    }

    #[test]
    fn growth_boundaries() {
        let mut tester: RingBuffer<_> = RingBuffer::with_capacity(0);
        for n in 1..25 {
            tester.push_back(n);
            assert_eq!(
                tester.capacity(),
                normalize_capacity(n, CapacityPolicy::Smart)
            );
        }
        assert_eq!(tester.capacity(), 32);
    }

    #[test]
    fn shrink_hysteresis() {
        let mut tester: RingBuffer<_> = (1..25).collect();
        assert_eq!(tester.capacity(), 32);

        while tester.len() > 6 {
            tester.pop_back();
            tester.shrink(CapacityPolicy::Smart);
            if tester.len() > 8 {
                assert_eq!(tester.capacity(), 32);
            }
        }
        // 8 <= 32 / 4 triggered the reallocation; 6 > 8 / 4 keeps it there.
        assert_eq!(tester.capacity(), 8);
        assert_eq!(tester, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn shrink_exact() {
        let mut tester: RingBuffer<_> = (0..5).collect();
        assert_eq!(tester.capacity(), 8);
        tester.shrink_to_fit();
        assert_eq!(tester.capacity(), 5);
        assert_eq!(tester, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn index_round_trip() {
        let tester = RingBuffer::from_iter(vec![1, 2, 3, 4, 5]);
        for i in 0..5 {
            assert_eq!(tester[i], i + 1);
        }
    }

    #[test]
    #[should_panic(expected = "index out of bounds")]
    fn index_out_of_bounds() {
        let tester: RingBuffer<_> = (0..3).collect();
        let _ = tester[3];
    }

    #[test]
    fn clone_is_independent() {
        let mut tester: RingBuffer<_> = (0..5).collect();
        let copy = tester.clone();
        tester.push_back(99);
        assert_eq!(copy, vec![0, 1, 2, 3, 4]);
        assert_eq!(tester, vec![0, 1, 2, 3, 4, 99]);
    }

    #[test]
    fn clone_with_reserve() {
        let tester: RingBuffer<_> = (0..5).collect();
        let copy = tester.clone_with_capacity(20);
        assert_eq!(copy, tester);
        assert!(copy.remaining_capacity() >= 20);
    }

    #[test]
    fn from_elem_repeats() {
        let tester = RingBuffer::from_elem("x", 3);
        assert_eq!(tester, vec!["x", "x", "x"]);
    }

    /// Pushes and pops `padding` placeholders so the contents start at a
    /// rotated physical head.
    fn rotated(padding: usize, contents: std::ops::Range<usize>) -> RingBuffer<usize> {
        let mut tester = RingBuffer::with_capacity(contents.len());
        for _ in 0..padding {
            tester.push_back(usize::MAX);
            tester.pop_front();
        }
        tester.extend(contents);
        tester
    }

    #[test]
    fn any_insert() {
        for padding in 0..8 {
            for index in 0..=7 {
                let mut tester = rotated(padding, 0..7);
                let mut expected: Vec<_> = (0..7).collect();
                tester.insert(index, 99);
                expected.insert(index, 99);
                assert_eq!(tester, expected);
            }
        }
    }

    #[test]
    fn any_remove() {
        for padding in 0..8 {
            for index in 0..7 {
                let mut tester = rotated(padding, 0..7);
                let mut expected: Vec<_> = (0..7).collect();
                assert_eq!(tester.remove(index), Some(expected.remove(index)));
                assert_eq!(tester, expected);
            }
        }
        let mut tester: RingBuffer<usize> = RingBuffer::new();
        assert_eq!(tester.remove(0), None);
    }

    #[test]
    fn any_drain() {
        const CAP: usize = 7;
        for padding in 0..CAP {
            for drain_start in 0..CAP {
                for drain_end in drain_start..CAP {
                    let mut tester = rotated(padding, 0..CAP);
                    let mut expected: Vec<_> = (0..CAP).collect();

                    let drains: Vec<_> = tester.drain(drain_start..drain_end).collect();
                    let expected_drains: Vec<_> =
                        expected.drain(drain_start..drain_end).collect();
                    assert_eq!(drains, expected_drains);
                    assert_eq!(tester, expected);
                }
            }
        }
    }

    #[test]
    fn drain_unconsumed_still_removes() {
        let mut tester: RingBuffer<_> = (0..7).collect();
        drop(tester.drain(2..5));
        assert_eq!(tester, vec![0, 1, 5, 6]);
    }

    #[test]
    fn insert_remove_symmetry() {
        for padding in 0..8 {
            for index in 0..=7 {
                let mut tester = rotated(padding, 0..7);
                let expected: Vec<_> = (0..7).collect();

                tester.insert_many(index, vec![100, 101]);
                let removed: Vec<_> = tester.drain(index..index + 2).collect();

                assert_eq!(removed, vec![100, 101]);
                assert_eq!(tester, expected);
            }
        }
    }

    #[test]
    fn insert_many_grows() {
        let mut tester: RingBuffer<_> =
            RingBuffer::with_capacity_policy(5, CapacityPolicy::Exact);
        tester.extend(vec![1, 2, 9, 9, 9]);
        assert!(tester.is_full());

        tester.insert_many(2, vec![3, 4, 5, 6, 7, 8]);
        assert_eq!(tester, vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 9, 9]);
        assert_eq!(tester.capacity(), 16);
    }

    #[test]
    fn extend_front_order() {
        let mut tester: RingBuffer<_> = vec![3, 4].into();
        tester.extend_front(vec![1, 2]);
        assert_eq!(tester, vec![1, 2, 3, 4]);

        // reallocation path
        let mut tester: RingBuffer<_> = (10..14).collect();
        assert!(tester.is_full());
        tester.extend_front((0..10).collect::<Vec<_>>());
        assert_eq!(tester, (0..14).collect::<Vec<_>>());
    }

    #[test]
    fn replace_like_prepend() {
        let mut tester: RingBuffer<_> = vec![3, 4].into();
        tester.replace_range(0..0, vec![1, 2]);
        assert_eq!(tester, vec![1, 2, 3, 4]);
    }

    #[test]
    fn replace_like_remove() {
        let mut tester: RingBuffer<_> = (0..7).collect();
        tester.replace_range(2..5, Vec::new());
        assert_eq!(tester, vec![0, 1, 5, 6]);
    }

    #[test]
    fn replace_empties() {
        let mut tester: RingBuffer<_> = (0..7).collect();
        tester.replace_range(.., Vec::new());
        assert!(tester.is_empty());
    }

    #[test]
    fn any_replace() {
        for padding in 0..8 {
            for start in 0..7 {
                for end in start..7 {
                    let mut tester = rotated(padding, 0..7);
                    let mut expected: Vec<_> = (0..7).collect();

                    tester.replace_range(start..end, vec![77, 88]);
                    expected.splice(start..end, vec![77, 88]);
                    assert_eq!(
                        tester, expected,
                        "padding={} range={}..{}",
                        padding, start, end
                    );
                }
            }
        }
    }

    #[test]
    fn replace_grows() {
        let mut tester: RingBuffer<_> =
            RingBuffer::with_capacity_policy(4, CapacityPolicy::Exact);
        tester.extend(vec![0, 9, 9, 3]);
        assert!(tester.is_full());

        tester.replace_range(1..3, vec![1, 2, 10, 11]);
        assert_eq!(tester, vec![0, 1, 2, 10, 11, 3]);
        assert_eq!(tester.capacity(), 8);
    }

    #[test]
    fn reserve_respects_policy() {
        let mut tester: RingBuffer<i32> = RingBuffer::new();
        tester.reserve(9);
        assert_eq!(tester.capacity(), 16);

        let mut tester: RingBuffer<i32> = RingBuffer::new();
        tester.reserve_exact(9);
        assert_eq!(tester.capacity(), 9);

        let before = tester.capacity();
        tester.reserve(4);
        assert_eq!(tester.capacity(), before);
    }

    #[test]
    fn append_moves_everything() {
        let mut tester = rotated(3, 0..5);
        let mut other = rotated(6, 5..12);

        tester.append(&mut other);

        assert_eq!(tester, (0..12).collect::<Vec<_>>());
        assert!(other.is_empty());
        assert_eq!(other.capacity(), 8);
    }

    #[test]
    fn make_contiguous_after_wrap() {
        let mut tester = rotated(5, 0..7);
        assert!(!tester.is_contiguous());

        assert_eq!(tester.make_contiguous(), &mut [0, 1, 2, 3, 4, 5, 6][..]);
        assert_eq!(tester.head, 0);
        assert_eq!(tester.as_slices(), (&[0, 1, 2, 3, 4, 5, 6][..], &[][..]));
    }

    #[test]
    fn retain_keeps_order() {
        let mut tester = rotated(5, 0..8);
        tester.retain(|x| x % 2 == 0);
        assert_eq!(tester, vec![0, 2, 4, 6]);
    }

    #[test]
    fn try_retain_error_is_partial() {
        let mut tester: RingBuffer<_> = (1..7).collect();
        let result =
            tester.try_retain(|&x| if x == 4 { Err("boom") } else { Ok(x % 2 == 0) });

        assert_eq!(result, Err("boom"));
        // 1 and 3 were rejected before the failure; 4, the failing element,
        // and everything after it survive.
        assert_eq!(tester, vec![2, 4, 5, 6]);
    }

    #[test]
    fn iterators_cover_both_segments() {
        let tester = rotated(5, 0..7);

        let forward: Vec<_> = tester.iter().cloned().collect();
        assert_eq!(forward, vec![0, 1, 2, 3, 4, 5, 6]);

        let backward: Vec<_> = tester.iter().rev().cloned().collect();
        assert_eq!(backward, vec![6, 5, 4, 3, 2, 1, 0]);

        let owned: Vec<_> = tester.into_iter().collect();
        assert_eq!(owned, vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn iterator_failure_propagates() {
        let tester: RingBuffer<_> = (0..7).collect();

        let mut seen = Vec::new();
        let result: Result<(), &str> = tester.iter().try_for_each(|&x| {
            if x == 3 {
                return Err("stop");
            }
            seen.push(x);
            Ok(())
        });

        assert_eq!(result, Err("stop"));
        assert_eq!(seen, vec![0, 1, 2]);
        assert_eq!(tester, vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn all_short_circuits() {
        let tester: RingBuffer<_> = (0..7).collect();
        let mut visited = 0;
        assert!(!tester.iter().all(|&x| {
            visited += 1;
            x < 3
        }));
        assert_eq!(visited, 4);
    }

    struct Bump<'a>(&'a Cell<i32>);

    impl<'a> Drop for Bump<'a> {
        fn drop(&mut self) {
            let n = self.0.get();
            self.0.set(n + 1);
        }
    }

    #[test]
    fn drop_counts() {
        let flag = &Cell::new(0);

        {
            let mut tester: RingBuffer<Bump> = RingBuffer::new();
            tester.push_back(Bump(flag));
            tester.push_back(Bump(flag));
        }
        assert_eq!(flag.get(), 2);

        flag.set(0);
        {
            let mut tester: RingBuffer<_> = RingBuffer::new();
            tester.push_back(vec![Bump(flag)]);
            tester.push_back(vec![Bump(flag), Bump(flag)]);
            tester.push_back(vec![]);
            tester.push_back(vec![Bump(flag)]);
            assert_eq!(flag.get(), 0);
            drop(tester.pop_back());
            assert_eq!(flag.get(), 1);
            drop(tester.pop_back());
            assert_eq!(flag.get(), 1);
        }
        assert_eq!(flag.get(), 4);
    }

    #[test]
    fn drop_counts_through_clear_and_drain() {
        let flag = &Cell::new(0);

        let mut tester: RingBuffer<Bump> = RingBuffer::new();
        for _ in 0..6 {
            tester.push_back(Bump(flag));
        }
        drop(tester.drain(1..4));
        assert_eq!(flag.get(), 3);
        assert_eq!(tester.len(), 3);

        tester.clear();
        assert_eq!(flag.get(), 6);
        assert_eq!(tester.len(), 0);
        assert!(tester.capacity() > 0);
    }

    #[test]
    fn drop_counts_through_replace_and_retain() {
        let flag = &Cell::new(0);

        let mut tester: RingBuffer<Bump> = RingBuffer::new();
        for _ in 0..5 {
            tester.push_back(Bump(flag));
        }
        tester.replace_range(1..4, vec![Bump(flag)]);
        assert_eq!(flag.get(), 3);
        assert_eq!(tester.len(), 3);

        let mut visits = 0;
        tester.retain(|_| {
            visits += 1;
            false
        });
        assert_eq!(visits, 3);
        assert_eq!(flag.get(), 6);
        assert!(tester.is_empty());
    }

    #[test]
    fn growth_preserves_wrapped_contents() {
        let mut tester = rotated(3, 0..4);
        assert!(tester.is_full());
        tester.push_back(4);
        assert_eq!(tester, vec![0, 1, 2, 3, 4]);
        assert_eq!(tester.capacity(), 8);
        assert_eq!(tester.head, 0);
    }

    #[test]
    fn zero_sized_elements() {
        let mut tester: RingBuffer<()> = RingBuffer::new();
        for _ in 0..100 {
            tester.push_back(());
        }
        assert_eq!(tester.len(), 100);
        assert_eq!(tester.pop_front(), Some(()));
        tester.retain(|_| false);
        assert!(tester.is_empty());
    }

    #[test]
    fn eq_and_ord_follow_contents() {
        let a: RingBuffer<_> = (0..4).collect();
        let b = rotated(6, 0..4);
        assert_eq!(a, b);

        let c: RingBuffer<_> = (1..5).collect();
        assert!(a < c);
    }
}
