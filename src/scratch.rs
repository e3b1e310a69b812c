//! Per-thread scratch-buffer stack backing leaf algorithms that need a
//! handful of working buffers (convolution accumulators, CRT residue rows,
//! Newton-iteration intermediates) without round-tripping the global
//! allocator on every call.
//!
//! The original `TMP_ALLOC`/`TMP_ARRAY_ALLOC` pattern pairs an explicit
//! `TMP_START`/`TMP_END` bracket around a stack-discipline arena; here that
//! bracket is [`TmpScope`]'s constructor and [`Drop`] impl, so a scope's
//! buffers are released automatically at the end of the block that created
//! it rather than relying on the caller to remember a matching `TMP_END`.
//! Released buffers are recycled into a thread-local free list so a
//! sequence of scopes in the same thread amortizes allocation, same as the
//! original's per-thread stack.

use std::cell::RefCell;

use crate::int::Int;

/// Cap on how many retired buffers a thread keeps around for reuse, so one
/// unusually large scope doesn't pin that much memory on the thread forever.
const MAX_RECYCLED: usize = 64;

thread_local! {
    static RECYCLE: RefCell<Vec<Vec<Int>>> = RefCell::new(Vec::new());
}

/// A bracketed sequence of scratch allocations. Buffers handed out by
/// [`TmpScope::alloc`]/[`TmpScope::array_alloc`] are addressed by opaque
/// handles rather than references, so they cannot outlive the scope that
/// owns them; dropping the scope returns their storage to the thread-local
/// recycle list.
pub struct TmpScope {
    buffers: Vec<Vec<Int>>,
}

impl TmpScope {
    pub fn new() -> Self {
        TmpScope { buffers: Vec::new() }
    }

    /// Borrow one zero-initialized buffer of `len` elements, pulling the
    /// backing storage from the thread-local recycle list when available.
    /// Returns a handle for use with [`TmpScope::get`]/[`TmpScope::get_mut`].
    pub fn alloc(&mut self, len: usize) -> usize {
        let mut buf = RECYCLE.with(|r| r.borrow_mut().pop()).unwrap_or_default();
        buf.clear();
        buf.resize(len, Int::zero());
        self.buffers.push(buf);
        self.buffers.len() - 1
    }

    /// `count` buffers of `len` elements each, in one call - the
    /// `TMP_ARRAY_ALLOC` counterpart to [`TmpScope::alloc`].
    pub fn array_alloc(&mut self, count: usize, len: usize) -> Vec<usize> {
        (0..count).map(|_| self.alloc(len)).collect()
    }

    pub fn get(&self, handle: usize) -> &[Int] {
        &self.buffers[handle]
    }

    pub fn get_mut(&mut self, handle: usize) -> &mut [Int] {
        &mut self.buffers[handle]
    }

    pub fn len(&self, handle: usize) -> usize {
        self.buffers[handle].len()
    }
}

impl Default for TmpScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TmpScope {
    fn drop(&mut self) {
        RECYCLE.with(|r| {
            let mut pool = r.borrow_mut();
            for buf in self.buffers.drain(..) {
                if pool.len() < MAX_RECYCLED {
                    pool.push(buf);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recycled_len() -> usize {
        RECYCLE.with(|r| r.borrow().len())
    }

    #[test]
    fn alloc_returns_zeroed_buffer_of_requested_length() {
        let mut scope = TmpScope::new();
        let h = scope.alloc(5);
        assert_eq!(scope.len(h), 5);
        assert!(scope.get(h).iter().all(|x| x.is_zero()));
    }

    #[test]
    fn array_alloc_hands_out_distinct_independently_mutable_buffers() {
        let mut scope = TmpScope::new();
        let handles = scope.array_alloc(3, 4);
        assert_eq!(handles.len(), 3);
        scope.get_mut(handles[0])[0] = Int::from_i64(7);
        assert_eq!(scope.get(handles[0])[0], Int::from_i64(7));
        assert!(scope.get(handles[1]).iter().all(|x| x.is_zero()));
    }

    #[test]
    fn dropping_a_scope_recycles_its_buffers_for_the_next_one() {
        RECYCLE.with(|r| r.borrow_mut().clear());
        {
            let mut scope = TmpScope::new();
            scope.alloc(16);
            scope.alloc(16);
        }
        assert_eq!(recycled_len(), 2);

        let mut scope = TmpScope::new();
        scope.alloc(16);
        assert_eq!(recycled_len(), 1);
    }
}
