// MIT License
//
// Copyright (c) 2024 Gregory Meyer
//
// Permission is hereby granted, free of charge, to any person
// obtaining a copy of this software and associated documentation files
// (the "Software"), to deal in the Software without restriction,
// including without limitation the rights to use, copy, modify, merge,
// publish, distribute, sublicense, and/or sell copies of the Software,
// and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS
// BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN
// ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! A fixed-size, separately chained hash table shared between threads.

mod chain;

#[cfg(test)]
mod tests;

use crate::{
    lock::{LockStrategy, Locking},
    Key, Value,
};

use chain::Chain;

use std::cell::UnsafeCell;

/// A bucketed hash table with a fixed number of chains.
///
/// Key `k` lives in bucket `k.rem_euclid(bucket_count)`. The table never
/// resizes or rehashes.
///
/// Keys are not unique. Inserting a key that is already present adds another
/// entry in front of the old one; [`find`] and [`erase`] act on the first
/// match in head-to-tail order, which is the most recent surviving insert.
///
/// Which lock(s) an operation takes is decided by the [`Locking`] passed to
/// [`new`]: `Coarse` serializes every operation on one table lock, `Fine`
/// serializes only operations that land on the same bucket.
///
/// [`find`]: #method.find
/// [`erase`]: #method.erase
/// [`new`]: #method.new
/// [`Locking`]: ../lock/enum.Locking.html
#[derive(Debug)]
pub struct HashTable {
    buckets: Box<[Bucket]>,
    strategy: LockStrategy,
}

#[derive(Debug)]
struct Bucket {
    chain: UnsafeCell<Chain>,
}

// every shared access to a chain goes through `HashTable::with_chain`, which
// holds the lock the strategy assigns to that bucket.
unsafe impl Sync for HashTable {}

impl HashTable {
    /// Creates an empty table with `bucket_count` chains.
    ///
    /// A `bucket_count` of zero is treated as one.
    pub fn new(bucket_count: usize, locking: Locking) -> HashTable {
        let bucket_count = bucket_count.max(1);
        let buckets = (0..bucket_count)
            .map(|_| Bucket {
                chain: UnsafeCell::new(Chain::new()),
            })
            .collect();

        HashTable {
            buckets,
            strategy: LockStrategy::new(locking, bucket_count),
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn locking(&self) -> Locking {
        self.strategy.locking()
    }

    /// Returns the bucket `key` hashes to.
    #[inline]
    pub fn bucket_index(&self, key: Key) -> usize {
        key.rem_euclid(self.buckets.len() as Key) as usize
    }

    /// Inserts a new entry at the head of `key`'s chain.
    pub fn insert(&self, key: Key, value: Value) {
        self.with_chain(self.bucket_index(key), |chain| {
            chain.push_front(key, value)
        });
    }

    /// Returns the value of the first entry for `key`, if any.
    pub fn find(&self, key: Key) -> Option<Value> {
        self.with_chain(self.bucket_index(key), |chain| {
            chain.find(key).map(|entry| entry.value)
        })
    }

    /// Removes the first entry for `key`. Returns `false` and leaves the table
    /// untouched if there is none.
    pub fn erase(&self, key: Key) -> bool {
        let unlinked = self.with_chain(self.bucket_index(key), |chain| chain.unlink(key));

        // freed after the lock is released
        unlinked.is_some()
    }

    /// Inserts through an exclusive borrow, taking no locks.
    pub fn insert_exclusive(&mut self, key: Key, value: Value) {
        let index = self.bucket_index(key);

        self.buckets[index].chain.get_mut().push_front(key, value);
    }

    /// Inserts keys `0..count`, each with a value equal to its key, in
    /// ascending order.
    ///
    /// The resulting layout is the same for every locking discipline.
    pub fn prefill(&mut self, count: usize) {
        for key in 0..count as Key {
            self.insert_exclusive(key, key);
        }
    }

    /// Returns the total number of entries.
    ///
    /// Buckets are counted one at a time, so concurrent writers may make the
    /// result stale by the time it returns.
    pub fn len(&self) -> usize {
        (0..self.buckets.len())
            .map(|i| self.with_chain(i, |chain| chain.len()))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns each bucket's `(key, value)` pairs in head-to-tail order.
    pub fn snapshot(&self) -> Vec<Vec<(Key, Value)>> {
        (0..self.buckets.len())
            .map(|i| {
                self.with_chain(i, |chain| {
                    chain
                        .iter()
                        .map(|entry| (entry.key, entry.value))
                        .collect::<Vec<_>>()
                })
            })
            .collect()
    }

    /// Frees every entry and the locks, returning the number of entries
    /// freed.
    pub fn destroy(mut self) -> usize {
        self.buckets
            .iter_mut()
            .map(|bucket| bucket.chain.get_mut().clear())
            .sum()
    }

    #[inline]
    fn with_chain<R, F: FnOnce(&mut Chain) -> R>(&self, index: usize, f: F) -> R {
        let _guard = self.strategy.acquire(index);

        // the guard gives this thread exclusive access to bucket `index`
        let chain = unsafe { &mut *self.buckets[index].chain.get() };

        f(chain)
    }
}
