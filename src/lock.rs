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

//! Lock selection for [`HashTable`](crate::HashTable).
//!
//! Both disciplines guard the same bucket array. Coarse locking funnels every
//! operation through one table-wide mutex; fine locking gives each bucket its
//! own mutex, so operations on different buckets never wait on each other.

use std::fmt;

use clap::ValueEnum;
use parking_lot::{Mutex, MutexGuard};

/// Which locking discipline a table uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum)]
pub enum Locking {
    /// One lock for the whole table.
    Coarse,
    /// One lock per bucket.
    Fine,
}

impl Locking {
    pub fn as_str(self) -> &'static str {
        match self {
            Locking::Coarse => "coarse",
            Locking::Fine => "fine",
        }
    }
}

impl fmt::Display for Locking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The lock(s) backing a table, fixed when the table is built.
///
/// Every access to a bucket's chain must happen while holding the guard
/// returned by [`acquire`] for that bucket's index. No operation ever holds
/// more than one guard, so there is no lock ordering to get wrong.
///
/// [`acquire`]: #method.acquire
#[derive(Debug)]
pub(crate) enum LockStrategy {
    Coarse(Mutex<()>),
    Fine(Box<[Mutex<()>]>),
}

impl LockStrategy {
    pub(crate) fn new(locking: Locking, bucket_count: usize) -> LockStrategy {
        match locking {
            Locking::Coarse => LockStrategy::Coarse(Mutex::new(())),
            Locking::Fine => {
                LockStrategy::Fine((0..bucket_count).map(|_| Mutex::new(())).collect())
            }
        }
    }

    pub(crate) fn locking(&self) -> Locking {
        match self {
            LockStrategy::Coarse(_) => Locking::Coarse,
            LockStrategy::Fine(_) => Locking::Fine,
        }
    }

    /// Blocks until the lock guarding bucket `index` is held.
    ///
    /// The lock is released when the returned guard is dropped.
    #[inline]
    pub(crate) fn acquire(&self, index: usize) -> MutexGuard<'_, ()> {
        match self {
            LockStrategy::Coarse(table_lock) => table_lock.lock(),
            LockStrategy::Fine(bucket_locks) => bucket_locks[index].lock(),
        }
    }

    #[cfg(test)]
    pub(crate) fn is_held(&self, index: usize) -> bool {
        match self {
            LockStrategy::Coarse(table_lock) => table_lock.is_locked(),
            LockStrategy::Fine(bucket_locks) => bucket_locks[index].is_locked(),
        }
    }
}
