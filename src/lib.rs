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

//! A separately chained hash table for measuring lock granularity.
//!
//! [`HashTable`] is a fixed array of buckets, each holding a linked chain of
//! entries. The same table can be guarded by one table-wide lock
//! ([`Locking::Coarse`]) or by one lock per bucket ([`Locking::Fine`]). The
//! [`harness`] module drives a table from many threads with a lookup, insert,
//! or mixed workload and reports throughput.

pub mod harness;
pub mod lock;
pub mod table;
pub mod workload;

pub use harness::{Config, HarnessError, Report, Summary};
pub use lock::Locking;
pub use table::HashTable;
pub use workload::{Mix, Tally, Worker};

/// Key type stored in a [`HashTable`].
pub type Key = i64;

/// Value type stored in a [`HashTable`].
pub type Value = i64;
