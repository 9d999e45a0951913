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

//! The per-thread operation loop driven against a shared table.

use crate::{HashTable, Key};

use std::{fmt, ops::AddAssign};

use clap::ValueEnum;
use rand::{rngs::SmallRng, Rng, SeedableRng};

/// Share of `Mixed` operations that are lookups, out of ten.
const MIXED_LOOKUPS_PER_TEN: u32 = 7;

/// The operation mix each worker draws from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum)]
pub enum Mix {
    /// Lookups only.
    Lookup,
    /// Inserts only.
    Insert,
    /// 70% lookups, 30% inserts.
    Mixed,
}

impl Mix {
    pub fn as_str(self) -> &'static str {
        match self {
            Mix::Lookup => "lookup",
            Mix::Insert => "insert",
            Mix::Mixed => "mixed",
        }
    }

    fn choose<R: Rng>(self, rng: &mut R) -> Op {
        match self {
            Mix::Lookup => Op::Lookup,
            Mix::Insert => Op::Insert,
            Mix::Mixed => {
                if rng.random_range(0..10) < MIXED_LOOKUPS_PER_TEN {
                    Op::Lookup
                } else {
                    Op::Insert
                }
            }
        }
    }
}

impl fmt::Display for Mix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Op {
    Lookup,
    Insert,
}

/// Counts of what a worker actually did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub lookups: u64,
    pub hits: u64,
    pub inserts: u64,
}

impl Tally {
    pub fn total(&self) -> u64 {
        self.lookups + self.inserts
    }
}

impl AddAssign for Tally {
    fn add_assign(&mut self, other: Tally) {
        self.lookups += other.lookups;
        self.hits += other.hits;
        self.inserts += other.inserts;
    }
}

/// One thread's slice of a workload.
#[derive(Debug)]
pub struct Worker {
    index: usize,
    ops: usize,
    key_space: Key,
    mix: Mix,
    rng: SmallRng,
}

impl Worker {
    /// Creates the worker at position `index`.
    ///
    /// Its random stream is seeded from `seed + index`, so the same seed
    /// reproduces a run while different workers draw independent streams.
    pub fn new(index: usize, ops: usize, key_space: usize, mix: Mix, seed: u64) -> Worker {
        Worker {
            index,
            ops,
            key_space: key_space.max(1) as Key,
            mix,
            rng: SmallRng::seed_from_u64(seed.wrapping_add(index as u64)),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn ops(&self) -> usize {
        self.ops
    }

    /// Performs all of this worker's operations against `table`.
    ///
    /// Inserted values equal their keys.
    pub fn run(mut self, table: &HashTable) -> Tally {
        let mut tally = Tally::default();

        for _ in 0..self.ops {
            let key = self.rng.random_range(0..self.key_space);

            match self.mix.choose(&mut self.rng) {
                Op::Lookup => {
                    tally.lookups += 1;

                    if table.find(key).is_some() {
                        tally.hits += 1;
                    }
                }
                Op::Insert => {
                    tally.inserts += 1;
                    table.insert(key, key);
                }
            }
        }

        tally
    }
}

/// Splits `total` operations across `workers`, giving the remainder to the
/// first workers one apiece.
pub fn split_ops(total: usize, workers: usize) -> Vec<usize> {
    let workers = workers.max(1);
    let per_worker = total / workers;
    let remainder = total % workers;

    (0..workers)
        .map(|i| per_worker + usize::from(i < remainder))
        .collect()
}
