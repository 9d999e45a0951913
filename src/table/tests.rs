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

use super::*;

use std::{
    collections::HashMap,
    sync::{mpsc, Arc, Barrier},
    thread::{self, JoinHandle},
    time::Duration,
};

use rand::{rngs::SmallRng, Rng, SeedableRng};

const BOTH: [Locking; 2] = [Locking::Coarse, Locking::Fine];

fn sorted_pairs(table: &HashTable) -> Vec<(Key, Value)> {
    let mut pairs: Vec<_> = table.snapshot().into_iter().flatten().collect();
    pairs.sort_unstable();

    pairs
}

#[test]
fn insertion() {
    const MAX_VALUE: Key = 512;

    for locking in BOTH {
        let table = HashTable::new(64, locking);

        assert!(table.is_empty());

        for i in 0..MAX_VALUE {
            table.insert(i, i * 2);

            assert_eq!(table.len(), (i + 1) as usize);

            for j in 0..=i {
                assert_eq!(table.find(j), Some(j * 2));
            }

            for k in i + 1..MAX_VALUE {
                assert_eq!(table.find(k), None);
            }
        }
    }
}

#[test]
fn prefilled_lookup() {
    let mut table = HashTable::new(16, Locking::Fine);
    table.prefill(16);

    assert_eq!(table.len(), 16);
    assert_eq!(table.find(5), Some(5));
    assert_eq!(table.find(16), None);
}

#[test]
fn zero_buckets_becomes_one() {
    let table = HashTable::new(0, Locking::Fine);

    assert_eq!(table.bucket_count(), 1);

    table.insert(3, 4);
    table.insert(-9, 10);

    assert_eq!(table.find(3), Some(4));
    assert_eq!(table.find(-9), Some(10));
}

#[test]
fn negative_keys_use_nonnegative_remainder() {
    let table = HashTable::new(10, Locking::Coarse);

    assert_eq!(table.bucket_index(-1), 9);
    assert_eq!(table.bucket_index(-10), 0);
    assert_eq!(table.bucket_index(Key::MIN), Key::MIN.rem_euclid(10) as usize);

    table.insert(-1, 1);

    assert_eq!(table.snapshot()[9], vec![(-1, 1)]);
    assert_eq!(table.find(-1), Some(1));
    assert!(table.erase(-1));
    assert!(table.is_empty());
}

#[test]
fn duplicate_keys_match_newest_first() {
    for locking in BOTH {
        let table = HashTable::new(4, locking);

        table.insert(7, 1);
        table.insert(3, 100);
        table.insert(7, 2);
        table.insert(7, 3);

        assert_eq!(table.snapshot()[3], vec![(7, 3), (7, 2), (3, 100), (7, 1)]);

        assert_eq!(table.find(7), Some(3));
        assert!(table.erase(7));
        assert_eq!(table.find(7), Some(2));
        assert!(table.erase(7));
        assert_eq!(table.find(7), Some(1));
        assert!(table.erase(7));
        assert_eq!(table.find(7), None);
        assert!(!table.erase(7));

        assert_eq!(table.snapshot()[3], vec![(3, 100)]);
    }
}

#[test]
fn erase_missing_key_leaves_chains_untouched() {
    for locking in BOTH {
        let table = HashTable::new(8, locking);

        for i in 0..32 {
            table.insert(i, -i);
        }

        let before = table.snapshot();

        for missing in [32, 40, -8, 1000] {
            assert!(!table.erase(missing));
            assert!(!table.erase(missing));
            assert_eq!(table.snapshot(), before);
        }
    }
}

#[test]
fn chain_integrity_matches_model() {
    const NUM_OPS: usize = 20_000;
    const KEY_SPACE: Key = 200;

    for locking in BOTH {
        let table = HashTable::new(37, locking);
        let mut model: HashMap<Key, Vec<Value>> = HashMap::new();
        let mut rng = SmallRng::seed_from_u64(0x1d);

        for i in 0..NUM_OPS {
            let key = rng.random_range(-KEY_SPACE..KEY_SPACE);

            if rng.random_range(0..3) == 0 {
                let expected = model.get_mut(&key).and_then(Vec::pop).is_some();

                assert_eq!(table.erase(key), expected);
            } else {
                table.insert(key, i as Value);
                model.entry(key).or_default().push(i as Value);
            }

            assert_eq!(
                table.find(key),
                model.get(&key).and_then(|values| values.last().copied())
            );
        }

        let mut expected: Vec<_> = model
            .into_iter()
            .flat_map(|(key, values)| values.into_iter().map(move |value| (key, value)))
            .collect();
        expected.sort_unstable();

        assert_eq!(sorted_pairs(&table), expected);
        assert_eq!(table.len(), expected.len());
    }
}

#[test]
fn strategies_are_equivalent() {
    const NUM_OPS: usize = 10_000;

    let coarse = HashTable::new(101, Locking::Coarse);
    let fine = HashTable::new(101, Locking::Fine);
    let mut rng = SmallRng::seed_from_u64(42);

    for i in 0..NUM_OPS {
        let key = rng.random_range(0..500);

        match rng.random_range(0..4) {
            0 => assert_eq!(coarse.erase(key), fine.erase(key)),
            1 => assert_eq!(coarse.find(key), fine.find(key)),
            _ => {
                coarse.insert(key, i as Value);
                fine.insert(key, i as Value);
            }
        }
    }

    assert_eq!(coarse.snapshot(), fine.snapshot());
}

#[test]
fn prefill_layout_is_independent_of_locking() {
    let mut coarse = HashTable::new(13, Locking::Coarse);
    let mut fine = HashTable::new(13, Locking::Fine);

    coarse.prefill(100);
    fine.prefill(100);

    assert_eq!(coarse.snapshot(), fine.snapshot());
    assert_eq!(coarse.snapshot()[0][0], (91, 91));
}

#[test]
fn locks_are_released_after_every_call() {
    for locking in BOTH {
        let table = HashTable::new(8, locking);

        let is_any_held = |table: &HashTable| (0..8).any(|i| table.strategy.is_held(i));

        table.insert(1, 1);
        assert!(!is_any_held(&table));

        assert_eq!(table.find(1), Some(1));
        assert!(!is_any_held(&table));

        assert_eq!(table.find(2), None);
        assert!(!is_any_held(&table));

        assert!(table.erase(1));
        assert!(!is_any_held(&table));

        assert!(!table.erase(1));
        assert!(!is_any_held(&table));

        assert_eq!(table.len(), 0);
        table.snapshot();
        assert!(!is_any_held(&table));
    }
}

#[test]
fn other_threads_proceed_after_each_call() {
    for locking in BOTH {
        let table = Arc::new(HashTable::new(4, locking));

        table.insert(9, 9);
        table.find(9);
        table.find(10);
        table.erase(11);
        table.erase(9);

        let (sender, receiver) = mpsc::channel();
        let handle = {
            let table = table.clone();

            thread::spawn(move || {
                table.insert(1, 1);
                let found = table.find(1);
                let erased = table.erase(1);

                sender.send((found, erased)).unwrap();
            })
        };

        assert_eq!(
            receiver.recv_timeout(Duration::from_secs(10)),
            Ok((Some(1), true))
        );
        assert!(handle.join().is_ok());
    }
}

#[test]
fn fine_locking_does_not_block_other_buckets() {
    let table = Arc::new(HashTable::new(2, Locking::Fine));
    let _guard = table.strategy.acquire(0);

    let (sender, receiver) = mpsc::channel();
    let handle = {
        let table = table.clone();

        thread::spawn(move || {
            table.insert(1, 1);
            sender.send(table.find(1)).unwrap();
        })
    };

    assert_eq!(receiver.recv_timeout(Duration::from_secs(10)), Ok(Some(1)));
    assert!(handle.join().is_ok());
}

#[test]
fn coarse_locking_blocks_every_bucket() {
    let table = Arc::new(HashTable::new(2, Locking::Coarse));
    let guard = table.strategy.acquire(0);

    let (sender, receiver) = mpsc::channel();
    let handle = {
        let table = table.clone();

        thread::spawn(move || {
            table.insert(1, 1);
            sender.send(()).unwrap();
        })
    };

    assert!(receiver.recv_timeout(Duration::from_millis(100)).is_err());
    drop(guard);

    assert_eq!(receiver.recv_timeout(Duration::from_secs(10)), Ok(()));
    assert!(handle.join().is_ok());
    assert_eq!(table.find(1), Some(1));
}

#[test]
fn concurrent_insertion_loses_nothing() {
    const MAX_VALUE: Key = 512;
    const NUM_THREADS: usize = 64;
    const MAX_INSERTED_VALUE: Key = (NUM_THREADS as Key) * MAX_VALUE;

    for locking in BOTH {
        let table = Arc::new(HashTable::new(MAX_INSERTED_VALUE as usize, locking));
        let barrier = Arc::new(Barrier::new(NUM_THREADS));

        let threads: Vec<_> = (0..NUM_THREADS)
            .map(|i| {
                let table = table.clone();
                let barrier = barrier.clone();

                thread::spawn(move || {
                    barrier.wait();

                    for j in (0..MAX_VALUE).map(|j| j + (i as Key * MAX_VALUE)) {
                        table.insert(j, j);
                    }
                })
            })
            .collect();

        for result in threads.into_iter().map(JoinHandle::join) {
            assert!(result.is_ok());
        }

        assert_eq!(table.len(), MAX_INSERTED_VALUE as usize);

        for i in 0..MAX_INSERTED_VALUE {
            assert_eq!(table.find(i), Some(i));
        }
    }
}

#[test]
fn concurrent_contended_insertion_loses_nothing() {
    const NUM_INSERTS: usize = 4096;
    const NUM_THREADS: usize = 16;

    for locking in BOTH {
        let table = Arc::new(HashTable::new(3, locking));
        let barrier = Arc::new(Barrier::new(NUM_THREADS));

        let threads: Vec<_> = (0..NUM_THREADS)
            .map(|i| {
                let table = table.clone();
                let barrier = barrier.clone();

                thread::spawn(move || {
                    barrier.wait();

                    for j in 0..NUM_INSERTS {
                        table.insert((j % 7) as Key, i as Value);
                    }
                })
            })
            .collect();

        for result in threads.into_iter().map(JoinHandle::join) {
            assert!(result.is_ok());
        }

        assert_eq!(table.len(), NUM_INSERTS * NUM_THREADS);
    }
}

#[test]
fn concurrent_erasure() {
    const MAX_VALUE: Key = 512;
    const NUM_THREADS: usize = 32;
    const MAX_INSERTED_VALUE: Key = (NUM_THREADS as Key) * MAX_VALUE;

    for locking in BOTH {
        let mut table = HashTable::new(97, locking);
        table.prefill(MAX_INSERTED_VALUE as usize);

        let table = Arc::new(table);
        let barrier = Arc::new(Barrier::new(NUM_THREADS));

        let threads: Vec<_> = (0..NUM_THREADS)
            .map(|i| {
                let table = table.clone();
                let barrier = barrier.clone();

                thread::spawn(move || {
                    barrier.wait();

                    for j in (0..MAX_VALUE).map(|j| j + (i as Key * MAX_VALUE)) {
                        assert_eq!(table.find(j), Some(j));
                        assert!(table.erase(j));
                        assert!(!table.erase(j));
                    }
                })
            })
            .collect();

        for result in threads.into_iter().map(JoinHandle::join) {
            assert!(result.is_ok());
        }

        assert!(table.is_empty());
    }
}

#[test]
fn destroy_frees_every_entry() {
    for locking in BOTH {
        let mut table = HashTable::new(5, locking);
        table.prefill(5);

        for i in 0..20 {
            table.insert(i, i);
        }

        table.erase(0);

        assert_eq!(table.destroy(), 24);
    }
}

#[test]
fn single_bucket_long_chain() {
    const NUM_ENTRIES: Key = 1 << 18;

    let table = HashTable::new(1, Locking::Fine);

    for i in 0..NUM_ENTRIES {
        table.insert(i, i);
    }

    assert_eq!(table.find(0), Some(0));
    assert_eq!(table.len(), NUM_ENTRIES as usize);

    drop(table);
}
