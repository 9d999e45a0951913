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

//! Benchmark orchestration: configuration, prefill, the timed parallel
//! phase, and the result record.

use crate::{
    workload::{split_ops, Mix, Tally, Worker},
    HashTable, Locking,
};

use std::{
    error, fmt, io,
    sync::Arc,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use clap::Parser;
use tracing::{debug, info};

/// Seed used when `--seed` is not given.
pub const DEFAULT_SEED: u64 = 0x5eed_1e55_c0ff_ee00;

/// Column layout of [`Report`]'s CSV line.
pub const CSV_HEADER: &str = "run_id,impl,mode,keys,threads,ops,prefill,seconds,throughput";

/// Command-line configuration for one benchmark run.
#[derive(Clone, Debug, PartialEq, Eq, Parser)]
#[command(
    name = "lht-bench",
    version,
    about = "Measures chained hash table throughput under coarse- or fine-grained locking.",
    after_help = "Output CSV:\n  run_id,impl,mode,keys,threads,ops,prefill,seconds,throughput"
)]
pub struct Config {
    /// Locking discipline.
    #[arg(long = "impl", value_enum, default_value_t = Locking::Coarse)]
    pub locking: Locking,

    /// Operation mix.
    #[arg(long = "mode", value_enum, default_value_t = Mix::Lookup)]
    pub mix: Mix,

    /// Number of worker threads.
    #[arg(long, default_value_t = 1, value_parser = at_least_one)]
    pub threads: usize,

    /// Size of the key space, also used as the bucket count.
    #[arg(long, default_value_t = 100_000, value_parser = at_least_one)]
    pub keys: usize,

    /// Total operations across all threads.
    #[arg(long, default_value_t = 1_000_000, value_parser = at_least_one)]
    pub ops: usize,

    /// Keys to insert before timing starts. Defaults to every key, or none
    /// for the insert mix. Clamped to [0, keys].
    #[arg(long, allow_negative_numbers = true)]
    pub prefill: Option<i64>,

    /// Identifier copied into the output line.
    #[arg(long = "runid", default_value_t = -1, allow_negative_numbers = true)]
    pub run_id: i64,

    /// Base seed for the per-worker random streams.
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,
}

fn at_least_one(s: &str) -> Result<usize, String> {
    let value: usize = s.parse().map_err(|e| format!("`{s}` is not a count: {e}"))?;

    if value == 0 {
        Err("must be at least 1".to_string())
    } else {
        Ok(value)
    }
}

impl Config {
    /// Returns how many keys to insert before the timed phase.
    pub fn prefill_count(&self) -> usize {
        match self.prefill {
            Some(requested) => usize::try_from(requested.max(0))
                .unwrap_or(usize::MAX)
                .min(self.keys),
            None if self.mix == Mix::Insert => 0,
            None => self.keys,
        }
    }
}

/// The single result record of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    pub run_id: i64,
    pub locking: Locking,
    pub mix: Mix,
    pub keys: usize,
    pub threads: usize,
    pub ops: usize,
    pub prefill: usize,
    /// Wall-clock time of the parallel phase, excluding prefill.
    pub elapsed: Duration,
}

impl Report {
    pub fn seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Operations per second over the parallel phase.
    pub fn throughput(&self) -> f64 {
        self.ops as f64 / self.seconds()
    }
}

impl fmt::Display for Report {
    /// Formats the record as one CSV line in [`CSV_HEADER`] order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{},{},{},{:.6},{:.2}",
            self.run_id,
            self.locking,
            self.mix,
            self.keys,
            self.threads,
            self.ops,
            self.prefill,
            self.seconds(),
            self.throughput(),
        )
    }
}

/// Everything a finished run produced.
#[derive(Clone, Debug)]
pub struct Summary {
    pub report: Report,
    /// Combined counts from every worker.
    pub tally: Tally,
    /// Entries in the table once all workers joined.
    pub entries: usize,
}

/// A failure that aborts a run during setup or join.
#[derive(Debug)]
pub enum HarnessError {
    /// The OS refused to start a worker thread.
    Spawn { worker: usize, source: io::Error },
    /// A worker thread panicked instead of finishing its operations.
    WorkerPanicked { worker: usize },
    /// The table was still shared after every worker joined.
    TableShared,
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarnessError::Spawn { worker, source } => {
                write!(f, "failed to spawn worker {worker}: {source}")
            }
            HarnessError::WorkerPanicked { worker } => write!(f, "worker {worker} panicked"),
            HarnessError::TableShared => {
                f.write_str("table still referenced after all workers joined")
            }
        }
    }
}

impl error::Error for HarnessError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            HarnessError::Spawn { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Runs one benchmark: create, prefill, run workers, join, report, destroy.
///
/// Only the span between spawning the first worker and joining the last is
/// timed.
pub fn run(config: &Config) -> Result<Summary, HarnessError> {
    let mut table = HashTable::new(config.keys, config.locking);
    debug!(
        buckets = table.bucket_count(),
        locking = %config.locking,
        "created table"
    );

    let prefill = config.prefill_count();
    table.prefill(prefill);
    debug!(prefill, "prefilled table");

    let table = Arc::new(table);
    let workers: Vec<_> = split_ops(config.ops, config.threads)
        .into_iter()
        .enumerate()
        .map(|(i, ops)| Worker::new(i, ops, config.keys, config.mix, config.seed))
        .collect();

    let start = Instant::now();
    let handles = workers
        .into_iter()
        .map(|worker| spawn_worker(worker, table.clone()))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(threads = handles.len(), "workers running");

    let mut tally = Tally::default();

    for (worker, handle) in handles.into_iter().enumerate() {
        tally += handle
            .join()
            .map_err(|_| HarnessError::WorkerPanicked { worker })?;
    }

    let elapsed = start.elapsed();
    debug!(?elapsed, "workers joined");

    let table = Arc::try_unwrap(table).map_err(|_| HarnessError::TableShared)?;
    let entries = table.len();

    let report = Report {
        run_id: config.run_id,
        locking: config.locking,
        mix: config.mix,
        keys: config.keys,
        threads: config.threads,
        ops: config.ops,
        prefill,
        elapsed,
    };
    info!(
        run_id = report.run_id,
        seconds = report.seconds(),
        throughput = report.throughput(),
        lookups = tally.lookups,
        hits = tally.hits,
        inserts = tally.inserts,
        entries,
        "run complete"
    );

    let freed = table.destroy();
    debug!(freed, "destroyed table");

    Ok(Summary {
        report,
        tally,
        entries,
    })
}

fn spawn_worker(worker: Worker, table: Arc<HashTable>) -> Result<JoinHandle<Tally>, HarnessError> {
    let index = worker.index();

    thread::Builder::new()
        .name(format!("lht-worker-{index}"))
        .spawn(move || worker.run(&table))
        .map_err(|source| HarnessError::Spawn {
            worker: index,
            source,
        })
}
