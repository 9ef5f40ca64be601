//! The data-parallel device that executes kernel launches
//!
//! A [`Device`] owns a dedicated Rayon thread pool. A launch splits the rows
//! of a matrix into blocks of `block_size` rows and runs every block as an
//! independent task in that pool. `launch` returns only after every block has
//! finished, and [`Device::synchronize`] additionally waits on every worker,
//! which gives the benchmark an explicit barrier to close a timing interval.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::config::SpmmConfig;
use crate::error::Result;
use crate::memory::MemoryLocation;

/// A pool of workers standing in for an accelerator
pub struct Device {
    pool: ThreadPool,
    block_size: usize,
}

impl Device {
    /// Starts a device with the thread count and block size from `config`
    pub fn new(config: &SpmmConfig) -> Result<Self> {
        let params = &config.system_params;
        let pool = ThreadPoolBuilder::new()
            .num_threads(params.n_threads)
            .thread_name(|i| format!("ellspmm-device-{}", i))
            .build()?;

        log::debug!(
            "device started: {} threads, {} rows per block",
            pool.current_num_threads(),
            params.block_size
        );

        Ok(Self {
            pool,
            block_size: params.block_size.max(1),
        })
    }

    /// Starts a device with `n_threads` workers and default parameters
    pub fn with_threads(n_threads: usize) -> Result<Self> {
        Self::new(&SpmmConfig::with_threads(n_threads))
    }

    /// Number of worker threads
    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Rows per task
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Runs `kernel` once per task
    ///
    /// On [`MemoryLocation::Device`] tasks run in parallel inside the pool;
    /// on [`MemoryLocation::Host`] they run in order on the calling thread.
    pub(crate) fn launch<I, K>(&self, location: MemoryLocation, tasks: Vec<I>, kernel: K)
    where
        I: Send,
        K: Fn(usize, I) + Send + Sync,
    {
        match location {
            MemoryLocation::Host => {
                for (block, task) in tasks.into_iter().enumerate() {
                    kernel(block, task);
                }
            }
            MemoryLocation::Device => self.pool.install(|| {
                tasks
                    .into_par_iter()
                    .enumerate()
                    .for_each(|(block, task)| kernel(block, task));
            }),
        }
    }

    /// Blocks until every worker is idle
    pub fn synchronize(&self) {
        self.pool.broadcast(|_| ());
    }
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("threads", &self.num_threads())
            .field("block_size", &self.block_size)
            .finish()
    }
}
