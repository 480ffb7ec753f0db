use bevy::prelude::{Deref, DerefMut, Resource};
use bevy::tasks::{TaskPool, TaskPoolBuilder};
use rand_chacha::{ChaCha8Rng, rand_core::SeedableRng};

#[derive(Resource, Deref, DerefMut, Debug, Clone, PartialEq)]
pub struct SharedRng(pub ChaCha8Rng);

impl SharedRng {
    pub fn from_seed(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::from_seed(seed),
            None => Self::default(),
        }
    }
}

impl Default for SharedRng {
    fn default() -> Self {
        Self(ChaCha8Rng::from_rng(&mut rand::rng()))
    }
}

/// Worker threads for the embarrassingly parallel parts of a cycle.
///
/// Work is split into contiguous chunks and the per-chunk results come back
/// in chunk order, so any order-independent reduction over them is identical
/// for every thread count.
pub struct WorkerPool {
    pool: Option<TaskPool>,
    threads: usize,
    parallel_threshold: usize,
}

impl WorkerPool {
    /// `worker_threads == 0` uses all available cores. Inputs shorter than
    /// `parallel_threshold` are processed on the calling thread.
    pub fn new(worker_threads: usize, parallel_threshold: usize) -> Self {
        let threads = if worker_threads == 0 {
            std::thread::available_parallelism()
                .map(|count| count.get())
                .unwrap_or(1)
        } else {
            worker_threads
        };

        let pool = (threads > 1).then(|| {
            TaskPoolBuilder::new()
                .num_threads(threads)
                .thread_name("geodrift worker".to_string())
                .build()
        });

        Self {
            pool,
            threads,
            parallel_threshold,
        }
    }

    /// A pool that never spawns threads.
    pub fn serial() -> Self {
        Self {
            pool: None,
            threads: 1,
            parallel_threshold: usize::MAX,
        }
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Apply `f` to contiguous chunks of `items`, returning one result per chunk in order.
    pub fn map_chunks<T, R, F>(&self, items: &[T], f: F) -> Vec<R>
    where
        T: Sync,
        R: Send + 'static,
        F: Fn(&[T]) -> R + Send + Sync,
    {
        if items.is_empty() {
            return Vec::new();
        }

        match &self.pool {
            Some(pool) if items.len() >= self.parallel_threshold => {
                let chunk_size = items.len().div_ceil(self.threads).max(1);
                let f = &f;
                pool.scope(|scope| {
                    for chunk in items.chunks(chunk_size) {
                        scope.spawn(async move { f(chunk) });
                    }
                })
            }
            _ => vec![f(items)],
        }
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.threads)
            .field("parallel_threshold", &self.parallel_threshold)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_shared_rng_deterministic_with_seed() {
        let seed = 12345u64;
        let mut rng1 = SharedRng::from_seed(seed);
        let mut rng2 = SharedRng::from_seed(seed);

        let values1: Vec<f64> = (0..10).map(|_| rng1.random_range(0.0..1.0)).collect();
        let values2: Vec<f64> = (0..10).map(|_| rng2.random_range(0.0..1.0)).collect();

        assert_eq!(values1, values2);
    }

    #[test]
    fn test_shared_rng_from_optional_seed() {
        let seed = 54321u64;
        let mut rng_with_seed = SharedRng::from_optional_seed(Some(seed));
        let mut rng_with_same_seed = SharedRng::from_seed(seed);

        let value1: f64 = rng_with_seed.random_range(0.0..1.0);
        let value2: f64 = rng_with_same_seed.random_range(0.0..1.0);

        assert_eq!(value1, value2);
    }

    #[test]
    fn test_map_chunks_preserves_order() {
        let items: Vec<u64> = (0..1000).collect();
        for threads in [1, 2, 3, 8] {
            let pool = WorkerPool::new(threads, 1);
            let chunks = pool.map_chunks(&items, |chunk| chunk.to_vec());
            let flattened: Vec<u64> = chunks.into_iter().flatten().collect();
            assert_eq!(flattened, items, "Order lost with {threads} threads");
        }
    }

    #[test]
    fn test_map_chunks_below_threshold_is_single_chunk() {
        let pool = WorkerPool::new(4, 100);
        let chunks = pool.map_chunks(&[1, 2, 3], |chunk| chunk.len());
        assert_eq!(chunks, vec![3]);
    }

    #[test]
    fn test_map_chunks_empty_input() {
        let pool = WorkerPool::new(2, 1);
        let chunks: Vec<usize> = pool.map_chunks(&[] as &[u8], |chunk| chunk.len());
        assert!(chunks.is_empty());
    }
}
