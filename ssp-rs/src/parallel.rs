//! Order-preserving job dispatch over a bounded worker pool.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
#[cfg(feature = "parallel")]
use tracing::warn;

///
/// Map `f` over `items` using up to `n_jobs` worker threads.
///
/// Outputs keep the order of `items`, so callers that reduce the results
/// sequentially get the same answer for every `n_jobs`.
///
/// ```
/// use ssp_rs::parallel::map_jobs;
///
/// let squares = map_jobs(4, &[1, 2, 3, 4, 5], |x| x * x);
/// assert_eq!(squares, vec![1, 4, 9, 16, 25]);
/// ```
#[cfg(feature = "parallel")]
pub fn map_jobs<T, R, F>(n_jobs: usize, items: &[T], f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    if n_jobs > 1 && items.len() > 1 {
        match rayon::ThreadPoolBuilder::new().num_threads(n_jobs).build() {
            Ok(pool) => return pool.install(|| items.par_iter().map(&f).collect()),
            Err(err) => warn!("Could not start {n_jobs} workers ({err}), running sequentially"),
        }
    }
    items.iter().map(f).collect()
}

/// Map `f` over `items` sequentially; `n_jobs` is accepted for API parity.
#[cfg(not(feature = "parallel"))]
pub fn map_jobs<T, R, F>(_n_jobs: usize, items: &[T], f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    items.iter().map(f).collect()
}
