//! Data-parallel evaluation over the time axis.
//!
//! Window estimators are pure functions of the row index, so the index range
//! is cut into contiguous chunks, each chunk runs on a scoped thread, and the
//! chunks are concatenated in order. Output is identical to the serial loop.

use std::thread;

/// Below this many rows the thread setup costs more than it saves.
pub const PARALLEL_MIN_ROWS: usize = 2048;

const MAX_WORKERS: usize = 8;

pub fn workers() -> usize {
    std::env::var("SIGMA_THREADS")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or_else(|| num_cpus::get().min(MAX_WORKERS))
}

/// `(0..n).map(f)` evaluated across worker threads.
pub fn map_indices<T, F>(n: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync,
{
    map_indices_with(n, workers(), f)
}

pub fn map_indices_with<T, F>(n: usize, workers: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync,
{
    if workers <= 1 || n < PARALLEL_MIN_ROWS {
        return (0..n).map(&f).collect();
    }
    let chunk = n.div_ceil(workers);
    let f = &f;
    thread::scope(|s| {
        let handles: Vec<_> = (0..n)
            .step_by(chunk)
            .map(|start| {
                let end = (start + chunk).min(n);
                s.spawn(move || (start..end).map(f).collect::<Vec<T>>())
            })
            .collect();
        let mut out = Vec::with_capacity(n);
        for handle in handles {
            match handle.join() {
                Ok(part) => out.extend(part),
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_below_threshold() {
        let out = map_indices_with(10, 4, |i| i * 2);
        assert_eq!(out, (0..10).map(|i| i * 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_parallel_matches_serial() {
        let n = PARALLEL_MIN_ROWS * 3 + 17;
        let f = |i: usize| ((i as f64) * 0.37).sin();
        let serial: Vec<f64> = (0..n).map(f).collect();
        let parallel = map_indices_with(n, 5, f);
        assert_eq!(serial.len(), parallel.len());
        assert!(serial.iter().zip(&parallel).all(|(a, b)| a.to_bits() == b.to_bits()));
    }

    #[test]
    fn test_empty_range() {
        let out: Vec<u8> = map_indices_with(0, 4, |_| 1);
        assert!(out.is_empty());
    }
}
