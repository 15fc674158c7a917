use crate::{Error, Result};
use std::{
    num::NonZero,
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    thread,
};

/// Applies `f` to the chunks of `items` on a pool of scoped threads (one per available
/// processor) and returns the results in chunk order.
///
/// All the workers are joined before returning. When some chunk fails the first error in
/// chunk order is returned and no partial result.
pub fn parallel_for<T, R, F>(items: &[T], chunk_size: usize, f: F) -> Result<Vec<R>>
where
    T: Sync,
    R: Send,
    F: Fn(&[T]) -> Result<R> + Sync,
{
    let chunks: Vec<&[T]> = items.chunks(chunk_size.max(1)).collect();
    let workers = thread::available_parallelism()
        .map_or(1, NonZero::get)
        .min(chunks.len());
    if workers <= 1 {
        return chunks.into_iter().map(f).collect();
    }
    let next = AtomicUsize::new(0);
    let failed = AtomicBool::new(false);
    let slots: Vec<Mutex<Option<Result<R>>>> = chunks.iter().map(|_| Mutex::new(None)).collect();
    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| {
                while !failed.load(Ordering::Relaxed) {
                    let i = next.fetch_add(1, Ordering::Relaxed);
                    let Some(chunk) = chunks.get(i) else {
                        break;
                    };
                    let result = f(chunk);
                    if result.is_err() {
                        failed.store(true, Ordering::Relaxed);
                    }
                    *slots[i].lock().unwrap_or_else(PoisonError::into_inner) = Some(result);
                }
            });
        }
    });
    let mut results = Vec::with_capacity(slots.len());
    for slot in slots {
        match slot.into_inner().unwrap_or_else(PoisonError::into_inner) {
            Some(result) => results.push(result?),
            // Skipped after a failure, the failing chunk comes first
            None => return Err(Error::msg("A parallel chunk was not processed")),
        }
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_keep_chunk_order() {
        let items: Vec<u32> = (1..=1000).collect();
        let sums = parallel_for(&items, 100, |chunk| Ok(chunk.iter().sum::<u32>()))
            .expect("No failure");
        assert_eq!(sums.len(), 10);
        assert_eq!(sums[0], (1..=100).sum::<u32>());
        assert_eq!(sums.iter().sum::<u32>(), 500_500);
    }

    #[test]
    fn first_error_wins() {
        let items: Vec<u32> = (0..64).collect();
        let error = parallel_for(&items, 4, |chunk| {
            if chunk[0] >= 8 {
                Err(Error::msg(format!("chunk {}", chunk[0] / 4)))
            } else {
                Ok(())
            }
        })
        .expect_err("Chunks fail");
        assert!(error.to_string().starts_with("chunk"));
    }

    #[test]
    fn empty_input() {
        let result = parallel_for(&Vec::<u8>::new(), 10, |_| Ok(1)).expect("Nothing to do");
        assert!(result.is_empty());
    }
}
