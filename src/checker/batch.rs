// src/checker/batch.rs
// =============================================================================
// Bounded fan-out over async work items.
//
// Link probes and GitHub file-presence probes both go through here: start up
// to `limit` futures at once, collect every result, and hand them back in
// the same order as the input so reports stay deterministic.
//
// Each item owns its own timeout (set on the HTTP client), so one hanging
// host only holds up its own slot in the pool.
// =============================================================================

use futures::stream::{self, StreamExt};
use std::future::Future;

// Runs `work` for every item with at most `limit` futures in flight
//
// Parameters:
//   items: the work items (consumed)
//   limit: worker cap, values below 1 are treated as 1
//   work: builds the future for one item
//
// Returns: one output per item, in input order
pub async fn fan_out<T, R, F, Fut>(items: Vec<T>, limit: usize, work: F) -> Vec<R>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = R>,
{
    let limit = limit.max(1);

    let futures = items.into_iter().enumerate().map(|(index, item)| {
        let future = work(item);
        async move { (index, future.await) }
    });

    // buffer_unordered yields results as they complete, not in input order
    let mut results: Vec<(usize, R)> = stream::iter(futures)
        .buffer_unordered(limit)
        .collect()
        .await;

    results.sort_by_key(|(index, _)| *index);
    results.into_iter().map(|(_, result)| result).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_results_keep_input_order() {
        // Later items finish first
        let results = fan_out(vec![30u64, 20, 10, 0], 4, |delay| async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            delay
        })
        .await;
        assert_eq!(results, vec![30, 20, 10, 0]);
    }

    #[tokio::test]
    async fn test_in_flight_never_exceeds_limit() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let items: Vec<usize> = (0..25).collect();
        let results = fan_out(items, 3, |item| {
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                item * 2
            }
        })
        .await;

        assert_eq!(results.len(), 25);
        assert_eq!(results[24], 48);
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_empty_input_and_zero_limit() {
        let results: Vec<u8> = fan_out(Vec::<u8>::new(), 0, |x| async move { x }).await;
        assert!(results.is_empty());

        let results = fan_out(vec![1, 2], 0, |x| async move { x + 1 }).await;
        assert_eq!(results, vec![2, 3]);
    }
}
