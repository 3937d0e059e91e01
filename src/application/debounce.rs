// Collapse-to-last debouncing for pointer and keystroke events
use futures::{Stream, StreamExt};
use std::time::Duration;

enum Step<T> {
    Newer(T),
    Elapsed,
    Closed,
}

/// Emits an item only once `window` passes with no newer item; each new
/// item cancels the pending one and restarts the timer. A pending item is
/// flushed when the input ends.
pub fn debounce<S>(input: S, window: Duration) -> impl Stream<Item = S::Item>
where
    S: Stream,
{
    async_stream::stream! {
        futures::pin_mut!(input);
        let mut pending = None;
        loop {
            let Some(current) = pending.take() else {
                match input.next().await {
                    Some(item) => {
                        pending = Some(item);
                        continue;
                    }
                    None => break,
                }
            };

            let step = tokio::select! {
                next = input.next() => match next {
                    Some(item) => Step::Newer(item),
                    None => Step::Closed,
                },
                _ = tokio::time::sleep(window) => Step::Elapsed,
            };
            match step {
                Step::Newer(item) => pending = Some(item),
                Step::Elapsed => yield current,
                Step::Closed => {
                    yield current;
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use tokio::time::sleep;
    use tokio_stream::wrappers::ReceiverStream;

    async fn run(script: Vec<(u64, u32)>, window_ms: u64) -> Vec<u32> {
        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(async move {
            for (delay_ms, value) in script {
                sleep(Duration::from_millis(delay_ms)).await;
                let _ = tx.send(value).await;
            }
        });
        debounce(ReceiverStream::new(rx), Duration::from_millis(window_ms))
            .collect()
            .await
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_collapses_to_last() {
        let out = run(vec![(0, 1), (10, 2), (10, 3), (100, 4)], 30).await;
        assert_eq!(out, vec![3, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_event_restarts_timer() {
        let out = run(vec![(0, 1), (20, 2), (20, 3), (20, 4), (20, 5)], 30).await;
        assert_eq!(out, vec![5]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_events_all_pass() {
        let out = run(vec![(0, 1), (50, 2), (50, 3)], 30).await;
        assert_eq!(out, vec![1, 2, 3]);
    }
}
