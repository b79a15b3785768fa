//! Wave-based batch orchestration for provider calls.
//!
//! Requests are split into fixed-size chunks; chunks run in waves of
//! `concurrency` concurrent futures, waves sequentially. Any chunk failure
//! aborts the whole run, annotated with the chunk's position.

use futures::future::{BoxFuture, try_join_all};

use crate::error::{VerbiError, VerbiResult};
use crate::providers::{TranslationRequest, TranslationResponse};

/// Cumulative progress, reported once per completed chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    pub total: usize,
    pub completed: usize,
    pub percentage: u32,
}

/// Split requests into contiguous chunks of at most `batch_size`.
pub fn chunk_requests(
    items: Vec<TranslationRequest>,
    batch_size: usize,
) -> VerbiResult<Vec<Vec<TranslationRequest>>> {
    if batch_size == 0 {
        return Err(VerbiError::config("Batch size must be at least 1"));
    }

    let mut chunks = Vec::new();
    let mut current = Vec::with_capacity(batch_size.min(items.len()));
    for item in items {
        current.push(item);
        if current.len() == batch_size {
            chunks.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    Ok(chunks)
}

/// The async function a [`BatchProcessor`] runs for each chunk.
pub type ChunkFuture = BoxFuture<'static, VerbiResult<Vec<TranslationResponse>>>;

pub struct BatchProcessor {
    batch_size: usize,
    concurrency: usize,
    on_progress: Option<Box<dyn FnMut(&BatchProgress) + Send>>,
}

impl BatchProcessor {
    pub fn new(batch_size: usize, concurrency: usize) -> Self {
        BatchProcessor {
            batch_size,
            concurrency: concurrency.max(1),
            on_progress: None,
        }
    }

    pub fn on_progress(mut self, on_progress: impl FnMut(&BatchProgress) + Send + 'static) -> Self {
        self.on_progress = Some(Box::new(on_progress));
        self
    }

    /// Run `processor` over every chunk of `items`.
    ///
    /// Responses come back in chunk order regardless of completion order
    /// within a wave. On failure partial results are discarded; committed
    /// side effects of earlier waves are the caller's concern.
    pub async fn process<F>(
        &mut self,
        items: Vec<TranslationRequest>,
        processor: F,
    ) -> VerbiResult<Vec<TranslationResponse>>
    where
        F: Fn(Vec<TranslationRequest>) -> ChunkFuture,
    {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let total_items = items.len();
        let chunks = chunk_requests(items, self.batch_size)?;
        let total_chunks = chunks.len();

        let mut results = Vec::with_capacity(total_items);
        let mut completed_items = 0usize;

        let mut indexed = chunks.into_iter().enumerate().peekable();
        while indexed.peek().is_some() {
            let wave: Vec<_> = indexed.by_ref().take(self.concurrency).collect();
            let futures: Vec<_> = wave
                .into_iter()
                .map(|(index, chunk)| {
                    let chunk_len = chunk.len();
                    let future = processor(chunk);
                    async move {
                        match future.await {
                            Ok(responses) => Ok((chunk_len, responses)),
                            Err(source) => Err(VerbiError::Batch {
                                index: index + 1,
                                total: total_chunks,
                                source: Box::new(source),
                            }),
                        }
                    }
                })
                .collect();

            for (chunk_len, responses) in try_join_all(futures).await? {
                completed_items += chunk_len;
                if let Some(on_progress) = self.on_progress.as_mut() {
                    let percentage =
                        (completed_items as f64 / total_items as f64 * 100.0).round() as u32;
                    on_progress(&BatchProgress {
                        total: total_items,
                        completed: completed_items,
                        percentage,
                    });
                }
                results.extend(responses);
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn request(key: &str) -> TranslationRequest {
        TranslationRequest {
            key: key.to_string(),
            source_text: format!("text for {key}"),
            source_locale: "en".to_string(),
            target_locale: "fr".to_string(),
            context: None,
            glossary: Vec::new(),
        }
    }

    fn requests(count: usize) -> Vec<TranslationRequest> {
        (0..count).map(|i| request(&format!("k{i}"))).collect()
    }

    fn echo(chunk: Vec<TranslationRequest>) -> ChunkFuture {
        Box::pin(async move {
            Ok(chunk
                .iter()
                .map(|request| TranslationResponse {
                    key: request.key.clone(),
                    text: request.source_text.clone(),
                    confidence: None,
                    metadata: None,
                })
                .collect())
        })
    }

    // ========== Chunking Tests ==========

    #[test]
    fn test_chunk_sizes() {
        let chunks = chunk_requests(requests(130), 50).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 50);
        assert_eq!(chunks[1].len(), 50);
        assert_eq!(chunks[2].len(), 30);
    }

    #[test]
    fn test_chunk_exact_multiple() {
        let chunks = chunk_requests(requests(100), 50).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].len(), 50);
    }

    #[test]
    fn test_chunk_empty_input() {
        assert!(chunk_requests(Vec::new(), 50).unwrap().is_empty());
    }

    #[test]
    fn test_chunk_zero_batch_size_is_an_error() {
        assert!(chunk_requests(requests(3), 0).is_err());
    }

    // ========== Processing Tests ==========

    #[tokio::test]
    async fn test_results_keep_chunk_order() {
        let mut processor = BatchProcessor::new(2, 2);
        let responses = processor.process(requests(5), echo).await.unwrap();
        let keys: Vec<_> = responses.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["k0", "k1", "k2", "k3", "k4"]);
    }

    #[tokio::test]
    async fn test_progress_is_cumulative_per_chunk() {
        let events: Arc<Mutex<Vec<(usize, usize, u32)>>> = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&events);

        let mut processor = BatchProcessor::new(2, 2).on_progress(move |progress| {
            seen.lock()
                .unwrap()
                .push((progress.total, progress.completed, progress.percentage));
        });
        processor.process(requests(5), echo).await.unwrap();

        assert_eq!(
            *events.lock().unwrap(),
            vec![(5, 2, 40), (5, 4, 80), (5, 5, 100)]
        );
    }

    #[tokio::test]
    async fn test_empty_input_reports_nothing() {
        let fired = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&fired);

        let mut processor = BatchProcessor::new(2, 2).on_progress(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        let responses = processor.process(Vec::new(), echo).await.unwrap();

        assert!(responses.is_empty());
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failure_names_the_chunk() {
        let processor_fn = |chunk: Vec<TranslationRequest>| -> ChunkFuture {
            Box::pin(async move {
                if chunk.iter().any(|r| r.key == "k2") {
                    return Err(VerbiError::provider_server("mock", "boom"));
                }
                Ok(Vec::new())
            })
        };

        let mut processor = BatchProcessor::new(2, 2);
        let error = processor.process(requests(5), processor_fn).await.unwrap_err();
        let message = error.to_string();
        assert!(message.contains("Batch 2/3 failed"), "got: {message}");
        assert!(message.contains("boom"));
    }

    #[tokio::test]
    async fn test_waves_bound_concurrency() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_in_flight = Arc::new(AtomicUsize::new(0));

        let processor_fn = {
            let in_flight = Arc::clone(&in_flight);
            let max_in_flight = Arc::clone(&max_in_flight);
            move |chunk: Vec<TranslationRequest>| -> ChunkFuture {
                let in_flight = Arc::clone(&in_flight);
                let max_in_flight = Arc::clone(&max_in_flight);
                Box::pin(async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    max_in_flight.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    echo(chunk).await
                })
            }
        };

        let mut processor = BatchProcessor::new(1, 2);
        processor.process(requests(5), processor_fn).await.unwrap();

        assert_eq!(max_in_flight.load(Ordering::SeqCst), 2);
    }
}
