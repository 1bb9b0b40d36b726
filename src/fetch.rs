//! Bounded-concurrency fetch with per-request timeout and retry.
//!
//! Replaces the fixed lockstep batch loop of the earlier playlist scripts:
//! at most `concurrency` requests are in flight, each with its own timeout
//! and a bounded retry with doubling backoff. Failures never silently shrink
//! the result set; they are counted in the returned [`FetchReport`].

use std::future::Future;
use std::time::Duration;

use futures::StreamExt;
use tracing::warn;

use crate::errors::FetchError;

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub concurrency: usize,
    pub timeout: Duration,
    pub retries: u32,
    pub initial_backoff: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            concurrency: 8,
            timeout: Duration::from_secs(15),
            retries: 2,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

/// Outcome accounting for one batched fetch run.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub succeeded: usize,
    pub failed: Vec<FetchError>,
}

impl FetchReport {
    pub fn dropped(&self) -> usize {
        self.failed.len()
    }
}

/// Run `fetch(id)` for every id with bounded concurrency. The returned
/// values are slot-aligned with the input ids: a failed request leaves
/// `None` in its slot, so pairing results back to their ids stays sound
/// even after partial failures.
pub async fn fetch_all<T, F, Fut>(
    ids: &[String],
    options: &FetchOptions,
    fetch: F,
) -> (Vec<Option<T>>, FetchReport)
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let fetch = &fetch;
    let results: Vec<(String, Result<T, FetchError>)> = futures::stream::iter(ids.iter().cloned())
        .map(|id| async move {
            let result = fetch_with_retry(id.clone(), options, fetch).await;
            (id, result)
        })
        .buffered(options.concurrency.max(1))
        .collect()
        .await;

    let mut values = Vec::with_capacity(results.len());
    let mut report = FetchReport::default();
    for (id, result) in results {
        match result {
            Ok(value) => {
                values.push(Some(value));
                report.succeeded += 1;
            }
            Err(err) => {
                warn!(id = %id, error = %err, "dropping failed request");
                values.push(None);
                report.failed.push(err);
            }
        }
    }
    (values, report)
}

async fn fetch_with_retry<T, F, Fut>(
    id: String,
    options: &FetchOptions,
    fetch: &F,
) -> Result<T, FetchError>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let attempts = options.retries + 1;
    let mut delay = options.initial_backoff;
    let mut timed_out = false;
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        match tokio::time::timeout(options.timeout, fetch(id.clone())).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(err)) => {
                timed_out = false;
                last_error = err.to_string();
            }
            Err(_) => {
                timed_out = true;
            }
        }
        if attempt < attempts {
            tokio::time::sleep(delay).await;
            delay *= 2;
        }
    }

    if timed_out {
        Err(FetchError::Timeout {
            id,
            seconds: options.timeout.as_secs(),
        })
    } else {
        Err(FetchError::Exhausted {
            id,
            attempts,
            reason: last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn quick_options() -> FetchOptions {
        FetchOptions {
            concurrency: 4,
            timeout: Duration::from_millis(200),
            retries: 2,
            initial_backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn preserves_input_order() {
        let ids: Vec<String> = (0..20).map(|i| i.to_string()).collect();
        let (values, report) = fetch_all(&ids, &quick_options(), |id| async move {
            Ok::<_, anyhow::Error>(format!("v{id}"))
        })
        .await;
        let expected: Vec<Option<String>> = (0..20).map(|i| Some(format!("v{i}"))).collect();
        assert_eq!(values, expected);
        assert_eq!(report.succeeded, 20);
        assert_eq!(report.dropped(), 0);
    }

    #[tokio::test]
    async fn failed_slots_stay_aligned_with_their_ids() {
        let ids = vec![
            "news".to_string(),
            "sports".to_string(),
            "movies".to_string(),
        ];
        let (values, report) = fetch_all(&ids, &quick_options(), |id| async move {
            if id == "sports" {
                anyhow::bail!("category unavailable")
            }
            Ok(format!("streams-of-{id}"))
        })
        .await;

        // The failure must not shift later results into earlier slots.
        assert_eq!(
            values,
            vec![
                Some("streams-of-news".to_string()),
                None,
                Some("streams-of-movies".to_string()),
            ]
        );
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.dropped(), 1);
    }

    #[tokio::test]
    async fn retries_transient_failures() {
        let attempts: Mutex<HashMap<String, u32>> = Mutex::new(HashMap::new());
        let ids = vec!["a".to_string(), "b".to_string()];

        let (values, report) = fetch_all(&ids, &quick_options(), |id| {
            let n = {
                let mut map = attempts.lock().unwrap();
                let entry = map.entry(id.clone()).or_insert(0);
                *entry += 1;
                *entry
            };
            async move {
                if n < 2 {
                    anyhow::bail!("flaky")
                }
                Ok(id)
            }
        })
        .await;

        assert_eq!(values, vec![Some("a".to_string()), Some("b".to_string())]);
        assert_eq!(report.succeeded, 2);
        assert!(report.failed.is_empty());
    }

    #[tokio::test]
    async fn exhausted_requests_are_counted_not_silently_dropped() {
        let ids = vec!["good".to_string(), "bad".to_string()];
        let (values, report) = fetch_all(&ids, &quick_options(), |id| async move {
            if id == "bad" {
                anyhow::bail!("always broken")
            }
            Ok(id)
        })
        .await;

        assert_eq!(values, vec![Some("good".to_string()), None]);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.dropped(), 1);
        assert!(matches!(
            report.failed[0],
            FetchError::Exhausted { attempts: 3, .. }
        ));
    }

    #[tokio::test]
    async fn slow_requests_time_out() {
        let options = FetchOptions {
            retries: 0,
            ..quick_options()
        };
        let ids = vec!["slow".to_string()];
        let (values, report) = fetch_all(&ids, &options, |_id| async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, anyhow::Error>(())
        })
        .await;

        assert_eq!(values, vec![None]);
        assert!(matches!(report.failed[0], FetchError::Timeout { .. }));
    }
}
