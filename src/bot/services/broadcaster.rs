use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use teloxide::types::{ChatId, FileId};
use teloxide::{ApiError, RequestError};
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout, Duration};

use crate::config;

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Copy)]
pub struct BroadcastSettings {
    pub delay: Duration,
    pub batch_size: u32,
}

impl BroadcastSettings {
    pub fn from_config() -> Self {
        BroadcastSettings {
            delay: Duration::from_millis(config::CONFIG.broadcast_delay_ms),
            batch_size: config::CONFIG.broadcast_batch_size,
        }
    }
}

#[derive(Clone)]
pub struct BroadcastButton {
    pub text: String,
    pub url: url::Url,
}

#[derive(Clone)]
pub enum BroadcastPayload {
    Text {
        text: String,
        button: Option<BroadcastButton>,
    },
    Photo {
        file_id: FileId,
        caption: String,
        button: Option<BroadcastButton>,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BroadcastOutcome {
    pub success: u32,
    pub failed: u32,
    pub blocked: u32,
}

impl BroadcastOutcome {
    pub fn attempted(&self) -> u32 {
        self.success + self.failed + self.blocked
    }
}

#[derive(Clone, Copy, Debug)]
pub struct BroadcastProgress {
    pub sent: u32,
    pub total: u32,
    pub outcome: BroadcastOutcome,
}

enum Delivery {
    Delivered,
    Blocked,
    Retry(Duration),
    Failed,
}

fn classify(result: &Result<(), RequestError>) -> Delivery {
    match result {
        Ok(()) => Delivery::Delivered,
        Err(RequestError::Api(ApiError::BotBlocked))
        | Err(RequestError::Api(ApiError::UserDeactivated)) => Delivery::Blocked,
        Err(RequestError::RetryAfter(seconds)) => Delivery::Retry(seconds.duration()),
        Err(_) => Delivery::Failed,
    }
}

/// Sequential best-effort fan-out with a tally of exactly three outcomes.
/// One retry after an explicit rate-limit backoff, nothing else is retried.
///
/// Not resumable: there is no record of who was already reached, so a
/// re-run resends to everyone.
pub async fn run_broadcast<S, Fut>(
    recipients: Vec<ChatId>,
    send_one: S,
    settings: BroadcastSettings,
    cancel: Arc<AtomicBool>,
    progress: Option<mpsc::Sender<BroadcastProgress>>,
) -> BroadcastOutcome
where
    S: Fn(ChatId) -> Fut,
    Fut: Future<Output = Result<(), RequestError>>,
{
    let total = recipients.len() as u32;
    let batch_size = settings.batch_size.max(1);
    let mut outcome = BroadcastOutcome::default();

    for (index, chat_id) in recipients.into_iter().enumerate() {
        if cancel.load(Ordering::SeqCst) {
            break;
        }

        // A per-recipient timeout counts as a plain failure, no retry.
        let delivery = match timeout(SEND_TIMEOUT, send_one(chat_id)).await {
            Ok(result) => classify(&result),
            Err(_) => Delivery::Failed,
        };

        match delivery {
            Delivery::Delivered => outcome.success += 1,
            Delivery::Blocked => outcome.blocked += 1,
            Delivery::Failed => outcome.failed += 1,
            Delivery::Retry(backoff) => {
                sleep(backoff).await;

                let retried = match timeout(SEND_TIMEOUT, send_one(chat_id)).await {
                    Ok(result) => classify(&result),
                    Err(_) => Delivery::Failed,
                };
                match retried {
                    Delivery::Delivered => outcome.success += 1,
                    Delivery::Blocked => outcome.blocked += 1,
                    _ => outcome.failed += 1,
                }
            }
        }

        let sent = index as u32 + 1;
        if sent % batch_size == 0 {
            if let Some(progress) = &progress {
                let _ = progress
                    .send(BroadcastProgress {
                        sent,
                        total,
                        outcome,
                    })
                    .await;
            }
        }

        sleep(settings.delay).await;
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicU32;
    use std::sync::Mutex;
    use teloxide::types::Seconds;

    fn scripted_sender(
        script: Vec<(i64, Vec<Result<(), RequestError>>)>,
    ) -> (
        Arc<Mutex<HashMap<i64, VecDeque<Result<(), RequestError>>>>>,
        Arc<AtomicU32>,
    ) {
        let map: HashMap<_, _> = script
            .into_iter()
            .map(|(id, results)| (id, results.into_iter().collect()))
            .collect();

        (Arc::new(Mutex::new(map)), Arc::new(AtomicU32::new(0)))
    }

    fn pop(
        script: &Arc<Mutex<HashMap<i64, VecDeque<Result<(), RequestError>>>>>,
        chat_id: ChatId,
    ) -> Result<(), RequestError> {
        script
            .lock()
            .unwrap()
            .get_mut(&chat_id.0)
            .and_then(|results| results.pop_front())
            .unwrap_or(Ok(()))
    }

    #[tokio::test]
    async fn tallies_three_outcomes() {
        let (script, attempts) = scripted_sender(vec![
            (1, vec![Ok(())]),
            (2, vec![Err(RequestError::Api(ApiError::BotBlocked))]),
            (
                3,
                vec![
                    Err(RequestError::RetryAfter(Seconds::from_seconds(0))),
                    Ok(()),
                ],
            ),
            (
                4,
                vec![Err(RequestError::Api(ApiError::Unknown("boom".into())))],
            ),
            (
                5,
                vec![
                    Err(RequestError::RetryAfter(Seconds::from_seconds(0))),
                    Err(RequestError::Api(ApiError::Unknown("boom".into()))),
                ],
            ),
        ]);

        let outcome = {
            let script = script.clone();
            let attempts = attempts.clone();
            run_broadcast(
                (1..=5).map(ChatId).collect(),
                move |chat_id| {
                    let script = script.clone();
                    let attempts = attempts.clone();
                    async move {
                        attempts.fetch_add(1, Ordering::SeqCst);
                        pop(&script, chat_id)
                    }
                },
                BroadcastSettings {
                    delay: Duration::ZERO,
                    batch_size: 20,
                },
                Arc::new(AtomicBool::new(false)),
                None,
            )
            .await
        };

        assert_eq!(outcome.success, 2);
        assert_eq!(outcome.blocked, 1);
        assert_eq!(outcome.failed, 2);
        // Two of five recipients hit the single-retry path.
        assert_eq!(attempts.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn cancel_stops_the_run() {
        let cancel = Arc::new(AtomicBool::new(true));

        let outcome = run_broadcast(
            vec![ChatId(1), ChatId(2)],
            |_| async { Ok(()) },
            BroadcastSettings {
                delay: Duration::ZERO,
                batch_size: 20,
            },
            cancel,
            None,
        )
        .await;

        assert_eq!(outcome.attempted(), 0);
    }

    #[tokio::test]
    async fn rerun_resends_to_everyone() {
        let attempts = Arc::new(AtomicU32::new(0));

        for _ in 0..2 {
            let attempts = attempts.clone();
            run_broadcast(
                vec![ChatId(1), ChatId(2), ChatId(3)],
                move |_| {
                    let attempts = attempts.clone();
                    async move {
                        attempts.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                },
                BroadcastSettings {
                    delay: Duration::ZERO,
                    batch_size: 20,
                },
                Arc::new(AtomicBool::new(false)),
                None,
            )
            .await;
        }

        // No delivery record survives a run: the second pass hits all three
        // recipients again.
        assert_eq!(attempts.load(Ordering::SeqCst), 6);
    }
}
