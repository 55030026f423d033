use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tokio::time::{sleep, Duration};

use super::storage::types::{MentorBroadcast, MentorBroadcastStatus, RecipientStatus};
use super::storage::Storage;
use crate::bot::TeamBot;

const POLL_INTERVAL: Duration = Duration::from_secs(10);
const ERROR_BACKOFF: Duration = Duration::from_secs(30);
const SEND_DELAY: Duration = Duration::from_millis(100);

/// Fixed-interval poll loop draining queued mentor→students messages.
pub async fn run_drainer(bot: TeamBot, storage: Arc<Storage>, running: Arc<AtomicBool>) {
    tracing::info!("Mentor broadcast drainer started");

    while running.load(Ordering::SeqCst) {
        match drain_pending(&bot, &storage).await {
            Ok(()) => sleep(POLL_INTERVAL).await,
            Err(err) => {
                tracing::error!("Mentor broadcast drain failed: {:?}", err);
                sleep(ERROR_BACKOFF).await;
            }
        }
    }

    tracing::info!("Mentor broadcast drainer stopped");
}

async fn drain_pending(bot: &TeamBot, storage: &Storage) -> anyhow::Result<()> {
    for broadcast in storage.pending_mentor_broadcasts().await? {
        if let Err(err) = process_broadcast(bot, storage, &broadcast).await {
            tracing::error!("Mentor broadcast #{} failed: {:?}", broadcast.id, err);

            let _ = storage
                .set_mentor_broadcast_status(broadcast.id, MentorBroadcastStatus::Failed, None)
                .await;
        }
    }

    Ok(())
}

async fn process_broadcast(
    bot: &TeamBot,
    storage: &Storage,
    broadcast: &MentorBroadcast,
) -> anyhow::Result<()> {
    storage
        .set_mentor_broadcast_status(broadcast.id, MentorBroadcastStatus::Sending, None)
        .await?;

    let recipients = storage.pending_broadcast_recipients(broadcast.id).await?;
    let mut sent = 0u32;

    for recipient in recipients {
        let result = bot
            .send_message(ChatId(recipient.student_id), broadcast.message_text.clone())
            .parse_mode(ParseMode::Html)
            .send()
            .await;

        match result {
            Ok(_) => {
                storage
                    .set_recipient_status(
                        broadcast.id,
                        recipient.student_id,
                        RecipientStatus::Sent,
                        None,
                    )
                    .await?;
                sent += 1;
            }
            Err(err) => {
                tracing::warn!(
                    "Mentor broadcast #{} to {} failed: {:?}",
                    broadcast.id,
                    recipient.student_id,
                    err
                );
                storage
                    .set_recipient_status(
                        broadcast.id,
                        recipient.student_id,
                        RecipientStatus::Failed,
                        Some(&err.to_string()),
                    )
                    .await?;
            }
        }

        sleep(SEND_DELAY).await;
    }

    storage
        .set_mentor_broadcast_status(broadcast.id, MentorBroadcastStatus::Completed, Some(sent))
        .await?;

    Ok(())
}
