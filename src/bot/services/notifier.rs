use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::bot::TeamBot;

/// Fire-and-forget delivery: a worker not receiving a message must never
/// fail the ledger operation that triggered it.
pub fn send_direct(bot: &TeamBot, user_id: UserId, text: String) {
    let bot = bot.clone();

    tokio::spawn(async move {
        if let Err(err) = bot
            .send_message(user_id, text)
            .parse_mode(ParseMode::Html)
            .send()
            .await
        {
            tracing::warn!("Direct notification to {} failed: {:?}", user_id, err);
        }
    });
}

pub fn send_to_channel(bot: &TeamBot, channel_id: ChatId, text: String) {
    let bot = bot.clone();

    tokio::spawn(async move {
        if let Err(err) = bot
            .send_message(channel_id, text)
            .parse_mode(ParseMode::Html)
            .send()
            .await
        {
            tracing::error!("Channel notification to {} failed: {:?}", channel_id, err);
        }
    });
}
