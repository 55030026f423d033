use rust_decimal::Decimal;
use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::bot::services::storage::types::{Worker, WorkerStatus};
use crate::bot::services::storage::Storage;
use crate::bot::TeamBot;

pub fn header(title: &str, emoji: &str) -> String {
    format!("{emoji} <b>{title}</b>")
}

pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}

/// Resolves the sender to an active worker, answering with the right
/// status message otherwise.
pub async fn require_active_worker(
    bot: &TeamBot,
    chat_id: ChatId,
    storage: &Storage,
    user_id: UserId,
) -> Result<Option<Worker>, Box<dyn std::error::Error + Send + Sync>> {
    let worker = storage.worker(user_id.0 as i64).await?;

    let message = match worker {
        Some(worker) if worker.status == WorkerStatus::Active => return Ok(Some(worker)),
        Some(worker) if worker.status == WorkerStatus::Pending => {
            "⏳ <b>Ваша анкета на рассмотрении</b>\n\n⏱ Ждите одобрения администратора."
        }
        Some(_) => "🚫 <b>Доступ запрещен</b>",
        None => "Вы не зарегистрированы. Напишите /start",
    };

    bot.send_message(chat_id, message)
        .parse_mode(ParseMode::Html)
        .send()
        .await?;

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::format_amount;
    use rust_decimal::Decimal;

    #[test]
    fn amounts_display_with_two_decimals() {
        assert_eq!(format_amount(Decimal::new(123_456, 2)), "1234.56");
        assert_eq!(format_amount(Decimal::from(882)), "882.00");
        assert_eq!(format_amount(Decimal::new(1005, 3)), "1.01");
    }
}
