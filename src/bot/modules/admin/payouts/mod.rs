pub mod callback_data;

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, MessageId, ParseMode};

use crate::bot::modules::admin::callback_data::AdminMenuCallbackData;
use crate::bot::modules::utils::{format_amount, header};
use crate::bot::services::distribution::settlement::{settle_payouts, PayoutLedger};
use crate::bot::services::notifier;
use crate::bot::services::storage::types::UnpaidSummary;
use crate::bot::tools::filter_callback_query;
use crate::bot::{AppState, BotHandler, BotHandlerInternal, TeamBot};

use self::callback_data::PayoutCallbackData;

const LEDGERS: [PayoutLedger; 3] = [
    PayoutLedger::Worker,
    PayoutLedger::Referral,
    PayoutLedger::Mentor,
];

fn ledger_menu_keyboard() -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = LEDGERS
        .iter()
        .map(|ledger| {
            vec![InlineKeyboardButton {
                text: ledger.title().to_string(),
                kind: teloxide::types::InlineKeyboardButtonKind::CallbackData(
                    PayoutCallbackData::Ledger { ledger: *ledger }.to_string(),
                ),
            }]
        })
        .collect();

    rows.push(vec![InlineKeyboardButton {
        text: "← Админ панель".to_string(),
        kind: teloxide::types::InlineKeyboardButtonKind::CallbackData(
            AdminMenuCallbackData::Menu.to_string(),
        ),
    }]);

    InlineKeyboardMarkup {
        inline_keyboard: rows,
    }
}

fn summary_keyboard(ledger: PayoutLedger, summary: &[UnpaidSummary]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = summary
        .iter()
        .map(|entry| {
            vec![InlineKeyboardButton {
                text: format!(
                    "💸 @{} — {} RUB ({})",
                    entry.username,
                    format_amount(entry.total_amount),
                    entry.records_count,
                ),
                kind: teloxide::types::InlineKeyboardButtonKind::CallbackData(
                    PayoutCallbackData::Settle {
                        ledger,
                        user_id: entry.user_id,
                    }
                    .to_string(),
                ),
            }]
        })
        .collect();

    rows.push(vec![InlineKeyboardButton {
        text: "← Реестры".to_string(),
        kind: teloxide::types::InlineKeyboardButtonKind::CallbackData(
            PayoutCallbackData::Menu.to_string(),
        ),
    }]);

    InlineKeyboardMarkup {
        inline_keyboard: rows,
    }
}

pub async fn show_ledger_menu(
    bot: &TeamBot,
    chat_id: ChatId,
    message_id: MessageId,
) -> BotHandlerInternal {
    bot.edit_message_text(
        chat_id,
        message_id,
        format!("{}\n\n📒 Выберите реестр:", header("ВЫПЛАТЫ", "💸")),
    )
    .parse_mode(ParseMode::Html)
    .reply_markup(ledger_menu_keyboard())
    .send()
    .await?;

    Ok(())
}

async fn unpaid_summary(state: &AppState, ledger: PayoutLedger) -> anyhow::Result<Vec<UnpaidSummary>> {
    match ledger {
        PayoutLedger::Worker => state.storage.unpaid_worker_summary().await,
        PayoutLedger::Referral => state.storage.unpaid_referral_summary().await,
        PayoutLedger::Mentor => state.storage.unpaid_mentor_summary().await,
    }
}

async fn show_ledger(
    bot: &TeamBot,
    state: &AppState,
    chat_id: ChatId,
    message_id: MessageId,
    ledger: PayoutLedger,
) -> BotHandlerInternal {
    let summary = unpaid_summary(state, ledger).await?;

    let text = if summary.is_empty() {
        format!(
            "{}\n\n📒 {}\n\n✅ Все выплачено.",
            header("ВЫПЛАТЫ", "💸"),
            ledger.title(),
        )
    } else {
        let total: rust_decimal::Decimal =
            summary.iter().map(|entry| entry.total_amount).sum();

        format!(
            "{}\n\n📒 {}\n👥 Получателей: {}\n💰 Всего на удержании: {} RUB\n\nНажмите, чтобы выплатить:",
            header("ВЫПЛАТЫ", "💸"),
            ledger.title(),
            summary.len(),
            format_amount(total),
        )
    };

    bot.edit_message_text(chat_id, message_id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(summary_keyboard(ledger, &summary))
        .send()
        .await?;

    Ok(())
}

async fn payouts_callback_handler(
    cq: CallbackQuery,
    bot: TeamBot,
    state: AppState,
    callback_data: PayoutCallbackData,
) -> BotHandlerInternal {
    let message = match cq.message.as_ref() {
        Some(message) => message,
        None => return Ok(()),
    };
    let chat_id = message.chat().id;
    let message_id = message.id();

    match callback_data {
        PayoutCallbackData::Menu => {
            bot.answer_callback_query(cq.id.clone()).send().await?;
            show_ledger_menu(&bot, chat_id, message_id).await?;
        }
        PayoutCallbackData::Ledger { ledger } => {
            bot.answer_callback_query(cq.id.clone()).send().await?;
            show_ledger(&bot, &state, chat_id, message_id, ledger).await?;
        }
        PayoutCallbackData::Settle { ledger, user_id } => {
            let settled = settle_payouts(&state.storage, user_id, ledger).await?;

            bot.answer_callback_query(cq.id.clone())
                .text(format!("✅ Выплачено записей: {settled}"))
                .show_alert(true)
                .send()
                .await?;

            if settled > 0 {
                let admin = &cq.from;
                state
                    .storage
                    .log_admin_action(
                        admin.id.0 as i64,
                        admin.username.as_deref().unwrap_or(""),
                        "settle_payouts",
                        Some(&format!("{ledger}: {settled} records")),
                        Some(user_id),
                    )
                    .await;

                notifier::send_direct(
                    &bot,
                    UserId(user_id as u64),
                    format!(
                        "💸 <b>ВЫПЛАТА</b>\n\nВаши средства отправлены ({} записей).",
                        settled
                    ),
                );
            }

            show_ledger(&bot, &state, chat_id, message_id, ledger).await?;
        }
    }

    Ok(())
}

pub fn get_payouts_handler() -> BotHandler {
    dptree::entry().branch(
        Update::filter_callback_query()
            .chain(filter_callback_query::<PayoutCallbackData>())
            .endpoint(payouts_callback_handler),
    )
}
