pub mod callback_data;
pub mod commands;
pub mod formatter;

use teloxide::dptree::case;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, Me, ParseMode};

use crate::bot::modules::utils::require_active_worker;
use crate::bot::states::{Wizard, WizardState};
use crate::bot::tools::filter_callback_query;
use crate::bot::{AppState, BotHandler, BotHandlerInternal, TeamBot};

use self::callback_data::ProfileCallbackData;
use self::commands::ProfileCommand;
use self::formatter::{format_history, format_profile, format_referrals, referral_link};

fn profile_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![
            vec![InlineKeyboardButton {
                text: "💼 Кошелек".to_string(),
                kind: teloxide::types::InlineKeyboardButtonKind::CallbackData(
                    ProfileCallbackData::Wallet.to_string(),
                ),
            }],
            vec![InlineKeyboardButton {
                text: "🔗 Рефералы".to_string(),
                kind: teloxide::types::InlineKeyboardButtonKind::CallbackData(
                    ProfileCallbackData::Referrals.to_string(),
                ),
            }],
            vec![InlineKeyboardButton {
                text: "📜 История".to_string(),
                kind: teloxide::types::InlineKeyboardButtonKind::CallbackData(
                    ProfileCallbackData::History.to_string(),
                ),
            }],
        ],
    }
}

async fn me_command_handler(
    message: Message,
    bot: TeamBot,
    state: AppState,
    me: Me,
) -> BotHandlerInternal {
    let user_id = match &message.from {
        Some(user) => user.id,
        None => return Ok(()),
    };

    let worker = match require_active_worker(&bot, message.chat.id, &state.storage, user_id).await? {
        Some(worker) => worker,
        None => return Ok(()),
    };

    let data = match state.storage.profile_data(worker).await {
        Ok(data) => data,
        Err(err) => {
            bot.send_message(message.chat.id, "Ошибка! Попробуйте позже :(")
                .send()
                .await?;
            return Err(err.into());
        }
    };

    bot.send_message(message.chat.id, format_profile(&data, me.username()))
        .parse_mode(ParseMode::Html)
        .reply_markup(profile_keyboard())
        .send()
        .await?;

    Ok(())
}

async fn profile_callback_handler(
    cq: CallbackQuery,
    bot: TeamBot,
    state: AppState,
    dialogue: Wizard,
    callback_data: ProfileCallbackData,
    me: Me,
) -> BotHandlerInternal {
    bot.answer_callback_query(cq.id.clone()).send().await?;

    let chat_id = match cq.message.as_ref() {
        Some(message) => message.chat().id,
        None => ChatId(cq.from.id.0 as i64),
    };

    let worker = match require_active_worker(&bot, chat_id, &state.storage, cq.from.id).await? {
        Some(worker) => worker,
        None => return Ok(()),
    };

    match callback_data {
        ProfileCallbackData::Wallet => {
            dialogue.update(WizardState::SetWallet).await?;

            bot.send_message(
                chat_id,
                "💼 <b>Кошелек для выплат</b>\n\nОтправьте адрес:",
            )
            .parse_mode(ParseMode::Html)
            .send()
            .await?;
        }
        ProfileCallbackData::Referrals => {
            let (referrals, shares) = tokio::join!(
                state.storage.referrals_of(worker.id),
                state.storage.referral_shares_of(worker.id),
            );

            let link = referral_link(me.username(), worker.id);
            bot.send_message(
                chat_id,
                format_referrals(&link, &worker, &referrals?, &shares?),
            )
            .parse_mode(ParseMode::Html)
            .send()
            .await?;
        }
        ProfileCallbackData::History => {
            let records = state.storage.worker_profits(worker.id, 10).await?;

            bot.send_message(chat_id, format_history(&records))
                .parse_mode(ParseMode::Html)
                .send()
                .await?;
        }
    }

    Ok(())
}

async fn wallet_handler(
    message: Message,
    bot: TeamBot,
    state: AppState,
    dialogue: Wizard,
) -> BotHandlerInternal {
    let user_id = match &message.from {
        Some(user) => user.id.0 as i64,
        None => return Ok(()),
    };

    let wallet = message.text().map(str::trim).unwrap_or_default();
    if wallet.len() < 10 || wallet.len() > 120 || wallet.contains(char::is_whitespace) {
        bot.send_message(message.chat.id, "❌ Неверный адрес. Попробуйте снова:")
            .send()
            .await?;
        return Ok(());
    }

    state.storage.set_worker_wallet(user_id, wallet).await?;
    dialogue.exit().await?;

    bot.send_message(message.chat.id, "✅ Кошелек сохранен")
        .send()
        .await?;

    Ok(())
}

pub fn get_profile_handler() -> BotHandler {
    dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<ProfileCommand>()
                .endpoint(me_command_handler),
        )
        .branch(
            Update::filter_callback_query()
                .chain(filter_callback_query::<ProfileCallbackData>())
                .endpoint(profile_callback_handler),
        )
        .branch(
            Update::filter_message().branch(case![WizardState::SetWallet].endpoint(wallet_handler)),
        )
}
