pub mod callback_data;

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode, User};

use crate::bot::modules::utils::header;
use crate::bot::services::notifier;
use crate::bot::services::storage::types::WorkerStatus;
use crate::bot::tools::filter_callback_query;
use crate::bot::{AppState, BotHandler, BotHandlerInternal, TeamBot};
use crate::config;

use self::callback_data::ApplicationCallbackData;

fn application_keyboard(user_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![vec![
            InlineKeyboardButton {
                text: "✅ Одобрить".to_string(),
                kind: teloxide::types::InlineKeyboardButtonKind::CallbackData(
                    ApplicationCallbackData::Approve { user_id }.to_string(),
                ),
            },
            InlineKeyboardButton {
                text: "❌ Отклонить".to_string(),
                kind: teloxide::types::InlineKeyboardButtonKind::CallbackData(
                    ApplicationCallbackData::Decline { user_id }.to_string(),
                ),
            },
        ]],
    }
}

pub async fn show_pending(bot: &TeamBot, chat_id: ChatId, state: &AppState) -> BotHandlerInternal {
    let pending = state
        .storage
        .workers_by_status(WorkerStatus::Pending)
        .await?;

    if pending.is_empty() {
        bot.send_message(chat_id, "📭 Новых заявок нет.")
            .send()
            .await?;
        return Ok(());
    }

    for worker in pending.iter().take(10) {
        let card = format!(
            "{}\n\n\
             👤 {} (@{})\n\
             🆔 <code>{}</code>\n\
             💼 Опыт: {}\n\
             📣 Источник: {}",
            header("ЗАЯВКА", "📥"),
            worker.full_name,
            worker.username,
            worker.id,
            worker.experience_text.as_deref().unwrap_or("—"),
            worker.source_text.as_deref().unwrap_or("—"),
        );

        bot.send_message(chat_id, card)
            .parse_mode(ParseMode::Html)
            .reply_markup(application_keyboard(worker.id))
            .send()
            .await?;
    }

    Ok(())
}

async fn application_callback_handler(
    cq: CallbackQuery,
    bot: TeamBot,
    state: AppState,
    callback_data: ApplicationCallbackData,
) -> BotHandlerInternal {
    bot.answer_callback_query(cq.id.clone()).send().await?;

    let message = match cq.message.as_ref() {
        Some(message) => message,
        None => return Ok(()),
    };
    let admin = &cq.from;

    match callback_data {
        ApplicationCallbackData::Approve { user_id } => {
            state
                .storage
                .update_worker_status(user_id, WorkerStatus::Active)
                .await?;

            let welcome = state
                .storage
                .setting("welcome_message")
                .await?
                .unwrap_or_else(|| "Добро пожаловать в команду!".to_string());

            notifier::send_direct(
                &bot,
                UserId(user_id as u64),
                format!(
                    "🎉 <b>Ваша заявка одобрена!</b>\n\n{}\n\n💬 Чат команды: {}",
                    welcome,
                    config::CONFIG.chat_group_url,
                ),
            );

            if let Err(err) = state
                .storage
                .create_notification(user_id, "approved", "🎉 Заявка одобрена", &welcome)
                .await
            {
                tracing::error!("Approve notification write failed: {:?}", err);
            }

            state
                .storage
                .log_admin_action(
                    admin.id.0 as i64,
                    admin.username.as_deref().unwrap_or(""),
                    "approve_user",
                    None,
                    Some(user_id),
                )
                .await;

            bot.edit_message_text(message.chat().id, message.id(), "✅ Одобрен")
                .send()
                .await?;
        }
        ApplicationCallbackData::Decline { user_id } => {
            state
                .storage
                .update_worker_status(user_id, WorkerStatus::Banned)
                .await?;

            notifier::send_direct(
                &bot,
                UserId(user_id as u64),
                "❌ <b>Ваша заявка отклонена</b>".to_string(),
            );

            state
                .storage
                .log_admin_action(
                    admin.id.0 as i64,
                    admin.username.as_deref().unwrap_or(""),
                    "decline_user",
                    None,
                    Some(user_id),
                )
                .await;

            bot.edit_message_text(message.chat().id, message.id(), "❌ Отклонен")
                .send()
                .await?;
        }
    }

    Ok(())
}

pub async fn ban_worker(
    bot: &TeamBot,
    state: &AppState,
    admin: &User,
    chat_id: ChatId,
    user_id: i64,
) -> BotHandlerInternal {
    if state.storage.worker(user_id).await?.is_none() {
        bot.send_message(chat_id, "❌ Воркер не найден").send().await?;
        return Ok(());
    }

    state
        .storage
        .update_worker_status(user_id, WorkerStatus::Banned)
        .await?;

    notifier::send_direct(bot, UserId(user_id as u64), "🚫 <b>Доступ запрещен</b>".to_string());

    state
        .storage
        .log_admin_action(
            admin.id.0 as i64,
            admin.username.as_deref().unwrap_or(""),
            "ban_user",
            None,
            Some(user_id),
        )
        .await;

    bot.send_message(chat_id, format!("🚫 Воркер <code>{user_id}</code> забанен"))
        .parse_mode(ParseMode::Html)
        .send()
        .await?;

    Ok(())
}

pub async fn unban_worker(
    bot: &TeamBot,
    state: &AppState,
    admin: &User,
    chat_id: ChatId,
    user_id: i64,
) -> BotHandlerInternal {
    if state.storage.worker(user_id).await?.is_none() {
        bot.send_message(chat_id, "❌ Воркер не найден").send().await?;
        return Ok(());
    }

    state
        .storage
        .update_worker_status(user_id, WorkerStatus::Active)
        .await?;

    notifier::send_direct(
        bot,
        UserId(user_id as u64),
        "♻️ <b>Доступ восстановлен</b>\n\nНапишите /start".to_string(),
    );

    state
        .storage
        .log_admin_action(
            admin.id.0 as i64,
            admin.username.as_deref().unwrap_or(""),
            "unban_user",
            None,
            Some(user_id),
        )
        .await;

    bot.send_message(
        chat_id,
        format!("♻️ Воркер <code>{user_id}</code> разбанен"),
    )
    .parse_mode(ParseMode::Html)
    .send()
    .await?;

    Ok(())
}

pub fn get_manage_handler() -> BotHandler {
    dptree::entry().branch(
        Update::filter_callback_query()
            .chain(filter_callback_query::<ApplicationCallbackData>())
            .endpoint(application_callback_handler),
    )
}
