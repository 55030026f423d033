pub mod callback_data;

use std::sync::atomic::Ordering;

use teloxide::dptree::case;
use teloxide::prelude::*;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId, ParseMode,
};
use teloxide::RequestError;
use tokio::sync::mpsc;

use crate::bot::modules::admin::back_to_admin_keyboard;
use crate::bot::services::broadcaster::{
    run_broadcast, BroadcastButton, BroadcastOutcome, BroadcastPayload, BroadcastProgress,
    BroadcastSettings,
};
use crate::bot::states::{BroadcastDraft, Wizard, WizardState};
use crate::bot::tools::filter_callback_query;
use crate::bot::{AppState, BotHandler, BotHandlerInternal, TeamBot};

use self::callback_data::BroadcastCallbackData;

fn button(text: &str, data: BroadcastCallbackData) -> InlineKeyboardButton {
    InlineKeyboardButton {
        text: text.to_string(),
        kind: teloxide::types::InlineKeyboardButtonKind::CallbackData(data.to_string()),
    }
}

fn type_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![
            vec![
                button("📝 Текст", BroadcastCallbackData::Text),
                button("🖼 С фото", BroadcastCallbackData::Photo),
            ],
            vec![button("❌ Отмена", BroadcastCallbackData::Cancel)],
        ],
    }
}

fn confirm_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![vec![
            button("✅ Отправить", BroadcastCallbackData::Confirm),
            button("❌ Отмена", BroadcastCallbackData::Cancel),
        ]],
    }
}

fn stop_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![vec![button("⏹ Остановить", BroadcastCallbackData::Stop)]],
    }
}

pub async fn show_type_menu(
    bot: &TeamBot,
    chat_id: ChatId,
    message_id: MessageId,
) -> BotHandlerInternal {
    bot.edit_message_text(
        chat_id,
        message_id,
        "📢 <b>РАССЫЛКА</b>\n\nВыберите тип:",
    )
    .parse_mode(ParseMode::Html)
    .reply_markup(type_keyboard())
    .send()
    .await?;

    Ok(())
}

fn payload_from_draft(draft: &BroadcastDraft) -> BroadcastPayload {
    let text = format!("<b>{}</b>\n\n{}", draft.title, draft.text);

    match &draft.photo_id {
        Some(file_id) => BroadcastPayload::Photo {
            file_id: file_id.clone(),
            caption: text,
            button: draft.button.clone(),
        },
        None => BroadcastPayload::Text {
            text,
            button: draft.button.clone(),
        },
    }
}

fn payload_keyboard(button: &Option<BroadcastButton>) -> Option<InlineKeyboardMarkup> {
    button.as_ref().map(|button| InlineKeyboardMarkup {
        inline_keyboard: vec![vec![InlineKeyboardButton {
            text: button.text.clone(),
            kind: teloxide::types::InlineKeyboardButtonKind::Url(button.url.clone()),
        }]],
    })
}

async fn send_payload(
    bot: &TeamBot,
    chat_id: ChatId,
    payload: &BroadcastPayload,
) -> Result<(), RequestError> {
    match payload {
        BroadcastPayload::Text { text, button } => {
            let mut request = bot
                .send_message(chat_id, text.clone())
                .parse_mode(ParseMode::Html);
            if let Some(keyboard) = payload_keyboard(button) {
                request = request.reply_markup(keyboard);
            }
            request.send().await.map(|_| ())
        }
        BroadcastPayload::Photo {
            file_id,
            caption,
            button,
        } => {
            let mut request = bot
                .send_photo(chat_id, InputFile::file_id(file_id.clone()))
                .caption(caption.clone())
                .parse_mode(ParseMode::Html);
            if let Some(keyboard) = payload_keyboard(button) {
                request = request.reply_markup(keyboard);
            }
            request.send().await.map(|_| ())
        }
    }
}

fn progress_text(progress: &BroadcastProgress) -> String {
    format!(
        "📤 <b>ОТПРАВКА</b>\n\n👥 {}\n✅ {}\n❌ {}\n🚫 {}\n⏳ {}/{}",
        progress.total,
        progress.outcome.success,
        progress.outcome.failed,
        progress.outcome.blocked,
        progress.sent,
        progress.total,
    )
}

fn outcome_text(outcome: &BroadcastOutcome, total: u32) -> String {
    let percent = if total > 0 {
        outcome.success as f64 / total as f64 * 100.0
    } else {
        0.0
    };

    let mut text = format!(
        "✅ <b>ГОТОВО!</b>\n\n👥 {}\n✅ {}\n❌ {}\n🚫 {}\n📊 {:.1}%",
        total, outcome.success, outcome.failed, outcome.blocked, percent,
    );

    let skipped = total.saturating_sub(outcome.attempted());
    if skipped > 0 {
        text.push_str(&format!("\n⏹ Остановлено, пропущено: {skipped}"));
    }

    text
}

async fn type_callback_handler(
    cq: CallbackQuery,
    bot: TeamBot,
    dialogue: Wizard,
    callback_data: BroadcastCallbackData,
) -> BotHandlerInternal {
    bot.answer_callback_query(cq.id.clone()).send().await?;

    let message = match cq.message {
        Some(message) => message,
        None => return Ok(()),
    };
    let chat_id = message.chat().id;
    let message_id = message.id();

    match callback_data {
        BroadcastCallbackData::Text => {
            dialogue
                .update(WizardState::BroadcastTitle { photo_id: None })
                .await?;

            bot.edit_message_text(
                chat_id,
                message_id,
                "📢 <b>РАССЫЛКА — Шаг 1/3</b>\n\n✏️ Заголовок:",
            )
            .parse_mode(ParseMode::Html)
            .send()
            .await?;
        }
        BroadcastCallbackData::Photo => {
            dialogue.update(WizardState::BroadcastPhoto).await?;

            bot.edit_message_text(
                chat_id,
                message_id,
                "📢 <b>РАССЫЛКА С ФОТО</b>\n\n🖼 Отправьте фото:",
            )
            .parse_mode(ParseMode::Html)
            .send()
            .await?;
        }
        BroadcastCallbackData::Cancel => {
            dialogue.exit().await?;

            bot.edit_message_text(chat_id, message_id, "❌ Отменено")
                .reply_markup(back_to_admin_keyboard())
                .send()
                .await?;
        }
        _ => (),
    }

    Ok(())
}

async fn photo_step_handler(
    message: Message,
    bot: TeamBot,
    dialogue: Wizard,
) -> BotHandlerInternal {
    let photo_id = message
        .photo()
        .and_then(|sizes| sizes.last())
        .map(|size| size.file.id.clone());

    let photo_id = match photo_id {
        Some(photo_id) => photo_id,
        None => {
            bot.send_message(message.chat.id, "❌ Отправьте фото:")
                .send()
                .await?;
            return Ok(());
        }
    };

    dialogue
        .update(WizardState::BroadcastTitle {
            photo_id: Some(photo_id),
        })
        .await?;

    bot.send_message(message.chat.id, "📢 <b>Шаг 1/3</b>\n\n✏️ Заголовок:")
        .parse_mode(ParseMode::Html)
        .send()
        .await?;

    Ok(())
}

async fn title_step_handler(
    message: Message,
    bot: TeamBot,
    dialogue: Wizard,
    photo_id: Option<teloxide::types::FileId>,
) -> BotHandlerInternal {
    let title = match message.text() {
        Some(text) => text.trim().to_string(),
        None => {
            bot.send_message(message.chat.id, "❌ Отправьте текст заголовка:")
                .send()
                .await?;
            return Ok(());
        }
    };

    dialogue
        .update(WizardState::BroadcastText { photo_id, title })
        .await?;

    bot.send_message(message.chat.id, "📢 <b>Шаг 2/3</b>\n\n📝 Текст сообщения:")
        .parse_mode(ParseMode::Html)
        .send()
        .await?;

    Ok(())
}

async fn text_step_handler(
    message: Message,
    bot: TeamBot,
    dialogue: Wizard,
    (photo_id, title): (Option<teloxide::types::FileId>, String),
) -> BotHandlerInternal {
    let text = match message.text() {
        Some(text) => text.trim().to_string(),
        None => {
            bot.send_message(message.chat.id, "❌ Отправьте текст:")
                .send()
                .await?;
            return Ok(());
        }
    };

    dialogue
        .update(WizardState::BroadcastButton {
            photo_id,
            title,
            text,
        })
        .await?;

    bot.send_message(
        message.chat.id,
        "📢 <b>Шаг 3/3</b>\n\n\
         🔘 Кнопка (необязательно):\n\
         <code>Текст | https://ссылка</code>\n\n\
         Или <code>-</code> чтобы пропустить",
    )
    .parse_mode(ParseMode::Html)
    .send()
    .await?;

    Ok(())
}

fn parse_button(input: &str) -> Result<Option<BroadcastButton>, ()> {
    let input = input.trim();
    if input == "-" {
        return Ok(None);
    }

    let (text, url) = input.split_once('|').ok_or(())?;
    let text = text.trim();
    let url = url::Url::parse(url.trim()).map_err(|_| ())?;

    if text.is_empty() || !matches!(url.scheme(), "http" | "https") {
        return Err(());
    }

    Ok(Some(BroadcastButton {
        text: text.to_string(),
        url,
    }))
}

async fn button_step_handler(
    message: Message,
    bot: TeamBot,
    state: AppState,
    dialogue: Wizard,
    (photo_id, title, text): (Option<teloxide::types::FileId>, String, String),
) -> BotHandlerInternal {
    let button = match parse_button(message.text().unwrap_or_default()) {
        Ok(button) => button,
        Err(()) => {
            bot.send_message(
                message.chat.id,
                "❌ Формат: <code>Текст | https://ссылка</code>\nИли <code>-</code> чтобы пропустить",
            )
            .parse_mode(ParseMode::Html)
            .send()
            .await?;
            return Ok(());
        }
    };

    let recipients = state.storage.active_worker_ids().await?;

    let mut preview = format!(
        "📢 <b>ПРЕДПРОСМОТР</b>\n\n<b>{title}</b>\n\n{text}\n\n"
    );
    if let Some(button) = &button {
        preview.push_str(&format!("🔘 {}\n🔗 {}\n\n", button.text, button.url));
    }
    if photo_id.is_some() {
        preview.push_str("🖼 С фото\n\n");
    }
    preview.push_str(&format!("👥 Получателей: {}\n\nОтправить?", recipients.len()));

    dialogue
        .update(WizardState::BroadcastConfirm {
            draft: BroadcastDraft {
                photo_id,
                title,
                text,
                button,
            },
        })
        .await?;

    bot.send_message(message.chat.id, preview)
        .parse_mode(ParseMode::Html)
        .reply_markup(confirm_keyboard())
        .send()
        .await?;

    Ok(())
}

async fn confirm_callback_handler(
    cq: CallbackQuery,
    bot: TeamBot,
    state: AppState,
    dialogue: Wizard,
    callback_data: BroadcastCallbackData,
    draft: BroadcastDraft,
) -> BotHandlerInternal {
    let message = match cq.message {
        Some(message) => message,
        None => return Ok(()),
    };
    let chat_id = message.chat().id;
    let message_id = message.id();

    match callback_data {
        BroadcastCallbackData::Cancel => {
            bot.answer_callback_query(cq.id.clone()).send().await?;
            dialogue.exit().await?;

            bot.edit_message_text(chat_id, message_id, "❌ Отменено")
                .reply_markup(back_to_admin_keyboard())
                .send()
                .await?;
            return Ok(());
        }
        BroadcastCallbackData::Confirm => (),
        _ => return Ok(()),
    }

    bot.answer_callback_query(cq.id.clone())
        .text("Отправка...")
        .send()
        .await?;
    dialogue.exit().await?;

    let recipients: Vec<ChatId> = state
        .storage
        .active_worker_ids()
        .await?
        .into_iter()
        .map(ChatId)
        .collect();
    let total = recipients.len() as u32;

    bot.edit_message_text(
        chat_id,
        message_id,
        format!("📤 <b>ОТПРАВКА</b>\n\n👥 {total}\n✅ 0\n❌ 0"),
    )
    .parse_mode(ParseMode::Html)
    .reply_markup(stop_keyboard())
    .send()
    .await?;

    let cancel = state.broadcast_cancel.clone();
    cancel.store(false, Ordering::SeqCst);

    let payload = payload_from_draft(&draft);
    let admin_id = cq.from.id.0 as i64;
    let admin_username = cq.from.username.clone().unwrap_or_default();
    let storage = state.storage.clone();
    let task_bot = bot.clone();

    // The fan-out runs detached so the dispatcher stays responsive; the
    // status message doubles as the progress report.
    tokio::spawn(async move {
        let (progress_tx, mut progress_rx) = mpsc::channel::<BroadcastProgress>(8);

        let editor = {
            let bot = task_bot.clone();
            tokio::spawn(async move {
                while let Some(progress) = progress_rx.recv().await {
                    let _ = bot
                        .edit_message_text(chat_id, message_id, progress_text(&progress))
                        .parse_mode(ParseMode::Html)
                        .reply_markup(stop_keyboard())
                        .send()
                        .await;
                }
            })
        };

        let outcome = {
            let bot = task_bot.clone();
            let payload = payload.clone();
            run_broadcast(
                recipients,
                move |recipient| {
                    let bot = bot.clone();
                    let payload = payload.clone();
                    async move { send_payload(&bot, recipient, &payload).await }
                },
                BroadcastSettings::from_config(),
                cancel,
                Some(progress_tx),
            )
            .await
        };

        let _ = editor.await;

        storage
            .log_admin_action(
                admin_id,
                &admin_username,
                "broadcast",
                Some(&format!("{}/{}: {}", outcome.success, total, draft.title)),
                None,
            )
            .await;

        let _ = task_bot
            .edit_message_text(chat_id, message_id, outcome_text(&outcome, total))
            .parse_mode(ParseMode::Html)
            .reply_markup(back_to_admin_keyboard())
            .send()
            .await;
    });

    Ok(())
}

async fn stop_callback_handler(
    cq: CallbackQuery,
    bot: TeamBot,
    state: AppState,
) -> BotHandlerInternal {
    state.broadcast_cancel.store(true, Ordering::SeqCst);

    bot.answer_callback_query(cq.id)
        .text("⏹ Останавливаю...")
        .send()
        .await?;

    Ok(())
}

pub fn get_broadcast_handler() -> BotHandler {
    dptree::entry()
        .branch(
            Update::filter_callback_query()
                .chain(filter_callback_query::<BroadcastCallbackData>())
                .branch(
                    dptree::filter(|callback_data: BroadcastCallbackData| {
                        matches!(callback_data, BroadcastCallbackData::Stop)
                    })
                    .endpoint(stop_callback_handler),
                )
                .branch(
                    case![WizardState::BroadcastConfirm { draft }].endpoint(confirm_callback_handler),
                )
                .endpoint(type_callback_handler),
        )
        .branch(
            Update::filter_message()
                .branch(case![WizardState::BroadcastPhoto].endpoint(photo_step_handler))
                .branch(case![WizardState::BroadcastTitle { photo_id }].endpoint(title_step_handler))
                .branch(
                    case![WizardState::BroadcastText { photo_id, title }].endpoint(text_step_handler),
                )
                .branch(
                    case![WizardState::BroadcastButton {
                        photo_id,
                        title,
                        text
                    }]
                    .endpoint(button_step_handler),
                ),
        )
}

#[cfg(test)]
mod tests {
    use super::parse_button;

    #[test]
    fn dash_skips_the_button() {
        assert!(parse_button(" - ").unwrap().is_none());
    }

    #[test]
    fn parses_text_and_url() {
        let button = parse_button("Сайт | https://example.com/page").unwrap().unwrap();

        assert_eq!(button.text, "Сайт");
        assert_eq!(button.url.as_str(), "https://example.com/page");
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_button("просто текст").is_err());
        assert!(parse_button("Кнопка | не-ссылка").is_err());
        assert!(parse_button(" | https://example.com").is_err());
        assert!(parse_button("Кнопка | ftp://example.com").is_err());
    }
}
