pub mod callback_data;
pub mod commands;

use teloxide::dptree::case;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};

use crate::bot::modules::utils::{format_amount, header, require_active_worker};
use crate::bot::services::storage::types::ShareStatus;
use crate::bot::states::{Wizard, WizardState};
use crate::bot::tools::filter_callback_query;
use crate::bot::{AppState, BotHandler, BotHandlerInternal, TeamBot};

use self::callback_data::MentorPanelCallbackData;
use self::commands::MentorCommand;

fn panel_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![vec![InlineKeyboardButton {
            text: "✉️ Сообщение ученикам".to_string(),
            kind: teloxide::types::InlineKeyboardButtonKind::CallbackData(
                MentorPanelCallbackData::Message.to_string(),
            ),
        }]],
    }
}

fn confirm_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![vec![
            InlineKeyboardButton {
                text: "✅ Отправить".to_string(),
                kind: teloxide::types::InlineKeyboardButtonKind::CallbackData(
                    MentorPanelCallbackData::Confirm.to_string(),
                ),
            },
            InlineKeyboardButton {
                text: "❌ Отмена".to_string(),
                kind: teloxide::types::InlineKeyboardButtonKind::CallbackData(
                    MentorPanelCallbackData::Cancel.to_string(),
                ),
            },
        ]],
    }
}

async fn mentor_command_handler(
    message: Message,
    bot: TeamBot,
    state: AppState,
) -> BotHandlerInternal {
    let user_id = match &message.from {
        Some(user) => user.id,
        None => return Ok(()),
    };

    let worker = match require_active_worker(&bot, message.chat.id, &state.storage, user_id).await? {
        Some(worker) => worker,
        None => return Ok(()),
    };

    let mentor = match state.storage.mentor_by_user(worker.id).await? {
        Some(mentor) => mentor,
        None => {
            bot.send_message(message.chat.id, "Вы не наставник.")
                .send()
                .await?;
            return Ok(());
        }
    };

    let mut text = format!(
        "{}\n\n\
         🛠 Сервис: {}\n\
         💰 Комиссия: {}%\n\
         👥 Учеников: {}\n\
         💵 Заработано: {} RUB",
        header("КАБИНЕТ НАСТАВНИКА", "👨‍🏫"),
        mentor.service_name,
        mentor.percent,
        mentor.students_count,
        format_amount(mentor.total_earned),
    );

    let shares = state.storage.mentor_shares_of(worker.id).await?;
    if !shares.is_empty() {
        text.push_str("\n\n📜 Последние начисления:");
        for share in shares.iter().take(5) {
            text.push_str(&format!(
                "\n{} {} · {} RUB",
                match share.status {
                    ShareStatus::Hold => "⏳",
                    ShareStatus::Paid => "✅",
                },
                share.created_at.format("%d.%m.%Y"),
                format_amount(share.amount),
            ));
        }
    }

    bot.send_message(message.chat.id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(panel_keyboard())
        .send()
        .await?;

    Ok(())
}

async fn panel_callback_handler(
    cq: CallbackQuery,
    bot: TeamBot,
    state: AppState,
    dialogue: Wizard,
    callback_data: MentorPanelCallbackData,
) -> BotHandlerInternal {
    bot.answer_callback_query(cq.id.clone()).send().await?;

    let message = match cq.message {
        Some(message) => message,
        None => return Ok(()),
    };
    let chat_id = message.chat().id;

    match callback_data {
        MentorPanelCallbackData::Message => {
            if state.storage.mentor_by_user(cq.from.id.0 as i64).await?.is_none() {
                bot.send_message(chat_id, "Вы не наставник.").send().await?;
                return Ok(());
            }

            dialogue.update(WizardState::MentorMessage).await?;

            bot.send_message(chat_id, "✉️ Текст сообщения ученикам:")
                .send()
                .await?;
        }
        MentorPanelCallbackData::Cancel => {
            dialogue.exit().await?;

            bot.edit_message_text(chat_id, message.id(), "❌ Отменено")
                .send()
                .await?;
        }
        MentorPanelCallbackData::Confirm => {
            // Handled by the state-gated branch below.
        }
    }

    Ok(())
}

async fn message_text_handler(
    message: Message,
    bot: TeamBot,
    dialogue: Wizard,
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
        .update(WizardState::MentorMessageConfirm { text: text.clone() })
        .await?;

    bot.send_message(
        message.chat.id,
        format!("📨 <b>Предпросмотр</b>\n\n{text}\n\nОтправить ученикам?"),
    )
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
    callback_data: MentorPanelCallbackData,
    text: String,
) -> BotHandlerInternal {
    bot.answer_callback_query(cq.id.clone()).send().await?;

    let message = match cq.message {
        Some(message) => message,
        None => return Ok(()),
    };
    let chat_id = message.chat().id;

    match callback_data {
        MentorPanelCallbackData::Confirm => {
            let mentor = match state.storage.mentor_by_user(cq.from.id.0 as i64).await? {
                Some(mentor) => mentor,
                None => {
                    dialogue.exit().await?;
                    bot.send_message(chat_id, "Вы не наставник.").send().await?;
                    return Ok(());
                }
            };

            let students = state.storage.students_of(mentor.id).await?;
            if students.is_empty() {
                dialogue.exit().await?;
                bot.edit_message_text(chat_id, message.id(), "У вас пока нет учеников.")
                    .send()
                    .await?;
                return Ok(());
            }

            let student_ids: Vec<i64> = students.iter().map(|student| student.id).collect();
            state
                .storage
                .enqueue_mentor_broadcast(mentor.user_id, &text, &student_ids)
                .await?;
            dialogue.exit().await?;

            bot.edit_message_text(
                chat_id,
                message.id(),
                format!(
                    "✅ Сообщение поставлено в очередь для {} учеников.",
                    student_ids.len()
                ),
            )
            .send()
            .await?;
        }
        MentorPanelCallbackData::Cancel => {
            dialogue.exit().await?;

            bot.edit_message_text(chat_id, message.id(), "❌ Отменено")
                .send()
                .await?;
        }
        MentorPanelCallbackData::Message => {}
    }

    Ok(())
}

pub fn get_mentor_panel_handler() -> BotHandler {
    dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<MentorCommand>()
                .endpoint(mentor_command_handler),
        )
        .branch(
            Update::filter_callback_query()
                .chain(filter_callback_query::<MentorPanelCallbackData>())
                .branch(
                    case![WizardState::MentorMessageConfirm { text }]
                        .endpoint(confirm_callback_handler),
                )
                .endpoint(panel_callback_handler),
        )
        .branch(
            Update::filter_message()
                .branch(case![WizardState::MentorMessage].endpoint(message_text_handler)),
        )
}
