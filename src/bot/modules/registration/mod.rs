pub mod callback_data;
pub mod commands;

use teloxide::dptree::case;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};

use crate::bot::modules::admin::manage::callback_data::ApplicationCallbackData;
use crate::bot::modules::utils::header;
use crate::bot::services::storage::types::WorkerStatus;
use crate::bot::states::{Wizard, WizardState};
use crate::bot::tools::filter_callback_query;
use crate::bot::{AppState, BotHandler, BotHandlerInternal, TeamBot};
use crate::config;

use self::callback_data::RegistrationCallbackData;
use self::commands::StartCommand;

fn agreement_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![vec![
            InlineKeyboardButton {
                text: "✅ Принимаю".to_string(),
                kind: teloxide::types::InlineKeyboardButtonKind::CallbackData(
                    RegistrationCallbackData::Accept.to_string(),
                ),
            },
            InlineKeyboardButton {
                text: "❌ Отказываюсь".to_string(),
                kind: teloxide::types::InlineKeyboardButtonKind::CallbackData(
                    RegistrationCallbackData::Decline.to_string(),
                ),
            },
        ]],
    }
}

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

fn main_menu_text() -> String {
    format!(
        "{}\n\n\
         👤 /me — Профиль\n\
         🏆 /top — Топ воркеров\n\
         🛠 /services — Сервисы\n\
         🆘 /help — Команды",
        header("ГЛАВНОЕ МЕНЮ", "🏠")
    )
}

async fn start_handler(
    message: Message,
    bot: TeamBot,
    state: AppState,
    dialogue: Wizard,
    command: StartCommand,
) -> BotHandlerInternal {
    let StartCommand::Start(payload) = command;

    let user = match &message.from {
        Some(user) => user.clone(),
        None => return Ok(()),
    };
    let user_id = user.id.0 as i64;

    if let Some(worker) = state.storage.worker(user_id).await? {
        let text = match worker.status {
            WorkerStatus::Active => main_menu_text(),
            WorkerStatus::Pending => {
                "⏳ <b>Ваша анкета на рассмотрении</b>\n\n⏱ Ждите одобрения администратора."
                    .to_string()
            }
            WorkerStatus::Banned => "🚫 <b>Доступ запрещен</b>".to_string(),
        };

        bot.send_message(message.chat.id, text)
            .parse_mode(ParseMode::Html)
            .send()
            .await?;

        return Ok(());
    }

    // Referral deep link: /start ref<id>. Self-referral is dropped.
    let referrer_id = payload
        .strip_prefix("ref")
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .filter(|referrer_id| *referrer_id != user_id);

    dialogue
        .update(WizardState::RegAgreement { referrer_id })
        .await?;

    let text = format!(
        "{}\n\n\
         🔷 <b>СОГЛАШЕНИЕ</b>\n\
         ✅ Соблюдать правила команды\n\
         ✅ Поддерживать конфиденциальность\n\
         ✅ Работать профессионально\n\n\
         ❓ Вы принимаете условия?",
        header("ДОБРО ПОЖАЛОВАТЬ!", "🔷")
    );

    bot.send_message(message.chat.id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(agreement_keyboard())
        .send()
        .await?;

    Ok(())
}

async fn agreement_callback_handler(
    cq: CallbackQuery,
    bot: TeamBot,
    dialogue: Wizard,
    callback_data: RegistrationCallbackData,
    referrer_id: Option<i64>,
) -> BotHandlerInternal {
    bot.answer_callback_query(cq.id.clone()).send().await?;

    let message = match cq.message {
        Some(message) => message,
        None => return Ok(()),
    };

    match callback_data {
        RegistrationCallbackData::Accept => {
            dialogue
                .update(WizardState::RegExperience { referrer_id })
                .await?;

            bot.edit_message_text(
                message.chat().id,
                message.id(),
                format!(
                    "{}\n\n💼 <b>Какой у вас опыт работы?</b>\n\nОпишите в свободной форме:",
                    header("РЕГИСТРАЦИЯ", "📝")
                ),
            )
            .parse_mode(ParseMode::Html)
            .send()
            .await?;
        }
        RegistrationCallbackData::Decline => {
            dialogue.exit().await?;

            bot.edit_message_text(
                message.chat().id,
                message.id(),
                "❌ <b>Регистрация отменена</b>\n\n💬 Если передумаете, напишите /start",
            )
            .parse_mode(ParseMode::Html)
            .send()
            .await?;
        }
    }

    Ok(())
}

async fn experience_handler(
    message: Message,
    bot: TeamBot,
    dialogue: Wizard,
    referrer_id: Option<i64>,
) -> BotHandlerInternal {
    let experience = match message.text() {
        Some(text) => text.trim().to_string(),
        None => {
            bot.send_message(message.chat.id, "❌ Отправьте текст:")
                .send()
                .await?;
            return Ok(());
        }
    };

    dialogue
        .update(WizardState::RegSource {
            referrer_id,
            experience,
        })
        .await?;

    bot.send_message(
        message.chat.id,
        "📣 <b>Откуда вы узнали о команде?</b>",
    )
    .parse_mode(ParseMode::Html)
    .send()
    .await?;

    Ok(())
}

async fn source_handler(
    message: Message,
    bot: TeamBot,
    state: AppState,
    dialogue: Wizard,
    (referrer_id, experience): (Option<i64>, String),
) -> BotHandlerInternal {
    let source = match message.text() {
        Some(text) => text.trim().to_string(),
        None => {
            bot.send_message(message.chat.id, "❌ Отправьте текст:")
                .send()
                .await?;
            return Ok(());
        }
    };

    let user = match &message.from {
        Some(user) => user.clone(),
        None => return Ok(()),
    };
    let user_id = user.id.0 as i64;
    let username = user.username.clone().unwrap_or_default();

    state
        .storage
        .create_worker(
            user_id,
            &username,
            &user.full_name(),
            Some(&experience),
            &source,
            referrer_id,
        )
        .await?;
    dialogue.exit().await?;

    let referrer_line = match referrer_id {
        Some(referrer_id) => format!("🔗 Пригласил: <code>{referrer_id}</code>\n"),
        None => String::new(),
    };
    let application = format!(
        "{}\n\n\
         👤 {} (@{})\n\
         🆔 <code>{}</code>\n\
         💼 Опыт: {}\n\
         📣 Источник: {}\n\
         {}",
        header("НОВАЯ ЗАЯВКА", "📥"),
        user.full_name(),
        username,
        user_id,
        experience,
        source,
        referrer_line,
    );

    // The application card is best-effort: the row is already created.
    if let Err(err) = bot
        .send_message(config::CONFIG.applications_channel_id, application)
        .parse_mode(ParseMode::Html)
        .reply_markup(application_keyboard(user_id))
        .send()
        .await
    {
        tracing::error!("Application channel post failed: {:?}", err);
    }

    bot.send_message(
        message.chat.id,
        "✅ <b>Анкета отправлена!</b>\n\n⏱ Ждите одобрения администратора.",
    )
    .parse_mode(ParseMode::Html)
    .send()
    .await?;

    Ok(())
}

pub fn get_registration_handler() -> BotHandler {
    dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<StartCommand>()
                .endpoint(start_handler),
        )
        .branch(
            Update::filter_callback_query()
                .chain(filter_callback_query::<RegistrationCallbackData>())
                .branch(
                    case![WizardState::RegAgreement { referrer_id }]
                        .endpoint(agreement_callback_handler),
                ),
        )
        .branch(
            Update::filter_message()
                .branch(case![WizardState::RegExperience { referrer_id }].endpoint(experience_handler))
                .branch(
                    case![WizardState::RegSource {
                        referrer_id,
                        experience
                    }]
                    .endpoint(source_handler),
                ),
        )
}
