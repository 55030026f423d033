pub mod callback_data;

use teloxide::dptree::case;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, MessageId, ParseMode};

use crate::bot::modules::admin::back_to_admin_keyboard;
use crate::bot::modules::admin::callback_data::AdminMenuCallbackData;
use crate::bot::modules::utils::header;
use crate::bot::states::{Wizard, WizardState};
use crate::bot::tools::filter_callback_query;
use crate::bot::{AppState, BotHandler, BotHandlerInternal, TeamBot};

use self::callback_data::ServiceAdminCallbackData;

pub async fn show_menu(
    bot: &TeamBot,
    chat_id: ChatId,
    message_id: MessageId,
    state: &AppState,
) -> BotHandlerInternal {
    let services = state.storage.active_services().await?;

    let mut text = format!("{}\n", header("СЕРВИСЫ", "🛠"));
    let mut rows: Vec<Vec<InlineKeyboardButton>> = vec![vec![InlineKeyboardButton {
        text: "➕ Добавить".to_string(),
        kind: teloxide::types::InlineKeyboardButtonKind::CallbackData(
            ServiceAdminCallbackData::Add.to_string(),
        ),
    }]];

    if services.is_empty() {
        text.push_str("\nПока нет сервисов.");
    }
    for service in &services {
        text.push_str(&format!("\n{} {}", service.icon, service.name));
        rows.push(vec![InlineKeyboardButton {
            text: format!("❌ {}", service.name),
            kind: teloxide::types::InlineKeyboardButtonKind::CallbackData(
                ServiceAdminCallbackData::Delete {
                    service_id: service.id,
                }
                .to_string(),
            ),
        }]);
    }

    rows.push(vec![InlineKeyboardButton {
        text: "← Админ панель".to_string(),
        kind: teloxide::types::InlineKeyboardButtonKind::CallbackData(
            AdminMenuCallbackData::Menu.to_string(),
        ),
    }]);

    bot.edit_message_text(chat_id, message_id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(InlineKeyboardMarkup {
            inline_keyboard: rows,
        })
        .send()
        .await?;

    Ok(())
}

async fn menu_callback_handler(
    cq: CallbackQuery,
    bot: TeamBot,
    state: AppState,
    dialogue: Wizard,
    callback_data: ServiceAdminCallbackData,
) -> BotHandlerInternal {
    bot.answer_callback_query(cq.id.clone()).send().await?;

    let message = match cq.message {
        Some(message) => message,
        None => return Ok(()),
    };
    let chat_id = message.chat().id;
    let message_id = message.id();

    match callback_data {
        ServiceAdminCallbackData::Add => {
            dialogue.update(WizardState::ServiceName).await?;

            bot.edit_message_text(
                chat_id,
                message_id,
                "🛠 <b>НОВЫЙ СЕРВИС</b>\n\n✏️ Название:",
            )
            .parse_mode(ParseMode::Html)
            .send()
            .await?;
        }
        ServiceAdminCallbackData::Delete { service_id } => {
            state.storage.deactivate_service(service_id).await?;

            let admin = &cq.from;
            state
                .storage
                .log_admin_action(
                    admin.id.0 as i64,
                    admin.username.as_deref().unwrap_or(""),
                    "delete_service",
                    Some(&format!("service #{service_id}")),
                    None,
                )
                .await;

            show_menu(&bot, chat_id, message_id, &state).await?;
        }
    }

    Ok(())
}

fn optional_link(input: &str) -> Option<String> {
    let input = input.trim();

    (input != "-" && !input.is_empty()).then(|| input.to_string())
}

async fn name_step_handler(
    message: Message,
    bot: TeamBot,
    dialogue: Wizard,
) -> BotHandlerInternal {
    let name = match message.text() {
        Some(text) if !text.trim().is_empty() => text.trim().to_string(),
        _ => {
            bot.send_message(message.chat.id, "❌ Отправьте название:")
                .send()
                .await?;
            return Ok(());
        }
    };

    dialogue.update(WizardState::ServiceManual { name }).await?;

    bot.send_message(
        message.chat.id,
        "📖 Ссылка на мануал (или <code>-</code>):",
    )
    .parse_mode(ParseMode::Html)
    .send()
    .await?;

    Ok(())
}

async fn manual_step_handler(
    message: Message,
    bot: TeamBot,
    dialogue: Wizard,
    name: String,
) -> BotHandlerInternal {
    let manual_link = optional_link(message.text().unwrap_or_default());

    dialogue
        .update(WizardState::ServiceBot { name, manual_link })
        .await?;

    bot.send_message(
        message.chat.id,
        "🤖 Ссылка на бота (или <code>-</code>):",
    )
    .parse_mode(ParseMode::Html)
    .send()
    .await?;

    Ok(())
}

async fn bot_link_step_handler(
    message: Message,
    bot: TeamBot,
    state: AppState,
    dialogue: Wizard,
    (name, manual_link): (String, Option<String>),
) -> BotHandlerInternal {
    let bot_link = optional_link(message.text().unwrap_or_default());

    let service = state
        .storage
        .add_service(&name, None, manual_link.as_deref(), bot_link.as_deref())
        .await?;
    dialogue.exit().await?;

    if let Some(admin) = &message.from {
        state
            .storage
            .log_admin_action(
                admin.id.0 as i64,
                admin.username.as_deref().unwrap_or(""),
                "add_service",
                Some(&service.name),
                None,
            )
            .await;
    }

    bot.send_message(message.chat.id, format!("✅ Сервис «{}» добавлен", service.name))
        .reply_markup(back_to_admin_keyboard())
        .send()
        .await?;

    Ok(())
}

pub fn get_services_admin_handler() -> BotHandler {
    dptree::entry()
        .branch(
            Update::filter_callback_query()
                .chain(filter_callback_query::<ServiceAdminCallbackData>())
                .endpoint(menu_callback_handler),
        )
        .branch(
            Update::filter_message()
                .branch(case![WizardState::ServiceName].endpoint(name_step_handler))
                .branch(case![WizardState::ServiceManual { name }].endpoint(manual_step_handler))
                .branch(
                    case![WizardState::ServiceBot { name, manual_link }]
                        .endpoint(bot_link_step_handler),
                ),
        )
}
