pub mod commands;

use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::bot::modules::utils::{header, require_active_worker};
use crate::bot::services::storage::types::Service;
use crate::bot::{AppState, BotHandler, BotHandlerInternal, TeamBot};

use self::commands::CatalogCommand;

fn format_services(services: &[Service]) -> String {
    if services.is_empty() {
        return "🛠 Сервисов пока нет.".to_string();
    }

    let mut text = format!("{}\n", header("СЕРВИСЫ", "🛠"));
    for service in services {
        text.push_str(&format!("\n{} <b>{}</b>", service.icon, service.name));

        if let Some(description) = &service.description {
            text.push_str(&format!("\n{description}"));
        }
        if let Some(manual_link) = &service.manual_link {
            text.push_str(&format!("\n📖 <a href=\"{manual_link}\">Мануал</a>"));
        }
        if let Some(bot_link) = &service.bot_link {
            text.push_str(&format!("\n🤖 <a href=\"{bot_link}\">Бот</a>"));
        }
        text.push('\n');
    }

    text
}

async fn services_command_handler(
    message: Message,
    bot: TeamBot,
    state: AppState,
) -> BotHandlerInternal {
    let user_id = match &message.from {
        Some(user) => user.id,
        None => return Ok(()),
    };

    if require_active_worker(&bot, message.chat.id, &state.storage, user_id)
        .await?
        .is_none()
    {
        return Ok(());
    }

    let services = state.storage.active_services().await?;

    bot.send_message(message.chat.id, format_services(&services))
        .parse_mode(ParseMode::Html)
        .send()
        .await?;

    Ok(())
}

pub fn get_catalog_handler() -> BotHandler {
    dptree::entry().branch(
        Update::filter_message()
            .filter_command::<CatalogCommand>()
            .endpoint(services_command_handler),
    )
}
