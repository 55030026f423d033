pub mod commands;

use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::bot::{BotHandler, BotHandlerInternal, TeamBot};
use crate::config;

use self::commands::HelpCommand;

async fn help_command_handler(message: Message, bot: TeamBot) -> BotHandlerInternal {
    let mut text = "📋 <b>КОМАНДЫ</b>\n\n\
                    👤 /me — Профиль\n\
                    🏆 /top — Топ воркеров\n\
                    🛠 /services — Сервисы\n\
                    👨‍🏫 /mentor — Кабинет наставника\n\
                    🏠 /start — Главное меню"
        .to_string();

    let is_admin = message
        .from
        .as_ref()
        .map(|user| config::CONFIG.is_admin(user.id))
        .unwrap_or(false);
    if is_admin {
        text.push_str("\n\n⚙️ /admin — Админ панель\n🚫 /ban — Бан\n♻️ /unban — Разбан");
    }

    bot.send_message(message.chat.id, text)
        .parse_mode(ParseMode::Html)
        .send()
        .await?;

    Ok(())
}

pub fn get_help_handler() -> BotHandler {
    dptree::entry().branch(
        Update::filter_message()
            .filter_command::<HelpCommand>()
            .endpoint(help_command_handler),
    )
}
