pub mod broadcast;
pub mod callback_data;
pub mod commands;
pub mod manage;
pub mod mentors;
pub mod payouts;
pub mod profit;
pub mod services_admin;

use teloxide::dptree::case;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};

use crate::bot::modules::utils::header;
use crate::bot::states::{Wizard, WizardState};
use crate::bot::tools::{filter_admin, filter_callback_query};
use crate::bot::{AppState, BotHandler, BotHandlerInternal, TeamBot};

use self::callback_data::AdminMenuCallbackData;
use self::commands::AdminCommand;

fn menu_button(text: &str, data: AdminMenuCallbackData) -> InlineKeyboardButton {
    InlineKeyboardButton {
        text: text.to_string(),
        kind: teloxide::types::InlineKeyboardButtonKind::CallbackData(data.to_string()),
    }
}

fn admin_menu_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![
            vec![menu_button("💰 Профит", AdminMenuCallbackData::Profit)],
            vec![menu_button("💸 Выплаты", AdminMenuCallbackData::Payouts)],
            vec![menu_button("📢 Рассылка", AdminMenuCallbackData::Broadcast)],
            vec![menu_button("📥 Заявки", AdminMenuCallbackData::Applications)],
            vec![menu_button("👨‍🏫 Наставники", AdminMenuCallbackData::Mentors)],
            vec![menu_button("🛠 Сервисы", AdminMenuCallbackData::Services)],
            vec![menu_button("👋 Приветствие", AdminMenuCallbackData::Welcome)],
        ],
    }
}

pub fn back_to_admin_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![vec![menu_button(
            "← Админ панель",
            AdminMenuCallbackData::Menu,
        )]],
    }
}

fn menu_text() -> String {
    format!("{}\n\n🎯 Что делаем?", header("АДМИН ПАНЕЛЬ", "⚙️"))
}

async fn admin_command_handler(
    message: Message,
    bot: TeamBot,
    state: AppState,
    command: AdminCommand,
) -> BotHandlerInternal {
    let admin = match &message.from {
        Some(user) => user.clone(),
        None => return Ok(()),
    };

    match command {
        AdminCommand::Admin => {
            bot.send_message(message.chat.id, menu_text())
                .parse_mode(ParseMode::Html)
                .reply_markup(admin_menu_keyboard())
                .send()
                .await?;
        }
        AdminCommand::Ban(user_id) => {
            manage::ban_worker(&bot, &state, &admin, message.chat.id, user_id as i64).await?;
        }
        AdminCommand::Unban(user_id) => {
            manage::unban_worker(&bot, &state, &admin, message.chat.id, user_id as i64).await?;
        }
    }

    Ok(())
}

async fn menu_callback_handler(
    cq: CallbackQuery,
    bot: TeamBot,
    state: AppState,
    dialogue: Wizard,
    callback_data: AdminMenuCallbackData,
) -> BotHandlerInternal {
    bot.answer_callback_query(cq.id.clone()).send().await?;

    let message = match cq.message {
        Some(message) => message,
        None => return Ok(()),
    };
    let chat_id = message.chat().id;
    let message_id = message.id();

    match callback_data {
        AdminMenuCallbackData::Menu => {
            dialogue.exit().await?;

            bot.edit_message_text(chat_id, message_id, menu_text())
                .parse_mode(ParseMode::Html)
                .reply_markup(admin_menu_keyboard())
                .send()
                .await?;
        }
        AdminMenuCallbackData::Profit => {
            dialogue.update(WizardState::ProfitWorker).await?;

            bot.edit_message_text(
                chat_id,
                message_id,
                "💰 <b>ПРОФИТ — Шаг 1/6</b>\n\n👤 Username или ID воркера:",
            )
            .parse_mode(ParseMode::Html)
            .reply_markup(profit::cancel_keyboard())
            .send()
            .await?;
        }
        AdminMenuCallbackData::Payouts => {
            payouts::show_ledger_menu(&bot, chat_id, message_id).await?;
        }
        AdminMenuCallbackData::Broadcast => {
            broadcast::show_type_menu(&bot, chat_id, message_id).await?;
        }
        AdminMenuCallbackData::Applications => {
            manage::show_pending(&bot, chat_id, &state).await?;
        }
        AdminMenuCallbackData::Mentors => {
            mentors::show_menu(&bot, chat_id, message_id, &state).await?;
        }
        AdminMenuCallbackData::Services => {
            services_admin::show_menu(&bot, chat_id, message_id, &state).await?;
        }
        AdminMenuCallbackData::Welcome => {
            dialogue.update(WizardState::WelcomeText).await?;

            bot.edit_message_text(
                chat_id,
                message_id,
                "👋 Отправьте новый текст приветствия для одобренных воркеров:",
            )
            .send()
            .await?;
        }
    }

    Ok(())
}

async fn welcome_text_handler(
    message: Message,
    bot: TeamBot,
    state: AppState,
    dialogue: Wizard,
) -> BotHandlerInternal {
    let text = match message.text() {
        Some(text) => text.trim(),
        None => {
            bot.send_message(message.chat.id, "❌ Отправьте текст:")
                .send()
                .await?;
            return Ok(());
        }
    };

    state.storage.set_setting("welcome_message", text).await?;
    dialogue.exit().await?;

    bot.send_message(message.chat.id, "✅ Приветствие обновлено")
        .reply_markup(back_to_admin_keyboard())
        .send()
        .await?;

    Ok(())
}

pub fn get_admin_handler() -> BotHandler {
    filter_admin()
        .branch(
            Update::filter_message()
                .filter_command::<AdminCommand>()
                .endpoint(admin_command_handler),
        )
        .branch(
            Update::filter_callback_query()
                .chain(filter_callback_query::<AdminMenuCallbackData>())
                .endpoint(menu_callback_handler),
        )
        .branch(profit::get_profit_handler())
        .branch(payouts::get_payouts_handler())
        .branch(broadcast::get_broadcast_handler())
        .branch(manage::get_manage_handler())
        .branch(mentors::get_mentors_handler())
        .branch(services_admin::get_services_admin_handler())
        .branch(
            Update::filter_message()
                .branch(case![WizardState::WelcomeText].endpoint(welcome_text_handler)),
        )
}
