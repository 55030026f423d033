pub mod callback_data;

use teloxide::dptree::case;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, MessageId, ParseMode};

use crate::bot::modules::admin::back_to_admin_keyboard;
use crate::bot::modules::admin::callback_data::AdminMenuCallbackData;
use crate::bot::modules::admin::profit::cancel_keyboard as profit_cancel_keyboard;
use crate::bot::modules::utils::{format_amount, header};
use crate::bot::services::notifier;
use crate::bot::services::storage::types::{Service, Worker, WorkerStatus};
use crate::bot::states::{Wizard, WizardState, WorkerRef};
use crate::bot::tools::filter_callback_query;
use crate::bot::{AppState, BotHandler, BotHandlerInternal, TeamBot};

use self::callback_data::MentorAdminCallbackData;

fn menu_keyboard(mentor_rows: Vec<Vec<InlineKeyboardButton>>) -> InlineKeyboardMarkup {
    let mut rows = vec![vec![
        InlineKeyboardButton {
            text: "➕ Добавить".to_string(),
            kind: teloxide::types::InlineKeyboardButtonKind::CallbackData(
                MentorAdminCallbackData::Add.to_string(),
            ),
        },
        InlineKeyboardButton {
            text: "🔗 Привязать".to_string(),
            kind: teloxide::types::InlineKeyboardButtonKind::CallbackData(
                MentorAdminCallbackData::Assign.to_string(),
            ),
        },
    ]];
    rows.extend(mentor_rows);
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

fn service_keyboard(services: &[Service]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: services
            .iter()
            .map(|service| {
                vec![InlineKeyboardButton {
                    text: format!("{} {}", service.icon, service.name),
                    kind: teloxide::types::InlineKeyboardButtonKind::CallbackData(
                        MentorAdminCallbackData::PickService {
                            service_id: service.id,
                        }
                        .to_string(),
                    ),
                }]
            })
            .collect(),
    }
}

pub async fn show_menu(
    bot: &TeamBot,
    chat_id: ChatId,
    message_id: MessageId,
    state: &AppState,
) -> BotHandlerInternal {
    let mentors = state.storage.mentors().await?;

    let mut text = format!("{}\n", header("НАСТАВНИКИ", "👨‍🏫"));
    let mut mentor_rows = vec![];

    if mentors.is_empty() {
        text.push_str("\nПока нет наставников.");
    }
    for mentor in &mentors {
        text.push_str(&format!(
            "\n@{} — {} · {}% · 👥 {} · 💵 {} RUB",
            mentor.username,
            mentor.service_name,
            mentor.percent,
            mentor.students_count,
            format_amount(mentor.total_earned),
        ));
        mentor_rows.push(vec![InlineKeyboardButton {
            text: format!("❌ @{}", mentor.username),
            kind: teloxide::types::InlineKeyboardButtonKind::CallbackData(
                MentorAdminCallbackData::Remove {
                    mentor_id: mentor.id,
                }
                .to_string(),
            ),
        }]);
    }

    bot.edit_message_text(chat_id, message_id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(menu_keyboard(mentor_rows))
        .send()
        .await?;

    Ok(())
}

async fn resolve_active_worker(state: &AppState, input: &str) -> anyhow::Result<Option<Worker>> {
    let input = input.trim().trim_start_matches('@');

    let worker = if input.chars().all(|c| c.is_ascii_digit()) && !input.is_empty() {
        state.storage.worker(input.parse()?).await?
    } else {
        state.storage.worker_by_username(input).await?
    };

    Ok(worker.filter(|worker| worker.status == WorkerStatus::Active))
}

async fn menu_callback_handler(
    cq: CallbackQuery,
    bot: TeamBot,
    state: AppState,
    dialogue: Wizard,
    callback_data: MentorAdminCallbackData,
) -> BotHandlerInternal {
    bot.answer_callback_query(cq.id.clone()).send().await?;

    let message = match cq.message {
        Some(message) => message,
        None => return Ok(()),
    };
    let chat_id = message.chat().id;
    let message_id = message.id();

    match callback_data {
        MentorAdminCallbackData::Menu => {
            dialogue.exit().await?;
            show_menu(&bot, chat_id, message_id, &state).await?;
        }
        MentorAdminCallbackData::Add => {
            dialogue.update(WizardState::MentorUser).await?;

            bot.edit_message_text(
                chat_id,
                message_id,
                "👨‍🏫 <b>НОВЫЙ НАСТАВНИК</b>\n\n👤 Username или ID воркера:",
            )
            .parse_mode(ParseMode::Html)
            .send()
            .await?;
        }
        MentorAdminCallbackData::Assign => {
            dialogue.update(WizardState::AssignStudent).await?;

            bot.edit_message_text(
                chat_id,
                message_id,
                "🔗 <b>ПРИВЯЗКА УЧЕНИКА</b>\n\n👤 Username или ID ученика:",
            )
            .parse_mode(ParseMode::Html)
            .send()
            .await?;
        }
        MentorAdminCallbackData::Remove { mentor_id } => {
            state.storage.deactivate_mentor(mentor_id).await?;

            let admin = &cq.from;
            state
                .storage
                .log_admin_action(
                    admin.id.0 as i64,
                    admin.username.as_deref().unwrap_or(""),
                    "remove_mentor",
                    Some(&format!("mentor #{mentor_id}")),
                    None,
                )
                .await;

            show_menu(&bot, chat_id, message_id, &state).await?;
        }
        _ => (),
    }

    Ok(())
}

async fn mentor_user_handler(
    message: Message,
    bot: TeamBot,
    state: AppState,
    dialogue: Wizard,
) -> BotHandlerInternal {
    let worker = match resolve_active_worker(&state, message.text().unwrap_or_default()).await? {
        Some(worker) => worker,
        None => {
            bot.send_message(message.chat.id, "❌ Активный воркер не найден. Попробуйте снова:")
                .reply_markup(profit_cancel_keyboard())
                .send()
                .await?;
            return Ok(());
        }
    };

    let services = state.storage.active_services().await?;
    if services.is_empty() {
        dialogue.exit().await?;

        bot.send_message(message.chat.id, "❌ Нет сервисов.")
            .reply_markup(back_to_admin_keyboard())
            .send()
            .await?;
        return Ok(());
    }

    dialogue
        .update(WizardState::MentorService {
            user: WorkerRef::from(&worker),
        })
        .await?;

    bot.send_message(message.chat.id, "🛠 Сервис наставника:")
        .reply_markup(service_keyboard(&services))
        .send()
        .await?;

    Ok(())
}

async fn service_callback_handler(
    cq: CallbackQuery,
    bot: TeamBot,
    state: AppState,
    dialogue: Wizard,
    callback_data: MentorAdminCallbackData,
    user: WorkerRef,
) -> BotHandlerInternal {
    bot.answer_callback_query(cq.id.clone()).send().await?;

    let message = match cq.message {
        Some(message) => message,
        None => return Ok(()),
    };

    let service_id = match callback_data {
        MentorAdminCallbackData::PickService { service_id } => service_id,
        _ => return Ok(()),
    };

    let service = match state.storage.service(service_id).await? {
        Some(service) => service,
        None => {
            dialogue.exit().await?;

            bot.edit_message_text(message.chat().id, message.id(), "❌ Сервис не найден")
                .reply_markup(back_to_admin_keyboard())
                .send()
                .await?;
            return Ok(());
        }
    };

    dialogue
        .update(WizardState::MentorPercent {
            user,
            service: service.name.clone(),
        })
        .await?;

    bot.edit_message_text(
        message.chat().id,
        message.id(),
        format!("✅ {}\n\n📊 Процент комиссии (1-100):", service.name),
    )
    .send()
    .await?;

    Ok(())
}

async fn percent_handler(
    message: Message,
    bot: TeamBot,
    state: AppState,
    dialogue: Wizard,
    (user, service): (WorkerRef, String),
) -> BotHandlerInternal {
    let raw = message.text().unwrap_or_default().trim().replace('%', "");

    let percent: u32 = match raw.parse() {
        Ok(percent) if (1..=100).contains(&percent) => percent,
        _ => {
            bot.send_message(message.chat.id, "❌ 1-100:").send().await?;
            return Ok(());
        }
    };

    state
        .storage
        .add_mentor(user.id, &service, percent)
        .await?;
    dialogue.exit().await?;

    notifier::send_direct(
        &bot,
        UserId(user.id as u64),
        format!(
            "👨‍🏫 <b>Вы назначены наставником!</b>\n\n🛠 Сервис: {service}\n💰 Комиссия: {percent}%"
        ),
    );

    if let Some(admin) = &message.from {
        state
            .storage
            .log_admin_action(
                admin.id.0 as i64,
                admin.username.as_deref().unwrap_or(""),
                "add_mentor",
                Some(&format!("@{} {service} {percent}%", user.username)),
                Some(user.id),
            )
            .await;
    }

    bot.send_message(
        message.chat.id,
        format!("✅ Наставник @{} добавлен", user.username),
    )
    .reply_markup(back_to_admin_keyboard())
    .send()
    .await?;

    Ok(())
}

async fn assign_student_handler(
    message: Message,
    bot: TeamBot,
    state: AppState,
    dialogue: Wizard,
) -> BotHandlerInternal {
    let student = match resolve_active_worker(&state, message.text().unwrap_or_default()).await? {
        Some(worker) => worker,
        None => {
            bot.send_message(message.chat.id, "❌ Активный воркер не найден. Попробуйте снова:")
                .reply_markup(profit_cancel_keyboard())
                .send()
                .await?;
            return Ok(());
        }
    };

    let mentors = state.storage.mentors().await?;
    if mentors.is_empty() {
        dialogue.exit().await?;

        bot.send_message(message.chat.id, "❌ Нет наставников.")
            .reply_markup(back_to_admin_keyboard())
            .send()
            .await?;
        return Ok(());
    }

    let mut rows: Vec<Vec<InlineKeyboardButton>> = mentors
        .iter()
        .map(|mentor| {
            vec![InlineKeyboardButton {
                text: format!("@{} ({})", mentor.username, mentor.service_name),
                kind: teloxide::types::InlineKeyboardButtonKind::CallbackData(
                    MentorAdminCallbackData::PickMentor {
                        mentor_id: mentor.id,
                    }
                    .to_string(),
                ),
            }]
        })
        .collect();
    rows.push(vec![InlineKeyboardButton {
        text: "🚫 Отвязать наставника".to_string(),
        kind: teloxide::types::InlineKeyboardButtonKind::CallbackData(
            MentorAdminCallbackData::Unassign.to_string(),
        ),
    }]);

    dialogue
        .update(WizardState::AssignMentor {
            student: WorkerRef::from(&student),
        })
        .await?;

    bot.send_message(
        message.chat.id,
        format!("✅ {} (@{})\n\n👨‍🏫 Наставник:", student.full_name, student.username),
    )
    .reply_markup(InlineKeyboardMarkup {
        inline_keyboard: rows,
    })
    .send()
    .await?;

    Ok(())
}

async fn pick_mentor_callback_handler(
    cq: CallbackQuery,
    bot: TeamBot,
    state: AppState,
    dialogue: Wizard,
    callback_data: MentorAdminCallbackData,
    student: WorkerRef,
) -> BotHandlerInternal {
    bot.answer_callback_query(cq.id.clone()).send().await?;

    let message = match cq.message {
        Some(message) => message,
        None => return Ok(()),
    };
    let admin = &cq.from;

    match callback_data {
        MentorAdminCallbackData::PickMentor { mentor_id } => {
            let mentor = match state.storage.mentor(mentor_id).await? {
                Some(mentor) => mentor,
                None => {
                    dialogue.exit().await?;

                    bot.edit_message_text(message.chat().id, message.id(), "❌ Наставник не найден")
                        .reply_markup(back_to_admin_keyboard())
                        .send()
                        .await?;
                    return Ok(());
                }
            };

            state.storage.assign_mentor(student.id, &mentor).await?;
            dialogue.exit().await?;

            notifier::send_direct(
                &bot,
                UserId(student.id as u64),
                format!(
                    "👨‍🏫 <b>Вам назначен наставник</b>\n\n@{} · {}",
                    mentor.username, mentor.service_name
                ),
            );

            state
                .storage
                .log_admin_action(
                    admin.id.0 as i64,
                    admin.username.as_deref().unwrap_or(""),
                    "assign_mentor",
                    Some(&format!("@{} → @{}", mentor.username, student.username)),
                    Some(student.id),
                )
                .await;

            bot.edit_message_text(
                message.chat().id,
                message.id(),
                format!("✅ @{} привязан к @{}", student.username, mentor.username),
            )
            .reply_markup(back_to_admin_keyboard())
            .send()
            .await?;
        }
        MentorAdminCallbackData::Unassign => {
            let worker = match state.storage.worker(student.id).await? {
                Some(worker) => worker,
                None => {
                    dialogue.exit().await?;
                    return Ok(());
                }
            };

            state.storage.remove_mentor(&worker).await?;
            dialogue.exit().await?;

            state
                .storage
                .log_admin_action(
                    admin.id.0 as i64,
                    admin.username.as_deref().unwrap_or(""),
                    "remove_student_mentor",
                    None,
                    Some(student.id),
                )
                .await;

            bot.edit_message_text(
                message.chat().id,
                message.id(),
                format!("✅ Наставник отвязан от @{}", student.username),
            )
            .reply_markup(back_to_admin_keyboard())
            .send()
            .await?;
        }
        _ => (),
    }

    Ok(())
}

pub fn get_mentors_handler() -> BotHandler {
    dptree::entry()
        .branch(
            Update::filter_callback_query()
                .chain(filter_callback_query::<MentorAdminCallbackData>())
                .branch(case![WizardState::MentorService { user }].endpoint(service_callback_handler))
                .branch(
                    case![WizardState::AssignMentor { student }]
                        .endpoint(pick_mentor_callback_handler),
                )
                .endpoint(menu_callback_handler),
        )
        .branch(
            Update::filter_message()
                .branch(case![WizardState::MentorUser].endpoint(mentor_user_handler))
                .branch(case![WizardState::MentorPercent { user, service }].endpoint(percent_handler))
                .branch(case![WizardState::AssignStudent].endpoint(assign_student_handler)),
        )
}
