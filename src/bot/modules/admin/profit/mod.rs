pub mod callback_data;

use rust_decimal::Decimal;
use teloxide::dptree::case;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};

use crate::bot::modules::admin::back_to_admin_keyboard;
use crate::bot::modules::utils::format_amount;
use crate::bot::services::distribution::ranks::rank_for;
use crate::bot::services::distribution::split::{compute_split, Split};
use crate::bot::services::notifier;
use crate::bot::services::storage::types::{Mentor, Service, Worker, WorkerStatus};
use crate::bot::states::{ProfitDraft, ProfitStage, Wizard, WizardState, WorkerRef};
use crate::bot::tools::filter_callback_query;
use crate::bot::{AppState, BotHandler, BotHandlerInternal, TeamBot};
use crate::config;

use self::callback_data::ProfitCallbackData;

pub fn cancel_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![vec![InlineKeyboardButton {
            text: "❌ Отмена".to_string(),
            kind: teloxide::types::InlineKeyboardButtonKind::CallbackData(
                ProfitCallbackData::Cancel.to_string(),
            ),
        }]],
    }
}

fn service_keyboard(services: &[Service]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = services
        .iter()
        .map(|service| {
            vec![InlineKeyboardButton {
                text: format!("{} {}", service.icon, service.name),
                kind: teloxide::types::InlineKeyboardButtonKind::CallbackData(
                    ProfitCallbackData::Service {
                        service_id: service.id,
                    }
                    .to_string(),
                ),
            }]
        })
        .collect();

    rows.push(vec![InlineKeyboardButton {
        text: "❌ Отмена".to_string(),
        kind: teloxide::types::InlineKeyboardButtonKind::CallbackData(
            ProfitCallbackData::Cancel.to_string(),
        ),
    }]);

    InlineKeyboardMarkup {
        inline_keyboard: rows,
    }
}

fn stage_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![
            vec![
                InlineKeyboardButton {
                    text: "💵 Депозит".to_string(),
                    kind: teloxide::types::InlineKeyboardButtonKind::CallbackData(
                        ProfitCallbackData::Stage {
                            stage: ProfitStage::Deposit,
                        }
                        .to_string(),
                    ),
                },
                InlineKeyboardButton {
                    text: "🧾 Налог".to_string(),
                    kind: teloxide::types::InlineKeyboardButtonKind::CallbackData(
                        ProfitCallbackData::Stage {
                            stage: ProfitStage::Tax,
                        }
                        .to_string(),
                    ),
                },
            ],
            vec![InlineKeyboardButton {
                text: "❌ Отмена".to_string(),
                kind: teloxide::types::InlineKeyboardButtonKind::CallbackData(
                    ProfitCallbackData::Cancel.to_string(),
                ),
            }],
        ],
    }
}

fn confirm_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![vec![
            InlineKeyboardButton {
                text: "✅ Подтвердить".to_string(),
                kind: teloxide::types::InlineKeyboardButtonKind::CallbackData(
                    ProfitCallbackData::Confirm.to_string(),
                ),
            },
            InlineKeyboardButton {
                text: "❌ Отмена".to_string(),
                kind: teloxide::types::InlineKeyboardButtonKind::CallbackData(
                    ProfitCallbackData::Cancel.to_string(),
                ),
            },
        ]],
    }
}

async fn resolve_worker(state: &AppState, input: &str) -> anyhow::Result<Option<Worker>> {
    let input = input.trim().trim_start_matches('@');

    if input.chars().all(|c| c.is_ascii_digit()) && !input.is_empty() {
        state.storage.worker(input.parse()?).await
    } else {
        state.storage.worker_by_username(input).await
    }
}

async fn worker_step_handler(
    message: Message,
    bot: TeamBot,
    state: AppState,
    dialogue: Wizard,
) -> BotHandlerInternal {
    let input = message.text().unwrap_or_default();

    let worker = match resolve_worker(&state, input).await? {
        Some(worker) => worker,
        None => {
            bot.send_message(message.chat.id, "❌ Не найден. Попробуйте снова:")
                .reply_markup(cancel_keyboard())
                .send()
                .await?;
            return Ok(());
        }
    };

    if worker.status != WorkerStatus::Active {
        bot.send_message(
            message.chat.id,
            format!("❌ Не активен ({}). Другой:", worker.status),
        )
        .reply_markup(cancel_keyboard())
        .send()
        .await?;
        return Ok(());
    }

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
        .update(WizardState::ProfitService {
            worker: WorkerRef::from(&worker),
        })
        .await?;

    bot.send_message(
        message.chat.id,
        format!(
            "✅ {} (@{})\n\n💰 <b>Шаг 2/6</b>\n\n🛠 Сервис:",
            worker.full_name, worker.username
        ),
    )
    .parse_mode(ParseMode::Html)
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
    callback_data: ProfitCallbackData,
    worker: WorkerRef,
) -> BotHandlerInternal {
    bot.answer_callback_query(cq.id.clone()).send().await?;

    let message = match cq.message {
        Some(message) => message,
        None => return Ok(()),
    };

    let service_id = match callback_data {
        ProfitCallbackData::Service { service_id } => service_id,
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
        .update(WizardState::ProfitAmount {
            worker,
            service: service.name.clone(),
        })
        .await?;

    bot.edit_message_text(
        message.chat().id,
        message.id(),
        format!("✅ {}\n\n💰 <b>Шаг 3/6</b>\n\n💸 Сумма (RUB):", service.name),
    )
    .parse_mode(ParseMode::Html)
    .reply_markup(cancel_keyboard())
    .send()
    .await?;

    Ok(())
}

async fn amount_step_handler(
    message: Message,
    bot: TeamBot,
    dialogue: Wizard,
    (worker, service): (WorkerRef, String),
) -> BotHandlerInternal {
    let raw = message
        .text()
        .unwrap_or_default()
        .trim()
        .replace(['$', ','], "");

    let amount: Decimal = match raw.parse() {
        Ok(amount) if amount > Decimal::ZERO => amount,
        _ => {
            bot.send_message(message.chat.id, "❌ Неверная сумма:")
                .reply_markup(cancel_keyboard())
                .send()
                .await?;
            return Ok(());
        }
    };

    dialogue
        .update(WizardState::ProfitPercent {
            worker,
            service,
            amount,
        })
        .await?;

    bot.send_message(
        message.chat.id,
        format!(
            "✅ {} RUB\n\n💰 <b>Шаг 4/6</b>\n\n📊 Процент воркера (0-100):",
            format_amount(amount)
        ),
    )
    .parse_mode(ParseMode::Html)
    .reply_markup(cancel_keyboard())
    .send()
    .await?;

    Ok(())
}

async fn percent_step_handler(
    message: Message,
    bot: TeamBot,
    dialogue: Wizard,
    (worker, service, amount): (WorkerRef, String, Decimal),
) -> BotHandlerInternal {
    let raw = message.text().unwrap_or_default().trim().replace('%', "");

    let percent: u32 = match raw.parse() {
        Ok(percent) if percent <= 100 => percent,
        _ => {
            bot.send_message(message.chat.id, "❌ 0-100:")
                .reply_markup(cancel_keyboard())
                .send()
                .await?;
            return Ok(());
        }
    };

    dialogue
        .update(WizardState::ProfitStagePick {
            worker,
            service,
            amount,
            percent,
        })
        .await?;

    bot.send_message(
        message.chat.id,
        format!("✅ {percent}%\n\n💰 <b>Шаг 5/6</b>\n\n📊 Этап:"),
    )
    .parse_mode(ParseMode::Html)
    .reply_markup(stage_keyboard())
    .send()
    .await?;

    Ok(())
}

/// Preview split, computed the same way the recorder will compute it.
async fn preview_split(
    state: &AppState,
    worker_id: i64,
    gross: Decimal,
    percent: u32,
    service: &str,
) -> anyhow::Result<(Split, Option<Worker>, Option<Mentor>, &'static str, u32)> {
    let worker = state
        .storage
        .worker(worker_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("worker not found"))?;

    let tier = rank_for(worker.total_profit.max(Decimal::ZERO));

    let referrer = match worker.referrer_id {
        Some(referrer_id) => state.storage.worker(referrer_id).await?,
        None => None,
    };
    let mentor = state
        .storage
        .worker_mentor(&worker)
        .await?
        .filter(|mentor| mentor.service_name.to_lowercase() == service.to_lowercase());

    let split = compute_split(
        gross,
        percent,
        tier.bonus_percent,
        referrer.as_ref().map(|_| config::CONFIG.referral_percent),
        mentor.as_ref().map(|mentor| mentor.percent),
    );

    Ok((split, referrer, mentor, tier.name, tier.bonus_percent))
}

async fn stage_callback_handler(
    cq: CallbackQuery,
    bot: TeamBot,
    state: AppState,
    dialogue: Wizard,
    callback_data: ProfitCallbackData,
    (worker, service, amount, percent): (WorkerRef, String, Decimal, u32),
) -> BotHandlerInternal {
    bot.answer_callback_query(cq.id.clone()).send().await?;

    let message = match cq.message {
        Some(message) => message,
        None => return Ok(()),
    };

    let stage = match callback_data {
        ProfitCallbackData::Stage { stage } => stage,
        _ => return Ok(()),
    };

    let (split, referrer, mentor, tier_name, tier_bonus) =
        match preview_split(&state, worker.id, amount, percent, &service).await {
            Ok(preview) => preview,
            Err(err) => {
                dialogue.exit().await?;

                bot.edit_message_text(message.chat().id, message.id(), "Ошибка! Попробуйте позже :(")
                    .reply_markup(back_to_admin_keyboard())
                    .send()
                    .await?;
                return Err(err.into());
            }
        };

    let referrer_line = match &referrer {
        Some(referrer) => format!(
            "🔗 Реферер @{} ({}%): {} RUB\n",
            referrer.username,
            config::CONFIG.referral_percent,
            format_amount(split.referral_cut),
        ),
        None => String::new(),
    };
    let mentor_line = match &mentor {
        Some(mentor) => format!(
            "👨‍🏫 Наставник @{} ({}%): {} RUB\n",
            mentor.username,
            mentor.percent,
            format_amount(split.mentor_cut),
        ),
        None => String::new(),
    };

    let preview = format!(
        "💰 <b>ПРЕДПРОСМОТР — Шаг 6/6</b>\n\n\
         👤 {} (@{})\n\
         🏆 {} (+{}%)\n\
         {}{}\
         🛠 {}\n\
         📊 {}\n\n\
         💸 Всего: {} RUB\n\
         📊 {}% = {} RUB\n\
         🏆 Бонус: +{} RUB\n\
         💵 Воркеру: {} RUB\n\n\
         Подтвердить?",
        worker.full_name,
        worker.username,
        tier_name,
        tier_bonus,
        mentor_line,
        referrer_line,
        service,
        stage,
        format_amount(amount),
        percent,
        format_amount(split.base),
        format_amount(split.bonus),
        format_amount(split.worker_net),
    );

    dialogue
        .update(WizardState::ProfitConfirm {
            draft: ProfitDraft {
                worker,
                service,
                amount,
                percent,
                stage,
            },
        })
        .await?;

    bot.edit_message_text(message.chat().id, message.id(), preview)
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
    callback_data: ProfitCallbackData,
    draft: ProfitDraft,
) -> BotHandlerInternal {
    if !matches!(callback_data, ProfitCallbackData::Confirm) {
        return Ok(());
    }

    bot.answer_callback_query(cq.id.clone())
        .text("Создание...")
        .send()
        .await?;

    let message = match cq.message {
        Some(message) => message,
        None => return Ok(()),
    };
    dialogue.exit().await?;

    let outcome = match state
        .distributor
        .record_profit(
            &state.storage,
            draft.worker.id,
            draft.amount,
            draft.percent,
            &draft.service,
            config::CONFIG.referral_percent,
        )
        .await
    {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::error!("Profit creation failed: {:?}", err);

            let text = if format!("{err:#}").contains("manual reconciliation") {
                "⚠️ Профит записан, но часть начислений не прошла.\nТребуется ручная сверка."
            } else {
                "❌ Ошибка создания профита. Попробуйте снова."
            };
            bot.edit_message_text(message.chat().id, message.id(), text)
                .reply_markup(back_to_admin_keyboard())
                .send()
                .await?;
            return Ok(());
        }
    };

    let admin = &cq.from;
    state
        .storage
        .log_admin_action(
            admin.id.0 as i64,
            admin.username.as_deref().unwrap_or(&admin.full_name()),
            "create_profit",
            Some(&format!(
                "#{}: {} RUB @{} ({})",
                outcome.profit_id,
                format_amount(draft.amount),
                draft.worker.username,
                draft.stage,
            )),
            Some(draft.worker.id),
        )
        .await;

    // Notification fan-out is best-effort by design.
    let bonus_line = if outcome.split.bonus > Decimal::ZERO {
        format!("\n🏆 Бонус: +{} RUB", format_amount(outcome.split.bonus))
    } else {
        String::new()
    };
    let mentor_line = if outcome.split.mentor_cut > Decimal::ZERO {
        format!(
            "\n👨‍🏫 Наставник: -{} RUB",
            format_amount(outcome.split.mentor_cut)
        )
    } else {
        String::new()
    };

    notifier::send_direct(
        &bot,
        UserId(draft.worker.id as u64),
        format!(
            "💎 <b>НОВЫЙ ПРОФИТ</b>\n\n\
             🛠 Сервис: {}\n\
             💸 Всего: {} RUB\n\
             💵 Твоя доля ({}%): {} RUB{}{}\n\n\
             ⏳ На удержании",
            draft.service,
            format_amount(draft.amount),
            draft.percent,
            format_amount(outcome.split.worker_net),
            bonus_line,
            mentor_line,
        ),
    );

    if let Some(mentor) = &outcome.mentor {
        if outcome.split.mentor_cut > Decimal::ZERO {
            notifier::send_direct(
                &bot,
                UserId(mentor.user_id as u64),
                format!(
                    "💰 <b>ПРОФИТ ОТ УЧЕНИКА</b>\n\n\
                     👤 Воркер: @{}\n\
                     💵 Ваша доля: {} RUB",
                    draft.worker.username,
                    format_amount(outcome.split.mentor_cut),
                ),
            );
        }
    }

    if let Some(referrer) = &outcome.referrer {
        if outcome.split.referral_cut > Decimal::ZERO {
            notifier::send_direct(
                &bot,
                UserId(referrer.id as u64),
                format!(
                    "🔗 <b>РЕФЕРАЛЬНЫЙ ДОХОД</b>\n\n\
                     👤 Реферал: @{}\n\
                     💵 Ваша доля ({}%): {} RUB",
                    draft.worker.username,
                    config::CONFIG.referral_percent,
                    format_amount(outcome.split.referral_cut),
                ),
            );
        }
    }

    if let Some(tier) = outcome.rank_up {
        notifier::send_direct(
            &bot,
            UserId(draft.worker.id as u64),
            crate::bot::services::distribution::ranks::reward_message(tier),
        );
    }

    notifier::send_to_channel(
        &bot,
        config::CONFIG.profits_channel_id,
        format!(
            "💎 <b>НОВЫЙ ПРОФИТ</b>\n\n\
             👤 Воркер: {} (@{})\n\
             🛠 Сервис: {}\n\
             💸 Всего: {} RUB\n\
             💵 Доля воркера ({}%): {} RUB",
            draft.worker.full_name,
            draft.worker.username,
            draft.service,
            format_amount(draft.amount),
            draft.percent,
            format_amount(outcome.split.worker_net),
        ),
    );

    bot.edit_message_text(
        message.chat().id,
        message.id(),
        format!("✅ <b>ПРОФИТ #{} СОЗДАН!</b>", outcome.profit_id),
    )
    .parse_mode(ParseMode::Html)
    .reply_markup(back_to_admin_keyboard())
    .send()
    .await?;

    Ok(())
}

async fn cancel_callback_handler(
    cq: CallbackQuery,
    bot: TeamBot,
    dialogue: Wizard,
) -> BotHandlerInternal {
    bot.answer_callback_query(cq.id.clone()).send().await?;
    dialogue.exit().await?;

    if let Some(message) = cq.message {
        bot.edit_message_text(message.chat().id, message.id(), "❌ Отменено")
            .reply_markup(back_to_admin_keyboard())
            .send()
            .await?;
    }

    Ok(())
}

pub fn get_profit_handler() -> BotHandler {
    dptree::entry()
        .branch(
            Update::filter_callback_query()
                .chain(filter_callback_query::<ProfitCallbackData>())
                .branch(
                    dptree::filter(|callback_data: ProfitCallbackData| {
                        matches!(callback_data, ProfitCallbackData::Cancel)
                    })
                    .endpoint(cancel_callback_handler),
                )
                .branch(case![WizardState::ProfitService { worker }].endpoint(service_callback_handler))
                .branch(
                    case![WizardState::ProfitStagePick {
                        worker,
                        service,
                        amount,
                        percent
                    }]
                    .endpoint(stage_callback_handler),
                )
                .branch(case![WizardState::ProfitConfirm { draft }].endpoint(confirm_callback_handler)),
        )
        .branch(
            Update::filter_message()
                .branch(case![WizardState::ProfitWorker].endpoint(worker_step_handler))
                .branch(case![WizardState::ProfitAmount { worker, service }].endpoint(amount_step_handler))
                .branch(
                    case![WizardState::ProfitPercent {
                        worker,
                        service,
                        amount
                    }]
                    .endpoint(percent_step_handler),
                ),
        )
}
