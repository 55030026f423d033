pub mod commands;

use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::bot::modules::utils::{format_amount, header, require_active_worker};
use crate::bot::services::distribution::ranks::rank_for;
use crate::bot::services::storage::types::TopWorker;
use crate::bot::{AppState, BotHandler, BotHandlerInternal, TeamBot};

use self::commands::TeamCommand;

fn medal(index: usize) -> String {
    match index {
        0 => "🥇".to_string(),
        1 => "🥈".to_string(),
        2 => "🥉".to_string(),
        _ => format!("{}.", index + 1),
    }
}

fn format_top(top: &[TopWorker]) -> String {
    if top.is_empty() {
        return "🏆 Пока никто не заработал.".to_string();
    }

    let mut text = format!("{}\n", header("ТОП ВОРКЕРОВ", "🏆"));
    for (index, worker) in top.iter().enumerate() {
        let tier = rank_for(worker.total_profit);
        text.push_str(&format!(
            "\n{} {} @{} — {} RUB ({})",
            medal(index),
            tier.emoji,
            worker.username,
            format_amount(worker.total_profit),
            worker.profits_count,
        ));
    }

    text
}

async fn top_command_handler(message: Message, bot: TeamBot, state: AppState) -> BotHandlerInternal {
    let user_id = match &message.from {
        Some(user) => user.id,
        None => return Ok(()),
    };

    let worker = match require_active_worker(&bot, message.chat.id, &state.storage, user_id).await? {
        Some(worker) => worker,
        None => return Ok(()),
    };

    let (top, position) = tokio::join!(
        state.storage.top_workers("all", 10),
        state.storage.user_position(worker.id),
    );
    let position = position?;

    let mut text = format_top(&top?);
    text.push_str(&format!(
        "\n\n📍 Ваше место: #{} из {} ({} RUB)\n\
         📅 За месяц: #{} ({} RUB)\n\
         📈 Ваш средний профит {} к среднему по команде: {:.0}%",
        position.overall_rank,
        position.total_users,
        format_amount(position.overall_profit),
        position.monthly_rank,
        format_amount(position.monthly_profit),
        format_amount(position.user_avg_profit),
        position.avg_diff_percent(),
    ));

    bot.send_message(message.chat.id, text)
        .parse_mode(ParseMode::Html)
        .send()
        .await?;

    Ok(())
}

pub fn get_team_handler() -> BotHandler {
    dptree::entry().branch(
        Update::filter_message()
            .filter_command::<TeamCommand>()
            .endpoint(top_command_handler),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn top_worker(username: &str, total: i64) -> TopWorker {
        TopWorker {
            user_id: 1,
            username: username.into(),
            full_name: String::new(),
            total_profit: Decimal::from(total),
            profits_count: 3,
        }
    }

    #[test]
    fn top_list_shows_medals_and_rank_badges() {
        let text = format_top(&[
            top_worker("first", 250_000),
            top_worker("second", 60_000),
            top_worker("third", 100),
            top_worker("fourth", 0),
        ]);

        assert!(text.contains("🥇 🔥 @first — 250000.00 RUB"));
        assert!(text.contains("🥈 ⚡ @second"));
        assert!(text.contains("🥉 🌱 @third"));
        assert!(text.contains("4. 🌱 @fourth"));
    }
}
