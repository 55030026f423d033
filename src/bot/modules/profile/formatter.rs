use rust_decimal::Decimal;

use crate::bot::modules::utils::{format_amount, header};
use crate::bot::services::distribution::ranks::{progress_bar, rank_progress};
use crate::bot::services::storage::types::{ProfitRecord, ReferralShare, ShareStatus, Worker};
use crate::bot::services::storage::ProfileData;

pub fn referral_link(bot_username: &str, user_id: i64) -> String {
    format!("https://t.me/{bot_username}?start=ref{user_id}")
}

pub fn format_profile(data: &ProfileData, bot_username: &str) -> String {
    let worker = &data.worker;
    let progress = rank_progress(worker.total_profit);
    let tier = progress.tier;

    let next_rank_line = if progress.amount_to_next > Decimal::ZERO {
        format!(
            "📈 До следующего ранга: {} RUB\n",
            format_amount(progress.amount_to_next)
        )
    } else {
        String::new()
    };

    let mentor_line = match &data.mentor {
        Some(mentor) => format!("👨‍🏫 Наставник: @{} ({})\n", mentor.username, mentor.service_name),
        None => String::new(),
    };

    let wallet_line = match &worker.wallet_address {
        Some(wallet) => format!("💼 Кошелек: <code>{wallet}</code>\n"),
        None => "💼 Кошелек: не указан\n".to_string(),
    };

    let unread_line = if data.unread > 0 {
        format!("🔔 Непрочитанных уведомлений: {}\n", data.unread)
    } else {
        String::new()
    };

    let mut breakdown = String::new();
    if !data.stats.service_breakdown.is_empty() {
        breakdown.push_str("\n📊 По сервисам:\n");
        for (service, net) in data.stats.service_breakdown.iter().take(5) {
            breakdown.push_str(&format!("  • {}: {} RUB\n", service, format_amount(*net)));
        }
    }

    format!(
        "{}\n\n\
         {} (@{})\n\
         🆔 <code>{}</code>\n\n\
         🏆 {} <b>{}</b> (+{}% к профитам)\n\
         {} {:.0}%\n\
         {}\n\
         💰 Всего заработано: {} RUB\n\
         📊 Профитов: {}\n\
         📆 За месяц: {} RUB\n\
         📈 Средний: {} RUB · Максимум: {} RUB\n\n\
         🏅 Место в команде: #{} из {}\n\
         📅 За месяц: #{}\n\
         {}\n\
         📆 В команде с {}\n\
         {}{}{}",
        header("ПРОФИЛЬ", "👤"),
        worker.full_name,
        worker.username,
        worker.id,
        tier.emoji,
        tier.name,
        tier.bonus_percent,
        progress_bar(progress.progress_percent, 10),
        progress.progress_percent,
        next_rank_line,
        format_amount(worker.total_profit),
        data.stats.total_count,
        format_amount(data.stats.month_profit),
        format_amount(data.stats.avg_profit),
        format_amount(data.stats.max_profit),
        data.position.overall_rank,
        data.position.total_users,
        data.position.monthly_rank,
        breakdown,
        worker.created_at.format("%d.%m.%Y"),
        mentor_line,
        wallet_line,
        unread_line,
    )
}

fn status_icon(status: ShareStatus) -> &'static str {
    match status {
        ShareStatus::Hold => "⏳",
        ShareStatus::Paid => "✅",
    }
}

pub fn format_history(records: &[ProfitRecord]) -> String {
    if records.is_empty() {
        return "📜 Профитов пока нет.".to_string();
    }

    let mut text = format!("{}\n", header("ИСТОРИЯ ПРОФИТОВ", "📜"));
    for record in records {
        // Paid records show the settlement date, not the creation date.
        let date = record.paid_at.unwrap_or(record.created_at);

        text.push_str(&format!(
            "\n{} {} · {} RUB (из {}) · {}",
            status_icon(record.status),
            date.format("%d.%m.%Y"),
            format_amount(record.net_profit),
            format_amount(record.amount),
            record.service_name,
        ));
    }

    text
}

pub fn format_referrals(
    link: &str,
    worker: &Worker,
    referrals: &[Worker],
    shares: &[ReferralShare],
) -> String {
    let mut text = format!(
        "{}\n\n\
         🔗 Ваша ссылка:\n<code>{}</code>\n\n\
         👥 Приглашено: {}\n\
         💰 Заработано: {} RUB\n",
        header("РЕФЕРАЛЫ", "🔗"),
        link,
        referrals.len(),
        format_amount(worker.referral_earnings),
    );

    if !shares.is_empty() {
        text.push_str("\n📜 Последние начисления:\n");
        for share in shares.iter().take(10) {
            text.push_str(&format!(
                "{} {} · {} RUB\n",
                status_icon(share.status),
                share.created_at.format("%d.%m.%Y"),
                format_amount(share.amount),
            ));
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(net: i64, status: ShareStatus) -> ProfitRecord {
        ProfitRecord {
            id: 1,
            worker_id: 1,
            amount: Decimal::from(net * 2),
            net_profit: Decimal::from(net),
            service_name: "CPA".to_string(),
            status,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            paid_at: None,
        }
    }

    #[test]
    fn history_marks_hold_and_paid() {
        let text = format_history(&[record(100, ShareStatus::Hold), record(50, ShareStatus::Paid)]);

        assert!(text.contains("⏳ 01.03.2024 · 100.00 RUB (из 200.00) · CPA"));
        assert!(text.contains("✅ 01.03.2024 · 50.00 RUB (из 100.00) · CPA"));
    }

    #[test]
    fn empty_history_has_placeholder() {
        assert_eq!(format_history(&[]), "📜 Профитов пока нет.");
    }

    #[test]
    fn referral_link_embeds_user_id() {
        assert_eq!(
            referral_link("team_bot", 42),
            "https://t.me/team_bot?start=ref42"
        );
    }
}
