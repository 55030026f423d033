use rust_decimal::prelude::*;

#[derive(Debug, PartialEq, Eq)]
pub struct RankTier {
    pub name: &'static str,
    pub emoji: &'static str,
    pub min: i64,
    pub max: Option<i64>,
    pub bonus_percent: u32,
    pub level: u8,
}

/// Ascending bands over cumulative profit; the top band is unbounded.
pub const RANK_TIERS: [RankTier; 5] = [
    RankTier {
        name: "Новичок",
        emoji: "🌱",
        min: 0,
        max: Some(49_999),
        bonus_percent: 0,
        level: 1,
    },
    RankTier {
        name: "Воркер",
        emoji: "⚡",
        min: 50_000,
        max: Some(99_999),
        bonus_percent: 2,
        level: 2,
    },
    RankTier {
        name: "Профи",
        emoji: "💎",
        min: 100_000,
        max: Some(149_999),
        bonus_percent: 5,
        level: 3,
    },
    RankTier {
        name: "Эксперт",
        emoji: "👑",
        min: 150_000,
        max: Some(199_999),
        bonus_percent: 7,
        level: 4,
    },
    RankTier {
        name: "Легенда",
        emoji: "🔥",
        min: 200_000,
        max: None,
        bonus_percent: 10,
        level: 5,
    },
];

pub fn rank_for(total_profit: Decimal) -> &'static RankTier {
    let total = total_profit.max(Decimal::ZERO);

    RANK_TIERS
        .iter()
        .rev()
        .find(|tier| total >= Decimal::from(tier.min))
        .unwrap_or(&RANK_TIERS[0])
}

pub struct RankProgress {
    pub tier: &'static RankTier,
    pub progress_percent: Decimal,
    pub amount_to_next: Decimal,
}

pub fn rank_progress(total_profit: Decimal) -> RankProgress {
    let total = total_profit.max(Decimal::ZERO);
    let tier = rank_for(total);

    match tier.max {
        Some(max) => {
            let span = Decimal::from(max - tier.min + 1);
            let progress_percent =
                (total - Decimal::from(tier.min)) / span * Decimal::from(100);

            RankProgress {
                tier,
                progress_percent: progress_percent.min(Decimal::from(100)),
                amount_to_next: (Decimal::from(max + 1) - total).max(Decimal::ZERO),
            }
        }
        None => RankProgress {
            tier,
            progress_percent: Decimal::from(100),
            amount_to_next: Decimal::ZERO,
        },
    }
}

/// New tier iff the level strictly increased. A jump over several bands
/// reports only the tier reached.
pub fn check_rank_up(old_total: Decimal, new_total: Decimal) -> Option<&'static RankTier> {
    let old_tier = rank_for(old_total);
    let new_tier = rank_for(new_total);

    (new_tier.level > old_tier.level).then_some(new_tier)
}

pub fn progress_bar(progress_percent: Decimal, length: usize) -> String {
    let filled = (progress_percent.max(Decimal::ZERO).min(Decimal::from(100))
        / Decimal::from(100)
        * Decimal::from(length as u64))
    .floor()
    .to_usize()
    .unwrap_or(0)
    .min(length);

    format!("{}{}", "█".repeat(filled), "░".repeat(length - filled))
}

pub fn reward_message(tier: &RankTier) -> String {
    match tier.level {
        2 => "🎉 <b>ПОЗДРАВЛЯЕМ С ПОВЫШЕНИЕМ!</b>\n\n\
              ⚡ Вы достигли ранга <b>ВОРКЕР</b>!\n\n\
              💰 +2% к каждому профиту\n\
              ⭐ Новый значок в профиле\n\n\
              Продолжайте в том же духе! 💪"
            .to_string(),
        3 => "🎊 <b>НОВЫЙ РАНГ!</b>\n\n\
              💎 Вы стали <b>ПРОФИ</b>!\n\n\
              💰 +5% к каждому профиту\n\
              👨‍🏫 Возможность стать наставником\n\
              ⭐ Эксклюзивный значок\n\n\
              Вы в топе! 🚀"
            .to_string(),
        4 => "👑 <b>ЛЕГЕНДАРНОЕ ДОСТИЖЕНИЕ!</b>\n\n\
              👑 Вы достигли ранга <b>ЭКСПЕРТ</b>!\n\n\
              💰 +7% к каждому профиту\n\
              🎯 Персональная поддержка\n\
              ⭐ Золотой значок\n\n\
              Вы элита команды! 👑"
            .to_string(),
        5 => "🔥 <b>МАКСИМАЛЬНЫЙ РАНГ ДОСТИГНУТ!</b>\n\n\
              🔥 Вы стали <b>ЛЕГЕНДОЙ</b>!\n\n\
              💰 +10% к каждому профиту\n\
              🎖️ Место в зале славы\n\
              🏆 Особый статус в команде\n\n\
              Вы достигли вершины! 🏔️"
            .to_string(),
        _ => "🎉 Поздравляем с повышением ранга!".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tiers_partition_without_gaps() {
        let mut prev_level = 0;

        for total in [
            0, 1, 49_999, 50_000, 99_999, 100_000, 149_999, 150_000, 199_999, 200_000, 10_000_000,
        ] {
            let tier = rank_for(Decimal::from(total));
            assert!(tier.level >= prev_level, "levels must be non-decreasing");
            prev_level = tier.level;
        }

        assert_eq!(rank_for(Decimal::from(0)).name, "Новичок");
        assert_eq!(rank_for(Decimal::from(49_999)).name, "Новичок");
        assert_eq!(rank_for(Decimal::from(50_000)).name, "Воркер");
        assert_eq!(rank_for(Decimal::from(200_000)).name, "Легенда");
    }

    #[test]
    fn fractional_totals_stay_in_band() {
        let total = Decimal::new(4_999_950, 2); // 49_999.50
        assert_eq!(rank_for(total).level, 1);
    }

    #[test]
    fn negative_totals_are_clamped() {
        assert_eq!(rank_for(Decimal::from(-100)).level, 1);
    }

    #[test]
    fn rank_up_on_boundary_crossing() {
        let tier = check_rank_up(Decimal::from(49_999), Decimal::from(50_000))
            .expect("crossing 50k must rank up");
        assert_eq!(tier.name, "Воркер");
        assert_eq!(tier.level, 2);
    }

    #[test]
    fn no_rank_up_within_band() {
        assert!(check_rank_up(Decimal::from(50_000), Decimal::from(60_000)).is_none());
    }

    #[test]
    fn no_rank_up_on_decrease() {
        assert!(check_rank_up(Decimal::from(100_000), Decimal::from(50_000)).is_none());
    }

    #[test]
    fn multi_tier_jump_reports_only_reached_tier() {
        let tier = check_rank_up(Decimal::from(0), Decimal::from(150_000)).unwrap();
        assert_eq!(tier.level, 4);
    }

    #[test]
    fn progress_is_clamped_for_top_tier() {
        let progress = rank_progress(Decimal::from(1_000_000));
        assert_eq!(progress.progress_percent, Decimal::from(100));
        assert_eq!(progress.amount_to_next, Decimal::ZERO);
    }

    #[test]
    fn progress_counts_toward_next_band() {
        let progress = rank_progress(Decimal::from(75_000));
        assert_eq!(progress.tier.level, 2);
        assert_eq!(progress.amount_to_next, Decimal::from(25_000));
        assert!(progress.progress_percent > Decimal::from(49));
        assert!(progress.progress_percent < Decimal::from(51));
    }

    #[test]
    fn progress_bar_is_proportional() {
        assert_eq!(progress_bar(Decimal::from(0), 10), "░░░░░░░░░░");
        assert_eq!(progress_bar(Decimal::from(50), 10), "█████░░░░░");
        assert_eq!(progress_bar(Decimal::from(100), 10), "██████████");
    }
}
