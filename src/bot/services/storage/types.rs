use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use smartstring::alias::String as SmartString;
use strum_macros::Display;

#[derive(Deserialize, Display, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WorkerStatus {
    Pending,
    Active,
    Banned,
}

/// Two-state ledger status shared by profits and derived shares.
#[derive(Deserialize, Display, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ShareStatus {
    Hold,
    Paid,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Worker {
    pub id: i64,
    pub username: SmartString,
    pub full_name: String,
    pub status: WorkerStatus,
    #[serde(default)]
    pub total_profit: Decimal,
    #[serde(default)]
    pub referral_earnings: Decimal,
    pub referrer_id: Option<i64>,
    pub mentor_id: Option<i32>,
    pub wallet_address: Option<String>,
    pub experience_text: Option<String>,
    pub source_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Service {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub icon: SmartString,
    pub description: Option<String>,
    pub manual_link: Option<String>,
    pub bot_link: Option<String>,
    pub is_active: bool,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ProfitRecord {
    pub id: i32,
    pub worker_id: i64,
    pub amount: Decimal,
    pub net_profit: Decimal,
    pub service_name: String,
    pub status: ShareStatus,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ReferralShare {
    pub id: i32,
    pub referrer_id: i64,
    pub referral_id: i64,
    pub profit_id: i32,
    pub amount: Decimal,
    pub status: ShareStatus,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct MentorShare {
    pub id: i32,
    pub mentor_id: i32,
    pub mentor_user_id: i64,
    pub student_id: i64,
    pub profit_id: i32,
    pub amount: Decimal,
    pub percent: u32,
    pub status: ShareStatus,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

/// Row of the `mentor_details` view: the `mentors` table joined with the
/// mentor's user row.
#[derive(Deserialize, Debug, Clone)]
pub struct Mentor {
    pub id: i32,
    pub user_id: i64,
    pub username: SmartString,
    pub service_name: String,
    pub percent: u32,
    #[serde(default)]
    pub total_earned: Decimal,
    #[serde(default)]
    pub students_count: i32,
    pub is_active: bool,
}

#[derive(Deserialize, Debug, Clone)]
pub struct UserStats {
    #[serde(default)]
    pub total_count: i64,
    #[serde(default)]
    pub total_profit: Decimal,
    #[serde(default)]
    pub avg_profit: Decimal,
    #[serde(default)]
    pub max_profit: Decimal,
    #[serde(default)]
    pub month_profit: Decimal,
    #[serde(default)]
    pub week_profit: Decimal,
    #[serde(default)]
    pub day_profit: Decimal,
    #[serde(skip)]
    pub service_breakdown: Vec<(String, Decimal)>,
}

impl Default for UserStats {
    fn default() -> Self {
        UserStats {
            total_count: 0,
            total_profit: Decimal::ZERO,
            avg_profit: Decimal::ZERO,
            max_profit: Decimal::ZERO,
            month_profit: Decimal::ZERO,
            week_profit: Decimal::ZERO,
            day_profit: Decimal::ZERO,
            service_breakdown: vec![],
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct TopWorker {
    pub user_id: i64,
    pub username: SmartString,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub total_profit: Decimal,
    #[serde(default)]
    pub profits_count: i64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RankingPosition {
    #[serde(default)]
    pub overall_rank: i64,
    #[serde(default)]
    pub overall_profit: Decimal,
    #[serde(default)]
    pub monthly_rank: i64,
    #[serde(default)]
    pub monthly_profit: Decimal,
    #[serde(default)]
    pub total_users: i64,
    #[serde(default)]
    pub user_avg_profit: Decimal,
    #[serde(default)]
    pub team_avg_profit: Decimal,
}

impl RankingPosition {
    pub fn avg_diff_percent(&self) -> Decimal {
        if self.team_avg_profit > Decimal::ZERO {
            (self.user_avg_profit - self.team_avg_profit) / self.team_avg_profit
                * Decimal::from(100)
        } else {
            Decimal::ZERO
        }
    }
}

impl Default for RankingPosition {
    fn default() -> Self {
        RankingPosition {
            overall_rank: 1,
            overall_profit: Decimal::ZERO,
            monthly_rank: 1,
            monthly_profit: Decimal::ZERO,
            total_users: 1,
            user_avg_profit: Decimal::ZERO,
            team_avg_profit: Decimal::ZERO,
        }
    }
}

/// Unpaid hold records aggregated per beneficiary, as returned by the
/// `get_unpaid_*_summary` RPCs.
#[derive(Deserialize, Debug, Clone)]
pub struct UnpaidSummary {
    pub user_id: i64,
    pub username: SmartString,
    #[serde(default)]
    pub total_amount: Decimal,
    #[serde(default)]
    pub records_count: i64,
}

#[derive(Deserialize, Display, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MentorBroadcastStatus {
    Pending,
    Sending,
    Completed,
    Failed,
}

#[derive(Deserialize, Display, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RecipientStatus {
    Pending,
    Sent,
    Failed,
}

#[derive(Deserialize, Debug, Clone)]
pub struct MentorBroadcast {
    pub id: i32,
    pub mentor_user_id: i64,
    pub message_text: String,
    pub status: MentorBroadcastStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct MentorBroadcastRecipient {
    pub broadcast_id: i32,
    pub student_id: i64,
    pub status: RecipientStatus,
}
