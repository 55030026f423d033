pub mod cache;
pub mod types;

use std::collections::BTreeMap;

use anyhow::Context;
use chrono::Utc;
use reqwest::header::AUTHORIZATION;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::config;

use self::cache::StorageCache;
use self::types::{
    Mentor, MentorBroadcast, MentorBroadcastRecipient, MentorBroadcastStatus, MentorShare,
    ProfitRecord, RankingPosition, RecipientStatus, ReferralShare, Service, TopWorker,
    UnpaidSummary, UserStats, Worker, WorkerStatus,
};

/// PostgREST client for the hosted Postgres. Row CRUD per table plus the
/// aggregate RPCs; the bot never builds SQL itself.
pub struct Storage {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    pub cache: StorageCache,
}

pub struct ProfileData {
    pub worker: Worker,
    pub stats: UserStats,
    pub position: RankingPosition,
    pub mentor: Option<Mentor>,
    pub unread: i64,
}

impl Storage {
    pub fn new() -> Storage {
        Storage::with_endpoint(&config::CONFIG.supabase_url, &config::CONFIG.supabase_key)
    }

    pub fn with_endpoint(base_url: &str, api_key: &str) -> Storage {
        Storage {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            cache: StorageCache::new(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header(AUTHORIZATION, format!("Bearer {}", &self.api_key))
    }

    async fn select<T>(&self, table: &str, query: &[(&str, String)]) -> anyhow::Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .auth(self.http.get(self.table_url(table)))
            .query(query)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    async fn count(&self, table: &str, query: &[(&str, String)]) -> anyhow::Result<i64> {
        let response = self
            .auth(self.http.get(self.table_url(table)))
            .query(query)
            .header("Prefer", "count=exact")
            .header("Range", "0-0")
            .send()
            .await?
            .error_for_status()?;

        // PostgREST reports the exact total in `Content-Range: 0-0/N`.
        let total = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.rsplit('/').next())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        Ok(total)
    }

    async fn insert<T>(&self, table: &str, body: Value) -> anyhow::Result<T>
    where
        T: DeserializeOwned,
    {
        let rows: Vec<T> = self
            .auth(self.http.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        rows.into_iter()
            .next()
            .with_context(|| format!("empty insert response from {table}"))
    }

    async fn insert_only(&self, table: &str, body: Value) -> anyhow::Result<()> {
        self.auth(self.http.post(self.table_url(table)))
            .header("Prefer", "return=minimal")
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    async fn upsert_only(&self, table: &str, body: Value) -> anyhow::Result<()> {
        self.auth(self.http.post(self.table_url(table)))
            .header("Prefer", "return=minimal,resolution=merge-duplicates")
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    async fn update<T>(
        &self,
        table: &str,
        query: &[(&str, String)],
        body: Value,
    ) -> anyhow::Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let rows = self
            .auth(self.http.patch(self.table_url(table)))
            .query(query)
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(rows)
    }

    async fn rpc<T>(&self, function: &str, args: Value) -> anyhow::Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self
            .auth(
                self.http
                    .post(format!("{}/rest/v1/rpc/{}", self.base_url, function)),
            )
            .json(&args)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    // ── Workers ─────────────────────────────────────────────────────────

    pub async fn worker(&self, user_id: i64) -> anyhow::Result<Option<Worker>> {
        if let Some(worker) = self.cache.workers.get(&user_id).await {
            return Ok(Some(worker));
        }

        let rows: Vec<Worker> = self
            .select(
                "users",
                &[("select", "*".to_string()), ("id", format!("eq.{user_id}"))],
            )
            .await?;
        let worker = rows.into_iter().next();

        if let Some(worker) = &worker {
            self.cache.workers.insert(user_id, worker.clone()).await;
        }

        Ok(worker)
    }

    pub async fn worker_by_username(&self, username: &str) -> anyhow::Result<Option<Worker>> {
        let rows: Vec<Worker> = self
            .select(
                "users",
                &[
                    ("select", "*".to_string()),
                    ("username", format!("eq.{username}")),
                ],
            )
            .await?;

        Ok(rows.into_iter().next())
    }

    pub async fn create_worker(
        &self,
        user_id: i64,
        username: &str,
        full_name: &str,
        experience_text: Option<&str>,
        source_text: &str,
        referrer_id: Option<i64>,
    ) -> anyhow::Result<()> {
        let mut body = json!({
            "id": user_id,
            "username": username,
            "full_name": full_name,
            "experience_text": experience_text,
            "source_text": source_text,
            "status": WorkerStatus::Pending.to_string(),
        });
        if let Some(referrer_id) = referrer_id {
            body["referrer_id"] = json!(referrer_id);
        }

        self.insert_only("users", body).await
    }

    pub async fn update_worker_status(
        &self,
        user_id: i64,
        status: WorkerStatus,
    ) -> anyhow::Result<()> {
        self.update::<Value>(
            "users",
            &[("id", format!("eq.{user_id}"))],
            json!({"status": status.to_string()}),
        )
        .await?;
        self.cache.invalidate_worker(user_id).await;

        Ok(())
    }

    pub async fn set_worker_wallet(&self, user_id: i64, wallet: &str) -> anyhow::Result<()> {
        self.update::<Value>(
            "users",
            &[("id", format!("eq.{user_id}"))],
            json!({"wallet_address": wallet}),
        )
        .await?;
        self.cache.invalidate_worker(user_id).await;

        Ok(())
    }

    /// Only the distribution recorder may call this: the stored cumulative
    /// total must stay equal to the sum of the worker's net profits.
    pub async fn set_worker_total(&self, user_id: i64, total: Decimal) -> anyhow::Result<()> {
        self.update::<Value>(
            "users",
            &[("id", format!("eq.{user_id}"))],
            json!({"total_profit": total}),
        )
        .await?;
        self.cache.invalidate_worker(user_id).await;

        Ok(())
    }

    /// Referral earnings are a separate counter and never feed ranking.
    pub async fn add_referral_earnings(
        &self,
        referrer: &Worker,
        amount: Decimal,
    ) -> anyhow::Result<()> {
        self.update::<Value>(
            "users",
            &[("id", format!("eq.{}", referrer.id))],
            json!({"referral_earnings": referrer.referral_earnings + amount}),
        )
        .await?;
        self.cache.invalidate_worker(referrer.id).await;

        Ok(())
    }

    pub async fn active_worker_ids(&self) -> anyhow::Result<Vec<i64>> {
        #[derive(serde::Deserialize)]
        struct Row {
            id: i64,
        }

        let rows: Vec<Row> = self
            .select(
                "users",
                &[
                    ("select", "id".to_string()),
                    ("status", format!("eq.{}", WorkerStatus::Active)),
                ],
            )
            .await?;

        Ok(rows.into_iter().map(|row| row.id).collect())
    }

    pub async fn workers_by_status(&self, status: WorkerStatus) -> anyhow::Result<Vec<Worker>> {
        self.select(
            "users",
            &[
                ("select", "*".to_string()),
                ("status", format!("eq.{status}")),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    pub async fn referrals_of(&self, user_id: i64) -> anyhow::Result<Vec<Worker>> {
        self.select(
            "users",
            &[
                ("select", "*".to_string()),
                ("referrer_id", format!("eq.{user_id}")),
            ],
        )
        .await
    }

    // ── Services ────────────────────────────────────────────────────────

    pub async fn active_services(&self) -> anyhow::Result<Vec<Service>> {
        if let Some(services) = self.cache.services.get(&()).await {
            return Ok(services);
        }

        let services: Vec<Service> = self
            .select(
                "services",
                &[
                    ("select", "*".to_string()),
                    ("is_active", "eq.true".to_string()),
                    ("order", "name".to_string()),
                ],
            )
            .await?;
        self.cache.services.insert((), services.clone()).await;

        Ok(services)
    }

    pub async fn service(&self, service_id: i32) -> anyhow::Result<Option<Service>> {
        let services = self.active_services().await?;

        Ok(services.into_iter().find(|s| s.id == service_id))
    }

    pub async fn add_service(
        &self,
        name: &str,
        description: Option<&str>,
        manual_link: Option<&str>,
        bot_link: Option<&str>,
    ) -> anyhow::Result<Service> {
        let service = self
            .insert(
                "services",
                json!({
                    "name": name,
                    "icon": "🔹",
                    "description": description,
                    "manual_link": manual_link,
                    "bot_link": bot_link,
                }),
            )
            .await?;
        self.cache.invalidate_services().await;

        Ok(service)
    }

    /// Soft delete: services referenced by old profits are never removed.
    pub async fn deactivate_service(&self, service_id: i32) -> anyhow::Result<()> {
        self.update::<Value>(
            "services",
            &[("id", format!("eq.{service_id}"))],
            json!({"is_active": false}),
        )
        .await?;
        self.cache.invalidate_services().await;

        Ok(())
    }

    // ── Mentors ─────────────────────────────────────────────────────────

    pub async fn mentors(&self) -> anyhow::Result<Vec<Mentor>> {
        if let Some(mentors) = self.cache.mentors.get(&()).await {
            return Ok(mentors);
        }

        let mentors: Vec<Mentor> = self
            .select(
                "mentor_details",
                &[
                    ("select", "*".to_string()),
                    ("is_active", "eq.true".to_string()),
                ],
            )
            .await?;
        self.cache.mentors.insert((), mentors.clone()).await;

        Ok(mentors)
    }

    pub async fn mentor(&self, mentor_id: i32) -> anyhow::Result<Option<Mentor>> {
        let mentors = self.mentors().await?;

        Ok(mentors.into_iter().find(|m| m.id == mentor_id))
    }

    pub async fn mentor_by_user(&self, user_id: i64) -> anyhow::Result<Option<Mentor>> {
        let mentors = self.mentors().await?;

        Ok(mentors.into_iter().find(|m| m.user_id == user_id))
    }

    pub async fn worker_mentor(&self, worker: &Worker) -> anyhow::Result<Option<Mentor>> {
        match worker.mentor_id {
            Some(mentor_id) => self.mentor(mentor_id).await,
            None => Ok(None),
        }
    }

    pub async fn add_mentor(
        &self,
        user_id: i64,
        service_name: &str,
        percent: u32,
    ) -> anyhow::Result<()> {
        self.insert_only(
            "mentors",
            json!({
                "user_id": user_id,
                "service_name": service_name,
                "percent": percent,
            }),
        )
        .await?;
        self.cache.invalidate_mentors().await;

        Ok(())
    }

    pub async fn assign_mentor(&self, student_id: i64, mentor: &Mentor) -> anyhow::Result<()> {
        self.update::<Value>(
            "users",
            &[("id", format!("eq.{student_id}"))],
            json!({"mentor_id": mentor.id}),
        )
        .await?;
        self.update::<Value>(
            "mentors",
            &[("id", format!("eq.{}", mentor.id))],
            json!({"students_count": mentor.students_count + 1}),
        )
        .await?;

        self.cache.invalidate_worker(student_id).await;
        self.cache.invalidate_mentors().await;

        Ok(())
    }

    pub async fn remove_mentor(&self, student: &Worker) -> anyhow::Result<()> {
        if let Some(mentor_id) = student.mentor_id {
            if let Some(mentor) = self.mentor(mentor_id).await? {
                self.update::<Value>(
                    "mentors",
                    &[("id", format!("eq.{mentor_id}"))],
                    json!({"students_count": (mentor.students_count - 1).max(0)}),
                )
                .await?;
            }
        }

        self.update::<Value>(
            "users",
            &[("id", format!("eq.{}", student.id))],
            json!({"mentor_id": Value::Null}),
        )
        .await?;

        self.cache.invalidate_worker(student.id).await;
        self.cache.invalidate_mentors().await;

        Ok(())
    }

    pub async fn deactivate_mentor(&self, mentor_id: i32) -> anyhow::Result<()> {
        self.update::<Value>(
            "users",
            &[("mentor_id", format!("eq.{mentor_id}"))],
            json!({"mentor_id": Value::Null}),
        )
        .await?;
        self.update::<Value>(
            "mentors",
            &[("id", format!("eq.{mentor_id}"))],
            json!({"is_active": false}),
        )
        .await?;

        self.cache.invalidate_mentors().await;
        self.cache.invalidate_all_workers();

        Ok(())
    }

    pub async fn add_mentor_earnings(
        &self,
        mentor: &Mentor,
        amount: Decimal,
    ) -> anyhow::Result<()> {
        self.update::<Value>(
            "mentors",
            &[("id", format!("eq.{}", mentor.id))],
            json!({"total_earned": mentor.total_earned + amount}),
        )
        .await?;
        self.cache.invalidate_mentors().await;

        Ok(())
    }

    pub async fn students_of(&self, mentor_id: i32) -> anyhow::Result<Vec<Worker>> {
        self.select(
            "users",
            &[
                ("select", "*".to_string()),
                ("mentor_id", format!("eq.{mentor_id}")),
            ],
        )
        .await
    }

    // ── Profits & derived shares ────────────────────────────────────────

    pub async fn create_profit(
        &self,
        worker_id: i64,
        amount: Decimal,
        net_profit: Decimal,
        service_name: &str,
    ) -> anyhow::Result<ProfitRecord> {
        let record = self
            .insert(
                "profits",
                json!({
                    "worker_id": worker_id,
                    "amount": amount,
                    "net_profit": net_profit,
                    "service_name": service_name,
                    "status": "hold",
                }),
            )
            .await?;
        self.cache.invalidate_worker(worker_id).await;

        Ok(record)
    }

    pub async fn worker_profits(
        &self,
        user_id: i64,
        limit: u32,
    ) -> anyhow::Result<Vec<ProfitRecord>> {
        self.select(
            "profits",
            &[
                ("select", "*".to_string()),
                ("worker_id", format!("eq.{user_id}")),
                ("order", "created_at.desc".to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    pub async fn create_referral_share(
        &self,
        referrer_id: i64,
        referral_id: i64,
        profit_id: i32,
        amount: Decimal,
    ) -> anyhow::Result<()> {
        self.insert_only(
            "referral_profits",
            json!({
                "referrer_id": referrer_id,
                "referral_id": referral_id,
                "profit_id": profit_id,
                "amount": amount,
                "status": "hold",
            }),
        )
        .await
    }

    pub async fn create_mentor_share(
        &self,
        mentor: &Mentor,
        student_id: i64,
        profit_id: i32,
        amount: Decimal,
    ) -> anyhow::Result<()> {
        self.insert_only(
            "mentor_profits",
            json!({
                "mentor_id": mentor.id,
                "mentor_user_id": mentor.user_id,
                "student_id": student_id,
                "profit_id": profit_id,
                "amount": amount,
                "percent": mentor.percent,
                "status": "hold",
            }),
        )
        .await
    }

    pub async fn referral_shares_of(
        &self,
        referrer_id: i64,
    ) -> anyhow::Result<Vec<ReferralShare>> {
        self.select(
            "referral_profits",
            &[
                ("select", "*".to_string()),
                ("referrer_id", format!("eq.{referrer_id}")),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    pub async fn mentor_shares_of(
        &self,
        mentor_user_id: i64,
    ) -> anyhow::Result<Vec<MentorShare>> {
        self.select(
            "mentor_profits",
            &[
                ("select", "*".to_string()),
                ("mentor_user_id", format!("eq.{mentor_user_id}")),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    /// Bulk hold→paid for one beneficiary. The PATCH returns the affected
    /// rows, so a repeated call with no new holds settles zero.
    pub async fn mark_shares_paid(
        &self,
        table: &str,
        beneficiary_column: &str,
        beneficiary_id: i64,
    ) -> anyhow::Result<u64> {
        let rows: Vec<Value> = self
            .update(
                table,
                &[
                    (beneficiary_column, format!("eq.{beneficiary_id}")),
                    ("status", "eq.hold".to_string()),
                ],
                json!({
                    "status": "paid",
                    "paid_at": Utc::now().to_rfc3339(),
                }),
            )
            .await?;

        Ok(rows.len() as u64)
    }

    // ── Aggregates ──────────────────────────────────────────────────────

    pub async fn user_stats(&self, user_id: i64) -> anyhow::Result<UserStats> {
        if let Some(stats) = self.cache.stats.get(&user_id).await {
            return Ok(stats);
        }

        let rows: Vec<UserStats> = self
            .rpc("get_user_stats", json!({"p_user_id": user_id}))
            .await?;
        let mut stats = rows.into_iter().next().unwrap_or_default();

        #[derive(serde::Deserialize)]
        struct BreakdownRow {
            service_name: String,
            net_profit: Decimal,
        }

        let rows: Vec<BreakdownRow> = self
            .select(
                "profits",
                &[
                    ("select", "service_name,net_profit".to_string()),
                    ("worker_id", format!("eq.{user_id}")),
                ],
            )
            .await?;

        let mut by_service: BTreeMap<String, Decimal> = BTreeMap::new();
        for row in rows {
            *by_service.entry(row.service_name).or_default() += row.net_profit;
        }
        stats.service_breakdown = by_service.into_iter().collect();

        self.cache.stats.insert(user_id, stats.clone()).await;

        Ok(stats)
    }

    pub async fn top_workers(&self, period: &str, limit: u32) -> anyhow::Result<Vec<TopWorker>> {
        let cache_key = format!("{period}:{limit}");
        if let Some(top) = self.cache.top.get(&cache_key).await {
            return Ok(top);
        }

        let top: Vec<TopWorker> = self
            .rpc(
                "get_top_workers",
                json!({"p_period": period, "p_limit": limit}),
            )
            .await?;
        self.cache.top.insert(cache_key, top.clone()).await;

        Ok(top)
    }

    pub async fn user_position(&self, user_id: i64) -> anyhow::Result<RankingPosition> {
        if let Some(position) = self.cache.positions.get(&user_id).await {
            return Ok(position);
        }

        let rows: Vec<RankingPosition> = self
            .rpc("get_user_position", json!({"p_user_id": user_id}))
            .await?;
        let position = rows.into_iter().next().unwrap_or_default();
        self.cache.positions.insert(user_id, position.clone()).await;

        Ok(position)
    }

    pub async fn unpaid_worker_summary(&self) -> anyhow::Result<Vec<UnpaidSummary>> {
        self.rpc("get_unpaid_profits_summary", json!({})).await
    }

    pub async fn unpaid_referral_summary(&self) -> anyhow::Result<Vec<UnpaidSummary>> {
        self.rpc("get_unpaid_referral_summary", json!({})).await
    }

    pub async fn unpaid_mentor_summary(&self) -> anyhow::Result<Vec<UnpaidSummary>> {
        self.rpc("get_unpaid_mentor_summary", json!({})).await
    }

    pub async fn profile_data(&self, worker: Worker) -> anyhow::Result<ProfileData> {
        let mentor_id = worker.mentor_id;
        let (stats, position, mentor, unread) = tokio::join!(
            self.user_stats(worker.id),
            self.user_position(worker.id),
            async {
                match mentor_id {
                    Some(mentor_id) => self.mentor(mentor_id).await,
                    None => Ok(None),
                }
            },
            self.unread_notifications(worker.id),
        );

        Ok(ProfileData {
            worker,
            stats: stats?,
            position: position?,
            mentor: mentor?,
            unread: unread.unwrap_or(0),
        })
    }

    // ── Logs, notifications, settings ───────────────────────────────────

    /// Fire-and-forget audit trail: a failed log line never fails the
    /// operation being logged.
    pub async fn log_admin_action(
        &self,
        admin_id: i64,
        admin_username: &str,
        action_type: &str,
        details: Option<&str>,
        target_user_id: Option<i64>,
    ) {
        let result = self
            .insert_only(
                "admin_logs",
                json!({
                    "admin_id": admin_id,
                    "admin_username": admin_username,
                    "action_type": action_type,
                    "action_details": details,
                    "target_user_id": target_user_id,
                }),
            )
            .await;

        if let Err(err) = result {
            tracing::error!("Admin log write failed: {:?}", err);
        }
    }

    pub async fn log_rank_change(
        &self,
        user_id: i64,
        old_rank: &str,
        new_rank: &str,
        old_level: u8,
        new_level: u8,
        total_profit: Decimal,
    ) -> anyhow::Result<()> {
        self.insert_only(
            "rank_history",
            json!({
                "user_id": user_id,
                "old_rank": old_rank,
                "new_rank": new_rank,
                "old_level": old_level,
                "new_level": new_level,
                "total_profit": total_profit,
            }),
        )
        .await
    }

    pub async fn create_notification(
        &self,
        user_id: i64,
        notification_type: &str,
        title: &str,
        message: &str,
    ) -> anyhow::Result<()> {
        self.insert_only(
            "notifications",
            json!({
                "user_id": user_id,
                "notification_type": notification_type,
                "title": title,
                "message": message,
            }),
        )
        .await
    }

    pub async fn unread_notifications(&self, user_id: i64) -> anyhow::Result<i64> {
        self.count(
            "notifications",
            &[
                ("select", "id".to_string()),
                ("user_id", format!("eq.{user_id}")),
                ("is_read", "eq.false".to_string()),
            ],
        )
        .await
    }

    pub async fn setting(&self, key: &str) -> anyhow::Result<Option<String>> {
        if let Some(value) = self.cache.settings.get(key).await {
            return Ok(Some(value));
        }

        #[derive(serde::Deserialize)]
        struct Row {
            value: String,
        }

        let rows: Vec<Row> = self
            .select(
                "bot_settings",
                &[
                    ("select", "value".to_string()),
                    ("key", format!("eq.{key}")),
                ],
            )
            .await?;
        let value = rows.into_iter().next().map(|row| row.value);

        if let Some(value) = &value {
            self.cache
                .settings
                .insert(key.to_string(), value.clone())
                .await;
        }

        Ok(value)
    }

    pub async fn set_setting(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.upsert_only("bot_settings", json!({"key": key, "value": value}))
            .await?;
        self.cache.settings.invalidate(key).await;

        Ok(())
    }

    pub async fn ping(&self) -> anyhow::Result<()> {
        self.select::<Value>(
            "bot_settings",
            &[("select", "key".to_string()), ("limit", "1".to_string())],
        )
        .await?;

        Ok(())
    }

    pub async fn init_defaults(&self) -> anyhow::Result<()> {
        let defaults = [
            ("maintenance_mode", "false"),
            ("welcome_message", "Добро пожаловать в команду!"),
            ("min_payout_amount", "50"),
        ];

        for (key, value) in defaults {
            if self.setting(key).await?.is_none() {
                self.set_setting(key, value).await?;
            }
        }

        Ok(())
    }

    pub async fn warm_cache(&self) {
        let (services, mentors) = tokio::join!(self.active_services(), self.mentors());

        if services.is_ok() && mentors.is_ok() {
            tracing::info!("Cache warmed up");
        }
    }

    // ── Mentor broadcast queue ──────────────────────────────────────────

    pub async fn enqueue_mentor_broadcast(
        &self,
        mentor_user_id: i64,
        message_text: &str,
        student_ids: &[i64],
    ) -> anyhow::Result<i32> {
        let broadcast: MentorBroadcast = self
            .insert(
                "mentor_broadcasts",
                json!({
                    "mentor_user_id": mentor_user_id,
                    "message_text": message_text,
                    "status": "pending",
                }),
            )
            .await?;

        let recipients: Vec<Value> = student_ids
            .iter()
            .map(|student_id| {
                json!({
                    "broadcast_id": broadcast.id,
                    "student_id": student_id,
                    "status": "pending",
                })
            })
            .collect();
        self.insert_only("mentor_broadcast_recipients", Value::Array(recipients))
            .await?;

        Ok(broadcast.id)
    }

    pub async fn pending_mentor_broadcasts(&self) -> anyhow::Result<Vec<MentorBroadcast>> {
        self.select(
            "mentor_broadcasts",
            &[
                ("select", "*".to_string()),
                ("status", "eq.pending".to_string()),
                ("order", "created_at".to_string()),
            ],
        )
        .await
    }

    pub async fn pending_broadcast_recipients(
        &self,
        broadcast_id: i32,
    ) -> anyhow::Result<Vec<MentorBroadcastRecipient>> {
        self.select(
            "mentor_broadcast_recipients",
            &[
                ("select", "*".to_string()),
                ("broadcast_id", format!("eq.{broadcast_id}")),
                ("status", "eq.pending".to_string()),
            ],
        )
        .await
    }

    pub async fn set_recipient_status(
        &self,
        broadcast_id: i32,
        student_id: i64,
        status: RecipientStatus,
        error: Option<&str>,
    ) -> anyhow::Result<()> {
        self.update::<Value>(
            "mentor_broadcast_recipients",
            &[
                ("broadcast_id", format!("eq.{broadcast_id}")),
                ("student_id", format!("eq.{student_id}")),
            ],
            json!({"status": status.to_string(), "error_text": error}),
        )
        .await?;

        Ok(())
    }

    pub async fn set_mentor_broadcast_status(
        &self,
        broadcast_id: i32,
        status: MentorBroadcastStatus,
        sent_count: Option<u32>,
    ) -> anyhow::Result<()> {
        let mut body = json!({"status": status.to_string()});
        if let Some(sent_count) = sent_count {
            body["sent_count"] = json!(sent_count);
        }

        self.update::<Value>(
            "mentor_broadcasts",
            &[("id", format!("eq.{broadcast_id}"))],
            body,
        )
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::types::ShareStatus;
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn profit_round_trips_with_hold_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/profits"))
            .and(header("apikey", "test-key"))
            .and(body_partial_json(
                serde_json::json!({"worker_id": 1, "amount": 2000.0, "net_profit": 882.0, "service_name": "CPA", "status": "hold"}),
            ))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([{
                "id": 5,
                "worker_id": 1,
                "amount": 2000.0,
                "net_profit": 882.0,
                "service_name": "CPA",
                "status": "hold",
                "created_at": "2024-01-01T00:00:00Z",
                "paid_at": null,
            }])))
            .mount(&server)
            .await;

        let storage = Storage::with_endpoint(&server.uri(), "test-key");
        let record = storage
            .create_profit(1, Decimal::from(2000), Decimal::from(882), "CPA")
            .await
            .unwrap();

        assert_eq!(record.id, 5);
        assert_eq!(record.amount, Decimal::from(2000));
        assert_eq!(record.net_profit, Decimal::from(882));
        assert_eq!(record.service_name, "CPA");
        assert_eq!(record.status, ShareStatus::Hold);
        assert!(record.paid_at.is_none());
    }

    #[tokio::test]
    async fn worker_reads_are_cached_until_invalidated() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/users"))
            .and(query_param("id", "eq.7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                "id": 7,
                "username": "worker",
                "full_name": "Worker",
                "status": "active",
                "total_profit": 10,
                "referral_earnings": 0,
                "referrer_id": null,
                "mentor_id": null,
                "wallet_address": null,
                "experience_text": null,
                "source_text": null,
                "created_at": "2024-01-01T00:00:00Z",
            }])))
            .expect(2)
            .mount(&server)
            .await;

        let storage = Storage::with_endpoint(&server.uri(), "test-key");

        storage.worker(7).await.unwrap().unwrap();
        storage.worker(7).await.unwrap().unwrap();

        storage.cache.invalidate_worker(7).await;
        storage.worker(7).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn unread_count_comes_from_content_range() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/notifications"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-range", "0-0/42")
                    .set_body_json(serde_json::json!([])),
            )
            .mount(&server)
            .await;

        let storage = Storage::with_endpoint(&server.uri(), "test-key");

        assert_eq!(storage.unread_notifications(7).await.unwrap(), 42);
    }
}
