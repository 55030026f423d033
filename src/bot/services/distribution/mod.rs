pub mod ranks;
pub mod settlement;
pub mod split;

use std::sync::Arc;

use anyhow::Context;
use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use self::ranks::RankTier;
use self::split::Split;
use super::storage::types::{Mentor, Worker};
use super::storage::Storage;

/// Runs the profit pipeline: pre-state read → rank resolve → split →
/// ProfitRecord + derived shares → cumulative total update → rank-up check.
///
/// PostgREST gives no cross-request transactions, so writes for one worker
/// are serialized through a per-worker async mutex; concurrent profits for
/// different workers proceed independently.
pub struct Distributor {
    worker_locks: DashMap<i64, Arc<Mutex<()>>>,
}

#[derive(Debug)]
pub struct ProfitOutcome {
    pub profit_id: i32,
    pub split: Split,
    pub tier: &'static RankTier,
    pub referrer: Option<Worker>,
    pub mentor: Option<Mentor>,
    pub rank_up: Option<&'static RankTier>,
    pub new_total: Decimal,
}

fn reconciliation_context(profit_id: i32) -> String {
    format!(
        "profit #{profit_id} is recorded, but a follow-up write failed; \
         manual reconciliation required"
    )
}

impl Distributor {
    pub fn new() -> Self {
        Distributor {
            worker_locks: DashMap::new(),
        }
    }

    fn worker_lock(&self, worker_id: i64) -> Arc<Mutex<()>> {
        self.worker_locks
            .entry(worker_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    pub async fn record_profit(
        &self,
        storage: &Storage,
        worker_id: i64,
        gross: Decimal,
        worker_percent: u32,
        service_name: &str,
        referral_percent: u32,
    ) -> anyhow::Result<ProfitOutcome> {
        let lock = self.worker_lock(worker_id);
        let _guard = lock.lock().await;

        let worker = storage
            .worker(worker_id)
            .await?
            .context("worker not found")?;

        let old_total = worker.total_profit.max(Decimal::ZERO);
        let tier = ranks::rank_for(old_total);

        let referrer = match worker.referrer_id {
            Some(referrer_id) => storage.worker(referrer_id).await?,
            None => None,
        };
        let mentor = storage
            .worker_mentor(&worker)
            .await?
            .filter(|mentor| mentor.service_name.to_lowercase() == service_name.to_lowercase());

        let split = split::compute_split(
            gross,
            worker_percent,
            tier.bonus_percent,
            referrer.as_ref().map(|_| referral_percent),
            mentor.as_ref().map(|mentor| mentor.percent),
        );

        let record = storage
            .create_profit(
                worker_id,
                gross.round_dp(2),
                split.worker_net.round_dp(2),
                service_name,
            )
            .await?;
        let profit_id = record.id;

        // From here on the ProfitRecord exists: a failure leaves an orphaned
        // record that an operator has to reconcile by hand.
        if let Some(referrer) = &referrer {
            if split.referral_cut > Decimal::ZERO {
                let amount = split.referral_cut.round_dp(2);
                storage
                    .create_referral_share(referrer.id, worker_id, profit_id, amount)
                    .await
                    .with_context(|| reconciliation_context(profit_id))?;
                storage
                    .add_referral_earnings(referrer, amount)
                    .await
                    .with_context(|| reconciliation_context(profit_id))?;
            }
        }

        if let Some(mentor) = &mentor {
            if split.mentor_cut > Decimal::ZERO {
                let amount = split.mentor_cut.round_dp(2);
                storage
                    .create_mentor_share(mentor, worker_id, profit_id, amount)
                    .await
                    .with_context(|| reconciliation_context(profit_id))?;
                storage
                    .add_mentor_earnings(mentor, amount)
                    .await
                    .with_context(|| reconciliation_context(profit_id))?;
            }
        }

        let new_total = old_total + split.worker_net.round_dp(2);
        storage
            .set_worker_total(worker_id, new_total)
            .await
            .with_context(|| reconciliation_context(profit_id))?;

        let rank_up = ranks::check_rank_up(old_total, new_total);
        if let Some(new_tier) = rank_up {
            // The ledger is already consistent: rank bookkeeping is
            // best-effort.
            if let Err(err) = storage
                .log_rank_change(
                    worker_id,
                    tier.name,
                    new_tier.name,
                    tier.level,
                    new_tier.level,
                    new_total,
                )
                .await
            {
                tracing::error!("Rank change log failed: {:?}", err);
            }

            if let Err(err) = storage
                .create_notification(
                    worker_id,
                    "rank_up",
                    &format!("{} {}!", new_tier.emoji, new_tier.name),
                    &ranks::reward_message(new_tier),
                )
                .await
            {
                tracing::error!("Rank up notification write failed: {:?}", err);
            }
        }

        Ok(ProfitOutcome {
            profit_id,
            split,
            tier,
            referrer,
            mentor,
            rank_up,
            new_total,
        })
    }
}

impl Default for Distributor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn worker_json(id: i64, total: i64, referrer_id: Option<i64>, mentor_id: Option<i32>) -> serde_json::Value {
        json!({
            "id": id,
            "username": format!("user{id}"),
            "full_name": format!("User {id}"),
            "status": "active",
            "total_profit": total,
            "referral_earnings": 0,
            "referrer_id": referrer_id,
            "mentor_id": mentor_id,
            "wallet_address": null,
            "experience_text": null,
            "source_text": null,
            "created_at": "2024-01-01T00:00:00Z",
        })
    }

    fn profit_json(id: i32, worker_id: i64, amount: f64, net: f64) -> serde_json::Value {
        json!({
            "id": id,
            "worker_id": worker_id,
            "amount": amount,
            "net_profit": net,
            "service_name": "CPA",
            "status": "hold",
            "created_at": "2024-01-01T00:00:00Z",
            "paid_at": null,
        })
    }

    fn mentor_json(id: i32, user_id: i64, service: &str, percent: u32) -> serde_json::Value {
        json!({
            "id": id,
            "user_id": user_id,
            "username": "mentor",
            "service_name": service,
            "percent": percent,
            "total_earned": 0,
            "students_count": 1,
            "is_active": true,
        })
    }

    async fn mock_worker(server: &MockServer, worker: serde_json::Value) {
        let id = worker["id"].as_i64().unwrap();
        Mock::given(method("GET"))
            .and(path("/rest/v1/users"))
            .and(query_param("id", format!("eq.{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([worker])))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn full_pipeline_with_referrer_and_matching_mentor() {
        let server = MockServer::start().await;

        mock_worker(&server, worker_json(1, 100_000, Some(2), Some(3))).await;
        mock_worker(&server, worker_json(2, 0, None, None)).await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/mentor_details"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([mentor_json(3, 99, "cpa", 30)])),
            )
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/profits"))
            .and(body_partial_json(json!({"net_profit": 882.0})))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!([profit_json(555, 1, 2000.0, 882.0)])),
            )
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/referral_profits"))
            .and(body_partial_json(json!({"amount": 100.0, "profit_id": 555})))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        Mock::given(method("PATCH"))
            .and(path("/rest/v1/users"))
            .and(query_param("id", "eq.2"))
            .and(body_partial_json(json!({"referral_earnings": 100.0})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{}])))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/mentor_profits"))
            .and(body_partial_json(json!({"amount": 378.0, "percent": 30})))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        Mock::given(method("PATCH"))
            .and(path("/rest/v1/mentors"))
            .and(query_param("id", "eq.3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{}])))
            .mount(&server)
            .await;

        Mock::given(method("PATCH"))
            .and(path("/rest/v1/users"))
            .and(query_param("id", "eq.1"))
            .and(body_partial_json(json!({"total_profit": 100_882.0})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{}])))
            .mount(&server)
            .await;

        let storage = Storage::with_endpoint(&server.uri(), "test-key");
        let distributor = Distributor::new();

        let outcome = distributor
            .record_profit(&storage, 1, Decimal::from(2000), 60, "CPA", 5)
            .await
            .unwrap();

        assert_eq!(outcome.profit_id, 555);
        assert_eq!(outcome.split.base, Decimal::from(1200));
        assert_eq!(outcome.split.bonus, Decimal::from(60));
        assert_eq!(outcome.split.with_bonus, Decimal::from(1260));
        assert_eq!(outcome.split.mentor_cut, Decimal::from(378));
        assert_eq!(outcome.split.worker_net, Decimal::from(882));
        assert_eq!(outcome.split.referral_cut, Decimal::from(100));
        assert_eq!(outcome.new_total, Decimal::from(100_882));
        assert!(outcome.rank_up.is_none());
    }

    #[tokio::test]
    async fn mentor_with_other_service_gets_nothing() {
        let server = MockServer::start().await;

        mock_worker(&server, worker_json(1, 0, None, Some(3))).await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/mentor_details"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([mentor_json(3, 99, "Crypto", 30)])),
            )
            .mount(&server)
            .await;

        // No mentor_profits mock mounted: a write there would 404 the test.
        Mock::given(method("POST"))
            .and(path("/rest/v1/profits"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!([profit_json(7, 1, 1000.0, 500.0)])),
            )
            .mount(&server)
            .await;

        Mock::given(method("PATCH"))
            .and(path("/rest/v1/users"))
            .and(query_param("id", "eq.1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{}])))
            .mount(&server)
            .await;

        let storage = Storage::with_endpoint(&server.uri(), "test-key");
        let outcome = Distributor::new()
            .record_profit(&storage, 1, Decimal::from(1000), 50, "CPA", 5)
            .await
            .unwrap();

        assert_eq!(outcome.split.mentor_cut, Decimal::ZERO);
        assert_eq!(outcome.split.worker_net, Decimal::from(500));
        assert!(outcome.mentor.is_none());
    }

    #[tokio::test]
    async fn boundary_crossing_logs_rank_change() {
        let server = MockServer::start().await;

        mock_worker(&server, worker_json(1, 49_500, None, None)).await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/profits"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!([profit_json(8, 1, 1000.0, 500.0)])),
            )
            .mount(&server)
            .await;

        Mock::given(method("PATCH"))
            .and(path("/rest/v1/users"))
            .and(query_param("id", "eq.1"))
            .and(body_partial_json(json!({"total_profit": 50_000.0})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{}])))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/rank_history"))
            .and(body_partial_json(
                json!({"old_rank": "Новичок", "new_rank": "Воркер", "new_level": 2}),
            ))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/notifications"))
            .and(body_partial_json(json!({"notification_type": "rank_up"})))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let storage = Storage::with_endpoint(&server.uri(), "test-key");
        let outcome = Distributor::new()
            .record_profit(&storage, 1, Decimal::from(1000), 50, "CPA", 5)
            .await
            .unwrap();

        let tier = outcome.rank_up.expect("crossing 50k must rank up");
        assert_eq!(tier.level, 2);
        assert_eq!(outcome.new_total, Decimal::from(50_000));
    }

    #[tokio::test]
    async fn failed_profit_insert_aborts_before_sub_ledger() {
        let server = MockServer::start().await;

        mock_worker(&server, worker_json(1, 0, Some(2), None)).await;
        mock_worker(&server, worker_json(2, 0, None, None)).await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/profits"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let storage = Storage::with_endpoint(&server.uri(), "test-key");
        let result = Distributor::new()
            .record_profit(&storage, 1, Decimal::from(1000), 50, "CPA", 5)
            .await;

        // No referral_profits/users PATCH mocks mounted: reaching them
        // would be a bug, and the error must not mention reconciliation.
        let err = format!("{:#}", result.unwrap_err());
        assert!(!err.contains("manual reconciliation"));
    }

    #[tokio::test]
    async fn orphaned_profit_is_surfaced_for_reconciliation() {
        let server = MockServer::start().await;

        mock_worker(&server, worker_json(1, 0, Some(2), None)).await;
        mock_worker(&server, worker_json(2, 0, None, None)).await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/profits"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!([profit_json(42, 1, 1000.0, 500.0)])),
            )
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/referral_profits"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let storage = Storage::with_endpoint(&server.uri(), "test-key");
        let result = Distributor::new()
            .record_profit(&storage, 1, Decimal::from(1000), 50, "CPA", 5)
            .await;

        let err = format!("{:#}", result.unwrap_err());
        assert!(err.contains("profit #42"));
        assert!(err.contains("manual reconciliation"));
    }
}
