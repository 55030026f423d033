use strum_macros::{Display, EnumString};

use super::super::storage::Storage;

/// The three hold/paid ledgers settled independently per beneficiary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum PayoutLedger {
    Worker,
    Referral,
    Mentor,
}

impl PayoutLedger {
    pub fn table(self) -> &'static str {
        match self {
            PayoutLedger::Worker => "profits",
            PayoutLedger::Referral => "referral_profits",
            PayoutLedger::Mentor => "mentor_profits",
        }
    }

    pub fn beneficiary_column(self) -> &'static str {
        match self {
            PayoutLedger::Worker => "worker_id",
            PayoutLedger::Referral => "referrer_id",
            PayoutLedger::Mentor => "mentor_user_id",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            PayoutLedger::Worker => "Воркеры",
            PayoutLedger::Referral => "Рефералы",
            PayoutLedger::Mentor => "Наставники",
        }
    }
}

/// Bulk hold→paid for the beneficiary's whole current hold set. Pure status
/// transition: amounts are not recomputed, and a repeated call settles 0.
pub async fn settle_payouts(
    storage: &Storage,
    beneficiary_id: i64,
    ledger: PayoutLedger,
) -> anyhow::Result<u64> {
    let settled = storage
        .mark_shares_paid(ledger.table(), ledger.beneficiary_column(), beneficiary_id)
        .await?;

    if ledger == PayoutLedger::Worker {
        storage.cache.invalidate_worker(beneficiary_id).await;
    }

    Ok(settled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn settles_all_holds_then_zero() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/rest/v1/profits"))
            .and(query_param("worker_id", "eq.7"))
            .and(query_param("status", "eq.hold"))
            .and(body_partial_json(json!({"status": "paid"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{}, {}, {}])))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("PATCH"))
            .and(path("/rest/v1/profits"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let storage = Storage::with_endpoint(&server.uri(), "test-key");

        let first = settle_payouts(&storage, 7, PayoutLedger::Worker).await.unwrap();
        let second = settle_payouts(&storage, 7, PayoutLedger::Worker).await.unwrap();

        assert_eq!(first, 3);
        assert_eq!(second, 0);
    }

    #[tokio::test]
    async fn mentor_ledger_filters_by_mentor_user_id() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/rest/v1/mentor_profits"))
            .and(query_param("mentor_user_id", "eq.99"))
            .and(query_param("status", "eq.hold"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{}])))
            .mount(&server)
            .await;

        let storage = Storage::with_endpoint(&server.uri(), "test-key");
        let settled = settle_payouts(&storage, 99, PayoutLedger::Mentor).await.unwrap();

        assert_eq!(settled, 1);
    }
}
