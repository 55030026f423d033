use std::{fmt::Display, str::FromStr};

use regex::Regex;

use crate::bot::services::distribution::settlement::PayoutLedger;

#[derive(Clone)]
pub enum PayoutCallbackData {
    Menu,
    Ledger { ledger: PayoutLedger },
    Settle { ledger: PayoutLedger, user_id: i64 },
}

impl Display for PayoutCallbackData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayoutCallbackData::Menu => write!(f, "pay_menu"),
            PayoutCallbackData::Ledger { ledger } => write!(f, "pay_l_{ledger}"),
            PayoutCallbackData::Settle { ledger, user_id } => {
                write!(f, "pay_s_{ledger}_{user_id}")
            }
        }
    }
}

impl FromStr for PayoutCallbackData {
    type Err = strum::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "pay_menu" {
            return Ok(PayoutCallbackData::Menu);
        }

        let re = Regex::new(
            r"^pay_(?P<kind>[ls])_(?P<ledger>worker|referral|mentor)(_(?P<user_id>\d+))?$",
        )
        .unwrap();
        let caps = match re.captures(s) {
            Some(caps) => caps,
            None => return Err(strum::ParseError::VariantNotFound),
        };

        let ledger: PayoutLedger = caps["ledger"]
            .parse()
            .map_err(|_| strum::ParseError::VariantNotFound)?;

        match (&caps["kind"], caps.name("user_id")) {
            ("l", None) => Ok(PayoutCallbackData::Ledger { ledger }),
            ("s", Some(user_id)) => Ok(PayoutCallbackData::Settle {
                ledger,
                user_id: user_id
                    .as_str()
                    .parse()
                    .map_err(|_| strum::ParseError::VariantNotFound)?,
            }),
            _ => Err(strum::ParseError::VariantNotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        for data in [
            PayoutCallbackData::Menu,
            PayoutCallbackData::Ledger {
                ledger: PayoutLedger::Referral,
            },
            PayoutCallbackData::Settle {
                ledger: PayoutLedger::Mentor,
                user_id: 123,
            },
        ] {
            let parsed = PayoutCallbackData::from_str(&data.to_string()).unwrap();
            assert_eq!(parsed.to_string(), data.to_string());
        }
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(PayoutCallbackData::from_str("pay_s_worker_").is_err());
        assert!(PayoutCallbackData::from_str("pay_l_unknown").is_err());
        assert!(PayoutCallbackData::from_str("pay_x_worker").is_err());
    }
}
