use std::{fmt::Display, str::FromStr};

use regex::Regex;

use crate::bot::states::ProfitStage;

#[derive(Clone)]
pub enum ProfitCallbackData {
    Service { service_id: i32 },
    Stage { stage: ProfitStage },
    Confirm,
    Cancel,
}

impl Display for ProfitCallbackData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfitCallbackData::Service { service_id } => write!(f, "prf_service_{service_id}"),
            ProfitCallbackData::Stage {
                stage: ProfitStage::Deposit,
            } => write!(f, "prf_stage_deposit"),
            ProfitCallbackData::Stage {
                stage: ProfitStage::Tax,
            } => write!(f, "prf_stage_tax"),
            ProfitCallbackData::Confirm => write!(f, "prf_confirm"),
            ProfitCallbackData::Cancel => write!(f, "prf_cancel"),
        }
    }
}

impl FromStr for ProfitCallbackData {
    type Err = strum::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prf_confirm" => return Ok(ProfitCallbackData::Confirm),
            "prf_cancel" => return Ok(ProfitCallbackData::Cancel),
            "prf_stage_deposit" => {
                return Ok(ProfitCallbackData::Stage {
                    stage: ProfitStage::Deposit,
                })
            }
            "prf_stage_tax" => {
                return Ok(ProfitCallbackData::Stage {
                    stage: ProfitStage::Tax,
                })
            }
            _ => (),
        }

        let re = Regex::new(r"^prf_service_(?P<id>\d+)$").unwrap();
        let caps = match re.captures(s) {
            Some(caps) => caps,
            None => return Err(strum::ParseError::VariantNotFound),
        };

        let service_id = caps["id"]
            .parse()
            .map_err(|_| strum::ParseError::VariantNotFound)?;

        Ok(ProfitCallbackData::Service { service_id })
    }
}
