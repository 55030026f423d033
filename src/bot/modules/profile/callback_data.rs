use std::{fmt::Display, str::FromStr};

#[derive(Clone)]
pub enum ProfileCallbackData {
    Wallet,
    Referrals,
    History,
}

impl Display for ProfileCallbackData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileCallbackData::Wallet => write!(f, "profile_wallet"),
            ProfileCallbackData::Referrals => write!(f, "profile_refs"),
            ProfileCallbackData::History => write!(f, "profile_history"),
        }
    }
}

impl FromStr for ProfileCallbackData {
    type Err = strum::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "profile_wallet" => Ok(ProfileCallbackData::Wallet),
            "profile_refs" => Ok(ProfileCallbackData::Referrals),
            "profile_history" => Ok(ProfileCallbackData::History),
            _ => Err(strum::ParseError::VariantNotFound),
        }
    }
}
