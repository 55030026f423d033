use std::{fmt::Display, str::FromStr};

#[derive(Clone)]
pub enum RegistrationCallbackData {
    Accept,
    Decline,
}

impl Display for RegistrationCallbackData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrationCallbackData::Accept => write!(f, "reg_accept"),
            RegistrationCallbackData::Decline => write!(f, "reg_decline"),
        }
    }
}

impl FromStr for RegistrationCallbackData {
    type Err = strum::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reg_accept" => Ok(RegistrationCallbackData::Accept),
            "reg_decline" => Ok(RegistrationCallbackData::Decline),
            _ => Err(strum::ParseError::VariantNotFound),
        }
    }
}
