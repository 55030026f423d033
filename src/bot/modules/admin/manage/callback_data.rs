use std::{fmt::Display, str::FromStr};

use regex::Regex;

#[derive(Clone)]
pub enum ApplicationCallbackData {
    Approve { user_id: i64 },
    Decline { user_id: i64 },
}

impl Display for ApplicationCallbackData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApplicationCallbackData::Approve { user_id } => write!(f, "app_approve_{user_id}"),
            ApplicationCallbackData::Decline { user_id } => write!(f, "app_decline_{user_id}"),
        }
    }
}

impl FromStr for ApplicationCallbackData {
    type Err = strum::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let re = Regex::new(r"^app_(?P<action>(approve)|(decline))_(?P<user_id>\d+)$").unwrap();

        let caps = match re.captures(s) {
            Some(caps) => caps,
            None => return Err(strum::ParseError::VariantNotFound),
        };

        let user_id = caps["user_id"]
            .parse()
            .map_err(|_| strum::ParseError::VariantNotFound)?;

        match &caps["action"] {
            "approve" => Ok(ApplicationCallbackData::Approve { user_id }),
            "decline" => Ok(ApplicationCallbackData::Decline { user_id }),
            _ => Err(strum::ParseError::VariantNotFound),
        }
    }
}
