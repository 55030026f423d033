use std::{fmt::Display, str::FromStr};

#[derive(Clone)]
pub enum BroadcastCallbackData {
    Text,
    Photo,
    Confirm,
    Cancel,
    Stop,
}

impl Display for BroadcastCallbackData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            BroadcastCallbackData::Text => "bc_text",
            BroadcastCallbackData::Photo => "bc_photo",
            BroadcastCallbackData::Confirm => "bc_confirm",
            BroadcastCallbackData::Cancel => "bc_cancel",
            BroadcastCallbackData::Stop => "bc_stop",
        };

        write!(f, "{value}")
    }
}

impl FromStr for BroadcastCallbackData {
    type Err = strum::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bc_text" => Ok(BroadcastCallbackData::Text),
            "bc_photo" => Ok(BroadcastCallbackData::Photo),
            "bc_confirm" => Ok(BroadcastCallbackData::Confirm),
            "bc_cancel" => Ok(BroadcastCallbackData::Cancel),
            "bc_stop" => Ok(BroadcastCallbackData::Stop),
            _ => Err(strum::ParseError::VariantNotFound),
        }
    }
}
