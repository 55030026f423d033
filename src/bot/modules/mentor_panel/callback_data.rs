use std::{fmt::Display, str::FromStr};

#[derive(Clone)]
pub enum MentorPanelCallbackData {
    Message,
    Confirm,
    Cancel,
}

impl Display for MentorPanelCallbackData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MentorPanelCallbackData::Message => write!(f, "mp_message"),
            MentorPanelCallbackData::Confirm => write!(f, "mp_confirm"),
            MentorPanelCallbackData::Cancel => write!(f, "mp_cancel"),
        }
    }
}

impl FromStr for MentorPanelCallbackData {
    type Err = strum::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mp_message" => Ok(MentorPanelCallbackData::Message),
            "mp_confirm" => Ok(MentorPanelCallbackData::Confirm),
            "mp_cancel" => Ok(MentorPanelCallbackData::Cancel),
            _ => Err(strum::ParseError::VariantNotFound),
        }
    }
}
