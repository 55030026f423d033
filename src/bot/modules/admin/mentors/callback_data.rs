use std::{fmt::Display, str::FromStr};

use regex::Regex;

#[derive(Clone)]
pub enum MentorAdminCallbackData {
    Menu,
    Add,
    Assign,
    Unassign,
    Remove { mentor_id: i32 },
    PickService { service_id: i32 },
    PickMentor { mentor_id: i32 },
}

impl Display for MentorAdminCallbackData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MentorAdminCallbackData::Menu => write!(f, "ma_menu"),
            MentorAdminCallbackData::Add => write!(f, "ma_add"),
            MentorAdminCallbackData::Assign => write!(f, "ma_assign"),
            MentorAdminCallbackData::Unassign => write!(f, "ma_unassign"),
            MentorAdminCallbackData::Remove { mentor_id } => write!(f, "ma_remove_{mentor_id}"),
            MentorAdminCallbackData::PickService { service_id } => {
                write!(f, "ma_service_{service_id}")
            }
            MentorAdminCallbackData::PickMentor { mentor_id } => write!(f, "ma_pick_{mentor_id}"),
        }
    }
}

impl FromStr for MentorAdminCallbackData {
    type Err = strum::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ma_menu" => return Ok(MentorAdminCallbackData::Menu),
            "ma_add" => return Ok(MentorAdminCallbackData::Add),
            "ma_assign" => return Ok(MentorAdminCallbackData::Assign),
            "ma_unassign" => return Ok(MentorAdminCallbackData::Unassign),
            _ => (),
        }

        let re = Regex::new(r"^ma_(?P<action>remove|service|pick)_(?P<id>\d+)$").unwrap();
        let caps = match re.captures(s) {
            Some(caps) => caps,
            None => return Err(strum::ParseError::VariantNotFound),
        };

        let id: i32 = caps["id"]
            .parse()
            .map_err(|_| strum::ParseError::VariantNotFound)?;

        match &caps["action"] {
            "remove" => Ok(MentorAdminCallbackData::Remove { mentor_id: id }),
            "service" => Ok(MentorAdminCallbackData::PickService { service_id: id }),
            "pick" => Ok(MentorAdminCallbackData::PickMentor { mentor_id: id }),
            _ => Err(strum::ParseError::VariantNotFound),
        }
    }
}
