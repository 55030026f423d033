use std::{fmt::Display, str::FromStr};

use regex::Regex;

#[derive(Clone)]
pub enum ServiceAdminCallbackData {
    Add,
    Delete { service_id: i32 },
}

impl Display for ServiceAdminCallbackData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceAdminCallbackData::Add => write!(f, "sa_add"),
            ServiceAdminCallbackData::Delete { service_id } => write!(f, "sa_del_{service_id}"),
        }
    }
}

impl FromStr for ServiceAdminCallbackData {
    type Err = strum::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "sa_add" {
            return Ok(ServiceAdminCallbackData::Add);
        }

        let re = Regex::new(r"^sa_del_(?P<id>\d+)$").unwrap();
        let caps = match re.captures(s) {
            Some(caps) => caps,
            None => return Err(strum::ParseError::VariantNotFound),
        };

        Ok(ServiceAdminCallbackData::Delete {
            service_id: caps["id"]
                .parse()
                .map_err(|_| strum::ParseError::VariantNotFound)?,
        })
    }
}
