use std::{fmt::Display, str::FromStr};

#[derive(Clone)]
pub enum AdminMenuCallbackData {
    Menu,
    Profit,
    Payouts,
    Broadcast,
    Applications,
    Mentors,
    Services,
    Welcome,
}

impl Display for AdminMenuCallbackData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            AdminMenuCallbackData::Menu => "admin_menu",
            AdminMenuCallbackData::Profit => "admin_profit",
            AdminMenuCallbackData::Payouts => "admin_payouts",
            AdminMenuCallbackData::Broadcast => "admin_broadcast",
            AdminMenuCallbackData::Applications => "admin_apps",
            AdminMenuCallbackData::Mentors => "admin_mentors",
            AdminMenuCallbackData::Services => "admin_services",
            AdminMenuCallbackData::Welcome => "admin_welcome",
        };

        write!(f, "{value}")
    }
}

impl FromStr for AdminMenuCallbackData {
    type Err = strum::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin_menu" => Ok(AdminMenuCallbackData::Menu),
            "admin_profit" => Ok(AdminMenuCallbackData::Profit),
            "admin_payouts" => Ok(AdminMenuCallbackData::Payouts),
            "admin_broadcast" => Ok(AdminMenuCallbackData::Broadcast),
            "admin_apps" => Ok(AdminMenuCallbackData::Applications),
            "admin_mentors" => Ok(AdminMenuCallbackData::Mentors),
            "admin_services" => Ok(AdminMenuCallbackData::Services),
            "admin_welcome" => Ok(AdminMenuCallbackData::Welcome),
            _ => Err(strum::ParseError::VariantNotFound),
        }
    }
}
