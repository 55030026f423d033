use teloxide::types::UpdateKind;
use teloxide::{dptree, prelude::*, types::CallbackQuery};

use crate::config;

pub fn filter_callback_query<T>() -> crate::bot::BotHandler
where
    T: std::str::FromStr + Send + Sync + 'static,
{
    dptree::entry().chain(dptree::filter_map(move |cq: CallbackQuery| {
        cq.data.and_then(|data| T::from_str(data.as_str()).ok())
    }))
}

pub fn filter_admin() -> crate::bot::BotHandler {
    dptree::filter(|update: Update| {
        let user = match &update.kind {
            UpdateKind::Message(message) | UpdateKind::EditedMessage(message) => {
                message.from.as_ref()
            }
            UpdateKind::CallbackQuery(cq) => Some(&cq.from),
            _ => None,
        };

        user.map(|user| config::CONFIG.is_admin(user.id))
            .unwrap_or(false)
    })
}
