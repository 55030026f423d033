use once_cell::sync::Lazy;
use smallvec::SmallVec;
use teloxide::types::{ChatId, UserId};

pub struct Config {
    pub bot_token: String,

    pub webhook_base_url: String,
    pub webhook_port: u16,

    pub supabase_url: String,
    pub supabase_key: String,

    pub admin_ids: SmallVec<[u64; 4]>,

    pub profits_channel_id: ChatId,
    pub applications_channel_id: ChatId,
    pub chat_group_url: String,

    pub referral_percent: u32,

    pub broadcast_delay_ms: u64,
    pub broadcast_batch_size: u32,

    pub sentry_dsn: Option<String>,
}

fn get_env(env: &'static str) -> String {
    std::env::var(env).unwrap_or_else(|_| panic!("Cannot get the {env} env variable"))
}

fn parse_env<T: std::str::FromStr>(env: &'static str) -> T {
    get_env(env)
        .parse()
        .unwrap_or_else(|_| panic!("Cannot parse the {env} env variable"))
}

impl Config {
    pub fn load() -> Config {
        Config {
            bot_token: get_env("BOT_TOKEN"),

            webhook_base_url: get_env("WEBHOOK_BASE_URL"),
            webhook_port: parse_env("WEBHOOK_PORT"),

            supabase_url: get_env("SUPABASE_URL"),
            supabase_key: get_env("SUPABASE_KEY"),

            admin_ids: get_env("ADMIN_IDS")
                .split(',')
                .map(|v| {
                    v.trim()
                        .parse()
                        .unwrap_or_else(|_| panic!("Cannot parse the ADMIN_IDS env variable"))
                })
                .collect(),

            profits_channel_id: ChatId(parse_env("PROFITS_CHANNEL_ID")),
            applications_channel_id: ChatId(parse_env("APPLICATIONS_CHANNEL_ID")),
            chat_group_url: get_env("CHAT_GROUP_URL"),

            referral_percent: std::env::var("REFERRAL_PERCENT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),

            broadcast_delay_ms: std::env::var("BROADCAST_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(50),
            broadcast_batch_size: std::env::var("BROADCAST_BATCH_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(20),

            sentry_dsn: std::env::var("SENTRY_DSN").ok(),
        }
    }

    pub fn is_admin(&self, user_id: UserId) -> bool {
        self.admin_ids.contains(&user_id.0)
    }
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::load);
