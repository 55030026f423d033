pub mod modules;
pub mod services;
pub mod states;
pub mod tools;

use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::routing::get;
use axum_prometheus::PrometheusMetricLayer;
use teloxide::adaptors::throttle::Limits;
use teloxide::adaptors::{CacheMe, Throttle};
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::update_listeners::webhooks;
use teloxide::prelude::*;
use teloxide::types::BotCommand;
use tokio::time::{sleep, Duration};
use tower_http::trace::{self, TraceLayer};
use tracing::Level;
use url::Url;

use crate::config;

use self::services::distribution::Distributor;
use self::services::mentor_queue;
use self::services::storage::Storage;
use self::states::WizardState;

pub type TeamBot = CacheMe<Throttle<Bot>>;

pub type BotHandlerInternal = Result<(), Box<dyn Error + Send + Sync>>;

pub type BotHandler = teloxide::dispatching::UpdateHandler<Box<dyn Error + Send + Sync>>;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<Storage>,
    pub distributor: Arc<Distributor>,
    pub broadcast_cancel: Arc<AtomicBool>,
}

fn ignore_channel_messages() -> BotHandler {
    Update::filter_channel_post().endpoint(|| async { Ok(()) })
}

pub fn handler_tree() -> BotHandler {
    dptree::entry()
        .branch(ignore_channel_messages())
        .enter_dialogue::<Update, InMemStorage<WizardState>, WizardState>()
        .branch(modules::admin::get_admin_handler())
        .branch(modules::registration::get_registration_handler())
        .branch(modules::profile::get_profile_handler())
        .branch(modules::team::get_team_handler())
        .branch(modules::catalog::get_catalog_handler())
        .branch(modules::mentor_panel::get_mentor_panel_handler())
        .branch(modules::help::get_help_handler())
}

fn bot_commands() -> Vec<BotCommand> {
    vec![
        BotCommand {
            command: String::from("start"),
            description: String::from("Главное меню"),
        },
        BotCommand {
            command: String::from("me"),
            description: String::from("Профиль"),
        },
        BotCommand {
            command: String::from("top"),
            description: String::from("Топ воркеров"),
        },
        BotCommand {
            command: String::from("services"),
            description: String::from("Сервисы"),
        },
        BotCommand {
            command: String::from("mentor"),
            description: String::from("Кабинет наставника"),
        },
        BotCommand {
            command: String::from("help"),
            description: String::from("Команды"),
        },
    ]
}

pub async fn start(running: Arc<AtomicBool>) {
    let bot: TeamBot = Bot::new(config::CONFIG.bot_token.clone())
        .throttle(Limits::default())
        .cache_me();

    let storage = Arc::new(Storage::new());
    storage
        .ping()
        .await
        .expect("Database connection failed");
    tracing::info!("Database connected");

    if let Err(err) = storage.init_defaults().await {
        tracing::error!("Defaults init failed: {:?}", err);
    }
    {
        let storage = storage.clone();
        tokio::spawn(async move { storage.warm_cache().await });
    }

    let app_state = AppState {
        storage: storage.clone(),
        distributor: Arc::new(Distributor::new()),
        broadcast_cancel: Arc::new(AtomicBool::new(false)),
    };

    let addr = ([0, 0, 0, 0], config::CONFIG.webhook_port).into();
    let host = format!(
        "{}:{}",
        &config::CONFIG.webhook_base_url, config::CONFIG.webhook_port
    );
    let token = bot.inner().inner().token();
    let url = Url::parse(&format!("{host}/{token}"))
        .unwrap_or_else(|_| panic!("Can't parse webhook url!"));

    let (listener, stop_flag, webhook_router) =
        webhooks::axum_to_router(bot.clone(), webhooks::Options::new(addr, url))
            .await
            .expect("Can't setup webhook");

    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

    let router = axum::Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/metrics", get(|| async move { metric_handle.render() }))
        .merge(webhook_router)
        .layer(prometheus_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        );

    tokio::spawn(async move {
        let tcp_listener = tokio::net::TcpListener::bind(addr)
            .await
            .expect("Can't bind webhook port");

        axum::serve(tcp_listener, router)
            .with_graceful_shutdown(stop_flag)
            .await
            .expect("Axum server error");
    });

    match bot.set_my_commands(bot_commands()).send().await {
        Ok(_) => (),
        Err(err) => tracing::error!("{:?}", err),
    }

    tokio::spawn(mentor_queue::run_drainer(
        bot.clone(),
        storage.clone(),
        running.clone(),
    ));

    let mut dispatcher = Dispatcher::builder(bot, handler_tree())
        .dependencies(dptree::deps![
            app_state,
            InMemStorage::<WizardState>::new()
        ])
        .build();

    let shutdown_token = dispatcher.shutdown_token();
    tokio::spawn(async move {
        loop {
            if !running.load(Ordering::SeqCst) {
                if let Ok(shutdown) = shutdown_token.clone().shutdown() {
                    shutdown.await;
                    return;
                }
            }

            sleep(Duration::from_secs(1)).await;
        }
    });

    dispatcher
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;
}
