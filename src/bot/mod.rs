//! Bot layer - Discord-specific interface and command handlers
//!
//! The bot process acts as one tab of the configured origin. Every command mounts a
//! fresh mutation view, the way navigating to the entry page would, while a single
//! display view lives for the whole process and follows the change feed in the
//! background. Gateway connection state drives the tab's visibility.

/// Discord command implementations (donation, tally, general)
pub mod commands;
/// Discord interaction handlers (autocomplete, button confirmation)
pub mod handlers;
/// Message and embed rendering for donations and the tally board
pub mod render;

use crate::{
    config::settings::Settings,
    core::{
        display::{DisplayView, SharedDisplay, spawn_sync_loop},
        mutation::MutationView,
        notify::Visibility,
        origin::{Origin, Tab},
        store::DonationStore,
    },
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};

/// Shared data available to all bot commands.
pub struct BotData {
    /// The tab this process writes through
    pub tab: Tab,
    /// Long-lived display view, kept current by the sync loop
    pub display: SharedDisplay<DonationStore>,
    /// Loaded settings
    pub settings: Arc<Settings>,
}

/// Poise context used by every command
pub type Context<'a> = poise::Context<'a, BotData, Error>;

impl BotData {
    /// Creates a new `BotData` for an open tab and its mounted display view.
    #[must_use]
    pub const fn new(
        tab: Tab,
        display: SharedDisplay<DonationStore>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            tab,
            display,
            settings,
        }
    }

    /// Store accessor for the configured key
    #[must_use]
    pub fn store(&self) -> DonationStore {
        self.tab.donation_store(&self.settings.storage_key)
    }

    /// Mounts a fresh mutation view over the current stored collection.
    pub async fn mount_mutation(&self) -> Result<MutationView<DonationStore>> {
        MutationView::mount(
            self.store(),
            self.tab.page().clone(),
            &self.settings.tally,
        )
        .await
    }
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {:?}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            let reply = if error.is_user_facing() {
                format!("❌ {error}")
            } else {
                error!("Error in command `{}`: {:?}", ctx.command().name, error);
                format!("An error occurred: {error}")
            };
            if let Err(e) = ctx.say(reply).await {
                error!("Failed to send error message: {}", e);
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

/// Maps gateway connection state onto the tab's visibility.
///
/// A dropped connection hides the tab; resuming or a fresh `Ready` shows it again, which
/// makes the display reload whatever it may have missed while disconnected.
async fn event_handler(
    _ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, BotData, Error>,
    data: &BotData,
) -> Result<()> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            info!("Gateway ready as {}", data_about_bot.user.name);
            data.tab.page().set_visibility(Visibility::Visible);
        }
        serenity::FullEvent::Resume { .. } => {
            info!("Gateway session resumed");
            data.tab.page().set_visibility(Visibility::Visible);
        }
        serenity::FullEvent::ShardStageUpdate { event } => {
            if !matches!(event.new, serenity::ConnectionStage::Connected) {
                warn!("Shard {:?} left the connected stage: {:?}", event.shard_id, event.new);
                data.tab.page().set_visibility(Visibility::Hidden);
            }
        }
        _ => {}
    }
    Ok(())
}

/// Runs the bot until the client stops.
///
/// Opens a tab on `origin`, mounts the display view and starts its sync loop before
/// connecting to Discord.
#[instrument(skip(token, settings, origin))]
pub async fn run_bot(token: String, settings: Arc<Settings>, origin: Origin) -> Result<()> {
    let tab = origin.open_tab();
    info!("Bot attached to origin {:?} as {}", origin.name(), tab.id());

    let display = DisplayView::mount(tab.donation_store(&settings.storage_key), &settings).await?;
    let display: SharedDisplay<DonationStore> = Arc::new(RwLock::new(display));
    let sync_loop = spawn_sync_loop(
        Arc::clone(&display),
        tab.change_feed(&settings.storage_key),
    );
    let data = BotData::new(tab, display, settings);

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::donate(),
                commands::donations(),
                commands::delete_donation(),
                commands::tally(),
                commands::ping(),
                commands::help(),
            ],
            on_error: |error| Box::pin(on_error(error)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged();

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::Client::builder(&token, intents)
        .framework(framework)
        .await?;

    info!("Starting bot client...");
    let outcome = client.start().await;
    sync_loop.abort();
    outcome?;
    Ok(())
}

pub use commands::*;
pub use handlers::*;
