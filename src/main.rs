mod api;
mod commands;
mod gateway;

use anyhow::{bail, Context as _};
use clap::{Parser, Subcommand};
use commands::{
    AdminPlugin, CommandRegistry, HelpPlugin, ImaginePlugin, ReportPlugin, UpPlugin,
};
use gateway::{AdminNotifier, Gateway};
use kora_channels::{console::ConsoleChannel, messenger::MessengerChannel};
use kora_core::{
    config::{self, install_bundled_prompts, shellexpand, Config, Prompts},
    message::IncomingMessage,
    traits::{Channel, Notifier, Provider},
};
use kora_memory::Store;
use kora_providers::gemini::GeminiProvider;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(
    name = "kora",
    version,
    about = "KORA AI: chatbot gateway for messaging platforms"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the webhook server and serve Messenger users.
    Start,
    /// Check configuration, backend availability and memory.
    Status,
    /// Run one message through the full pipeline, printing replies.
    Ask {
        /// The message to send.
        #[arg(trailing_var_arg = true)]
        message: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli.config)?;
    let _log_guard = init_tracing(&cfg);

    match cli.command {
        Commands::Start => {
            let messenger = cfg
                .channel
                .messenger
                .clone()
                .filter(|m| m.enabled)
                .context(
                    "Messenger is not enabled. Set [channel.messenger] enabled = true \
                     or provide PAGE_ACCESS_TOKEN.",
                )?;
            if messenger.page_access_token.is_empty() {
                bail!(
                    "Messenger is enabled but page_access_token is empty. \
                     Set it in config.toml or the PAGE_ACCESS_TOKEN env var."
                );
            }
            if messenger.verify_token.is_empty() {
                tracing::warn!("verify_token is empty; webhook subscription will be refused");
            }

            let channel: Arc<dyn Channel> = Arc::new(MessengerChannel::new(messenger)?);
            let gw = build_gateway(&cfg, channel).await?;

            let api_handle = if cfg.api.enabled {
                Some(tokio::spawn(api::serve(cfg.api.clone(), gw.clone())))
            } else {
                None
            };

            println!("{} — starting gateway...", cfg.kora.name);
            let result = gw.run().await;
            if let Some(handle) = api_handle {
                handle.abort();
            }
            result?;
        }
        Commands::Status => {
            println!("{} — Status Check\n", cfg.kora.name);
            println!("Config: {}", cli.config);
            println!("Command prefix: {:?}", cfg.chat.command_prefix);
            println!(
                "Admin: {}",
                if cfg.chat.admin_id.is_empty() {
                    "not configured"
                } else {
                    "configured"
                }
            );
            println!();

            println!(
                "  api: {}",
                if cfg.api.enabled {
                    format!("enabled on {}:{}", cfg.api.host, cfg.api.port)
                } else {
                    "disabled".to_string()
                }
            );

            match &cfg.channel.messenger {
                Some(m) => println!(
                    "  messenger: {}",
                    if m.enabled && !m.page_access_token.is_empty() {
                        "configured"
                    } else if m.enabled {
                        "enabled but missing page_access_token"
                    } else {
                        "disabled"
                    }
                ),
                None => println!("  messenger: not configured"),
            }

            let gemini = cfg.provider.gemini.clone().unwrap_or_default();
            let available = GeminiProvider::from_config(&gemini)?.is_available().await;
            println!(
                "  gemini ({}): {}",
                gemini.model,
                if available { "available" } else { "unavailable" }
            );

            let store = Store::new(&cfg.memory).await?;
            println!(
                "  memory: {} users, {} bytes ({})",
                store.user_count().await?,
                store.db_size().await?,
                shellexpand(&cfg.memory.db_path)
            );
        }
        Commands::Ask { message } => {
            if message.is_empty() {
                bail!("no message provided. Usage: kora ask <message>");
            }

            let text = message.join(" ");
            let channel: Arc<dyn Channel> = Arc::new(ConsoleChannel::new());
            let gw = build_gateway(&cfg, channel).await?;
            gw.handle_message(IncomingMessage::text("console", "console", &text))
                .await;
        }
    }

    Ok(())
}

/// Stdout logging plus a daily-rolling file under `{data_dir}/logs`.
///
/// `RUST_LOG` wins over `kora.log_level`. The returned guard flushes the
/// file writer on drop.
fn init_tracing(cfg: &Config) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.kora.log_level));

    let log_dir = std::path::Path::new(&shellexpand(&cfg.kora.data_dir)).join("logs");
    let (file_layer, guard) = match std::fs::create_dir_all(&log_dir) {
        Ok(()) => {
            let appender = tracing_appender::rolling::daily(&log_dir, "kora.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        Err(e) => {
            eprintln!("file logging disabled, cannot create {}: {e}", log_dir.display());
            (None, None)
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    guard
}

/// Wire backend, memory, plugins and notifier around a channel.
async fn build_gateway(cfg: &Config, channel: Arc<dyn Channel>) -> anyhow::Result<Arc<Gateway>> {
    if cfg.provider.default != "gemini" {
        bail!("unsupported provider: {}", cfg.provider.default);
    }
    let gemini = cfg.provider.gemini.clone().unwrap_or_default();
    if gemini.api_key.is_empty() {
        bail!(
            "Gemini API key is missing. Set [provider.gemini] api_key \
             or the GEMINI_API_KEY env var."
        );
    }
    let provider: Arc<dyn Provider> = Arc::new(GeminiProvider::from_config(&gemini)?);

    install_bundled_prompts(&cfg.kora.data_dir);
    let prompts = Prompts::load(&cfg.kora.data_dir);

    let store = Store::new(&cfg.memory).await?;
    let notifier: Arc<dyn Notifier> = Arc::new(AdminNotifier::new(
        channel.clone(),
        &cfg.chat.admin_id,
        cfg.chat.max_message_len,
    ));
    let registry = build_registry(cfg, store.clone(), notifier.clone())?;

    Ok(Arc::new(Gateway::new(
        cfg,
        prompts,
        channel,
        provider,
        store,
        Arc::new(registry),
        notifier,
    )))
}

/// Register the built-in plugins. `help` goes last so it lists everything.
fn build_registry(
    cfg: &Config,
    store: Store,
    notifier: Arc<dyn Notifier>,
) -> anyhow::Result<CommandRegistry> {
    let prefix = cfg.chat.command_prefix.as_str();
    let mut registry = CommandRegistry::new(
        prefix,
        Duration::from_secs(cfg.plugins.dispatch_timeout_secs),
    );

    registry.register(UpPlugin::new(&cfg.kora.name, Instant::now(), Some(store)));
    registry.register(AdminPlugin::new(&cfg.chat.admin_id, prefix));
    registry.register(ReportPlugin::new(notifier));
    registry.register(ImaginePlugin::new(
        &cfg.plugins.image_api_url,
        Duration::from_secs(cfg.plugins.timeout_secs),
        prefix,
    )?);

    let help = HelpPlugin::new(&cfg.kora.name, prefix, registry.descriptions());
    registry.register(help);

    Ok(registry)
}
