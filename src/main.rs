mod args;
mod config;
mod engine;
mod history;
mod linkcheck;
mod openai;
mod prompts;

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{
    InlineQuery, InlineQueryResult, InlineQueryResultArticle, InputMessageContent,
    InputMessageContentText,
};
use teloxide::utils::command::{BotCommands, ParseError};
use tracing::{error, info, warn};
use tracing_subscriber::prelude::*;

use args::parse_fiction_args;
use config::Config;
use engine::FactEngine;
use history::FactHistory;
use linkcheck::HttpLinkChecker;
use openai::Client as OpenAiClient;

type Engine = FactEngine<OpenAiClient, HttpLinkChecker>;

struct BotState {
    config: Config,
    engine: Engine,
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
enum Command {
    #[command(description = "start the bot.")]
    Start,
    #[command(description = "show this help.")]
    Help,
    #[command(
        description = "get a fun fact, optionally about a topic: /fact bananas",
        parse_with = whole_tail
    )]
    Fact(String),
    #[command(
        description = "invent a fact: /fiction topic:bananas author:john silver",
        parse_with = whole_tail
    )]
    Fiction(String),
}

/// Keep everything after the command word as one argument; the default parser
/// would split multi-word topics on whitespace.
fn whole_tail(input: String) -> Result<(String,), ParseError> {
    Ok((input,))
}

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "factbot.json".to_string());
    let config = match Config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    // Setup logging
    let log_dir = config.data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).ok();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("factbot.log"))
        .expect("Failed to open log file");
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .init();

    info!("🤖 Starting factbot...");
    info!("Loaded config from {config_path} (mode: {:?})", config.mode);

    let bot = Bot::new(&config.telegram_bot_token);

    let history = match FactHistory::load(&config.history_path) {
        Ok(h) => h,
        Err(e) => {
            error!("Failed to load fact history: {e}");
            std::process::exit(1);
        }
    };
    if history.is_empty() {
        info!("Starting with an empty fact history");
    } else {
        info!("Loaded {} past facts from {}", history.len(), config.history_path.display());
    }

    let engine = FactEngine::new(
        OpenAiClient::new(config.openai_api_key.clone()),
        HttpLinkChecker::new(),
        config.mode,
        history,
    );
    let state = Arc::new(BotState { config, engine });

    spawn_broadcast_job(bot.clone(), state.clone());

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(Update::filter_inline_query().endpoint(handle_inline_query));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<BotState>,
) -> ResponseResult<()> {
    match cmd {
        Command::Start => {
            bot.send_message(
                msg.chat.id,
                "Hi! Send /fact for a fun fact or /fiction for an invented one. /help lists everything.",
            )
            .await?;
        }
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
        }
        Command::Fact(rest) => {
            // Topic is everything after the command word.
            let topic = rest.trim();
            let topic = (!topic.is_empty()).then_some(topic);
            send_fact(&bot, msg.chat.id, state.engine.fetch_fact(topic).await).await?;
        }
        Command::Fiction(rest) => {
            let parsed = parse_fiction_args(&rest);
            send_fact(&bot, msg.chat.id, state.engine.fetch_fiction(&parsed).await).await?;
        }
    }

    Ok(())
}

/// Deliver an acquisition result, degrading to a short apology on failure so
/// a broken provider never leaves the user with dead silence.
async fn send_fact(
    bot: &Bot,
    chat_id: ChatId,
    result: Result<String, engine::FactError>,
) -> ResponseResult<()> {
    match result {
        Ok(fact) => {
            bot.send_message(chat_id, fact).await?;
        }
        Err(e) => {
            error!("Fact acquisition failed: {e}");
            bot.send_message(chat_id, "Couldn't come up with a fact right now, try again later.")
                .await?;
        }
    }
    Ok(())
}

async fn handle_inline_query(bot: Bot, q: InlineQuery, state: Arc<BotState>) -> ResponseResult<()> {
    let fact = match state.engine.fetch_fact(None).await {
        Ok(f) => f,
        Err(e) => {
            warn!("Inline fact acquisition failed: {e}");
            return Ok(());
        }
    };

    let content = InputMessageContent::Text(InputMessageContentText::new(fact));
    let article = InlineQueryResultArticle::new("fact", "Fun Fact", content);

    bot.answer_inline_query(q.id, vec![InlineQueryResult::Article(article)])
        .cache_time(0)
        .await?;

    Ok(())
}

fn spawn_broadcast_job(bot: Bot, state: Arc<BotState>) {
    if state.config.broadcast_chats.is_empty() {
        info!("Broadcast disabled (no broadcast_chat_ids)");
        return;
    }

    tokio::spawn(async move {
        loop {
            let Some(next) = state.config.broadcast_schedule.upcoming(chrono::Utc).next() else {
                warn!("No future broadcast occurrence, stopping job");
                return;
            };
            let wait = (next - chrono::Utc::now()).to_std().unwrap_or_default();
            info!("Next broadcast at {next}");
            tokio::time::sleep(wait).await;

            // A failed tick must not cancel future ticks.
            if let Err(e) = broadcast_fact(&bot, &state).await {
                error!("Broadcast tick failed: {e}");
            }
        }
    });
}

async fn broadcast_fact(bot: &Bot, state: &BotState) -> Result<(), String> {
    let fact = state
        .engine
        .fetch_fact(None)
        .await
        .map_err(|e| e.to_string())?;

    for chat in &state.config.broadcast_chats {
        info!("📣 Broadcasting fact to {chat}");
        if let Err(e) = bot.send_message(*chat, fact.as_str()).await {
            warn!("Failed to broadcast to {chat}: {e}");
        }
    }

    Ok(())
}
