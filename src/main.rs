mod artifact;
mod bot;
mod classifier;
mod config;
mod downloader;
mod error;
mod helpers;
mod pipeline;
mod processor;
mod request;
#[cfg(test)]
mod testing;
mod worker;

use std::sync::Arc;

use bot::{TelegramBot, TeloxideBot, Transport};
use config::Config;
use downloader::handlers::{pinterest::PinterestLocator, spotdl::SpotdlCatalog, ytdlp::YtDlpExtractor};
use helpers::download::ReqwestFetcher;
use pipeline::{Collaborators, Pipeline, PipelineSettings};
use request::{FormatChoice, ReplyTarget, Request};
use teloxide::{prelude::*, utils::command::BotCommands};
use tracing::{info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter::Builder as TracingFilterBuilder, util::SubscriberInitExt};
use worker::WorkerPool;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::load_dotenv()?;

    init_log();

    let config = Config::from_env()?;
    info!(
        download_dir = ?config.download_dir,
        workers = config.workers,
        "Starting media bot..."
    );

    tokio::fs::create_dir_all(&config.download_dir).await?;

    let bot = TelegramBot::new(&config.bot_token);

    bot.set_my_commands(Command::bot_commands()).await?;

    let transport: Arc<dyn Transport> = Arc::new(bot.clone());
    let pipeline = Arc::new(Pipeline::new(
        Collaborators {
            transport,
            extractor: Arc::new(YtDlpExtractor::new(&config.yt_dlp_bin)),
            catalog: Arc::new(SpotdlCatalog::new(
                &config.spotdl_bin,
                config.spotify_client_id.clone(),
                config.spotify_client_secret.clone(),
            )),
            http: Arc::new(ReqwestFetcher::new()?),
            locator: Arc::new(PinterestLocator),
        },
        PipelineSettings {
            download_dir: config.download_dir.clone(),
            archive_limit_mb: config.archive_limit_mb,
            scrape_timeout: config.scrape_timeout,
        },
    ));
    let pool = Arc::new(WorkerPool::start(
        pipeline.clone(),
        config.workers,
        config.queue_size,
    ));

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(answer))
        .branch(Update::filter_callback_query().endpoint(answer_callback));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![pipeline, pool.clone()])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Dispatcher stopped");
    pool.shutdown().await;

    Ok(())
}

#[derive(BotCommands, Debug, Clone)]
#[command(
    rename_rule = "kebab-case",
    description = "These commands are supported:"
)]
enum Command {
    #[command(description = "display this text.")]
    Help,
    #[command(description = "start using the bot.")]
    Start,
}

#[tracing::instrument(skip_all, fields(chat = %msg.chat.id, msg = %msg.id))]
async fn answer(
    bot: TeloxideBot,
    msg: Message,
    pipeline: Arc<Pipeline>,
    pool: Arc<WorkerPool>,
) -> ResponseResult<()> {
    trace!(?msg, "Got message");
    let bot_me = bot.get_me().await?;

    let Some(msg_text) = msg.text() else {
        return Ok(());
    };

    match Command::parse(msg_text, bot_me.username()) {
        Ok(c) => handle_command(&bot, msg, c).await,
        Err(_) => {
            handle_message(msg, &pipeline, &pool).await;
            Ok(())
        }
    }
}

#[tracing::instrument(skip(bot, msg))]
async fn handle_command(bot: &TeloxideBot, msg: Message, cmd: Command) -> ResponseResult<()> {
    trace!("Handling command");

    match cmd {
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
        }

        Command::Start => {
            bot.send_message(
                msg.chat.id,
                "Send me a link:\n• Spotify playlist/album/track → ZIP of songs\n• Pinterest pin \
                 → image or video\n• YouTube link → choose MP3 or MP4",
            )
            .await?;
        }
    }
    Ok(())
}

#[tracing::instrument(skip_all, fields(chat = ?msg.chat.id, msg = ?msg.id))]
async fn handle_message(msg: Message, pipeline: &Pipeline, pool: &WorkerPool) {
    let Some(msg_text) = msg.text() else {
        trace!("Message does not contain text");
        return;
    };

    let target = ReplyTarget {
        chat: msg.chat.id,
        reply_to: Some(msg.id),
        prompt: None,
    };
    let request = Request::new(msg_text, None, target);
    info!(id = %request.id, platform = %request.platform, "Link received");

    if let Some(request) = pipeline.admit(request).await {
        pool.submit(request).await;
    }
}

#[tracing::instrument(skip_all, fields(query = %query.id))]
async fn answer_callback(
    bot: TeloxideBot,
    query: CallbackQuery,
    pipeline: Arc<Pipeline>,
    pool: Arc<WorkerPool>,
) -> ResponseResult<()> {
    bot.answer_callback_query(query.id.clone()).await?;

    let Some(choice) = query.data.as_deref().and_then(FormatChoice::decode) else {
        trace!(data = ?query.data, "Ignoring callback");
        return Ok(());
    };
    let Some(prompt) = query.message else {
        return Ok(());
    };

    bot.edit_message_text(
        prompt.chat.id,
        prompt.id,
        format!("Downloading as {}...", choice.format.as_str().to_uppercase()),
    )
    .await?;

    let target = ReplyTarget {
        chat: prompt.chat.id,
        reply_to: None,
        prompt: Some(prompt.id),
    };
    let request = Request::new(&choice.url, Some(choice.format), target);
    info!(id = %request.id, format = ?choice.format, "Format chosen");

    if let Some(request) = pipeline.admit(request).await {
        pool.submit(request).await;
    }

    Ok(())
}

fn init_log() {
    tracing_subscriber::fmt()
        .with_ansi(true)
        .with_env_filter(
            TracingFilterBuilder::default()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .finish()
        .init();
}
