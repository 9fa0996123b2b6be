mod config;
mod mapper;
mod pipeline;
mod responder;
mod sanitize;
mod tg;
mod tmdb;

use config::{ConfigError, Settings};
use dotenvy::dotenv;
use pipeline::QueryPipeline;
use responder::MessageResponder;
use std::sync::Arc;
use teloxide::prelude::*;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let settings = match Settings::from_env() {
        Ok(s) => s,
        // a missing token is a usage problem, not a crash
        Err(e @ ConfigError::Missing { .. }) => {
            println!("{e}");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let bot = Bot::new(&settings.telegram_token);
    let me = bot.get_me().await?;
    info!(username = ?me.username, "connected to telegram");

    let tmdb = tmdb::TmdbClient::new(
        settings.tmdb_token.clone(),
        &settings.tmdb_api_url,
        settings.tmdb_timeout,
    )?;

    let (query_tx, query_rx) = mpsc::channel(settings.queue_capacity);
    let (message_tx, message_rx) = mpsc::channel(settings.queue_capacity);

    let pipeline = QueryPipeline::init(
        Arc::new(tmdb),
        Arc::new(bot.clone()),
        settings.search_cache_ttl,
    )
    .await;
    info!(image_base_url = pipeline.image_base_url(), "query pipeline ready");
    let queries = tokio::spawn(Arc::new(pipeline).run(query_rx, settings.query_workers));
    let messages = tokio::spawn(MessageResponder::new(Arc::new(bot.clone())).run(message_rx));

    info!("listening");
    tg::run(bot, query_tx, message_tx).await;

    // dispatcher dropped both senders; let the consumers drain
    queries.await?;
    messages.await?;
    Ok(())
}
