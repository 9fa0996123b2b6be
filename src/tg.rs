use crate::mapper::{DisplayResult, RenderMode};
use crate::pipeline::{InlineAnswerer, QueryEvent};
use crate::responder::{ChatSender, MessageEvent};
use async_trait::async_trait;
use reqwest::Url;
use teloxide::{
    dispatching::{Dispatcher, UpdateFilterExt},
    prelude::*,
    types::{
        InlineQuery, InlineQueryId, InlineQueryResult, InlineQueryResultArticle,
        InputMessageContent, InputMessageContentText, ParseMode,
    },
    RequestError,
};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Feed incoming updates into the two queues until Ctrl-C.
pub async fn run(
    bot: Bot,
    queries: mpsc::Sender<QueryEvent>,
    messages: mpsc::Sender<MessageEvent>,
) {
    let handler = dptree::entry()
        .branch(Update::filter_inline_query().endpoint(move |q: InlineQuery| {
            let queries = queries.clone();
            async move { on_inline_query(q, &queries).await }
        }))
        .branch(Update::filter_message().endpoint(move |msg: Message| {
            let messages = messages.clone();
            async move { on_message(msg, &messages).await }
        }));

    Dispatcher::builder(bot, handler)
        .distribution_function(arrival_order)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

/// Every update shares one worker key, so handlers run one at a time and the
/// queues see updates in arrival order.
fn arrival_order(_: &Update) -> Option<()> {
    Some(())
}

async fn on_inline_query(q: InlineQuery, queries: &mpsc::Sender<QueryEvent>) -> ResponseResult<()> {
    let event = QueryEvent {
        id: q.id.to_string(),
        user_id: q.from.id.0,
        text: q.query,
    };
    if queries.send(event).await.is_err() {
        warn!("inline query queue is closed, dropping update");
    }
    Ok(())
}

async fn on_message(msg: Message, messages: &mpsc::Sender<MessageEvent>) -> ResponseResult<()> {
    let Some(text) = msg.text() else { return Ok(()); };
    let event = MessageEvent {
        chat_id: msg.chat.id.0,
        user_id: msg.from.as_ref().map(|u| u.id.0),
        first_name: msg.from.as_ref().map(|u| u.first_name.clone()).unwrap_or_default(),
        text: text.to_string(),
    };
    if messages.send(event).await.is_err() {
        warn!("message queue is closed, dropping update");
    }
    Ok(())
}

#[async_trait]
impl InlineAnswerer for Bot {
    async fn answer_query(
        &self,
        query_id: &str,
        results: Vec<DisplayResult>,
    ) -> Result<(), RequestError> {
        let articles: Vec<InlineQueryResult> = results
            .into_iter()
            .enumerate()
            .map(|(i, r)| InlineQueryResult::Article(article(i, r)))
            .collect();
        self.answer_inline_query(InlineQueryId(query_id.to_string()), articles).await?;
        Ok(())
    }
}

#[async_trait]
impl ChatSender for Bot {
    async fn send_text(&self, chat_id: i64, text: String) -> Result<(), RequestError> {
        self.send_message(ChatId(chat_id), text).await?;
        Ok(())
    }
}

/* ====== helpers ====== */

#[allow(deprecated)]
fn parse_mode(mode: RenderMode) -> ParseMode {
    match mode {
        RenderMode::Markdown => ParseMode::Markdown,
    }
}

/// Article ids only need to be unique within one answer.
fn article(position: usize, r: DisplayResult) -> InlineQueryResultArticle {
    let mut content = InputMessageContentText::new(r.text);
    content.parse_mode = Some(parse_mode(r.mode));

    let mut article = InlineQueryResultArticle::new(
        position.to_string(),
        r.title,
        InputMessageContent::Text(content),
    );
    article.description = Some(r.description);
    // relative when the tmdb configuration could not be fetched
    article.thumbnail_url = match Url::parse(&r.thumbnail_url) {
        Ok(url) => Some(url),
        Err(e) => {
            debug!(url = %r.thumbnail_url, error = %e, "skipping thumbnail");
            None
        }
    };
    article
}
