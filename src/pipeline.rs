use crate::mapper::{map_hit, DisplayResult};
use crate::tmdb::{MediaSearch, SearchHit, TmdbError};
use async_trait::async_trait;
use moka::future::Cache;
use std::{sync::Arc, time::Duration};
use teloxide::RequestError;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

const CACHE_CAPACITY: u64 = 1_000;

/// Inline query as taken off the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryEvent {
    pub id: String,
    pub user_id: u64,
    pub text: String,
}

/// Where the assembled article list goes.
#[async_trait]
pub trait InlineAnswerer: Send + Sync {
    async fn answer_query(
        &self,
        query_id: &str,
        results: Vec<DisplayResult>,
    ) -> Result<(), RequestError>;
}

/// Inline query handling: search, map, answer.
pub struct QueryPipeline {
    search: Arc<dyn MediaSearch>,
    answerer: Arc<dyn InlineAnswerer>,
    image_base_url: String,
    cache: Option<Cache<String, Arc<Vec<SearchHit>>>>,
}

impl QueryPipeline {
    /// Fetches the image configuration once. Without it posters get a bare
    /// `w92/...` path and the pipeline keeps going.
    pub async fn init(
        search: Arc<dyn MediaSearch>,
        answerer: Arc<dyn InlineAnswerer>,
        cache_ttl: Duration,
    ) -> Self {
        let image_base_url = match search.configuration().await {
            Ok(images) => images.secure_base_url,
            Err(e) => {
                warn!(error = %e, "could not fetch tmdb configuration, thumbnails degraded");
                String::new()
            }
        };
        let cache = (!cache_ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(cache_ttl)
                .build()
        });

        Self { search, answerer, image_base_url, cache }
    }

    pub fn image_base_url(&self) -> &str {
        &self.image_base_url
    }

    async fn search(&self, text: &str) -> Result<Arc<Vec<SearchHit>>, TmdbError> {
        if let Some(cache) = &self.cache {
            if let Some(hits) = cache.get(text).await {
                debug!(query = text, "search cache hit");
                return Ok(hits);
            }
        }
        let hits = Arc::new(self.search.search_multi(text).await?);
        if let Some(cache) = &self.cache {
            cache.insert(text.to_string(), hits.clone()).await;
        }
        Ok(hits)
    }

    /// Search and map, in TMDB order. Errors yield an empty list.
    pub async fn results_for(&self, text: &str) -> Vec<DisplayResult> {
        match self.search(text).await {
            Ok(hits) => hits
                .iter()
                .map(|hit| map_hit(hit, &self.image_base_url))
                .collect(),
            Err(e) => {
                warn!(query = text, error = %e, "tmdb search failed");
                Vec::new()
            }
        }
    }

    pub async fn handle(&self, event: QueryEvent) {
        info!(from = event.user_id, text = %event.text, "new inline query");
        let results = self.results_for(&event.text).await;
        let count = results.len();
        match self.answerer.answer_query(&event.id, results).await {
            Ok(()) => debug!(query_id = %event.id, count, "inline query answered"),
            Err(e) => error!(query_id = %event.id, error = %e, "failed to answer inline query"),
        }
    }

    /// Consume the queue until it closes. With `workers > 1` up to that many
    /// queries are in flight at once.
    pub async fn run(self: Arc<Self>, mut queries: mpsc::Receiver<QueryEvent>, workers: usize) {
        if workers <= 1 {
            while let Some(event) = queries.recv().await {
                self.handle(event).await;
            }
        } else {
            let permits = Arc::new(Semaphore::new(workers));
            let mut tasks = JoinSet::new();
            while let Some(event) = queries.recv().await {
                let Ok(permit) = permits.clone().acquire_owned().await else {
                    break;
                };
                let pipeline = self.clone();
                tasks.spawn(async move {
                    pipeline.handle(event).await;
                    drop(permit);
                });
                while tasks.try_join_next().is_some() {}
            }
            while tasks.join_next().await.is_some() {}
        }
        info!("inline query queue closed");
    }
}
