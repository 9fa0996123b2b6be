use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.themoviedb.org/3";

#[derive(Debug, thiserror::Error)]
pub enum TmdbError {
    #[error("tmdb request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("tmdb answered {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// Metadata lookups the query pipeline depends on.
#[async_trait]
pub trait MediaSearch: Send + Sync {
    async fn configuration(&self) -> Result<ImagesConfiguration, TmdbError>;

    /// Multi-type search (movies, tv, people), first page, English.
    async fn search_multi(&self, query: &str) -> Result<Vec<SearchHit>, TmdbError>;
}

/// TMDB v3 API client.
#[derive(Clone)]
pub struct TmdbClient {
    token: String,
    base_url: String,
    http: Client,
}

impl TmdbClient {
    pub fn new(token: String, base_url: &str, timeout: Duration) -> Result<Self, TmdbError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            token,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// v4 read tokens are JWTs and go into the header, v3 keys into the query.
    fn get(&self, url: String) -> RequestBuilder {
        let req = self.http.get(url);
        if self.token.starts_with("eyJ") {
            req.bearer_auth(&self.token)
        } else {
            req.query(&[("api_key", self.token.as_str())])
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, url: String) -> Result<T, TmdbError> {
        let resp = self.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TmdbError::Status { status, body });
        }
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl MediaSearch for TmdbClient {
    async fn configuration(&self) -> Result<ImagesConfiguration, TmdbError> {
        let url = format!("{}/configuration", self.base_url);
        let cfg: ConfigurationResp = self.fetch(url).await?;
        Ok(cfg.images)
    }

    async fn search_multi(&self, query: &str) -> Result<Vec<SearchHit>, TmdbError> {
        let url = format!(
            "{}/search/multi?query={}&page=1&language=en&append_to_response=movie",
            self.base_url,
            urlencoding::encode(query)
        );
        let data: SearchResp = self.fetch(url).await?;
        Ok(data.results)
    }
}

/* ======= DTOs ======= */

#[derive(Deserialize, Debug)]
struct ConfigurationResp {
    images: ImagesConfiguration,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ImagesConfiguration {
    pub secure_base_url: String,
}

#[derive(Deserialize, Debug)]
struct SearchResp {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SearchHit {
    pub id: u64,
    pub media_type: MediaType,
    pub original_title: Option<String>,
    pub original_name: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub vote_average: f64,
    pub popularity: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, token: &str) -> TmdbClient {
        TmdbClient::new(
            token.to_string(),
            &format!("{}/3/", server.uri()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn search_multi_sends_fixed_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/3/search/multi"))
            .and(query_param("query", "dune part two"))
            .and(query_param("page", "1"))
            .and(query_param("language", "en"))
            .and(query_param("append_to_response", "movie"))
            .and(query_param("api_key", "v3key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "page": 1,
                "results": [
                    {
                        "id": 693134,
                        "media_type": "movie",
                        "original_title": "Dune: Part Two",
                        "overview": "Paul Atreides unites with Chani.",
                        "poster_path": "/czembW0Rk1Ke7lCJGahbOhdCuhV.jpg",
                        "vote_average": 8.2,
                        "popularity": 512.3
                    },
                    { "id": 1, "media_type": "person", "name": "Zendaya", "poster_path": null },
                    { "id": 2, "media_type": "tv", "original_name": "Dune: Prophecy", "overview": null }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let hits = client(&server, "v3key").search_multi("dune part two").await.unwrap();

        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].media_type, MediaType::Movie);
        assert_eq!(hits[0].original_title.as_deref(), Some("Dune: Part Two"));
        assert_eq!(hits[0].poster_path.as_deref(), Some("/czembW0Rk1Ke7lCJGahbOhdCuhV.jpg"));
        assert_eq!(hits[0].vote_average, 8.2);
        assert_eq!(hits[1].media_type, MediaType::Other);
        assert_eq!(hits[1].poster_path, None);
        assert_eq!(hits[2].media_type, MediaType::Tv);
        assert_eq!(hits[2].overview, None);
    }

    #[tokio::test]
    async fn read_token_goes_into_bearer_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/3/configuration"))
            .and(header("authorization", "Bearer eyJhbGciOi.token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "images": {
                    "base_url": "http://image.tmdb.org/t/p/",
                    "secure_base_url": "https://image.tmdb.org/t/p/",
                    "poster_sizes": ["w92", "w154", "original"]
                },
                "change_keys": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let images = client(&server, "eyJhbGciOi.token").configuration().await.unwrap();

        assert_eq!(images.secure_base_url, "https://image.tmdb.org/t/p/");
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/3/search/multi"))
            .respond_with(
                ResponseTemplate::new(401).set_body_string(r#"{"status_message":"Invalid API key"}"#),
            )
            .mount(&server)
            .await;

        let err = client(&server, "bad").search_multi("x").await.unwrap_err();

        match err {
            TmdbError::Status { status, body } => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert!(body.contains("Invalid API key"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn missing_results_field_means_no_hits() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/3/search/multi"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "page": 1 })))
            .mount(&server)
            .await;

        let hits = client(&server, "k").search_multi("nothing").await.unwrap();
        assert!(hits.is_empty());
    }
}
