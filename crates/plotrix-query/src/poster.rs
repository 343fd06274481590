//! Best-effort poster artwork from the TMDB catalog.
//!
//! A lookup never fails the request it decorates: callers go through
//! [`poster_or_none`] or [`lookup_all`], which fold every error into "no
//! poster".

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use plotrix_core::config::PosterConfig;
use plotrix_core::error::{PlotrixError, Result};

/// Finds a poster image URL for a movie title.
#[async_trait]
pub trait PosterLookup: Send + Sync {
    async fn lookup(&self, title: &str, year: Option<u32>) -> Result<Option<String>>;

    fn is_configured(&self) -> bool {
        true
    }
}

/// Lookup used when no catalog API key is configured.
pub struct NoPosterLookup;

#[async_trait]
impl PosterLookup for NoPosterLookup {
    async fn lookup(&self, _title: &str, _year: Option<u32>) -> Result<Option<String>> {
        Ok(None)
    }

    fn is_configured(&self) -> bool {
        false
    }
}

#[derive(Debug, Deserialize)]
struct TmdbSearchPage {
    #[serde(default)]
    results: Vec<TmdbMovie>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovie {
    #[serde(default)]
    poster_path: Option<String>,
}

/// TMDB `search/movie` client.
pub struct TmdbPosterLookup {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    image_base_url: String,
}

impl TmdbPosterLookup {
    pub fn new(config: &PosterConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| PlotrixError::Poster(e.to_string()))?;
        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            image_base_url: config.image_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PosterLookup for TmdbPosterLookup {
    async fn lookup(&self, title: &str, year: Option<u32>) -> Result<Option<String>> {
        let mut params = vec![
            ("api_key", self.api_key.clone()),
            ("query", title.to_string()),
        ];
        if let Some(y) = year {
            params.push(("year", y.to_string()));
        }

        let response = self
            .client
            .get(format!("{}/search/movie", self.api_url))
            .query(&params)
            .send()
            .await
            .map_err(|e| PlotrixError::Poster(e.to_string()))?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(PlotrixError::Poster(format!(
                "catalog returned {}",
                response.status()
            )));
        }

        let page: TmdbSearchPage = response
            .json()
            .await
            .map_err(|e| PlotrixError::Poster(e.to_string()))?;

        Ok(first_poster_url(&page, &self.image_base_url))
    }
}

/// Image URL of the first catalog hit, if that hit has artwork.
fn first_poster_url(page: &TmdbSearchPage, image_base_url: &str) -> Option<String> {
    let path = page.results.first()?.poster_path.as_deref()?;
    if path.is_empty() {
        return None;
    }
    if path.starts_with('/') {
        Some(format!("{}{}", image_base_url, path))
    } else {
        Some(format!("{}/{}", image_base_url, path))
    }
}

/// Run a lookup, collapsing any failure into `None`.
pub async fn poster_or_none(
    lookup: &dyn PosterLookup,
    title: &str,
    year: Option<u32>,
) -> Option<String> {
    if title.trim().is_empty() {
        return None;
    }
    match lookup.lookup(title, year).await {
        Ok(url) => url,
        Err(e) => {
            debug!(title, error = %e, "Poster lookup failed");
            None
        }
    }
}

/// Look up posters for many titles with at most `max_concurrent` requests
/// in flight. The output is index-aligned with `items`.
pub async fn lookup_all(
    lookup: Arc<dyn PosterLookup>,
    items: Vec<(String, Option<u32>)>,
    max_concurrent: usize,
) -> Vec<Option<String>> {
    let mut posters: Vec<Option<String>> = vec![None; items.len()];
    if items.is_empty() || !lookup.is_configured() {
        return posters;
    }

    let permits = Arc::new(Semaphore::new(max_concurrent.max(1)));
    let mut tasks = JoinSet::new();

    for (index, (title, year)) in items.into_iter().enumerate() {
        let lookup = Arc::clone(&lookup);
        let permits = Arc::clone(&permits);
        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await.ok();
            (index, poster_or_none(lookup.as_ref(), &title, year).await)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, url)) => posters[index] = url,
            Err(e) => warn!(error = %e, "Poster lookup task aborted"),
        }
    }

    posters
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingLookup;

    #[async_trait]
    impl PosterLookup for FailingLookup {
        async fn lookup(&self, _title: &str, _year: Option<u32>) -> Result<Option<String>> {
            Err(PlotrixError::Poster("connection reset".into()))
        }
    }

    /// Returns a URL derived from the title; panics for "boom".
    struct EchoLookup {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl EchoLookup {
        fn new() -> Self {
            Self {
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PosterLookup for EchoLookup {
        async fn lookup(&self, title: &str, year: Option<u32>) -> Result<Option<String>> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if title == "boom" {
                panic!("lookup exploded");
            }
            Ok(Some(format!("img/{}/{}", title, year.unwrap_or(0))))
        }
    }

    #[test]
    fn test_first_poster_url() {
        let page: TmdbSearchPage = serde_json::from_str(
            r#"{"page":1,"results":[{"poster_path":"/abc.jpg"},{"poster_path":"/def.jpg"}]}"#,
        )
        .unwrap();
        assert_eq!(
            first_poster_url(&page, "https://image.tmdb.org/t/p/w500"),
            Some("https://image.tmdb.org/t/p/w500/abc.jpg".to_string())
        );
    }

    #[test]
    fn test_first_poster_url_empty_or_missing() {
        let empty: TmdbSearchPage = serde_json::from_str(r#"{"results":[]}"#).unwrap();
        assert_eq!(first_poster_url(&empty, "https://img"), None);

        let no_art: TmdbSearchPage =
            serde_json::from_str(r#"{"results":[{"poster_path":null},{"poster_path":"/x.jpg"}]}"#)
                .unwrap();
        assert_eq!(first_poster_url(&no_art, "https://img"), None);

        let no_results: TmdbSearchPage = serde_json::from_str("{}").unwrap();
        assert_eq!(first_poster_url(&no_results, "https://img"), None);
    }

    #[tokio::test]
    async fn test_poster_or_none_swallows_errors() {
        assert_eq!(poster_or_none(&FailingLookup, "Heat", Some(1995)).await, None);
    }

    #[tokio::test]
    async fn test_poster_or_none_skips_blank_title() {
        let lookup = EchoLookup::new();
        assert_eq!(poster_or_none(&lookup, "  ", None).await, None);
        assert_eq!(lookup.peak.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_poster_lookup() {
        assert!(!NoPosterLookup.is_configured());
        assert_eq!(NoPosterLookup.lookup("Heat", None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_lookup_all_preserves_order_and_bounds_concurrency() {
        let lookup = Arc::new(EchoLookup::new());
        let items = (0..8)
            .map(|i| (format!("t{}", i), Some(2000 + i)))
            .collect::<Vec<_>>();

        let posters = lookup_all(lookup.clone(), items, 3).await;

        assert_eq!(posters.len(), 8);
        for (i, url) in posters.iter().enumerate() {
            assert_eq!(url.as_deref(), Some(format!("img/t{}/{}", i, 2000 + i).as_str()));
        }
        assert!(lookup.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_lookup_all_isolates_failures() {
        let lookup = Arc::new(EchoLookup::new());
        let items = vec![
            ("a".to_string(), None),
            ("boom".to_string(), None),
            ("c".to_string(), Some(1)),
        ];

        let posters = lookup_all(lookup, items, 2).await;

        assert_eq!(posters[0].as_deref(), Some("img/a/0"));
        assert_eq!(posters[1], None);
        assert_eq!(posters[2].as_deref(), Some("img/c/1"));
    }

    #[tokio::test]
    async fn test_lookup_all_failing_lookup() {
        let posters = lookup_all(
            Arc::new(FailingLookup),
            vec![("a".into(), None), ("b".into(), None)],
            4,
        )
        .await;
        assert_eq!(posters, vec![None, None]);
    }

    #[tokio::test]
    async fn test_lookup_all_unconfigured_skips_calls() {
        let posters = lookup_all(Arc::new(NoPosterLookup), vec![("a".into(), None)], 4).await;
        assert_eq!(posters, vec![None]);
    }
}
