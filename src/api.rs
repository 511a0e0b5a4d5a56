//! Backend client supplying the feed and receiving ad impressions.

use crate::config::Settings;
use crate::model::{retain_playable, sample_feed, AdItem, ContentItem, FeedItem, ItemId};
use crate::notify::{AdImpression, ImpressionSink};
use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinSet;
use url::Url;

const CONTENT_PATH: &str = "api/v1/wiseup/content";
const ADS_PATH: &str = "api/v1/wiseup/ads";
const IMPRESSION_PATH: &str = "api/v1/wiseup/ads/impression";

/// HTTP client for the WiseUp endpoints.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: Client,
    base: Url,
    token: Option<String>,
}

impl FeedClient {
    pub fn new(api_url: &str, token: Option<String>) -> Result<Self> {
        let mut base = Url::parse(api_url).context("Invalid API URL")?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            client: Client::new(),
            base,
            token,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(&settings.api_url, settings.auth_token.clone())
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .with_context(|| format!("Failed to build URL for {}", path))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    pub async fn fetch_content(&self, limit: usize) -> Result<Vec<ContentItem>> {
        let url = self.endpoint(CONTENT_PATH)?;
        let res = self
            .authorized(self.client.get(url).query(&[("limit", limit)]))
            .send()
            .await
            .context("Failed to request content")?
            .error_for_status()?;
        res.json().await.context("Failed to parse content")
    }

    pub async fn fetch_ads(&self, limit: usize, interests: &[String]) -> Result<Vec<AdItem>> {
        let url = self.endpoint(ADS_PATH)?;
        let query = [
            ("limit", limit.to_string()),
            ("interests", interests.join(",")),
        ];
        let res = self
            .authorized(self.client.get(url).query(&query))
            .send()
            .await
            .context("Failed to request ads")?
            .error_for_status()?;
        res.json().await.context("Failed to parse ads")
    }

    pub async fn track_ad_impression(&self, ad_id: &ItemId) -> Result<()> {
        let url = self.endpoint(IMPRESSION_PATH)?;
        let ad_id = match ad_id.as_str().parse::<i64>() {
            Ok(n) => serde_json::Value::from(n),
            Err(_) => serde_json::Value::from(ad_id.as_str()),
        };
        self.authorized(self.client.post(url))
            .json(&serde_json::json!({ "adId": ad_id }))
            .send()
            .await
            .context("Failed to send impression")?
            .error_for_status()?;
        Ok(())
    }

    /// Fetch lessons and ads, interleaved. Falls back to the bundled
    /// sample feed when the backend fails or has nothing to show.
    pub async fn load_feed(&self, settings: &Settings) -> Vec<FeedItem> {
        if settings.use_sample_feed {
            return sample_feed();
        }

        let fetched = tokio::try_join!(
            self.fetch_content(settings.content_limit),
            self.fetch_ads(settings.ad_limit, &settings.interests),
        );

        match fetched {
            Ok((content, ads)) => {
                tracing::info!("Fetched {} lessons and {} ads", content.len(), ads.len());
                let mut items = interleave(content, ads, settings.ad_frequency);
                retain_playable(&mut items);
                if items.is_empty() {
                    tracing::warn!("Backend returned no playable items, using sample feed");
                    sample_feed()
                } else {
                    items
                }
            }
            Err(e) => {
                tracing::warn!("Failed to fetch feed, using sample feed: {:#}", e);
                sample_feed()
            }
        }
    }
}

/// Slot one ad after every `frequency` lessons; leftover ads go last.
pub fn interleave(content: Vec<ContentItem>, ads: Vec<AdItem>, frequency: usize) -> Vec<FeedItem> {
    let frequency = frequency.max(1);
    let mut result = Vec::with_capacity(content.len() + ads.len());
    let mut ads = ads.into_iter();

    for (index, item) in content.into_iter().enumerate() {
        result.push(FeedItem::Content(item));
        if (index + 1) % frequency == 0 {
            if let Some(ad) = ads.next() {
                result.push(FeedItem::Ad(ad));
            }
        }
    }
    result.extend(ads.map(FeedItem::Ad));
    result
}

/// Reports impressions to the backend without waiting for the response.
/// Posts still in flight at shutdown are awaited by [`ApiImpressions::flush`].
#[derive(Debug, Clone)]
pub struct ApiImpressions {
    client: Arc<FeedClient>,
    in_flight: Arc<Mutex<JoinSet<()>>>,
}

impl ApiImpressions {
    pub fn new(client: Arc<FeedClient>) -> Self {
        Self {
            client,
            in_flight: Arc::new(Mutex::new(JoinSet::new())),
        }
    }

    /// Wait up to `timeout` for outstanding impression posts. Returns how
    /// many finished; the rest are aborted.
    pub async fn flush(&self, timeout: Duration) -> usize {
        let mut tasks = match self.in_flight.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(_) => return 0,
        };
        if tasks.is_empty() {
            return 0;
        }

        let mut finished = 0;
        let drained = tokio::time::timeout(timeout, async {
            while let Some(result) = tasks.join_next().await {
                if let Err(e) = result {
                    tracing::warn!("Impression task failed: {}", e);
                }
                finished += 1;
            }
        })
        .await;

        if drained.is_err() {
            tracing::warn!(
                "Gave up on {} impression posts after {:?}",
                tasks.len(),
                timeout
            );
            tasks.abort_all();
        }
        finished
    }
}

impl ImpressionSink for ApiImpressions {
    fn record(&self, impression: &AdImpression) {
        tracing::info!("Ad impression tracked: {}", impression.title);

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("No async runtime, impression {} not sent", impression.id);
            return;
        };

        let client = self.client.clone();
        let id = impression.id.clone();
        let post = async move {
            if let Err(e) = client.track_ad_impression(&id).await {
                tracing::warn!("Failed to track impression for ad {}: {:#}", id, e);
            }
        };
        match self.in_flight.lock() {
            Ok(mut tasks) => {
                while tasks.try_join_next().is_some() {}
                tasks.spawn_on(post, &runtime);
            }
            Err(_) => {
                runtime.spawn(post);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ItemKind;

    fn lessons(n: usize) -> Vec<ContentItem> {
        (0..n)
            .map(|i| match sample_feed().remove(0) {
                FeedItem::Content(mut c) => {
                    c.id = ItemId::new(format!("c{}", i));
                    c
                }
                FeedItem::Ad(_) => unreachable!(),
            })
            .collect()
    }

    fn ads(n: usize) -> Vec<AdItem> {
        (0..n)
            .map(|i| match sample_feed().remove(1) {
                FeedItem::Ad(mut a) => {
                    a.id = ItemId::new(format!("a{}", i));
                    a
                }
                FeedItem::Content(_) => unreachable!(),
            })
            .collect()
    }

    fn ids(items: &[FeedItem]) -> Vec<&str> {
        items.iter().map(|i| i.id().as_str()).collect()
    }

    #[test]
    fn interleaves_after_every_nth_lesson() {
        let items = interleave(lessons(7), ads(2), 3);
        assert_eq!(
            ids(&items),
            vec!["c0", "c1", "c2", "a0", "c3", "c4", "c5", "a1", "c6"]
        );
    }

    #[test]
    fn leftover_ads_are_appended() {
        let items = interleave(lessons(2), ads(2), 3);
        assert_eq!(ids(&items), vec!["c0", "c1", "a0", "a1"]);
    }

    #[test]
    fn empty_sides_pass_through() {
        assert_eq!(ids(&interleave(Vec::new(), ads(2), 3)), vec!["a0", "a1"]);
        let items = interleave(lessons(2), Vec::new(), 1);
        assert!(items.iter().all(|i| i.kind() == ItemKind::Content));
    }

    #[test]
    fn base_url_keeps_its_path() {
        let client = FeedClient::new("https://jobs.example.com/backend", None).unwrap();
        assert_eq!(
            client.endpoint(CONTENT_PATH).unwrap().as_str(),
            "https://jobs.example.com/backend/api/v1/wiseup/content"
        );
    }

    #[test]
    fn impressions_without_runtime_are_dropped_quietly() {
        let client = Arc::new(FeedClient::new("http://127.0.0.1:9", None).unwrap());
        ApiImpressions::new(client).record(&AdImpression {
            id: ItemId::new("2"),
            title: "Join Our Internship Program".into(),
        });
    }

    #[tokio::test]
    async fn flush_waits_for_outstanding_impression_posts() {
        let client = Arc::new(FeedClient::new("http://127.0.0.1:9", None).unwrap());
        let impressions = ApiImpressions::new(client);
        for id in ["2", "4"] {
            impressions.record(&AdImpression {
                id: ItemId::new(id),
                title: "Join Our Internship Program".into(),
            });
        }

        assert_eq!(impressions.flush(Duration::from_secs(10)).await, 2);
        assert_eq!(impressions.flush(Duration::from_secs(10)).await, 0);
    }

    #[tokio::test]
    async fn unreachable_backend_falls_back_to_sample_feed() {
        let mut settings = Settings::load_from("/nonexistent/wiseup.toml").unwrap();
        settings.api_url = "http://127.0.0.1:9".into();
        let client = FeedClient::from_settings(&settings).unwrap();
        assert_eq!(client.load_feed(&settings).await, sample_feed());
    }
}
