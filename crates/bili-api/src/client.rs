use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use tracing::debug;
use vodio_engine::{
    DEFAULT_USER_AGENT, MediaResolver, ResolveError, StreamSource, VideoMeta, VideoPart,
};

use crate::models::{ApiResponse, PlayData, ViewData};

pub const BASE_URL: &str = "https://www.bilibili.com";

const API_BASE: &str = "https://api.bilibili.com";
const VIEW_PATH: &str = "/x/web-interface/view";
const PLAY_URL_PATH: &str = "/x/player/playurl";

/// Anonymous client for the Bilibili web API, implementing
/// [`MediaResolver`] for the download engine.
pub struct BiliClient {
    client: Client,
    api_base: String,
}

impl BiliClient {
    pub fn new() -> Result<Self, ResolveError> {
        let mut headers = HeaderMap::new();
        // The CDN rejects play URL requests without a site referer.
        headers.insert(REFERER, HeaderValue::from_static(BASE_URL));
        let client = Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            api_base: API_BASE.to_string(),
        })
    }

    /// Points the client at a different API host, for tests and mirrors.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ResolveError> {
        let url = format!("{}{path}", self.api_base);
        let response = self.client.get(&url).query(params).send().await?;
        let body = response.text().await?;
        let envelope: ApiResponse<T> = serde_json::from_str(&body)?;
        if envelope.code != 0 {
            return Err(ResolveError::api(envelope.code, envelope.message));
        }
        envelope
            .data
            .ok_or(ResolveError::MissingData { field: "data" })
    }
}

#[async_trait]
impl MediaResolver for BiliClient {
    async fn resolve_video(&self, id: &str) -> Result<VideoMeta, ResolveError> {
        let view: ViewData = self
            .get_json(VIEW_PATH, &[("bvid", id.to_string())])
            .await?;
        debug!("view `{}`: {} part(s)", view.title, view.videos);

        let parts = if view.pages.is_empty() {
            // Some responses omit `pages`; fall back to the top-level cid.
            let cid = view.cid.ok_or(ResolveError::MissingData { field: "cid" })?;
            vec![VideoPart {
                title: view.title.clone(),
                part_id: cid,
            }]
        } else {
            // The page list order is the collection order.
            view.pages
                .into_iter()
                .map(|page| VideoPart {
                    title: page.part,
                    part_id: page.cid,
                })
                .collect()
        };

        Ok(VideoMeta {
            title: view.title,
            parts,
        })
    }

    async fn resolve_stream(
        &self,
        id: &str,
        part_id: u64,
        quality: u32,
    ) -> Result<StreamSource, ResolveError> {
        let play: PlayData = self
            .get_json(
                PLAY_URL_PATH,
                &[
                    ("bvid", id.to_string()),
                    ("cid", part_id.to_string()),
                    ("qn", quality.to_string()),
                ],
            )
            .await?;

        // Take the first entry with a usable URL.
        let entry = play
            .durl
            .into_iter()
            .find(|entry| reqwest::Url::parse(&entry.url).is_ok())
            .ok_or(ResolveError::MissingData { field: "durl" })?;
        Ok(StreamSource {
            url: entry.url,
            size: entry.size,
        })
    }
}
