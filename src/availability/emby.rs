use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use overseer_common::{Error, MediaKind, Result};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::matching::{is_match, LibraryEntry};
use super::{Availability, AvailabilityProbe, ServerKind, ServerSettings};
use crate::config::ConfigStore;
use crate::metadata::MediaItem;

const CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

fn item_type(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Movie => "Movie",
        MediaKind::Tv => "Series",
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EmbyItemsResponse {
    #[serde(default)]
    items: Vec<EmbyItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EmbyItem {
    id: String,
    name: String,
    production_year: Option<u16>,
    server_id: Option<String>,
    #[serde(default)]
    provider_ids: HashMap<String, String>,
}

impl EmbyItem {
    fn imdb_id(&self) -> Option<&str> {
        self.provider_ids
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("imdb"))
            .map(|(_, v)| v.as_str())
    }
}

/// Availability probe backed by an Emby (or Jellyfin) item search.
pub struct EmbyProbe {
    client: Client,
    settings: Arc<ConfigStore>,
}

impl EmbyProbe {
    pub fn new(settings: Arc<ConfigStore>) -> Self {
        let client = Client::builder()
            .timeout(CONNECTION_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client: {}", e);
                Client::new()
            });

        Self { client, settings }
    }

    async fn search(
        &self,
        base_url: &str,
        api_key: &str,
        title: &str,
        kind: MediaKind,
    ) -> anyhow::Result<Vec<EmbyItem>> {
        let url = format!("{}/emby/Items", base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("Recursive", "true"),
                ("IncludeItemTypes", item_type(kind)),
                ("Fields", "ProviderIds,ProductionYear"),
                ("SearchTerm", title),
            ])
            .header("X-Emby-Token", api_key)
            .send()
            .await
            .context("Emby item search failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Emby item search failed ({}): {}", status, body);
        }

        let body: EmbyItemsResponse = response
            .json()
            .await
            .context("failed to parse Emby items response")?;

        Ok(body.items)
    }
}

fn web_link(base_url: &str, item: &EmbyItem) -> Option<Url> {
    let mut link = Url::parse(&format!("{base_url}/web/index.html")).ok()?;
    let fragment = match &item.server_id {
        Some(server) => format!("!/item?id={}&serverId={}", item.id, server),
        None => format!("!/item?id={}", item.id),
    };
    link.set_fragment(Some(&fragment));
    Some(link)
}

#[async_trait]
impl AvailabilityProbe for EmbyProbe {
    fn kind(&self) -> ServerKind {
        ServerKind::Emby
    }

    async fn settings(&self) -> Result<ServerSettings> {
        let emby = self.settings.emby();
        Ok(ServerSettings {
            enabled: emby.enabled && !emby.url.is_empty(),
            url: emby.url,
            token: emby.api_key,
        })
    }

    async fn lookup(
        &self,
        settings: &ServerSettings,
        item: &MediaItem,
        kind: MediaKind,
    ) -> Result<Availability> {
        let base_url = settings.base_url();

        let items = self
            .search(base_url, &settings.token, &item.title, kind)
            .await
            .map_err(|e| Error::probe_failure(ServerKind::Emby, format!("{e:#}")))?;

        let found = items.iter().find(|e| {
            is_match(
                item,
                &LibraryEntry {
                    title: &e.name,
                    year: e.production_year,
                    imdb_id: e.imdb_id(),
                },
            )
        });

        Ok(match found {
            Some(e) => Availability::available(web_link(base_url, e)),
            None => Availability::unavailable(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, EmbyConfig};
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn probe_for(url: &str) -> EmbyProbe {
        let store = Arc::new(ConfigStore::new(&Config::default()));
        store.set_emby(EmbyConfig {
            enabled: true,
            url: url.to_string(),
            api_key: "emby-key".into(),
        });
        EmbyProbe::new(store)
    }

    async fn find(probe: &EmbyProbe, item: &MediaItem) -> Result<Availability> {
        let settings = probe.settings().await.unwrap();
        probe.lookup(&settings, item, MediaKind::Movie).await
    }

    #[tokio::test]
    async fn settings_change_is_seen_without_rebuild() {
        let store = Arc::new(ConfigStore::new(&Config::default()));
        let probe = EmbyProbe::new(store.clone());
        assert!(!probe.settings().await.unwrap().enabled);

        store.set_emby(EmbyConfig {
            enabled: true,
            url: "http://emby:8096".into(),
            api_key: "emby-key".into(),
        });
        let settings = probe.settings().await.unwrap();
        assert!(settings.enabled);
        assert_eq!(settings.token, "emby-key");
    }

    #[tokio::test]
    async fn finds_movie_by_provider_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/emby/Items"))
            .and(header("X-Emby-Token", "emby-key"))
            .and(query_param("SearchTerm", "Inception"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Items": [
                    {"Id": "f00", "Name": "Inception: The Cobol Job", "ProductionYear": 2010},
                    {"Id": "b4r", "Name": "Inception", "ProductionYear": 2010,
                     "ServerId": "srv1", "ProviderIds": {"Imdb": "tt1375666", "Tmdb": "27205"}}
                ],
                "TotalRecordCount": 2
            })))
            .mount(&server)
            .await;

        let item = MediaItem::new(27205, "Inception").with_imdb_id("tt1375666");
        let result = find(&probe_for(&server.uri()), &item).await.unwrap();

        assert!(result.available);
        assert_eq!(
            result.link.unwrap().as_str(),
            format!("{}/web/index.html#!/item?id=b4r&serverId=srv1", server.uri())
        );
    }

    #[tokio::test]
    async fn no_items_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/emby/Items"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Items": [], "TotalRecordCount": 0
            })))
            .mount(&server)
            .await;

        let result = find(&probe_for(&server.uri()), &MediaItem::new(1, "Missing"))
            .await
            .unwrap();
        assert_eq!(result, Availability::unavailable());
    }

    #[tokio::test]
    async fn tv_lookup_searches_series() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/emby/Items"))
            .and(query_param("IncludeItemTypes", "Series"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Items": [{"Id": "s1", "Name": "The Expanse", "ProductionYear": 2015}],
                "TotalRecordCount": 1
            })))
            .mount(&server)
            .await;

        let probe = probe_for(&server.uri());
        let settings = probe.settings().await.unwrap();
        let result = probe
            .lookup(&settings, &MediaItem::new(63639, "The Expanse").with_year(2015), MediaKind::Tv)
            .await
            .unwrap();

        assert!(result.available);
        assert_eq!(
            result.link.unwrap().as_str(),
            format!("{}/web/index.html#!/item?id=s1", server.uri())
        );
    }

    #[tokio::test]
    async fn movie_lookup_does_not_search_series() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/emby/Items"))
            .and(query_param("IncludeItemTypes", "Movie"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Items": [], "TotalRecordCount": 0
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = find(&probe_for(&server.uri()), &MediaItem::new(63639, "The Expanse"))
            .await
            .unwrap();
        assert!(!result.available);
    }

    #[tokio::test]
    async fn server_error_is_probe_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/emby/Items"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = find(&probe_for(&server.uri()), &MediaItem::new(1, "A"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("emby"));
    }
}
