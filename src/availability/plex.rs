use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use overseer_common::{Error, MediaKind, Result};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::matching::{imdb_from_guid, is_match, LibraryEntry};
use super::{Availability, AvailabilityProbe, ServerKind, ServerSettings};
use crate::config::ConfigStore;
use crate::metadata::MediaItem;

const CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Plex metadata type searched for each media kind.
fn plex_type(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Movie => "1",
        MediaKind::Tv => "2",
    }
}

#[derive(Debug, Deserialize)]
struct PlexResponse {
    #[serde(rename = "MediaContainer")]
    container: PlexContainer,
}

#[derive(Debug, Deserialize)]
struct PlexContainer {
    #[serde(rename = "machineIdentifier")]
    machine_identifier: Option<String>,
    #[serde(rename = "Metadata", default)]
    metadata: Vec<PlexMetadata>,
}

#[derive(Debug, Deserialize)]
struct PlexMetadata {
    key: String,
    title: String,
    year: Option<u16>,
    guid: Option<String>,
    #[serde(rename = "Guid", default)]
    guids: Vec<PlexGuid>,
}

#[derive(Debug, Deserialize)]
struct PlexGuid {
    id: String,
}

impl PlexMetadata {
    fn imdb_id(&self) -> Option<&str> {
        self.guids
            .iter()
            .map(|g| g.id.as_str())
            .chain(self.guid.as_deref())
            .find_map(imdb_from_guid)
    }
}

/// Availability probe backed by a Plex Media Server library search.
pub struct PlexProbe {
    client: Client,
    settings: Arc<ConfigStore>,
}

impl PlexProbe {
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
        token: &str,
        title: &str,
        kind: MediaKind,
    ) -> anyhow::Result<PlexContainer> {
        let url = format!("{}/search", base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("query", title), ("type", plex_type(kind))])
            .header("X-Plex-Token", token)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Plex search request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Plex search failed ({}): {}", status, body);
        }

        let body: PlexResponse = response
            .json()
            .await
            .context("failed to parse Plex search response")?;

        Ok(body.container)
    }
}

/// Web UI deep link for one library item.
fn web_link(base_url: &str, machine_identifier: Option<&str>, key: &str) -> Option<Url> {
    let mut link = Url::parse(&format!("{base_url}/web/index.html")).ok()?;
    let key: String = url::form_urlencoded::byte_serialize(key.as_bytes()).collect();
    let fragment = match machine_identifier {
        Some(machine) => format!("!/server/{machine}/details?key={key}"),
        None => format!("!/details?key={key}"),
    };
    link.set_fragment(Some(&fragment));
    Some(link)
}

#[async_trait]
impl AvailabilityProbe for PlexProbe {
    fn kind(&self) -> ServerKind {
        ServerKind::Plex
    }

    async fn settings(&self) -> Result<ServerSettings> {
        let plex = self.settings.plex();
        Ok(ServerSettings {
            enabled: plex.enabled && !plex.url.is_empty(),
            url: plex.url,
            token: plex.token,
        })
    }

    async fn lookup(
        &self,
        settings: &ServerSettings,
        item: &MediaItem,
        kind: MediaKind,
    ) -> Result<Availability> {
        let base_url = settings.base_url();

        let container = self
            .search(base_url, &settings.token, &item.title, kind)
            .await
            .map_err(|e| Error::probe_failure(ServerKind::Plex, format!("{e:#}")))?;

        let found = container.metadata.iter().find(|m| {
            is_match(
                item,
                &LibraryEntry {
                    title: &m.title,
                    year: m.year,
                    imdb_id: m.imdb_id(),
                },
            )
        });

        Ok(match found {
            Some(m) => Availability::available(web_link(
                base_url,
                container.machine_identifier.as_deref(),
                &m.key,
            )),
            None => Availability::unavailable(),
        })
    }
}
