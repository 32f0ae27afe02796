//! AniList list fetcher.
//!
//! Walks the user's anime lists one GraphQL `Page` at a time until the
//! service stops reporting `hasNextPage`.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use opdeck_core::{CatalogEntry, Season, TitleVariants};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::client::{HttpRequest, NetworkError, RateLimitedClient, Transport};
use crate::import::CatalogSource;

pub const DEFAULT_ENDPOINT: &str = "https://graphql.anilist.co";
pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(300);

const MEDIA_LIST_QUERY: &str = r#"
query ($userId: Int, $userName: String, $page: Int, $perPage: Int) {
  Page(page: $page, perPage: $perPage) {
    pageInfo { hasNextPage }
    mediaList(userId: $userId, userName: $userName, type: ANIME) {
      media {
        id
        season
        seasonYear
        title { romaji english native }
      }
    }
  }
}
"#;

/// AniList user, by numeric id or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserRef {
    Id(i64),
    Name(String),
}

impl UserRef {
    /// All-digit input is an id; anything else non-blank is a user name.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        if input.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(id) = input.parse() {
                return Some(Self::Id(id));
            }
        }
        Some(Self::Name(input.to_string()))
    }

    fn variables(&self, page: u32, per_page: u32) -> Value {
        match self {
            Self::Id(id) => json!({ "userId": id, "page": page, "perPage": per_page }),
            Self::Name(name) => json!({ "userName": name, "page": page, "perPage": per_page }),
        }
    }
}

impl fmt::Display for UserRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "#{id}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

// === API Response Types ===

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<PageData>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct PageData {
    #[serde(rename = "Page")]
    page: Option<ApiPage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPage {
    page_info: Option<PageInfo>,
    media_list: Option<Vec<ApiMediaListEntry>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ApiMediaListEntry {
    media: Option<ApiMedia>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiMedia {
    id: i64,
    title: Option<ApiTitle>,
    season: Option<Season>,
    season_year: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct ApiTitle {
    romaji: Option<String>,
    english: Option<String>,
    native: Option<String>,
}

impl From<ApiMedia> for CatalogEntry {
    fn from(media: ApiMedia) -> Self {
        let titles = match media.title {
            Some(t) => TitleVariants::new(t.romaji, t.english, t.native),
            None => TitleVariants::default(),
        };
        CatalogEntry {
            catalog_id: media.id,
            titles,
            season: media.season,
            year: media.season_year,
        }
    }
}

struct PageResult {
    entries: Vec<CatalogEntry>,
    has_next_page: bool,
}

/// Paginating AniList client.
pub struct AniListFetcher<T> {
    client: Arc<RateLimitedClient<T>>,
    endpoint: String,
    page_size: u32,
    page_delay: Duration,
}

impl<T: Transport> AniListFetcher<T> {
    pub fn new(client: Arc<RateLimitedClient<T>>, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            page_size: DEFAULT_PAGE_SIZE,
            page_delay: DEFAULT_PAGE_DELAY,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Every anime on the user's lists, in list order, one entry per show.
    pub async fn fetch_all(&self, user: &UserRef) -> Result<Vec<CatalogEntry>, NetworkError> {
        let mut entries = Vec::new();
        let mut seen = HashSet::new();
        let mut page = 1;

        loop {
            let result = self.fetch_page(user, page).await?;
            tracing::debug!(user = %user, page, count = result.entries.len(), "fetched list page");

            for entry in result.entries {
                if seen.insert(entry.catalog_id) {
                    entries.push(entry);
                }
            }

            if !result.has_next_page {
                break;
            }
            page += 1;
            tokio::time::sleep(self.page_delay).await;
        }

        tracing::info!(user = %user, pages = page, count = entries.len(), "fetched catalog");
        Ok(entries)
    }

    async fn fetch_page(&self, user: &UserRef, page: u32) -> Result<PageResult, NetworkError> {
        let request = HttpRequest::post_json(
            self.endpoint.as_str(),
            json!({
                "query": MEDIA_LIST_QUERY,
                "variables": user.variables(page, self.page_size),
            }),
        );
        let response: GraphQlResponse = self.client.request_json(&request).await?;

        let page = match response.data.and_then(|d| d.page) {
            Some(page) => page,
            None => {
                let messages: Vec<String> = response
                    .errors
                    .unwrap_or_default()
                    .into_iter()
                    .map(|e| e.message)
                    .collect();
                return Err(if messages.is_empty() {
                    NetworkError::Decode("response has no Page".to_string())
                } else {
                    NetworkError::Remote(messages.join("; "))
                });
            }
        };

        let entries = page
            .media_list
            .unwrap_or_default()
            .into_iter()
            .filter_map(|item| item.media)
            .map(CatalogEntry::from)
            .collect();
        let has_next_page = page
            .page_info
            .and_then(|info| info.has_next_page)
            .unwrap_or(false);

        Ok(PageResult {
            entries,
            has_next_page,
        })
    }
}

impl<T: Transport> CatalogSource for AniListFetcher<T> {
    async fn fetch_all(&self, user: &UserRef) -> Result<Vec<CatalogEntry>, NetworkError> {
        AniListFetcher::fetch_all(self, user).await
    }
}
