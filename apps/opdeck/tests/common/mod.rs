//! Shared fixtures for integration tests.
//!
//! `FakeServices` answers both the AniList GraphQL endpoint and the
//! AnimeThemes search endpoint from in-memory tables, so the real fetcher,
//! resolver and coordinator run end to end without a network.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};

use opdeck::anilist::AniListFetcher;
use opdeck::client::{HttpRequest, HttpResponse, NetworkError, RateLimitedClient, RetryPolicy, Transport};
use opdeck::import::ImportCoordinator;
use opdeck::themes::ThemeResolver;

pub const ANILIST_URL: &str = "http://anilist.test/graphql";
pub const THEMES_URL: &str = "http://themes.test";
pub const PAGE_SIZE: u32 = 2;

#[derive(Default)]
pub struct FakeServices {
    /// (catalog id, romaji title, english title)
    pub catalog: Vec<(i64, String, Option<String>)>,
    /// Title → opening song titles, in sequence order.
    pub openings: HashMap<String, Vec<String>>,
    /// Titles answered with 404.
    pub missing: HashSet<String>,
    /// Titles answered with one 429 before succeeding.
    pub throttled: Mutex<HashSet<String>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakeServices {
    pub fn show(mut self, id: i64, romaji: &str, english: Option<&str>) -> Self {
        self.catalog
            .push((id, romaji.to_string(), english.map(str::to_string)));
        self
    }

    pub fn openings(mut self, title: &str, songs: &[&str]) -> Self {
        self.openings
            .insert(title.to_string(), songs.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn missing(mut self, title: &str) -> Self {
        self.missing.insert(title.to_string());
        self
    }

    pub fn throttle_once(self, title: &str) -> Self {
        self.throttled.lock().unwrap().insert(title.to_string());
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Theme lookups issued so far, by searched title.
    pub fn theme_lookups(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter(|r| r.url.starts_with(THEMES_URL))
            .map(|r| searched_name(&r.url))
            .collect()
    }

    fn list_page(&self, request: &HttpRequest) -> HttpResponse {
        let page = request
            .body
            .as_ref()
            .and_then(|b| b["variables"]["page"].as_u64())
            .unwrap_or(1) as usize;
        let per_page = PAGE_SIZE as usize;
        let start = (page - 1) * per_page;
        let items: Vec<Value> = self
            .catalog
            .iter()
            .skip(start)
            .take(per_page)
            .map(|(id, romaji, english)| {
                json!({
                    "media": {
                        "id": id,
                        "season": "FALL",
                        "seasonYear": 2020,
                        "title": { "romaji": romaji, "english": english, "native": null }
                    }
                })
            })
            .collect();
        let has_next = start + per_page < self.catalog.len();
        ok(json!({
            "data": {
                "Page": {
                    "pageInfo": { "hasNextPage": has_next },
                    "mediaList": items
                }
            }
        }))
    }

    fn theme_search(&self, request: &HttpRequest) -> HttpResponse {
        let name = searched_name(&request.url);
        if self.throttled.lock().unwrap().remove(&name) {
            return HttpResponse {
                status: 429,
                retry_after: Some("2".to_string()),
                body: "slow down".to_string(),
            };
        }
        if self.missing.contains(&name) {
            return HttpResponse {
                status: 404,
                retry_after: None,
                body: "not found".to_string(),
            };
        }
        let anime: Vec<Value> = match self.openings.get(&name) {
            Some(songs) => vec![json!({
                "name": name,
                "animethemes": songs
                    .iter()
                    .enumerate()
                    .map(|(i, song)| theme(i as u32 + 1, song))
                    .collect::<Vec<_>>()
            })],
            None => Vec::new(),
        };
        ok(json!({ "anime": anime }))
    }
}

impl Transport for FakeServices {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, NetworkError> {
        self.requests.lock().unwrap().push(request.clone());
        if request.url.starts_with(ANILIST_URL) {
            Ok(self.list_page(request))
        } else {
            Ok(self.theme_search(request))
        }
    }
}

/// Lets several components share one fake while tests keep a handle to it.
#[derive(Clone)]
pub struct Shared(pub Arc<FakeServices>);

impl Transport for Shared {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, NetworkError> {
        self.0.execute(request).await
    }
}

pub type TestCoordinator = ImportCoordinator<AniListFetcher<Shared>, ThemeResolver<Shared>>;

pub fn coordinator(services: &Arc<FakeServices>) -> TestCoordinator {
    let policy = RetryPolicy {
        max_attempts: 3,
        jitter: Duration::ZERO,
        ..RetryPolicy::default()
    };
    let client = Arc::new(RateLimitedClient::new(Shared(services.clone()), policy));
    ImportCoordinator::new(
        AniListFetcher::new(client.clone(), ANILIST_URL).with_page_size(PAGE_SIZE),
        ThemeResolver::new(client, THEMES_URL),
    )
}

fn theme(sequence: u32, song: &str) -> Value {
    json!({
        "type": "OP",
        "sequence": sequence,
        "song": { "title": song, "artists": [ { "name": "Artist" } ] },
        "animethemeentries": [
            { "videos": [ { "link": format!("https://v.test/{song}.webm") } ] }
        ]
    })
}

fn ok(body: Value) -> HttpResponse {
    HttpResponse {
        status: 200,
        retry_after: None,
        body: body.to_string(),
    }
}

pub fn searched_name(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.query_pairs()
                .find(|(k, _)| k == "filter[name]")
                .map(|(_, v)| v.into_owned())
        })
        .unwrap_or_default()
}
