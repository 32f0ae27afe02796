//! AnimeThemes lookup.
//!
//! Resolves a catalog entry to its opening themes by trying each title
//! variant against the AnimeThemes search endpoint. Every outcome that
//! completes, including "nothing found", is written to the [`ThemeCache`].

use std::sync::Arc;

use opdeck_core::{ThemeRecord, TitleVariants};
use serde::Deserialize;

use crate::cache::ThemeCache;
use crate::client::{HttpRequest, NetworkError, RateLimitedClient, Transport};
use crate::import::ThemeSource;

pub const DEFAULT_BASE_URL: &str = "https://api.animethemes.moe";

const INCLUDE: &str = "animethemes.song.artists,animethemes.animethemeentries.videos.audio";

// === API Response Types ===

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    anime: Option<Vec<ApiAnime>>,
}

#[derive(Debug, Deserialize)]
struct ApiAnime {
    #[serde(default)]
    animethemes: Option<Vec<ApiTheme>>,
}

#[derive(Debug, Deserialize)]
struct ApiTheme {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    sequence: Option<u32>,
    #[serde(default)]
    song: Option<ApiSong>,
    #[serde(default)]
    animethemeentries: Option<Vec<ApiThemeEntry>>,
}

#[derive(Debug, Deserialize)]
struct ApiSong {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    artists: Option<Vec<ApiArtist>>,
}

#[derive(Debug, Deserialize)]
struct ApiArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiThemeEntry {
    #[serde(default)]
    videos: Option<Vec<ApiVideo>>,
}

#[derive(Debug, Deserialize)]
struct ApiVideo {
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    audio: Option<ApiAudio>,
}

#[derive(Debug, Deserialize)]
struct ApiAudio {
    #[serde(default)]
    link: Option<String>,
}

impl ApiTheme {
    fn is_opening(&self) -> bool {
        self.kind
            .as_deref()
            .is_some_and(|k| k.eq_ignore_ascii_case("OP") || k.eq_ignore_ascii_case("opening"))
    }

    fn videos(&self) -> impl Iterator<Item = &ApiVideo> {
        self.animethemeentries
            .iter()
            .flatten()
            .flat_map(|entry| entry.videos.iter().flatten())
    }

    /// First video link across all entries, else the first audio link.
    fn preview_link(&self) -> Option<String> {
        self.videos()
            .find_map(|v| v.link.clone())
            .or_else(|| {
                self.videos()
                    .find_map(|v| v.audio.as_ref().and_then(|a| a.link.clone()))
            })
    }

    fn into_record(self) -> ThemeRecord {
        let media_url = self.preview_link();
        let (song_title, artists) = match self.song {
            Some(song) => (
                song.title.unwrap_or_default(),
                song.artists
                    .unwrap_or_default()
                    .into_iter()
                    .map(|a| a.name)
                    .collect(),
            ),
            None => (String::new(), Vec::new()),
        };
        ThemeRecord {
            sequence: self.sequence,
            song_title,
            artists,
            media_url,
        }
    }
}

/// Openings of the first anime record that has any.
fn first_openings(response: SearchResponse) -> Vec<ThemeRecord> {
    response
        .anime
        .unwrap_or_default()
        .into_iter()
        .map(|anime| {
            anime
                .animethemes
                .unwrap_or_default()
                .into_iter()
                .filter(ApiTheme::is_opening)
                .map(ApiTheme::into_record)
                .collect::<Vec<_>>()
        })
        .find(|openings| !openings.is_empty())
        .unwrap_or_default()
}

pub struct ThemeResolver<T> {
    client: Arc<RateLimitedClient<T>>,
    base_url: String,
}

impl<T: Transport> ThemeResolver<T> {
    pub fn new(client: Arc<RateLimitedClient<T>>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Opening themes for a show, from the cache when it has been looked up before.
    pub async fn resolve(
        &self,
        cache: &mut ThemeCache,
        catalog_id: i64,
        titles: &TitleVariants,
    ) -> Result<Vec<ThemeRecord>, NetworkError> {
        if let Some(cached) = cache.get(catalog_id) {
            tracing::debug!(catalog_id, count = cached.len(), "theme cache hit");
            return Ok(cached.to_vec());
        }

        let mut openings = Vec::new();
        for title in titles.ordered() {
            openings = self.lookup(title).await?;
            if !openings.is_empty() {
                tracing::debug!(catalog_id, title, count = openings.len(), "resolved openings");
                break;
            }
        }
        if openings.is_empty() {
            tracing::debug!(catalog_id, "no openings found for any title");
        }

        cache.insert(catalog_id, openings.clone());
        Ok(openings)
    }

    async fn lookup(&self, title: &str) -> Result<Vec<ThemeRecord>, NetworkError> {
        let url = self.search_url(title)?;
        let response: SearchResponse = self.client.request_json(&HttpRequest::get(url)).await?;
        Ok(first_openings(response))
    }

    fn search_url(&self, title: &str) -> Result<String, NetworkError> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/anime", self.base_url),
            &[("filter[name]", title), ("include", INCLUDE)],
        )
        .map_err(|e| NetworkError::InvalidUrl(e.to_string()))?;
        Ok(url.into())
    }
}

impl<T: Transport> ThemeSource for ThemeResolver<T> {
    async fn resolve(
        &self,
        cache: &mut ThemeCache,
        catalog_id: i64,
        titles: &TitleVariants,
    ) -> Result<Vec<ThemeRecord>, NetworkError> {
        ThemeResolver::resolve(self, cache, catalog_id, titles).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::{json_response, status_response, FakeTransport};
    use crate::client::RetryPolicy;
    use crate::db::{BlobStore, MemoryBlobStore};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::time::Duration;

    fn resolver(transport: FakeTransport) -> ThemeResolver<FakeTransport> {
        let policy = RetryPolicy {
            max_attempts: 1,
            jitter: Duration::ZERO,
            ..RetryPolicy::default()
        };
        ThemeResolver::new(
            Arc::new(RateLimitedClient::new(transport, policy)),
            "http://themes.test/",
        )
    }

    fn cache() -> ThemeCache {
        let store: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::new());
        ThemeCache::open(store).unwrap()
    }

    fn searched_name(request: &HttpRequest) -> String {
        let url = reqwest::Url::parse(&request.url).unwrap();
        url.query_pairs()
            .find(|(k, _)| k == "filter[name]")
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    fn anime_with(themes: serde_json::Value) -> String {
        json!({ "anime": [ { "name": "Show", "animethemes": themes } ] }).to_string()
    }

    fn opening(sequence: u32, title: &str) -> serde_json::Value {
        json!({
            "type": "OP",
            "sequence": sequence,
            "song": { "title": title, "artists": [ { "name": "LiSA" } ] },
            "animethemeentries": [
                { "videos": [ { "link": format!("https://v.test/OP{sequence}.webm"), "audio": { "link": "https://a.test/x.ogg" } } ] }
            ]
        })
    }

    fn titles() -> TitleVariants {
        TitleVariants::new(
            Some("Kimetsu no Yaiba".into()),
            Some("Demon Slayer".into()),
            Some("鬼滅の刃".into()),
        )
    }

    #[tokio::test]
    async fn cache_hit_makes_no_requests() {
        let mut cache = cache();
        let cached = ThemeRecord {
            sequence: Some(1),
            song_title: "Gurenge".into(),
            artists: vec!["LiSA".into()],
            media_url: None,
        };
        cache.insert(101, vec![cached.clone()]);
        let resolver = resolver(FakeTransport::new(|_| panic!("no request expected")));

        let themes = resolver.resolve(&mut cache, 101, &titles()).await.unwrap();
        assert_eq!(themes, vec![cached]);
        assert_eq!(resolver.client.transport().calls(), 0);
    }

    #[tokio::test]
    async fn cached_empty_result_makes_no_requests() {
        let mut cache = cache();
        cache.insert(5, Vec::new());
        let resolver = resolver(FakeTransport::new(|_| panic!("no request expected")));

        let themes = resolver.resolve(&mut cache, 5, &titles()).await.unwrap();
        assert!(themes.is_empty());
        assert_eq!(resolver.client.transport().calls(), 0);
    }

    #[tokio::test]
    async fn falls_through_title_variants_and_caches_the_hit() {
        let transport = FakeTransport::new(|request| match searched_name(request).as_str() {
            "Demon Slayer" => json_response(&anime_with(json!([opening(1, "Gurenge")]))),
            _ => json_response(r#"{"anime":[]}"#),
        });
        let resolver = resolver(transport);
        let mut cache = cache();

        let themes = resolver.resolve(&mut cache, 101, &titles()).await.unwrap();
        assert_eq!(themes.len(), 1);
        assert_eq!(themes[0].song_title, "Gurenge");
        assert_eq!(themes[0].artists, vec!["LiSA".to_string()]);
        assert_eq!(themes[0].media_url.as_deref(), Some("https://v.test/OP1.webm"));

        let names: Vec<String> = resolver
            .client
            .transport()
            .requests()
            .iter()
            .map(searched_name)
            .collect();
        assert_eq!(names, vec!["Kimetsu no Yaiba", "Demon Slayer"]);
        assert_eq!(cache.get(101), Some(themes.as_slice()));
    }

    #[tokio::test]
    async fn no_match_on_any_title_caches_empty() {
        let resolver = resolver(FakeTransport::new(|_| json_response(r#"{"anime":[]}"#)));
        let mut cache = cache();

        let themes = resolver.resolve(&mut cache, 9, &titles()).await.unwrap();
        assert!(themes.is_empty());
        assert_eq!(resolver.client.transport().calls(), 3);
        assert_eq!(cache.get(9), Some(&[][..]));
    }

    #[tokio::test]
    async fn request_includes_theme_relations() {
        let resolver = resolver(FakeTransport::new(|_| json_response(r#"{"anime":[]}"#)));
        let mut cache = cache();
        let only_romaji = TitleVariants::new(Some("Lycoris Recoil".into()), None, None);
        resolver.resolve(&mut cache, 3, &only_romaji).await.unwrap();

        let request = &resolver.client.transport().requests()[0];
        let url = reqwest::Url::parse(&request.url).unwrap();
        assert_eq!(url.path(), "/anime");
        let include = url.query_pairs().find(|(k, _)| k == "include").unwrap().1;
        assert_eq!(include, INCLUDE);
    }

    #[tokio::test]
    async fn only_openings_are_kept() {
        let ending = json!({
            "type": "ED",
            "sequence": 1,
            "song": { "title": "from the edge", "artists": [] },
            "animethemeentries": []
        });
        let body = anime_with(json!([opening(1, "Gurenge"), ending, opening(2, "Akeboshi")]));
        let resolver = resolver(FakeTransport::new(move |_| json_response(&body)));
        let mut cache = cache();

        let themes = resolver.resolve(&mut cache, 1, &titles()).await.unwrap();
        let songs: Vec<&str> = themes.iter().map(|t| t.song_title.as_str()).collect();
        assert_eq!(songs, vec!["Gurenge", "Akeboshi"]);
    }

    #[tokio::test]
    async fn first_anime_with_openings_wins() {
        let body = json!({
            "anime": [
                { "animethemes": [] },
                { "animethemes": [opening(1, "Second")] },
                { "animethemes": [opening(1, "Third")] }
            ]
        })
        .to_string();
        let resolver = resolver(FakeTransport::new(move |_| json_response(&body)));
        let themes = resolver.resolve(&mut cache(), 1, &titles()).await.unwrap();
        assert_eq!(themes.len(), 1);
        assert_eq!(themes[0].song_title, "Second");
    }

    #[tokio::test]
    async fn audio_link_is_the_preview_fallback() {
        let theme = json!({
            "type": "OP",
            "sequence": null,
            "song": null,
            "animethemeentries": [
                { "videos": [ { "link": null, "audio": { "link": "https://a.test/op.ogg" } } ] }
            ]
        });
        let body = anime_with(json!([theme]));
        let resolver = resolver(FakeTransport::new(move |_| json_response(&body)));

        let themes = resolver.resolve(&mut cache(), 1, &titles()).await.unwrap();
        assert_eq!(themes[0].media_url.as_deref(), Some("https://a.test/op.ogg"));
        assert_eq!(themes[0].song_title, "");
        assert_eq!(themes[0].sequence_number(), 1);
    }

    #[tokio::test]
    async fn failed_lookup_is_not_cached() {
        let resolver = resolver(FakeTransport::new(|_| Ok(status_response(404, "not found"))));
        let mut cache = cache();

        let err = resolver.resolve(&mut cache, 1, &titles()).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert!(!cache.contains(1));
    }
}
