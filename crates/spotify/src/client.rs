use reqwest::{Client, RequestBuilder};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use tunelink_core::config::SpotifyConfig;

use crate::auth::TokenProvider;
use crate::error::SpotifyError;
use crate::model::{
    Artist, ArtistSearchResponse, ArtistsResponse, GenreSeedsResponse, Paging, Playlist,
    RelatedRecommendations, TimeRange, TopItems, Track, TracksResponse,
};

/// Items requested per horizon for top artists and top tracks.
pub const TOP_ITEMS_LIMIT: usize = 10;
const PLAYLIST_PAGE_SIZE: &str = "50";

pub struct SpotifyClient {
    http: Client,
    api_base_url: String,
    market: String,
    tokens: TokenProvider,
}

impl SpotifyClient {
    pub fn new(config: &SpotifyConfig) -> Self {
        let http = Client::new();
        Self {
            tokens: TokenProvider::new(http.clone(), config),
            http,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            market: config.market.clone(),
        }
    }

    /// Best match for an artist-type search, in the service's own ranking.
    pub async fn search_artist(&self, name: &str) -> Result<Option<Artist>, SpotifyError> {
        let response: ArtistSearchResponse = self
            .get_json(
                "search",
                &[("q", format!("artist:{name}")), ("type", "artist".to_string())],
            )
            .await?;

        let artist = response.artists.items.into_iter().next();
        debug!(
            event_name = "egress.spotify.artist_search",
            query = name,
            found = artist.is_some(),
            "artist search completed"
        );
        Ok(artist)
    }

    pub async fn artist_recommendations(
        &self,
        artist: &Artist,
    ) -> Result<Vec<Track>, SpotifyError> {
        let response: TracksResponse = self
            .get_json("recommendations", &[("seed_artists", artist.id.clone())])
            .await?;
        Ok(response.tracks)
    }

    /// Resolves `name`, then collects recommendations seeded by each of its
    /// related artists. `None` when the artist cannot be found.
    pub async fn related_artist_recommendations(
        &self,
        name: &str,
    ) -> Result<Option<Vec<RelatedRecommendations>>, SpotifyError> {
        let Some(artist) = self.search_artist(name).await? else {
            return Ok(None);
        };

        let related: ArtistsResponse =
            self.get_json(&format!("artists/{}/related-artists", artist.id), &[]).await?;
        info!(
            event_name = "egress.spotify.related_artists",
            artist_id = %artist.id,
            related_count = related.artists.len(),
            "resolved related artists"
        );

        let mut recommendations = Vec::with_capacity(related.artists.len());
        for related_artist in related.artists {
            let tracks = self.artist_recommendations(&related_artist).await?;
            recommendations.push(RelatedRecommendations { artist: related_artist, tracks });
        }
        Ok(Some(recommendations))
    }

    pub async fn artist_top_tracks(&self, name: &str) -> Result<Option<Vec<Track>>, SpotifyError> {
        let Some(artist) = self.search_artist(name).await? else {
            return Ok(None);
        };

        let response: TracksResponse = self
            .get_json(
                &format!("artists/{}/top-tracks", artist.id),
                &[("market", self.market.clone())],
            )
            .await?;
        Ok(Some(response.tracks))
    }

    /// First of the caller's playlists whose name contains `query`,
    /// ignoring case. Walks every page.
    pub async fn find_playlist(&self, query: &str) -> Result<Option<Playlist>, SpotifyError> {
        let needle = query.to_lowercase();
        let mut page: Paging<Playlist> =
            self.get_json("me/playlists", &[("limit", PLAYLIST_PAGE_SIZE.to_string())]).await?;

        loop {
            if let Some(playlist) =
                page.items.into_iter().find(|playlist| playlist.name.to_lowercase().contains(&needle))
            {
                return Ok(Some(playlist));
            }
            let Some(next) = page.next else {
                return Ok(None);
            };
            page = self.fetch("me/playlists", self.http.get(next)).await?;
        }
    }

    pub async fn genre_seeds(&self) -> Result<Vec<String>, SpotifyError> {
        let response: GenreSeedsResponse =
            self.get_json("recommendations/available-genre-seeds", &[]).await?;
        Ok(response.genres)
    }

    pub async fn genre_recommendations(&self, genre: &str) -> Result<Vec<Track>, SpotifyError> {
        let response: TracksResponse =
            self.get_json("recommendations", &[("seed_genres", genre.to_string())]).await?;
        Ok(response.tracks)
    }

    pub async fn top_artists(&self) -> Result<TopItems<Artist>, SpotifyError> {
        self.top_items("artists").await
    }

    pub async fn top_tracks(&self) -> Result<TopItems<Track>, SpotifyError> {
        self.top_items("tracks").await
    }

    async fn top_items<T>(&self, kind: &str) -> Result<TopItems<T>, SpotifyError>
    where
        T: DeserializeOwned,
    {
        let endpoint = format!("me/top/{kind}");
        let short_term = self.top_items_for(&endpoint, TimeRange::ShortTerm).await?;
        let medium_term = self.top_items_for(&endpoint, TimeRange::MediumTerm).await?;
        let long_term = self.top_items_for(&endpoint, TimeRange::LongTerm).await?;
        Ok(TopItems { short_term, medium_term, long_term })
    }

    async fn top_items_for<T>(&self, endpoint: &str, range: TimeRange) -> Result<Vec<T>, SpotifyError>
    where
        T: DeserializeOwned,
    {
        let page: Paging<T> = self
            .get_json(
                endpoint,
                &[
                    ("time_range", range.as_str().to_string()),
                    ("limit", TOP_ITEMS_LIMIT.to_string()),
                ],
            )
            .await?;
        let mut items = page.items;
        items.truncate(TOP_ITEMS_LIMIT);
        Ok(items)
    }

    async fn get_json<T>(&self, endpoint: &str, query: &[(&str, String)]) -> Result<T, SpotifyError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}/v1/{endpoint}", self.api_base_url);
        self.fetch(endpoint, self.http.get(url).query(query)).await
    }

    async fn fetch<T>(&self, endpoint: &str, request: RequestBuilder) -> Result<T, SpotifyError>
    where
        T: DeserializeOwned,
    {
        let token = self.tokens.access_token().await?;
        debug!(event_name = "egress.spotify.request", endpoint, "issuing spotify request");

        let response = request
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(|source| SpotifyError::Transport { endpoint: endpoint.to_string(), source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpotifyError::Status { endpoint: endpoint.to_string(), status, body });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| SpotifyError::Decode { endpoint: endpoint.to_string(), source })
    }
}
