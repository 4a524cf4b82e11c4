use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub popularity: Option<u32>,
}

/// Simplified artist object embedded in track payloads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRef {
    pub id: Option<String>,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// `None` for local files.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    #[serde(default)]
    pub popularity: Option<u32>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

impl Track {
    pub fn artist_names(&self) -> String {
        self.artists.iter().map(|artist| artist.name.as_str()).collect::<Vec<_>>().join(", ")
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistOwner {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub owner: Option<PlaylistOwner>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    ShortTerm,
    MediumTerm,
    LongTerm,
}

impl TimeRange {
    pub const ALL: [TimeRange; 3] = [Self::ShortTerm, Self::MediumTerm, Self::LongTerm];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ShortTerm => "short_term",
            Self::MediumTerm => "medium_term",
            Self::LongTerm => "long_term",
        }
    }
}

/// One result set per [`TimeRange`] horizon.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TopItems<T> {
    pub short_term: Vec<T>,
    pub medium_term: Vec<T>,
    pub long_term: Vec<T>,
}

impl<T> TopItems<T> {
    pub fn get(&self, range: TimeRange) -> &[T] {
        match range {
            TimeRange::ShortTerm => &self.short_term,
            TimeRange::MediumTerm => &self.medium_term,
            TimeRange::LongTerm => &self.long_term,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RelatedRecommendations {
    pub artist: Artist,
    pub tracks: Vec<Track>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Paging<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ArtistSearchResponse {
    pub artists: Paging<Artist>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TracksResponse {
    pub tracks: Vec<Track>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ArtistsResponse {
    pub artists: Vec<Artist>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenreSeedsResponse {
    pub genres: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::{ArtistSearchResponse, TimeRange, TopItems, Track};

    #[test]
    fn track_decodes_with_missing_optional_fields() {
        let track: Track = serde_json::from_str(
            r#"{"id": null, "name": "Local Demo", "artists": [{"id": null, "name": "Me"}]}"#,
        )
        .expect("track should decode");

        assert_eq!(track.id, None);
        assert_eq!(track.uri, "");
        assert_eq!(track.artist_names(), "Me");
    }

    #[test]
    fn search_response_ignores_unknown_fields() {
        let response: ArtistSearchResponse = serde_json::from_str(
            r#"{"artists": {"href": "x", "total": 1, "items": [
                {"id": "4Z8W4fKeB5YxbusRsdQVPb", "name": "Radiohead", "followers": {"total": 1}}
            ]}}"#,
        )
        .expect("search response should decode");

        assert_eq!(response.artists.items.len(), 1);
        assert_eq!(response.artists.items[0].name, "Radiohead");
        assert!(response.artists.next.is_none());
    }

    #[test]
    fn track_artist_names_are_comma_joined() {
        let track: Track = serde_json::from_str(
            r#"{"id": "t1", "name": "Duet", "artists": [
                {"id": "a1", "name": "First"}, {"id": "a2", "name": "Second"}
            ]}"#,
        )
        .expect("track should decode");

        assert_eq!(track.artist_names(), "First, Second");
    }

    #[test]
    fn time_ranges_cover_three_horizons_in_order() {
        let names: Vec<_> = TimeRange::ALL.iter().map(TimeRange::as_str).collect();
        assert_eq!(names, vec!["short_term", "medium_term", "long_term"]);
    }

    #[test]
    fn top_items_lookup_by_range() {
        let items = TopItems {
            short_term: vec![1],
            medium_term: vec![2, 3],
            long_term: Vec::new(),
        };

        assert_eq!(items.get(TimeRange::MediumTerm), &[2, 3]);
        assert!(items.get(TimeRange::LongTerm).is_empty());
    }
}
