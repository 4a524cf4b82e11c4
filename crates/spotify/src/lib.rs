//! Spotify Web API client
//!
//! Thin wrapper over the search, recommendation, artist and "top items"
//! endpoints used by tunelink. Every call authenticates with a cached OAuth
//! access token (`auth`) and decodes into the records in `model`.
//!
//! Upstream failures are not retried; they surface as [`SpotifyError`].

pub mod auth;
pub mod client;
pub mod error;
pub mod model;

pub use client::{SpotifyClient, TOP_ITEMS_LIMIT};
pub use error::SpotifyError;
pub use model::{Artist, ArtistRef, Playlist, RelatedRecommendations, TimeRange, TopItems, Track};
