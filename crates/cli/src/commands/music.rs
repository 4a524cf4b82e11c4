use serde::Serialize;
use serde_json::{json, Value};
use tunelink_core::config::AppConfig;
use tunelink_spotify::{SpotifyClient, SpotifyError};

use super::{load_config, runtime, CommandResult, EXIT_CONFIG, EXIT_UPSTREAM};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MusicQuery {
    Artist { name: String },
    ArtistRecs { name: String },
    RelatedRecs { name: String },
    TopTracks { name: String },
    Playlist { query: String },
    Genres,
    GenreRecs { genre: String },
    MyTopArtists,
    MyTopTracks,
}

impl MusicQuery {
    pub fn command_name(&self) -> &'static str {
        match self {
            Self::Artist { .. } => "artist",
            Self::ArtistRecs { .. } => "artist-recs",
            Self::RelatedRecs { .. } => "related-recs",
            Self::TopTracks { .. } => "top-tracks",
            Self::Playlist { .. } => "playlist",
            Self::Genres => "genres",
            Self::GenreRecs { .. } => "genre-recs",
            Self::MyTopArtists => "my-top-artists",
            Self::MyTopTracks => "my-top-tracks",
        }
    }

    fn needs_user_token(&self) -> bool {
        matches!(self, Self::Playlist { .. } | Self::MyTopArtists | Self::MyTopTracks)
    }
}

struct QueryOutcome {
    message: String,
    data: Value,
}

pub fn run(query: MusicQuery) -> CommandResult {
    match load_config(query.command_name()) {
        Ok(config) => run_with_config(&query, &config),
        Err(result) => result,
    }
}

pub fn run_with_config(query: &MusicQuery, config: &AppConfig) -> CommandResult {
    let command = query.command_name();

    if query.needs_user_token() && config.spotify.refresh_token.is_none() {
        return CommandResult::failure(
            command,
            "config_validation",
            format!(
                "`{command}` reads user data; set spotify.refresh_token or TUNELINK_SPOTIFY_REFRESH_TOKEN"
            ),
            EXIT_CONFIG,
        );
    }

    let runtime = match runtime(command) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let client = SpotifyClient::new(&config.spotify);
    match runtime.block_on(execute(&client, query)) {
        Ok(outcome) => CommandResult::success_with_data(command, outcome.message, outcome.data),
        Err(error) => CommandResult::failure(command, "upstream_api", error.to_string(), EXIT_UPSTREAM),
    }
}

async fn execute(client: &SpotifyClient, query: &MusicQuery) -> Result<QueryOutcome, SpotifyError> {
    let outcome = match query {
        MusicQuery::Artist { name } => match client.search_artist(name).await? {
            Some(artist) => found(format!("found artist `{}`", artist.name), &artist),
            None => not_found(format!("no artist matched `{name}`")),
        },
        MusicQuery::ArtistRecs { name } => match client.search_artist(name).await? {
            Some(artist) => {
                let tracks = client.artist_recommendations(&artist).await?;
                found(format!("{} tracks seeded by `{}`", tracks.len(), artist.name), &tracks)
            }
            None => not_found(format!("no artist matched `{name}`")),
        },
        MusicQuery::RelatedRecs { name } => {
            match client.related_artist_recommendations(name).await? {
                Some(groups) => {
                    found(format!("recommendations for {} related artists", groups.len()), &groups)
                }
                None => not_found(format!("no artist matched `{name}`")),
            }
        }
        MusicQuery::TopTracks { name } => match client.artist_top_tracks(name).await? {
            Some(tracks) => found(format!("{} top tracks for `{name}`", tracks.len()), &tracks),
            None => not_found(format!("no artist matched `{name}`")),
        },
        MusicQuery::Playlist { query } => match client.find_playlist(query).await? {
            Some(playlist) => found(format!("found playlist `{}`", playlist.name), &playlist),
            None => not_found(format!("no playlist matched `{query}`")),
        },
        MusicQuery::Genres => {
            let genres = client.genre_seeds().await?;
            found(format!("{} genre seeds available", genres.len()), &genres)
        }
        MusicQuery::GenreRecs { genre } => {
            let tracks = client.genre_recommendations(genre).await?;
            found(format!("{} tracks seeded by genre `{genre}`", tracks.len()), &tracks)
        }
        MusicQuery::MyTopArtists => {
            let top = client.top_artists().await?;
            found("top artists for every time range".to_string(), &top)
        }
        MusicQuery::MyTopTracks => {
            let top = client.top_tracks().await?;
            found("top tracks for every time range".to_string(), &top)
        }
    };

    Ok(outcome)
}

fn found<T: Serialize>(message: String, data: &T) -> QueryOutcome {
    QueryOutcome { message, data: serde_json::to_value(data).unwrap_or(Value::Null) }
}

fn not_found(message: String) -> QueryOutcome {
    QueryOutcome { message, data: json!(null) }
}
