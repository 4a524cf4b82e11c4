pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use commands::music::MusicQuery;

#[derive(Debug, Parser)]
#[command(
    name = "tunelink",
    about = "Tunelink operator CLI",
    long_about = "Inspect Tunelink configuration and call the Spotify and Slack clients directly.",
    after_help = "Examples:\n  tunelink doctor --json\n  tunelink artist \"Nina Simone\"\n  tunelink send C0123456 \"yo!\""
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Inspect effective configuration values with source attribution and redaction")]
    Config,
    #[command(about = "Validate config and check Spotify and Slack credentials")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Search for an artist by name")]
    Artist { name: String },
    #[command(about = "Recommend tracks seeded by an artist")]
    ArtistRecs { name: String },
    #[command(about = "Recommend tracks for each artist related to the named artist")]
    RelatedRecs { name: String },
    #[command(about = "List an artist's top tracks in the configured market")]
    TopTracks { name: String },
    #[command(about = "Find one of the authorized user's playlists by name")]
    Playlist { query: String },
    #[command(about = "List the genres available as recommendation seeds")]
    Genres,
    #[command(about = "Recommend tracks seeded by a genre")]
    GenreRecs { genre: String },
    #[command(about = "Show the authorized user's top artists for every time range")]
    MyTopArtists,
    #[command(about = "Show the authorized user's top tracks for every time range")]
    MyTopTracks,
    #[command(about = "List the Slack channels visible to the bot")]
    Channels,
    #[command(about = "Post a message to a Slack channel")]
    Send { channel: String, text: String },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => commands::config::run(),
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Artist { name } => commands::music::run(MusicQuery::Artist { name }),
        Command::ArtistRecs { name } => commands::music::run(MusicQuery::ArtistRecs { name }),
        Command::RelatedRecs { name } => commands::music::run(MusicQuery::RelatedRecs { name }),
        Command::TopTracks { name } => commands::music::run(MusicQuery::TopTracks { name }),
        Command::Playlist { query } => commands::music::run(MusicQuery::Playlist { query }),
        Command::Genres => commands::music::run(MusicQuery::Genres),
        Command::GenreRecs { genre } => commands::music::run(MusicQuery::GenreRecs { genre }),
        Command::MyTopArtists => commands::music::run(MusicQuery::MyTopArtists),
        Command::MyTopTracks => commands::music::run(MusicQuery::MyTopTracks),
        Command::Channels => commands::chat::channels(),
        Command::Send { channel, text } => commands::chat::send(&channel, &text),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
