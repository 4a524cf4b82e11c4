/// Substring that summons the options menu.
pub const MENU_TRIGGER: &str = "yo!";

const MENU_HEADER: &str = "Please choose one of the below options:";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuOption {
    ArtistRecommendations,
    RelatedArtistRecommendations,
    ArtistTopTracks,
    GenreRecommendations,
    MyTopArtists,
    MyTopTracks,
}

impl MenuOption {
    pub const ALL: [MenuOption; 6] = [
        Self::ArtistRecommendations,
        Self::RelatedArtistRecommendations,
        Self::ArtistTopTracks,
        Self::GenreRecommendations,
        Self::MyTopArtists,
        Self::MyTopTracks,
    ];

    pub fn number(&self) -> usize {
        match self {
            Self::ArtistRecommendations => 1,
            Self::RelatedArtistRecommendations => 2,
            Self::ArtistTopTracks => 3,
            Self::GenreRecommendations => 4,
            Self::MyTopArtists => 5,
            Self::MyTopTracks => 6,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ArtistRecommendations => "Get song recommendations for an artist",
            Self::RelatedArtistRecommendations => "Get song recommendations for similar artists",
            Self::ArtistTopTracks => "Get top songs for an artist",
            Self::GenreRecommendations => "Get song recommendations for a genre",
            Self::MyTopArtists => "Get my top 10 artists",
            Self::MyTopTracks => "Get my top 10 songs",
        }
    }
}

/// Commands recognized in channel messages.
///
/// Only the menu is wired; choosing one of its options is not handled yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Menu,
}

impl Command {
    pub fn parse(text: &str) -> Option<Self> {
        text.contains(MENU_TRIGGER).then_some(Self::Menu)
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Menu => "menu",
        }
    }

    pub fn reply_text(&self) -> String {
        match self {
            Self::Menu => menu_text(),
        }
    }
}

pub fn menu_text() -> String {
    let mut lines = vec![MENU_HEADER.to_string()];
    lines.extend(
        MenuOption::ALL.iter().map(|option| format!("{}) {}", option.number(), option.label())),
    );
    lines.join("\n")
}
