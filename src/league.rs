use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum League {
    PremierLeague,
    LaLiga,
}

/// Everything that differs between league screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeagueProfile {
    pub league: League,
    pub slug: &'static str,
    pub display_name: &'static str,
    pub tagline: &'static str,
    pub accent: (u8, u8, u8),
}

const PREMIER_LEAGUE: LeagueProfile = LeagueProfile {
    league: League::PremierLeague,
    slug: "epl",
    display_name: "English Premier League",
    tagline: "Explore upcoming fixtures, predictions, and results.",
    accent: (0x7c, 0x3a, 0xed),
};

const LA_LIGA: LeagueProfile = LeagueProfile {
    league: League::LaLiga,
    slug: "laliga",
    display_name: "La Liga",
    tagline: "Dive into Spanish football predictions and stats.",
    accent: (0xe3, 0x06, 0x13),
};

impl League {
    pub const ALL: [League; 2] = [League::PremierLeague, League::LaLiga];

    pub fn profile(self) -> &'static LeagueProfile {
        match self {
            League::PremierLeague => &PREMIER_LEAGUE,
            League::LaLiga => &LA_LIGA,
        }
    }

    pub fn slug(self) -> &'static str {
        self.profile().slug
    }

    pub fn from_slug(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "epl" | "pl" | "premier" | "premierleague" | "premier-league" => {
                Some(League::PremierLeague)
            }
            "laliga" | "la-liga" | "liga" | "primera" => Some(League::LaLiga),
            _ => None,
        }
    }

    pub fn other(self) -> Self {
        match self {
            League::PremierLeague => League::LaLiga,
            League::LaLiga => League::PremierLeague,
        }
    }
}

impl fmt::Display for League {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.profile().display_name)
    }
}
