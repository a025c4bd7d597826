use crate::model::{League, SeasonDescriptor, SeasonType};

/// How a stats table reveals rows past the first screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expansion {
    /// A page-index control listing page numbers, and a next-page control.
    Pager {
        index: &'static str,
        next: &'static str,
    },
    /// A button that appends rows to the same table.
    LoadMore { control: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLayout {
    pub header_cells: &'static str,
    pub rows: &'static str,
    pub cells: &'static str,
    pub link: &'static str,
    pub expansion: Expansion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BioLayout {
    /// nhl.com: `Name | #87` headline, pipe-separated vitals, bio items.
    Vitals {
        headline: &'static str,
        vitals: &'static str,
        items: &'static str,
    },
    /// HockeyTech profile: separate name/number/position, `Label: value` items.
    Profile {
        name: &'static str,
        number: &'static str,
        position: &'static str,
        items: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonSelector {
    pub menu: &'static str,
    pub options: &'static str,
    pub locator_attr: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct Site {
    pub league: League,
    pub base_url: &'static str,
    pub table: TableLayout,
    pub bio: BioLayout,
    /// `None` for sites whose seasons are addressed by year.
    pub seasons: Option<SeasonSelector>,
}

const NHL_TABLE: TableLayout = TableLayout {
    header_cells: ".stats-table thead th",
    rows: ".stats-table tbody tr.standard-row",
    cells: "td",
    link: "a",
    expansion: Expansion::Pager {
        index: ".pager-select",
        next: ".pager-next",
    },
};

const CHL_TABLE: TableLayout = TableLayout {
    header_cells: ".table-view table thead th",
    rows: ".table-view table tr",
    cells: "td",
    link: "a",
    expansion: Expansion::LoadMore {
        control: ".table-view__load-more",
    },
};

const CHL_BIO: BioLayout = BioLayout::Profile {
    name: ".player-profile-primary .player-profile-info__full-name",
    number: ".player-profile-primary .player-profile-info__number",
    position: ".player-profile-primary .player-profile-info__position",
    items: ".player-profile-secondary .player-profile-info",
};

const CHL_SEASONS: SeasonSelector = SeasonSelector {
    menu: ".full-scores__dropdown--season-select",
    options: ".filter-group__dropdown-option",
    locator_attr: "data-reactid",
};

impl Site {
    pub fn for_league(league: League) -> Site {
        let chl = |base_url| Site {
            league,
            base_url,
            table: CHL_TABLE,
            bio: CHL_BIO,
            seasons: Some(CHL_SEASONS),
        };
        match league {
            League::Nhl => Site {
                league,
                base_url: "https://www.nhl.com",
                table: NHL_TABLE,
                bio: BioLayout::Vitals {
                    headline: ".player-jumbotron-vitals__name-num",
                    vitals: ".player-jumbotron-vitals__attributes",
                    items: ".player-bio__item",
                },
                seasons: None,
            },
            League::Ohl => chl("https://ontariohockeyleague.com"),
            League::Whl => chl("https://whl.ca"),
            League::Qmjhl => chl("https://theqmjhl.ca"),
        }
    }

    /// Page listing every season in the selector.
    pub fn season_index_url(&self) -> String {
        format!("{}/stats/players/", self.base_url)
    }

    pub fn season_url(&self, descriptor: &SeasonDescriptor, season_type: SeasonType) -> String {
        match self.league {
            League::Nhl => format!(
                "{}/stats/player?aggregate=0&gameType={}&report=skatersummary&pos=S\
                 &reportType=season&seasonFrom={}&seasonTo={}\
                 &filter=gamesPlayed,gte,1&sort=points,goals,gamesPlayed",
                self.base_url,
                season_type.code(),
                descriptor.locator,
                descriptor.locator
            ),
            _ => format!("{}/stats/players/{}", self.base_url, descriptor.locator),
        }
    }

    pub fn player_url(&self, player_id: &str) -> String {
        match self.league {
            League::Nhl => format!("{}/player/{}", self.base_url, player_id),
            _ => format!("{}/players/{}", self.base_url, player_id),
        }
    }
}

/// NHL seasons are addressed by year pair: 1999 → `19992000`.
pub fn year_range_seasons(from: i32, to: i32) -> Vec<SeasonDescriptor> {
    (from..=to)
        .map(|y| {
            let label = format!("{}{}", y, y + 1);
            SeasonDescriptor {
                name: label.clone(),
                locator: label,
            }
        })
        .collect()
}

/// The selector option's `data-reactid` ends in `$<season id>`.
pub fn locator_from_reactid(reactid: &str) -> Option<String> {
    reactid
        .split('$')
        .nth(1)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
