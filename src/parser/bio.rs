use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::{Result, ScrapeError};
use crate::model::{Birthplace, Draft, DraftKind, League, PlayerBiography};

use super::coerce;

static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());
static ROUND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\d+(?:st|nd|rd|th)\s+(?:rd|round)\b|\b(?:round|rd\.?)\s*\d+").unwrap()
});
static OVERALL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)#\s*\d+|\b\d+(?:st|nd|rd|th)?\s+overall").unwrap());
// "2005 PIT, 1st rd" and "Sarnia Sting (2015) Round 1"
static TEAM_AFTER_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}\s+([A-Za-z][A-Za-z .'-]*?)\s*,").unwrap());
static TEAM_BEFORE_YEAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Za-z][A-Za-z .'-]*?)\s*\(\s*(?:19|20)\d{2}\s*\)").unwrap()
});

const POSITIONS: &[&str] = &["C", "D", "LW", "RW", "G", "F"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BioLabel {
    BirthDate,
    Birthplace,
    Shoots,
    Height,
    Weight,
    Position,
    Number,
    Draft,
}

const BIO_LABELS: &[(&str, BioLabel)] = &[
    ("Born", BioLabel::BirthDate),
    ("Birthdate", BioLabel::BirthDate),
    ("Birth Date", BioLabel::BirthDate),
    ("Birthplace", BioLabel::Birthplace),
    ("Hometown", BioLabel::Birthplace),
    ("Shoots", BioLabel::Shoots),
    ("Height", BioLabel::Height),
    ("Weight", BioLabel::Weight),
    ("Position", BioLabel::Position),
    ("Number", BioLabel::Number),
    ("Draft", BioLabel::Draft),
];

/// Text read off one player page, before any coercion.
#[derive(Debug, Clone, Default)]
pub struct BioPage {
    pub name: Option<String>,
    pub number: Option<String>,
    pub position: Option<String>,
    /// Pipe-separated vitals strip: `C | 6' 1" | 200 lb | Age: 30`.
    pub vitals: Vec<String>,
    /// `Label: value` entries from the bio panel.
    pub items: Vec<String>,
}

/// `Sidney Crosby | #87` → name and number text.
pub fn split_headline(headline: &str) -> (Option<String>, Option<String>) {
    let mut parts = headline.split('|').map(str::trim);
    let name = parts.next().and_then(coerce::text);
    let number = parts.next().and_then(coerce::text);
    (name, number)
}

/// Which draft an item label describes. `NHL - Draft` and a bare `Draft`
/// are the NHL draft; any other `XXX - ` prefix is the page league's own.
fn draft_kind(label: &str, league: League) -> Option<DraftKind> {
    if let Some((prefix, _)) = label.split_once(" - ") {
        let prefix = prefix.trim();
        if prefix.eq_ignore_ascii_case("NHL") {
            return Some(DraftKind::Nhl);
        }
        if !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_uppercase()) {
            return Some(DraftKind::League(league.tag().to_string()));
        }
    }
    None
}

fn classify(label: &str) -> Option<BioLabel> {
    BIO_LABELS
        .iter()
        .find(|(l, _)| l.eq_ignore_ascii_case(label.trim()))
        .map(|(_, kind)| *kind)
}

/// Parse draft prose such as `2005 PIT, 1st rd, 1st pk (1st overall)` or
/// `Sarnia Sting (2015) Round 1 #3`.
pub fn draft(kind: DraftKind, text: &str) -> Draft {
    let year = YEAR_RE.find(text).and_then(|m| coerce::digits(m.as_str()));
    let round = ROUND_RE.find(text).and_then(|m| coerce::digits(m.as_str()));
    let overall = OVERALL_RE.find(text).and_then(|m| coerce::digits(m.as_str()));
    let team = TEAM_AFTER_YEAR_RE
        .captures(text)
        .or_else(|| TEAM_BEFORE_YEAR_RE.captures(text))
        .and_then(|caps| coerce::text(&caps[1]));
    Draft {
        kind,
        year,
        team,
        round,
        overall,
    }
}

#[derive(Default)]
struct Vitals {
    position: Option<String>,
    height_cm: Option<f64>,
    weight_kg: Option<f64>,
}

fn parse_vitals(vitals: &[String]) -> Vitals {
    let mut out = Vitals::default();
    for part in vitals.iter().flat_map(|v| v.split('|')).map(str::trim) {
        if POSITIONS.contains(&part) {
            out.position = Some(part.to_string());
        } else if let Some(kg) = coerce::weight_kg(part) {
            out.weight_kg = Some(kg);
        } else if let Some(cm) = coerce::height_cm(part) {
            out.height_cm = Some(cm);
        }
    }
    out
}

fn place_draft(slot: &mut Option<Draft>, d: Draft, player_id: &str) -> Result<()> {
    if slot.is_some() {
        return Err(ScrapeError::DuplicateDraft {
            player_id: player_id.to_string(),
            kind: d.kind,
        });
    }
    *slot = Some(d);
    Ok(())
}

pub fn build(league: League, player_id: &str, page: &BioPage) -> Result<PlayerBiography> {
    let vitals = parse_vitals(&page.vitals);

    let mut bio = PlayerBiography {
        league,
        player_id: player_id.to_string(),
        name: page.name.as_deref().and_then(coerce::display_name),
        number: page.number.as_deref().and_then(coerce::digits),
        position: page
            .position
            .as_deref()
            .and_then(coerce::text)
            .or(vitals.position),
        height_cm: vitals.height_cm,
        weight_kg: vitals.weight_kg,
        birth_date: None,
        birthplace: Birthplace::default(),
        shoots: None,
        nhl_draft: None,
        league_draft: None,
    };

    for item in &page.items {
        let Some((label, value)) = item.split_once(':') else {
            debug!("unlabelled bio item {:?}", item);
            continue;
        };
        let value = value.trim();

        if let Some(kind) = draft_kind(label, league) {
            let d = draft(kind.clone(), value);
            match kind {
                DraftKind::Nhl => place_draft(&mut bio.nhl_draft, d, player_id)?,
                DraftKind::League(_) => place_draft(&mut bio.league_draft, d, player_id)?,
            }
            continue;
        }

        match classify(label) {
            Some(BioLabel::BirthDate) => bio.birth_date = coerce::date(value),
            Some(BioLabel::Birthplace) => bio.birthplace = coerce::birthplace(value),
            Some(BioLabel::Shoots) => {
                bio.shoots = value.split_whitespace().next().map(str::to_string)
            }
            Some(BioLabel::Height) => {
                bio.height_cm = coerce::height_cm(value).or_else(|| coerce::height_cm_dotted(value))
            }
            // Junior league pages print bare pounds under the Weight label.
            Some(BioLabel::Weight) => {
                bio.weight_kg = coerce::weight_kg(value)
                    .or_else(|| coerce::float(value).map(coerce::pounds_to_kg))
            }
            Some(BioLabel::Position) => {
                bio.position = coerce::text(value).or(bio.position.take())
            }
            Some(BioLabel::Number) => bio.number = coerce::digits(value).or(bio.number),
            Some(BioLabel::Draft) => {
                place_draft(&mut bio.nhl_draft, draft(DraftKind::Nhl, value), player_id)?
            }
            None => debug!("ignoring bio item {:?}", label.trim()),
        }
    }

    Ok(bio)
}
