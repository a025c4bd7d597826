use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::model::Birthplace;

static FEET_INCHES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\d+)\s*['′]\s*(\d{1,2})\s*(?:"|″|'')"#).unwrap());
static POUNDS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*lbs?\b").unwrap());
static ISO_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").unwrap());
static PROSE_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Za-z]+)\.?\s+(\d{1,2}),?\s+(\d{4})\b").unwrap());
static CLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,3}):([0-5]\d)$").unwrap());

pub const CM_PER_INCH: f64 = 2.54;
pub const KG_PER_POUND: f64 = 0.453592;

const MONTHS: &[(&str, u32)] = &[
    ("january", 1),
    ("february", 2),
    ("march", 3),
    ("april", 4),
    ("may", 5),
    ("june", 6),
    ("july", 7),
    ("august", 8),
    ("september", 9),
    ("october", 10),
    ("november", 11),
    ("december", 12),
];

/// Empty cells and the dash family sites print for "no value".
pub fn is_placeholder(raw: &str) -> bool {
    raw.trim()
        .chars()
        .all(|c| matches!(c, '-' | '–' | '—'))
}

/// Trimmed text, or `None` for blanks and placeholders.
pub fn text(raw: &str) -> Option<String> {
    if is_placeholder(raw) {
        None
    } else {
        Some(raw.split_whitespace().collect::<Vec<_>>().join(" "))
    }
}

pub fn int(raw: &str) -> Option<i64> {
    let t = raw.trim();
    if is_placeholder(t) {
        return None;
    }
    let t = t.strip_prefix('+').unwrap_or(t).replace(',', "");
    t.parse::<i64>().ok()
}

pub fn float(raw: &str) -> Option<f64> {
    let t = raw.trim();
    if is_placeholder(t) {
        return None;
    }
    let t = t.strip_suffix('%').unwrap_or(t).trim();
    let t = t.strip_prefix('+').unwrap_or(t);
    if !t.chars().all(|c| c.is_ascii_digit() || c == '.' || c == '-') {
        return None;
    }
    t.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// First maximal run of digits embedded in prose: `"(1st"` → 1.
pub fn digits(raw: &str) -> Option<i64> {
    let start = raw.find(|c: char| c.is_ascii_digit())?;
    let run: String = raw[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    run.parse().ok()
}

/// `mm:ss` → seconds.
pub fn clock_seconds(raw: &str) -> Option<i64> {
    let caps = CLOCK_RE.captures(raw.trim())?;
    let minutes: i64 = caps[1].parse().ok()?;
    let seconds: i64 = caps[2].parse().ok()?;
    Some(minutes * 60 + seconds)
}

pub fn feet_inches_to_cm(feet: i64, inches: i64) -> f64 {
    (feet * 12 + inches) as f64 * CM_PER_INCH
}

pub fn pounds_to_kg(pounds: f64) -> f64 {
    pounds * KG_PER_POUND
}

/// `6'2"` → 187.96. Both the foot and the inch mark must be present.
pub fn height_cm(raw: &str) -> Option<f64> {
    let caps = FEET_INCHES_RE.captures(raw)?;
    let feet: i64 = caps[1].parse().ok()?;
    let inches: i64 = caps[2].parse().ok()?;
    if inches >= 12 {
        return None;
    }
    Some(feet_inches_to_cm(feet, inches))
}

/// `6.02` (feet.inches) as printed under a Height label.
pub fn height_cm_dotted(raw: &str) -> Option<f64> {
    let (feet, inches) = raw.trim().split_once('.')?;
    let feet: i64 = feet.trim().parse().ok()?;
    let inches: i64 = inches.trim().parse().ok()?;
    if inches >= 12 {
        return None;
    }
    Some(feet_inches_to_cm(feet, inches))
}

/// `200 lb` → 90.7184. Requires the pound token.
pub fn weight_kg(raw: &str) -> Option<f64> {
    let caps = POUNDS_RE.captures(raw)?;
    let pounds: f64 = caps[1].parse().ok()?;
    Some(pounds_to_kg(pounds))
}

/// `YYYY-MM-DD` or `Month DD, YYYY`, anywhere in the text.
pub fn date(raw: &str) -> Option<NaiveDate> {
    if let Some(caps) = ISO_DATE_RE.captures(raw) {
        let y: i32 = caps[1].parse().ok()?;
        let m: u32 = caps[2].parse().ok()?;
        let d: u32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(y, m, d);
    }
    PROSE_DATE_RE.captures_iter(raw).find_map(|caps| {
        let month = month_number(&caps[1])?;
        let d: u32 = caps[2].parse().ok()?;
        let y: i32 = caps[3].parse().ok()?;
        NaiveDate::from_ymd_opt(y, month, d)
    })
}

fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    MONTHS.iter().find_map(|(full, n)| {
        let abbrev = &full[..3];
        (lower == *full || lower == abbrev || (lower == "sept" && *n == 9)).then_some(*n)
    })
}

/// `Birthplace: Toronto, ON, Canada` → city Toronto, region ON.
///
/// The token after the city is a region when it is uppercase-only and a
/// country otherwise. Regions without an uppercase abbreviation land in
/// `country`; see DESIGN.md.
pub fn birthplace(raw: &str) -> Birthplace {
    let body = match raw.split_once(':') {
        Some((_, rest)) => rest,
        None => raw,
    };
    let mut parts = body.split(',').map(str::trim).filter(|p| !p.is_empty());

    let city = parts.next().map(str::to_string);
    let mut place = Birthplace {
        city,
        ..Default::default()
    };
    if let Some(territory) = parts.next() {
        if is_uppercase_token(territory) {
            place.region = Some(territory.to_string());
        } else {
            place.country = Some(territory.to_string());
        }
    }
    place
}

fn is_uppercase_token(s: &str) -> bool {
    s.chars().any(char::is_alphabetic) && !s.chars().any(char::is_lowercase)
}

/// Marker glyph (`*`, `✓`, `x`) means true; blank or a dash means false.
pub fn flag(raw: &str) -> bool {
    !is_placeholder(raw)
}

/// `Crosby, Sidney` → `Sidney Crosby`.
pub fn display_name(raw: &str) -> Option<String> {
    let name = text(raw)?;
    match name.split_once(',') {
        Some((last, first)) if !first.trim().is_empty() => {
            Some(format!("{} {}", first.trim(), last.trim()))
        }
        Some((last, _)) => Some(last.trim().to_string()),
        None => Some(name),
    }
}

/// Last path segment of a link: `/player/sidney-crosby-8471675?x=1` →
/// `sidney-crosby-8471675`.
pub fn trailing_segment(href: &str) -> Option<String> {
    let path = href.split(['?', '#']).next().unwrap_or("");
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.contains(':'))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn malformed_numbers_are_unknown() {
        for raw in ["", "   ", "-", "--", "—", "n/a", "abc", "12a"] {
            assert_eq!(int(raw), None, "int({raw:?})");
            assert_eq!(float(raw), None, "float({raw:?})");
        }
        assert_eq!(float("inf"), None);
        assert_eq!(float("NaN"), None);
    }

    #[test]
    fn zero_stays_zero() {
        assert_eq!(int("0"), Some(0));
        assert_eq!(float("0.00"), Some(0.0));
    }

    #[test]
    fn signed_and_formatted_numbers() {
        assert_eq!(int("+12"), Some(12));
        assert_eq!(int("-7"), Some(-7));
        assert_eq!(int(" 1,024 "), Some(1024));
        assert_eq!(float("12.5%"), Some(12.5));
        assert_eq!(float(".345"), Some(0.345));
    }

    #[test]
    fn digit_runs_in_prose() {
        assert_eq!(digits("(1st"), Some(1));
        assert_eq!(digits("2nd rd,"), Some(2));
        assert_eq!(digits("#17 overall"), Some(17));
        assert_eq!(digits("12th and 3"), Some(12));
        assert_eq!(digits("none"), None);
    }

    #[test]
    fn clock() {
        assert_eq!(clock_seconds("18:42"), Some(1122));
        assert_eq!(clock_seconds("0:59"), Some(59));
        assert_eq!(clock_seconds("18:72"), None);
        assert_eq!(clock_seconds(""), None);
    }

    #[test]
    fn height_conversion() {
        assert!(close(height_cm("6'2\"").unwrap(), 187.96));
        assert!(close(height_cm("5' 11\"").unwrap(), 180.34));
        assert_eq!(height_cm("6'2"), None);
        assert_eq!(height_cm("74"), None);
        assert!(close(height_cm_dotted("6.02").unwrap(), 187.96));
        assert_eq!(height_cm_dotted("6.14"), None);
    }

    #[test]
    fn weight_conversion() {
        assert!(close(weight_kg("200lb").unwrap(), 90.7184));
        assert!(close(weight_kg("200 lbs").unwrap(), 90.7184));
        assert_eq!(weight_kg("200"), None);
        assert_eq!(weight_kg("200 kg"), None);
    }

    #[test]
    fn dates_in_both_formats() {
        let expected = NaiveDate::from_ymd_opt(1987, 8, 7);
        assert_eq!(date("1987-08-07"), expected);
        assert_eq!(date("August 7, 1987"), expected);
        assert_eq!(date("Born: August 7, 1987 (Age: 30)"), expected);
        assert_eq!(date("Aug 7, 1987"), expected);
        assert_eq!(date("1987-02-30"), None);
        assert_eq!(date("Smarch 7, 1987"), None);
        assert_eq!(date(""), None);
    }

    #[test]
    fn birthplace_region_or_country() {
        let p = birthplace("Toronto, ON, Canada");
        assert_eq!(p.city.as_deref(), Some("Toronto"));
        assert_eq!(p.region.as_deref(), Some("ON"));
        assert_eq!(p.country, None);

        let p = birthplace("Moscow, Russia");
        assert_eq!(p.city.as_deref(), Some("Moscow"));
        assert_eq!(p.country.as_deref(), Some("Russia"));
        assert_eq!(p.region, None);

        let p = birthplace("Birthplace: Cole Harbour, NS, CAN");
        assert_eq!(p.city.as_deref(), Some("Cole Harbour"));
        assert_eq!(p.region.as_deref(), Some("NS"));

        let p = birthplace("Helsinki");
        assert_eq!(p.city.as_deref(), Some("Helsinki"));
        assert_eq!(p.region, None);
        assert_eq!(p.country, None);
    }

    #[test]
    fn glyph_flags() {
        assert!(flag("*"));
        assert!(flag(" ✓ "));
        assert!(!flag(""));
        assert!(!flag("-"));
    }

    #[test]
    fn names_reordered() {
        assert_eq!(display_name("Crosby, Sidney").as_deref(), Some("Sidney Crosby"));
        assert_eq!(display_name("Connor  McDavid").as_deref(), Some("Connor McDavid"));
        assert_eq!(display_name(""), None);
    }

    #[test]
    fn link_segments() {
        assert_eq!(
            trailing_segment("https://www.nhl.com/player/8471675").as_deref(),
            Some("8471675")
        );
        assert_eq!(
            trailing_segment("/players/1906/?season=60#stats").as_deref(),
            Some("1906")
        );
        assert_eq!(trailing_segment(""), None);
        assert_eq!(trailing_segment("javascript:void(0)"), None);
    }
}
