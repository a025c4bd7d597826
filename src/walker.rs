use std::time::Duration;

use tracing::{debug, warn};

use crate::browser::Session;
use crate::config::CrawlSettings;
use crate::error::Result;
use crate::parser::schema::RawCell;
use crate::sites::{Expansion, TableLayout};

#[derive(Debug, Clone, Copy)]
pub struct WalkOptions {
    pub settle: Duration,
    pub max_expansions: usize,
}

impl From<&CrawlSettings> for WalkOptions {
    fn from(s: &CrawlSettings) -> Self {
        Self {
            settle: s.settle(),
            max_expansions: s.max_expansions,
        }
    }
}

#[derive(Debug, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<RawCell>>,
}

/// Walk the table on the current page to its end.
pub async fn walk<S: Session>(
    session: &mut S,
    layout: &TableLayout,
    opts: WalkOptions,
) -> Result<Table> {
    let headers = session
        .texts_of(layout.header_cells)
        .await?
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();

    let rows = match layout.expansion {
        Expansion::Pager { index, next } => walk_pager(session, layout, index, next, opts).await?,
        Expansion::LoadMore { control } => {
            expand(session, control, layout.rows, opts).await?;
            read_rows(session, layout).await?
        }
    };

    Ok(Table { headers, rows })
}

/// Highest page number listed by the index control (one number per line).
pub fn last_page_number(index_text: &str) -> Option<usize> {
    index_text
        .lines()
        .filter_map(|l| l.trim().parse::<usize>().ok())
        .max()
}

async fn walk_pager<S: Session>(
    session: &mut S,
    layout: &TableLayout,
    index: &str,
    next: &str,
    opts: WalkOptions,
) -> Result<Vec<Vec<RawCell>>> {
    // No pager means a single page, but give a late-rendering control one
    // settle delay to show up first.
    let mut control = session.find(index).await?;
    if control.is_none() {
        session.sleep(opts.settle).await;
        control = session.find(index).await?;
    }
    let last_page = match control {
        Some(el) => last_page_number(&session.text(&el).await?).unwrap_or(1),
        None => 1,
    };
    debug!("pager: {} page(s)", last_page);

    let mut rows = Vec::new();
    for page in 1..=last_page {
        rows.extend(read_rows(session, layout).await?);
        if page == last_page {
            break;
        }
        let Some(button) = session.find(next).await? else {
            warn!("next-page control gone on page {} of {}", page, last_page);
            break;
        };
        session.click(&button).await?;
        session.sleep(opts.settle).await;
    }
    Ok(rows)
}

/// Click "load more" until the row count stops growing. Returns the number
/// of clicks.
///
/// A stall after a click is confirmed by one more settle delay and recount,
/// since a slow render looks the same as the end of the list.
pub async fn expand<S: Session>(
    session: &mut S,
    control: &str,
    rows: &str,
    opts: WalkOptions,
) -> Result<usize> {
    let mut count = session.find_all(rows).await?.len();
    let mut clicks = 0;

    loop {
        if clicks >= opts.max_expansions {
            warn!("stopped after {} expansions with {} rows", clicks, count);
            break;
        }
        let Some(button) = session.find(control).await? else {
            break;
        };
        session.click(&button).await?;
        clicks += 1;
        session.sleep(opts.settle).await;

        let now = session.find_all(rows).await?.len();
        if now > count {
            count = now;
            continue;
        }

        session.sleep(opts.settle).await;
        let now = session.find_all(rows).await?.len();
        if now > count {
            count = now;
            continue;
        }
        break;
    }

    debug!("expanded {} time(s) to {} rows", clicks, count);
    Ok(clicks)
}

/// Data rows of the current page. Rows without data cells are header rows.
async fn read_rows<S: Session>(session: &mut S, layout: &TableLayout) -> Result<Vec<Vec<RawCell>>> {
    let row_elements = session.find_all(layout.rows).await?;
    let mut rows = Vec::with_capacity(row_elements.len());

    for row in &row_elements {
        let cells = session.find_all_in(row, layout.cells).await?;
        if cells.is_empty() {
            continue;
        }
        let mut out = Vec::with_capacity(cells.len());
        for cell in &cells {
            let text = session.text(cell).await?;
            let link = match session.find_in(cell, layout.link).await? {
                Some(a) => session.attribute(&a, "href").await?,
                None => None,
            };
            out.push(RawCell { text, link });
        }
        rows.push(out);
    }
    Ok(rows)
}
