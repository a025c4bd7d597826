use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;

use super::Session;
use crate::error::{Result, ScrapeError};
use crate::parser::schema::RawCell;

#[derive(Debug, Clone, Default)]
struct Node {
    text: String,
    attrs: HashMap<String, String>,
    children: HashMap<String, Vec<usize>>,
    advances: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FakeDom {
    nodes: Vec<Node>,
    roots: HashMap<String, Vec<usize>>,
}

impl FakeDom {
    pub fn new() -> Self {
        Self::default()
    }

    fn add(&mut self, text: &str) -> usize {
        self.nodes.push(Node {
            text: text.to_string(),
            ..Default::default()
        });
        self.nodes.len() - 1
    }

    fn add_root(&mut self, selector: &str, text: &str) -> usize {
        let id = self.add(text);
        self.roots.entry(selector.to_string()).or_default().push(id);
        id
    }

    fn add_child(&mut self, parent: usize, selector: &str, text: &str) -> usize {
        let id = self.add(text);
        self.nodes[parent]
            .children
            .entry(selector.to_string())
            .or_default()
            .push(id);
        id
    }

    /// Top-level elements matching `selector`, one per text.
    pub fn with_texts(mut self, selector: &str, texts: &[&str]) -> Self {
        for t in texts {
            self.add_root(selector, t);
        }
        self
    }

    /// A clickable control that moves the page to its next stage.
    pub fn with_control(mut self, selector: &str, text: &str) -> Self {
        let id = self.add_root(selector, text);
        self.nodes[id].advances = true;
        self
    }

    /// A container whose children each carry `attr`, given as `(text, value)`.
    pub fn with_options(
        mut self,
        selector: &str,
        child_selector: &str,
        attr: &str,
        children: &[(&str, &str)],
    ) -> Self {
        let parent = self.add_root(selector, "");
        for (text, value) in children {
            let id = self.add_child(parent, child_selector, text);
            self.nodes[id].attrs.insert(attr.to_string(), value.to_string());
        }
        self
    }

    /// Header cells under `header_selector`, then one `row_selector` element
    /// per row with `td` cells and an `a` link where the cell has one.
    pub fn with_table(
        mut self,
        header_selector: &str,
        row_selector: &str,
        headers: &[&str],
        rows: &[Vec<RawCell>],
    ) -> Self {
        for h in headers {
            self.add_root(header_selector, h);
        }
        for row in rows {
            let r = self.add_root(row_selector, "");
            for cell in row {
                let td = self.add_child(r, "td", &cell.text);
                if let Some(href) = &cell.link {
                    let a = self.add_child(td, "a", &cell.text);
                    self.nodes[a].attrs.insert("href".into(), href.clone());
                }
            }
        }
        self
    }

    /// A row that only holds `th` cells, as repeated header rows do.
    pub fn with_header_row(mut self, row_selector: &str, headers: &[&str]) -> Self {
        let r = self.add_root(row_selector, "");
        for h in headers {
            self.add_child(r, "th", h);
        }
        self
    }
}

/// Each URL maps to a list of DOM stages. Navigation shows stage 0; clicking
/// an element marked `advances` moves to the next stage, which is how pagers
/// and "load more" buttons are modelled.
#[derive(Debug, Default)]
pub struct FakeSession {
    pages: HashMap<String, Vec<FakeDom>>,
    failing: HashSet<String>,
    current: Option<(String, usize)>,
    pub navigations: Vec<String>,
    pub clicks: usize,
    pub sleeps: Vec<Duration>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, dom: FakeDom) -> Self {
        self.pages.insert(url.to_string(), vec![dom]);
        self
    }

    pub fn staged(mut self, url: &str, stages: Vec<FakeDom>) -> Self {
        self.pages.insert(url.to_string(), stages);
        self
    }

    /// Navigation to `url` fails as a transport error.
    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    fn dom(&self) -> Result<&FakeDom> {
        let (url, stage) = self
            .current
            .as_ref()
            .ok_or_else(|| ScrapeError::Transport("no page loaded".into()))?;
        Ok(&self.pages[url][*stage])
    }

    fn node(&self, id: usize) -> Result<&Node> {
        self.dom()?
            .nodes
            .get(id)
            .ok_or_else(|| ScrapeError::Transport(format!("stale element {id}")))
    }
}

#[async_trait]
impl Session for FakeSession {
    type Element = usize;

    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.navigations.push(url.to_string());
        if self.failing.contains(url) {
            return Err(ScrapeError::Transport(format!("net::ERR_CONNECTION_RESET {url}")));
        }
        if !self.pages.contains_key(url) {
            return Err(ScrapeError::Transport(format!("404 {url}")));
        }
        self.current = Some((url.to_string(), 0));
        Ok(())
    }

    async fn find_all(&mut self, selector: &str) -> Result<Vec<usize>> {
        Ok(self.dom()?.roots.get(selector).cloned().unwrap_or_default())
    }

    async fn find_all_in(&mut self, parent: &usize, selector: &str) -> Result<Vec<usize>> {
        Ok(self
            .node(*parent)?
            .children
            .get(selector)
            .cloned()
            .unwrap_or_default())
    }

    async fn text(&mut self, element: &usize) -> Result<String> {
        Ok(self.node(*element)?.text.clone())
    }

    async fn attribute(&mut self, element: &usize, name: &str) -> Result<Option<String>> {
        Ok(self.node(*element)?.attrs.get(name).cloned())
    }

    async fn click(&mut self, element: &usize) -> Result<()> {
        self.clicks += 1;
        if self.node(*element)?.advances {
            if let Some((url, stage)) = self.current.as_mut() {
                let last = self.pages[url.as_str()].len() - 1;
                *stage = (*stage + 1).min(last);
            }
        }
        Ok(())
    }

    async fn sleep(&mut self, duration: Duration) {
        self.sleeps.push(duration);
    }
}
