pub mod chrome;
#[cfg(test)]
pub mod fake;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// One rendering session with a single current page. Every call takes
/// `&mut self`, so two units of work cannot interleave on it.
#[async_trait]
pub trait Session: Send {
    type Element: Send + Sync;

    async fn navigate(&mut self, url: &str) -> Result<()>;

    async fn find_all(&mut self, selector: &str) -> Result<Vec<Self::Element>>;

    async fn find_all_in(
        &mut self,
        parent: &Self::Element,
        selector: &str,
    ) -> Result<Vec<Self::Element>>;

    /// Visible text. An empty string is a valid answer.
    async fn text(&mut self, element: &Self::Element) -> Result<String>;

    async fn attribute(&mut self, element: &Self::Element, name: &str) -> Result<Option<String>>;

    async fn click(&mut self, element: &Self::Element) -> Result<()>;

    async fn sleep(&mut self, duration: Duration);

    /// `None` when nothing matches, which is different from a match with no
    /// text.
    async fn find(&mut self, selector: &str) -> Result<Option<Self::Element>> {
        Ok(self.find_all(selector).await?.into_iter().next())
    }

    async fn find_in(
        &mut self,
        parent: &Self::Element,
        selector: &str,
    ) -> Result<Option<Self::Element>> {
        Ok(self.find_all_in(parent, selector).await?.into_iter().next())
    }

    /// Text of the first match, `None` when the selector matches nothing.
    async fn text_of(&mut self, selector: &str) -> Result<Option<String>> {
        match self.find(selector).await? {
            Some(el) => Ok(Some(self.text(&el).await?)),
            None => Ok(None),
        }
    }

    /// Texts of every match, in document order.
    async fn texts_of(&mut self, selector: &str) -> Result<Vec<String>> {
        let elements = self.find_all(selector).await?;
        let mut out = Vec::with_capacity(elements.len());
        for el in &elements {
            out.push(self.text(el).await?);
        }
        Ok(out)
    }
}
