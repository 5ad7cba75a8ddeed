//! HTML backend abstraction for locating script elements

/// Trait representing an HTML element that can be queried with CSS selectors
///
/// This trait keeps script discovery independent of the HTML parsing library.
/// Only the handful of queries the discoverer needs are exposed.
pub trait ElementRef {
    /// Select all descendant elements matching the CSS selector
    ///
    /// Returns an empty vector if no elements match or if the selector is invalid.
    fn select_all(&self, selector: &str) -> Vec<Self>
    where
        Self: Sized;

    /// Get the text content of this element, including all descendants
    fn text(&self) -> String;

    /// Get the value of an HTML attribute
    ///
    /// Returns `None` if the attribute doesn't exist.
    fn attr(&self, name: &str) -> Option<&str>;
}

/// Implementation of ElementRef for scraper::ElementRef
impl<'a> ElementRef for scraper::ElementRef<'a> {
    fn select_all(&self, selector: &str) -> Vec<Self> {
        let selector = match scraper::Selector::parse(selector) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        self.select(&selector).collect()
    }

    fn text(&self) -> String {
        scraper::ElementRef::text(self).collect()
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.value().attr(name)
    }
}

/// Script references found on one HTML page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageScripts {
    /// Non-empty `src` attributes of every `<script>` element, in document order
    pub sources: Vec<String>,
    /// Text of every `<script>` element concatenated together
    pub inline_text: String,
}

impl PageScripts {
    /// Parse an HTML document and collect its script references
    pub fn parse(html: &str) -> Self {
        let document = scraper::Html::parse_document(html);
        Self::collect(&document.root_element())
    }

    /// Collect script references below any element
    pub fn collect<E: ElementRef>(root: &E) -> Self {
        let mut scripts = Self::default();

        for script in root.select_all("script") {
            if let Some(src) = script.attr("src") {
                let src = src.trim();
                if !src.is_empty() {
                    scripts.sources.push(src.to_string());
                }
            }
            scripts.inline_text.push_str(&script.text());
        }

        scripts
    }
}
