//! Hypermedia primitives: action links and paged envelopes.

use serde::{Deserialize, Serialize};

use crate::paging::{Direction, Pageable};

/// HTTP method advertised by a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

/// A relation naming a follow-up action on a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none", default)]
    pub method: Option<HttpMethod>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub title: Option<String>,
}

impl Link {
    pub fn new(rel: impl Into<String>, href: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            rel: rel.into(),
            href: href.into(),
            method: Some(method),
            title: None,
        }
    }

    /// Navigation link without an advertised method.
    pub fn nav(rel: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            rel: rel.into(),
            href: href.into(),
            method: None,
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Page position and totals reported alongside the content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub size: u32,
    pub number: u32,
    pub total_elements: u64,
    pub total_pages: u64,
    pub direction: Direction,
}

/// A window of representations plus navigation links.
#[derive(Debug, Clone, Serialize)]
pub struct PagedModel<T> {
    pub content: Vec<T>,
    pub page: PageMetadata,
    pub links: Vec<Link>,
}

impl<T> PagedModel<T> {
    /// Wrap `content` for `pageable`.
    ///
    /// `self_link` is emitted as-is; `first`, `prev`, `next` and `last` are
    /// derived through `href_for`, which renders the URI of another page.
    pub fn assemble(
        content: Vec<T>,
        pageable: &Pageable,
        total_elements: u64,
        self_link: Link,
        href_for: impl Fn(&Pageable) -> String,
    ) -> Self {
        let size = u64::from(pageable.size());
        let total_pages = total_elements.div_ceil(size);
        let last_page = u32::try_from(total_pages.saturating_sub(1)).unwrap_or(u32::MAX);
        let number = pageable.page();

        let mut links = vec![Link::nav("first", href_for(&pageable.with_page(0)))];
        if number > 0 {
            let prev = (number - 1).min(last_page);
            links.push(Link::nav("prev", href_for(&pageable.with_page(prev))));
        }
        links.push(self_link);
        if number < last_page {
            links.push(Link::nav("next", href_for(&pageable.with_page(number + 1))));
        }
        links.push(Link::nav("last", href_for(&pageable.with_page(last_page))));

        Self {
            content,
            page: PageMetadata {
                size: pageable.size(),
                number,
                total_elements,
                total_pages,
                direction: pageable.direction(),
            },
            links,
        }
    }

    /// Find a link by relation name.
    pub fn link(&self, rel: &str) -> Option<&Link> {
        self.links.iter().find(|link| link.rel == rel)
    }
}
