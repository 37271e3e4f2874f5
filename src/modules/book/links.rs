use erudio_http::hateoas::{HttpMethod, Link};
use erudio_http::paging::Pageable;

use super::models::BookDto;
use crate::links::{page_query, resource_root, LinkBuilder};

pub const ROUTE: &str = "/api/book/v1";

#[derive(Debug, Clone)]
pub struct BookLinks {
    root: String,
}

impl BookLinks {
    pub fn new(public_url: &str) -> Self {
        Self {
            root: resource_root(public_url, ROUTE),
        }
    }

    pub fn find_all_href(&self, pageable: &Pageable) -> String {
        format!("{}{}", self.root, page_query(pageable))
    }
}

impl LinkBuilder for BookLinks {
    type Dto = BookDto;

    fn links_for(&self, id: i64) -> Vec<Link> {
        let item = format!("{}/{}", self.root, id);

        vec![
            Link::new("self", item.clone(), HttpMethod::Get),
            Link::new(
                "findAll",
                self.find_all_href(&Pageable::default()),
                HttpMethod::Get,
            ),
            Link::new("create", self.root.clone(), HttpMethod::Post),
            Link::new("update", self.root.clone(), HttpMethod::Put),
            Link::new("delete", item, HttpMethod::Delete),
        ]
    }
}
