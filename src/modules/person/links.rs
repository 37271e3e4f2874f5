use erudio_http::hateoas::{HttpMethod, Link};
use erudio_http::paging::Pageable;

use super::models::PersonDto;
use crate::links::{page_query, resource_root, LinkBuilder};

pub const ROUTE: &str = "/api/person/v1";

/// Action links of a person: read, list, search, write and export.
#[derive(Debug, Clone)]
pub struct PersonLinks {
    root: String,
}

impl PersonLinks {
    pub fn new(public_url: &str) -> Self {
        Self {
            root: resource_root(public_url, ROUTE),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn find_all_href(&self, pageable: &Pageable) -> String {
        format!("{}{}", self.root, page_query(pageable))
    }

    pub fn find_by_name_href(&self, first_name: &str, pageable: &Pageable) -> String {
        format!(
            "{}/findPeopleByName/{}{}",
            self.root,
            urlencoding::encode(first_name),
            page_query(pageable)
        )
    }

    pub fn export_href(&self, pageable: &Pageable) -> String {
        format!("{}/exportPage{}", self.root, page_query(pageable))
    }
}

impl LinkBuilder for PersonLinks {
    type Dto = PersonDto;

    fn links_for(&self, id: i64) -> Vec<Link> {
        let pageable = Pageable::default();
        let item = format!("{}/{}", self.root, id);

        vec![
            Link::new("self", item.clone(), HttpMethod::Get),
            Link::new("findAll", self.find_all_href(&pageable), HttpMethod::Get),
            Link::new(
                "findByName",
                format!("{}/findPeopleByName/{{firstName}}", self.root),
                HttpMethod::Get,
            ),
            Link::new("create", self.root.clone(), HttpMethod::Post),
            Link::new(
                "massCreation",
                format!("{}/massCreation", self.root),
                HttpMethod::Post,
            ),
            Link::new("update", self.root.clone(), HttpMethod::Put),
            Link::new("disabled", item.clone(), HttpMethod::Patch),
            Link::new("delete", item, HttpMethod::Delete),
            Link::new("exportPage", self.export_href(&pageable), HttpMethod::Get)
                .with_title("export People"),
        ]
    }
}
