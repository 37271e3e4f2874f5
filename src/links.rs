//! Hypermedia link assembly shared by the resource modules.

use erudio_http::hateoas::Link;
use erudio_http::paging::Pageable;

/// A representation carrying hypermedia links.
pub trait Linked {
    fn id(&self) -> i64;
    fn links(&self) -> &[Link];
    fn set_links(&mut self, links: Vec<Link>);
}

/// Builds the fixed, ordered action links of one resource type.
///
/// Links depend only on the resource id and static route templates, so
/// attaching twice yields the same list.
pub trait LinkBuilder {
    type Dto: Linked;

    fn links_for(&self, id: i64) -> Vec<Link>;

    fn attach(&self, dto: &mut Self::Dto) {
        let links = self.links_for(dto.id());
        dto.set_links(links);
    }
}

/// Join the public base URL and a route, tolerating a trailing slash.
pub fn resource_root(public_url: &str, route: &str) -> String {
    format!("{}{}", public_url.trim_end_matches('/'), route)
}

/// `?page=..&size=..&direction=..` suffix for paged routes.
pub fn page_query(pageable: &Pageable) -> String {
    format!(
        "?page={}&size={}&direction={}",
        pageable.page(),
        pageable.size(),
        pageable.direction()
    )
}
