//! Request routing.
//!
//! Path parameters are percent-decoded here; key normalization happens in
//! the handlers, which know how each endpoint renders a rejected key.

use percent_encoding::percent_decode_str;
use tiny_http::Method;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Preflight,
    /// `GET /template/:filename`
    Template(String),
    /// `GET /:page`
    Page(String),
    /// `POST /update`
    Update,
    /// `GET /api/load/:id`
    Load(String),
    /// `GET /api/pages`
    Pages,
    /// `POST /reset`
    Reset,
    /// `POST /reset/:filename`
    ResetOne(String),
    /// `GET|POST /publish`
    Publish,
    /// `GET /archive/:name`
    Archive(String),
    /// A path parameter that does not decode to UTF-8.
    Malformed,
    NotFound,
}

impl Route {
    /// Route `path` (query string already removed).
    pub fn parse(method: &Method, path: &str) -> Self {
        let get = matches!(method, Method::Get);
        let read = get || matches!(method, Method::Head);
        let post = matches!(method, Method::Post);
        if matches!(method, Method::Options) {
            return Self::Preflight;
        }

        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return Self::NotFound;
        }

        let mut segments = Vec::new();
        for raw in trimmed.split('/') {
            match percent_decode_str(raw).decode_utf8() {
                Ok(segment) => segments.push(segment.into_owned()),
                Err(_) => return Self::Malformed,
            }
        }

        match segments.as_slice() {
            [s, name] if s == "template" && read => Self::Template(name.clone()),
            [a, l, id] if a == "api" && l == "load" && read => Self::Load(id.clone()),
            [a, p] if a == "api" && p == "pages" && read => Self::Pages,
            [a, name] if a == "archive" && read => Self::Archive(name.clone()),
            [u] if u == "update" && post => Self::Update,
            [r] if r == "reset" && post => Self::Reset,
            [r, name] if r == "reset" && post => Self::ResetOne(name.clone()),
            // publishing has side effects, so HEAD never triggers it
            [p] if p == "publish" && (get || post) => Self::Publish,
            [p] if p == "publish" => Self::NotFound,
            [page] if read => Self::Page(page.clone()),
            _ => Self::NotFound,
        }
    }
}
