//! HTTP responses.
//!
//! Handlers build a [`Reply`]; [`send`] turns it into a `tiny_http`
//! response. Keeping the two apart lets handlers run without a socket.

use crate::log;
use crate::utils::mime::types::{HTML, JSON, PLAIN};
use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tiny_http::{Header, Method, Request, Response, StatusCode};

const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
    ("Access-Control-Allow-Headers", "Content-Type"),
];

#[derive(Debug)]
pub enum Body {
    Empty,
    Bytes(Vec<u8>),
    /// Streamed from disk when sent.
    File(PathBuf),
}

#[derive(Debug)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Body,
    headers: Vec<(&'static str, String)>,
}

impl Reply {
    fn new(status: u16, content_type: &'static str, body: Body) -> Self {
        Self {
            status,
            content_type,
            body,
            headers: Vec::new(),
        }
    }

    pub fn html(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, HTML, Body::Bytes(body.into().into_bytes()))
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, PLAIN, Body::Bytes(body.into().into_bytes()))
    }

    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        Self::new(status, JSON, Body::Bytes(value.to_string().into_bytes()))
    }

    /// Serve a file unchanged, typed by its extension.
    pub fn file(path: PathBuf) -> Self {
        let content_type = crate::utils::mime::from_path(&path);
        Self::new(200, content_type, Body::File(path))
    }

    /// CORS preflight answer.
    pub fn preflight() -> Self {
        Self::new(204, PLAIN, Body::Empty)
    }

    /// 404, using `<public_dir>/404.html` when the site ships one.
    pub fn not_found(public_dir: &Path) -> Self {
        let custom_404 = public_dir.join("404.html");
        if custom_404.is_file() {
            return Self {
                status: 404,
                ..Self::file(custom_404)
            };
        }
        Self::text(404, "404 Not Found")
    }

    pub fn unavailable() -> Self {
        Self::text(503, "503 Service Unavailable")
    }

    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    fn header_list(&self) -> Vec<Header> {
        let mut pairs: Vec<(&str, &str)> = CORS_HEADERS.to_vec();
        pairs.push(("Content-Type", self.content_type));
        pairs.extend(self.headers.iter().map(|(k, v)| (*k, v.as_str())));
        pairs
            .into_iter()
            .filter_map(|(k, v)| Header::from_bytes(k.as_bytes(), v.as_bytes()).ok())
            .collect()
    }

    /// Body as text, reading files from disk.
    #[cfg(test)]
    pub fn body_text(&self) -> String {
        match &self.body {
            Body::Empty => String::new(),
            Body::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            Body::File(path) => fs::read_to_string(path).unwrap(),
        }
    }

    #[cfg(test)]
    pub fn body_json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body_text()).unwrap()
    }

    #[cfg(test)]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Write `reply` to the client. HEAD requests get headers only.
pub fn send(request: Request, reply: Reply) -> Result<()> {
    let head = request.method() == &Method::Head;
    let status = StatusCode(reply.status);
    let headers = reply.header_list();

    match reply.body {
        Body::File(path) if !head => {
            let file = match fs::File::open(&path) {
                Ok(file) => file,
                Err(e) => {
                    log!("serve"; "cannot open {}: {e}", path.display());
                    return send(request, Reply::text(500, "Error reading file"));
                }
            };
            let mut response = Response::from_file(file).with_status_code(status);
            for header in headers {
                response.add_header(header);
            }
            request.respond(response)?;
        }
        Body::Bytes(bytes) if !head => {
            let mut response = Response::from_data(bytes).with_status_code(status);
            for header in headers {
                response.add_header(header);
            }
            request.respond(response)?;
        }
        _ => {
            let mut response = Response::empty(status);
            for header in headers {
                response.add_header(header);
            }
            request.respond(response)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_every_reply_carries_cors() {
        let headers = Reply::text(200, "ok").header_list();
        let origin = headers
            .iter()
            .find(|h| h.field.equiv("Access-Control-Allow-Origin"))
            .unwrap();
        assert_eq!(origin.value.as_str(), "*");
        assert!(headers.iter().any(|h| h.field.equiv("Content-Type")));
    }

    #[test]
    fn test_file_reply_typed_by_extension() {
        let reply = Reply::file(PathBuf::from("site-1-0.zip"));
        assert_eq!(reply.content_type, crate::utils::mime::types::ZIP);
        assert_eq!(reply.status, 200);
    }

    #[test]
    fn test_custom_not_found_page() {
        let dir = TempDir::new().unwrap();
        assert_eq!(Reply::not_found(dir.path()).body_text(), "404 Not Found");

        fs::write(dir.path().join("404.html"), "<h1>gone</h1>").unwrap();
        let reply = Reply::not_found(dir.path());
        assert_eq!(reply.status, 404);
        assert_eq!(reply.content_type, HTML);
        assert_eq!(reply.body_text(), "<h1>gone</h1>");
    }

    #[test]
    fn test_extra_headers() {
        let reply = Reply::text(200, "x").with_header("Content-Disposition", "attachment");
        assert_eq!(reply.header("content-disposition"), Some("attachment"));
        assert_eq!(reply.header_list().len(), 5);
    }
}
