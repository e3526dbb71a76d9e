//! Endpoint handlers.
//!
//! [`App::handle`] maps a fully-read request to a [`Reply`] without touching
//! the socket, so whole request sequences can be exercised in tests.

use super::path::resolve_path;
use super::response::Reply;
use super::route::Route;
use crate::config::SiteConfig;
use crate::page::{PageBody, PageKey, PageStore, Resolution, StoreError, resolve};
use crate::publish::{Dispatch, Mailer, PublishError, PublishPayload, PublishSource, Publisher};
use crate::utils::html;
use crate::{debug, log};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tiny_http::Method;

/// A request whose body has already been read.
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    pub method: Method,
    pub url: String,
    pub body: Vec<u8>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UpdateRequest {
    filename: Option<String>,
    content: Option<String>,
}

pub struct App {
    config: Arc<SiteConfig>,
    store: Arc<dyn PageStore>,
    mailer: Option<Arc<dyn Mailer>>,
}

impl App {
    pub fn new(
        config: Arc<SiteConfig>,
        store: Arc<dyn PageStore>,
        mailer: Option<Arc<dyn Mailer>>,
    ) -> Self {
        Self {
            config,
            store,
            mailer,
        }
    }

    pub fn handle(&self, request: &IncomingRequest) -> Reply {
        let path = request.url.split(['?', '#']).next().unwrap_or_default();

        // Static files first, so `/` and asset paths never reach `/:page`.
        if matches!(request.method, Method::Get | Method::Head)
            && let Some(file) = resolve_path(path, &self.config.serve.public_dir)
        {
            return Reply::file(file);
        }

        match Route::parse(&request.method, path) {
            Route::Preflight => Reply::preflight(),
            Route::Template(name) => self.template(&name),
            Route::Page(name) => self.page(&name),
            Route::Update => self.update(&request.body),
            Route::Load(id) => self.load(&id),
            Route::Pages => self.pages(),
            Route::Reset => self.reset(),
            Route::ResetOne(name) => self.reset_one(&name),
            Route::Publish => self.publish(&request.body),
            Route::Archive(name) => self.archive(&name),
            Route::Malformed => Reply::text(400, "Malformed URL parameter"),
            Route::NotFound => self.not_found(),
        }
    }

    fn not_found(&self) -> Reply {
        Reply::not_found(&self.config.serve.public_dir)
    }

    fn resolve(&self, key: &PageKey) -> Result<Resolution, StoreError> {
        resolve(self.store.as_ref(), &self.config.serve.template_dir, key)
    }

    /// Editor preview: always renders something inside its container.
    fn template(&self, name: &str) -> Reply {
        let key = match PageKey::new(name) {
            Ok(key) => key,
            Err(e) => {
                debug!("serve"; "rejected template key `{name}`: {e}");
                return missing_template(name);
            }
        };

        match self.resolve(&key) {
            Ok(Resolution::Found(body)) => render_page(body),
            Ok(Resolution::NotFound) => missing_template(key.as_str()),
            Err(e) => {
                log!("store"; "loading template {key}: {e}");
                Reply::html(500, "<p>Error loading template</p>")
            }
        }
    }

    /// Live page: a miss falls through to the 404 handler.
    fn page(&self, name: &str) -> Reply {
        let Ok(key) = PageKey::new(name) else {
            return self.not_found();
        };

        match self.resolve(&key) {
            Ok(Resolution::Found(body)) => {
                debug!("serve"; "{key} from {}", body.source());
                render_page(body)
            }
            Ok(Resolution::NotFound) => self.not_found(),
            Err(e) => {
                log!("store"; "loading page {key}: {e}");
                Reply::text(500, "Error loading page")
            }
        }
    }

    fn update(&self, body: &[u8]) -> Reply {
        let request: UpdateRequest = match serde_json::from_slice(body) {
            Ok(request) => request,
            Err(e) => {
                debug!("serve"; "bad update body: {e}");
                return failure(400, "Invalid JSON body");
            }
        };

        let (Some(filename), Some(content)) = (request.filename, request.content) else {
            return failure(400, "Filename and content are required");
        };
        if filename.is_empty() || content.is_empty() {
            return failure(400, "Filename and content are required");
        }

        let key = match PageKey::new(&filename) {
            Ok(key) => key,
            Err(e) => return failure(400, &e.to_string()),
        };

        match self.store.upsert(&key, &content) {
            Ok(()) => {
                log!("store"; "saved {key}");
                Reply::json(
                    200,
                    &json!({ "success": true, "message": "Template saved successfully" }),
                )
            }
            Err(StoreError::Validation(msg)) => failure(400, msg),
            Err(e) => {
                log!("store"; "saving {key}: {e}");
                failure(500, "Database error")
            }
        }
    }

    fn load(&self, id: &str) -> Reply {
        let key = match PageKey::new(id) {
            Ok(key) => key,
            Err(e) => return failure(400, &e.to_string()),
        };

        match self.resolve(&key) {
            Ok(Resolution::Found(body)) => match body.into_string() {
                Ok(template) => Reply::json(200, &json!({ "success": true, "template": template })),
                Err(e) => {
                    log!("serve"; "reading {key}: {e}");
                    failure(500, "Error loading template")
                }
            },
            Ok(Resolution::NotFound) => failure(404, "Template not found"),
            Err(e) => {
                log!("store"; "loading {key}: {e}");
                failure(500, "Database error")
            }
        }
    }

    fn pages(&self) -> Reply {
        match self.store.list() {
            Ok(pages) => Reply::json(200, &json!({ "success": true, "pages": pages })),
            Err(e) => {
                log!("store"; "listing pages: {e}");
                failure(500, "Database error")
            }
        }
    }

    fn reset(&self) -> Reply {
        match self.store.clear() {
            Ok(removed) => {
                log!("store"; "reset: removed {removed} page(s)");
                Reply::json(200, &json!({ "success": true }))
            }
            Err(e) => {
                log!("store"; "reset: {e}");
                failure(500, "Database error")
            }
        }
    }

    fn reset_one(&self, name: &str) -> Reply {
        let key = match PageKey::new(name) {
            Ok(key) => key,
            Err(e) => return failure(400, &e.to_string()),
        };

        match self.store.remove(&key) {
            Ok(removed) => Reply::json(200, &json!({ "success": true, "removed": removed })),
            Err(e) => {
                log!("store"; "reset {key}: {e}");
                failure(500, "Database error")
            }
        }
    }

    /// An empty body publishes the fixed file set (emailed when mail is
    /// configured); a JSON body publishes the supplied payload.
    fn publish(&self, body: &[u8]) -> Reply {
        let source = if body.iter().all(u8::is_ascii_whitespace) {
            PublishSource::Fixed
        } else {
            match serde_json::from_slice::<PublishPayload>(body) {
                Ok(payload) => PublishSource::Dynamic(payload),
                Err(e) => return failure(400, &format!("Invalid publish payload: {e}")),
            }
        };

        let dispatch = match (&source, &self.mailer) {
            (PublishSource::Fixed, Some(mailer)) => Dispatch::Email(mailer.as_ref()),
            _ => Dispatch::Return,
        };

        let publisher = Publisher::new(&self.config, self.store.as_ref());
        match publisher.publish(source, dispatch) {
            Ok(outcome) if outcome.emailed => {
                Reply::text(200, "Website published and emailed successfully")
            }
            Ok(outcome) => Reply::json(
                200,
                &json!({
                    "message": "Website published successfully",
                    "archive": format!("/archive/{}", outcome.archive.file_name()),
                }),
            ),
            Err(e @ PublishError::Decode(_)) => failure(e.status(), &e.to_string()),
            Err(e @ PublishError::Dispatch { .. }) => {
                log!("mail"; "{e}");
                Reply::text(e.status(), "Error sending email")
            }
            Err(e) => {
                log!("publish"; "{e}");
                Reply::text(e.status(), "Error creating archive")
            }
        }
    }

    fn archive(&self, name: &str) -> Reply {
        let plain = !name.contains(['/', '\\']) && name != ".." && name.ends_with(".zip");
        let path = self.config.publish.archive_dir.join(name);
        if !plain || !path.is_file() {
            return self.not_found();
        }
        Reply::file(path).with_header(
            "Content-Disposition",
            format!("attachment; filename=\"{name}\""),
        )
    }
}

fn render_page(body: PageBody) -> Reply {
    debug!("page"; "serving {} copy", body.source());
    match body {
        PageBody::Stored(content) => Reply::html(200, content),
        PageBody::Template(path) => Reply::file(path),
    }
}

fn missing_template(name: &str) -> Reply {
    Reply::html(
        200,
        format!("<p>Template {} not found</p>", html::escape(name)),
    )
}

fn failure(status: u16, error: &str) -> Reply {
    Reply::json(status, &json!({ "success": false, "error": error }))
}
