//! Dynamic publish payload: percent-encoded text assets plus base64 images.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use percent_encoding::percent_decode_str;
use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;

/// Staged name of the page markup.
pub const HTML_FILE: &str = "index.html";
/// Staged name of the stylesheet.
pub const CSS_FILE: &str = "style.css";
/// Staged name of the script.
pub const JS_FILE: &str = "script.js";

const RESERVED: [&str; 3] = [HTML_FILE, CSS_FILE, JS_FILE];

/// Request body of `POST /publish`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PublishPayload {
    pub html: String,
    pub css: String,
    pub js: String,
    pub images: Vec<ImagePayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImagePayload {
    pub name: String,
    /// Raw base64, or a `data:<mime>;base64,` URL.
    pub data: String,
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("`{0}` is not valid percent-encoded UTF-8")]
    Percent(&'static str),

    #[error("image `{name}` is not valid base64")]
    Base64 {
        name: String,
        #[source]
        source: base64::DecodeError,
    },

    #[error("image `{0}` is not a base64 data URL")]
    DataUrl(String),

    #[error("invalid image name `{0}`")]
    ImageName(String),

    #[error("image `{0}` appears more than once")]
    DuplicateImage(String),
}

/// A decoded file ready to be written into the staging directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    /// Path relative to the staging directory.
    pub name: String,
    pub bytes: Vec<u8>,
}

impl StagedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

impl PublishPayload {
    /// Decode every field. Any malformed field fails the whole payload.
    pub fn decode(&self) -> Result<Vec<StagedFile>, DecodeError> {
        let mut files = vec![
            StagedFile::new(HTML_FILE, decode_text("html", &self.html)?),
            StagedFile::new(CSS_FILE, decode_text("css", &self.css)?),
            StagedFile::new(JS_FILE, decode_text("js", &self.js)?),
        ];

        let mut seen = HashSet::new();
        for image in &self.images {
            validate_image_name(&image.name)?;
            if !seen.insert(image.name.as_str()) {
                return Err(DecodeError::DuplicateImage(image.name.clone()));
            }
            files.push(StagedFile::new(image.name.clone(), image.decode()?));
        }

        Ok(files)
    }
}

impl ImagePayload {
    fn decode(&self) -> Result<Vec<u8>, DecodeError> {
        let encoded = match self.data.strip_prefix("data:") {
            Some(url) => match url.split_once(',') {
                Some((header, body)) if header.ends_with(";base64") => body,
                _ => return Err(DecodeError::DataUrl(self.name.clone())),
            },
            None => self.data.as_str(),
        };

        let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        STANDARD.decode(compact).map_err(|source| DecodeError::Base64 {
            name: self.name.clone(),
            source,
        })
    }
}

/// Decode a percent-encoded field the way `decodeURIComponent` does:
/// a stray `%` or invalid UTF-8 is an error rather than passed through.
fn decode_text(field: &'static str, raw: &str) -> Result<String, DecodeError> {
    if !has_valid_escapes(raw) {
        return Err(DecodeError::Percent(field));
    }

    percent_decode_str(raw)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .map_err(|_| DecodeError::Percent(field))
}

fn has_valid_escapes(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3);
            if !hex.is_some_and(|h| h.iter().all(u8::is_ascii_hexdigit)) {
                return false;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    true
}

fn validate_image_name(name: &str) -> Result<(), DecodeError> {
    let invalid = name.trim().is_empty()
        || name.contains(['/', '\\', '\0'])
        || name == "."
        || name == ".."
        || RESERVED.contains(&name);

    if invalid {
        return Err(DecodeError::ImageName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(html: &str) -> PublishPayload {
        PublishPayload {
            html: html.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_decodes_percent_encoded_html() {
        let files = payload("%3Ch1%3EHi%3C%2Fh1%3E").decode().unwrap();
        assert_eq!(files[0], StagedFile::new(HTML_FILE, "<h1>Hi</h1>"));
        assert_eq!(files[1], StagedFile::new(CSS_FILE, ""));
        assert_eq!(files[2], StagedFile::new(JS_FILE, ""));
    }

    #[test]
    fn test_plain_text_passes_through() {
        let files = payload("<b>bold</b> + more").decode().unwrap();
        assert_eq!(files[0].bytes, b"<b>bold</b> + more");
    }

    #[test]
    fn test_decodes_multibyte_utf8() {
        let files = payload("caf%C3%A9").decode().unwrap();
        assert_eq!(String::from_utf8(files[0].bytes.clone()).unwrap(), "café");
    }

    #[test]
    fn test_malformed_escape_is_an_error() {
        for bad in ["%", "100%", "%ZZ", "%4"] {
            let err = payload(bad).decode().unwrap_err();
            assert!(matches!(err, DecodeError::Percent("html")), "input {bad:?}");
        }
    }

    #[test]
    fn test_invalid_utf8_is_an_error() {
        let err = payload("%FF%FE").decode().unwrap_err();
        assert!(matches!(err, DecodeError::Percent("html")));
    }

    #[test]
    fn test_decodes_images() {
        let mut p = payload("");
        p.images = vec![
            ImagePayload {
                name: "logo.png".into(),
                data: STANDARD.encode([0x89, b'P', b'N', b'G']),
            },
            ImagePayload {
                name: "dot.gif".into(),
                data: format!("data:image/gif;base64,{}", STANDARD.encode(b"GIF89a")),
            },
        ];

        let files = p.decode().unwrap();
        assert_eq!(files.len(), 5);
        assert_eq!(files[3], StagedFile::new("logo.png", vec![0x89, b'P', b'N', b'G']));
        assert_eq!(files[4], StagedFile::new("dot.gif", b"GIF89a".to_vec()));
    }

    #[test]
    fn test_bad_base64_is_an_error() {
        let mut p = payload("");
        p.images = vec![ImagePayload {
            name: "x.png".into(),
            data: "not base64!!".into(),
        }];
        assert!(matches!(p.decode(), Err(DecodeError::Base64 { .. })));
    }

    #[test]
    fn test_non_base64_data_url_is_an_error() {
        let mut p = payload("");
        p.images = vec![ImagePayload {
            name: "x.svg".into(),
            data: "data:image/svg+xml,<svg/>".into(),
        }];
        assert!(matches!(p.decode(), Err(DecodeError::DataUrl(_))));
    }

    #[test]
    fn test_rejects_unsafe_image_names() {
        for name in ["", "../x.png", "a/b.png", "..", "index.html", "style.css"] {
            let mut p = payload("");
            p.images = vec![ImagePayload {
                name: name.into(),
                data: String::new(),
            }];
            assert!(
                matches!(p.decode(), Err(DecodeError::ImageName(_))),
                "name {name:?}"
            );
        }
    }

    #[test]
    fn test_duplicate_image_names_are_rejected() {
        let mut p = payload("");
        p.images = ["logo.png", "hero.png", "logo.png"]
            .into_iter()
            .map(|name| ImagePayload {
                name: name.into(),
                data: "AQID".into(),
            })
            .collect();
        match p.decode() {
            Err(DecodeError::DuplicateImage(name)) => assert_eq!(name, "logo.png"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let p: PublishPayload = serde_json::from_str(r#"{"html":"x"}"#).unwrap();
        assert_eq!(p.css, "");
        assert!(p.images.is_empty());
    }
}
