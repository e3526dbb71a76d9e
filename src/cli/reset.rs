//! `pagesmith reset`: drop stored page overrides.

use crate::log;
use crate::page::{PageKey, PageStore};
use anyhow::{Context, Result};

/// Remove one page's override, or every override when `page` is `None`.
/// Returns the number of rows removed.
pub fn reset_pages(store: &dyn PageStore, page: Option<&str>) -> Result<usize> {
    let Some(raw) = page else {
        let removed = store.clear().context("reset failed")?;
        log!("store"; "removed {removed} stored page(s)");
        return Ok(removed);
    };

    let key = PageKey::new(raw)?;
    if store.remove(&key).context("reset failed")? {
        log!("store"; "{key} reset to its template");
        Ok(1)
    } else {
        log!("store"; "{key} has no stored override");
        Ok(0)
    }
}
