//! Editable pages: key normalization, persistence and layered lookup.

mod key;
mod resolve;
pub mod store;

pub use key::{PAGE_EXT, PageKey};
pub use resolve::{PageBody, Resolution, resolve};
pub use store::{PageStore, SqliteStore, StoreError};
