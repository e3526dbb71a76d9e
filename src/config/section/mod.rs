//! Configuration section definitions.
//!
//! Each module corresponds to a section in `pagesmith.toml`:
//!
//! | Module    | TOML Section  | Purpose                                  |
//! |-----------|---------------|------------------------------------------|
//! | `serve`   | `[serve]`     | HTTP server, public and template dirs    |
//! | `store`   | `[store]`     | Page override database                   |
//! | `publish` | `[publish]`   | Staging, archives, fixed file set        |
//! | `mail`    | `[mail]`      | SMTP delivery of published archives      |

mod mail;
mod publish;
mod serve;
mod store;

pub use mail::MailConfig;
pub use publish::PublishConfig;
pub use serve::ServeConfig;
pub use store::StoreConfig;
