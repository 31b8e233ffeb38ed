//! Output templates.
//!
//! # Data Flow
//! ```text
//! "[${level}] ${message}"
//!     → template.rs (scan literals and placeholders)
//!     → renderer.rs (resolve renderer name + options)
//!     → Template (immutable, shared by clone)
//!
//! On dispatch:
//!     Template::render(&LogEvent) → String
//! ```
//!
//! # Design Decisions
//! - Compile once, render many: all parsing and option validation happens in
//!   `Template::compile`, rendering cannot fail
//! - Unknown renderers compile to an empty renderer instead of an error
//! - Options are `name=value` pairs separated by `:` or `,`; `\` escapes

pub mod renderer;
pub mod template;

pub use template::{Template, TemplateSyntaxError, DEFAULT_LAYOUT};
