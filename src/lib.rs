//! curator - project-scoped semantic document search over local files
//!
//! Documents (PDF/DOCX/TXT) are grouped into projects, their extracted
//! text is stored in SQLite, and each project is searched through an
//! in-process embedding index rebuilt from the project's current
//! documents on every query.

pub mod commands;
pub mod config;
pub mod embed;
pub mod error;
pub mod meta;
pub mod parse;
pub mod progress;
pub mod qa;
pub mod store;
