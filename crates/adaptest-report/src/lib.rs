//! adaptest-report — Rendering of saved quiz sessions.

pub mod html;

pub use html::{generate_html, write_html_report};
