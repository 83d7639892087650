//! Pipeline stages for fragment-to-PDF conversion.
//!
//! Each submodule implements exactly one step, so each is testable on its
//! own and the engine can be swapped without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ document ──▶ render ──▶ write
//! (read)     (wrap)      (chrome)   (atomic)
//! ```
//!
//! 1. [`input`]    — read the fragment as UTF-8; turn the base directory
//!    into an absolute `file://` URI
//! 2. [`document`] — wrap the fragment in doctype, head, stylesheet links
//! 3. [`render`]   — print to PDF in headless Chromium; runs in
//!    `spawn_blocking` because the DevTools client is synchronous
//! 4. [`write`]    — derive `<basename>.pdf` and write it via temp + rename

pub mod document;
pub mod input;
pub mod render;
pub mod write;
