//! Local, network-free steps run when a file is selected.
//!
//! ## Data Flow
//!
//! ```text
//!            ┌─▶ encode ──▶ render   (data URL → page-1 surface)
//! bytes ─────┤
//!            └─▶ metadata            (Info dictionary → title)
//! ```
//!
//! 1. [`encode`]: wrap the raw bytes into a self-contained data URL
//! 2. [`render`]: paint page 1 of that data URL; pdfium-backed by default
//! 3. [`metadata`]: read the title field from the `/Info` dictionary (lopdf)
//!
//! `render` and `metadata` expose traits so the controller can be driven
//! with any PDF engine. Both run on the blocking pool; pdfium is not
//! async-safe and parsing is CPU-bound.

pub mod encode;
mod engine;
pub mod metadata;
pub mod render;
