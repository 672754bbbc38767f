//! Analysis Layer
//!
//! Derives searchable text from OCR annotations.

pub mod corpus;

pub use corpus::extract_corpus;
