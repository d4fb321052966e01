#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    missing_docs,
    rustdoc::broken_intra_doc_links,
    rustdoc::missing_crate_level_docs
)]

//! Transactional email library: renders the magic-link and workspace
//! invitation emails and submits them through an SMTP relay.

pub mod domain;
pub mod infrastructure;
