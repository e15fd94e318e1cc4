// InGrow: comment drafting and engagement analytics for LinkedIn
//
// This is the library root. Each module corresponds to a major subsystem:
// the pure analytics core, the store-facing approval pipeline, the
// key-value store backends, identity, and the HTTP surface.

pub mod analytics;
pub mod comments;
pub mod config;
pub mod demo;
pub mod error;
pub mod feed;
pub mod identity;
pub mod output;
pub mod pipeline;
pub mod profiles;
pub mod store;
pub mod web;
