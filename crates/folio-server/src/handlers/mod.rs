//! HTTP request handlers.

pub(crate) mod page_tree;
pub(crate) mod revalidate;
pub(crate) mod webhook;
