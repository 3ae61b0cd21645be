//! Note-to-Markdown translation
//!
//! Entities flow through the partitioner (which drives the reader), then
//! each page gets a filename and is rendered with the batch-wide mapping set.

mod naming;
mod page;
mod partition;
mod reader;
mod render;

pub use naming::{file_name, name_pages, sanitize_title, FileName, RenameMapping, PASSTHROUGH_ASSETS};
pub use page::{Page, TextNode};
pub use partition::{partition, partition_all};
pub use reader::{read_page, sorted_children, PageRead};
pub use render::{render, rewrite_links};

use crate::graph::GraphEntity;

/// A rendered page ready to be written into the vault
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Vault-relative path
    pub path: String,
    /// Original page title
    pub title: String,
    pub content: String,
}

/// Translate a batch of root entities into documents, in page order.
pub fn translate(roots: &[GraphEntity]) -> Vec<Document> {
    let pages = partition_all(roots);
    let (names, renames) = name_pages(&pages);

    pages
        .iter()
        .zip(names)
        .map(|(page, name)| Document {
            path: name.path,
            title: page.title().to_string(),
            content: render(page, &renames),
        })
        .collect()
}
