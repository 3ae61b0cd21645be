//! Entity tree reader
//!
//! Walks one entity's children depth-first and flattens them into text
//! nodes annotated with heading level and outline mode. Semantic references
//! to other note pages are not inlined; they are returned as sub-page roots
//! for the partitioner.

use super::page::TextNode;
use crate::embed::embed_fence;
use crate::graph::{ChildKind, ChildRef, GraphEntity};
use std::cmp::Ordering;

/// Result of reading one page root
#[derive(Debug, Default)]
pub struct PageRead<'a> {
    /// Flattened nodes in document order; the first is the page title
    pub nodes: Vec<TextNode>,
    /// Embedded page roots, in discovery order
    pub subpages: Vec<&'a GraphEntity>,
}

/// Flatten `entity` starting at `start_heading`.
pub fn read_page(entity: &GraphEntity, start_heading: u32, outline: bool) -> PageRead<'_> {
    let mut read = PageRead::default();
    read_into(entity, start_heading.max(1), outline, &mut read);
    read
}

fn read_into<'a>(entity: &'a GraphEntity, heading: u32, outline: bool, read: &mut PageRead<'a>) {
    let text = if entity.is_note_block() {
        entity.text().to_string()
    } else {
        embed_fence(entity.embed_uid())
    };
    read.nodes.push(TextNode::new(text, heading, outline));

    let paragraph = entity.is_paragraph_mode();
    for child in sorted_children(entity) {
        match child.kind {
            ChildKind::Subentity => {
                let next = if paragraph { heading } else { heading + 1 };
                read_into(&child.target, next, !paragraph, read);
            }
            ChildKind::SemanticInterface
                if child.target.is_note_block() && !child.target.is_hidden() =>
            {
                read.subpages.push(&child.target);
            }
            _ => {}
        }
    }
}

/// Children ordered by ascending sort index; ties keep backend order.
pub fn sorted_children(entity: &GraphEntity) -> Vec<&ChildRef> {
    let mut children: Vec<&ChildRef> = entity.children().iter().collect();
    children.sort_by(|a, b| {
        a.sort_key()
            .partial_cmp(&b.sort_key())
            .unwrap_or(Ordering::Equal)
    });
    children
}
