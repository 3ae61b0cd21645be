//! Page partitioner
//!
//! Splits one root entity into independent pages: the root's own flattened
//! content first, then each embedded semantic page in pre-order (a sub-page's
//! own sub-pages come before its later siblings).

use super::page::Page;
use super::reader::read_page;
use crate::graph::GraphEntity;

/// Partition one root entity. Always yields at least one page.
pub fn partition(root: &GraphEntity) -> Vec<Page> {
    let mut pages = Vec::new();
    partition_into(root, &mut pages);
    pages
}

/// Partition a batch, preserving entity order and then page order.
pub fn partition_all(roots: &[GraphEntity]) -> Vec<Page> {
    let mut pages = Vec::new();
    for root in roots {
        partition_into(root, &mut pages);
    }
    pages
}

fn partition_into(root: &GraphEntity, pages: &mut Vec<Page>) {
    let read = read_page(root, 1, true);
    pages.push(Page::new(read.nodes));
    for subpage in read.subpages {
        partition_into(subpage, pages);
    }
}
