//! Markdown renderer
//!
//! Produces one outline document per page. The title node (level 1) renders
//! as an empty line; nested nodes are indented two spaces per level and
//! prefixed with `- ` when they are outline items. Embed fences are emitted
//! verbatim.

use super::naming::RenameMapping;
use super::page::{Page, TextNode};
use crate::embed::is_embed_fence;

const INDENT: &str = "  ";
const BULLET: &str = "- ";

/// Render a page with the batch's full mapping set.
pub fn render(page: &Page, renames: &[RenameMapping]) -> String {
    tracing::trace!(
        title = page.title(),
        nodes = page.len(),
        max_heading = page.max_heading(),
        "rendering page"
    );
    page.nodes()
        .iter()
        .map(|node| render_node(node, renames))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_node(node: &TextNode, renames: &[RenameMapping]) -> String {
    if node.heading_level <= 1 {
        return String::new();
    }
    if is_embed_fence(&node.text) {
        return node.text.clone();
    }

    let text = rewrite_links(&collapse_newlines(&node.text), renames);
    let mut line = INDENT.repeat((node.heading_level - 1) as usize);
    if node.is_outline_item {
        line.push_str(BULLET);
    }
    line.push_str(&text);
    line
}

fn collapse_newlines(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\r', '\n'], " ")
}

/// Point `[[from]]` references at their sanitized filenames.
///
/// Each mapping is applied at most once (all occurrences at once); scanning
/// repeats until a pass applies nothing, so the loop runs at most
/// `renames.len() + 1` times.
pub fn rewrite_links(text: &str, renames: &[RenameMapping]) -> String {
    let mut out = text.to_string();
    let mut applied = vec![false; renames.len()];

    loop {
        let mut changed = false;
        for (i, rename) in renames.iter().enumerate() {
            if applied[i] {
                continue;
            }
            let needle = format!("[[{}]]", rename.from);
            if out.contains(&needle) {
                out = out.replace(&needle, &format!("[[{}|{}]]", rename.to, rename.from));
                applied[i] = true;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(from: &str, to: &str) -> RenameMapping {
        RenameMapping {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    fn page(nodes: &[(&str, u32, bool)]) -> Page {
        Page::new(
            nodes
                .iter()
                .map(|(t, h, o)| TextNode::new(*t, *h, *o))
                .collect(),
        )
    }

    #[test]
    fn title_renders_empty_and_children_indent() {
        let p = page(&[("Title", 1, true), ("a", 2, true), ("b", 3, true), ("c", 2, false)]);
        assert_eq!(render(&p, &[]), "\n  - a\n    - b\n  c");
    }

    #[test]
    fn newlines_collapse_to_spaces() {
        let p = page(&[("T", 1, true), ("line one\nline two", 2, true)]);
        assert_eq!(render(&p, &[]), "\n  - line one line two");
    }

    #[test]
    fn carriage_returns_collapse_to_spaces() {
        let p = page(&[("T", 1, true), ("one\r\ntwo\rthree", 2, false)]);
        assert_eq!(render(&p, &[]), "\n  one two three");
    }

    #[test]
    fn embed_fence_is_verbatim() {
        let p = page(&[("T", 1, true), ("```unigraph\n0x5\n```", 3, true)]);
        assert_eq!(render(&p, &[]), "\n```unigraph\n0x5\n```");
    }

    #[test]
    fn cross_reference_is_rewritten() {
        let p = page(&[("T", 1, true), ("see [[Foo]] here", 2, false)]);
        let out = render(&p, &[mapping("Foo", "Foo_")]);
        assert!(out.contains("see [[Foo_|Foo]] here"));
    }

    #[test]
    fn every_occurrence_is_rewritten_once() {
        let out = rewrite_links("[[a:b]] and [[a:b]]", &[mapping("a:b", "a_b")]);
        assert_eq!(out, "[[a_b|a:b]] and [[a_b|a:b]]");
    }

    #[test]
    fn self_matching_mapping_terminates() {
        // The replacement contains `[[x]]` again; it must not be re-applied.
        let out = rewrite_links("[[x]]", &[mapping("x", "x]] [[x")]);
        assert_eq!(out, "[[x]] [[x|x]]");
    }

    #[test]
    fn chained_mappings_reach_fixed_point() {
        // Applying `a` introduces `[[b]]`, which a later pass rewrites.
        let renames = [mapping("b", "c"), mapping("a", "x]] [[b]] [[y")];
        let out = rewrite_links("[[a]]", &renames);
        assert_eq!(out, "[[x]] [[c|b]] [[y|a]]");
    }

    #[test]
    fn rendering_is_idempotent() {
        let p = page(&[("T", 1, true), ("[[a.b]] ref", 2, true), ("x\ny", 4, false)]);
        let renames = [mapping("a.b", "a_b")];
        assert_eq!(render(&p, &renames), render(&p, &renames));
    }

    #[test]
    fn max_heading_matches_nodes() {
        let p = page(&[("T", 1, true), ("a", 2, true), ("b", 5, true), ("c", 3, true)]);
        assert_eq!(p.max_heading(), 5);
        assert_eq!(Page::default().max_heading(), 1);
    }
}
