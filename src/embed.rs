//! Embed directive: a fenced `unigraph` code block whose body is an entity uid
//!
//! The host renders each directive into a container element with a
//! deterministic id and mounts a live view of the entity into it.

use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag, TagEnd};

/// Info string of an embed fence
pub const EMBED_LANGUAGE: &str = "unigraph";

/// Prefix of the container element id created for an embed
pub const CONTAINER_PREFIX: &str = "unigraph-entity-";

/// Build the fenced block that embeds `uid`.
pub fn embed_fence(uid: &str) -> String {
    format!("```{}\n{}\n```", EMBED_LANGUAGE, uid)
}

/// True if `text` is an embed fence produced by [`embed_fence`].
pub fn is_embed_fence(text: &str) -> bool {
    text.strip_prefix("```")
        .and_then(|rest| rest.strip_prefix(EMBED_LANGUAGE))
        .is_some_and(|rest| rest.starts_with('\n'))
}

/// Container element id for an embedded entity
pub fn container_id(uid: &str) -> String {
    format!("{}{}", CONTAINER_PREFIX, uid)
}

/// A parsed embed directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedDirective {
    pub uid: String,
}

impl EmbedDirective {
    /// Parse the body of a `unigraph` fence.
    ///
    /// The body must be a single bare identifier; surrounding whitespace is ignored.
    pub fn parse(source: &str) -> Option<Self> {
        let uid = source.trim();
        if uid.is_empty() || uid.contains(char::is_whitespace) {
            return None;
        }
        Some(Self {
            uid: uid.to_string(),
        })
    }

    pub fn container_id(&self) -> String {
        container_id(&self.uid)
    }
}

/// Collect every embed directive in a Markdown document, in document order.
pub fn find_embeds(markdown: &str) -> Vec<EmbedDirective> {
    let mut directives = Vec::new();
    let mut body: Option<String> = None;

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(lang)))
                if lang.trim() == EMBED_LANGUAGE =>
            {
                body = Some(String::new());
            }
            Event::Text(text) => {
                if let Some(buf) = body.as_mut() {
                    buf.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some(buf) = body.take() {
                    directives.extend(EmbedDirective::parse(&buf));
                }
            }
            _ => {}
        }
    }

    directives
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fence_round_trips_through_scanner() {
        let doc = format!("intro\n\n{}\n\noutro", embed_fence("0x2a"));
        let found = find_embeds(&doc);

        assert_eq!(found, vec![EmbedDirective { uid: "0x2a".to_string() }]);
        assert_eq!(found[0].container_id(), "unigraph-entity-0x2a");
    }

    #[test]
    fn fence_detection() {
        assert!(is_embed_fence("```unigraph\n0x1\n```"));
        assert!(!is_embed_fence("```unigraphx\n0x1\n```"));
        assert!(!is_embed_fence("```rust\nfn main() {}\n```"));
        assert!(!is_embed_fence("plain text"));
    }

    #[test]
    fn other_code_blocks_are_ignored() {
        let doc = "```rust\n0x1\n```\n\n```unigraph\n0x2\n```\n";
        let uids: Vec<_> = find_embeds(doc).into_iter().map(|d| d.uid).collect();
        assert_eq!(uids, vec!["0x2"]);
    }

    #[test]
    fn malformed_bodies_are_rejected() {
        assert!(EmbedDirective::parse("   ").is_none());
        assert!(EmbedDirective::parse("0x1 0x2").is_none());
        assert_eq!(EmbedDirective::parse(" 0x3\n").unwrap().uid, "0x3");
    }
}
