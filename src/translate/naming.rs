//! Filename derivation for pages
//!
//! Titles containing characters that are unsafe in vault paths are
//! sanitized; each sanitized title yields a [`RenameMapping`] so internal
//! `[[title]]` references can be pointed at the new filename.

use super::page::Page;

/// Characters replaced with `_` when deriving a filename
pub const RESERVED_CHARS: [char; 4] = [':', '/', '|', '.'];

/// Titles written verbatim, without sanitizing or a `.md` extension
pub const PASSTHROUGH_ASSETS: [&str; 1] = ["publish.css"];

/// Used when a page has an empty title
pub const UNTITLED: &str = "Untitled";

/// A page title that was rewritten to produce its filename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameMapping {
    pub from: String,
    pub to: String,
}

/// The vault path derived for one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileName {
    pub path: String,
    pub rename: Option<RenameMapping>,
}

/// Replace reserved characters with `_`.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| if RESERVED_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Derive the vault path for a page title.
pub fn file_name(title: &str) -> FileName {
    if PASSTHROUGH_ASSETS.contains(&title) {
        return FileName {
            path: title.to_string(),
            rename: None,
        };
    }

    let title = if title.trim().is_empty() { UNTITLED } else { title };
    let sanitized = sanitize_title(title);
    let rename = (sanitized != title).then(|| RenameMapping {
        from: title.to_string(),
        to: sanitized.clone(),
    });

    FileName {
        path: format!("{}.md", sanitized),
        rename,
    }
}

/// Derive filenames for every page plus the de-duplicated mapping set.
pub fn name_pages(pages: &[Page]) -> (Vec<FileName>, Vec<RenameMapping>) {
    let names: Vec<FileName> = pages.iter().map(|p| file_name(p.title())).collect();
    let mut renames: Vec<RenameMapping> = Vec::new();
    for rename in names.iter().filter_map(|n| n.rename.as_ref()) {
        if !renames.contains(rename) {
            renames.push(rename.clone());
        }
    }
    (names, renames)
}
