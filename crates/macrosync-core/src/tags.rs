// ── Tag-list diffing ──

use std::collections::BTreeSet;

use serde::Serialize;

const DELIMITER: &str = ", ";

/// Unordered set of tag names. Backed by a `BTreeSet` so iteration (and
/// therefore "first matching tag") is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TagSet(BTreeSet<String>);

impl TagSet {
    /// Split a `", "`-joined tag list.
    ///
    /// A blank string yields a set holding one empty tag, matching how the
    /// inventory renders tag-less objects. Callers that care must filter it.
    pub fn parse(raw: &str) -> Self {
        Self(raw.split(DELIMITER).map(str::to_owned).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Tags in `self` but not in `other`.
    pub fn difference(&self, other: &TagSet) -> TagSet {
        Self(self.0.difference(&other.0).cloned().collect())
    }

    /// First tag (in sorted order) starting with `prefix`.
    pub fn first_with_prefix(&self, prefix: &str) -> Option<&str> {
        self.iter().find(|t| t.starts_with(prefix))
    }
}

impl<S: Into<String>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Set difference in both directions between two tag lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagDiff {
    #[serde(rename = "added_tags")]
    pub added: TagSet,
    #[serde(rename = "removed_tags")]
    pub removed: TagSet,
}

pub fn diff_tags(pre: &str, post: &str) -> TagDiff {
    let pre = TagSet::parse(pre);
    let post = TagSet::parse(post);
    TagDiff {
        added: post.difference(&pre),
        removed: pre.difference(&post),
    }
}
