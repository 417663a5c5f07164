use std::collections::BTreeSet;
use std::collections::btree_set;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::error::{Error, ErrorKind};

/// Separates the weight and each tag in a category directory name.
pub const SEPARATOR: char = '-';

/// A single free-form tag.
///
/// Always stored lowercase and trimmed. Tags may not be empty, and may not
/// contain the category separator or a path separator since they end up
/// embedded in a directory name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag(String);
impl Tag {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display form: first character uppercased, the rest left as-is.
    pub fn capitalized(&self) -> String {
        let mut chars = self.0.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}
impl FromStr for Tag {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_lowercase();
        if tag.is_empty() || tag.contains(SEPARATOR) || tag.contains('/') || tag.contains('\\') || tag.contains('\0') {
            exn::bail!(ErrorKind::InvalidTag(s.to_string()));
        }
        Ok(Self(tag))
    }
}
impl AsRef<str> for Tag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// An unordered set of [`Tag`]s.
///
/// Backed by a [`BTreeSet`], so iteration (and therefore encoding) is always
/// alphabetical regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TagSet(BTreeSet<Tag>);
impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and inserts a tag. Returns `true` if the tag was not already present.
    pub fn add(&mut self, tag: impl AsRef<str>) -> Result<bool, Error> {
        let tag: Tag = tag.as_ref().parse()?;
        Ok(self.0.insert(tag))
    }

    pub fn insert(&mut self, tag: Tag) -> bool {
        self.0.insert(tag)
    }

    /// Removes a tag (case-insensitively). Returns `true` if it was present.
    pub fn remove(&mut self, tag: impl AsRef<str>) -> bool {
        match tag.as_ref().parse::<Tag>() {
            Ok(tag) => self.0.remove(&tag),
            Err(_) => false,
        }
    }

    /// Case-insensitive membership.
    pub fn contains(&self, tag: impl AsRef<str>) -> bool {
        match tag.as_ref().parse::<Tag>() {
            Ok(tag) => self.0.contains(&tag),
            Err(_) => false,
        }
    }

    /// `true` if every tag in `other` is also in `self`.
    pub fn is_superset(&self, other: &TagSet) -> bool {
        self.0.is_superset(&other.0)
    }

    /// Adds every tag of `other` into `self`.
    pub fn extend_from(&mut self, other: &TagSet) {
        self.0.extend(other.0.iter().cloned());
    }

    pub fn iter(&self) -> btree_set::Iter<'_, Tag> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Capitalized tags, alphabetically sorted, for presentation.
    pub fn display_names(&self) -> Vec<String> {
        // Sorted by the lowercase form, which is the same order as the
        // capitalized form for everything except non-ASCII edge cases.
        self.0.iter().map(Tag::capitalized).collect()
    }
}
impl FromIterator<Tag> for TagSet {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
impl<'a> IntoIterator for &'a TagSet {
    type Item = &'a Tag;
    type IntoIter = btree_set::Iter<'a, Tag>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
impl TryFrom<&[&str]> for TagSet {
    type Error = Error;
    fn try_from(value: &[&str]) -> Result<Self, Self::Error> {
        value.iter().map(|s| s.parse::<Tag>()).collect()
    }
}
impl Display for TagSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.display_names().join(", "))
    }
}
