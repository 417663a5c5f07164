//! The directory-name grammar.
//!
//! ```text
//! dirname := "not-shown" | weight ("-" tag)*
//! weight  := positive-integer-literal
//! tag     := one-or-more-chars, no '-', lowercase
//! ```
//!
//! [`Category`]'s [`Display`] implementation is the encoder and its
//! [`FromStr`] implementation is the decoder.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use exn::ResultExt;

use crate::error::{Error, ErrorKind};
use crate::tags::{SEPARATOR, Tag, TagSet};
use crate::weight::{NOT_SHOWN, Weight};

/// The categorization of every file inside one directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Category {
    pub weight: Weight,
    pub tags: TagSet,
}
impl Category {
    pub fn new(weight: Weight, tags: TagSet) -> Self {
        Self { weight, tags }
    }

    pub fn not_shown() -> Self {
        Self::new(Weight::NotShown, TagSet::new())
    }

    /// Encodes the category as a directory name.
    ///
    /// The not-shown bucket never carries tags; a not-shown category with
    /// tags is encoded as weight 1 (which is what happens when somebody
    /// tags an image that hasn't been rated yet).
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Decodes a directory name.
    pub fn decode(name: &str) -> Result<Self, Error> {
        name.parse()
    }

    /// Returns a copy with a different weight. Tags are preserved, except
    /// that the not-shown bucket never carries tags.
    pub fn with_weight(&self, weight: Weight) -> Self {
        match weight {
            Weight::NotShown => Self::not_shown(),
            weight => Self::new(weight, self.tags.clone()),
        }
    }

    /// Returns a copy with `tag` added. Tagging a not-shown image promotes it
    /// to weight 1.
    pub fn with_tag(&self, tag: Tag) -> Self {
        let mut tags = self.tags.clone();
        tags.insert(tag);
        let weight = match self.weight {
            Weight::NotShown => Weight::default(),
            weight => weight,
        };
        Self::new(weight, tags)
    }

    /// Returns a copy with `tag` removed (a no-op if it wasn't there).
    pub fn without_tag(&self, tag: &Tag) -> Self {
        let mut tags = self.tags.clone();
        tags.remove(tag);
        Self::new(self.weight, tags)
    }
}
impl FromStr for Category {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == NOT_SHOWN {
            return Ok(Self::not_shown());
        }
        let mut segments = s.split(SEPARATOR);
        // `split` always yields at least one segment, even for "".
        let weight = segments.next().unwrap_or_default();
        let weight = match weight.parse::<Weight>() {
            Ok(w @ Weight::Weighted(_)) => w,
            // The first segment can never be the whole reserved name.
            Ok(Weight::NotShown) | Err(_) => exn::bail!(ErrorKind::MalformedCategory(s.to_string())),
        };
        let mut tags = TagSet::new();
        for segment in segments {
            // Decoding is strict about whitespace; a trimmed tag wouldn't
            // re-encode to the same directory name.
            if segment.trim() != segment {
                exn::bail!(ErrorKind::MalformedCategory(s.to_string()));
            }
            tags.add(segment).or_raise(|| ErrorKind::MalformedCategory(s.to_string()))?;
        }
        Ok(Self { weight, tags })
    }
}
impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self.weight {
            Weight::NotShown if self.tags.is_empty() => return f.write_str(NOT_SHOWN),
            Weight::NotShown => f.write_str("1")?,
            Weight::Weighted(n) => write!(f, "{n}")?,
        }
        for tag in &self.tags {
            write!(f, "{SEPARATOR}{tag}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn category(weight: u32, tags: &[&str]) -> Category {
        Category::new(Weight::weighted(weight).unwrap(), TagSet::try_from(tags).unwrap())
    }

    #[rstest]
    #[case("1", category(1, &[]))]
    #[case("4-cats", category(4, &["cats"]))]
    #[case("2-cats-dogs", category(2, &["cats", "dogs"]))]
    #[case("2-dogs-cats", category(2, &["cats", "dogs"]))]
    #[case("3-Outdoor", category(3, &["outdoor"]))]
    #[case("not-shown", Category::not_shown())]
    fn test_decode(#[case] name: &str, #[case] expected: Category) {
        assert_eq!(Category::decode(name).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("cats")]
    #[case("0-cats")]
    #[case("-cats")]
    #[case("4--cats")]
    #[case("4-cats-")]
    #[case("4- cats")]
    #[case("not-shown-cats")]
    #[case("not")]
    fn test_decode_malformed(#[case] name: &str) {
        let err = Category::decode(name).unwrap_err();
        assert!(matches!(&*err, ErrorKind::MalformedCategory(_)));
    }

    #[rstest]
    #[case(category(1, &[]), "1")]
    #[case(category(4, &["cats"]), "4-cats")]
    #[case(category(2, &["dogs", "cats", "birds"]), "2-birds-cats-dogs")]
    #[case(Category::not_shown(), "not-shown")]
    fn test_encode(#[case] category: Category, #[case] expected: &str) {
        assert_eq!(category.encode(), expected);
    }

    #[rstest]
    #[case(category(1, &[]))]
    #[case(category(7, &["summer", "beach", "family"]))]
    #[case(Category::not_shown())]
    fn test_round_trip(#[case] category: Category) {
        assert_eq!(Category::decode(&category.encode()).unwrap(), category);
    }

    #[test]
    fn test_tagging_not_shown_promotes_to_weight_one() {
        let tagged = Category::not_shown().with_tag("cats".parse().unwrap());
        assert_eq!(tagged.encode(), "1-cats");
    }

    #[test]
    fn test_with_weight_keeps_tags() {
        let original = category(1, &["cats"]);
        assert_eq!(original.with_weight(Weight::weighted(5).unwrap()).encode(), "5-cats");
        assert_eq!(original.with_weight(Weight::NotShown).encode(), "not-shown");
    }

    #[test]
    fn test_without_tag() {
        let original = category(3, &["cats", "dogs"]);
        assert_eq!(original.without_tag(&"dogs".parse().unwrap()).encode(), "3-cats");
        assert_eq!(original.without_tag(&"birds".parse().unwrap()), original);
    }
}
