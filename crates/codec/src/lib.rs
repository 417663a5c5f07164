//! Categorization codecs.
//!
//! Shuffler keeps no database: an image's rating and tags are the name of the
//! directory it lives in, and its display preferences are extended attributes
//! on the file itself. This crate converts between those on-disk forms and
//! typed values:
//!
//! - [`Category`]: directory names such as `4-cats-outdoor` or `not-shown`.
//! - [`Scaling`] / [`Alignment`]: extended-attribute values.
//! - [`is_supported_image`]: which files are worth showing at all.

mod attrs;
mod category;
pub mod error;
mod media;
mod tags;
mod weight;

pub use crate::attrs::{ALIGNMENT_KEY, Alignment, SCALING_KEY, Scaling};
pub use crate::category::Category;
pub use crate::media::{is_bundle, is_hidden, is_supported_image};
pub use crate::tags::{SEPARATOR, Tag, TagSet};
pub use crate::weight::{NOT_SHOWN, Weight};
