use image::ImageFormat;
use std::ffi::OsStr;
use std::path::Path;

/// Directory extensions that mark an opaque bundle rather than a folder a
/// user would organize images in. Scans never descend into these.
const BUNDLE_EXTENSIONS: &[&str] = &[
    "app",
    "aplibrary",
    "bundle",
    "framework",
    "lrdata",
    "photolibrary",
    "photoslibrary",
    "pkg",
    "plugin",
    "xcassets",
];

/// `true` if the file's extension maps to a raster image format we know.
///
/// Only the name is inspected; the file isn't opened.
pub fn is_supported_image(path: impl AsRef<Path>) -> bool {
    path.as_ref().extension().and_then(ImageFormat::from_extension).is_some()
}

/// `true` for dotfiles (`.DS_Store`, `.thumbnails`, …).
pub fn is_hidden(name: &OsStr) -> bool {
    name.as_encoded_bytes().first() == Some(&b'.')
}

/// `true` if a directory with this name is a package-like bundle.
pub fn is_bundle(name: &OsStr) -> bool {
    Path::new(name)
        .extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| BUNDLE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("cat.jpg", true)]
    #[case("cat.JPEG", true)]
    #[case("dir/cat.png", true)]
    #[case("cat.gif", true)]
    #[case("cat.webp", true)]
    #[case("cat.tiff", true)]
    #[case("notes.txt", false)]
    #[case("movie.mov", false)]
    #[case("README", false)]
    #[case(".jpg", false)]
    fn test_is_supported_image(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(is_supported_image(path), expected);
    }

    #[rstest]
    #[case(".DS_Store", true)]
    #[case(".hidden.jpg", true)]
    #[case("visible.jpg", false)]
    fn test_is_hidden(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_hidden(OsStr::new(name)), expected);
    }

    #[rstest]
    #[case("Photos Library.photoslibrary", true)]
    #[case("Viewer.APP", true)]
    #[case("4-cats", false)]
    #[case("v1.2", false)]
    fn test_is_bundle(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_bundle(OsStr::new(name)), expected);
    }
}
