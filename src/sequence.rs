use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

/// Handle to a raster image on disk. Equality is path equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImagePath(PathBuf);

impl ImagePath {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// File name for display; falls back to the whole path when there is none
    pub fn file_name(&self) -> Cow<'_, str> {
        match self.0.file_name() {
            Some(name) => name.to_string_lossy(),
            None => self.0.to_string_lossy(),
        }
    }
}

impl From<PathBuf> for ImagePath {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

impl AsRef<Path> for ImagePath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for ImagePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Ordered list of images in discovery order.
///
/// Duplicates are kept and the list may be empty. Only ingestion code appends
/// to a sequence; once handed to a session it is replaced wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageSequence {
    images: Vec<ImagePath>,
}

impl ImageSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ImagePath> {
        self.images.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ImagePath> {
        self.images.iter()
    }

    pub fn as_slice(&self) -> &[ImagePath] {
        &self.images
    }

    pub(crate) fn push(&mut self, image: ImagePath) {
        self.images.push(image);
    }
}

impl FromIterator<ImagePath> for ImageSequence {
    fn from_iter<I: IntoIterator<Item = ImagePath>>(iter: I) -> Self {
        Self {
            images: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ImageSequence {
    type Item = &'a ImagePath;
    type IntoIter = std::slice::Iter<'a, ImagePath>;

    fn into_iter(self) -> Self::IntoIter {
        self.images.iter()
    }
}
