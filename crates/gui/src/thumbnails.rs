//! Environment map (HDRI) library and its cached preview thumbnails.

use std::path::{Path, PathBuf};

use image::DynamicImage;

const THUMBNAIL_WIDTH: u32 = 256;
const THUMBNAIL_HEIGHT: u32 = 128;
const GAMMA: f32 = 2.2;
const CONTRAST: f32 = 10.0;

const HDRI_EXTENSIONS: &[&str] = &["hdr", "png", "jpg", "jpeg"];

#[derive(Debug, thiserror::Error)]
pub enum ThumbnailError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to process {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// HDRI files under `<data dir>/hdri`
#[derive(Debug, Clone)]
pub struct HdriLibrary {
    root: PathBuf,
}

impl HdriLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn thumbnail_dir(&self) -> PathBuf {
        self.root.join("thumbnails")
    }

    /// Environment maps in the library, sorted by file name
    pub fn list(&self) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(&self.root) else {
            return Vec::new();
        };
        let mut files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_hdri(p))
            .collect();
        files.sort();
        files
    }

    pub fn thumbnail_path(&self, hdri: &Path) -> PathBuf {
        let stem = hdri.file_stem().unwrap_or_default().to_string_lossy();
        self.thumbnail_dir().join(format!("{stem}.png"))
    }

    /// Path of the thumbnail for `hdri`, generating it when missing
    pub fn thumbnail(&self, hdri: &Path) -> Result<PathBuf, ThumbnailError> {
        let path = self.thumbnail_path(hdri);
        if path.exists() {
            return Ok(path);
        }

        let image = image::open(hdri).map_err(|source| ThumbnailError::Image {
            path: hdri.to_path_buf(),
            source,
        })?;
        let preview = make_preview(&image);

        let dir = self.thumbnail_dir();
        std::fs::create_dir_all(&dir).map_err(|source| ThumbnailError::Io { path: dir, source })?;
        preview
            .save_with_format(&path, image::ImageFormat::Png)
            .map_err(|source| ThumbnailError::Image {
                path: path.clone(),
                source,
            })?;
        tracing::debug!("Generated thumbnail {}", path.display());
        Ok(path)
    }

    /// Thumbnails for every map; failures are logged and skipped
    pub fn thumbnails(&self) -> Vec<(PathBuf, PathBuf)> {
        self.list()
            .into_iter()
            .filter_map(|hdri| match self.thumbnail(&hdri) {
                Ok(thumb) => Some((hdri, thumb)),
                Err(e) => {
                    tracing::warn!("{e}");
                    None
                }
            })
            .collect()
    }
}

fn is_hdri(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| HDRI_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

/// Downscale, tone the linear radiance down to display gamma and add contrast
fn make_preview(image: &DynamicImage) -> DynamicImage {
    let mut linear = image.thumbnail(THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT).to_rgb32f();
    if matches!(image, DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_)) {
        for pixel in linear.pixels_mut() {
            for c in pixel.0.iter_mut() {
                *c = c.max(0.0).powf(1.0 / GAMMA).min(1.0);
            }
        }
    }
    DynamicImage::ImageRgb8(DynamicImage::ImageRgb32F(linear).to_rgb8()).adjust_contrast(CONTRAST)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn library_with_map(name: &str) -> (tempfile::TempDir, HdriLibrary, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let library = HdriLibrary::new(dir.path().join("hdri"));
        std::fs::create_dir_all(library.root()).unwrap();
        let path = library.root().join(name);
        RgbImage::from_pixel(1024, 512, Rgb([40, 80, 160]))
            .save(&path)
            .unwrap();
        (dir, library, path)
    }

    #[test]
    fn test_thumbnail_generated_once() {
        let (_dir, library, map) = library_with_map("sky.png");
        let thumb = library.thumbnail(&map).unwrap();
        assert_eq!(thumb, library.root().join("thumbnails").join("sky.png"));

        let img = image::open(&thumb).unwrap();
        assert_eq!((img.width(), img.height()), (256, 128));

        // cached: the source is no longer needed
        std::fs::remove_file(&map).unwrap();
        assert_eq!(library.thumbnail(&map).unwrap(), thumb);
    }

    #[test]
    fn test_list_filters_extensions() {
        let (_dir, library, map) = library_with_map("studio.png");
        std::fs::write(library.root().join("notes.txt"), "x").unwrap();
        assert_eq!(library.list(), vec![map]);
    }

    #[test]
    fn test_unreadable_map() {
        let dir = tempfile::tempdir().unwrap();
        let library = HdriLibrary::new(dir.path());
        let bogus = dir.path().join("broken.hdr");
        std::fs::write(&bogus, "not an image").unwrap();
        assert!(library.thumbnail(&bogus).is_err());
        assert!(library.thumbnails().is_empty());
    }
}
