// Image loading module
// Scans a directory for supported images and decodes them into display textures

use crate::error::ImageLoadError;
use image::{DynamicImage, RgbaImage};
use log::{debug, info, warn};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// File extensions accepted by a scan, matched case-sensitively
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif"];

/// Decoded image ready for display
#[derive(Debug, Clone)]
pub struct ImageData {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Raw BGRA pixel data (4 bytes per pixel, Wayland Argb8888 order)
    pub pixels: Vec<u8>,
    /// Progressively half-sized copies used for thumbnails and small destinations
    pub mipmaps: Vec<MipmapLevel>,
}

/// A single mipmap level
#[derive(Debug, Clone)]
pub struct MipmapLevel {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Borrowed pixels of one resolution level
#[derive(Debug, Clone, Copy)]
pub struct LevelView<'a> {
    pub width: u32,
    pub height: u32,
    pub data: &'a [u8],
}

impl ImageData {
    /// Build a texture from decoded RGBA pixels
    pub fn from_rgba(rgba: RgbaImage) -> Self {
        let (width, height) = rgba.dimensions();

        let mut pixels = rgba.into_raw();
        for pixel in pixels.chunks_exact_mut(4) {
            pixel.swap(0, 2); // Swap R and B
        }

        let mipmaps = generate_mipmaps(width, height, &pixels);

        Self {
            width,
            height,
            pixels,
            mipmaps,
        }
    }

    /// Smallest level that still covers a `target_width` x `target_height` destination
    pub fn level_for(&self, target_width: u32, target_height: u32) -> LevelView<'_> {
        self.mipmaps
            .iter()
            .rev()
            .find(|mip| mip.width >= target_width && mip.height >= target_height)
            .map(|mip| LevelView {
                width: mip.width,
                height: mip.height,
                data: &mip.data,
            })
            .unwrap_or(LevelView {
                width: self.width,
                height: self.height,
                data: &self.pixels,
            })
    }
}

/// Generate mipmap levels (progressively half-sized versions)
fn generate_mipmaps(width: u32, height: u32, data: &[u8]) -> Vec<MipmapLevel> {
    let mut mipmaps: Vec<MipmapLevel> = Vec::new();
    let mut current_width = width;
    let mut current_height = height;

    // Generate up to 8 levels or until size is too small
    while current_width > 64 && current_height > 64 && mipmaps.len() < 8 {
        let next_width = current_width / 2;
        let next_height = current_height / 2;

        let source = mipmaps.last().map_or(data, |mip| mip.data.as_slice());
        let mut next_data = vec![0u8; (next_width * next_height * 4) as usize];

        // Box filter over each 2x2 block, per channel
        for y in 0..next_height {
            for x in 0..next_width {
                let mut sum = [0u32; 4];
                for dy in 0..2 {
                    for dx in 0..2 {
                        let sx = (x * 2 + dx).min(current_width - 1);
                        let sy = (y * 2 + dy).min(current_height - 1);
                        let idx = ((sy * current_width + sx) * 4) as usize;
                        for (channel, acc) in sum.iter_mut().enumerate() {
                            *acc += source[idx + channel] as u32;
                        }
                    }
                }

                let dst_idx = ((y * next_width + x) * 4) as usize;
                for (channel, acc) in sum.iter().enumerate() {
                    next_data[dst_idx + channel] = (acc / 4) as u8;
                }
            }
        }

        mipmaps.push(MipmapLevel {
            width: next_width,
            height: next_height,
            data: next_data,
        });

        current_width = next_width;
        current_height = next_height;
    }

    mipmaps
}

/// Load and decode a single image file
pub fn load_image(path: &Path) -> Result<ImageData, ImageLoadError> {
    let data = fs::read(path).map_err(|source| ImageLoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let img = load_from_bytes(&data).map_err(|source| ImageLoadError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ImageData::from_rgba(img.to_rgba8()))
}

/// Load an image from raw bytes, auto-detecting the format
fn load_from_bytes(data: &[u8]) -> Result<DynamicImage, image::ImageError> {
    let format = image::guess_format(data)?;
    image::load(Cursor::new(data), format)
}

/// Whether the file name carries one of the supported extensions (exact case)
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext))
}

/// One loaded image and the file it came from
#[derive(Debug)]
pub struct ImageRecord {
    pub path: PathBuf,
    pub texture: ImageData,
}

impl ImageRecord {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Images loaded from one directory, in directory-iteration order
#[derive(Debug)]
pub struct ImageStore {
    directory: PathBuf,
    images: Vec<ImageRecord>,
}

impl ImageStore {
    /// Scan `directory` (non-recursive). An unreadable directory yields an empty store.
    pub fn scan(directory: &Path) -> Self {
        let mut store = Self {
            directory: directory.to_path_buf(),
            images: Vec::new(),
        };
        store.populate();
        store
    }

    /// Release every loaded texture, then scan `directory`
    pub fn replace(&mut self, directory: &Path) {
        let released = self.images.len();
        self.images.clear();
        debug!("Released {} texture(s) from {}", released, self.directory.display());

        self.directory = directory.to_path_buf();
        self.populate();
    }

    fn populate(&mut self) {
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Cannot open directory {}: {}", self.directory.display(), e);
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();

            // file_type() does not follow symlinks
            let is_regular = entry.file_type().is_ok_and(|t| t.is_file());
            if !is_regular || !is_supported(&path) {
                debug!("Skipping {}", path.display());
                continue;
            }

            match load_image(&path) {
                Ok(texture) => {
                    debug!(
                        "Loaded {} ({}x{})",
                        path.display(),
                        texture.width,
                        texture.height
                    );
                    self.images.push(ImageRecord { path, texture });
                }
                Err(e) => {
                    let cause = std::error::Error::source(&e)
                        .map(|s| s.to_string())
                        .unwrap_or_default();
                    warn!("Skipping {}: {}", e, cause);
                }
            }
        }

        info!(
            "Loaded {} image(s) from {}",
            self.images.len(),
            self.directory.display()
        );
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ImageRecord> {
        self.images.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageRecord> {
        self.images.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba};
    use tempfile::tempdir;

    fn write_png(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        RgbaImage::from_pixel(4, 3, Rgba([10, 20, 30, 255]))
            .save_with_format(&path, image::ImageFormat::Png)
            .unwrap();
        path
    }

    fn names(store: &ImageStore) -> Vec<String> {
        let mut names: Vec<String> = store.iter().map(ImageRecord::file_name).collect();
        names.sort();
        names
    }

    #[test]
    fn is_supported_is_case_sensitive() {
        assert!(is_supported(Path::new("a.png")));
        assert!(is_supported(Path::new("dir/b.jpeg")));
        assert!(is_supported(Path::new("c.gif")));
        assert!(!is_supported(Path::new("d.PNG")));
        assert!(!is_supported(Path::new("e.Jpg")));
        assert!(!is_supported(Path::new("noextension")));
        assert!(!is_supported(Path::new(".png")));
        assert!(!is_supported(Path::new("f.webp")));
    }

    #[test]
    fn scan_keeps_only_supported_regular_files() {
        let dir = tempdir().unwrap();
        write_png(dir.path(), "a.png");
        RgbImage::from_pixel(4, 4, Rgb([1, 2, 3]))
            .save_with_format(dir.path().join("b.jpg"), image::ImageFormat::Jpeg)
            .unwrap();
        RgbaImage::new(2, 2)
            .save_with_format(dir.path().join("c.bmp"), image::ImageFormat::Bmp)
            .unwrap();
        write_png(dir.path(), "upper.PNG");
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        fs::create_dir(dir.path().join("folder.png")).unwrap();

        let store = ImageStore::scan(dir.path());

        assert_eq!(names(&store), vec!["a.png", "b.jpg", "c.bmp"]);
        assert!(store.iter().all(|r| r.path.is_file()));
    }

    #[test]
    fn scan_records_full_path_and_dimensions() {
        let dir = tempdir().unwrap();
        let path = write_png(dir.path(), "only.png");

        let store = ImageStore::scan(dir.path());
        let record = store.get(0).unwrap();

        assert_eq!(record.path, path);
        assert_eq!((record.texture.width, record.texture.height), (4, 3));
        assert_eq!(record.texture.pixels.len(), 4 * 3 * 4);
        // BGRA order
        assert_eq!(&record.texture.pixels[..4], &[30, 20, 10, 255]);
    }

    #[test]
    fn undecodable_files_are_skipped() {
        let dir = tempdir().unwrap();
        write_png(dir.path(), "good.png");
        fs::write(dir.path().join("broken.gif"), b"definitely not a gif").unwrap();

        let store = ImageStore::scan(dir.path());
        assert_eq!(names(&store), vec!["good.png"]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_not_regular_files() {
        let dir = tempdir().unwrap();
        let target = write_png(dir.path(), "real.png");
        std::os::unix::fs::symlink(&target, dir.path().join("link.png")).unwrap();

        let store = ImageStore::scan(dir.path());
        assert_eq!(names(&store), vec!["real.png"]);
    }

    #[test]
    fn missing_directory_yields_empty_store() {
        let dir = tempdir().unwrap();
        let store = ImageStore::scan(&dir.path().join("does-not-exist"));
        assert!(store.is_empty());
        assert!(store.get(0).is_none());
    }

    #[test]
    fn replace_drops_previous_images() {
        let first = tempdir().unwrap();
        write_png(first.path(), "a.png");
        write_png(first.path(), "b.png");
        let second = tempdir().unwrap();
        write_png(second.path(), "c.png");

        let mut store = ImageStore::scan(first.path());
        assert_eq!(store.len(), 2);

        store.replace(second.path());
        assert_eq!(store.directory(), second.path());
        assert_eq!(names(&store), vec!["c.png"]);

        store.replace(&second.path().join("gone"));
        assert!(store.is_empty());
    }

    #[test]
    fn mipmaps_halve_until_small() {
        let texture = ImageData::from_rgba(RgbaImage::new(512, 256));
        let sizes: Vec<(u32, u32)> = texture
            .mipmaps
            .iter()
            .map(|m| (m.width, m.height))
            .collect();
        assert_eq!(sizes, vec![(256, 128), (128, 64)]);

        let small = ImageData::from_rgba(RgbaImage::new(64, 64));
        assert!(small.mipmaps.is_empty());
    }

    #[test]
    fn level_for_picks_smallest_covering_level() {
        let texture = ImageData::from_rgba(RgbaImage::new(256, 256));

        assert_eq!(texture.level_for(60, 60).width, 64);
        assert_eq!(texture.level_for(100, 100).width, 128);
        assert_eq!(texture.level_for(200, 200).width, 256);
        assert_eq!(texture.level_for(1000, 1000).width, 256);
    }

    #[test]
    fn mipmap_box_filter_averages_blocks() {
        let mut img = RgbaImage::new(130, 130);
        for (x, _, px) in img.enumerate_pixels_mut() {
            let v = if x % 2 == 0 { 0 } else { 200 };
            *px = Rgba([v, v, v, 255]);
        }
        let texture = ImageData::from_rgba(img);
        let first = &texture.mipmaps[0];
        assert_eq!((first.width, first.height), (65, 65));
        assert_eq!(&first.data[..4], &[100, 100, 100, 255]);
    }
}
