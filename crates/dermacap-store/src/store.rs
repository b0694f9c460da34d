//! PNG persistence with append-only numbering
//!
//! Saved images land under `<root>/study_<folderKey>/` as
//! `skinimage_<N>_<baseName>.png`. The index is recomputed from the
//! directory contents at every save and never reused, so numbering stays
//! append-only even when earlier files are deleted mid-session.

use std::fs;
use std::path::{Path, PathBuf};

use dermacap_core::StillImage;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use thiserror::Error;
use tracing::{debug, info};

use crate::handoff::HandoffSender;

/// Reserved file-name prefix for saved captures.
pub const IMAGE_PREFIX: &str = "skinimage_";
/// Namespace prefix for study folders.
pub const FOLDER_PREFIX: &str = "study_";

/// Persistence errors
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PNG encode error: {0}")]
    Encode(String),
    #[error("Documents directory not found")]
    NoDocumentsDir,
}

/// Result type for persistence operations
pub type SaveResult<T> = Result<T, SaveError>;

/// Image store rooted at a documents directory.
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    /// Create a store rooted at the user's document directory (falling back
    /// to the home directory).
    pub fn new() -> SaveResult<Self> {
        let root = dirs::document_dir()
            .or_else(dirs::home_dir)
            .ok_or(SaveError::NoDocumentsDir)?;
        Ok(Self::with_root(root))
    }

    /// Create a store at a specific root.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The study folder for a folder key.
    pub fn folder_path(&self, folder_key: &str) -> PathBuf {
        self.root.join(format!("{FOLDER_PREFIX}{folder_key}"))
    }

    /// Persist a still as PNG and return its absolute path.
    ///
    /// The image is encoded in memory before anything touches the target
    /// path, so an encode failure leaves no partial file behind.
    pub fn save(
        &self,
        image: &StillImage,
        folder_key: &str,
        base_name: &str,
    ) -> SaveResult<PathBuf> {
        let folder = self.folder_path(folder_key);
        fs::create_dir_all(&folder)?;

        let index = next_index(&folder)?;
        let file_name = format!("{IMAGE_PREFIX}{index}_{base_name}.png");
        let file_path = folder.join(&file_name);

        let png = encode_png(image)?;
        fs::write(&file_path, png)?;

        let absolute = file_path.canonicalize()?;
        info!("Image saved at path: {}", absolute.display());
        Ok(absolute)
    }

    /// Persist a still and deliver its path to the handoff receiver.
    ///
    /// The notification fires exactly once, only after the write completed;
    /// a failed save notifies nobody.
    pub fn save_with_handoff(
        &self,
        image: &StillImage,
        folder_key: &str,
        base_name: &str,
        handoff: &HandoffSender,
    ) -> SaveResult<PathBuf> {
        let path = self.save(image, folder_key, base_name)?;
        handoff.notify(&path);
        Ok(path)
    }
}

/// Next append-only index for a study folder.
///
/// One past the highest index among existing `skinimage_` entries, so an
/// index stays retired once its file is deleted.
fn next_index(folder: &Path) -> SaveResult<u32> {
    let mut highest = 0u32;
    for entry in fs::read_dir(folder)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some(index) = parse_index(name) {
            highest = highest.max(index);
        }
    }
    debug!("Highest existing index in {:?}: {}", folder, highest);
    Ok(highest + 1)
}

/// Extract the numeric index from `skinimage_<N>_...`.
fn parse_index(file_name: &str) -> Option<u32> {
    let rest = file_name.strip_prefix(IMAGE_PREFIX)?;
    let digits = rest.split('_').next()?;
    digits.parse().ok()
}

fn encode_png(image: &StillImage) -> SaveResult<Vec<u8>> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(
            image.data(),
            image.width,
            image.height,
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| SaveError::Encode(e.to_string()))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handoff::handoff_channel;
    use tempfile::tempdir;

    fn still() -> StillImage {
        StillImage::from_rgba(vec![200u8; 4 * 4 * 4], 4, 4).unwrap()
    }

    #[test]
    fn test_fresh_folder_numbers_from_one() {
        let dir = tempdir().unwrap();
        let store = ImageStore::with_root(dir.path());

        for expected in 1..=3u32 {
            let path = store.save(&still(), "test", "a").unwrap();
            assert_eq!(
                path.file_name().unwrap().to_str().unwrap(),
                format!("skinimage_{expected}_a.png")
            );
        }
        assert!(dir.path().join("study_test/skinimage_1_a.png").exists());
        assert!(dir.path().join("study_test/skinimage_3_a.png").exists());
    }

    #[test]
    fn test_deleted_index_never_reused() {
        let dir = tempdir().unwrap();
        let store = ImageStore::with_root(dir.path());

        for _ in 0..3 {
            store.save(&still(), "test", "a").unwrap();
        }
        fs::remove_file(dir.path().join("study_test/skinimage_2_a.png")).unwrap();

        let path = store.save(&still(), "test", "a").unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "skinimage_4_a.png"
        );
        assert!(!dir.path().join("study_test/skinimage_2_a.png").exists());
    }

    #[test]
    fn test_unprefixed_files_ignored_for_numbering() {
        let dir = tempdir().unwrap();
        let store = ImageStore::with_root(dir.path());
        let folder = store.folder_path("test");
        fs::create_dir_all(&folder).unwrap();
        fs::write(folder.join("notes.txt"), b"not an image").unwrap();
        fs::write(folder.join("other_9_a.png"), b"wrong prefix").unwrap();

        let path = store.save(&still(), "test", "a").unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "skinimage_1_a.png"
        );
    }

    #[test]
    fn test_separate_folders_number_independently() {
        let dir = tempdir().unwrap();
        let store = ImageStore::with_root(dir.path());

        store.save(&still(), "alpha", "a").unwrap();
        store.save(&still(), "alpha", "a").unwrap();
        let path = store.save(&still(), "beta", "b").unwrap();

        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "skinimage_1_b.png"
        );
    }

    #[test]
    fn test_saved_file_is_valid_png() {
        let dir = tempdir().unwrap();
        let store = ImageStore::with_root(dir.path());

        let path = store.save(&still(), "test", "a").unwrap();
        let decoded = image::open(&path).unwrap().into_rgba8();
        assert_eq!(decoded.dimensions(), (4, 4));
        assert_eq!(decoded.into_raw(), still().into_data());
    }

    #[test]
    fn test_handoff_delivered_exactly_once_per_save() {
        let dir = tempdir().unwrap();
        let store = ImageStore::with_root(dir.path());
        let (tx, mut rx) = handoff_channel();

        let path = store
            .save_with_handoff(&still(), "test", "a", &tx)
            .unwrap();

        let event = rx.try_recv().unwrap();
        assert_eq!(event.path, path);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_failed_save_notifies_nobody() {
        let dir = tempdir().unwrap();
        let store = ImageStore::with_root(dir.path());
        // Occupy the study folder path with a plain file so the save fails.
        fs::write(dir.path().join("study_bad"), b"in the way").unwrap();
        let (tx, mut rx) = handoff_channel();

        let result = store.save_with_handoff(&still(), "bad", "a", &tx);
        assert!(result.is_err());
        assert!(rx.try_recv().is_err());
    }
}
