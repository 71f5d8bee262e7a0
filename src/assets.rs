//! Model asset acquisition.
//!
//! Acquisition is an injectable [`AssetSource`] handed to
//! [`OtosakuTts::from_source`](crate::OtosakuTts::from_source) rather than a
//! process-wide manager, so tests and concurrent sessions can each bring
//! their own.  This module also installs packaged zip bundles:
//!
//! ```text
//! fastpitch_hifigan.zip
//! ├── __MACOSX/…              (dropped)
//! └── fastpitch_hifigan/      (contents hoisted into the target dir)
//!     ├── FastPitch.onnx
//!     ├── HiFiGan.onnx
//!     ├── tokens.txt
//!     └── cmudict.json
//! ```

use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use tracing::{debug, info};
use zip::ZipArchive;

use crate::config::ModelConfig;

/// Resolves the directory that holds a complete set of model files.
pub trait AssetSource {
    fn model_dir(&self) -> Result<PathBuf>;
}

/// An already-populated local directory.
#[derive(Debug, Clone)]
pub struct LocalDir {
    dir: PathBuf,
    config: ModelConfig,
}

impl LocalDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), config: ModelConfig::default() }
    }

    /// Check for these file names instead of the defaults.
    pub fn with_config(mut self, config: ModelConfig) -> Self {
        self.config = config;
        self
    }
}

impl AssetSource for LocalDir {
    fn model_dir(&self) -> Result<PathBuf> {
        let missing = missing_files(&self.dir, &self.config);
        if !missing.is_empty() {
            bail!("{} is missing {}", self.dir.display(), missing.join(", "));
        }
        Ok(self.dir.clone())
    }
}

/// A zip bundle installed into `dest` on first use.
#[derive(Debug, Clone)]
pub struct ZipBundle {
    archive: PathBuf,
    dest: PathBuf,
    config: ModelConfig,
}

impl ZipBundle {
    pub fn new(archive: impl Into<PathBuf>, dest: impl Into<PathBuf>) -> Self {
        Self {
            archive: archive.into(),
            dest: dest.into(),
            config: ModelConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ModelConfig) -> Self {
        self.config = config;
        self
    }
}

impl AssetSource for ZipBundle {
    fn model_dir(&self) -> Result<PathBuf> {
        if !is_installed(&self.dest, &self.config) {
            install_bundle(&self.archive, &self.dest, &self.config)?;
        }
        LocalDir::new(&self.dest).with_config(self.config.clone()).model_dir()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Bundle helpers
// ─────────────────────────────────────────────────────────────────────────────

fn missing_files<'a>(dir: &Path, config: &'a ModelConfig) -> Vec<&'a str> {
    config
        .required_files()
        .into_iter()
        .filter(|name| !dir.join(name).exists())
        .collect()
}

/// `true` when all four model files are present in `dir`.
pub fn is_installed(dir: &Path, config: &ModelConfig) -> bool {
    missing_files(dir, config).is_empty()
}

/// Unpack `archive` into `dest`.
///
/// macOS resource forks (`__MACOSX/`) are removed.  When the model files sit
/// inside a single top-level folder, that folder's entries are moved up into
/// `dest`, replacing anything already there.
pub fn install_bundle(archive: &Path, dest: &Path, config: &ModelConfig) -> Result<()> {
    info!(archive = %archive.display(), dest = %dest.display(), "installing model bundle");

    fs::create_dir_all(dest).with_context(|| format!("Cannot create {}", dest.display()))?;
    let file = File::open(archive)
        .with_context(|| format!("Cannot open bundle: {}", archive.display()))?;
    let mut zip = ZipArchive::new(file)
        .with_context(|| format!("Not a zip archive: {}", archive.display()))?;
    zip.extract(dest)
        .with_context(|| format!("Failed to extract {}", archive.display()))?;

    let resource_forks = dest.join("__MACOSX");
    if resource_forks.exists() {
        fs::remove_dir_all(&resource_forks)
            .with_context(|| format!("Cannot remove {}", resource_forks.display()))?;
    }

    if !config.acoustic_path(dest).exists() {
        if let Some(nested) = nested_bundle_dir(dest, config)? {
            hoist(&nested, dest)?;
        }
    }
    Ok(())
}

/// The single subdirectory of `dest` that holds the acoustic model, if any.
fn nested_bundle_dir(dest: &Path, config: &ModelConfig) -> Result<Option<PathBuf>> {
    let mut found = None;
    for entry in fs::read_dir(dest).with_context(|| format!("Cannot list {}", dest.display()))? {
        let path = entry?.path();
        if path.is_dir() && config.acoustic_path(&path).exists() {
            if found.is_some() {
                bail!("{} contains more than one model folder", dest.display());
            }
            found = Some(path);
        }
    }
    Ok(found)
}

fn hoist(nested: &Path, dest: &Path) -> Result<()> {
    debug!(from = %nested.display(), "hoisting bundle folder");
    for entry in fs::read_dir(nested).with_context(|| format!("Cannot list {}", nested.display()))? {
        let from = entry?.path();
        let Some(name) = from.file_name() else { continue };
        let to = dest.join(name);
        remove_path(&to)?;
        fs::rename(&from, &to)
            .with_context(|| format!("Cannot move {} to {}", from.display(), to.display()))?;
    }
    fs::remove_dir_all(nested).with_context(|| format!("Cannot remove {}", nested.display()))
}

fn remove_path(path: &Path) -> Result<()> {
    if path.is_dir() {
        fs::remove_dir_all(path)?;
    } else if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// Delete an installed model directory (and everything in it).
pub fn clear(dir: &Path) -> Result<()> {
    remove_path(dir).with_context(|| format!("Cannot remove {}", dir.display()))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use zip::{write::SimpleFileOptions, ZipWriter};

    use super::*;

    fn write_bundle(path: &Path, prefix: &str) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        let opts = SimpleFileOptions::default();
        for name in ModelConfig::default().required_files() {
            zip.start_file(format!("{prefix}{name}"), opts).unwrap();
            zip.write_all(b"stub").unwrap();
        }
        zip.start_file("__MACOSX/._FastPitch.onnx", opts).unwrap();
        zip.write_all(b"fork").unwrap();
        zip.finish().unwrap();
    }

    #[test]
    fn test_install_hoists_nested_folder() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = tmp.path().join("bundle.zip");
        write_bundle(&archive, "fastpitch_hifigan/");
        let dest = tmp.path().join("TTSModels");

        let config = ModelConfig::default();
        install_bundle(&archive, &dest, &config).unwrap();

        assert!(is_installed(&dest, &config));
        assert!(!dest.join("__MACOSX").exists());
        assert!(!dest.join("fastpitch_hifigan").exists());
    }

    #[test]
    fn test_install_flat_bundle() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = tmp.path().join("bundle.zip");
        write_bundle(&archive, "");
        let dest = tmp.path().join("models");

        install_bundle(&archive, &dest, &ModelConfig::default()).unwrap();
        assert!(is_installed(&dest, &ModelConfig::default()));
    }

    #[test]
    fn test_zip_bundle_source_and_clear() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = tmp.path().join("bundle.zip");
        write_bundle(&archive, "fastpitch_hifigan/");
        let dest = tmp.path().join("models");

        let dir = ZipBundle::new(&archive, &dest).model_dir().unwrap();
        assert_eq!(dir, dest);

        clear(&dest).unwrap();
        assert!(!dest.exists());
        assert!(!is_installed(&dest, &ModelConfig::default()));
    }

    #[test]
    fn test_local_dir_reports_missing_files() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("tokens.txt"), "a\n").unwrap();
        let err = LocalDir::new(tmp.path()).model_dir().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("cmudict.json"), "{msg}");
        assert!(!msg.contains("tokens.txt"), "{msg}");
    }
}
