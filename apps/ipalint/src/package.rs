//! Package subjects and the extraction collaborator.
//!
//! A [`Package`] is the archive on disk. Extracting it produces a
//! [`Workspace`]: a temporary directory owned by one run and deleted when the
//! value drops, indexed as a [`Tree`] of files. Snapshots hash the tree as is;
//! lint rules and `info` additionally need the [`Content`] view, which
//! locates the `.app` bundle inside `Payload/`.

use crate::cancel::CancelToken;
use crate::error::ExtractionError;
use crate::fsutil;
use crate::size::FileSize;
use log::debug;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// The archive under inspection.
#[derive(Debug, Clone)]
pub struct Package {
    pub path: PathBuf,
    pub size: FileSize,
}

impl Package {
    pub fn open(path: &Path) -> io::Result<Self> {
        let meta = fs::metadata(path)?;
        if !meta.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a file", path.display()),
            ));
        }
        Ok(Self {
            path: path.to_path_buf(),
            size: FileSize::from_bytes(meta.len()),
        })
    }

    /// Final path component, used as the snapshot origin name.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Every regular file under an extraction root.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    pub root: PathBuf,
    /// Root-relative and slash separated, in traversal order.
    pub files: Vec<String>,
}

impl Tree {
    pub fn scan(root: &Path) -> io::Result<Self> {
        let files = fsutil::list_tree(root)?
            .iter()
            .filter_map(|p| fsutil::relative_slash_path(root, p))
            .collect();
        Ok(Self {
            root: root.to_path_buf(),
            files,
        })
    }
}

/// The extracted tree of an application package.
#[derive(Debug, Clone, Default)]
pub struct Content {
    /// Extraction root (contains `Payload/`).
    pub root: PathBuf,
    pub payload: PathBuf,
    /// The `.app` bundle inside `Payload/`.
    pub app: PathBuf,
    /// Every regular file, root-relative and slash separated.
    pub files: Vec<String>,
}

impl Content {
    /// Index an already extracted tree rooted at `root`.
    pub fn scan(root: &Path) -> Result<Self, ExtractionError> {
        Self::locate(&Tree::scan(root)?)
    }

    /// Locate the app bundle of an indexed tree.
    pub fn locate(tree: &Tree) -> Result<Self, ExtractionError> {
        let payload = tree.root.join("Payload");
        let app = find_app_bundle(&payload)?;
        Ok(Self {
            root: tree.root.clone(),
            payload,
            app,
            files: tree.files.clone(),
        })
    }

    /// `Frameworks/` directory of the app bundle.
    pub fn frameworks_dir(&self) -> PathBuf {
        self.app.join("Frameworks")
    }
}

fn find_app_bundle(payload: &Path) -> Result<PathBuf, ExtractionError> {
    let pattern = payload.join("*.app");
    let pattern = pattern.to_string_lossy();
    let mut apps: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|e| ExtractionError::Tool {
            tool: "glob",
            message: e.to_string(),
        })?
        .filter_map(|entry| entry.ok())
        .filter(|p| p.is_dir())
        .collect();
    apps.sort();
    apps.into_iter()
        .next()
        .ok_or_else(|| ExtractionError::AppNotFound(payload.to_path_buf()))
}

/// Unpacks an archive into a destination directory.
pub trait Extractor: Send + Sync {
    /// Implementations should stop early with [`ExtractionError::Cancelled`]
    /// once `cancel` is set.
    fn extract(
        &self,
        archive: &Path,
        dest: &Path,
        cancel: &CancelToken,
    ) -> Result<(), ExtractionError>;
}

/// Zip-based extractor; IPA files are plain zip archives.
///
/// Entries whose names would escape `dest` are skipped. The token is checked
/// before every entry.
pub struct ZipExtractor;

impl Extractor for ZipExtractor {
    fn extract(
        &self,
        archive: &Path,
        dest: &Path,
        cancel: &CancelToken,
    ) -> Result<(), ExtractionError> {
        let mut zip = zip::ZipArchive::new(File::open(archive)?)?;
        fs::create_dir_all(dest)?;
        for i in 0..zip.len() {
            if cancel.is_cancelled() {
                return Err(ExtractionError::Cancelled);
            }
            let mut entry = zip.by_index(i)?;
            let Some(name) = entry.enclosed_name() else {
                debug!("skipping unsafe entry {}", entry.name());
                continue;
            };
            let out = dest.join(name);
            if entry.is_dir() {
                fs::create_dir_all(&out)?;
                continue;
            }
            if let Some(parent) = out.parent() {
                fs::create_dir_all(parent)?;
            }
            io::copy(&mut entry, &mut File::create(&out)?)?;
            #[cfg(unix)]
            if let Some(mode) = entry.unix_mode() {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&out, fs::Permissions::from_mode(mode & 0o777))?;
            }
        }
        debug!("extracted {} entries from {}", zip.len(), archive.display());
        Ok(())
    }
}

/// Temporary extraction of one package, removed on drop (including when the
/// run fails part-way).
pub struct Workspace {
    dir: TempDir,
    tree: Tree,
}

impl Workspace {
    pub fn extract(
        package: &Package,
        extractor: &dyn Extractor,
        cancel: &CancelToken,
    ) -> Result<Self, ExtractionError> {
        let dir = tempfile::Builder::new().prefix("ipalint-").tempdir()?;
        debug!(
            "extracting {} into {}",
            package.path.display(),
            dir.path().display()
        );
        extractor.extract(&package.path, dir.path(), cancel)?;
        let tree = Tree::scan(dir.path())?;
        Ok(Self { dir, tree })
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Application view of the extracted tree; fails without `Payload/*.app`.
    pub fn content(&self) -> Result<Content, ExtractionError> {
        Content::locate(&self.tree)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;

    fn write_ipa(path: &Path, files: &[(&str, &[u8])]) {
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, data) in files {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    /// Writes a file into the destination, remembers it, then fails.
    #[derive(Default)]
    struct FailingExtractor {
        dest: Mutex<Option<PathBuf>>,
    }

    impl Extractor for FailingExtractor {
        fn extract(&self, _: &Path, dest: &Path, _: &CancelToken) -> Result<(), ExtractionError> {
            fs::create_dir_all(dest.join("Payload"))?;
            fs::write(dest.join("Payload/partial"), b"x")?;
            *self.dest.lock().unwrap() = Some(dest.to_path_buf());
            Err(ExtractionError::Tool {
                tool: "unzip",
                message: "truncated archive".into(),
            })
        }
    }

    fn demo_package(dir: &Path, files: &[(&str, &[u8])]) -> Package {
        let ipa = dir.join("Demo.ipa");
        write_ipa(&ipa, files);
        Package::open(&ipa).unwrap()
    }

    #[test]
    fn workspace_extracts_and_locates_app() {
        let dir = tempdir().unwrap();
        let package = demo_package(
            dir.path(),
            &[
                ("Payload/Demo.app/Demo", b"bin"),
                ("Payload/Demo.app/Info.plist", b"plist"),
            ],
        );
        let ws = Workspace::extract(&package, &ZipExtractor, &CancelToken::new()).unwrap();
        let content = ws.content().unwrap();
        assert!(content.app.ends_with("Payload/Demo.app"));
        assert_eq!(
            content.files,
            vec!["Payload/Demo.app/Demo", "Payload/Demo.app/Info.plist"]
        );
        assert_eq!(ws.tree().files, content.files);
    }

    #[test]
    fn workspace_is_removed_on_drop() {
        let dir = tempdir().unwrap();
        let package = demo_package(dir.path(), &[("Payload/Demo.app/Demo", b"bin")]);
        let ws = Workspace::extract(&package, &ZipExtractor, &CancelToken::new()).unwrap();
        let extracted = ws.path().to_path_buf();
        assert!(extracted.exists());
        drop(ws);
        assert!(!extracted.exists());
    }

    #[test]
    fn failed_extraction_removes_the_partial_tree() {
        let dir = tempdir().unwrap();
        let package = demo_package(dir.path(), &[("Payload/Demo.app/Demo", b"bin")]);
        let extractor = FailingExtractor::default();
        let err = Workspace::extract(&package, &extractor, &CancelToken::new()).err().unwrap();
        assert!(matches!(err, ExtractionError::Tool { tool: "unzip", .. }));
        let dest = extractor.dest.lock().unwrap().clone().unwrap();
        assert!(!dest.exists());
    }

    #[test]
    fn missing_app_bundle_fails_and_still_cleans_up() {
        let dir = tempdir().unwrap();
        let package = demo_package(dir.path(), &[("Payload/readme.txt", b"no app")]);
        let ws = Workspace::extract(&package, &ZipExtractor, &CancelToken::new()).unwrap();
        assert_eq!(ws.tree().files, vec!["Payload/readme.txt"]);
        let err = ws.content().err().unwrap();
        assert!(matches!(err, ExtractionError::AppNotFound(_)));

        let extracted = ws.path().to_path_buf();
        drop(ws);
        assert!(!extracted.exists());
    }

    #[test]
    fn cancelled_extraction_writes_nothing_and_cleans_up() {
        let dir = tempdir().unwrap();
        let package = demo_package(dir.path(), &[("Payload/Demo.app/Demo", b"bin")]);
        let token = CancelToken::new();
        token.cancel();
        let dest = dir.path().join("out");
        let err = ZipExtractor.extract(&package.path, &dest, &token).unwrap_err();
        assert!(matches!(err, ExtractionError::Cancelled));
        assert!(!dest.join("Payload").exists());

        let err = Workspace::extract(&package, &ZipExtractor, &token).err().unwrap();
        assert!(matches!(err, ExtractionError::Cancelled));
    }

    #[test]
    fn escaping_entry_names_are_skipped() {
        let dir = tempdir().unwrap();
        let package = demo_package(
            dir.path(),
            &[("../evil.txt", b"x"), ("Payload/Demo.app/Demo", b"bin")],
        );
        let ws = Workspace::extract(&package, &ZipExtractor, &CancelToken::new()).unwrap();
        assert_eq!(ws.tree().files, vec!["Payload/Demo.app/Demo"]);
        assert!(!dir.path().join("evil.txt").exists());
    }

    #[test]
    fn non_zip_input_is_rejected() {
        let dir = tempdir().unwrap();
        let ipa = dir.path().join("bogus.ipa");
        fs::write(&ipa, b"not a zip").unwrap();
        let package = Package::open(&ipa).unwrap();
        let err = Workspace::extract(&package, &ZipExtractor, &CancelToken::new()).err().unwrap();
        assert!(matches!(err, ExtractionError::Zip(_)));
    }
}
