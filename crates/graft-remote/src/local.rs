//! A storage client over the local filesystem.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use compact_str::CompactString;
use tracing::warn;

use graft_core::{RemoteError, RemoteId, DEFAULT_PAGE_SIZE};

use crate::client::{ListPage, RemoteEntry, StorageClient};

/// Content type reported for directories.
pub const DIRECTORY_MIME_TYPE: &str = "inode/directory";

/// Content type reported for everything else.
pub const FILE_MIME_TYPE: &str = "application/octet-stream";

/// Treats local directories as storage folders.
///
/// Object ids are absolute paths. Listings are sorted by name and split
/// into pages of `page_size` entries; the page token is the offset of the
/// next page. Entries whose names are not valid UTF-8 are left out of
/// listings and reported in [`ListPage::skipped`]. Blocking I/O runs on the
/// blocking thread pool.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    page_size: usize,
}

impl LocalStorage {
    /// Create a client with the default page size.
    pub fn new() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE as usize,
        }
    }

    /// Use a different page size (at least 1).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Id of a local path.
    ///
    /// Lossy for paths that are not valid UTF-8; such ids do not resolve.
    pub fn id_for(path: &Path) -> RemoteId {
        RemoteId::new(path.to_string_lossy().into_owned())
    }
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageClient for LocalStorage {
    async fn list_children(
        &self,
        folder: &RemoteId,
        page_token: Option<&str>,
    ) -> Result<ListPage, RemoteError> {
        let offset = match page_token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| RemoteError::api(format!("invalid page token '{token}'")))?,
            None => 0,
        };
        let folder = folder.clone();
        let page_size = self.page_size;

        run_blocking(move || {
            let dir = PathBuf::from(folder.as_str());
            let mut entries = Vec::new();
            let mut skipped = Vec::new();
            for entry in fs::read_dir(&dir).map_err(|e| RemoteError::io(folder.clone(), e))? {
                let entry = entry.map_err(|e| RemoteError::io(folder.clone(), e))?;
                let path = entry.path();
                // Ids are paths, so a name that is not UTF-8 has no usable id.
                let (Ok(name), Some(id)) = (entry.file_name().into_string(), path.to_str())
                else {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    warn!(
                        target: "graft::load",
                        folder = %folder,
                        entry = %name,
                        "name is not valid UTF-8; skipped"
                    );
                    skipped.push(CompactString::from(name));
                    continue;
                };
                let id = RemoteId::new(id);
                let file_type = entry
                    .file_type()
                    .map_err(|e| RemoteError::io(id.clone(), e))?;
                let mime_type = if file_type.is_dir() {
                    DIRECTORY_MIME_TYPE
                } else {
                    FILE_MIME_TYPE
                };
                entries.push(RemoteEntry::new(id, name, mime_type));
            }
            entries.sort_by(|a, b| a.name.cmp(&b.name));

            let end = offset.saturating_add(page_size).min(entries.len());
            let next_page_token = (end < entries.len()).then(|| end.to_string());
            let entries: Vec<RemoteEntry> = if offset < entries.len() {
                entries.drain(offset..end).collect()
            } else {
                Vec::new()
            };
            // Reported once, with the first page.
            if offset > 0 {
                skipped.clear();
            }
            Ok(ListPage {
                entries,
                next_page_token,
                skipped,
            })
        })
        .await
    }

    fn is_folder_kind(&self, mime_type: &str) -> bool {
        mime_type == DIRECTORY_MIME_TYPE
    }

    async fn create_folder(&self, name: &str, parent: &RemoteId) -> Result<RemoteId, RemoteError> {
        let target = Path::new(parent.as_str()).join(name);
        let parent = parent.clone();
        let name = name.to_string();

        run_blocking(move || match fs::create_dir(&target) {
            Ok(()) => Ok(LocalStorage::id_for(&target)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                Err(RemoteError::AlreadyExists { parent, name })
            }
            Err(e) => Err(RemoteError::io(LocalStorage::id_for(&target), e)),
        })
        .await
    }

    async fn copy_file(
        &self,
        file: &RemoteId,
        parent: &RemoteId,
        new_name: Option<&str>,
    ) -> Result<RemoteId, RemoteError> {
        let source = PathBuf::from(file.as_str());
        let name = match new_name {
            Some(name) => name.to_string(),
            None => {
                let original = source
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                format!("Copy of {original}")
            }
        };
        let target = Path::new(parent.as_str()).join(&name);
        let parent = parent.clone();
        let file = file.clone();

        run_blocking(move || {
            let mut reader =
                fs::File::open(&source).map_err(|e| RemoteError::io(file.clone(), e))?;
            let target_id = LocalStorage::id_for(&target);
            let mut writer = match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&target)
            {
                Ok(writer) => writer,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    return Err(RemoteError::AlreadyExists { parent, name });
                }
                Err(e) => return Err(RemoteError::io(target_id, e)),
            };
            io::copy(&mut reader, &mut writer).map_err(|e| RemoteError::io(file, e))?;
            Ok(target_id)
        })
        .await
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, RemoteError>
where
    F: FnOnce() -> Result<T, RemoteError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| RemoteError::api(format!("Task failed: {e}")))?
}
