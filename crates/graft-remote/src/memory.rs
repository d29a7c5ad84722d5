//! An in-memory storage client.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use compact_str::{format_compact, CompactString};

use graft_core::{RemoteError, RemoteId};

use crate::client::{ListPage, RemoteEntry, StorageClient};

/// Content type used for folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Content type used for files.
pub const PLAIN_MIME_TYPE: &str = "text/plain";

/// A request received by a [`MemoryStorage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// `list_children`.
    List {
        folder: RemoteId,
        page_token: Option<String>,
    },
    /// `create_folder`.
    CreateFolder { name: String, parent: RemoteId },
    /// `copy_file`.
    CopyFile {
        file: RemoteId,
        parent: RemoteId,
        new_name: Option<String>,
    },
}

#[derive(Debug, Clone)]
struct Object {
    name: CompactString,
    folder: bool,
    children: Vec<RemoteId>,
}

#[derive(Debug, Default)]
struct Inner {
    objects: HashMap<RemoteId, Object>,
    next_id: u64,
    calls: Vec<Call>,
    fail_create: HashSet<String>,
    fail_copy: HashSet<String>,
    fail_list: HashSet<RemoteId>,
}

impl Inner {
    fn insert(&mut self, parent: Option<&RemoteId>, name: &str, folder: bool) -> RemoteId {
        self.next_id += 1;
        let id = RemoteId(format_compact!("m{}", self.next_id));
        self.objects.insert(
            id.clone(),
            Object {
                name: name.into(),
                folder,
                children: Vec::new(),
            },
        );
        if let Some(parent) = parent.and_then(|p| self.objects.get_mut(p)) {
            parent.children.push(id.clone());
        }
        id
    }

    fn folder(&self, id: &RemoteId) -> Result<&Object, RemoteError> {
        self.objects
            .get(id)
            .filter(|o| o.folder)
            .ok_or_else(|| RemoteError::NotFound { id: id.clone() })
    }
}

/// Storage held entirely in memory.
///
/// Records every request it receives and can be told to fail specific
/// requests. Like a cloud drive, it allows several objects with the same
/// name in one folder, and copies without a name become `Copy of <name>`.
#[derive(Debug)]
pub struct MemoryStorage {
    inner: Mutex<Inner>,
    page_size: usize,
}

impl MemoryStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            page_size: 100,
        }
    }

    /// Split listings into pages of this many entries (at least 1).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock cannot leave Inner half-updated.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Create a top-level folder.
    pub fn add_root(&self, name: &str) -> RemoteId {
        self.lock().insert(None, name, true)
    }

    /// Create a folder under `parent`.
    pub fn add_folder(&self, parent: &RemoteId, name: &str) -> RemoteId {
        self.lock().insert(Some(parent), name, true)
    }

    /// Create a file under `parent`.
    pub fn add_file(&self, parent: &RemoteId, name: &str) -> RemoteId {
        self.lock().insert(Some(parent), name, false)
    }

    /// Make `create_folder` fail for this (already renamed) folder name.
    pub fn fail_create_folder(&self, name: &str) {
        self.lock().fail_create.insert(name.to_string());
    }

    /// Make `copy_file` fail when copying a file with this source name.
    pub fn fail_copy_file(&self, source_name: &str) {
        self.lock().fail_copy.insert(source_name.to_string());
    }

    /// Make listing this folder fail.
    pub fn fail_listing(&self, folder: &RemoteId) {
        self.lock().fail_list.insert(folder.clone());
    }

    /// Every request received so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Only the create/copy requests, in order.
    pub fn writes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| !matches!(call, Call::List { .. }))
            .collect()
    }

    /// Name of an object.
    pub fn name_of(&self, id: &RemoteId) -> Option<CompactString> {
        self.lock().objects.get(id).map(|o| o.name.clone())
    }

    /// Every path below `folder`, folders suffixed with `/`, sorted.
    pub fn paths_under(&self, folder: &RemoteId) -> Vec<String> {
        let inner = self.lock();
        let mut paths = Vec::new();
        let mut stack: Vec<(RemoteId, String)> = inner
            .objects
            .get(folder)
            .map(|o| o.children.iter().map(|c| (c.clone(), String::new())).collect())
            .unwrap_or_default();

        while let Some((id, prefix)) = stack.pop() {
            let Some(object) = inner.objects.get(&id) else {
                continue;
            };
            let path = format!("{prefix}{}", object.name);
            if object.folder {
                paths.push(format!("{path}/"));
                for child in &object.children {
                    stack.push((child.clone(), format!("{path}/")));
                }
            } else {
                paths.push(path);
            }
        }

        paths.sort();
        paths
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageClient for MemoryStorage {
    async fn list_children(
        &self,
        folder: &RemoteId,
        page_token: Option<&str>,
    ) -> Result<ListPage, RemoteError> {
        let mut inner = self.lock();
        inner.calls.push(Call::List {
            folder: folder.clone(),
            page_token: page_token.map(str::to_string),
        });
        if inner.fail_list.contains(folder) {
            return Err(RemoteError::api(format!("listing {folder} refused")));
        }

        let offset = match page_token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| RemoteError::api(format!("invalid page token '{token}'")))?,
            None => 0,
        };
        let children = &inner.folder(folder)?.children;
        let end = offset.saturating_add(self.page_size).min(children.len());
        let entries = children
            .get(offset..end)
            .unwrap_or_default()
            .iter()
            .filter_map(|id| {
                inner.objects.get(id).map(|o| {
                    let mime = if o.folder { FOLDER_MIME_TYPE } else { PLAIN_MIME_TYPE };
                    RemoteEntry::new(id.clone(), o.name.clone(), mime)
                })
            })
            .collect();

        Ok(ListPage {
            entries,
            next_page_token: (end < children.len()).then(|| end.to_string()),
            skipped: Vec::new(),
        })
    }

    fn is_folder_kind(&self, mime_type: &str) -> bool {
        mime_type == FOLDER_MIME_TYPE
    }

    async fn create_folder(&self, name: &str, parent: &RemoteId) -> Result<RemoteId, RemoteError> {
        let mut inner = self.lock();
        inner.calls.push(Call::CreateFolder {
            name: name.to_string(),
            parent: parent.clone(),
        });
        if inner.fail_create.contains(name) {
            return Err(RemoteError::api(format!("creating '{name}' refused")));
        }
        inner.folder(parent)?;
        Ok(inner.insert(Some(parent), name, true))
    }

    async fn copy_file(
        &self,
        file: &RemoteId,
        parent: &RemoteId,
        new_name: Option<&str>,
    ) -> Result<RemoteId, RemoteError> {
        let mut inner = self.lock();
        inner.calls.push(Call::CopyFile {
            file: file.clone(),
            parent: parent.clone(),
            new_name: new_name.map(str::to_string),
        });

        let source_name = match inner.objects.get(file) {
            Some(object) if !object.folder => object.name.clone(),
            _ => return Err(RemoteError::NotFound { id: file.clone() }),
        };
        if inner.fail_copy.contains(source_name.as_str()) {
            return Err(RemoteError::api(format!("copying '{source_name}' refused")));
        }
        inner.folder(parent)?;

        let name = match new_name {
            Some(name) => CompactString::from(name),
            None => format_compact!("Copy of {source_name}"),
        };
        Ok(inner.insert(Some(parent), &name, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pages_and_journal() {
        let storage = MemoryStorage::new().with_page_size(2);
        let root = storage.add_root("root");
        for name in ["a", "b", "c"] {
            storage.add_file(&root, name);
        }

        let first = storage.list_children(&root, None).await.unwrap();
        assert_eq!(first.entries.len(), 2);
        let second = storage
            .list_children(&root, first.next_page_token.as_deref())
            .await
            .unwrap();
        assert_eq!(second.entries.len(), 1);
        assert!(second.next_page_token.is_none());
        assert_eq!(storage.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_page_token_past_the_end_gives_empty_last_page() {
        let storage = MemoryStorage::new().with_page_size(2);
        let root = storage.add_root("root");
        storage.add_file(&root, "a");

        let token = usize::MAX.to_string();
        let page = storage.list_children(&root, Some(&token)).await.unwrap();
        assert!(page.entries.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[tokio::test]
    async fn test_create_folder_is_not_idempotent() {
        let storage = MemoryStorage::new();
        let root = storage.add_root("root");
        let first = storage.create_folder("x", &root).await.unwrap();
        let second = storage.create_folder("x", &root).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(storage.paths_under(&root), vec!["x/", "x/"]);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let storage = MemoryStorage::new();
        let root = storage.add_root("root");
        let file = storage.add_file(&root, "f.txt");
        storage.fail_create_folder("bad");
        storage.fail_copy_file("f.txt");

        assert!(storage.create_folder("bad", &root).await.is_err());
        assert!(storage.copy_file(&file, &root, None).await.is_err());
        assert_eq!(storage.writes().len(), 2);
    }
}
