use std::sync::Arc;
use std::path::Path;
use std::{fs, fmt};

use crate::error::{Result, Chainable};

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct EntryId(pub(crate) usize);

/// A snapshot of a directory tree, in sorted depth-first order.
#[derive(Debug)]
pub struct FsTree {
    entries: Vec<Entry>,
}

#[derive(Debug)]
pub struct Entry {
    pub id: EntryId,
    pub path: Arc<Path>,
    pub metadata: fs::Metadata,
    pub file_name: String,
    pub depth: usize,
}

#[derive(Default, Debug)]
struct FsMetadata(Option<fs::Metadata>);

impl FsTree {
    fn new() -> Self {
        Self { entries: vec![] }
    }

    /// Walks `root`. Entries are ordered so that every directory precedes its
    /// contents and siblings are sorted by file name.
    pub fn build<P: AsRef<Path>>(root: P) -> Result<Self> {
        use jwalk::WalkDirGeneric;

        let root = root.as_ref();
        let walker = WalkDirGeneric::<FsMetadata>::new(root)
            .follow_links(true)
            .sort(true)
            .process_read_dir(|_, _, _, entries| {
                entries.iter_mut()
                    .filter_map(|e| e.as_mut().ok())
                    .for_each(|e| e.client_state = FsMetadata(e.metadata().ok()))
            });

        let mut tree: FsTree = FsTree::new();
        for entry in walker {
            match entry {
                Ok(entry) => tree.insert(entry),
                Err(e) if tree.len() == 0 => return Err(e).chain_with(|| error! {
                    "failed to read directory",
                    "directory" => root.display(),
                }),
                Err(e) => tracing::warn!("skipping unreadable entry: {e}"),
            }
        }

        if tree.len() == 0 {
            return err! {
                "file system tree discovery yielded zero files",
                "search root" => root.display(),
            }
        }

        Ok(tree)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn root(&self) -> &Entry {
        &self[self.root_id()]
    }

    pub fn root_id(&self) -> EntryId {
        EntryId(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    pub fn files(&self) -> impl Iterator<Item = &Entry> {
        self.iter().filter(|e| e.metadata.is_file())
    }

    pub fn dirs(&self) -> impl Iterator<Item = &Entry> {
        self.iter().filter(|e| e.metadata.is_dir())
    }

    fn insert(&mut self, entry: jwalk::DirEntry<FsMetadata>) {
        // The root's metadata isn't read by `process_read_dir`.
        let metadata = match entry.client_state.0 {
            Some(ref metadata) => metadata.clone(),
            None => match entry.metadata() {
                Ok(metadata) => metadata,
                Err(_) => return,
            }
        };

        let entry = Entry {
            id: EntryId(self.entries.len()),
            path: Arc::from(entry.path().into_boxed_path()),
            metadata,
            file_name: entry.file_name.to_string_lossy().into_owned(),
            depth: entry.depth,
        };

        self.entries.push(entry);
    }
}

impl Entry {
    /// Path relative to the root of the tree.
    pub fn relative_path(&self) -> &Path {
        let mut components = self.path.components();
        for _ in 0..(self.path.components().count() - self.depth) {
            components.next();
        }

        components.as_path()
    }
}

impl jwalk::ClientState for FsMetadata {
    type ReadDirState = ();
    type DirEntryState = Self;
}

impl std::ops::Index<EntryId> for FsTree {
    type Output = Entry;

    fn index(&self, index: EntryId) -> &Self::Output {
        &self.entries[index.0]
    }
}

impl fmt::Debug for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
