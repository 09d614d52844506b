//! Manifest store: loads every manifest under a directory and orders them for apply.

use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use super::error::LoadError;
use super::manifest::Manifest;
use super::priority::PriorityTable;

/// The sorted manifests of the current reconciliation pass.
#[derive(Debug, Default)]
pub struct ManifestStore {
    table: PriorityTable,
    documents: Vec<Manifest>,
}

impl ManifestStore {
    /// Creates an empty store ranking kinds with `table`.
    pub fn new(table: PriorityTable) -> Self {
        Self {
            table,
            documents: Vec::new(),
        }
    }

    /// Returns the priority table in use.
    pub fn table(&self) -> &PriorityTable {
        &self.table
    }

    /// Replaces the collection with every file found under `root`.
    ///
    /// Any unreadable or unparsable file fails the whole reload and leaves
    /// the previous collection in place. Returns the number of manifests loaded.
    pub fn reload(&mut self, root: &Path) -> Result<usize, LoadError> {
        if !root.is_dir() {
            return Err(LoadError::ManifestsDirNotFound(root.to_path_buf()));
        }

        let mut documents = Vec::new();

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|source| LoadError::Walk {
                path: source
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf()),
                source,
            })?;

            if entry.file_type().is_dir() {
                continue;
            }

            let path = entry.path();
            let content = fs::read(path).map_err(|source| LoadError::ReadFile {
                path: path.to_path_buf(),
                source,
            })?;

            let manifest = Manifest::parse(path, &content).map_err(|e| LoadError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

            documents.push(manifest);
        }

        sort_by_priority(&mut documents, &self.table);
        self.documents = documents;
        Ok(self.documents.len())
    }

    /// Documents ordered by ascending rank, stable for equal ranks.
    pub fn sorted_documents(&self) -> &[Manifest] {
        &self.documents
    }

    /// Number of loaded documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns true when nothing has been loaded.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Stable sort of `documents` by the rank of their kind.
pub fn sort_by_priority(documents: &mut [Manifest], table: &PriorityTable) {
    documents.sort_by_key(|m| table.rank(m.kind()));
}
