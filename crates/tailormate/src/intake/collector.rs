//! Accumulates the documents selected for one intake run.

use uuid::Uuid;

use super::preview::{build_preview, is_previewable, Preview};

/// A file as handed over by the caller, before it joins a batch.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    /// Declared media type. Guessed from `name` when absent.
    pub media_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: None,
            bytes,
        }
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }
}

/// A document in the batch. `storage_path` is set only after a successful
/// upload.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub id: Uuid,
    pub bytes: Vec<u8>,
    pub filename: String,
    pub media_type: String,
    pub preview: Option<Preview>,
    pub storage_path: Option<String>,
}

impl UploadedDocument {
    fn from_selection(file: SelectedFile, max_edge: u32) -> Self {
        let media_type = file
            .media_type
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| {
                mime_guess::from_path(&file.name)
                    .first_or_octet_stream()
                    .essence_str()
                    .to_string()
            });

        let preview = if is_previewable(&media_type) {
            build_preview(&file.bytes, max_edge)
        } else {
            None
        };

        Self {
            id: Uuid::new_v4(),
            bytes: file.bytes,
            filename: file.name,
            media_type,
            preview,
            storage_path: None,
        }
    }
}

/// Documents collected for one run, in selection order.
#[derive(Debug, Clone)]
pub struct IntakeBatch {
    documents: Vec<UploadedDocument>,
    max_edge: u32,
}

impl Default for IntakeBatch {
    fn default() -> Self {
        Self::new(256)
    }
}

impl IntakeBatch {
    pub fn new(preview_max_edge: u32) -> Self {
        Self {
            documents: Vec::new(),
            max_edge: preview_max_edge,
        }
    }

    /// Appends the selection. Previously added documents are kept.
    /// Returns the ids assigned to the new documents.
    pub fn add_files<I>(&mut self, selection: I) -> Vec<Uuid>
    where
        I: IntoIterator<Item = SelectedFile>,
    {
        let start = self.documents.len();
        for file in selection {
            self.documents
                .push(UploadedDocument::from_selection(file, self.max_edge));
        }

        let added: Vec<Uuid> = self.documents[start..].iter().map(|d| d.id).collect();
        if !added.is_empty() {
            tracing::debug!(
                added = added.len(),
                total = self.documents.len(),
                "Files added to batch"
            );
        }
        added
    }

    /// Drops one document and its preview. Returns false for unknown ids.
    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.documents.len();
        self.documents.retain(|d| d.id != id);
        self.documents.len() != before
    }

    pub fn clear(&mut self) {
        self.documents.clear();
    }

    pub fn documents(&self) -> &[UploadedDocument] {
        &self.documents
    }

    pub(crate) fn documents_mut(&mut self) -> &mut [UploadedDocument] {
        &mut self.documents
    }

    pub fn get(&self, id: Uuid) -> Option<&UploadedDocument> {
        self.documents.iter().find(|d| d.id == id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Storage paths of every uploaded document, in batch order.
    pub fn storage_paths(&self) -> Vec<String> {
        self.documents
            .iter()
            .filter_map(|d| d.storage_path.clone())
            .collect()
    }

    /// Forgets all storage paths so the batch can be uploaded again.
    pub fn clear_storage_paths(&mut self) {
        for doc in &mut self.documents {
            doc.storage_path = None;
        }
    }
}
