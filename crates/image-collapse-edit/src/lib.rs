//! `image-collapse-edit` - Edit workflows for `image-collapse` occurrences.
//!
//! The core crate locates embedded images and decorates them; this crate
//! implements what happens when the user confirms a change in the edit dialog.
//! Every confirmed outcome is applied as **exactly one**
//! [`replace_range`](image_collapse::TextSurfaceHandle::replace_range) call on
//! the occurrence's span, so the host sees a single content-changed event per
//! edit:
//!
//! - **Replace**: normalize the user's input (bare Base64 or full reference)
//!   and rewrite the occurrence in place.
//! - **Delete**: replace the span with the empty string.
//! - **Convert to file**: decode the payload, write the bytes through the
//!   host's [`FileStore`], and rewrite the occurrence as a plain file
//!   reference.
//!
//! File systems and clipboards belong to the host and are reached through the
//! small capability traits here. All errors are recoverable: a failed
//! operation reports why and leaves the document untouched.

use image_collapse::{
    DecodeError, EditCollaborator, ImageFormat, ImagePayload, Occurrence, PayloadError,
    TextSurfaceHandle,
};
use thiserror::Error;

/// A host-side failure (file system or clipboard operation rejected).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HostError {
    message: String,
}

impl HostError {
    /// Create a host error with a human-readable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors from edit workflows. None of these leave the document mutated.
#[derive(Debug, Error)]
pub enum EditError {
    /// The replacement input failed normalization/validation.
    #[error("invalid image payload: {0}")]
    InvalidPayload(#[from] PayloadError),
    /// The payload's encoded data failed to fully decode.
    #[error("image decode failed: {0}")]
    Decode(#[from] DecodeError),
    /// A host file-system or clipboard operation was rejected.
    #[error("host operation failed: {0}")]
    Host(#[from] HostError),
}

/// Host file storage capability.
pub trait FileStore {
    /// Persist `bytes` under `file_name` and return the link target (path or
    /// URL) to embed in the document.
    fn write(&mut self, file_name: &str, bytes: &[u8]) -> Result<String, HostError>;
}

/// Host clipboard capability.
pub trait Clipboard {
    /// Place `text` on the clipboard.
    fn set_text(&mut self, text: &str) -> Result<(), HostError>;
}

/// Summary of an occurrence's image, for dialog display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    /// The reference's media subtype.
    pub subtype: String,
    /// The recognized format, if the subtype is a known one.
    pub format: Option<ImageFormat>,
    /// Length of the encoded data in characters.
    pub data_len: usize,
    /// Approximate decoded size in bytes (3/4 of the encoded length).
    pub approx_byte_len: usize,
}

/// The net change a user confirmed in the edit dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditDecision {
    /// Keep the image but rewrite alt text and/or payload.
    Replace {
        /// New alt text.
        alt_text: String,
        /// New payload input: bare Base64 or a full reference; normalized on
        /// apply.
        payload: String,
    },
    /// Remove the occurrence from the document.
    Delete,
    /// Move the image data out of the document into host storage.
    ConvertToFile {
        /// File name to store the decoded bytes under.
        file_name: String,
    },
    /// Close the dialog without changing anything.
    Cancel,
}

/// One editing interaction bound to an occurrence and a surface handle.
///
/// The bound span is only valid until the first mutation, so every mutating
/// method consumes the session: one session, at most one `replace_range`.
pub struct ImageEditSession<'a> {
    occurrence: Occurrence,
    surface: &'a mut dyn TextSurfaceHandle,
}

impl<'a> ImageEditSession<'a> {
    /// Bind an occurrence (resolved against the surface's current text) to the
    /// surface's mutation handle.
    pub fn new(occurrence: Occurrence, surface: &'a mut dyn TextSurfaceHandle) -> Self {
        Self {
            occurrence,
            surface,
        }
    }

    /// The occurrence being edited.
    pub fn occurrence(&self) -> &Occurrence {
        &self.occurrence
    }

    /// Summary of the occurrence's image for dialog display.
    pub fn preview_info(&self) -> ImageInfo {
        let payload = &self.occurrence.payload;
        let data_len = payload.data_len();
        ImageInfo {
            subtype: payload.subtype().to_string(),
            format: payload.format(),
            data_len,
            approx_byte_len: data_len / 4 * 3,
        }
    }

    /// Fully decode the occurrence's image data, for export or preview.
    pub fn export_bytes(&self) -> Result<Vec<u8>, EditError> {
        Ok(self.occurrence.payload.decode_bytes()?)
    }

    /// Copy the full reference string to the host clipboard.
    pub fn copy_reference(&self, clipboard: &mut dyn Clipboard) -> Result<(), EditError> {
        clipboard.set_text(self.occurrence.payload.reference())?;
        Ok(())
    }

    /// Rewrite the occurrence with new alt text and payload input.
    ///
    /// The input is normalized first; invalid input returns
    /// [`EditError::InvalidPayload`] without touching the text.
    pub fn replace(self, alt_text: &str, payload_input: &str) -> Result<(), EditError> {
        let payload = ImagePayload::normalize(payload_input)?;
        let replacement = format!("![{alt_text}]({})", payload.reference());
        self.apply_replacement(&replacement);
        Ok(())
    }

    /// Delete the occurrence: replace its exact span with the empty string.
    pub fn delete(self) {
        self.apply_replacement("");
    }

    /// Convert the occurrence to an external file: decode, store, and rewrite
    /// the reference as `![alt](<link>)`.
    ///
    /// Decode and store failures abort before any text mutation. Returns the
    /// link target reported by the store.
    pub fn convert_to_file(
        self,
        store: &mut dyn FileStore,
        file_name: &str,
    ) -> Result<String, EditError> {
        let bytes = self.occurrence.payload.decode_bytes()?;
        let link = store.write(file_name, &bytes)?;
        let replacement = format!("![{}]({link})", self.occurrence.alt_text);
        self.apply_replacement(&replacement);
        Ok(link)
    }

    /// Apply a decision made by the dialog. `Cancel` is a no-op; the others
    /// mutate via their dedicated methods.
    pub fn apply(self, decision: EditDecision, store: &mut dyn FileStore) -> Result<bool, EditError> {
        match decision {
            EditDecision::Replace { alt_text, payload } => {
                self.replace(&alt_text, &payload)?;
                Ok(true)
            }
            EditDecision::Delete => {
                self.delete();
                Ok(true)
            }
            EditDecision::ConvertToFile { file_name } => {
                self.convert_to_file(store, &file_name)?;
                Ok(true)
            }
            EditDecision::Cancel => Ok(false),
        }
    }

    fn apply_replacement(self, replacement: &str) {
        let span = self.occurrence.span;
        self.surface.replace_range(span.start, span.end, replacement);
    }
}

/// An [`EditCollaborator`] driven by a decision function.
///
/// The decision function stands in for the host's dialog: it inspects the
/// occurrence and returns what the user confirmed. Everything after that —
/// validation, decoding, the single `replace_range` — happens here.
pub struct DialogCollaborator<F, S> {
    decide: F,
    store: S,
}

impl<F, S> DialogCollaborator<F, S>
where
    F: FnMut(&Occurrence) -> EditDecision,
    S: FileStore,
{
    /// Create a collaborator from a decision function and a file store.
    pub fn new(decide: F, store: S) -> Self {
        Self { decide, store }
    }

    /// The wrapped file store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<F, S> EditCollaborator for DialogCollaborator<F, S>
where
    F: FnMut(&Occurrence) -> EditDecision,
    S: FileStore,
{
    type Error = EditError;

    fn open_editor(
        &mut self,
        occurrence: &Occurrence,
        surface: &mut dyn TextSurfaceHandle,
    ) -> Result<bool, EditError> {
        let decision = (self.decide)(occurrence);
        let session = ImageEditSession::new(occurrence.clone(), surface);
        session.apply(decision, &mut self.store)
    }
}

/// A [`FileStore`] that rejects every write, for hosts without file storage.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFileStore;

impl FileStore for NoFileStore {
    fn write(&mut self, _file_name: &str, _bytes: &[u8]) -> Result<String, HostError> {
        Err(HostError::new("no file storage available"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image_collapse::{BufferSurface, TextSnapshot, occurrence_at};

    fn valid_data(len: usize) -> String {
        // Quantum-aligned so full decodes succeed.
        let len = len.div_ceil(4) * 4;
        "iVBORw0KGgoAAAANSUhEUg/+"
            .chars()
            .cycle()
            .take(len)
            .collect()
    }

    fn surface_with(alt: &str, data: &str) -> BufferSurface {
        BufferSurface::new(&format!("pre ![{alt}](data:image/png;base64,{data}) post"))
    }

    struct MemStore(Vec<(String, Vec<u8>)>);

    impl FileStore for MemStore {
        fn write(&mut self, file_name: &str, bytes: &[u8]) -> Result<String, HostError> {
            self.0.push((file_name.to_string(), bytes.to_vec()));
            Ok(format!("media/{file_name}"))
        }
    }

    #[test]
    fn test_preview_info() {
        let mut surface = surface_with("cat", &valid_data(120));
        let occ = occurrence_at(surface.text(), 5).unwrap();
        let session = ImageEditSession::new(occ, &mut surface);

        let info = session.preview_info();
        assert_eq!(info.subtype, "png");
        assert_eq!(info.format, Some(ImageFormat::Png));
        assert_eq!(info.data_len, 120);
        assert_eq!(info.approx_byte_len, 90);
    }

    #[test]
    fn test_replace_rejects_invalid_payload_without_mutation() {
        let mut surface = surface_with("cat", &valid_data(120));
        let before = surface.text().to_string();
        let occ = occurrence_at(surface.text(), 5).unwrap();

        let session = ImageEditSession::new(occ, &mut surface);
        let err = session.replace("cat", "not*valid*base64").unwrap_err();

        assert!(matches!(err, EditError::InvalidPayload(_)));
        assert_eq!(surface.text(), before);
    }

    #[test]
    fn test_copy_reference() {
        #[derive(Default)]
        struct MemClipboard(Option<String>);
        impl Clipboard for MemClipboard {
            fn set_text(&mut self, text: &str) -> Result<(), HostError> {
                self.0 = Some(text.to_string());
                Ok(())
            }
        }

        let data = valid_data(120);
        let mut surface = surface_with("cat", &data);
        let occ = occurrence_at(surface.text(), 5).unwrap();
        let session = ImageEditSession::new(occ, &mut surface);

        let mut clipboard = MemClipboard::default();
        session.copy_reference(&mut clipboard).unwrap();
        assert_eq!(
            clipboard.0.unwrap(),
            format!("data:image/png;base64,{data}")
        );
    }

    #[test]
    fn test_convert_to_file_failure_leaves_text_untouched() {
        struct FailingStore;
        impl FileStore for FailingStore {
            fn write(&mut self, _: &str, _: &[u8]) -> Result<String, HostError> {
                Err(HostError::new("disk full"))
            }
        }

        let mut surface = surface_with("cat", &valid_data(120));
        let before = surface.text().to_string();
        let occ = occurrence_at(surface.text(), 5).unwrap();

        let session = ImageEditSession::new(occ, &mut surface);
        let err = session.convert_to_file(&mut FailingStore, "cat.png").unwrap_err();

        assert!(matches!(err, EditError::Host(_)));
        assert_eq!(surface.text(), before);
    }

    #[test]
    fn test_convert_to_file_rewrites_reference() {
        let mut surface = surface_with("cat", &valid_data(120));
        let occ = occurrence_at(surface.text(), 5).unwrap();

        let mut store = MemStore(Vec::new());
        let session = ImageEditSession::new(occ, &mut surface);
        let link = session.convert_to_file(&mut store, "cat.png").unwrap();

        assert_eq!(link, "media/cat.png");
        assert_eq!(surface.text(), "pre ![cat](media/cat.png) post");
        assert_eq!(store.0.len(), 1);
        assert_eq!(store.0[0].0, "cat.png");
        assert!(!store.0[0].1.is_empty());
    }

    #[test]
    fn test_no_file_store_rejects() {
        assert!(NoFileStore.write("a.png", b"bytes").is_err());
    }
}
