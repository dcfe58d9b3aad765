//! Encoded-image payload model, normalization, and validation.
//!
//! A payload is the full inline-image reference string embedded in document text:
//!
//! ```text
//! data:image/<subtype>;base64,<data>
//! ```
//!
//! This module provides:
//!
//! - strict reference-grammar parsing ([`ImagePayload::parse`])
//! - normalization of arbitrary pasted input into a full reference
//!   ([`ImagePayload::normalize`]), including binary-format sniffing from the
//!   Base64 prefix
//! - alphabet and partial-decode validation
//! - full decoding to bytes for export paths ([`ImagePayload::decode_bytes`])
//!
//! Validation is deliberately partial: only the first [`MIN_DATA_LEN`] characters
//! of the encoded data are decode-checked, so a payload can pass validation and
//! still fail a full [`ImagePayload::decode_bytes`] later. Callers that need the
//! bytes must handle [`DecodeError`] at that point.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::sync::Arc;

/// The scheme+subtype prefix every inline-image reference starts with.
pub const DATA_URI_PREFIX: &str = "data:image/";

/// Separator between the media subtype and the encoded data.
const BASE64_MARKER: &str = ";base64,";

/// Minimum encoded-data length (in characters) for a reference to qualify.
///
/// Shorter matches are deliberately ignored to avoid false positives on small
/// inline assets (icons, spacer pixels). The same constant bounds how much of
/// the data the partial-decode validity check inspects.
pub const MIN_DATA_LEN: usize = 100;

/// Binary image formats recognized by prefix sniffing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    /// Portable Network Graphics.
    Png,
    /// JPEG / JFIF.
    Jpeg,
    /// Graphics Interchange Format.
    Gif,
    /// WebP (RIFF container).
    Webp,
}

/// Base64 prefixes of known magic numbers, longest / most specific first.
const SNIFF_TABLE: &[(&str, ImageFormat)] = &[
    ("iVBORw0KGgo", ImageFormat::Png),
    ("R0lGOD", ImageFormat::Gif),
    ("UklGR", ImageFormat::Webp),
    ("/9j/", ImageFormat::Jpeg),
];

impl ImageFormat {
    /// The media subtype used in the reference grammar (`png`, `jpeg`, ...).
    pub fn subtype(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
            Self::Webp => "webp",
        }
    }

    /// Look up a format from a reference's media subtype.
    pub fn from_subtype(subtype: &str) -> Option<Self> {
        match subtype {
            "png" => Some(Self::Png),
            "jpeg" | "jpg" => Some(Self::Jpeg),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }

    /// Sniff the binary format from the leading characters of cleaned Base64 data.
    ///
    /// Unrecognized prefixes default to [`ImageFormat::Png`].
    pub fn sniff(data: &str) -> Self {
        for (prefix, format) in SNIFF_TABLE {
            if data.starts_with(prefix) {
                return *format;
            }
        }
        Self::Png
    }
}

/// Payload normalization/validation errors (the `InvalidPayload` condition).
///
/// All variants are recoverable: callers surface the message to the user and
/// must not apply the unvalidated payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    /// The reference does not start with `data:image/`.
    MissingPrefix,
    /// The reference does not parse into `(subtype, data)` via the grammar.
    MalformedReference(String),
    /// The encoded data contains a character outside the Base64 alphabet.
    InvalidAlphabet {
        /// The offending character.
        found: char,
    },
    /// The leading portion of the encoded data failed to decode.
    DecodeCheckFailed(base64::DecodeError),
}

impl std::fmt::Display for PayloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingPrefix => {
                write!(f, "not an inline image reference (expected `{DATA_URI_PREFIX}` prefix)")
            }
            Self::MalformedReference(reason) => write!(f, "malformed image reference: {reason}"),
            Self::InvalidAlphabet { found } => {
                write!(f, "invalid Base64 character {found:?} in image data")
            }
            Self::DecodeCheckFailed(err) => write!(f, "image data failed decode check: {err}"),
        }
    }
}

impl std::error::Error for PayloadError {}

/// Full-decode errors (the `DecodeFailure` condition, hit on export paths).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError(base64::DecodeError);

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "image data is not valid Base64: {}", self.0)
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

/// A normalized inline-image reference: `data:image/<subtype>;base64,<data>`.
///
/// The full reference string is stored as a shared `Arc<str>`, so clones are
/// cheap and widget keys derived from a payload share the same allocation.
/// Equality compares reference contents, which is exactly the widget-identity
/// contract consumers rely on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImagePayload {
    reference: Arc<str>,
    subtype_len: usize,
}

impl ImagePayload {
    /// Build a payload from already-split parts. The locator uses this for
    /// regex captures, which are shape-correct by construction.
    pub(crate) fn from_parts(subtype: &str, data: &str) -> Self {
        let reference: Arc<str> = format!("{DATA_URI_PREFIX}{subtype}{BASE64_MARKER}{data}").into();
        Self {
            reference,
            subtype_len: subtype.len(),
        }
    }

    /// Parse a full reference string via the reference grammar.
    ///
    /// This checks shape only (prefix, subtype, non-empty data); it does not
    /// validate the data itself. Use [`ImagePayload::normalize`] for inputs
    /// that must also pass the alphabet and decode checks.
    pub fn parse(reference: &str) -> Result<Self, PayloadError> {
        let Some(rest) = reference.strip_prefix(DATA_URI_PREFIX) else {
            return Err(PayloadError::MissingPrefix);
        };
        let Some(marker) = rest.find(BASE64_MARKER) else {
            return Err(PayloadError::MalformedReference(
                "missing `;base64,` marker".to_string(),
            ));
        };
        let subtype = &rest[..marker];
        if subtype.is_empty() {
            return Err(PayloadError::MalformedReference(
                "empty media subtype".to_string(),
            ));
        }
        if !subtype
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '-'))
        {
            return Err(PayloadError::MalformedReference(format!(
                "invalid media subtype `{subtype}`"
            )));
        }
        let data = &rest[marker + BASE64_MARKER.len()..];
        if data.is_empty() {
            return Err(PayloadError::MalformedReference(
                "empty image data".to_string(),
            ));
        }

        Ok(Self {
            reference: Arc::from(reference),
            subtype_len: subtype.len(),
        })
    }

    /// Normalize arbitrary pasted input into a validated payload.
    ///
    /// - Input already carrying the `data:image/` prefix is parsed and
    ///   validated as-is; the reference string is preserved unchanged.
    /// - Anything else is treated as raw Base64 data: whitespace is stripped,
    ///   the binary format is sniffed from the leading characters
    ///   ([`ImageFormat::sniff`]), and a full reference is synthesized.
    ///
    /// Validation covers the reference grammar, the Base64 alphabet, and a
    /// decode of the first [`MIN_DATA_LEN`] data characters.
    pub fn normalize(input: &str) -> Result<Self, PayloadError> {
        let input = input.trim();
        if input.starts_with(DATA_URI_PREFIX) {
            let payload = Self::parse(input)?;
            payload.validate()?;
            return Ok(payload);
        }

        let cleaned: String = input.chars().filter(|c| !c.is_whitespace()).collect();
        if cleaned.is_empty() {
            return Err(PayloadError::MalformedReference(
                "empty image data".to_string(),
            ));
        }
        let format = ImageFormat::sniff(&cleaned);
        let payload = Self::from_parts(format.subtype(), &cleaned);
        payload.validate()?;
        Ok(payload)
    }

    /// Validate this payload's encoded data: alphabet check plus a partial
    /// decode of the first [`MIN_DATA_LEN`] characters.
    ///
    /// This is a cheap partial-validity check, not a round-trip guarantee.
    pub fn validate(&self) -> Result<(), PayloadError> {
        let cleaned: String = self.data().chars().filter(|c| !c.is_whitespace()).collect();
        check_alphabet(&cleaned)?;

        // Alphabet check guarantees ASCII, so byte slicing is safe. MIN_DATA_LEN
        // is a multiple of 4, so a long prefix never cuts a Base64 quantum.
        let checked = if cleaned.len() > MIN_DATA_LEN {
            &cleaned[..MIN_DATA_LEN]
        } else {
            cleaned.as_str()
        };
        STANDARD
            .decode(checked)
            .map_err(PayloadError::DecodeCheckFailed)?;
        Ok(())
    }

    /// The full reference string.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// The full reference as a shared string, for deriving widget keys.
    pub fn shared_reference(&self) -> Arc<str> {
        Arc::clone(&self.reference)
    }

    /// The media subtype (`png`, `jpeg`, ...).
    pub fn subtype(&self) -> &str {
        &self.reference[DATA_URI_PREFIX.len()..DATA_URI_PREFIX.len() + self.subtype_len]
    }

    /// The known [`ImageFormat`] for this payload's subtype, if any.
    pub fn format(&self) -> Option<ImageFormat> {
        ImageFormat::from_subtype(self.subtype())
    }

    /// The encoded data portion of the reference.
    pub fn data(&self) -> &str {
        &self.reference[DATA_URI_PREFIX.len() + self.subtype_len + BASE64_MARKER.len()..]
    }

    /// Length of the encoded data in characters.
    pub fn data_len(&self) -> usize {
        self.data().chars().count()
    }

    /// Fully decode the encoded data to bytes (whitespace-tolerant).
    ///
    /// Used by export paths, where partial validity is not enough.
    pub fn decode_bytes(&self) -> Result<Vec<u8>, DecodeError> {
        let cleaned: String = self.data().chars().filter(|c| !c.is_whitespace()).collect();
        STANDARD.decode(cleaned).map_err(DecodeError)
    }
}

/// Check that `data` consists of Base64 alphabet characters with optional
/// trailing `=` padding (at most two, only at the very end).
fn check_alphabet(data: &str) -> Result<(), PayloadError> {
    let trimmed = data.trim_end_matches('=');
    if data.len() - trimmed.len() > 2 {
        return Err(PayloadError::InvalidAlphabet { found: '=' });
    }
    for ch in trimmed.chars() {
        let ok = ch.is_ascii_alphanumeric() || ch == '+' || ch == '/';
        if !ok {
            return Err(PayloadError::InvalidAlphabet { found: ch });
        }
    }
    Ok(())
}
