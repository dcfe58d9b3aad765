#![warn(missing_docs)]
//! Image Collapse - Headless Inline-Image Decoration Engine
//!
//! # Overview
//!
//! `image-collapse` detects inline Base64-encoded images embedded in plain
//! text (`![alt](data:image/png;base64,...)`), and maps each one to a compact
//! collapsed replacement widget. It is headless: it owns no rendering, no file
//! system, and no document — hosts hand it read-only text snapshots and paint
//! the decoration sets it derives.
//!
//! # Core Features
//!
//! - **Occurrence Locator**: regex scan yielding ordered, non-overlapping
//!   matches in character offsets, with a minimum-data-size filter
//! - **Payload Normalization**: pasted raw Base64 is format-sniffed (PNG /
//!   JPEG / GIF / WebP magic prefixes) and synthesized into a full reference
//! - **Decoration Builder**: pure snapshot → decoration-set function,
//!   deterministic and side-effect-free
//! - **Live Controller**: synchronous rebuild per change event, with
//!   widget-identity deltas so hosts re-render only what changed
//! - **Host Seams**: snapshot/mutation traits plus an in-memory reference
//!   surface with change notifications
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  DecorationController (rebuild + dispatch)  │  ← Live reconciliation
//! ├─────────────────────────────────────────────┤
//! │  Decoration Builder (pure, per snapshot)    │  ← Region assembly
//! ├─────────────────────────────────────────────┤
//! │  Locator (regex scan, char offsets)         │  ← Occurrence discovery
//! ├─────────────────────────────────────────────┤
//! │  Payload Model (normalize / validate)       │  ← Reference grammar
//! ├─────────────────────────────────────────────┤
//! │  Surface Traits + LineIndex (Rope-based)    │  ← Host integration
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use image_collapse::build_decorations;
//!
//! let data = "iVBORw0KGgo".repeat(12); // ≥ 100 chars of encoded data
//! let text = format!("Intro ![cat](data:image/png;base64,{data}) outro");
//!
//! let set = build_decorations(&text);
//! assert_eq!(set.len(), 1);
//! assert_eq!(set.get(0).unwrap().alt_text, "cat");
//! ```
//!
//! ## Live reconciliation
//!
//! ```rust
//! use image_collapse::{BufferSurface, ChangeKind, DecorationController, TextSurfaceHandle};
//!
//! let data = "iVBORw0KGgo".repeat(12);
//! let mut surface = BufferSurface::new(&format!("![a](data:image/png;base64,{data})"));
//! let mut controller = DecorationController::new();
//!
//! controller.handle_change(&surface, ChangeKind::ContentChanged);
//! assert_eq!(controller.decorations().len(), 1);
//!
//! // An edit earlier in the document shifts the occurrence without changing it:
//! surface.replace_range(0, 0, "prefix ");
//! let delta = controller.handle_change(&surface, ChangeKind::ContentChanged);
//! assert!(delta.is_unchanged());
//! ```
//!
//! # Module Description
//!
//! - [`payload`] - reference grammar, normalization, and validation
//! - [`scan`] - the encoded-image locator
//! - [`decoration`] - decoration regions, sets, and the pure builder
//! - [`controller`] - the live decoration controller and collaborator seam
//! - [`surface`] - host text-surface traits and the in-memory reference surface
//! - [`line_index`] - rope-backed offset/position mapping
//! - [`style`] - process-wide marker style registration
//!
//! # Unicode Support
//!
//! All public offsets are character offsets (Unicode scalar values). Collapsed
//! marker labels are truncated on grapheme-cluster boundaries and measured in
//! display cells, so CJK and emoji alt text never get split mid-cluster.

pub mod controller;
pub mod decoration;
pub mod line_index;
pub mod payload;
pub mod scan;
pub mod style;
pub mod surface;

pub use controller::{DecorationController, EditCollaborator, RebuildDelta};
pub use decoration::{
    BuildOptions, DecorationRegion, DecorationSet, WidgetKey, build_decorations,
    build_decorations_with,
};
pub use line_index::LineIndex;
pub use payload::{
    DATA_URI_PREFIX, DecodeError, ImageFormat, ImagePayload, MIN_DATA_LEN, PayloadError,
};
pub use scan::{Occurrence, Occurrences, Span, count_occurrences, occurrence_at, scan};
pub use style::{
    MARKER_STYLE_ID, MARKER_STYLE_NAME, MarkerStyle, init_marker_style, marker_style,
    teardown_marker_style,
};
pub use surface::{
    BufferSurface, ChangeCallback, ChangeKind, Position, TextSnapshot, TextSurfaceHandle,
};
