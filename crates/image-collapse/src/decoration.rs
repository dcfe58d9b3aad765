//! Decoration model and builder.
//!
//! A [`DecorationRegion`] is the renderable replacement computed for one
//! [`Occurrence`](crate::scan::Occurrence) against a specific text snapshot:
//! the host paints a compact
//! collapsed marker over the region's span instead of the raw reference text.
//!
//! Regions are value types. They are created fresh on every rebuild and never
//! mutated in place; the previous [`DecorationSet`] is discarded wholesale when
//! a new snapshot arrives. Widget identity across rebuilds is carried by
//! [`WidgetKey`], which is derived solely from the payload — an unchanged image
//! whose position shifted still compares as "the same widget", so the host can
//! keep its rendered replacement (and any widget-local open state) alive.

use crate::payload::ImagePayload;
use crate::scan::{Span, scan};
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Identity token for a rendered replacement widget.
///
/// Derived solely from the payload reference, never from the span. Two regions
/// with equal keys represent the same image even at different offsets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WidgetKey(Arc<str>);

impl WidgetKey {
    /// Derive the key for a payload.
    pub fn of(payload: &ImagePayload) -> Self {
        Self(payload.shared_reference())
    }

    /// The full payload reference backing this key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Options controlling how collapsed markers are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Maximum display width of a marker label, in terminal cells.
    pub label_width: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self { label_width: 24 }
    }
}

/// A renderable replacement for one occurrence in one text snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecorationRegion {
    /// Character span to replace on screen, copied from the occurrence at
    /// build time. Valid only against the snapshot the set was built from.
    pub span: Span,
    /// Widget-identity token, derived from the payload only.
    pub widget_key: WidgetKey,
    /// The occurrence's alt text (may be empty).
    pub alt_text: String,
    /// Collapsed-marker text for the host to paint, width-limited.
    pub label: String,
}

impl DecorationRegion {
    /// Returns `true` if `other` renders the same widget, regardless of span.
    ///
    /// This is the re-render suppression contract: hosts must re-render a
    /// region's replacement content when this is `false`, and should preserve
    /// widget-local state when it is `true`.
    pub fn same_widget(&self, other: &DecorationRegion) -> bool {
        self.widget_key == other.widget_key
    }
}

/// An ordered, non-overlapping set of decoration regions for one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecorationSet {
    regions: Vec<DecorationRegion>,
}

impl DecorationSet {
    /// The empty set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Assemble a set from regions that may come from an arbitrary source.
    ///
    /// Regions are sorted by ascending span start. The locator already yields
    /// ascending, non-overlapping matches, but composed inputs must not be
    /// assumed ordered.
    pub fn from_regions(mut regions: Vec<DecorationRegion>) -> Self {
        regions.sort_by_key(|r| (r.span.start, r.span.end));
        Self { regions }
    }

    /// Number of regions.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Returns `true` if the set has no regions.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// The regions in ascending span order.
    pub fn regions(&self) -> &[DecorationRegion] {
        &self.regions
    }

    /// Iterate over the regions in ascending span order.
    pub fn iter(&self) -> std::slice::Iter<'_, DecorationRegion> {
        self.regions.iter()
    }

    /// The region at index `idx`, if any.
    pub fn get(&self, idx: usize) -> Option<&DecorationRegion> {
        self.regions.get(idx)
    }

    /// The region whose span covers `char_offset`, if any.
    pub fn region_at(&self, char_offset: usize) -> Option<&DecorationRegion> {
        let idx = self
            .regions
            .partition_point(|r| r.span.end <= char_offset);
        self.regions
            .get(idx)
            .filter(|r| r.span.contains(char_offset))
    }
}

impl<'a> IntoIterator for &'a DecorationSet {
    type Item = &'a DecorationRegion;
    type IntoIter = std::slice::Iter<'a, DecorationRegion>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Build the decoration set for a text snapshot with default options.
///
/// Pure and deterministic: no I/O, no caller state, identical snapshots yield
/// identical sets. Safe to call on every change event.
pub fn build_decorations(text: &str) -> DecorationSet {
    build_decorations_with(text, &BuildOptions::default())
}

/// Build the decoration set for a text snapshot.
pub fn build_decorations_with(text: &str, options: &BuildOptions) -> DecorationSet {
    let regions = scan(text)
        .map(|occurrence| DecorationRegion {
            span: occurrence.span,
            widget_key: WidgetKey::of(&occurrence.payload),
            label: marker_label(&occurrence.alt_text, options.label_width),
            alt_text: occurrence.alt_text,
        })
        .collect();
    // Scan order is already ascending and non-overlapping; from_regions sorts
    // anyway so composed callers get the same guarantee.
    DecorationSet::from_regions(regions)
}

/// Marker shown when the alt text is empty.
const FALLBACK_LABEL: &str = "image";

/// Marker prefix: a pictograph plus a space.
const MARKER_PREFIX: &str = "\u{1F5BC} ";

/// Build a collapsed-marker label, truncated on grapheme boundaries so it
/// never exceeds `max_width` display cells.
fn marker_label(alt_text: &str, max_width: usize) -> String {
    let alt = if alt_text.trim().is_empty() {
        FALLBACK_LABEL
    } else {
        alt_text
    };

    let mut label = String::from(MARKER_PREFIX);
    let mut used = label.width();

    if used + alt.width() <= max_width {
        label.push_str(alt);
        return label;
    }

    let budget = max_width.saturating_sub(1); // reserve one cell for the ellipsis
    for grapheme in alt.graphemes(true) {
        let w = grapheme.width();
        if used + w > budget {
            break;
        }
        label.push_str(grapheme);
        used += w;
    }
    label.push('…');
    label
}
