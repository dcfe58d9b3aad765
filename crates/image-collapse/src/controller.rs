//! Live decoration controller.
//!
//! [`DecorationController`] owns the current [`DecorationSet`] for a live,
//! editable text surface and keeps it consistent with the surface's content.
//!
//! The state machine is deliberately simple: idle with a current set, a change
//! event triggers one synchronous rebuild against the new snapshot, and the
//! controller is idle again with the new set. There is no deferred or
//! asynchronous recompute state; rebuilds always run to completion before the
//! next event is processed, and the controller is single-threaded with respect
//! to its own state.
//!
//! A failed rebuild never destabilizes the host: any panic inside the pure
//! builder degrades to "no decorations for this snapshot" so the user can keep
//! editing plain text.

use crate::decoration::{BuildOptions, DecorationSet, WidgetKey, build_decorations_with};
use crate::scan::{Occurrence, count_occurrences, occurrence_at};
use crate::surface::{ChangeKind, TextSnapshot, TextSurfaceHandle};
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// The external edit dialog/workflow for a single occurrence.
///
/// `open_editor` may read the occurrence's payload and alt text and, on user
/// confirmation, performs exactly one
/// [`replace_range`](TextSurfaceHandle::replace_range) call on the handle
/// representing the net change. The resulting content-changed notification
/// drives the next rebuild; the controller itself never mutates text.
pub trait EditCollaborator {
    /// Error type surfaced when the edit workflow fails.
    type Error;

    /// Open the editor for `occurrence`. Returns `true` if an edit was
    /// applied, `false` if the user cancelled.
    fn open_editor(
        &mut self,
        occurrence: &Occurrence,
        surface: &mut dyn TextSurfaceHandle,
    ) -> Result<bool, Self::Error>;
}

/// Widget-identity changes between two consecutive decoration sets.
///
/// Keys appearing in both sets are `retained`: the host should keep those
/// widgets (and any widget-local open state) alive and only reposition them.
/// `added` keys need fresh replacement content; `removed` keys should be torn
/// down. Duplicate payloads are tracked by multiplicity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildDelta {
    /// Keys present before and after the rebuild.
    pub retained: Vec<WidgetKey>,
    /// Keys only present after the rebuild.
    pub added: Vec<WidgetKey>,
    /// Keys only present before the rebuild.
    pub removed: Vec<WidgetKey>,
}

impl RebuildDelta {
    fn between(previous: &DecorationSet, next: &DecorationSet) -> Self {
        let mut counts: HashMap<&WidgetKey, isize> = HashMap::new();
        for region in previous {
            *counts.entry(&region.widget_key).or_default() -= 1;
        }
        for region in next {
            *counts.entry(&region.widget_key).or_default() += 1;
        }

        let mut delta = Self::default();
        for region in next {
            let count = counts.entry(&region.widget_key).or_default();
            if *count > 0 {
                *count -= 1;
                delta.added.push(region.widget_key.clone());
            } else {
                delta.retained.push(region.widget_key.clone());
            }
        }
        for region in previous {
            let count = counts.entry(&region.widget_key).or_default();
            if *count < 0 {
                *count += 1;
                delta.removed.push(region.widget_key.clone());
            }
        }
        delta
    }

    /// Returns `true` if nothing changed widget-wise.
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Owns and reconciles the decoration set for one live text surface.
#[derive(Debug, Default)]
pub struct DecorationController {
    current: DecorationSet,
    options: BuildOptions,
    version: u64,
}

impl DecorationController {
    /// Create a controller with default build options and an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a controller with explicit build options.
    pub fn with_options(options: BuildOptions) -> Self {
        Self {
            current: DecorationSet::empty(),
            options,
            version: 0,
        }
    }

    /// The decoration-provider hook: the current set for painting.
    pub fn decorations(&self) -> &DecorationSet {
        &self.current
    }

    /// Number of rebuilds performed so far.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// React to a change notification: synchronously rebuild the decoration
    /// set against the new snapshot.
    ///
    /// Both change kinds trigger the same full rebuild; the previous set is
    /// discarded wholesale. The returned [`RebuildDelta`] tells the rendering
    /// layer which widgets survived.
    pub fn handle_change(&mut self, snapshot: &dyn TextSnapshot, _kind: ChangeKind) -> RebuildDelta {
        self.rebuild(snapshot.text())
    }

    /// Rebuild from raw text. Exposed for hosts whose snapshots are not behind
    /// the [`TextSnapshot`] trait.
    pub fn rebuild(&mut self, text: &str) -> RebuildDelta {
        let options = self.options;
        // A broken decoration pass must not take the host rendering pipeline
        // down with it; degrade to an empty set for this snapshot.
        let next = catch_unwind(AssertUnwindSafe(|| build_decorations_with(text, &options)))
            .unwrap_or_else(|_| DecorationSet::empty());

        let delta = RebuildDelta::between(&self.current, &next);
        self.current = next;
        self.version += 1;
        delta
    }

    /// Interaction dispatch: activate the region at `char_offset`.
    ///
    /// The occurrence is re-resolved against the surface's *current* text, not
    /// a cached span, and handed to the collaborator together with the
    /// mutation handle. Returns `Ok(None)` when no occurrence covers the
    /// offset, otherwise the collaborator's applied/cancelled result.
    pub fn activate<S, C>(
        &self,
        surface: &mut S,
        char_offset: usize,
        collaborator: &mut C,
    ) -> Result<Option<bool>, C::Error>
    where
        S: TextSnapshot + TextSurfaceHandle,
        C: EditCollaborator,
    {
        let Some(occurrence) = occurrence_at(surface.text(), char_offset) else {
            return Ok(None);
        };
        collaborator.open_editor(&occurrence, surface).map(Some)
    }

    /// Count qualifying occurrences in the given text ("find all").
    pub fn count_occurrences(text: &str) -> usize {
        count_occurrences(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::BufferSurface;

    fn data(prefix: &str) -> String {
        let mut data = prefix.to_string();
        while data.len() < 120 {
            data.push('C');
        }
        data
    }

    fn image(alt: &str, data_prefix: &str) -> String {
        format!("![{alt}](data:image/png;base64,{})", data(data_prefix))
    }

    struct DeletingCollaborator;

    impl EditCollaborator for DeletingCollaborator {
        type Error = std::convert::Infallible;

        fn open_editor(
            &mut self,
            occurrence: &Occurrence,
            surface: &mut dyn TextSurfaceHandle,
        ) -> Result<bool, Self::Error> {
            surface.replace_range(occurrence.span.start, occurrence.span.end, "");
            Ok(true)
        }
    }

    #[test]
    fn test_initial_state_is_empty() {
        let controller = DecorationController::new();
        assert!(controller.decorations().is_empty());
        assert_eq!(controller.version(), 0);
    }

    #[test]
    fn test_rebuild_replaces_set_wholesale() {
        let mut controller = DecorationController::new();
        let text = format!("a {} b", image("x", "iVBORw0KGgo"));

        let delta = controller.rebuild(&text);
        assert_eq!(controller.decorations().len(), 1);
        assert_eq!(delta.added.len(), 1);
        assert!(delta.retained.is_empty());

        let delta = controller.rebuild("plain");
        assert!(controller.decorations().is_empty());
        assert_eq!(delta.removed.len(), 1);
    }

    #[test]
    fn test_offset_shift_retains_widget() {
        let mut controller = DecorationController::new();
        let image = image("cat", "iVBORw0KGgo");

        controller.rebuild(&format!("A {image}"));
        let delta = controller.rebuild(&format!("A much longer prefix {image}"));

        assert!(delta.is_unchanged());
        assert_eq!(delta.retained.len(), 1);
        assert_eq!(controller.version(), 2);
    }

    #[test]
    fn test_payload_change_swaps_widget() {
        let mut controller = DecorationController::new();

        controller.rebuild(&image("cat", "iVBORw0KGgo"));
        let delta = controller.rebuild(&image("cat", "/9j/"));

        assert_eq!(delta.added.len(), 1);
        assert_eq!(delta.removed.len(), 1);
        assert!(delta.retained.is_empty());
    }

    #[test]
    fn test_duplicate_payload_multiplicity() {
        let mut controller = DecorationController::new();
        let image = image("dup", "iVBORw0KGgo");

        controller.rebuild(&format!("{image} {image}"));
        let delta = controller.rebuild(&image.to_string());

        assert_eq!(delta.retained.len(), 1);
        assert_eq!(delta.removed.len(), 1);
        assert!(delta.added.is_empty());
    }

    #[test]
    fn test_handle_change_both_kinds_rebuild() {
        let mut controller = DecorationController::new();
        let surface = BufferSurface::new(&image("x", "iVBORw0KGgo"));

        controller.handle_change(&surface, ChangeKind::ContentChanged);
        assert_eq!(controller.decorations().len(), 1);

        controller.handle_change(&surface, ChangeKind::VisibleRangeChanged);
        assert_eq!(controller.decorations().len(), 1);
        assert_eq!(controller.version(), 2);
    }

    #[test]
    fn test_activate_resolves_current_occurrence() {
        let image = image("cat", "iVBORw0KGgo");
        let mut surface = BufferSurface::new(&format!("A {image} B"));
        let mut controller = DecorationController::new();
        controller.rebuild(surface.text());

        let applied = controller
            .activate(&mut surface, 2, &mut DeletingCollaborator)
            .unwrap();
        assert_eq!(applied, Some(true));
        assert_eq!(surface.text(), "A  B");

        // The collaborator's edit produced a new snapshot; rebuild empties the set.
        let delta = controller.rebuild(surface.text());
        assert_eq!(delta.removed.len(), 1);
        assert!(controller.decorations().is_empty());
    }

    #[test]
    fn test_activate_outside_any_region() {
        let mut surface = BufferSurface::new("no images");
        let controller = DecorationController::new();

        let applied = controller
            .activate(&mut surface, 3, &mut DeletingCollaborator)
            .unwrap();
        assert_eq!(applied, None);
        assert_eq!(surface.text(), "no images");
    }

    #[test]
    fn test_count_occurrences_query() {
        let text = format!("{} {}", image("a", "iVBORw0KGgo"), image("b", "/9j/"));
        assert_eq!(DecorationController::count_occurrences(&text), 2);
    }
}
