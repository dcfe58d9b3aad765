//! Process-wide collapsed-marker style registration.
//!
//! Rendering adapters share one style definition for collapsed markers,
//! registered once per process under a fixed id. `init` is guarded so repeated
//! calls do not duplicate the registration, and `teardown` is idempotent.

use std::sync::Mutex;

/// Style id for collapsed markers, in the integration-defined id space.
pub const MARKER_STYLE_ID: u32 = 0x0400_0001;

/// Fixed registration id, usable as a class name or style-sheet key by hosts.
pub const MARKER_STYLE_NAME: &str = "image-collapse-marker";

/// The shared style definition for collapsed markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerStyle {
    /// Numeric style id for interval/decoration based hosts.
    pub style_id: u32,
    /// Fixed registration name for keyed style stores.
    pub name: &'static str,
}

static REGISTRATION: Mutex<Option<MarkerStyle>> = Mutex::new(None);

fn registration() -> std::sync::MutexGuard<'static, Option<MarkerStyle>> {
    // A poisoned lock only means another thread panicked mid-init; the stored
    // value is a plain Copy record, so it is safe to keep using.
    REGISTRATION.lock().unwrap_or_else(|e| e.into_inner())
}

/// Register the marker style. Returns `true` if this call performed the
/// registration, `false` if it was already registered.
pub fn init_marker_style() -> bool {
    let mut slot = registration();
    if slot.is_some() {
        return false;
    }
    *slot = Some(MarkerStyle {
        style_id: MARKER_STYLE_ID,
        name: MARKER_STYLE_NAME,
    });
    true
}

/// The currently registered style, if any.
pub fn marker_style() -> Option<MarkerStyle> {
    *registration()
}

/// Deregister the marker style. Returns `true` if a registration was removed.
/// Safe to call repeatedly.
pub fn teardown_marker_style() -> bool {
    registration().take().is_some()
}
