// SPDX-License-Identifier: MIT OR Apache-2.0
//! Interactive ability preview.
//!
//! Editor-side counterpart of the simulation runtime. Where the runtime fires
//! each key exactly once, the preview re-samples the whole ability at the
//! playhead every frame so scrubbing and looping always show a consistent
//! picture.
//!
//! [`TimelineState`] owns the authoring ability together with view, selection,
//! playback and gesture state, and reports every change on a [`ChangeBus`].
//! [`PreviewSession`] layers preview mode on top.

pub mod bus;
pub mod error;
pub mod gesture;
pub mod playback;
pub mod sampler;
pub mod selection;
pub mod session;
pub mod state;

pub use bus::{ChangeBus, ChangeCallback, ChangeKind, SubscriptionId, TimelineChange};
pub use error::{PreviewError, Result};
pub use gesture::{Gesture, GestureKind, Pointer, RangeHandle};
pub use playback::{PlaybackDriver, PlaybackRange, PlaybackState, SnapSettings, MAX_SPEED, MIN_SPEED};
pub use sampler::{
    sample_ability, ClipPreview, KeyPreview, PreviewClipEvent, PreviewClipTracker, PreviewFrame,
    CLIP_JUMP_THRESHOLD, KEY_DISPLAY_WINDOW,
};
pub use selection::{KeyRef, Selection};
pub use session::{PreviewSession, PreviewUpdate};
pub use state::{TimelineState, ViewState, MAX_PIXELS_PER_SECOND, MIN_PIXELS_PER_SECOND};
