// SPDX-License-Identifier: MIT OR Apache-2.0
//! Change notifications for timeline state observers.

use crate::gesture::GestureKind;
use crate::playback::PlaybackState;

/// Category of a change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// Something changed; observers should refresh
    State,
    /// Zoom or scroll
    View,
    /// Selection
    Selection,
    /// Playhead or playback settings
    Playback,
    /// Gesture began or ended
    Edit,
    /// Ability data edited or replaced
    Data,
}

/// A published change
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineChange {
    /// Something changed
    State,
    /// View changed
    View {
        /// Zoom in pixels per second
        pixels_per_second: f32,
        /// Horizontal scroll in pixels
        scroll_x: f32,
    },
    /// Selection changed
    Selection {
        /// Selected key count
        selected: usize,
    },
    /// Playback changed
    Playback {
        /// Playhead
        playhead: f32,
        /// Playback state
        state: PlaybackState,
    },
    /// Gesture state changed
    Edit {
        /// Active gesture
        gesture: GestureKind,
    },
    /// Ability data changed
    Data,
}

impl TimelineChange {
    /// Category of the change
    pub fn kind(&self) -> ChangeKind {
        match self {
            Self::State => ChangeKind::State,
            Self::View { .. } => ChangeKind::View,
            Self::Selection { .. } => ChangeKind::Selection,
            Self::Playback { .. } => ChangeKind::Playback,
            Self::Edit { .. } => ChangeKind::Edit,
            Self::Data => ChangeKind::Data,
        }
    }
}

/// Callback type for change notifications
pub type ChangeCallback = Box<dyn FnMut(&TimelineChange)>;

/// Handle returned by [`ChangeBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscriber {
    id: SubscriptionId,
    filter: Option<ChangeKind>,
    callback: ChangeCallback,
}

/// Synchronous publish/subscribe hub owned by the timeline state
#[derive(Default)]
pub struct ChangeBus {
    subscribers: Vec<Subscriber>,
    next_id: u64,
    published: u64,
}

impl std::fmt::Debug for ChangeBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeBus")
            .field("subscribers", &self.subscribers.len())
            .field("published", &self.published)
            .finish()
    }
}

impl ChangeBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback, optionally only for one kind of change
    pub fn subscribe(&mut self, filter: Option<ChangeKind>, callback: ChangeCallback) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscribers.push(Subscriber { id, filter, callback });
        id
    }

    /// Remove a callback. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    /// Deliver a change to every matching subscriber
    pub fn publish(&mut self, change: TimelineChange) {
        self.published += 1;
        let kind = change.kind();
        for subscriber in &mut self.subscribers {
            if subscriber.filter.map_or(true, |filter| filter == kind) {
                (subscriber.callback)(&change);
            }
        }
    }

    /// Number of subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Changes published so far
    pub fn published_count(&self) -> u64 {
        self.published
    }
}
