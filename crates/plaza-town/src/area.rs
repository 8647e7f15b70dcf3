//! Conversation areas: labelled rectangles players gather in.

use std::fmt;
use std::sync::Arc;

use plaza_protocol::{BoundingBox, ConversationAreaInfo, PlayerId};

use crate::AreaListener;

/// A live conversation area inside one town.
///
/// Owns its occupant list (player IDs in enrollment order, no duplicates)
/// and its own small list of [`AreaListener`]s. The controller owns the
/// area and drives every mutation; the area itself only does bookkeeping
/// and fan-out.
pub struct ConversationArea {
    label: String,
    topic: String,
    bounding_box: BoundingBox,
    occupants: Vec<PlayerId>,
    listeners: Vec<Arc<dyn AreaListener>>,
}

impl ConversationArea {
    /// Creates an area with no occupants and no listeners.
    pub fn new(
        label: impl Into<String>,
        topic: impl Into<String>,
        bounding_box: BoundingBox,
    ) -> Self {
        Self {
            label: label.into(),
            topic: topic.into(),
            bounding_box,
            occupants: Vec::new(),
            listeners: Vec::new(),
        }
    }

    /// The area's label, unique within its town.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The conversation topic.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The area's footprint on the grid.
    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bounding_box
    }

    /// Occupant IDs in enrollment order.
    pub fn occupants(&self) -> &[PlayerId] {
        &self.occupants
    }

    /// Returns `true` if nobody is in the area.
    pub fn is_empty(&self) -> bool {
        self.occupants.is_empty()
    }

    /// Appends an occupant. Returns `false` (and changes nothing) if the
    /// player is already enrolled.
    pub(crate) fn add_occupant(&mut self, id: PlayerId) -> bool {
        if self.occupants.contains(&id) {
            return false;
        }
        self.occupants.push(id);
        true
    }

    /// Removes an occupant. Returns `false` if they were not enrolled.
    pub(crate) fn remove_occupant(&mut self, id: &PlayerId) -> bool {
        let before = self.occupants.len();
        self.occupants.retain(|o| o != id);
        self.occupants.len() != before
    }

    /// Subscribes a listener to this area's occupant changes. Adding the
    /// same listener twice is a no-op.
    pub fn add_listener(&mut self, listener: Arc<dyn AreaListener>) {
        if !self.listeners.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            self.listeners.push(listener);
        }
    }

    /// Unsubscribes a listener, matching by identity.
    pub fn remove_listener(&mut self, listener: &Arc<dyn AreaListener>) {
        self.listeners.retain(|l| !Arc::ptr_eq(l, listener));
    }

    /// Notifies the area's listeners of the current occupant list.
    pub(crate) fn notify_occupants_change(&self) {
        let listeners = self.listeners.clone();
        for listener in &listeners {
            listener.on_occupants_change(Some(&self.occupants));
        }
    }

    /// Notifies the area's listeners that the area is gone.
    pub(crate) fn notify_destroyed(&self) {
        let listeners = self.listeners.clone();
        for listener in &listeners {
            listener.on_occupants_change(None);
        }
    }

    /// Takes a snapshot suitable for events and wire transfer.
    pub fn to_info(&self) -> ConversationAreaInfo {
        ConversationAreaInfo {
            label: self.label.clone(),
            topic: self.topic.clone(),
            bounding_box: self.bounding_box,
            occupants_by_id: self.occupants.clone(),
        }
    }
}

impl fmt::Debug for ConversationArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversationArea")
            .field("label", &self.label)
            .field("topic", &self.topic)
            .field("bounding_box", &self.bounding_box)
            .field("occupants", &self.occupants)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
