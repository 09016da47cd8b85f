/// Ground sensor: folds overlapping-contact events into a grounded flag.
///
/// Purely event-driven. The host reports every enter/exit seen by the
/// player's ground probe; only `Ground`-tagged contacts count, and the
/// probe's own collider is filtered by identity (never by tag).

use tracing::trace;

use super::entity::{ColliderId, ContactTag};

#[derive(Clone, Debug)]
pub struct GroundSensor {
    own: ColliderId,
    count: u32,
}

impl GroundSensor {
    pub fn new(own: ColliderId) -> Self {
        GroundSensor { own, count: 0 }
    }

    fn counts(&self, collider: ColliderId, tag: ContactTag) -> bool {
        collider != self.own && tag == ContactTag::Ground
    }

    pub fn on_contact_enter(&mut self, collider: ColliderId, tag: ContactTag) {
        if !self.counts(collider, tag) { return; }
        self.count += 1;
        trace!(contacts = self.count, "ground contact added");
    }

    /// Exit without a matching enter (reordered events, reload) clamps at zero.
    pub fn on_contact_exit(&mut self, collider: ColliderId, tag: ContactTag) {
        if !self.counts(collider, tag) { return; }
        self.count = self.count.saturating_sub(1);
        trace!(contacts = self.count, "ground contact removed");
    }

    pub fn is_grounded(&self) -> bool {
        self.count > 0
    }

    pub fn contact_count(&self) -> u32 {
        self.count
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }
}
