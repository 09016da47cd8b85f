/// One-shot triggers the player can touch: time pickups and the level goal.

use super::entity::BodyRef;

/// Adds `value` seconds to the clock the first time the player touches it.
#[derive(Clone, Debug)]
pub struct TimePickup {
    pub body: BodyRef,
    pub value: f32,
    collected: bool,
}

impl TimePickup {
    pub fn new(body: BodyRef, value: f32) -> Self {
        TimePickup { body, value, collected: false }
    }

    /// Seconds to add, or `None` if already taken.
    pub fn collect(&mut self) -> Option<f32> {
        if self.collected { return None; }
        self.collected = true;
        Some(self.value)
    }

    pub fn is_collected(&self) -> bool {
        self.collected
    }
}

/// The finish line. Reached once per life.
#[derive(Clone, Debug)]
pub struct Goal {
    pub body: BodyRef,
    reached: bool,
}

impl Goal {
    pub fn new(body: BodyRef) -> Self {
        Goal { body, reached: false }
    }

    /// Returns true on the first touch only.
    pub fn reach(&mut self) -> bool {
        if self.reached { return false; }
        self.reached = true;
        true
    }

    pub fn is_reached(&self) -> bool {
        self.reached
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pickup_pays_once() {
        let mut p = TimePickup::new(BodyRef(3), 3.0);
        assert_eq!(p.collect(), Some(3.0));
        assert_eq!(p.collect(), None);
        assert!(p.is_collected());
    }

    #[test]
    fn goal_reached_once() {
        let mut g = Goal::new(BodyRef(9));
        assert!(!g.is_reached());
        assert!(g.reach());
        assert!(!g.reach());
    }
}
