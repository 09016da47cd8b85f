/// Events emitted during a tick.
/// The harness consumes these for sound and HUD messages; the presenter
/// consumes the end-of-level ones.

use crate::domain::entity::{BodyRef, Facing};

/// Level outcomes broadcast through the `OutcomeBus`. Each fires at most
/// once per life.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Outcome {
    TimeRanOut,
    GameWon,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    Jumped,
    AttackStarted { facing: Facing },
    EnemyDashing { enemy: BodyRef },
    EnemyBounced { enemy: BodyRef },
    EnemyKilled { enemy: BodyRef, bonus: f32 },
    EnemyDestroyed { enemy: BodyRef },
    PickupCollected { pickup: BodyRef, value: f32 },
    TimeAdded(f32),
    TimeSubtracted(f32),
    PlayerKilled,
    TimeRanOut,
    GameWon,
}
