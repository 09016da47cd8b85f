/// Collaborator seams between the core and whatever hosts it.
///
/// The physics host is required: every body the world drives must exist
/// in it when the world is built. The presentation sinks are optional and
/// silently skipped when absent.

use crate::domain::entity::{BodyRef, ColliderId, ContactTag, Facing};
use crate::domain::vec2::Vec2;

/// Input sampled once per frame tick. The two actions are edges, not levels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameInput {
    pub axis: Vec2,
    pub jump_pressed: bool,
    pub attack_pressed: bool,
}

/// Rigid-body world owned by the host.
pub trait PhysicsHost {
    fn contains(&self, body: BodyRef) -> bool;
    /// Position of `body`; unknown bodies report the origin.
    fn position(&self, body: BodyRef) -> Vec2;
    fn velocity(&self, body: BodyRef) -> Vec2;
    fn set_velocity(&mut self, body: BodyRef, velocity: Vec2);
    /// Instant positional displacement, bypassing velocity.
    fn translate(&mut self, body: BodyRef, delta: Vec2);
    /// Bodies carrying `tag` whose box comes within `radius` of `origin`,
    /// measured to the closest point of the box.
    fn overlap_circle(&self, origin: Vec2, radius: f32, tag: ContactTag) -> Vec<BodyRef>;
    fn despawn(&mut self, body: BodyRef);
}

/// Contact notifications the host feeds to `step::handle_contact`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ContactEvent {
    /// Something entered the player's ground probe.
    SensorEnter { collider: ColliderId, tag: ContactTag },
    SensorExit { collider: ColliderId, tag: ContactTag },
    /// Player and enemy bodies touching. Reported every physics tick while
    /// the overlap lasts.
    PlayerEnemy { enemy: BodyRef },
    PlayerPickup { pickup: BodyRef },
    PlayerGoal { goal: BodyRef },
}

/// Animator parameter names.
pub mod anim {
    pub const SPEED: &str = "Speed";
    pub const GROUNDED: &str = "isGrounded";
    pub const DIE: &str = "Die";
}

pub trait AnimationSink {
    fn set_float(&mut self, body: BodyRef, name: &str, value: f32);
    fn set_bool(&mut self, body: BodyRef, name: &str, value: bool);
    fn set_trigger(&mut self, body: BodyRef, name: &str);
    fn set_facing(&mut self, body: BodyRef, facing: Facing);
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Clip {
    Jump,
    Attack,
    EnemyDown,
    Pickup,
    Hurt,
    PlayerDown,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MusicTrack {
    Background,
    GameOver,
    Victory,
}

pub trait AudioSink {
    fn play_one_shot(&mut self, clip: Clip);
    fn play_music(&mut self, track: MusicTrack, looping: bool);
    fn stop_music(&mut self);
}

pub trait EffectSink {
    fn play_attack_effect(&mut self, origin: Vec2, facing: Facing);
}

pub trait TimerDisplay {
    fn show(&mut self, text: &str);
}

/// The optional presentation collaborators, bundled for construction.
#[derive(Default)]
pub struct Sinks {
    pub animation: Option<Box<dyn AnimationSink>>,
    pub audio: Option<Box<dyn AudioSink>>,
    pub effects: Option<Box<dyn EffectSink>>,
    pub timer_display: Option<Box<dyn TimerDisplay>>,
}

impl Sinks {
    pub fn animate(&mut self, f: impl FnOnce(&mut dyn AnimationSink)) {
        if let Some(sink) = self.animation.as_deref_mut() { f(sink); }
    }

    pub fn play(&mut self, clip: Clip) {
        if let Some(sink) = self.audio.as_deref_mut() { sink.play_one_shot(clip); }
    }

    pub fn music(&mut self, track: MusicTrack, looping: bool) {
        if let Some(sink) = self.audio.as_deref_mut() { sink.play_music(track, looping); }
    }

    pub fn attack_effect(&mut self, origin: Vec2, facing: Facing) {
        if let Some(sink) = self.effects.as_deref_mut() { sink.play_attack_effect(origin, facing); }
    }

    pub fn show_time(&mut self, text: &str) {
        if let Some(sink) = self.timer_display.as_deref_mut() { sink.show(text); }
    }
}
