/// World: the complete state of a running level.
///
/// ## Ownership
///
/// The world owns every core component (player, enemies, triggers, timer,
/// outcome bus, presenter) and the optional presentation sinks. It never
/// owns bodies: those live in the `PhysicsHost`, and the world holds only
/// `BodyRef` handles, checked against the host once at construction.
///
/// ## Clock
///
/// `clock` is session time in seconds, advanced by `step::frame_tick`.
/// Every cooldown compares against it.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::config::GameConfig;
use crate::domain::ai::Enemy;
use crate::domain::attack::AttackTask;
use crate::domain::entity::{BodyRef, ColliderId, Facing};
use crate::domain::ground::GroundSensor;
use crate::domain::motion::MotionPolicy;
use crate::domain::pickup::{Goal, TimePickup};
use crate::domain::player::PlayerState;
use crate::domain::vec2::Vec2;
use crate::error::SetupError;

use super::bus::{OutcomeBus, OutcomeListener};
use super::event::GameEvent;
use super::ports::{anim, Clip, PhysicsHost, Sinks};
use super::presentation::Presenter;
use super::timer::CountdownTimer;

/// Host bodies the world will drive, as placed by the level.
#[derive(Clone, Debug)]
pub struct Bodies {
    pub player: BodyRef,
    /// The player's ground probe collider; its own contacts never count.
    pub ground_probe: ColliderId,
    pub facing: Facing,
    pub enemies: Vec<(BodyRef, Facing)>,
    pub pickups: Vec<BodyRef>,
    pub goals: Vec<BodyRef>,
}

pub struct World {
    pub config: GameConfig,
    pub motion: MotionPolicy,

    // ── Player ──
    pub player_body: BodyRef,
    pub player: PlayerState,
    pub ground: GroundSensor,
    pub attack: Option<AttackTask>,

    // ── Roster ──
    pub enemies: Vec<Enemy>,
    pub pickups: Vec<TimePickup>,
    pub goals: Vec<Goal>,

    // ── Outcome ──
    pub timer: CountdownTimer,
    pub bus: OutcomeBus,
    pub presenter: Presenter,

    // ── Presentation ──
    pub sinks: Sinks,
    shown_time: String,

    pub clock: f64,
}

// ── Construction ──

impl World {
    /// Assemble a world over bodies that must already exist in `host`.
    pub fn new(
        config: GameConfig,
        bodies: &Bodies,
        host: &dyn PhysicsHost,
        sinks: Sinks,
    ) -> Result<Self, SetupError> {
        let mut seen = HashSet::new();
        let mut require = |role: &'static str, body: BodyRef| -> Result<(), SetupError> {
            if !host.contains(body) {
                return Err(SetupError::MissingBody { role, body });
            }
            if !seen.insert(body) {
                return Err(SetupError::DuplicateBody(body));
            }
            Ok(())
        };

        require("player", bodies.player)?;
        for &(body, _) in &bodies.enemies {
            require("enemy", body)?;
        }
        for &body in &bodies.pickups {
            require("time pickup", body)?;
        }
        for &body in &bodies.goals {
            require("goal", body)?;
        }

        let enemies = bodies.enemies.iter().map(|&(b, f)| Enemy::new(b, f)).collect();
        let pickups = bodies
            .pickups
            .iter()
            .map(|&b| TimePickup::new(b, config.pickup.time_value))
            .collect();
        let goals = bodies.goals.iter().map(|&b| Goal::new(b)).collect();

        let mut world = World {
            motion: config.player.motion_policy(),
            player_body: bodies.player,
            player: PlayerState::new(bodies.facing),
            ground: GroundSensor::new(bodies.ground_probe),
            attack: None,
            enemies,
            pickups,
            goals,
            timer: CountdownTimer::new(config.timer.initial_duration),
            bus: OutcomeBus::new(),
            presenter: Presenter::new(config.presentation.game_over_delay),
            sinks,
            shown_time: String::new(),
            clock: 0.0,
            config,
        };

        world.presenter.start(&mut world.sinks);
        world.refresh_time_display();
        info!(
            enemies = world.enemies.len(),
            pickups = world.pickups.len(),
            goals = world.goals.len(),
            "world ready"
        );
        Ok(world)
    }

    pub fn subscribe(&mut self, listener: Box<dyn OutcomeListener>) {
        self.bus.subscribe(listener);
    }
}

// ── Lookups ──

impl World {
    pub fn enemy_mut(&mut self, body: BodyRef) -> Option<&mut Enemy> {
        self.enemies.iter_mut().find(|e| e.body == body)
    }

    pub fn enemy(&self, body: BodyRef) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.body == body)
    }

    pub fn player_position(&self, host: &dyn PhysicsHost) -> Vec2 {
        host.position(self.player_body)
    }
}

// ── Shared mutations used by the step functions ──

impl World {
    /// Credit the clock. Zero or ignored credits emit nothing.
    pub fn add_time(&mut self, seconds: f32, events: &mut Vec<GameEvent>) {
        if seconds == 0.0 { return; }
        if self.timer.add_time(seconds as f64) {
            events.push(GameEvent::TimeAdded(seconds));
            self.refresh_time_display();
        }
    }

    pub fn subtract_time(&mut self, seconds: f32, events: &mut Vec<GameEvent>) {
        if seconds == 0.0 { return; }
        if self.timer.subtract_time(seconds as f64) {
            events.push(GameEvent::TimeSubtracted(seconds));
            self.refresh_time_display();
        }
    }

    /// Kill the player. No-op if already dead.
    pub fn kill_player(&mut self, host: &mut dyn PhysicsHost, events: &mut Vec<GameEvent>) {
        if !self.player.die() { return; }
        let body = self.player_body;
        host.set_velocity(body, Vec2::ZERO);
        self.sinks.animate(|a| {
            a.set_float(body, anim::SPEED, 0.0);
            a.set_trigger(body, anim::DIE);
        });
        self.sinks.play(Clip::PlayerDown);

        if self.config.attack.cancel_on_death {
            if let Some(task) = self.attack.as_mut() {
                task.cancel();
                debug!("attack cancelled by player death");
            }
        }
        info!(clock = self.clock, "player killed");
        events.push(GameEvent::PlayerKilled);
    }

    /// Stop the player after a win. Alive, but no longer steerable.
    pub fn freeze_player(&mut self, host: &mut dyn PhysicsHost) {
        if !self.player.freeze() { return; }
        let body = self.player_body;
        host.set_velocity(body, Vec2::ZERO);
        self.sinks.animate(|a| a.set_float(body, anim::SPEED, 0.0));
    }

    /// Push the clock text to the display, only when it changed.
    pub fn refresh_time_display(&mut self) {
        let text = self.timer.display();
        if text != self.shown_time {
            self.sinks.show_time(&text);
            self.shown_time = text;
        }
    }

    pub fn shown_time(&self) -> &str {
        &self.shown_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::ContactTag;
    use crate::sim::sandbox::Sandbox;

    fn open_floor() -> (Sandbox, Bodies) {
        let mut sb = Sandbox::from_rows(&["......", "######"]);
        let player = sb.spawn_player(1, 1, 1.5);
        let enemy = sb.spawn_actor(4, 1, ContactTag::Enemy);
        let bodies = Bodies {
            player,
            ground_probe: sb.ground_probe(),
            facing: Facing::Right,
            enemies: vec![(enemy, Facing::Left)],
            pickups: vec![],
            goals: vec![],
        };
        (sb, bodies)
    }

    #[test]
    fn builds_over_existing_bodies() {
        let (sb, bodies) = open_floor();
        let world = World::new(GameConfig::default(), &bodies, &sb, Sinks::default()).unwrap();
        assert_eq!(world.enemies.len(), 1);
        assert_eq!(world.shown_time(), "00:31");
        assert!(world.player.alive);
    }

    #[test]
    fn missing_player_body_fails_fast() {
        let (sb, mut bodies) = open_floor();
        bodies.player = BodyRef(999);
        match World::new(GameConfig::default(), &bodies, &sb, Sinks::default()) {
            Err(SetupError::MissingBody { role, .. }) => assert_eq!(role, "player"),
            other => panic!("expected missing body, got {:?}", other.err()),
        }
    }

    #[test]
    fn duplicate_body_rejected() {
        let (sb, mut bodies) = open_floor();
        let enemy = bodies.enemies[0].0;
        bodies.pickups.push(enemy);
        assert!(matches!(
            World::new(GameConfig::default(), &bodies, &sb, Sinks::default()),
            Err(SetupError::DuplicateBody(b)) if b == enemy
        ));
    }

    #[test]
    fn kill_player_is_idempotent_and_cancels_attack() {
        let (mut sb, bodies) = open_floor();
        let mut world = World::new(GameConfig::default(), &bodies, &sb, Sinks::default()).unwrap();
        world.attack = Some(AttackTask::new(0.5));
        let mut events = vec![];
        world.kill_player(&mut sb, &mut events);
        world.kill_player(&mut sb, &mut events);
        assert_eq!(events, vec![GameEvent::PlayerKilled]);
        assert!(world.attack.as_ref().is_some_and(|t| t.is_cancelled()));
    }

    #[test]
    fn attack_survives_death_when_configured() {
        let (mut sb, bodies) = open_floor();
        let mut cfg = GameConfig::default();
        cfg.attack.cancel_on_death = false;
        let mut world = World::new(cfg, &bodies, &sb, Sinks::default()).unwrap();
        world.attack = Some(AttackTask::new(0.5));
        world.kill_player(&mut sb, &mut vec![]);
        assert!(world.attack.as_ref().is_some_and(|t| !t.is_cancelled()));
    }

    #[test]
    fn zero_bonus_emits_nothing() {
        let (sb, bodies) = open_floor();
        let mut world = World::new(GameConfig::default(), &bodies, &sb, Sinks::default()).unwrap();
        let mut events = vec![];
        world.add_time(0.0, &mut events);
        assert!(events.is_empty());
        world.add_time(5.0, &mut events);
        assert_eq!(events, vec![GameEvent::TimeAdded(5.0)]);
        assert_eq!(world.timer.time_left(), 35.0);
    }
}
