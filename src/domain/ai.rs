/// Enemy AI: Idle ⇄ Dashing, keyed off player proximity.
///
/// Two modes:
///   1. **Idle**: horizontal velocity held at 0. Switches to Dashing when the
///      player is within `sight_range` and the bounce cooldown has elapsed.
///   2. **Dashing**: every physics tick the velocity is re-aimed at the
///      player's *current* position at `dash_speed`.
///
/// Contact with the player follows one configured policy:
///   - `BounceAndDrain`: drain time (once per contact cooldown), hop away,
///     go Idle and re-arm the sight gate.
///   - `KillPlayer`: the player dies on touch.
///
/// A kill command freezes the enemy in Idle and starts the death delay;
/// the world despawns it when the delay runs out.

use serde::Deserialize;
use tracing::debug;

use crate::config::EnemyConfig;

use super::entity::{BodyRef, Facing};
use super::vec2::Vec2;

#[derive(Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum ContactPolicy {
    #[serde(rename = "kill")]
    KillPlayer,
    #[serde(rename = "bounce")]
    BounceAndDrain,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EnemyMode {
    Idle,
    Dashing,
}

/// What a player contact asks the world to do.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum ContactOutcome {
    /// Dying enemy, or nothing to do.
    Ignored,
    KillPlayer,
    Bounce {
        /// Seconds to subtract from the timer, if the penalty window allowed it.
        penalty: Option<f32>,
        /// Positional hop to apply to the enemy body.
        displacement: Vec2,
    },
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub body: BodyRef,
    pub mode: EnemyMode,
    pub facing: Facing,
    pub last_bounce_time: Option<f64>,
    pub last_penalty_time: Option<f64>,
    bonus_granted: bool,
    /// Remaining death delay; `Some` once killed.
    death_timer: Option<f32>,
}

impl Enemy {
    pub fn new(body: BodyRef, facing: Facing) -> Self {
        Enemy {
            body,
            mode: EnemyMode::Idle,
            facing,
            last_bounce_time: None,
            last_penalty_time: None,
            bonus_granted: false,
            death_timer: None,
        }
    }

    pub fn is_dying(&self) -> bool {
        self.death_timer.is_some()
    }

    fn bounce_ready(&self, now: f64, cfg: &EnemyConfig) -> bool {
        match self.last_bounce_time {
            None => true,
            Some(t) => now >= t + cfg.bounce_cooldown as f64,
        }
    }

    fn penalty_ready(&self, now: f64, cfg: &EnemyConfig) -> bool {
        match self.last_penalty_time {
            None => true,
            Some(t) => now >= t + cfg.contact_cooldown as f64,
        }
    }

    /// Frame-tick transition check. Returns true if a dash started.
    pub fn think(&mut self, me: Vec2, player: Vec2, now: f64, cfg: &EnemyConfig) -> bool {
        if self.is_dying() || self.mode != EnemyMode::Idle { return false; }
        if me.distance(player) > cfg.sight_range { return false; }
        if !self.bounce_ready(now, cfg) { return false; }

        self.mode = EnemyMode::Dashing;
        debug!(body = ?self.body, "enemy dashing at player");
        true
    }

    /// Physics-tick velocity command. `current.y` is kept unless dying.
    pub fn desired_velocity(&mut self, me: Vec2, current: Vec2, player: Vec2, cfg: &EnemyConfig) -> Vec2 {
        if self.is_dying() { return Vec2::ZERO; }
        match self.mode {
            EnemyMode::Idle => current.with_x(0.0),
            EnemyMode::Dashing => {
                let dir = (player - me).normalize_or_zero();
                self.facing = Facing::from_sign(dir.x, self.facing);
                current.with_x(dir.x * cfg.dash_speed)
            }
        }
    }

    pub fn on_player_contact(
        &mut self,
        me: Vec2,
        player: Vec2,
        now: f64,
        policy: ContactPolicy,
        cfg: &EnemyConfig,
    ) -> ContactOutcome {
        if self.is_dying() { return ContactOutcome::Ignored; }
        match policy {
            ContactPolicy::KillPlayer => ContactOutcome::KillPlayer,
            ContactPolicy::BounceAndDrain => {
                let penalty = if self.penalty_ready(now, cfg) {
                    self.last_penalty_time = Some(now);
                    Some(cfg.contact_penalty)
                } else {
                    None
                };
                let away = me.x - player.x;
                let sign = if away > 0.0 {
                    1.0
                } else if away < 0.0 {
                    -1.0
                } else {
                    -self.facing.sign()
                };
                self.mode = EnemyMode::Idle;
                self.last_bounce_time = Some(now);
                debug!(body = ?self.body, ?penalty, "enemy bounced off player");
                ContactOutcome::Bounce {
                    penalty,
                    displacement: Vec2::new(sign * cfg.bounce_distance, 0.0),
                }
            }
        }
    }

    /// One-time time bonus: `bonus` on the first call of this life, 0 after.
    pub fn take_time_bonus(&mut self, bonus: f32) -> f32 {
        if self.bonus_granted { return 0.0; }
        self.bonus_granted = true;
        bonus
    }

    /// Returns false if already dying.
    pub fn kill(&mut self, death_delay: f32) -> bool {
        if self.is_dying() { return false; }
        self.mode = EnemyMode::Idle;
        self.death_timer = Some(death_delay);
        debug!(body = ?self.body, "enemy killed by player attack");
        true
    }

    /// Advance the death delay. Returns true once the body should be destroyed.
    pub fn tick_death(&mut self, dt: f32) -> bool {
        match self.death_timer.as_mut() {
            None => false,
            Some(remaining) => {
                *remaining -= dt;
                *remaining <= 0.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> EnemyConfig {
        EnemyConfig::default()
    }

    fn enemy() -> Enemy {
        Enemy::new(BodyRef(7), Facing::Left)
    }

    #[test]
    fn idle_to_dashing_same_tick_player_in_sight() {
        let mut e = enemy();
        assert!(e.think(Vec2::new(0.0, 0.0), Vec2::new(4.0, 0.0), 0.0, &cfg()));
        assert_eq!(e.mode, EnemyMode::Dashing);
    }

    #[test]
    fn stays_idle_out_of_sight() {
        let mut e = enemy();
        assert!(!e.think(Vec2::ZERO, Vec2::new(5.01, 0.0), 0.0, &cfg()));
        assert_eq!(e.mode, EnemyMode::Idle);
        // Exactly at sight range counts as in sight.
        assert!(e.think(Vec2::ZERO, Vec2::new(5.0, 0.0), 0.0, &cfg()));
    }

    #[test]
    fn idle_zeroes_horizontal_only() {
        let mut e = enemy();
        let v = e.desired_velocity(Vec2::ZERO, Vec2::new(3.0, -2.0), Vec2::new(10.0, 0.0), &cfg());
        assert_eq!(v, Vec2::new(0.0, -2.0));
    }

    #[test]
    fn dash_reaims_each_tick_and_faces_travel() {
        let mut e = enemy();
        e.think(Vec2::ZERO, Vec2::new(3.0, 0.0), 0.0, &cfg());
        let v = e.desired_velocity(Vec2::ZERO, Vec2::new(0.0, -1.0), Vec2::new(3.0, 0.0), &cfg());
        assert_eq!(v, Vec2::new(8.0, -1.0));
        assert_eq!(e.facing, Facing::Right);
        // Player jumped over: aim flips.
        let v = e.desired_velocity(Vec2::new(2.0, 0.0), Vec2::ZERO, Vec2::new(1.0, 0.0), &cfg());
        assert_eq!(v.x, -8.0);
        assert_eq!(e.facing, Facing::Left);
    }

    #[test]
    fn dash_speed_uses_normalized_vector_x() {
        let mut e = enemy();
        e.think(Vec2::ZERO, Vec2::new(3.0, 4.0), 0.0, &cfg());
        let v = e.desired_velocity(Vec2::ZERO, Vec2::ZERO, Vec2::new(3.0, 4.0), &cfg());
        assert!((v.x - 0.6 * 8.0).abs() < 1e-5);
    }

    #[test]
    fn bounce_returns_to_idle_and_gates_sight() {
        let mut e = enemy();
        e.think(Vec2::ZERO, Vec2::new(1.0, 0.0), 0.0, &cfg());
        let out = e.on_player_contact(Vec2::ZERO, Vec2::new(0.5, 0.0), 2.0, ContactPolicy::BounceAndDrain, &cfg());
        assert_eq!(
            out,
            ContactOutcome::Bounce { penalty: Some(3.0), displacement: Vec2::new(-0.5, 0.0) }
        );
        assert_eq!(e.mode, EnemyMode::Idle);
        assert!(!e.think(Vec2::ZERO, Vec2::new(1.0, 0.0), 2.5, &cfg()));
        assert!(e.think(Vec2::ZERO, Vec2::new(1.0, 0.0), 3.0, &cfg()));
    }

    #[test]
    fn sustained_contact_drains_once_per_window() {
        let mut e = enemy();
        let mut drained = 0.0;
        // Contact reported every 20 ms for 2.5 s.
        for i in 0..125 {
            let now = 0.02 * i as f64;
            if let ContactOutcome::Bounce { penalty: Some(p), .. } =
                e.on_player_contact(Vec2::ZERO, Vec2::new(0.3, 0.0), now, ContactPolicy::BounceAndDrain, &cfg())
            {
                drained += p;
            }
        }
        // Windows start at 0.0, ~1.0 and ~2.0.
        assert_eq!(drained, 9.0);
    }

    #[test]
    fn coincident_bounce_moves_against_facing() {
        let mut e = enemy();
        let out = e.on_player_contact(Vec2::ZERO, Vec2::ZERO, 0.0, ContactPolicy::BounceAndDrain, &cfg());
        match out {
            ContactOutcome::Bounce { displacement, .. } => assert_eq!(displacement.x, 0.5),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn kill_policy_reports_player_death() {
        let mut e = enemy();
        let out = e.on_player_contact(Vec2::ZERO, Vec2::new(0.2, 0.0), 0.0, ContactPolicy::KillPlayer, &cfg());
        assert_eq!(out, ContactOutcome::KillPlayer);
    }

    #[test]
    fn time_bonus_paid_exactly_once() {
        let mut e = enemy();
        let total: f32 = (0..5).map(|_| e.take_time_bonus(5.0)).sum();
        assert_eq!(total, 5.0);
    }

    #[test]
    fn killed_enemy_freezes_and_expires_after_delay() {
        let mut e = enemy();
        e.think(Vec2::ZERO, Vec2::new(1.0, 0.0), 0.0, &cfg());
        assert!(e.kill(0.4));
        assert!(!e.kill(0.4));
        assert_eq!(e.mode, EnemyMode::Idle);
        assert_eq!(e.desired_velocity(Vec2::ZERO, Vec2::new(8.0, -3.0), Vec2::new(1.0, 0.0), &cfg()), Vec2::ZERO);
        assert!(!e.think(Vec2::ZERO, Vec2::new(1.0, 0.0), 5.0, &cfg()));
        assert_eq!(
            e.on_player_contact(Vec2::ZERO, Vec2::ZERO, 5.0, ContactPolicy::KillPlayer, &cfg()),
            ContactOutcome::Ignored
        );
        assert!(!e.tick_death(0.25));
        assert!(e.tick_death(0.25));
    }

    #[test]
    fn live_enemy_never_expires() {
        let mut e = enemy();
        assert!(!e.tick_death(100.0));
    }
}
