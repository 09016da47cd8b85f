/// Step functions: the two cadences plus contact dispatch.
///
/// ## Frame tick (`frame_tick`), once per rendered frame:
///   1. Clock advance + input edges
///   2. Player state machine (ground snapshot, facing, jump impulse, attack start)
///   3. Attack scan (activation tick and every frame until the duration is spent)
///   4. Enemy sight checks (Idle → Dashing)
///   5. Enemy death delays
///   6. Countdown + TimeRanOut
///   7. Presenter
///
/// ## Physics tick (`physics_tick`), at the fixed physics rate:
///   1. Player horizontal velocity through the motion integrator
///   2. Enemy velocity commands
///
/// The host calls `frame_tick` before the physics ticks of the same frame,
/// so physics always consumes the freshly resolved move direction.
///
/// ## Contacts (`handle_contact`), whenever the host reports one.

use tracing::{debug, trace};

use crate::domain::ai::ContactOutcome;
use crate::domain::attack::{self, AttackTask};
use crate::domain::entity::{BodyRef, ContactTag};
use crate::domain::motion;
use crate::domain::vec2::Vec2;

use super::event::{GameEvent, Outcome};
use super::ports::{anim, Clip, ContactEvent, FrameInput, PhysicsHost};
use super::world::World;

// ══════════════════════════════════════════════════════════════
// Frame tick
// ══════════════════════════════════════════════════════════════

pub fn frame_tick(
    world: &mut World,
    host: &mut dyn PhysicsHost,
    input: FrameInput,
    dt: f32,
) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();
    world.clock += dt as f64;

    if world.player.movement_allowed {
        if input.jump_pressed { world.player.queue_jump(); }
        if input.attack_pressed { world.player.queue_attack(); }
    }

    resolve_player(world, host, input, &mut events);
    resolve_attack(world, host, dt, &mut events);
    resolve_enemy_sight(world, host, &mut events);
    resolve_enemy_death(world, host, dt, &mut events);
    resolve_timer(world, host, dt, &mut events);
    resolve_presenter(world, dt, &events);

    events
}

fn resolve_player(
    world: &mut World,
    host: &mut dyn PhysicsHost,
    input: FrameInput,
    events: &mut Vec<GameEvent>,
) {
    if !world.player.movement_allowed { return; }

    let body = world.player_body;
    let grounded = world.ground.is_grounded();
    let decision = world.player.frame_update(
        &world.config.player,
        world.config.attack.cooldown,
        grounded,
        input.axis.x,
        world.clock,
    );

    if decision.flipped {
        let facing = world.player.facing;
        world.sinks.animate(|a| a.set_facing(body, facing));
    }

    if let Some(vy) = decision.jump_velocity {
        let v = host.velocity(body);
        host.set_velocity(body, v.with_y(vy));
        world.sinks.play(Clip::Jump);
        events.push(GameEvent::Jumped);
    }

    if let Some(facing) = decision.attack {
        let cfg = &world.config.attack;
        world.attack = Some(AttackTask::new(cfg.duration));
        let origin = attack::scan_origin(host.position(body), facing, cfg.reach);
        world.sinks.attack_effect(origin, facing);
        world.sinks.play(Clip::Attack);
        debug!(?facing, clock = world.clock, "attack started");
        events.push(GameEvent::AttackStarted { facing });
    }

    let speed = world.player.move_direction.abs();
    let grounded = world.player.grounded;
    world.sinks.animate(|a| {
        a.set_float(body, anim::SPEED, speed);
        a.set_bool(body, anim::GROUNDED, grounded);
    });
}

fn resolve_attack(world: &mut World, host: &mut dyn PhysicsHost, dt: f32, events: &mut Vec<GameEvent>) {
    let Some(task) = world.attack.as_mut() else { return };
    let scan = task.advance(dt);
    if task.is_finished() {
        world.attack = None;
    }
    if !scan { return; }

    let cfg = world.config.attack.clone();
    let facing = world.player.facing;
    let player = host.position(world.player_body);
    let origin = attack::scan_origin(player, facing, cfg.reach);

    // Only live roster members are candidates; dying ones were already paid for.
    let candidates: Vec<_> = host
        .overlap_circle(origin, cfg.radius, ContactTag::Enemy)
        .into_iter()
        .filter(|b| world.enemy(*b).is_some_and(|e| !e.is_dying()))
        .map(|b| (b, host.position(b)))
        .collect();

    for body in attack::select_targets(player, facing, &candidates, &cfg) {
        let (bonus, death_delay) = (world.config.enemy.time_bonus, world.config.enemy.death_delay);
        let Some(enemy) = world.enemy_mut(body) else { continue };
        let bonus = enemy.take_time_bonus(bonus);
        if !enemy.kill(death_delay) { continue; }
        host.set_velocity(body, Vec2::ZERO);
        world.sinks.play(Clip::EnemyDown);
        events.push(GameEvent::EnemyKilled { enemy: body, bonus });
        world.add_time(bonus, events);
    }
}

fn resolve_enemy_sight(world: &mut World, host: &dyn PhysicsHost, events: &mut Vec<GameEvent>) {
    let player = host.position(world.player_body);
    let now = world.clock;
    let cfg = &world.config.enemy;
    for enemy in world.enemies.iter_mut() {
        let me = host.position(enemy.body);
        if enemy.think(me, player, now, cfg) {
            events.push(GameEvent::EnemyDashing { enemy: enemy.body });
        }
    }
}

fn resolve_enemy_death(world: &mut World, host: &mut dyn PhysicsHost, dt: f32, events: &mut Vec<GameEvent>) {
    let mut gone = vec![];
    world.enemies.retain_mut(|enemy| {
        if enemy.tick_death(dt) {
            gone.push(enemy.body);
            false
        } else {
            true
        }
    });
    for body in gone {
        host.despawn(body);
        debug!(?body, "enemy destroyed");
        events.push(GameEvent::EnemyDestroyed { enemy: body });
    }
}

fn resolve_timer(world: &mut World, host: &mut dyn PhysicsHost, dt: f32, events: &mut Vec<GameEvent>) {
    let expired = world.timer.tick(dt as f64);
    world.refresh_time_display();
    if !expired { return; }

    if world.bus.publish(Outcome::TimeRanOut) {
        events.push(GameEvent::TimeRanOut);
        world.kill_player(host, events);
    }
}

fn resolve_presenter(world: &mut World, dt: f32, events: &[GameEvent]) {
    for event in events {
        world.presenter.on_event(event, &mut world.sinks);
    }
    world.presenter.tick(dt);
}

// ══════════════════════════════════════════════════════════════
// Physics tick
// ══════════════════════════════════════════════════════════════

pub fn physics_tick(world: &mut World, host: &mut dyn PhysicsHost) {
    if world.player.movement_allowed {
        let body = world.player_body;
        let target = world.player.target_velocity_x(&world.config.player);
        let v = motion::integrate(world.motion, host.velocity(body), target);
        host.set_velocity(body, v);
    }

    let player = host.position(world.player_body);
    let cfg = &world.config.enemy;
    for enemy in world.enemies.iter_mut() {
        let me = host.position(enemy.body);
        let before = enemy.facing;
        let v = enemy.desired_velocity(me, host.velocity(enemy.body), player, cfg);
        host.set_velocity(enemy.body, v);
        if enemy.facing != before {
            let (body, facing) = (enemy.body, enemy.facing);
            world.sinks.animate(|a| a.set_facing(body, facing));
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Contacts
// ══════════════════════════════════════════════════════════════

pub fn handle_contact(world: &mut World, host: &mut dyn PhysicsHost, contact: ContactEvent) -> Vec<GameEvent> {
    let mut events = Vec::new();
    match contact {
        ContactEvent::SensorEnter { collider, tag } => world.ground.on_contact_enter(collider, tag),
        ContactEvent::SensorExit { collider, tag } => world.ground.on_contact_exit(collider, tag),
        ContactEvent::PlayerEnemy { enemy } => resolve_enemy_contact(world, host, enemy, &mut events),
        ContactEvent::PlayerPickup { pickup } => resolve_pickup(world, host, pickup, &mut events),
        ContactEvent::PlayerGoal { goal } => resolve_goal(world, host, goal, &mut events),
    }
    for event in &events {
        world.presenter.on_event(event, &mut world.sinks);
    }
    events
}

fn resolve_enemy_contact(
    world: &mut World,
    host: &mut dyn PhysicsHost,
    body: BodyRef,
    events: &mut Vec<GameEvent>,
) {
    // Frozen after a win, or already dead.
    if !world.player.movement_allowed { return; }
    let player = host.position(world.player_body);
    let me = host.position(body);
    let (now, policy) = (world.clock, world.config.enemy.contact_policy);
    let cfg = world.config.enemy.clone();
    let Some(enemy) = world.enemy_mut(body) else { return };

    match enemy.on_player_contact(me, player, now, policy, &cfg) {
        ContactOutcome::Ignored => trace!(?body, "contact ignored"),
        ContactOutcome::KillPlayer => world.kill_player(host, events),
        ContactOutcome::Bounce { penalty, displacement } => {
            host.translate(body, displacement);
            let v = host.velocity(body);
            host.set_velocity(body, v.with_x(0.0));
            events.push(GameEvent::EnemyBounced { enemy: body });
            if let Some(seconds) = penalty {
                world.sinks.play(Clip::Hurt);
                world.subtract_time(seconds, events);
            }
        }
    }
}

fn resolve_pickup(
    world: &mut World,
    host: &mut dyn PhysicsHost,
    body: BodyRef,
    events: &mut Vec<GameEvent>,
) {
    if !world.player.alive { return; }
    let Some(idx) = world.pickups.iter().position(|p| p.body == body) else { return };
    let Some(value) = world.pickups[idx].collect() else { return };
    world.pickups.remove(idx);
    host.despawn(body);
    world.sinks.play(Clip::Pickup);
    events.push(GameEvent::PickupCollected { pickup: body, value });
    world.add_time(value, events);
}

fn resolve_goal(
    world: &mut World,
    host: &mut dyn PhysicsHost,
    body: BodyRef,
    events: &mut Vec<GameEvent>,
) {
    if !world.player.alive { return; }
    let Some(goal) = world.goals.iter_mut().find(|g| g.body == body) else { return };
    if !goal.reach() { return; }
    if !world.bus.publish(Outcome::GameWon) { return; }
    world.timer.pause();
    world.freeze_player(host);
    events.push(GameEvent::GameWon);
}
