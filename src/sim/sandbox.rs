/// Sandbox: a minimal kinematic host for running the core without an engine.
///
/// ## Model
///
///   - Unit tiles, `solid[y * width + x]`, y = 0 is the bottom row.
///     Outside the grid the sides and floor are solid, the sky is open.
///   - Bodies are axis-aligned boxes. Dynamic bodies (player, enemies) get
///     gravity, then move one axis at a time and stop flush against tiles.
///   - Static bodies (pickups, goals) never move.
///
/// ## Contacts
///
/// `step` returns what the core needs to hear:
///   - ground probe enter/exit, one event per solid tile under the feet
///   - player↔enemy every step while the boxes overlap
///   - player↔pickup and player↔goal on enter only

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::entity::{BodyRef, ColliderId, ContactTag};
use crate::domain::vec2::Vec2;

use super::ports::{ContactEvent, PhysicsHost};

pub const GRAVITY: f32 = 9.81;

/// Gap kept between a body and the tile it rests against.
const SKIN: f32 = 1e-4;
/// Depth of the ground probe below the feet.
const PROBE_DEPTH: f32 = 0.05;
/// Probe is this much narrower than the body on each side.
const PROBE_INSET: f32 = 0.05;

const ACTOR_HALF: Vec2 = Vec2::new(0.4, 0.45);
const TRIGGER_HALF: Vec2 = Vec2::new(0.3, 0.3);

/// Collider id of the player's own probe. Tile colliders are numbered from 1.
const PROBE_COLLIDER: ColliderId = ColliderId(0);

#[derive(Clone, Debug)]
pub struct Body {
    pub tag: ContactTag,
    pub pos: Vec2,
    pub vel: Vec2,
    pub half: Vec2,
    pub gravity_scale: f32,
    pub dynamic: bool,
}

impl Body {
    fn min(&self) -> Vec2 {
        Vec2::new(self.pos.x - self.half.x, self.pos.y - self.half.y)
    }

    fn max(&self) -> Vec2 {
        Vec2::new(self.pos.x + self.half.x, self.pos.y + self.half.y)
    }

    fn overlaps(&self, other: &Body) -> bool {
        let (a0, a1, b0, b1) = (self.min(), self.max(), other.min(), other.max());
        a0.x < b1.x && b0.x < a1.x && a0.y < b1.y && b0.y < a1.y
    }
}

#[derive(Clone, Copy)]
enum Axis {
    X,
    Y,
}

pub struct Sandbox {
    width: usize,
    height: usize,
    solid: Vec<bool>,
    bodies: BTreeMap<BodyRef, Body>,
    next_id: u32,
    player: Option<BodyRef>,
    /// Tile colliders currently under the player's probe.
    under_feet: BTreeSet<u32>,
    /// Triggers the player is currently inside.
    touching: BTreeSet<BodyRef>,
}

// ── Construction ──

impl Sandbox {
    pub fn new(width: usize, height: usize) -> Self {
        Sandbox {
            width,
            height,
            solid: vec![false; width * height],
            bodies: BTreeMap::new(),
            next_id: 1,
            player: None,
            under_feet: BTreeSet::new(),
            touching: BTreeSet::new(),
        }
    }

    /// Rows top-down; `#` is solid, anything else is open.
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len();
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let mut sb = Sandbox::new(width, height);
        for (r, row) in rows.iter().enumerate() {
            let y = height - 1 - r;
            for (x, ch) in row.chars().enumerate() {
                if ch == '#' { sb.set_solid(x, y, true); }
            }
        }
        sb
    }

    pub fn set_solid(&mut self, x: usize, y: usize, solid: bool) {
        if x < self.width && y < self.height {
            self.solid[y * self.width + x] = solid;
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn insert(&mut self, body: Body) -> BodyRef {
        let id = BodyRef(self.next_id);
        self.next_id += 1;
        self.bodies.insert(id, body);
        id
    }

    /// Standing position for an actor whose feet rest on the bottom of cell (x, y).
    fn cell_floor(x: usize, y: usize, half: Vec2) -> Vec2 {
        Vec2::new(x as f32 + 0.5, y as f32 + half.y + SKIN)
    }

    pub fn spawn_player(&mut self, x: usize, y: usize, gravity_scale: f32) -> BodyRef {
        let id = self.insert(Body {
            tag: ContactTag::Player,
            pos: Self::cell_floor(x, y, ACTOR_HALF),
            vel: Vec2::ZERO,
            half: ACTOR_HALF,
            gravity_scale,
            dynamic: true,
        });
        self.player = Some(id);
        id
    }

    pub fn spawn_actor(&mut self, x: usize, y: usize, tag: ContactTag) -> BodyRef {
        self.insert(Body {
            tag,
            pos: Self::cell_floor(x, y, ACTOR_HALF),
            vel: Vec2::ZERO,
            half: ACTOR_HALF,
            gravity_scale: 1.0,
            dynamic: true,
        })
    }

    /// A static trigger centred in cell (x, y).
    pub fn spawn_trigger(&mut self, x: usize, y: usize, tag: ContactTag) -> BodyRef {
        self.insert(Body {
            tag,
            pos: Vec2::new(x as f32 + 0.5, y as f32 + 0.5),
            vel: Vec2::ZERO,
            half: TRIGGER_HALF,
            gravity_scale: 0.0,
            dynamic: false,
        })
    }

    pub fn ground_probe(&self) -> ColliderId {
        PROBE_COLLIDER
    }

    pub fn bodies(&self) -> impl Iterator<Item = (BodyRef, &Body)> {
        self.bodies.iter().map(|(id, b)| (*id, b))
    }
}

// ── Tile queries ──

impl Sandbox {
    pub fn is_solid(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= self.width as i64 { return true; }
        if y >= self.height as i64 { return false; }
        self.solid[y as usize * self.width + x as usize]
    }

    fn tile_collider(&self, x: i64, y: i64) -> u32 {
        // Out-of-grid floor and walls share one collider per column/row slot.
        let w = self.width as i64 + 2;
        ((y + 1) * w + (x + 1)) as u32 + 1
    }

    /// Solid tiles overlapping the open box (min, max).
    fn solid_cells(&self, min: Vec2, max: Vec2) -> Vec<(i64, i64)> {
        let x0 = min.x.floor() as i64;
        let x1 = (max.x.ceil() as i64) - 1;
        let y0 = min.y.floor() as i64;
        let y1 = (max.y.ceil() as i64) - 1;
        let mut out = vec![];
        for y in y0..=y1 {
            for x in x0..=x1 {
                if self.is_solid(x, y) { out.push((x, y)); }
            }
        }
        out
    }
}

// ── Stepping ──

impl Sandbox {
    /// Advance every dynamic body by `dt` and report contacts.
    pub fn step(&mut self, dt: f32) -> Vec<ContactEvent> {
        let ids: Vec<BodyRef> = self.bodies.keys().copied().collect();
        for id in ids {
            let Some(body) = self.bodies.get_mut(&id) else { continue };
            if !body.dynamic { continue; }
            body.vel.y -= GRAVITY * body.gravity_scale * dt;
            let (dx, dy) = (body.vel.x * dt, body.vel.y * dt);
            self.move_axis(id, dx, Axis::X);
            self.move_axis(id, dy, Axis::Y);
        }
        self.collect_contacts()
    }

    /// Move along one axis, stopping flush against the first solid tile.
    fn move_axis(&mut self, id: BodyRef, delta: f32, axis: Axis) {
        if delta == 0.0 { return; }
        let Some(body) = self.bodies.get(&id) else { return };
        let mut moved = body.clone();
        match axis {
            Axis::X => moved.pos.x += delta,
            Axis::Y => moved.pos.y += delta,
        }
        let hits = self.solid_cells(moved.min(), moved.max());
        if !hits.is_empty() {
            match axis {
                Axis::X => {
                    moved.pos.x = if delta > 0.0 {
                        let wall = hits.iter().map(|c| c.0).min().unwrap_or(0) as f32;
                        wall - moved.half.x - SKIN
                    } else {
                        let wall = hits.iter().map(|c| c.0).max().unwrap_or(0) as f32 + 1.0;
                        wall + moved.half.x + SKIN
                    };
                    moved.vel.x = 0.0;
                }
                Axis::Y => {
                    moved.pos.y = if delta > 0.0 {
                        let ceiling = hits.iter().map(|c| c.1).min().unwrap_or(0) as f32;
                        ceiling - moved.half.y - SKIN
                    } else {
                        let floor = hits.iter().map(|c| c.1).max().unwrap_or(0) as f32 + 1.0;
                        floor + moved.half.y + SKIN
                    };
                    moved.vel.y = 0.0;
                }
            }
        }
        self.bodies.insert(id, moved);
    }

    fn collect_contacts(&mut self) -> Vec<ContactEvent> {
        let mut events = vec![];
        let Some(player_id) = self.player else { return events };
        let Some(player) = self.bodies.get(&player_id).cloned() else { return events };

        // Ground probe: thin box just below the feet.
        let feet = player.min();
        let probe_min = Vec2::new(feet.x + PROBE_INSET, feet.y - PROBE_DEPTH);
        let probe_max = Vec2::new(player.max().x - PROBE_INSET, feet.y);
        let now: BTreeSet<u32> = self
            .solid_cells(probe_min, probe_max)
            .into_iter()
            .map(|(x, y)| self.tile_collider(x, y))
            .collect();
        for &c in self.under_feet.difference(&now) {
            events.push(ContactEvent::SensorExit { collider: ColliderId(c), tag: ContactTag::Ground });
        }
        for &c in now.difference(&self.under_feet) {
            events.push(ContactEvent::SensorEnter { collider: ColliderId(c), tag: ContactTag::Ground });
        }
        self.under_feet = now;

        let mut inside = BTreeSet::new();
        for (&id, body) in &self.bodies {
            if id == player_id || !body.overlaps(&player) { continue; }
            match body.tag {
                ContactTag::Enemy => events.push(ContactEvent::PlayerEnemy { enemy: id }),
                ContactTag::Pickup | ContactTag::Goal => {
                    inside.insert(id);
                    if !self.touching.contains(&id) {
                        events.push(if body.tag == ContactTag::Pickup {
                            ContactEvent::PlayerPickup { pickup: id }
                        } else {
                            ContactEvent::PlayerGoal { goal: id }
                        });
                    }
                }
                _ => {}
            }
        }
        self.touching = inside;
        events
    }
}

// ── PhysicsHost ──

impl PhysicsHost for Sandbox {
    fn contains(&self, body: BodyRef) -> bool {
        self.bodies.contains_key(&body)
    }

    fn position(&self, body: BodyRef) -> Vec2 {
        self.bodies.get(&body).map(|b| b.pos).unwrap_or(Vec2::ZERO)
    }

    fn velocity(&self, body: BodyRef) -> Vec2 {
        self.bodies.get(&body).map(|b| b.vel).unwrap_or(Vec2::ZERO)
    }

    fn set_velocity(&mut self, body: BodyRef, velocity: Vec2) {
        if let Some(b) = self.bodies.get_mut(&body) { b.vel = velocity; }
    }

    fn translate(&mut self, body: BodyRef, delta: Vec2) {
        self.move_axis(body, delta.x, Axis::X);
        self.move_axis(body, delta.y, Axis::Y);
    }

    fn overlap_circle(&self, origin: Vec2, radius: f32, tag: ContactTag) -> Vec<BodyRef> {
        self.bodies
            .iter()
            .filter(|(_, b)| b.tag == tag)
            .filter(|(_, b)| {
                let (lo, hi) = (b.min(), b.max());
                let closest = Vec2::new(origin.x.clamp(lo.x, hi.x), origin.y.clamp(lo.y, hi.y));
                closest.distance(origin) <= radius
            })
            .map(|(id, _)| *id)
            .collect()
    }

    fn despawn(&mut self, body: BodyRef) {
        self.bodies.remove(&body);
        self.touching.remove(&body);
        if self.player == Some(body) { self.player = None; }
    }
}
