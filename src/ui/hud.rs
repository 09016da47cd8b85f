/// Terminal presentation: double-buffered, diff-based renderer plus the
/// sink side of the simulation's output ports.
///
/// How it works:
///   1. `HudFeed` receives animation parameters, attack effects and clock
///      text from the simulation (it is handed over as boxed sinks)
///   2. Each frame the next picture is composed into the `front` buffer
///   3. Only cells that differ from `back` (previous frame) are emitted,
///      batched with `queue!` and flushed once
///   4. Swap front/back

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::io::{self, BufWriter, Write};
use std::rc::Rc;

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use clockrunner::domain::entity::{BodyRef, ContactTag, Facing};
use clockrunner::domain::vec2::Vec2;
use clockrunner::sim::event::{GameEvent, Outcome};
use clockrunner::sim::ports::{anim, AnimationSink, EffectSink, TimerDisplay};
use clockrunner::sim::presentation::EndScreen;
use clockrunner::sim::sandbox::Sandbox;
use clockrunner::sim::world::World;

/// Frames an attack slash stays on screen.
const SLASH_FRAMES: u8 = 12;
/// Frames a status message stays on screen.
const MESSAGE_FRAMES: u32 = 90;

// ── HudFeed: what the simulation tells the screen ──

#[derive(Default)]
struct FeedState {
    clock: String,
    facing: HashMap<BodyRef, Facing>,
    speed: HashMap<BodyRef, f32>,
    grounded: HashMap<BodyRef, bool>,
    down: HashSet<BodyRef>,
    slash: Option<(Vec2, Facing, u8)>,
}

/// Shared handle; one clone goes into each sink slot, the renderer keeps another.
#[derive(Clone, Default)]
pub struct HudFeed(Rc<RefCell<FeedState>>);

impl HudFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clock(&self) -> String {
        self.0.borrow().clock.clone()
    }

    pub fn facing(&self, body: BodyRef) -> Option<Facing> {
        self.0.borrow().facing.get(&body).copied()
    }

    pub fn is_down(&self, body: BodyRef) -> bool {
        self.0.borrow().down.contains(&body)
    }

    pub fn is_running(&self, body: BodyRef) -> bool {
        self.0.borrow().speed.get(&body).is_some_and(|s| *s > 0.0)
    }

    pub fn is_airborne(&self, body: BodyRef) -> bool {
        self.0.borrow().grounded.get(&body).is_some_and(|g| !g)
    }

    fn slash(&self) -> Option<(Vec2, Facing)> {
        self.0.borrow().slash.map(|(origin, facing, _)| (origin, facing))
    }

    /// Age per-frame effects. Call once per rendered frame.
    pub fn tick(&self) {
        let mut st = self.0.borrow_mut();
        if let Some((_, _, frames)) = st.slash.as_mut() {
            *frames = frames.saturating_sub(1);
            if *frames == 0 { st.slash = None; }
        }
    }

    /// Forget everything body-related (level rebuilt).
    pub fn clear(&self) {
        *self.0.borrow_mut() = FeedState::default();
    }
}

impl AnimationSink for HudFeed {
    fn set_float(&mut self, body: BodyRef, name: &str, value: f32) {
        if name == anim::SPEED {
            self.0.borrow_mut().speed.insert(body, value);
        }
    }

    fn set_bool(&mut self, body: BodyRef, name: &str, value: bool) {
        if name == anim::GROUNDED {
            self.0.borrow_mut().grounded.insert(body, value);
        }
    }

    fn set_trigger(&mut self, body: BodyRef, name: &str) {
        if name == anim::DIE {
            self.0.borrow_mut().down.insert(body);
        }
    }

    fn set_facing(&mut self, body: BodyRef, facing: Facing) {
        self.0.borrow_mut().facing.insert(body, facing);
    }
}

impl EffectSink for HudFeed {
    fn play_attack_effect(&mut self, origin: Vec2, facing: Facing) {
        self.0.borrow_mut().slash = Some((origin, facing, SLASH_FRAMES));
    }
}

impl TimerDisplay for HudFeed {
    fn show(&mut self, text: &str) {
        self.0.borrow_mut().clock = text.to_string();
    }
}

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for every empty cell, so inter-row gaps
    /// match on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel that differs from any real cell; forces a full repaint.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }
}

// ── Messages ──

struct Message {
    text: String,
    color: Color,
    frames_left: u32,
}

/// Short status line for the events worth telling the player about.
fn describe(event: &GameEvent) -> Option<(String, Color)> {
    let good = Color::Rgb { r: 80, g: 255, b: 80 };
    let bad = Color::Rgb { r: 255, g: 90, b: 90 };
    match event {
        GameEvent::EnemyKilled { bonus, .. } if *bonus > 0.0 => Some((format!("Enemy down! +{bonus:.0}s"), good)),
        GameEvent::EnemyKilled { .. } => Some(("Enemy down!".into(), good)),
        GameEvent::PickupCollected { value, .. } => Some((format!("Time pickup +{value:.0}s"), good)),
        GameEvent::TimeSubtracted(s) => Some((format!("Ouch! -{s:.0}s"), bad)),
        GameEvent::PlayerKilled => Some(("You were caught".into(), bad)),
        GameEvent::TimeRanOut => Some(("Time's up!".into(), bad)),
        GameEvent::GameWon => Some(("Goal reached!".into(), good)),
        _ => None,
    }
}

/// Leftmost visible column: centred on the player, clamped to the level.
fn camera_x(player_x: f32, view_w: usize, world_w: usize) -> usize {
    if world_w <= view_w { return 0; }
    let centre = player_x.max(0.0) as usize;
    centre.saturating_sub(view_w / 2).min(world_w - view_w)
}

fn glyph(tag: ContactTag, facing: Option<Facing>, down: bool) -> (&'static str, Color) {
    match tag {
        ContactTag::Player if down => ("xx", Color::Rgb { r: 160, g: 160, b: 160 }),
        ContactTag::Player => match facing {
            Some(Facing::Left) => ("<@", Color::Rgb { r: 255, g: 230, b: 80 }),
            _ => ("@>", Color::Rgb { r: 255, g: 230, b: 80 }),
        },
        ContactTag::Enemy if down => ("..", Color::Rgb { r: 120, g: 60, b: 60 }),
        ContactTag::Enemy => match facing {
            Some(Facing::Right) => ("E>", Color::Rgb { r: 255, g: 70, b: 70 }),
            _ => ("<E", Color::Rgb { r: 255, g: 70, b: 70 }),
        },
        ContactTag::Pickup => ("()", Color::Rgb { r: 80, g: 220, b: 255 }),
        ContactTag::Goal => ("[]", Color::Rgb { r: 80, g: 255, b: 80 }),
        ContactTag::Ground => ("##", Color::Rgb { r: 150, g: 110, b: 70 }),
    }
}

// ── Hud ──

/// Each level cell is two terminal columns wide.
const CELL_W: usize = 2;
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

pub struct Hud {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    feed: HudFeed,
    level_name: String,
    messages: Vec<Message>,
    banner: Option<Outcome>,
}

impl Hud {
    pub fn new(feed: HudFeed) -> Self {
        Hud {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            feed,
            level_name: String::new(),
            messages: Vec::new(),
            banner: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    /// New level: drop messages and banners from the previous run.
    pub fn start_level(&mut self, name: &str) {
        self.level_name = name.to_string();
        self.messages.clear();
        self.banner = None;
        self.back.cells.fill(Cell::INVALID);
    }

    pub fn note_events(&mut self, events: &[GameEvent]) {
        for event in events {
            if let Some((text, color)) = describe(event) {
                self.messages.push(Message { text, color, frames_left: MESSAGE_FRAMES });
            }
        }
        if self.messages.len() > 3 {
            let excess = self.messages.len() - 3;
            self.messages.drain(..excess);
        }
    }

    /// Outcome received from the bus; the first one sticks.
    pub fn note_outcome(&mut self, outcome: Outcome) {
        self.banner.get_or_insert(outcome);
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        self.back.cells.fill(Cell::INVALID);
    }

    pub fn render(&mut self, sb: &Sandbox, world: &World) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        self.front.clear();
        let view_h = self.compose_level(sb, world);
        self.compose_status(world, MAP_ROW + view_h + 1);
        if let Some(screen) = world.presenter.screen() {
            self.compose_end_screen(screen, world, view_h);
        }

        for m in &mut self.messages { m.frames_left = m.frames_left.saturating_sub(1); }
        self.messages.retain(|m| m.frames_left > 0);

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) { continue; }

                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    /// Draw tiles and bodies; returns the number of map rows used.
    fn compose_level(&mut self, sb: &Sandbox, world: &World) -> usize {
        let reserved = MAP_ROW + 5;
        let view_w = (self.term_w / CELL_W).min(sb.width());
        let view_h = self.term_h.saturating_sub(reserved).max(1).min(sb.height());
        let player = world.player_position(sb);
        let cam_x = camera_x(player.x, view_w, sb.width());
        // Bottom rows matter most: the floor stays on screen.
        let top_y = view_h - 1;

        let clock = self.feed.clock();
        let hud = format!(
            " {}   Time {}   Enemies {}   Pickups {} ",
            self.level_name,
            clock,
            world.enemies.iter().filter(|e| !e.is_dying()).count(),
            world.pickups.len(),
        );
        let clock_fg = if world.timer.time_left() <= 10.0 { Color::Rgb { r: 255, g: 90, b: 90 } } else { Color::White };
        self.front.put_str(0, HUD_ROW, &hud, clock_fg, Color::Rgb { r: 40, g: 40, b: 70 });

        let (ground, ground_fg) = glyph(ContactTag::Ground, None, false);
        for row in 0..view_h {
            let wy = (top_y - row) as i64;
            for col in 0..view_w {
                let wx = (cam_x + col) as i64;
                if sb.is_solid(wx, wy) {
                    self.front.put_str(col * CELL_W, MAP_ROW + row, ground, ground_fg, Color::Rgb { r: 60, g: 40, b: 25 });
                }
            }
        }

        let to_screen = |pos: Vec2| -> Option<(usize, usize)> {
            let (wx, wy) = (pos.x.floor() as i64, pos.y.floor() as i64);
            let col = wx - cam_x as i64;
            let row = top_y as i64 - wy;
            if col < 0 || row < 0 || col >= view_w as i64 || row >= view_h as i64 { return None; }
            Some((col as usize * CELL_W, MAP_ROW + row as usize))
        };

        // Triggers first so actors draw over them.
        let mut bodies: Vec<_> = sb.bodies().collect();
        bodies.sort_by_key(|(_, b)| matches!(b.tag, ContactTag::Player | ContactTag::Enemy));
        for (id, body) in bodies {
            let Some((x, y)) = to_screen(body.pos) else { continue };
            let (s, fg) = glyph(body.tag, self.feed.facing(id), self.feed.is_down(id));
            self.front.put_str(x, y, s, fg, Color::Reset);
        }

        if let Some((origin, facing)) = self.feed.slash() {
            if let Some((x, y)) = to_screen(origin) {
                let s = if facing == Facing::Right { "))" } else { "((" };
                self.front.put_str(x, y, s, Color::Rgb { r: 255, g: 255, b: 255 }, Color::Reset);
            }
        }

        view_h
    }

    fn compose_status(&mut self, world: &World, row: usize) {
        for (i, m) in self.messages.iter().enumerate() {
            self.front.put_str(1, row + i, &m.text, m.color, Color::Reset);
        }
        let mood = if !world.player.alive {
            "down"
        } else if self.feed.is_airborne(world.player_body) {
            "airborne"
        } else if self.feed.is_running(world.player_body) {
            "running"
        } else {
            "idle"
        };
        let help = format!(" ←→/AD move   Space jump   J attack   Q quit   [{mood}]");
        self.front.put_str(0, row + 3, &help, Color::DarkGrey, Color::Reset);
    }

    fn compose_end_screen(&mut self, screen: EndScreen, world: &World, view_h: usize) {
        let (title, color) = match screen {
            EndScreen::Victory => ("*  V I C T O R Y  *", Color::Rgb { r: 255, g: 220, b: 50 }),
            EndScreen::GameOver if self.banner == Some(Outcome::TimeRanOut) => {
                ("x  T I M E ' S   U P  x", Color::Rgb { r: 255, g: 60, b: 60 })
            }
            EndScreen::GameOver => ("x  G A M E   O V E R  x", Color::Rgb { r: 255, g: 60, b: 60 }),
        };
        let box_w = 36usize;
        let x0 = (self.term_w.saturating_sub(box_w)) / 2;
        let y0 = MAP_ROW + view_h.saturating_sub(6) / 2;
        let panel = Color::Rgb { r: 30, g: 30, b: 50 };

        for y in y0..y0 + 6 {
            for x in x0..x0 + box_w {
                self.front.set(x, y, Cell::new(' ', Color::White, panel));
            }
        }
        let centre = |s: &str| x0 + box_w.saturating_sub(s.chars().count()) / 2;
        self.front.put_str(centre(title), y0 + 1, title, color, panel);
        let left = format!("Time left {}", self.feed.clock());
        self.front.put_str(centre(&left), y0 + 2, &left, Color::White, panel);
        if world.timer.is_expired() || !world.player.alive || screen == EndScreen::Victory {
            let keys = "R/Start: Restart   Esc/Select: Exit";
            self.front.put_str(centre(keys), y0 + 4, keys, Color::Rgb { r: 100, g: 200, b: 255 }, panel);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_records_sink_calls() {
        let feed = HudFeed::new();
        let mut sink = feed.clone();
        let body = BodyRef(3);
        sink.set_facing(body, Facing::Left);
        sink.set_float(body, anim::SPEED, 2.0);
        sink.set_bool(body, anim::GROUNDED, false);
        sink.show("00:42");
        assert_eq!(feed.facing(body), Some(Facing::Left));
        assert!(feed.is_running(body));
        assert!(feed.is_airborne(body));
        assert_eq!(feed.clock(), "00:42");
        assert!(!feed.is_down(body));
        sink.set_trigger(body, anim::DIE);
        assert!(feed.is_down(body));
    }

    #[test]
    fn slash_fades_after_its_frames() {
        let feed = HudFeed::new();
        let mut sink = feed.clone();
        sink.play_attack_effect(Vec2::new(1.0, 1.0), Facing::Right);
        for _ in 0..SLASH_FRAMES - 1 { feed.tick(); }
        assert!(feed.slash().is_some());
        feed.tick();
        assert!(feed.slash().is_none());
    }

    #[test]
    fn camera_centres_then_clamps() {
        assert_eq!(camera_x(3.0, 20, 10), 0);
        assert_eq!(camera_x(2.0, 10, 50), 0);
        assert_eq!(camera_x(25.0, 10, 50), 20);
        assert_eq!(camera_x(49.0, 10, 50), 40);
    }

    #[test]
    fn only_notable_events_become_messages() {
        assert!(describe(&GameEvent::Jumped).is_none());
        let (text, _) = describe(&GameEvent::TimeSubtracted(3.0)).unwrap();
        assert_eq!(text, "Ouch! -3s");
        let (text, _) = describe(&GameEvent::EnemyKilled { enemy: BodyRef(1), bonus: 5.0 }).unwrap();
        assert_eq!(text, "Enemy down! +5s");
    }

    #[test]
    fn message_queue_keeps_latest_three() {
        let mut hud = Hud::new(HudFeed::new());
        let events = vec![GameEvent::TimeSubtracted(1.0); 5];
        hud.note_events(&events);
        assert_eq!(hud.messages.len(), 3);
        hud.note_outcome(Outcome::TimeRanOut);
        hud.note_outcome(Outcome::GameWon);
        assert_eq!(hud.banner, Some(Outcome::TimeRanOut));
    }
}
