/// Level loader: ASCII layouts into a sandbox host plus a ready world.
///
/// ## Sources (priority order):
///   1. `[general] level` path from config
///   2. Built-in embedded level
///
/// ## Format
///   Optional first line `# Level Name`, then map rows, top row first.
///   Shorter rows are padded with empty cells.
///
/// ## Tile legend:
///   '#' = Ground (solid)         'P' = Player spawn (exactly one)
///   'E' = Enemy spawn            '+' = Time pickup
///   'G' = Goal                   '.' or ' ' = Empty

use std::path::Path;

use tracing::info;

use crate::config::GameConfig;
use crate::domain::entity::{ContactTag, Facing};
use crate::error::LevelError;

use super::ports::Sinks;
use super::sandbox::Sandbox;
use super::world::{Bodies, World};

pub const EMBEDDED_LEVEL: &str = "\
# Clock Tower
..................................................
..................................................
.............+...............E....................
...........#####..........#######.........+.....G.
..................................................
.....+..........E.................####....E.....##
P.........######.......E..............#.........##
##################....############################
";

/// Parsed layout. Cell coordinates are (column, row-from-bottom).
#[derive(Clone, Debug, PartialEq)]
pub struct LevelDef {
    pub name: String,
    pub width: usize,
    pub height: usize,
    pub ground: Vec<(usize, usize)>,
    pub spawn: (usize, usize),
    pub enemies: Vec<(usize, usize)>,
    pub pickups: Vec<(usize, usize)>,
    pub goals: Vec<(usize, usize)>,
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

pub fn parse_level(text: &str) -> Result<LevelDef, LevelError> {
    let mut lines: Vec<&str> = text.lines().collect();
    let mut name = String::from("Untitled");
    if let Some(first) = lines.first() {
        if let Some(title) = first.strip_prefix('#').filter(|t| t.starts_with(' ')) {
            name = title.trim().to_string();
            lines.remove(0);
        }
    }
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    if lines.is_empty() { return Err(LevelError::Empty); }

    let height = lines.len();
    let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let mut def = LevelDef {
        name,
        width,
        height,
        ground: vec![],
        spawn: (0, 0),
        enemies: vec![],
        pickups: vec![],
        goals: vec![],
    };
    let mut spawn = None;

    for (row, line) in lines.iter().enumerate() {
        let y = height - 1 - row;
        for (col, glyph) in line.chars().enumerate() {
            let cell = (col, y);
            match glyph {
                '#' => def.ground.push(cell),
                'P' => {
                    if spawn.is_some() { return Err(LevelError::ExtraSpawn { row, col }); }
                    spawn = Some(cell);
                }
                'E' => def.enemies.push(cell),
                '+' => def.pickups.push(cell),
                'G' => def.goals.push(cell),
                '.' | ' ' => {}
                other => return Err(LevelError::UnknownGlyph { glyph: other, row, col }),
            }
        }
    }

    def.spawn = spawn.ok_or(LevelError::NoSpawn)?;
    Ok(def)
}

pub fn load_level_file(path: &Path) -> Result<LevelDef, LevelError> {
    let text = std::fs::read_to_string(path).map_err(|source| LevelError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_level(&text)
}

/// Level named by the config, or the embedded one.
pub fn load_configured(config: &GameConfig) -> Result<LevelDef, LevelError> {
    match &config.level_path {
        Some(path) => load_level_file(path),
        None => parse_level(EMBEDDED_LEVEL),
    }
}

/// Place every body in a fresh sandbox and assemble the world over it.
pub fn build(def: &LevelDef, config: &GameConfig, sinks: Sinks) -> Result<(Sandbox, World), LevelError> {
    let mut sb = Sandbox::new(def.width, def.height);
    for &(x, y) in &def.ground {
        sb.set_solid(x, y, true);
    }

    let (px, py) = def.spawn;
    let player = sb.spawn_player(px, py, config.player.gravity_scale);
    let enemies = def
        .enemies
        .iter()
        .map(|&(x, y)| {
            // Enemies start facing the spawn.
            let facing = if x >= px { Facing::Left } else { Facing::Right };
            (sb.spawn_actor(x, y, ContactTag::Enemy), facing)
        })
        .collect();
    let pickups = def.pickups.iter().map(|&(x, y)| sb.spawn_trigger(x, y, ContactTag::Pickup)).collect();
    let goals = def.goals.iter().map(|&(x, y)| sb.spawn_trigger(x, y, ContactTag::Goal)).collect();

    let bodies = Bodies {
        player,
        ground_probe: sb.ground_probe(),
        facing: Facing::Right,
        enemies,
        pickups,
        goals,
    };
    let world = World::new(config.clone(), &bodies, &sb, sinks)?;
    info!(name = %def.name, width = def.width, height = def.height, "level built");
    Ok((sb, world))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_level_parses_and_builds() {
        let def = parse_level(EMBEDDED_LEVEL).unwrap();
        assert_eq!(def.name, "Clock Tower");
        assert_eq!(def.spawn, (0, 1));
        assert_eq!(def.enemies.len(), 4);
        assert_eq!(def.pickups.len(), 3);
        assert_eq!(def.goals.len(), 1);
        let (sb, world) = build(&def, &GameConfig::default(), Sinks::default()).unwrap();
        assert_eq!(sb.width(), 50);
        assert_eq!(world.enemies.len(), 4);
    }

    #[test]
    fn shipped_level_file_builds() {
        let def = parse_level(include_str!("../../levels/rooftops.txt")).unwrap();
        assert_eq!(def.name, "Rooftops");
        assert_eq!(def.spawn, (0, 2));
        assert_eq!(def.enemies.len(), 2);
        assert_eq!(def.goals.len(), 1);
        assert!(build(&def, &GameConfig::default(), Sinks::default()).is_ok());
    }

    #[test]
    fn rows_are_bottom_up() {
        let def = parse_level("..G\nP..\n###\n").unwrap();
        assert_eq!(def.height, 3);
        assert_eq!(def.spawn, (0, 1));
        assert_eq!(def.goals, vec![(2, 2)]);
        assert_eq!(def.ground, vec![(0, 0), (1, 0), (2, 0)]);
    }

    #[test]
    fn short_rows_are_padded() {
        let def = parse_level("P\n####\n").unwrap();
        assert_eq!(def.width, 4);
        assert_eq!(def.name, "Untitled");
    }

    #[test]
    fn missing_spawn_rejected() {
        assert!(matches!(parse_level("...\n###\n"), Err(LevelError::NoSpawn)));
    }

    #[test]
    fn second_spawn_rejected() {
        assert!(matches!(
            parse_level("P.P\n###\n"),
            Err(LevelError::ExtraSpawn { row: 0, col: 2 })
        ));
    }

    #[test]
    fn unknown_glyph_rejected() {
        assert!(matches!(
            parse_level("P.?\n###\n"),
            Err(LevelError::UnknownGlyph { glyph: '?', row: 0, col: 2 })
        ));
    }

    #[test]
    fn blank_text_is_empty() {
        assert!(matches!(parse_level("\n\n"), Err(LevelError::Empty)));
        assert!(matches!(parse_level("# Only A Title\n"), Err(LevelError::Empty)));
    }

    #[test]
    fn level_file_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.txt");
        std::fs::write(&path, "# Tiny\nP.G\n###\n").unwrap();
        let def = load_level_file(&path).unwrap();
        assert_eq!(def.name, "Tiny");
        let missing = load_level_file(&dir.path().join("nope.txt"));
        assert!(matches!(missing, Err(LevelError::Read { .. })));
    }
}
