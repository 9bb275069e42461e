use std::collections::{HashSet, VecDeque};

use crate::error::BoardError;
use crate::types::{Cell, PickupKind};

/// Walkability query the simulation consumes. Cells outside the grid must report `false`.
pub trait Walkable {
    fn is_walkable(&self, cell: Cell) -> bool;
}

impl<F> Walkable for F
where
    F: Fn(Cell) -> bool,
{
    fn is_walkable(&self, cell: Cell) -> bool {
        self(cell)
    }
}

pub const DEFAULT_LAYOUT: &str = "\
#####################
#1........#........o#
#.##.###..#..###.##.#
#...................#
#.##.#.#######.#.##.#
#....#....#....#....#
####.###..#..###.####
#o.......   .......2#
#.##.###.###.###.##.#
#.........o.........#
#####################";

/// Immutable tile grid. Rows hold `#` for walls and `.` for floor.
#[derive(Clone, Debug)]
pub struct TileBoard {
    pub width: i32,
    pub height: i32,
    tiles: Vec<String>,
}

impl TileBoard {
    pub fn tiles(&self) -> &[String] {
        &self.tiles
    }

    /// Floor cells reachable from `start` through 4-neighbour steps.
    pub fn reachable_from(&self, start: Cell) -> HashSet<Cell> {
        let mut out = HashSet::new();
        if !self.is_walkable(start) {
            return out;
        }

        let mut queue = VecDeque::new();
        out.insert(start);
        queue.push_back(start);

        while let Some(cell) = queue.pop_front() {
            for next in [
                Cell::new(cell.x - 1, cell.y),
                Cell::new(cell.x + 1, cell.y),
                Cell::new(cell.x, cell.y - 1),
                Cell::new(cell.x, cell.y + 1),
            ] {
                if !self.is_walkable(next) {
                    continue;
                }
                if out.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        out
    }
}

impl Walkable for TileBoard {
    fn is_walkable(&self, cell: Cell) -> bool {
        if cell.x < 0 || cell.y < 0 || cell.x >= self.width || cell.y >= self.height {
            return false;
        }
        self.tiles
            .get(cell.y as usize)
            .and_then(|row| row.as_bytes().get(cell.x as usize))
            .map(|c| *c == b'.')
            .unwrap_or(false)
    }
}

/// A parsed ASCII fixture: the board plus where pickups and spawns sit.
#[derive(Clone, Debug)]
pub struct BoardLayout {
    pub board: TileBoard,
    pub pickups: Vec<(Cell, PickupKind)>,
    pub spawns: Vec<Cell>,
}

/// Reads `#` wall, `.` pellet, `o` power pellet, space empty floor, `1`-`9` player spawns.
pub fn parse_layout(raw: &str) -> Result<BoardLayout, BoardError> {
    let rows: Vec<&str> = raw
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .collect();
    let Some(first) = rows.first() else {
        return Err(BoardError::Empty);
    };
    let width = first.chars().count();

    let mut tiles = Vec::with_capacity(rows.len());
    let mut pickups = Vec::new();
    let mut numbered_spawns: Vec<(u32, Cell)> = Vec::new();

    for (y, row) in rows.iter().enumerate() {
        let found = row.chars().count();
        if found != width {
            return Err(BoardError::RaggedRow {
                row: y,
                expected: width,
                found,
            });
        }
        let mut normalized = String::with_capacity(width);
        for (x, glyph) in row.chars().enumerate() {
            let cell = Cell::new(x as i32, y as i32);
            match glyph {
                '#' => {
                    normalized.push('#');
                    continue;
                }
                '.' => pickups.push((cell, PickupKind::Pellet)),
                'o' => pickups.push((cell, PickupKind::PowerPellet)),
                ' ' => {}
                '1'..='9' => {
                    numbered_spawns.push((glyph.to_digit(10).unwrap_or(0), cell));
                }
                _ => {
                    return Err(BoardError::UnknownGlyph {
                        glyph,
                        x: cell.x,
                        y: cell.y,
                    })
                }
            }
            normalized.push('.');
        }
        tiles.push(normalized);
    }

    numbered_spawns.sort_by_key(|(number, _)| *number);
    if let Some(pair) = numbered_spawns.windows(2).find(|pair| pair[0].0 == pair[1].0) {
        return Err(BoardError::DuplicateSpawn(pair[0].0 as u8));
    }
    for (expected, (number, _)) in numbered_spawns.iter().enumerate() {
        if *number != expected as u32 + 1 {
            return Err(BoardError::MissingSpawn(expected as u8 + 1));
        }
    }

    Ok(BoardLayout {
        board: TileBoard {
            width: width as i32,
            height: tiles.len() as i32,
            tiles,
        },
        pickups,
        spawns: numbered_spawns.into_iter().map(|(_, cell)| cell).collect(),
    })
}

impl BoardLayout {
    pub fn spawn_for(&self, player: u8) -> Result<Cell, BoardError> {
        player
            .checked_sub(1)
            .and_then(|idx| self.spawns.get(idx as usize))
            .copied()
            .ok_or(BoardError::MissingSpawn(player))
    }
}
