use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{GameError, Position};

/// The top row; exploring any non-skull cell here wins the game.
pub const TOP_ROW: usize = 0;

/// Total attempts allowed while rejection-sampling skull placements.
const MAX_PLACEMENT_ATTEMPTS: usize = 1000;

/// Player-visible state of a single cell.
///
/// A cell transitions away from `Hidden` exactly once; the other variants
/// are final. Clue values are always in `1..=8` by construction (Moore
/// neighborhoods have at most eight cells), so no out-of-range branch exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    /// Not yet explored.
    Hidden,
    /// Explored, no skulls among the neighbors.
    Blank,
    /// Explored, with the count of neighboring skulls.
    Clue(u8),
    /// Explored and it was a skull.
    Skull,
}

impl Cell {
    /// Whether the cell has not been explored yet.
    pub fn is_hidden(&self) -> bool {
        matches!(self, Cell::Hidden)
    }

    /// The clue value, if this is a revealed clue cell.
    pub fn clue(&self) -> Option<u8> {
        match self {
            Cell::Clue(n) => Some(*n),
            _ => None,
        }
    }
}

/// Overall game state.
///
/// Transitions from `Playing` to a terminal state exactly once and then
/// stays there; reveal-all exploration never re-triggers a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Playing,
    Won,
    Lost,
}

impl Status {
    /// Whether the game has reached a terminal state.
    pub fn is_over(&self) -> bool {
        !matches!(self, Status::Playing)
    }
}

/// The game board: hidden skull placement plus the player-visible grid.
///
/// The skull grid is fixed after [`fill_grid`](Board::fill_grid); all later
/// mutation happens cell-by-cell through [`explore_cell`](Board::explore_cell).
/// The board knows nothing about solving strategy.
#[derive(Debug, Clone)]
pub struct Board {
    rows: usize,
    cols: usize,
    skull_count: usize,
    skulls: Vec<Vec<bool>>,
    visible: Vec<Vec<Cell>>,
    status: Status,
}

impl Board {
    /// Create an empty board. The skull quota is `rows * cols / 8 + 1`.
    ///
    /// Call [`fill_grid`](Board::fill_grid) before playing.
    pub fn new(rows: usize, cols: usize) -> Result<Self, GameError> {
        if rows == 0 || cols == 0 {
            return Err(GameError::EmptyGrid { rows, cols });
        }
        Ok(Self {
            rows,
            cols,
            skull_count: rows * cols / 8 + 1,
            skulls: vec![vec![false; cols]; rows],
            visible: vec![vec![Cell::Hidden; cols]; rows],
            status: Status::Playing,
        })
    }

    /// Create a board with an explicit skull layout.
    ///
    /// Generation constraints are not enforced here; the caller owns the
    /// layout. Useful for scripted scenarios and tests.
    pub fn with_skulls(skulls: Vec<Vec<bool>>) -> Result<Self, GameError> {
        let rows = skulls.len();
        let cols = skulls.first().map_or(0, |row| row.len());
        if rows == 0 || cols == 0 || skulls.iter().any(|row| row.len() != cols) {
            return Err(GameError::EmptyGrid { rows, cols });
        }
        let skull_count = skulls.iter().flatten().filter(|s| **s).count();
        Ok(Self {
            rows,
            cols,
            skull_count,
            skulls,
            visible: vec![vec![Cell::Hidden; cols]; rows],
            status: Status::Playing,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of skulls this board holds once filled.
    pub fn skull_count(&self) -> usize {
        self.skull_count
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Index of the skull-free bottom row.
    pub fn bottom_row(&self) -> usize {
        self.rows - 1
    }

    pub fn valid_row(&self, row: usize) -> bool {
        row < self.rows
    }

    pub fn valid_col(&self, col: usize) -> bool {
        col < self.cols
    }

    /// Visible state of a cell.
    pub fn cell(&self, row: usize, col: usize) -> Cell {
        self.visible[row][col]
    }

    /// Ground truth for a cell. Intended for post-game display only.
    pub fn is_skull(&self, row: usize, col: usize) -> bool {
        self.skulls[row][col]
    }

    /// Number of skulls in the Moore neighborhood of a cell.
    pub fn neighbor_skull_count(&self, row: usize, col: usize) -> u8 {
        self.moore_neighbors(row, col)
            .into_iter()
            .filter(|p| self.skulls[p.row][p.col])
            .count() as u8
    }

    /// Number of skulls in a row.
    pub fn row_skull_count(&self, row: usize) -> usize {
        self.skulls[row].iter().filter(|s| **s).count()
    }

    /// The up-to-eight neighbors of a cell, clipped at the board edges.
    pub fn moore_neighbors(&self, row: usize, col: usize) -> Vec<Position> {
        let mut neighbors = Vec::with_capacity(8);
        for dr in -1i64..=1 {
            for dc in -1i64..=1 {
                if dr == 0 && dc == 0 {
                    continue;
                }
                let nr = row as i64 + dr;
                let nc = col as i64 + dc;
                if nr >= 0 && (nr as usize) < self.rows && nc >= 0 && (nc as usize) < self.cols {
                    neighbors.push(Position::new(nr as usize, nc as usize));
                }
            }
        }
        neighbors
    }

    /// The up-to-four cardinal neighbors of a cell.
    pub fn cardinal_neighbors(&self, row: usize, col: usize) -> Vec<Position> {
        let mut neighbors = Vec::with_capacity(4);
        if row > 0 {
            neighbors.push(Position::new(row - 1, col));
        }
        if row + 1 < self.rows {
            neighbors.push(Position::new(row + 1, col));
        }
        if col > 0 {
            neighbors.push(Position::new(row, col - 1));
        }
        if col + 1 < self.cols {
            neighbors.push(Position::new(row, col + 1));
        }
        neighbors
    }

    /// Randomly place the full skull quota.
    ///
    /// A candidate cell is accepted only if its row is above the bottom row,
    /// it holds no skull yet, fewer than two of its neighbors hold skulls,
    /// and its row holds fewer skulls than the total quota. Placement uses
    /// rejection sampling with a bounded attempt budget; running out of
    /// budget is fatal rather than leaving a partially filled board.
    pub fn fill_grid<R: Rng>(&mut self, rng: &mut R) -> Result<(), GameError> {
        let target = self.skull_count;
        let mut placed = 0;

        // Skulls only go in rows 0..rows-1, which do not exist on a
        // one-row board.
        if self.rows < 2 {
            return Err(GameError::PlacementBudgetExhausted { placed, target });
        }

        let mut attempts = MAX_PLACEMENT_ATTEMPTS;
        while placed < target {
            if attempts == 0 {
                return Err(GameError::PlacementBudgetExhausted { placed, target });
            }
            attempts -= 1;

            let row = rng.gen_range(0..self.rows - 1);
            let col = rng.gen_range(0..self.cols);

            if !self.skulls[row][col]
                && self.neighbor_skull_count(row, col) < 2
                && self.row_skull_count(row) < target
            {
                self.skulls[row][col] = true;
                placed += 1;
                trace!(row, col, "placed skull");
            }
        }
        debug!(
            rows = self.rows,
            cols = self.cols,
            skulls = placed,
            "grid filled"
        );
        Ok(())
    }

    /// Explore a cell as a player move.
    ///
    /// No-op if the cell is already explored. Exploring a skull loses the
    /// game; exploring a non-skull cell on the top row wins it. A cell with
    /// no neighboring skulls reveals as [`Cell::Blank`] and flood-fills its
    /// neighbors. Coordinates must be in bounds (check with
    /// [`valid_row`](Board::valid_row) / [`valid_col`](Board::valid_col)).
    pub fn explore_cell(&mut self, row: usize, col: usize) {
        self.explore_inner(row, col, false);
    }

    /// Explore every remaining cell without touching the game status.
    /// Used to show the final board after a win or loss.
    pub fn reveal_all(&mut self) {
        for row in 0..self.rows {
            for col in 0..self.cols {
                self.explore_inner(row, col, true);
            }
        }
    }

    fn explore_inner(&mut self, row: usize, col: usize, reveal_all: bool) {
        if !self.visible[row][col].is_hidden() {
            return;
        }

        if self.skulls[row][col] {
            self.visible[row][col] = Cell::Skull;
            if !reveal_all && self.status == Status::Playing {
                debug!(row, col, "stepped on a skull");
                self.status = Status::Lost;
            }
            return;
        }

        let count = self.neighbor_skull_count(row, col);
        self.visible[row][col] = if count == 0 {
            Cell::Blank
        } else {
            Cell::Clue(count)
        };

        if row == TOP_ROW && !reveal_all && self.status == Status::Playing {
            debug!(row, col, "reached the top row");
            self.status = Status::Won;
        }

        // Blank cells cascade. The hidden-cell guard above keeps the
        // recursion from revisiting cells, so this terminates.
        if count == 0 {
            for neighbor in self.moore_neighbors(row, col) {
                self.explore_inner(neighbor.row, neighbor.col, reveal_all);
            }
        }
    }
}

impl std::fmt::Display for Board {
    /// Renders the player-visible grid: `-` hidden, `0` blank, clue digits,
    /// `X` for a revealed skull.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in &self.visible {
            for (i, cell) in row.iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                match cell {
                    Cell::Hidden => write!(f, "-")?,
                    Cell::Blank => write!(f, "0")?,
                    Cell::Clue(n) => write!(f, "{}", n)?,
                    Cell::Skull => write!(f, "X")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
