//! Deductive solver.
//!
//! Derives logically guaranteed safe moves from the clues revealed so far.
//! Two passes: a single-cell pass (a clue satisfied entirely by its hidden
//! neighbors forces flags; a clue satisfied entirely by its flags clears
//! the rest) and a subset-elimination pass over adjacent clue pairs, used
//! only when the single-cell pass comes up empty. The solver never guesses
//! and never mutates the board.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{Board, GameError, Position};

/// Per-cell solver annotation. `safe` and `flagged` must never both be
/// set; that combination is a logic contradiction and is surfaced as
/// [`GameError::Contradiction`].
#[derive(Debug, Clone, Copy, Default)]
struct Mark {
    safe: bool,
    flagged: bool,
}

/// A proven-safe, still-hidden cell together with its move-ordering key.
///
/// Lower is better: the priority is the destination row (closer to the goal
/// row at the top) plus the Manhattan distance from the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub pos: Position,
    pub priority: usize,
}

/// Deduction state for one game.
///
/// Annotations accumulate across [`analyze`](Solver::analyze) calls for the
/// lifetime of one board; build a fresh solver for a fresh board.
#[derive(Debug, Clone)]
pub struct Solver {
    marks: Vec<Vec<Mark>>,
}

impl Solver {
    /// Create a solver sized for the given board.
    pub fn new(board: &Board) -> Self {
        Self {
            marks: vec![vec![Mark::default(); board.cols()]; board.rows()],
        }
    }

    /// Whether a cell has been deduced safe.
    pub fn is_safe(&self, row: usize, col: usize) -> bool {
        self.marks[row][col].safe
    }

    /// Whether a cell has been deduced to hold a skull.
    pub fn is_flagged(&self, row: usize, col: usize) -> bool {
        self.marks[row][col].flagged
    }

    /// Run the deduction passes against the board's current visible state
    /// and return every hidden cell that is provably safe.
    ///
    /// The single-cell pass is applied first and retried once (clearing a
    /// satisfied clue can enable the flagging rule on the same state). The
    /// adjacent-pair pass runs only if both applications yield nothing. An
    /// empty result means deduction is exhausted, not that the board is
    /// unsolvable.
    pub fn analyze(&mut self, board: &Board) -> Result<Vec<Position>, GameError> {
        // The bottom row never holds skulls; it is unconditionally safe.
        let bottom = board.bottom_row();
        for col in 0..board.cols() {
            self.mark_safe(bottom, col)?;
        }

        let mut destinations = self.single_cell_pass(board)?;
        if destinations.is_empty() {
            destinations = self.single_cell_pass(board)?;
        }
        if destinations.is_empty() {
            destinations = self.adjacent_pair_pass(board)?;
        }
        debug!(count = destinations.len(), "analysis complete");
        Ok(destinations)
    }

    /// Rank destinations and pick the first one that is still worth moving
    /// to: still hidden, and reachable by cardinal movement (on the bottom
    /// row or bordering an explored cell). `None` means automatic play has
    /// run out of sound moves.
    pub fn pick_next(
        &self,
        board: &Board,
        destinations: &[Position],
        current: Position,
    ) -> Option<Position> {
        let mut ranked: Vec<Destination> = destinations
            .iter()
            .map(|&pos| Destination {
                pos,
                priority: pos.row + pos.manhattan(current),
            })
            .collect();
        ranked.sort_by_key(|d| d.priority);

        ranked.into_iter().map(|d| d.pos).find(|p| {
            // Flood-fill from an earlier move may have revealed this one.
            board.cell(p.row, p.col).is_hidden() && self.is_reachable(board, *p)
        })
    }

    /// A cell is reachable without diagonal steps if it sits on the bottom
    /// row or borders an already-explored cell cardinally.
    fn is_reachable(&self, board: &Board, pos: Position) -> bool {
        pos.row == board.bottom_row()
            || board
                .cardinal_neighbors(pos.row, pos.col)
                .into_iter()
                .any(|n| !board.cell(n.row, n.col).is_hidden())
    }

    /// Single-cell deduction over every revealed clue.
    fn single_cell_pass(&mut self, board: &Board) -> Result<Vec<Position>, GameError> {
        // Flag rule: if a clue's hidden, not-known-safe neighbors are
        // exactly as many as the skulls it still needs, all of them are
        // skulls.
        for (pos, clue) in self.revealed_clues(board) {
            let candidates: Vec<Position> = board
                .moore_neighbors(pos.row, pos.col)
                .into_iter()
                .filter(|n| {
                    board.cell(n.row, n.col).is_hidden() && !self.marks[n.row][n.col].safe
                })
                .collect();
            if candidates.len() == clue as usize {
                for n in candidates {
                    self.mark_flagged(n.row, n.col)?;
                }
            }
        }

        // Clear rule: a clue matched by its flags makes every other hidden
        // neighbor safe.
        for (pos, clue) in self.revealed_clues(board) {
            let neighbors = board.moore_neighbors(pos.row, pos.col);
            let flagged = neighbors
                .iter()
                .filter(|n| self.marks[n.row][n.col].flagged)
                .count();
            if flagged == clue as usize {
                for n in neighbors {
                    if board.cell(n.row, n.col).is_hidden() && !self.marks[n.row][n.col].flagged {
                        self.mark_safe(n.row, n.col)?;
                    }
                }
            }
        }

        Ok(self.destinations(board))
    }

    /// Subset elimination over cardinally adjacent clue pairs.
    ///
    /// For clues A and B with remaining counts `rem = clue - flags` and
    /// hidden non-flagged neighbor sets, if `rem_a - rem_b` equals the size
    /// of A's exclusive region, the overlap must absorb all of B's skulls:
    /// A's exclusive neighbors are all skulls and B's are all safe.
    fn adjacent_pair_pass(&mut self, board: &Board) -> Result<Vec<Position>, GameError> {
        for (pos_a, clue_a) in self.revealed_clues(board) {
            for pos_b in board.cardinal_neighbors(pos_a.row, pos_a.col) {
                let Some(clue_b) = board.cell(pos_b.row, pos_b.col).clue() else {
                    continue;
                };

                let (rem_a, set_a) = self.remaining(board, pos_a, clue_a);
                let (rem_b, set_b) = self.remaining(board, pos_b, clue_b);

                let exclusive_a: Vec<Position> =
                    set_a.iter().copied().filter(|p| !set_b.contains(p)).collect();
                let exclusive_b: Vec<Position> =
                    set_b.iter().copied().filter(|p| !set_a.contains(p)).collect();

                if rem_a - rem_b == exclusive_a.len() as i32 {
                    trace!(
                        a = %pos_a,
                        b = %pos_b,
                        forced = exclusive_a.len(),
                        cleared = exclusive_b.len(),
                        "pair rule applied"
                    );
                    for p in exclusive_a {
                        self.mark_flagged(p.row, p.col)?;
                    }
                    for p in exclusive_b {
                        self.mark_safe(p.row, p.col)?;
                    }
                }
            }
        }

        Ok(self.destinations(board))
    }

    /// A clue's outstanding skull count and its hidden non-flagged neighbors.
    fn remaining(&self, board: &Board, pos: Position, clue: u8) -> (i32, Vec<Position>) {
        let neighbors = board.moore_neighbors(pos.row, pos.col);
        let flagged = neighbors
            .iter()
            .filter(|n| self.marks[n.row][n.col].flagged)
            .count();
        let hidden: Vec<Position> = neighbors
            .into_iter()
            .filter(|n| {
                board.cell(n.row, n.col).is_hidden() && !self.marks[n.row][n.col].flagged
            })
            .collect();
        (clue as i32 - flagged as i32, hidden)
    }

    /// Every revealed clue cell with its value.
    fn revealed_clues(&self, board: &Board) -> Vec<(Position, u8)> {
        let mut clues = Vec::new();
        for row in 0..board.rows() {
            for col in 0..board.cols() {
                if let Some(n) = board.cell(row, col).clue() {
                    clues.push((Position::new(row, col), n));
                }
            }
        }
        clues
    }

    /// All hidden cells currently marked safe, in row-major order.
    fn destinations(&self, board: &Board) -> Vec<Position> {
        let mut out = Vec::new();
        for row in 0..board.rows() {
            for col in 0..board.cols() {
                if self.marks[row][col].safe && board.cell(row, col).is_hidden() {
                    out.push(Position::new(row, col));
                }
            }
        }
        out
    }

    fn mark_safe(&mut self, row: usize, col: usize) -> Result<(), GameError> {
        let mark = &mut self.marks[row][col];
        mark.safe = true;
        if mark.flagged {
            return Err(GameError::Contradiction { row, col });
        }
        Ok(())
    }

    fn mark_flagged(&mut self, row: usize, col: usize) -> Result<(), GameError> {
        let mark = &mut self.marks[row][col];
        mark.flagged = true;
        if mark.safe {
            return Err(GameError::Contradiction { row, col });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cell, Status};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_bottom_row_seeded_safe() {
        let board = Board::with_skulls(vec![vec![false; 4]; 3]).unwrap();
        let mut solver = Solver::new(&board);
        let destinations = solver.analyze(&board).unwrap();
        assert_eq!(
            destinations,
            vec![
                Position::new(2, 0),
                Position::new(2, 1),
                Position::new(2, 2),
                Position::new(2, 3),
            ]
        );
        assert!(solver.is_safe(2, 0));
        assert!(!solver.is_safe(1, 0));
    }

    #[test]
    fn test_clue_one_forces_flag() {
        // Skull in the top-left corner; revealing everything else leaves a
        // clue 1 with a single hidden neighbor.
        let mut board = Board::with_skulls(vec![
            vec![true, false, false],
            vec![false, false, false],
            vec![false, false, false],
        ])
        .unwrap();
        board.explore_cell(2, 1);
        assert!(board.cell(0, 0).is_hidden());
        assert_eq!(board.cell(1, 0), Cell::Clue(1));

        let mut solver = Solver::new(&board);
        solver.analyze(&board).unwrap();
        assert!(solver.is_flagged(0, 0));
        assert!(!solver.is_safe(0, 0));
    }

    #[test]
    fn test_satisfied_clue_clears_neighbors() {
        // Clue 2 with both skulls flagged: the remaining hidden neighbor
        // must come back as safe and as a destination.
        let mut board = Board::with_skulls(vec![
            vec![true, false, true, false],
            vec![false, false, false, false],
            vec![false, false, false, false],
        ])
        .unwrap();
        board.explore_cell(1, 1);
        assert_eq!(board.cell(1, 1), Cell::Clue(2));
        board.explore_cell(2, 0);
        board.explore_cell(2, 1);
        board.explore_cell(2, 2);
        board.explore_cell(2, 3);
        board.explore_cell(1, 0);
        board.explore_cell(1, 2);

        let mut solver = Solver::new(&board);
        solver.marks[0][0].flagged = true;
        solver.marks[0][2].flagged = true;
        let destinations = solver.analyze(&board).unwrap();
        assert!(solver.is_safe(0, 1));
        assert!(destinations.contains(&Position::new(0, 1)));
    }

    #[test]
    fn test_contradiction_detected() {
        let board = Board::with_skulls(vec![vec![false; 3]; 3]).unwrap();
        let mut solver = Solver::new(&board);
        // Synthetic bad state: a bottom-row cell (always seeded safe) is
        // already flagged.
        solver.marks[2][1].flagged = true;
        assert_eq!(
            solver.analyze(&board).unwrap_err(),
            GameError::Contradiction { row: 2, col: 1 }
        );
    }

    #[test]
    fn test_pair_rule_flags_and_clears() {
        // Truth row 0: X . X .  — the bottom clues read 1 2 1 1 and the
        // single-cell pass alone cannot make progress.
        let mut board = Board::with_skulls(vec![
            vec![true, false, true, false],
            vec![false, false, false, false],
        ])
        .unwrap();
        for col in 0..4 {
            board.explore_cell(1, col);
        }
        assert_eq!(board.cell(1, 0), Cell::Clue(1));
        assert_eq!(board.cell(1, 1), Cell::Clue(2));
        assert_eq!(board.cell(1, 2), Cell::Clue(1));
        assert_eq!(board.cell(1, 3), Cell::Clue(1));

        let mut solver = Solver::new(&board);
        let destinations = solver.analyze(&board).unwrap();

        assert!(solver.is_flagged(0, 0));
        assert!(solver.is_flagged(0, 2));
        assert!(solver.is_safe(0, 1));
        assert!(solver.is_safe(0, 3));
        assert_eq!(
            destinations,
            vec![Position::new(0, 1), Position::new(0, 3)]
        );
    }

    #[test]
    fn test_pick_next_prefers_goalward_and_near() {
        let board = Board::with_skulls(vec![vec![false; 5]; 5]).unwrap();
        let solver = Solver::new(&board);
        let destinations = vec![
            Position::new(4, 0),
            Position::new(4, 2),
            Position::new(4, 4),
        ];
        // All on the bottom row (reachable); nearest to the current
        // position wins on the Manhattan term.
        let pick = solver.pick_next(&board, &destinations, Position::new(4, 2));
        assert_eq!(pick, Some(Position::new(4, 2)));
    }

    #[test]
    fn test_pick_next_skips_revealed_and_unreachable() {
        let mut board = Board::with_skulls(vec![
            vec![false, false, true],
            vec![true, false, false],
            vec![false, false, false],
        ])
        .unwrap();
        board.explore_cell(2, 0);
        let mut solver = Solver::new(&board);
        solver.marks[0][0].safe = true;
        solver.marks[2][0].safe = true;
        solver.marks[2][1].safe = true;

        let destinations = vec![
            Position::new(0, 0), // hidden but no explored cardinal neighbor
            Position::new(2, 0), // already explored
            Position::new(2, 1), // hidden, bottom row
        ];
        let pick = solver.pick_next(&board, &destinations, Position::new(2, 0));
        assert_eq!(pick, Some(Position::new(2, 1)));
    }

    #[test]
    fn test_analyze_soundness_on_generated_boards() {
        // Every destination the solver ever produces must be skull-free,
        // across full deductive playouts of many generated boards.
        for seed in 0..15 {
            let mut board = Board::new(7, 7).unwrap();
            let mut rng = StdRng::seed_from_u64(seed);
            board.fill_grid(&mut rng).unwrap();
            let mut solver = Solver::new(&board);
            let mut current = Position::new(board.bottom_row(), board.cols() / 2);

            loop {
                let destinations = solver.analyze(&board).unwrap();
                for d in &destinations {
                    assert!(
                        !board.is_skull(d.row, d.col),
                        "seed {}: unsound destination {}",
                        seed,
                        d
                    );
                }
                match solver.pick_next(&board, &destinations, current) {
                    Some(pos) => {
                        board.explore_cell(pos.row, pos.col);
                        current = pos;
                    }
                    None => break,
                }
                if board.status().is_over() {
                    break;
                }
            }
            // The solver only plays proven-safe cells, so it can stall but
            // never lose.
            assert_ne!(board.status(), Status::Lost, "seed {}", seed);
        }
    }
}
