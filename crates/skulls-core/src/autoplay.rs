//! Automatic play session.
//!
//! Owns one board/solver pair for the lifetime of a game and advances it
//! one sound move at a time. Everything here is synchronous: an external
//! scheduler decides *when* to step, and stopping is a flag checked
//! between steps, never preemption mid-analysis.

use tracing::debug;

use crate::{Board, GameError, Position, Solver, Status};

/// Result of one automatic step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A proven-safe cell was explored.
    Moved(Position),
    /// The game already reached a terminal state.
    Finished(Status),
    /// Deduction is exhausted while the game is still in progress; a
    /// manual decision is required.
    NoMoveFound,
    /// A stop was requested between steps.
    Stopped,
}

/// One in-progress automatic game.
///
/// Replaces the board and solver wholesale for a new game; there is no
/// process-wide instance.
#[derive(Debug)]
pub struct AutoPlayer {
    board: Board,
    solver: Solver,
    current: Position,
    stop_requested: bool,
}

impl AutoPlayer {
    /// Start a session on a filled board, entering at the middle of the
    /// skull-free bottom row.
    pub fn new(board: Board) -> Self {
        let current = Position::new(board.bottom_row(), board.cols() / 2);
        Self::with_start(board, current)
    }

    /// Start a session with an explicit current position.
    pub fn with_start(board: Board, current: Position) -> Self {
        let solver = Solver::new(&board);
        Self {
            board,
            solver,
            current,
            stop_requested: false,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn solver(&self) -> &Solver {
        &self.solver
    }

    /// The cell the session last moved to.
    pub fn current(&self) -> Position {
        self.current
    }

    /// Ask [`run`](AutoPlayer::run) to stop before its next step.
    pub fn request_stop(&mut self) {
        self.stop_requested = true;
    }

    /// Analyze, pick the best proven-safe move, and play it.
    pub fn step(&mut self) -> Result<StepOutcome, GameError> {
        if self.board.status().is_over() {
            return Ok(StepOutcome::Finished(self.board.status()));
        }

        let destinations = self.solver.analyze(&self.board)?;
        match self.solver.pick_next(&self.board, &destinations, self.current) {
            Some(pos) => {
                debug!(%pos, "auto move");
                self.board.explore_cell(pos.row, pos.col);
                self.current = pos;
                Ok(StepOutcome::Moved(pos))
            }
            None => {
                debug!("deduction exhausted");
                Ok(StepOutcome::NoMoveFound)
            }
        }
    }

    /// Step until the game ends, deduction is exhausted, or a stop is
    /// requested. Returns the outcome that ended the loop.
    pub fn run(&mut self) -> Result<StepOutcome, GameError> {
        loop {
            if self.stop_requested {
                return Ok(StepOutcome::Stopped);
            }
            match self.step()? {
                StepOutcome::Moved(_) => continue,
                outcome => return Ok(outcome),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_run_wins_empty_board() {
        let board = Board::with_skulls(vec![vec![false; 5]; 5]).unwrap();
        let mut player = AutoPlayer::new(board);
        let outcome = player.run().unwrap();
        assert_eq!(outcome, StepOutcome::Finished(Status::Won));
    }

    #[test]
    fn test_first_step_enters_bottom_row() {
        let board = Board::with_skulls(vec![
            vec![true, false, true],
            vec![false, true, false],
            vec![false, false, false],
        ])
        .unwrap();
        let mut player = AutoPlayer::new(board);
        let outcome = player.step().unwrap();
        // The entry point itself is the closest safe destination.
        assert_eq!(outcome, StepOutcome::Moved(Position::new(2, 1)));
        assert_eq!(player.current(), Position::new(2, 1));
    }

    #[test]
    fn test_run_never_loses() {
        for seed in 0..15 {
            let mut board = Board::new(7, 7).unwrap();
            let mut rng = StdRng::seed_from_u64(seed);
            board.fill_grid(&mut rng).unwrap();
            let mut player = AutoPlayer::new(board);
            let outcome = player.run().unwrap();
            match outcome {
                StepOutcome::Finished(status) => assert_eq!(status, Status::Won, "seed {}", seed),
                StepOutcome::NoMoveFound => {
                    assert_eq!(player.board().status(), Status::Playing, "seed {}", seed)
                }
                other => panic!("seed {}: unexpected outcome {:?}", seed, other),
            }
        }
    }

    #[test]
    fn test_step_after_finish_reports_status() {
        let board = Board::with_skulls(vec![vec![false; 3]; 3]).unwrap();
        let mut player = AutoPlayer::new(board);
        player.run().unwrap();
        assert_eq!(
            player.step().unwrap(),
            StepOutcome::Finished(Status::Won)
        );
    }

    #[test]
    fn test_stop_request_halts_run() {
        let board = Board::with_skulls(vec![vec![false; 3]; 3]).unwrap();
        let mut player = AutoPlayer::new(board);
        player.request_stop();
        assert_eq!(player.run().unwrap(), StepOutcome::Stopped);
        assert_eq!(player.board().status(), Status::Playing);
    }
}
