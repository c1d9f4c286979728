//! # `skulls-core`
//!
//! Engine for a grid-based skull-avoidance puzzle: climb from the bottom
//! row to the top row without exploring a hidden skull. The crate has two
//! halves:
//!
//! - [`Board`]: authoritative skull placement (rejection-sampled under
//!   generation constraints), cell exploration with flood-fill reveal, and
//!   win/lose transitions.
//! - [`Solver`]: constraint propagation over revealed clues that marks
//!   cells provably safe or provably skulls and ranks the safe ones as
//!   move candidates. It reads the board but never mutates it.
//!
//! [`AutoPlayer`] wires the two together for automatic play. Drivers that
//! render the game or schedule solver steps live outside this crate; see
//! the `skulls-cli` crate for a terminal front-end.

pub mod autoplay;
pub mod board;
pub mod error;
pub mod position;
pub mod solver;

pub use autoplay::{AutoPlayer, StepOutcome};
pub use board::{Board, Cell, Status};
pub use error::GameError;
pub use position::Position;
pub use solver::{Destination, Solver};
