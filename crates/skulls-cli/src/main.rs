//! Terminal driver for the skulls engine.
//!
//! Plays interactively from stdin ("row col" per move), or hands the game
//! to the deductive solver with `--auto` or the `auto` command. All game
//! rules live in `skulls-core`; this binary only translates input and
//! renders the grid.

use std::io::{self, BufRead, Write};

use anyhow::Context;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use skulls_core::{AutoPlayer, Board, Position, Status, StepOutcome};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "skulls", about = "Reach the top row without waking a skull")]
struct Cli {
    /// Board height
    #[arg(long, default_value_t = 7)]
    rows: usize,

    /// Board width
    #[arg(long, default_value_t = 7)]
    cols: usize,

    /// Seed for a reproducible board
    #[arg(long)]
    seed: Option<u64>,

    /// Let the solver play the whole game
    #[arg(long)]
    auto: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut board = Board::new(cli.rows, cli.cols).context("invalid board size")?;
    board
        .fill_grid(&mut rng)
        .context("board generation failed")?;

    if cli.auto {
        let start = Position::new(board.bottom_row(), board.cols() / 2);
        run_auto(board, start)
    } else {
        run_interactive(board)
    }
}

fn run_interactive(mut board: Board) -> anyhow::Result<()> {
    let mut stdin = io::stdin().lock();
    let mut current = Position::new(board.bottom_row(), board.cols() / 2);

    println!("Rows and columns start at 0. Commands: <row> <col>, auto, exit.");
    print_board(&board);

    loop {
        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            return Ok(());
        }

        match line.trim() {
            "" => continue,
            "exit" | "quit" => return Ok(()),
            "auto" => return run_auto(board, current),
            input => {
                let Some((row, col)) = parse_move(input, &board) else {
                    println!("Enter a row and column, e.g. \"6 3\".");
                    continue;
                };
                board.explore_cell(row, col);
                current = Position::new(row, col);
                print_board(&board);
                if board.status().is_over() {
                    return finish(&mut board);
                }
            }
        }
    }
}

fn run_auto(board: Board, start: Position) -> anyhow::Result<()> {
    let mut player = AutoPlayer::with_start(board, start);
    loop {
        match player.step()? {
            StepOutcome::Moved(pos) => {
                println!("auto: exploring {}", pos);
                print_board(player.board());
            }
            StepOutcome::Finished(_) => {
                return finish(player.board_mut());
            }
            StepOutcome::NoMoveFound => {
                println!("No provably safe move left; take over manually or restart.");
                return Ok(());
            }
            StepOutcome::Stopped => return Ok(()),
        }
    }
}

fn parse_move(input: &str, board: &Board) -> Option<(usize, usize)> {
    let mut parts = input.split_whitespace();
    let row: usize = parts.next()?.parse().ok()?;
    let col: usize = parts.next()?.parse().ok()?;
    if parts.next().is_some() || !board.valid_row(row) || !board.valid_col(col) {
        return None;
    }
    Some((row, col))
}

fn finish(board: &mut Board) -> anyhow::Result<()> {
    match board.status() {
        Status::Won => println!("You win!"),
        Status::Lost => println!("You lose!"),
        Status::Playing => unreachable!("finish called mid-game"),
    }
    board.reveal_all();
    print_board(board);
    Ok(())
}

fn print_board(board: &Board) {
    print!("   ");
    for col in 0..board.cols() {
        print!("{} ", col % 10);
    }
    println!();
    for (row, line) in board.to_string().lines().enumerate() {
        println!("{:>2} {}", row, line);
    }
}
