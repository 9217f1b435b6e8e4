use std::io::{self, Write};
use std::sync::Arc;

use clap::Parser;
use minefield::engine::{MarkOutcome, RevealResult, DEFAULT_MINE_COUNT};
use minefield::tui::{self, GameSettings};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "minefield", about = "Rust CLI/TUI Minesweeper", version)]
struct Args {
    /// Launch TUI mode
    #[arg(long)]
    tui: bool,
    /// Number of rows
    #[arg(long, default_value_t = 16)]
    rows: usize,
    /// Number of columns
    #[arg(long, default_value_t = 16)]
    columns: usize,
    /// Number of mines
    #[arg(long, default_value_t = DEFAULT_MINE_COUNT)]
    mines: usize,
    /// Seed (0 = random)
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

// Text mode logs to stderr next to the board, so only warnings by default.
fn default_log_level(tui: bool) -> &'static str {
    if tui { "info" } else { "warn" }
}

fn init_tracing(tui: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_log_level(tui)));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    // Logs to a file in TUI mode so they don't draw over the alternate screen.
    let res = if tui {
        match std::fs::File::create("minesweeper.log") {
            Ok(file) => builder.with_writer(Arc::new(file)).with_ansi(false).try_init(),
            Err(e) => { eprintln!("Could not open log file: {}", e); return; }
        }
    } else {
        builder.with_writer(io::stderr).try_init()
    };
    if let Err(e) = res { eprintln!("Logging disabled: {}", e); }
}

fn print_help() {
    println!("Commands:");
    println!("  r x y   - reveal cell at column x, row y (1-based)");
    println!("  f x y   - toggle flag at x, y (1-based)");
    println!("  m x y   - toggle question mark at x, y (1-based)");
    println!("  q       - quit");
    println!("  h/help  - show this help");
}

fn parse_coords(parts: &[&str]) -> Result<(usize, usize), String> {
    if parts.len() < 3 { return Err(format!("Usage: {} x y", parts[0])); }
    let x = parts[1].parse::<usize>().map_err(|_| "Invalid x".to_string())?;
    let y = parts[2].parse::<usize>().map_err(|_| "Invalid y".to_string())?;
    if x == 0 || y == 0 { return Err("Use 1-based coordinates".into()); }
    Ok((x - 1, y - 1))
}

fn main() {
    let args = Args::parse();
    init_tracing(args.tui);
    debug!(?args, "parsed arguments");

    let settings = GameSettings { rows: args.rows, columns: args.columns, mines: args.mines, seed: args.seed };
    if args.tui {
        if let Err(e) = tui::run_tui(settings) {
            eprintln!("TUI error: {}", e);
        }
        return;
    }
    let mut board = match settings.new_board() {
        Ok(b) => b,
        Err(e) => { eprintln!("{}", e); return; }
    };
    info!(rows = board.rows(), columns = board.columns(), mines = board.total_mine_count(), "new game");

    println!("Minesweeper {}x{} with {} mines{}", args.columns, args.rows, args.mines, if args.seed != 0 { format!(" (seed {})", args.seed) } else { String::new() });
    println!("Coordinates are 1-based. Type 'h' for help.");
    print_help();

    let mut input = String::new();
    loop {
        println!("\n{}", board);
        println!("Mines left: {}", board.remaining_mine_count());
        if board.has_lost() {
            println!("Boom! You hit a mine. Game over.\n");
            println!("Final board (mines shown):\n{}", board.render(true, true));
            break;
        }
        if board.has_won() {
            println!("Congratulations! You cleared the board!\n");
            println!("Final board (mines shown):\n{}", board.render(true, true));
            break;
        }

        print!("> ");
        let _ = io::stdout().flush();
        input.clear();
        if io::stdin().read_line(&mut input).is_err() { break; }
        let line = input.trim();
        if line.is_empty() { continue; }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let command = parts[0].to_lowercase();
        let (x, y) = match command.as_str() {
            "q" | "quit" | "exit" => break,
            "h" | "help" => { print_help(); continue; }
            "r" | "reveal" | "f" | "flag" | "m" | "mark" => match parse_coords(&parts) {
                Ok(c) => c,
                Err(msg) => { println!("{}", msg); continue; }
            },
            other => {
                println!("Unknown command '{}'. Type 'h' for help.", other);
                continue;
            }
        };

        match command.as_str() {
            "r" | "reveal" => match board.reveal(x, y) {
                Ok(RevealResult::NoOp) => println!("Already revealed"),
                Ok(res) => debug!(x, y, ?res, "reveal"),
                Err(e) => { warn!(error = %e, "reveal rejected"); println!("{}", e); }
            },
            "f" | "flag" => match board.toggle_mark(x, y) {
                Ok(MarkOutcome::NoChange) => println!("Cannot flag a revealed cell"),
                Ok(MarkOutcome::Changed) => {}
                Err(e) => println!("{}", e),
            },
            _ => match board.question_mark(x, y) {
                Ok(MarkOutcome::NoChange) => println!("Cannot mark a revealed cell"),
                Ok(MarkOutcome::Changed) => {}
                Err(e) => println!("{}", e),
            },
        }
    }
}
