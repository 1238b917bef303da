use battleship_server::{init_logging, run, GameTimeouts, MatchRoom};
use clap::Parser;
use tokio::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:8080")]
    bind: String,

    /// Seconds a player may hold the turn before forfeiting.
    #[arg(long, default_value_t = 60)]
    turn_timeout: u64,

    /// Seconds both players have to place their ships.
    #[arg(long, default_value_t = 120)]
    placement_timeout: u64,

    #[arg(long, help = "Fix RNG seed for reproducible turn assignment (e.g., --seed 12345)")]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let timeouts = GameTimeouts {
        turn: Duration::from_secs(cli.turn_timeout),
        placement: Duration::from_secs(cli.placement_timeout),
    };
    let room = MatchRoom::new(timeouts, cli.seed);
    run(&cli.bind, room).await
}
