use chess_session::commands::{Command, HELP};
use chess_session::error::TableError;
use chess_session::game::MoveOutcome;
use chess_session::models::format_clock;
use chess_session::websocket::AwcConnector;
use chess_session::{ClientConfig, GameTable};
use clap::Parser;
use futures::channel::mpsc;
use futures::StreamExt;
use log::{error, info, warn};
use std::io::BufRead;

/// Play chess against a peer through a relay server
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// WebSocket url of the relay
    #[arg(long, default_value = "ws://127.0.0.1:3000")]
    server: String,

    /// Minutes on each clock
    #[arg(long, default_value_t = 10)]
    minutes: u32,
}

#[actix_rt::main]
async fn main() {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let args = Args::parse();

    let config = ClientConfig {
        server_url: args.server,
        default_minutes: args.minutes,
        ..ClientConfig::default()
    };
    let table = GameTable::new(config, AwcConnector);

    let _snapshots = table.snapshots().subscribe(|snapshot| {
        info!(
            "{} to move, {} after {} moves ({})",
            snapshot.turn, snapshot.status, snapshot.move_count, snapshot.position
        );
        if let Some(pending) = snapshot.pending_promotion {
            info!(
                "Promotion pending on {}{}, choose with `promote <q|r|b|n>`",
                pending.from, pending.to
            );
        }
    });
    let _connection = table.connection_states().subscribe(|state| match state.game_id() {
        Some(game_id) => info!("Connection {} (game {})", state.status, game_id),
        None => info!("Connection {}", state.status),
    });
    let _flag = table.clock_states().subscribe(|clock| {
        if let Some(color) = clock.flagged() {
            warn!("{} is out of time", color);
        }
    });

    // Blocking stdin reads live on their own thread
    let (tx, mut lines) = mpsc::unbounded::<String>();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.unbounded_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });

    info!("Type `help` for the list of commands");
    while let Some(line) = lines.next().await {
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                warn!("{}", e);
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }
        if let Err(e) = run(&table, command).await {
            warn!("{}", e);
        }
    }

    table.shutdown();
}

async fn run(table: &GameTable, command: Command) -> Result<(), TableError> {
    match command {
        Command::Create => table.create_game().await?,
        Command::Join(game_id) => table.join_game(&game_id).await?,
        Command::Move { from, to } => match table.apply_move(&from, &to).await? {
            MoveOutcome::Committed(mv) => info!("Played {}", mv),
            MoveOutcome::PromotionPending(_) => {}
        },
        Command::Promote(piece) => {
            let mv = table.resolve_promotion(piece).await?;
            info!("Played {}", mv);
        }
        Command::Undo => {
            let mv = table.undo().await?;
            info!("Took back {}", mv);
        }
        Command::Redo => {
            let mv = table.redo().await?;
            info!("Replayed {}", mv);
        }
        Command::New => table.new_game().await?,
        Command::Flip => table.flip_board().await?,
        Command::Time(minutes) => table.set_time(minutes).await?,
        Command::Start => table.start_clock().await?,
        Command::Pause => table.pause_clock().await?,
        Command::Reset => table.reset_clock().await?,
        Command::Show => {
            let snapshot = table.snapshot().await?;
            let clock = table.clock_state().await?;
            info!(
                "{} ({}), white {} black {}{}",
                snapshot.position,
                snapshot.status,
                format_clock(clock.white),
                format_clock(clock.black),
                if clock.is_running { "" } else { " (stopped)" }
            );
        }
        Command::Help => println!("{}", HELP),
        Command::Quit => {}
    }
    Ok(())
}
