use std::str::FromStr;

use crate::error::CommandError;
use crate::models::PromotionPiece;

/// One line typed into the terminal client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Create,
    Join(String),
    Move { from: String, to: String },
    Promote(PromotionPiece),
    Undo,
    Redo,
    New,
    Flip,
    Time(u32),
    Start,
    Pause,
    Reset,
    Show,
    Help,
    Quit,
}

pub const HELP: &str = "\
create              open a game on the relay
join <id>           join a game
move <from> <to>    play a move, e.g. `move e2 e4` or `move e2e4`
promote <q|r|b|n>   finish a pending promotion
undo | redo         step through the history
new                 start over
flip                flip the board
time <minutes>      set the time control (before the first move)
start | pause       control the clock
reset               reset the clock
show                print the board state and clock
quit                leave";

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or(CommandError::Empty)?.to_ascii_lowercase();

        let command = match name.as_str() {
            "create" => Command::Create,
            "join" => Command::Join(required(words.next(), "join", "a game id")?.to_string()),
            "move" | "m" => {
                let first = required(words.next(), "move", "a from and a to square")?;
                match words.next() {
                    Some(to) => Command::Move {
                        from: first.to_string(),
                        to: to.to_string(),
                    },
                    None if first.len() == 4 && first.is_ascii() => Command::Move {
                        from: first[..2].to_string(),
                        to: first[2..].to_string(),
                    },
                    None => {
                        return Err(CommandError::MissingArgument {
                            command: "move",
                            argument: "a to square",
                        })
                    }
                }
            }
            "promote" => {
                let piece = required(words.next(), "promote", "a piece (q, r, b or n)")?;
                Command::Promote(
                    piece
                        .parse()
                        .map_err(|_| CommandError::InvalidArgument(piece.to_string()))?,
                )
            }
            "undo" => Command::Undo,
            "redo" => Command::Redo,
            "new" => Command::New,
            "flip" => Command::Flip,
            "time" => {
                let minutes = required(words.next(), "time", "a number of minutes")?;
                Command::Time(
                    minutes
                        .parse()
                        .map_err(|_| CommandError::InvalidArgument(minutes.to_string()))?,
                )
            }
            "start" | "resume" => Command::Start,
            "pause" => Command::Pause,
            "reset" => Command::Reset,
            "show" => Command::Show,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ => return Err(CommandError::Unknown(name)),
        };
        Ok(command)
    }
}

fn required<'a>(
    word: Option<&'a str>,
    command: &'static str,
    argument: &'static str,
) -> Result<&'a str, CommandError> {
    word.ok_or(CommandError::MissingArgument { command, argument })
}
