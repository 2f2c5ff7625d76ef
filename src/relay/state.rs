use actix::Addr;
use log::info;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use super::socket::RelaySocket;
use crate::error::RelayError;
use crate::models::PlayerColor;

/// Who sits where in one relayed game. Seats hold connection ids.
#[derive(Debug, Default, Clone)]
struct Table {
    white: Option<String>,
    black: Option<String>,
}

impl Table {
    fn seat(&mut self, color: PlayerColor) -> &mut Option<String> {
        match color {
            PlayerColor::White => &mut self.white,
            PlayerColor::Black => &mut self.black,
        }
    }

    fn color_of(&self, player: &str) -> Option<PlayerColor> {
        if self.white.as_deref() == Some(player) {
            Some(PlayerColor::White)
        } else if self.black.as_deref() == Some(player) {
            Some(PlayerColor::Black)
        } else {
            None
        }
    }

    fn occupant(&self, color: PlayerColor) -> Option<&String> {
        match color {
            PlayerColor::White => self.white.as_ref(),
            PlayerColor::Black => self.black.as_ref(),
        }
    }

    fn is_empty(&self) -> bool {
        self.white.is_none() && self.black.is_none()
    }
}

/// A player who just took a seat, and the opponent already waiting, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Joined {
    pub color: PlayerColor,
    pub opponent: Option<String>,
}

/// A player who just left, and whoever is left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Left {
    pub color: PlayerColor,
    pub opponent: Option<String>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State shared between relay connections
#[derive(Default)]
pub struct RelayState {
    games: Mutex<HashMap<String, Table>>,
    sessions: Mutex<HashMap<String, Addr<RelaySocket>>>,
}

impl RelayState {
    pub fn register(&self, id: &str, addr: Addr<RelaySocket>) -> usize {
        let mut sessions = lock(&self.sessions);
        sessions.insert(id.to_string(), addr);
        sessions.len()
    }

    pub fn unregister(&self, id: &str) -> usize {
        let mut sessions = lock(&self.sessions);
        sessions.remove(id);
        sessions.len()
    }

    pub fn address(&self, id: &str) -> Option<Addr<RelaySocket>> {
        lock(&self.sessions).get(id).cloned()
    }

    /// Open a new game with `player` as white.
    pub fn create_game(&self, player: &str) -> String {
        let game_id = Uuid::new_v4().to_string();
        let table = Table {
            white: Some(player.to_string()),
            black: None,
        };
        lock(&self.games).insert(game_id.clone(), table);
        info!("Player {} created game {}", player, game_id);
        game_id
    }

    /// Seat `player` in the first free chair, white before black.
    pub fn join_game(&self, game_id: &str, player: &str) -> Result<Joined, RelayError> {
        let mut games = lock(&self.games);
        let table = games.get_mut(game_id).ok_or(RelayError::GameNotFound)?;
        if table.color_of(player).is_some() {
            return Err(RelayError::GameFull);
        }

        let color = if table.white.is_none() {
            PlayerColor::White
        } else if table.black.is_none() {
            PlayerColor::Black
        } else {
            return Err(RelayError::GameFull);
        };
        *table.seat(color) = Some(player.to_string());
        info!("Player {} joined game {} as {}", player, game_id, color);

        Ok(Joined {
            color,
            opponent: table.occupant(color.opposite()).cloned(),
        })
    }

    /// The connection a move from `player` should be forwarded to.
    pub fn opponent_of(&self, game_id: &str, player: &str) -> Result<Option<String>, RelayError> {
        let games = lock(&self.games);
        let table = games.get(game_id).ok_or(RelayError::GameNotFound)?;
        let color = table
            .color_of(player)
            .ok_or_else(|| RelayError::NotSeated(game_id.to_string()))?;
        Ok(table.occupant(color.opposite()).cloned())
    }

    /// Free `player`'s seat. The game is dropped once nobody is left.
    pub fn leave_game(&self, game_id: &str, player: &str) -> Option<Left> {
        let mut games = lock(&self.games);
        let table = games.get_mut(game_id)?;
        let color = table.color_of(player)?;
        *table.seat(color) = None;
        let opponent = table.occupant(color.opposite()).cloned();

        if table.is_empty() {
            games.remove(game_id);
            info!("No more players in game {}. Cleaning up.", game_id);
        }
        Some(Left { color, opponent })
    }

    pub fn game_count(&self) -> usize {
        lock(&self.games).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creator_is_white_and_joiner_black() {
        let state = RelayState::default();
        let game_id = state.create_game("a");

        let joined = state.join_game(&game_id, "b").unwrap();
        assert_eq!(
            joined,
            Joined {
                color: PlayerColor::Black,
                opponent: Some("a".to_string()),
            }
        );
        assert_eq!(state.opponent_of(&game_id, "a"), Ok(Some("b".to_string())));
        assert_eq!(state.opponent_of(&game_id, "b"), Ok(Some("a".to_string())));
    }

    #[test]
    fn refuses_unknown_and_full_games() {
        let state = RelayState::default();
        assert_eq!(state.join_game("nope", "b"), Err(RelayError::GameNotFound));

        let game_id = state.create_game("a");
        assert_eq!(state.join_game(&game_id, "a"), Err(RelayError::GameFull));
        state.join_game(&game_id, "b").unwrap();
        assert_eq!(state.join_game(&game_id, "c"), Err(RelayError::GameFull));
    }

    #[test]
    fn moves_need_a_seat() {
        let state = RelayState::default();
        let game_id = state.create_game("a");
        assert_eq!(state.opponent_of(&game_id, "a"), Ok(None));
        assert_eq!(
            state.opponent_of(&game_id, "x"),
            Err(RelayError::NotSeated(game_id.clone()))
        );
    }

    #[test]
    fn leaving_frees_the_seat_and_drops_empty_games() {
        let state = RelayState::default();
        let game_id = state.create_game("a");
        state.join_game(&game_id, "b").unwrap();

        let left = state.leave_game(&game_id, "a").unwrap();
        assert_eq!(left.color, PlayerColor::White);
        assert_eq!(left.opponent, Some("b".to_string()));

        // The vacated white seat can be taken again
        let joined = state.join_game(&game_id, "c").unwrap();
        assert_eq!(joined.color, PlayerColor::White);

        state.leave_game(&game_id, "b");
        state.leave_game(&game_id, "c");
        assert_eq!(state.game_count(), 0);
        assert_eq!(state.leave_game(&game_id, "c"), None);
    }
}
