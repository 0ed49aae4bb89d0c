//! The lobby aggregate.
//!
//! Every method here is synchronous and runs while the registry holds the
//! lobby's lock, so each call is one serialized transition.

use chrono::{DateTime, Utc};

use super::LobbyError;
use crate::game::{Game, MoveApplied, Symbol};
use crate::protocol::{LobbyId, LobbySnapshot, User, UserId};

/// Membership, roles and the optional game for one lobby id.
#[derive(Debug, Clone)]
pub struct Lobby {
    id: LobbyId,
    users: Vec<User>,
    active_players: Vec<UserId>,
    spectators: Vec<UserId>,
    owner: Option<UserId>,
    /// X and O holders, fixed when the game starts so a departure does not
    /// shift the remaining player into the other seat.
    seats: Option<[UserId; 2]>,
    game: Option<Game>,
    /// Set under the lock right before the registry drops this lobby.
    closed: bool,
    created_at: DateTime<Utc>,
}

impl Lobby {
    pub fn new(id: impl Into<LobbyId>) -> Self {
        Self {
            id: id.into(),
            users: Vec::new(),
            active_players: Vec::new(),
            spectators: Vec::new(),
            owner: None,
            seats: None,
            game: None,
            closed: false,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn owner(&self) -> Option<UserId> {
        self.owner
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    pub fn game_in_progress(&self) -> bool {
        self.game.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.spectators.is_empty()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn contains(&self, user_id: &UserId) -> bool {
        self.users.iter().any(|user| user.id == *user_id)
    }

    /// Symbol `user_id` plays in the current game, if any.
    ///
    /// A seat only counts while its holder is still an active player, so a
    /// departed player who comes back as a spectator cannot move.
    pub fn symbol_of(&self, user_id: &UserId) -> Option<Symbol> {
        if !self.active_players.contains(user_id) {
            return None;
        }
        self.seats?
            .iter()
            .position(|seat| seat == user_id)
            .and_then(Symbol::for_seat)
    }

    fn user_mut(&mut self, user_id: &UserId) -> Option<&mut User> {
        self.users.iter_mut().find(|user| user.id == *user_id)
    }

    fn resolve(&self, ids: &[UserId]) -> Vec<User> {
        ids.iter()
            .filter_map(|id| self.users.iter().find(|user| user.id == *id))
            .cloned()
            .collect()
    }

    /// Add a user. Returns `false` if the id is already a member.
    ///
    /// The first user becomes owner; users arriving mid-game watch as spectators.
    pub fn add_user(&mut self, user_id: UserId, username: impl Into<String>) -> bool {
        if self.contains(&user_id) {
            return false;
        }

        self.users.push(User::new(user_id, username));
        if self.owner.is_none() {
            self.owner = Some(user_id);
        }
        if self.game_in_progress() {
            self.spectators.push(user_id);
        }
        true
    }

    pub fn toggle_ready(&mut self, user_id: &UserId) -> Result<bool, LobbyError> {
        let user = self
            .user_mut(user_id)
            .ok_or(LobbyError::NotAMember(*user_id))?;
        user.is_ready = !user.is_ready;
        Ok(user.is_ready)
    }

    /// Owner-only toggle of `target` in the active-player selection.
    pub fn toggle_selection(&mut self, caller: &UserId, target: &UserId) -> Result<(), LobbyError> {
        if self.owner != Some(*caller) {
            return Err(LobbyError::NotOwner);
        }
        if self.game_in_progress() {
            return Err(LobbyError::GameInProgress);
        }

        if let Some(position) = self.active_players.iter().position(|id| id == target) {
            self.active_players.remove(position);
            return Ok(());
        }
        if self.active_players.len() >= 2 {
            return Err(LobbyError::SelectionFull);
        }
        if !self.contains(target) {
            return Err(LobbyError::NotAMember(*target));
        }
        self.active_players.push(*target);
        Ok(())
    }

    /// Owner-only. With `explicit_pair` the selection is replaced atomically;
    /// without it exactly two players must already be selected.
    pub fn start_game(
        &mut self,
        caller: &UserId,
        explicit_pair: Option<[UserId; 2]>,
    ) -> Result<(), LobbyError> {
        if self.owner != Some(*caller) {
            return Err(LobbyError::NotOwner);
        }
        if self.game_in_progress() {
            return Err(LobbyError::GameInProgress);
        }

        let seats = match explicit_pair {
            Some([first, second]) => {
                if first == second {
                    return Err(LobbyError::InvalidSelection("players must be distinct"));
                }
                if let Some(missing) = [first, second].into_iter().find(|id| !self.contains(id)) {
                    return Err(LobbyError::NotAMember(missing));
                }
                [first, second]
            }
            None => match self.active_players.as_slice() {
                [first, second] => [*first, *second],
                _ => {
                    return Err(LobbyError::InvalidSelection(
                        "exactly two players must be selected",
                    ))
                }
            },
        };

        self.active_players = seats.to_vec();
        self.spectators = self
            .users
            .iter()
            .map(|user| user.id)
            .filter(|id| !seats.contains(id))
            .collect();
        self.seats = Some(seats);
        self.game = Some(Game::new());
        Ok(())
    }

    pub fn make_move(&mut self, user_id: &UserId, index: usize) -> Result<MoveApplied, LobbyError> {
        if self.game.is_none() {
            return Err(LobbyError::NoActiveGame);
        }
        let symbol = self
            .symbol_of(user_id)
            .ok_or(LobbyError::NotAPlayer(*user_id))?;
        let game = self.game.as_mut().ok_or(LobbyError::NoActiveGame)?;
        Ok(game.apply_move(symbol, index)?)
    }

    /// Discard the game and fold everyone back into the waiting list:
    /// former players first, then former spectators, then everyone else.
    pub fn rematch(&mut self) {
        let merged: Vec<UserId> = self
            .active_players
            .iter()
            .chain(&self.spectators)
            .copied()
            .chain(self.users.iter().map(|user| user.id))
            .collect();

        let mut reordered: Vec<User> = Vec::with_capacity(self.users.len());
        for id in merged {
            if reordered.iter().any(|user| user.id == id) {
                continue;
            }
            if let Some(user) = self.users.iter().find(|user| user.id == id) {
                reordered.push(user.clone());
            }
        }
        for user in &mut reordered {
            user.is_ready = false;
        }

        self.users = reordered;
        self.active_players.clear();
        self.spectators.clear();
        self.seats = None;
        self.game = None;
    }

    /// Remove `user_id` from every collection. Returns `false` if they were
    /// not present at all.
    ///
    /// A departing owner hands ownership to the new first user. A departing
    /// player keeps their seat so the remaining player's symbol is stable.
    pub fn remove_user(&mut self, user_id: &UserId) -> bool {
        let before = (
            self.users.len(),
            self.active_players.len(),
            self.spectators.len(),
        );
        self.users.retain(|user| user.id != *user_id);
        self.active_players.retain(|id| id != user_id);
        self.spectators.retain(|id| id != user_id);
        let after = (
            self.users.len(),
            self.active_players.len(),
            self.spectators.len(),
        );

        if self.owner == Some(*user_id) {
            self.owner = self.users.first().map(|user| user.id);
        }

        before != after
    }

    pub fn snapshot(&self) -> LobbySnapshot {
        LobbySnapshot {
            users: self.users.clone(),
            active_players: self.resolve(&self.active_players),
            spectators: self.resolve(&self.spectators),
            owner: self.owner,
            game_in_progress: self.game_in_progress(),
            game_state: self.game.clone(),
        }
    }
}
