use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::bracket::models::Bracket;
use crate::EngineError;

/// Models for the roster and the category keys.
pub mod models;

use models::{Category, DoublesPair, Player};

/// The roster backing a tournament: registered players, doubles pairs, and
/// the registration flag.
///
/// Changing the implementation of this trait only changes where the roster
/// lives; the engine assumes nothing beyond these operations.
#[allow(async_fn_in_trait)]
pub trait ParticipantStore {
    type Error;

    async fn registration_open(&self) -> Result<bool, Self::Error>;

    async fn set_registration_open(&self, open: bool) -> Result<(), Self::Error>;

    /// All registered players, sorted by name.
    async fn players(&self) -> Result<Vec<Player>, Self::Error>;

    async fn player_by_email(&self, email: &str) -> Result<Option<Player>, Self::Error>;

    /// Inserts the player, or replaces the existing record with the same id.
    async fn upsert_player(&self, player: &Player) -> Result<(), Self::Error>;

    async fn delete_player(&self, player_id: &str) -> Result<(), Self::Error>;

    async fn pairs(&self) -> Result<Vec<DoublesPair>, Self::Error>;

    async fn create_pair(&self, pair: &DoublesPair) -> Result<(), Self::Error>;

    /// Removes every pair the player is a member of.
    async fn delete_pairs_with_player(&self, player_id: &str) -> Result<(), Self::Error>;
}

/// Persistence for bracket documents, keyed by category.
///
/// The stored document is the only truth about a running tournament; the
/// engine reads it, mutates it in place, and hands it back to be saved.
#[allow(async_fn_in_trait)]
pub trait BracketStore {
    type Error;

    async fn bracket(&self, category: Category) -> Result<Option<Bracket>, Self::Error>;

    async fn save_bracket(&self, category: Category, bracket: &Bracket)
        -> Result<(), Self::Error>;

    async fn clear_bracket(&self, category: Category) -> Result<(), Self::Error>;
}

#[derive(Debug)]
struct MemoryState {
    registration_open: bool,
    players: Vec<Player>,
    pairs: Vec<DoublesPair>,
    brackets: HashMap<Category, Bracket>,
}

impl Default for MemoryState {
    fn default() -> Self {
        MemoryState {
            // A fresh tournament cycle starts with registration open.
            registration_open: true,
            players: Vec::new(),
            pairs: Vec::new(),
            brackets: HashMap::new(),
        }
    }
}

/// An in-memory store, used by the tests and the demo binary.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

impl ParticipantStore for MemoryStore {
    type Error = EngineError;

    async fn registration_open(&self) -> Result<bool, Self::Error> {
        Ok(self.state.lock().await.registration_open)
    }

    async fn set_registration_open(&self, open: bool) -> Result<(), Self::Error> {
        self.state.lock().await.registration_open = open;
        Ok(())
    }

    async fn players(&self) -> Result<Vec<Player>, Self::Error> {
        let mut players = self.state.lock().await.players.clone();
        players.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(players)
    }

    async fn player_by_email(&self, email: &str) -> Result<Option<Player>, Self::Error> {
        let state = self.state.lock().await;
        Ok(state
            .players
            .iter()
            .find(|player| player.email == email)
            .cloned())
    }

    async fn upsert_player(&self, player: &Player) -> Result<(), Self::Error> {
        let mut state = self.state.lock().await;
        match state
            .players
            .iter_mut()
            .find(|existing| existing.id == player.id)
        {
            Some(existing) => *existing = player.clone(),
            None => state.players.push(player.clone()),
        }
        Ok(())
    }

    async fn delete_player(&self, player_id: &str) -> Result<(), Self::Error> {
        let mut state = self.state.lock().await;
        state.players.retain(|player| player.id != player_id);
        Ok(())
    }

    async fn pairs(&self) -> Result<Vec<DoublesPair>, Self::Error> {
        Ok(self.state.lock().await.pairs.clone())
    }

    async fn create_pair(&self, pair: &DoublesPair) -> Result<(), Self::Error> {
        self.state.lock().await.pairs.push(pair.clone());
        Ok(())
    }

    async fn delete_pairs_with_player(&self, player_id: &str) -> Result<(), Self::Error> {
        let mut state = self.state.lock().await;
        state.pairs.retain(|pair| !pair.contains(player_id));
        Ok(())
    }
}

impl BracketStore for MemoryStore {
    type Error = EngineError;

    async fn bracket(&self, category: Category) -> Result<Option<Bracket>, Self::Error> {
        Ok(self.state.lock().await.brackets.get(&category).cloned())
    }

    async fn save_bracket(
        &self,
        category: Category,
        bracket: &Bracket,
    ) -> Result<(), Self::Error> {
        self.state
            .lock()
            .await
            .brackets
            .insert(category, bracket.clone());
        Ok(())
    }

    async fn clear_bracket(&self, category: Category) -> Result<(), Self::Error> {
        self.state.lock().await.brackets.remove(&category);
        Ok(())
    }
}
