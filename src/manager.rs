use chrono::Utc;
use rand::seq::SliceRandom;
use tracing::info;
use uuid::Uuid;

use crate::bracket::{
    self,
    models::{Bracket, Entrant, ManualNames, RoundTag, WinnerSelection},
};
use crate::store::{
    models::{Category, DoublesPair, Player},
    BracketStore, ParticipantStore,
};
use crate::utils::error::TournamentError;
use crate::EngineError;

/// Drives one tournament cycle against the backing stores.
///
/// This is the administrator's workflow: keep the roster, pair doubles
/// players, generate fixtures (which closes registration), record results,
/// reset. Every operation is a read-modify-write against the stores; the
/// manager holds no bracket state of its own, so the persisted document is
/// always the source of truth.
#[derive(Debug)]
pub struct TournamentManager<S> {
    store: S,
}

impl<S> TournamentManager<S>
where
    S: ParticipantStore<Error = EngineError> + BracketStore<Error = EngineError>,
{
    pub fn new(store: S) -> Self {
        TournamentManager { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Registers a player, or merges category membership into the existing
    /// registration with the same email.
    pub async fn register_player(
        &self,
        name: &str,
        email: &str,
        in_singles: bool,
        in_doubles: bool,
    ) -> Result<Player, EngineError> {
        if !self.store.registration_open().await? {
            return Err(TournamentError::RegistrationClosed.into());
        }

        let now = Utc::now().timestamp();
        let player = match self.store.player_by_email(email).await? {
            Some(mut existing) => {
                existing.in_singles = existing.in_singles || in_singles;
                existing.in_doubles = existing.in_doubles || in_doubles;
                existing.updated_at = now;
                existing
            }
            None => Player {
                id: Uuid::new_v4().to_string(),
                name: name.to_string(),
                email: email.to_string(),
                in_singles,
                in_doubles,
                created_at: now,
                updated_at: now,
            },
        };

        self.store.upsert_player(&player).await?;
        info!("Registered {} for {}", player.name, player.categories());
        Ok(player)
    }

    /// Removes a player and any doubles pair they belong to.
    pub async fn remove_player(&self, player_id: &str) -> Result<(), EngineError> {
        let players = self.store.players().await?;
        if !players.iter().any(|player| player.id == player_id) {
            return Err(TournamentError::PlayerNotFound(player_id.to_string()).into());
        }

        self.store.delete_player(player_id).await?;
        self.store.delete_pairs_with_player(player_id).await?;
        info!("Removed player {}", player_id);
        Ok(())
    }

    pub async fn set_registration_open(&self, open: bool) -> Result<(), EngineError> {
        self.store.set_registration_open(open).await
    }

    /// Pairs two doubles players by hand. Both must exist and neither may
    /// already be in a pair; pairing also marks both as doubles players.
    pub async fn pair_players(
        &self,
        player1_id: &str,
        player2_id: &str,
    ) -> Result<DoublesPair, EngineError> {
        if player1_id == player2_id {
            return Err(TournamentError::SelfPairing.into());
        }

        let players = self.store.players().await?;
        for id in [player1_id, player2_id] {
            if !players.iter().any(|player| player.id == id) {
                return Err(TournamentError::PlayerNotFound(id.to_string()).into());
            }
        }

        let pairs = self.store.pairs().await?;
        for id in [player1_id, player2_id] {
            if pairs.iter().any(|pair| pair.contains(id)) {
                return Err(TournamentError::AlreadyPaired(id.to_string()).into());
            }
        }

        let now = Utc::now().timestamp();
        let pair = DoublesPair {
            id: Uuid::new_v4().to_string(),
            player1_id: player1_id.to_string(),
            player2_id: player2_id.to_string(),
            is_auto_generated: false,
            created_at: now,
        };
        self.store.create_pair(&pair).await?;

        for id in [player1_id, player2_id] {
            if let Some(mut player) = players.iter().find(|player| player.id == id).cloned() {
                if !player.in_doubles {
                    player.in_doubles = true;
                    player.updated_at = now;
                    self.store.upsert_player(&player).await?;
                }
            }
        }

        info!("Paired players {} and {}", player1_id, player2_id);
        Ok(pair)
    }

    /// Doubles players not yet in any pair.
    pub async fn unpaired_doubles_players(&self) -> Result<Vec<Player>, EngineError> {
        let players = self.store.players().await?;
        let pairs = self.store.pairs().await?;
        Ok(players
            .into_iter()
            .filter(|player| {
                player.in_doubles && !pairs.iter().any(|pair| pair.contains(&player.id))
            })
            .collect())
    }

    /// Generates and persists the knockout draw for every category with
    /// entrants, closing registration first.
    pub async fn generate_fixtures(&self) -> Result<(), EngineError> {
        let players = self.store.players().await?;
        if players.is_empty() {
            return Err(TournamentError::NoPlayersRegistered.into());
        }

        self.store.set_registration_open(false).await?;

        let singles: Vec<Entrant> = players
            .iter()
            .filter(|player| player.in_singles)
            .map(Entrant::from)
            .collect();
        if !singles.is_empty() {
            let bracket = bracket::build_bracket(singles);
            self.store.save_bracket(Category::Singles, &bracket).await?;
            info!("Generated the singles draw");
        }

        let doubles = self.doubles_entrants(&players).await?;
        if !doubles.is_empty() {
            let bracket = bracket::build_bracket(doubles);
            self.store.save_bracket(Category::Doubles, &bracket).await?;
            info!("Generated the doubles draw");
        }

        Ok(())
    }

    /// The doubles field: manual pairs plus auto-generated pairs formed by
    /// shuffling the remaining unpaired doubles players. Auto pairs are
    /// embedded in the bracket document but never persisted to the roster.
    async fn doubles_entrants(&self, players: &[Player]) -> Result<Vec<Entrant>, EngineError> {
        let pairs = self.store.pairs().await?;
        let mut entrants: Vec<Entrant> =
            pairs.iter().map(|pair| pair.to_entrant(players)).collect();

        let mut unpaired: Vec<&Player> = players
            .iter()
            .filter(|player| {
                player.in_doubles && !pairs.iter().any(|pair| pair.contains(&player.id))
            })
            .collect();
        unpaired.shuffle(&mut rand::thread_rng());

        let now = Utc::now().timestamp();
        for chunk in unpaired.chunks(2) {
            match chunk {
                [player1, player2] => {
                    let pair = DoublesPair {
                        id: Uuid::new_v4().to_string(),
                        player1_id: player1.id.clone(),
                        player2_id: player2.id.clone(),
                        is_auto_generated: true,
                        created_at: now,
                    };
                    entrants.push(pair.to_entrant(players));
                }
                [odd_one_out] => {
                    info!(
                        "{} has no doubles partner and sits this draw out",
                        odd_one_out.name
                    );
                }
                _ => {}
            }
        }

        Ok(entrants)
    }

    /// Applies one administrator edit to the persisted bracket and saves the
    /// updated document.
    pub async fn record_result(
        &self,
        category: Category,
        round: RoundTag,
        index: usize,
        names: &ManualNames,
        selection: Option<WinnerSelection>,
    ) -> Result<Bracket, EngineError> {
        let mut bracket = self
            .store
            .bracket(category)
            .await?
            .ok_or_else(|| TournamentError::FixtureNotFound(category.to_string()))?;

        bracket::record_result(&mut bracket, round, index, names, selection)?;

        self.store.save_bracket(category, &bracket).await?;
        info!("Saved a result for {} {} match {}", category, round, index);
        Ok(bracket)
    }

    /// Clears every category's bracket; a fresh draw can later be generated
    /// from a new roster snapshot.
    pub async fn reset_fixtures(&self) -> Result<(), EngineError> {
        for category in Category::all() {
            self.store.clear_bracket(category).await?;
        }
        info!("Cleared all fixtures");
        Ok(())
    }

    pub async fn bracket(&self, category: Category) -> Result<Option<Bracket>, EngineError> {
        self.store.bracket(category).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn manager() -> TournamentManager<MemoryStore> {
        TournamentManager::new(MemoryStore::new())
    }

    async fn register(
        manager: &TournamentManager<MemoryStore>,
        name: &str,
        in_singles: bool,
        in_doubles: bool,
    ) -> Player {
        manager
            .register_player(
                name,
                &format!("{}@club.test", name.to_lowercase()),
                in_singles,
                in_doubles,
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn registering_twice_merges_categories() {
        let manager = manager();
        let first = register(&manager, "Asha", true, false).await;
        let second = register(&manager, "Asha", false, true).await;

        assert_eq!(first.id, second.id);
        assert!(second.in_singles);
        assert!(second.in_doubles);
        assert_eq!(manager.store().players().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn closed_registration_rejects_signups() {
        let manager = manager();
        manager.set_registration_open(false).await.unwrap();

        let error = manager
            .register_player("Asha", "asha@club.test", true, false)
            .await
            .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<TournamentError>(),
            Some(TournamentError::RegistrationClosed)
        ));
    }

    #[tokio::test]
    async fn removing_a_player_drops_their_pair() {
        let manager = manager();
        let asha = register(&manager, "Asha", false, true).await;
        let ben = register(&manager, "Ben", false, true).await;
        manager.pair_players(&asha.id, &ben.id).await.unwrap();

        manager.remove_player(&asha.id).await.unwrap();

        assert_eq!(manager.store().players().await.unwrap().len(), 1);
        assert!(manager.store().pairs().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn pairing_constraints_are_enforced() {
        let manager = manager();
        let asha = register(&manager, "Asha", false, true).await;
        let ben = register(&manager, "Ben", false, true).await;
        let cole = register(&manager, "Cole", false, true).await;

        let self_pair = manager.pair_players(&asha.id, &asha.id).await.unwrap_err();
        assert!(matches!(
            self_pair.downcast_ref::<TournamentError>(),
            Some(TournamentError::SelfPairing)
        ));

        let unknown = manager.pair_players(&asha.id, "missing").await.unwrap_err();
        assert!(matches!(
            unknown.downcast_ref::<TournamentError>(),
            Some(TournamentError::PlayerNotFound(_))
        ));

        manager.pair_players(&asha.id, &ben.id).await.unwrap();
        let double_booked = manager.pair_players(&asha.id, &cole.id).await.unwrap_err();
        assert!(matches!(
            double_booked.downcast_ref::<TournamentError>(),
            Some(TournamentError::AlreadyPaired(_))
        ));
    }

    #[tokio::test]
    async fn generating_fixtures_builds_both_draws_and_closes_registration() {
        let manager = manager();
        for name in ["Asha", "Ben", "Cole", "Dee", "Eli"] {
            register(&manager, name, true, true).await;
        }
        let players = manager.store().players().await.unwrap();
        manager
            .pair_players(&players[0].id, &players[1].id)
            .await
            .unwrap();

        manager.generate_fixtures().await.unwrap();

        assert!(!manager.store().registration_open().await.unwrap());

        let singles = manager.bracket(Category::Singles).await.unwrap().unwrap();
        let first = singles.round(RoundTag::First).unwrap();
        assert_eq!(first.matches.len(), 4);
        assert_eq!(first.matches.iter().filter(|cell| cell.is_bye).count(), 3);

        // Five doubles players: one manual pair, one auto pair, one sits out.
        let doubles = manager.bracket(Category::Doubles).await.unwrap().unwrap();
        let first = doubles.round(RoundTag::First).unwrap();
        assert_eq!(first.matches.len(), 1);
        assert!(first
            .matches
            .iter()
            .flat_map(|cell| [&cell.player1, &cell.player2])
            .all(|slot| matches!(slot, Some(Entrant::Pair(_)))));
    }

    #[tokio::test]
    async fn recording_a_result_persists_and_propagates() {
        let manager = manager();
        for name in ["Asha", "Ben", "Cole", "Dee"] {
            register(&manager, name, true, false).await;
        }
        manager.generate_fixtures().await.unwrap();

        let saved = manager
            .record_result(
                Category::Singles,
                RoundTag::First,
                0,
                &ManualNames::default(),
                Some(WinnerSelection::Player1),
            )
            .await
            .unwrap();

        let reloaded = manager.bracket(Category::Singles).await.unwrap().unwrap();
        assert_eq!(saved, reloaded);

        let winner = reloaded.round(RoundTag::First).unwrap().matches[0]
            .player1
            .clone();
        assert!(winner.is_some());
        assert_eq!(
            reloaded.round(RoundTag::Final).unwrap().matches[0].player1,
            winner
        );
    }

    #[tokio::test]
    async fn recording_against_missing_fixtures_fails() {
        let manager = manager();
        let error = manager
            .record_result(
                Category::Singles,
                RoundTag::First,
                0,
                &ManualNames::default(),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<TournamentError>(),
            Some(TournamentError::FixtureNotFound(_))
        ));
    }

    #[tokio::test]
    async fn resetting_clears_every_category() {
        let manager = manager();
        register(&manager, "Asha", true, false).await;
        register(&manager, "Ben", true, false).await;
        manager.generate_fixtures().await.unwrap();
        assert!(manager.bracket(Category::Singles).await.unwrap().is_some());

        manager.reset_fixtures().await.unwrap();
        assert!(manager.bracket(Category::Singles).await.unwrap().is_none());
        assert!(manager.bracket(Category::Doubles).await.unwrap().is_none());
    }
}
