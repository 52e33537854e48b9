/// The nameable failure kinds of the tournament engine.
///
/// These travel through the crate-wide [`crate::EngineError`] alias; callers
/// that care about a specific kind downcast to this enum.
#[derive(Debug)]
pub enum TournamentError {
    RoundNotFound(String),
    MatchNotFound(String),
    InvalidWinnerSelection(String),
    FixtureNotFound(String),
    RegistrationClosed,
    PlayerNotFound(String),
    AlreadyPaired(String),
    SelfPairing,
    NoPlayersRegistered,
}

impl std::fmt::Display for TournamentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use TournamentError::*;
        match self {
            RoundNotFound(tag) => write!(f, "Round {} does not exist in this bracket.", tag),
            MatchNotFound(coordinates) => write!(f, "Match {} does not exist.", coordinates),
            InvalidWinnerSelection(detail) => {
                write!(f, "Invalid winner selection: {}.", detail)
            }
            FixtureNotFound(category) => {
                write!(f, "No fixtures have been generated for {}.", category)
            }
            RegistrationClosed => write!(f, "Registration is currently closed."),
            PlayerNotFound(id) => write!(f, "Player {} does not exist.", id),
            AlreadyPaired(id) => write!(f, "Player {} is already in a doubles pair.", id),
            SelfPairing => write!(f, "Cannot pair a player with themselves."),
            NoPlayersRegistered => write!(f, "No players registered yet."),
        }
    }
}

impl std::error::Error for TournamentError {}
