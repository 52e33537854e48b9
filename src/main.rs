use tracing::info;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

use courtcup::bracket::models::{Entrant, ManualNames, RoundTag, WinnerSelection};
use courtcup::manager::TournamentManager;
use courtcup::store::{models::Category, MemoryStore, ParticipantStore};
use courtcup::EngineError;

#[tokio::main]
async fn main() {
    if let Err(e) = setup_tracing() {
        panic!("Error trying to setup tracing: {}", e);
    }

    if let Err(e) = run().await {
        panic!("Error running the demo tournament: {}", e);
    }
}

/// Runs one small tournament cycle against the in-memory store and prints
/// the resulting fixture documents.
async fn run() -> Result<(), EngineError> {
    let manager = TournamentManager::new(MemoryStore::new());

    for (name, in_singles, in_doubles) in [
        ("Asha", true, true),
        ("Ben", true, true),
        ("Cole", true, false),
        ("Dee", true, true),
        ("Eli", true, true),
        ("Faye", false, true),
    ] {
        manager
            .register_player(
                name,
                &format!("{}@club.test", name.to_lowercase()),
                in_singles,
                in_doubles,
            )
            .await?;
    }

    let players = manager.store().players().await?;
    manager.pair_players(&players[0].id, &players[1].id).await?;

    manager.generate_fixtures().await?;
    info!("Fixtures generated; registration is now closed");

    // Play the whole singles opening round; byes advance their lone entrant.
    let singles = manager
        .bracket(Category::Singles)
        .await?
        .unwrap_or_default();
    let opening_matches = singles
        .round(RoundTag::First)
        .map(|round| round.matches.len())
        .unwrap_or(0);
    for index in 0..opening_matches {
        manager
            .record_result(
                Category::Singles,
                RoundTag::First,
                index,
                &ManualNames::default(),
                Some(WinnerSelection::Player1),
            )
            .await?;
    }

    for category in Category::all() {
        let Some(bracket) = manager.bracket(category).await? else {
            continue;
        };

        println!("==== {} ====", category);
        for tag in &bracket.round_order {
            let Some(round) = bracket.round(*tag) else {
                continue;
            };
            println!("{}", tag.title());
            for (number, cell) in round.matches.iter().enumerate() {
                let line = match (&cell.player1, &cell.player2) {
                    (None, None) => "Match to be scheduled".to_string(),
                    (player1, player2) => {
                        format!("{} VS {}", display(player1), display(player2))
                    }
                };
                println!("  Match {}: {}", number + 1, line);
                if let Some(winner) = &cell.winner {
                    println!("    WINNER: {}", winner.display_name().to_uppercase());
                }
            }
        }

        println!("{}", serde_json::to_string_pretty(&bracket)?);
    }

    Ok(())
}

fn display(slot: &Option<Entrant>) -> String {
    match slot {
        Some(entrant) => entrant.display_name().to_uppercase(),
        None => "BYE".to_string(),
    }
}

fn setup_tracing() -> Result<(), EngineError> {
    let filter = EnvFilter::from_default_env().add_directive("courtcup=info".parse()?);

    tracing_subscriber::fmt::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::NONE)
        .pretty()
        .init();

    Ok(())
}
