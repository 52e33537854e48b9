use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

use crate::bracket::models::{Entrant, PairRef, PlayerRef};

/// The competition categories a bracket document is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[strum(to_string = "Singles")]
    Singles,
    #[strum(to_string = "Doubles")]
    Doubles,
}

impl Category {
    pub fn all() -> Vec<Category> {
        Category::iter().collect()
    }
}

/// A registered club member.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub name: String,
    pub email: String,
    pub in_singles: bool,
    pub in_doubles: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Player {
    /// Comma-separated category membership, for roster listings.
    pub fn categories(&self) -> String {
        let mut categories = Vec::new();
        if self.in_singles {
            categories.push("Singles");
        }
        if self.in_doubles {
            categories.push("Doubles");
        }
        if categories.is_empty() {
            "None".to_string()
        } else {
            categories.join(", ")
        }
    }
}

impl From<&Player> for Entrant {
    fn from(player: &Player) -> Self {
        Entrant::Single(PlayerRef {
            id: player.id.clone(),
            name: player.name.clone(),
            email: player.email.clone(),
        })
    }
}

/// Two players entered together in the doubles draw.
///
/// Pairs an administrator created by hand are persisted in the roster;
/// auto-generated pairs only ever live inside the bracket document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoublesPair {
    pub id: String,
    pub player1_id: String,
    pub player2_id: String,
    #[serde(default)]
    pub is_auto_generated: bool,
    pub created_at: i64,
}

impl DoublesPair {
    pub fn contains(&self, player_id: &str) -> bool {
        self.player1_id == player_id || self.player2_id == player_id
    }

    /// Bracket-slot reference for this pair, with member names resolved from
    /// the roster. A member that no longer resolves renders as "UNKNOWN".
    pub fn to_entrant(&self, roster: &[Player]) -> Entrant {
        let name_of = |id: &str| {
            roster
                .iter()
                .find(|player| player.id == id)
                .map(|player| player.name.clone())
                .unwrap_or_default()
        };

        Entrant::Pair(PairRef {
            player1_id: self.player1_id.clone(),
            player2_id: self.player2_id.clone(),
            player1_name: name_of(&self.player1_id),
            player2_name: name_of(&self.player2_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: &str, name: &str) -> Player {
        Player {
            id: id.to_string(),
            name: name.to_string(),
            email: format!("{}@club.test", id),
            in_singles: true,
            in_doubles: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn category_keys_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&Category::Singles).unwrap(), r#""singles""#);
        assert_eq!(Category::Doubles.to_string(), "Doubles");
        assert_eq!(Category::all().len(), 2);
    }

    #[test]
    fn a_pair_renders_unknown_for_missing_members() {
        let roster = vec![player("p1", "Asha")];
        let pair = DoublesPair {
            id: "d1".to_string(),
            player1_id: "p1".to_string(),
            player2_id: "gone".to_string(),
            is_auto_generated: false,
            created_at: 0,
        };

        assert_eq!(pair.to_entrant(&roster).display_name(), "Asha & UNKNOWN");
    }
}
