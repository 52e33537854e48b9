use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::EngineError;

/// A reference to a single registered player as embedded in a bracket cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerRef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// A reference to a doubles pair as embedded in a bracket cell.
///
/// The member names are denormalized into the reference so that the pair can
/// be displayed without a roster lookup. Identity is the two member ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairRef {
    pub player1_id: String,
    pub player2_id: String,
    #[serde(default)]
    pub player1_name: String,
    #[serde(default)]
    pub player2_name: String,
}

/// An entity occupying a bracket slot.
///
/// A slot holds a structured reference (single player or doubles pair), or a
/// raw display string once an administrator has manually corrected the name.
/// Serialized untagged so the document shape stays a plain player object, a
/// pair object, or a bare string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Entrant {
    Pair(PairRef),
    Single(PlayerRef),
    Name(String),
}

impl Entrant {
    /// The name shown in fixtures; pairs render as "NameA & NameB".
    pub fn display_name(&self) -> String {
        fn or_unknown(name: &str) -> &str {
            if name.is_empty() {
                "UNKNOWN"
            } else {
                name
            }
        }

        match self {
            Entrant::Single(player) => player.name.clone(),
            Entrant::Pair(pair) => format!(
                "{} & {}",
                or_unknown(&pair.player1_name),
                or_unknown(&pair.player2_name)
            ),
            Entrant::Name(name) => name.clone(),
        }
    }
}

impl PartialEq for Entrant {
    /// Structured references compare by id; a manually edited slot only has
    /// its display string left to compare against.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Entrant::Single(a), Entrant::Single(b)) => a.id == b.id,
            (Entrant::Pair(a), Entrant::Pair(b)) => {
                a.player1_id == b.player1_id && a.player2_id == b.player2_id
            }
            (a, b) => a.display_name() == b.display_name(),
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// One bracket cell.
///
/// `winner`, when set, equals `player1` or `player2`. A match created as a
/// bye keeps `player2` permanently empty; whatever occupies `player1` is the
/// advancing entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub player1: Option<Entrant>,
    pub player2: Option<Entrant>,
    pub winner: Option<Entrant>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_bye: bool,
}

impl Match {
    pub fn between(player1: Entrant, player2: Entrant) -> Self {
        Match {
            player1: Some(player1),
            player2: Some(player2),
            ..Match::default()
        }
    }

    pub fn bye(player: Entrant) -> Self {
        Match {
            player1: Some(player),
            is_bye: true,
            ..Match::default()
        }
    }

    /// An empty slot in a later round, waiting for winners to feed it.
    pub fn pending() -> Self {
        Match::default()
    }

    /// An empty later-round slot with a single input line; its eventual sole
    /// occupant advances without playing.
    pub fn pending_bye() -> Self {
        Match {
            is_bye: true,
            ..Match::default()
        }
    }

    pub fn contains(&self, entrant: &Entrant) -> bool {
        self.player1.as_ref() == Some(entrant) || self.player2.as_ref() == Some(entrant)
    }
}

/// An ordered sequence of matches making up one stage of the draw.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub matches: Vec<Match>,
}

/// The semantic name of a round, distinct from its ordinal position.
///
/// Tags are not lexically ordered ("round2" sorts after "quarterfinal"), so
/// a bracket carries its own tag sequence; see [`Bracket::round_order`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RoundTag {
    First,
    Round(u8),
    RoundOf16,
    Quarterfinal,
    Semifinal,
    Final,
}

impl RoundTag {
    /// Tag for a round after the first, chosen by the round's match count.
    /// `round_number` is the 1-based position in the draw and only shows up
    /// in the numbered tags of very large brackets.
    pub fn for_size(match_count: usize, round_number: u8) -> Self {
        match match_count {
            1 => RoundTag::Final,
            2 => RoundTag::Semifinal,
            4 => RoundTag::Quarterfinal,
            8 => RoundTag::RoundOf16,
            _ => RoundTag::Round(round_number),
        }
    }

    /// Heading used when rendering the round.
    pub fn title(&self) -> String {
        match self {
            RoundTag::First => "FIRST ROUND".to_string(),
            RoundTag::Round(number) => format!("ROUND {}", number),
            RoundTag::RoundOf16 => "ROUND OF 16".to_string(),
            RoundTag::Quarterfinal => "QUARTERFINAL".to_string(),
            RoundTag::Semifinal => "SEMIFINAL".to_string(),
            RoundTag::Final => "FINAL".to_string(),
        }
    }
}

impl fmt::Display for RoundTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundTag::First => write!(f, "first"),
            RoundTag::Round(number) => write!(f, "round{}", number),
            RoundTag::RoundOf16 => write!(f, "round16"),
            RoundTag::Quarterfinal => write!(f, "quarterfinal"),
            RoundTag::Semifinal => write!(f, "semifinal"),
            RoundTag::Final => write!(f, "final"),
        }
    }
}

impl FromStr for RoundTag {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" => Ok(RoundTag::First),
            "round16" => Ok(RoundTag::RoundOf16),
            "quarterfinal" => Ok(RoundTag::Quarterfinal),
            "semifinal" => Ok(RoundTag::Semifinal),
            "final" => Ok(RoundTag::Final),
            _ => {
                let number = s
                    .strip_prefix("round")
                    .and_then(|digits| digits.parse::<u8>().ok())
                    .ok_or_else(|| anyhow!("Unknown round tag: {}", s))?;
                Ok(RoundTag::Round(number))
            }
        }
    }
}

impl Serialize for RoundTag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RoundTag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let tag = String::deserialize(deserializer)?;
        tag.parse().map_err(serde::de::Error::custom)
    }
}

/// The full draw for one category.
///
/// On the wire this is a mapping from round tag to round, with a sibling
/// `roundOrder` list recording the tag sequence the builder produced. The
/// list is the authoritative ordering for display and propagation; tag
/// strings are never sorted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bracket {
    #[serde(flatten)]
    pub rounds: BTreeMap<RoundTag, Round>,
    #[serde(rename = "roundOrder", default, skip_serializing_if = "Vec::is_empty")]
    pub round_order: Vec<RoundTag>,
}

impl Bracket {
    /// An empty bracket means fixtures have not been generated; the builder
    /// returns one for an empty entrant list instead of failing.
    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    pub fn round(&self, tag: RoundTag) -> Option<&Round> {
        self.rounds.get(&tag)
    }

    pub fn round_mut(&mut self, tag: RoundTag) -> Option<&mut Round> {
        self.rounds.get_mut(&tag)
    }

    /// The tag immediately after `tag` in the recorded round order, if any.
    pub fn next_round_after(&self, tag: RoundTag) -> Option<RoundTag> {
        let position = self.round_order.iter().position(|entry| *entry == tag)?;
        self.round_order.get(position + 1).copied()
    }
}

/// Which side of a match the administrator picked as the winner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WinnerSelection {
    Player1,
    Player2,
}

/// Free-text name corrections entered alongside a result.
///
/// A non-empty value that differs from the slot's current display name
/// replaces the slot with a raw [`Entrant::Name`].
#[derive(Debug, Clone, Default)]
pub struct ManualNames {
    pub player1: Option<String>,
    pub player2: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_tags_round_trip_through_strings() {
        let tags = [
            RoundTag::First,
            RoundTag::Round(2),
            RoundTag::Round(7),
            RoundTag::RoundOf16,
            RoundTag::Quarterfinal,
            RoundTag::Semifinal,
            RoundTag::Final,
        ];

        for tag in tags {
            let parsed: RoundTag = tag.to_string().parse().unwrap();
            assert_eq!(parsed, tag);
        }

        assert_eq!("round16".parse::<RoundTag>().unwrap(), RoundTag::RoundOf16);
        assert_eq!("round2".parse::<RoundTag>().unwrap(), RoundTag::Round(2));
        assert!("grandfinal".parse::<RoundTag>().is_err());
    }

    #[test]
    fn entrants_deserialize_by_shape() {
        let single: Entrant =
            serde_json::from_str(r#"{"id":"p1","name":"Asha","email":"asha@club.test"}"#).unwrap();
        assert!(matches!(single, Entrant::Single(_)));

        let pair: Entrant = serde_json::from_str(
            r#"{"player1Id":"p1","player2Id":"p2","player1Name":"Asha","player2Name":"Ben"}"#,
        )
        .unwrap();
        assert_eq!(pair.display_name(), "Asha & Ben");

        let name: Entrant = serde_json::from_str(r#""ASHA""#).unwrap();
        assert!(matches!(name, Entrant::Name(_)));
    }

    #[test]
    fn entrant_equality_is_by_id_for_references_and_by_name_across_kinds() {
        let by_id = |id: &str, name: &str| {
            Entrant::Single(PlayerRef {
                id: id.to_string(),
                name: name.to_string(),
                email: String::new(),
            })
        };

        assert_eq!(by_id("p1", "Asha"), by_id("p1", "A. Sharma"));
        assert_ne!(by_id("p1", "Asha"), by_id("p2", "Asha"));
        assert_eq!(Entrant::Name("Asha".to_string()), by_id("p9", "Asha"));

        let pair = |a: &str, b: &str| {
            Entrant::Pair(PairRef {
                player1_id: a.to_string(),
                player2_id: b.to_string(),
                player1_name: String::new(),
                player2_name: String::new(),
            })
        };
        assert_eq!(pair("p1", "p2"), pair("p1", "p2"));
        assert_ne!(pair("p1", "p2"), pair("p1", "p3"));
    }

    #[test]
    fn bye_flag_is_omitted_for_ordinary_matches() {
        let ordinary = serde_json::to_value(Match::pending()).unwrap();
        assert!(ordinary.get("isBye").is_none());

        let bye = serde_json::to_value(Match::pending_bye()).unwrap();
        assert_eq!(bye["isBye"], serde_json::json!(true));
    }
}
