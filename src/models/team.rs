//! Team data structure and team id (de)serialization.

use serde::{Deserialize, Deserializer, Serialize};

/// Opaque team identifier. Stored as a string; integer ids are accepted on the wire.
pub type TeamId = String;

/// A two-player team entered into a tournament.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Team {
    #[serde(deserialize_with = "team_id::deserialize")]
    pub id: TeamId,
    pub name: String,
}

impl Team {
    pub fn new(id: impl Into<TeamId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Deserializers accepting a team id as either a JSON string or a JSON integer.
pub mod team_id {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTeamId {
        Text(String),
        Number(i64),
    }

    impl From<RawTeamId> for TeamId {
        fn from(raw: RawTeamId) -> Self {
            match raw {
                RawTeamId::Text(s) => s,
                RawTeamId::Number(n) => n.to_string(),
            }
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<TeamId, D::Error>
    where
        D: Deserializer<'de>,
    {
        RawTeamId::deserialize(deserializer).map(TeamId::from)
    }

    /// For nullable slots (`teamB` of a bye). Use together with `#[serde(default)]`.
    pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<TeamId>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<RawTeamId>::deserialize(deserializer).map(|raw| raw.map(TeamId::from))
    }
}
