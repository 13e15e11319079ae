//! Identifiers and small value objects shared across the game domain.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident($inner:ty)) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<$inner> for $name {
            fn from(value: $inner) -> Self {
                Self(value)
            }
        }
    };
}

id_type!(
    /// Identifier of a game; also the broker topic and channel group name.
    GameId(Uuid)
);
id_type!(
    /// Identifier of a player (user) across games.
    PlayerId(i64)
);
id_type!(
    /// Identifier of a field, numbered from 1 within a game.
    FieldId(i64)
);
id_type!(
    /// Identifier of a trivia category.
    CategoryId(i64)
);
id_type!(
    /// Identifier of a trivia question.
    QuestionId(i64)
);
id_type!(
    /// Identifier of a trivia answer.
    AnswerId(i64)
);

impl GameId {
    /// Generates a fresh random game identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

/// The three playing stages of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Every player picks a base field.
    Preparatory,
    /// Players mark free fields simultaneously.
    Capturing,
    /// Players attack each other's fields in turn.
    Battling,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Preparatory => "preparatory",
            Self::Capturing => "capturing",
            Self::Battling => "battling",
        };
        f.write_str(name)
    }
}

/// A trivia category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category identifier.
    pub id: CategoryId,
    /// Display title.
    pub title: String,
}

/// One answer option of a question, including whether it is correct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionAnswer {
    /// Answer identifier.
    pub id: AnswerId,
    /// Answer text.
    pub body: String,
    /// Whether this is the correct option.
    pub is_correct: bool,
}

/// An answer option as shown to players, without the correctness flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    /// Answer identifier.
    pub id: AnswerId,
    /// Answer text.
    pub body: String,
}

/// A trivia question with exactly one correct answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Question identifier.
    pub id: QuestionId,
    /// Question text.
    pub body: String,
    /// All answer options.
    pub answers: Vec<QuestionAnswer>,
}

impl Question {
    /// Returns the identifier of the correct answer, if the question has one.
    #[must_use]
    pub fn correct_answer(&self) -> Option<AnswerId> {
        self.answers
            .iter()
            .find(|answer| answer.is_correct)
            .map(|answer| answer.id)
    }

    /// Returns the options with correctness stripped.
    #[must_use]
    pub fn options(&self) -> Vec<AnswerOption> {
        self.answers
            .iter()
            .map(|answer| AnswerOption {
                id: answer.id,
                body: answer.body.clone(),
            })
            .collect()
    }
}

/// A stored answer as returned by the answers repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// Answer identifier.
    pub id: AnswerId,
    /// The question this answer belongs to.
    pub question_id: QuestionId,
}

/// A line of the final scoreboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResultLine {
    /// 1-based place.
    pub place: u32,
    /// The ranked player.
    pub player_id: PlayerId,
    /// Sum of the values of the fields the player owns.
    pub score: i64,
}

/// How a duel ended for the attacked field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuelOutcome {
    /// The attacker took the field.
    Captured,
    /// The defender kept the field.
    Defended,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question() -> Question {
        Question {
            id: QuestionId(7),
            body: "Capital of Peru?".to_owned(),
            answers: vec![
                QuestionAnswer {
                    id: AnswerId(1),
                    body: "Quito".to_owned(),
                    is_correct: false,
                },
                QuestionAnswer {
                    id: AnswerId(2),
                    body: "Lima".to_owned(),
                    is_correct: true,
                },
            ],
        }
    }

    #[test]
    fn test_correct_answer_returns_flagged_option() {
        assert_eq!(question().correct_answer(), Some(AnswerId(2)));
    }

    #[test]
    fn test_options_hide_correctness() {
        let options = question().options();

        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(options.len(), 2);
        assert!(json[0].get("is_correct").is_none());
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&PlayerId(42)).unwrap();

        assert_eq!(json, "42");
    }
}
