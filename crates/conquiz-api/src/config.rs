//! Server configuration read from the environment.

use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;

use conquiz_game::domain::settings::GameSettings;

use crate::error::AppError;

/// Everything the server needs to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Base URL of the trivia service. The built-in catalog is used when
    /// unset.
    pub questions_url: Option<String>,
    /// Settings for every game created by this server.
    pub settings: GameSettings,
}

impl Config {
    /// Reads `HOST`, `PORT`, `QUESTIONS_URL` and the `GAME_*` overrides.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for unparsable values or unplayable game
    /// settings.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with a custom variable source.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for unparsable values or unplayable game
    /// settings.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = GameSettings::default();
        let settings = GameSettings {
            players_count_to_start: parsed(
                &lookup,
                "GAME_PLAYERS_COUNT_TO_START",
                defaults.players_count_to_start,
            )?,
            fields_count: parsed(&lookup, "GAME_FIELDS_COUNT", defaults.fields_count)?,
            battle_rounds_per_player: parsed(
                &lookup,
                "GAME_BATTLE_ROUNDS_PER_PLAYER",
                defaults.battle_rounds_per_player,
            )?,
            duel_max_rounds: parsed(&lookup, "GAME_DUEL_MAX_ROUNDS", defaults.duel_max_rounds)?,
            round_time_seconds: parsed(
                &lookup,
                "GAME_ROUND_TIME_SECONDS",
                defaults.round_time_seconds,
            )?,
            question_time_seconds: parsed(
                &lookup,
                "GAME_QUESTION_TIME_SECONDS",
                defaults.question_time_seconds,
            )?,
            field_value_step: parsed(&lookup, "GAME_FIELD_VALUE_STEP", defaults.field_value_step)?,
        };
        settings
            .validate()
            .map_err(|e| AppError::Config(e.to_string()))?;

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parsed(&lookup, "PORT", 3000)?,
            questions_url: lookup("QUESTIONS_URL").filter(|url| !url.trim().is_empty()),
            settings,
        })
    }

    /// The socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `host:port` is not a socket address.
    pub fn addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{key} is invalid: {e}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_variables() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.questions_url, None);
        assert_eq!(config.settings, GameSettings::default());
    }

    #[test]
    fn test_game_overrides_are_applied() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("GAME_PLAYERS_COUNT_TO_START", "3"),
            ("GAME_ROUND_TIME_SECONDS", " 45 "),
            ("QUESTIONS_URL", "http://trivia:8000/api/questions"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.settings.players_count_to_start, 3);
        assert_eq!(config.settings.round_time_seconds, 45);
        assert_eq!(
            config.questions_url.as_deref(),
            Some("http://trivia:8000/api/questions")
        );
        assert_eq!(config.addr().unwrap().port(), 8080);
    }

    #[test]
    fn test_unparsable_value_names_the_variable() {
        let result = config_from(&[("PORT", "eighty")]);

        match result {
            Err(AppError::Config(msg)) => assert!(msg.starts_with("PORT is invalid")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn test_unplayable_settings_are_rejected() {
        let result = config_from(&[("GAME_PLAYERS_COUNT_TO_START", "1")]);

        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
