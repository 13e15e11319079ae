//! Domain model of a single game.

pub mod battle;
pub mod capture;
pub mod commands;
pub mod errors;
pub mod events;
pub mod field;
pub mod game;
pub mod player;
pub mod preparation;
pub mod resolvers;
pub mod settings;
pub mod strategies;
pub mod values;
