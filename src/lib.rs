//! Gestor de un torneo de parejas rotativas: registro de jugadores, sorteo
//! de parejas por ronda y persistencia del historial para no repetir
//! enfrentamientos.
//!
//! El núcleo es el motor de sorteo ([`pairing::draw`]): una búsqueda con
//! backtracking que particiona la selección en parejas que nunca han
//! jugado juntas. Alrededor están el colaborador de persistencia
//! ([`store::Db`], SQLite vía sqlx) y el controlador de ronda
//! ([`session::Session`]), que orquesta cargar → seleccionar → sortear →
//! confirmar.

pub mod error;
pub mod logging;
pub mod pairing;
pub mod session;
pub mod store;

pub use error::Error;
pub use pairing::{draw, pair_key, ConstraintIndex, DrawOutcome, Pair, Player};
pub use session::{current_round, Session};
pub use store::{Db, Matchup, MatchupNames};
