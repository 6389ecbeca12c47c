use thiserror::Error;

/// Errores de la aplicación.
///
/// Un sorteo sin solución no aparece aquí: es un resultado normal y se
/// devuelve como valor ([`crate::pairing::DrawOutcome::NoSolution`]).
#[derive(Debug, Error)]
pub enum Error {
    /// La selección no cumple las precondiciones del sorteo (cantidad
    /// impar, menos de dos jugadores o ids repetidos).
    #[error("Selección inválida: {0}")]
    InvalidSelection(String),

    #[error("El nombre no puede estar vacío.")]
    EmptyName,

    #[error("Jugador no encontrado.")]
    PlayerNotFound,

    #[error("No hay parejas para guardar.")]
    NothingToCommit,

    #[error("Error de base de datos: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Error de migración: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}
