//! Controlador de ronda: estado vivo de un ciclo sorteo/confirmación
//! (ronda actual, índice de restricciones, selección y parejas sorteadas).

use crate::error::Error;
use crate::pairing::{self, ConstraintIndex, DrawOutcome, Pair, Player};
use crate::store::{Db, Matchup};

/// Ronda siguiente según el historial: `max(round) + 1`, o 1 sin registros.
pub fn current_round(records: &[Matchup]) -> i64 {
    records.iter().map(|m| m.round).max().map_or(1, |max| max + 1)
}

/// Estado de una sesión de sorteo. Campos explícitos en lugar de estado
/// ambiental de UI; el store se pasa a cada operación que lo necesita.
#[derive(Debug)]
pub struct Session {
    round: i64,
    index: ConstraintIndex,
    selection: Vec<Player>,
    drawn: Option<Vec<Pair>>,
}

impl Session {
    /// Reconstruye la sesión desde el historial persistido: ronda actual e
    /// índice derivado de todos los registros.
    pub async fn load(db: &Db) -> Result<Session, Error> {
        let records = db.read_history().await?;
        let index =
            ConstraintIndex::build(records.iter().map(|m| (m.player_a_id, m.player_b_id)));
        Ok(Session {
            round: current_round(&records),
            index,
            selection: Vec::new(),
            drawn: None,
        })
    }

    pub fn round(&self) -> i64 {
        self.round
    }

    pub fn index(&self) -> &ConstraintIndex {
        &self.index
    }

    pub fn selection(&self) -> &[Player] {
        &self.selection
    }

    pub fn drawn(&self) -> Option<&[Pair]> {
        self.drawn.as_deref()
    }

    /// Añade un jugador a la selección; ignora ids ya seleccionados.
    pub fn select(&mut self, player: Player) {
        if !self.selection.iter().any(|p| p.id == player.id) {
            self.selection.push(player);
        }
    }

    pub fn deselect(&mut self, id: i64) {
        self.selection.retain(|p| p.id != id);
    }

    /// Sortea parejas con la selección actual. Si hay solución queda
    /// retenida hasta confirmarla o descartarla.
    pub fn draw(&mut self) -> Result<DrawOutcome, Error> {
        let outcome = pairing::draw(&self.selection, &self.index)?;
        self.drawn = match &outcome {
            DrawOutcome::Pairing(pairs) => Some(pairs.clone()),
            DrawOutcome::NoSolution => None,
        };
        Ok(outcome)
    }

    /// Descarta el sorteo retenido. No hay efectos que deshacer.
    pub fn discard_draw(&mut self) {
        self.drawn = None;
    }

    /// Confirma el sorteo retenido: persiste los enfrentamientos de la
    /// ronda actual y, solo si la escritura tuvo éxito, extiende el índice,
    /// avanza la ronda y limpia el estado efímero. Devuelve la ronda
    /// siguiente.
    pub async fn commit(&mut self, db: &Db) -> Result<i64, Error> {
        let Some(pairs) = self.drawn.as_ref() else {
            return Err(Error::NothingToCommit);
        };
        let ids: Vec<(i64, i64)> = pairs.iter().map(Pair::ids).collect();

        // Si la escritura falla, índice y ronda quedan intactos
        db.append_matchups(self.round, &ids).await?;

        self.index.extend(ids);
        let played = self.round;
        self.round += 1;
        self.selection.clear();
        self.drawn = None;
        tracing::info!(ronda = played, "ronda confirmada");
        Ok(self.round)
    }

    /// Borra todo el historial y devuelve la sesión al estado inicial.
    /// Ronda, índice y selección se restablecen juntos tras el borrado.
    pub async fn reset_history(&mut self, db: &Db) -> Result<(), Error> {
        db.clear_history().await?;
        self.round = 1;
        self.index = ConstraintIndex::default();
        self.selection.clear();
        self.drawn = None;
        Ok(())
    }
}
