//! Motor de sorteo: índice de enfrentamientos previos y búsqueda con
//! backtracking para partir la selección en parejas que nunca han jugado
//! juntas.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::thread_rng;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/* ------------------- JUGADORES Y PAREJAS ------------------- */

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Player {
    pub id: i64,
    pub name: String,
}

/// Pareja en orden de sorteo. La clave canónica ignora ese orden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pair {
    pub a: Player,
    pub b: Player,
}

impl Pair {
    pub fn new(a: Player, b: Player) -> Self {
        Pair { a, b }
    }

    /// Ids en orden ascendente, tal como se persisten.
    pub fn ids(&self) -> (i64, i64) {
        if self.a.id < self.b.id {
            (self.a.id, self.b.id)
        } else {
            (self.b.id, self.a.id)
        }
    }

    pub fn key(&self) -> String {
        pair_key(self.a.id, self.b.id)
    }
}

/// Clave canónica de una pareja: ids ordenados y unidos con '-', de modo
/// que (a,b) y (b,a) producen la misma clave.
pub fn pair_key(a: i64, b: i64) -> String {
    if a <= b {
        format!("{a}-{b}")
    } else {
        format!("{b}-{a}")
    }
}

/* ------------------- ÍNDICE DE RESTRICCIONES ------------------- */

/// Conjunto de claves canónicas de parejas que ya se enfrentaron.
///
/// Derivado del historial, nunca autoritativo: se reconstruye en cada
/// carga y se extiende al confirmar nuevas parejas.
#[derive(Debug, Clone, Default)]
pub struct ConstraintIndex {
    keys: HashSet<String>,
}

impl ConstraintIndex {
    pub fn build(pairs: impl IntoIterator<Item = (i64, i64)>) -> Self {
        let mut index = ConstraintIndex::default();
        index.extend(pairs);
        index
    }

    pub fn contains(&self, a: i64, b: i64) -> bool {
        self.keys.contains(&pair_key(a, b))
    }

    pub fn extend(&mut self, pairs: impl IntoIterator<Item = (i64, i64)>) {
        for (a, b) in pairs {
            self.keys.insert(pair_key(a, b));
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/* ------------------- SORTEO ------------------- */

/// Resultado de un sorteo. `NoSolution` no es un error: significa que
/// ninguna partición de la selección evita los enfrentamientos previos, y
/// la UI debe invitar a cambiar la selección.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DrawOutcome {
    Pairing(Vec<Pair>),
    NoSolution,
}

/// Sortea parejas válidas entre los jugadores seleccionados.
///
/// Baraja la selección (Fisher–Yates uniforme) y busca con backtracking
/// una partición en parejas donde ninguna figure en el índice. La búsqueda
/// es completa: si existe alguna partición válida la encuentra; si no,
/// devuelve [`DrawOutcome::NoSolution`]. El orden de las parejas devueltas
/// también se baraja.
pub fn draw(players: &[Player], index: &ConstraintIndex) -> Result<DrawOutcome, Error> {
    if players.len() < 2 || players.len() % 2 != 0 {
        return Err(Error::InvalidSelection(
            "el número de jugadores debe ser par y al menos 2".into(),
        ));
    }
    let mut seen = HashSet::new();
    for p in players {
        if !seen.insert(p.id) {
            return Err(Error::InvalidSelection(format!(
                "jugador repetido en la selección (id {})",
                p.id
            )));
        }
    }

    let mut pool: Vec<Player> = players.to_vec();
    let mut rng = thread_rng();
    pool.shuffle(&mut rng);

    match search(&pool, index) {
        Some(mut pairs) => {
            // El orden de las parejas es cosmético
            pairs.shuffle(&mut rng);
            Ok(DrawOutcome::Pairing(pairs))
        }
        None => Ok(DrawOutcome::NoSolution),
    }
}

/// Backtracking: el primer jugador restante prueba cada candidato
/// posterior en el orden ya barajado y se recursa sobre el resto. Sin
/// memoización; el peor caso exponencial no importa a escala de torneo.
fn search(remaining: &[Player], index: &ConstraintIndex) -> Option<Vec<Pair>> {
    let Some((first, rest)) = remaining.split_first() else {
        return Some(Vec::new());
    };

    for (i, partner) in rest.iter().enumerate() {
        if index.contains(first.id, partner.id) {
            continue;
        }
        let mut next: Vec<Player> = Vec::with_capacity(rest.len() - 1);
        next.extend_from_slice(&rest[..i]);
        next.extend_from_slice(&rest[i + 1..]);

        if let Some(mut pairs) = search(&next, index) {
            pairs.push(Pair::new(first.clone(), partner.clone()));
            return Some(pairs);
        }
    }

    None
}
