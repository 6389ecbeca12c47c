//! Acceso a la base SQLite: registro de jugadores e historial de
//! enfrentamientos. El motor de sorteo no toca esta capa; solo consume el
//! snapshot que se lee aquí.

use std::path::Path;

use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::error::Error;
use crate::pairing::Player;

#[derive(Clone)]
pub struct Db(SqlitePool);

/// Registro persistido de un enfrentamiento. Siempre con
/// `player_a_id < player_b_id`; el esquema lo respalda con un CHECK.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Matchup {
    pub round: i64,
    pub player_a_id: i64,
    pub player_b_id: i64,
}

/// Fila del historial con nombres resueltos, para el navegador de rondas.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MatchupNames {
    pub round: i64,
    pub player_a: String,
    pub player_b: String,
}

impl Db {
    /// Abre (o crea) la base en `path` y aplica las migraciones.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Db, Error> {
        // Usa SqliteConnectOptions::filename en lugar de una URL para
        // evitar problemas con espacios en rutas.
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Db(pool))
    }

    /// Base en memoria para pruebas. Una sola conexión sin expiración:
    /// cada conexión SQLite en memoria es una base distinta.
    pub async fn connect_in_memory() -> Result<Db, Error> {
        let options = SqliteConnectOptions::new()
            .in_memory(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Db(pool))
    }

    /* ------------------- JUGADORES ------------------- */

    /// Solo jugadores activos, ordenados por nombre.
    pub async fn list_players(&self) -> Result<Vec<Player>, Error> {
        let players = sqlx::query_as::<_, Player>(
            "SELECT id, name FROM player WHERE is_active = 1 ORDER BY name ASC",
        )
        .fetch_all(&self.0)
        .await?;
        Ok(players)
    }

    pub async fn create_player(&self, name: &str) -> Result<i64, Error> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::EmptyName);
        }

        let res = sqlx::query("INSERT INTO player (name) VALUES (?1)")
            .bind(name)
            .execute(&self.0)
            .await?;

        let id = res.last_insert_rowid();
        tracing::info!(id, name, "jugador registrado");
        Ok(id)
    }

    pub async fn rename_player(&self, id: i64, name: &str) -> Result<(), Error> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::EmptyName);
        }

        let res = sqlx::query(
            "UPDATE player SET name = ?1, updated_at = strftime('%Y-%m-%dT%H:%M:%SZ','now') \
             WHERE id = ?2 AND is_active = 1",
        )
        .bind(name)
        .bind(id)
        .execute(&self.0)
        .await?;

        if res.rows_affected() == 0 {
            return Err(Error::PlayerNotFound);
        }
        Ok(())
    }

    /// Baja lógica: el jugador deja de listarse pero sus enfrentamientos
    /// históricos conservan la referencia y el nombre.
    pub async fn delete_player(&self, id: i64) -> Result<(), Error> {
        let res = sqlx::query(
            "UPDATE player SET is_active = 0, updated_at = strftime('%Y-%m-%dT%H:%M:%SZ','now') \
             WHERE id = ?1 AND is_active = 1",
        )
        .bind(id)
        .execute(&self.0)
        .await?;

        if res.rows_affected() == 0 {
            return Err(Error::PlayerNotFound);
        }

        tracing::info!(id, "jugador dado de baja");
        Ok(())
    }

    /* ------------------- HISTORIAL ------------------- */

    pub async fn read_history(&self) -> Result<Vec<Matchup>, Error> {
        let records = sqlx::query_as::<_, Matchup>(
            "SELECT round, player_a_id, player_b_id FROM matchup ORDER BY round ASC, id ASC",
        )
        .fetch_all(&self.0)
        .await?;
        Ok(records)
    }

    /// Inserta todas las parejas de una ronda en una transacción, con las
    /// columnas en orden canónico. El UNIQUE del esquema rechaza cualquier
    /// pareja repetida y revierte la ronda entera.
    pub async fn append_matchups(&self, round: i64, pairs: &[(i64, i64)]) -> Result<(), Error> {
        let mut tx: Transaction<'_, Sqlite> = self.0.begin().await?;

        for &(a, b) in pairs {
            let (lo, hi) = if a < b { (a, b) } else { (b, a) };
            sqlx::query("INSERT INTO matchup (round, player_a_id, player_b_id) VALUES (?1, ?2, ?3)")
                .bind(round)
                .bind(lo)
                .bind(hi)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        tracing::info!(round, parejas = pairs.len(), "historial guardado");
        Ok(())
    }

    pub async fn clear_history(&self) -> Result<(), Error> {
        sqlx::query("DELETE FROM matchup").execute(&self.0).await?;
        tracing::info!("historial borrado");
        Ok(())
    }

    /// Rondas registradas, ascendente.
    pub async fn list_rounds(&self) -> Result<Vec<i64>, Error> {
        let rounds: Vec<i64> =
            sqlx::query_scalar("SELECT DISTINCT round FROM matchup ORDER BY round ASC")
                .fetch_all(&self.0)
                .await?;
        Ok(rounds)
    }

    /// Historial con nombres resueltos, opcionalmente filtrado por ronda.
    pub async fn history_with_names(
        &self,
        round: Option<i64>,
    ) -> Result<Vec<MatchupNames>, Error> {
        let base = r#"
            SELECT m.round,
                   pa.name AS player_a,
                   pb.name AS player_b
            FROM matchup m
            JOIN player pa ON pa.id = m.player_a_id
            JOIN player pb ON pb.id = m.player_b_id
        "#;

        if let Some(r) = round {
            let q = format!("{base} WHERE m.round = ?1 ORDER BY m.id ASC");
            let rows = sqlx::query_as::<_, MatchupNames>(&q)
                .bind(r)
                .fetch_all(&self.0)
                .await?;
            Ok(rows)
        } else {
            let q = format!("{base} ORDER BY m.round ASC, m.id ASC");
            let rows = sqlx::query_as::<_, MatchupNames>(&q)
                .fetch_all(&self.0)
                .await?;
            Ok(rows)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[tokio::test]
    async fn player_registry_crud() -> Result<()> {
        let db = Db::connect_in_memory().await?;

        let ana = db.create_player("Ana").await?;
        db.create_player("  Bruno ").await?;
        assert!(matches!(db.create_player("   ").await, Err(Error::EmptyName)));

        let players = db.list_players().await?;
        let names: Vec<&str> = players.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Ana", "Bruno"]);

        db.rename_player(ana, "Ana María").await?;
        assert!(matches!(db.rename_player(999, "X").await, Err(Error::PlayerNotFound)));
        assert!(matches!(db.rename_player(ana, " ").await, Err(Error::EmptyName)));

        db.delete_player(ana).await?;
        assert_eq!(db.list_players().await?.len(), 1);
        assert!(matches!(db.delete_player(ana).await, Err(Error::PlayerNotFound)));
        Ok(())
    }

    #[tokio::test]
    async fn append_canonicalizes_and_rejects_repeats() -> Result<()> {
        let db = Db::connect_in_memory().await?;
        let a = db.create_player("Ana").await?;
        let b = db.create_player("Bruno").await?;

        // se guarda (a, b) aunque llegue como (b, a)
        db.append_matchups(1, &[(b, a)]).await?;
        let history = db.read_history().await?;
        assert_eq!(
            history,
            vec![Matchup {
                round: 1,
                player_a_id: a,
                player_b_id: b
            }]
        );

        // repetir la pareja en otra ronda viola el UNIQUE
        let err = db.append_matchups(2, &[(a, b)]).await.unwrap_err();
        assert!(matches!(err, Error::Database(_)));
        assert_eq!(db.read_history().await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn append_is_all_or_nothing() -> Result<()> {
        let db = Db::connect_in_memory().await?;
        let a = db.create_player("Ana").await?;
        let b = db.create_player("Bruno").await?;
        let c = db.create_player("Carla").await?;
        let d = db.create_player("Diego").await?;

        db.append_matchups(1, &[(a, b)]).await?;

        // la segunda pareja repite a-b: la ronda entera se revierte
        let err = db.append_matchups(2, &[(c, d), (a, b)]).await.unwrap_err();
        assert!(matches!(err, Error::Database(_)));
        assert_eq!(db.read_history().await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn append_requires_known_players() -> Result<()> {
        let db = Db::connect_in_memory().await?;
        let err = db.append_matchups(1, &[(1, 2)]).await.unwrap_err();
        assert!(matches!(err, Error::Database(_)));
        Ok(())
    }

    #[tokio::test]
    async fn history_browsing_with_names_and_rounds() -> Result<()> {
        let db = Db::connect_in_memory().await?;
        let a = db.create_player("Ana").await?;
        let b = db.create_player("Bruno").await?;
        let c = db.create_player("Carla").await?;
        let d = db.create_player("Diego").await?;
        db.append_matchups(1, &[(a, b), (c, d)]).await?;
        db.append_matchups(2, &[(a, c), (b, d)]).await?;

        assert_eq!(db.list_rounds().await?, vec![1, 2]);

        let all = db.history_with_names(None).await?;
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].player_a, "Ana");
        assert_eq!(all[0].player_b, "Bruno");

        let second = db.history_with_names(Some(2)).await?;
        assert_eq!(second.len(), 2);
        assert!(second.iter().all(|m| m.round == 2));

        // la baja lógica no pierde los nombres del historial
        db.delete_player(b).await?;
        let all = db.history_with_names(None).await?;
        assert!(all.iter().any(|m| m.player_b == "Bruno"));

        db.clear_history().await?;
        assert!(db.read_history().await?.is_empty());
        assert!(db.list_rounds().await?.is_empty());
        Ok(())
    }
}
