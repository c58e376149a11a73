use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, params};
use serde_json::{Value, json};

use crate::history::{MatchRecord, record_from_value};
use crate::http_cache::app_cache_dir;

#[derive(Debug, Clone)]
pub struct ArchiveSummary {
    pub db_path: PathBuf,
    pub records_seen: usize,
    pub records_upserted: usize,
    pub latest_date: Option<String>,
}

pub fn default_db_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join("historial_partidos.sqlite"))
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Nested values (`equipos`, `resultado`, `jugadores_confirmados`, `goleadores`) are
/// stored as JSON text.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS historial_partidos (
            id INTEGER PRIMARY KEY,
            fecha TEXT NOT NULL,
            fecha_formato TEXT NULL,
            hora TEXT NULL,
            cancha TEXT NULL,
            jugadores_confirmados TEXT NULL,
            equipos TEXT NULL,
            resultado TEXT NULL,
            mvp TEXT NULL,
            asistencia INTEGER NULL,
            goleadores TEXT NULL,
            estado TEXT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_historial_fecha ON historial_partidos(fecha);
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

/// Insert or update every record in one transaction.
pub fn upsert_records(conn: &mut Connection, records: &[MatchRecord]) -> Result<usize> {
    let tx = conn.transaction().context("begin archive transaction")?;
    let mut upserted = 0usize;
    for record in records {
        upsert_record(&tx, record)?;
        upserted += 1;
    }
    tx.commit().context("commit archive transaction")?;
    Ok(upserted)
}

pub fn archive_records(
    conn: &mut Connection,
    db_path: PathBuf,
    records: &[MatchRecord],
) -> Result<ArchiveSummary> {
    let records_upserted = upsert_records(conn, records)?;
    let latest_date = records.iter().map(|r| r.date.clone()).max();
    Ok(ArchiveSummary {
        db_path,
        records_seen: records.len(),
        records_upserted,
        latest_date,
    })
}

/// Newest date first.
pub fn load_records(conn: &Connection) -> Result<Vec<MatchRecord>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT
                id, fecha, fecha_formato, hora, cancha,
                jugadores_confirmados, equipos, resultado, mvp, asistencia,
                goleadores, estado, updated_at
            FROM historial_partidos
            ORDER BY fecha DESC, id ASC
            "#,
        )
        .context("prepare load history query")?;

    let rows = stmt
        .query_map([], |row| {
            Ok(json!({
                "id": row.get::<_, i64>(0)?,
                "fecha": row.get::<_, String>(1)?,
                "fecha_formato": row.get::<_, Option<String>>(2)?,
                "hora": row.get::<_, Option<String>>(3)?,
                "cancha": row.get::<_, Option<String>>(4)?,
                "jugadores_confirmados": row.get::<_, Option<String>>(5)?,
                "equipos": row.get::<_, Option<String>>(6)?,
                "resultado": row.get::<_, Option<String>>(7)?,
                "mvp": row.get::<_, Option<String>>(8)?,
                "asistencia": row.get::<_, Option<i64>>(9)?,
                "goleadores": row.get::<_, Option<String>>(10)?,
                "estado": row.get::<_, Option<String>>(11)?,
                "timestamp": row.get::<_, String>(12)?,
            }))
        })
        .context("query load history")?;

    let mut out = Vec::new();
    for row in rows {
        let value: Value = row.context("decode history row")?;
        if let Some(record) = record_from_value(&value) {
            out.push(record);
        }
    }
    Ok(out)
}

fn upsert_record(tx: &rusqlite::Transaction<'_>, r: &MatchRecord) -> Result<()> {
    let equipos = json!({ "negro": r.roster_a, "rojo": r.roster_b }).to_string();
    let resultado = r
        .score
        .map(|s| serde_json::to_string(&s))
        .transpose()
        .context("serialize score")?;
    let confirmados = r
        .confirmed_players
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .context("serialize confirmed players")?;
    let goleadores = serde_json::to_string(&r.scorers).context("serialize scorers")?;
    let updated_at = r
        .updated_at
        .clone()
        .unwrap_or_else(|| Utc::now().to_rfc3339());

    tx.execute(
        r#"
        INSERT INTO historial_partidos (
            id, fecha, fecha_formato, hora, cancha,
            jugadores_confirmados, equipos, resultado, mvp, asistencia,
            goleadores, estado, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5,
            ?6, ?7, ?8, ?9, ?10,
            ?11, ?12, ?13
        )
        ON CONFLICT(id) DO UPDATE SET
            fecha = excluded.fecha,
            fecha_formato = excluded.fecha_formato,
            hora = excluded.hora,
            cancha = excluded.cancha,
            jugadores_confirmados = excluded.jugadores_confirmados,
            equipos = excluded.equipos,
            resultado = excluded.resultado,
            mvp = excluded.mvp,
            asistencia = excluded.asistencia,
            goleadores = excluded.goleadores,
            estado = excluded.estado,
            updated_at = excluded.updated_at
        "#,
        params![
            r.id,
            r.date,
            r.formatted_date,
            r.time,
            r.field,
            confirmados,
            equipos,
            resultado,
            r.mvp,
            r.attendance.map(i64::from),
            goleadores,
            r.status,
            updated_at,
        ],
    )
    .context("upsert history record")?;
    Ok(())
}
