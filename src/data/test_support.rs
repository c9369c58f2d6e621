// Shared fixtures for unit tests across the crate.

use std::path::Path;

use rand::{rngs::StdRng, Rng, SeedableRng};
use rusqlite::{params, Connection};

use crate::domain::observation::{ChronoKey, Observation};

/// `per_entity` readings per entity at 144 chunks per day with
/// unique, sorted keys and percentages in [0, 100]. The signal is
/// a daily bump plus seeded noise.
pub fn synthetic_rows(entities: &[&str], per_entity: usize, seed: u64) -> Vec<Observation> {
    let mut rng  = StdRng::seed_from_u64(seed);
    let mut rows = Vec::new();
    for name in entities {
        for i in 0..per_entity {
            let day   = (i / 144) as u32;
            let key   = ChronoKey::new(2024 + (day / 336) as i32, 1 + (day / 28) % 12, 1 + day % 28, (i % 144) as u32);
            let daily = ((i % 144) as f64 / 144.0 * std::f64::consts::PI).sin();
            let pct   = (daily * 80.0 + rng.gen_range(0.0..20.0)).clamp(0.0, 100.0);
            rows.push(Observation::new(*name, key, pct));
        }
    }
    rows
}

/// Write `rows` into a fresh `BibData` table at `path`.
pub fn write_sqlite(path: &Path, rows: &[Observation]) {
    let mut conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS BibData (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            year INTEGER NOT NULL,
            month INTEGER NOT NULL,
            day INTEGER NOT NULL,
            chunk INTEGER NOT NULL,
            percentage REAL NOT NULL
        )",
    )
    .unwrap();
    let tx = conn.transaction().unwrap();
    {
        let mut stmt = tx
            .prepare("INSERT INTO BibData (name, year, month, day, chunk, percentage) VALUES (?1, ?2, ?3, ?4, ?5, ?6)")
            .unwrap();
        for r in rows {
            stmt.execute(params![r.entity, r.key.year, r.key.month, r.key.day, r.key.chunk, r.percentage])
                .unwrap();
        }
    }
    tx.commit().unwrap();
}
