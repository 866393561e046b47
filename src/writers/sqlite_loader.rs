use crate::error::Result;
use crate::models::ScoredRecord;
use chrono::Utc;
use rusqlite::{params, Connection, OpenFlags};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS power_plants (
        plant_code            TEXT PRIMARY KEY,
        plant_name            TEXT NOT NULL,
        operator_name         TEXT,
        city                  TEXT,
        city_standardized     TEXT,
        match_method          TEXT NOT NULL,
        fuzzy_score           INTEGER,
        county                TEXT,
        state                 TEXT,
        latitude              REAL NOT NULL,
        longitude             REAL NOT NULL,
        capacity_mw           REAL NOT NULL,
        fuel_type             TEXT,
        zoning                TEXT NOT NULL,
        status                TEXT,
        operational_year      INTEGER,
        distance_to_target_km REAL NOT NULL,
        proximity_score       REAL NOT NULL,
        zoning_score          REAL NOT NULL,
        capacity_score        REAL NOT NULL,
        site_potential_score  REAL NOT NULL,
        updated_at            TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_power_plants_score
        ON power_plants (site_potential_score DESC);
    CREATE INDEX IF NOT EXISTS idx_power_plants_region
        ON power_plants (state, county);
"#;

const UPSERT: &str = "INSERT INTO power_plants (
        plant_code, plant_name, operator_name, city, city_standardized, match_method,
        fuzzy_score, county, state, latitude, longitude, capacity_mw, fuel_type, zoning,
        status, operational_year, distance_to_target_km, proximity_score, zoning_score,
        capacity_score, site_potential_score, updated_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
              ?18, ?19, ?20, ?21, ?22)
    ON CONFLICT(plant_code) DO UPDATE SET
        plant_name=excluded.plant_name,
        operator_name=excluded.operator_name,
        city=excluded.city,
        city_standardized=excluded.city_standardized,
        match_method=excluded.match_method,
        fuzzy_score=excluded.fuzzy_score,
        county=excluded.county,
        state=excluded.state,
        latitude=excluded.latitude,
        longitude=excluded.longitude,
        capacity_mw=excluded.capacity_mw,
        fuel_type=excluded.fuel_type,
        zoning=excluded.zoning,
        status=excluded.status,
        operational_year=excluded.operational_year,
        distance_to_target_km=excluded.distance_to_target_km,
        proximity_score=excluded.proximity_score,
        zoning_score=excluded.zoning_score,
        capacity_score=excluded.capacity_score,
        site_potential_score=excluded.site_potential_score,
        updated_at=excluded.updated_at";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopSite {
    pub plant_code: String,
    pub plant_name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub capacity_mw: f64,
    pub site_potential_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionCapacity {
    pub state: Option<String>,
    pub county: Option<String>,
    pub plant_count: i64,
    pub total_capacity_mw: f64,
    pub avg_score: f64,
    pub max_score: f64,
}

/// A raw place name and the name it was stored under
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NameChange {
    pub original: String,
    pub standardized: String,
    pub match_method: String,
    pub occurrences: i64,
}

/// Load step: idempotent upsert of scored records into SQLite
pub struct SqliteLoader {
    conn: Connection,
}

impl SqliteLoader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;
        debug!("Opened database {}", path.display());

        Ok(Self { conn })
    }

    /// Open a database that must already exist. Nothing is created and the
    /// schema is left alone.
    pub fn open_existing<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path.as_ref(),
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Upsert keyed by plant code in a single transaction, paged by
    /// `batch_size` records. Any failing row rolls the whole load back.
    /// Loading the same batch twice leaves the table unchanged apart from
    /// `updated_at`.
    pub fn load(&mut self, records: &[ScoredRecord], batch_size: usize) -> Result<usize> {
        let updated_at = Utc::now().to_rfc3339();
        let mut written = 0;

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(UPSERT)?;
            for (page, chunk) in records.chunks(batch_size.max(1)).enumerate() {
                for r in chunk {
                    let plant = &r.record;
                    written += stmt.execute(params![
                        plant.plant_code,
                        plant.plant_name,
                        plant.operator_name,
                        plant.raw_place_name,
                        r.standardized_place_name,
                        r.match_method.label(),
                        r.match_method.fuzzy_score(),
                        plant.county,
                        plant.state,
                        plant.latitude,
                        plant.longitude,
                        plant.capacity_mw,
                        plant.fuel_type,
                        r.zoning.as_str(),
                        plant.status,
                        plant.operational_year,
                        r.distance_to_target_km,
                        r.proximity_score,
                        r.zoning_score,
                        r.capacity_score_normalized,
                        r.site_potential_score,
                        updated_at,
                    ])?;
                }
                debug!("Upserted page {} ({} records)", page + 1, chunk.len());
            }
        }
        tx.commit()?;

        info!("Upserted {} records into power_plants", written);
        Ok(written)
    }

    pub fn count(&self) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM power_plants", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// Highest scoring operating plants
    pub fn top_sites(&self, limit: usize) -> Result<Vec<TopSite>> {
        let mut stmt = self.conn.prepare(
            "SELECT plant_code, plant_name, city_standardized, state, capacity_mw,
                    site_potential_score
             FROM power_plants
             WHERE lower(status) = 'operating'
             ORDER BY site_potential_score DESC, plant_code
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(TopSite {
                plant_code: row.get(0)?,
                plant_name: row.get(1)?,
                city: row.get(2)?,
                state: row.get(3)?,
                capacity_mw: row.get(4)?,
                site_potential_score: row.get(5)?,
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Operating capacity per state and county, largest first
    pub fn capacity_by_region(&self) -> Result<Vec<RegionCapacity>> {
        let mut stmt = self.conn.prepare(
            "SELECT state, county, COUNT(*), SUM(capacity_mw),
                    AVG(site_potential_score), MAX(site_potential_score)
             FROM power_plants
             WHERE lower(status) = 'operating'
             GROUP BY state, county
             ORDER BY SUM(capacity_mw) DESC, state, county",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(RegionCapacity {
                state: row.get(0)?,
                county: row.get(1)?,
                plant_count: row.get(2)?,
                total_capacity_mw: row.get(3)?,
                avg_score: row.get(4)?,
                max_score: row.get(5)?,
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Place names that standardization rewrote, most frequent first
    pub fn standardization_examples(&self, limit: usize) -> Result<Vec<NameChange>> {
        let mut stmt = self.conn.prepare(
            "SELECT city, city_standardized, match_method, COUNT(*)
             FROM power_plants
             WHERE city IS NOT NULL
               AND city_standardized IS NOT NULL
               AND city <> city_standardized
             GROUP BY city, city_standardized, match_method
             ORDER BY COUNT(*) DESC, city
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(NameChange {
                original: row.get(0)?,
                standardized: row.get(1)?,
                match_method: row.get(2)?,
                occurrences: row.get(3)?,
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EtlConfig;
    use crate::models::{RawField, RawPlantRecord};
    use crate::processors::SiteProcessor;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn raw(code: &str, city: &str, county: &str, capacity: f64, status: &str) -> RawPlantRecord {
        RawPlantRecord {
            plant_code: Some(RawField::Text(code.to_string())),
            plant_name: Some(format!("Plant {}", code)),
            city: Some(city.to_string()),
            county: Some(county.to_string()),
            state: Some("CA".to_string()),
            latitude: Some(RawField::Number(37.6)),
            longitude: Some(RawField::Number(-122.3)),
            capacity: Some(RawField::Number(capacity)),
            zoning: Some("Industrial".to_string()),
            status: Some(status.to_string()),
            ..Default::default()
        }
    }

    fn scored() -> Vec<ScoredRecord> {
        let records = vec![
            raw("1", "SF", "San Francisco", 100.0, "Operating"),
            raw("2", "San Francisco", "San Francisco", 300.0, "Operating"),
            raw("3", "SF", "San Francisco", 200.0, "Retired"),
            raw("4", "Oakland", "Alameda", 400.0, "Operating"),
        ];
        SiteProcessor::new(&EtlConfig::default())
            .unwrap()
            .process(records, None)
            .unwrap()
            .0
    }

    #[test]
    fn test_load_is_idempotent() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("out").join("plants.db");
        let records = scored();

        let mut loader = SqliteLoader::open(&path)?;
        loader.load(&records, 2)?;
        loader.load(&records, 3)?;
        assert_eq!(loader.count()?, 4);

        // Reopening sees the persisted rows
        drop(loader);
        assert_eq!(SqliteLoader::open(&path)?.count()?, 4);
        Ok(())
    }

    #[test]
    fn test_top_sites_excludes_non_operating() -> Result<()> {
        let mut loader = SqliteLoader::open_in_memory()?;
        loader.load(&scored(), 100)?;

        let top = loader.top_sites(10)?;
        let codes: Vec<&str> = top.iter().map(|t| t.plant_code.as_str()).collect();
        // Same location and zoning, so capacity decides the order
        assert_eq!(codes, vec!["4", "2", "1"]);
        assert_eq!(top[0].city.as_deref(), Some("Oakland"));

        assert_eq!(loader.top_sites(1)?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_capacity_by_region() -> Result<()> {
        let mut loader = SqliteLoader::open_in_memory()?;
        loader.load(&scored(), 100)?;

        // The retired 200 MW plant in San Francisco is left out, which ties
        // both counties at 400 MW
        let regions = loader.capacity_by_region()?;
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].county.as_deref(), Some("Alameda"));
        assert_eq!(regions[0].plant_count, 1);
        assert_eq!(regions[0].total_capacity_mw, 400.0);
        assert_eq!(regions[1].county.as_deref(), Some("San Francisco"));
        assert_eq!(regions[1].plant_count, 2);
        assert_eq!(regions[1].total_capacity_mw, 400.0);
        Ok(())
    }

    #[test]
    fn test_failed_load_rolls_back() -> Result<()> {
        let mut loader = SqliteLoader::open_in_memory()?;
        let records = scored();
        loader.load(&records[..2], 100)?;

        // SQLite stores NaN as NULL, which breaks the NOT NULL latitude
        let mut bad = records[0].clone();
        bad.record.plant_code = "5".to_string();
        bad.record.latitude = f64::NAN;
        let mut batch = records.clone();
        batch.push(bad);

        // Fails in the last page, after earlier pages were written
        assert!(loader.load(&batch, 2).is_err());
        assert_eq!(loader.count()?, 2);
        Ok(())
    }

    #[test]
    fn test_open_existing_does_not_create() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("missing.db");

        assert!(SqliteLoader::open_existing(&path).is_err());
        assert!(!path.exists());

        SqliteLoader::open(&path)?.load(&scored(), 10)?;
        assert_eq!(SqliteLoader::open_existing(&path)?.count()?, 4);
        Ok(())
    }

    #[test]
    fn test_standardization_examples() -> Result<()> {
        let mut loader = SqliteLoader::open_in_memory()?;
        loader.load(&scored(), 100)?;

        let changes = loader.standardization_examples(10)?;
        assert_eq!(
            changes,
            vec![NameChange {
                original: "SF".to_string(),
                standardized: "San Francisco".to_string(),
                match_method: "exact".to_string(),
                occurrences: 2,
            }]
        );
        Ok(())
    }
}
