use std::collections::BTreeSet;
use std::fs;

use camino::Utf8Path;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info, warn};

use crate::domain::{
    AudioClip, Image, Region, RegionId, SpeciesDraft, SpeciesFields, SpeciesId, SpeciesKey,
    SpeciesProfile, SpeciesSummary, TerritoryMap,
};
use crate::error::CatalogError;
use crate::schema;

const SPECIES_COLUMNS: &str =
    "id, name, breeding_season, habitat, diet, adult_size, color_scheme, profile_notes";

/// Handle over the catalog database. Every component that touches the store
/// receives one of these explicitly.
pub struct Repository {
    conn: Connection,
    schema_version: u32,
}

impl Repository {
    pub fn open(path: &Utf8Path) -> Result<Self, CatalogError> {
        Self::open_versioned(path, schema::SCHEMA_VERSION)
    }

    /// Opens `path`, refusing a database whose layout or stamped version does
    /// not match `schema_version`.
    pub fn open_versioned(path: &Utf8Path, schema_version: u32) -> Result<Self, CatalogError> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) {
            fs::create_dir_all(parent.as_std_path())
                .map_err(|err| CatalogError::Filesystem(format!("create {parent}: {err}")))?;
        }
        let conn = Connection::open(path.as_std_path())?;
        let repo = Self {
            conn,
            schema_version,
        };
        repo.initialize()?;
        info!(db = %path, schema_version, "catalog store opened");
        Ok(repo)
    }

    pub fn open_in_memory() -> Result<Self, CatalogError> {
        let repo = Self {
            conn: Connection::open_in_memory()?,
            schema_version: schema::SCHEMA_VERSION,
        };
        repo.initialize()?;
        Ok(repo)
    }

    pub fn initialize(&self) -> Result<(), CatalogError> {
        schema::ensure_schema(&self.conn, self.schema_version)
    }

    pub fn list_species(&self) -> Result<Vec<SpeciesSummary>, CatalogError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM frogs_toads ORDER BY id")?;
        let rows = stmt
            .query_map([], summary_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn fetch_species(&self, key: &SpeciesKey) -> Result<Option<SpeciesProfile>, CatalogError> {
        let row = match key {
            SpeciesKey::Id(id) => self
                .conn
                .query_row(
                    &format!("SELECT {SPECIES_COLUMNS} FROM frogs_toads WHERE id = ?1"),
                    params![id.get()],
                    species_from_row,
                )
                .optional()?,
            // Names are not unique; the oldest entry wins.
            SpeciesKey::Name(name) => self
                .conn
                .query_row(
                    &format!(
                        "SELECT {SPECIES_COLUMNS} FROM frogs_toads WHERE name = ?1 ORDER BY id LIMIT 1"
                    ),
                    params![name],
                    species_from_row,
                )
                .optional()?,
        };

        let Some((id, fields)) = row else {
            debug!(%key, "species lookup missed");
            return Ok(None);
        };
        self.load_profile(id, fields).map(Some)
    }

    pub fn fetch_by_name(&self, name: &str) -> Result<Option<SpeciesProfile>, CatalogError> {
        self.fetch_species(&SpeciesKey::Name(name.to_string()))
    }

    pub fn fetch_by_id(&self, id: SpeciesId) -> Result<Option<SpeciesProfile>, CatalogError> {
        self.fetch_species(&SpeciesKey::Id(id))
    }

    /// Creates or updates a species together with its owned rows and region
    /// links in a single transaction.
    pub fn save_species(&self, draft: &SpeciesDraft) -> Result<SpeciesId, CatalogError> {
        if draft.fields.name.trim().is_empty() {
            return Err(CatalogError::MissingField("name"));
        }

        let tx = self.conn.unchecked_transaction()?;
        let id = match draft.id {
            Some(id) => {
                update_species_row(&tx, id, &draft.fields)?;
                id
            }
            None => insert_species_row(&tx, &draft.fields)?,
        };

        replace_images(&tx, id, &draft.image_paths)?;
        replace_audio(&tx, id, &draft.audio_paths)?;
        if let Some(map_path) = draft.map_path.as_deref().filter(|p| !p.trim().is_empty()) {
            upsert_map(&tx, id, map_path)?;
        }
        let dropped = replace_regions(&tx, id, &draft.region_names)?;
        tx.commit()?;

        if !dropped.is_empty() {
            warn!(species = %draft.fields.name, ?dropped, "unknown region names dropped");
        }
        info!(
            species = %draft.fields.name,
            %id,
            created = draft.id.is_none(),
            images = draft.image_paths.len(),
            audio = draft.audio_paths.len(),
            "species saved"
        );
        Ok(id)
    }

    /// Removes a species; images, audio, map and region links cascade.
    pub fn delete_species(&self, id: SpeciesId) -> Result<(), CatalogError> {
        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute("DELETE FROM frogs_toads WHERE id = ?1", params![id.get()])?;
        if removed == 0 {
            return Err(CatalogError::SpeciesNotFound(format!("#{id}")));
        }
        tx.commit()?;
        info!(%id, "species deleted");
        Ok(())
    }

    pub fn species_in_region(&self, region: &str) -> Result<Vec<SpeciesSummary>, CatalogError> {
        let mut stmt = self.conn.prepare(
            "SELECT f.id, f.name FROM frogs_toads f \
             JOIN frog_toad_states fs ON fs.frog_toad_id = f.id \
             JOIN states s ON s.id = fs.state_id \
             WHERE s.state_name = ?1 ORDER BY f.id",
        )?;
        let rows = stmt
            .query_map(params![region], summary_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn list_regions(&self) -> Result<Vec<Region>, CatalogError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, state_name FROM states ORDER BY state_name")?;
        let rows = stmt
            .query_map([], region_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn region_by_name(&self, name: &str) -> Result<Option<Region>, CatalogError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, state_name FROM states WHERE state_name = ?1",
                params![name],
                region_from_row,
            )
            .optional()?)
    }

    /// Inserts every missing region name. Returns how many were added.
    pub fn ensure_regions<S: AsRef<str>>(&self, names: &[S]) -> Result<usize, CatalogError> {
        let tx = self.conn.unchecked_transaction()?;
        let mut added = 0;
        {
            let mut stmt = tx.prepare_cached("INSERT OR IGNORE INTO states (state_name) VALUES (?1)")?;
            for name in names {
                let name = name.as_ref().trim();
                if name.is_empty() {
                    continue;
                }
                added += stmt.execute(params![name])?;
            }
        }
        tx.commit()?;
        if added > 0 {
            debug!(added, "regions seeded");
        }
        Ok(added)
    }

    fn load_profile(
        &self,
        id: SpeciesId,
        fields: SpeciesFields,
    ) -> Result<SpeciesProfile, CatalogError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, frog_toad_id, image_path FROM images WHERE frog_toad_id = ?1 ORDER BY id")?;
        let images = stmt
            .query_map(params![id.get()], |row| {
                Ok(Image {
                    id: row.get(0)?,
                    species_id: SpeciesId::new(row.get(1)?),
                    image_path: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT id, frog_toad_id, audio_path FROM audio_files WHERE frog_toad_id = ?1 ORDER BY id",
        )?;
        let audio_clips = stmt
            .query_map(params![id.get()], |row| {
                Ok(AudioClip {
                    id: row.get(0)?,
                    species_id: SpeciesId::new(row.get(1)?),
                    audio_path: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let territory_map = self
            .conn
            .query_row(
                "SELECT id, frog_toad_id, map_path FROM territory_maps WHERE frog_toad_id = ?1",
                params![id.get()],
                |row| {
                    Ok(TerritoryMap {
                        id: row.get(0)?,
                        species_id: SpeciesId::new(row.get(1)?),
                        map_path: row.get(2)?,
                    })
                },
            )
            .optional()?;

        let mut stmt = self.conn.prepare(
            "SELECT s.id, s.state_name FROM states s \
             JOIN frog_toad_states fs ON fs.state_id = s.id \
             WHERE fs.frog_toad_id = ?1 ORDER BY s.state_name",
        )?;
        let regions = stmt
            .query_map(params![id.get()], region_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SpeciesProfile {
            id,
            fields,
            images,
            audio_clips,
            territory_map,
            regions,
        })
    }
}

fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<SpeciesSummary> {
    Ok(SpeciesSummary {
        id: SpeciesId::new(row.get(0)?),
        name: row.get(1)?,
    })
}

fn region_from_row(row: &Row<'_>) -> rusqlite::Result<Region> {
    Ok(Region {
        id: RegionId::new(row.get(0)?),
        name: row.get(1)?,
    })
}

fn species_from_row(row: &Row<'_>) -> rusqlite::Result<(SpeciesId, SpeciesFields)> {
    Ok((
        SpeciesId::new(row.get(0)?),
        SpeciesFields {
            name: row.get(1)?,
            breeding_season: row.get(2)?,
            habitat: row.get(3)?,
            diet: row.get(4)?,
            adult_size: row.get(5)?,
            color_scheme: row.get(6)?,
            profile_notes: row.get(7)?,
        },
    ))
}

fn insert_species_row(conn: &Connection, fields: &SpeciesFields) -> Result<SpeciesId, CatalogError> {
    conn.execute(
        "INSERT INTO frogs_toads (name, breeding_season, habitat, diet, adult_size, color_scheme, profile_notes) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            fields.name,
            fields.breeding_season,
            fields.habitat,
            fields.diet,
            fields.adult_size,
            fields.color_scheme,
            fields.profile_notes,
        ],
    )?;
    Ok(SpeciesId::new(conn.last_insert_rowid()))
}

fn update_species_row(
    conn: &Connection,
    id: SpeciesId,
    fields: &SpeciesFields,
) -> Result<(), CatalogError> {
    let updated = conn.execute(
        "UPDATE frogs_toads SET name = ?2, breeding_season = ?3, habitat = ?4, diet = ?5, \
         adult_size = ?6, color_scheme = ?7, profile_notes = ?8 WHERE id = ?1",
        params![
            id.get(),
            fields.name,
            fields.breeding_season,
            fields.habitat,
            fields.diet,
            fields.adult_size,
            fields.color_scheme,
            fields.profile_notes,
        ],
    )?;
    if updated == 0 {
        return Err(CatalogError::SpeciesNotFound(format!("#{id}")));
    }
    Ok(())
}

fn replace_images(conn: &Connection, id: SpeciesId, paths: &[String]) -> Result<(), CatalogError> {
    conn.execute("DELETE FROM images WHERE frog_toad_id = ?1", params![id.get()])?;
    let mut stmt =
        conn.prepare_cached("INSERT INTO images (frog_toad_id, image_path) VALUES (?1, ?2)")?;
    for path in paths {
        stmt.execute(params![id.get(), path])?;
    }
    Ok(())
}

fn replace_audio(conn: &Connection, id: SpeciesId, paths: &[String]) -> Result<(), CatalogError> {
    conn.execute("DELETE FROM audio_files WHERE frog_toad_id = ?1", params![id.get()])?;
    let mut stmt =
        conn.prepare_cached("INSERT INTO audio_files (frog_toad_id, audio_path) VALUES (?1, ?2)")?;
    for path in paths {
        stmt.execute(params![id.get(), path])?;
    }
    Ok(())
}

fn upsert_map(conn: &Connection, id: SpeciesId, path: &str) -> Result<(), CatalogError> {
    conn.execute(
        "INSERT INTO territory_maps (frog_toad_id, map_path) VALUES (?1, ?2) \
         ON CONFLICT (frog_toad_id) DO UPDATE SET map_path = excluded.map_path",
        params![id.get(), path],
    )?;
    Ok(())
}

/// Rewrites the region links of `id`. Names without a region row are
/// returned instead of being created.
fn replace_regions(
    conn: &Connection,
    id: SpeciesId,
    names: &[String],
) -> Result<Vec<String>, CatalogError> {
    let mut resolved = BTreeSet::new();
    let mut dropped = Vec::new();
    {
        let mut lookup = conn.prepare_cached("SELECT id FROM states WHERE state_name = ?1")?;
        for name in names {
            let region: Option<i64> = lookup
                .query_row(params![name.trim()], |row| row.get(0))
                .optional()?;
            match region {
                Some(region_id) => {
                    resolved.insert(region_id);
                }
                None => dropped.push(name.clone()),
            }
        }
    }

    conn.execute(
        "DELETE FROM frog_toad_states WHERE frog_toad_id = ?1",
        params![id.get()],
    )?;
    let mut stmt = conn
        .prepare_cached("INSERT INTO frog_toad_states (frog_toad_id, state_id) VALUES (?1, ?2)")?;
    for region_id in resolved {
        stmt.execute(params![id.get(), region_id])?;
    }
    Ok(dropped)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn bullfrog() -> SpeciesDraft {
        SpeciesDraft::new(SpeciesFields {
            name: "Bullfrog".to_string(),
            habitat: "Pond".to_string(),
            diet: "Insects".to_string(),
            ..SpeciesFields::default()
        })
    }

    #[test]
    fn save_requires_name() {
        let repo = Repository::open_in_memory().unwrap();
        let err = repo
            .save_species(&SpeciesDraft::new(SpeciesFields::named("  ")))
            .unwrap_err();
        assert_matches!(err, CatalogError::MissingField("name"));
        assert!(repo.list_species().unwrap().is_empty());
    }

    #[test]
    fn failed_update_rolls_back() {
        let repo = Repository::open_in_memory().unwrap();
        let mut draft = bullfrog();
        draft.id = Some(SpeciesId::new(99));
        draft.image_paths = vec!["data/images/a.jpg".to_string()];

        let err = repo.save_species(&draft).unwrap_err();
        assert_matches!(err, CatalogError::SpeciesNotFound(_));

        let images: i64 = repo
            .conn
            .query_row("SELECT COUNT(*) FROM images", [], |row| row.get(0))
            .unwrap();
        assert_eq!(images, 0);
    }

    #[test]
    fn failure_after_partial_writes_rolls_back() {
        let repo = Repository::open_in_memory().unwrap();
        repo.ensure_regions(&["Texas"]).unwrap();
        repo.conn
            .execute_batch(
                "CREATE TRIGGER reject_maps BEFORE INSERT ON territory_maps \
                 BEGIN SELECT RAISE(ABORT, 'map rejected'); END;",
            )
            .unwrap();

        let mut draft = bullfrog();
        draft.image_paths = vec!["images/a.jpg".to_string(), "images/b.jpg".to_string()];
        draft.audio_paths = vec!["audio/call.mp3".to_string()];
        draft.map_path = Some("maps/range.png".to_string());
        draft.region_names = vec!["Texas".to_string()];

        let err = repo.save_species(&draft).unwrap_err();
        assert_matches!(err, CatalogError::ConstraintViolation(_));

        for table in ["frogs_toads", "images", "audio_files", "frog_toad_states"] {
            let rows: i64 = repo
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
                .unwrap();
            assert_eq!(rows, 0, "{table} kept rows from a failed save");
        }
    }

    #[test]
    fn orphan_rows_are_rejected() {
        let repo = Repository::open_in_memory().unwrap();
        let err = replace_images(&repo.conn, SpeciesId::new(42), &["x.png".to_string()])
            .unwrap_err();
        assert_matches!(err, CatalogError::ConstraintViolation(_));
    }

    #[test]
    fn duplicate_region_names_link_once() {
        let repo = Repository::open_in_memory().unwrap();
        repo.ensure_regions(&["Texas"]).unwrap();
        let mut draft = bullfrog();
        draft.region_names = vec!["Texas".to_string(), "Texas".to_string()];
        let id = repo.save_species(&draft).unwrap();

        let profile = repo.fetch_by_id(id).unwrap().unwrap();
        assert_eq!(profile.region_names(), vec!["Texas".to_string()]);
    }
}
