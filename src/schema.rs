//! SQLite table definitions for the species catalog.

use rusqlite::Connection;
use tracing::debug;

use crate::error::CatalogError;

pub const TABLE_SPECIES: &str = "frogs_toads";
pub const TABLE_IMAGES: &str = "images";
pub const TABLE_AUDIO: &str = "audio_files";
pub const TABLE_MAPS: &str = "territory_maps";
pub const TABLE_REGIONS: &str = "states";
pub const TABLE_SPECIES_REGIONS: &str = "frog_toad_states";

pub const SCHEMA_VERSION: u32 = 1;

pub struct Table {
    pub name: &'static str,
    pub schema: &'static str,
    pub columns: &'static [&'static str],
    pub not_null: &'static [&'static str],
    pub unique: &'static [&'static [&'static str]],
}

const SPECIES_TABLE: Table = Table {
    name: TABLE_SPECIES,
    schema: "CREATE TABLE IF NOT EXISTS frogs_toads (id INTEGER PRIMARY KEY, name TEXT NOT NULL, breeding_season TEXT NOT NULL DEFAULT '', habitat TEXT NOT NULL DEFAULT '', diet TEXT NOT NULL DEFAULT '', adult_size TEXT NOT NULL DEFAULT '', color_scheme TEXT NOT NULL DEFAULT '', profile_notes TEXT NOT NULL DEFAULT '');",
    columns: &[
        "id",
        "name",
        "breeding_season",
        "habitat",
        "diet",
        "adult_size",
        "color_scheme",
        "profile_notes",
    ],
    not_null: &[
        "name",
        "breeding_season",
        "habitat",
        "diet",
        "adult_size",
        "color_scheme",
        "profile_notes",
    ],
    unique: &[],
};

const IMAGES_TABLE: Table = Table {
    name: TABLE_IMAGES,
    schema: "CREATE TABLE IF NOT EXISTS images (id INTEGER PRIMARY KEY, frog_toad_id INTEGER NOT NULL, image_path TEXT NOT NULL, CONSTRAINT frog_toad_id FOREIGN KEY (frog_toad_id) REFERENCES frogs_toads (id) ON DELETE CASCADE);",
    columns: &["id", "frog_toad_id", "image_path"],
    not_null: &["frog_toad_id", "image_path"],
    unique: &[],
};

const AUDIO_TABLE: Table = Table {
    name: TABLE_AUDIO,
    schema: "CREATE TABLE IF NOT EXISTS audio_files (id INTEGER PRIMARY KEY, frog_toad_id INTEGER NOT NULL, audio_path TEXT NOT NULL, CONSTRAINT frog_toad_id FOREIGN KEY (frog_toad_id) REFERENCES frogs_toads (id) ON DELETE CASCADE);",
    columns: &["id", "frog_toad_id", "audio_path"],
    not_null: &["frog_toad_id", "audio_path"],
    unique: &[],
};

// UNIQUE on frog_toad_id keeps the map relation one-to-one.
const MAPS_TABLE: Table = Table {
    name: TABLE_MAPS,
    schema: "CREATE TABLE IF NOT EXISTS territory_maps (id INTEGER PRIMARY KEY, frog_toad_id INTEGER NOT NULL UNIQUE, map_path TEXT NOT NULL, CONSTRAINT frog_toad_id FOREIGN KEY (frog_toad_id) REFERENCES frogs_toads (id) ON DELETE CASCADE);",
    columns: &["id", "frog_toad_id", "map_path"],
    not_null: &["frog_toad_id", "map_path"],
    unique: &[&["frog_toad_id"]],
};

const REGIONS_TABLE: Table = Table {
    name: TABLE_REGIONS,
    schema: "CREATE TABLE IF NOT EXISTS states (id INTEGER PRIMARY KEY, state_name TEXT NOT NULL UNIQUE);",
    columns: &["id", "state_name"],
    not_null: &["state_name"],
    unique: &[&["state_name"]],
};

const SPECIES_REGIONS_TABLE: Table = Table {
    name: TABLE_SPECIES_REGIONS,
    schema: "CREATE TABLE IF NOT EXISTS frog_toad_states (frog_toad_id INTEGER NOT NULL, state_id INTEGER NOT NULL, PRIMARY KEY (frog_toad_id, state_id), CONSTRAINT frog_toad_id FOREIGN KEY (frog_toad_id) REFERENCES frogs_toads (id) ON DELETE CASCADE, CONSTRAINT state_id FOREIGN KEY (state_id) REFERENCES states (id) ON DELETE CASCADE);",
    columns: &["frog_toad_id", "state_id"],
    not_null: &["frog_toad_id", "state_id"],
    unique: &[&["frog_toad_id", "state_id"]],
};

pub const TABLES: &[Table] = &[
    SPECIES_TABLE,
    IMAGES_TABLE,
    AUDIO_TABLE,
    MAPS_TABLE,
    REGIONS_TABLE,
    SPECIES_REGIONS_TABLE,
];

/// Creates every missing table. Safe to call on every startup.
///
/// `version` is the layout the caller expects. A new database is stamped
/// with it; an existing one must already carry it.
pub fn ensure_schema(conn: &Connection, version: u32) -> Result<(), CatalogError> {
    if version != SCHEMA_VERSION {
        return Err(CatalogError::Database(format!(
            "unsupported schema version {version}, this build supports {SCHEMA_VERSION}"
        )));
    }
    let stored: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if stored != 0 && stored != version {
        return Err(CatalogError::Database(format!(
            "database schema version is {stored}, expected {version}"
        )));
    }

    conn.pragma_update(None, "foreign_keys", true)?;
    for table in TABLES {
        conn.execute(table.schema, [])?;
        debug!(table = table.name, "table ready");
    }
    validate_schema(conn)?;

    if stored == 0 {
        conn.pragma_update(None, "user_version", version)?;
    }
    Ok(())
}

fn validate_schema(conn: &Connection) -> Result<(), CatalogError> {
    for table in TABLES {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", table.name))?;
        let info: Vec<(String, bool)> = stmt
            .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, bool>(3)?)))?
            .collect::<Result<_, _>>()?;

        let columns: Vec<&str> = info.iter().map(|(name, _)| name.as_str()).collect();
        if columns != table.columns {
            return Err(CatalogError::Database(format!(
                "schema validation failed for {} table, found {:?}",
                table.name, columns
            )));
        }

        for column in table.not_null {
            let enforced = info
                .iter()
                .any(|(name, not_null)| name == column && *not_null);
            if !enforced {
                return Err(CatalogError::Database(format!(
                    "schema validation failed for {} table, {column} allows NULL",
                    table.name
                )));
            }
        }

        let unique_sets = unique_column_sets(conn, table.name)?;
        for expected in table.unique {
            if !unique_sets.iter().any(|set| set == expected) {
                return Err(CatalogError::Database(format!(
                    "schema validation failed for {} table, missing UNIQUE({})",
                    table.name,
                    expected.join(", ")
                )));
            }
        }
    }
    Ok(())
}

/// Column lists of every unique index on `table`, in index order.
fn unique_column_sets(conn: &Connection, table: &str) -> Result<Vec<Vec<String>>, CatalogError> {
    let mut stmt = conn.prepare(&format!("PRAGMA index_list({table});"))?;
    let indexes: Vec<(String, bool)> = stmt
        .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, bool>(2)?)))?
        .collect::<Result<_, _>>()?;

    let mut sets = Vec::new();
    for (index, unique) in indexes {
        if !unique {
            continue;
        }
        let mut stmt = conn.prepare(&format!("PRAGMA index_info(\"{index}\");"))?;
        let columns: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(2))?
            .collect::<Result<_, _>>()?;
        sets.push(columns);
    }
    Ok(sets)
}
