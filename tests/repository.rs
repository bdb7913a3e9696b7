use assert_matches::assert_matches;

use frog_catalog::domain::{SpeciesDraft, SpeciesFields, SpeciesId, SpeciesKey};
use frog_catalog::error::CatalogError;
use frog_catalog::repository::Repository;

fn fields(name: &str) -> SpeciesFields {
    SpeciesFields {
        name: name.to_string(),
        breeding_season: "Spring".to_string(),
        habitat: "Pond".to_string(),
        diet: "Insects".to_string(),
        adult_size: "9-15 cm".to_string(),
        color_scheme: "Olive green with dark blotches".to_string(),
        profile_notes: "Deep \"jug-o-rum\" call.".to_string(),
    }
}

fn open_temp() -> (Repository, tempfile::TempDir) {
    let temp = tempfile::tempdir().unwrap();
    let path = camino::Utf8PathBuf::from_path_buf(temp.path().join("frogs_toads.db")).unwrap();
    let repo = Repository::open(&path).unwrap();
    (repo, temp)
}

#[test]
fn created_species_round_trip() {
    let (repo, _temp) = open_temp();
    let names = ["Bullfrog", "Spring Peeper", "American Toad"];
    for name in names {
        repo.save_species(&SpeciesDraft::new(fields(name))).unwrap();
    }

    let listed: Vec<String> = repo
        .list_species()
        .unwrap()
        .into_iter()
        .map(|item| item.name)
        .collect();
    assert_eq!(listed, names);

    for name in names {
        let profile = repo.fetch_by_name(name).unwrap().unwrap();
        assert_eq!(profile.fields, fields(name));
    }
}

#[test]
fn list_is_stable_across_calls() {
    let (repo, _temp) = open_temp();
    repo.save_species(&SpeciesDraft::new(fields("Wood Frog"))).unwrap();
    repo.save_species(&SpeciesDraft::new(fields("Cane Toad"))).unwrap();

    assert_eq!(repo.list_species().unwrap(), repo.list_species().unwrap());
}

#[test]
fn reopening_keeps_data() {
    let temp = tempfile::tempdir().unwrap();
    let path = camino::Utf8PathBuf::from_path_buf(temp.path().join("nested/catalog.db")).unwrap();
    {
        let repo = Repository::open(&path).unwrap();
        repo.save_species(&SpeciesDraft::new(fields("Bullfrog"))).unwrap();
    }

    let repo = Repository::open(&path).unwrap();
    repo.initialize().unwrap();
    assert_eq!(repo.list_species().unwrap().len(), 1);
}

#[test]
fn legacy_layout_is_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let path = camino::Utf8PathBuf::from_path_buf(temp.path().join("frogs_toads.db")).unwrap();
    {
        let conn = rusqlite::Connection::open(path.as_std_path()).unwrap();
        conn.execute_batch(
            "CREATE TABLE frogs_toads (id INTEGER NOT NULL, name VARCHAR, breeding_season VARCHAR, \
             habitat VARCHAR, diet VARCHAR, adult_size VARCHAR, color_scheme VARCHAR, \
             profile_notes VARCHAR, PRIMARY KEY (id));
             CREATE TABLE images (id INTEGER NOT NULL, frog_toad_id INTEGER, image_path VARCHAR, \
             PRIMARY KEY (id), FOREIGN KEY(frog_toad_id) REFERENCES frogs_toads (id));
             CREATE TABLE audio_files (id INTEGER NOT NULL, frog_toad_id INTEGER, audio_path VARCHAR, \
             PRIMARY KEY (id), FOREIGN KEY(frog_toad_id) REFERENCES frogs_toads (id));
             CREATE TABLE territory_maps (id INTEGER NOT NULL, frog_toad_id INTEGER, map_path VARCHAR, \
             PRIMARY KEY (id), FOREIGN KEY(frog_toad_id) REFERENCES frogs_toads (id));
             CREATE TABLE states (id INTEGER NOT NULL, state_name VARCHAR, PRIMARY KEY (id));
             CREATE TABLE frog_toad_states (frog_toad_id INTEGER, state_id INTEGER, \
             FOREIGN KEY(frog_toad_id) REFERENCES frogs_toads (id), \
             FOREIGN KEY(state_id) REFERENCES states (id));
             INSERT INTO frogs_toads (id, name) VALUES (1, 'Bullfrog');
             INSERT INTO states (id, state_name) VALUES (1, 'Texas');",
        )
        .unwrap();
    }

    let err = Repository::open(&path).err().unwrap();
    assert_matches!(err, CatalogError::Database(_));

    let conn = rusqlite::Connection::open(path.as_std_path()).unwrap();
    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, 0);
    let states: i64 = conn
        .query_row("SELECT COUNT(*) FROM states", [], |row| row.get(0))
        .unwrap();
    assert_eq!(states, 1);
}

#[test]
fn newer_database_version_is_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let path = camino::Utf8PathBuf::from_path_buf(temp.path().join("frogs_toads.db")).unwrap();
    Repository::open(&path).unwrap();
    {
        let conn = rusqlite::Connection::open(path.as_std_path()).unwrap();
        conn.pragma_update(None, "user_version", 2).unwrap();
    }

    let err = Repository::open(&path).err().unwrap();
    assert_matches!(err, CatalogError::Database(_));
}

#[test]
fn fetch_missing_is_none() {
    let repo = Repository::open_in_memory().unwrap();
    assert!(repo.fetch_by_name("Goliath Frog").unwrap().is_none());
    assert!(repo.fetch_by_id(SpeciesId::new(12)).unwrap().is_none());
}

#[test]
fn fetch_by_id_and_name_agree() {
    let repo = Repository::open_in_memory().unwrap();
    let id = repo.save_species(&SpeciesDraft::new(fields("Bullfrog"))).unwrap();

    let by_id = repo.fetch_species(&SpeciesKey::Id(id)).unwrap().unwrap();
    let by_name = repo.fetch_by_name("Bullfrog").unwrap().unwrap();
    assert_eq!(by_id, by_name);
}

#[test]
fn image_list_is_replaced_not_merged() {
    let repo = Repository::open_in_memory().unwrap();
    let mut draft = SpeciesDraft::new(fields("Bullfrog"));
    draft.image_paths = vec!["images/a.jpg".to_string(), "images/b.jpg".to_string()];
    draft.audio_paths = vec!["audio/call.mp3".to_string()];
    let id = repo.save_species(&draft).unwrap();

    draft.id = Some(id);
    draft.image_paths = vec!["images/c.jpg".to_string()];
    draft.audio_paths = Vec::new();
    repo.save_species(&draft).unwrap();

    let profile = repo.fetch_by_id(id).unwrap().unwrap();
    assert_eq!(profile.image_paths(), vec!["images/c.jpg".to_string()]);
    assert!(profile.audio_clips.is_empty());
}

#[test]
fn unknown_regions_are_dropped() {
    let repo = Repository::open_in_memory().unwrap();
    repo.ensure_regions(&["Texas"]).unwrap();

    let mut draft = SpeciesDraft::new(SpeciesFields {
        name: "Bullfrog".to_string(),
        habitat: "Pond".to_string(),
        diet: "Insects".to_string(),
        ..SpeciesFields::default()
    });
    draft.region_names = vec!["Texas".to_string(), "Ohio".to_string()];
    repo.save_species(&draft).unwrap();

    let profile = repo.fetch_by_name("Bullfrog").unwrap().unwrap();
    assert_eq!(profile.region_names(), vec!["Texas".to_string()]);
    assert_eq!(profile.fields.habitat, "Pond");
    assert_eq!(profile.fields.diet, "Insects");
    assert!(repo.region_by_name("Ohio").unwrap().is_none());
    assert_eq!(repo.list_regions().unwrap().len(), 1);
}

#[test]
fn region_links_are_replaced() {
    let repo = Repository::open_in_memory().unwrap();
    repo.ensure_regions(&["Texas", "Ohio", "Maine"]).unwrap();

    let mut draft = SpeciesDraft::new(fields("Bullfrog"));
    draft.region_names = vec!["Texas".to_string(), "Ohio".to_string()];
    let id = repo.save_species(&draft).unwrap();

    draft.id = Some(id);
    draft.region_names = vec!["Maine".to_string()];
    repo.save_species(&draft).unwrap();

    let profile = repo.fetch_by_id(id).unwrap().unwrap();
    assert_eq!(profile.region_names(), vec!["Maine".to_string()]);
    assert!(repo.species_in_region("Texas").unwrap().is_empty());
}

#[test]
fn territory_map_stays_single() {
    let repo = Repository::open_in_memory().unwrap();
    let mut draft = SpeciesDraft::new(fields("Bullfrog"));
    draft.map_path = Some("maps/first.png".to_string());
    let id = repo.save_species(&draft).unwrap();
    let first_map_id = repo
        .fetch_by_id(id)
        .unwrap()
        .unwrap()
        .territory_map
        .unwrap()
        .id;

    draft.id = Some(id);
    draft.map_path = Some("maps/second.png".to_string());
    repo.save_species(&draft).unwrap();

    let map = repo.fetch_by_id(id).unwrap().unwrap().territory_map.unwrap();
    assert_eq!(map.map_path, "maps/second.png");
    assert_eq!(map.id, first_map_id);
}

#[test]
fn update_without_map_keeps_existing_map() {
    let repo = Repository::open_in_memory().unwrap();
    let mut draft = SpeciesDraft::new(fields("Bullfrog"));
    draft.map_path = Some("maps/range.png".to_string());
    let id = repo.save_species(&draft).unwrap();

    draft.id = Some(id);
    draft.map_path = None;
    draft.fields.diet = "Crayfish".to_string();
    repo.save_species(&draft).unwrap();

    let profile = repo.fetch_by_id(id).unwrap().unwrap();
    assert_eq!(profile.fields.diet, "Crayfish");
    assert_eq!(profile.territory_map.unwrap().map_path, "maps/range.png");
}

#[test]
fn delete_cascades_but_keeps_regions() {
    let repo = Repository::open_in_memory().unwrap();
    repo.ensure_regions(&["Texas"]).unwrap();

    let mut bullfrog = SpeciesDraft::new(fields("Bullfrog"));
    bullfrog.image_paths = vec!["images/bullfrog.jpg".to_string()];
    bullfrog.audio_paths = vec!["audio/bullfrog.mp3".to_string()];
    bullfrog.map_path = Some("maps/bullfrog.png".to_string());
    bullfrog.region_names = vec!["Texas".to_string()];
    let bullfrog_id = repo.save_species(&bullfrog).unwrap();

    let mut toad = SpeciesDraft::new(fields("Texas Toad"));
    toad.region_names = vec!["Texas".to_string()];
    let toad_id = repo.save_species(&toad).unwrap();

    repo.delete_species(bullfrog_id).unwrap();

    assert!(repo.fetch_by_id(bullfrog_id).unwrap().is_none());
    assert!(repo.region_by_name("Texas").unwrap().is_some());
    let remaining = repo.species_in_region("Texas").unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, toad_id);

    // A new species must not inherit rows left behind by the deleted one.
    let fresh = repo.save_species(&SpeciesDraft::new(fields("Bullfrog"))).unwrap();
    let profile = repo.fetch_by_id(fresh).unwrap().unwrap();
    assert!(profile.images.is_empty());
    assert!(profile.audio_clips.is_empty());
    assert!(profile.territory_map.is_none());
}

#[test]
fn delete_unknown_species_fails() {
    let repo = Repository::open_in_memory().unwrap();
    let err = repo.delete_species(SpeciesId::new(5)).unwrap_err();
    assert_matches!(err, CatalogError::SpeciesNotFound(_));
}

#[test]
fn species_in_region_lists_members() {
    let repo = Repository::open_in_memory().unwrap();
    repo.ensure_regions(&["Florida", "Georgia"]).unwrap();

    let mut tree_frog = SpeciesDraft::new(fields("Green Treefrog"));
    tree_frog.region_names = vec!["Florida".to_string(), "Georgia".to_string()];
    repo.save_species(&tree_frog).unwrap();

    let mut cane_toad = SpeciesDraft::new(fields("Cane Toad"));
    cane_toad.region_names = vec!["Florida".to_string()];
    repo.save_species(&cane_toad).unwrap();

    let names: Vec<String> = repo
        .species_in_region("Florida")
        .unwrap()
        .into_iter()
        .map(|item| item.name)
        .collect();
    assert_eq!(names, vec!["Green Treefrog", "Cane Toad"]);
    assert!(repo.species_in_region("Nowhere").unwrap().is_empty());
}

#[test]
fn ensure_regions_is_idempotent() {
    let repo = Repository::open_in_memory().unwrap();
    assert_eq!(repo.ensure_regions(&["Ohio", "Texas", " "]).unwrap(), 2);
    assert_eq!(repo.ensure_regions(&["Ohio", "Texas", "Utah"]).unwrap(), 1);

    let names: Vec<String> = repo
        .list_regions()
        .unwrap()
        .into_iter()
        .map(|region| region.name)
        .collect();
    assert_eq!(names, vec!["Ohio", "Texas", "Utah"]);
}
