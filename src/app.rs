use camino::Utf8Path;
use serde::Serialize;
use tracing::info;

use crate::assets::AssetStore;
use crate::config::ResolvedConfig;
use crate::domain::{
    AssetCategory, Region, SpeciesDraft, SpeciesId, SpeciesKey, SpeciesProfile, SpeciesSummary,
};
use crate::error::CatalogError;
use crate::repository::Repository;

#[derive(Debug, Clone, Serialize)]
pub struct ListResult {
    pub species: Vec<SpeciesSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveResult {
    pub id: SpeciesId,
    pub name: String,
    pub created: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteResult {
    pub id: SpeciesId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegionResult {
    pub region: String,
    pub species: Vec<SpeciesSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegionsResult {
    pub regions: Vec<Region>,
    pub added: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssetResult {
    pub category: AssetCategory,
    pub source: String,
    pub stored_path: String,
}

/// The only surface front ends talk to: a store handle plus the managed
/// asset directory.
pub struct Catalog {
    repo: Repository,
    assets: AssetStore,
}

impl Catalog {
    pub fn new(repo: Repository, assets: AssetStore) -> Self {
        Self { repo, assets }
    }

    /// Opens the configured database at the configured schema version,
    /// creates the schema if needed and seeds the configured region names.
    pub fn open(config: &ResolvedConfig) -> Result<Self, CatalogError> {
        let repo = Repository::open_versioned(&config.database, config.schema_version)?;
        let added = repo.ensure_regions(&config.regions)?;
        info!(
            data_root = %config.data_root,
            regions_added = added,
            "catalog ready"
        );
        Ok(Self::new(repo, AssetStore::new(config.data_root.clone())))
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    pub fn list(&self) -> Result<ListResult, CatalogError> {
        Ok(ListResult {
            species: self.repo.list_species()?,
        })
    }

    pub fn profile(&self, key: &SpeciesKey) -> Result<Option<SpeciesProfile>, CatalogError> {
        self.repo.fetch_species(key)
    }

    pub fn save(&self, draft: &SpeciesDraft) -> Result<SaveResult, CatalogError> {
        let id = self.repo.save_species(draft)?;
        Ok(SaveResult {
            id,
            name: draft.fields.name.clone(),
            created: draft.id.is_none(),
        })
    }

    /// Asset files stay on disk; only rows are removed.
    pub fn delete(&self, key: &SpeciesKey) -> Result<DeleteResult, CatalogError> {
        let profile = self
            .repo
            .fetch_species(key)?
            .ok_or_else(|| CatalogError::SpeciesNotFound(key.to_string()))?;
        self.repo.delete_species(profile.id)?;
        Ok(DeleteResult {
            id: profile.id,
            name: profile.fields.name,
        })
    }

    pub fn species_in_region(&self, region: &str) -> Result<RegionResult, CatalogError> {
        Ok(RegionResult {
            region: region.to_string(),
            species: self.repo.species_in_region(region)?,
        })
    }

    pub fn regions(&self) -> Result<Vec<Region>, CatalogError> {
        self.repo.list_regions()
    }

    pub fn add_regions<S: AsRef<str>>(&self, names: &[S]) -> Result<RegionsResult, CatalogError> {
        let added = self.repo.ensure_regions(names)?;
        Ok(RegionsResult {
            regions: self.repo.list_regions()?,
            added,
        })
    }

    pub fn store_asset(
        &self,
        source: &Utf8Path,
        category: AssetCategory,
    ) -> Result<AssetResult, CatalogError> {
        let stored = self.assets.store(source, category)?;
        Ok(AssetResult {
            category,
            source: source.to_string(),
            stored_path: stored.into_string(),
        })
    }
}
