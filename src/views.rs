//! Widget-free view models. Any front end, or a test, drives these the way a
//! window would: load, select, edit, save.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;

use crate::app::{Catalog, SaveResult};
use crate::domain::{
    AssetCategory, Region, SpeciesDraft, SpeciesFields, SpeciesId, SpeciesKey, SpeciesProfile,
    SpeciesSummary,
};
use crate::error::CatalogError;

/// Receiver of "user selected region R" from whatever draws the map.
pub trait RegionSelection {
    fn region_selected(&mut self, region: &str) -> Result<(), CatalogError>;
}

#[derive(Debug, Clone, Default)]
pub struct SpeciesListView {
    items: Vec<SpeciesSummary>,
    selected: Option<usize>,
}

impl SpeciesListView {
    pub fn load(catalog: &Catalog) -> Result<Self, CatalogError> {
        let mut view = Self::default();
        view.reload(catalog)?;
        Ok(view)
    }

    /// Refreshes the list, keeping the selection on the same species if it
    /// still exists.
    pub fn reload(&mut self, catalog: &Catalog) -> Result<(), CatalogError> {
        let previous = self.selected_item().map(|item| item.id);
        self.items = catalog.list()?.species;
        let kept = previous.and_then(|id| self.items.iter().position(|item| item.id == id));
        self.selected = kept.or_else(|| (!self.items.is_empty()).then_some(0));
        Ok(())
    }

    pub fn items(&self) -> &[SpeciesSummary] {
        &self.items
    }

    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.name.as_str()).collect()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_item(&self) -> Option<&SpeciesSummary> {
        self.selected.and_then(|index| self.items.get(index))
    }

    pub fn select(&mut self, index: usize) {
        if index < self.items.len() {
            self.selected = Some(index);
        }
    }

    pub fn select_next(&mut self) {
        if let Some(index) = self.selected {
            self.select(index + 1);
        }
    }

    pub fn select_previous(&mut self) {
        if let Some(index) = self.selected {
            self.select(index.saturating_sub(1));
        }
    }
}

/// Read-only rendering of one profile.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    profile: SpeciesProfile,
}

impl ProfileView {
    pub fn load(catalog: &Catalog, key: &SpeciesKey) -> Result<Option<Self>, CatalogError> {
        Ok(catalog.profile(key)?.map(Self::new))
    }

    pub fn new(profile: SpeciesProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &SpeciesProfile {
        &self.profile
    }

    pub fn title(&self) -> String {
        format!("{} - Profile", self.profile.name())
    }

    pub fn field_lines(&self) -> Vec<(&'static str, &str)> {
        let fields = &self.profile.fields;
        vec![
            ("Breeding Season", fields.breeding_season.as_str()),
            ("Habitat", fields.habitat.as_str()),
            ("Diet", fields.diet.as_str()),
            ("Adult Size", fields.adult_size.as_str()),
            ("Color Scheme", fields.color_scheme.as_str()),
            ("Notes", fields.profile_notes.as_str()),
        ]
    }

    pub fn primary_image(&self) -> Option<&str> {
        self.profile
            .images
            .first()
            .map(|image| image.image_path.as_str())
    }

    pub fn primary_call(&self) -> Option<&str> {
        self.profile
            .audio_clips
            .first()
            .map(|clip| clip.audio_path.as_str())
    }

    pub fn map_path(&self) -> Option<&str> {
        self.profile
            .territory_map
            .as_ref()
            .map(|map| map.map_path.as_str())
    }

    pub fn native_to(&self) -> String {
        format!("Native to: {}", self.profile.region_names().join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionCheckbox {
    pub name: String,
    pub checked: bool,
}

/// Add/edit form. Attached files are copied into the asset store as soon as
/// they are picked; rows are only written by [`EditForm::save`].
pub struct EditForm<'a> {
    catalog: &'a Catalog,
    id: Option<SpeciesId>,
    fields: SpeciesFields,
    images: Vec<String>,
    audio: Vec<String>,
    map_path: Option<String>,
    regions: Vec<RegionCheckbox>,
}

impl<'a> EditForm<'a> {
    pub fn blank(catalog: &'a Catalog) -> Result<Self, CatalogError> {
        Ok(Self {
            catalog,
            id: None,
            fields: SpeciesFields::default(),
            images: Vec::new(),
            audio: Vec::new(),
            map_path: None,
            regions: checkboxes(catalog.regions()?, &[]),
        })
    }

    pub fn edit(catalog: &'a Catalog, profile: &SpeciesProfile) -> Result<Self, CatalogError> {
        let draft = SpeciesDraft::from_profile(profile);
        Ok(Self {
            catalog,
            id: draft.id,
            fields: draft.fields,
            images: draft.image_paths,
            audio: draft.audio_paths,
            map_path: draft.map_path,
            regions: checkboxes(catalog.regions()?, &draft.region_names),
        })
    }

    pub fn title(&self) -> &'static str {
        if self.id.is_some() {
            "Edit Profile"
        } else {
            "Add New Species"
        }
    }

    pub fn id(&self) -> Option<SpeciesId> {
        self.id
    }

    pub fn fields(&self) -> &SpeciesFields {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut SpeciesFields {
        &mut self.fields
    }

    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn audio(&self) -> &[String] {
        &self.audio
    }

    pub fn map_path(&self) -> Option<&str> {
        self.map_path.as_deref()
    }

    pub fn regions(&self) -> &[RegionCheckbox] {
        &self.regions
    }

    /// Copies `source` into the asset store and appends the stored path.
    pub fn attach_image(&mut self, source: &Utf8Path) -> Result<Utf8PathBuf, CatalogError> {
        let stored = self.catalog.assets().store(source, AssetCategory::Images)?;
        self.images.push(stored.to_string());
        Ok(stored)
    }

    pub fn attach_audio(&mut self, source: &Utf8Path) -> Result<Utf8PathBuf, CatalogError> {
        let stored = self.catalog.assets().store(source, AssetCategory::Audio)?;
        self.audio.push(stored.to_string());
        Ok(stored)
    }

    /// Replaces the map; a species has at most one.
    pub fn attach_map(&mut self, source: &Utf8Path) -> Result<Utf8PathBuf, CatalogError> {
        let stored = self.catalog.assets().store(source, AssetCategory::Maps)?;
        self.map_path = Some(stored.to_string());
        Ok(stored)
    }

    pub fn detach_image(&mut self, index: usize) -> Option<String> {
        (index < self.images.len()).then(|| self.images.remove(index))
    }

    pub fn detach_audio(&mut self, index: usize) -> Option<String> {
        (index < self.audio.len()).then(|| self.audio.remove(index))
    }

    pub fn clear_images(&mut self) {
        self.images.clear();
    }

    pub fn clear_audio(&mut self) {
        self.audio.clear();
    }

    /// Returns false when no checkbox carries `name`.
    pub fn set_region(&mut self, name: &str, checked: bool) -> bool {
        match self.regions.iter_mut().find(|cb| cb.name == name.trim()) {
            Some(checkbox) => {
                checkbox.checked = checked;
                true
            }
            None => false,
        }
    }

    pub fn checked_regions(&self) -> Vec<String> {
        self.regions
            .iter()
            .filter(|cb| cb.checked)
            .map(|cb| cb.name.clone())
            .collect()
    }

    pub fn to_draft(&self) -> SpeciesDraft {
        SpeciesDraft {
            id: self.id,
            fields: self.fields.clone(),
            image_paths: self.images.clone(),
            audio_paths: self.audio.clone(),
            map_path: self.map_path.clone(),
            region_names: self.checked_regions(),
        }
    }

    pub fn save(self) -> Result<SaveResult, CatalogError> {
        self.catalog.save(&self.to_draft())
    }
}

fn checkboxes(regions: Vec<Region>, checked: &[String]) -> Vec<RegionCheckbox> {
    regions
        .into_iter()
        .map(|region| RegionCheckbox {
            checked: checked.contains(&region.name),
            name: region.name,
        })
        .collect()
}

/// Region picker that filters the species list by the selected region.
pub struct MapView<'a> {
    catalog: &'a Catalog,
    regions: Vec<Region>,
    selected: Option<String>,
    species: Vec<SpeciesSummary>,
}

impl<'a> MapView<'a> {
    pub fn new(catalog: &'a Catalog) -> Result<Self, CatalogError> {
        Ok(Self {
            catalog,
            regions: catalog.regions()?,
            selected: None,
            species: Vec::new(),
        })
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn selected_region(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn species(&self) -> &[SpeciesSummary] {
        &self.species
    }

    pub fn species_names(&self) -> Vec<&str> {
        self.species.iter().map(|item| item.name.as_str()).collect()
    }
}

impl RegionSelection for MapView<'_> {
    fn region_selected(&mut self, region: &str) -> Result<(), CatalogError> {
        let result = self.catalog.species_in_region(region)?;
        self.selected = Some(result.region);
        self.species = result.species;
        Ok(())
    }
}
