use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeciesId(i64);

impl SpeciesId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(i64);

impl RegionId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

/// Managed subdirectory an asset is copied into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AssetCategory {
    Images,
    Audio,
    Maps,
}

impl AssetCategory {
    pub fn dir_name(self) -> &'static str {
        match self {
            AssetCategory::Images => "images",
            AssetCategory::Audio => "audio",
            AssetCategory::Maps => "maps",
        }
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}

impl FromStr for AssetCategory {
    type Err = CatalogError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "images" | "image" => Ok(AssetCategory::Images),
            "audio" => Ok(AssetCategory::Audio),
            "maps" | "map" => Ok(AssetCategory::Maps),
            _ => Err(CatalogError::InvalidCategory(value.to_string())),
        }
    }
}

/// Scalar profile fields of a species, shared by reads and writes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesFields {
    pub name: String,
    pub breeding_season: String,
    pub habitat: String,
    pub diet: String,
    pub adult_size: String,
    pub color_scheme: String,
    pub profile_notes: String,
}

impl SpeciesFields {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeciesSummary {
    pub id: SpeciesId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Image {
    pub id: i64,
    pub species_id: SpeciesId,
    pub image_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioClip {
    pub id: i64,
    pub species_id: SpeciesId,
    pub audio_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerritoryMap {
    pub id: i64,
    pub species_id: SpeciesId,
    pub map_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
}

/// A species with every owned and associated row loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeciesProfile {
    pub id: SpeciesId,
    #[serde(flatten)]
    pub fields: SpeciesFields,
    pub images: Vec<Image>,
    pub audio_clips: Vec<AudioClip>,
    pub territory_map: Option<TerritoryMap>,
    pub regions: Vec<Region>,
}

impl SpeciesProfile {
    pub fn name(&self) -> &str {
        &self.fields.name
    }

    pub fn image_paths(&self) -> Vec<String> {
        self.images.iter().map(|image| image.image_path.clone()).collect()
    }

    pub fn audio_paths(&self) -> Vec<String> {
        self.audio_clips
            .iter()
            .map(|clip| clip.audio_path.clone())
            .collect()
    }

    pub fn region_names(&self) -> Vec<String> {
        self.regions.iter().map(|region| region.name.clone()).collect()
    }
}

/// Full input of a create-or-update save. `id: None` creates a new species.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeciesDraft {
    pub id: Option<SpeciesId>,
    pub fields: SpeciesFields,
    pub image_paths: Vec<String>,
    pub audio_paths: Vec<String>,
    pub map_path: Option<String>,
    pub region_names: Vec<String>,
}

impl SpeciesDraft {
    pub fn new(fields: SpeciesFields) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    pub fn from_profile(profile: &SpeciesProfile) -> Self {
        Self {
            id: Some(profile.id),
            fields: profile.fields.clone(),
            image_paths: profile.image_paths(),
            audio_paths: profile.audio_paths(),
            map_path: profile
                .territory_map
                .as_ref()
                .map(|map| map.map_path.clone()),
            region_names: profile.region_names(),
        }
    }
}

/// Lookup key accepted by the profile fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeciesKey {
    Id(SpeciesId),
    Name(String),
}

impl fmt::Display for SpeciesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeciesKey::Id(id) => write!(f, "#{id}"),
            SpeciesKey::Name(name) => write!(f, "{name}"),
        }
    }
}

impl FromStr for SpeciesKey {
    type Err = CatalogError;

    /// `#12` selects by id, anything else by name.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(CatalogError::MissingField("name"));
        }
        if let Some(raw) = trimmed.strip_prefix('#') {
            if let Ok(id) = raw.parse::<i64>() {
                return Ok(SpeciesKey::Id(SpeciesId::new(id)));
            }
        }
        Ok(SpeciesKey::Name(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_asset_category() {
        assert_eq!("images".parse::<AssetCategory>().unwrap(), AssetCategory::Images);
        assert_eq!("Map".parse::<AssetCategory>().unwrap(), AssetCategory::Maps);
        let err = "video".parse::<AssetCategory>().unwrap_err();
        assert_matches!(err, CatalogError::InvalidCategory(_));
    }

    #[test]
    fn parse_species_key() {
        assert_eq!(
            "#7".parse::<SpeciesKey>().unwrap(),
            SpeciesKey::Id(SpeciesId::new(7))
        );
        assert_eq!(
            " Bullfrog ".parse::<SpeciesKey>().unwrap(),
            SpeciesKey::Name("Bullfrog".to_string())
        );
        assert_eq!(
            "#abc".parse::<SpeciesKey>().unwrap(),
            SpeciesKey::Name("#abc".to_string())
        );
    }

    #[test]
    fn parse_species_key_empty() {
        let err = "  ".parse::<SpeciesKey>().unwrap_err();
        assert_matches!(err, CatalogError::MissingField("name"));
    }
}
