use std::io::{self, Write};

use serde::Serialize;

use crate::app::{AssetResult, DeleteResult, ListResult, RegionResult, RegionsResult, SaveResult};
use crate::domain::SpeciesProfile;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_list(result: &ListResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_profile(profile: &SpeciesProfile) -> io::Result<()> {
        Self::print_json(profile)
    }

    pub fn print_save(result: &SaveResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_delete(result: &DeleteResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_region(result: &RegionResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_regions(result: &RegionsResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_asset(result: &AssetResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}
