use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use frog_catalog::app::{Catalog, RegionResult, RegionsResult, SaveResult};
use frog_catalog::config::ConfigLoader;
use frog_catalog::domain::{AssetCategory, SpeciesKey};
use frog_catalog::error::CatalogError;
use frog_catalog::output::{JsonOutput, OutputMode};
use frog_catalog::tui::Browser;
use frog_catalog::views::{EditForm, MapView, ProfileView, RegionSelection};

#[derive(Parser)]
#[command(name = "frogcat")]
#[command(about = "Catalog of frog and toad species: profiles, calls, images and range maps")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(subcommand, about = "List, show, save and delete species profiles")]
    Species(SpeciesCommand),
    #[command(subcommand, about = "Manage regions and look up species by region")]
    Region(RegionCommand),
    #[command(subcommand, about = "Copy files into the managed asset directory")]
    Asset(AssetCommand),
    #[command(about = "Open the terminal browser")]
    Browse,
}

#[derive(Subcommand)]
enum SpeciesCommand {
    #[command(about = "List all species")]
    List,
    #[command(about = "Show a profile (name, or #id)")]
    Show { species: String },
    #[command(about = "Create a species, or update one with --update")]
    Save(SaveArgs),
    #[command(about = "Delete a species and its images, calls and map")]
    Delete { species: String },
}

#[derive(Subcommand)]
enum RegionCommand {
    #[command(about = "List known regions")]
    List,
    #[command(about = "Add region names")]
    Add {
        #[arg(required = true)]
        names: Vec<String>,
    },
    #[command(about = "Species recorded in a region")]
    Species { region: String },
}

#[derive(Subcommand)]
enum AssetCommand {
    #[command(about = "Copy a file into images, audio or maps")]
    Add {
        category: AssetCategory,
        file: Utf8PathBuf,
    },
}

#[derive(Args)]
struct SaveArgs {
    #[arg(long, value_name = "SPECIES")]
    update: Option<String>,

    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    breeding_season: Option<String>,
    #[arg(long)]
    habitat: Option<String>,
    #[arg(long)]
    diet: Option<String>,
    #[arg(long)]
    adult_size: Option<String>,
    #[arg(long)]
    color_scheme: Option<String>,
    #[arg(long)]
    notes: Option<String>,

    #[arg(long = "image", value_name = "FILE")]
    images: Vec<Utf8PathBuf>,
    #[arg(long = "audio", value_name = "FILE")]
    audio: Vec<Utf8PathBuf>,
    #[arg(long, value_name = "FILE")]
    map: Option<Utf8PathBuf>,
    #[arg(long = "region", value_name = "NAME")]
    regions: Vec<String>,

    #[arg(long)]
    clear_images: bool,
    #[arg(long)]
    clear_audio: bool,
    #[arg(long)]
    clear_regions: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<CatalogError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &CatalogError) -> u8 {
    match error {
        CatalogError::SpeciesNotFound(_) => 2,
        CatalogError::AssetSource { .. } | CatalogError::Filesystem(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let config = ConfigLoader::resolve(cli.config.as_deref())?;
    let catalog = Catalog::open(&config)?;

    match cli.command {
        Some(Commands::Species(command)) => run_species(command, &catalog, output_mode),
        Some(Commands::Region(command)) => run_region(command, &catalog, output_mode),
        Some(Commands::Asset(command)) => run_asset(command, &catalog, output_mode),
        Some(Commands::Browse) => run_browse(&catalog),
        None => match output_mode {
            OutputMode::Interactive => run_browse(&catalog),
            OutputMode::NonInteractive => Err(miette::Report::msg(
                "command required (try `frogcat --help`)",
            )),
        },
    }
}

fn run_browse(catalog: &Catalog) -> miette::Result<()> {
    let mut browser = Browser::new(catalog)?;
    browser.run()
}

fn run_species(
    command: SpeciesCommand,
    catalog: &Catalog,
    output_mode: OutputMode,
) -> miette::Result<()> {
    match command {
        SpeciesCommand::List => {
            let result = catalog.list()?;
            match output_mode {
                OutputMode::NonInteractive => JsonOutput::print_list(&result).into_diagnostic()?,
                OutputMode::Interactive => {
                    for item in &result.species {
                        println!("{:>4}  {}", item.id, item.name);
                    }
                }
            }
            Ok(())
        }
        SpeciesCommand::Show { species } => {
            let key: SpeciesKey = species.parse()?;
            let view = ProfileView::load(catalog, &key)?
                .ok_or_else(|| CatalogError::SpeciesNotFound(key.to_string()))?;
            match output_mode {
                OutputMode::NonInteractive => {
                    JsonOutput::print_profile(view.profile()).into_diagnostic()?
                }
                OutputMode::Interactive => print_profile(&view),
            }
            Ok(())
        }
        SpeciesCommand::Save(args) => {
            let result = run_save(args, catalog)?;
            match output_mode {
                OutputMode::NonInteractive => JsonOutput::print_save(&result).into_diagnostic()?,
                OutputMode::Interactive => {
                    let verb = if result.created { "created" } else { "updated" };
                    println!("{verb} {} (#{})", result.name, result.id);
                }
            }
            Ok(())
        }
        SpeciesCommand::Delete { species } => {
            let key: SpeciesKey = species.parse()?;
            let result = catalog.delete(&key)?;
            match output_mode {
                OutputMode::NonInteractive => {
                    JsonOutput::print_delete(&result).into_diagnostic()?
                }
                OutputMode::Interactive => println!("deleted {} (#{})", result.name, result.id),
            }
            Ok(())
        }
    }
}

/// Drives the edit form the way the add/edit dialog does: load, change,
/// attach files, tick regions, save.
fn run_save(args: SaveArgs, catalog: &Catalog) -> Result<SaveResult, CatalogError> {
    let mut form = match args.update.as_deref() {
        Some(target) => {
            let key: SpeciesKey = target.parse()?;
            let profile = catalog
                .profile(&key)?
                .ok_or_else(|| CatalogError::SpeciesNotFound(key.to_string()))?;
            EditForm::edit(catalog, &profile)?
        }
        None => EditForm::blank(catalog)?,
    };

    let fields = form.fields_mut();
    let overrides = [
        (&mut fields.name, args.name),
        (&mut fields.breeding_season, args.breeding_season),
        (&mut fields.habitat, args.habitat),
        (&mut fields.diet, args.diet),
        (&mut fields.adult_size, args.adult_size),
        (&mut fields.color_scheme, args.color_scheme),
        (&mut fields.profile_notes, args.notes),
    ];
    for (field, value) in overrides {
        if let Some(value) = value {
            *field = value;
        }
    }

    if args.clear_images {
        form.clear_images();
    }
    for image in &args.images {
        form.attach_image(image)?;
    }
    if args.clear_audio {
        form.clear_audio();
    }
    for clip in &args.audio {
        form.attach_audio(clip)?;
    }
    if let Some(map) = &args.map {
        form.attach_map(map)?;
    }

    if args.clear_regions {
        for name in form.checked_regions() {
            form.set_region(&name, false);
        }
    }
    for region in &args.regions {
        if !form.set_region(region, true) {
            tracing::warn!(region = %region, "unknown region ignored");
        }
    }

    form.save()
}

fn print_profile(view: &ProfileView) {
    let cyan = "\x1b[36m";
    let gray = "\x1b[90m";
    let reset = "\x1b[0m";

    println!("{cyan}{}{reset}", view.title());
    for (label, value) in view.field_lines() {
        println!("{gray}{label}:{reset} {value}");
    }
    let profile = view.profile();
    for image in &profile.images {
        println!("{gray}Image:{reset} {}", image.image_path);
    }
    for clip in &profile.audio_clips {
        println!("{gray}Call:{reset} {}", clip.audio_path);
    }
    if let Some(map) = view.map_path() {
        println!("{gray}Territory map:{reset} {map}");
    }
    println!("{}", view.native_to());
}

fn run_region(
    command: RegionCommand,
    catalog: &Catalog,
    output_mode: OutputMode,
) -> miette::Result<()> {
    match command {
        RegionCommand::List => {
            let result = RegionsResult {
                regions: catalog.regions()?,
                added: 0,
            };
            match output_mode {
                OutputMode::NonInteractive => {
                    JsonOutput::print_regions(&result).into_diagnostic()?
                }
                OutputMode::Interactive => {
                    for region in &result.regions {
                        println!("{}", region.name);
                    }
                }
            }
            Ok(())
        }
        RegionCommand::Add { names } => {
            let result = catalog.add_regions(&names)?;
            match output_mode {
                OutputMode::NonInteractive => {
                    JsonOutput::print_regions(&result).into_diagnostic()?
                }
                OutputMode::Interactive => println!("{} region(s) added", result.added),
            }
            Ok(())
        }
        RegionCommand::Species { region } => {
            let mut map = MapView::new(catalog)?;
            map.region_selected(&region)?;
            match output_mode {
                OutputMode::NonInteractive => {
                    let result = RegionResult {
                        region,
                        species: map.species().to_vec(),
                    };
                    JsonOutput::print_region(&result).into_diagnostic()?
                }
                OutputMode::Interactive => {
                    for name in map.species_names() {
                        println!("{name}");
                    }
                }
            }
            Ok(())
        }
    }
}

fn run_asset(
    command: AssetCommand,
    catalog: &Catalog,
    output_mode: OutputMode,
) -> miette::Result<()> {
    match command {
        AssetCommand::Add { category, file } => {
            let result = catalog.store_asset(&file, category)?;
            match output_mode {
                OutputMode::NonInteractive => JsonOutput::print_asset(&result).into_diagnostic()?,
                OutputMode::Interactive => println!("{}", result.stored_path),
            }
            Ok(())
        }
    }
}
