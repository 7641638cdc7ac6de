use std::path::PathBuf;

use anyhow::Result;
use log::info;
use structopt::StructOpt;

use timeguard_engine::analyze;
use timeguard_engine::settings::Settings;
use timeguard_engine::verify::Property;
use timeguard_shared::logging;

#[derive(StructOpt)]
#[structopt(
    name = "timeguard-engine",
    about = "Verify temporal properties of interval objects in a class",
    rename_all = "kebab-case"
)]
struct Args {
    /// Verbosity, repeat for more details
    #[structopt(short, long, parse(from_occurrences))]
    verbose: usize,

    /// Properties to check, all of them if none is given
    #[structopt(short, long)]
    properties: Vec<Property>,

    /// Settings file (JSON)
    #[structopt(long)]
    config: Option<PathBuf>,

    /// Class whose objects are tracked as intervals
    #[structopt(long)]
    interval_class: Option<String>,

    /// Method that queries an interval at a time point
    #[structopt(long)]
    query_method: Option<String>,

    /// Consider queries on unresolved receivers as safe
    #[structopt(long)]
    allow_unresolved: bool,

    /// Also write a full trace to this file
    #[structopt(long)]
    log_file: Option<PathBuf>,

    /// Serialized class (JSON)
    input: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::from_args();
    let Args {
        verbose,
        properties,
        config,
        interval_class,
        query_method,
        allow_unresolved,
        log_file,
        input,
    } = args;

    // setup logging
    logging::setup(verbose, log_file.as_deref())?;

    // collect settings, flags take precedence over the file
    let mut settings = match config {
        None => Settings::default(),
        Some(path) => Settings::load(&path)?,
    };
    if let Some(name) = interval_class {
        settings.interval_class = name;
    }
    if let Some(name) = query_method {
        settings.query_method = name;
    }
    if allow_unresolved {
        settings.allow_unresolved_receivers = true;
    }
    info!("settings: {:?}", settings);

    // run the verification
    let report = analyze(&input, settings, properties)?;
    print!("{}", report);

    // done with everything
    Ok(())
}
