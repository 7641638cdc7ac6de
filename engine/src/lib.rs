use std::path::Path;

pub use error::EngineError;

use crate::error::EngineResult;
use crate::flow::{Report, Workflow};
use crate::settings::Settings;
use crate::verify::Property;

pub mod analysis;
pub mod error;
pub mod flow;
pub mod ir;
pub mod pointer;
pub mod settings;
pub mod verify;

/// Main entrypoint
pub fn analyze(
    input: &Path,
    settings: Settings,
    properties: Vec<Property>,
) -> EngineResult<Report> {
    let flow = Workflow::new(settings, properties);
    flow.execute(input)
}
