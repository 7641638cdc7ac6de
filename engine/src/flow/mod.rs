use std::fmt::{Display, Formatter};
use std::path::Path;

use log::debug;

use crate::analysis::octagon::Octagon;
use crate::error::EngineResult;
use crate::ir::bridge::class::Class;
use crate::ir::bridge::shared::Identifier;
use crate::settings::Settings;
use crate::verify::checker::Verifier;
use crate::verify::{Property, Verdict};

pub mod shared;

/// Verdicts for the requested properties of one class
#[derive(Eq, PartialEq, Clone, Debug)]
pub struct Report {
    pub class: Identifier,
    pub verdicts: Vec<(Property, Verdict)>,
}

impl Report {
    pub fn verdict(&self, property: Property) -> Option<Verdict> {
        self.verdicts
            .iter()
            .find(|(p, _)| *p == property)
            .map(|(_, v)| *v)
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (property, verdict) in &self.verdicts {
            writeln!(f, "{} {}", property, verdict)?;
        }
        Ok(())
    }
}

/// Load a class, then check each property in turn
pub struct Workflow {
    settings: Settings,
    properties: Vec<Property>,
}

impl Workflow {
    pub fn new(settings: Settings, properties: Vec<Property>) -> Self {
        let properties = if properties.is_empty() {
            Property::ALL.to_vec()
        } else {
            properties
        };
        Self {
            settings,
            properties,
        }
    }

    /// Verify a class that is already loaded
    pub fn verify(&self, class: &Class) -> EngineResult<Report> {
        let mut verifier: Verifier<Octagon> = Verifier::new(class, self.settings.clone())?;
        let mut verdicts = vec![];
        for property in &self.properties {
            let verdict = Verdict::from(verifier.check(*property)?);
            debug!("{} of {}: {}", property, class.name, verdict);
            verdicts.push((*property, verdict));
        }
        Ok(Report {
            class: class.name.clone(),
            verdicts,
        })
    }

    /// Verify the class serialized in the input file
    pub fn execute(&self, input: &Path) -> EngineResult<Report> {
        let class = shared::load(input)?;
        self.verify(&class)
    }
}
