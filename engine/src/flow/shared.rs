use std::fs;
use std::path::Path;

use log::info;

use crate::error::{EngineError, EngineResult};
use crate::ir::{adapter, bridge};

/// Convert an already decoded JSON document into a class
pub fn convert(value: serde_json::Value) -> EngineResult<bridge::class::Class> {
    let class_adapted: adapter::class::Class = serde_json::from_value(value).map_err(|e| {
        EngineError::LoadingError(format!("Error during deserialization: {}", e))
    })?;
    bridge::class::Class::convert(&class_adapted)
}

/// Parse the JSON text of a class
pub fn parse(content: &str) -> EngineResult<bridge::class::Class> {
    let class_adapted: adapter::class::Class = serde_json::from_str(content).map_err(|e| {
        EngineError::LoadingError(format!("Error during deserialization: {}", e))
    })?;
    bridge::class::Class::convert(&class_adapted)
}

/// Deserialize the JSON file to a class
pub fn load(input: &Path) -> EngineResult<bridge::class::Class> {
    let content = fs::read_to_string(input)
        .map_err(|e| EngineError::LoadingError(format!("Corrupted JSON file: {}", e)))?;
    let class = parse(&content)?;
    info!(
        "loaded class {} with {} methods from {}",
        class.name,
        class.methods.len(),
        input.display()
    );
    Ok(class)
}
