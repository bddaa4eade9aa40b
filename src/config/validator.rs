use crate::config::Inventory;
use crate::error::{Error, Result};
use crate::server::ServerDefinition;
use std::collections::HashSet;

/// Validates a single server definition
pub fn validate_server_definition(definition: &ServerDefinition) -> Result<()> {
    if definition.name.trim().is_empty() {
        return Err(Error::ConfigInvalid(
            "Server with empty name".to_string(),
        ));
    }

    if definition.command.trim().is_empty() {
        return Err(Error::ConfigInvalid(format!(
            "Server '{}' has empty command",
            definition.name
        )));
    }

    Ok(())
}

/// Validates every server and rejects duplicate names
pub fn validate_inventory(inventory: &Inventory) -> Result<()> {
    let mut seen = HashSet::new();

    for definition in &inventory.servers {
        validate_server_definition(definition)?;

        if !seen.insert(definition.name.as_str()) {
            return Err(Error::ConfigInvalid(format!(
                "Server '{}' is defined more than once",
                definition.name
            )));
        }
    }

    Ok(())
}
