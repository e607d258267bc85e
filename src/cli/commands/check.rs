use std::path::Path;

use crate::app::Service;
use crate::cli::OutputFormat;
use crate::config::{AppConfig, ServiceDefinition};

pub fn handle(config_path: &Path, output_format: OutputFormat) -> anyhow::Result<()> {
    let definition = ServiceDefinition::load(config_path)?;
    let config = AppConfig::from_env();

    let service = Service::from_definition(definition)?;
    let routes = service.routes(&config)?;

    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&routes)?);
        }
        OutputFormat::Text => {
            println!("✓ {} is valid ({} routes)", config_path.display(), routes.len());
            for route in &routes {
                println!(
                    "  {:<6} {:<32} {:<16} {}",
                    route.verb, route.endpoint, route.handler, route.collection
                );
            }
            println!("  {:<6} {:<32} {:<16}", "GET", config.server.health_endpoint, "health");
        }
    }

    Ok(())
}
