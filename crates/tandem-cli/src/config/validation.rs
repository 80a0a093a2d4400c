use crate::config::TandemConfig;
use crate::error::{ConfigError, Result};
use url::Url;

/// Validate that a URL can be bound: http(s) scheme, a host and a port.
pub fn validate_service_url(field: &str, url: &Url) -> Result<()> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: url.to_string(),
            hint: "Use an http:// or https:// URL".to_string(),
        }
        .into());
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: url.to_string(),
            hint: "The URL needs a hostname, e.g. http://localhost:3000".to_string(),
        }
        .into());
    }

    if url.port_or_known_default().is_none() {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: url.to_string(),
            hint: "The URL needs a port".to_string(),
        }
        .into());
    }

    Ok(())
}

/// Validate a build command argument vector.
pub fn validate_command(field: &str, command: &[String]) -> Result<()> {
    match command.first() {
        None => Err(ConfigError::MissingField {
            field: field.to_string(),
            hint: format!(
                "Set {} to the build command, e.g. [\"npx\", \"webpack\"]",
                field
            ),
        }
        .into()),
        Some(program) if program.trim().is_empty() => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: format!("{:?}", command),
            hint: "The first element must name a program".to_string(),
        }
        .into()),
        Some(_) => Ok(()),
    }
}

impl TandemConfig {
    /// Validate configuration for logical consistency.
    pub fn validate(&self) -> Result<()> {
        validate_service_url("clientURL", &self.client_url)?;
        validate_command("client.command", &self.client.command)?;

        if !self.client.public_path.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                field: "client.publicPath".to_string(),
                value: self.client.public_path.clone(),
                hint: "The public path must start with '/', e.g. \"/assets/\"".to_string(),
            }
            .into());
        }

        if self.client.entry.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "client.entry".to_string(),
                hint: "Name the client entry module, e.g. \"main\"".to_string(),
            }
            .into());
        }

        if !self.has_server {
            return Ok(());
        }

        validate_service_url("serverURL", &self.server_url)?;
        validate_command("server.command", &self.server.command)?;

        if self.server.entry.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "server.entry".to_string(),
                hint: "Name the server entry module, e.g. \"main\"".to_string(),
            }
            .into());
        }

        if self.server.exec.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "server.exec".to_string(),
                hint: "Name the program that runs the server script, e.g. \"node\"".to_string(),
            }
            .into());
        }

        // Hostnames aren't compared; localhost and 127.0.0.1 share a port
        let client_port = self.client_url.port_or_known_default();
        if client_port == self.server_url.port_or_known_default() {
            return Err(ConfigError::ConflictingOptions(format!(
                "clientURL ({}) and serverURL ({}) both use port {}",
                self.client_url,
                self.server_url,
                client_port.unwrap_or_default()
            ))
            .into());
        }

        Ok(())
    }
}
