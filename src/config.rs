use std::{env, path::PathBuf, time::Duration};

use thiserror::Error;

pub const DEFAULT_COMMAND: &str = "docker";
pub const DEFAULT_IMAGE: &str = "gcloud-mcp-image";
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 120;
const CONTAINER_GCLOUD_DIR: &str = "/root/.config/gcloud";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ServerCommand {
    /// `docker run -i --rm --network host -v <config>:/root/.config/gcloud <image>`
    ///
    /// The mount is read-write: gcloud writes logs and lock files into it.
    pub fn container(program: &str, gcloud_config_dir: &str, image: &str) -> Self {
        let mount = format!("{gcloud_config_dir}:{CONTAINER_GCLOUD_DIR}");
        let args = [
            "run",
            "-i",
            "--rm",
            "--network",
            "host",
            "-v",
            mount.as_str(),
            image,
        ]
        .iter()
        .map(|arg| arg.to_string())
        .collect();

        Self {
            program: program.to_string(),
            args,
        }
    }

    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerCommand,
    pub gcloud_config_dir: PathBuf,
    pub call_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("HOME is not set and GCLOUD_CONFIG_DIR was not provided")]
    MissingHome,
    #[error("MCP_CALL_TIMEOUT_SECS must be a positive integer")]
    InvalidTimeout,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let program = non_empty("GCLOUD_MCP_COMMAND").unwrap_or_else(|| DEFAULT_COMMAND.to_string());
        let image = non_empty("GCLOUD_MCP_IMAGE").unwrap_or_else(|| DEFAULT_IMAGE.to_string());

        let gcloud_config_dir = match non_empty("GCLOUD_CONFIG_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => {
                let home = non_empty("HOME").ok_or(ConfigError::MissingHome)?;
                PathBuf::from(home).join(".config").join("gcloud")
            }
        };

        let timeout_secs = non_empty("MCP_CALL_TIMEOUT_SECS")
            .map(|value| value.parse::<u64>().map_err(|_| ConfigError::InvalidTimeout))
            .transpose()?
            .unwrap_or(DEFAULT_CALL_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        let server = ServerCommand::container(
            &program,
            &gcloud_config_dir.to_string_lossy(),
            &image,
        );

        Ok(Self {
            server,
            gcloud_config_dir,
            call_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
