//! Config commands

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use zarchive::config::{Config, LOCAL_CONFIG_FILE};

const REDACTED: &str = "********";

const TEMPLATE_HEADER: &str = "\
# zarchive configuration
#
# The API key can be left out here and supplied as ZULIP_API_KEY instead.
# ZULIP_SITE and ZULIP_EMAIL override their values below too.

";

/// Show the effective configuration
pub fn cmd_config_show(explicit: Option<&Path>) -> Result<()> {
  let source = Config::locate(explicit)?;
  let config = Config::load(explicit)?;

  match source {
    Some(path) => println!("Using config: {}", path.display()),
    None => println!("Using default configuration (no config file found)"),
  }
  println!("Archive root: {}", config.json_root().display());
  println!();

  // Show config as TOML
  println!("{}", toml::to_string_pretty(&redacted(config))?);

  Ok(())
}

/// Write a starter config file
pub fn cmd_config_init(explicit: Option<&Path>, force: bool) -> Result<()> {
  let path = explicit.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE));

  if path.exists() && !force {
    anyhow::bail!("Config file already exists: {}\nUse --force to overwrite it", path.display());
  }

  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
  }

  std::fs::write(&path, template()?).with_context(|| format!("Failed to write {}", path.display()))?;

  println!("Created config: {}", path.display());
  println!("Set [zulip] site, email and api_key, then run `zarchive sync --full`.");

  Ok(())
}

fn template() -> Result<String> {
  Ok(format!("{}{}", TEMPLATE_HEADER, toml::to_string_pretty(&Config::template())?))
}

fn redacted(mut config: Config) -> Config {
  if config.zulip.api_key.is_some() {
    config.zulip.api_key = Some(REDACTED.to_string());
  }
  config
}
