use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use serde::{
  Deserialize,
  Serialize
};
use tracing::{
  debug,
  info,
  warn
};

const CONFIG_ENV_VAR: &str =
  "CANDILLIUM_CONFIG";
const CONFIG_DIR_NAME: &str =
  "candillium";
const CONFIG_FILE_NAME: &str =
  "config.toml";

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Default,
)]
#[serde(default)]
pub struct Config {
  pub data:         DataSection,
  pub backend:      BackendSection,
  pub display:      DisplaySection,
  #[serde(skip)]
  pub loaded_files: Vec<PathBuf>
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
#[serde(default)]
pub struct DataSection {
  pub location: String
}

impl Default for DataSection {
  fn default() -> Self {
    Self {
      location: "~/.candillium"
        .to_string()
    }
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Default,
)]
#[serde(default)]
pub struct BackendSection {
  /// Generated backend outputs
  /// artifact (JSON).
  pub outputs: Option<String>
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
#[serde(default)]
pub struct DisplaySection {
  pub color:    bool,
  pub timezone: Option<String>
}

impl Default for DisplaySection {
  fn default() -> Self {
    Self {
      color:    true,
      timezone: None
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    config_override
  ))]
  pub fn load(
    config_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let path = resolve_config_path(
      config_override
    )?;

    let Some(path) = path else {
      warn!(
        "no config file found; using \
         defaults"
      );
      return Ok(Self::default());
    };

    info!(config = %path.display(), "loading config");
    Self::load_file(&path)
  }

  #[tracing::instrument]
  pub fn load_file(
    path: &Path
  ) -> anyhow::Result<Self> {
    let path = expand_tilde(path);
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;

    let mut cfg: Config =
      toml::from_str(&text)
        .with_context(|| {
          format!(
            "failed to parse {}",
            path.display()
          )
        })?;
    cfg.loaded_files.push(path);
    Ok(cfg)
  }

  /// Applies `key=value` overrides on
  /// top of the loaded file.
  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) -> anyhow::Result<()>
  where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k.trim();
      let value = v.trim();
      debug!(key = %key, value = %value, "applying override");
      match key {
        | "data.location" => {
          self.data.location =
            value.to_string();
        }
        | "backend.outputs" => {
          self.backend.outputs =
            non_empty(value);
        }
        | "display.color" => {
          self.display.color =
            parse_bool(value)?;
        }
        | "display.timezone" => {
          self.display.timezone =
            non_empty(value);
        }
        | other => {
          return Err(anyhow!(
            "unknown config key: \
             {other}"
          ));
        }
      }
    }
    Ok(())
  }

  /// Directory relative paths in the
  /// config resolve against.
  pub fn base_dir(&self) -> PathBuf {
    self
      .loaded_files
      .last()
      .and_then(|p| p.parent())
      .map(Path::to_path_buf)
      .unwrap_or_else(|| {
        PathBuf::from(".")
      })
  }

  pub fn outputs_path(
    &self
  ) -> Option<PathBuf> {
    let raw =
      self.backend.outputs.as_deref()?;
    let expanded =
      expand_tilde(Path::new(raw));
    if expanded.is_absolute() {
      Some(expanded)
    } else {
      Some(self.base_dir().join(expanded))
    }
  }
}

#[tracing::instrument(skip(
  cfg,
  override_dir
))]
pub fn resolve_data_dir(
  cfg: &Config,
  override_dir: Option<&Path>
) -> anyhow::Result<PathBuf> {
  let dir = if let Some(path) =
    override_dir
  {
    path.to_path_buf()
  } else {
    expand_tilde(Path::new(
      &cfg.data.location
    ))
  };

  if !dir.exists() {
    info!(dir = %dir.display(), "creating data directory");
    fs::create_dir_all(&dir)
      .with_context(|| {
        format!(
          "failed to create {}",
          dir.display()
        )
      })?;
  }

  Ok(dir)
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_config_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(env_path) =
    std::env::var(CONFIG_ENV_VAR)
  {
    if env_path == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      env_path
    )));
  }

  let Some(config_dir) =
    dirs::config_dir()
  else {
    warn!(
      "cannot determine config \
       directory"
    );
    return Ok(None);
  };
  let candidate = config_dir
    .join(CONFIG_DIR_NAME)
    .join(CONFIG_FILE_NAME);
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn non_empty(
  value: &str
) -> Option<String> {
  if value.is_empty() {
    None
  } else {
    Some(value.to_string())
  }
}

fn parse_bool(
  s: &str
) -> anyhow::Result<bool> {
  match s
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "1" | "y" | "yes" | "on"
    | "true" => Ok(true),
    | "0" | "n" | "no" | "off"
    | "false" => Ok(false),
    | other => Err(anyhow!(
      "invalid boolean: {other}"
    ))
  }
}
