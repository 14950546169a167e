pub mod backend;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dashboard;
pub mod datastore;
pub mod datetime;
pub mod error;
pub mod filter;
pub mod lifecycle;
pub mod model;
pub mod prompt;
pub mod render;
pub mod subscription;
pub mod todos;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli =
    cli::GlobalCli::parse_from(raw_args);

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting candillium CLI"
  );

  let mut cfg = config::Config::load(
    cli.config.as_deref()
  )?;
  cfg.apply_overrides(
    cli
      .overrides
      .into_iter()
      .map(|kv| (kv.key, kv.value))
  )?;
  debug!(?cfg, "effective config");

  let data_dir =
    config::resolve_data_dir(
      &cfg,
      cli.data.as_deref()
    )
    .context(
      "failed to resolve data \
       directory"
    )?;

  let outputs = match cfg.outputs_path()
  {
    | Some(path) => Some((
      backend::BackendOutputs::load(
        &path
      )?,
      path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| cfg.base_dir())
    )),
    | None => None
  };

  let backend = backend::connect(
    outputs.as_ref().map(
      |(outputs, base)| {
        (outputs, base.as_path())
      }
    ),
    &data_dir
  )
  .with_context(|| {
    format!(
      "failed to open backend at {}",
      data_dir.display()
    )
  })?;

  let renderer =
    render::Renderer::new(&cfg);

  commands::dispatch(
    backend,
    &renderer,
    cli.command
  )?;

  info!("done");
  Ok(())
}
