// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Command-line interface for the CloudStack discovery daemon.
//!
//! The binary resolves settings from flags, environment variables and an
//! optional YAML document, then refreshes the discovery file on a fixed
//! interval until interrupted.

use std::{path::PathBuf, process};

use clap::{ArgAction, Parser};
use cloudstack_sd::{ConfigFile, DiscoveryJob, Error, Settings};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Command line interface for generating Prometheus target groups from
/// CloudStack.
#[derive(Debug, Parser,)]
#[command(
    name = "cloudstack-sd",
    version,
    about = "Prometheus file-based service discovery for CloudStack"
)]
struct Cli
{
    /// CloudStack API url address.
    #[arg(long = "url", env = "CLOUDSTACK_URL", value_name = "URL")]
    url: Option<String,>,

    /// CloudStack API key.
    #[arg(long = "api-key", env = "CLOUDSTACK_API_KEY", value_name = "KEY", hide_env_values = true)]
    api_key: Option<String,>,

    /// CloudStack secret key.
    #[arg(long = "secret-key", env = "CLOUDSTACK_SECRET_KEY", value_name = "KEY", hide_env_values = true)]
    secret_key: Option<String,>,

    /// Destination file for the discovered targets.
    #[arg(long = "dest", value_name = "PATH")]
    dest: Option<PathBuf,>,

    /// Seconds to wait between discovery cycles.
    #[arg(long = "sleep", value_name = "SECONDS")]
    sleep: Option<u64,>,

    /// Comma separated `job/port` declarations applied to every machine.
    #[arg(long = "jobs", value_name = "JOB/PORT", value_delimiter = ',')]
    jobs: Vec<String,>,

    /// Comma separated project ids to query instead of listing projects.
    #[arg(long = "projects", value_name = "ID", value_delimiter = ',')]
    projects: Vec<String,>,

    /// Comma separated project ids to skip.
    #[arg(long = "ignore-projects", value_name = "ID", value_delimiter = ',')]
    ignore_projects: Vec<String,>,

    /// Tag holding per-machine `job/port` declarations.
    #[arg(long = "tag-name", value_name = "KEY")]
    tag_name: Option<String,>,

    /// Verify the CloudStack endpoint certificate; `--verify-tls=false`
    /// overrides a configuration file that enables it.
    #[arg(
        long = "verify-tls",
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    verify_tls: Option<bool,>,

    /// Output formatted JSON for easier inspection.
    #[arg(long = "pretty", action = ArgAction::SetTrue)]
    pretty: bool,

    /// Run a single discovery cycle and exit.
    #[arg(long = "once", action = ArgAction::SetTrue)]
    once: bool,

    /// Optional YAML document providing defaults for the flags above.
    #[arg(long = "config", value_name = "PATH")]
    config: Option<PathBuf,>,
}

impl Cli
{
    fn overrides(&self,) -> ConfigFile
    {
        ConfigFile {
            url: self.url.clone(),
            api_key: self.api_key.clone(),
            secret_key: self.secret_key.clone(),
            dest: self.dest.clone(),
            sleep_seconds: self.sleep,
            jobs: self.jobs.clone(),
            projects: self.projects.clone(),
            ignore_projects: self.ignore_projects.clone(),
            tag_name: self.tag_name.clone(),
            verify_tls: self.verify_tls,
            connect_timeout_seconds: None,
            request_timeout_seconds: None,
        }
    }

    fn settings(&self,) -> Result<Settings, Error,>
    {
        let base = match self.config.as_deref() {
            Some(path,) => ConfigFile::load(path,)?,
            None => ConfigFile::default(),
        };
        base.merge(self.overrides(),).resolve()
    }
}

/// Entry point that reports errors and sets the appropriate exit status.
#[tokio::main]
async fn main()
{
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info",),),)
        .with_writer(std::io::stderr,)
        .init();

    if let Err(error,) = run(Cli::parse(),).await {
        eprintln!("{}", error.to_display_string());
        process::exit(1,);
    }
}

/// Resolves settings and runs discovery cycles.
///
/// # Errors
///
/// Propagates configuration errors. With `--once`, also propagates the
/// cycle error; otherwise failed cycles are logged and retried on the next
/// tick.
async fn run(cli: Cli,) -> Result<(), Error,>
{
    let settings = cli.settings()?;
    let job = DiscoveryJob::from_settings(&settings, cli.pretty,)?;

    info!(
        endpoint = %settings.endpoint,
        destination = %settings.destination.display(),
        interval_secs = settings.interval.as_secs(),
        "starting CloudStack discovery"
    );

    loop {
        match job.run_cycle().await {
            Ok(_,) => {}
            Err(cycle_error,) if cli.once => return Err(cycle_error,),
            Err(cycle_error,) => error!(error = %cycle_error, "discovery cycle failed"),
        }

        if cli.once {
            return Ok((),);
        }
        tokio::time::sleep(settings.interval,).await;
    }
}
