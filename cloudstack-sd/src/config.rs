// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Configuration document and resolved runtime settings.
//!
//! Settings can come from an optional YAML document and from command-line
//! flags; flags win. [`ConfigFile`] mirrors the YAML structure with every
//! field optional, while [`Settings`] holds the validated plain values the
//! discovery components are constructed from.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{
    client::{ClientConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT},
    error::{self, Error},
};

/// Destination used when neither flags nor the document name one.
pub const DEFAULT_DESTINATION: &str = "cloudstack.json";
/// Pause between discovery cycles when none is configured.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60,);

/// YAML configuration document.
///
/// # Examples
///
/// ```
/// use cloudstack_sd::ConfigFile;
///
/// let yaml = r#"
/// url: https://cloud.example/client/api
/// api_key: key
/// secret_key: secret
/// jobs: [node-exporter/9100]
/// "#;
/// let config: ConfigFile = serde_yaml::from_str(yaml,).expect("valid configuration",);
/// assert_eq!(config.jobs, vec!["node-exporter/9100".to_owned()]);
/// ```
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq,)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile
{
    /// CloudStack API endpoint.
    #[serde(default)]
    pub url: Option<String,>,

    /// API key used to sign requests.
    #[serde(default, alias = "api-key")]
    pub api_key: Option<String,>,

    /// Secret key used to sign requests.
    #[serde(default, alias = "secret-key")]
    pub secret_key: Option<String,>,

    /// Path of the discovery file.
    #[serde(default)]
    pub dest: Option<PathBuf,>,

    /// Seconds to wait between discovery cycles.
    #[serde(default, alias = "sleep")]
    pub sleep_seconds: Option<u64,>,

    /// Static `job/port` declarations applied to every machine.
    #[serde(default)]
    pub jobs: Vec<String,>,

    /// Project ids to query instead of listing projects.
    #[serde(default)]
    pub projects: Vec<String,>,

    /// Project ids to drop from the listed projects.
    #[serde(default, alias = "ignore-projects")]
    pub ignore_projects: Vec<String,>,

    /// Tag holding per-machine `job/port` declarations.
    #[serde(default, alias = "tag-name")]
    pub tag_name: Option<String,>,

    /// Verify the endpoint certificate chain.
    #[serde(default)]
    pub verify_tls: Option<bool,>,

    /// Seconds allowed for connecting to the endpoint.
    #[serde(default)]
    pub connect_timeout_seconds: Option<u64,>,

    /// Seconds allowed for a complete API call.
    #[serde(default)]
    pub request_timeout_seconds: Option<u64,>,
}

impl ConfigFile
{
    /// Reads and parses a YAML configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the file cannot be read and
    /// [`Error::Parse`] when it is not a valid document.
    pub fn load(path: &Path,) -> Result<Self, Error,>
    {
        let contents = fs::read_to_string(path,).map_err(|source| error::io_error(path, source,),)?;
        Self::parse(&contents,)
    }

    /// Parses a YAML configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] when the document is malformed or contains
    /// unknown keys.
    pub fn parse(contents: &str,) -> Result<Self, Error,>
    {
        if contents.trim().is_empty() {
            return Ok(Self::default(),);
        }
        Ok(serde_yaml::from_str(contents,)?,)
    }

    /// Overlays `overrides` on top of this document.
    ///
    /// Scalar values present in `overrides` replace the current ones; list
    /// values replace the current list when non-empty.
    pub fn merge(mut self, overrides: ConfigFile,) -> Self
    {
        fn pick<T,>(base: &mut Option<T,>, value: Option<T,>,)
        {
            if value.is_some() {
                *base = value;
            }
        }

        fn pick_list(base: &mut Vec<String,>, value: Vec<String,>,)
        {
            if !value.is_empty() {
                *base = value;
            }
        }

        pick(&mut self.url, overrides.url,);
        pick(&mut self.api_key, overrides.api_key,);
        pick(&mut self.secret_key, overrides.secret_key,);
        pick(&mut self.dest, overrides.dest,);
        pick(&mut self.sleep_seconds, overrides.sleep_seconds,);
        pick_list(&mut self.jobs, overrides.jobs,);
        pick_list(&mut self.projects, overrides.projects,);
        pick_list(&mut self.ignore_projects, overrides.ignore_projects,);
        pick(&mut self.tag_name, overrides.tag_name,);
        pick(&mut self.verify_tls, overrides.verify_tls,);
        pick(&mut self.connect_timeout_seconds, overrides.connect_timeout_seconds,);
        pick(&mut self.request_timeout_seconds, overrides.request_timeout_seconds,);
        self
    }

    /// Validates the document and fills in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when a required value is missing, the
    /// endpoint is not a URL, a static job lacks a `/` separator, or a
    /// duration is zero.
    pub fn resolve(self,) -> Result<Settings, Error,>
    {
        let endpoint = required(self.url, "url",)?;
        reqwest::Url::parse(&endpoint,)
            .map_err(|e| Error::validation(format!("url '{endpoint}' is not a valid URL: {e}"),),)?;

        let api_key = required(self.api_key, "api_key",)?;
        let secret_key = required(self.secret_key, "secret_key",)?;

        let jobs: Vec<String,> = split_list(self.jobs,);
        if let Some(invalid,) = jobs.iter().find(|job| !job.contains('/',),) {
            return Err(Error::validation(format!("job '{invalid}' must use the job/port form"),),);
        }

        let interval = seconds(self.sleep_seconds, DEFAULT_INTERVAL, "sleep_seconds",)?;
        let client = ClientConfig {
            connect_timeout: seconds(
                self.connect_timeout_seconds,
                DEFAULT_CONNECT_TIMEOUT,
                "connect_timeout_seconds",
            )?,
            request_timeout: seconds(
                self.request_timeout_seconds,
                DEFAULT_REQUEST_TIMEOUT,
                "request_timeout_seconds",
            )?,
            verify_tls:      self.verify_tls.unwrap_or(false,),
        };

        Ok(Settings {
            endpoint,
            api_key,
            secret_key,
            destination: self.dest.unwrap_or_else(|| PathBuf::from(DEFAULT_DESTINATION,),),
            interval,
            jobs,
            projects: split_list(self.projects,),
            ignore_projects: split_list(self.ignore_projects,),
            tag_name: self.tag_name.map(|name| name.trim().to_owned(),).unwrap_or_default(),
            client,
        },)
    }
}

/// Validated settings for a discovery process.
#[derive(Clone, PartialEq, Eq,)]
pub struct Settings
{
    /// CloudStack API endpoint.
    pub endpoint:        String,
    /// API key used to sign requests.
    pub api_key:         String,
    /// Secret key used to sign requests.
    pub secret_key:      String,
    /// Path of the discovery file.
    pub destination:     PathBuf,
    /// Pause between discovery cycles.
    pub interval:        Duration,
    /// Static `job/port` declarations.
    pub jobs:            Vec<String,>,
    /// Explicit project ids; listing is skipped when non-empty.
    pub projects:        Vec<String,>,
    /// Project ids dropped from the listed projects.
    pub ignore_projects: Vec<String,>,
    /// Tag holding per-machine declarations; empty disables tag lookup.
    pub tag_name:        String,
    /// HTTP transport settings.
    pub client:          ClientConfig,
}

impl std::fmt::Debug for Settings
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_,>,) -> std::fmt::Result
    {
        f.debug_struct("Settings",)
            .field("endpoint", &self.endpoint,)
            .field("api_key", &"<redacted>",)
            .field("secret_key", &"<redacted>",)
            .field("destination", &self.destination,)
            .field("interval", &self.interval,)
            .field("jobs", &self.jobs,)
            .field("projects", &self.projects,)
            .field("ignore_projects", &self.ignore_projects,)
            .field("tag_name", &self.tag_name,)
            .field("client", &self.client,)
            .finish()
    }
}

fn required(value: Option<String,>, name: &str,) -> Result<String, Error,>
{
    value
        .map(|value| value.trim().to_owned(),)
        .filter(|value| !value.is_empty(),)
        .ok_or_else(|| Error::validation(format!("{name} must be provided"),),)
}

fn seconds(value: Option<u64,>, default: Duration, name: &str,) -> Result<Duration, Error,>
{
    match value {
        Some(0,) => Err(Error::validation(format!("{name} must be greater than zero"),),),
        Some(value,) => Ok(Duration::from_secs(value,),),
        None => Ok(default,),
    }
}

/// Flattens comma separated entries and drops blanks.
fn split_list(values: Vec<String,>,) -> Vec<String,>
{
    values
        .iter()
        .flat_map(|value| value.split(',',),)
        .map(str::trim,)
        .filter(|value| !value.is_empty(),)
        .map(str::to_owned,)
        .collect()
}
