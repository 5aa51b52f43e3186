// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// A single discovery pass: fetch machines, build target groups, write the
/// discovery file.
use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use crate::{
    client::CloudStackClient,
    config::Settings,
    error::Error,
    fetcher::MachineFetcher,
    output::write_target_groups,
    signer::Credentials,
    targets::build_target_groups,
};

/// Summary of a completed cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize,)]
pub struct CycleReport
{
    /// Machines returned by the fetcher.
    pub machines: usize,
    /// Target groups written to the discovery file.
    pub groups:   usize,
}

/// Discovery job assembled from [`Settings`].
#[derive(Debug, Clone,)]
pub struct DiscoveryJob
{
    fetcher:         MachineFetcher,
    jobs:            Vec<String,>,
    projects:        Vec<String,>,
    ignore_projects: Vec<String,>,
    tag_name:        String,
    destination:     PathBuf,
    pretty:          bool,
}

impl DiscoveryJob
{
    /// Builds the client and fetcher described by `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the HTTP client cannot be created.
    pub fn from_settings(settings: &Settings, pretty: bool,) -> Result<Self, Error,>
    {
        let credentials =
            Credentials::new(settings.endpoint.clone(), settings.api_key.clone(), &settings.secret_key,);
        let client = CloudStackClient::new(credentials, &settings.client,)?;

        Ok(Self {
            fetcher: MachineFetcher::new(client,),
            jobs: settings.jobs.clone(),
            projects: settings.projects.clone(),
            ignore_projects: settings.ignore_projects.clone(),
            tag_name: settings.tag_name.clone(),
            destination: settings.destination.clone(),
            pretty,
        },)
    }

    /// Runs one fetch, build and write pass.
    ///
    /// # Errors
    ///
    /// Returns an error when listing projects fails or when the discovery
    /// file cannot be written. The previous file is left untouched in both
    /// cases.
    pub async fn run_cycle(&self,) -> Result<CycleReport, Error,>
    {
        let machines = self.fetcher.fetch(&self.projects, &self.ignore_projects,).await?;
        let groups = build_target_groups(&machines, &self.jobs, &self.tag_name,);
        write_target_groups(&self.destination, &groups, self.pretty,)?;

        let report = CycleReport {
            machines: machines.len(), groups: groups.len(),
        };
        info!(
            machines = report.machines,
            groups = report.groups,
            destination = %self.destination.display(),
            "wrote CloudStack discovery file"
        );
        Ok(report,)
    }
}
