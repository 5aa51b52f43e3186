// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Project and virtual machine retrieval.
///
/// Projects are listed once (or taken verbatim from an explicit list), then
/// every project's machines are fetched on its own task. The fetcher waits
/// for all tasks before returning; a project whose call fails contributes no
/// machines and does not affect the others.
use std::collections::HashSet;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::{
    client::CloudStackClient,
    error::Error,
    types::{ListProjectsResponse, ListVirtualMachinesResponse, Project, VirtualMachine},
};

const LIST_PROJECTS: &str = "listProjects";
const LIST_VIRTUAL_MACHINES: &str = "listVirtualMachines";

/// Collects virtual machines across projects.
#[derive(Debug, Clone,)]
pub struct MachineFetcher
{
    client: CloudStackClient,
}

impl MachineFetcher
{
    /// Creates a fetcher issuing calls through `client`.
    pub fn new(client: CloudStackClient,) -> Self
    {
        Self {
            client,
        }
    }

    /// Fetches machines for every selected project.
    ///
    /// When `explicit_project_ids` is non-empty the project listing call is
    /// skipped and the ids are used as given; `ignored_project_ids` only
    /// applies to listed projects. Machines are returned in task completion
    /// order across projects and in API order within a project.
    ///
    /// # Errors
    ///
    /// Returns the client error when the project listing call fails. Failures
    /// of individual per-project calls are logged and skipped.
    pub async fn fetch(
        &self,
        explicit_project_ids: &[String],
        ignored_project_ids: &[String],
    ) -> Result<Vec<VirtualMachine,>, Error,>
    {
        let projects = if explicit_project_ids.is_empty() {
            let listed = self.list_projects().await?;
            let total = listed.len();
            let projects = filter_projects(listed, ignored_project_ids,);
            info!(listed = total, selected = projects.len(), "listed CloudStack projects");
            projects
        } else {
            explicit_project_ids.iter().map(Project::from_id,).collect()
        };

        let mut tasks = JoinSet::new();
        for project in projects {
            let client = self.client.clone();
            tasks.spawn(async move {
                let result = list_machines(&client, &project.id,).await;
                (project, result,)
            },);
        }

        let mut machines = Vec::new();
        while let Some(joined,) = tasks.join_next().await {
            match joined {
                Ok((project, Ok(found,),),) => {
                    debug!(project = %project.id, machines = found.len(), "fetched project machines");
                    machines.extend(found,);
                }
                Ok((project, Err(error,),),) => {
                    warn!(project = %project.id, %error, "skipping project after failed machine listing");
                }
                Err(error,) => {
                    warn!(%error, "machine listing task did not complete");
                }
            }
        }

        Ok(machines,)
    }

    async fn list_projects(&self,) -> Result<Vec<Project,>, Error,>
    {
        let response: ListProjectsResponse =
            self.client.execute(LIST_PROJECTS, &[("simple", "true",)],).await?;
        Ok(response.response.project,)
    }
}

async fn list_machines(
    client: &CloudStackClient,
    project_id: &str,
) -> Result<Vec<VirtualMachine,>, Error,>
{
    let response: ListVirtualMachinesResponse = client
        .execute(LIST_VIRTUAL_MACHINES, &[("projectid", project_id,), ("simple", "true",)],)
        .await?;

    let mut machines = response.response.virtualmachine;
    for machine in &mut machines {
        if machine.project_id.is_empty() {
            machine.project_id = project_id.to_owned();
        }
    }
    Ok(machines,)
}

/// Drops projects whose id appears in `ignored`, preserving order.
pub fn filter_projects(projects: Vec<Project,>, ignored: &[String],) -> Vec<Project,>
{
    if ignored.is_empty() {
        return projects;
    }

    let ignored: HashSet<&str,> = ignored.iter().map(String::as_str,).collect();
    projects.into_iter().filter(|project| !ignored.contains(project.id.as_str(),),).collect()
}
