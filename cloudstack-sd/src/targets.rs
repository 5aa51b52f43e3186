// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Transformation of virtual machines into Prometheus target groups.
//!
//! Each machine yields one group per declared `job/port` pair. Pairs come
//! from two sources: the value of a designated resource tag on the machine
//! (comma separated, e.g. `node-exporter/9095,tsuru/8080`) and the static job
//! list supplied at startup. Tag-derived groups are emitted first, then the
//! static ones, and machines keep their input order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::VirtualMachine;

/// Label carrying the scrape job name.
pub const JOB_LABEL: &str = "job";
/// Label carrying the machine project.
pub const PROJECT_LABEL: &str = "project";
/// Label carrying the machine display name.
pub const DISPLAY_NAME_LABEL: &str = "displayname";

/// Prometheus file-based discovery record.
///
/// Labels are kept in a [`BTreeMap`] so the serialized document is stable
/// between cycles.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq,)]
pub struct TargetGroup
{
    /// `host:port` scrape targets.
    pub targets: Vec<String,>,
    /// Labels attached to every target in the group.
    pub labels:  BTreeMap<String, String,>,
}

/// A single `job/port` declaration.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct JobDeclaration<'a,>
{
    /// Job name used for the `job` label.
    pub job:  &'a str,
    /// Port appended to every NIC address.
    pub port: &'a str,
}

impl<'a,> JobDeclaration<'a,>
{
    /// Splits `raw` on its first `/`.
    ///
    /// Declarations without a separator produce an empty job and an empty
    /// port rather than being discarded.
    ///
    /// # Examples
    ///
    /// ```
    /// use cloudstack_sd::JobDeclaration;
    ///
    /// let declaration = JobDeclaration::parse("node-exporter/9100",);
    /// assert_eq!(declaration.job, "node-exporter");
    /// assert_eq!(declaration.port, "9100");
    ///
    /// let malformed = JobDeclaration::parse("node-exporter",);
    /// assert_eq!((malformed.job, malformed.port,), ("", "",));
    /// ```
    pub fn parse(raw: &'a str,) -> Self
    {
        let (job, port,) = raw.split_once('/',).unwrap_or(("", "",),);
        Self {
            job, port,
        }
    }
}

/// Builds target groups for `machines`.
///
/// * `static_jobs` - `job/port` declarations applied to every machine; empty
///   entries are skipped.
/// * `tag_name` - key of the tag holding per-machine declarations; an empty
///   name disables tag lookup.
///
/// A machine without NICs still produces its groups, with empty `targets`.
pub fn build_target_groups(
    machines: &[VirtualMachine],
    static_jobs: &[String],
    tag_name: &str,
) -> Vec<TargetGroup,>
{
    let static_declarations: Vec<JobDeclaration<'_,>,> = static_jobs
        .iter()
        .filter(|raw| !raw.is_empty(),)
        .map(|raw| JobDeclaration::parse(raw,),)
        .collect();

    let mut groups = Vec::with_capacity(machines.len() * static_declarations.len().max(1,),);
    for machine in machines {
        for declaration in tag_declarations(machine, tag_name,) {
            groups.push(target_group(machine, &declaration,),);
        }
        for declaration in &static_declarations {
            groups.push(target_group(machine, declaration,),);
        }
    }
    groups
}

fn tag_declarations<'a,>(
    machine: &'a VirtualMachine,
    tag_name: &str,
) -> impl Iterator<Item = JobDeclaration<'a,>,> + 'a
{
    let enabled = !tag_name.is_empty();
    let tag_name = tag_name.to_owned();
    machine
        .tags
        .iter()
        .filter(move |tag| enabled && tag.key == tag_name,)
        .flat_map(|tag| tag.value.split(',',),)
        .map(JobDeclaration::parse,)
}

fn target_group(machine: &VirtualMachine, declaration: &JobDeclaration<'_,>,) -> TargetGroup
{
    let targets =
        machine.nics.iter().map(|nic| format!("{}:{}", nic.ip_address, declaration.port),).collect();

    let labels = BTreeMap::from([
        (JOB_LABEL.to_owned(), declaration.job.to_owned(),),
        (PROJECT_LABEL.to_owned(), machine.project_label().to_owned(),),
        (DISPLAY_NAME_LABEL.to_owned(), machine.display_name.clone(),),
    ],);

    TargetGroup {
        targets, labels,
    }
}
