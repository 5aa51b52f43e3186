// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Prometheus file-based service discovery for CloudStack.
//!
//! The library signs and issues CloudStack API calls, collects virtual
//! machines across projects concurrently, and flattens them into Prometheus
//! target groups. Static `job/port` declarations and a per-machine tag
//! convention decide which ports are scraped. The resulting document is
//! written atomically so Prometheus never observes a partial file.

mod client;
mod config;
mod discovery;
mod error;
mod fetcher;
mod output;
mod signer;
mod targets;
mod types;

pub use client::{CloudStackClient, ClientConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT};
pub use config::{ConfigFile, DEFAULT_DESTINATION, DEFAULT_INTERVAL, Settings};
pub use discovery::{CycleReport, DiscoveryJob};
pub use error::{Error, io_error};
pub use fetcher::{MachineFetcher, filter_projects};
pub use output::write_target_groups;
pub use signer::{Credentials, canonical_query};
pub use targets::{
    DISPLAY_NAME_LABEL, JOB_LABEL, JobDeclaration, PROJECT_LABEL, TargetGroup, build_target_groups,
};
pub use types::{
    ListProjectsResponse, ListVirtualMachinesResponse, Nic, Project, ProjectList, Tag,
    VirtualMachine, VirtualMachineList,
};
