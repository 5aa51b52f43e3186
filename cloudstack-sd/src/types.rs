// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Response envelopes returned by the CloudStack API.
//!
//! CloudStack wraps every list response twice: first under a key derived from
//! the command name (`listprojectsresponse`), then under the entity name
//! (`project`). The outer wrapper is mandatory; empty result sets omit the
//! inner list entirely, so every list field defaults to empty.

use serde::{Deserialize, Serialize};

/// Envelope returned by the `listProjects` command.
#[derive(Debug, Deserialize, Clone, Default,)]
pub struct ListProjectsResponse
{
    /// Command-derived outer wrapper.
    #[serde(rename = "listprojectsresponse")]
    pub response: ProjectList,
}

/// Inner list of projects.
#[derive(Debug, Deserialize, Clone, Default,)]
pub struct ProjectList
{
    /// Projects visible to the API key.
    #[serde(default)]
    pub project: Vec<Project,>,
}

/// Envelope returned by the `listVirtualMachines` command.
#[derive(Debug, Deserialize, Clone, Default,)]
pub struct ListVirtualMachinesResponse
{
    /// Command-derived outer wrapper.
    #[serde(rename = "listvirtualmachinesresponse")]
    pub response: VirtualMachineList,
}

/// Inner list of virtual machines.
#[derive(Debug, Deserialize, Clone, Default,)]
pub struct VirtualMachineList
{
    /// Machines belonging to the requested project.
    #[serde(default)]
    pub virtualmachine: Vec<VirtualMachine,>,
}

/// CloudStack grouping of virtual machines.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Default,)]
pub struct Project
{
    /// Project identifier used as the `projectid` request parameter.
    pub id:   String,
    /// Human readable project name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

impl Project
{
    /// Creates a project known only by its identifier.
    pub fn from_id(id: impl Into<String,>,) -> Self
    {
        Self {
            id: id.into(), name: String::new(),
        }
    }
}

/// Virtual machine record as returned by `listVirtualMachines`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Default,)]
pub struct VirtualMachine
{
    /// Display name shown in the CloudStack UI.
    #[serde(default, rename = "displayname")]
    pub display_name: String,
    /// Name of the owning project.
    #[serde(default)]
    pub project:      String,
    /// Identifier of the owning project.
    #[serde(default, rename = "projectid")]
    pub project_id:   String,
    /// Network interfaces in API order.
    #[serde(default, rename = "nic")]
    pub nics:         Vec<Nic,>,
    /// Resource tags attached to the machine.
    #[serde(default)]
    pub tags:         Vec<Tag,>,
}

impl VirtualMachine
{
    /// Value used for the `project` label: the project name, or the project
    /// identifier when the name is unknown.
    pub fn project_label(&self,) -> &str
    {
        if self.project.is_empty() { &self.project_id } else { &self.project }
    }
}

/// Network interface attached to a virtual machine.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Default,)]
pub struct Nic
{
    /// Address assigned to the interface.
    #[serde(default, rename = "ipaddress")]
    pub ip_address: String,
}

/// Key/value resource tag.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Default,)]
pub struct Tag
{
    /// Tag key.
    #[serde(default)]
    pub key:   String,
    /// Tag value.
    #[serde(default)]
    pub value: String,
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn projects_envelope_decodes_nested_list()
    {
        let body = r#"{"listprojectsresponse":{"count":2,"project":[{"id":"p-1","name":"web"},{"id":"p-2"}]}}"#;
        let decoded: ListProjectsResponse = serde_json::from_str(body,).expect("valid envelope",);

        assert_eq!(
            decoded.response.project,
            vec![
                Project {
                    id: "p-1".to_owned(), name: "web".to_owned(),
                },
                Project::from_id("p-2"),
            ]
        );
    }

    #[test]
    fn empty_envelopes_decode_to_empty_lists()
    {
        let projects: ListProjectsResponse =
            serde_json::from_str(r#"{"listprojectsresponse":{}}"#,).expect("valid envelope",);
        let machines: ListVirtualMachinesResponse =
            serde_json::from_str(r#"{"listvirtualmachinesresponse":{}}"#,).expect("valid envelope",);

        assert!(projects.response.project.is_empty());
        assert!(machines.response.virtualmachine.is_empty());
    }

    #[test]
    fn virtual_machine_decodes_nics_and_tags()
    {
        let body = r#"{"listvirtualmachinesresponse":{"virtualmachine":[{
            "id":"vm-1",
            "displayname":"web-01",
            "project":"web",
            "projectid":"p-1",
            "nic":[{"ipaddress":"10.0.0.5","isdefault":true},{"ipaddress":"10.0.1.5"}],
            "tags":[{"key":"PROMETHEUS_ENDPOINTS","value":"node/9100"}]
        }]}}"#;
        let decoded: ListVirtualMachinesResponse = serde_json::from_str(body,).expect("valid envelope",);
        let machine = &decoded.response.virtualmachine[0];

        assert_eq!(machine.display_name, "web-01");
        assert_eq!(machine.project, "web");
        assert_eq!(machine.project_id, "p-1");
        let addresses: Vec<&str,> = machine.nics.iter().map(|nic| nic.ip_address.as_str(),).collect();
        assert_eq!(addresses, ["10.0.0.5", "10.0.1.5"]);
        assert_eq!(
            machine.tags,
            vec![Tag {
                key: "PROMETHEUS_ENDPOINTS".to_owned(), value: "node/9100".to_owned(),
            }]
        );
    }

    #[test]
    fn project_label_falls_back_to_identifier()
    {
        let mut machine = VirtualMachine {
            project_id: "p-1".to_owned(), ..VirtualMachine::default()
        };
        assert_eq!(machine.project_label(), "p-1");

        machine.project = "web".to_owned();
        assert_eq!(machine.project_label(), "web");
    }

    #[test]
    fn wrong_envelope_shape_is_rejected()
    {
        let result = serde_json::from_str::<ListProjectsResponse,>(r#"{"listprojectsresponse":{"project":"nope"}}"#,);
        assert!(result.is_err());
    }

    #[test]
    fn missing_outer_wrapper_is_rejected()
    {
        let body = r#"{"errorresponse":{"errorcode":431,"errortext":"unable to verify user credentials"}}"#;
        assert!(serde_json::from_str::<ListProjectsResponse,>(body,).is_err());
    }
}
