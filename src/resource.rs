//! Resource descriptors: the monitored entities a dashboard fans out over.
//!
//! Resource list file shape (resources.json):
//! [
//!   "/subscriptions/<sub>/resourceGroups/rg1/providers/Microsoft.Compute/virtualMachines/vm1",
//!   { "id": "/subscriptions/<sub>/resourceGroups/rg2/providers/...", "name": "vm2" }
//! ]
//!
//! Order is preserved; it decides which resources survive the max-resources cap
//! and which refId each one gets.

use crate::Result;
use crate::diagnostics;

use anyhow::{Context, bail};
use regex::Regex;
use serde::Deserialize;
use std::fs;
use thiserror::Error;

/// Captures the segment following `resourceGroups` in an ARM resource ID.
const RESOURCE_GROUP_RE: &str = r"(?i)/resourcegroups/([^/]+)";

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("resource id '{id}' has no resource group segment")]
    MissingResourceGroup { id: String },

    #[error("invalid resource id pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// A monitored entity as seen by the dashboard specializer.
pub trait ResourceDescriptor {
    fn resource_group_name(&self) -> std::result::Result<String, ResourceError>;
    fn resource_name(&self) -> String;
}

/// An Azure Resource Manager resource, identified by its full resource ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArmResource {
    pub id: String,
    /// Overrides the name derived from the last ID segment.
    pub name: Option<String>,
}

impl ArmResource {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }
}

impl ResourceDescriptor for ArmResource {
    fn resource_group_name(&self) -> std::result::Result<String, ResourceError> {
        let re = Regex::new(RESOURCE_GROUP_RE)?;
        re.captures(&self.id)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| ResourceError::MissingResourceGroup {
                id: self.id.clone(),
            })
    }

    fn resource_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        self.id
            .split('/')
            .rfind(|s| !s.is_empty())
            .unwrap_or_default()
            .to_string()
    }
}

/// Resource entries as they appear in resources.json.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ResourceSpec {
    // Plain ARM resource id.
    Id(String),
    Explicit {
        id: String,
        #[serde(default)]
        name: Option<String>,
    },
}

impl From<ResourceSpec> for ArmResource {
    fn from(spec: ResourceSpec) -> Self {
        match spec {
            ResourceSpec::Id(id) => ArmResource::new(id),
            ResourceSpec::Explicit { id, name } => ArmResource { id, name },
        }
    }
}

/// Parse resources.json text into an ordered resource list.
pub fn parse_resources(text: &str) -> Result<Vec<ArmResource>> {
    let specs: Vec<ResourceSpec> = serde_json::from_str(text)
        .with_context(|| diagnostics::error_message("error parsing resource list"))?;

    let mut out = Vec::with_capacity(specs.len());
    for (idx, spec) in specs.into_iter().enumerate() {
        let resource = ArmResource::from(spec);
        if resource.id.trim().is_empty() {
            bail!(
                "{}",
                diagnostics::error_message(format!("resource #{} has an empty id", idx + 1))
            );
        }
        out.push(resource);
    }
    Ok(out)
}

/// Read and parse a resource list file.
pub fn load_resources(path: &str) -> Result<Vec<ArmResource>> {
    let text = fs::read_to_string(path)
        .with_context(|| diagnostics::error_message(format!("read resource list {}", path)))?;
    parse_resources(&text)
        .with_context(|| diagnostics::error_message(format!("load resource list {}", path)))
}
