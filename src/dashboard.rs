//! Dashboard specializer: rewrites a template for a concrete resource list.
//!
//! For every panel in every row:
//! 1) "datasource" is replaced with the configured data source name.
//! 2) The first entry of "targets" becomes the query template; other entries are dropped.
//! 3) One target per resource (up to max_resources) is generated from that template,
//!    with azureMonitor.resourceGroup / azureMonitor.resourceName filled in and
//!    refId set to "1", "2", ... in resource order.
//!
//! Panels with an empty "targets" list keep it empty.

use crate::resource::{ResourceDescriptor, ResourceError};
use crate::template::{
    ROOT_PATH, ShapeError, TemplateTree, as_array, as_array_mut, as_object, as_object_mut,
    child_path, field, field_mut, index_path,
};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

const TITLE: &str = "title";
const ROWS: &str = "rows";
const PANELS: &str = "panels";
const DATASOURCE: &str = "datasource";
const TARGETS: &str = "targets";
const AZURE_MONITOR: &str = "azureMonitor";
const RESOURCE_GROUP: &str = "resourceGroup";
const RESOURCE_NAME: &str = "resourceName";
const REF_ID: &str = "refId";

#[derive(Debug, Error)]
pub enum SpecializeError {
    #[error("template shape mismatch: {0}")]
    Shape(#[from] ShapeError),

    #[error("resource #{position} ('{name}'): {source}")]
    Resource {
        position: usize,
        name: String,
        #[source]
        source: ResourceError,
    },
}

/// Per-run parameters for [`update`].
#[derive(Debug, Clone, Default)]
pub struct SpecializeParams {
    pub title: String,
    pub data_source_name: String,
    pub max_resources: usize,
    /// Appended to every resource name as "<name>/<sub_resource_name>" when non-empty.
    pub sub_resource_name: String,
}

/// Counts collected while specializing, reported by the CLI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    pub rows: usize,
    pub panels: usize,
    pub panels_fanned_out: usize,
    pub targets_generated: usize,
}

/// Specialize `tree` in place.
///
/// On error the tree is left exactly as it was; a half-specialized dashboard
/// is never observable.
pub fn update<R: ResourceDescriptor>(
    tree: &mut TemplateTree,
    params: &SpecializeParams,
    resources: &[R],
) -> Result<UpdateSummary, SpecializeError> {
    let effective = params.max_resources.min(resources.len());
    if effective < resources.len() {
        warn!(
            "using {} of {} resources (max resources = {})",
            effective,
            resources.len(),
            params.max_resources
        );
    }
    let resources = &resources[..effective];

    let mut work = tree.root().clone();
    let summary = specialize_root(&mut work, params, resources)?;
    *tree.root_mut() = work;
    Ok(summary)
}

fn specialize_root<R: ResourceDescriptor>(
    root: &mut Map<String, Value>,
    params: &SpecializeParams,
    resources: &[R],
) -> Result<UpdateSummary, SpecializeError> {
    let mut summary = UpdateSummary::default();

    root.insert(TITLE.to_string(), Value::String(params.title.clone()));

    let rows_path = child_path(ROOT_PATH, ROWS);
    let rows = as_array_mut(field_mut(root, ROWS, ROOT_PATH)?, &rows_path)?;
    for (ri, row) in rows.iter_mut().enumerate() {
        let row_path = index_path(&rows_path, ri);
        let row = as_object_mut(row, &row_path)?;
        summary.rows += 1;

        let panels_path = child_path(&row_path, PANELS);
        let panels = as_array_mut(field_mut(row, PANELS, &row_path)?, &panels_path)?;
        for (pi, panel) in panels.iter_mut().enumerate() {
            let panel_path = index_path(&panels_path, pi);
            let panel = as_object_mut(panel, &panel_path)?;
            summary.panels += 1;

            panel.insert(
                DATASOURCE.to_string(),
                Value::String(params.data_source_name.clone()),
            );

            if let Some(targets) = fan_out_targets(panel, &panel_path, params, resources)? {
                summary.panels_fanned_out += 1;
                summary.targets_generated += targets.len();
                panel.insert(TARGETS.to_string(), Value::Array(targets));
            }
        }
    }

    Ok(summary)
}

/// Build the replacement "targets" list for one panel.
///
/// Returns `None` when the panel has no targets to use as a template.
fn fan_out_targets<R: ResourceDescriptor>(
    panel: &Map<String, Value>,
    panel_path: &str,
    params: &SpecializeParams,
    resources: &[R],
) -> Result<Option<Vec<Value>>, SpecializeError> {
    let targets_path = child_path(panel_path, TARGETS);
    let targets = as_array(field(panel, TARGETS, panel_path)?, &targets_path)?;
    let Some(first) = targets.first() else {
        return Ok(None);
    };
    if targets.len() > 1 {
        debug!(
            "{}: using first of {} targets as template, dropping the rest",
            targets_path,
            targets.len()
        );
    }

    let target_path = index_path(&targets_path, 0);
    let target = as_object(first, &target_path)?;
    let monitor_path = child_path(&target_path, AZURE_MONITOR);
    let monitor = as_object(field(target, AZURE_MONITOR, &target_path)?, &monitor_path)?;

    let mut out = Vec::with_capacity(resources.len());
    for (idx, resource) in resources.iter().enumerate() {
        let position = idx + 1;

        let resource_group =
            resource
                .resource_group_name()
                .map_err(|source| SpecializeError::Resource {
                    position,
                    name: resource.resource_name(),
                    source,
                })?;

        let mut new_monitor = shallow_clone(monitor);
        new_monitor.insert(RESOURCE_GROUP.to_string(), Value::String(resource_group));
        new_monitor.insert(
            RESOURCE_NAME.to_string(),
            Value::String(qualified_resource_name(
                resource.resource_name(),
                &params.sub_resource_name,
            )),
        );

        let mut new_target = shallow_clone(target);
        new_target.insert(AZURE_MONITOR.to_string(), Value::Object(new_monitor));
        new_target.insert(REF_ID.to_string(), Value::String(position.to_string()));
        out.push(Value::Object(new_target));
    }

    Ok(Some(out))
}

/// New mapping with the same keys and values as `map`.
///
/// Only top-level keys are ever overwritten on the copy. The tree owns its
/// values, so nested values are copied along with their keys and every copy
/// is an independent mapping.
pub fn shallow_clone(map: &Map<String, Value>) -> Map<String, Value> {
    map.clone()
}

/// Address a sub-resource ARM does not track on its own, e.g. the "default"
/// blob service of a storage account: "acct1" + "default" => "acct1/default".
fn qualified_resource_name(name: String, sub_resource_name: &str) -> String {
    if sub_resource_name.is_empty() {
        name
    } else {
        format!("{}/{}", name, sub_resource_name)
    }
}
