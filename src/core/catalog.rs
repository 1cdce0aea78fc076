use crate::core::documents::fetch_all;
use crate::domain::model::{spec_key, DatacenterSpec, DatacenterStyle, Focus, Module};
use crate::domain::ports::{Collection, DocumentStore};
use crate::utils::error::{DesignerError, Result};
use std::collections::HashMap;

/// Immutable snapshot of the reference data: modules, styles and specs.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    modules: HashMap<String, Module>,
    styles: HashMap<String, DatacenterStyle>,
    specs: HashMap<String, DatacenterSpec>,
}

impl Catalog {
    pub fn new(
        modules: impl IntoIterator<Item = Module>,
        styles: impl IntoIterator<Item = DatacenterStyle>,
        specs: impl IntoIterator<Item = DatacenterSpec>,
    ) -> Self {
        Self {
            modules: modules.into_iter().map(|m| (m.id.clone(), m)).collect(),
            styles: styles.into_iter().map(|s| (s.id.clone(), s)).collect(),
            specs: specs.into_iter().map(|s| (s.key(), s)).collect(),
        }
    }

    pub async fn load(store: &dyn DocumentStore) -> Result<Self> {
        let modules: Vec<Module> = fetch_all(store, Collection::Modules).await?;
        let styles: Vec<DatacenterStyle> = fetch_all(store, Collection::DatacenterStyles).await?;
        let specs: Vec<DatacenterSpec> = fetch_all(store, Collection::DatacenterSpecs).await?;

        tracing::debug!(
            "Catalog loaded: {} modules, {} styles, {} specs",
            modules.len(),
            styles.len(),
            specs.len()
        );

        Ok(Self::new(modules, styles, specs))
    }

    pub fn get_module(&self, id: &str) -> Result<&Module> {
        self.modules
            .get(id)
            .ok_or_else(|| DesignerError::not_found("module", id))
    }

    pub fn get_style(&self, id: &str) -> Result<&DatacenterStyle> {
        self.styles
            .get(id)
            .ok_or_else(|| DesignerError::not_found("datacenter style", id))
    }

    pub fn get_spec(&self, component_id: &str, unit: &str) -> Result<&DatacenterSpec> {
        let key = spec_key(component_id, unit);
        self.specs
            .get(&key)
            .ok_or_else(|| DesignerError::not_found("datacenter spec", key))
    }

    /// All specs of one component, ordered by unit.
    pub fn specs_for_component(&self, component_id: &str) -> Vec<&DatacenterSpec> {
        let mut specs: Vec<&DatacenterSpec> = self
            .specs
            .values()
            .filter(|s| s.component_id == component_id)
            .collect();
        specs.sort_by(|a, b| a.unit.cmp(&b.unit));
        specs
    }

    /// Specs for a component set, in the order the components are given.
    /// Unknown component identifiers contribute nothing.
    pub fn specs_for(&self, component_ids: &[String]) -> Vec<&DatacenterSpec> {
        component_ids
            .iter()
            .flat_map(|id| self.specs_for_component(id))
            .collect()
    }

    pub fn modules(&self) -> Vec<&Module> {
        let mut modules: Vec<&Module> = self.modules.values().collect();
        modules.sort_by(|a, b| a.id.cmp(&b.id));
        modules
    }

    pub fn styles(&self) -> Vec<&DatacenterStyle> {
        let mut styles: Vec<&DatacenterStyle> = self.styles.values().collect();
        styles.sort_by(|a, b| a.id.cmp(&b.id));
        styles
    }

    pub fn styles_by_focus(&self, focus: Focus) -> Vec<&DatacenterStyle> {
        self.styles()
            .into_iter()
            .filter(|s| s.focus == focus)
            .collect()
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }
}
