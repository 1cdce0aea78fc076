use crate::core::catalog::Catalog;
use crate::core::documents::{fetch, fetch_all, to_document};
use crate::core::evaluator::{LayoutVerdict, SpecEvaluator};
use crate::core::layout::Layout;
use crate::domain::model::{
    spec_key, CatalogBundle, Datacenter, DatacenterSpec, DatacenterStyle, DatacenterUpdate, Focus,
    Module, NewDatacenter, PlacedModule, PortRecord, Rotation, SpecRecord,
};
use crate::domain::ports::{Collection, DocumentStore};
use crate::utils::error::{DesignerError, Result};
use crate::utils::validation::validate_record_name;
use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Plain request to put one module on a datacenter grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRequest {
    pub module_id: String,
    pub x: i64,
    pub y: i64,
    #[serde(default)]
    pub rotation: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub modules: usize,
    pub styles: usize,
    pub specs: usize,
}

/// Request boundary of the designer: catalog administration, datacenter
/// CRUD, placement and evaluation over one document store.
///
/// Placements and removals on the same datacenter are serialized by a
/// per-datacenter mutex; different datacenters proceed in parallel.
/// Catalog writes take `catalog_guard` exclusively so no placement can
/// observe a module that is being deleted or a style that is being resized.
pub struct DesignerService<S: DocumentStore> {
    store: S,
    catalog: parking_lot::RwLock<Arc<Catalog>>,
    catalog_guard: RwLock<()>,
    locks: DashMap<String, Arc<Mutex<()>>>,
    evaluator: SpecEvaluator,
}

impl<S: DocumentStore> DesignerService<S> {
    pub async fn new(store: S, evaluator: SpecEvaluator) -> Result<Self> {
        let catalog = Catalog::load(&store).await?;
        Ok(Self {
            store,
            catalog: parking_lot::RwLock::new(Arc::new(catalog)),
            catalog_guard: RwLock::new(()),
            locks: DashMap::new(),
            evaluator,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current catalog snapshot; unaffected by later catalog writes.
    pub fn catalog(&self) -> Arc<Catalog> {
        self.catalog.read().clone()
    }

    pub async fn reload_catalog(&self) -> Result<()> {
        let catalog = Catalog::load(&self.store).await?;
        *self.catalog.write() = Arc::new(catalog);
        Ok(())
    }

    /// Lock entries are only created for datacenters that exist in the store.
    async fn datacenter_lock(&self, id: &str) -> Result<Arc<Mutex<()>>> {
        if let Some(lock) = self.locks.get(id) {
            return Ok(lock.value().clone());
        }
        self.get_datacenter(id).await?;
        Ok(self
            .locks
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone())
    }

    /// Reads the datacenter while its lock is held. When it has vanished in
    /// the meantime, the lock entry is dropped unless someone else waits on it.
    async fn load_locked(&self, id: &str, held: &Arc<Mutex<()>>) -> Result<Datacenter> {
        match self.get_datacenter(id).await {
            Err(e @ DesignerError::NotFound { .. }) => {
                self.release_lock(id, held);
                Err(e)
            }
            other => other,
        }
    }

    fn release_lock(&self, id: &str, held: &Arc<Mutex<()>>) {
        // the map and `held` account for two references
        self.locks.remove_if(id, |_, lock| {
            Arc::ptr_eq(lock, held) && Arc::strong_count(lock) <= 2
        });
    }

    // ---- modules ----

    pub async fn create_module(&self, mut module: Module) -> Result<Module> {
        module.validate()?;
        if module.id.trim().is_empty() {
            module.id = Uuid::new_v4().to_string();
        }

        let _catalog = self.catalog_guard.write().await;
        self.insert_new(Collection::Modules, "module", &module.id, &module)
            .await?;
        self.reload_catalog().await?;

        tracing::info!("Created module {} ({})", module.id, module.name);
        Ok(module)
    }

    pub fn get_module(&self, id: &str) -> Result<Module> {
        self.catalog().get_module(id).cloned()
    }

    pub fn list_modules(&self) -> Vec<Module> {
        self.catalog().modules().into_iter().cloned().collect()
    }

    pub fn module_count(&self) -> usize {
        self.catalog().module_count()
    }

    /// Modules referenced by a placement are never edited in place: the new
    /// definition is stored under a fresh identifier, which is returned.
    pub async fn update_module(&self, id: &str, mut module: Module) -> Result<Module> {
        module.validate()?;

        let _catalog = self.catalog_guard.write().await;
        if self.store.get(Collection::Modules, id).await?.is_none() {
            return Err(DesignerError::not_found("module", id));
        }

        if self.module_is_placed(id).await? {
            module.id = Uuid::new_v4().to_string();
            self.store
                .insert(Collection::Modules, &module.id, to_document(&module)?)
                .await?;
            tracing::info!(
                "Module {} is placed, stored new version as {}",
                id,
                module.id
            );
        } else {
            module.id = id.to_string();
            self.store
                .replace(Collection::Modules, id, to_document(&module)?)
                .await?;
            tracing::info!("Updated module {}", id);
        }

        self.reload_catalog().await?;
        Ok(module)
    }

    pub async fn delete_module(&self, id: &str) -> Result<()> {
        let _catalog = self.catalog_guard.write().await;
        if self.module_is_placed(id).await? {
            return Err(DesignerError::InUse {
                kind: "module",
                id: id.to_string(),
                message: "it is placed in at least one datacenter".to_string(),
            });
        }
        if !self.store.delete(Collection::Modules, id).await? {
            return Err(DesignerError::not_found("module", id));
        }
        self.reload_catalog().await?;

        tracing::info!("Deleted module {}", id);
        Ok(())
    }

    /// Imports flat port rows; rows sharing an `ID` form one module.
    /// Nothing is written unless every row converts and no id is taken.
    pub async fn import_module_ports(&self, records: &[PortRecord]) -> Result<Vec<String>> {
        let modules = Module::from_port_records(records)?;
        self.import_modules(modules).await
    }

    pub async fn import_modules(&self, modules: Vec<Module>) -> Result<Vec<String>> {
        let documents = module_documents(&modules)?;

        let _catalog = self.catalog_guard.write().await;
        self.ensure_new_ids(Collection::Modules, "module", &documents)
            .await?;
        let ids = self.insert_batch(Collection::Modules, documents).await?;
        self.reload_catalog().await?;

        tracing::info!("📦 Imported {} modules", ids.len());
        Ok(ids)
    }

    async fn module_is_placed(&self, module_id: &str) -> Result<bool> {
        let datacenters: Vec<Datacenter> = fetch_all(&self.store, Collection::Datacenters).await?;
        Ok(datacenters
            .iter()
            .flat_map(|dc| dc.placements.iter())
            .any(|p| p.module_id == module_id))
    }

    // ---- styles ----

    pub async fn create_style(&self, mut style: DatacenterStyle) -> Result<DatacenterStyle> {
        style.validate()?;
        if style.id.trim().is_empty() {
            style.id = Uuid::new_v4().to_string();
        }

        let _catalog = self.catalog_guard.write().await;
        self.insert_new(Collection::DatacenterStyles, "datacenter style", &style.id, &style)
            .await?;
        self.reload_catalog().await?;

        tracing::info!("Created datacenter style {} ({})", style.id, style.name);
        Ok(style)
    }

    pub fn get_style(&self, id: &str) -> Result<DatacenterStyle> {
        self.catalog().get_style(id).cloned()
    }

    pub fn list_styles(&self) -> Vec<DatacenterStyle> {
        self.catalog().styles().into_iter().cloned().collect()
    }

    pub fn styles_by_focus(&self, focus: Focus) -> Vec<DatacenterStyle> {
        self.catalog()
            .styles_by_focus(focus)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Rejected with `OutOfBounds` when a datacenter using the style would
    /// no longer fit its placements on the new grid.
    pub async fn update_style(&self, id: &str, mut style: DatacenterStyle) -> Result<DatacenterStyle> {
        style.validate()?;
        style.id = id.to_string();

        let _catalog = self.catalog_guard.write().await;
        if self.store.get(Collection::DatacenterStyles, id).await?.is_none() {
            return Err(DesignerError::not_found("datacenter style", id));
        }
        for datacenter in self.datacenters_by_style(id).await? {
            Layout::for_datacenter(&datacenter, &style)?;
        }

        self.store
            .replace(Collection::DatacenterStyles, id, to_document(&style)?)
            .await?;
        self.reload_catalog().await?;

        tracing::info!("Updated datacenter style {}", id);
        Ok(style)
    }

    /// Datacenters keep their (now dangling) style reference.
    pub async fn delete_style(&self, id: &str) -> Result<()> {
        let _catalog = self.catalog_guard.write().await;
        if !self.store.delete(Collection::DatacenterStyles, id).await? {
            return Err(DesignerError::not_found("datacenter style", id));
        }
        self.reload_catalog().await?;

        tracing::info!("Deleted datacenter style {}", id);
        Ok(())
    }

    pub async fn import_styles(&self, styles: Vec<DatacenterStyle>) -> Result<Vec<String>> {
        if styles.is_empty() {
            return Err(DesignerError::invalid_record(
                "datacenter style",
                "no styles to import",
            ));
        }
        let documents = style_documents(styles)?;

        let _catalog = self.catalog_guard.write().await;
        self.ensure_new_ids(Collection::DatacenterStyles, "datacenter style", &documents)
            .await?;
        let ids = self
            .insert_batch(Collection::DatacenterStyles, documents)
            .await?;
        self.reload_catalog().await?;

        tracing::info!("📦 Imported {} datacenter styles", ids.len());
        Ok(ids)
    }

    pub async fn delete_all_styles(&self, confirm: bool) -> Result<usize> {
        if !confirm {
            return Err(DesignerError::ConfirmationRequired {
                message: "deleting all datacenter styles cannot be undone".to_string(),
            });
        }

        let _catalog = self.catalog_guard.write().await;
        let deleted = self.store.clear(Collection::DatacenterStyles).await?;
        self.reload_catalog().await?;

        tracing::warn!("Deleted all {} datacenter styles", deleted);
        Ok(deleted)
    }

    // ---- specs ----

    pub async fn create_spec(&self, spec: DatacenterSpec) -> Result<DatacenterSpec> {
        spec.validate()?;

        let _catalog = self.catalog_guard.write().await;
        self.insert_new(Collection::DatacenterSpecs, "datacenter spec", &spec.key(), &spec)
            .await?;
        self.reload_catalog().await?;

        tracing::info!("Created datacenter spec {}", spec.key());
        Ok(spec)
    }

    pub fn get_spec(&self, component_id: &str, unit: &str) -> Result<DatacenterSpec> {
        self.catalog().get_spec(component_id, unit).cloned()
    }

    pub fn specs_for_component(&self, component_id: &str) -> Vec<DatacenterSpec> {
        self.catalog()
            .specs_for_component(component_id)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn delete_spec(&self, component_id: &str, unit: &str) -> Result<()> {
        let key = spec_key(component_id, unit);

        let _catalog = self.catalog_guard.write().await;
        if !self.store.delete(Collection::DatacenterSpecs, &key).await? {
            return Err(DesignerError::not_found("datacenter spec", key));
        }
        self.reload_catalog().await?;
        Ok(())
    }

    pub async fn import_specs(&self, records: &[SpecRecord]) -> Result<Vec<String>> {
        let documents = spec_documents(records)?;

        let _catalog = self.catalog_guard.write().await;
        self.ensure_new_ids(Collection::DatacenterSpecs, "datacenter spec", &documents)
            .await?;
        let keys = self
            .insert_batch(Collection::DatacenterSpecs, documents)
            .await?;
        self.reload_catalog().await?;

        tracing::info!("📦 Imported {} datacenter specs", keys.len());
        Ok(keys)
    }

    /// Converts and checks every record of the bundle before writing any of
    /// them, so a rejected bundle leaves the catalog as it was.
    pub async fn import_bundle(&self, bundle: CatalogBundle) -> Result<ImportSummary> {
        let mut modules = bundle.modules;
        modules.extend(Module::from_port_records(&bundle.module_ports)?);

        let modules = module_documents(&modules)?;
        let styles = style_documents(bundle.styles)?;
        let specs = spec_documents(&bundle.specs)?;

        let _catalog = self.catalog_guard.write().await;
        self.ensure_new_ids(Collection::Modules, "module", &modules)
            .await?;
        self.ensure_new_ids(Collection::DatacenterStyles, "datacenter style", &styles)
            .await?;
        self.ensure_new_ids(Collection::DatacenterSpecs, "datacenter spec", &specs)
            .await?;

        let summary = ImportSummary {
            modules: self.insert_batch(Collection::Modules, modules).await?.len(),
            styles: self
                .insert_batch(Collection::DatacenterStyles, styles)
                .await?
                .len(),
            specs: self
                .insert_batch(Collection::DatacenterSpecs, specs)
                .await?
                .len(),
        };
        self.reload_catalog().await?;

        tracing::info!(
            "📦 Imported bundle: {} modules, {} styles, {} specs",
            summary.modules,
            summary.styles,
            summary.specs
        );
        Ok(summary)
    }

    // ---- datacenters ----

    pub async fn create_datacenter(&self, request: NewDatacenter) -> Result<Datacenter> {
        validate_record_name("datacenter", &request.name)?;
        self.catalog().get_style(&request.style_id)?;

        let now = Utc::now();
        let datacenter = Datacenter {
            id: Uuid::new_v4().to_string(),
            name: request.name,
            description: request.description,
            style_id: request.style_id,
            spec_ids: request.spec_ids,
            placements: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.store
            .insert(
                Collection::Datacenters,
                &datacenter.id,
                to_document(&datacenter)?,
            )
            .await?;

        tracing::info!("🏗️ Created datacenter {} ({})", datacenter.id, datacenter.name);
        Ok(datacenter)
    }

    pub async fn get_datacenter(&self, id: &str) -> Result<Datacenter> {
        fetch(&self.store, Collection::Datacenters, id)
            .await?
            .ok_or_else(|| DesignerError::not_found("datacenter", id))
    }

    pub async fn list_datacenters(&self) -> Result<Vec<Datacenter>> {
        fetch_all(&self.store, Collection::Datacenters).await
    }

    pub async fn datacenters_by_style(&self, style_id: &str) -> Result<Vec<Datacenter>> {
        Ok(self
            .list_datacenters()
            .await?
            .into_iter()
            .filter(|dc| dc.style_id == style_id)
            .collect())
    }

    /// Case-insensitive match on name or description.
    pub async fn search_datacenters(&self, query: &str, limit: usize) -> Result<Vec<Datacenter>> {
        let needle = query.to_lowercase();
        Ok(self
            .list_datacenters()
            .await?
            .into_iter()
            .filter(|dc| {
                dc.name.to_lowercase().contains(&needle)
                    || dc
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
            })
            .take(limit)
            .collect())
    }

    /// A style change re-checks the layout against the new grid.
    pub async fn update_datacenter(&self, id: &str, update: DatacenterUpdate) -> Result<Datacenter> {
        let _catalog = self.catalog_guard.read().await;
        let lock = self.datacenter_lock(id).await?;
        let _guard = lock.lock().await;

        let mut datacenter = self.load_locked(id, &lock).await?;

        if let Some(name) = update.name {
            validate_record_name("datacenter", &name)?;
            datacenter.name = name;
        }
        if let Some(description) = update.description {
            datacenter.description = Some(description);
        }
        if let Some(spec_ids) = update.spec_ids {
            datacenter.spec_ids = spec_ids;
        }
        if let Some(style_id) = update.style_id {
            let catalog = self.catalog();
            let style = catalog.get_style(&style_id)?;
            Layout::for_datacenter(&datacenter, style)?;
            datacenter.style_id = style_id;
        }

        datacenter.updated_at = Utc::now();
        self.save_datacenter(&datacenter).await?;

        tracing::info!("Updated datacenter {}", id);
        Ok(datacenter)
    }

    /// Placements are embedded, so they go with the datacenter.
    pub async fn delete_datacenter(&self, id: &str) -> Result<()> {
        let lock = self.datacenter_lock(id).await?;
        {
            let _guard = lock.lock().await;
            if !self.store.delete(Collection::Datacenters, id).await? {
                drop(_guard);
                self.release_lock(id, &lock);
                return Err(DesignerError::not_found("datacenter", id));
            }
        }
        self.locks.remove(id);

        tracing::info!("Deleted datacenter {} and its placements", id);
        Ok(())
    }

    // ---- layout ----

    pub async fn place_module(&self, datacenter_id: &str, request: &PlacementRequest) -> Result<String> {
        let rotation = Rotation::try_from(request.rotation)?;

        let _catalog = self.catalog_guard.read().await;
        let lock = self.datacenter_lock(datacenter_id).await?;
        let _guard = lock.lock().await;

        let mut datacenter = self.load_locked(datacenter_id, &lock).await?;
        let catalog = self.catalog();
        let style = catalog.get_style(&datacenter.style_id)?;
        let module = catalog.get_module(&request.module_id)?;

        let mut layout = Layout::for_datacenter(&datacenter, style)?;
        let placement_id = layout.place(module, request.x, request.y, rotation)?;

        datacenter.placements = layout.into_placements();
        datacenter.updated_at = Utc::now();
        self.save_datacenter(&datacenter).await?;

        tracing::info!(
            datacenter = %datacenter_id,
            "📍 Placed {} at ({}, {}) as {}",
            request.module_id,
            request.x,
            request.y,
            placement_id
        );
        Ok(placement_id)
    }

    pub async fn remove_placement(&self, datacenter_id: &str, placement_id: &str) -> Result<PlacedModule> {
        let lock = self.datacenter_lock(datacenter_id).await?;
        let _guard = lock.lock().await;

        let mut datacenter = self.load_locked(datacenter_id, &lock).await?;
        let index = datacenter
            .placements
            .iter()
            .position(|p| p.id == placement_id)
            .ok_or_else(|| DesignerError::not_found("placement", placement_id))?;
        let removed = datacenter.placements.remove(index);

        datacenter.updated_at = Utc::now();
        self.save_datacenter(&datacenter).await?;

        tracing::info!(datacenter = %datacenter_id, "Removed placement {}", placement_id);
        Ok(removed)
    }

    pub async fn list_placements(&self, datacenter_id: &str) -> Result<Vec<PlacedModule>> {
        Ok(self.get_datacenter(datacenter_id).await?.placements)
    }

    /// Evaluates one stored snapshot of the datacenter against the catalog
    /// snapshot current at call time.
    pub async fn evaluate(&self, datacenter_id: &str) -> Result<LayoutVerdict> {
        let datacenter = self.get_datacenter(datacenter_id).await?;
        let catalog = self.catalog();
        let style = catalog.get_style(&datacenter.style_id)?;

        let verdict = self.evaluator.evaluate(
            &datacenter.placements,
            style,
            &datacenter.spec_ids,
            &catalog,
        );

        tracing::debug!(
            datacenter = %datacenter_id,
            feasible = verdict.is_feasible(),
            "Evaluated {} placements against {} specs",
            verdict.placed_modules,
            verdict.components.len()
        );
        Ok(verdict)
    }

    /// Evaluates several datacenters and orders them best first.
    pub async fn rank_datacenters(&self, ids: &[String]) -> Result<Vec<(String, LayoutVerdict)>> {
        let mut ranked = Vec::with_capacity(ids.len());
        for id in ids {
            ranked.push((id.clone(), self.evaluate(id).await?));
        }
        ranked.sort_by(|a, b| a.1.compare(&b.1));
        Ok(ranked)
    }

    // ---- helpers ----

    async fn insert_new<T: Serialize>(
        &self,
        collection: Collection,
        kind: &'static str,
        id: &str,
        record: &T,
    ) -> Result<()> {
        if self.store.get(collection, id).await?.is_some() {
            return Err(DesignerError::invalid_record(
                kind,
                format!("{} already exists", id),
            ));
        }
        self.store.insert(collection, id, to_document(record)?).await
    }

    /// Rejects ids repeated within the batch or already stored.
    async fn ensure_new_ids(
        &self,
        collection: Collection,
        kind: &'static str,
        documents: &[(String, Value)],
    ) -> Result<()> {
        let mut seen = HashSet::new();
        for (id, _) in documents {
            if !seen.insert(id.as_str()) || self.store.get(collection, id).await?.is_some() {
                return Err(DesignerError::invalid_record(
                    kind,
                    format!("{} {} already exists", kind, id),
                ));
            }
        }
        Ok(())
    }

    async fn insert_batch(
        &self,
        collection: Collection,
        documents: Vec<(String, Value)>,
    ) -> Result<Vec<String>> {
        let mut ids = Vec::with_capacity(documents.len());
        for (id, document) in documents {
            self.store.insert(collection, &id, document).await?;
            ids.push(id);
        }
        Ok(ids)
    }

    async fn save_datacenter(&self, datacenter: &Datacenter) -> Result<()> {
        if !self
            .store
            .replace(
                Collection::Datacenters,
                &datacenter.id,
                to_document(datacenter)?,
            )
            .await?
        {
            return Err(DesignerError::not_found("datacenter", &datacenter.id));
        }
        Ok(())
    }
}

fn module_documents(modules: &[Module]) -> Result<Vec<(String, Value)>> {
    modules
        .iter()
        .map(|module| -> Result<(String, Value)> {
            module.validate()?;
            Ok((module.id.clone(), to_document(module)?))
        })
        .collect()
}

/// Styles without an id get a fresh one.
fn style_documents(styles: Vec<DatacenterStyle>) -> Result<Vec<(String, Value)>> {
    styles
        .into_iter()
        .map(|mut style| -> Result<(String, Value)> {
            style.validate()?;
            if style.id.trim().is_empty() {
                style.id = Uuid::new_v4().to_string();
            }
            Ok((style.id.clone(), to_document(&style)?))
        })
        .collect()
}

fn spec_documents(records: &[SpecRecord]) -> Result<Vec<(String, Value)>> {
    records
        .iter()
        .map(|record| -> Result<(String, Value)> {
            let spec = DatacenterSpec::try_from(record)?;
            Ok((spec.key(), to_document(&spec)?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;
    use crate::domain::model::{Objective, Port};

    async fn service() -> DesignerService<MemoryStore> {
        let service = DesignerService::new(MemoryStore::new(), SpecEvaluator::default())
            .await
            .unwrap();
        service
            .create_style(DatacenterStyle {
                id: "compact".to_string(),
                name: "Compact".to_string(),
                description: "5x5 hall".to_string(),
                width: 5,
                height: 5,
                grid_connection: 0,
                water_connection: 0,
                processing: 0,
                storage: 0,
                price: Some(1000),
                focus: Focus::Processing,
                recommended_modules: vec![],
            })
            .await
            .unwrap();
        service
            .create_module(Module::new("gen", "Generator", 1, 1, vec![Port::output("Power", 100)]).unwrap())
            .await
            .unwrap();
        service
    }

    async fn datacenter(service: &DesignerService<MemoryStore>) -> Datacenter {
        service
            .create_datacenter(NewDatacenter {
                name: "Hall A".to_string(),
                description: None,
                style_id: "compact".to_string(),
                spec_ids: vec!["dc".to_string()],
            })
            .await
            .unwrap()
    }

    fn at(module_id: &str, x: i64, y: i64) -> PlacementRequest {
        PlacementRequest {
            module_id: module_id.to_string(),
            x,
            y,
            rotation: 0,
        }
    }

    #[tokio::test]
    async fn test_failed_placement_leaves_document_untouched() {
        let service = service().await;
        let dc = datacenter(&service).await;
        service.place_module(&dc.id, &at("gen", 0, 0)).await.unwrap();
        let before = service.get_datacenter(&dc.id).await.unwrap();

        let err = service.place_module(&dc.id, &at("gen", 0, 0)).await.unwrap_err();
        assert!(matches!(err, DesignerError::Overlap { .. }));
        let err = service
            .place_module(
                &dc.id,
                &PlacementRequest {
                    rotation: 45,
                    ..at("gen", 2, 2)
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DesignerError::InvalidGeometry { .. }));

        assert_eq!(service.get_datacenter(&dc.id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_placed_module_is_versioned_not_edited() {
        let service = service().await;
        let dc = datacenter(&service).await;
        service.place_module(&dc.id, &at("gen", 0, 0)).await.unwrap();

        let bigger = Module::new("gen", "Generator v2", 1, 1, vec![Port::output("Power", 150)]).unwrap();
        let stored = service.update_module("gen", bigger).await.unwrap();

        assert_ne!(stored.id, "gen");
        assert_eq!(service.get_module("gen").unwrap().name, "Generator");
        assert_eq!(service.get_module(&stored.id).unwrap().name, "Generator v2");
        assert!(matches!(
            service.delete_module("gen").await,
            Err(DesignerError::InUse { .. })
        ));
    }

    #[tokio::test]
    async fn test_unplaced_module_is_updated_in_place() {
        let service = service().await;
        let renamed = Module::new("", "Diesel generator", 1, 1, vec![]).unwrap();

        let stored = service.update_module("gen", renamed).await.unwrap();

        assert_eq!(stored.id, "gen");
        assert_eq!(service.get_module("gen").unwrap().name, "Diesel generator");
        service.delete_module("gen").await.unwrap();
        assert_eq!(service.module_count(), 0);
    }

    #[tokio::test]
    async fn test_style_shrink_blocked_by_layout() {
        let service = service().await;
        let dc = datacenter(&service).await;
        service.place_module(&dc.id, &at("gen", 4, 4)).await.unwrap();

        let mut smaller = service.get_style("compact").unwrap();
        smaller.width = 3;
        assert!(matches!(
            service.update_style("compact", smaller).await,
            Err(DesignerError::OutOfBounds { .. })
        ));
        assert_eq!(service.get_style("compact").unwrap().width, 5);
    }

    #[tokio::test]
    async fn test_deleted_style_does_not_cascade() {
        let service = service().await;
        let dc = datacenter(&service).await;

        service.delete_style("compact").await.unwrap();

        assert!(service.get_datacenter(&dc.id).await.is_ok());
        assert!(matches!(
            service.place_module(&dc.id, &at("gen", 0, 0)).await,
            Err(DesignerError::NotFound {
                kind: "datacenter style",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_delete_all_styles_requires_confirmation() {
        let service = service().await;
        assert!(matches!(
            service.delete_all_styles(false).await,
            Err(DesignerError::ConfirmationRequired { .. })
        ));
        assert_eq!(service.delete_all_styles(true).await.unwrap(), 1);
        assert!(service.list_styles().is_empty());
    }

    #[tokio::test]
    async fn test_evaluate_uses_datacenter_specs() {
        let service = service().await;
        let dc = datacenter(&service).await;
        service
            .create_spec(DatacenterSpec {
                component_id: "dc".to_string(),
                name: "Power budget".to_string(),
                unit: "Power".to_string(),
                below_amount: Some(50),
                above_amount: None,
                objective: Objective::Maximize,
                amount: None,
            })
            .await
            .unwrap();

        let empty = service.evaluate(&dc.id).await.unwrap();
        assert!(!empty.is_feasible());

        service.place_module(&dc.id, &at("gen", 0, 0)).await.unwrap();
        let powered = service.evaluate(&dc.id).await.unwrap();
        assert_eq!(powered.total_score(), Some(-100));
    }

    fn spec_row(below: i64, above: i64) -> SpecRecord {
        SpecRecord {
            id: "dc".to_string(),
            name: "Power".to_string(),
            below_amount: Some(below),
            above_amount: Some(above),
            minimize: 1,
            maximize: 0,
            unconstrained: 0,
            unit: "Power".to_string(),
            amount: None,
        }
    }

    #[tokio::test]
    async fn test_rejected_bundle_writes_nothing_and_can_be_retried() {
        let service = DesignerService::new(MemoryStore::new(), SpecEvaluator::default())
            .await
            .unwrap();
        let module = Module::new("gen", "Generator", 1, 1, vec![Port::output("Power", 100)]).unwrap();

        let broken = CatalogBundle {
            modules: vec![module.clone()],
            specs: vec![spec_row(30, 10)],
            ..Default::default()
        };
        assert!(matches!(
            service.import_bundle(broken).await,
            Err(DesignerError::InvalidRecord { kind: "datacenter spec", .. })
        ));
        assert_eq!(service.module_count(), 0);
        assert!(service.store().list(Collection::Modules).await.unwrap().is_empty());

        let fixed = CatalogBundle {
            modules: vec![module],
            specs: vec![spec_row(10, 30)],
            ..Default::default()
        };
        let summary = service.import_bundle(fixed).await.unwrap();
        assert_eq!((summary.modules, summary.specs), (1, 1));
        assert_eq!(service.get_spec("dc", "Power").unwrap().objective, Objective::Minimize);
    }

    #[tokio::test]
    async fn test_bundle_with_taken_style_id_keeps_new_modules_out() {
        let service = service().await;
        let bundle = CatalogBundle {
            modules: vec![Module::new("rack", "Rack", 1, 1, vec![]).unwrap()],
            styles: vec![service.get_style("compact").unwrap()],
            ..Default::default()
        };

        assert!(service.import_bundle(bundle).await.is_err());
        assert!(matches!(
            service.get_module("rack"),
            Err(DesignerError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_datacenter_ids_leave_no_lock_entries() {
        let service = service().await;
        for i in 0..200 {
            let id = format!("missing-{}", i);
            assert!(service.place_module(&id, &at("gen", 0, 0)).await.is_err());
            assert!(service.remove_placement(&id, "p").await.is_err());
            assert!(service
                .update_datacenter(&id, DatacenterUpdate::default())
                .await
                .is_err());
            assert!(service.delete_datacenter(&id).await.is_err());
        }
        assert!(service.locks.is_empty());

        let dc = datacenter(&service).await;
        service.place_module(&dc.id, &at("gen", 0, 0)).await.unwrap();
        assert_eq!(service.locks.len(), 1);
        service.delete_datacenter(&dc.id).await.unwrap();
        assert!(service.locks.is_empty());
    }
}
