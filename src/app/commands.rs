use crate::app::bootstrap::load_bundle;
use crate::config::Command;
use crate::core::designer::{DesignerService, PlacementRequest};
use crate::domain::model::{Focus, NewDatacenter};
use crate::domain::ports::DocumentStore;
use crate::utils::error::Result;
use serde_json::{json, Value};
use std::str::FromStr;

/// Runs one CLI command and returns its result as JSON for printing.
pub async fn execute<S: DocumentStore>(
    service: &DesignerService<S>,
    command: Command,
) -> Result<Value> {
    tracing::debug!("Executing command: {:?}", command);

    let output = match command {
        Command::Import { file } => {
            let bundle = load_bundle(&file).await?;
            let summary = service.import_bundle(bundle).await?;
            tracing::info!("📥 Imported catalog bundle from {}", file);
            serde_json::to_value(summary)?
        }
        Command::Modules => serde_json::to_value(service.list_modules())?,
        Command::Styles { focus } => {
            let styles = match focus {
                Some(focus) => service.styles_by_focus(Focus::from_str(&focus)?),
                None => service.list_styles(),
            };
            serde_json::to_value(styles)?
        }
        Command::DeleteStyles { confirm } => {
            let deleted = service.delete_all_styles(confirm).await?;
            json!({ "deleted": deleted })
        }
        Command::Specs { component } => {
            serde_json::to_value(service.specs_for_component(&component))?
        }
        Command::CreateDatacenter {
            name,
            style,
            description,
            specs,
        } => {
            let datacenter = service
                .create_datacenter(NewDatacenter {
                    name,
                    description,
                    style_id: style,
                    spec_ids: specs,
                })
                .await?;
            serde_json::to_value(datacenter)?
        }
        Command::Datacenters {
            search,
            style,
            limit,
        } => {
            let mut datacenters = match search {
                Some(query) => service.search_datacenters(&query, usize::MAX).await?,
                None => service.list_datacenters().await?,
            };
            if let Some(style) = style {
                datacenters.retain(|dc| dc.style_id == style);
            }
            datacenters.truncate(limit);
            serde_json::to_value(datacenters)?
        }
        Command::DeleteDatacenter { datacenter } => {
            service.delete_datacenter(&datacenter).await?;
            json!({ "deleted": datacenter })
        }
        Command::Place {
            datacenter,
            module,
            x,
            y,
            rotation,
        } => {
            let request = PlacementRequest {
                module_id: module,
                x,
                y,
                rotation,
            };
            let placement_id = service.place_module(&datacenter, &request).await?;
            json!({ "datacenter": datacenter, "placement_id": placement_id })
        }
        Command::Remove {
            datacenter,
            placement,
        } => serde_json::to_value(service.remove_placement(&datacenter, &placement).await?)?,
        Command::Placements { datacenter } => {
            serde_json::to_value(service.list_placements(&datacenter).await?)?
        }
        Command::Evaluate { datacenters } => {
            if let [single] = datacenters.as_slice() {
                serde_json::to_value(service.evaluate(single).await?)?
            } else {
                let ranked = service.rank_datacenters(&datacenters).await?;
                Value::Array(
                    ranked
                        .into_iter()
                        .enumerate()
                        .map(|(rank, (id, verdict))| {
                            json!({ "rank": rank + 1, "datacenter": id, "evaluation": verdict })
                        })
                        .collect(),
                )
            }
        }
    };

    Ok(output)
}
