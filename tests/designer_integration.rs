use dc_designer::core::evaluator::{BoundKind, ComponentStatus, Verdict};
use dc_designer::domain::model::{
    CatalogBundle, DatacenterStyle, DatacenterUpdate, Focus, Module, NewDatacenter, Port,
    SpecRecord,
};
use dc_designer::{DesignerError, DesignerService, MemoryStore, PlacementRequest, SpecEvaluator};
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

fn style(id: &str, width: u32, height: u32) -> DatacenterStyle {
    DatacenterStyle {
        id: id.to_string(),
        name: format!("{} hall", id),
        description: String::new(),
        width,
        height,
        grid_connection: 0,
        water_connection: 0,
        processing: 0,
        storage: 0,
        price: Some(1_000),
        focus: Focus::Processing,
        recommended_modules: vec![],
    }
}

fn spec_row(component: &str, unit: &str, below: i64, above: i64) -> SpecRecord {
    SpecRecord {
        id: component.to_string(),
        name: unit.to_string(),
        below_amount: Some(below),
        above_amount: Some(above),
        minimize: 0,
        maximize: 0,
        unconstrained: 1,
        unit: unit.to_string(),
        amount: None,
    }
}

fn request(module: &str, x: i64, y: i64) -> PlacementRequest {
    PlacementRequest {
        module_id: module.to_string(),
        x,
        y,
        rotation: 0,
    }
}

async fn designer() -> DesignerService<MemoryStore> {
    let service = DesignerService::new(MemoryStore::new(), SpecEvaluator::default())
        .await
        .unwrap();

    let bundle = CatalogBundle {
        modules: vec![
            Module::new("supply", "Transformer", 1, 1, vec![Port::output("Power", 100)]).unwrap(),
            Module::new("rack", "Rack", 1, 1, vec![Port::input("Power", 40)]).unwrap(),
            Module::new("wide", "Cooling row", 2, 1, vec![Port::input("Water", 10)]).unwrap(),
            Module::new("block", "Block", 2, 2, vec![]).unwrap(),
        ],
        module_ports: vec![],
        styles: vec![style("compact", 5, 5), style("large", 20, 20)],
        specs: vec![spec_row("dc", "Power", 10, 80)],
    };
    service.import_bundle(bundle).await.unwrap();
    service
}

async fn datacenter(service: &DesignerService<MemoryStore>, name: &str, style: &str) -> String {
    service
        .create_datacenter(NewDatacenter {
            name: name.to_string(),
            description: Some(format!("{} test site", name)),
            style_id: style.to_string(),
            spec_ids: vec!["dc".to_string()],
        })
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn test_grid_scenario_on_compact_style() {
    let service = designer().await;
    let dc = datacenter(&service, "Scenario", "compact").await;

    let a = service.place_module(&dc, &request("block", 0, 0)).await.unwrap();
    assert!(!a.is_empty());

    // 2x2 at (0,0) covers (1,1)
    let overlap = service.place_module(&dc, &request("rack", 1, 1)).await;
    match overlap {
        Err(DesignerError::Overlap { placement_id, .. }) => assert_eq!(placement_id, a),
        other => panic!("expected overlap, got {:?}", other),
    }

    let oob = service.place_module(&dc, &request("block", 4, 4)).await;
    assert!(matches!(oob, Err(DesignerError::OutOfBounds { .. })));

    service.place_module(&dc, &request("rack", 2, 2)).await.unwrap();
    assert_eq!(service.list_placements(&dc).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_evaluation_scenarios() {
    let service = designer().await;
    let dc = datacenter(&service, "Power", "large").await;

    service.place_module(&dc, &request("supply", 0, 0)).await.unwrap();
    service.place_module(&dc, &request("rack", 1, 0)).await.unwrap();

    // 100 out, 40 in: net 60 inside [10, 80]
    let verdict = service.evaluate(&dc).await.unwrap();
    assert!(verdict.is_feasible());
    assert_eq!(verdict.net_amounts.get("Power"), Some(&60));

    // net -20 violates the lower bound
    service.place_module(&dc, &request("rack", 2, 0)).await.unwrap();
    service.place_module(&dc, &request("rack", 3, 0)).await.unwrap();
    let verdict = service.evaluate(&dc).await.unwrap();
    assert!(!verdict.is_feasible());
    let violation = verdict.violations().next().unwrap();
    match &violation.status {
        ComponentStatus::Infeasible { violation } => {
            assert_eq!(violation.bound, BoundKind::Lower);
            assert_eq!(violation.net, -20);
        }
        other => panic!("expected infeasible component, got {:?}", other),
    }
    assert!(matches!(verdict.verdict, Verdict::Infeasible { .. }));
}

#[tokio::test]
async fn test_failed_placement_leaves_layout_unchanged() {
    let service = designer().await;
    let dc = datacenter(&service, "Stable", "compact").await;
    service.place_module(&dc, &request("wide", 0, 0)).await.unwrap();
    let before = service.get_datacenter(&dc).await.unwrap();

    assert!(service.place_module(&dc, &request("rack", 1, 0)).await.is_err());
    assert!(service.place_module(&dc, &request("rack", -1, 0)).await.is_err());
    assert!(service.place_module(&dc, &request("missing", 3, 3)).await.is_err());
    let bad_rotation = PlacementRequest {
        rotation: 45,
        ..request("rack", 3, 3)
    };
    assert!(matches!(
        service.place_module(&dc, &bad_rotation).await,
        Err(DesignerError::InvalidGeometry { .. })
    ));

    let after = service.get_datacenter(&dc).await.unwrap();
    assert_eq!(before.placements, after.placements);
}

#[tokio::test]
async fn test_rotated_placement_uses_swapped_footprint() {
    let service = designer().await;
    let dc = datacenter(&service, "Rotated", "compact").await;

    // 2x1 turned to 1x2 fits in the last column
    let rotated = PlacementRequest {
        rotation: 90,
        ..request("wide", 4, 0)
    };
    service.place_module(&dc, &rotated).await.unwrap();

    assert!(service.place_module(&dc, &request("rack", 4, 1)).await.is_err());
    service.place_module(&dc, &request("rack", 4, 2)).await.unwrap();
}

#[tokio::test]
async fn test_remove_placement_frees_cells() {
    let service = designer().await;
    let dc = datacenter(&service, "Removal", "compact").await;
    let id = service.place_module(&dc, &request("block", 0, 0)).await.unwrap();

    let removed = service.remove_placement(&dc, &id).await.unwrap();
    assert_eq!(removed.module_id, "block");
    service.place_module(&dc, &request("rack", 1, 1)).await.unwrap();

    assert!(matches!(
        service.remove_placement(&dc, &id).await,
        Err(DesignerError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_delete_datacenter_removes_placements() {
    let service = designer().await;
    let dc = datacenter(&service, "Doomed", "compact").await;
    service.place_module(&dc, &request("rack", 0, 0)).await.unwrap();

    service.delete_datacenter(&dc).await.unwrap();

    assert!(matches!(
        service.list_placements(&dc).await,
        Err(DesignerError::NotFound { .. })
    ));
    // module no longer placed anywhere, so it can be deleted
    service.delete_module("rack").await.unwrap();
}

#[tokio::test]
async fn test_search_and_filter_datacenters() {
    let service = designer().await;
    datacenter(&service, "North Campus", "compact").await;
    datacenter(&service, "South Campus", "large").await;
    datacenter(&service, "Edge", "compact").await;

    let campuses = service.search_datacenters("campus", 10).await.unwrap();
    assert_eq!(campuses.len(), 2);
    assert_eq!(service.search_datacenters("campus", 1).await.unwrap().len(), 1);
    assert_eq!(service.search_datacenters("TEST SITE", 10).await.unwrap().len(), 3);

    let compact = service.datacenters_by_style("compact").await.unwrap();
    assert_eq!(compact.len(), 2);
}

#[tokio::test]
async fn test_moving_to_smaller_style_is_checked() {
    let service = designer().await;
    let dc = datacenter(&service, "Mover", "large").await;
    service.place_module(&dc, &request("rack", 10, 10)).await.unwrap();

    let shrink = DatacenterUpdate {
        style_id: Some("compact".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        service.update_datacenter(&dc, shrink).await,
        Err(DesignerError::OutOfBounds { .. })
    ));
    assert_eq!(service.get_datacenter(&dc).await.unwrap().style_id, "large");
}

#[tokio::test]
async fn test_ranking_prefers_feasible_layouts() {
    let service = designer().await;
    let good = datacenter(&service, "Good", "large").await;
    let bad = datacenter(&service, "Bad", "large").await;

    service.place_module(&good, &request("supply", 0, 0)).await.unwrap();
    service.place_module(&good, &request("rack", 1, 0)).await.unwrap();
    service.place_module(&bad, &request("rack", 0, 0)).await.unwrap();

    let ranked = service
        .rank_datacenters(&[bad.clone(), good.clone()])
        .await
        .unwrap();
    assert_eq!(ranked[0].0, good);
    assert!(ranked[0].1.is_feasible());
    assert!(!ranked[1].1.is_feasible());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_different_datacenters_place_in_parallel() {
    let service = Arc::new(designer().await);
    let mut ids = Vec::new();
    for i in 0..4 {
        ids.push(datacenter(&service, &format!("Parallel {}", i), "compact").await);
    }

    let mut handles = Vec::new();
    for id in ids.clone() {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            for x in 0..5 {
                service.place_module(&id, &request("rack", x, 0)).await.unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    for id in ids {
        assert_eq!(service.list_placements(&id).await.unwrap().len(), 5);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_concurrent_placements_never_overlap(
        spots in prop::collection::vec((0i64..5, 0i64..5, prop::bool::ANY), 2..16)
    ) {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(4)
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let service = Arc::new(designer().await);
            let dc = datacenter(&service, "Contended", "compact").await;

            let handles: Vec<_> = spots
                .into_iter()
                .map(|(x, y, big)| {
                    let service = Arc::clone(&service);
                    let dc = dc.clone();
                    let module = if big { "block" } else { "rack" };
                    tokio::spawn(async move {
                        service.place_module(&dc, &request(module, x, y)).await.is_ok()
                    })
                })
                .collect();

            let mut accepted = 0;
            for handle in handles {
                if handle.await.unwrap() {
                    accepted += 1;
                }
            }

            let placements = service.list_placements(&dc).await.unwrap();
            assert_eq!(placements.len(), accepted);

            let mut cells = HashSet::new();
            for placement in &placements {
                for cell in placement.footprint().cells() {
                    assert!(cells.insert(cell), "cell {:?} used twice", cell);
                    assert!((0..5).contains(&cell.0) && (0..5).contains(&cell.1));
                }
            }
        });
    }
}
