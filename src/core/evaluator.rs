use crate::core::aggregator::{ResourceAggregator, ResourceTotals};
use crate::core::catalog::Catalog;
use crate::domain::model::{DatacenterSpec, DatacenterStyle, Objective, PlacedModule};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundKind {
    /// `Below_Amount`: net must not drop under it.
    Lower,
    /// `Above_Amount`: net must not exceed it.
    Upper,
}

/// Why a component is infeasible. Part of a verdict, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConstraintViolation {
    pub bound: BoundKind,
    pub limit: i64,
    pub net: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ComponentStatus {
    Feasible { score: i64 },
    Infeasible { violation: ConstraintViolation },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentVerdict {
    pub component_id: String,
    pub unit: String,
    pub net: i64,
    pub objective: Objective,
    #[serde(flatten)]
    pub status: ComponentStatus,
}

impl ComponentVerdict {
    pub fn is_feasible(&self) -> bool {
        matches!(self.status, ComponentStatus::Feasible { .. })
    }

    pub fn score(&self) -> Option<i64> {
        match self.status {
            ComponentStatus::Feasible { score } => Some(score),
            ComponentStatus::Infeasible { .. } => None,
        }
    }
}

/// Minimize-price objective, active when the style carries no price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceObjective {
    pub total_cost: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "lowercase")]
pub enum Verdict {
    Feasible { total_score: i64 },
    Infeasible { violations: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutVerdict {
    #[serde(flatten)]
    pub verdict: Verdict,
    pub components: Vec<ComponentVerdict>,
    pub price: Option<PriceObjective>,
    pub net_amounts: BTreeMap<String, i64>,
    pub placed_modules: usize,
}

impl LayoutVerdict {
    pub fn is_feasible(&self) -> bool {
        matches!(self.verdict, Verdict::Feasible { .. })
    }

    pub fn total_score(&self) -> Option<i64> {
        match self.verdict {
            Verdict::Feasible { total_score } => Some(total_score),
            Verdict::Infeasible { .. } => None,
        }
    }

    pub fn violations(&self) -> impl Iterator<Item = &ComponentVerdict> {
        self.components.iter().filter(|c| !c.is_feasible())
    }

    /// `Less` means `self` is the better layout: feasible beats infeasible,
    /// then lower total score, then fewer placed modules.
    pub fn compare(&self, other: &LayoutVerdict) -> Ordering {
        match (self.total_score(), other.total_score()) {
            (Some(a), Some(b)) => a
                .cmp(&b)
                .then(self.placed_modules.cmp(&other.placed_modules)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.placed_modules.cmp(&other.placed_modules),
        }
    }
}

/// Classifies a net amount against one spec.
pub fn evaluate_spec(spec: &DatacenterSpec, net: i64) -> ComponentVerdict {
    let violation = match (spec.below_amount, spec.above_amount) {
        (Some(limit), _) if net < limit => Some(ConstraintViolation {
            bound: BoundKind::Lower,
            limit,
            net,
        }),
        (_, Some(limit)) if net > limit => Some(ConstraintViolation {
            bound: BoundKind::Upper,
            limit,
            net,
        }),
        _ => None,
    };

    let status = match violation {
        Some(violation) => ComponentStatus::Infeasible { violation },
        None => ComponentStatus::Feasible {
            score: match spec.objective {
                Objective::Minimize => net,
                Objective::Maximize => net.saturating_neg(),
                Objective::Unconstrained | Objective::None => 0,
            },
        },
    };

    ComponentVerdict {
        component_id: spec.component_id.clone(),
        unit: spec.unit.clone(),
        net,
        objective: spec.objective,
        status,
    }
}

#[derive(Debug, Clone, Default)]
pub struct SpecEvaluator {
    aggregator: ResourceAggregator,
}

impl SpecEvaluator {
    pub fn new(aggregator: ResourceAggregator) -> Self {
        Self { aggregator }
    }

    pub fn aggregator(&self) -> &ResourceAggregator {
        &self.aggregator
    }

    /// Pure function of the placement snapshot and the catalog; repeating it
    /// without a mutation in between yields the same verdict.
    pub fn evaluate(
        &self,
        placements: &[PlacedModule],
        style: &DatacenterStyle,
        spec_ids: &[String],
        catalog: &Catalog,
    ) -> LayoutVerdict {
        let totals = self.aggregator.aggregate(placements, style, catalog);
        let specs = catalog.specs_for(spec_ids);
        self.judge(&totals, &specs, placements, style, catalog)
    }

    pub fn judge(
        &self,
        totals: &ResourceTotals,
        specs: &[&DatacenterSpec],
        placements: &[PlacedModule],
        style: &DatacenterStyle,
        catalog: &Catalog,
    ) -> LayoutVerdict {
        let components: Vec<ComponentVerdict> = specs
            .iter()
            .map(|spec| evaluate_spec(spec, totals.net(&spec.unit)))
            .collect();

        let price = style.price.is_none().then(|| PriceObjective {
            total_cost: placements
                .iter()
                .filter_map(|p| catalog.get_module(&p.module_id).ok())
                .map(|m| i64::try_from(m.cost).unwrap_or(i64::MAX))
                .fold(0i64, i64::saturating_add),
        });

        let violations = components.iter().filter(|c| !c.is_feasible()).count();
        let verdict = if violations > 0 {
            Verdict::Infeasible { violations }
        } else {
            let component_score = components
                .iter()
                .filter_map(ComponentVerdict::score)
                .fold(0i64, i64::saturating_add);
            Verdict::Feasible {
                total_score: component_score
                    .saturating_add(price.map(|p| p.total_cost).unwrap_or(0)),
            }
        };

        LayoutVerdict {
            verdict,
            components,
            price,
            net_amounts: totals.net_amounts(),
            placed_modules: placements.len(),
        }
    }
}
