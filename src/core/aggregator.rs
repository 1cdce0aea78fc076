use crate::core::catalog::Catalog;
use crate::domain::model::{DatacenterStyle, PlacedModule, PortDirection};
use crate::domain::ports::ConfigProvider;
use std::collections::BTreeMap;

pub const DEFAULT_POWER_UNIT: &str = "Power";
pub const DEFAULT_WATER_UNIT: &str = "Water";

/// Supply and demand of one resource unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnitTotals {
    pub output: i64,
    pub input: i64,
}

impl UnitTotals {
    pub fn net(&self) -> i64 {
        self.output.saturating_sub(self.input)
    }
}

/// Net amount per resource unit for one layout snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceTotals {
    units: BTreeMap<String, UnitTotals>,
}

impl ResourceTotals {
    pub fn net(&self, unit: &str) -> i64 {
        self.units.get(unit).map(UnitTotals::net).unwrap_or(0)
    }

    pub fn totals(&self, unit: &str) -> UnitTotals {
        self.units.get(unit).copied().unwrap_or_default()
    }

    /// Unit label to net signed amount.
    pub fn net_amounts(&self) -> BTreeMap<String, i64> {
        self.units
            .iter()
            .map(|(unit, totals)| (unit.clone(), totals.net()))
            .collect()
    }

    pub fn units(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(String::as_str)
    }

    /// Sums saturate at `i64::MAX`; amounts beyond it count as `i64::MAX`.
    fn add(&mut self, unit: &str, direction: PortDirection, amount: u64) {
        let totals = self.units.entry(unit.to_string()).or_default();
        let amount = i64::try_from(amount).unwrap_or(i64::MAX);
        let side = match direction {
            PortDirection::Output => &mut totals.output,
            PortDirection::Input => &mut totals.input,
        };
        *side = side.saturating_add(amount);
    }
}

#[derive(Debug, Clone)]
pub struct ResourceAggregator {
    power_unit: String,
    water_unit: String,
}

impl Default for ResourceAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_POWER_UNIT, DEFAULT_WATER_UNIT)
    }
}

impl ResourceAggregator {
    pub fn new(power_unit: impl Into<String>, water_unit: impl Into<String>) -> Self {
        Self {
            power_unit: power_unit.into(),
            water_unit: water_unit.into(),
        }
    }

    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Self {
        Self::new(config.power_unit(), config.water_unit())
    }

    /// Sums every port of every placed module, then adds the style's grid
    /// and water connections as supply. Placements whose module is missing
    /// from the catalog contribute nothing.
    pub fn aggregate(
        &self,
        placements: &[PlacedModule],
        style: &DatacenterStyle,
        catalog: &Catalog,
    ) -> ResourceTotals {
        let mut totals = ResourceTotals::default();

        for placement in placements {
            match catalog.get_module(&placement.module_id) {
                Ok(module) => {
                    for port in &module.ports {
                        totals.add(&port.unit, port.direction, port.amount);
                    }
                }
                Err(_) => tracing::warn!(
                    placement = %placement.id,
                    "Module {} is not in the catalog, skipping its ports",
                    placement.module_id
                ),
            }
        }

        totals.add(&self.power_unit, PortDirection::Output, style.grid_connection);
        totals.add(&self.water_unit, PortDirection::Output, style.water_connection);

        totals
    }
}
