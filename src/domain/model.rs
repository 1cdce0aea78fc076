use crate::utils::error::{DesignerError, Result};
use crate::utils::validation::{validate_dimension, validate_record_name};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Unit labels whose input amounts give a module its footprint when it is
/// imported from flat port rows.
pub const SPACE_X_UNIT: &str = "Space_X";
pub const SPACE_Y_UNIT: &str = "Space_Y";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    Input,
    Output,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub direction: PortDirection,
    pub unit: String,
    pub amount: u64,
}

impl Port {
    pub fn input(unit: impl Into<String>, amount: u64) -> Self {
        Self {
            direction: PortDirection::Input,
            unit: unit.into(),
            amount,
        }
    }

    pub fn output(unit: impl Into<String>, amount: u64) -> Self {
        Self {
            direction: PortDirection::Output,
            unit: unit.into(),
            amount,
        }
    }
}

/// One port of one module, in the flat shape used by catalog imports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRecord {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Is_Input")]
    pub is_input: u8,
    #[serde(rename = "Is_Output")]
    pub is_output: u8,
    #[serde(rename = "Unit")]
    pub unit: String,
    #[serde(rename = "Amount")]
    pub amount: u64,
}

impl TryFrom<&PortRecord> for Port {
    type Error = DesignerError;

    fn try_from(record: &PortRecord) -> Result<Self> {
        let direction = match (record.is_input, record.is_output) {
            (1, 0) => PortDirection::Input,
            (0, 1) => PortDirection::Output,
            (i, o) => {
                return Err(DesignerError::invalid_record(
                    "module",
                    format!(
                        "port {} of {} must be exactly one of input or output (Is_Input={}, Is_Output={})",
                        record.unit, record.id, i, o
                    ),
                ))
            }
        };
        if record.unit.trim().is_empty() {
            return Err(DesignerError::invalid_record(
                "module",
                format!("port of {} has an empty unit", record.id),
            ));
        }
        Ok(Self {
            direction,
            unit: record.unit.clone(),
            amount: record.amount,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    pub name: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub cost: u64,
    #[serde(default)]
    pub ports: Vec<Port>,
}

impl Module {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        width: u32,
        height: u32,
        ports: Vec<Port>,
    ) -> Result<Self> {
        let module = Self {
            id: id.into(),
            name: name.into(),
            width,
            height,
            cost: 0,
            ports,
        };
        module.validate()?;
        Ok(module)
    }

    pub fn with_cost(mut self, cost: u64) -> Self {
        self.cost = cost;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_record_name("module", &self.name)?;
        validate_dimension("module width", self.width)?;
        validate_dimension("module height", self.height)?;
        if self.ports.iter().any(|p| p.unit.trim().is_empty()) {
            return Err(DesignerError::invalid_record(
                "module",
                format!("module {} has a port with an empty unit", self.id),
            ));
        }
        Ok(())
    }

    /// Groups flat port rows by `ID` into modules, keeping first-seen order.
    ///
    /// The footprint comes from the `Space_X`/`Space_Y` input ports when
    /// present and defaults to a single cell otherwise.
    pub fn from_port_records(records: &[PortRecord]) -> Result<Vec<Module>> {
        let mut order: Vec<String> = Vec::new();
        let mut grouped: BTreeMap<String, (String, Vec<Port>)> = BTreeMap::new();

        for record in records {
            let port = Port::try_from(record)?;
            let entry = grouped.entry(record.id.clone()).or_insert_with(|| {
                order.push(record.id.clone());
                (record.name.clone(), Vec::new())
            });
            entry.1.push(port);
        }

        order
            .into_iter()
            .filter_map(|id| grouped.remove(&id).map(|group| (id, group)))
            .map(|(id, (name, ports))| {
                let space = |unit: &str| -> Result<u32> {
                    match ports
                        .iter()
                        .find(|p| p.direction == PortDirection::Input && p.unit == unit)
                    {
                        Some(port) => u32::try_from(port.amount).map_err(|_| {
                            DesignerError::invalid_geometry(format!(
                                "{} of module {} is {}, larger than a grid dimension can be",
                                unit, id, port.amount
                            ))
                        }),
                        None => Ok(1),
                    }
                };
                let (width, height) = (space(SPACE_X_UNIT)?, space(SPACE_Y_UNIT)?);
                Module::new(id, name, width, height, ports)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Focus {
    Processing,
    Storage,
    Network,
    Server,
}

impl Focus {
    pub const ALL: [Focus; 4] = [
        Focus::Processing,
        Focus::Storage,
        Focus::Network,
        Focus::Server,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Focus::Processing => "processing",
            Focus::Storage => "storage",
            Focus::Network => "network",
            Focus::Server => "server",
        }
    }
}

impl fmt::Display for Focus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Focus {
    type Err = DesignerError;

    fn from_str(s: &str) -> Result<Self> {
        Focus::ALL
            .into_iter()
            .find(|focus| focus.as_str() == s)
            .ok_or_else(|| {
                DesignerError::invalid_record(
                    "datacenter style",
                    format!(
                        "invalid focus '{}', must be one of processing, storage, network, server",
                        s
                    ),
                )
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatacenterStyle {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub grid_connection: u64,
    #[serde(default)]
    pub water_connection: u64,
    #[serde(default)]
    pub processing: u64,
    #[serde(default)]
    pub storage: u64,
    /// `None` turns "minimize price" into an active objective.
    #[serde(default)]
    pub price: Option<u64>,
    pub focus: Focus,
    #[serde(default)]
    pub recommended_modules: Vec<String>,
}

impl DatacenterStyle {
    pub fn validate(&self) -> Result<()> {
        validate_record_name("datacenter style", &self.name)?;
        validate_dimension("style width", self.width)?;
        validate_dimension("style height", self.height)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Objective {
    #[default]
    None,
    Minimize,
    Maximize,
    Unconstrained,
}

impl Objective {
    pub fn from_flags(minimize: bool, maximize: bool, unconstrained: bool) -> Result<Self> {
        match (minimize, maximize, unconstrained) {
            (false, false, false) => Ok(Objective::None),
            (true, false, false) => Ok(Objective::Minimize),
            (false, true, false) => Ok(Objective::Maximize),
            (false, false, true) => Ok(Objective::Unconstrained),
            _ => Err(DesignerError::invalid_record(
                "datacenter spec",
                "at most one of Minimize, Maximize and Unconstrained may be set",
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatacenterSpec {
    pub component_id: String,
    pub name: String,
    pub unit: String,
    /// Inclusive lower bound on the net amount.
    #[serde(default)]
    pub below_amount: Option<i64>,
    /// Inclusive upper bound on the net amount.
    #[serde(default)]
    pub above_amount: Option<i64>,
    #[serde(default)]
    pub objective: Objective,
    #[serde(default)]
    pub amount: Option<i64>,
}

impl DatacenterSpec {
    pub fn validate(&self) -> Result<()> {
        if self.component_id.trim().is_empty() || self.unit.trim().is_empty() {
            return Err(DesignerError::invalid_record(
                "datacenter spec",
                "component id and unit are required",
            ));
        }
        if let (Some(below), Some(above)) = (self.below_amount, self.above_amount) {
            if below > above {
                return Err(DesignerError::invalid_record(
                    "datacenter spec",
                    format!(
                        "{}/{}: Below_Amount {} is greater than Above_Amount {}",
                        self.component_id, self.unit, below, above
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Document key: specs are addressed by component and unit together.
    pub fn key(&self) -> String {
        spec_key(&self.component_id, &self.unit)
    }
}

pub fn spec_key(component_id: &str, unit: &str) -> String {
    format!("{}/{}", component_id, unit)
}

/// Spec row in the flat import shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecRecord {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Below_Amount", default)]
    pub below_amount: Option<i64>,
    #[serde(rename = "Above_Amount", default)]
    pub above_amount: Option<i64>,
    #[serde(rename = "Minimize", default)]
    pub minimize: u8,
    #[serde(rename = "Maximize", default)]
    pub maximize: u8,
    #[serde(rename = "Unconstrained", default)]
    pub unconstrained: u8,
    #[serde(rename = "Unit")]
    pub unit: String,
    #[serde(rename = "Amount", default)]
    pub amount: Option<i64>,
}

impl TryFrom<&SpecRecord> for DatacenterSpec {
    type Error = DesignerError;

    fn try_from(record: &SpecRecord) -> Result<Self> {
        let spec = DatacenterSpec {
            component_id: record.id.clone(),
            name: record.name.clone(),
            unit: record.unit.clone(),
            below_amount: record.below_amount,
            above_amount: record.above_amount,
            objective: Objective::from_flags(
                record.minimize != 0,
                record.maximize != 0,
                record.unconstrained != 0,
            )?,
            amount: record.amount,
        };
        spec.validate()?;
        Ok(spec)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn degrees(&self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// 90° and 270° swap width and height.
    pub fn is_quarter_turn(&self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

impl TryFrom<u16> for Rotation {
    type Error = DesignerError;

    fn try_from(degrees: u16) -> Result<Self> {
        match degrees {
            0 => Ok(Rotation::Deg0),
            90 => Ok(Rotation::Deg90),
            180 => Ok(Rotation::Deg180),
            270 => Ok(Rotation::Deg270),
            other => Err(DesignerError::invalid_geometry(format!(
                "rotation {} is not one of 0, 90, 180, 270",
                other
            ))),
        }
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

/// Axis-aligned block of grid cells `[x, x + width) × [y, y + height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footprint {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl Footprint {
    pub fn new(x: i64, y: i64, width: u32, height: u32, rotation: Rotation) -> Self {
        let (width, height) = if rotation.is_quarter_turn() {
            (height, width)
        } else {
            (width, height)
        };
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i64 {
        self.x + i64::from(self.width)
    }

    pub fn bottom(&self) -> i64 {
        self.y + i64::from(self.height)
    }

    pub fn fits_within(&self, grid_width: u32, grid_height: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.right() <= i64::from(grid_width)
            && self.bottom() <= i64::from(grid_height)
    }

    pub fn overlaps(&self, other: &Footprint) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn cells(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        (self.y..self.bottom()).flat_map(move |y| (self.x..self.right()).map(move |x| (x, y)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedModule {
    pub id: String,
    pub module_id: String,
    pub x: u32,
    pub y: u32,
    #[serde(default)]
    pub rotation: Rotation,
    /// Unrotated module dimensions captured when the module was placed.
    pub width: u32,
    pub height: u32,
}

impl PlacedModule {
    pub fn footprint(&self) -> Footprint {
        Footprint::new(
            i64::from(self.x),
            i64::from(self.y),
            self.width,
            self.height,
            self.rotation,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datacenter {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub style_id: String,
    /// Component identifiers whose specs this datacenter is evaluated against.
    #[serde(default)]
    pub spec_ids: Vec<String>,
    #[serde(default)]
    pub placements: Vec<PlacedModule>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDatacenter {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub style_id: String,
    #[serde(default)]
    pub spec_ids: Vec<String>,
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatacenterUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub style_id: Option<String>,
    pub spec_ids: Option<Vec<String>>,
}

/// Already-typed catalog records imported in one go.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogBundle {
    #[serde(default)]
    pub modules: Vec<Module>,
    #[serde(default)]
    pub module_ports: Vec<PortRecord>,
    #[serde(default)]
    pub styles: Vec<DatacenterStyle>,
    #[serde(default)]
    pub specs: Vec<SpecRecord>,
}
