use crate::domain::model::{Datacenter, DatacenterStyle, Footprint, Module, PlacedModule, Rotation};
use crate::utils::error::{DesignerError, Result};
use crate::utils::validation::validate_dimension;
use uuid::Uuid;

/// Placed modules of one datacenter on a bounded grid.
///
/// Every mutation either succeeds completely or leaves the layout exactly
/// as it was. No two footprints overlap and every footprint lies inside
/// the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    datacenter_id: String,
    grid_width: u32,
    grid_height: u32,
    placements: Vec<PlacedModule>,
}

impl Layout {
    pub fn new(datacenter_id: impl Into<String>, grid_width: u32, grid_height: u32) -> Result<Self> {
        validate_dimension("grid width", grid_width)?;
        validate_dimension("grid height", grid_height)?;
        Ok(Self {
            datacenter_id: datacenter_id.into(),
            grid_width,
            grid_height,
            placements: Vec::new(),
        })
    }

    /// Rebuilds the layout of a stored datacenter on its style's grid,
    /// re-checking every placement in stored order.
    pub fn for_datacenter(datacenter: &Datacenter, style: &DatacenterStyle) -> Result<Self> {
        let mut layout = Self::new(&datacenter.id, style.width, style.height)?;
        for placement in &datacenter.placements {
            layout.check_free(&placement.footprint())?;
            layout.placements.push(placement.clone());
        }
        Ok(layout)
    }

    pub fn datacenter_id(&self) -> &str {
        &self.datacenter_id
    }

    pub fn grid(&self) -> (u32, u32) {
        (self.grid_width, self.grid_height)
    }

    pub fn place(&mut self, module: &Module, x: i64, y: i64, rotation: Rotation) -> Result<String> {
        validate_dimension("module width", module.width)?;
        validate_dimension("module height", module.height)?;

        let footprint = Footprint::new(x, y, module.width, module.height, rotation);
        self.check_free(&footprint)?;

        // fits_within guarantees non-negative coordinates below the grid size
        let placement = PlacedModule {
            id: Uuid::new_v4().to_string(),
            module_id: module.id.clone(),
            x: x as u32,
            y: y as u32,
            rotation,
            width: module.width,
            height: module.height,
        };
        let id = placement.id.clone();

        tracing::debug!(
            datacenter = %self.datacenter_id,
            module = %module.id,
            placement = %id,
            "Placed module at ({}, {}) rotated {}°",
            x,
            y,
            rotation.degrees()
        );

        self.placements.push(placement);
        Ok(id)
    }

    pub fn remove(&mut self, placement_id: &str) -> Result<PlacedModule> {
        let index = self
            .placements
            .iter()
            .position(|p| p.id == placement_id)
            .ok_or_else(|| DesignerError::not_found("placement", placement_id))?;
        Ok(self.placements.remove(index))
    }

    /// Point-in-time copy in insertion order.
    pub fn list(&self) -> Vec<PlacedModule> {
        self.placements.clone()
    }

    pub fn placements(&self) -> &[PlacedModule] {
        &self.placements
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Changes the grid size, refusing if any placement would fall outside it.
    pub fn resize(&mut self, grid_width: u32, grid_height: u32) -> Result<()> {
        validate_dimension("grid width", grid_width)?;
        validate_dimension("grid height", grid_height)?;

        if let Some(footprint) = self
            .placements
            .iter()
            .map(PlacedModule::footprint)
            .find(|fp| !fp.fits_within(grid_width, grid_height))
        {
            return Err(out_of_bounds(&footprint, grid_width, grid_height));
        }

        self.grid_width = grid_width;
        self.grid_height = grid_height;
        Ok(())
    }

    pub fn into_placements(self) -> Vec<PlacedModule> {
        self.placements
    }

    fn check_free(&self, footprint: &Footprint) -> Result<()> {
        if !footprint.fits_within(self.grid_width, self.grid_height) {
            return Err(out_of_bounds(footprint, self.grid_width, self.grid_height));
        }

        if let Some(existing) = self
            .placements
            .iter()
            .find(|p| p.footprint().overlaps(footprint))
        {
            return Err(DesignerError::Overlap {
                x: footprint.x,
                y: footprint.y,
                placement_id: existing.id.clone(),
            });
        }

        Ok(())
    }
}

fn out_of_bounds(footprint: &Footprint, grid_width: u32, grid_height: u32) -> DesignerError {
    DesignerError::OutOfBounds {
        x: footprint.x,
        y: footprint.y,
        width: footprint.width,
        height: footprint.height,
        grid_width,
        grid_height,
    }
}
