use crate::utils::error::{DesignerError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(DesignerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(DesignerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_choice(field_name: &str, value: &str, allowed: &[&str]) -> Result<()> {
    if !allowed.contains(&value) {
        return Err(DesignerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Valid values: {}", allowed.join(", ")),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DesignerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// Grid and footprint dimensions must be at least one cell.
pub fn validate_dimension(field_name: &str, value: u32) -> Result<()> {
    if value == 0 {
        return Err(DesignerError::invalid_geometry(format!(
            "{} must be a positive number of cells",
            field_name
        )));
    }
    Ok(())
}

pub fn validate_record_name(kind: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DesignerError::invalid_record(kind, "name cannot be empty"));
    }
    Ok(())
}
