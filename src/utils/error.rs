use thiserror::Error;

#[derive(Error, Debug)]
pub enum DesignerError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error(
        "Footprint {width}x{height} at ({x}, {y}) exceeds the {grid_width}x{grid_height} grid"
    )]
    OutOfBounds {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
        grid_width: u32,
        grid_height: u32,
    },

    #[error("Footprint at ({x}, {y}) overlaps placement {placement_id}")]
    Overlap { x: i64, y: i64, placement_id: String },

    #[error("Invalid geometry: {message}")]
    InvalidGeometry { message: String },

    #[error("Invalid {kind} record: {message}")]
    InvalidRecord { kind: &'static str, message: String },

    #[error("{kind} {id} is in use: {message}")]
    InUse {
        kind: &'static str,
        id: String,
        message: String,
    },

    #[error("Confirmation required: {message}")]
    ConfirmationRequired { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration value for {field}: {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Lookup,
    Placement,
    Validation,
    Configuration,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DesignerError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn invalid_geometry(message: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            message: message.into(),
        }
    }

    pub fn invalid_record(kind: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            kind,
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::Lookup,
            Self::OutOfBounds { .. } | Self::Overlap { .. } | Self::InvalidGeometry { .. } => {
                ErrorCategory::Placement
            }
            Self::InvalidRecord { .. } | Self::InUse { .. } | Self::ConfirmationRequired { .. } => {
                ErrorCategory::Validation
            }
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            Self::StorageError { .. } | Self::IoError(_) | Self::SerializationError(_) => {
                ErrorCategory::Storage
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Lookup => ErrorSeverity::Medium,
            ErrorCategory::Placement | ErrorCategory::Validation => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    /// Process exit code used by the command line boundary.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } => 2,
            Self::OutOfBounds { .. } => 3,
            Self::Overlap { .. } => 4,
            Self::InvalidGeometry { .. } => 5,
            Self::InvalidRecord { .. } | Self::InUse { .. } | Self::ConfirmationRequired { .. } => 6,
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => 7,
            Self::StorageError { .. } | Self::IoError(_) | Self::SerializationError(_) => 8,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "Check the identifier; list the collection to see what exists",
            Self::OutOfBounds { .. } => "Move the module inward, rotate it, or use a larger style",
            Self::Overlap { .. } => "Pick a free position or remove the conflicting placement",
            Self::InvalidGeometry { .. } => "Use positive dimensions and a rotation of 0, 90, 180 or 270",
            Self::InvalidRecord { .. } => "Fix the record fields and import it again",
            Self::InUse { .. } => "Remove the placements that reference it first",
            Self::ConfirmationRequired { .. } => "Repeat the command with --confirm",
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                "Check the TOML configuration file"
            }
            Self::StorageError { .. } | Self::IoError(_) | Self::SerializationError(_) => {
                "Check the store path permissions and file contents"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::NotFound { kind, id } => format!("Could not find {} '{}'", kind, id),
            Self::OutOfBounds { x, y, .. } => {
                format!("The module does not fit on the grid at ({}, {})", x, y)
            }
            Self::Overlap { x, y, placement_id } => format!(
                "Position ({}, {}) is already taken by placement {}",
                x, y, placement_id
            ),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DesignerError>;
