use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "dc-designer")]
#[command(about = "Datacenter layout designer: catalog, placement and resource evaluation")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "dc-designer.toml")]
    pub config: String,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Serialize, Deserialize, Subcommand)]
pub enum Command {
    /// Import a JSON catalog bundle (modules, port rows, styles, specs)
    Import { file: String },

    /// List modules in the catalog
    Modules,

    /// List datacenter styles
    Styles {
        #[arg(long)]
        focus: Option<String>,
    },

    /// Delete every datacenter style
    DeleteStyles {
        #[arg(long)]
        confirm: bool,
    },

    /// List the specs of one component
    Specs { component: String },

    /// Create an empty datacenter on a style
    CreateDatacenter {
        #[arg(long)]
        name: String,
        #[arg(long)]
        style: String,
        #[arg(long)]
        description: Option<String>,
        /// Component ids whose specs apply (repeatable)
        #[arg(long = "spec")]
        specs: Vec<String>,
    },

    /// List datacenters, optionally filtered
    Datacenters {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        style: Option<String>,
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Delete a datacenter and its placements
    DeleteDatacenter { datacenter: String },

    /// Place a module on a datacenter grid
    Place {
        datacenter: String,
        module: String,
        #[arg(allow_negative_numbers = true)]
        x: i64,
        #[arg(allow_negative_numbers = true)]
        y: i64,
        #[arg(long, default_value = "0")]
        rotation: u16,
    },

    /// Remove a placement
    Remove {
        datacenter: String,
        placement: String,
    },

    /// List placements of a datacenter
    Placements { datacenter: String },

    /// Evaluate datacenters; several ids are ranked best first
    Evaluate {
        #[arg(required = true)]
        datacenters: Vec<String>,
    },
}
