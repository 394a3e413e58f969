//! Command-line surface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Generate map posters and manage custom-layer presets
#[derive(Debug, Parser)]
#[command(name = "maptoposter", version, about)]
pub struct Cli {
    /// Backend base URL (overrides MAPTOPOSTER_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List available themes
    Themes(ThemesArgs),

    /// Manage themes
    Theme {
        #[command(subcommand)]
        command: ThemeCommand,
    },

    /// Look up the coordinates of an address
    Geocode(GeocodeArgs),

    /// Generate a poster and wait for it to finish
    Generate(GenerateArgs),

    /// Manage custom-layer presets
    Presets {
        #[command(subcommand)]
        command: PresetCommand,
    },
}

#[derive(Debug, Clone, Args)]
pub struct ThemesArgs {
    /// Only show themes whose name or description contains this text
    #[arg(short, long)]
    pub search: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum ThemeCommand {
    /// Create a theme from a JSON draft
    Create {
        /// Theme draft (name, description and #RRGGBB colours)
        #[arg(short, long, value_name = "FILE")]
        file: PathBuf,
    },
}

#[derive(Debug, Clone, Args)]
pub struct GeocodeArgs {
    /// Street address, landmark or place name
    pub address: String,
}

#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    /// City shown on the poster (taken from --address when omitted)
    #[arg(long)]
    pub city: Option<String>,

    /// Country shown on the poster (taken from --address when omitted)
    #[arg(long)]
    pub country: Option<String>,

    /// Theme ID (defaults to the first theme the backend lists)
    #[arg(short, long)]
    pub theme: Option<String>,

    /// Map radius in metres
    #[arg(short, long)]
    pub distance: Option<String>,

    /// Centre the map on this address instead of the city
    #[arg(long)]
    pub address: Option<String>,

    /// Mark the map centre with a house icon
    #[arg(long)]
    pub house_marker: bool,

    /// Custom-layer preset (`builtin:<key>` or `saved:<name>`)
    #[arg(short, long, value_name = "SELECTOR")]
    pub preset: Option<String>,

    /// Form fields as JSON (missing fields take their defaults)
    #[arg(long, value_name = "FILE")]
    pub fields: Option<PathBuf>,

    /// Download the finished poster to this path
    #[arg(long, value_name = "PATH")]
    pub download: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum PresetCommand {
    /// List built-in and saved presets
    List,

    /// Show one preset
    Show {
        /// `builtin:<key>` or `saved:<name>`
        selector: String,
    },

    /// Save the custom layer of a fields file as a preset
    Save {
        #[arg(short, long)]
        name: String,

        #[arg(short, long, default_value = "")]
        description: String,

        /// Form fields as JSON; the custom layer must be enabled
        #[arg(long, value_name = "FILE")]
        fields: PathBuf,
    },

    /// Delete a saved preset
    Delete {
        name: String,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete every saved preset
    DeleteAll {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Write saved presets to a library file
    Export {
        /// Defaults to maptoposter-layer-presets.json
        path: Option<PathBuf>,
    },

    /// Read presets from a library file
    Import {
        path: PathBuf,

        /// `merge` or `overwrite` (asks when omitted)
        #[arg(short, long)]
        mode: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_generate_flags() {
        let cli = Cli::try_parse_from([
            "maptoposter",
            "generate",
            "--city",
            "Paris",
            "--country",
            "France",
            "--preset",
            "builtin:cafes",
            "--house-marker",
            "--api-url",
            "http://host:5000",
        ])
        .unwrap();

        assert_eq!(cli.api_url.as_deref(), Some("http://host:5000"));
        assert_matches!(
            cli.command,
            Command::Generate(GenerateArgs { city: Some(ref c), house_marker: true, .. }) if c == "Paris"
        );
    }

    #[test]
    fn parses_preset_subcommands() {
        let cli = Cli::try_parse_from(["maptoposter", "presets", "delete-all", "--yes"]).unwrap();
        assert_matches!(
            cli.command,
            Command::Presets {
                command: PresetCommand::DeleteAll { yes: true }
            }
        );

        let cli =
            Cli::try_parse_from(["maptoposter", "presets", "import", "in.json", "--mode", "merge"])
                .unwrap();
        assert_matches!(
            cli.command,
            Command::Presets {
                command: PresetCommand::Import { mode: Some(_), .. }
            }
        );
    }
}
