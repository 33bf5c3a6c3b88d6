//! cli stuff
use {
    crate::config::options::SubExport,
    clap::Parser,
    color_eyre::{Report, eyre::Result},
    schemars::generate::SchemaSettings,
    std::{
        fs::OpenOptions,
        io::{BufWriter, Write},
        path::PathBuf,
    },
};

/// where `--save` puts the generated schema
const SCHEMA_PATH: &str = "subexport.schema.json";

/// where `--save` puts the generated default config
const DEFAULTS_PATH: &str = "subexport.default.toml";

/// Export a subreddit's posts and comments from a date range to CSV
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// The subreddit to export (without `r/`), defaults to `fetch.forum`
    pub forum: Option<String>,

    /// First day of the window (`YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` or RFC 3339)
    #[arg(long, required_unless_present_any = ["gen_schema", "gen_default"])]
    pub start: Option<String>,

    /// Last day of the window, inclusive
    #[arg(long, required_unless_present_any = ["gen_schema", "gen_default"])]
    pub end: Option<String>,

    /// Where to write the CSV, defaults to `export.output`
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Maximum number of posts to examine, defaults to `fetch.limit`
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Pause after each exported post in milliseconds, defaults to `fetch.politeness_ms`
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Load this config file instead of the usual locations
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Save instead of printing
    #[arg(long)]
    pub save: bool,

    /// Generate a JSON schemafile based on the defaults
    #[arg(short = 's', long)]
    pub gen_schema: bool,

    /// Generate the default config file
    #[arg(short = 'd', long)]
    pub gen_default: bool,
}

impl Cli {
    /// handle the generator flags
    ///
    /// returns `true` if one of them ran and there's nothing left to do
    ///
    /// # Errors
    ///
    /// returns an error if it fails to generate and/or save the json schema
    /// returns an error if it fails to generate and/or save the default config
    pub fn run_generators(&self) -> Result<bool> {
        if self.gen_schema {
            Self::gen_schema(self.save)?;
        }

        if self.gen_default {
            Self::gen_defaults(self.save)?;
        }

        Ok(self.gen_schema || self.gen_default)
    }

    /// save a string to a file
    ///
    /// # Errors
    ///
    /// returns an error if it fails to open `path`
    pub fn write_to_file(path: &str, contents: &str) -> Result<()> {
        let file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .create(true)
            .open(path)?;
        let mut w = BufWriter::new(file);
        w.write_all(contents.as_bytes()).map_err(Report::new)
    }

    /// generate/save the config schema
    ///
    /// # Errors
    ///
    /// returns an error if it fails to convert the schema to a JSON string
    /// returns an error if it fails to save the schema
    pub fn gen_schema(save: bool) -> Result<()> {
        let settings = SchemaSettings::draft2020_12().for_serialize();
        let generator = settings.into_generator();
        let schema = generator.into_root_schema_for::<SubExport>();
        let schema_str = serde_json::to_string_pretty(&schema)?;

        if save {
            Self::write_to_file(SCHEMA_PATH, &schema_str)?;
            println!("Saved schema to {}", SCHEMA_PATH);
        } else {
            println!("{}", schema_str);
        }

        Ok(())
    }

    /// generate/save the default config file
    ///
    /// # Errors
    ///
    /// returns an error if it fails to convert the default config to TOML
    /// returns an error if it fails to save the default config
    pub fn gen_defaults(save: bool) -> Result<()> {
        let defaults = toml::to_string_pretty(&SubExport::default())?;

        if save {
            Self::write_to_file(DEFAULTS_PATH, &defaults)?;
            println!("Saved default config to {}", DEFAULTS_PATH);
        } else {
            println!("{}", defaults);
        }

        Ok(())
    }
}
