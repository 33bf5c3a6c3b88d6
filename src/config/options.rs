//! every available configuration option and its type is listed in this file
use {
    crate::config::validate::{Validate, format_validation_errors},
    color_eyre::{
        Section, SectionExt,
        eyre::{Context, OptionExt, Result, eyre},
    },
    config::{Config, ConfigBuilder},
    schemars::JsonSchema,
    serde::{Deserialize, Serialize},
    smart_default::SmartDefault,
    std::path::{Path, PathBuf},
    tracing::info,
};

/// the name of the config file looked up globally and in the working directory
pub const CONFIG_FILE_NAME: &str = "subexport.toml";

/// the prefix for environment overrides (`SUBEXPORT_REDDIT__CLIENT_ID`, ...)
pub const ENV_PREFIX: &str = "SUBEXPORT";

/// Reddit application credentials and endpoints
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema, SmartDefault)]
#[schemars(default)]
pub struct RedditCfg {
    /// The client id of your Reddit "script" or "web" app
    /// (see <https://www.reddit.com/prefs/apps>)
    #[default(Some(String::new()))]
    pub client_id: Option<String>,

    /// The client secret of your Reddit app
    #[default(Some(String::new()))]
    pub client_secret: Option<String>,

    /// User agent string in the format:
    /// `<platform>:<app id>:<version> (by /u/<reddit username>)`
    #[default(Some(format!(
        "rust:{}:v{} (by /u/your_username)",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    )))]
    pub user_agent: Option<String>,

    /// Base url used to obtain OAuth tokens
    #[default(Some("https://www.reddit.com".to_string()))]
    pub auth_url: Option<String>,

    /// Base url for authenticated API requests
    #[default(Some("https://oauth.reddit.com".to_string()))]
    pub api_url: Option<String>,
}

/// Configuration options for making HTTP requests
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema, SmartDefault)]
#[schemars(default)]
pub struct HttpConfig {
    /// Connection pool size per host
    #[default(Some(8))]
    pub pool_max_idle_per_host: Option<usize>,

    /// Connection pool idle timeout in seconds
    #[default(Some(90))]
    pub pool_idle_timeout: Option<u64>,

    /// Request timeout in seconds
    #[default(Some(30))]
    pub timeout: Option<u64>,

    /// Connection timeout in seconds
    #[default(Some(10))]
    pub connect_timeout: Option<u64>,

    /// How many times a transient failure is retried before giving up
    #[default(Some(3))]
    pub max_retries: Option<u32>,

    /// Base delay between retries in milliseconds (doubled every attempt)
    #[default(Some(200))]
    pub retry_base_ms: Option<u64>,
}

/// Settings for fetching posts and comments
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema, SmartDefault)]
#[schemars(default)]
pub struct FetchCfg {
    /// The subreddit to export when none is given on the command line (without `r/`)
    #[default(Some("python".to_string()))]
    pub forum: Option<String>,

    /// The maximum number of posts to examine from the listing
    #[default(Some(1000))]
    pub limit: Option<usize>,

    #[schemars(range(min = 1, max = 100))]
    /// How many posts to request per listing page
    #[default(Some(100))]
    pub page_size: Option<usize>,

    /// Pause after every exported post in milliseconds
    #[default(Some(500))]
    pub politeness_ms: Option<u64>,

    #[schemars(range(min = 1, max = 100))]
    /// How many collapsed comment ids to expand per request
    #[default(Some(100))]
    pub more_batch_size: Option<usize>,
}

/// Settings for the exported file
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema, SmartDefault)]
#[schemars(default)]
pub struct ExportCfg {
    /// Where to write the exported rows
    #[default(Some("reddit_data.csv".to_string()))]
    pub output: Option<String>,

    /// The field delimiter (a single ASCII character)
    #[default(Some(','))]
    pub delimiter: Option<char>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, JsonSchema, SmartDefault)]
/// The format to log in
pub enum LoggingFormat {
    /// Use the compact output format
    #[default]
    Compact,

    /// Use an excessively pretty output format
    Pretty,
}

/// Settings for logging
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema, SmartDefault)]
#[schemars(default)]
pub struct LoggingConfig {
    /// Enable logging
    #[default(Some(true))]
    pub enable: Option<bool>,

    /// The max level to log at
    #[default(Some("info".to_string()))]
    pub level: Option<String>,

    /// The output format
    #[default(Some(LoggingFormat::Compact))]
    pub format: Option<LoggingFormat>,

    /// Enable ANSI escape codes for colors and stuff
    #[default(Some(true))]
    pub ansi: Option<bool>,

    /// Display event targets in log messages
    #[default(Some(false))]
    pub event_targets: Option<bool>,

    /// Display line numbers in log messages
    #[default(Some(false))]
    pub line_numbers: Option<bool>,
}

/// The root config
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema, SmartDefault)]
#[schemars(default)]
pub struct SubExport {
    /// Reddit credentials and endpoints
    #[default(Some(RedditCfg::default()))]
    pub reddit: Option<RedditCfg>,

    /// HTTP settings
    #[default(Some(HttpConfig::default()))]
    pub http: Option<HttpConfig>,

    /// Fetch settings
    #[default(Some(FetchCfg::default()))]
    pub fetch: Option<FetchCfg>,

    /// Export settings
    #[default(Some(ExportCfg::default()))]
    pub export: Option<ExportCfg>,

    /// Logging settings
    #[default(Some(LoggingConfig::default()))]
    pub logging: Option<LoggingConfig>,
}

impl SubExport {
    /// load config from default locations
    ///
    /// load prio: env > local > global > defaults
    pub fn load() -> Result<Self> {
        let global_config_path = Self::global_config_path()?;
        let curr_dir = std::env::current_dir()
            .wrap_err("Failed to get current working directory")
            .suggestion("Ensure the current directory exists and is accessible")?;

        let cfg = Self::load_layered(&global_config_path, &curr_dir)?;

        if !global_config_path.exists() {
            Self::create_default_config(&global_config_path, &Self::default())?;
        }

        Ok(cfg)
    }

    /// layer the global file, the nearest local file found from `search_from` upwards and
    /// the environment over the defaults
    pub fn load_layered(global_config_path: &Path, search_from: &Path) -> Result<Self> {
        let mut builder = Self::create_builder(&Self::default())?
            .add_source(config::File::from(global_config_path).required(false));

        if let Some(local_config) = Self::find_local_config(search_from) {
            builder = builder.add_source(config::File::from(local_config.as_path()).required(true));
        }

        Self::from_builder(builder.add_source(Self::env_source()))
    }

    /// load config from a single file layered over the defaults, env still wins
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let builder = Self::create_builder(&Self::default())?
            .add_source(config::File::from(path).required(true))
            .add_source(Self::env_source());

        Self::from_builder(builder)
            .with_section(|| path.display().to_string().header("File path:"))
    }

    /// `SUBEXPORT_<SECTION>__<KEY>` overrides
    fn env_source() -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
    }

    /// build, deserialize and validate
    fn from_builder(builder: ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        let settings = builder.build().wrap_err("Failed to build configuration")?;
        let cfg: SubExport = settings
            .try_deserialize::<SubExport>()
            .wrap_err("Failed to deserialize configuration")?;

        cfg.run_validation()?;
        info!("Configuration validation successful");

        Ok(cfg)
    }

    /// get the global config file path
    fn global_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_eyre("Unable to determine system config directory")
            .suggestion("Ensure XDG_CONFIG_HOME or HOME environment variables are set")
            .suggestion("On Windows, APPDATA should be set")?;

        Ok(config_dir.join(CONFIG_FILE_NAME))
    }

    /// create a config builder with defaults
    fn create_builder(defaults: &SubExport) -> Result<ConfigBuilder<config::builder::DefaultState>> {
        let config_source = Config::try_from(defaults)
            .wrap_err("Failed to convert default config struct to config source")?;

        Ok(Config::builder().add_source(config_source))
    }

    /// run validation and return a pretty error if it fails
    fn run_validation(&self) -> Result<()> {
        self.validate()
            .map_err(|errors| eyre!(format_validation_errors(&errors)))
            .wrap_err("config validation failed")
            .suggestion(format!("Check your {} for invalid values", CONFIG_FILE_NAME))
            .suggestion("Run with --gen-default to see valid options")
    }

    /// find the nearest config file in `dir` or one of its ancestors
    fn find_local_config(dir: &Path) -> Option<PathBuf> {
        dir.ancestors()
            .map(|ancestor| ancestor.join(CONFIG_FILE_NAME))
            .find(|path| path.exists())
    }

    /// create the default config file
    fn create_default_config(path: &Path, defaults: &SubExport) -> Result<()> {
        let config_dir = path
            .parent()
            .ok_or_eyre("Unable to determine parent directory of config path")?;

        std::fs::create_dir_all(config_dir)
            .wrap_err("Failed to create config directory")
            .with_section(|| format!("{}", config_dir.display()).header("Directory:"))?;

        defaults
            .save_to_file(path)
            .wrap_err("Failed to write default configuration file")?;

        Ok(())
    }

    /// save config to a file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let toml_str =
            toml::to_string_pretty(self).wrap_err("Failed to serialize config to TOML")?;

        std::fs::write(path, &toml_str)
            .wrap_err_with(|| format!("Failed to write config file: {}", path.display()))
            .with_section(|| path.display().to_string().header("File path"))
            .with_section(|| format!("{} bytes", toml_str.len()).header("Content size:"))?;

        Ok(())
    }
}
