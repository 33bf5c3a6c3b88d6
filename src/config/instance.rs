//! config singleton management stuff
use {
    crate::config::options::SubExport,
    color_eyre::{
        Result,
        eyre::{Context, eyre},
    },
    std::{path::Path, sync::RwLock},
};

/// global config instance, empty until one is installed
///
/// [`getopt!`](crate::getopt) reads the compiled-in defaults while it's empty
static CONFIG: RwLock<Option<SubExport>> = RwLock::new(None);

/// load the layered config (defaults, global file, local file, env) and install it
///
/// # Errors
///
/// returns an error if any layer can't be read, parsed or validated
pub fn init_config() -> Result<()> {
    install(SubExport::load().wrap_err("Failed to load configuration")?)
}

/// load a single config file (plus env overrides) and install it
///
/// # Errors
///
/// returns an error if the file can't be read, parsed or validated
pub fn init_config_from(path: impl AsRef<Path>) -> Result<()> {
    install(SubExport::load_from(path)?)
}

/// replace the global config
pub fn install(cfg: SubExport) -> Result<()> {
    let mut slot = CONFIG
        .write()
        .map_err(|e| eyre!("Configuration lock poisoned: {}", e))?;
    *slot = Some(cfg);

    Ok(())
}

/// get a specific config value with a default fallback
pub fn get_or_default<T, F>(getter: F, default: T) -> T
where
    F: FnOnce(&SubExport) -> Option<T>,
{
    CONFIG
        .read()
        .ok()
        .and_then(|cfg| cfg.as_ref().and_then(getter))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use {super::*, crate::config::options::CONFIG_FILE_NAME, tempfile::TempDir};

    #[test]
    fn test_invalid_file_is_an_error_not_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "[reddit]\nclient_id = \"my-id\"\n\n[fetch]\nforum = \"rust\"\npage_size = 0\n",
        )
        .unwrap();

        let err = init_config_from(&path).unwrap_err();

        assert!(err.chain().any(|e| e.to_string().contains("page_size")));
        assert_eq!(
            get_or_default(|c| c.reddit.as_ref().and_then(|r| r.client_id.clone()), String::new()),
            ""
        );
    }

    #[test]
    fn test_unreadable_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[fetch\nforum = ").unwrap();

        assert!(init_config_from(&path).is_err());
    }
}
