//! the core app
use {
    super::{cli::Cli, logging},
    crate::{
        client::{ClientOptions, Credentials, RedditClient},
        config::{
            instance::{init_config, init_config_from},
            options::CONFIG_FILE_NAME,
        },
        export::{WriteOutcome, write_csv},
        getopt,
        harvest::{Harvest, HarvestRequest, Harvester},
        opt_and,
        utils::{delimiter_byte, preview},
        window::TimeWindow,
    },
    clap::Parser,
    color_eyre::{
        Report, Section, SectionExt,
        eyre::{Context, OptionExt, Result, eyre},
    },
    indicatif::{ProgressBar, ProgressStyle},
    std::{path::PathBuf, time::Duration},
    tracing::{info, warn},
};

/// the subexport app
pub struct ExportApp {
    /// parsed command line
    cli: Cli,
}

impl ExportApp {
    /// initialize subexport
    ///
    /// - 1. installs the color_eyre report hook
    /// - 2. parses the command line
    /// - 3. loads the config file (or the one given with `--config`)
    /// - 4. sets up logging if enabled
    ///
    /// # Errors
    ///
    /// returns an error if color_eyre fails to install [`color_eyre::install`]
    /// returns an error if the configuration can't be loaded or is invalid
    /// returns an error if it fails to setup logging
    pub fn init() -> Result<Self> {
        color_eyre::install()?;
        let cli = Cli::parse();

        match &cli.config {
            Some(path) => init_config_from(path)?,
            None => init_config()?,
        }

        opt_and!(logging.enable, logging::setup()?);

        Ok(Self { cli })
    }

    /// run one export
    ///
    /// # Errors
    ///
    /// returns an error if the arguments are invalid or reddit rejects the credentials
    /// returns an error if the rows can't be written
    /// returns an error if any post or listing page couldn't be fetched (after saving what we have)
    pub async fn run(&self) -> Result<()> {
        if self.cli.run_generators()? {
            return Ok(());
        }

        let request = self.request()?;
        let output = self
            .cli
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(getopt!(export.output)));
        let delimiter = delimiter_byte(getopt!(export.delimiter))?;
        let delay = Duration::from_millis(
            self.cli
                .delay_ms
                .unwrap_or_else(|| getopt!(fetch.politeness_ms)),
        );

        info!(
            "Starting {} v{}: r/{} from {} to {}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            request.forum,
            request.window.start(),
            request.window.end()
        );

        let client = RedditClient::connect(Credentials::from_config(), ClientOptions::from_config())
            .await
            .wrap_err("failed to authenticate with reddit")
            .suggestion(format!(
                "Set reddit.client_id, reddit.client_secret and reddit.user_agent in {}",
                CONFIG_FILE_NAME
            ))
            .suggestion("Or export SUBEXPORT_REDDIT__CLIENT_ID and SUBEXPORT_REDDIT__CLIENT_SECRET")?;

        let spinner = Self::spinner(&request.forum)?;
        let pb = spinner.clone();
        let harvest = Harvester::new(&client, delay)
            .on_progress(move |post, rows| {
                pb.inc(1);
                pb.set_message(format!("{} rows, last: {}", rows, preview(&post.title, 40)));
            })
            .run(&request)
            .await;
        spinner.finish_and_clear();

        let outcome = write_csv(&harvest.rows, &output, delimiter)
            .wrap_err("failed to save the export")
            .with_section(|| output.display().to_string().header("File path:"))?;

        match outcome {
            WriteOutcome::Empty => println!("No data to save!"),
            WriteOutcome::Written { path, rows } => {
                println!("Data saved to {}", path.display());
                println!("Total rows: {}", rows);
            }
        }

        Self::report(harvest)
    }

    /// build the harvest request from the arguments, falling back to the config
    fn request(&self) -> Result<HarvestRequest> {
        let start = self.cli.start.as_deref().ok_or_eyre("--start is required")?;
        let end = self.cli.end.as_deref().ok_or_eyre("--end is required")?;

        let window = TimeWindow::parse(start, end)
            .wrap_err("invalid date range")
            .suggestion("Dates look like 2024-11-01, \"2024-11-01 08:30:00\" or 2024-11-01T08:30:00Z")?;

        let forum = self
            .cli
            .forum
            .clone()
            .unwrap_or_else(|| getopt!(fetch.forum));
        let forum = forum.trim_start_matches("r/").to_string();

        Ok(HarvestRequest {
            forum,
            window,
            limit: self.cli.limit.unwrap_or_else(|| getopt!(fetch.limit)),
            page_size: getopt!(fetch.page_size),
        })
    }

    /// a spinner that counts exported posts
    fn spinner(forum: &str) -> Result<ProgressBar> {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] r/{prefix} {pos} posts {msg}",
        )?);
        pb.set_prefix(forum.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Ok(pb)
    }

    /// turn skipped posts or a failed listing into an error, after the rows were saved
    fn report(harvest: Harvest) -> Result<()> {
        if let Some(error) = harvest.aborted {
            return Err(Report::new(error)
                .wrap_err("the listing failed part way, the export is incomplete"));
        }

        if harvest.failures.is_empty() {
            return Ok(());
        }

        let skipped = harvest
            .failures
            .iter()
            .map(|f| {
                warn!(post = %f.post_id, error = %f.error, "post skipped");
                format!("{} ({}): {}", f.post_id, preview(&f.title, 50), f.error)
            })
            .collect::<Vec<_>>()
            .join("\n");

        Err(eyre!(
            "{} post(s) were skipped because their comments couldn't be fetched",
            harvest.failures.len()
        ))
        .with_section(|| skipped.header("Skipped posts:"))
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{error::ExportError, harvest::PostFailure},
    };

    fn app(args: &[&str]) -> ExportApp {
        ExportApp {
            cli: Cli::try_parse_from(args).unwrap(),
        }
    }

    #[test]
    fn test_request_prefers_arguments() {
        let request = app(&[
            "subexport",
            "r/rust",
            "--start",
            "2024-11-01",
            "--end",
            "2024-11-30",
            "--limit",
            "25",
        ])
        .request()
        .unwrap();

        assert_eq!(request.forum, "rust");
        assert_eq!(request.limit, 25);
        assert_eq!(request.window.end().to_rfc3339(), "2024-11-30T23:59:59+00:00");
    }

    #[test]
    fn test_reversed_window_is_rejected() {
        let err = app(&["subexport", "rust", "--start", "2024-12-01", "--end", "2024-11-01"])
            .request()
            .unwrap_err();

        assert!(err.chain().any(|e| e.to_string().contains("invalid time window")));
    }

    #[test]
    fn test_report() {
        assert!(ExportApp::report(Harvest::default()).is_ok());

        let harvest = Harvest {
            failures: vec![PostFailure {
                post_id: "abc".to_string(),
                title: "a title".to_string(),
                error: ExportError::Fetch("/comments/abc: 500".to_string()),
            }],
            ..Harvest::default()
        };
        assert!(ExportApp::report(harvest).is_err());

        let harvest = Harvest {
            aborted: Some(ExportError::Fetch("/r/rust/new: 503".to_string())),
            ..Harvest::default()
        };
        assert!(ExportApp::report(harvest).is_err());
    }
}
