mod error;
pub mod mojang;
pub mod net;
pub mod textures;
mod utils;

pub use crate::error::{ErrorKind, SkinError};

use crate::mojang::{ProfileRecord, IDENTITY_ENDPOINT, PROFILE_ENDPOINT};
use crate::net::{CannedClient, HttpClient, HttpGet};
use crate::utils::save_stream_atomically;
use clap::Parser;
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

/// Download a Minecraft player's skin and save it as <USERNAME>.png
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Player name whose skin is fetched
    pub username: String,
    /// Print every request with its status, and raw payloads on failure
    #[arg(short = 'd', long, env = "SKIN_STEALER_DEBUG")]
    pub debug: bool,
    #[arg(short = 'o', long, default_value = ".")]
    pub output_dir: PathBuf,
    /// Answer requests from the simulated_* files in this directory
    #[arg(short = 's', long, env = "SKIN_STEALER_SIMULATE")]
    pub simulate: Option<PathBuf>,
    /// Request timeout in seconds
    #[arg(short = 't', long, default_value_t = 30)]
    pub timeout: u64,
}

/// Parses `argv`. Usage errors are written to `err` and map to exit 1;
/// `--help` and `--version` print to stdout and map to exit 0.
pub fn parse_cli<I, T>(argv: I, err: &mut dyn Write) -> Result<Cli, ExitCode>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(argv) {
        Ok(args) => Ok(args),
        Err(e) if e.use_stderr() => {
            let _ = write!(err, "{}", e.render());
            Err(ExitCode::FAILURE)
        }
        Err(e) => {
            let _ = e.print();
            Err(ExitCode::SUCCESS)
        }
    }
}

pub fn handle_download(args: &Cli) -> ExitCode {
    let mut stderr = io::stderr();
    let client = match build_client(args) {
        Ok(client) => client,
        Err(e) => {
            let _ = writeln!(stderr, "{:#}", e);
            return ExitCode::FAILURE;
        }
    };
    download_with(args, client, &mut stderr)
}

/// Runs the pipeline for `args` over `client`, reporting failures to `err`.
pub fn download_with<C: HttpGet>(args: &Cli, client: C, err: &mut dyn Write) -> ExitCode {
    let stealer = SkinStealer::new(client)
        .verbose(args.debug)
        .output_dir(&args.output_dir);

    match stealer.run(&args.username) {
        Ok(path) => {
            log::info!("Saved skin of {} to {}", args.username, path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            stealer.report(&e, err);
            e.exit_code()
        }
    }
}

pub fn build_client(args: &Cli) -> anyhow::Result<Box<dyn HttpGet>> {
    match &args.simulate {
        Some(dir) => {
            log::debug!("Simulating network from {}", dir.display());
            Ok(Box::new(CannedClient::from_dir(dir)?))
        }
        None => Ok(Box::new(HttpClient::new(Duration::from_secs(args.timeout))?)),
    }
}

/// The name -> id -> profile -> skin pipeline, configured explicitly so
/// several can run side by side with different clients.
#[derive(Debug)]
pub struct SkinStealer<C: HttpGet> {
    client: C,
    verbose: bool,
    identity_endpoint: String,
    profile_endpoint: String,
    output_dir: PathBuf,
}

impl<C: HttpGet> SkinStealer<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            verbose: false,
            identity_endpoint: IDENTITY_ENDPOINT.to_string(),
            profile_endpoint: PROFILE_ENDPOINT.to_string(),
            output_dir: PathBuf::from("."),
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn identity_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.identity_endpoint = endpoint.into();
        self
    }

    pub fn profile_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.profile_endpoint = endpoint.into();
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn destination(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{}.png", name))
    }

    /// Runs all three stages for `name`. The skin file only appears once
    /// every stage succeeded.
    pub fn run(&self, name: &str) -> Result<PathBuf, SkinError> {
        if name.is_empty() {
            return Err(SkinError::Usage);
        }
        // the name becomes a file name inside output_dir
        if name.contains(['/', '\\', ':']) || name == "." || name == ".." {
            return Err(SkinError::InvalidName {
                name: name.to_string(),
            });
        }
        let userid = mojang::lookup_identifier(&self.client, &self.identity_endpoint, name)?;
        log::debug!("{} has id {}", name, userid);
        let profile = mojang::lookup_profile(&self.client, &self.profile_endpoint, name, &userid)?;
        let skin_url = self.resolve_skin_url(name, &userid, &profile)?;
        log::debug!("Skin of {} is at {}", name, skin_url);

        let destination = self.destination(name);
        let written = self.fetch_and_save(name, &skin_url, &destination)?;
        log::debug!("Wrote {} bytes to {}", written, destination.display());
        Ok(destination)
    }

    fn resolve_skin_url(
        &self,
        name: &str,
        userid: &str,
        profile: &ProfileRecord,
    ) -> Result<String, SkinError> {
        let descriptor = textures::extract_texture_descriptor(&profile.properties).map_err(|e| {
            SkinError::MalformedResponse {
                name: name.to_string(),
                url: mojang::profile_url(&self.profile_endpoint, userid),
                reason: e.to_string(),
                payload: Some(profile.raw.clone()),
            }
        })?;
        let Some(descriptor) = descriptor else {
            return Err(SkinError::TextureNotFound {
                name: name.to_string(),
                payload: profile.raw.clone(),
            });
        };
        match textures::skin_url(&descriptor) {
            Some(url) => Ok(url.to_string()),
            None => Err(SkinError::TextureNotFound {
                name: name.to_string(),
                payload: descriptor.raw().to_string(),
            }),
        }
    }

    /// Streams `url` into `destination`, replacing any previous file.
    /// Returns the number of bytes saved.
    pub fn fetch_and_save(&self, name: &str, url: &str, destination: &Path) -> Result<u64, SkinError> {
        let response = mojang::send(&self.client, url, name)?;
        if !response.is_ok() {
            return Err(SkinError::Download {
                name: name.to_string(),
                status: response.status(),
                url: url.to_string(),
            });
        }
        let mut body = response.into_reader();
        let written = save_stream_atomically(&mut body, destination).map_err(|source| SkinError::Io {
            name: name.to_string(),
            path: destination.to_path_buf(),
            source,
        })?;
        if written == 0 {
            return Err(SkinError::MalformedResponse {
                name: name.to_string(),
                url: url.to_string(),
                reason: "skin image is empty".to_string(),
                payload: None,
            });
        }
        Ok(written)
    }

    /// Writes the short failure message to `out`, plus the diagnostic detail
    /// in verbose mode.
    pub fn report(&self, err: &SkinError, out: &mut dyn Write) {
        let _ = writeln!(out, "{}", err);
        if self.verbose {
            if let Some(detail) = err.verbose_detail() {
                let _ = writeln!(out, "{}", detail);
            }
        }
    }
}
