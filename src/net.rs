use std::cell::RefCell;
use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use bytes::{Buf, Bytes};
use reqwest::blocking::Client;

use crate::mojang::{IDENTITY_ENDPOINT, PROFILE_ENDPOINT};

pub const SIMULATED_USERID_FILE: &str = "simulated_userid_response.json";
pub const SIMULATED_USERINFO_FILE: &str = "simulated_userinfo_response.json";
pub const SIMULATED_SKIN_FILE: &str = "simulated_skin_response.png";

#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("no canned response for {0}")]
    NoRoute(String),
}

/// The one capability the pipeline needs from the outside world.
pub trait HttpGet {
    fn get(&self, url: &str) -> Result<Response, NetError>;
}

/// A status plus a body that is read lazily, once.
pub struct Response {
    status: u16,
    url: String,
    body: Box<dyn Read>,
}

impl Response {
    pub fn new(status: u16, url: &str, body: impl Read + 'static) -> Self {
        Self {
            status,
            url: url.to_string(),
            body: Box::new(body),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn bytes(mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.body.read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Fails with `InvalidData` on a body that is not UTF-8.
    pub fn text(self) -> io::Result<String> {
        String::from_utf8(self.bytes()?).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    pub fn into_reader(self) -> Box<dyn Read> {
        self.body
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

/// Real network access over a blocking reqwest client.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Result<Self, NetError> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl HttpGet for HttpClient {
    fn get(&self, url: &str) -> Result<Response, NetError> {
        let response = self.client.get(url).send()?;
        Ok(Response::new(response.status().as_u16(), url, response))
    }
}

#[derive(Debug, Clone)]
struct Route {
    prefix: String,
    status: u16,
    body: Bytes,
}

/// Serves canned responses for URL-prefix matched requests. Routes are tried
/// in insertion order, so an empty prefix added last acts as a fallback.
#[derive(Debug, Default)]
pub struct CannedClient {
    routes: Vec<Route>,
    requests: RefCell<Vec<String>>,
}

impl CannedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, prefix: impl Into<String>, status: u16, body: impl Into<Bytes>) -> Self {
        self.routes.push(Route {
            prefix: prefix.into(),
            status,
            body: body.into(),
        });
        self
    }

    /// Local simulation mode: the two Mojang endpoints answer with the json
    /// files in `dir`, anything else with the canned skin image.
    pub fn from_dir(dir: &Path) -> anyhow::Result<Self> {
        let read = |file: &str| -> anyhow::Result<Vec<u8>> {
            let path = dir.join(file);
            fs::read(&path).with_context(|| format!("reading simulated response {}", path.display()))
        };
        Ok(Self::new()
            .route(IDENTITY_ENDPOINT, 200, read(SIMULATED_USERID_FILE)?)
            .route(PROFILE_ENDPOINT, 200, read(SIMULATED_USERINFO_FILE)?)
            .route("", 200, read(SIMULATED_SKIN_FILE)?))
    }

    /// Every URL requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl HttpGet for CannedClient {
    fn get(&self, url: &str) -> Result<Response, NetError> {
        self.requests.borrow_mut().push(url.to_string());
        let route = self
            .routes
            .iter()
            .find(|r| url.starts_with(&r.prefix))
            .ok_or_else(|| NetError::NoRoute(url.to_string()))?;
        Ok(Response::new(route.status, url, route.body.clone().reader()))
    }
}

impl<T: HttpGet + ?Sized> HttpGet for Box<T> {
    fn get(&self, url: &str) -> Result<Response, NetError> {
        (**self).get(url)
    }
}
