use anyhow::Result;
use log::debug;
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};

use std::path::PathBuf;

use crate::{
    http::HttpClient,
    registry::{DEFAULT_FILES_URL, DEFAULT_REGISTRY_URL, NpmRegistry},
    runtime::Runtime,
};

pub struct Config<R: Runtime> {
    pub runtime: R,
    pub registry: NpmRegistry,
    pub root: PathBuf,
}

impl<R: Runtime> Config<R> {
    pub fn new(
        runtime: R,
        root: Option<PathBuf>,
        registry_url: Option<String>,
        files_url: Option<String>,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Ok(token) = runtime.env_var("NPM_TOKEN") {
            let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))?;
            auth_value.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth_value);
            debug!("Using NPM_TOKEN for authentication: {}", mask_token(&token));
        }

        let client = Client::builder()
            .user_agent("migrator-cli")
            .default_headers(headers)
            .build()?;

        let registry = NpmRegistry::new(
            HttpClient::new(client),
            registry_url.as_deref().unwrap_or(DEFAULT_REGISTRY_URL),
            files_url.as_deref().unwrap_or(DEFAULT_FILES_URL),
        );

        let root = match root {
            Some(path) => path,
            None => runtime.current_dir()?,
        };
        debug!("Using workspace root: {:?}", root);

        Ok(Self {
            runtime,
            registry,
            root,
        })
    }
}

/// Keep the first 4 and last 4 characters of long tokens.
fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        return "*********".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}*********{}", head, tail)
}
