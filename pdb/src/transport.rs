//! HTTP transport for PuppetDB query endpoints.

use log::{debug, warn};
use reqwest::blocking::Client;
use reqwest::{Certificate, Identity};
use serde_json::Value;
use url::Url;

use crate::{Config, Error, Result};

/// Performs a GET against a query endpoint and returns the decoded JSON body.
///
/// `path` is relative to the API version (`/nodes`, `/facts`). `query` is the
/// rendered predicate, sent as the `query` parameter when present.
pub trait Transport {
    fn get(&self, path: &str, query: Option<&str>) -> Result<Value>;
}

/// Blocking reqwest transport configured from a [`Config`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    api_version: String,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder().timeout(config.timeout());

        if let Some(identity) = load_identity(config)? {
            builder = builder.identity(identity);
        }
        if let Some(ca_cert) = &config.ca_cert {
            let pem = std::fs::read(ca_cert)?;
            builder = builder.add_root_certificate(Certificate::from_pem(&pem)?);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: Url::parse(&config.url)?,
            api_version: config.api_version.clone(),
        })
    }

    /// Full URL for an endpoint path.
    ///
    /// The versioned path is joined as an absolute path, so any path on the
    /// base URL is replaced.
    pub fn url_for(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(&format!("{}{}", self.api_version, path))?)
    }
}

/// Read the client identity. rustls wants key and certificate in one PEM.
fn load_identity(config: &Config) -> Result<Option<Identity>> {
    match (&config.cert, &config.key) {
        (None, None) => Ok(None),
        (None, Some(_)) => Err(Error::Config(
            "client key configured without a client certificate".to_string(),
        )),
        (Some(cert), key) => {
            let mut pem = std::fs::read(cert)?;
            if let Some(key) = key {
                pem.push(b'\n');
                pem.extend(std::fs::read(key)?);
            }
            Ok(Some(Identity::from_pem(&pem)?))
        }
    }
}

impl Transport for HttpTransport {
    fn get(&self, path: &str, query: Option<&str>) -> Result<Value> {
        let url = self.url_for(path)?;
        debug!("GET {} query={}", url, query.unwrap_or("<none>"));

        let mut request = self.client.get(url.clone());
        if let Some(query) = query {
            request = request.query(&[("query", query)]);
        }

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            let body = match response.text() {
                Ok(body) => body,
                Err(e) => {
                    warn!("could not read error body from {}: {}", url, e);
                    String::new()
                }
            };
            warn!("GET {} failed with {}", url, status);
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text()?;
        Ok(serde_json::from_str(&body)?)
    }
}
