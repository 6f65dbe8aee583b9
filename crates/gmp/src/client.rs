//! Facilities for building an HTTP client tuned for talking to a GSA endpoint.
use std::{env, time::Duration};

use base64::Engine;
use log::debug;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, AUTHORIZATION,
    CACHE_CONTROL, CONNECTION, CONTENT_TYPE, USER_AGENT,
};
use url::{Host, Url};

use crate::{Error, Password};

const GMP_PATH: &str = "gmp";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub fn authorization_headers(username: &str, password: &str) -> HeaderMap {
    let credentials = format!("{username}:{password}");
    let auth_header = format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode(credentials)
    );
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, auth_header.try_into().unwrap());
    headers
}

// The fixed header set a GSA expects from its own web frontend.
fn base_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/x-www-form-urlencoded"),
    );
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!("ovr/", env!("CARGO_PKG_VERSION"))),
    );
    headers.insert(
        HeaderName::from_static("x-requested-with"),
        HeaderValue::from_static("XMLHttpRequest"),
    );
    headers
}

pub struct ClientBuilder {
    host: Host,
    port: Option<u16>,
    headers: HeaderMap,
    inner: reqwest::ClientBuilder,
}

impl ClientBuilder {
    pub fn new(host: Host) -> Self {
        Self {
            host,
            port: None,
            headers: base_headers(),
            inner: reqwest::Client::builder().timeout(REQUEST_TIMEOUT),
        }
    }

    pub fn from_env() -> Result<Self, Error> {
        let host = env::var("OPENVAS_HOST")
            .map_err(|_| Error::InvalidConfiguration("OPENVAS_HOST is not set".to_string()))?;
        let host = Host::parse(&host)
            .map_err(|e| Error::InvalidConfiguration(format!("OPENVAS_HOST: {e}")))?;
        let port = env::var("OPENVAS_PORT")
            .ok()
            .map(|p| p.parse())
            .transpose()
            .map_err(|e| Error::InvalidConfiguration(format!("OPENVAS_PORT: {e}")))?;
        let username = env::var("OPENVAS_BASIC_AUTH_USER")
            .map_err(|_| Error::CredentialsMissing("OPENVAS_BASIC_AUTH_USER"))?;
        let password = env::var("OPENVAS_BASIC_AUTH_PASS")
            .map_err(|_| Error::CredentialsMissing("OPENVAS_BASIC_AUTH_PASS"))?;

        debug!("Building client for {host} using username {username} from env");
        let mut builder = ClientBuilder::new(host)
            .port(port)
            .basic_authentication(&username, &Password::new(password));
        if env::var_os("OPENVAS_SELF_SIGNED").is_some() {
            builder = builder.with_inner(|b| b.danger_accept_invalid_certs(true));
        }
        Ok(builder)
    }

    pub fn port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    pub fn basic_authentication(mut self, username: &str, password: &Password) -> Self {
        self.headers
            .extend(authorization_headers(username, password.dangerous_reveal()));
        self
    }

    pub fn with_inner(
        mut self,
        f: impl FnOnce(reqwest::ClientBuilder) -> reqwest::ClientBuilder,
    ) -> Self {
        self.inner = f(self.inner);
        self
    }

    pub fn build_with_scheme(self, scheme: Scheme) -> Result<Client, Error> {
        let Self {
            host,
            port,
            headers,
            inner,
        } = self;
        let client = inner.default_headers(headers).build()?;
        Ok(Client {
            scheme,
            host,
            port,
            client,
        })
    }
}

#[derive(Clone, Copy, Debug)]
pub enum Scheme {
    /// HTTPS
    Secure,
    /// HTTP
    Plain,
}

impl Scheme {
    const fn http(self) -> &'static str {
        match self {
            Scheme::Secure => "https",
            Scheme::Plain => "http",
        }
    }
}

/// An HTTP client aimed at the single `/gmp` endpoint of one scanner.
#[derive(Clone)]
pub struct Client {
    scheme: Scheme,
    host: Host,
    port: Option<u16>,
    client: reqwest::Client,
}

impl Client {
    pub fn builder(host: Host) -> ClientBuilder {
        ClientBuilder::new(host)
    }

    pub(crate) fn get(&self) -> reqwest::RequestBuilder {
        self.client.get(self.gmp_url())
    }

    pub(crate) fn post(&self) -> reqwest::RequestBuilder {
        self.client.post(self.gmp_url())
    }

    fn gmp_url(&self) -> Url {
        self.url()
            .join(GMP_PATH)
            .expect("A constant path joins onto any base URL")
    }

    fn url(&self) -> Url {
        let Self {
            scheme, host, port, ..
        } = self;
        let scheme = scheme.http();
        if let Some(port) = port {
            Url::parse(&format!("{scheme}://{host}:{port}"))
        } else {
            Url::parse(&format!("{scheme}://{host}"))
        }
        .expect("Restricted types are known to combine into a valid URL")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_host() -> Host {
        Host::parse("scanner.example.org").unwrap()
    }

    #[test]
    fn requests_go_to_the_gmp_endpoint() {
        let client = ClientBuilder::new(test_host())
            .port(Some(9392))
            .build_with_scheme(Scheme::Secure)
            .unwrap();
        let request = client.get().build().unwrap();
        assert_eq!(
            request.url().as_str(),
            "https://scanner.example.org:9392/gmp"
        );
    }

    #[test]
    fn plain_scheme_without_port_uses_http() {
        let client = ClientBuilder::new(test_host())
            .build_with_scheme(Scheme::Plain)
            .unwrap();
        let request = client.get().build().unwrap();
        assert_eq!(request.url().as_str(), "http://scanner.example.org/gmp");
    }

    #[test]
    fn basic_authentication_attaches_an_authorization_header() {
        let client = ClientBuilder::new(test_host())
            .basic_authentication("web", &Password::new("admin"))
            .build_with_scheme(Scheme::Secure)
            .unwrap();
        let request = client.get().build().unwrap();
        let authorization = request.headers().get(AUTHORIZATION).unwrap();
        // base64("web:admin")
        assert_eq!(authorization.to_str().unwrap(), "Basic d2ViOmFkbWlu");
    }

    #[test]
    fn without_basic_authentication_no_authorization_header_is_sent() {
        let client = ClientBuilder::new(test_host())
            .build_with_scheme(Scheme::Secure)
            .unwrap();
        let request = client.get().build().unwrap();
        assert!(request.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn the_fixed_frontend_headers_are_installed() {
        let client = ClientBuilder::new(test_host())
            .build_with_scheme(Scheme::Secure)
            .unwrap();
        let request = client.get().build().unwrap();
        assert_eq!(
            request.headers().get("x-requested-with").unwrap(),
            "XMLHttpRequest"
        );
        assert_eq!(
            request.headers().get(ACCEPT_LANGUAGE).unwrap(),
            "en-US,en;q=0.5"
        );
    }
}
