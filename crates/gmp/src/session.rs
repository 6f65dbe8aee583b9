//! Facilities for authenticating with a scanner and working with its reports.
//!
//! A [`Session`] is only ever constructed fully initialized: logging in and
//! discovering the two export formats happen inside [`Session::open`], so an
//! existing session always carries a token, the captured cookies and both
//! format ids.
use std::{collections::BTreeMap, env, fmt};

use log::{debug, info};
use reqwest::{
    header::{HeaderMap, COOKIE, SET_COOKIE},
    StatusCode,
};

use crate::{
    responses::{parse_reports, LoginEnvelope, ReportFormats, ReportId, ReportSummary},
    Client, Error, Password,
};

const LIST_FILTER: &str = "sort-reverse=date first=1 rows=10";
const EXPORT_FILTER: &str =
    "apply_overrides=0 min_qod=70 autofp=0 levels=hml first=1 rows=0 sort-reverse=severity";

/// The application login pair, distinct from the basic-auth pair the client
/// may carry underneath.
pub struct Credentials {
    pub username: String,
    pub password: Password,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Password::new(password.into()),
        }
    }

    pub fn from_env() -> Result<Self, Error> {
        let username =
            env::var("OPENVAS_USERNAME").map_err(|_| Error::CredentialsMissing("OPENVAS_USERNAME"))?;
        let password =
            env::var("OPENVAS_PASSWORD").map_err(|_| Error::CredentialsMissing("OPENVAS_PASSWORD"))?;
        Ok(Self::new(username, password))
    }
}

/// The short-lived credential a login returns, passed as a parameter on every
/// subsequent request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Token(String);

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

fn expect_ok(status: StatusCode) -> Result<(), Error> {
    if status != StatusCode::OK {
        return Err(Error::UnexpectedStatus(status));
    }
    Ok(())
}

fn cookies_from_response(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut cookies = BTreeMap::new();
    for value in headers.get_all(SET_COOKIE) {
        let Ok(value) = value.to_str() else { continue };
        // Only the leading key=value pair matters; Path, HttpOnly and
        // friends are attributes of the cookie, not cookies.
        let pair = value.split(';').next().unwrap_or(value);
        if let Some((k, v)) = pair.split_once('=') {
            cookies.insert(k.trim().to_string(), v.trim().to_string());
        }
    }
    cookies
}

fn cookie_header(cookies: &BTreeMap<String, String>) -> String {
    cookies
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// An authenticated connection to one scanner.
pub struct Session {
    client: Client,
    token: Token,
    cookies: BTreeMap<String, String>,
    formats: ReportFormats,
}

impl Session {
    /// Log in and discover the XML and CSV export formats.
    ///
    /// Any failure along the way aborts the construction; a scanner that
    /// lacks either format is reported as [`Error::MalformedResponse`]
    /// rather than producing a half-usable session.
    pub async fn open(client: Client, credentials: &Credentials) -> Result<Self, Error> {
        info!("Logging in as {} ...", credentials.username);
        let response = client
            .post()
            .form(&[
                ("cmd", "login"),
                ("login", credentials.username.as_str()),
                ("password", credentials.password.dangerous_reveal()),
            ])
            .send()
            .await?;
        expect_ok(response.status())?;
        let cookies = cookies_from_response(response.headers());
        debug!("Captured {} session cookie(s)", cookies.len());
        let envelope: LoginEnvelope = response.text().await?.parse()?;
        let token = Token(envelope.token);

        let formats = discover_report_formats(&client, &token, &cookies).await?;
        Ok(Self {
            client,
            token,
            cookies,
            formats,
        })
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn report_formats(&self) -> &ReportFormats {
        &self.formats
    }

    /// Fetch the ten most recent reports, newest first, and summarize those
    /// exported as XML.
    ///
    /// Every call returns a freshly built map; nothing is carried over from
    /// earlier listings.
    pub async fn list_reports(&self) -> Result<BTreeMap<ReportId, ReportSummary>, Error> {
        info!("Listing the most recent reports ...");
        let response = self
            .get(&[("cmd", "get_reports"), ("details", "0"), ("filter", LIST_FILTER)])
            .send()
            .await?;
        expect_ok(response.status())?;
        let text = response.text().await?;
        parse_reports(&text, &self.formats.xml)
    }

    /// Download one report, rendered by the scanner in its CSV results
    /// format, and hand the raw body back to the caller.
    pub async fn fetch_report(&self, id: &ReportId) -> Result<Vec<u8>, Error> {
        info!("Fetching report {id} ...");
        let response = self
            .get(&[
                ("cmd", "get_report"),
                ("report_id", id.as_str()),
                ("report_format_id", self.formats.csv.as_str()),
                ("filter", EXPORT_FILTER),
                ("ignore_pagination", "1"),
                ("submit", "Download"),
            ])
            .send()
            .await?;
        expect_ok(response.status())?;
        Ok(response.bytes().await?.to_vec())
    }

    fn get(&self, params: &[(&str, &str)]) -> reqwest::RequestBuilder {
        self.client
            .get()
            .query(&[("token", self.token.0.as_str())])
            .query(params)
            .header(COOKIE, cookie_header(&self.cookies))
    }
}

async fn discover_report_formats(
    client: &Client,
    token: &Token,
    cookies: &BTreeMap<String, String>,
) -> Result<ReportFormats, Error> {
    info!("Discovering report formats ...");
    let response = client
        .get()
        .query(&[
            ("cmd", "get_report_formats"),
            ("token", token.0.as_str()),
        ])
        .header(COOKIE, cookie_header(cookies))
        .send()
        .await?;
    expect_ok(response.status())?;
    let formats: ReportFormats = response.text().await?.parse()?;
    debug!("XML format is {}, CSV format is {}", formats.xml, formats.csv);
    Ok(formats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_cookie_headers_become_a_cookie_map() {
        let mut headers = HeaderMap::new();
        headers.append(
            SET_COOKIE,
            "GSAD_SID=42; Path=/; Secure; HttpOnly".parse().unwrap(),
        );
        headers.append(SET_COOKIE, "other=1".parse().unwrap());
        let cookies = cookies_from_response(&headers);
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies["GSAD_SID"], "42");
        assert_eq!(cookies["other"], "1");
    }

    #[test]
    fn cookie_header_joins_pairs() {
        let mut cookies = BTreeMap::new();
        cookies.insert("a".to_string(), "1".to_string());
        cookies.insert("b".to_string(), "2".to_string());
        assert_eq!(cookie_header(&cookies), "a=1; b=2");
    }

    #[test]
    fn a_server_error_is_an_unexpected_status() {
        match expect_ok(StatusCode::INTERNAL_SERVER_ERROR) {
            Err(Error::UnexpectedStatus(status)) => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR)
            }
            other => panic!("expected an unexpected-status error, got {other:?}"),
        }
        assert!(expect_ok(StatusCode::OK).is_ok());
    }
}
