mod client;
mod error;
mod psst;
mod responses;
mod session;

pub use client::{authorization_headers, Client, ClientBuilder, Scheme};
pub use error::Error;
pub use psst::Password;
pub use responses::{parse_reports, FormatId, LoginEnvelope, ReportFormats, ReportId, ReportSummary};
pub use session::{Credentials, Session, Token};
