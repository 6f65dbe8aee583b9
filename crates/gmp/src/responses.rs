//! Facilities for parsing responses.
//!
//! A GSA wraps every GMP reply in an `envelope` document, so the parsers here
//! scan for the elements they need instead of modeling the whole envelope.
use std::{collections::BTreeMap, fmt, str::FromStr};

use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};
use serde::Serialize;

use crate::Error;

const XML_FORMAT_NAME: &str = "XML";
const CSV_FORMAT_NAME: &str = "CSV Results";

/// Server-assigned identifier of an export format.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FormatId(String);

impl FormatId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct ReportId(String);

impl ReportId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

fn attribute(e: &BytesStart, name: &str) -> Result<Option<String>, Error> {
    Ok(e.try_get_attribute(name)?
        .map(|a| String::from_utf8_lossy(&a.value).into_owned()))
}

/// The interesting part of a `cmd=login` reply.
#[derive(Clone, Debug)]
pub struct LoginEnvelope {
    pub token: String,
}

impl FromStr for LoginEnvelope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut reader = Reader::from_str(s);
        let mut capturing = false;
        let mut token = String::new();
        loop {
            match reader.read_event()? {
                Event::Start(e) if e.local_name().as_ref() == b"token" => capturing = true,
                Event::Text(e) if capturing => token.push_str(&e.unescape()?),
                Event::End(e) if capturing && e.local_name().as_ref() == b"token" => break,
                Event::Eof => {
                    return Err(Error::MalformedResponse(
                        "login response did not contain a token element".to_string(),
                    ));
                }
                _ => {}
            }
        }
        if token.is_empty() {
            return Err(Error::MalformedResponse(
                "login response contained an empty token".to_string(),
            ));
        }
        Ok(Self { token })
    }
}

/// The two export formats this client needs; everything else the scanner
/// offers is discarded.
#[derive(Clone, Debug)]
pub struct ReportFormats {
    pub xml: FormatId,
    pub csv: FormatId,
}

impl FromStr for ReportFormats {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut reader = Reader::from_str(s);
        let mut xml = None;
        let mut csv = None;
        let mut depth = 0usize;
        // Id of the report_format currently open, and the depth it opened at.
        let mut format: Option<(String, usize)> = None;
        // Text of a direct name child currently being read. `param` elements
        // nested deeper also carry name children; those must not match.
        let mut name: Option<String> = None;
        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    depth += 1;
                    match e.local_name().as_ref() {
                        b"report_format" if format.is_none() => {
                            if let Some(id) = attribute(&e, "id")? {
                                format = Some((id, depth));
                            }
                        }
                        b"name" => {
                            if let Some((_, d)) = &format {
                                if depth == d + 1 {
                                    name = Some(String::new());
                                }
                            }
                        }
                        _ => {}
                    }
                }
                Event::Text(e) => {
                    if let Some(name) = &mut name {
                        name.push_str(&e.unescape()?);
                    }
                }
                Event::End(e) => {
                    match e.local_name().as_ref() {
                        b"name" => {
                            if let (Some((id, _)), Some(text)) = (&format, name.take()) {
                                match text.as_str() {
                                    XML_FORMAT_NAME => xml = Some(FormatId(id.clone())),
                                    CSV_FORMAT_NAME => csv = Some(FormatId(id.clone())),
                                    _ => {}
                                }
                            }
                        }
                        b"report_format" => format = None,
                        _ => {}
                    }
                    depth -= 1;
                }
                Event::Eof => break,
                _ => {}
            }
        }
        match (xml, csv) {
            (Some(xml), Some(csv)) => Ok(Self { xml, csv }),
            (None, _) => Err(Error::MalformedResponse(format!(
                "scanner offers no report format named {XML_FORMAT_NAME:?}"
            ))),
            (_, None) => Err(Error::MalformedResponse(format!(
                "scanner offers no report format named {CSV_FORMAT_NAME:?}"
            ))),
        }
    }
}

/// One row of a report listing.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReportSummary {
    pub name: String,
    pub hosts: u32,
    pub vulns: u32,
    pub high: u32,
    pub medium: u32,
    pub low: u32,
    pub log: u32,
    pub severity: f64,
}

#[derive(Clone, Copy, Eq, PartialEq)]
enum Section {
    Hosts,
    Vulns,
    High,
    Medium,
    Low,
    Log,
    Severity,
}

impl Section {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"hosts" => Some(Self::Hosts),
            b"vulns" => Some(Self::Vulns),
            b"hole" => Some(Self::High),
            b"warning" => Some(Self::Medium),
            b"info" => Some(Self::Low),
            b"log" => Some(Self::Log),
            b"severity" => Some(Self::Severity),
            _ => None,
        }
    }

    // hosts and vulns report a count; the severity buckets report full and
    // filtered totals, of which only the full one is kept.
    fn value_tag(self) -> &'static [u8] {
        match self {
            Self::Hosts | Self::Vulns => b"count",
            _ => b"full",
        }
    }
}

#[derive(Default)]
struct Fields {
    name: Option<String>,
    hosts: Option<String>,
    vulns: Option<String>,
    high: Option<String>,
    medium: Option<String>,
    low: Option<String>,
    log: Option<String>,
    severity: Option<String>,
}

impl Fields {
    fn get(&mut self, section: Section) -> &mut Option<String> {
        match section {
            Section::Hosts => &mut self.hosts,
            Section::Vulns => &mut self.vulns,
            Section::High => &mut self.high,
            Section::Medium => &mut self.medium,
            Section::Low => &mut self.low,
            Section::Log => &mut self.log,
            Section::Severity => &mut self.severity,
        }
    }
}

struct Entry {
    id: ReportId,
    depth: usize,
    fields: Fields,
}

impl Entry {
    fn into_summary(self) -> Result<(ReportId, ReportSummary), Error> {
        let Self { id, fields, .. } = self;
        let Fields {
            name,
            hosts,
            vulns,
            high,
            medium,
            low,
            log,
            severity,
        } = fields;
        let summary = ReportSummary {
            name: required(name, "name", &id)?,
            hosts: parse_count(required(hosts, "hosts", &id)?, "hosts", &id)?,
            vulns: parse_count(required(vulns, "vulns", &id)?, "vulns", &id)?,
            high: parse_count(required(high, "high", &id)?, "high", &id)?,
            medium: parse_count(required(medium, "medium", &id)?, "medium", &id)?,
            low: parse_count(required(low, "low", &id)?, "low", &id)?,
            log: parse_count(required(log, "log", &id)?, "log", &id)?,
            severity: parse_severity(required(severity, "severity", &id)?, &id)?,
        };
        Ok((id, summary))
    }
}

fn required(field: Option<String>, name: &str, id: &ReportId) -> Result<String, Error> {
    field.ok_or_else(|| Error::MalformedResponse(format!("report {id} is missing its {name}")))
}

fn parse_count(text: String, name: &str, id: &ReportId) -> Result<u32, Error> {
    text.trim().parse().map_err(|_| {
        Error::MalformedResponse(format!("report {id} has a non-numeric {name}: {text:?}"))
    })
}

fn parse_severity(text: String, id: &ReportId) -> Result<f64, Error> {
    text.trim().parse().map_err(|_| {
        Error::MalformedResponse(format!("report {id} has a non-numeric severity: {text:?}"))
    })
}

enum Capture {
    Name,
    SectionValue(Section),
}

/// Extract the summaries of all reports exported in `format` from a
/// `cmd=get_reports` reply.
///
/// Listing entries carrying another format id, and the nested per-scan
/// `report` elements, are passed over. Every call builds the map from
/// scratch.
pub fn parse_reports(
    s: &str,
    format: &FormatId,
) -> Result<BTreeMap<ReportId, ReportSummary>, Error> {
    let mut reader = Reader::from_str(s);
    let mut reports = BTreeMap::new();
    let mut depth = 0usize;
    let mut entry: Option<Entry> = None;
    let mut section: Option<(Section, usize)> = None;
    let mut capture: Option<(Capture, String)> = None;
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                depth += 1;
                let tag = e.local_name();
                let tag = tag.as_ref();
                if let Some(en) = entry.as_mut() {
                    if tag == b"name" && depth == en.depth + 1 && en.fields.name.is_none() {
                        capture = Some((Capture::Name, String::new()));
                    } else if let Some((sec, d)) = section {
                        if capture.is_none()
                            && tag == sec.value_tag()
                            && depth == d + 1
                            && en.fields.get(sec).is_none()
                        {
                            capture = Some((Capture::SectionValue(sec), String::new()));
                        }
                    } else if let Some(sec) = Section::from_tag(tag) {
                        section = Some((sec, depth));
                    }
                } else if tag == b"report" {
                    let id = attribute(&e, "id")?;
                    let extension = attribute(&e, "extension")?;
                    let format_id = attribute(&e, "format_id")?;
                    if let (Some(id), Some(extension), Some(format_id)) = (id, extension, format_id)
                    {
                        if extension == "xml" && format_id == format.as_str() {
                            entry = Some(Entry {
                                id: ReportId(id),
                                depth,
                                fields: Fields::default(),
                            });
                        }
                    }
                }
            }
            Event::Text(e) => {
                if let Some((_, text)) = &mut capture {
                    text.push_str(&e.unescape()?);
                }
            }
            Event::End(e) => {
                let tag = e.local_name();
                let tag = tag.as_ref();
                let mut done = false;
                if let Some(en) = entry.as_mut() {
                    if let Some((what, text)) = capture.take() {
                        match what {
                            Capture::Name => en.fields.name = Some(text),
                            Capture::SectionValue(sec) => *en.fields.get(sec) = Some(text),
                        }
                    } else if let Some((_, d)) = section {
                        if depth == d {
                            section = None;
                        }
                    } else if tag == b"report" && depth == en.depth {
                        done = true;
                    }
                }
                if done {
                    let (id, summary) = entry
                        .take()
                        .expect("An entry is open when its end tag is seen")
                        .into_summary()?;
                    reports.insert(id, summary);
                }
                depth -= 1;
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(reports)
}
