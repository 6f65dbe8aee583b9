use ovr_gmp::{Error, FormatId, LoginEnvelope, ReportFormats, ReportId, ReportSummary};

const LOGIN_RESPONSE: &str = concat!(
    r#"<envelope><version>22.04</version><vendor_version></vendor_version>"#,
    r#"<token>1e845e72-c186-4ae3-bcbb-e3b0d53b1c37</token>"#,
    r#"<time>Sat Aug 8 10:00:00 2026 UTC</time><login>admin</login></envelope>"#,
);

#[test]
fn login_response_yields_the_token() {
    let envelope: LoginEnvelope = LOGIN_RESPONSE.parse().unwrap();
    assert_eq!(envelope.token, "1e845e72-c186-4ae3-bcbb-e3b0d53b1c37");
}

#[test]
fn login_response_without_a_token_element_is_rejected() {
    let error = "<envelope><login>admin</login></envelope>"
        .parse::<LoginEnvelope>()
        .unwrap_err();
    assert!(matches!(error, Error::MalformedResponse(_)));
}

#[test]
fn login_response_with_an_empty_token_is_rejected() {
    let error = "<envelope><token></token></envelope>"
        .parse::<LoginEnvelope>()
        .unwrap_err();
    assert!(matches!(error, Error::MalformedResponse(_)));
}

const FORMATS_RESPONSE: &str = concat!(
    r#"<envelope><get_report_formats><get_report_formats_response status="200" status_text="OK">"#,
    // A format whose parameter is named like a format must not be matched.
    r#"<report_format id="5ceff8ba-1f62-11e1-ab9f-406186ea4fc5"><name>PDF</name>"#,
    r#"<param><name>XML</name><value>0</value></param></report_format>"#,
    r#"<report_format id="a994b278-1f62-11e1-96ac-406186ea4fc5"><name>XML</name></report_format>"#,
    r#"<report_format id="c1645568-627a-11e3-a660-406186ea4fc5"><name>CSV Results</name></report_format>"#,
    r#"</get_report_formats_response></get_report_formats></envelope>"#,
);

#[test]
fn both_report_formats_are_discovered() {
    let formats: ReportFormats = FORMATS_RESPONSE.parse().unwrap();
    assert_eq!(formats.xml.as_str(), "a994b278-1f62-11e1-96ac-406186ea4fc5");
    assert_eq!(formats.csv.as_str(), "c1645568-627a-11e3-a660-406186ea4fc5");
}

#[test]
fn a_missing_report_format_is_an_explicit_error() {
    let text = concat!(
        r#"<envelope><get_report_formats>"#,
        r#"<report_format id="a994b278-1f62-11e1-96ac-406186ea4fc5"><name>XML</name></report_format>"#,
        r#"</get_report_formats></envelope>"#,
    );
    match text.parse::<ReportFormats>().unwrap_err() {
        Error::MalformedResponse(reason) => assert!(reason.contains("CSV Results")),
        other => panic!("expected a malformed-response error, got {other:?}"),
    }
}

const XML_FORMAT: &str = "a994b278-1f62-11e1-96ac-406186ea4fc5";

fn report(id: &str, format_id: &str, severity: &str) -> String {
    format!(
        concat!(
            r#"<report id="{id}" format_id="{format_id}" extension="xml" content_type="text/xml">"#,
            r#"<name>2026-08-01T10:02:11Z</name><owner><name>admin</name></owner>"#,
            r#"<report content_type="text/xml">"#,
            r#"<scan_run_status>Done</scan_run_status>"#,
            r#"<hosts><count>3</count></hosts>"#,
            r#"<vulns><count>12</count></vulns>"#,
            r#"<result_count><full>32</full><filtered>12</filtered>"#,
            r#"<hole><full>2</full><filtered>2</filtered></hole>"#,
            r#"<warning><full>4</full><filtered>3</filtered></warning>"#,
            r#"<info><full>6</full><filtered>6</filtered></info>"#,
            r#"<log><full>20</full><filtered>0</filtered></log>"#,
            r#"</result_count>"#,
            r#"<severity><full>{severity}</full><filtered>9.0</filtered></severity>"#,
            r#"</report></report>"#,
        ),
        id = id,
        format_id = format_id,
        severity = severity,
    )
}

fn reports_response(reports: &[String]) -> String {
    format!(
        r#"<envelope><get_reports><get_reports_response status="200" status_text="OK">{}</get_reports_response></get_reports></envelope>"#,
        reports.join("")
    )
}

#[test]
fn only_reports_in_the_requested_format_are_listed() {
    let text = reports_response(&[
        report("r-aaa", XML_FORMAT, "9.8"),
        report("r-bbb", "c1645568-627a-11e3-a660-406186ea4fc5", "5.0"),
    ]);
    let reports = ovr_gmp::parse_reports(&text, &FormatId::new(XML_FORMAT)).unwrap();
    assert_eq!(reports.len(), 1);
    let summary = &reports[&ReportId::new("r-aaa")];
    assert_eq!(
        summary,
        &ReportSummary {
            name: "2026-08-01T10:02:11Z".to_string(),
            hosts: 3,
            vulns: 12,
            high: 2,
            medium: 4,
            low: 6,
            log: 20,
            severity: 9.8,
        }
    );
}

#[test]
fn listing_the_same_response_twice_yields_the_same_map() {
    let text = reports_response(&[
        report("r-aaa", XML_FORMAT, "9.8"),
        report("r-ccc", XML_FORMAT, "2.5"),
    ]);
    let format = FormatId::new(XML_FORMAT);
    let first = ovr_gmp::parse_reports(&text, &format).unwrap();
    let second = ovr_gmp::parse_reports(&text, &format).unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
}

#[test]
fn a_non_numeric_count_is_a_malformed_response() {
    let text = reports_response(&[
        report("r-aaa", XML_FORMAT, "9.8").replace("<count>3</count>", "<count>three</count>"),
    ]);
    match ovr_gmp::parse_reports(&text, &FormatId::new(XML_FORMAT)).unwrap_err() {
        Error::MalformedResponse(reason) => assert!(reason.contains("hosts")),
        other => panic!("expected a malformed-response error, got {other:?}"),
    }
}

#[test]
fn a_report_without_a_severity_is_a_malformed_response() {
    let mut broken = report("r-aaa", XML_FORMAT, "9.8");
    broken = broken.replace(
        r#"<severity><full>9.8</full><filtered>9.0</filtered></severity>"#,
        "",
    );
    let text = reports_response(&[broken]);
    let error = ovr_gmp::parse_reports(&text, &FormatId::new(XML_FORMAT)).unwrap_err();
    assert!(matches!(error, Error::MalformedResponse(_)));
}

#[test]
fn an_empty_listing_is_an_empty_map() {
    let text = reports_response(&[]);
    let reports = ovr_gmp::parse_reports(&text, &FormatId::new(XML_FORMAT)).unwrap();
    assert!(reports.is_empty());
}
