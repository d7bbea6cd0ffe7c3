//! Database URL construction and validation
//!
//! Every URL pointing at a server or a database is produced here. Callers never
//! assemble them by hand.

use once_cell::sync::Lazy;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use thiserror::Error;

/// Port the server listens on when none is given
pub const DEFAULT_PORT: u16 = 5984;

/// Host used when none is given
pub const DEFAULT_HOST: &str = "localhost";

const MAX_HOST_LEN: usize = 254;

static DB_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9_$()+\-/]*$").unwrap());

static HOST_LABEL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9\-]{0,61}[A-Za-z0-9])?$").unwrap());

/// Everything outside the RFC 3986 unreserved set
const DOC_ID_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Invalid db name: '{0}'")]
    InvalidName(String),

    #[error("Invalid host name: '{0}'")]
    InvalidHost(String),

    #[error("Invalid db port: '{0}'")]
    InvalidPort(String),
}

/// Validate a database name
pub fn validate_name(name: &str) -> Result<(), UrlError> {
    if DB_NAME_REGEX.is_match(name) {
        Ok(())
    } else {
        Err(UrlError::InvalidName(name.to_string()))
    }
}

/// Validate a host name: dot-separated DNS labels, 254 characters at most
pub fn validate_host(host: &str) -> Result<(), UrlError> {
    let valid = !host.is_empty()
        && host.len() <= MAX_HOST_LEN
        && host.split('.').all(|label| HOST_LABEL_REGEX.is_match(label));

    if valid {
        Ok(())
    } else {
        Err(UrlError::InvalidHost(host.to_string()))
    }
}

/// Normalize a numeric port. `0` selects [`DEFAULT_PORT`].
pub fn normalize_port(port: i64) -> Result<u16, UrlError> {
    match port {
        0 => Ok(DEFAULT_PORT),
        1..=65535 => Ok(port as u16),
        _ => Err(UrlError::InvalidPort(port.to_string())),
    }
}

/// Coerce a textual port (e.g. from a config file).
///
/// Blank input selects [`DEFAULT_PORT`]; anything that is not an integer is rejected.
pub fn parse_port(raw: &str) -> Result<u16, UrlError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(DEFAULT_PORT);
    }

    let port: i64 = raw
        .parse()
        .map_err(|_| UrlError::InvalidPort(raw.to_string()))?;
    normalize_port(port)
}

/// Build the root URL of a server, without a trailing slash
pub fn make_server_url(host: &str, port: i64) -> Result<String, UrlError> {
    validate_host(host)?;
    let port = normalize_port(port)?;
    Ok(format!("http://{}:{}", host, port))
}

/// Build the base URL of a database: `http://<host>:<port>/<name>/`
///
/// Slashes in the name are escaped as `%2F`; the result always ends with `/`.
pub fn make_database_url(name: &str, host: &str, port: i64) -> Result<String, UrlError> {
    validate_name(name)?;
    let server = make_server_url(host, port)?;
    Ok(format!("{}/{}/", server, name.replace('/', "%2F")))
}

/// Percent-encode a document id for use as a single path segment
pub fn encode_doc_id(id: &str) -> String {
    utf8_percent_encode(id, DOC_ID_ESCAPE).to_string()
}

/// URL of a document inside the database at `db_url`
pub fn document_url(db_url: &str, id: &str) -> String {
    format!("{}{}", db_url, encode_doc_id(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_database_url() {
        let cases = [
            ("mydb", "localhost", 5984, "http://localhost:5984/mydb/"),
            ("mydb", "couchserver", 5984, "http://couchserver:5984/mydb/"),
            ("mydb", "couchserver", 591, "http://couchserver:591/mydb/"),
            ("fu/gu", "couch.example.net", 13, "http://couch.example.net:13/fu%2Fgu/"),
            ("db_$()/+-x", "1.2.3.4", 10001, "http://1.2.3.4:10001/db_$()%2F+-x/"),
        ];

        for (name, host, port, expected) in cases {
            assert_eq!(make_database_url(name, host, port).unwrap(), expected);
        }
    }

    #[test]
    fn test_port_zero_uses_default() {
        assert_eq!(
            make_database_url("mydb", "localhost", 0).unwrap(),
            "http://localhost:5984/mydb/"
        );
    }

    #[test]
    fn test_invalid_names() {
        for name in [
            "UpperCase",
            "moreUpperCase",
            "in!valid",
            "has space",
            "_underscore",
            "in:valid",
            "in?valid",
            "",
        ] {
            assert_eq!(
                make_database_url(name, "localhost", 0),
                Err(UrlError::InvalidName(name.to_string())),
                "name {:?} should be rejected",
                name
            );
        }
    }

    #[test]
    fn test_invalid_hosts() {
        for host in [
            "",
            "local host",
            "local_host",
            "foo%bar",
            "baz@baz.com",
            "שטוייעס.com",
            "--dot.com",
            "local/host",
            "http://",
            "trailing.",
        ] {
            assert!(
                matches!(
                    make_database_url("mydb", host, 0),
                    Err(UrlError::InvalidHost(_))
                ),
                "host {:?} should be rejected",
                host
            );
        }
    }

    #[test]
    fn test_host_length_limits() {
        let label = "a".repeat(63);
        assert!(validate_host(&label).is_ok());
        assert!(validate_host(&"a".repeat(64)).is_err());

        // 4 labels of 63 plus 3 dots = 255
        let too_long = vec![label.as_str(); 4].join(".");
        assert_eq!(too_long.len(), 255);
        assert!(validate_host(&too_long).is_err());
    }

    #[test]
    fn test_invalid_ports() {
        for port in [-12, 0x10000, 100_000] {
            assert!(matches!(
                make_database_url("mydb", "localhost", port),
                Err(UrlError::InvalidPort(_))
            ));
        }

        for raw in ["string", ":55", "12.5"] {
            assert!(matches!(parse_port(raw), Err(UrlError::InvalidPort(_))));
        }
    }

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port("591"), Ok(591));
        assert_eq!(parse_port(" 65535 "), Ok(65535));
        assert_eq!(parse_port("0"), Ok(DEFAULT_PORT));
        assert_eq!(parse_port(""), Ok(DEFAULT_PORT));
        assert!(parse_port("65536").is_err());
    }

    #[test]
    fn test_server_url_has_no_trailing_slash() {
        assert_eq!(
            make_server_url("localhost", 0).unwrap(),
            "http://localhost:5984"
        );
    }

    #[test]
    fn test_encode_doc_id() {
        assert_eq!(encode_doc_id("plain-id_1.x~"), "plain-id_1.x~");
        assert_eq!(encode_doc_id("_design/app"), "_design%2Fapp");
        assert_eq!(encode_doc_id("a b?c&d"), "a%20b%3Fc%26d");
        assert_eq!(
            document_url("http://localhost:5984/db/", "x/y"),
            "http://localhost:5984/db/x%2Fy"
        );
    }
}
