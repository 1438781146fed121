//! Skylink matching and upstream path resolution.
//!
//! Pure functions only; no I/O. A skylink is an opaque content identifier
//! whose first 46 characters are base64url (`A-Z a-z 0-9 _ -`). Records come
//! back from hsd in an authoritative order and the first entry holding a
//! valid skylink wins.

use crate::error::{GatewayError, Result};
use crate::hsd::ResourceRecord;
use url::Url;

/// Length of a bare skylink. Anything longer carries an embedded sub-path.
pub const SKYLINK_LEN: usize = 46;

/// Checks if the given string starts with a valid skylink.
///
/// The check anchors at the start of the string; characters beyond position
/// 46 are irrelevant to validity.
pub fn is_skylink(candidate: &str) -> bool {
    let bytes = candidate.as_bytes();
    if bytes.len() < SKYLINK_LEN {
        return false;
    }
    bytes[..SKYLINK_LEN]
        .iter()
        .all(|b| b.is_ascii_alphanumeric() || *b == b'_' || *b == b'-')
}

/// Returns the first record whose txt entries contain a valid skylink.
pub fn find_skylink_record(records: &[ResourceRecord]) -> Option<&ResourceRecord> {
    records.iter().find(|record| {
        record
            .txt
            .as_deref()
            .is_some_and(|txt| txt.iter().any(|entry| is_skylink(entry)))
    })
}

/// Returns the first txt entry of the record that is a valid skylink.
pub fn skylink_from_record(record: &ResourceRecord) -> Option<&str> {
    record
        .txt
        .as_deref()?
        .iter()
        .map(String::as_str)
        .find(|entry| is_skylink(entry))
}

/// Composes [`find_skylink_record`] and [`skylink_from_record`].
///
/// `None` is the normal "no skylink in this record set" outcome, not an
/// error.
pub fn skylink_from_records(records: &[ResourceRecord]) -> Option<&str> {
    find_skylink_record(records).and_then(skylink_from_record)
}

/// Computes the upstream request path for a skylink and a request sub-path.
///
/// The base is `/` + skylink. A skylink of exactly 46 characters is a bare
/// identifier: joining it with a relative sub-path via standard URL
/// resolution would replace the identifier as if it were an ordinary path
/// segment, so that case is a literal concatenation instead. Longer skylinks
/// already embed a path of their own and resolve the sub-path with standard
/// relative-reference semantics.
///
/// Rejects anything that fails [`is_skylink`] so a corrupted identifier is
/// never forwarded.
pub fn upstream_path(skylink: &str, sub_path: &str) -> Result<String> {
    if !is_skylink(skylink) {
        return Err(GatewayError::MalformedSkylink {
            skylink: skylink.to_string(),
        });
    }

    let base_path = format!("/{}", skylink);
    let sub_path = sub_path.strip_prefix('/').unwrap_or(sub_path);

    if skylink.len() == SKYLINK_LEN && !sub_path.is_empty() {
        return Ok(format!("{}/{}", base_path, sub_path));
    }

    if sub_path.is_empty() {
        return Ok(base_path);
    }

    // The scheme and host are throwaway; only path resolution matters.
    let resolved = Url::parse("http://skylink.invalid")
        .and_then(|origin| origin.join(&base_path))
        .and_then(|base| base.join(sub_path))
        .map_err(|_| GatewayError::MalformedSkylink {
            skylink: skylink.to_string(),
        })?;

    Ok(resolved.path().to_string())
}

/// Rewrites a redirect target that leaks a raw skylink back to the client.
///
/// If `location` begins with the skylink pattern, the matched prefix is
/// replaced with `/hns/<name>` so client-side redirect-following stays
/// routed through the proxy with the same name context. Returns `None` when
/// no rewrite applies.
pub fn rewrite_location(location: &str, name: &str) -> Option<String> {
    if !is_skylink(location) {
        return None;
    }
    Some(format!("/hns/{}{}", name, &location[SKYLINK_LEN..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(txt: Option<Vec<&str>>) -> ResourceRecord {
        ResourceRecord {
            record_type: Some("TXT".to_string()),
            txt: txt.map(|entries| entries.into_iter().map(String::from).collect()),
        }
    }

    #[test]
    fn test_is_skylink() {
        let bare = "a".repeat(46);
        assert!(is_skylink(&bare));
        assert!(is_skylink(&format!("{}/extra/path", bare)));
        assert!(is_skylink("AQAZ0189_-AQAZ0189_-AQAZ0189_-AQAZ0189_-AQAZ01"));

        assert!(!is_skylink(""));
        assert!(!is_skylink(&"a".repeat(45)));
        assert!(!is_skylink(&format!("{}+", "a".repeat(45))));
        assert!(!is_skylink(&format!("sia://{}", "a".repeat(46))));
    }

    #[test]
    fn test_find_skylink_record_first_match_wins() {
        let second = "b".repeat(46);
        let third = "c".repeat(46);
        let records = vec![
            record(Some(vec!["notvalid"])),
            record(Some(vec![second.as_str()])),
            record(Some(vec![third.as_str()])),
        ];

        let found = find_skylink_record(&records).unwrap();
        assert_eq!(found.txt.as_deref().unwrap(), &[second.clone()]);
    }

    #[test]
    fn test_find_skylink_record_skips_empty_txt() {
        let valid = "d".repeat(46);
        let records = vec![
            record(None),
            record(Some(vec![])),
            record(Some(vec!["short", valid.as_str()])),
        ];

        let found = find_skylink_record(&records).unwrap();
        assert_eq!(skylink_from_record(found).unwrap(), valid);
    }

    #[test]
    fn test_no_skylink_in_records() {
        let records = vec![record(Some(vec!["notvalid"])), record(None)];
        assert!(skylink_from_records(&records).is_none());
        assert!(skylink_from_records(&[]).is_none());
    }

    #[test]
    fn test_bare_skylink_join() {
        let skylink = "x".repeat(46);
        let path = upstream_path(&skylink, "images/a.png").unwrap();
        assert_eq!(path, format!("/{}/images/a.png", skylink));
    }

    #[test]
    fn test_bare_skylink_join_with_leading_slash() {
        let skylink = "x".repeat(46);
        let path = upstream_path(&skylink, "/images/a.png").unwrap();
        assert_eq!(path, format!("/{}/images/a.png", skylink));
    }

    #[test]
    fn test_embedded_path_standard_resolution() {
        let skylink = format!("{}/sub/dir", "x".repeat(46));
        let path = upstream_path(&skylink, "a.png").unwrap();
        assert_eq!(path, format!("/{}/sub/a.png", "x".repeat(46)));
    }

    #[test]
    fn test_embedded_path_trailing_slash() {
        let skylink = format!("{}/sub/", "x".repeat(46));
        let path = upstream_path(&skylink, "a.png").unwrap();
        assert_eq!(path, format!("/{}/sub/a.png", "x".repeat(46)));
    }

    #[test]
    fn test_empty_sub_path_returns_base() {
        let bare = "x".repeat(46);
        assert_eq!(upstream_path(&bare, "").unwrap(), format!("/{}", bare));

        let embedded = format!("{}/sub/dir", "x".repeat(46));
        assert_eq!(
            upstream_path(&embedded, "").unwrap(),
            format!("/{}", embedded)
        );
    }

    #[test]
    fn test_malformed_skylink_fails_closed() {
        assert!(matches!(
            upstream_path("short", "images/a.png"),
            Err(GatewayError::MalformedSkylink { .. })
        ));
        assert!(matches!(
            upstream_path("", ""),
            Err(GatewayError::MalformedSkylink { .. })
        ));
    }

    #[test]
    fn test_rewrite_location() {
        let skylink = "a".repeat(46);

        let rewritten = rewrite_location(&format!("{}/next", skylink), "example");
        assert_eq!(rewritten.as_deref(), Some("/hns/example/next"));

        let rewritten = rewrite_location(&skylink, "example");
        assert_eq!(rewritten.as_deref(), Some("/hns/example"));

        assert!(rewrite_location("/relative/path", "example").is_none());
        assert!(rewrite_location("https://elsewhere.test/", "example").is_none());
    }
}
