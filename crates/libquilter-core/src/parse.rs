//! Patch metadata parsing.
//!
//! A single forward pass over git's mailbox-style patch format, driven by a
//! tagged line classifier and one `in_commit_message` flag. Pure text in,
//! `PatchRecord` out; no I/O happens here.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};

use crate::error::QuilterError;
use crate::types::patch::PatchRecord;

/// Known-bad MIME-encoded author names, keyed by the raw encoded form and
/// applied after decoding as a final override.
const NAME_OVERRIDES: &[(&str, &str)] =
    &[("=?UTF-8?q?Jason=20K=C3=B6lker?=", "Jason Koelker")];

/// One classified line of patch text
#[derive(Debug, PartialEq, Eq)]
enum PatchLine<'a> {
    /// Mailbox separator (`From <id> <date>`); only meaningful as line one
    MboxFrom,
    Author(&'a str),
    Date(&'a str),
    Subject(&'a str),
    DiffFile(&'a str),
    Blank,
    Other,
}

fn classify(line: &str) -> PatchLine<'_> {
    if let Some(rest) = line.strip_prefix("From:") {
        PatchLine::Author(rest.trim())
    } else if line.starts_with("From ") {
        PatchLine::MboxFrom
    } else if let Some(rest) = line.strip_prefix("Date:") {
        PatchLine::Date(rest.trim())
    } else if let Some(rest) = line.strip_prefix("Subject:") {
        PatchLine::Subject(rest.trim())
    } else if line.starts_with("diff --git") {
        PatchLine::DiffFile(line)
    } else if line.trim().is_empty() {
        PatchLine::Blank
    } else {
        PatchLine::Other
    }
}

/// Parse one patch's raw text into a metadata record.
///
/// Fails with `MalformedPatch` only on structural impossibilities (an author
/// header without an email, an unparseable date); missing optional headers
/// simply leave their fields empty.
pub fn parse_patch(filename: &str, raw: &str) -> Result<PatchRecord, QuilterError> {
    let mut author = None;
    let mut author_email = None;
    let mut date = None;
    let mut message: Vec<String> = Vec::new();
    let mut files: Vec<String> = Vec::new();
    let mut in_commit_message = false;
    let mut line_count = 0usize;

    for (lineno, line) in raw.lines().enumerate() {
        line_count += 1;
        match classify(line) {
            // A single leading mailbox separator is skipped; it is not an
            // error for it to be absent.
            PatchLine::MboxFrom if lineno == 0 => {}
            PatchLine::Author(rest) => {
                let (name, email) = parse_author(filename, rest)?;
                author = Some(name);
                author_email = Some(email);
            }
            PatchLine::Date(rest) => {
                date = Some(parse_date(filename, rest)?);
            }
            PatchLine::Subject(rest) => {
                message.push(rest.to_string());
                in_commit_message = true;
            }
            PatchLine::DiffFile(line) => {
                in_commit_message = false;
                files.push(diff_dest_path(line));
            }
            PatchLine::Blank | PatchLine::Other | PatchLine::MboxFrom if in_commit_message => {
                push_message_line(&mut message, line);
            }
            _ => {}
        }
    }

    trim_trailing_blanks(&mut message);

    Ok(PatchRecord {
        filename: filename.to_string(),
        idx: None,
        rev: None,
        author,
        author_email,
        date,
        commit_message: message.join("\n"),
        files,
        line_count,
        issues: vec![],
        reviews: vec![],
    })
}

fn parse_author(filename: &str, rest: &str) -> Result<(String, String), QuilterError> {
    let (name_part, email_part) = rest.split_once('<').ok_or_else(|| {
        QuilterError::malformed(filename, format!("author header without email: '{}'", rest))
    })?;

    let raw_name = name_part.trim();
    let mut name = decode_encoded_words(raw_name).replace('"', "");
    if let Some((_, fixed)) = NAME_OVERRIDES.iter().find(|(raw, _)| *raw == raw_name) {
        name = fixed.to_string();
    }

    let email = email_part.replace('>', "").trim().to_string();
    Ok((name.trim().to_string(), email))
}

fn parse_date(filename: &str, rest: &str) -> Result<DateTime<Utc>, QuilterError> {
    DateTime::parse_from_rfc2822(rest)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| QuilterError::malformed(filename, format!("bad date '{}': {}", rest, e)))
}

/// Extract the destination-side path of a `diff --git` header.
///
/// The last token is always of the form `b/<path>`; the two-character prefix
/// is stripped unconditionally.
fn diff_dest_path(line: &str) -> String {
    let dest = line.split_whitespace().last().unwrap_or("");
    dest.get(2..).unwrap_or_default().to_string()
}

fn push_message_line(message: &mut Vec<String>, line: &str) {
    // Invariant: a subject line opened the message before any body line
    // lands here. The in_commit_message flag makes this unreachable for
    // conforming input.
    debug_assert!(!message.is_empty(), "body line before subject");
    message.push(line.to_string());
}

/// Strip trailing blank lines from the accumulated message. Idempotent.
fn trim_trailing_blanks(lines: &mut Vec<String>) {
    while lines.last().map_or(false, |l| l.trim().is_empty()) {
        lines.pop();
    }
}

/// Decode RFC 2047 encoded-words (`=?charset?enc?payload?=`) in an author
/// name; tokens that are not encoded-words pass through unchanged. Charset
/// bytes are read as UTF-8, lossily.
fn decode_encoded_words(input: &str) -> String {
    if !input.contains("=?") {
        return input.to_string();
    }
    input
        .split_whitespace()
        .map(decode_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_word(token: &str) -> String {
    let inner = match token.strip_prefix("=?").and_then(|t| t.strip_suffix("?=")) {
        Some(inner) => inner,
        None => return token.to_string(),
    };
    let mut parts = inner.splitn(3, '?');
    let (_charset, encoding, payload) = match (parts.next(), parts.next(), parts.next()) {
        (Some(c), Some(e), Some(p)) => (c, e, p),
        _ => return token.to_string(),
    };

    let bytes = if encoding.eq_ignore_ascii_case("q") {
        decode_q(payload)
    } else if encoding.eq_ignore_ascii_case("b") {
        match BASE64.decode(payload) {
            Ok(bytes) => bytes,
            Err(_) => return token.to_string(),
        }
    } else {
        return token.to_string();
    };

    String::from_utf8_lossy(&bytes).into_owned()
}

/// Q-encoding: `_` is a space, `=XX` is a hex-encoded byte.
///
/// Works on raw bytes; an `=` not followed by two ASCII hex digits passes
/// through literally, so a malformed (or multibyte) payload degrades instead
/// of failing.
fn decode_q(payload: &str) -> Vec<u8> {
    let bytes = payload.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'_' => {
                out.push(b' ');
                i += 1;
            }
            b'=' if i + 2 < bytes.len() => {
                let hex = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2]));
                match hex {
                    (Some(hi), Some(lo)) => {
                        out.push(hi << 4 | lo);
                        i += 3;
                    }
                    _ => {
                        out.push(b'=');
                        i += 1;
                    }
                }
            }
            other => {
                out.push(other);
                i += 1;
            }
        }
    }
    out
}

fn hex_digit(byte: u8) -> Option<u8> {
    char::from(byte).to_digit(16).map(|d| d as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SAMPLE: &str = "\
From ply Mon Sep 17 00:00:00 2001
From: Foo Bar <foo.bar@example.com>
Date: Tue, 4 Jun 2013 03:35:51 -0500
Subject: Category: First line

This is the rest of the commit message.
More lines here.

diff --git a/doc/api_samples/all_extensions/extensions-get-resp.json b/doc/api_samples/all_extensions/extensions-get-resp.json
";

    #[test]
    fn test_parse_sample_patch() {
        let record = parse_patch("sample.patch", SAMPLE).unwrap();
        assert_eq!(record.author.as_deref(), Some("Foo Bar"));
        assert_eq!(record.author_email.as_deref(), Some("foo.bar@example.com"));
        assert_eq!(
            record.date,
            Some(Utc.with_ymd_and_hms(2013, 6, 4, 8, 35, 51).unwrap())
        );
        assert_eq!(
            record.commit_message,
            "Category: First line\n\nThis is the rest of the commit message.\nMore lines here."
        );
        assert_eq!(
            record.files,
            vec!["doc/api_samples/all_extensions/extensions-get-resp.json".to_string()]
        );
        assert_eq!(record.line_count, 9);
        assert_eq!(record.category(), Some("Category"));
        assert_eq!(record.subject(), Some("Category: First line"));
    }

    #[test]
    fn test_multiple_diff_headers_in_order() {
        let raw = "\
From: A <a@example.com>
Date: Tue, 4 Jun 2013 03:35:51 -0500
Subject: x

diff --git a/one.txt b/one.txt
diff --git a/sub/two.txt b/sub/two.txt
diff --git a/three.txt b/three.txt
";
        let record = parse_patch("p.patch", raw).unwrap();
        assert_eq!(record.files, vec!["one.txt", "sub/two.txt", "three.txt"]);
    }

    #[test]
    fn test_missing_separator_is_fine() {
        let raw = "From: A <a@example.com>\nSubject: hi\n";
        let record = parse_patch("p.patch", raw).unwrap();
        assert_eq!(record.author.as_deref(), Some("A"));
        assert_eq!(record.commit_message, "hi");
    }

    #[test]
    fn test_missing_subject_yields_empty_message_and_no_category() {
        let raw = "From: A <a@example.com>\ndiff --git a/x b/x\n";
        let record = parse_patch("p.patch", raw).unwrap();
        assert_eq!(record.commit_message, "");
        assert_eq!(record.subject(), None);
        assert_eq!(record.category(), None);
    }

    #[test]
    fn test_subject_without_colon_has_no_category() {
        let raw = "Subject: no category in sight\n";
        let record = parse_patch("p.patch", raw).unwrap();
        assert_eq!(record.category(), None);
    }

    #[test]
    fn test_author_without_email_is_malformed() {
        let raw = "From: Just A Name\n";
        let err = parse_patch("broken.patch", raw).unwrap_err();
        match err {
            QuilterError::MalformedPatch { filename, .. } => {
                assert_eq!(filename, "broken.patch");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_bad_date_is_malformed() {
        let raw = "Date: not a date at all\n";
        assert!(parse_patch("p.patch", raw).is_err());
    }

    #[test]
    fn test_quoted_author_name_stripped() {
        let raw = "From: \"Foo Bar\" <foo@example.com>\n";
        let record = parse_patch("p.patch", raw).unwrap();
        assert_eq!(record.author.as_deref(), Some("Foo Bar"));
    }

    #[test]
    fn test_mime_q_encoded_author_decoded() {
        let raw = "From: =?UTF-8?q?Andr=C3=A9_Branco?= <andre@example.com>\n";
        let record = parse_patch("p.patch", raw).unwrap();
        assert_eq!(record.author.as_deref(), Some("André Branco"));
    }

    #[test]
    fn test_mime_b_encoded_author_decoded() {
        // "José" base64-encoded as UTF-8
        let raw = "From: =?UTF-8?B?Sm9zw6k=?= <jose@example.com>\n";
        let record = parse_patch("p.patch", raw).unwrap();
        assert_eq!(record.author.as_deref(), Some("José"));
    }

    #[test]
    fn test_q_encoded_multibyte_payload_degrades() {
        // An '=' followed by raw multibyte UTF-8 is not a hex escape; it
        // must pass through literally rather than abort the parse.
        let raw = "From: =?UTF-8?q?=aéx?= <x@example.com>\n";
        let record = parse_patch("p.patch", raw).unwrap();
        assert_eq!(record.author.as_deref(), Some("=aéx"));
    }

    #[test]
    fn test_q_encoded_truncated_escape_degrades() {
        let raw = "From: =?UTF-8?q?abc=?= <x@example.com>\n";
        let record = parse_patch("p.patch", raw).unwrap();
        assert_eq!(record.author.as_deref(), Some("abc="));
    }

    #[test]
    fn test_name_override_applied_after_decoding() {
        let raw = "From: =?UTF-8?q?Jason=20K=C3=B6lker?= <jason@example.com>\n";
        let record = parse_patch("p.patch", raw).unwrap();
        assert_eq!(record.author.as_deref(), Some("Jason Koelker"));
    }

    #[test]
    fn test_trim_trailing_blanks_idempotent() {
        let mut lines: Vec<String> = vec![
            "subject".to_string(),
            "".to_string(),
            "body".to_string(),
            "".to_string(),
            "  ".to_string(),
        ];
        trim_trailing_blanks(&mut lines);
        let once = lines.clone();
        trim_trailing_blanks(&mut lines);
        assert_eq!(lines, once);
        assert_eq!(lines, vec!["subject", "", "body"]);
    }

    #[test]
    fn test_line_count_includes_blanks() {
        let raw = "Subject: x\n\n\nbody\n";
        let record = parse_patch("p.patch", raw).unwrap();
        assert_eq!(record.line_count, 4);
    }
}
