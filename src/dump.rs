//! Streaming reader for MediaWiki XML exports.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use bzip2::read::BzDecoder;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    pub static ref TITLE_PATTERN: Regex = Regex::new(r"<title>([^<]+)</title>").unwrap();
    pub static ref NS_PATTERN: Regex = Regex::new(r"<ns>(\d+)</ns>").unwrap();
    pub static ref TEXT_PATTERN: Regex = Regex::new(r"(?s)<text[^>]*>(.+?)</text>").unwrap();
    pub static ref REDIRECT_PATTERN: Regex = Regex::new(r#"<redirect\s+title="[^"]+""#).unwrap();
}

const PAGE_OPEN: &[u8] = b"<page>";
const PAGE_CLOSE: &[u8] = b"</page>";

/// One `<page>` element, text already unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    pub title: String,
    pub ns: u32,
    pub text: String,
    pub is_redirect: bool,
}

/// Opens a dump, decompressing `.bz2` files on the fly.
pub fn open_dump(path: &Path) -> io::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    let reader: Box<dyn BufRead> = if path.to_string_lossy().ends_with(".bz2") {
        Box::new(BufReader::with_capacity(256 * 1024, BzDecoder::new(file)))
    } else {
        Box::new(BufReader::with_capacity(256 * 1024, file))
    };
    Ok(reader)
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Calls `callback` with the XML of every complete `<page>` element until it
/// returns false or the input ends. Pages are cut on bytes so multi-byte
/// characters split across reads survive.
pub fn scan_pages(mut reader: impl BufRead, mut callback: impl FnMut(String) -> bool) -> io::Result<()> {
    let mut buffer: Vec<u8> = Vec::new();
    let mut chunk = vec![0u8; 1024 * 1024]; // 1MB chunks

    loop {
        let bytes_read = reader.read(&mut chunk)?;
        if bytes_read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..bytes_read]);

        while let Some(start) = find_bytes(&buffer, PAGE_OPEN) {
            match find_bytes(&buffer[start..], PAGE_CLOSE) {
                Some(end_offset) => {
                    let end = start + end_offset + PAGE_CLOSE.len();
                    let page_xml = String::from_utf8_lossy(&buffer[start..end]).into_owned();
                    buffer.drain(..end);
                    if !callback(page_xml) {
                        return Ok(());
                    }
                }
                None => {
                    buffer.drain(..start);
                    break;
                }
            }
        }

        // Keep a tail long enough to hold a split "<page>"
        if find_bytes(&buffer, PAGE_OPEN).is_none() && buffer.len() > PAGE_OPEN.len() {
            buffer.drain(..buffer.len() - PAGE_OPEN.len());
        }
    }

    Ok(())
}

/// Undoes the entity escaping of XML text nodes.
pub fn unescape_xml(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    // &amp; last so "&amp;lt;" stays "&lt;"
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Pulls title, namespace, redirect flag and text out of one page. Pages
/// without a title are dropped; a missing `<text>` gives empty text.
pub fn parse_page_xml(page_xml: &str) -> Option<RawPage> {
    let title = unescape_xml(TITLE_PATTERN.captures(page_xml)?.get(1)?.as_str());
    let ns = NS_PATTERN
        .captures(page_xml)
        .and_then(|cap| cap[1].parse().ok())
        .unwrap_or(0);
    let text = TEXT_PATTERN
        .captures(page_xml)
        .map(|cap| unescape_xml(&cap[1]))
        .unwrap_or_default();
    Some(RawPage {
        title,
        ns,
        text,
        is_redirect: REDIRECT_PATTERN.is_match(page_xml),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests for dump reading
// ─────────────────────────────────────────────────────────────────────────────
