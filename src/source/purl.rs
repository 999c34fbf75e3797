//! Package URL generation
//!
//! Produces `pkg:generic/<name>@<version>?checksum=<sha>&download_url=<url>`.
//! Qualifiers are ordered by key. The URL is encoded and then decoded back,
//! so the stored form is readable; the encoded form is kept only when that
//! decoding fails.

use url::form_urlencoded;

/// Package URL type for dependencies without an ecosystem-specific type
const PURL_TYPE: &str = "generic";

/// Build the package URL for a downloaded release.
pub fn generate_purl(name: &str, version: &str, checksum: &str, download_url: &str) -> String {
    let qualifiers = [("checksum", checksum), ("download_url", download_url)];
    let escaped = escaped_purl(name, version, &qualifiers);

    match unescape(&escaped) {
        Some(readable) => readable,
        None => {
            tracing::debug!(purl = %escaped, "keeping percent-encoded package URL");
            escaped
        }
    }
}

/// The percent-encoded package URL.
pub fn escaped_purl(name: &str, version: &str, qualifiers: &[(&str, &str)]) -> String {
    let mut sorted = qualifiers.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let query = sorted
        .iter()
        .map(|(key, value)| format!("{}={}", key, encode(value)))
        .collect::<Vec<_>>()
        .join("&");

    let mut purl = format!("pkg:{}/{}@{}", PURL_TYPE, encode(name), encode(version));
    if !query.is_empty() {
        purl.push('?');
        purl.push_str(&query);
    }
    purl
}

/// Decode `%XX` escapes. `None` on a malformed escape or if the result is
/// not UTF-8. A `+` is left as is.
fn unescape(encoded: &str) -> Option<String> {
    let bytes = encoded.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());

    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let pair = bytes.get(i + 1..i + 3)?;
            decoded.extend(hex::decode(pair).ok()?);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8(decoded).ok()
}

fn encode(value: &str) -> String {
    // Form encoding writes spaces as '+'; a literal '+' is already %2B.
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
