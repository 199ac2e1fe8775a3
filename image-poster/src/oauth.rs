//! OAuth 1.0a request signing (HMAC-SHA1) for the X API.
//!
//! Only signing lives here; the four credential strings are obtained
//! elsewhere and handed in as-is.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Url;
use sha1::Sha1;
use std::time::{SystemTime, UNIX_EPOCH};

/// RFC 3986 unreserved characters stay as they are; everything else is encoded.
const OAUTH_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// The pre-obtained consumer and access-token pairs.
#[derive(Clone)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("access_token", &self.access_token)
            .field("access_token_secret", &"<redacted>")
            .finish()
    }
}

pub fn encode(s: &str) -> String {
    utf8_percent_encode(s, OAUTH_ENCODE).to_string()
}

/// `scheme://host[:port]/path`, without query or fragment.
fn base_url(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    match url.port() {
        Some(port) => format!("{}://{}:{}{}", url.scheme(), host, port, url.path()),
        None => format!("{}://{}{}", url.scheme(), host, url.path()),
    }
}

/// Computes the base64 HMAC-SHA1 signature over `method`, `url` and `params`.
///
/// `params` holds every protocol and request parameter, unencoded. Query
/// parameters already present in `url` are added here.
pub fn signature(
    method: &str,
    url: &Url,
    params: &[(String, String)],
    consumer_secret: &str,
    token_secret: &str,
) -> Result<String, InvalidLength> {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .cloned()
        .chain(url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())))
        .map(|(k, v)| (encode(&k), encode(&v)))
        .collect();
    encoded.sort();
    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let base_string = format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(&base_url(url)),
        encode(&param_string)
    );
    let key = format!("{}&{}", encode(consumer_secret), encode(token_secret));

    let mut mac = Hmac::<Sha1>::new_from_slice(key.as_bytes())?;
    mac.update(base_string.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Builds the `Authorization: OAuth ...` header value with a fixed nonce and timestamp.
pub fn authorization_header_with(
    credentials: &Credentials,
    method: &str,
    url: &Url,
    extra_params: &[(String, String)],
    nonce: &str,
    timestamp: u64,
) -> Result<String, InvalidLength> {
    let mut oauth_params: Vec<(String, String)> = vec![
        ("oauth_consumer_key".into(), credentials.consumer_key.clone()),
        ("oauth_nonce".into(), nonce.to_string()),
        ("oauth_signature_method".into(), "HMAC-SHA1".into()),
        ("oauth_timestamp".into(), timestamp.to_string()),
        ("oauth_token".into(), credentials.access_token.clone()),
        ("oauth_version".into(), "1.0".into()),
    ];
    let all_params: Vec<(String, String)> = oauth_params
        .iter()
        .cloned()
        .chain(extra_params.iter().cloned())
        .collect();
    let sig = signature(
        method,
        url,
        &all_params,
        &credentials.consumer_secret,
        &credentials.access_token_secret,
    )?;
    oauth_params.push(("oauth_signature".into(), sig));
    oauth_params.sort();

    let fields = oauth_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!("OAuth {fields}"))
}

/// Builds the header for a request whose body is not form-encoded
/// (multipart or JSON), using a fresh nonce and the current time.
pub fn authorization_header(
    credentials: &Credentials,
    method: &str,
    url: &Url,
) -> Result<String, InvalidLength> {
    let nonce = uuid::Uuid::new_v4().simple().to_string();
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    authorization_header_with(credentials, method, url, &[], &nonce, timestamp)
}
