//! S3-compatible REST adapter.
//!
//! Talks to AWS S3, MinIO, Cloudflare R2, DigitalOcean Spaces and friends over
//! plain `reqwest`, signing every request with AWS Signature Version 4. Path-style
//! (`https://endpoint/bucket/key`) and virtual-hosted (`https://bucket.endpoint/key`)
//! addressing are both supported and selected per disk.

use super::{
    GatewayError, GatewayResult, ObjectStoreGateway, StoreConnector, Visibility,
};
use crate::config::DiskConfig;
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use regex::Regex;
use reqwest::{
    Client, Method, Response, StatusCode,
    header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, LAST_MODIFIED},
};
use sha2::{Digest, Sha256};
use std::{collections::BTreeMap, error::Error as _, io, sync::Arc, sync::LazyLock, time::Duration};
use tracing::debug;
use url::Url;

type HmacSha256 = Hmac<Sha256>;

/// S3 refuses presigned URLs that live longer than seven days.
const MAX_PRESIGN_SECS: u64 = 604_800;
const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

static CONTENTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<Contents>(.*?)</Contents>").expect("static regex"));
static COMMON_PREFIXES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<CommonPrefixes>(.*?)</CommonPrefixes>").expect("static regex")
});

/// Builds [`S3ObjectStore`] instances that share one HTTP connection pool.
pub struct S3Connector {
    client: Client,
}

impl S3Connector {
    pub fn new(request_timeout: Duration) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(classify_transport)?;
        Ok(Self { client })
    }
}

impl StoreConnector for S3Connector {
    fn connect(
        &self,
        _disk: &str,
        config: &DiskConfig,
    ) -> GatewayResult<Arc<dyn ObjectStoreGateway>> {
        let store: Arc<dyn ObjectStoreGateway> =
            Arc::new(S3ObjectStore::new(self.client.clone(), config)?);
        Ok(store)
    }
}

/// One bucket on one S3-compatible endpoint.
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    region: String,
    endpoint: Url,
    path_style: bool,
    access_key: String,
    secret_key: String,
}

/// Where a request goes and what gets signed for it.
#[derive(Debug, PartialEq)]
struct Target {
    scheme: String,
    host: String,
    path: String,
}

impl Target {
    fn url(&self, canonical_query: &str) -> String {
        if canonical_query.is_empty() {
            format!("{}://{}{}", self.scheme, self.host, self.path)
        } else {
            format!("{}://{}{}?{}", self.scheme, self.host, self.path, canonical_query)
        }
    }
}

/// One page of a ListObjectsV2 response.
#[derive(Debug, Default)]
struct ListPage {
    keys: Vec<String>,
    common_prefixes: Vec<String>,
    truncated: bool,
    next_token: Option<String>,
}

impl S3ObjectStore {
    pub fn new(client: Client, config: &DiskConfig) -> GatewayResult<Self> {
        let raw_endpoint = config
            .endpoint
            .clone()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| format!("https://s3.{}.amazonaws.com", config.region));
        let endpoint = Url::parse(raw_endpoint.trim_end_matches('/'))
            .map_err(|e| GatewayError::InvalidEndpoint(format!("{}: {}", raw_endpoint, e)))?;
        if endpoint.host_str().is_none() {
            return Err(GatewayError::InvalidEndpoint(raw_endpoint));
        }
        let (access_key, secret_key) = config.credentials();

        Ok(Self {
            client,
            bucket: config.bucket.clone(),
            region: config.region.clone(),
            endpoint,
            path_style: config.use_path_style_endpoint,
            access_key,
            secret_key,
        })
    }

    /// Resolve scheme, host header and canonical path for `key` (or the bucket itself).
    fn target(&self, key: Option<&str>) -> Target {
        let host = self.endpoint.host_str().unwrap_or_default();
        let host = match self.endpoint.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let encoded_key = key.map(encode_key);

        if self.path_style {
            let path = match encoded_key {
                Some(k) => format!("/{}/{}", self.bucket, k),
                None => format!("/{}", self.bucket),
            };
            Target {
                scheme: self.endpoint.scheme().to_string(),
                host,
                path,
            }
        } else {
            Target {
                scheme: self.endpoint.scheme().to_string(),
                host: format!("{}.{}", self.bucket, host),
                path: format!("/{}", encoded_key.unwrap_or_default()),
            }
        }
    }

    fn signing_key(&self, date_stamp: &str) -> GatewayResult<Vec<u8>> {
        let k_date = hmac_sha256(
            format!("AWS4{}", self.secret_key).as_bytes(),
            date_stamp.as_bytes(),
        )?;
        let k_region = hmac_sha256(&k_date, self.region.as_bytes())?;
        let k_service = hmac_sha256(&k_region, b"s3")?;
        hmac_sha256(&k_service, b"aws4_request")
    }

    /// Sign a header-authenticated request and return the `Authorization` value.
    ///
    /// `headers` must hold lowercase names and already include `host`,
    /// `x-amz-date` and `x-amz-content-sha256`.
    fn authorization(
        &self,
        method: &Method,
        target: &Target,
        canonical_query: &str,
        headers: &BTreeMap<String, String>,
        payload_hash: &str,
        now: DateTime<Utc>,
    ) -> GatewayResult<String> {
        let date_stamp = now.format("%Y%m%d").to_string();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();

        let canonical_headers: String = headers
            .iter()
            .map(|(name, value)| format!("{}:{}\n", name, value.trim()))
            .collect();
        let signed_headers = headers.keys().cloned().collect::<Vec<_>>().join(";");

        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            method.as_str(),
            target.path,
            canonical_query,
            canonical_headers,
            signed_headers,
            payload_hash
        );

        let credential_scope = format!("{}/{}/s3/aws4_request", date_stamp, self.region);
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            amz_date,
            credential_scope,
            sha256_hex(canonical_request.as_bytes())
        );
        let signature = hex::encode(hmac_sha256(
            &self.signing_key(&date_stamp)?,
            string_to_sign.as_bytes(),
        )?);

        Ok(format!(
            "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
            self.access_key, credential_scope, signed_headers, signature
        ))
    }

    /// Build a presigned GET URL valid for `ttl` from `now`.
    fn presign(&self, key: &str, ttl: Duration, now: DateTime<Utc>) -> GatewayResult<String> {
        let target = self.target(Some(key));
        let date_stamp = now.format("%Y%m%d").to_string();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let credential = format!(
            "{}/{}/{}/s3/aws4_request",
            self.access_key, date_stamp, self.region
        );
        let expires = ttl.as_secs().clamp(1, MAX_PRESIGN_SECS).to_string();

        let query = canonical_query(&[
            ("X-Amz-Algorithm", "AWS4-HMAC-SHA256".to_string()),
            ("X-Amz-Credential", credential),
            ("X-Amz-Date", amz_date.clone()),
            ("X-Amz-Expires", expires),
            ("X-Amz-SignedHeaders", "host".to_string()),
        ]);

        let canonical_request = format!(
            "GET\n{}\n{}\nhost:{}\n\nhost\n{}",
            target.path, query, target.host, UNSIGNED_PAYLOAD
        );
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}/{}/s3/aws4_request\n{}",
            amz_date,
            date_stamp,
            self.region,
            sha256_hex(canonical_request.as_bytes())
        );
        let signature = hex::encode(hmac_sha256(
            &self.signing_key(&date_stamp)?,
            string_to_sign.as_bytes(),
        )?);

        Ok(format!(
            "{}&X-Amz-Signature={}",
            target.url(&query),
            signature
        ))
    }

    /// Sign and send one request.
    async fn send(
        &self,
        method: Method,
        key: Option<&str>,
        query: &[(&str, String)],
        body: Bytes,
        extra_headers: &[(&str, String)],
    ) -> GatewayResult<Response> {
        let target = self.target(key);
        let query = canonical_query(query);
        let payload_hash = sha256_hex(&body);
        let now = Utc::now();

        let mut headers = BTreeMap::new();
        headers.insert("host".to_string(), target.host.clone());
        headers.insert(
            "x-amz-date".to_string(),
            now.format("%Y%m%dT%H%M%SZ").to_string(),
        );
        headers.insert("x-amz-content-sha256".to_string(), payload_hash.clone());
        for (name, value) in extra_headers {
            headers.insert(name.to_ascii_lowercase(), value.clone());
        }

        let authorization =
            self.authorization(&method, &target, &query, &headers, &payload_hash, now)?;
        let url = target.url(&query);
        debug!("{} {}", method, url);

        let mut request = self.client.request(method, &url);
        for (name, value) in &headers {
            if name != "host" {
                request = request.header(name.as_str(), value.as_str());
            }
        }
        request
            .header("authorization", authorization)
            .body(body)
            .send()
            .await
            .map_err(classify_transport)
    }

    async fn head(&self, key: &str) -> GatewayResult<HeaderMap> {
        let response = self
            .send(Method::HEAD, Some(key), &[], Bytes::new(), &[])
            .await?;
        let response = expect_success(response, key).await?;
        Ok(response.headers().clone())
    }

    /// Run ListObjectsV2 to completion, following continuation tokens.
    async fn list_objects(&self, prefix: &str, delimited: bool) -> GatewayResult<ListPage> {
        let mut listing = ListPage::default();
        let mut token: Option<String> = None;

        loop {
            let mut query = vec![
                ("list-type", "2".to_string()),
                ("prefix", prefix.to_string()),
            ];
            if delimited {
                query.push(("delimiter", "/".to_string()));
            }
            if let Some(token) = &token {
                query.push(("continuation-token", token.clone()));
            }

            let response = self
                .send(Method::GET, None, &query, Bytes::new(), &[])
                .await?;
            let response = expect_success(response, &self.bucket).await?;
            let xml = response.text().await.map_err(classify_transport)?;
            let page = parse_list_page(&xml);

            listing.keys.extend(page.keys);
            listing.common_prefixes.extend(page.common_prefixes);

            match page.next_token {
                Some(next) if page.truncated => token = Some(next),
                _ => break,
            }
        }

        Ok(listing)
    }
}

#[async_trait]
impl ObjectStoreGateway for S3ObjectStore {
    async fn put(&self, key: &str, body: Bytes, visibility: Visibility) -> GatewayResult<bool> {
        let content_type = mime_guess::from_path(key)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let content_md5 = general_purpose::STANDARD.encode(md5::compute(&body).0);
        let headers = [
            ("content-type", content_type),
            ("content-md5", content_md5),
            ("x-amz-acl", visibility.as_acl().to_string()),
        ];

        let response = self
            .send(Method::PUT, Some(key), &[], body, &headers)
            .await?;
        expect_success(response, key).await?;
        Ok(true)
    }

    async fn delete(&self, key: &str) -> GatewayResult<bool> {
        let response = self
            .send(Method::DELETE, Some(key), &[], Bytes::new(), &[])
            .await?;
        match expect_success(response, key).await {
            Ok(_) => Ok(true),
            Err(GatewayError::NotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn exists(&self, key: &str) -> GatewayResult<bool> {
        match self.head(key).await {
            Ok(_) => Ok(true),
            Err(GatewayError::NotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn size(&self, key: &str) -> GatewayResult<u64> {
        let headers = self.head(key).await?;
        headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| GatewayError::Other(format!("missing content-length for `{}`", key)))
    }

    async fn last_modified(&self, key: &str) -> GatewayResult<DateTime<Utc>> {
        let headers = self.head(key).await?;
        headers
            .get(LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| DateTime::parse_from_rfc2822(v).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| GatewayError::Other(format!("missing last-modified for `{}`", key)))
    }

    async fn mime_type(&self, key: &str) -> GatewayResult<String> {
        let headers = self.head(key).await?;
        Ok(headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string())
    }

    async fn list_all_keys(&self, folder: Option<&str>) -> GatewayResult<Vec<String>> {
        let prefix = folder.map(folder_prefix).unwrap_or_default();
        Ok(self.list_objects(&prefix, false).await?.keys)
    }

    async fn list_files(&self, folder: &str) -> GatewayResult<Vec<String>> {
        let prefix = folder_prefix(folder);
        let page = self.list_objects(&prefix, true).await?;
        // `folder/` placeholders written by other S3 tools are not files.
        Ok(page.keys.into_iter().filter(|k| !k.ends_with('/')).collect())
    }

    async fn list_directories(&self, folder: &str) -> GatewayResult<Vec<String>> {
        let page = self.list_objects(&folder_prefix(folder), true).await?;
        Ok(page
            .common_prefixes
            .into_iter()
            .map(|p| p.trim_end_matches('/').to_string())
            .collect())
    }

    async fn copy_object(&self, from: &str, to: &str) -> GatewayResult<bool> {
        let source = format!("/{}/{}", self.bucket, encode_key(from));
        let response = self
            .send(
                Method::PUT,
                Some(to),
                &[],
                Bytes::new(),
                &[("x-amz-copy-source", source)],
            )
            .await?;
        let response = match expect_success(response, from).await {
            Ok(response) => response,
            Err(GatewayError::NotFound(_)) => return Ok(false),
            Err(err) => return Err(err),
        };
        // CopyObject can fail after the 200 status line has been sent.
        let body = response.text().await.map_err(classify_transport)?;
        if body.contains("<Error>") {
            return Err(GatewayError::Status {
                status: 500,
                message: extract_tag(&body, "Message").unwrap_or(body),
            });
        }
        Ok(true)
    }

    async fn move_object(&self, from: &str, to: &str) -> GatewayResult<bool> {
        if !self.copy_object(from, to).await? {
            return Ok(false);
        }
        self.delete(from).await
    }

    async fn signed_url(&self, key: &str, ttl: Duration) -> GatewayResult<String> {
        self.presign(key, ttl, Utc::now())
    }
}

/// Map non-2xx responses onto [`GatewayError`].
async fn expect_success(response: Response, key: &str) -> GatewayResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(GatewayError::NotFound(key.to_string()));
    }
    let body = response.text().await.unwrap_or_default();
    let message = extract_tag(&body, "Message")
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_default();
    Err(GatewayError::Status {
        status: status.as_u16(),
        message,
    })
}

/// Translate a `reqwest` failure into a structured [`GatewayError`].
///
/// Walks the source chain for `io::Error` kinds. Name resolution failures carry no
/// dedicated kind, so those are recognised by the resolver's message.
pub(crate) fn classify_transport(err: reqwest::Error) -> GatewayError {
    let message = err.to_string();
    if err.is_builder() {
        return GatewayError::InvalidEndpoint(message);
    }
    if err.is_timeout() {
        return GatewayError::Timeout(message);
    }

    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if text.contains("dns error") || text.contains("failed to lookup address") {
            return GatewayError::Dns(message);
        }
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            match io_err.kind() {
                io::ErrorKind::ConnectionRefused => {
                    return GatewayError::ConnectionRefused(message);
                }
                io::ErrorKind::TimedOut => return GatewayError::Timeout(message),
                io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::BrokenPipe
                | io::ErrorKind::UnexpectedEof => return GatewayError::Transport(message),
                _ => {}
            }
        }
        source = cause.source();
    }

    if err.is_connect() || err.is_request() || err.is_body() {
        return GatewayError::Transport(message);
    }
    GatewayError::Other(message)
}

fn folder_prefix(folder: &str) -> String {
    let folder = folder.trim_end_matches('/');
    if folder.is_empty() {
        String::new()
    } else {
        format!("{}/", folder)
    }
}

/// URI-encode each path segment, keeping `/` separators.
fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// SigV4 canonical query string: encoded pairs sorted by name.
fn canonical_query(params: &[(&str, String)]) -> String {
    let mut pairs: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| {
            (
                urlencoding::encode(k).into_owned(),
                urlencoding::encode(v).into_owned(),
            )
        })
        .collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> GatewayResult<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| GatewayError::Other(format!("signing key rejected: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn parse_list_page(xml: &str) -> ListPage {
    let keys = CONTENTS_RE
        .captures_iter(xml)
        .filter_map(|cap| extract_tag(cap.get(1)?.as_str(), "Key"))
        .collect();
    let common_prefixes = COMMON_PREFIXES_RE
        .captures_iter(xml)
        .filter_map(|cap| extract_tag(cap.get(1)?.as_str(), "Prefix"))
        .collect();

    ListPage {
        keys,
        common_prefixes,
        truncated: extract_tag(xml, "IsTruncated").as_deref() == Some("true"),
        next_token: extract_tag(xml, "NextContinuationToken"),
    }
}

/// Text of the first `<tag>` element, unescaped.
fn extract_tag(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = xml.find(&open)? + open.len();
    let end = start + xml[start..].find(&close)?;
    let text = xml_unescape(xml[start..end].trim());
    if text.is_empty() { None } else { Some(text) }
}

fn xml_unescape(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn disk(endpoint: Option<&str>, path_style: bool) -> DiskConfig {
        DiskConfig {
            driver: "s3".into(),
            bucket: "media".into(),
            region: "us-east-1".into(),
            endpoint: endpoint.map(str::to_string),
            use_path_style_endpoint: path_style,
            key: Some("AKIDEXAMPLE".into()),
            secret: Some("wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY".into()),
            ..DiskConfig::default()
        }
    }

    fn store(endpoint: Option<&str>, path_style: bool) -> S3ObjectStore {
        S3ObjectStore::new(Client::new(), &disk(endpoint, path_style)).unwrap()
    }

    #[test]
    fn path_style_target_keeps_port_and_bucket_in_path() {
        let s3 = store(Some("http://localhost:9000"), true);
        let target = s3.target(Some("invoices/my report.pdf"));
        assert_eq!(target.host, "localhost:9000");
        assert_eq!(target.path, "/media/invoices/my%20report.pdf");
        assert_eq!(target.url(""), "http://localhost:9000/media/invoices/my%20report.pdf");
    }

    #[test]
    fn virtual_hosted_target_defaults_to_aws() {
        let s3 = store(None, false);
        let target = s3.target(Some("a/b.txt"));
        assert_eq!(target.scheme, "https");
        assert_eq!(target.host, "media.s3.us-east-1.amazonaws.com");
        assert_eq!(target.path, "/a/b.txt");
    }

    #[test]
    fn canonical_query_is_sorted_and_encoded() {
        let query = canonical_query(&[
            ("prefix", "my folder/".to_string()),
            ("list-type", "2".to_string()),
            ("delimiter", "/".to_string()),
        ]);
        assert_eq!(query, "delimiter=%2F&list-type=2&prefix=my%20folder%2F");
    }

    #[test]
    fn presigned_url_carries_signature_and_expiry() {
        let s3 = store(Some("https://minio.internal:9000"), true);
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let url = s3
            .presign("invoices/a.pdf", Duration::from_secs(3600), now)
            .unwrap();
        assert!(url.starts_with("https://minio.internal:9000/media/invoices/a.pdf?"));
        assert!(url.contains("X-Amz-Date=20250102T030405Z"));
        assert!(url.contains("X-Amz-Expires=3600"));
        let signature = url.rsplit("X-Amz-Signature=").next().unwrap();
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));

        // Deterministic for a fixed clock.
        let again = s3
            .presign("invoices/a.pdf", Duration::from_secs(3600), now)
            .unwrap();
        assert_eq!(url, again);
    }

    #[test]
    fn presign_clamps_expiry_to_seven_days() {
        let s3 = store(None, false);
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let url = s3
            .presign("a.txt", Duration::from_secs(30 * 24 * 3600), now)
            .unwrap();
        assert!(url.contains("X-Amz-Expires=604800"));
    }

    #[test]
    fn parses_list_objects_v2_page() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Name>media</Name><Prefix>invoices/</Prefix><KeyCount>3</KeyCount>
  <IsTruncated>true</IsTruncated>
  <NextContinuationToken>abc==</NextContinuationToken>
  <Contents><Key>invoices/</Key><Size>0</Size></Contents>
  <Contents><Key>invoices/R&amp;D.pdf</Key><Size>10</Size></Contents>
  <Contents><Key>invoices/b.pdf</Key><Size>20</Size></Contents>
  <CommonPrefixes><Prefix>invoices/2025/</Prefix></CommonPrefixes>
</ListBucketResult>"#;
        let page = parse_list_page(xml);
        assert_eq!(page.keys, vec!["invoices/", "invoices/R&D.pdf", "invoices/b.pdf"]);
        assert_eq!(page.common_prefixes, vec!["invoices/2025/"]);
        assert!(page.truncated);
        assert_eq!(page.next_token.as_deref(), Some("abc=="));
    }

    #[test]
    fn rejects_unparseable_endpoint() {
        let result = S3ObjectStore::new(Client::new(), &disk(Some("not a url"), true));
        assert!(matches!(result, Err(GatewayError::InvalidEndpoint(_))));
    }
}
