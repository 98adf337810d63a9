//! libcurl-backed issuer.
//!
//! Each attempt runs one `curl::easy::Easy` transfer on the blocking pool.
//! The attempt's abort signal is polled from curl's progress callback, so a
//! deadline raised by the executor stops the transfer instead of leaving it
//! running in the background.

use std::str;
use std::time::Duration;

use async_trait::async_trait;

use super::{Issuer, Request, Response};
use crate::control::{AbortSignal, Aborted};
use crate::retry::Failure;

#[derive(Debug, Clone)]
pub struct CurlIssuer {
    pub connect_timeout: Duration,
    pub follow_redirects: bool,
    pub max_redirections: u32,
}

impl Default for CurlIssuer {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            follow_redirects: true,
            max_redirections: 10,
        }
    }
}

#[async_trait]
impl Issuer for CurlIssuer {
    async fn issue(&self, request: &Request, abort: AbortSignal) -> Result<Response, Failure> {
        url::Url::parse(&request.url).map_err(Failure::other)?;
        let opts = self.clone();
        let request = request.clone();
        tokio::task::spawn_blocking(move || perform(&opts, &request, &abort))
            .await
            .map_err(Failure::other)?
    }
}

fn perform(opts: &CurlIssuer, request: &Request, abort: &AbortSignal) -> Result<Response, Failure> {
    let mut body: Vec<u8> = Vec::new();
    let mut header_lines: Vec<String> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(&request.url).map_err(map_curl_error)?;
    easy.follow_location(opts.follow_redirects)
        .map_err(map_curl_error)?;
    easy.max_redirections(opts.max_redirections)
        .map_err(map_curl_error)?;
    easy.connect_timeout(opts.connect_timeout)
        .map_err(map_curl_error)?;
    easy.progress(true).map_err(map_curl_error)?;

    let method = request.method.to_ascii_uppercase();
    if let Some(data) = &request.body {
        easy.post_fields_copy(data).map_err(map_curl_error)?;
    }
    match method.as_str() {
        "GET" if request.body.is_none() => easy.get(true),
        "HEAD" => easy.nobody(true),
        "POST" => easy.post(true),
        other => easy.custom_request(other),
    }
    .map_err(map_curl_error)?;

    let mut list = curl::easy::List::new();
    for (k, v) in &request.headers {
        list.append(&format!("{}: {}", k.trim(), v.trim()))
            .map_err(map_curl_error)?;
    }
    if !request.headers.is_empty() {
        easy.http_headers(list).map_err(map_curl_error)?;
    }

    {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    header_lines.push(s.trim_end().to_string());
                }
                true
            })
            .map_err(map_curl_error)?;
        transfer
            .write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })
            .map_err(map_curl_error)?;
        // Returning false aborts the transfer.
        transfer
            .progress_function(|_, _, _, _| !abort.is_aborted())
            .map_err(map_curl_error)?;
        transfer.perform().map_err(map_curl_error)?;
    }

    let code = easy.response_code().map_err(map_curl_error)?;
    let status = u16::try_from(code)
        .map_err(|_| Failure::other(format!("invalid HTTP status {code}")))?;
    let (reason, headers) = parse_header_lines(&header_lines);
    Ok(Response {
        status,
        reason,
        headers,
        body,
    })
}

/// Split raw header lines into the final reason phrase and `name: value` pairs.
/// With redirects curl reports every hop; only the last response counts.
fn parse_header_lines(lines: &[String]) -> (String, Vec<(String, String)>) {
    let mut reason = String::new();
    let mut headers = Vec::new();
    for line in lines {
        if line.starts_with("HTTP/") {
            reason = line.splitn(3, ' ').nth(2).unwrap_or("").trim().to_string();
            headers.clear();
        } else if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }
    (reason, headers)
}

/// Map a curl error onto the failure taxonomy.
pub(crate) fn map_curl_error(e: curl::Error) -> Failure {
    if e.is_operation_timedout() {
        return Failure::TimedOut;
    }
    if e.is_aborted_by_callback() {
        return Failure::other(Aborted);
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_ssl_connect_error()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
    {
        return Failure::transport(e);
    }
    Failure::other(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::FailureKind;

    #[test]
    fn header_lines_keep_last_response() {
        let lines: Vec<String> = [
            "HTTP/1.1 301 Moved Permanently",
            "Location: /new",
            "",
            "HTTP/1.1 503 Service Unavailable",
            "Retry-After: 5",
            "Content-Length: 0",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let (reason, headers) = parse_header_lines(&lines);
        assert_eq!(reason, "Service Unavailable");
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[0], ("Retry-After".to_string(), "5".to_string()));
    }

    #[test]
    fn curl_errors_map_to_failure_kinds() {
        // CURLE_COULDNT_CONNECT = 7, CURLE_OPERATION_TIMEDOUT = 28,
        // CURLE_ABORTED_BY_CALLBACK = 42, CURLE_URL_MALFORMAT = 3.
        assert_eq!(map_curl_error(curl::Error::new(7)).kind(), FailureKind::Transport);
        assert_eq!(map_curl_error(curl::Error::new(28)).kind(), FailureKind::Timeout);
        assert_eq!(map_curl_error(curl::Error::new(42)).kind(), FailureKind::Unknown);
        assert_eq!(map_curl_error(curl::Error::new(3)).kind(), FailureKind::Unknown);
    }

    #[tokio::test]
    async fn malformed_url_is_rejected_before_transfer() {
        let err = CurlIssuer::default()
            .issue(&Request::get("not a url"), AbortSignal::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Unknown);
    }
}
