//! HTTP gateway to the chat backend.
//!
//! One method per backend capability. Every non-success status becomes a
//! [`GatewayError::Status`] carrying the server's `detail` message when the
//! body has one, else a fixed per-operation fallback.

use std::error::Error as StdError;
use std::fmt;
use std::path::Path;
use std::pin::Pin;

use futures_util::{Stream, StreamExt};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::debug;

use super::history::{parse_history, Turn};
use super::{
    ChatRequest, CredentialsRequest, LoginResponse, NewThreadRequest, SearchRequest,
    SearchResponse, ThreadSummary, ThreadsResponse,
};
use crate::utils::url::{construct_api_url, encode_path_segment};

pub const SEARCH_ENDPOINT: &str = "search";
pub const UPLOAD_ENDPOINT: &str = "upload";

/// Incrementally decoded text of a streamed chat reply.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String, GatewayError>> + Send>>;

#[derive(Debug)]
pub enum GatewayError {
    /// Connection, TLS, or body transfer failure.
    Transport(reqwest::Error),
    /// The backend answered with a non-success status.
    Status { status: StatusCode, message: String },
    /// The body could not be interpreted.
    Decode(String),
    /// Reading a local file for upload failed.
    Io(std::io::Error),
}

impl GatewayError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            GatewayError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Transport(err) => write!(f, "Network error: {err}"),
            GatewayError::Status { message, .. } => f.write_str(message),
            GatewayError::Decode(detail) => write!(f, "Unexpected response: {detail}"),
            GatewayError::Io(err) => write!(f, "{err}"),
        }
    }
}

impl StdError for GatewayError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            GatewayError::Transport(err) => Some(err),
            GatewayError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GatewayError::Decode(err.to_string())
        } else {
            GatewayError::Transport(err)
        }
    }
}

/// Pull a human-readable message out of an error body.
///
/// Accepts `{"detail": "..."}` and the list form
/// `{"detail": [{"msg": "..."}, ...]}`.
pub fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body.trim()).ok()?;
    let detail = value.get("detail")?;
    let text = match detail {
        Value::String(s) => s.trim().to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.get("msg").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("; "),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Decodes UTF-8 across arbitrary byte boundaries.
///
/// A multi-byte character split between two network reads is held back until
/// its remaining bytes arrive. Invalid sequences become U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    pending: Vec<u8>,
}

impl Utf8ChunkDecoder {
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut out = String::new();
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    break;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match err.error_len() {
                        Some(invalid) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + invalid);
                        }
                        None => {
                            self.pending.drain(..valid);
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Flush whatever is still buffered once the body has ended.
    pub fn finish(&mut self) -> String {
        let rest = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        rest
    }
}

#[derive(Clone, Debug)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: crate::utils::url::normalize_base_url(base_url),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        construct_api_url(&self.base_url, endpoint)
    }

    fn authorized(&self, request: RequestBuilder, token: &str) -> RequestBuilder {
        request.header("Authorization", format!("Bearer {token}"))
    }

    async fn send(request: RequestBuilder, fallback: &str) -> Result<Response, GatewayError> {
        let response = request.send().await.map_err(GatewayError::Transport)?;
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = extract_detail(&body).unwrap_or_else(|| fallback.to_string());
        debug!(%status, %message, "backend request failed");
        Err(GatewayError::Status { status, message })
    }

    pub async fn signup(&self, email: &str, password: &str) -> Result<Value, GatewayError> {
        let request = self.http.post(self.url("signup")).json(&CredentialsRequest {
            email: email.to_string(),
            password: password.to_string(),
        });
        let response = Self::send(request, "Signup failed").await?;
        Ok(response.json::<Value>().await?)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, GatewayError> {
        let request = self.http.post(self.url("login")).json(&CredentialsRequest {
            email: email.to_string(),
            password: password.to_string(),
        });
        let response = Self::send(request, "Login failed").await?;
        Ok(response.json::<LoginResponse>().await?)
    }

    pub async fn create_thread(
        &self,
        token: &str,
        title: &str,
    ) -> Result<ThreadSummary, GatewayError> {
        let request = self
            .authorized(self.http.post(self.url("new_chat")), token)
            .json(&NewThreadRequest {
                title: title.to_string(),
            });
        let response = Self::send(request, "Failed to create new chat").await?;
        let mut thread = response.json::<ThreadSummary>().await?;
        if thread.title.is_empty() {
            thread.title = title.to_string();
        }
        Ok(thread)
    }

    pub async fn list_threads(&self, token: &str) -> Result<Vec<ThreadSummary>, GatewayError> {
        let request = self.authorized(self.http.get(self.url("threads")), token);
        let response = Self::send(request, "Failed to fetch threads").await?;
        Ok(response.json::<ThreadsResponse>().await?.threads)
    }

    pub async fn thread_history(
        &self,
        token: &str,
        thread_id: &str,
    ) -> Result<Vec<Turn>, GatewayError> {
        let endpoint = format!("threads/{}/chats", encode_path_segment(thread_id));
        let request = self.authorized(self.http.get(self.url(&endpoint)), token);
        let response = Self::send(request, "Failed to fetch chat history").await?;
        let payload = response.json::<Value>().await?;
        Ok(parse_history(&payload))
    }

    pub async fn delete_thread(&self, token: &str, thread_id: &str) -> Result<(), GatewayError> {
        let endpoint = format!("threads/{}", encode_path_segment(thread_id));
        let request = self.authorized(self.http.delete(self.url(&endpoint)), token);
        Self::send(request, "Failed to delete thread").await?;
        Ok(())
    }

    /// Returns the search answer, `None` when the backend had nothing.
    pub async fn web_search(&self, token: &str, query: &str) -> Result<Option<String>, GatewayError> {
        let request = self
            .authorized(self.http.post(self.url(SEARCH_ENDPOINT)), token)
            .json(&SearchRequest {
                query: query.to_string(),
            });
        let response = Self::send(request, "Web search failed").await?;
        let answer = response.json::<SearchResponse>().await?.answer;
        Ok(answer.filter(|text| !text.is_empty()))
    }

    pub async fn upload_file(
        &self,
        token: &str,
        thread_id: &str,
        path: &Path,
    ) -> Result<Value, GatewayError> {
        let bytes = tokio::fs::read(path).await.map_err(GatewayError::Io)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let form = reqwest::multipart::Form::new()
            .text("thread_id", thread_id.to_string())
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes).file_name(file_name),
            );
        let request = self
            .authorized(self.http.post(self.url(UPLOAD_ENDPOINT)), token)
            .multipart(form);
        let response = Self::send(request, "File upload failed").await?;
        let body = response.text().await.map_err(GatewayError::Transport)?;
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }

    /// Start a chat turn and return the reply as a stream of text chunks.
    ///
    /// The body is unframed `text/plain`; each network read is decoded and
    /// yielded verbatim.
    pub async fn chat_stream(
        &self,
        token: &str,
        request: &ChatRequest,
    ) -> Result<ChunkStream, GatewayError> {
        let http_request = self
            .authorized(self.http.post(self.url("chat")), token)
            .json(request);
        let response = http_request.send().await.map_err(GatewayError::Transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = extract_detail(&body)
                .or_else(|| Some(body.trim().to_string()).filter(|text| !text.is_empty()))
                .unwrap_or_else(|| "Chat request failed".to_string());
            return Err(GatewayError::Status { status, message });
        }

        let bytes = Box::pin(response.bytes_stream());
        let chunks = futures_util::stream::unfold(
            (bytes, Utf8ChunkDecoder::default(), false),
            |(mut bytes, mut decoder, finished)| async move {
                if finished {
                    return None;
                }
                loop {
                    match bytes.next().await {
                        Some(Ok(raw)) => {
                            let text = decoder.decode(&raw);
                            if !text.is_empty() {
                                return Some((Ok(text), (bytes, decoder, false)));
                            }
                        }
                        Some(Err(err)) => {
                            return Some((Err(GatewayError::Transport(err)), (bytes, decoder, true)));
                        }
                        None => {
                            let rest = decoder.finish();
                            if rest.is_empty() {
                                return None;
                            }
                            return Some((Ok(rest), (bytes, decoder, true)));
                        }
                    }
                }
            },
        );
        Ok(Box::pin(chunks))
    }
}

#[cfg(test)]
pub(crate) mod test_server {
    //! Minimal in-process HTTP responder for gateway tests.

    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    #[derive(Debug, Clone)]
    pub struct CapturedRequest {
        pub request_line: String,
        pub headers: Vec<(String, String)>,
        pub body: Vec<u8>,
    }

    impl CapturedRequest {
        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str())
        }

        pub fn json(&self) -> serde_json::Value {
            serde_json::from_slice(&self.body).expect("request body should be JSON")
        }
    }

    /// A canned reply: status line, content type, and body pieces written
    /// with a flush between each so the client sees separate reads.
    pub struct CannedResponse {
        pub status: &'static str,
        pub content_type: &'static str,
        pub pieces: Vec<Vec<u8>>,
    }

    impl CannedResponse {
        pub fn json(status: &'static str, body: serde_json::Value) -> Self {
            Self {
                status,
                content_type: "application/json",
                pieces: vec![body.to_string().into_bytes()],
            }
        }

        pub fn text_chunks(status: &'static str, pieces: &[&[u8]]) -> Self {
            Self {
                status,
                content_type: "text/plain; charset=utf-8",
                pieces: pieces.iter().map(|piece| piece.to_vec()).collect(),
            }
        }
    }

    pub type Captured = Arc<Mutex<Vec<CapturedRequest>>>;

    /// Serve `responses` in order, one per connection, and return the base
    /// URL plus the captured requests.
    pub async fn serve(responses: Vec<CannedResponse>) -> (String, Captured) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        let addr = listener.local_addr().expect("local addr should resolve");
        let captured: Captured = Arc::new(Mutex::new(Vec::new()));
        let captured_for_server = Arc::clone(&captured);

        tokio::spawn(async move {
            for response in responses {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let Ok(request) = read_request(&mut stream).await else {
                    return;
                };
                captured_for_server
                    .lock()
                    .expect("capture lock")
                    .push(request);
                let _ = write_response(&mut stream, response).await;
            }
        });

        (format!("http://{addr}"), captured)
    }

    async fn write_response(stream: &mut TcpStream, response: CannedResponse) -> std::io::Result<()> {
        let head = format!(
            "HTTP/1.1 {}\r\ncontent-type: {}\r\ntransfer-encoding: chunked\r\nconnection: close\r\n\r\n",
            response.status, response.content_type
        );
        stream.write_all(head.as_bytes()).await?;
        for piece in response.pieces {
            stream
                .write_all(format!("{:x}\r\n", piece.len()).as_bytes())
                .await?;
            stream.write_all(&piece).await?;
            stream.write_all(b"\r\n").await?;
            stream.flush().await?;
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        stream.write_all(b"0\r\n\r\n").await?;
        stream.flush().await?;
        stream.shutdown().await
    }

    async fn read_request(stream: &mut TcpStream) -> Result<CapturedRequest, String> {
        let mut buffer = Vec::new();
        let mut header_end = None;
        while header_end.is_none() {
            let mut chunk = [0_u8; 1024];
            let read = stream.read(&mut chunk).await.map_err(|e| e.to_string())?;
            if read == 0 {
                return Err("unexpected EOF while reading headers".to_string());
            }
            buffer.extend_from_slice(&chunk[..read]);
            header_end = buffer
                .windows(4)
                .position(|window| window == b"\r\n\r\n")
                .map(|index| index + 4);
        }
        let header_end = header_end.unwrap_or(buffer.len());
        let header_text =
            std::str::from_utf8(&buffer[..header_end]).map_err(|e| e.to_string())?;
        let mut lines = header_text.split("\r\n").filter(|line| !line.is_empty());
        let request_line = lines.next().unwrap_or_default().to_string();

        let mut headers = Vec::new();
        let mut content_length = 0_usize;
        for line in lines {
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim().to_string();
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.parse().map_err(|_| "bad content-length".to_string())?;
            }
            headers.push((name.to_string(), value));
        }

        let mut body = buffer[header_end..].to_vec();
        while body.len() < content_length {
            let mut chunk = vec![0_u8; content_length - body.len()];
            let read = stream.read(&mut chunk).await.map_err(|e| e.to_string())?;
            if read == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..read]);
        }
        body.truncate(content_length);

        Ok(CapturedRequest {
            request_line,
            headers,
            body,
        })
    }
}
