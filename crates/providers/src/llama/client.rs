use crate::llama::config::LlamaConfig;
use chat_core::llm::{
    CompletionChoice, GenerationConfig, ModelRuntime, RawCompletion, RuntimeError, Usage,
};
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use url::Url;

/// Client for a llama.cpp-style server exposing `/health` and the
/// OpenAI-compatible `/v1/completions` endpoint.
#[derive(Clone)]
pub struct LlamaClient {
    http: Client,
    cfg: LlamaConfig,
    completions_url: Url,
    health_url: Url,
}

impl LlamaClient {
    pub fn new(cfg: LlamaConfig) -> anyhow::Result<Self> {
        let base = base_url(&cfg.base_url)?;
        let completions_url = base.join("v1/completions")?;
        let health_url = base.join("health")?;

        let mut headers = header::HeaderMap::new();
        if let Some(key) = &cfg.api_key {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", key))?,
            );
        }
        // The engine is local; system proxies would only get in the way.
        let http = Client::builder()
            .default_headers(headers)
            .use_rustls_tls()
            .no_proxy()
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(1)
            .timeout(cfg.timeout)
            .build()?;
        Ok(Self {
            http,
            cfg,
            completions_url,
            health_url,
        })
    }

    /// Builds the client and, unless disabled, waits for `/health` to report
    /// a loaded model. Every failure here is a load failure.
    pub async fn load(cfg: LlamaConfig) -> Result<Self, RuntimeError> {
        let client = Self::new(cfg).map_err(|e| RuntimeError::Load(format!("{:#}", e)))?;
        if client.cfg.probe_health {
            client.probe().await?;
        }
        info!(target: "providers::llama", "model ready at {}", client.cfg.base_url);
        Ok(client)
    }

    pub async fn probe(&self) -> Result<(), RuntimeError> {
        let resp = self
            .http
            .get(self.health_url.clone())
            .send()
            .await
            .map_err(|e| RuntimeError::Load(e.to_string()))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        warn!(target: "providers::llama", "health probe status={} body={:?}", status, body);
        if status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(RuntimeError::Load(format!("model is still loading {}", body)));
        }
        Err(RuntimeError::Load(format!("{} {}", status.as_u16(), body)))
    }

    pub fn completions_url(&self) -> &Url {
        &self.completions_url
    }

    fn request_body(&self, prompt: &str, cfg: &GenerationConfig) -> serde_json::Value {
        let mut body = serde_json::json!({
            "prompt": prompt,
            "max_tokens": cfg.max_tokens,
            "temperature": cfg.temperature,
            "stop": cfg.stop_sequences,
            "echo": cfg.echo,
            "stream": false,
        });
        if let Some(model) = &self.cfg.model {
            if let Some(map) = body.as_object_mut() {
                map.insert("model".to_string(), serde_json::json!(model));
            }
        }
        body
    }
}

#[allow(async_fn_in_trait)]
impl ModelRuntime for LlamaClient {
    async fn complete(
        &self,
        prompt: &str,
        cfg: &GenerationConfig,
    ) -> Result<Option<RawCompletion>, RuntimeError> {
        let started = Instant::now();
        debug!(target: "providers::llama", "completion request url={} max_tokens={} stops={}",
            self.completions_url, cfg.max_tokens, cfg.stop_sequences.len());
        let resp = self
            .http
            .post(self.completions_url.clone())
            .json(&self.request_body(prompt, cfg))
            .send()
            .await
            .map_err(map_reqwest_err)?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.ok();
            error!(target: "providers::llama", "completion non-200 status={} body={:?}", status, body);
            return Err(map_status_err(status, body));
        }
        let bytes = resp.bytes().await.map_err(map_reqwest_err)?;
        let raw = decode_completion(&bytes)?;
        info!(target: "providers::llama", "completion done in {} ms", started.elapsed().as_millis());
        Ok(raw)
    }
}

#[derive(Debug, Deserialize)]
struct CompletionBody {
    choices: Option<Vec<ChoiceBody>>,
    usage: Option<UsageBody>,
}

#[derive(Debug, Deserialize)]
struct ChoiceBody {
    #[serde(default)]
    text: Option<String>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageBody {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
}

fn decode_completion(bytes: &[u8]) -> Result<Option<RawCompletion>, RuntimeError> {
    let body: Option<CompletionBody> =
        serde_json::from_slice(bytes).map_err(|e| RuntimeError::Decode(e.to_string()))?;
    Ok(body.map(|b| RawCompletion {
        choices: b
            .choices
            .unwrap_or_default()
            .into_iter()
            .map(|c| CompletionChoice {
                text: c.text.unwrap_or_default(),
                finish_reason: c.finish_reason,
            })
            .collect(),
        usage: b.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
        }),
    }))
}

// Url::join drops the last path segment unless the base ends with '/'.
fn base_url(raw: &str) -> anyhow::Result<Url> {
    let mut url = Url::parse(raw.trim())?;
    if url.cannot_be_a_base() {
        anyhow::bail!("base url cannot carry a path: {}", raw);
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn map_reqwest_err(e: reqwest::Error) -> RuntimeError {
    if e.is_timeout() {
        RuntimeError::Timeout(e.to_string())
    } else if e.is_request() || e.is_connect() {
        RuntimeError::Network(e.to_string())
    } else if e.is_decode() || e.is_body() {
        RuntimeError::Decode(e.to_string())
    } else {
        RuntimeError::Other(e.to_string())
    }
}

fn map_status_err(status: StatusCode, body: Option<String>) -> RuntimeError {
    let s = format!("{} {}", status.as_u16(), body.unwrap_or_default());
    match status {
        StatusCode::SERVICE_UNAVAILABLE => RuntimeError::Load(s),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
            RuntimeError::Protocol(s)
        }
        StatusCode::INTERNAL_SERVER_ERROR
        | StatusCode::BAD_GATEWAY
        | StatusCode::GATEWAY_TIMEOUT => RuntimeError::Network(s),
        _ => RuntimeError::Other(s),
    }
}

#[cfg(test)]
pub(crate) mod test_server {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    /// Answers one connection per scripted `(status, body)` pair, in order,
    /// and hands back the raw requests it saw.
    pub async fn serve(script: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let mut seen = Vec::new();
            for (status, body) in script {
                let (mut sock, _) = listener.accept().await.unwrap();
                seen.push(read_request(&mut sock).await);
                let resp = format!(
                    "HTTP/1.1 {} OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                sock.write_all(resp.as_bytes()).await.unwrap();
                let _ = sock.shutdown().await;
            }
            seen
        });
        (format!("http://{}", addr), handle)
    }

    /// A base URL nothing listens on.
    pub async fn closed_port() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }

    async fn read_request(sock: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            if let Some(end) = find(&buf, b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_string();
                let len = head
                    .lines()
                    .find_map(|l| {
                        let (k, v) = l.split_once(':')?;
                        if k.trim().eq_ignore_ascii_case("content-length") {
                            v.trim().parse::<usize>().ok()
                        } else {
                            None
                        }
                    })
                    .unwrap_or(0);
                while buf.len() < end + 4 + len {
                    let n = sock.read(&mut chunk).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                }
                return String::from_utf8_lossy(&buf).to_string();
            }
            let n = sock.read(&mut chunk).await.unwrap();
            if n == 0 {
                return String::from_utf8_lossy(&buf).to_string();
            }
            buf.extend_from_slice(&chunk[..n]);
        }
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }
}
