//! Shared harness: serves the full app on an ephemeral port over the
//! in-memory backend.

#![allow(dead_code, clippy::panic)]

use std::net::SocketAddr;
use std::sync::Arc;

use energies_site::app_state::AppState;
use energies_site::backend::Backends;
use energies_site::backend::memory::MemoryBackend;
use energies_site::config::SiteConfig;
use energies_site::server::build_app;
use reqwest::header::{COOKIE, HeaderMap, SET_COOKIE};

/// A running server and handles into its state.
pub struct TestSite {
    pub addr: SocketAddr,
    pub state: AppState,
    pub backend: Arc<MemoryBackend>,
    pub client: reqwest::Client,
}

impl TestSite {
    pub async fn start() -> Self {
        Self::with_backend(MemoryBackend::with_site_schema()).await
    }

    pub async fn with_backend(backend: MemoryBackend) -> Self {
        Self::serve(Arc::new(backend)).await
    }

    /// A second server over this one's backend, as after a restart.
    pub async fn restarted(&self) -> Self {
        Self::serve(Arc::clone(&self.backend)).await
    }

    async fn serve(backend: Arc<MemoryBackend>) -> Self {
        let config = SiteConfig::in_memory();
        let Ok(state) = AppState::new(config, Backends::in_memory(Arc::clone(&backend))) else {
            panic!("state must build");
        };
        let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind failed");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("no local addr");
        };
        let app = build_app(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        let Ok(client) = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
        else {
            panic!("client must build");
        };
        Self {
            addr,
            state,
            backend,
            client,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub async fn get(&self, path: &str, jar: &CookieJar) -> reqwest::Response {
        let Ok(resp) = self
            .client
            .get(self.url(path))
            .header(COOKIE, jar.header())
            .send()
            .await
        else {
            panic!("GET {path} failed");
        };
        resp
    }

    /// Posts an urlencoded form.
    pub async fn post_form(
        &self,
        path: &str,
        jar: &CookieJar,
        fields: &[(&str, &str)],
    ) -> reqwest::Response {
        let Ok(resp) = self
            .client
            .post(self.url(path))
            .header(COOKIE, jar.header())
            .header("content-type", "application/x-www-form-urlencoded")
            .body(urlencode(fields))
            .send()
            .await
        else {
            panic!("POST {path} failed");
        };
        resp
    }
}

/// Minimal browser cookie jar: remembers `name=value` from `Set-Cookie`.
#[derive(Debug, Default)]
pub struct CookieJar {
    pairs: Vec<(String, String)>,
}

impl CookieJar {
    pub fn absorb(&mut self, headers: &HeaderMap) {
        for value in headers.get_all(SET_COOKIE) {
            let Ok(raw) = value.to_str() else { continue };
            let pair = raw.split(';').next().unwrap_or_default();
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            self.pairs.retain(|(n, _)| n != name);
            let removed = raw.contains("Max-Age=0");
            if !removed {
                self.pairs.push((name.to_string(), value.to_string()));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn header(&self) -> String {
        self.pairs
            .iter()
            .map(|(n, v)| format!("{n}={v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

fn urlencode(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn encode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(char::from(byte));
            }
            b' ' => out.push('+'),
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

pub async fn text(resp: reqwest::Response) -> String {
    let Ok(body) = resp.text().await else {
        panic!("body must read");
    };
    body
}
