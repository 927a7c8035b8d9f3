use anyhow::{Context, anyhow};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use walletask_shared::{NewTask, StatePatch, Task, TaskId, TaskState};

use crate::config::StoreConfig;
use crate::error::RemoteError;
use crate::store::TaskStore;

const PREFER: &str = "Prefer";
const RETURN_REPRESENTATION: &str = "return=representation";

/// `TaskStore` backed by the hosted database's PostgREST endpoint.
#[derive(Debug, Clone)]
pub struct RestTaskStore {
    client: Client,
    endpoint: Url,
    anon_key: String,
}

impl RestTaskStore {
    #[tracing::instrument(skip(cfg), fields(url = %cfg.url, table = %cfg.table))]
    pub fn new(cfg: &StoreConfig) -> anyhow::Result<Self> {
        let endpoint = table_endpoint(&cfg.url, &cfg.table)?;
        let client = build_client(cfg)?;
        Ok(Self {
            client,
            endpoint,
            anon_key: cfg.anon_key.trim().to_string(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", self.anon_key.as_str())
            .bearer_auth(&self.anon_key)
    }

    fn list_request(&self) -> RequestBuilder {
        self.request(Method::GET, list_url(&self.endpoint))
    }

    fn insert_request(&self, task: &NewTask) -> RequestBuilder {
        self.request(Method::POST, self.endpoint.clone())
            .header(PREFER, RETURN_REPRESENTATION)
            .json(&[task])
    }

    fn update_state_request(&self, id: TaskId, state: TaskState) -> RequestBuilder {
        self.request(Method::PATCH, row_url(&self.endpoint, id))
            .header(PREFER, RETURN_REPRESENTATION)
            .json(&StatePatch { state })
    }

    fn delete_request(&self, id: TaskId) -> RequestBuilder {
        self.request(Method::DELETE, row_url(&self.endpoint, id))
    }

    fn delete_many_request(&self, ids: &[TaskId]) -> RequestBuilder {
        self.request(Method::DELETE, rows_url(&self.endpoint, ids))
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn build_client(cfg: &StoreConfig) -> anyhow::Result<Client> {
    Client::builder()
        .timeout(std::time::Duration::from_secs(cfg.timeout_secs))
        .build()
        .context("failed building HTTP client for task store")
}

// Browser fetch has no client-level timeout.
#[cfg(target_arch = "wasm32")]
fn build_client(_cfg: &StoreConfig) -> anyhow::Result<Client> {
    Client::builder()
        .build()
        .context("failed building HTTP client for task store")
}

/// `<base>/rest/v1/<table>`, tolerating a trailing slash on `base`.
pub fn table_endpoint(base: &str, table: &str) -> anyhow::Result<Url> {
    let mut url = Url::parse(base.trim())
        .with_context(|| format!("invalid task store url: {base}"))?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("task store url cannot carry a path: {base}"))?
        .pop_if_empty()
        .push("rest")
        .push("v1")
        .push(table.trim());
    Ok(url)
}

pub fn list_url(endpoint: &Url) -> Url {
    let mut url = endpoint.clone();
    url.query_pairs_mut()
        .append_pair("select", "*")
        .append_pair("order", "created_at.desc");
    url
}

pub fn row_url(endpoint: &Url, id: TaskId) -> Url {
    let mut url = endpoint.clone();
    url.query_pairs_mut().append_pair("id", &format!("eq.{id}"));
    url
}

pub fn rows_url(endpoint: &Url, ids: &[TaskId]) -> Url {
    let list = ids
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");
    let mut url = endpoint.clone();
    url.query_pairs_mut()
        .append_pair("id", &format!("in.({list})"));
    url
}

async fn check(response: Response, op: &'static str) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(op, status = %status, body = %body.trim(), "task store rejected request");
    Err(rejection(op, status, &body))
}

fn rejection(op: &'static str, status: StatusCode, body: &str) -> RemoteError {
    let body = body.trim();
    if body.is_empty() {
        RemoteError::new(format!("{op} returned HTTP {status}"))
    } else {
        RemoteError::new(format!("{op} returned HTTP {status}: {body}"))
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
    let body = response.text().await?;
    parse_body(&body)
}

fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, RemoteError> {
    Ok(serde_json::from_str(body)?)
}

fn single_row(rows: Vec<Task>, op: &'static str) -> Result<Task, RemoteError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| RemoteError::new(format!("{op} returned no rows")))
}

#[async_trait(?Send)]
impl TaskStore for RestTaskStore {
    #[tracing::instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Task>, RemoteError> {
        let response = self.list_request().send().await?;
        let rows: Vec<Task> = decode(check(response, "list").await?).await?;
        debug!(count = rows.len(), "listed task rows");
        Ok(rows)
    }

    #[tracing::instrument(skip(self, task), fields(text = %task.text))]
    async fn insert(&self, task: &NewTask) -> Result<Task, RemoteError> {
        let response = self.insert_request(task).send().await?;
        let rows: Vec<Task> = decode(check(response, "insert").await?).await?;
        let row = single_row(rows, "insert")?;
        debug!(id = row.id, "inserted task row");
        Ok(row)
    }

    #[tracing::instrument(skip(self))]
    async fn update_state(&self, id: TaskId, state: TaskState) -> Result<Task, RemoteError> {
        let response = self.update_state_request(id, state).send().await?;
        let rows: Vec<Task> = decode(check(response, "update").await?).await?;
        single_row(rows, "update")
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: TaskId) -> Result<(), RemoteError> {
        let response = self.delete_request(id).send().await?;
        check(response, "delete").await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_many(&self, ids: &[TaskId]) -> Result<(), RemoteError> {
        let response = self.delete_many_request(ids).send().await?;
        check(response, "bulk delete").await?;
        Ok(())
    }
}
