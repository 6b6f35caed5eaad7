// SPDX-License-Identifier: MIT

//! Asana API client for fetching project tasks.
//!
//! Handles:
//! - Paginated task listing with the custom fields the scoring
//!   pipeline consumes
//! - Continuation-token (offset) paging
//! - Error mapping for non-success responses

use std::time::Duration;

use serde::Deserialize;

use crate::config::Config;
use crate::error::AppError;

const ASANA_API_BASE: &str = "https://app.asana.com/api/1.0";

/// Fields requested per task; only the subset the normalizer consumes.
const OPT_FIELDS: &str = "gid,name,notes,completed,completed_at,due_on,assignee,assignee.name,\
assignee.email,custom_fields,custom_fields.name,custom_fields.display_value,\
custom_fields.number_value,custom_fields.enum_value,tags,tags.name";

/// Asana API client.
#[derive(Clone)]
pub struct AsanaClient {
    http: reqwest::Client,
    token: String,
    project_id: String,
}

impl AsanaClient {
    /// Build a client from config. Missing credentials are a config
    /// error, surfaced by the sync run rather than at startup.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let token = config
            .asana_access_token
            .clone()
            .ok_or_else(|| AppError::Config("ASANA_ACCESS_TOKEN".to_string()))?;
        let project_id = config
            .asana_project_id
            .clone()
            .ok_or_else(|| AppError::Config("ASANA_PROJECT_ID".to_string()))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.asana_timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client build failed: {}", e)))?;

        Ok(Self {
            http,
            token,
            project_id,
        })
    }

    /// Fetch one page of project tasks.
    ///
    /// `offset` is the continuation token from the previous page; `None`
    /// fetches the first page. The raw JSON records are returned as-is so
    /// the original payload can be retained on the stored task.
    pub async fn list_tasks_page(
        &self,
        offset: Option<&str>,
        page_size: u32,
    ) -> Result<TaskPage, AppError> {
        let url = format!("{}/projects/{}/tasks", ASANA_API_BASE, self.project_id);

        let mut query: Vec<(&str, String)> = vec![
            ("opt_fields", OPT_FIELDS.to_string()),
            ("limit", page_size.to_string()),
        ];
        if let Some(offset) = offset {
            query.push(("offset", offset.to_string()));
        }

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&query)
            .send()
            .await
            .map_err(|e| AppError::AsanaApi(e.to_string()))?;

        let body: ListTasksResponse = self.check_response_json(response).await?;

        Ok(TaskPage {
            tasks: body.data,
            next_offset: body.next_page.and_then(|p| p.offset),
        })
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                tracing::warn!("Asana rate limit hit (429)");
            }

            return Err(AppError::AsanaApi(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::AsanaApi(format!("JSON parse error: {}", e)))
    }
}

/// One page of raw task records plus the continuation token, if any.
#[derive(Debug, Clone)]
pub struct TaskPage {
    pub tasks: Vec<serde_json::Value>,
    pub next_offset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListTasksResponse {
    #[serde(default)]
    data: Vec<serde_json::Value>,
    next_page: Option<NextPage>,
}

#[derive(Debug, Deserialize)]
struct NextPage {
    offset: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Raw task shape (the read contract the normalizer consumes)
// ─────────────────────────────────────────────────────────────────────────────

/// Raw task record from Asana.
///
/// Every field beyond the GID is defaulted so a malformed record degrades
/// rather than failing the whole page.
#[derive(Debug, Clone, Deserialize)]
pub struct AsanaTask {
    pub gid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub due_on: Option<chrono::NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub assignee: Option<AsanaAssignee>,
    #[serde(default)]
    pub custom_fields: Vec<AsanaCustomField>,
    #[serde(default)]
    pub tags: Vec<AsanaTag>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AsanaAssignee {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// A named custom field carrying an enum label, a number, or a display
/// string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AsanaCustomField {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_value: Option<String>,
    #[serde(default)]
    pub number_value: Option<f64>,
    #[serde(default)]
    pub enum_value: Option<AsanaEnumValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AsanaEnumValue {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AsanaTag {
    #[serde(default)]
    pub name: String,
}
