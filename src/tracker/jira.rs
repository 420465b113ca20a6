//! Jira REST adapter.
//!
//! Issues are read from `/rest/api/2/issue/{key}` and searched with JQL.
//! Link relations are the phrases of the link type as seen from the issue
//! being read: an outward link uses the type's `outward` phrase ("csr for"),
//! an inward link its `inward` phrase ("csr of").

use std::collections::BTreeSet;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::config::TrackerConfig;
use crate::effects::{TrackerEffect, TrackerInterpreter, TrackerResponse};
use crate::types::{Issue, IssueId, IssueLink, IssueState, LinkRelation};

use super::error::TrackerError;

/// Jira field holding the JEP number.
const JEP_NUMBER_FIELD: &str = "customfield_10701";

const PAGE_SIZE: usize = 100;

// ─── Payloads ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

#[derive(Debug, Deserialize)]
struct LinkType {
    inward: String,
    outward: String,
}

#[derive(Debug, Deserialize)]
struct LinkedKey {
    key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLink {
    #[serde(rename = "type")]
    link_type: LinkType,
    inward_issue: Option<LinkedKey>,
    outward_issue: Option<LinkedKey>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFields {
    #[serde(default)]
    summary: String,
    issuetype: Option<Named>,
    status: Option<Named>,
    resolution: Option<Named>,
    #[serde(default)]
    fix_versions: Vec<Named>,
    #[serde(default)]
    issuelinks: Vec<RawLink>,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(rename = "customfield_10701")]
    jep_number: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    key: String,
    fields: RawFields,
}

#[derive(Debug, Deserialize)]
struct RawKeyOnly {
    key: String,
}

#[derive(Debug, Deserialize)]
struct SearchPage<T> {
    #[serde(default)]
    total: usize,
    issues: Vec<T>,
}

// ─── Conversions ──────────────────────────────────────────────────────────────

fn to_issue(base_url: &str, raw: RawIssue) -> Issue {
    let f = raw.fields;
    let status = f.status.map(|s| s.name);
    let state = match status.as_deref() {
        Some("Closed" | "Resolved") => IssueState::Closed,
        _ => IssueState::Open,
    };
    let links = f
        .issuelinks
        .into_iter()
        .filter_map(|link| {
            let (phrase, target) = match (link.outward_issue, link.inward_issue) {
                (Some(target), _) => (link.link_type.outward, target),
                (None, Some(target)) => (link.link_type.inward, target),
                (None, None) => return None,
            };
            Some(IssueLink {
                relation: LinkRelation::from_phrase(&phrase),
                target: IssueId::new(target.key),
            })
        })
        .collect();
    let jep_number = match f.jep_number {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    Issue {
        web_url: format!("{}/browse/{}", base_url, raw.key),
        id: IssueId::new(raw.key),
        title: f.summary,
        issue_type: f.issuetype.map(|t| t.name),
        state,
        resolution: f.resolution.map(|r| r.name),
        status,
        fix_versions: f.fix_versions.into_iter().map(|v| v.name).collect(),
        links,
        labels: f.labels.into_iter().collect::<BTreeSet<_>>(),
        jep_number,
    }
}

/// JQL timestamps are minutes in the tracker's local time.
fn jql_time(since: DateTime<Utc>, offset: FixedOffset) -> String {
    since.with_timezone(&offset).format("%Y/%m/%d %H:%M").to_string()
}

fn quote_jql(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn updated_jql(project: &str, since: DateTime<Utc>, offset: FixedOffset) -> String {
    format!(
        "project = {} AND updated >= '{}' ORDER BY updated DESC",
        quote_jql(project),
        jql_time(since, offset)
    )
}

/// Only string lists and plain strings are written.
fn property_value(key: &str, value: &Value) -> Result<Value, TrackerError> {
    match value {
        Value::Array(items) if items.iter().all(Value::is_string) => Ok(value.clone()),
        Value::String(_) => Ok(value.clone()),
        other => Err(TrackerError::InvalidProperty {
            key: key.to_string(),
            reason: format!("unsupported value {other}"),
        }),
    }
}

// ─── Client ───────────────────────────────────────────────────────────────────

/// A Jira instance. Projects are named per query.
#[derive(Clone)]
pub struct JiraTracker {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    offset: FixedOffset,
    /// Project that JEPs are filed in.
    jep_project: String,
}

impl std::fmt::Debug for JiraTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraTracker")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl JiraTracker {
    pub fn new(config: &TrackerConfig, token: Option<String>) -> Self {
        let offset = FixedOffset::east_opt(config.utc_offset_minutes * 60)
            .unwrap_or(Utc.fix());
        JiraTracker {
            client: reqwest::Client::new(),
            base_url: config.url.trim_end_matches('/').to_string(),
            token,
            offset,
            jep_project: "JDK".to_string(),
        }
    }

    pub fn with_jep_project(mut self, project: impl Into<String>) -> Self {
        self.jep_project = project.into();
        self
    }

    fn api(&self, path: &str) -> String {
        format!("{}/rest/api/2/{}", self.base_url, path)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn checked(response: reqwest::Response) -> Result<reqwest::Response, TrackerError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();
        Err(TrackerError::Status {
            status: status.as_u16(),
            url,
            body,
        })
    }

    async fn issue(&self, id: &IssueId) -> Result<Option<Issue>, TrackerError> {
        let request = self.client.get(self.api(&format!("issue/{}", id.as_str())));
        let response = self.authorized(request).send().await?;
        match Self::checked(response).await {
            Ok(response) => {
                let raw: RawIssue = response.json().await?;
                Ok(Some(to_issue(&self.base_url, raw)))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn search<T: serde::de::DeserializeOwned>(
        &self,
        jql: &str,
        fields: &str,
    ) -> Result<Vec<T>, TrackerError> {
        let mut found = Vec::new();
        loop {
            let start_at = found.len().to_string();
            let max_results = PAGE_SIZE.to_string();
            let request = self.client.get(self.api("search")).query(&[
                ("jql", jql),
                ("fields", fields),
                ("startAt", start_at.as_str()),
                ("maxResults", max_results.as_str()),
            ]);
            let response = Self::checked(self.authorized(request).send().await?).await?;
            let page: SearchPage<T> = response.json().await?;
            let received = page.issues.len();
            found.extend(page.issues);
            if received == 0 || found.len() >= page.total {
                return Ok(found);
            }
        }
    }

    async fn linked(&self, id: &IssueId, relation: &LinkRelation) -> Result<Vec<Issue>, TrackerError> {
        let Some(issue) = self.issue(id).await? else {
            return Ok(Vec::new());
        };
        let lookups = issue.linked(relation).into_iter().map(|target| self.issue(target));
        let found = futures::future::try_join_all(lookups).await?;
        Ok(found.into_iter().flatten().collect())
    }

    async fn find_jep(&self, number: &str) -> Result<Option<Issue>, TrackerError> {
        let jql = format!(
            "project = {} AND \"JEP Number\" ~ {}",
            quote_jql(&self.jep_project),
            quote_jql(number)
        );
        let keys: Vec<RawKeyOnly> = self.search(&jql, "key").await?;
        // `~` is a text match; confirm the number exactly.
        for key in keys {
            if let Some(issue) = self.issue(&IssueId::new(key.key)).await?
                && issue.jep_number.as_deref() == Some(number)
            {
                return Ok(Some(issue));
            }
        }
        Ok(None)
    }

    async fn updated_since(
        &self,
        project: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<IssueId>, TrackerError> {
        let jql = updated_jql(project, since, self.offset);
        let keys: Vec<RawKeyOnly> = self.search(&jql, "key").await?;
        Ok(keys.into_iter().map(|k| IssueId::new(k.key)).collect())
    }

    async fn add_comment(&self, id: &IssueId, body: &str) -> Result<(), TrackerError> {
        let request = self
            .client
            .post(self.api(&format!("issue/{}/comment", id.as_str())))
            .json(&json!({ "body": body }));
        Self::checked(self.authorized(request).send().await?).await?;
        Ok(())
    }

    async fn set_property(&self, id: &IssueId, key: &str, value: &Value) -> Result<(), TrackerError> {
        let value = property_value(key, value)?;
        let request = self
            .client
            .put(self.api(&format!("issue/{}", id.as_str())))
            .json(&json!({ "fields": { key: value } }));
        Self::checked(self.authorized(request).send().await?).await?;
        debug!(issue = %id, key, "set tracker property");
        Ok(())
    }
}

impl TrackerInterpreter for JiraTracker {
    type Error = TrackerError;

    #[instrument(skip(self), level = "debug")]
    async fn interpret(&self, effect: TrackerEffect) -> Result<TrackerResponse, Self::Error> {
        match effect {
            TrackerEffect::GetIssue { id } => {
                Ok(TrackerResponse::Issue(self.issue(&id).await?.map(Box::new)))
            }
            TrackerEffect::GetLinkedIssues { id, relation } => {
                Ok(TrackerResponse::Issues(self.linked(&id, &relation).await?))
            }
            TrackerEffect::FindJep { number } => {
                Ok(TrackerResponse::Issue(self.find_jep(&number).await?.map(Box::new)))
            }
            TrackerEffect::UpdatedSince { project, since } => {
                Ok(TrackerResponse::Updated(self.updated_since(&project, since).await?))
            }
            TrackerEffect::SetProperty { id, key, value } => {
                self.set_property(&id, &key, &value).await?;
                Ok(TrackerResponse::Done)
            }
            TrackerEffect::AddComment { id, body } => {
                self.add_comment(&id, &body).await?;
                Ok(TrackerResponse::Done)
            }
        }
    }
}
