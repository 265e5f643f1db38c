use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use super::patch::{create_document, parent_link_document, PatchOperation};
use super::{CreatedWorkItem, WorkItemApi, WorkItemDraft};
use crate::config::Settings;
use crate::error::{Error, Result};

const JSON_PATCH: &str = "application/json-patch+json";

/// RFC 3986 unreserved characters stay as-is inside a path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// REST client for one organization and project, authenticated with a
/// personal access token.
pub struct AdoClient {
    client: Client,
    org_url: String,
    project: String,
    api_version: String,
    work_item_type: String,
    area_path: String,
    iteration_path: String,
    pat: String,
}

#[derive(Debug, Deserialize)]
struct WorkItemResponse {
    id: u64,
    #[serde(rename = "_links")]
    links: Option<WorkItemLinks>,
}

#[derive(Debug, Deserialize)]
struct WorkItemLinks {
    html: Option<Href>,
}

#[derive(Debug, Deserialize)]
struct Href {
    href: String,
}

impl AdoClient {
    pub fn new(settings: &Settings, pat: String) -> Self {
        Self {
            client: Client::new(),
            org_url: settings.org_base().to_string(),
            project: settings.project.clone(),
            api_version: settings.api_version.clone(),
            work_item_type: settings.work_item_type.clone(),
            area_path: settings.area_path.clone(),
            iteration_path: settings.iteration_path.clone(),
            pat,
        }
    }

    pub fn create_url(&self) -> String {
        format!(
            "{}/{}/_apis/wit/workitems/${}?api-version={}",
            self.org_url,
            encode_path_segment(&self.project),
            encode_path_segment(&self.work_item_type),
            self.api_version
        )
    }

    pub fn update_url(&self, id: u64) -> String {
        format!(
            "{}/{}/_apis/wit/workitems/{}?api-version={}",
            self.org_url,
            encode_path_segment(&self.project),
            id,
            self.api_version
        )
    }

    pub fn work_item_api_url(&self, id: &str) -> String {
        format!("{}/_apis/wit/workItems/{}", self.org_url, id)
    }

    pub fn edit_url(&self, id: u64) -> String {
        format!("{}/_workitems/edit/{}", self.org_url, id)
    }

    async fn send_patch(
        &self,
        request: reqwest::RequestBuilder,
        body: &[PatchOperation],
        ok: &[StatusCode],
    ) -> Result<String> {
        let response = request
            .basic_auth("", Some(&self.pat))
            .header(CONTENT_TYPE, JSON_PATCH)
            .body(serde_json::to_vec(body)?)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !ok.contains(&status) {
            return Err(Error::Api {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }
}

impl WorkItemApi for AdoClient {
    async fn create_work_item(&self, draft: &WorkItemDraft<'_>) -> Result<CreatedWorkItem> {
        let body = create_document(draft, &self.area_path, &self.iteration_path);
        debug!(title = draft.title, "creating work item");

        let text = self
            .send_patch(
                self.client.post(self.create_url()),
                &body,
                &[StatusCode::OK, StatusCode::CREATED],
            )
            .await
            .map_err(|e| {
                warn!(title = draft.title, error = %e, "work item creation failed");
                e
            })?;

        let created: WorkItemResponse = serde_json::from_str(&text).map_err(|e| {
            warn!(
                title = draft.title,
                body = %text,
                error = %e,
                "work item created but response could not be parsed"
            );
            e
        })?;
        Ok(CreatedWorkItem {
            id: created.id,
            edit_url: self.edit_url(created.id),
            html_url: created.links.and_then(|l| l.html).map(|h| h.href),
        })
    }

    async fn link_to_parent(&self, id: u64, parent_id: &str) -> Result<()> {
        let body = parent_link_document(&self.work_item_api_url(parent_id));
        debug!(id, parent_id, "linking work item to parent");

        self.send_patch(
            self.client.patch(self.update_url(id)),
            &body,
            &[StatusCode::OK, StatusCode::NO_CONTENT],
        )
        .await
        .map_err(|e| {
            warn!(id, parent_id, error = %e, "parent link failed");
            e
        })?;
        Ok(())
    }
}

fn encode_path_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}
