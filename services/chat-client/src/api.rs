//! Typed wrappers over the backend's project and conversation endpoints
//!
//! Thin consumers of `ApiClient::send`: build the request, attach a
//! notification message for failures, decode the JSON answer.

use anyhow::{Context, Result};
use dispatch::{ApiClient, RequestOptions};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub project_id: Option<i64>,
}

#[derive(Debug, Serialize)]
struct NewProject<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct NewConversation<'a> {
    project_id: i64,
    title: &'a str,
}

pub async fn list_projects(client: &ApiClient) -> Result<Vec<Project>> {
    let value = client
        .send(
            "/api/projects",
            RequestOptions::get().custom_error_message("Failed to load projects"),
        )
        .await?;
    decode(value)
}

pub async fn create_project(
    client: &ApiClient,
    name: &str,
    description: Option<&str>,
) -> Result<Project> {
    let options = RequestOptions::post()
        .json(&NewProject { name, description })?
        .custom_error_message("Failed to create project");
    let value = client.send("/api/projects/create", options).await?;
    decode(value)
}

pub async fn delete_project(client: &ApiClient, id: i64) -> Result<()> {
    client
        .send(
            &format!("/api/projects/{id}"),
            RequestOptions::delete().custom_error_message("Failed to delete project"),
        )
        .await?;
    Ok(())
}

pub async fn list_conversations(
    client: &ApiClient,
    project_id: Option<i64>,
) -> Result<Vec<Conversation>> {
    let endpoint = match project_id {
        Some(id) => format!("/api/conversations?project_id={id}"),
        None => "/api/conversations".to_string(),
    };
    let value = client
        .send(
            &endpoint,
            RequestOptions::get().custom_error_message("Failed to load conversations"),
        )
        .await?;
    decode(value)
}

pub async fn create_conversation(
    client: &ApiClient,
    project_id: i64,
    title: &str,
) -> Result<Conversation> {
    let options = RequestOptions::post()
        .json(&NewConversation { project_id, title })?
        .custom_error_message("Failed to create conversation");
    let value = client.send("/api/conversations/create", options).await?;
    decode(value)
}

fn decode<T: DeserializeOwned>(value: Option<Value>) -> Result<T> {
    let value = value.context("server returned an empty response")?;
    serde_json::from_value(value).context("unexpected response shape")
}
