//! Command-line parsing
//!
//! `chat-client [--config PATH] [--metrics] <command> [args...]`

use anyhow::{Context, Result, bail};
use transport::Method;

pub const USAGE: &str = "\
usage: chat-client [--config PATH] [--metrics] <command>

commands:
  token                                  fetch a CSRF token (not printed)
  request <METHOD> <ENDPOINT> [BODY]     send a raw API request
  projects list
  projects create <NAME> [DESCRIPTION]
  projects delete <ID>
  conversations list [PROJECT_ID]
  conversations create <PROJECT_ID> <TITLE>";

#[derive(Debug, PartialEq)]
pub struct Cli {
    pub config_path: Option<String>,
    pub metrics: bool,
    pub command: Command,
}

#[derive(Debug, PartialEq)]
pub enum Command {
    Token,
    Request {
        method: Method,
        endpoint: String,
        body: Option<String>,
    },
    ProjectsList,
    ProjectsCreate {
        name: String,
        description: Option<String>,
    },
    ProjectsDelete {
        id: i64,
    },
    ConversationsList {
        project_id: Option<i64>,
    },
    ConversationsCreate {
        project_id: i64,
        title: String,
    },
}

/// Parse arguments (without the program name).
pub fn parse(args: &[String]) -> Result<Cli> {
    let mut config_path = None;
    let mut metrics = false;
    let mut rest: Vec<&str> = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().context("--config requires a path")?;
                config_path = Some(path.clone());
            }
            "--metrics" => metrics = true,
            other => rest.push(other),
        }
    }

    let command = match rest.as_slice() {
        ["token"] => Command::Token,
        ["request", method, endpoint] => Command::Request {
            method: parse_method(method)?,
            endpoint: endpoint.to_string(),
            body: None,
        },
        ["request", method, endpoint, body] => Command::Request {
            method: parse_method(method)?,
            endpoint: endpoint.to_string(),
            body: Some(body.to_string()),
        },
        ["projects", "list"] => Command::ProjectsList,
        ["projects", "create", name] => Command::ProjectsCreate {
            name: name.to_string(),
            description: None,
        },
        ["projects", "create", name, description] => Command::ProjectsCreate {
            name: name.to_string(),
            description: Some(description.to_string()),
        },
        ["projects", "delete", id] => Command::ProjectsDelete { id: parse_id(id)? },
        ["conversations", "list"] => Command::ConversationsList { project_id: None },
        ["conversations", "list", project_id] => Command::ConversationsList {
            project_id: Some(parse_id(project_id)?),
        },
        ["conversations", "create", project_id, title] => Command::ConversationsCreate {
            project_id: parse_id(project_id)?,
            title: title.to_string(),
        },
        [] => bail!("missing command\n\n{USAGE}"),
        other => bail!("unrecognized command: {}\n\n{USAGE}", other.join(" ")),
    };

    Ok(Cli {
        config_path,
        metrics,
        command,
    })
}

fn parse_method(raw: &str) -> Result<Method> {
    Method::from_bytes(raw.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("invalid HTTP method: {raw}"))
}

fn parse_id(raw: &str) -> Result<i64> {
    raw.parse()
        .with_context(|| format!("invalid id (expected an integer): {raw}"))
}
