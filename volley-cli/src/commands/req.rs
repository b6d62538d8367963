//! The `req` command: assemble a scenario and execute it

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use tracing::debug;
use volley_config::VolleyConfig;
use volley_core::{AuthScheme, BotInfo, RequestScenario, RequestTemplate};
use volley_engine::execute_scenario_with;
use volley_http::{Transport, TransportConfig};

/// Flags of the `req` subcommand
pub struct ReqOptions {
    pub count: u64,
    pub concurrency: usize,
    pub auth: Option<String>,
    pub debug: bool,
    pub insecure: bool,
    pub pretty: bool,
    pub bots: Option<String>,
    pub bots_file: Option<PathBuf>,
    pub bots_api_key: Option<String>,
}

static METHOD_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]+$").unwrap());
static URL_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://").unwrap());
static HEADER_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([\w-]+):([^=].*)$").unwrap());
static PARAM_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\w+)(:?)=(@?)(.+)$").unwrap());

pub async fn run(options: ReqOptions, args: Vec<String>, config: &VolleyConfig) -> Result<()> {
    let scenario = build_scenario(&options, &args)?;

    let transport_config =
        TransportConfig::from(config.http.clone()).insecure(scenario.options.insecure);
    let transport = Transport::new(transport_config)?;

    let mut stdout = tokio::io::stdout();
    execute_scenario_with(&scenario, transport, &mut stdout).await?;
    Ok(())
}

/// Build the scenario from stdin and/or command-line arguments.
///
/// A scenario JSON piped on stdin wins; bot flags still apply on top. With no
/// stdin, the arguments describe a single template.
fn build_scenario(options: &ReqOptions, args: &[String]) -> Result<RequestScenario> {
    let bots = parse_bots(options)?;

    let piped = read_stdin()?;
    let mut scenario = match piped {
        Some(text) => {
            debug!("parsing scenario from stdin");
            serde_json::from_str(&text).context("failed to parse stdin as a request scenario")?
        }
        None => {
            let template = template_from_args(options, args)?;
            RequestScenario {
                requests: vec![template],
                ..Default::default()
            }
        }
    };

    if !bots.is_empty() {
        scenario.bots = bots;
    }
    scenario.options.debug |= options.debug;
    scenario.options.insecure |= options.insecure;
    scenario.options.pretty |= options.pretty;

    Ok(scenario)
}

fn read_stdin() -> Result<Option<String>> {
    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin
        .read_to_string(&mut buffer)
        .context("failed to read stdin")?;
    if buffer.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(buffer))
    }
}

fn template_from_args(options: &ReqOptions, args: &[String]) -> Result<RequestTemplate> {
    if args.is_empty() {
        bail!("no url; expected [METHOD] url [HEADER:VAL...] [NAME=VAL...]");
    }

    let mut remaining = args;

    let method = if METHOD_PATTERN.is_match(&remaining[0]) {
        let method = remaining[0].clone();
        remaining = &remaining[1..];
        method
    } else {
        "GET".to_string()
    };

    let Some(url) = remaining.first() else {
        bail!("no url; expected [METHOD] url [HEADER:VAL...] [NAME=VAL...]");
    };
    if !URL_PATTERN.is_match(url) {
        bail!("invalid url: {}", url);
    }
    let url = url.clone();
    remaining = &remaining[1..];

    let (headers, body) = parse_headers_and_body(remaining)?;

    Ok(RequestTemplate {
        url,
        method,
        auth: options.auth.clone().unwrap_or_default(),
        auth_scheme: AuthScheme::Basic,
        headers,
        body,
        count: options.count,
        concurrency: options.concurrency,
        ..Default::default()
    })
}

fn parse_headers_and_body(args: &[String]) -> Result<(HashMap<String, String>, String)> {
    let mut headers = HashMap::new();
    let mut body_map = serde_json::Map::new();

    for arg in args {
        if let Some(captures) = PARAM_PATTERN.captures(arg) {
            let name = captures[1].to_string();
            let raw_json = !captures[2].is_empty();
            let from_file = !captures[3].is_empty();
            let mut value = captures[4].to_string();

            if from_file {
                value = std::fs::read_to_string(&value)
                    .with_context(|| format!("unable to read file {}", value))?;
            }

            let value = if raw_json {
                serde_json::from_str(&value)
                    .with_context(|| format!("unable to parse '{}' as json", value))?
            } else {
                Value::String(value)
            };
            body_map.insert(name, value);
        } else if let Some(captures) = HEADER_PATTERN.captures(arg) {
            headers.insert(captures[1].to_string(), captures[2].to_string());
        } else {
            bail!("unable to parse argument: {}", arg);
        }
    }

    let body = if body_map.is_empty() {
        String::new()
    } else {
        serde_json::to_string(&Value::Object(body_map))?
    };

    Ok((headers, body))
}

fn parse_bots(options: &ReqOptions) -> Result<Vec<BotInfo>> {
    let urls: Vec<String> = if let Some(list) = &options.bots {
        list.split(',').map(|url| url.trim().to_string()).collect()
    } else if let Some(path) = &options.bots_file {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read bots file {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("failed to parse bots file {} as json", path.display()))?
    } else {
        return Ok(Vec::new());
    };

    let api_key = options.bots_api_key.clone().unwrap_or_default();
    Ok(urls
        .into_iter()
        .map(|url| BotInfo {
            url,
            api_key: api_key.clone(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> ReqOptions {
        ReqOptions {
            count: 1,
            concurrency: 1,
            auth: None,
            debug: false,
            insecure: false,
            pretty: false,
            bots: None,
            bots_file: None,
            bots_api_key: None,
        }
    }

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_method_defaults_to_get() {
        let template = template_from_args(&options(), &strings(&["http://svc.local/a"])).unwrap();
        assert_eq!(template.method, "GET");
        assert_eq!(template.url, "http://svc.local/a");
    }

    #[test]
    fn test_explicit_method() {
        let template =
            template_from_args(&options(), &strings(&["POST", "http://svc.local/a"])).unwrap();
        assert_eq!(template.method, "POST");
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(template_from_args(&options(), &strings(&["svc.local/a"])).is_err());
    }

    #[test]
    fn test_headers_and_body_params() {
        let template = template_from_args(
            &options(),
            &strings(&[
                "POST",
                "http://svc.local/a",
                "x-trace:abc",
                "name=widget",
                "qty:=3",
            ]),
        )
        .unwrap();

        assert_eq!(template.headers["x-trace"], "abc");
        let body: Value = serde_json::from_str(&template.body).unwrap();
        assert_eq!(body["name"], "widget");
        assert_eq!(body["qty"], 3);
    }

    #[test]
    fn test_unparsable_argument_rejected() {
        let result =
            template_from_args(&options(), &strings(&["http://svc.local/a", "!!bogus!!"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_bot_list_parsing() {
        let mut opts = options();
        opts.bots = Some("http://b0:3210/,http://b1:3210/".to_string());
        opts.bots_api_key = Some("k".to_string());

        let bots = parse_bots(&opts).unwrap();
        assert_eq!(bots.len(), 2);
        assert_eq!(bots[1].url, "http://b1:3210/");
        assert_eq!(bots[0].api_key, "k");
    }
}
