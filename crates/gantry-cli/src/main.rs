//! Gantry CLI — command-line client for the Gantry control plane.
//!
//! A standalone HTTP client that communicates with the Gantry server.
//! No internal crate dependencies — talks exclusively via the REST API.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::fmt::Write as _;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::Value;

// ── ANSI color helpers ───────────────────────────────────────────────

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const MAGENTA: &str = "\x1b[35m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";

const BANNER_SMALL: &str = "⟐ Gantry";

// ── CLI structure ────────────────────────────────────────────────────

/// Gantry — apps, environment variables, and usage analytics.
#[derive(Parser)]
#[command(
    name = "gantry",
    version,
    about = "Gantry CLI — manage apps, environment variables, and usage analytics",
    long_about = None,
    after_help = format!(
        "{DIM}Environment variables:{RESET}\n  \
         GANTRY_ADDR      Server address (default: http://127.0.0.1:8200)\n  \
         GANTRY_API_KEY   API key for authenticated requests\n\n\
         {DIM}Examples:{RESET}\n  \
         gantry signup --email dev@example.com\n  \
         gantry apps create --name api --region us-east\n  \
         gantry env set --app <app-id> --key DATABASE_URL --value postgres://db --environment production\n  \
         gantry env import --app <app-id> .env"
    ),
)]
struct Cli {
    /// Gantry server address.
    #[arg(long, env = "GANTRY_ADDR", default_value = "http://127.0.0.1:8200")]
    addr: String,

    /// API key for authenticated requests.
    #[arg(long, env = "GANTRY_API_KEY")]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new account and print its API key.
    Signup {
        /// Email address for the new account.
        #[arg(long)]
        email: String,
    },
    /// Show the account behind the configured API key.
    Whoami,
    /// Application management.
    Apps {
        #[command(subcommand)]
        action: AppCommands,
    },
    /// Environment variable operations.
    Env {
        #[command(subcommand)]
        action: EnvCommands,
    },
    /// Analytics event operations.
    Events {
        #[command(subcommand)]
        action: EventCommands,
    },
    /// Usage metric queries.
    Metrics {
        #[command(subcommand)]
        action: MetricCommands,
    },
}

#[derive(Subcommand)]
enum AppCommands {
    /// List applications owned by this account.
    List,
    /// Register a new application.
    Create {
        /// Application name.
        #[arg(long)]
        name: String,
        /// Deployment region (e.g. us-east, eu-west).
        #[arg(long)]
        region: String,
        /// Optional description.
        #[arg(long)]
        description: Option<String>,
    },
    /// Show one application.
    Get {
        /// Application ID.
        app_id: String,
    },
    /// Rename an application or move it to another region.
    Update {
        /// Application ID.
        app_id: String,
        /// New application name.
        #[arg(long)]
        name: Option<String>,
        /// New deployment region.
        #[arg(long)]
        region: Option<String>,
    },
    /// Delete an application and everything stored under it.
    Delete {
        /// Application ID.
        app_id: String,
    },
}

#[derive(Subcommand)]
enum EnvCommands {
    /// List environment variables for an app (values masked when encrypted).
    List {
        /// Application ID.
        #[arg(long)]
        app: String,
        /// Filter to one environment (development, staging, production).
        #[arg(long)]
        environment: Option<String>,
    },
    /// Show one environment variable.
    Get {
        /// Environment variable ID.
        id: String,
    },
    /// Create an environment variable.
    Set {
        /// Application ID.
        #[arg(long)]
        app: String,
        /// Variable name, e.g. DATABASE_URL.
        #[arg(long)]
        key: String,
        /// Variable value.
        #[arg(long)]
        value: String,
        /// Target environment.
        #[arg(long)]
        environment: String,
        /// Store the value encrypted at rest.
        #[arg(long, default_value = "false")]
        encrypted: bool,
        /// Optional description.
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete an environment variable.
    Rm {
        /// Environment variable ID.
        id: String,
    },
    /// Bulk-import variables from a .env file.
    Import {
        /// Application ID.
        #[arg(long)]
        app: String,
        /// Target environment for every imported variable.
        #[arg(long, default_value = "development")]
        environment: String,
        /// Path to the .env file.
        file: String,
    },
}

#[derive(Subcommand)]
enum EventCommands {
    /// Record an analytics event.
    Track {
        /// Application ID.
        #[arg(long)]
        app: String,
        /// Event type, e.g. api_call, user_login, deployment_created.
        #[arg(long = "type")]
        event_type: String,
        /// Optional JSON metadata payload.
        #[arg(long)]
        metadata: Option<String>,
    },
    /// List recent events, newest first.
    List {
        /// Application ID.
        #[arg(long)]
        app: String,
        /// Filter by event type.
        #[arg(long = "type")]
        event_type: Option<String>,
        /// Maximum number of events to return.
        #[arg(long)]
        limit: Option<u32>,
    },
}

#[derive(Subcommand)]
enum MetricCommands {
    /// List daily metric buckets, oldest first.
    List {
        /// Application ID.
        #[arg(long)]
        app: String,
        /// Filter by metric type.
        #[arg(long = "type")]
        metric_type: Option<String>,
        /// Number of days to look back.
        #[arg(long)]
        days: Option<u32>,
    },
    /// Usage summary computed from raw events over a trailing window.
    Summary {
        /// Application ID.
        #[arg(long)]
        app: String,
        /// Number of days to look back (default 30).
        #[arg(long)]
        days: Option<u32>,
    },
}

// ── Pretty output helpers ────────────────────────────────────────────

fn header(icon: &str, title: &str) {
    println!("{BOLD}{CYAN}{icon} {title}{RESET}");
    println!("{DIM}─────────────────────────────────────────{RESET}");
}

fn kv_line(key: &str, value: &str) {
    println!("  {DIM}{key:<20}{RESET} {WHITE}{value}{RESET}");
}

fn success(msg: &str) {
    println!("{GREEN}{BOLD}✓{RESET} {msg}");
}

fn print_app_detail(app: &Value) {
    let name = app.get("name").and_then(Value::as_str).unwrap_or("?");
    header("📦", &format!("App: {name}"));
    if let Some(id) = app.get("id").and_then(Value::as_str) {
        kv_line("ID", id);
    }
    if let Some(region) = app.get("region").and_then(Value::as_str) {
        kv_line("Region", region);
    }
    if let Some(desc) = app.get("description").and_then(Value::as_str) {
        kv_line("Description", desc);
    }
    if let Some(created) = app.get("created_at").and_then(Value::as_str) {
        kv_line("Created", created);
    }
}

fn print_app_line(app: &Value) {
    let id = app.get("id").and_then(Value::as_str).unwrap_or("?");
    let name = app.get("name").and_then(Value::as_str).unwrap_or("?");
    let region = app.get("region").and_then(Value::as_str).unwrap_or("?");
    println!("  {CYAN}├─{RESET} {BOLD}{name:<24}{RESET} {MAGENTA}{region:<10}{RESET} {DIM}{id}{RESET}");
}

fn print_env_var_line(var: &Value) {
    let key = var.get("key").and_then(Value::as_str).unwrap_or("?");
    let value = var.get("value").and_then(Value::as_str).unwrap_or("?");
    let environment = var.get("environment").and_then(Value::as_str).unwrap_or("?");
    let lock = if var.get("is_encrypted").and_then(Value::as_bool) == Some(true) {
        format!(" {YELLOW}🔒{RESET}")
    } else {
        String::new()
    };
    println!("  {CYAN}├─{RESET} {BOLD}{key:<28}{RESET} {MAGENTA}{environment:<12}{RESET} {value}{lock}");
}

fn print_env_var_detail(var: &Value) {
    let key = var.get("key").and_then(Value::as_str).unwrap_or("?");
    header("🔧", &format!("Variable: {key}"));
    if let Some(id) = var.get("id").and_then(Value::as_str) {
        kv_line("ID", id);
    }
    if let Some(environment) = var.get("environment").and_then(Value::as_str) {
        kv_line("Environment", environment);
    }
    let encrypted = var.get("is_encrypted").and_then(Value::as_bool) == Some(true);
    kv_line("Encrypted", if encrypted { "yes" } else { "no" });
    if let Some(value) = var.get("value").and_then(Value::as_str) {
        kv_line("Value", value);
    }
    // The detail view is the edit surface, so the plaintext rides along
    // even for encrypted records.
    if encrypted {
        if let Some(plain) = var.get("decrypted_value").and_then(Value::as_str) {
            kv_line("Decrypted Value", plain);
        }
    }
    if let Some(desc) = var.get("description").and_then(Value::as_str) {
        kv_line("Description", desc);
    }
    if let Some(updated) = var.get("updated_at").and_then(Value::as_str) {
        kv_line("Updated", updated);
    }
}

fn print_event_line(event: &Value) {
    let event_type = event.get("event_type").and_then(Value::as_str).unwrap_or("?");
    let timestamp = event.get("timestamp").and_then(Value::as_str).unwrap_or("?");
    let user = event
        .get("user_id")
        .and_then(Value::as_str)
        .map(|u| format!(" {DIM}user={u}{RESET}"))
        .unwrap_or_default();
    println!("  {CYAN}├─{RESET} {BOLD}{event_type:<24}{RESET} {DIM}{timestamp}{RESET}{user}");
}

fn print_usage_summary(resp: &Value) {
    header("📊", "Usage Summary");
    let count = |field: &str| {
        resp.get(field)
            .and_then(Value::as_u64)
            .unwrap_or(0)
            .to_string()
    };
    kv_line("API Calls", &count("total_api_calls"));
    kv_line("Errors", &count("total_errors"));
    let rate = resp.get("error_rate").and_then(Value::as_f64).unwrap_or(0.0);
    let colored_rate = if rate > 5.0 {
        format!("{RED}{rate:.1}%{RESET}")
    } else {
        format!("{GREEN}{rate:.1}%{RESET}")
    };
    kv_line("Error Rate", &colored_rate);
    kv_line("Active Users", &count("active_users"));
    kv_line("Deployments", &count("total_deployments"));
    kv_line("Active Deployments", &count("active_deployments"));
}

// ── HTTP client ──────────────────────────────────────────────────────

struct Client {
    http: reqwest::Client,
    addr: String,
    api_key: Option<String>,
}

impl Client {
    fn new(addr: String, api_key: Option<String>) -> Self {
        let http = reqwest::Client::new();
        Self { http, addr, api_key }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.addr.trim_end_matches('/'))
    }

    fn auth_header(&self) -> Result<String> {
        self.api_key
            .as_deref()
            .map(|key| format!("Bearer {key}"))
            .ok_or_else(|| anyhow::anyhow!("no API key provided — set GANTRY_API_KEY or use --api-key"))
    }

    async fn get(&self, path: &str) -> Result<Value> {
        let auth = self.auth_header()?;
        let resp = self
            .http
            .get(self.url(path))
            .header("Authorization", &auth)
            .send()
            .await
            .context("request failed")?;
        handle_response(resp).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let auth = self.auth_header()?;
        let resp = self
            .http
            .post(self.url(path))
            .header("Authorization", &auth)
            .json(body)
            .send()
            .await
            .context("request failed")?;
        handle_response(resp).await
    }

    async fn post_no_auth(&self, path: &str, body: &Value) -> Result<Value> {
        let resp = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .context("request failed")?;
        handle_response(resp).await
    }

    async fn patch(&self, path: &str, body: &Value) -> Result<Value> {
        let auth = self.auth_header()?;
        let resp = self
            .http
            .patch(self.url(path))
            .header("Authorization", &auth)
            .json(body)
            .send()
            .await
            .context("request failed")?;
        handle_response(resp).await
    }

    async fn delete(&self, path: &str) -> Result<Value> {
        let auth = self.auth_header()?;
        let resp = self
            .http
            .delete(self.url(path))
            .header("Authorization", &auth)
            .send()
            .await
            .context("request failed")?;
        handle_response(resp).await
    }
}

async fn handle_response(resp: reqwest::Response) -> Result<Value> {
    let status = resp.status();
    let body = resp.text().await.context("failed to read response body")?;
    if !status.is_success() {
        // The server wraps failures as {"error": kind, "message": detail};
        // surface the human-readable half when it is present.
        if let Ok(parsed) = serde_json::from_str::<Value>(&body) {
            if let Some(message) = parsed.get("message").and_then(Value::as_str) {
                bail!("server returned {status}: {message}");
            }
        }
        bail!("server returned {status}: {body}");
    }
    if body.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body).context("failed to parse response JSON")
}

// ── Command dispatch ─────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let client = Client::new(cli.addr, cli.api_key);

    match run(client, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("  {RED}{BOLD}✗ Error:{RESET} {e:#}");
            eprintln!();
            ExitCode::FAILURE
        }
    }
}

async fn run(client: Client, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Signup { email } => cmd_signup(&client, &email).await,
        Commands::Whoami => cmd_whoami(&client).await,
        Commands::Apps { action } => cmd_apps(&client, action).await,
        Commands::Env { action } => cmd_env(&client, action).await,
        Commands::Events { action } => cmd_events(&client, action).await,
        Commands::Metrics { action } => cmd_metrics(&client, action).await,
    }
}

// ── Account commands ─────────────────────────────────────────────────

async fn cmd_signup(client: &Client, email: &str) -> Result<()> {
    println!();
    println!("  {BANNER_SMALL} {DIM}creating account...{RESET}");
    let body = serde_json::json!({ "email": email });
    let resp = client.post_no_auth("/v1/auth/signup", &body).await?;

    println!();
    header("🔑", "Account Created");
    if let Some(id) = resp.get("account_id").and_then(Value::as_str) {
        kv_line("Account ID", id);
    }
    if let Some(mail) = resp.get("email").and_then(Value::as_str) {
        kv_line("Email", mail);
    }
    if let Some(key) = resp.get("api_key").and_then(Value::as_str) {
        println!();
        println!("  {DIM}API Key:{RESET}  {GREEN}{BOLD}{key}{RESET}");
        println!();
        println!("  {YELLOW}⚠  Store this securely. It will NOT be shown again.{RESET}");
        println!();
        println!("  {DIM}export GANTRY_API_KEY={key}{RESET}");
    }
    println!();
    Ok(())
}

async fn cmd_whoami(client: &Client) -> Result<()> {
    let resp = client.get("/v1/auth/me").await?;
    println!();
    header("👤", "Account");
    if let Some(id) = resp.get("account_id").and_then(Value::as_str) {
        kv_line("Account ID", id);
    }
    if let Some(mail) = resp.get("email").and_then(Value::as_str) {
        kv_line("Email", mail);
    }
    println!();
    Ok(())
}

// ── App commands ─────────────────────────────────────────────────────

async fn cmd_apps(client: &Client, action: AppCommands) -> Result<()> {
    match action {
        AppCommands::List => {
            let resp = client.get("/v1/apps").await?;
            println!();
            header("📦", "Applications");
            match resp.get("apps").and_then(Value::as_array) {
                Some(apps) if !apps.is_empty() => {
                    for app in apps {
                        print_app_line(app);
                    }
                }
                _ => println!("  {DIM}(no applications){RESET}"),
            }
            println!();
        }
        AppCommands::Create {
            name,
            region,
            description,
        } => {
            let mut body = serde_json::Map::new();
            body.insert("name".to_owned(), serde_json::json!(name));
            body.insert("region".to_owned(), serde_json::json!(region));
            if let Some(d) = description {
                body.insert("description".to_owned(), serde_json::json!(d));
            }
            let resp = client.post("/v1/apps", &Value::Object(body)).await?;
            println!();
            print_app_detail(&resp);
            println!();
            success("Application created.");
            println!();
        }
        AppCommands::Get { app_id } => {
            let resp = client.get(&format!("/v1/apps/{app_id}")).await?;
            println!();
            print_app_detail(&resp);
            println!();
        }
        AppCommands::Update {
            app_id,
            name,
            region,
        } => {
            let mut body = serde_json::Map::new();
            if let Some(n) = name {
                body.insert("name".to_owned(), serde_json::json!(n));
            }
            if let Some(r) = region {
                body.insert("region".to_owned(), serde_json::json!(r));
            }
            let resp = client
                .patch(&format!("/v1/apps/{app_id}"), &Value::Object(body))
                .await?;
            println!();
            print_app_detail(&resp);
            println!();
            success("Application updated.");
            println!();
        }
        AppCommands::Delete { app_id } => {
            client.delete(&format!("/v1/apps/{app_id}")).await?;
            println!();
            success(&format!("Application {BOLD}{app_id}{RESET} deleted."));
            println!();
        }
    }
    Ok(())
}

// ── Env var commands ─────────────────────────────────────────────────

async fn cmd_env(client: &Client, action: EnvCommands) -> Result<()> {
    match action {
        EnvCommands::List { app, environment } => {
            let path = match &environment {
                Some(env) => format!("/v1/apps/{app}/env-vars?environment={env}"),
                None => format!("/v1/apps/{app}/env-vars"),
            };
            let resp = client.get(&path).await?;
            println!();
            header("🔧", "Environment Variables");
            match resp.get("variables").and_then(Value::as_array) {
                Some(vars) if !vars.is_empty() => {
                    for var in vars {
                        print_env_var_line(var);
                    }
                }
                _ => println!("  {DIM}(no variables){RESET}"),
            }
            println!();
        }
        EnvCommands::Get { id } => {
            let resp = client.get(&format!("/v1/env-vars/{id}")).await?;
            println!();
            print_env_var_detail(&resp);
            println!();
        }
        EnvCommands::Set {
            app,
            key,
            value,
            environment,
            encrypted,
            description,
        } => {
            let mut body = serde_json::Map::new();
            body.insert("key".to_owned(), serde_json::json!(key));
            body.insert("value".to_owned(), serde_json::json!(value));
            body.insert("environment".to_owned(), serde_json::json!(environment));
            body.insert("is_encrypted".to_owned(), serde_json::json!(encrypted));
            if let Some(d) = description {
                body.insert("description".to_owned(), serde_json::json!(d));
            }
            client
                .post(&format!("/v1/apps/{app}/env-vars"), &Value::Object(body))
                .await?;
            println!();
            success(&format!(
                "{BOLD}{key}{RESET} set for {MAGENTA}{environment}{RESET}."
            ));
            println!();
        }
        EnvCommands::Rm { id } => {
            client.delete(&format!("/v1/env-vars/{id}")).await?;
            println!();
            success(&format!("Variable {BOLD}{id}{RESET} deleted."));
            println!();
        }
        EnvCommands::Import {
            app,
            environment,
            file,
        } => cmd_env_import(client, &app, &environment, &file).await?,
    }
    Ok(())
}

/// Import variables from a .env file in one bulk call.
async fn cmd_env_import(client: &Client, app: &str, environment: &str, file: &str) -> Result<()> {
    let path = std::path::Path::new(file);
    if !path.exists() {
        bail!("file not found: {file}");
    }

    let content =
        std::fs::read_to_string(path).with_context(|| format!("failed to read {file}"))?;

    let entries = parse_env_file(&content);
    if entries.is_empty() {
        bail!("no variables found in {file}");
    }

    println!();
    header("📦", &format!("Importing variables from {file}"));
    println!();
    println!("  {DIM}Environment:{RESET}  {BOLD}{environment}{RESET}");
    println!("  {DIM}Variables:{RESET}    {BOLD}{}{RESET}", entries.len());
    println!();

    let variables: Vec<Value> = entries
        .iter()
        .map(|(key, value)| {
            serde_json::json!({
                "key": key,
                "value": value,
                "environment": environment,
            })
        })
        .collect();
    let body = serde_json::json!({ "variables": variables });

    let resp = client
        .post(&format!("/v1/apps/{app}/env-vars/import"), &body)
        .await?;

    let mut created = 0u32;
    let mut updated = 0u32;
    if let Some(results) = resp.get("results").and_then(Value::as_array) {
        for outcome in results {
            let key = outcome.get("key").and_then(Value::as_str).unwrap_or("?");
            match outcome.get("action").and_then(Value::as_str) {
                Some("created") => {
                    println!("  {GREEN}✓{RESET} {key} {DIM}created{RESET}");
                    created = created.saturating_add(1);
                }
                Some("updated") => {
                    println!("  {GREEN}✓{RESET} {key} {DIM}updated{RESET}");
                    updated = updated.saturating_add(1);
                }
                other => {
                    println!(
                        "  {RED}✗{RESET} {key} — {RED}{}{RESET}",
                        other.unwrap_or("unknown outcome")
                    );
                }
            }
        }
    }

    println!();
    println!(
        "  {GREEN}{BOLD}✓ Imported {} variables{RESET} {DIM}({created} created, {updated} updated){RESET}",
        created.saturating_add(updated)
    );
    println!();
    Ok(())
}

// ── Event commands ───────────────────────────────────────────────────

async fn cmd_events(client: &Client, action: EventCommands) -> Result<()> {
    match action {
        EventCommands::Track {
            app,
            event_type,
            metadata,
        } => {
            let metadata = metadata
                .map(|raw| {
                    serde_json::from_str::<Value>(&raw).context("--metadata is not valid JSON")
                })
                .transpose()?;
            let mut body = serde_json::Map::new();
            body.insert("event_type".to_owned(), serde_json::json!(event_type));
            if let Some(meta) = metadata {
                body.insert("metadata".to_owned(), meta);
            }
            client
                .post(&format!("/v1/apps/{app}/events"), &Value::Object(body))
                .await?;
            println!();
            success(&format!("Event {BOLD}{event_type}{RESET} recorded."));
            println!();
        }
        EventCommands::List {
            app,
            event_type,
            limit,
        } => {
            let mut path = format!("/v1/apps/{app}/events");
            let mut query = Vec::new();
            if let Some(t) = &event_type {
                query.push(format!("event_type={t}"));
            }
            if let Some(l) = limit {
                query.push(format!("limit={l}"));
            }
            if !query.is_empty() {
                let _ = write!(path, "?{}", query.join("&"));
            }
            let resp = client.get(&path).await?;
            println!();
            header("📈", "Events");
            match resp.get("events").and_then(Value::as_array) {
                Some(events) if !events.is_empty() => {
                    for event in events {
                        print_event_line(event);
                    }
                }
                _ => println!("  {DIM}(no events){RESET}"),
            }
            println!();
        }
    }
    Ok(())
}

// ── Metric commands ──────────────────────────────────────────────────

async fn cmd_metrics(client: &Client, action: MetricCommands) -> Result<()> {
    match action {
        MetricCommands::List {
            app,
            metric_type,
            days,
        } => {
            let mut path = format!("/v1/apps/{app}/metrics");
            let mut query = Vec::new();
            if let Some(t) = &metric_type {
                query.push(format!("metric_type={t}"));
            }
            if let Some(d) = days {
                query.push(format!("days={d}"));
            }
            if !query.is_empty() {
                let _ = write!(path, "?{}", query.join("&"));
            }
            let resp = client.get(&path).await?;
            println!();
            header("📊", "Daily Metrics");
            match resp.get("metrics").and_then(Value::as_array) {
                Some(metrics) if !metrics.is_empty() => {
                    for metric in metrics {
                        let date = metric.get("date").and_then(Value::as_str).unwrap_or("?");
                        let metric_type =
                            metric.get("metric_type").and_then(Value::as_str).unwrap_or("?");
                        let value = metric.get("value").and_then(Value::as_i64).unwrap_or(0);
                        println!(
                            "  {CYAN}├─{RESET} {DIM}{date}{RESET}  {metric_type:<16} {BOLD}{value}{RESET}"
                        );
                    }
                }
                _ => println!("  {DIM}(no metrics){RESET}"),
            }
            println!();
        }
        MetricCommands::Summary { app, days } => {
            let path = match days {
                Some(d) => format!("/v1/apps/{app}/metrics/summary?days={d}"),
                None => format!("/v1/apps/{app}/metrics/summary"),
            };
            let resp = client.get(&path).await?;
            println!();
            print_usage_summary(&resp);
            println!();
        }
    }
    Ok(())
}

// ── .env parsing ─────────────────────────────────────────────────────

/// Parse a .env file into key-value pairs.
///
/// Handles:
/// - `KEY=VALUE` (standard)
/// - `KEY="quoted value"` and `KEY='single quoted'`
/// - `# comments` and blank lines (skipped)
/// - `export KEY=VALUE` (strips `export` prefix)
fn parse_env_file(content: &str) -> Vec<(String, String)> {
    let mut entries = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();

        // Skip empty lines and comments.
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        // Strip optional `export ` prefix.
        let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);

        // Split on first `=`.
        let Some((key, raw_value)) = trimmed.split_once('=') else {
            continue;
        };

        let key = key.trim().to_owned();
        if key.is_empty() {
            continue;
        }

        let value = raw_value.trim();

        // Strip surrounding quotes if present.
        let value = if value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')))
        {
            value[1..value.len() - 1].to_owned()
        } else {
            value.to_owned()
        };

        entries.push((key, value));
    }

    entries
}
