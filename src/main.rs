//! Purpose: `etcd-rest` CLI entry point.
//! Role: Binary crate root; parses args, builds the client, emits results as JSON on stdout.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: Soft failures (results carrying `errorMessage`) print normally but exit non-zero.
#![allow(clippy::result_large_err)]
use std::error::Error as StdError;
use std::ffi::OsString;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::time::Duration;

use clap::{
    ArgGroup, Args, CommandFactory, Parser, Subcommand, ValueEnum, ValueHint,
    error::ErrorKind as ClapErrorKind,
};
use clap_complete::aot::Shell;
use etcd_rest::api::{
    ClientConfig, Credentials, EtcdClient, Error, ErrorKind, ErrorMessage, resolve_credentials,
    to_exit_code,
};
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

mod command_dispatch;

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse_from(std::env::args_os().collect::<Vec<OsString>>()) {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                let message = clap_error_summary(&err);
                let hint = clap_error_hint(&err);
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(message)
                        .with_hint(hint),
                    ColorMode::Auto,
                ));
            }
        },
    };

    let color_mode = cli.color;
    command_dispatch::dispatch_command(cli.command, &cli.connection)
        .map_err(add_connection_hint)
        .map_err(add_internal_hint)
        .map_err(|err| (err, color_mode))
}

#[derive(Parser)]
#[command(
    name = "etcd-rest",
    version,
    about = "Command-line client for the etcd v2 REST API",
    long_about = None,
    after_help = r#"EXAMPLES
  $ etcd-rest set hello world --ttl 30
  $ etcd-rest get hello
  $ etcd-rest cas hello there --prev-value world
  $ etcd-rest watch hello --wait-index 7
  $ etcd-rest ls / --recursive

ENDPOINT
  --endpoint wins; otherwise ETCD_REST_ENDPOINT, ETCD_LISTEN_CLIENT_URLS and
  ETCD_ADVERTISE_CLIENT_URLS are tried in order, then http://127.0.0.1:2379."#,
    arg_required_else_help = true
)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,
    #[arg(
        long,
        global = true,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics: auto|always|never"
    )]
    color: ColorMode,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Clone, Debug, Default)]
struct ConnectionArgs {
    #[arg(
        long,
        global = true,
        value_hint = ValueHint::Url,
        help = "etcd client URL, e.g. http://127.0.0.1:2379"
    )]
    endpoint: Option<String>,
    #[arg(
        long,
        global = true,
        help = "Basic auth as user:password or a base64 token (default: ETCD_REST_CREDENTIALS)"
    )]
    credentials: Option<String>,
    #[arg(long, global = true, help = "Connect timeout in milliseconds")]
    connect_timeout_ms: Option<u64>,
    #[arg(
        long,
        global = true,
        help = "Read timeout in milliseconds (default: none, so watches block)"
    )]
    timeout_ms: Option<u64>,
    #[arg(
        long,
        global = true,
        value_hint = ValueHint::FilePath,
        help = "PEM file with CA certificates to trust"
    )]
    tls_ca: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        conflicts_with = "tls_ca",
        help = "Skip TLS certificate verification (unsafe)"
    )]
    tls_skip_verify: bool,
}

impl ConnectionArgs {
    fn client_config(&self) -> ClientConfig {
        let mut config = match &self.endpoint {
            Some(endpoint) => {
                let mut config = ClientConfig::new(endpoint.clone());
                config.credentials = resolve_credentials(&|name: &str| std::env::var(name).ok());
                config
            }
            None => ClientConfig::from_env(),
        };
        if let Some(raw) = &self.credentials {
            config = config.with_credentials(Credentials::parse(raw));
        }
        if let Some(ms) = self.connect_timeout_ms {
            config = config.with_connect_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = self.timeout_ms {
            config = config.with_read_timeout(Duration::from_millis(ms));
        }
        if let Some(path) = &self.tls_ca {
            config = config.with_tls_ca_file(path.clone());
        }
        if self.tls_skip_verify {
            config = config.with_tls_skip_verify();
        }
        config
    }

    fn client(&self) -> Result<EtcdClient, Error> {
        EtcdClient::new(self.client_config())
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Read a key")]
    Get { key: String },
    #[command(about = "Set a key's value")]
    Set {
        key: String,
        value: String,
        #[arg(long, help = "Time to live in seconds")]
        ttl: Option<u64>,
    },
    #[command(about = "Append a value under a key with a server-generated, ordered name")]
    Push {
        key: String,
        value: String,
        #[arg(long, help = "Time to live in seconds")]
        ttl: Option<u64>,
    },
    #[command(about = "List in-order children of a key, sorted by creation")]
    Ordered { key: String },
    #[command(about = "Delete a key")]
    Rm { key: String },
    #[command(about = "Wait for the next change to a key")]
    Watch {
        key: String,
        #[arg(long, help = "Return the first change at or after this index")]
        wait_index: Option<u64>,
        #[arg(long, help = "Also wake on changes to children")]
        recursive: bool,
    },
    #[command(
        about = "Compare-and-swap: set a value only if a precondition holds",
        group(
            ArgGroup::new("precondition")
                .required(true)
                .args(["prev_value", "prev_index", "prev_exist"])
        )
    )]
    Cas {
        key: String,
        value: String,
        #[arg(long)]
        prev_value: Option<String>,
        #[arg(long)]
        prev_index: Option<u64>,
        #[arg(long, help = "false: create only if absent; true: update only if present")]
        prev_exist: Option<bool>,
    },
    #[command(
        about = "Compare-and-delete: delete a key only if a precondition holds",
        group(
            ArgGroup::new("precondition")
                .required(true)
                .args(["prev_value", "prev_index"])
        )
    )]
    Cad {
        key: String,
        #[arg(long)]
        prev_value: Option<String>,
        #[arg(long)]
        prev_index: Option<u64>,
    },
    #[command(about = "Create a directory")]
    Mkdir {
        dir: String,
        #[arg(long, help = "Time to live in seconds")]
        ttl: Option<u64>,
    },
    #[command(about = "List a directory")]
    Ls {
        #[arg(default_value = "/")]
        dir: String,
        #[arg(long, short)]
        recursive: bool,
    },
    #[command(about = "Delete a directory and everything under it")]
    Rmdir { dir: String },
    #[command(about = "Cluster auth switch")]
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
    #[command(about = "Manage roles")]
    Role {
        #[command(subcommand)]
        command: RoleCommand,
    },
    #[command(about = "Manage users")]
    User {
        #[command(subcommand)]
        command: UserCommand,
    },
    #[command(about = "Manage cluster members")]
    Member {
        #[command(subcommand)]
        command: MemberCommand,
    },
    #[command(about = "Cluster statistics")]
    Stats {
        #[command(subcommand)]
        command: StatsCommand,
    },
    #[command(about = "Check member health; exits non-zero when unhealthy")]
    Health,
    #[command(about = "Print server and cluster versions")]
    Version,
    #[command(
        arg_required_else_help = true,
        about = "Generate shell completions",
        after_help = r#"EXAMPLES
  $ etcd-rest completion bash > ~/.local/share/bash-completion/completions/etcd-rest
  $ etcd-rest completion zsh > ~/.zfunc/_etcd-rest
  $ etcd-rest completion fish > ~/.config/fish/completions/etcd-rest.fish"#
    )]
    Completion {
        #[arg(help = "Shell to generate completions for")]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum AuthCommand {
    Status,
    Enable,
    Disable,
}

#[derive(Subcommand)]
enum RoleCommand {
    List,
    Get {
        name: String,
    },
    #[command(about = "Create a role, or grant/revoke key permissions on an existing one")]
    Create {
        name: String,
        #[arg(long, help = "Readable key pattern (repeatable)")]
        read: Vec<String>,
        #[arg(long, help = "Writable key pattern (repeatable)")]
        write: Vec<String>,
        #[arg(long, help = "Grant read on a key pattern (repeatable)")]
        grant_read: Vec<String>,
        #[arg(long, help = "Grant write on a key pattern (repeatable)")]
        grant_write: Vec<String>,
        #[arg(long, help = "Revoke read on a key pattern (repeatable)")]
        revoke_read: Vec<String>,
        #[arg(long, help = "Revoke write on a key pattern (repeatable)")]
        revoke_write: Vec<String>,
    },
    Delete {
        name: String,
    },
}

#[derive(Subcommand)]
enum UserCommand {
    List,
    Get {
        name: String,
    },
    #[command(about = "Create a user, or change its password and roles")]
    Create {
        name: String,
        #[arg(long)]
        password: String,
        #[arg(long = "role", help = "Role to assign (repeatable)")]
        roles: Vec<String>,
        #[arg(long, help = "Role to grant (repeatable)")]
        grant: Vec<String>,
        #[arg(long, help = "Role to revoke (repeatable)")]
        revoke: Vec<String>,
    },
    Delete {
        name: String,
    },
}

#[derive(Subcommand)]
enum MemberCommand {
    List,
    Add {
        #[arg(required = true, help = "Peer URL(s) of the new member")]
        peer_urls: Vec<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "client-url", help = "Client URL (repeatable)")]
        client_urls: Vec<String>,
    },
    Remove {
        id: String,
    },
}

#[derive(Subcommand)]
enum StatsCommand {
    Leader,
    #[command(name = "self")]
    SelfStats,
    Store,
}

fn emit_json(value: &Value) {
    let json = if io::stdout().is_terminal() {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

fn to_json(value: &impl Serialize) -> Result<Value, Error> {
    serde_json::to_value(value).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode result json")
            .with_source(err)
    })
}

/// Print `value`; a soft failure picks the exit code from its error code, else `fallback`.
fn emit_result(
    value: &impl Serialize,
    soft_error: Option<&ErrorMessage>,
    fallback: ErrorKind,
) -> Result<RunOutcome, Error> {
    emit_json(&to_json(value)?);
    Ok(match soft_error {
        Some(error) => RunOutcome::with_code(to_exit_code(error.kind().unwrap_or(fallback))),
        None => RunOutcome::ok(),
    })
}

#[derive(Copy, Clone, Debug)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::AlreadyExists => "already exists".to_string(),
        ErrorKind::PreconditionFailed => "precondition failed".to_string(),
        ErrorKind::Permission => "permission denied".to_string(),
        ErrorKind::Unavailable => "etcd unavailable".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(key) = err.key() {
        inner.insert("key".to_string(), json!(key));
    }
    if let Some(status) = err.status() {
        inner.insert("status".to_string(), json!(status));
    }
    if let Some(body) = err.body() {
        // etcd bodies are usually JSON; embed them as-is when they parse.
        let body = serde_json::from_str::<Value>(body).unwrap_or_else(|_| json!(body));
        inner.insert("body".to_string(), body);
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    ));

    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(key) = err.key() {
        lines.push(format!(
            "{} {key}",
            colorize_label("key:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(body) = err.body().map(str::trim).filter(|body| !body.is_empty()) {
        lines.push(format!(
            "{} {body}",
            colorize_label("response:", use_color, AnsiColor::Yellow)
        ));
    }

    let causes = error_causes(err);
    if let Some(cause) = causes.first() {
        lines.push(format!(
            "{} {cause}",
            colorize_label("caused by:", use_color, AnsiColor::Yellow)
        ));
    }

    lines.join("\n")
}

fn add_connection_hint(err: Error) -> Error {
    if err.hint().is_some() {
        return err;
    }
    match err.kind() {
        ErrorKind::Io => err.with_hint(
            "Could not reach etcd. Check --endpoint (or ETCD_REST_ENDPOINT) and that the member is running.",
        ),
        ErrorKind::Permission => err.with_hint(
            "Access denied. Pass credentials with --credentials user:password or ETCD_REST_CREDENTIALS.",
        ),
        ErrorKind::Unavailable => {
            err.with_hint("etcd is unavailable. Check cluster health with `etcd-rest health`.")
        }
        _ => err,
    }
}

fn add_internal_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Internal || err.hint().is_some() {
        return err;
    }
    err.with_hint(
        "Unexpected internal failure. Retry with RUST_LOG=debug and share command/context if it persists.",
    )
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}

fn clap_error_hint(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let usage = rendered
        .lines()
        .find_map(|line| line.trim().strip_prefix("Usage: "))
        .map(str::trim);

    let Some(usage) = usage else {
        return "Try `etcd-rest --help`.".to_string();
    };

    let tokens: Vec<&str> = usage.split_whitespace().collect();
    let Some(pos) = tokens.iter().position(|t| *t == "etcd-rest") else {
        return "Try `etcd-rest --help`.".to_string();
    };

    let parts: Vec<&str> = tokens
        .iter()
        .skip(pos + 1)
        .take_while(|token| {
            !token.starts_with('-') && !token.starts_with('<') && !token.starts_with('[')
        })
        .copied()
        .collect();

    if parts.is_empty() {
        return "Try `etcd-rest --help`.".to_string();
    }
    format!("Try `etcd-rest {} --help`.", parts.join(" "))
}

fn completion(shell: Shell) -> RunOutcome {
    let mut cmd = Cli::command();
    clap_complete::aot::generate(shell, &mut cmd, "etcd-rest", &mut io::stdout());
    RunOutcome::ok()
}
