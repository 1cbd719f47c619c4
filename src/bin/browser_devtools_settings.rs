// src/bin/browser_devtools_settings.rs
//! Serves the settings panel protocol over stdio against a JSON settings file.
//!
//! Inbound panel messages are read from stdin, one JSON object per line;
//! snapshots are written to stdout the same way. Logs go to stderr.
//!
//! ```text
//! browser_devtools_settings settings.json
//! browser_devtools_settings settings.json --definition
//! ```

use std::ffi::OsString;
use std::io::{self, BufRead, Write};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Sender};
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use browser_devtools_mcp::activation::{Activation, ExtensionContext};
use browser_devtools_mcp::config::SettingsFile;
use browser_devtools_mcp::env::{ServerDefinitionProvider, DEFAULT_COMMAND};
use browser_devtools_mcp::host::{Webview, WebviewOptions, Workbench};
use browser_devtools_mcp::panel::{InboundMessage, OutboundMessage};
use browser_devtools_mcp::status::StatusBarItem;

#[derive(Parser)]
#[command(name = "browser_devtools_settings")]
#[command(about = "Browser DevTools MCP settings panel over stdio")]
#[command(version)]
struct Cli {
    /// JSON settings file (created on first write)
    settings: PathBuf,

    /// Print the server definition as JSON and exit
    #[arg(long)]
    definition: bool,

    /// Extension install directory [default: current directory]
    #[arg(long, env = "BROWSER_DEVTOOLS_EXTENSION_PATH")]
    extension_path: Option<PathBuf>,
}

enum HostEvent {
    Message(String),
    SettingsFileChanged,
    InputClosed,
}

struct StdoutWebview {
    out: io::Stdout,
}

impl Webview for StdoutWebview {
    fn set_options(&mut self, options: WebviewOptions) {
        log::debug!(
            "webview options: scripts={}, roots={:?}",
            options.enable_scripts,
            options.local_resource_roots
        );
    }

    fn set_html(&mut self, html: String) {
        log::debug!("webview markup installed ({} bytes)", html.len());
    }

    fn post_message(&mut self, message: &OutboundMessage) -> Result<()> {
        let line = message.to_json()?;
        let mut out = self.out.lock();
        writeln!(out, "{line}").context("writing to stdout failed")?;
        out.flush().context("flushing stdout failed")
    }
}

struct LogWorkbench {
    settings_path: PathBuf,
}

impl Workbench for LogWorkbench {
    fn show_information_message(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn open_settings(&mut self, query: &str) {
        log::info!(
            "settings for {query} live in {}",
            self.settings_path.display()
        );
    }

    fn update_status_bar(&mut self, item: &StatusBarItem) {
        log::info!("status: {} ({})", item.text, item.tooltip);
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();

    let extension_path = match cli.extension_path {
        Some(path) => path,
        None => std::env::current_dir().context("failed to resolve current directory")?,
    };
    let store = SettingsFile::open(&cli.settings)?;
    let provider = ServerDefinitionProvider::new(&extension_path).with_command(node_command());

    if cli.definition {
        let definitions = provider.server_definitions(&store, std::env::vars());
        let text = serde_json::to_string_pretty(&definitions)
            .context("serializing server definitions failed")?;
        println!("{text}");
        return Ok(());
    }

    let mut workbench = LogWorkbench {
        settings_path: cli.settings.clone(),
    };
    let context = ExtensionContext { extension_path };
    let mut activation =
        Activation::activate(context, store, &mut workbench).with_provider(provider);
    activation.resolve_panel(StdoutWebview { out: io::stdout() })?;

    let (tx, rx) = channel();
    let _watcher = watch_settings(&cli.settings, tx.clone())?;
    spawn_stdin_reader(tx);

    for event in rx {
        match dispatch(&mut activation, event, &mut workbench) {
            Ok(ControlFlow::Continue(())) => {}
            Ok(ControlFlow::Break(())) => break,
            Err(e) => log::warn!("{e:#}"),
        }
    }

    activation.deactivate();
    Ok(())
}

/// Handles one host event. Breaks once stdin is closed.
fn dispatch<W: Webview>(
    activation: &mut Activation<SettingsFile, W>,
    event: HostEvent,
    workbench: &mut dyn Workbench,
) -> Result<ControlFlow<()>> {
    match event {
        HostEvent::Message(line) => {
            let message = InboundMessage::from_json(&line)?;
            activation.handle_panel_message(message, workbench)?;
        }
        HostEvent::SettingsFileChanged => {
            let change = activation.store_mut().reload()?;
            activation.configuration_changed(&change, workbench)?;
        }
        HostEvent::InputClosed => return Ok(ControlFlow::Break(())),
    }
    Ok(ControlFlow::Continue(()))
}

/// `node` from PATH when it can be found. Otherwise the bare name, and the
/// launch fails later with the host's own error.
fn node_command() -> String {
    match which::which(DEFAULT_COMMAND) {
        Ok(path) => path.to_string_lossy().into_owned(),
        Err(e) => {
            log::warn!("could not find {DEFAULT_COMMAND} in PATH: {e}");
            DEFAULT_COMMAND.to_string()
        }
    }
}

/// Watches the directory holding the settings file, since saves replace the
/// file by rename.
fn watch_settings(path: &Path, tx: Sender<HostEvent>) -> Result<RecommendedWatcher> {
    let file_name = path
        .file_name()
        .map(OsString::from)
        .with_context(|| format!("{} is not a file path", path.display()))?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(Event { kind, paths, .. }) => {
                let relevant = matches!(
                    kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                );
                let ours = paths
                    .iter()
                    .any(|p| p.file_name() == Some(file_name.as_os_str()));
                if relevant && ours {
                    let _ = tx.send(HostEvent::SettingsFileChanged);
                }
            }
            Err(e) => log::warn!("watch error: {e:?}"),
        },
        notify::Config::default(),
    )
    .context("failed to initialize file watcher")?;

    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("failed to watch {}", dir.display()))?;
    log::info!("watching {}", path.display());
    Ok(watcher)
}

fn spawn_stdin_reader(tx: Sender<HostEvent>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => {
                    if tx.send(HostEvent::Message(line)).is_err() {
                        return;
                    }
                }
                Err(e) => {
                    log::warn!("reading stdin failed: {e}");
                    break;
                }
            }
        }
        let _ = tx.send(HostEvent::InputClosed);
    });
}
