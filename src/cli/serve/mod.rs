//! `htmlcomb serve`: local server plus interactive console.

mod console;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use crossbeam::{channel, select};

use super::args::KindArgs;
use super::common::load_files;
use crate::config::AppConfig;
use crate::log;
use crate::registry::ContentRegistry;
use crate::server::LocalServer;
use crate::source::{ContentSource, FsSource};
use console::{Flow, Session};

/// Register `files`, start the server and read console commands until
/// `quit`, Ctrl+C, or (with stdin closed) Ctrl+C alone.
pub fn run_serve(files: &[PathBuf], kinds: &KindArgs, config: &AppConfig) -> Result<()> {
    let registry = Arc::new(ContentRegistry::new());
    load_files(&registry, files, kinds)?;
    if registry.is_empty() {
        log!("serve"; "no files yet; add some with `add <path>`");
    }

    let source: Arc<dyn ContentSource> = Arc::new(FsSource);
    let server = LocalServer::new(Arc::clone(&registry), Arc::clone(&source), config.serve.clone());
    server.start().context("failed to start server")?;

    let session = Session {
        registry,
        source,
        server,
        combine: config.combine.clone(),
    };
    if let Some(url) = session.server.preview_url() {
        log!("serve"; "preview: {}", url);
    }
    log!("serve"; "type `help` for commands, `quit` or Ctrl+C to exit");

    let (shutdown_tx, shutdown_rx) = channel::bounded::<()>(1);
    crate::core::register_shutdown(shutdown_tx);
    let lines = console::spawn_stdin_reader();

    loop {
        select! {
            recv(shutdown_rx) -> _ => break,
            recv(lines) -> line => match line {
                Ok(line) => {
                    if session.handle_line(&line) == Flow::Quit {
                        break;
                    }
                }
                // No console input: keep serving until Ctrl+C.
                Err(_) => {
                    if !crate::core::is_shutdown() {
                        let _ = shutdown_rx.recv();
                    }
                    break;
                }
            },
        }
    }

    session.server.stop();
    Ok(())
}
