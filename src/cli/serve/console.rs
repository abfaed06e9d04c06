//! Interactive console for `htmlcomb serve`.
//!
//! Positions are 1-based, as printed by `ls`.

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use anyhow::{Result, anyhow, bail};
use crossbeam::channel::{self, Receiver};
use owo_colors::OwoColorize;

use crate::cli::args::KindArgs;
use crate::cli::combine::save_combined;
use crate::cli::common::{Added, add_file, warn_collisions};
use crate::config::CombineConfig;
use crate::log;
use crate::registry::{ContentKind, ContentRegistry};
use crate::server::{LocalServer, ServerState};
use crate::source::ContentSource;

pub const HELP: &str = "\
commands:
  ls                     list files
  add PATH...            register files
  rm N                   remove file N
  mv FROM TO             move file FROM to position TO
  on N / off N           enable / disable file N
  kind N KIND            set kind (html, css, js, other)
  clear                  remove every file
  combine [PATH]         save the combined document
  preview                print the preview URL
  start / stop / restart control the server
  status                 server state
  help                   this text
  quit                   stop and exit";

/// One parsed console line. Positions are stored 0-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Nothing,
    List,
    Add(Vec<PathBuf>),
    Remove(usize),
    Move { from: usize, to: usize },
    Enable(usize),
    Disable(usize),
    SetKind(usize, ContentKind),
    Clear,
    Combine(Option<PathBuf>),
    Preview,
    Start,
    Stop,
    Restart,
    Status,
    Help,
    Quit,
}

/// Whether the console keeps reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Parse one console line.
pub fn parse(line: &str) -> Result<Command> {
    let words = split_words(line);
    let Some((head, args)) = words.split_first() else {
        return Ok(Command::Nothing);
    };

    let command = match (head.to_ascii_lowercase().as_str(), args) {
        ("ls" | "list", []) => Command::List,
        ("add", []) => bail!("usage: add PATH..."),
        ("add", paths) => Command::Add(paths.iter().map(PathBuf::from).collect()),
        ("rm" | "remove", [n]) => Command::Remove(position(n)?),
        ("mv" | "move", [from, to]) => Command::Move {
            from: position(from)?,
            to: position(to)?,
        },
        ("on" | "enable", [n]) => Command::Enable(position(n)?),
        ("off" | "disable", [n]) => Command::Disable(position(n)?),
        ("kind", [n, kind]) => {
            let kind = kind.parse::<ContentKind>().map_err(|e| anyhow!(e))?;
            Command::SetKind(position(n)?, kind)
        }
        ("clear", []) => Command::Clear,
        ("combine" | "save", []) => Command::Combine(None),
        ("combine" | "save", [path]) => Command::Combine(Some(PathBuf::from(path))),
        ("preview" | "open", []) => Command::Preview,
        ("start", []) => Command::Start,
        ("stop", []) => Command::Stop,
        ("restart", []) => Command::Restart,
        ("status", []) => Command::Status,
        ("help" | "?", _) => Command::Help,
        ("quit" | "exit" | "q", []) => Command::Quit,
        (
            "ls" | "list" | "rm" | "remove" | "mv" | "move" | "on" | "enable" | "off" | "disable"
            | "kind" | "clear" | "combine" | "save" | "preview" | "open" | "start" | "stop"
            | "restart" | "status" | "quit" | "exit" | "q",
            _,
        ) => bail!("wrong arguments for `{head}` (type `help`)"),
        _ => bail!("unknown command `{head}` (type `help`)"),
    };
    Ok(command)
}

/// 1-based position from the user -> 0-based index.
fn position(word: &str) -> Result<usize> {
    match word.parse::<usize>() {
        Ok(0) => bail!("positions start at 1"),
        Ok(n) => Ok(n - 1),
        Err(_) => bail!("`{word}` is not a position"),
    }
}

/// Whitespace-separated words; double quotes group words with spaces.
fn split_words(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut pending = false;

    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                pending = true;
            }
            c if c.is_whitespace() && !quoted => {
                if pending {
                    words.push(std::mem::take(&mut current));
                    pending = false;
                }
            }
            c => {
                current.push(c);
                pending = true;
            }
        }
    }
    if pending {
        words.push(current);
    }
    words
}

/// Read stdin lines on a background thread.
///
/// The channel disconnects on EOF or a read error.
pub fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = channel::unbounded();
    let spawned = thread::Builder::new()
        .name("htmlcomb-console".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        log!("error"; "console unavailable: {}", e);
    }
    rx
}

/// Registry, source and server driven by console commands.
pub struct Session {
    pub registry: Arc<ContentRegistry>,
    pub source: Arc<dyn ContentSource>,
    pub server: LocalServer,
    pub combine: CombineConfig,
}

impl Session {
    /// Run one line, logging any error instead of returning it.
    pub fn handle_line(&self, line: &str) -> Flow {
        match parse(line).and_then(|command| self.execute(command)) {
            Ok(flow) => flow,
            Err(e) => {
                log!("error"; "{:#}", e);
                Flow::Continue
            }
        }
    }

    pub fn execute(&self, command: Command) -> Result<Flow> {
        match command {
            Command::Nothing => {}
            Command::List => self.print_items(),
            Command::Add(paths) => self.add(&paths),
            Command::Remove(index) => {
                let item = self.registry.remove(index)?;
                log!("registry"; "removed {}", item.name);
            }
            Command::Move { from, to } => {
                self.registry.move_item(from, to)?;
                self.print_items();
            }
            Command::Enable(index) => self.set_enabled(index, true)?,
            Command::Disable(index) => self.set_enabled(index, false)?,
            Command::SetKind(index, kind) => {
                self.registry.set_kind(index, kind)?;
                log!("registry"; "{} is now {}", self.name_at(index), kind);
            }
            Command::Clear => {
                self.registry.clear();
                log!("registry"; "cleared");
            }
            Command::Combine(path) => {
                let output = path.unwrap_or_else(|| self.combine.output.clone());
                save_combined(&self.registry, self.source.as_ref(), &self.combine.options(), &output)?;
            }
            Command::Preview => match self.server.preview_url() {
                Some(url) => println!("{url}"),
                None => log!("serve"; "server is stopped (type `start`)"),
            },
            Command::Start | Command::Restart => {
                self.server.start()?;
                self.print_preview();
            }
            Command::Stop => self.server.stop(),
            Command::Status => self.print_status(),
            Command::Help => println!("{HELP}"),
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn add(&self, paths: &[PathBuf]) {
        for path in paths {
            match add_file(&self.registry, path, &KindArgs::default()) {
                Ok(Added::At(index)) => {
                    log!("registry"; "added {}. {}", index + 1, self.name_at(index));
                }
                Ok(Added::Duplicate(name)) => log!("warning"; "{} already added", name),
                Err(e) => log!("error"; "{:#}", e),
            }
        }
        warn_collisions(&self.registry);
    }

    fn set_enabled(&self, index: usize, enabled: bool) -> Result<()> {
        self.registry.set_enabled(index, enabled)?;
        let state = if enabled { "enabled" } else { "disabled" };
        log!("registry"; "{} {}", state, self.name_at(index));
        warn_collisions(&self.registry);
        Ok(())
    }

    fn name_at(&self, index: usize) -> String {
        self.registry
            .get(index)
            .map(|item| item.name)
            .unwrap_or_default()
    }

    fn print_items(&self) {
        let items = self.registry.items();
        if items.is_empty() {
            println!("(no files; `add PATH` to register one)");
            return;
        }
        for (i, item) in items.iter().enumerate() {
            let mark = if item.enabled { "x" } else { " " };
            let line = format!("{:>3}. [{mark}] {:<5} {}", i + 1, item.kind.as_str(), item.name);
            if item.enabled {
                println!("{line}");
            } else {
                println!("{}", line.dimmed());
            }
        }
    }

    fn print_preview(&self) {
        if let Some(url) = self.server.preview_url() {
            log!("serve"; "preview: {}", url);
        }
    }

    fn print_status(&self) {
        match self.server.state() {
            ServerState::Running(addr) => {
                log!("serve"; "running on http://{}", addr);
                self.print_preview();
            }
            ServerState::Starting => log!("serve"; "starting"),
            ServerState::Stopped => log!("serve"; "stopped"),
        }
        let enabled = self.registry.enabled_items_in_order().len();
        log!("registry"; "{} of {} files enabled", enabled, self.registry.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServeConfig;
    use crate::source::FsSource;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse("").unwrap(), Command::Nothing);
        assert_eq!(parse("  ls ").unwrap(), Command::List);
        assert_eq!(parse("rm 2").unwrap(), Command::Remove(1));
        assert_eq!(parse("MV 3 1").unwrap(), Command::Move { from: 2, to: 0 });
        assert_eq!(parse("off 1").unwrap(), Command::Disable(0));
        assert_eq!(
            parse("kind 4 css").unwrap(),
            Command::SetKind(3, ContentKind::Css)
        );
        assert_eq!(parse("combine").unwrap(), Command::Combine(None));
        assert_eq!(
            parse("save out/app.html").unwrap(),
            Command::Combine(Some(PathBuf::from("out/app.html")))
        );
        assert_eq!(parse("quit").unwrap(), Command::Quit);
    }

    #[test]
    fn test_parse_quoted_paths() {
        assert_eq!(
            parse(r#"add "my dir/a b.css" c.js"#).unwrap(),
            Command::Add(vec![PathBuf::from("my dir/a b.css"), PathBuf::from("c.js")])
        );
        assert_eq!(split_words(r#"a "" b"#), ["a", "", "b"]);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("rm 0").is_err());
        assert!(parse("rm x").is_err());
        assert!(parse("rm").is_err());
        assert!(parse("add").is_err());
        assert!(parse("kind 1 wasm").is_err());
        assert!(parse("frobnicate").unwrap_err().to_string().contains("unknown command"));
        assert!(parse("stop now").unwrap_err().to_string().contains("wrong arguments"));
    }

    fn session(dir: &TempDir) -> Session {
        let registry = Arc::new(ContentRegistry::new());
        let source: Arc<dyn ContentSource> = Arc::new(FsSource);
        let server = LocalServer::new(
            Arc::clone(&registry),
            Arc::clone(&source),
            ServeConfig {
                port: 0,
                ..ServeConfig::default()
            },
        );
        Session {
            registry,
            source,
            server,
            combine: CombineConfig {
                output: dir.path().join("combined.html"),
                ..CombineConfig::default()
            },
        }
    }

    #[test]
    fn test_session_mutations_and_combine() {
        let dir = TempDir::new().unwrap();
        let css = dir.path().join("a.css");
        let html = dir.path().join("index.html");
        fs::write(&css, ".a{}").unwrap();
        fs::write(&html, "<p>hi</p>").unwrap();
        let session = session(&dir);

        let add = format!("add {} {}", css.display(), html.display());
        assert_eq!(session.handle_line(&add), Flow::Continue);
        // Duplicate add is reported, not registered twice.
        session.handle_line(&format!("add {}", css.display()));
        assert_eq!(session.registry.len(), 2);

        session.handle_line("mv 2 1");
        assert_eq!(session.registry.get(0).unwrap().name, "index.html");

        session.handle_line("off 2");
        assert!(!session.registry.get(1).unwrap().enabled);

        session.handle_line("kind 2 other");
        assert_eq!(session.registry.get(1).unwrap().kind, ContentKind::Other);

        session.handle_line("combine");
        let written = fs::read_to_string(dir.path().join("combined.html")).unwrap();
        assert!(written.contains("<p>hi</p>"));
        assert!(!written.contains(".a{}"));

        session.handle_line("rm 1");
        assert_eq!(session.registry.len(), 1);
        session.handle_line("clear");
        assert!(session.registry.is_empty());

        // Errors are logged and the console keeps going.
        assert_eq!(session.handle_line("rm 5"), Flow::Continue);
        assert_eq!(session.handle_line("quit"), Flow::Quit);
    }

    #[test]
    fn test_session_server_control() {
        let dir = TempDir::new().unwrap();
        let session = session(&dir);

        session.handle_line("start");
        assert!(matches!(session.server.state(), ServerState::Running(_)));
        session.handle_line("restart");
        assert!(matches!(session.server.state(), ServerState::Running(_)));
        session.handle_line("stop");
        assert_eq!(session.server.state(), ServerState::Stopped);
    }
}
