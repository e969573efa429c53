//! fontview CLI: a line-oriented front end over fontview-core.

use std::env;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueHint};
use crossterm::event::{self, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use fontview_core::catalog::EntryKind;
use fontview_core::config::ViewerConfig;
use fontview_core::controller::{
    Action, CatalogView, Event, HeadingEdit, Notice, Severity, Step, Viewer, ViewerState,
};
use fontview_core::install::{Credential, Elevator, InstallPhase, InstallStatus};
use fontview_core::output::{write_json_pretty, write_ndjson};
use fontview_core::preview::{compose, present, Presented, TextSurface};
use fontview_core::registry::FontRegistry;

/// CLI entrypoint for fontview.
#[derive(Debug, Parser)]
#[command(
    name = "fontview",
    about = "Browse a font collection, preview faces and install them"
)]
pub struct Cli {
    /// Font file to open on startup, from anywhere on disk
    #[arg(value_hint = ValueHint::FilePath)]
    font: Option<PathBuf>,
}

const HELP: &str = "\
commands:
  ls                 show the current listing or search results
  cd <dir>           open a folder (relative or absolute)
  up                 go to the parent folder
  home               go to the collection root
  search <text>      search the whole collection; empty text clears
  open <name>        open a folder or font from the listing or results
  style <name>       switch the previewed style
  caps               toggle capitalized heading
  heading <text>     set the heading sentence
  heading-reset      restore the default heading
  zoom <percent>     heading zoom, 50 to 200
  status             show whether the selected font is installed
  install            install the selected font (password on the next line)
  state              print the viewer state as JSON
  json               print the current preview document as JSON
  list-json          print the listing or results as NDJSON
  help               show this text
  quit               leave";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Ls,
    Cd(String),
    Up,
    Home,
    Search(String),
    Open(String),
    Style(String),
    Caps,
    Heading(String),
    HeadingReset,
    Zoom(i64),
    Status,
    Install,
    State,
    Json,
    ListJson,
    Help,
    Quit,
}

/// Parse CLI args, then run the interactive session on stdin/stdout.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = ViewerConfig::from_env();
    debug!(?config, "resolved configuration");
    let mut viewer = Viewer::from_config(&config)?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let terminal = stdout.is_terminal() && stdin.is_terminal();
    let opts = SessionOptions {
        color: terminal,
        prompt: terminal,
        masked: terminal,
        width: env::var("COLUMNS").ok().and_then(|raw| raw.trim().parse().ok()),
    };

    run_session(
        &mut viewer,
        cli.font.as_deref(),
        stdin.lock(),
        stdout.lock(),
        opts,
    )
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // A subscriber installed by an embedding test harness wins.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

#[derive(Debug, Clone, Copy, Default)]
struct SessionOptions {
    color: bool,
    prompt: bool,
    /// Read the install password from the terminal with echo off.
    masked: bool,
    /// Preview wrap width; the surface default when unset.
    width: Option<usize>,
}

fn run_session<R: FontRegistry, E: Elevator>(
    viewer: &mut Viewer<R, E>,
    startup: Option<&Path>,
    mut input: impl BufRead,
    mut out: impl Write,
    opts: SessionOptions,
) -> Result<()> {
    let step = viewer.start(startup);
    let mut state = render_step(viewer, None, step, &mut out, opts)?;

    let mut line = String::new();
    loop {
        if opts.prompt {
            write!(out, "fontview> ")?;
            out.flush()?;
        }
        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                writeln!(out, "error: {err:#}")?;
                continue;
            }
        };

        let action = match command {
            Command::Quit => break,
            Command::Help => {
                writeln!(out, "{HELP}")?;
                continue;
            }
            Command::Ls => {
                write_view(&state, &mut out, opts.color)?;
                continue;
            }
            Command::Status => {
                writeln!(out, "status: {}", status_label(viewer.status(&state)))?;
                continue;
            }
            Command::State => {
                write_json_pretty(&state, &mut out)?;
                continue;
            }
            Command::Json => {
                match state.preview_request() {
                    Some(request) => write_json_pretty(&compose(&request), &mut out)?,
                    None => writeln!(out, "no font selected")?,
                }
                continue;
            }
            Command::ListJson => {
                match &state.view {
                    CatalogView::Listing { entries } => write_ndjson(entries, &mut out)?,
                    CatalogView::Search { hits, .. } => write_ndjson(hits, &mut out)?,
                }
                continue;
            }
            Command::Install => {
                if state.selected.is_none() {
                    writeln!(out, "no font selected")?;
                    continue;
                }
                if opts.prompt {
                    write!(out, "Password: ")?;
                    out.flush()?;
                }
                let credential = if opts.masked {
                    let credential = read_masked_credential()?;
                    writeln!(out)?;
                    credential
                } else {
                    read_credential(&mut input)?
                };
                Action::Install(credential)
            }
            Command::Cd(dir) => Action::NavigateTo(PathBuf::from(dir)),
            Command::Up => Action::NavigateUp,
            Command::Home => Action::NavigateHome,
            Command::Search(query) => Action::Search(query),
            Command::Open(name) => Action::Activate(name),
            Command::Style(style) => Action::ChangeStyle(style),
            Command::Caps => Action::ToggleCaps,
            Command::Heading(text) => Action::EditHeading(HeadingEdit::Set(text)),
            Command::HeadingReset => Action::EditHeading(HeadingEdit::Reset),
            Command::Zoom(percent) => Action::ChangeZoom(percent),
        };

        let previous = state.view.clone();
        let step = viewer.dispatch(state, action);
        state = render_step(viewer, Some(&previous), step, &mut out, opts)?;
    }

    Ok(())
}

fn parse_command(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let required = |what: &str| -> Result<String> {
        if rest.is_empty() {
            Err(anyhow!("{word} needs {what}"))
        } else {
            Ok(rest.to_string())
        }
    };

    let command = match word {
        "ls" => Command::Ls,
        "cd" => Command::Cd(required("a directory")?),
        "up" => Command::Up,
        "home" => Command::Home,
        "search" => Command::Search(rest.to_string()),
        "open" => Command::Open(required("an entry name")?),
        "style" => Command::Style(required("a style name")?),
        "caps" => Command::Caps,
        "heading" => Command::Heading(rest.to_string()),
        "heading-reset" => Command::HeadingReset,
        "zoom" => {
            let raw = required("a percentage")?;
            let percent = raw
                .trim_end_matches('%')
                .parse::<i64>()
                .with_context(|| format!("invalid zoom: {raw}"))?;
            Command::Zoom(percent)
        }
        "status" => Command::Status,
        "install" => Command::Install,
        "state" => Command::State,
        "json" => Command::Json,
        "list-json" => Command::ListJson,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(anyhow!("unknown command: {other} (try help)")),
    };
    Ok(Some(command))
}

/// Next input line without its line ending. End of input cancels.
fn read_credential(input: &mut impl BufRead) -> Result<Credential> {
    let mut buf = String::new();
    input.read_line(&mut buf)?;
    let secret = buf.trim_end_matches(['\r', '\n']);
    Ok(Credential::new(secret))
}

/// Password read key by key in raw mode, so nothing is echoed.
/// Escape or Ctrl-C cancels with an empty credential.
fn read_masked_credential() -> Result<Credential> {
    let _raw = RawMode::enable()?;
    let mut secret = String::new();
    loop {
        let event::Event::Key(key) = event::read().context("reading password")? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match edit_secret(&mut secret, key) {
            SecretEdit::Continue => {}
            SecretEdit::Submit => return Ok(Credential::new(secret)),
            SecretEdit::Cancel => return Ok(Credential::new("")),
        }
    }
}

struct RawMode;

impl RawMode {
    fn enable() -> Result<Self> {
        terminal::enable_raw_mode().context("disabling terminal echo")?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if let Err(err) = terminal::disable_raw_mode() {
            debug!(error = %err, "could not restore terminal mode");
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum SecretEdit {
    Continue,
    Submit,
    Cancel,
}

fn edit_secret(secret: &mut String, key: KeyEvent) -> SecretEdit {
    let control = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Enter => SecretEdit::Submit,
        KeyCode::Esc => SecretEdit::Cancel,
        KeyCode::Char('c') | KeyCode::Char('d') if control => SecretEdit::Cancel,
        KeyCode::Char('u') if control => {
            secret.clear();
            SecretEdit::Continue
        }
        KeyCode::Char(c) if !control => {
            secret.push(c);
            SecretEdit::Continue
        }
        KeyCode::Backspace => {
            secret.pop();
            SecretEdit::Continue
        }
        _ => SecretEdit::Continue,
    }
}

fn render_step<R: FontRegistry, E: Elevator>(
    viewer: &Viewer<R, E>,
    previous: Option<&CatalogView>,
    step: Step,
    mut out: impl Write,
    opts: SessionOptions,
) -> Result<ViewerState> {
    for event in &step.events {
        match event {
            Event::ViewChanged => {
                let address = format!("== {} ==", step.state.address());
                writeln!(out, "{}", apply_color(&address, opts.color, AnsiColor::Green))?;
                if previous != Some(&step.state.view) {
                    write_view(&step.state, &mut out, opts.color)?;
                }
            }
            Event::Preview(document) => {
                let mut surface = TextSurface::new(&mut out, viewer.registry());
                if let Some(width) = opts.width {
                    surface = surface.width(width);
                }
                if let Presented::Diagnostic(err) = present(document, &mut surface) {
                    debug!(error = %err, "preview replaced by diagnostic");
                }
            }
            Event::PreviewCleared => {}
            Event::Status(status) => {
                if *status != InstallStatus::NotSelected {
                    writeln!(out, "status: {}", status_label(*status))?;
                }
            }
            Event::InstallProgress(InstallPhase::Copying) => writeln!(out, "Installing font...")?,
            Event::InstallProgress(phase) => debug!(?phase, "install progress"),
            Event::Notice(notice) => write_notice(notice, &mut out, opts.color)?,
        }
    }
    Ok(step.state)
}

fn write_view(state: &ViewerState, mut w: impl Write, color: bool) -> Result<()> {
    match &state.view {
        CatalogView::Listing { entries } => {
            if entries.is_empty() {
                writeln!(w, "(empty)")?;
            }
            for entry in entries {
                let rendered = match entry.kind {
                    EntryKind::Folder => {
                        apply_color(&format!("{}/", entry.name), color, AnsiColor::Cyan)
                    }
                    EntryKind::FontFile => apply_color(&entry.name, color, AnsiColor::Yellow),
                    EntryKind::Denied => apply_color(&entry.name, color, AnsiColor::Red),
                };
                writeln!(w, "  {rendered}")?;
            }
        }
        CatalogView::Search { hits, .. } => {
            if hits.is_empty() {
                writeln!(w, "(no matches)")?;
            }
            for hit in hits {
                let path = hit.relative_path.display().to_string();
                writeln!(w, "  {}", apply_color(&path, color, AnsiColor::Yellow))?;
            }
        }
    }
    Ok(())
}

fn write_notice(notice: &Notice, mut w: impl Write, color: bool) -> Result<()> {
    let (label, code) = match notice.severity {
        Severity::Info => ("info", AnsiColor::Green),
        Severity::Warning => ("warning", AnsiColor::Yellow),
        Severity::Error => ("error", AnsiColor::Red),
    };
    writeln!(
        w,
        "[{}] {}: {}",
        apply_color(label, color, code),
        notice.title,
        notice.message
    )?;
    Ok(())
}

fn status_label(status: InstallStatus) -> &'static str {
    match status {
        InstallStatus::NotSelected => "no font selected",
        InstallStatus::NotInstalled => "not installed",
        InstallStatus::Installed => "installed",
    }
}

#[derive(Copy, Clone)]
enum AnsiColor {
    Cyan,
    Yellow,
    Green,
    Red,
}

fn apply_color(text: &str, color: bool, code: AnsiColor) -> String {
    if !color {
        return text.to_string();
    }

    let code_str = match code {
        AnsiColor::Cyan => "36",
        AnsiColor::Yellow => "33",
        AnsiColor::Green => "32",
        AnsiColor::Red => "31",
    };

    format!("\u{1b}[{}m{}\u{1b}[0m", code_str, text)
}
