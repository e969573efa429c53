//! Orchestration: maps user [`Action`]s onto the catalog, loader, composer and
//! installer, threading an explicit [`ViewerState`] through every call.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{CatalogEntry, CatalogError, CatalogIndex, EntryKind, SearchResult};
use crate::discovery::{is_font, is_openable_font};
use crate::install::{Credential, Elevator, InstallError, InstallOutcome, InstallPhase, InstallStatus, InstallationManager};
use crate::metadata::{FontHandle, FontMetadataLoader};
use crate::preview::{compose, HeadingText, PreviewDocument, PreviewRequest, Zoom};
use crate::registry::FontRegistry;
use crate::sandbox::SandboxError;

/// What the sidebar currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CatalogView {
    Listing { entries: Vec<CatalogEntry> },
    Search { query: String, hits: Vec<SearchResult> },
}

impl Default for CatalogView {
    fn default() -> Self {
        Self::Listing {
            entries: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub font: FontHandle,
    pub style: String,
}

/// All transient UI state. Owned by the front end and handed back on every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerState {
    pub root: PathBuf,
    pub current_dir: PathBuf,
    pub view: CatalogView,
    pub selected: Option<Selection>,
    pub zoom: Zoom,
    pub caps: bool,
    pub heading: HeadingText,
}

impl ViewerState {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            current_dir: root.clone(),
            root,
            view: CatalogView::default(),
            selected: None,
            zoom: Zoom::default(),
            caps: false,
            heading: HeadingText::Default,
        }
    }

    pub fn is_searching(&self) -> bool {
        matches!(self.view, CatalogView::Search { .. })
    }

    pub fn selected_path(&self) -> Option<&Path> {
        self.selected.as_ref().map(|s| s.font.source_path.as_path())
    }

    /// The request the current preview is drawn from, if a font is selected.
    pub fn preview_request(&self) -> Option<PreviewRequest> {
        self.selected.as_ref().map(|sel| PreviewRequest {
            family: sel.font.family.clone(),
            style: sel.style.clone(),
            zoom: self.zoom,
            caps: self.caps,
            heading: self.heading.clone(),
        })
    }

    /// Address bar text.
    pub fn address(&self) -> String {
        if let CatalogView::Search { query, .. } = &self.view {
            return format!("Searching: {query}");
        }
        match self.selected_path() {
            Some(path) if !path.starts_with(&self.root) => format!("Viewing: {}", path.display()),
            _ => self.current_dir.display().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadingEdit {
    Set(String),
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Open a directory, relative to the current one or absolute.
    NavigateTo(PathBuf),
    NavigateUp,
    NavigateHome,
    /// Search the whole collection; an empty query returns to the listing.
    Search(String),
    /// Click on an entry of the current listing or search results, by name.
    Activate(String),
    /// Load a font inside the collection, relative to the current directory or absolute.
    SelectFont(PathBuf),
    /// Load a font from anywhere ("open with"); not confined to the collection.
    OpenExternal(PathBuf),
    ChangeStyle(String),
    ToggleCaps,
    EditHeading(HeadingEdit),
    ChangeZoom(i64),
    Install(Credential),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub severity: Severity,
    pub title: String,
    pub message: String,
}

impl Notice {
    fn new(severity: Severity, title: &str, message: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.to_string(),
            message: message.into(),
        }
    }
}

/// Something the front end should reflect after a dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The sidebar contents or the address changed.
    ViewChanged,
    Preview(PreviewDocument),
    PreviewCleared,
    Status(InstallStatus),
    InstallProgress(InstallPhase),
    Notice(Notice),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub state: ViewerState,
    pub events: Vec<Event>,
}

impl Step {
    fn new(state: ViewerState) -> Self {
        Self {
            state,
            events: Vec::new(),
        }
    }

    fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    fn notice(&mut self, severity: Severity, title: &str, message: impl Into<String>) {
        self.events.push(Event::Notice(Notice::new(severity, title, message)));
    }

    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.events.iter().filter_map(|e| match e {
            Event::Notice(n) => Some(n),
            _ => None,
        })
    }

    pub fn preview(&self) -> Option<&PreviewDocument> {
        self.events.iter().rev().find_map(|e| match e {
            Event::Preview(doc) => Some(doc),
            _ => None,
        })
    }
}

pub struct Viewer<R, E> {
    catalog: CatalogIndex,
    loader: FontMetadataLoader<R>,
    installer: InstallationManager<E>,
}

impl<R: FontRegistry, E: Elevator> Viewer<R, E> {
    pub fn new(catalog: CatalogIndex, loader: FontMetadataLoader<R>, installer: InstallationManager<E>) -> Self {
        Self {
            catalog,
            loader,
            installer,
        }
    }

    pub fn loader(&self) -> &FontMetadataLoader<R> {
        &self.loader
    }

    pub fn registry(&self) -> &R {
        self.loader.registry()
    }

    /// Fresh state listing the root, then the optional "open with" font.
    pub fn start(&mut self, startup: Option<&Path>) -> Step {
        let root = self.catalog.sandbox().root().to_path_buf();
        let mut step = self.dispatch(ViewerState::new(&root), Action::NavigateHome);
        if let Some(path) = startup {
            if is_openable_font(path) {
                let next = self.dispatch(step.state, Action::OpenExternal(path.to_path_buf()));
                step.state = next.state;
                step.events.extend(next.events);
            } else {
                debug!(path = %path.display(), "ignoring startup argument");
            }
        }
        step
    }

    pub fn status(&self, state: &ViewerState) -> InstallStatus {
        self.installer.check_status(state.selected_path())
    }

    pub fn dispatch(&mut self, state: ViewerState, action: Action) -> Step {
        debug!(?action, "dispatch");
        match action {
            Action::NavigateTo(target) => {
                let dir = state.current_dir.join(target);
                self.navigate(state, dir)
            }
            Action::NavigateUp => match self.catalog.sandbox().parent(&state.current_dir) {
                Ok(parent) => self.navigate(state, parent),
                Err(err) => denied(state, &err),
            },
            Action::NavigateHome => {
                let root = self.catalog.sandbox().root().to_path_buf();
                self.navigate(state, root)
            }
            Action::Search(query) => self.search(state, query),
            Action::Activate(name) => self.activate(state, &name),
            Action::SelectFont(target) => {
                let candidate = state.current_dir.join(target);
                match self.catalog.sandbox().resolve(candidate) {
                    Ok(path) => self.load_font(state, &path),
                    Err(err) => denied(state, &err),
                }
            }
            Action::OpenExternal(path) => {
                if is_openable_font(&path) {
                    self.load_font(state, &path)
                } else {
                    let mut step = Step::new(state);
                    step.notice(
                        Severity::Error,
                        "Error",
                        format!("{} is not a font file", path.display()),
                    );
                    step
                }
            }
            Action::ChangeStyle(style) => {
                let mut step = Step::new(state);
                match step.state.selected.as_mut() {
                    Some(sel) if sel.font.has_style(&style) => {
                        sel.style = style;
                        refresh_preview(&mut step);
                    }
                    Some(_) => step.notice(Severity::Warning, "Style", format!("no style named {style}")),
                    None => {}
                }
                step
            }
            Action::ToggleCaps => {
                let mut step = Step::new(state);
                step.state.caps = !step.state.caps;
                refresh_preview(&mut step);
                step
            }
            Action::EditHeading(edit) => {
                let mut step = Step::new(state);
                match edit {
                    HeadingEdit::Set(text) => step.state.heading = HeadingText::Custom(text),
                    HeadingEdit::Reset => step.state.heading.reset(),
                }
                refresh_preview(&mut step);
                step
            }
            Action::ChangeZoom(percent) => {
                let mut step = Step::new(state);
                step.state.zoom = Zoom::new(percent);
                refresh_preview(&mut step);
                step
            }
            Action::Install(credential) => self.install(state, &credential),
        }
    }

    fn navigate(&mut self, state: ViewerState, dir: PathBuf) -> Step {
        let mut step = Step::new(state);
        let entries = match self.catalog.list(&dir) {
            Ok(entries) => entries,
            Err(CatalogError::Sandbox(err)) => return denied(step.state, &err),
            Err(err) => {
                step.notice(Severity::Error, "Error", err.to_string());
                return step;
            }
        };

        // Confined by the successful listing above.
        step.state.current_dir = self
            .catalog
            .sandbox()
            .resolve(&dir)
            .unwrap_or_else(|_| step.state.root.clone());
        step.state.view = CatalogView::Listing { entries };
        step.state.selected = None;
        self.loader.unload();

        step.push(Event::ViewChanged);
        step.push(Event::PreviewCleared);
        step.push(Event::Status(InstallStatus::NotSelected));
        step
    }

    fn search(&mut self, state: ViewerState, query: String) -> Step {
        if query.is_empty() {
            let dir = state.current_dir.clone();
            return self.navigate(state, dir);
        }

        let hits = self.catalog.search(&query);
        let mut step = Step::new(state);
        step.state.view = CatalogView::Search { query, hits };
        step.push(Event::ViewChanged);
        step
    }

    fn activate(&mut self, state: ViewerState, name: &str) -> Step {
        match &state.view {
            CatalogView::Search { hits, .. } => {
                let hit = hits
                    .iter()
                    .find(|h| h.relative_path == Path::new(name))
                    .or_else(|| hits.iter().find(|h| h.display_name == name));
                match hit.map(|h| h.resolve(self.catalog.sandbox())) {
                    Some(Ok(path)) if path.exists() => self.load_font(state, &path),
                    Some(Err(err)) => denied(state, &err),
                    _ => missing(state, name),
                }
            }
            CatalogView::Listing { entries } => {
                let kind = entries.iter().find(|e| e.name == name).map(|e| e.kind);
                match kind {
                    Some(EntryKind::Folder) => {
                        let dir = state.current_dir.join(name);
                        self.navigate(state, dir)
                    }
                    Some(EntryKind::FontFile) => {
                        let path = state.current_dir.join(name);
                        if path.exists() && is_font(&path) {
                            self.load_font(state, &path)
                        } else {
                            missing(state, name)
                        }
                    }
                    Some(EntryKind::Denied) => Step::new(state),
                    None => missing(state, name),
                }
            }
        }
    }

    fn load_font(&mut self, state: ViewerState, path: &Path) -> Step {
        let mut step = Step::new(state);
        let handle = match self.loader.load(path) {
            Ok(handle) => handle.clone(),
            Err(err) => {
                step.notice(Severity::Error, "Error", err.to_string());
                return step;
            }
        };

        let style = handle.default_style().to_string();
        step.state.selected = Some(Selection {
            font: handle,
            style,
        });
        step.push(Event::ViewChanged);
        refresh_preview(&mut step);
        step.push(Event::Status(self.status(&step.state)));
        step
    }

    fn install(&mut self, state: ViewerState, credential: &Credential) -> Step {
        let mut step = Step::new(state);
        let mut phases = Vec::new();
        let result = self
            .installer
            .install(step.state.selected_path(), credential, &mut |phase| phases.push(phase));
        step.events
            .extend(phases.into_iter().map(Event::InstallProgress));

        match result {
            Ok(InstallOutcome::Cancelled) => return step,
            Ok(InstallOutcome::Installed { destination }) => {
                let name = destination
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                step.notice(
                    Severity::Info,
                    "Success",
                    format!("Font '{name}' installed successfully!"),
                );
            }
            Ok(InstallOutcome::CacheRefreshFailed { destination, diagnostic }) => {
                step.notice(
                    Severity::Warning,
                    "Font Cache",
                    format!(
                        "{} was installed but the font cache could not be refreshed:\n{diagnostic}",
                        destination.display()
                    ),
                );
            }
            Ok(InstallOutcome::CopyFailed { diagnostic }) => {
                step.notice(
                    Severity::Error,
                    "Installation Failed",
                    format!("Error copying file:\n{diagnostic}"),
                );
            }
            Err(InstallError::NotSelected) => return step,
            Err(err) => {
                step.notice(Severity::Warning, "Install Font", err.to_string());
                return step;
            }
        }

        step.push(Event::Status(self.status(&step.state)));
        step
    }
}

fn refresh_preview(step: &mut Step) {
    if let Some(request) = step.state.preview_request() {
        step.push(Event::Preview(compose(&request)));
    }
}

fn denied(state: ViewerState, err: &SandboxError) -> Step {
    let mut step = Step::new(state);
    step.notice(Severity::Warning, "Access Denied", err.to_string());
    step
}

fn missing(state: ViewerState, name: &str) -> Step {
    let mut step = Step::new(state);
    step.notice(Severity::Warning, "Not Found", format!("no entry named {name}"));
    step
}

#[cfg(feature = "fontations")]
mod defaults {
    use anyhow::Result;

    use super::Viewer;
    use crate::catalog::CatalogIndex;
    use crate::config::ViewerConfig;
    use crate::install::{InstallationManager, SudoElevator};
    use crate::metadata::FontMetadataLoader;
    use crate::registry::SfntRegistry;
    use crate::sandbox::PathSandbox;

    impl Viewer<SfntRegistry, SudoElevator> {
        /// Production wiring: sfnt registry, `sudo` elevation, root created if missing.
        pub fn from_config(config: &ViewerConfig) -> Result<Self> {
            config.ensure_root()?;
            let sandbox = PathSandbox::new(&config.root)?;
            Ok(Self::new(
                CatalogIndex::new(sandbox).follow_symlinks(config.follow_symlinks),
                FontMetadataLoader::new(SfntRegistry::new()),
                InstallationManager::new(
                    &config.system_font_dir,
                    config.cache_command(),
                    SudoElevator::new(),
                ),
            ))
        }
    }
}
