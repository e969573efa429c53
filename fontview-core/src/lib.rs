//! fontview-core: browse a font collection, preview a face, install it.
//!
//! Think of a small specimen shop: a locked room full of font files, a counter
//! where any one of them is set in type for you, and a back door to the
//! system font store that only opens with the right password.
//!
//! ## The Pieces
//!
//! **Browsing** keeps you inside the room
//! - [`sandbox::PathSandbox`] normalizes every path and refuses anything outside the root
//! - [`catalog::CatalogIndex`] lists folders before fonts, and searches the whole tree by name
//!
//! **Loading** gets to know one font at a time
//! - [`metadata::FontMetadataLoader`] reads a file and asks a [`registry::FontRegistry`]
//!   for its family and styles, releasing the previous font when a new one arrives
//!
//! **Previewing** sets the specimen page
//! - [`preview::compose`] lays out a style label, a zoomable heading, a body passage
//!   and a glyph-stress footer; [`preview::present`] hands it to a surface and
//!   swaps in a diagnostic if drawing fails
//!
//! **Installing** goes through the back door
//! - [`install::InstallationManager`] copies the file with elevated rights and
//!   rebuilds the font cache, reporting each phase as it goes
//!
//! [`controller::Viewer`] ties the pieces together behind a single `dispatch`.
//!
//! ## A Short Visit
//!
//! ```rust,no_run
//! use fontview_core::config::ViewerConfig;
//! use fontview_core::controller::{Action, Viewer};
//!
//! let config = ViewerConfig::from_env();
//! let mut viewer = Viewer::from_config(&config)?;
//!
//! let step = viewer.start(None);
//! let step = viewer.dispatch(step.state, Action::Search("sans".into()));
//! println!("{}", step.state.address());
//! #
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod catalog;
pub mod config;
pub mod controller;
pub mod discovery;
pub mod install;
pub mod metadata;
pub mod output;
pub mod preview;
pub mod registry;
pub mod sandbox;
