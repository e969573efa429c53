//! Font-metadata capability: register font bytes, enumerate families and styles,
//! and hand out drawable face references.
//!
//! [`FontRegistry`] is the seam the loader and the rendering surface talk to;
//! [`SfntRegistry`] is the default implementation built on read-fonts/skrifa.

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[cfg(feature = "fontations")]
pub use sfnt::SfntRegistry;

/// Opaque id of one successful registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegistrationId(pub u64);

/// What a registration exposed: its id and the family names it contains, in
/// face order, without duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub id: RegistrationId,
    pub families: Vec<String>,
}

/// A face that a rendering surface can draw with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontFace {
    pub registration: RegistrationId,
    pub family: String,
    pub style: String,
    pub point_size: f32,
    /// Face index inside a collection file, `None` for single-face files.
    pub collection_index: Option<u32>,
}

pub trait FontRegistry {
    /// Register raw font bytes. Fails when the bytes hold no usable face.
    fn register(&mut self, data: Vec<u8>) -> Result<Registration>;

    /// Style names of `family` among the faces registered under `id`, in face
    /// order. Other registrations of the same family are not consulted.
    fn styles(&self, id: RegistrationId, family: &str) -> Result<Vec<String>>;

    /// Drawable reference for `family` + `style` at `point_size`, if registered.
    fn face(&self, family: &str, style: &str, point_size: f32) -> Option<FontFace>;

    /// Drop every face that came from `id`. Unknown ids are ignored.
    fn release(&mut self, id: RegistrationId);
}

#[cfg(feature = "fontations")]
mod sfnt {
    use anyhow::{anyhow, Result};
    use read_fonts::tables::name::NameId;
    use read_fonts::{FontRef, TableProvider};
    use skrifa::attribute::Style;
    use skrifa::{FontRef as SkrifaFontRef, MetadataProvider};
    use tracing::debug;

    use super::{FontFace, FontRegistry, Registration, RegistrationId};

    const ENGLISH_US: u16 = 0x0409;

    #[derive(Debug, Clone)]
    struct RegisteredFace {
        registration: RegistrationId,
        family: Option<String>,
        style: String,
        collection_index: Option<u32>,
    }

    /// In-memory registry of sfnt faces (TrueType, OpenType and their collections).
    ///
    /// WOFF and WOFF2 containers are compressed and are not unpacked here, so they
    /// fail registration.
    #[derive(Debug, Default)]
    pub struct SfntRegistry {
        faces: Vec<RegisteredFace>,
        next_id: u64,
    }

    impl SfntRegistry {
        pub fn new() -> Self {
            Self::default()
        }

        /// Number of faces currently held, across all registrations.
        pub fn face_count(&self) -> usize {
            self.faces.len()
        }
    }

    impl FontRegistry for SfntRegistry {
        fn register(&mut self, data: Vec<u8>) -> Result<Registration> {
            let id = RegistrationId(self.next_id);
            let mut parsed = Vec::new();

            for font in FontRef::fonts(&data) {
                let font = match font {
                    Ok(font) => font,
                    Err(err) => {
                        debug!(error = %err, "skipping unparsable face");
                        continue;
                    }
                };
                let collection_index = font.ttc_index();
                let sfont = match collection_index {
                    Some(idx) => SkrifaFontRef::from_index(&data, idx),
                    None => SkrifaFontRef::new(&data),
                };
                let sfont = match sfont {
                    Ok(sfont) => sfont,
                    Err(err) => {
                        debug!(error = %err, ?collection_index, "skipping face without attributes");
                        continue;
                    }
                };

                parsed.push(RegisteredFace {
                    registration: id,
                    family: family_name(&font),
                    style: style_name(&font).unwrap_or_else(|| derived_style(&sfont)),
                    collection_index,
                });
            }

            if parsed.is_empty() {
                return Err(anyhow!("no readable font faces in {} bytes", data.len()));
            }

            self.next_id += 1;
            let mut families: Vec<String> = Vec::new();
            for face in &parsed {
                if let Some(family) = &face.family {
                    if !families.contains(family) {
                        families.push(family.clone());
                    }
                }
            }
            debug!(id = id.0, faces = parsed.len(), ?families, "registered font data");
            self.faces.extend(parsed);

            Ok(Registration { id, families })
        }

        fn styles(&self, id: RegistrationId, family: &str) -> Result<Vec<String>> {
            let mut styles: Vec<String> = Vec::new();
            for face in self.faces_of(family).filter(|face| face.registration == id) {
                if !styles.contains(&face.style) {
                    styles.push(face.style.clone());
                }
            }
            if styles.is_empty() {
                return Err(anyhow!("family {family} not registered under id {}", id.0));
            }
            Ok(styles)
        }

        fn face(&self, family: &str, style: &str, point_size: f32) -> Option<FontFace> {
            // Latest registration wins when the same family was loaded twice.
            self.faces_of(family)
                .filter(|face| face.style == style)
                .last()
                .map(|face| FontFace {
                    registration: face.registration,
                    family: family.to_string(),
                    style: face.style.clone(),
                    point_size,
                    collection_index: face.collection_index,
                })
        }

        fn release(&mut self, id: RegistrationId) {
            let before = self.faces.len();
            self.faces.retain(|face| face.registration != id);
            debug!(id = id.0, released = before - self.faces.len(), "released registration");
        }
    }

    impl SfntRegistry {
        fn faces_of<'a>(&'a self, family: &'a str) -> impl Iterator<Item = &'a RegisteredFace> + 'a {
            self.faces
                .iter()
                .filter(move |face| face.family.as_deref() == Some(family))
        }
    }

    fn family_name(font: &FontRef) -> Option<String> {
        find_name(font, NameId::TYPOGRAPHIC_FAMILY_NAME)
            .or_else(|| find_name(font, NameId::FAMILY_NAME))
    }

    fn style_name(font: &FontRef) -> Option<String> {
        find_name(font, NameId::TYPOGRAPHIC_SUBFAMILY_NAME)
            .or_else(|| find_name(font, NameId::SUBFAMILY_NAME))
    }

    /// First non-blank unicode string for `id`, preferring US English records.
    fn find_name(font: &FontRef, id: NameId) -> Option<String> {
        let name_table = font.name().ok()?;
        let data = name_table.string_data();
        let mut fallback = None;

        for record in name_table.name_record() {
            if !record.is_unicode() || record.name_id() != id {
                continue;
            }
            let Ok(entry) = record.string(data) else {
                continue;
            };
            let rendered = entry.to_string().trim().to_string();
            if rendered.is_empty() {
                continue;
            }
            if record.language_id() == ENGLISH_US {
                return Some(rendered);
            }
            fallback.get_or_insert(rendered);
        }

        fallback
    }

    /// Style label built from OS/2 attributes for faces without a subfamily name.
    fn derived_style(font: &SkrifaFontRef) -> String {
        let attrs = font.attributes();
        let weight = match attrs.weight.value().round() as i32 {
            w if w >= 800 => Some("Black"),
            w if w >= 650 => Some("Bold"),
            w if w >= 550 => Some("SemiBold"),
            w if w >= 450 => Some("Medium"),
            w if w >= 350 => None,
            _ => Some("Light"),
        };
        let slant = match attrs.style {
            Style::Normal => None,
            Style::Italic => Some("Italic"),
            _ => Some("Oblique"),
        };

        match (weight, slant) {
            (None, None) => "Regular".to_string(),
            (Some(w), None) => w.to_string(),
            (None, Some(s)) => s.to_string(),
            (Some(w), Some(s)) => format!("{w} {s}"),
        }
    }
}
