//! Family and style extraction from real sfnt bytes.

#![cfg(feature = "fontations")]

mod common;

use common::{
    sfnt, sfnt_with_names, write_font, FAMILY, SUBFAMILY, TYPOGRAPHIC_FAMILY, TYPOGRAPHIC_SUBFAMILY,
};
use fontview_core::metadata::{FontMetadataLoader, LoadError, FALLBACK_STYLE};
use fontview_core::preview::{compose, present, PreviewRequest, Presented, TextSurface};
use fontview_core::registry::{FontRegistry, RegistrationId, SfntRegistry};

#[test]
fn registry_reports_family_and_style() {
    let mut registry = SfntRegistry::new();
    let registration = registry.register(sfnt("Inter", "Bold")).expect("register");

    assert_eq!(registration.families, vec!["Inter"]);
    assert_eq!(registry.styles(registration.id, "Inter").expect("styles"), vec!["Bold"]);

    let face = registry.face("Inter", "Bold", 24.0).expect("face");
    assert_eq!(face.registration, registration.id);
    assert_eq!(face.point_size, 24.0);
    assert_eq!(face.collection_index, None);
    assert!(registry.face("Inter", "Italic", 24.0).is_none());
}

#[test]
fn typographic_names_win_over_legacy_names() {
    let mut registry = SfntRegistry::new();
    let bytes = sfnt_with_names(&[
        (FAMILY, "Source Serif Semibold"),
        (SUBFAMILY, "Regular"),
        (TYPOGRAPHIC_FAMILY, "Source Serif"),
        (TYPOGRAPHIC_SUBFAMILY, "Semibold"),
    ]);

    let registration = registry.register(bytes).expect("register");
    assert_eq!(registration.families, vec!["Source Serif"]);
    assert_eq!(registry.styles(registration.id, "Source Serif").unwrap(), vec!["Semibold"]);
}

#[test]
fn missing_subfamily_derives_regular() {
    let mut registry = SfntRegistry::new();
    let registration = registry
        .register(sfnt_with_names(&[(FAMILY, "Plain")]))
        .expect("register");

    assert_eq!(registry.styles(registration.id, "Plain").unwrap(), vec!["Regular"]);
}

#[test]
fn garbage_bytes_do_not_register() {
    let mut registry = SfntRegistry::new();
    assert!(registry.register(b"definitely not a font".to_vec()).is_err());
    assert!(registry.styles(RegistrationId(0), "anything").is_err());
}

#[test]
fn release_forgets_faces() {
    let mut registry = SfntRegistry::new();
    let first = registry.register(sfnt("Inter", "Regular")).unwrap();
    registry.register(sfnt("Lora", "Italic")).unwrap();
    assert_eq!(registry.face_count(), 2);

    registry.release(first.id);
    assert_eq!(registry.face_count(), 1);
    assert!(registry.styles(first.id, "Inter").is_err());
    assert!(registry.face("Lora", "Italic", 13.0).is_some());
}

#[test]
fn loader_reports_no_family_for_nameless_font() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = write_font(temp.path(), "Nameless.ttf", &sfnt_with_names(&[(SUBFAMILY, "Bold")]));
    let mut loader = FontMetadataLoader::new(SfntRegistry::new());

    let err = loader.load(&path).expect_err("no family");
    assert!(matches!(err, LoadError::NoFamily { .. }));
    assert_eq!(loader.registry().face_count(), 0);
}

#[test]
fn loader_reports_unreadable_for_woff_container() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = write_font(temp.path(), "Packed.woff2", b"wOF2\0\0\0\0");
    let mut loader = FontMetadataLoader::new(SfntRegistry::new());

    let err = loader.load(&path).expect_err("unreadable");
    assert!(matches!(err, LoadError::Unreadable { .. }));
}

#[test]
fn loading_a_second_font_releases_the_first() {
    let temp = tempfile::tempdir().expect("tempdir");
    let a = write_font(temp.path(), "A.ttf", &sfnt("Alpha", "Regular"));
    let b = write_font(temp.path(), "B.ttf", &sfnt("Beta", "Bold"));
    let mut loader = FontMetadataLoader::new(SfntRegistry::new());

    loader.load(&a).expect("a");
    let handle = loader.load(&b).expect("b");
    assert_eq!(handle.family, "Beta");
    assert_eq!(handle.available_styles, vec!["Bold"]);

    assert_eq!(loader.registry().face_count(), 1);
    assert!(loader.registry().face("Alpha", "Regular", 13.0).is_none());
}

#[test]
fn reloading_the_same_font_keeps_one_registration() {
    let temp = tempfile::tempdir().expect("tempdir");
    let a = write_font(temp.path(), "A.ttf", &sfnt("Alpha", "Regular"));
    let mut loader = FontMetadataLoader::new(SfntRegistry::new());

    for _ in 0..5 {
        loader.load(&a).expect("load");
    }
    assert_eq!(loader.registry().face_count(), 1);
    assert_eq!(loader.current().unwrap().default_style(), "Regular");
    assert_ne!(FALLBACK_STYLE, "");
}

#[test]
fn collection_faces_share_a_family() {
    let mut registry = SfntRegistry::new();
    let bytes = common::collection(&[
        &[(FAMILY, "Inter"), (SUBFAMILY, "Regular")],
        &[(FAMILY, "Inter"), (SUBFAMILY, "Bold")],
    ]);

    let registration = registry.register(bytes).expect("register");

    assert_eq!(registration.families, vec!["Inter"]);
    assert_eq!(registry.styles(registration.id, "Inter").unwrap(), vec!["Regular", "Bold"]);
    assert_eq!(registry.face("Inter", "Bold", 13.0).unwrap().collection_index, Some(1));
    assert_eq!(registry.face_count(), 2);
}

#[test]
fn styles_are_scoped_to_one_registration() {
    let mut registry = SfntRegistry::new();
    let regular = registry.register(sfnt("Roboto", "Regular")).unwrap();
    let bold = registry.register(sfnt("Roboto", "Bold")).unwrap();

    assert_eq!(registry.styles(regular.id, "Roboto").unwrap(), vec!["Regular"]);
    assert_eq!(registry.styles(bold.id, "Roboto").unwrap(), vec!["Bold"]);
    assert!(registry.styles(bold.id, "Inter").is_err());
}

#[test]
fn second_file_of_the_same_family_previews_its_own_style() {
    let temp = tempfile::tempdir().expect("tempdir");
    let regular = write_font(temp.path(), "Roboto-Regular.ttf", &sfnt("Roboto", "Regular"));
    let bold = write_font(temp.path(), "Roboto-Bold.ttf", &sfnt("Roboto", "Bold"));
    let mut loader = FontMetadataLoader::new(SfntRegistry::new());

    loader.load(&regular).expect("regular");
    let handle = loader.load(&bold).expect("bold").clone();

    assert_eq!(handle.available_styles, vec!["Bold"]);
    assert_eq!(handle.default_style(), "Bold");
    assert!(loader.registry().face("Roboto", "Regular", 13.0).is_none());

    let request = PreviewRequest::new(handle.family.as_str(), handle.default_style());
    let mut surface = TextSurface::new(Vec::new(), loader.registry());
    let outcome = present(&compose(&request), &mut surface);
    assert!(matches!(outcome, Presented::Document), "got {outcome:?}");
    let page = String::from_utf8(surface.into_inner()).unwrap();
    assert!(page.contains("STYLE: BOLD"));
}

#[test]
fn damaged_collection_face_is_skipped() {
    let mut bytes = common::collection(&[
        &[(FAMILY, "Inter"), (SUBFAMILY, "Regular")],
        &[(FAMILY, "Inter"), (SUBFAMILY, "Bold")],
    ]);
    // Second offset-table entry points past the end of the file.
    bytes[16..20].copy_from_slice(&0x00FF_0000u32.to_be_bytes());

    let mut registry = SfntRegistry::new();
    let registration = registry.register(bytes).expect("first face still registers");

    assert_eq!(registry.face_count(), 1);
    assert_eq!(registry.styles(registration.id, "Inter").unwrap(), vec!["Regular"]);
    assert!(registry.face("Inter", "Bold", 13.0).is_none());
}
