use std::path::PathBuf;

use fontview_core::preview::{compose, BlockKind, PreviewRequest, Zoom, MAX_ZOOM, MIN_ZOOM};
use fontview_core::sandbox::PathSandbox;
use proptest::prelude::*;

const ROOT: &str = "/srv/fonts";

fn segment() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9_-]{1,8}",
        Just(".".to_string()),
        Just("..".to_string()),
    ]
}

/// False once `..` would climb above the starting directory.
fn stays_inside(segments: &[String]) -> bool {
    let mut depth: i64 = 0;
    for seg in segments {
        match seg.as_str() {
            "." => {}
            ".." => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => depth += 1,
        }
    }
    true
}

proptest! {
    #[test]
    fn resolve_accepts_exactly_the_paths_that_stay_inside(segments in prop::collection::vec(segment(), 0..8)) {
        let sandbox = PathSandbox::new(ROOT).unwrap();
        let candidate: PathBuf = std::iter::once(ROOT.to_string()).chain(segments.iter().cloned()).collect();

        match sandbox.resolve(&candidate) {
            Ok(resolved) => {
                prop_assert!(stays_inside(&segments));
                prop_assert!(resolved.starts_with(ROOT));
                prop_assert!(!resolved.components().any(|c| matches!(c, std::path::Component::ParentDir | std::path::Component::CurDir)));
            }
            Err(_) => prop_assert!(!stays_inside(&segments)),
        }
    }

    #[test]
    fn paths_outside_root_are_denied(dir in "[a-z]{1,8}", file in "[a-z]{1,8}\\.ttf") {
        let sandbox = PathSandbox::new(ROOT).unwrap();
        let outside = PathBuf::from("/").join(&dir).join(&file);
        prop_assert!(sandbox.resolve(&outside).is_err());
        let sibling = PathBuf::from(format!("{ROOT}{dir}")).join(&file);
        prop_assert!(sandbox.resolve(&sibling).is_err());
    }

    #[test]
    fn heading_size_is_monotonic(a in -100i64..400, b in -100i64..400) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(Zoom::new(lo).heading_point_size() <= Zoom::new(hi).heading_point_size());
    }

    #[test]
    fn zoom_stays_in_range_and_body_never_scales(percent in any::<i64>()) {
        let zoom = Zoom::new(percent);
        prop_assert!((MIN_ZOOM..=MAX_ZOOM).contains(&zoom.percent()));

        let request = PreviewRequest { zoom, ..PreviewRequest::new("Inter", "Regular") };
        let doc = compose(&request);
        prop_assert_eq!(doc.block(BlockKind::Body).unwrap().point_size, 13.0);
        prop_assert_eq!(doc.block(BlockKind::Footer).unwrap().point_size, 13.0);
    }
}

#[test]
fn heading_is_exactly_48_at_100_percent() {
    assert_eq!(Zoom::new(100).heading_point_size(), 48);
}
