//! Integration tests for the Machine View registry and serializer.
//!
//! Exercise the public API only: publish through handles, render through
//! the serializer, and persist the mode through preference stores.

use chrono::{TimeZone, Utc};
use std::sync::Arc;

use machine_view::{
    FilePreferenceStore, InMemoryPreferenceStore, MachineViewOverlay, MarkdownSerializer,
    MemoryClipboard, Mode, PreferenceStore, Registry, SharedRoute, Slice, SliceDescriptor,
    SliceId, SliceKind, SlicePatch, MODE_STORAGE_KEY,
};

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn id(s: &str) -> SliceId {
    SliceId::new(s).unwrap()
}

fn headings(markdown: &str) -> Vec<&str> {
    markdown
        .lines()
        .filter_map(|line| line.strip_prefix("## "))
        .collect()
}

fn strip_timestamp(markdown: &str) -> String {
    markdown
        .lines()
        .filter(|line| !line.starts_with("Generated: "))
        .collect::<Vec<_>>()
        .join("\n")
}

// ─────────────────────────────────────────────────────────────────────────────
// REGISTRATION LIFECYCLE
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_unregister_removes_slice() {
    let registry = Registry::in_memory();
    let owner = registry.register_slice(Slice::new(id("s"), SliceKind::Section, "body"));
    assert!(registry.unregister_slice(&id("s"), owner));

    assert!(registry.get_slices().iter().all(|s| s.id != id("s")));
}

#[test]
fn test_repeated_mount_cycles_hold_at_most_one_entry() {
    let registry = Registry::in_memory();
    let descriptor = SliceDescriptor::new(SliceKind::Page, "About me")
        .with_id(id("about:page"))
        .with_title("About");

    for _ in 0..10 {
        let handle = registry.publish(descriptor.clone(), &());
        let count = registry
            .get_slices()
            .iter()
            .filter(|s| s.id == id("about:page"))
            .count();
        assert_eq!(count, 1);
        drop(handle);
        assert!(!registry.contains(&id("about:page")));
    }
}

#[test]
fn test_overlapping_mounts_keep_newer_slice() {
    // The incoming page mounts before the outgoing one unmounts.
    let registry = Registry::in_memory();
    let descriptor = SliceDescriptor::new(SliceKind::Hero, "v1").with_id(id("hero"));

    let old = registry.publish(descriptor.clone(), &1);
    let new = registry.publish(descriptor.with_title("Fresh"), &2);
    drop(old);

    assert!(new.is_registered());
    assert_eq!(registry.get(&id("hero")).unwrap().title.as_deref(), Some("Fresh"));
}

#[test]
fn test_update_replaces_content() {
    let registry = Registry::in_memory();
    let owner = registry.register_slice(Slice::new(id("x"), SliceKind::Generic, "A"));
    registry.update_slice(&id("x"), owner, SlicePatch::new().content("B"));

    let slices = registry.get_slices();
    assert_eq!(slices.len(), 1);
    assert_eq!(slices[0].id, id("x"));
    assert_eq!(slices[0].content, "B");
}

#[test]
fn test_handle_refresh_follows_dependencies() {
    let registry = Registry::in_memory();
    let mut count = 3u32;
    let describe = |n: u32| SliceDescriptor::new(SliceKind::Section, format!("{} posts", n));

    let mut handle = registry.publish(describe(count), &count);
    assert!(!handle.refresh(describe(count), &count));

    count = 4;
    assert!(handle.refresh(describe(count), &count));
    assert_eq!(registry.get(handle.id()).unwrap().content, "4 posts");
    assert_eq!(registry.len(), 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// SERIALIZATION
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_explicit_orders_sort_ascending() {
    let registry = Registry::in_memory();
    let _handles: Vec<_> = [(30.0, "Thirty"), (10.0, "Ten"), (20.0, "Twenty")]
        .into_iter()
        .map(|(order, title)| {
            registry.publish(
                SliceDescriptor::new(SliceKind::Section, title)
                    .with_title(title)
                    .with_order(order),
                &(),
            )
        })
        .collect();

    let document = MarkdownSerializer::default().render(&registry, "/");
    assert_eq!(headings(&document.markdown), vec!["Ten", "Twenty", "Thirty"]);
}

#[test]
fn test_default_order_sorts_after_999_in_registration_order() {
    let registry = Registry::in_memory();
    let _first = registry.publish(
        SliceDescriptor::new(SliceKind::Section, "x").with_title("Unordered A"),
        &(),
    );
    let _explicit = registry.publish(
        SliceDescriptor::new(SliceKind::Section, "x")
            .with_title("Explicit")
            .with_order(999.0),
        &(),
    );
    let _second = registry.publish(
        SliceDescriptor::new(SliceKind::Section, "x").with_title("Unordered B"),
        &(),
    );

    let document = MarkdownSerializer::default().render(&registry, "/");
    assert_eq!(
        headings(&document.markdown),
        vec!["Explicit", "Unordered A", "Unordered B"]
    );
}

#[test]
fn test_render_twice_differs_only_in_timestamp() {
    let registry = Registry::in_memory();
    let _hero = registry.publish(
        SliceDescriptor::new(SliceKind::Hero, "Headline").with_title("Hero"),
        &(),
    );
    let serializer = MarkdownSerializer::default();

    let first = serializer.render(&registry, "/");
    let second = serializer.render(&registry, "/");

    assert_eq!(strip_timestamp(&first.markdown), strip_timestamp(&second.markdown));
    assert_eq!(first.fingerprint, second.fingerprint);
}

#[test]
fn test_empty_registry_renders_header_only() {
    let registry = Registry::in_memory();
    assert!(registry.get_slices().is_empty());

    let document = MarkdownSerializer::default().render(&registry, "/");
    assert!(!document.markdown.is_empty());
    assert!(document.markdown.contains("# Machine View\n"));
    assert!(!document.markdown.contains("## "));
    assert_eq!(document.slice_count, 0);
}

#[test]
fn test_hero_nav_footer_scenario() {
    let registry = Registry::in_memory();
    let _a = registry.register_slice(
        Slice::new(id("a"), SliceKind::Nav, "- Home\n- Contact")
            .with_order(20.0)
            .with_title("Nav"),
    );
    let _b = registry.register_slice(
        Slice::new(id("b"), SliceKind::Hero, "Headline text")
            .with_order(10.0)
            .with_title("Hero"),
    );
    let _c = registry.register_slice(Slice::new(id("c"), SliceKind::Footer, "Footer stuff"));

    let generated_at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
    let document = MarkdownSerializer::default().render_at(
        &registry.ordered_slices(),
        "/",
        registry.mode(),
        generated_at,
    );

    assert_eq!(
        headings(&document.markdown),
        vec!["Hero", "Nav", "Untitled section"]
    );

    let hero = document.markdown.find("Headline text").unwrap();
    let nav = document.markdown.find("- Home\n- Contact").unwrap();
    let footer = document.markdown.find("Footer stuff").unwrap();
    assert!(hero < nav && nav < footer);
}

#[test]
fn test_header_reflects_route_and_mode() {
    let registry = Registry::in_memory();
    registry.set_mode(Mode::Machine);

    let document = MarkdownSerializer::default().render(&registry, "/blog/post-1");
    assert!(document.markdown.contains("Route: /blog/post-1\n"));
    assert!(document.markdown.contains("Mode: machine\n"));
}

// ─────────────────────────────────────────────────────────────────────────────
// MODE PERSISTENCE
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_mode_survives_reload_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prefs.json");

    let registry = Registry::new(Arc::new(FilePreferenceStore::new(&path)));
    registry.set_mode(Mode::Machine);
    drop(registry);

    let reloaded = Registry::new(Arc::new(FilePreferenceStore::new(&path)));
    assert_eq!(reloaded.mode(), Mode::Machine);
}

#[test]
fn test_corrupted_mode_falls_back_to_human() {
    let store = InMemoryPreferenceStore::with_value(MODE_STORAGE_KEY, "MACHINE!!");
    let registry = Registry::new(Arc::new(store));
    assert_eq!(registry.mode(), Mode::Human);
}

#[test]
fn test_set_mode_writes_storage() {
    let store = Arc::new(InMemoryPreferenceStore::new());
    let registry = Registry::new(store.clone());
    registry.toggle_mode();

    assert_eq!(
        store.get(MODE_STORAGE_KEY).unwrap().as_deref(),
        Some("machine")
    );
}

#[test]
fn test_read_only_storage_still_switches_mode() {
    let registry = Registry::new(Arc::new(InMemoryPreferenceStore::read_only()));
    registry.set_mode(Mode::Machine);
    assert_eq!(registry.mode(), Mode::Machine);
}

// ─────────────────────────────────────────────────────────────────────────────
// OVERLAY
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_overlay_copies_current_route_document() {
    let registry = Registry::in_memory();
    let route = SharedRoute::new("/");
    let mut overlay =
        MachineViewOverlay::new(registry.clone(), Arc::new(route.clone()), MemoryClipboard::new());

    let _hero = registry.publish(
        SliceDescriptor::new(SliceKind::Hero, "Headline").with_title("Hero"),
        &(),
    );
    route.navigate("/about");

    assert!(overlay.document().is_none());
    overlay.toggle();
    assert!(overlay.copy());

    let copied = overlay.clipboard().contents().unwrap();
    assert!(copied.contains("Route: /about\n"));
    assert!(copied.contains("## Hero\n"));
}
