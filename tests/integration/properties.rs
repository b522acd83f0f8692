//! Property tests for the patch application model.

use devtools_patcher::catalog::categories;
use devtools_patcher::{
    ApplyOutcome, BuildMode, Category, MatchScope, Patch, PatchRegistry, Template, Whitespace,
};
use proptest::prelude::*;

fn show_drawer() -> Patch {
    Patch::compile(
        "show-drawer",
        "inspector-view",
        r"_showDrawer\(focus\)\s*\{",
        MatchScope::All,
        Whitespace::Exact,
        Template::text("_showDrawer(focus) { return false;"),
    )
    .unwrap()
}

fn slider_rule() -> Patch {
    Patch::compile(
        "slider",
        "css",
        r"(\.tabbed-pane-tab-slider\s*\{([^\}]*)?\})",
        MatchScope::All,
        Whitespace::Exact,
        Template::text(".tabbed-pane-tab-slider {\n    display: none !important;\n}"),
    )
    .unwrap()
}

// Text drawn from an alphabet that cannot spell the patch's landmark.
fn unrelated_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ;{}()\n.,=]{0,200}".prop_filter("must not contain the landmark", |s| {
        !s.contains("_showDrawer")
    })
}

proptest! {
    #[test]
    fn prop_miss_leaves_blob_identical(blob in unrelated_text()) {
        let patch = show_drawer();
        prop_assert_eq!(patch.apply(&blob, BuildMode::Debug), ApplyOutcome::NoMatch);

        let registry = PatchRegistry::new([patch]).unwrap();
        let report = registry.apply_all(&Category::new("inspector-view"), blob.clone(), BuildMode::Debug);
        prop_assert_eq!(report.content, blob);
        prop_assert!(!report.outcomes[0].matched);
    }

    #[test]
    fn prop_single_site_rewrite_is_confined(
        prefix in unrelated_text(),
        suffix in unrelated_text(),
    ) {
        // a suffix that already spells the injected guard reads as patched
        prop_assume!(!suffix.starts_with(" return false;"));
        let patch = show_drawer();
        let blob = format!("{prefix}_showDrawer(focus) {{{suffix}");

        let content = patch.apply(&blob, BuildMode::Debug).into_content().unwrap();
        prop_assert!(content.starts_with(&prefix));
        prop_assert!(content.ends_with(&suffix));
        let middle = &content[prefix.len()..content.len() - suffix.len()];
        prop_assert_eq!(middle, "_showDrawer(focus) { return false;");
    }

    #[test]
    fn prop_second_application_is_no_match(
        prefix in unrelated_text(),
        body in "[a-z :;]{0,40}",
        mode in prop_oneof![Just(BuildMode::Debug), Just(BuildMode::Release)],
    ) {
        let patch = slider_rule();
        let blob = format!("{prefix}.tabbed-pane-tab-slider {{{body}}}");

        let once = patch.apply(&blob, mode).into_content().unwrap();
        prop_assert_eq!(patch.apply(&once, mode), ApplyOutcome::NoMatch);
    }

    #[test]
    fn prop_build_modes_differ_only_in_separator(text in "[a-z{}:;!. \n]{1,120}") {
        let template = Template::text(text);
        let debug = template.render(BuildMode::Debug);
        let release = template.render(BuildMode::Release);
        prop_assert_eq!(release.as_str().replace("\\n", "\n"), debug.as_str());
        prop_assert!(!release.as_str().contains('\n'));
    }

    #[test]
    fn prop_builtin_pass_is_deterministic(blob in "[a-zA-Z0-9 ;{}()\n.,=:_-]{0,300}") {
        let registry = PatchRegistry::builtin().unwrap();
        for category in [categories::COMMON, categories::INSPECTOR_VIEW, categories::INSPECTOR_COMMON_CSS] {
            let category = Category::new(category);
            let a = registry.apply_all(&category, blob.clone(), BuildMode::Release);
            let b = registry.apply_all(&category, blob.clone(), BuildMode::Release);
            prop_assert_eq!(a, b);
        }
    }
}
