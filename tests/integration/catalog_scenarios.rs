//! Full passes of the built-in catalog over mock upstream modules.

use devtools_patcher::catalog::categories;
use devtools_patcher::{BuildMode, Category, PatchRegistry};

const INSPECTOR_VIEW_JS: &str = r#"
export class InspectorView extends UI.VBox {
  constructor() {
    super();
    this._drawerTabbedLocation = UI.viewManager.createTabbedLocation(this._showDrawer.bind(this, false), 'drawer-view', true, true);
    this._tabbedLocation = UI.viewManager.createTabbedLocation(
        Host.InspectorFrontendHost.bringToFront.bind(Host.InspectorFrontendHostInstance), 'panel', true, true, Root.Runtime.queryParam('panel'));
  }

  appendTab(id, tabTitle, view, tabTooltip, userGesture, isCloseable, index) {
    this._tabs.push(id);
  }

  _showDrawer(focus) {
    this._drawer.show(focus);
  }

  handleAction(context, actionId) {
    return this._dispatch(actionId);
  }
}
"#;

const MAIN_JS: &str = r#"
class MainImpl {
  _createAppUI() {
    const moreTools = contextMenu.defaultSection().appendSubMenuItem(ls`More tools`);
    this._defaultTab = defaultTab;
  }
}
"#;

const INSPECTOR_COMMON_CSS: &str = r#".main-tabbed-pane .tabbed-pane-header-contents {
  flex: auto;
}

.tabbed-pane-right-toolbar {
  margin-left: -4px;
}

:host-context(.platform-mac) .monospace,
.platform-mac .monospace {
  font-size: 11px !important;
}

.tabbed-pane-tab-slider {
  height: 2px;
}
"#;

fn registry() -> PatchRegistry {
    PatchRegistry::builtin().expect("built-in catalog compiles")
}

#[test]
fn test_inspector_view_all_patches_match() {
    let report = registry().apply_all(
        &Category::new(categories::INSPECTOR_VIEW),
        INSPECTOR_VIEW_JS.to_string(),
        BuildMode::Debug,
    );

    assert_eq!(report.unmatched().count(), 0, "{:?}", report.outcomes);
    assert_eq!(report.outcomes.len(), 5);
    assert!(report
        .content
        .contains("_showDrawer(focus) { return false;\n    this._drawer.show(focus);"));
    assert!(report
        .content
        .contains("handleAction(context, actionId) { return false;"));
    assert!(report
        .content
        .contains("'drawer-view', true, true, 'network.blocked-urls');"));
    assert!(report
        .content
        .contains("'panel', true, true, 'network');"));
    assert!(report.content.contains("index) { if (id !== 'elements'"));
}

#[test]
fn test_inspector_view_second_pass_is_already_applied() {
    let registry = registry();
    let category = Category::new(categories::INSPECTOR_VIEW);

    let first = registry.apply_all(&category, INSPECTOR_VIEW_JS.to_string(), BuildMode::Debug);
    let second = registry.apply_all(&category, first.content.clone(), BuildMode::Debug);

    assert_eq!(second.content, first.content);
    assert_eq!(second.matched_count(), 0);
    assert!(!second.is_changed());
    // patched text is recognized as such, not reported as drift
    assert_eq!(second.drifted().count(), 0, "{:?}", second.outcomes);
    assert_eq!(second.already_applied_count(), 5);
}

#[test]
fn test_main_view_patches() {
    let report = registry().apply_all(
        &Category::new(categories::MAIN_VIEW),
        MAIN_JS.to_string(),
        BuildMode::Debug,
    );

    assert_eq!(report.matched_count(), 2);
    assert!(report.content.contains(
        "const moreTools = { defaultSection: () => ({ appendItem: () => {} }) };"
    ));
    assert!(report.content.contains("this._defaultTab = 'elements';"));
}

#[test]
fn test_stylesheet_debug_pass() {
    let report = registry().apply_all(
        &Category::new(categories::INSPECTOR_COMMON_CSS),
        INSPECTOR_COMMON_CSS.to_string(),
        BuildMode::Debug,
    );

    assert_eq!(report.unmatched().count(), 0, "{:?}", report.outcomes);
    let css = &report.content;

    assert!(css.contains(
        ".main-tabbed-pane .tabbed-pane-header-contents {\n    display: none !important;\n}"
    ));
    assert!(css.contains(".tabbed-pane-right-toolbar {\n    visibility: hidden !important;\n}"));
    assert!(css.contains(".tabbed-pane-tab-slider {\n    display: none !important;\n}"));

    let inserted = css
        .find(".toolbar-button[aria-label='Select an element in the page to inspect it']")
        .unwrap();
    let anchor = css.find(":host-context(.platform-mac) .monospace,").unwrap();
    assert!(inserted < anchor);
    assert!(css.contains("}\n :host-context(.platform-mac) .monospace,\n.platform-mac .monospace"));
    // untouched rule body survives
    assert!(css.contains("font-size: 11px !important;"));
}

#[test]
fn test_stylesheet_release_pass_only_changes_separators() {
    let registry = registry();
    let category = Category::new(categories::INSPECTOR_COMMON_CSS);

    // a serialized bundle stores the stylesheet on one line
    let serialized = INSPECTOR_COMMON_CSS.replace('\n', "\\n");
    let debug = registry.apply_all(&category, INSPECTOR_COMMON_CSS.to_string(), BuildMode::Debug);
    let release = registry.apply_all(&category, serialized, BuildMode::Release);

    assert!(!release.content.contains('\n'));
    assert_eq!(release.content.replace("\\n", "\n"), debug.content);
    assert_eq!(release.outcomes, debug.outcomes);
}

#[test]
fn test_stylesheet_without_anchor_reports_unmatched() {
    let blob = ".toolbar { color: red; }\n".to_string();
    let report = registry().apply_all(
        &Category::new(categories::INSPECTOR_COMMON_CSS),
        blob.clone(),
        BuildMode::Debug,
    );

    assert_eq!(report.content, blob);
    assert!(report
        .unmatched()
        .any(|o| o.patch_id == "inspector-common-css-toolbar-rules"));
    assert_eq!(report.matched_count(), 0);
}

#[test]
fn test_reveal_scenario() {
    let blob = "let reveal = function(revealable, omitFocus) {\n  return null;\n}";
    let report = registry().apply_all(
        &Category::new(categories::COMMON),
        blob.to_string(),
        BuildMode::Debug,
    );

    assert_eq!(report.matched_count(), 1);
    assert!(report
        .content
        .starts_with("let reveal = function revealInEditor(revealable, omitFocus) {"));
    assert!(report.content.ends_with("  return null;\n}"));
    assert_eq!(
        report.content.matches('{').count(),
        report.content.matches('}').count()
    );
}

#[test]
fn test_every_category_is_drift_free_after_patching() {
    let registry = registry();
    let blobs = [
        (categories::COMMON, "let reveal = function(revealable, omitFocus) {\n  return null;\n}"),
        (categories::INSPECTOR_VIEW, INSPECTOR_VIEW_JS),
        (categories::MAIN_VIEW, MAIN_JS),
        (categories::INSPECTOR_COMMON_CSS, INSPECTOR_COMMON_CSS),
    ];

    for (name, blob) in blobs {
        let category = Category::new(name);
        for mode in [BuildMode::Debug, BuildMode::Release] {
            let first = registry.apply_all(&category, blob.to_string(), mode);
            let second = registry.apply_all(&category, first.content.clone(), mode);
            assert_eq!(second.content, first.content, "{name}");
            assert_eq!(second.drifted().count(), 0, "{name}: {:?}", second.outcomes);
        }
    }
}

#[test]
fn test_pass_is_deterministic() {
    let registry = registry();
    let category = Category::new(categories::INSPECTOR_COMMON_CSS);

    let a = registry.apply_all(&category, INSPECTOR_COMMON_CSS.to_string(), BuildMode::Release);
    let b = registry.apply_all(&category, INSPECTOR_COMMON_CSS.to_string(), BuildMode::Release);
    assert_eq!(a, b);
}
