//! Built-in patch catalog for the DevTools front-end.
//!
//! Each entry targets one shape in one upstream module. The selectors,
//! identifiers and tab ids are data; the application model lives in
//! [`crate::patch`] and [`crate::registry`].

use crate::matcher::{MatchScope, Whitespace};
use crate::patch::{Category, Patch, PatchError};
use crate::render::Template;
use crate::reveal::reveal_patch;

/// Content category names the built-in catalog registers under.
pub mod categories {
    /// Shared runtime module holding the reveal stub
    pub const COMMON: &str = "common";
    /// Inspector view and its tabbed panes
    pub const INSPECTOR_VIEW: &str = "inspector-view";
    /// Main application module
    pub const MAIN_VIEW: &str = "main-view";
    /// Shared stylesheet bundle
    pub const INSPECTOR_COMMON_CSS: &str = "inspector-common-css";
}

/// Tab ids that stay visible in the simplified view.
pub const ALLOWED_TABS: &[&str] = &[
    "elements",
    "Styles",
    "Computed",
    "accessibility.view",
    "elements.domProperties",
    "elements.domBreakpoints",
    "elements.eventListeners",
    "network",
    "network.blocked-urls",
    "network.search-network-tab",
    "headers",
    "preview",
    "response",
    "timing",
    "initiator",
    "cookies",
    "eventSource",
    "webSocketFrames",
    "preferences",
    "workspace",
    "experiments",
    "blackbox",
    "devices",
    "throttling-conditions",
    "emulation-geolocations",
    "Shortcuts",
];

/// Anchor the stylesheet rules are inserted in front of.
const CSS_INSERTION_ANCHOR: &str = r"(:host-context\(\.platform-mac\)\s*\.monospace,)";

/// All built-in patches, in application order within each category.
pub fn builtin_patches() -> Result<Vec<Patch>, PatchError> {
    let mut patches = vec![reveal_patch(categories::COMMON)?];
    patches.extend(inspector_view_patches()?);
    patches.extend(main_view_patches()?);
    patches.extend(stylesheet_patches()?);
    Ok(patches)
}

fn define(
    id: &str,
    category: &str,
    pattern: &str,
    scope: MatchScope,
    template: Template,
) -> Result<Patch, PatchError> {
    Patch::compile(
        id,
        Category::new(category),
        pattern,
        scope,
        Whitespace::Exact,
        template,
    )
}

fn inspector_view_patches() -> Result<Vec<Patch>, PatchError> {
    let view = categories::INSPECTOR_VIEW;
    Ok(vec![
        define(
            "inspector-view-handle-action",
            view,
            r"handleAction\(context,\s*actionId\)\s*\{",
            MatchScope::All,
            Template::text("handleAction(context, actionId) { return false;"),
        )?,
        define(
            "inspector-view-show-drawer",
            view,
            r"_showDrawer\(focus\)\s*\{",
            MatchScope::All,
            Template::text("_showDrawer(focus) { return false;"),
        )?,
        define(
            "inspector-view-append-tab",
            view,
            r"appendTab\(id,\s*tabTitle\s*,\s*view,\s*tabTooltip,\s*userGesture,\s*isCloseable,\s*index\)\s*\{",
            MatchScope::First,
            Template::text(format!(
                "appendTab(id, tabTitle, view, tabTooltip, userGesture, isCloseable, index) {{ if ({}) return;",
                tab_guard_condition()
            )),
        )?,
        define(
            "inspector-view-drawer-tab-location",
            view,
            r"this\._showDrawer\.bind\s*\(this,\s*false\),\s*'drawer-view',\s*true,\s*true",
            MatchScope::All,
            Template::text(
                "this._showDrawer.bind(this, false), 'drawer-view', true, true, 'network.blocked-urls'",
            ),
        )?,
        define(
            "inspector-view-main-tab-location",
            view,
            r"InspectorFrontendHostInstance\),\s*'panel',\s*true,\s*true,\s*Root\.Runtime\.queryParam\('panel'\)",
            MatchScope::All,
            Template::text("InspectorFrontendHostInstance), 'panel', true, true, 'network'"),
        )?,
    ])
}

fn main_view_patches() -> Result<Vec<Patch>, PatchError> {
    let main = categories::MAIN_VIEW;
    Ok(vec![
        define(
            "main-view-more-tools",
            main,
            r"const moreTools\s*=\s*[^;]+;",
            MatchScope::All,
            Template::verbatim(
                "const moreTools = { defaultSection: () => ({ appendItem: () => {} }) };",
            ),
        )?,
        define(
            "main-view-default-tab",
            main,
            r"this\._defaultTab\s*=\s*defaultTab;",
            MatchScope::First,
            Template::text("this._defaultTab = 'elements';"),
        )?,
    ])
}

fn stylesheet_patches() -> Result<Vec<Patch>, PatchError> {
    let css = categories::INSPECTOR_COMMON_CSS;
    Ok(vec![
        define(
            "inspector-common-css-toolbar-rules",
            css,
            CSS_INSERTION_ANCHOR,
            MatchScope::All,
            inserted_rules(),
        )?,
        define(
            "inspector-common-css-header-contents",
            css,
            r"(\.main-tabbed-pane\s*\.tabbed-pane-header-contents\s*\{([^\}]*)?\})",
            MatchScope::All,
            rule(&[".main-tabbed-pane .tabbed-pane-header-contents"], "display: none"),
        )?,
        define(
            "inspector-common-css-right-toolbar",
            css,
            r"(\.tabbed-pane-right-toolbar\s*\{([^\}]*)?\})",
            MatchScope::All,
            rule(&[".tabbed-pane-right-toolbar"], "visibility: hidden"),
        )?,
        define(
            "inspector-common-css-tab-slider",
            css,
            r"(\.tabbed-pane-tab-slider\s*\{([^\}]*)?\})",
            MatchScope::All,
            rule(&[".tabbed-pane-tab-slider"], "display: none"),
        )?,
    ])
}

/// `id !== 'a' && id !== 'b' && ...` over [`ALLOWED_TABS`].
fn tab_guard_condition() -> String {
    ALLOWED_TABS
        .iter()
        .map(|tab| format!("id !== '{tab}'"))
        .collect::<Vec<_>>()
        .join(" && ")
}

/// One CSS rule block with a single `!important` declaration.
fn rule(selectors: &[&str], declaration: &str) -> Template {
    Template::verbatim(format!(
        "{} {{\n    {declaration} !important;\n}}",
        selectors.join(",\n")
    ))
}

fn toolbar_button(label: &str) -> String {
    format!(".toolbar-button[aria-label='{label}']")
}

fn context_menu_item(label: &str) -> String {
    format!(".soft-context-menu-item[aria-label='{label}']")
}

/// Rules inserted before the anchor.
///
/// Order is fixed: top header, then drawer, then network panel. Later rules
/// may rely on cascade order over earlier ones.
fn inserted_rules() -> Template {
    let top_header = [
        rule(
            &[&toolbar_button("Select an element in the page to inspect it")],
            "display: none",
        ),
        rule(&[&toolbar_button("Toggle screencast")], "visibility: visible"),
        rule(&[&toolbar_button("Close")], "visibility: visible"),
    ];

    let drawer = [rule(&[&toolbar_button("More Tools")], "display: none")];

    let context_menu: Vec<String> = std::iter::once(".soft-context-menu-separator".to_string())
        .chain(
            [
                "Open in new tab",
                "Open in Sources panel",
                "Clear browser cache",
                "Clear browser cookies",
                "Save all as HAR with content",
                "Save as...",
            ]
            .iter()
            .map(|label| context_menu_item(label)),
        )
        .collect();
    let context_menu: Vec<&str> = context_menu.iter().map(String::as_str).collect();

    let network = [
        rule(&[&toolbar_button("Export HAR...")], "display: none"),
        rule(&[&toolbar_button("Pretty print")], "display: none"),
        rule(&context_menu, "display: none"),
    ];

    let mut parts = Vec::new();
    for block in top_header.into_iter().chain(drawer).chain(network) {
        parts.push(block);
        parts.push(Template::verbatim("\n"));
    }
    parts.push(Template::text(" $1"));
    Template::concat(parts)
}
