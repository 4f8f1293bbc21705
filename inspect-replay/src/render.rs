//! Plain-text rendering of the inspect tree.

use inspect_tree::{InspectTreeRoot, InspectView, NodeId, View, ViewInspectorModel};

/// Options that are not part of the inspector model.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Descend into collapsed nodes too.
    pub show_collapsed: bool,
}

/// Render the displayed tree, one node per line.
///
/// Hidden views are skipped unless the model's `show_hidden` is set, and a
/// non-zero `rendering_depth` limits how deep the tree is drawn. The display
/// mode applies to drawn view content, not to the tree outline, so it only
/// shows up in [`Replay::status_line`](crate::Replay::status_line).
pub fn render_tree(
    tree: &InspectTreeRoot<View>,
    model: &ViewInspectorModel<View>,
    options: &RenderOptions,
) -> String {
    let show_hidden = model.show_hidden();
    let max_depth = match model.rendering_depth() {
        0 => usize::MAX,
        depth => depth as usize,
    };
    let represented = tree.represented_node();

    let mut out = String::new();
    let mut stack: Vec<(NodeId, usize)> = tree
        .top_level_nodes()
        .into_iter()
        .rev()
        .map(|id| (id, 0))
        .collect();

    while let Some((id, depth)) = stack.pop() {
        let Some(view) = tree.view(id) else {
            continue;
        };
        if !show_hidden && !view.is_visible() {
            continue;
        }

        let children = tree.children(id);
        let expanded = tree.is_expanded(id);
        let marker = match (children.is_empty(), expanded) {
            (true, _) => ' ',
            (false, true) => '-',
            (false, false) => '+',
        };

        let mut line = format!("{}{} {}", "  ".repeat(depth), marker, view_label(&view));
        if tree.is_selected(id) {
            line.push_str(" [selected]");
        }
        if represented == Some(id) {
            line.push_str(" [represented]");
        }
        out.push_str(&line);
        out.push('\n');

        if (expanded || options.show_collapsed) && depth + 1 < max_depth {
            stack.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
        }
    }
    out
}

fn view_label(view: &View) -> String {
    let name = view.display_name();
    if view.is_visible() {
        name
    } else {
        format!("{} (hidden)", name)
    }
}
