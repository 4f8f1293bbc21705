use std::cell::RefCell;
use std::rc::Rc;

use inspect_tree::{
    CollectionChange, DisplayMode, InspectTreeRoot, InspectView, ModelChange, NodeId, Subscription,
    SyncConfig, TreeUpdate, View, ViewBuilder, ViewHandle, ViewInspectorModel,
};

/// Views used across tests:
///
/// ```text
/// window
/// ├── content
/// │   ├── label
/// │   └── stack
/// │       └── button
/// └── toolbar
/// ```
struct Fixture {
    window: View,
    content: View,
    label: View,
    stack: View,
    button: View,
    toolbar: View,
}

fn fixture() -> Fixture {
    let button = View::builder("UIButton").name("ok").build();
    let stack = View::builder("UIStackView").subview(button.clone()).build();
    let label = View::builder("UILabel").build();
    let content = View::builder("UIView")
        .name("content")
        .subview(label.clone())
        .subview(stack.clone())
        .build();
    let toolbar = View::builder("UIToolbar").build();
    let window = View::builder("UIWindow")
        .subview(content.clone())
        .subview(toolbar.clone())
        .build();
    Fixture {
        window,
        content,
        label,
        stack,
        button,
        toolbar,
    }
}

fn setup() -> (Fixture, ViewInspectorModel<View>, InspectTreeRoot<View>) {
    let f = fixture();
    let model = ViewInspectorModel::new();
    let tree = InspectTreeRoot::create(&model);
    model.set_root_view(Some(f.window.clone()));
    (f, model, tree)
}

fn node_of(tree: &InspectTreeRoot<View>, view: &View) -> NodeId {
    tree.find_node(view.handle())
        .unwrap_or_else(|| panic!("{:?} not in tree", view))
}

fn handles(tree: &InspectTreeRoot<View>, ids: &[NodeId]) -> Vec<ViewHandle> {
    ids.iter()
        .map(|id| tree.view(*id).unwrap().handle())
        .collect()
}

fn selected_nodes(tree: &InspectTreeRoot<View>) -> Vec<NodeId> {
    tree.displayed_nodes()
        .into_iter()
        .filter(|id| tree.is_selected(*id))
        .collect()
}

type ChangeLog = Rc<RefCell<Vec<CollectionChange<NodeId>>>>;

fn collection_log(tree: &InspectTreeRoot<View>) -> (ChangeLog, Subscription) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let sub = tree
        .top_level()
        .subscribe(move |change| sink.borrow_mut().push(change.clone()));
    (log, sub)
}

fn counter() -> Rc<RefCell<usize>> {
    Rc::new(RefCell::new(0))
}

// ============================================================================
// Root changes
// ============================================================================

#[test]
fn test_plain_root_single_top_level() {
    let (f, _model, tree) = setup();

    let top = tree.top_level_nodes();
    assert_eq!(top.len(), 1);
    assert_eq!(handles(&tree, &top), vec![f.window.handle()]);
    assert_eq!(tree.root_node(), Some(top[0]));
    assert_eq!(tree.parent(top[0]), None);
}

#[test]
fn test_fake_root_unwraps_children() {
    let a = View::builder("UIWindow").name("a").build();
    let b = View::builder("UIWindow").name("b").build();
    let c = View::builder("UIWindow").name("c").build();
    let aggregator = View::fake_root(vec![a.clone(), b.clone(), c.clone()]);

    let model = ViewInspectorModel::new();
    let tree = InspectTreeRoot::create(&model);
    model.set_root_view(Some(aggregator.clone()));

    let top = tree.top_level_nodes();
    assert_eq!(
        handles(&tree, &top),
        vec![a.handle(), b.handle(), c.handle()]
    );
    assert!(
        top.iter()
            .all(|id| tree.view(*id).unwrap().handle() != aggregator.handle())
    );

    // The top-level entries are the aggregator node's own children.
    let root = tree.root_node().unwrap();
    assert_eq!(tree.view(root).unwrap().handle(), aggregator.handle());
    assert_eq!(tree.children(root), top);
    assert!(top.iter().all(|id| tree.parent(*id) == Some(root)));
}

#[test]
fn test_fake_root_kept_when_configured() {
    let aggregator = View::fake_root(vec![View::builder("UIWindow").build()]);
    let model = ViewInspectorModel::new();
    let tree = InspectTreeRoot::with_config(&model, SyncConfig::new().keep_fake_roots());
    model.set_root_view(Some(aggregator.clone()));

    assert_eq!(
        handles(&tree, &tree.top_level_nodes()),
        vec![aggregator.handle()]
    );
}

#[test]
fn test_same_root_is_noop() {
    let (f, _model, tree) = setup();
    let before = tree.top_level_nodes();
    let (log, _sub) = collection_log(&tree);

    tree.update(TreeUpdate::RootChanged(Some(f.window.clone())));

    assert!(log.borrow().is_empty());
    assert_eq!(tree.top_level_nodes(), before);
}

#[test]
fn test_root_set_twice_rebuilds_once() {
    let f = fixture();
    let model = ViewInspectorModel::new();
    let tree = InspectTreeRoot::create(&model);
    let resets = counter();
    let _sub = {
        let resets = Rc::clone(&resets);
        tree.top_level().on_reset(move || *resets.borrow_mut() += 1)
    };

    tree.update(TreeUpdate::RootChanged(Some(f.window.clone())));
    tree.update(TreeUpdate::RootChanged(Some(f.window.clone())));
    assert_eq!(*resets.borrow(), 1);
}

#[test]
fn test_root_replacement_emits_reset_then_added() {
    let (_f, model, tree) = setup();
    let old = tree.top_level_nodes()[0];
    let (log, _sub) = collection_log(&tree);

    let other = View::builder("UIWindow").name("other").build();
    model.set_root_view(Some(other.clone()));

    let new = tree.top_level_nodes()[0];
    assert_eq!(
        *log.borrow(),
        vec![
            CollectionChange::Reset,
            CollectionChange::Added { index: 0, item: new },
        ]
    );
    assert_ne!(old, new);
    assert!(!tree.contains(old));
    assert_eq!(tree.view(new).unwrap().handle(), other.handle());
}

#[test]
fn test_root_rebuild_uses_fresh_nodes_for_same_views() {
    let (f, model, tree) = setup();
    let old_button = node_of(&tree, &f.button);

    // New aggregator around the very same window view.
    model.set_root_view(Some(View::fake_root(vec![f.window.clone()])));

    let new_button = node_of(&tree, &f.button);
    assert_ne!(old_button, new_button);
    assert!(!tree.contains(old_button));
}

#[test]
fn test_root_cleared() {
    let (_f, model, tree) = setup();
    let (log, _sub) = collection_log(&tree);

    model.set_root_view(None);

    assert!(tree.top_level_nodes().is_empty());
    assert_eq!(tree.root_node(), None);
    assert_eq!(*log.borrow(), vec![CollectionChange::Reset]);
}

#[test]
fn test_existing_root_built_on_create() {
    let f = fixture();
    let model = ViewInspectorModel::new();
    model.set_root_view(Some(f.window.clone()));
    model.set_selected_view(Some(f.button.clone()));

    let tree = InspectTreeRoot::create(&model);
    assert_eq!(
        handles(&tree, &tree.top_level_nodes()),
        vec![f.window.handle()]
    );
    assert_eq!(tree.selected_node(), Some(node_of(&tree, &f.button)));
}

// ============================================================================
// Represented changes
// ============================================================================

#[test]
fn test_represented_resolves_node() {
    let (f, model, tree) = setup();

    model.set_represented_view(Some(f.label.clone()));
    assert_eq!(tree.represented_node(), Some(node_of(&tree, &f.label)));

    model.set_represented_view(None);
    assert_eq!(tree.represented_node(), None);
}

#[test]
fn test_represented_missing_view_is_none() {
    let (f, model, tree) = setup();
    model.set_represented_view(Some(f.label.clone()));

    model.set_represented_view(Some(View::builder("Detached").build()));
    assert_eq!(tree.represented_node(), None);
}

#[test]
fn test_represented_unchanged_emits_nothing() {
    let (f, model, tree) = setup();
    model.set_represented_view(Some(f.stack.clone()));

    let changes = counter();
    let _sub = {
        let changes = Rc::clone(&changes);
        tree.represented()
            .subscribe(move |_| *changes.borrow_mut() += 1)
    };
    tree.update(TreeUpdate::RepresentedChanged(Some(f.stack.clone())));
    assert_eq!(*changes.borrow(), 0);
}

#[test]
fn test_represented_duplicates_first_in_pre_order() {
    let shared = ViewHandle::from_raw(1 << 40);
    let deep = ViewBuilder::new(shared, "UILabel").name("deep").build();
    let shallow = ViewBuilder::new(shared, "UILabel").name("shallow").build();
    let window = View::builder("UIWindow")
        .subview(View::builder("UIView").subview(deep).build())
        .subview(shallow)
        .build();

    let model = ViewInspectorModel::new();
    let tree = InspectTreeRoot::create(&model);
    model.set_root_view(Some(window));
    model.set_represented_view(Some(ViewBuilder::new(shared, "UILabel").build()));

    let found = tree.represented_node().unwrap();
    assert_eq!(tree.view(found).unwrap().name(), Some("deep"));
}

#[test]
fn test_represented_searches_all_top_level_subtrees() {
    let target = View::builder("UIButton").build();
    let first = View::builder("UIWindow").build();
    let second = View::builder("UIWindow").subview(target.clone()).build();

    let model = ViewInspectorModel::new();
    let tree = InspectTreeRoot::create(&model);
    model.set_root_view(Some(View::fake_root(vec![first, second])));
    model.set_represented_view(Some(target.clone()));

    assert_eq!(tree.represented_node(), Some(node_of(&tree, &target)));
}

// ============================================================================
// Selected changes (model to tree)
// ============================================================================

#[test]
fn test_selection_flags_and_reveal() {
    let (f, model, tree) = setup();

    model.set_selected_view(Some(f.button.clone()));

    let button = node_of(&tree, &f.button);
    assert_eq!(tree.selected_node(), Some(button));
    assert_eq!(selected_nodes(&tree), vec![button]);
    for view in [&f.stack, &f.content, &f.window] {
        assert!(tree.is_expanded(node_of(&tree, view)), "{:?}", view);
    }
    assert!(!tree.is_expanded(node_of(&tree, &f.toolbar)));
    assert!(!tree.is_expanded(button));
}

#[test]
fn test_selection_moves() {
    let (f, model, tree) = setup();
    model.set_selected_view(Some(f.button.clone()));
    model.set_selected_view(Some(f.toolbar.clone()));

    let toolbar = node_of(&tree, &f.toolbar);
    assert_eq!(selected_nodes(&tree), vec![toolbar]);
    assert_eq!(tree.selected_node(), Some(toolbar));
}

#[test]
fn test_selection_absent_clears_everything() {
    let (f, model, tree) = setup();
    model.set_selected_view(Some(f.label.clone()));

    model.set_selected_view(Some(View::builder("Detached").build()));

    assert!(selected_nodes(&tree).is_empty());
    assert_eq!(tree.selected_node(), None);
}

#[test]
fn test_selection_cleared() {
    let (f, model, tree) = setup();
    model.set_selected_view(Some(f.label.clone()));
    model.set_selected_view(None);

    assert!(selected_nodes(&tree).is_empty());
    assert_eq!(tree.selected_node(), None);
}

#[test]
fn test_selection_without_reveal() {
    let f = fixture();
    let model = ViewInspectorModel::new();
    let tree = InspectTreeRoot::with_config(&model, SyncConfig::new().without_reveal());
    model.set_root_view(Some(f.window.clone()));
    model.set_selected_view(Some(f.button.clone()));

    assert!(tree.is_selected(node_of(&tree, &f.button)));
    assert!(!tree.is_expanded(node_of(&tree, &f.window)));
}

#[test]
fn test_selection_in_fake_root_expands_surface() {
    let button = View::builder("UIButton").build();
    let surface = View::builder("UIWindow").subview(button.clone()).build();
    let other = View::builder("UIWindow").build();

    let model = ViewInspectorModel::new();
    let tree = InspectTreeRoot::create(&model);
    model.set_root_view(Some(View::fake_root(vec![other, surface.clone()])));
    model.set_selected_view(Some(button.clone()));

    assert!(tree.is_selected(node_of(&tree, &button)));
    assert!(tree.is_expanded(node_of(&tree, &surface)));
}

#[test]
fn test_selection_survives_rebuild_when_view_still_present() {
    let (f, model, tree) = setup();
    model.set_selected_view(Some(f.button.clone()));
    model.set_represented_view(Some(f.content.clone()));

    model.set_root_view(Some(View::fake_root(vec![f.window.clone()])));

    let button = node_of(&tree, &f.button);
    assert_eq!(tree.selected_node(), Some(button));
    assert_eq!(selected_nodes(&tree), vec![button]);
    assert_eq!(tree.represented_node(), Some(node_of(&tree, &f.content)));
}

#[test]
fn test_rebuild_without_resync_drops_selection() {
    let f = fixture();
    let model = ViewInspectorModel::new();
    let tree = InspectTreeRoot::with_config(&model, SyncConfig::new().without_resync());
    model.set_root_view(Some(f.window.clone()));
    model.set_selected_view(Some(f.button.clone()));

    model.set_root_view(Some(View::fake_root(vec![f.window.clone()])));

    assert_eq!(tree.selected_node(), None);
    assert!(selected_nodes(&tree).is_empty());
}

#[test]
fn test_display_fields_ignored() {
    let (_f, model, tree) = setup();
    let (log, _sub) = collection_log(&tree);

    model.set_rendering_depth(4);
    model.set_display_mode(DisplayMode::Frames);
    model.set_show_hidden(true);

    assert!(log.borrow().is_empty());
    assert!(matches!(
        TreeUpdate::from(&ModelChange::<View>::ShowHidden(true)),
        TreeUpdate::Ignored
    ));
}

// ============================================================================
// Selected node (tree to model)
// ============================================================================

#[test]
fn test_ui_selection_writes_model() {
    let (f, model, tree) = setup();
    let label = node_of(&tree, &f.label);

    tree.set_selected_node(Some(label));

    assert_eq!(
        model.selected_view().map(|v| v.handle()),
        Some(f.label.handle())
    );
    assert_eq!(tree.selected_node(), Some(label));
    assert_eq!(selected_nodes(&tree), vec![label]);
    assert!(tree.is_expanded(node_of(&tree, &f.content)));
}

#[test]
fn test_ui_selection_none_clears_model() {
    let (f, model, tree) = setup();
    model.set_selected_view(Some(f.label.clone()));

    tree.set_selected_node(None);

    assert!(model.selected_view().is_none());
    assert!(selected_nodes(&tree).is_empty());
}

#[test]
fn test_ui_selection_round_trip_converges() {
    let (f, model, tree) = setup();
    let model_changes = counter();
    let slot_changes = counter();
    let _m = {
        let model_changes = Rc::clone(&model_changes);
        model.subscribe(move |_| *model_changes.borrow_mut() += 1)
    };
    let _s = {
        let slot_changes = Rc::clone(&slot_changes);
        tree.selected()
            .subscribe(move |_| *slot_changes.borrow_mut() += 1)
    };

    tree.set_selected_node(Some(node_of(&tree, &f.toolbar)));

    assert_eq!(*model_changes.borrow(), 1);
    assert_eq!(*slot_changes.borrow(), 1);
}

#[test]
fn test_ui_selection_in_sync_emits_nothing() {
    let (f, model, tree) = setup();
    model.set_selected_view(Some(f.button.clone()));
    let button = node_of(&tree, &f.button);
    assert_eq!(tree.selected_node(), Some(button));

    let model_changes = counter();
    let slot_changes = counter();
    let _m = {
        let model_changes = Rc::clone(&model_changes);
        model.subscribe(move |_| *model_changes.borrow_mut() += 1)
    };
    let _s = {
        let slot_changes = Rc::clone(&slot_changes);
        tree.selected()
            .subscribe(move |_| *slot_changes.borrow_mut() += 1)
    };

    tree.set_selected_node(Some(button));

    assert_eq!(*model_changes.borrow(), 0);
    assert_eq!(*slot_changes.borrow(), 0);
}

#[test]
fn test_ui_selection_of_stale_node_ignored() {
    let (f, model, tree) = setup();
    let stale = node_of(&tree, &f.label);
    model.set_root_view(Some(View::builder("UIWindow").build()));

    tree.set_selected_node(Some(stale));

    assert!(model.selected_view().is_none());
    assert_eq!(tree.selected_node(), None);
}

#[test]
fn test_ui_selection_picks_exact_duplicate() {
    let shared = ViewHandle::from_raw((1 << 40) + 1);
    let window = View::builder("UIWindow")
        .subview(ViewBuilder::new(shared, "UILabel").name("first").build())
        .subview(ViewBuilder::new(shared, "UILabel").name("second").build())
        .build();
    let model = ViewInspectorModel::new();
    let tree = InspectTreeRoot::create(&model);
    model.set_root_view(Some(window));

    let root = tree.top_level_nodes()[0];
    let second = tree.children(root)[1];
    tree.set_selected_node(Some(second));

    assert_eq!(tree.selected_node(), Some(second));
    assert_eq!(selected_nodes(&tree), vec![second]);
}

#[test]
fn test_ui_selection_after_model_dropped() {
    let (f, model, tree) = setup();
    let label = node_of(&tree, &f.label);
    drop(model);

    tree.set_selected_node(Some(label));
    assert_eq!(tree.selected_node(), Some(label));
    assert!(tree.is_selected(label));
}

// ============================================================================
// Listeners writing back
// ============================================================================

#[test]
fn test_selected_listener_writing_model_reaches_tree() {
    let (f, model, tree) = setup();
    // Detail panel follows the selection.
    let _follow = {
        let model = model.clone();
        let reader = tree.clone();
        tree.selected().subscribe(move |node| {
            model.set_represented_view(node.and_then(|id| reader.view(id)));
        })
    };

    model.set_selected_view(Some(f.button.clone()));

    let button = node_of(&tree, &f.button);
    assert_eq!(tree.selected_node(), Some(button));
    assert_eq!(tree.represented_node(), Some(button));
    assert_eq!(
        model.represented_view().map(|v| v.handle()),
        Some(f.button.handle())
    );
}

#[test]
fn test_model_listener_writing_model_during_ui_selection() {
    let (f, model, tree) = setup();
    let _follow = {
        let writer = model.clone();
        model.subscribe(move |change| {
            if let ModelChange::SelectedView(view) = change {
                writer.set_represented_view(view.clone());
            }
        })
    };

    let label = node_of(&tree, &f.label);
    tree.set_selected_node(Some(label));

    assert_eq!(tree.selected_node(), Some(label));
    assert_eq!(tree.represented_node(), Some(label));
    assert_eq!(selected_nodes(&tree), vec![label]);
    assert_eq!(
        model.represented_view().map(|v| v.handle()),
        Some(f.label.handle())
    );
}

#[test]
fn test_ui_selection_announced_after_model_write() {
    let (f, model, tree) = setup();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let _s = {
        let model = model.clone();
        let seen = Rc::clone(&seen);
        tree.selected().subscribe(move |_| {
            seen.borrow_mut()
                .push(model.selected_view().map(|v| v.handle()));
        })
    };

    tree.set_selected_node(Some(node_of(&tree, &f.toolbar)));

    assert_eq!(*seen.borrow(), vec![Some(f.toolbar.handle())]);
}

#[test]
fn test_rebuild_slot_listener_sees_new_top_level() {
    let (f, model, tree) = setup();
    model.set_selected_view(Some(f.button.clone()));
    let seen = Rc::new(RefCell::new(Vec::new()));
    let _s = {
        let reader = tree.clone();
        let seen = Rc::clone(&seen);
        tree.selected().subscribe(move |_| {
            let top = reader.top_level_nodes();
            seen.borrow_mut()
                .push(!top.is_empty() && top.iter().all(|id| reader.contains(*id)));
        })
    };

    model.set_root_view(Some(View::builder("UIWindow").name("other").build()));

    assert_eq!(*seen.borrow(), vec![true]);
}

#[test]
fn test_rebuild_top_level_listener_sees_cleared_slots() {
    let (f, model, tree) = setup();
    model.set_selected_view(Some(f.button.clone()));
    model.set_represented_view(Some(f.content.clone()));
    let stale = Rc::new(RefCell::new(Vec::new()));
    let _s = {
        let reader = tree.clone();
        let stale = Rc::clone(&stale);
        tree.top_level().on_reset(move || {
            let slots = [reader.selected_node(), reader.represented_node()];
            stale
                .borrow_mut()
                .push(slots.iter().flatten().any(|id| !reader.contains(*id)));
        })
    };

    model.set_root_view(Some(View::builder("UIWindow").build()));

    assert_eq!(*stale.borrow(), vec![false]);
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_drop_releases_subscription() {
    let model = ViewInspectorModel::<View>::new();
    let tree = InspectTreeRoot::create(&model);
    let other = tree.clone();
    assert_eq!(model.subscriber_count(), 1);

    drop(tree);
    assert_eq!(model.subscriber_count(), 1);
    drop(other);
    assert_eq!(model.subscriber_count(), 0);
}

#[test]
fn test_detach_stops_updates() {
    let (f, model, tree) = setup();
    tree.detach();
    assert!(!tree.is_attached());
    assert_eq!(model.subscriber_count(), 0);

    model.set_selected_view(Some(f.button.clone()));
    assert_eq!(tree.selected_node(), None);
    assert_eq!(
        handles(&tree, &tree.top_level_nodes()),
        vec![f.window.handle()]
    );
}

#[test]
fn test_listeners_can_read_tree() {
    let f = fixture();
    let model = ViewInspectorModel::new();
    let tree = InspectTreeRoot::create(&model);
    let names = Rc::new(RefCell::new(Vec::new()));
    let selected_flags = Rc::new(RefCell::new(Vec::new()));

    let _added = {
        let reader = tree.clone();
        let names = Rc::clone(&names);
        tree.top_level().on_added(move |_, id| {
            names
                .borrow_mut()
                .push(reader.with_node(*id, |node| node.display_name()));
        })
    };
    let _selected = {
        let reader = tree.clone();
        let flags = Rc::clone(&selected_flags);
        tree.selected().subscribe(move |id| {
            if let Some(id) = id {
                flags.borrow_mut().push(reader.is_selected(*id));
            }
        })
    };

    model.set_root_view(Some(f.window.clone()));
    model.set_selected_view(Some(f.label.clone()));

    assert_eq!(*names.borrow(), vec![Some("UIWindow".to_string())]);
    assert_eq!(*selected_flags.borrow(), vec![true]);
}
