//! End-to-end walker behaviour against a scripted query service.

mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;

use common::{edge_ids, node_ids, petrarca, walker, ScriptedService};
use graph_walker::config::schema::WalkerConfig;
use graph_walker::error::WalkerError;
use graph_walker::filter::{LinkedLiteralFilterPatch, TripleFilterPatch};
use graph_walker::walker::{
    ExpansionOutcome, GraphWalker, SelectedFilters, VisualNodeData, WalkerTotals,
};

fn strings(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

/// Reset to Petrarca and expand the root.
async fn expanded_root() -> (Arc<ScriptedService>, GraphWalker) {
    let service = Arc::new(petrarca());
    let walker = walker(service.clone());
    walker.reset(10).await.unwrap();
    walker.expand_node("N10", None, None).await.unwrap();
    (service, walker)
}

// ---------------------------------------------------------------------------
// reset
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reset_seeds_exactly_the_root() {
    let service = Arc::new(petrarca());
    let walker = walker(service);

    walker.reset(10).await.unwrap();

    let snapshot = walker.snapshot();
    assert_eq!(node_ids(&walker), strings(&["N10"]));
    assert!(snapshot.edges.is_empty());
    let root = &snapshot.nodes[0];
    assert!(root.is_root());
    assert!(!root.expanded);
    assert_eq!(root.label, "Petrarca");
    assert!(!walker.is_loading());
    assert_eq!(walker.last_error(), None);
}

#[tokio::test]
async fn reset_clears_previous_exploration() {
    let (_service, walker) = expanded_root().await;
    assert_eq!(walker.snapshot().nodes.len(), 3);

    walker.reset(22).await.unwrap();
    assert_eq!(node_ids(&walker), strings(&["N22"]));
    assert!(edge_ids(&walker).is_empty());
}

#[tokio::test]
async fn reset_to_missing_node_leaves_graph_empty() {
    let service = Arc::new(petrarca());
    let walker = walker(service);
    walker.reset(10).await.unwrap();

    let err = walker.reset(404).await.unwrap_err();

    assert!(matches!(err, WalkerError::NotFound(404)));
    assert!(walker.snapshot().nodes.is_empty());
    assert!(walker.last_error().unwrap().contains("404"));
    assert!(!walker.is_loading());

    // Retrying with a good id recovers.
    walker.reset(10).await.unwrap();
    assert_eq!(node_ids(&walker), strings(&["N10"]));
    assert_eq!(walker.last_error(), None);
}

#[tokio::test]
async fn reset_fetch_failure_leaves_graph_empty() {
    let service = Arc::new(petrarca());
    let walker = walker(service.clone());
    walker.reset(10).await.unwrap();
    walker.expand_node("N10", None, None).await.unwrap();
    service.fail_node(10);

    let err = walker.reset(10).await.unwrap_err();

    assert!(matches!(err, WalkerError::Fetch(_)));
    assert!(walker.snapshot().nodes.is_empty());
    assert!(walker.snapshot().edges.is_empty());
    let message = walker.last_error().unwrap();
    assert!(message.starts_with("Error loading node 10"), "{message}");
    assert!(message.contains("connection refused"), "{message}");
    assert!(!walker.is_loading());

    service.recover_node(10);
    walker.reset(10).await.unwrap();
    assert_eq!(node_ids(&walker), strings(&["N10"]));
    assert_eq!(walker.last_error(), None);
}

#[tokio::test]
async fn reset_auto_expands_root_by_default() {
    let service = Arc::new(petrarca());
    let walker = GraphWalker::new(service, WalkerConfig::default());

    walker.reset(10).await.unwrap();

    assert_eq!(node_ids(&walker), strings(&["N10", "P5N10", "P9N10"]));
    assert!(walker.node("N10").unwrap().expanded);
    assert_eq!(walker.metrics().resets(), 1);
    assert_eq!(walker.metrics().expansions(), 1);
}

// ---------------------------------------------------------------------------
// expand_node
// ---------------------------------------------------------------------------

#[tokio::test]
async fn expanding_root_materializes_property_groups() {
    let service = Arc::new(petrarca());
    let walker = walker(service);
    walker.reset(10).await.unwrap();
    walker.select_node(Some("N10"));

    let outcome = walker.expand_node("N10", None, None).await.unwrap();

    assert_eq!(
        outcome,
        ExpansionOutcome::Expanded {
            nodes_added: 2,
            edges_added: 2,
            nodes_replaced: 0,
        }
    );
    assert_eq!(node_ids(&walker), strings(&["N10", "P5N10", "P9N10"]));
    assert_eq!(edge_ids(&walker), strings(&["EN10_P5N10", "EN10_P9N10"]));

    let p5 = walker.node("P5N10").unwrap();
    assert_eq!(p5.origin_id, "N10");
    assert_eq!(p5.label, "crm:p98_brought_into_life");
    assert_eq!(p5.as_property().unwrap().count, 3);

    let totals = walker.observe().totals();
    assert_eq!(
        totals,
        WalkerTotals {
            outbound_count: 4,
            inbound_count: 0,
            ..WalkerTotals::default()
        }
    );
}

#[tokio::test]
async fn expand_node_forces_its_own_endpoints() {
    let (service, _walker) = expanded_root().await;

    let filters = service.triple_filters.lock().unwrap().clone();
    assert_eq!(filters.len(), 2);
    let outbound = filters.iter().find(|f| f.subject_id.is_some()).unwrap();
    let inbound = filters.iter().find(|f| f.object_id.is_some()).unwrap();
    assert_eq!(outbound.subject_id, Some(10));
    assert_eq!(outbound.object_id, None);
    assert_eq!(inbound.object_id, Some(10));
    assert_eq!(inbound.subject_id, None);
}

#[tokio::test]
async fn re_expansion_is_idempotent() {
    let (_service, walker) = expanded_root().await;
    walker.expand_property("P5N10", None, None, None).await.unwrap();
    let nodes_before = node_ids(&walker);
    let edges_before = edge_ids(&walker);

    let outcome = walker.expand_node("N10", None, None).await.unwrap();

    // The property subtree was replaced, not duplicated.
    assert_eq!(
        outcome,
        ExpansionOutcome::Expanded {
            nodes_added: 2,
            edges_added: 2,
            nodes_replaced: 5,
        }
    );
    let mut nodes_after = node_ids(&walker);
    nodes_after.sort();
    assert_eq!(nodes_after, strings(&["N10", "P5N10", "P9N10"]));
    assert!(nodes_before.len() > nodes_after.len());
    assert_eq!(edge_ids(&walker), edges_before[..2].to_vec());
}

#[tokio::test]
async fn page_patch_is_stored_on_the_node() {
    let (service, walker) = expanded_root().await;

    walker
        .expand_node("N10", Some(TripleFilterPatch::page(2)), None)
        .await
        .unwrap();

    let last_outbound = service
        .triple_filters
        .lock()
        .unwrap()
        .iter()
        .rev()
        .find(|f| f.subject_id.is_some())
        .cloned()
        .unwrap();
    assert_eq!(last_outbound.page_number, 2);

    let node = walker.node("N10").unwrap();
    let entity = node.as_entity().unwrap();
    assert_eq!(entity.out_filter.page_number, 2);
    assert_eq!(entity.in_filter.page_number, 1);
}

#[tokio::test]
async fn failed_outbound_fetch_marks_the_node() {
    let service = Arc::new(petrarca());
    let walker = walker(service.clone());
    walker.reset(10).await.unwrap();
    service.fail_outbound(10);
    let observer = walker.observe();

    let err = walker.expand_node("N10", None, None).await.unwrap_err();

    assert!(err.is_fetch());
    let root = walker.node("N10").unwrap();
    assert!(root.error.as_deref().unwrap().contains("connection reset"));
    assert!(!root.expanded);
    assert_eq!(node_ids(&walker), strings(&["N10"]));
    assert!(observer.last_error().unwrap().contains("N10"));
    assert!(!observer.is_loading());
    assert_eq!(walker.metrics().failed_expansions(), 1);
}

#[tokio::test]
async fn failure_keeps_existing_children() {
    let (service, walker) = expanded_root().await;
    service.fail_outbound(10);

    assert!(walker.expand_node("N10", None, None).await.is_err());

    assert_eq!(node_ids(&walker), strings(&["N10", "P5N10", "P9N10"]));
    assert!(walker.node("N10").unwrap().expanded);
}

#[tokio::test]
async fn successful_retry_clears_node_error() {
    let service = Arc::new(petrarca());
    let walker = walker(service.clone());
    walker.reset(10).await.unwrap();
    service.fail_outbound(10);
    assert!(walker.expand_node("N10", None, None).await.is_err());
    assert!(walker.node("N10").unwrap().error.is_some());

    service.recover_outbound(10);
    walker.expand_node("N10", None, None).await.unwrap();

    let root = walker.node("N10").unwrap();
    assert_eq!(root.error, None);
    assert!(root.expanded);
    assert_eq!(walker.last_error(), None);
}

#[tokio::test]
async fn expanding_wrong_kind_is_rejected() {
    let (_service, walker) = expanded_root().await;

    let err = walker.expand_node("P5N10", None, None).await.unwrap_err();
    assert!(matches!(err, WalkerError::UnexpectedKind { .. }));

    let err = walker.expand_property("N10", None, None, None).await.unwrap_err();
    assert!(matches!(err, WalkerError::UnexpectedKind { .. }));

    let err = walker.expand_node("N999", None, None).await.unwrap_err();
    assert!(matches!(err, WalkerError::UnknownNode(_)));
}

// ---------------------------------------------------------------------------
// expand_property
// ---------------------------------------------------------------------------

#[tokio::test]
async fn expanding_property_adds_entities_and_literals() {
    let (_service, walker) = expanded_root().await;

    walker.expand_property("P5N10", None, None, None).await.unwrap();

    assert_eq!(
        node_ids(&walker),
        strings(&["N10", "P5N10", "P9N10", "N21", "N22", "L99"])
    );
    assert_eq!(
        edge_ids(&walker),
        strings(&[
            "EN10_P5N10",
            "EN10_P9N10",
            "EP5N10_N21",
            "EP5N10_N22",
            "EP5N10_L99",
        ])
    );

    let literal = walker.node("L99").unwrap();
    assert_eq!(literal.label, "1304");
    assert_eq!(literal.origin_id, "P5N10");
    match &literal.data {
        VisualNodeData::Literal(data) => assert_eq!(data.triple_id, 99),
        other => panic!("unexpected payload: {other:?}"),
    }
}

#[tokio::test]
async fn expand_property_queries_origin_and_predicate() {
    let (service, walker) = expanded_root().await;

    walker
        .expand_property("P5N10", None, None, Some(LinkedLiteralFilterPatch::page(3)))
        .await
        .unwrap();

    let node_filters = service.node_filters.lock().unwrap().clone();
    assert_eq!(node_filters.len(), 2);
    for filter in &node_filters {
        assert_eq!(filter.other_node_id, 10);
        assert_eq!(filter.predicate_id, 5);
    }
    assert!(node_filters.iter().any(|f| f.is_object));
    assert!(node_filters.iter().any(|f| !f.is_object));

    let literal_filter = service.literal_filters.lock().unwrap()[0].clone();
    assert_eq!(literal_filter.subject_id, 10);
    assert_eq!(literal_filter.predicate_id, 5);
    assert_eq!(literal_filter.page_number, 3);
}

#[tokio::test]
async fn inbound_group_with_linked_predicate_is_suppressed() {
    let (_service, walker) = expanded_root().await;
    walker.expand_property("P5N10", None, None, None).await.unwrap();

    // N21 has outbound predicate 7 and inbound predicate 5; it already
    // hangs off P5N10, so no second predicate-5 group appears.
    walker.expand_node("N21", None, None).await.unwrap();

    let ids = node_ids(&walker);
    assert!(ids.contains(&"P7N21".to_string()));
    assert!(!ids.contains(&"P5N21".to_string()));
    assert!(edge_ids(&walker).contains(&"EN21_P7N21".to_string()));
}

// ---------------------------------------------------------------------------
// collapse / toggle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn collapsing_property_removes_only_its_subtree() {
    let (_service, walker) = expanded_root().await;
    walker.expand_property("P5N10", None, None, None).await.unwrap();

    let outcome = walker.collapse_node("P5N10").unwrap();

    assert_eq!(outcome, ExpansionOutcome::Collapsed { nodes_removed: 3 });
    assert_eq!(node_ids(&walker), strings(&["N10", "P5N10", "P9N10"]));
    assert_eq!(edge_ids(&walker), strings(&["EN10_P5N10", "EN10_P9N10"]));
    assert!(!walker.node("P5N10").unwrap().expanded);
}

#[tokio::test]
async fn collapsing_root_removes_everything_transitively() {
    let (_service, walker) = expanded_root().await;
    walker.expand_property("P5N10", None, None, None).await.unwrap();
    walker.expand_node("N21", None, None).await.unwrap();

    walker.collapse_node("N10").unwrap();

    assert_eq!(node_ids(&walker), strings(&["N10"]));
    assert!(edge_ids(&walker).is_empty());
}

#[tokio::test]
async fn toggle_alternates_and_ignores_literals() {
    let service = Arc::new(petrarca());
    let walker = walker(service);
    walker.reset(10).await.unwrap();

    let expanded = walker.toggle_node("N10").await.unwrap();
    assert!(matches!(expanded, ExpansionOutcome::Expanded { .. }));
    let expanded = walker.toggle_node("P5N10").await.unwrap();
    assert!(matches!(expanded, ExpansionOutcome::Expanded { .. }));

    assert_eq!(
        walker.toggle_node("L99").await.unwrap(),
        ExpansionOutcome::Unchanged
    );

    let collapsed = walker.toggle_node("N10").await.unwrap();
    assert_eq!(collapsed, ExpansionOutcome::Collapsed { nodes_removed: 5 });
    assert_eq!(node_ids(&walker), strings(&["N10"]));
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn selecting_each_kind_publishes_matching_filters() {
    let (_service, walker) = expanded_root().await;
    walker.expand_property("P5N10", None, None, None).await.unwrap();
    let observer = walker.observe();

    walker.select_node(Some("N10"));
    let filters = observer.filters();
    assert!(filters.node_out.is_some() && filters.node_in.is_some());
    assert!(filters.property_out.is_none() && filters.literal.is_none());
    assert_eq!(observer.totals().outbound_count, 4);

    walker.select_node(Some("P5N10"));
    let filters = observer.filters();
    assert!(filters.node_out.is_none() && filters.node_in.is_none());
    assert!(filters.property_out.is_some());
    assert!(filters.property_in.is_some());
    assert!(filters.literal.is_some());
    let totals = observer.totals();
    assert_eq!(totals.property_outbound_count, 2);
    assert_eq!(totals.literal_count, 1);
    assert_eq!(totals.outbound_count, 0);

    walker.select_node(Some("L99"));
    assert_eq!(observer.selected_id().as_deref(), Some("L99"));
    assert_eq!(observer.filters(), SelectedFilters::default());
    assert_eq!(observer.totals(), WalkerTotals::default());

    assert!(walker.select_node(Some("N12345")).is_none());
    assert_eq!(observer.selected_id(), None);
}

#[tokio::test]
async fn at_most_one_node_is_selected() {
    let (_service, walker) = expanded_root().await;

    walker.select_node(Some("P5N10"));
    walker.select_node(Some("P9N10"));

    let selected: Vec<String> = walker
        .snapshot()
        .nodes
        .into_iter()
        .filter(|n| n.selected)
        .map(|n| n.id)
        .collect();
    assert_eq!(selected, strings(&["P9N10"]));

    walker.select_node(None);
    assert!(walker.snapshot().nodes.iter().all(|n| !n.selected));
    assert_eq!(walker.snapshot().selected_id, None);
}

#[tokio::test]
async fn removing_selected_node_snaps_to_root() {
    let (_service, walker) = expanded_root().await;
    walker.expand_property("P5N10", None, None, None).await.unwrap();
    walker.select_node(Some("N21"));
    let observer = walker.observe();

    walker.collapse_node("P5N10").unwrap();

    assert_eq!(observer.selected_id().as_deref(), Some("N10"));
    assert!(walker.node("N10").unwrap().selected);
    assert!(observer.filters().node_out.is_some());
}

#[tokio::test]
async fn collapsing_unrelated_node_keeps_selection_streams_quiet() {
    let (_service, walker) = expanded_root().await;
    walker.expand_property("P5N10", None, None, None).await.unwrap();
    walker.select_node(Some("P9N10"));
    let mut observer = walker.observe();
    let _ = observer.nodes.borrow_and_update();
    let _ = observer.selected.borrow_and_update();
    let _ = observer.totals.borrow_and_update();

    walker.collapse_node("P5N10").unwrap();

    assert!(observer.nodes.has_changed().unwrap());
    assert!(!observer.selected.has_changed().unwrap());
    assert!(!observer.totals.has_changed().unwrap());
    assert_eq!(observer.selected_id().as_deref(), Some("P9N10"));
}

#[tokio::test]
async fn collapsing_away_the_selection_republishes_it() {
    let (_service, walker) = expanded_root().await;
    walker.expand_property("P5N10", None, None, None).await.unwrap();
    walker.select_node(Some("N21"));
    let mut observer = walker.observe();
    let _ = observer.selected.borrow_and_update();
    let _ = observer.totals.borrow_and_update();

    walker.collapse_node("P5N10").unwrap();

    assert!(observer.selected.has_changed().unwrap());
    assert!(observer.totals.has_changed().unwrap());
    assert_eq!(observer.selected_id().as_deref(), Some("N10"));
    assert_eq!(observer.totals().outbound_count, 4);
}

#[tokio::test]
async fn expanding_selected_node_republishes_totals() {
    let service = Arc::new(petrarca());
    let walker = walker(service);
    walker.reset(10).await.unwrap();
    walker.select_node(Some("N10"));
    let mut observer = walker.observe();
    let _ = observer.totals.borrow_and_update();

    walker.expand_node("N10", None, None).await.unwrap();

    assert!(observer.totals.has_changed().unwrap());
    assert_eq!(observer.totals().outbound_count, 4);
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test]
async fn late_result_for_removed_node_is_discarded() {
    let (service, walker) = expanded_root().await;
    let gate = service.close_gate();

    let pending = {
        let walker = walker.clone();
        tokio::spawn(async move { walker.expand_property("P5N10", None, None, None).await })
    };
    while service.waiting() < 3 {
        tokio::task::yield_now().await;
    }
    assert!(walker.is_loading());

    walker.collapse_node("N10").unwrap();
    gate.add_permits(3);

    let outcome = pending.await.unwrap().unwrap();
    assert_eq!(outcome, ExpansionOutcome::Discarded);
    assert_eq!(node_ids(&walker), strings(&["N10"]));
    assert!(edge_ids(&walker).is_empty());
    assert!(!walker.is_loading());
    assert_eq!(walker.metrics().discarded_results(), 1);
}

#[tokio::test]
async fn late_result_after_reset_is_discarded() {
    let service = Arc::new(petrarca());
    let walker = walker(service.clone());
    walker.reset(10).await.unwrap();
    let gate = service.close_gate();

    let pending = {
        let walker = walker.clone();
        tokio::spawn(async move { walker.expand_node("N10", None, None).await })
    };
    while service.waiting() < 2 {
        tokio::task::yield_now().await;
    }

    // Same root id, fresh exploration: the old result must not land in it.
    let reset = {
        let walker = walker.clone();
        tokio::spawn(async move { walker.reset(10).await })
    };
    while service.waiting() < 3 {
        tokio::task::yield_now().await;
    }
    gate.add_permits(3);

    assert_eq!(pending.await.unwrap().unwrap(), ExpansionOutcome::Discarded);
    reset.await.unwrap().unwrap();
    assert_eq!(node_ids(&walker), strings(&["N10"]));
    assert!(!walker.node("N10").unwrap().expanded);
}

#[tokio::test]
async fn sibling_expansions_can_run_concurrently() {
    let (_service, walker) = expanded_root().await;

    let (a, b) = tokio::join!(
        walker.expand_property("P5N10", None, None, None),
        walker.expand_property("P9N10", None, None, None),
    );
    a.unwrap();
    b.unwrap();

    let ids = node_ids(&walker);
    for id in ["N21", "N22", "L99"] {
        assert!(ids.contains(&id.to_string()), "missing {id}");
    }
    assert!(walker.node("P9N10").unwrap().expanded);
}
