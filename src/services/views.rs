//! Dashboard views
//!
//! Orchestrates PuppetDB lookups for the node overview and the
//! operator-defined fact views.

use chrono::Utc;
use tracing::debug;

use crate::models::{Node, View, ViewResult};
use crate::services::aggregate::{flatten_facts, join_event_counts, mark_unreported};
use crate::services::puppetdb::InventoryService;
use crate::services::query::{
    latest_report_event_counts_query, node_overview_query, view_facts_query, NodeOverviewFilter,
};
use crate::utils::error::AppResult;

/// Nodes matching the overview filter, with latest-report event counts and
/// the unreported flag filled in
pub async fn node_overview(
    inventory: &dyn InventoryService,
    filter: &NodeOverviewFilter,
    unreported_hours: u32,
) -> AppResult<Vec<Node>> {
    let counts = inventory
        .event_counts(&latest_report_event_counts_query())
        .await?;
    let mut nodes = inventory.nodes(&node_overview_query(filter)).await?;

    join_event_counts(&mut nodes, &counts);
    mark_unreported(&mut nodes, Utc::now(), unreported_hours);

    debug!(
        nodes = nodes.len(),
        event_counts = counts.len(),
        "Built node overview"
    );
    Ok(nodes)
}

/// Compute the rows of a predefined view
///
/// A view without columns has nothing to look up and renders no rows.
pub async fn render_view(inventory: &dyn InventoryService, view: &View) -> AppResult<ViewResult> {
    let data = if view.facts.is_empty() {
        Vec::new()
    } else {
        flatten_facts(inventory.facts(&view_facts_query(view)).await?)
    };

    Ok(ViewResult {
        view: view.clone(),
        data,
    })
}
