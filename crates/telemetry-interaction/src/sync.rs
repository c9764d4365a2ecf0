//! Cross-chart synchronization groups
//!
//! The layout's shared-state block can name the whole main panel roster as
//! one sync group via the `main_panel.charts` token. Charts in a group
//! mirror each other's hover and zoom/pan; the time cursor syncs whenever
//! any `sync_across` scope is declared.

use telemetry_shared::TimeCursorState;

/// Sync-scope token naming every chart in the main panel
pub const SYNC_ALL_CHARTS: &str = "main_panel.charts";

/// Resolved synchronization membership for one chart
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSyncInfo {
    pub chart_id: String,
    /// Chart ids sharing interactions with this chart, itself included
    pub sync_group: Vec<String>,
    pub sync_hover: bool,
    pub sync_time_cursor: bool,
    pub sync_zoom_pan: bool,
}

/// Resolve a chart's sync membership from the cursor's declared scopes and
/// the layout roster. Without the roster token (or with an empty roster)
/// the chart forms a group of one and mirrors nothing.
pub fn resolve_chart_sync(
    chart_id: &str,
    cursor: &TimeCursorState,
    all_chart_ids: &[String],
) -> ChartSyncInfo {
    let roster_synced = cursor
        .sync_across
        .iter()
        .any(|scope| scope == SYNC_ALL_CHARTS);

    let sync_group: Vec<String> = if roster_synced && !all_chart_ids.is_empty() {
        all_chart_ids.to_vec()
    } else {
        vec![chart_id.to_string()]
    };

    let grouped = sync_group.len() > 1;
    ChartSyncInfo {
        chart_id: chart_id.to_string(),
        sync_hover: grouped,
        sync_time_cursor: !cursor.sync_across.is_empty(),
        sync_zoom_pan: grouped,
        sync_group,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use telemetry_shared::TimeAxis;

    fn cursor(scopes: &[&str]) -> TimeCursorState {
        TimeCursorState {
            axis: TimeAxis::FrameIndex,
            value: None,
            sync_across: scopes.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn roster() -> Vec<String> {
        vec!["a".to_string(), "b".to_string(), "c".to_string()]
    }

    #[test]
    fn test_roster_token_groups_all_charts() {
        let info = resolve_chart_sync("b", &cursor(&[SYNC_ALL_CHARTS]), &roster());
        assert_eq!(info.sync_group, roster());
        assert!(info.sync_hover);
        assert!(info.sync_time_cursor);
        assert!(info.sync_zoom_pan);
    }

    #[test]
    fn test_no_scopes_means_solo_chart() {
        let info = resolve_chart_sync("a", &cursor(&[]), &roster());
        assert_eq!(info.sync_group, vec!["a"]);
        assert!(!info.sync_hover);
        assert!(!info.sync_time_cursor);
        assert!(!info.sync_zoom_pan);
    }

    #[test]
    fn test_unknown_scope_syncs_cursor_only() {
        let info = resolve_chart_sync("a", &cursor(&["side_panel.charts"]), &roster());
        assert_eq!(info.sync_group, vec!["a"]);
        assert!(info.sync_time_cursor);
        assert!(!info.sync_hover);
    }

    #[test]
    fn test_empty_roster_collapses_to_solo() {
        let info = resolve_chart_sync("a", &cursor(&[SYNC_ALL_CHARTS]), &[]);
        assert_eq!(info.sync_group, vec!["a"]);
        assert!(!info.sync_hover);
        assert!(info.sync_time_cursor);
    }
}
