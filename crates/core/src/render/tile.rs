use super::{Node, RenderSurface, RenderTarget, TableKey, TargetKey};
use crate::error::DashboardError;

/// Replaces the text of `key`, keeping any decorative marker trailing the new text.
/// Returns false (and writes nothing) when the target does not exist.
pub fn write_tile<S: RenderSurface + ?Sized>(surface: &mut S, key: TargetKey, text: &str) -> bool {
    match surface
        .target_mut(key)
        .ok_or(DashboardError::RenderTargetMissing(key))
    {
        Ok(target) => {
            replace_text(target, text);
            true
        }
        Err(err) => {
            tracing::debug!(error = %err, "tile write skipped");
            false
        }
    }
}

pub(crate) fn replace_text(target: &mut RenderTarget, text: &str) {
    let marker = target
        .nodes
        .iter()
        .position(|n| matches!(n, Node::Marker(_)))
        .map(|idx| target.nodes.remove(idx));

    target.nodes.clear();
    target.nodes.push(Node::Text(text.to_string()));
    target.nodes.extend(marker);
}

pub fn write_rows<S: RenderSurface + ?Sized>(
    surface: &mut S,
    key: TableKey,
    rows: Vec<Vec<String>>,
) -> bool {
    let Some(table) = surface.table_mut(key) else {
        tracing::debug!(table = %key, "table write skipped; target missing");
        return false;
    };
    table.rows = rows;
    true
}
