//! Theme cache maintenance.

use crate::state::AppState;

/// Forget every theme lookup so the next import queries the service again.
pub fn clear_cache(state: &mut AppState) -> anyhow::Result<()> {
    let entries = state.cache.len();
    state.cache.clear();
    tracing::info!(entries, "cleared theme cache");
    println!("Cleared {entries} cached theme lookups.");
    Ok(())
}
