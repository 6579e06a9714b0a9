//! Pulls the full store state for one run.

use consul_snapshot_core::{Error, Result, Snapshot, StoreClient};
use tracing::{debug, info};

/// Reads KV, prepared query and ACL state from `store`.
///
/// Any listing failure aborts the collection. A store running without ACLs
/// yields an empty ACL collection.
pub async fn collect(store: &dyn StoreClient) -> Result<Snapshot> {
    let kv = store.list_kv().await?;
    debug!("Collected {} keys", kv.len());

    let prepared_queries = store.list_prepared_queries().await?;
    debug!("Collected {} prepared queries", prepared_queries.len());

    let acls = match store.list_acls().await {
        Ok(acls) => acls,
        Err(Error::AclSupportDisabled) => {
            info!("ACL support is disabled on the cluster, skipping ACLs");
            Vec::new()
        }
        Err(e) => return Err(e),
    };
    debug!("Collected {} ACLs", acls.len());

    info!(
        "Collected {} keys, {} prepared queries, {} ACLs",
        kv.len(),
        prepared_queries.len(),
        acls.len()
    );

    Ok(Snapshot {
        kv,
        prepared_queries,
        acls,
    })
}
