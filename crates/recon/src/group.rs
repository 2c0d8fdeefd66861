use std::collections::BTreeMap;

use crate::model::{OrderGroup, TxnRecord};

/// Partition date-sorted transactions into per-order groups.
///
/// Group keys ascend lexicographically; rows inside a group keep the
/// loader's date-ascending order. Key equality is exact string match.
pub fn group_by_order(txns: &[TxnRecord]) -> Vec<OrderGroup> {
    let mut groups: BTreeMap<String, Vec<TxnRecord>> = BTreeMap::new();
    for txn in txns {
        groups.entry(txn.order_id.clone()).or_default().push(txn.clone());
    }
    groups
        .into_iter()
        .map(|(order_id, txns)| OrderGroup { order_id, txns })
        .collect()
}
