//! Declared link cleanup before solving.

use std::collections::HashMap;

use tracing::{error, warn};

use crate::domain::Train;

/// Make declared `previous`/`next` links symmetric.
///
/// When a train lists another as next but that train does not list it as
/// previous (or the other way around), the missing back-link is added.
/// Links to trains outside `trains` are removed. Returns the number of
/// links changed.
pub fn reconcile_links(trains: &mut [Train]) -> usize {
    let index: HashMap<String, usize> = trains
        .iter()
        .enumerate()
        .map(|(i, t)| (t.id.clone(), i))
        .collect();

    let mut changed = 0;
    for i in 0..trains.len() {
        changed += reconcile_one(trains, &index, i, true);
        changed += reconcile_one(trains, &index, i, false);
    }
    changed
}

fn reconcile_one(trains: &mut [Train], index: &HashMap<String, usize>, i: usize, forward: bool) -> usize {
    let own_id = trains[i].id.clone();
    let declared = if forward {
        trains[i].next.clone()
    } else {
        trains[i].previous.clone()
    };
    let Some(declared) = declared else {
        return 0;
    };

    let mut changed = 0;
    let mut kept = Vec::with_capacity(declared.len());

    for linked_id in declared {
        let Some(&j) = index.get(&linked_id) else {
            error!(
                train = %own_id,
                reference = %linked_id,
                direction = if forward { "next" } else { "previous" },
                "invalid trip link, referenced train doesn't exist"
            );
            changed += 1;
            continue;
        };

        let back = if forward {
            &mut trains[j].previous
        } else {
            &mut trains[j].next
        };
        let back = back.get_or_insert_with(Vec::new);
        if !back.contains(&own_id) {
            warn!(
                train = %own_id,
                reference = %linked_id,
                direction = if forward { "next" } else { "previous" },
                "trip link inconsistency, adding back-link"
            );
            back.push(own_id.clone());
            changed += 1;
        }
        kept.push(linked_id);
    }

    let slot = if forward {
        &mut trains[i].next
    } else {
        &mut trains[i].previous
    };
    *slot = Some(kept);
    changed
}
