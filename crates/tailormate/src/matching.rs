//! Client name normalization and grouping.
//!
//! Names are compared by their normalized key only. The same key drives
//! write-time resolution (`clients.name_key`) and the grouped client list,
//! so a client the pipeline reused always shows up under one entry.

use serde::Serialize;

use crate::db::client_repo::ClientRow;

/// Normalizes a person's name for comparison.
///
/// Lower-cases, strips `.`, drops single-character words (initials) and
/// collapses whitespace. `"Mario A. Rossi"` and `"mario rossi"` share the
/// key `"mario rossi"`.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .replace('.', "")
        .split_whitespace()
        .filter(|word| word.chars().count() > 1)
        .collect::<Vec<_>>()
        .join(" ")
}

/// True when both names normalize to the same key.
pub fn names_match(a: &str, b: &str) -> bool {
    normalize_name(a) == normalize_name(b)
}

/// Clients that share one normalized name.
#[derive(Debug, Clone, Serialize)]
pub struct ClientGroup {
    pub name_key: String,
    /// Most recently created member.
    pub representative: ClientRow,
    /// Every member, newest first, representative included.
    pub members: Vec<ClientRow>,
}

/// Collapses clients with equal normalized names into groups.
///
/// Groups come back newest representative first. Ties on `created_at`
/// keep input order, so feeding rows newest first (as
/// `client_repo::list_for_tailor` returns them) is deterministic.
pub fn group_clients(mut clients: Vec<ClientRow>) -> Vec<ClientGroup> {
    clients.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let mut groups: Vec<ClientGroup> = Vec::new();
    for client in clients {
        let key = normalize_name(&client.full_name);
        match groups.iter_mut().find(|g| g.name_key == key) {
            Some(group) => group.members.push(client),
            None => groups.push(ClientGroup {
                name_key: key,
                representative: client.clone(),
                members: vec![client],
            }),
        }
    }
    groups
}
