use std::fmt;

use reqwest::Url;

use crate::models::ItemId;

/// A remote resource the engine can fetch.
///
/// Each variant knows its endpoint path and whether the request must carry
/// the account credential. Character names may contain spaces; they are
/// placed as URL path segments so percent-encoding is handled by the URL
/// type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Credential metadata, including granted permissions.
    TokenInfo,
    /// Wallet currency balances.
    Wallet,
    /// Account bank tabs.
    Bank,
    /// Material storage.
    Materials,
    /// Shared inventory slots.
    SharedInventory,
    /// Names of every character on the account.
    Characters,
    /// One character's bag contents.
    CharacterInventory(String),
    /// One character's equipped items.
    CharacterEquipment(String),
    /// Bulk buy/sell listings for a batch of item ids.
    Prices(Vec<ItemId>),
}

impl Resource {
    fn path_segments(&self) -> Vec<&str> {
        match self {
            Resource::TokenInfo => vec!["tokeninfo"],
            Resource::Wallet => vec!["account", "wallet"],
            Resource::Bank => vec!["account", "bank"],
            Resource::Materials => vec!["account", "materials"],
            Resource::SharedInventory => vec!["account", "inventory"],
            Resource::Characters => vec!["characters"],
            Resource::CharacterInventory(name) => vec!["characters", name, "inventory"],
            Resource::CharacterEquipment(name) => vec!["characters", name, "equipment"],
            Resource::Prices(_) => vec!["commerce", "prices"],
        }
    }

    /// Whether the request must carry the `Authorization` header.
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Resource::Prices(_))
    }

    /// Build the request URL under `base`.
    ///
    /// `base` was validated at client construction to support path segments.
    pub(crate) fn url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .expect("base URL validated at construction");
            segments.pop_if_empty();
            for segment in self.path_segments() {
                segments.push(segment);
            }
        }
        if let Resource::Prices(ids) = self {
            let ids = ids
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",");
            url.query_pairs_mut().append_pair("ids", &ids);
        }
        url
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path_segments().join("/"))
    }
}
