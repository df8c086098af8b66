//! Keys for stored item lists.

use core::fmt;

/// List id used when a shopping list save doesn't name one.
pub const DEFAULT_LIST_ID: &str = "default";

/// Which stored list a set of items belongs to.
///
/// Shopping lists are keyed by a client-chosen list id, carts by the owning
/// user's id. The two namespaces never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ListKey {
    /// A named shopping list.
    ShoppingList(String),
    /// A user's cart.
    Cart(String),
}

impl ListKey {
    /// Shopping list key, falling back to [`DEFAULT_LIST_ID`] for a missing or
    /// blank id.
    #[must_use]
    pub fn shopping_list(list_id: Option<&str>) -> Self {
        let id = list_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .unwrap_or(DEFAULT_LIST_ID);
        Self::ShoppingList(id.to_owned())
    }

    /// Cart key for a user.
    #[must_use]
    pub fn cart(user_id: &str) -> Self {
        Self::Cart(user_id.trim().to_owned())
    }

    /// Value stored in the `list_kind` column.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ShoppingList(_) => "shopping_list",
            Self::Cart(_) => "cart",
        }
    }

    /// List id or user id.
    #[must_use]
    pub fn owner(&self) -> &str {
        match self {
            Self::ShoppingList(id) | Self::Cart(id) => id,
        }
    }
}

impl fmt::Display for ListKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.owner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shopping_list_defaults() {
        assert_eq!(
            ListKey::shopping_list(None),
            ListKey::ShoppingList("default".to_string())
        );
        assert_eq!(
            ListKey::shopping_list(Some("  ")),
            ListKey::ShoppingList("default".to_string())
        );
        assert_eq!(ListKey::shopping_list(Some("weekly")).owner(), "weekly");
    }

    #[test]
    fn test_namespaces_differ() {
        let list = ListKey::shopping_list(Some("42"));
        let cart = ListKey::cart("42");
        assert_ne!(list, cart);
        assert_eq!(list.to_string(), "shopping_list:42");
        assert_eq!(cart.to_string(), "cart:42");
    }
}
