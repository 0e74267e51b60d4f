use serde::{Deserialize, Serialize};

/// The entity types moved by the pipeline, in dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Account,
    Category,
    Sheet,
    Transaction,
}

impl EntityKind {
    /// All kinds, accounts first. Later kinds reference earlier ones.
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Account,
        EntityKind::Category,
        EntityKind::Sheet,
        EntityKind::Transaction,
    ];

    /// Plural name used in log lines and summaries.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Account => "accounts",
            EntityKind::Category => "categories",
            EntityKind::Sheet => "sheets",
            EntityKind::Transaction => "transactions",
        }
    }

    /// Singular name, for per-record messages.
    pub fn singular(&self) -> &'static str {
        match self {
            EntityKind::Account => "account",
            EntityKind::Category => "category",
            EntityKind::Sheet => "sheet",
            EntityKind::Transaction => "transaction",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
