//! Domain layer - ledger entities listed by the explorer

mod keys;
mod rows;

use std::fmt;
use std::str::FromStr;

pub use keys::{EntityId, KeyParseError, Timestamp};
pub use rows::{format_tinybars, Account, AccountBalance, Token, TokenHolder, Transaction};

/// Row with a natural ordering key (lists are newest/highest first)
pub trait Keyed {
    type Key: Clone + Ord + fmt::Debug + fmt::Display + FromStr + Send + Sync + 'static;

    fn key(&self) -> Self::Key;
}

/// Row that renders as table cells
pub trait TabularRow {
    fn columns() -> &'static [&'static str];
    fn cells(&self) -> Vec<String>;
}

/// The lists the explorer can browse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Transactions,
    Accounts,
    Tokens,
    Holders,
}

impl TableKind {
    pub const ALL: [TableKind; 4] = [
        TableKind::Transactions,
        TableKind::Accounts,
        TableKind::Tokens,
        TableKind::Holders,
    ];

    /// Link and command name
    pub fn name(&self) -> &'static str {
        match self {
            TableKind::Transactions => "transactions",
            TableKind::Accounts => "accounts",
            TableKind::Tokens => "tokens",
            TableKind::Holders => "holders",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            TableKind::Transactions => "Transactions",
            TableKind::Accounts => "Accounts",
            TableKind::Tokens => "Tokens",
            TableKind::Holders => "Token holders",
        }
    }

    pub fn next(&self) -> TableKind {
        let index = Self::ALL.iter().position(|kind| kind == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TableKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "transactions" | "txs" | "tx" => Ok(TableKind::Transactions),
            "accounts" | "account" | "acc" => Ok(TableKind::Accounts),
            "tokens" | "token" => Ok(TableKind::Tokens),
            "holders" | "balances" => Ok(TableKind::Holders),
            other => Err(format!("unknown table {other:?}")),
        }
    }
}

/// Upstream filters; changing one rebuilds the affected table from empty
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableFilter {
    /// Restrict transactions to one account
    pub account: Option<EntityId>,
    /// Token whose holders are listed (required by the holders table)
    pub token: Option<EntityId>,
}

impl TableFilter {
    /// The part of the filter `kind` actually reads
    pub fn scoped(&self, kind: TableKind) -> TableFilter {
        match kind {
            TableKind::Transactions => TableFilter {
                account: self.account,
                token: None,
            },
            TableKind::Holders => TableFilter {
                account: None,
                token: self.token,
            },
            TableKind::Accounts | TableKind::Tokens => TableFilter::default(),
        }
    }

    /// Whether switching from `self` to `next` changes the rows of `kind`
    pub fn affects(&self, next: &TableFilter, kind: TableKind) -> bool {
        self.scoped(kind) != next.scoped(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_kind_names_round_trip() {
        for kind in TableKind::ALL {
            assert_eq!(kind.name().parse::<TableKind>().unwrap(), kind);
        }
        assert_eq!("txs".parse::<TableKind>().unwrap(), TableKind::Transactions);
        assert!("blocks".parse::<TableKind>().is_err());
    }

    #[test]
    fn test_filter_scope_per_table() {
        let filter = TableFilter {
            account: Some(EntityId::new(0, 0, 98)),
            token: None,
        };
        let base = TableFilter::default();
        assert!(base.affects(&filter, TableKind::Transactions));
        assert!(!base.affects(&filter, TableKind::Holders));
        assert!(!base.affects(&filter, TableKind::Tokens));
        assert_eq!(filter.scoped(TableKind::Accounts), TableFilter::default());
    }

    #[test]
    fn test_table_kind_cycles() {
        assert_eq!(TableKind::Holders.next(), TableKind::Transactions);
        assert_eq!(TableKind::Transactions.next(), TableKind::Accounts);
    }
}
