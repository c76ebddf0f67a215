//! Parent to children index over a flat list of accounts.

use std::collections::HashMap;

use mizan_shared::AccountId;

use super::types::{Account, AccountNode};

/// Read-side view of the chart of accounts.
///
/// Built from the flat account list on every read; nodes never own their
/// children, so each account stays independently mutable in storage.
#[derive(Debug, Clone, Default)]
pub struct AccountTree {
    accounts: HashMap<AccountId, Account>,
    children: HashMap<AccountId, Vec<AccountId>>,
    roots: Vec<AccountId>,
}

impl AccountTree {
    /// Builds the index. Accounts whose parent is absent from the list are
    /// treated as roots. Sibling lists are ordered by code.
    #[must_use]
    pub fn build(accounts: Vec<Account>) -> Self {
        let accounts: HashMap<AccountId, Account> =
            accounts.into_iter().map(|a| (a.id, a)).collect();

        let mut children: HashMap<AccountId, Vec<AccountId>> = HashMap::new();
        let mut roots = Vec::new();
        for account in accounts.values() {
            match account.parent_id {
                Some(parent) if accounts.contains_key(&parent) => {
                    children.entry(parent).or_default().push(account.id);
                }
                _ => roots.push(account.id),
            }
        }

        let by_code = |ids: &mut Vec<AccountId>| {
            ids.sort_by(|a, b| accounts[a].code.cmp(&accounts[b].code));
        };
        by_code(&mut roots);
        for ids in children.values_mut() {
            by_code(ids);
        }

        Self {
            accounts,
            children,
            roots,
        }
    }

    /// Looks up an account.
    #[must_use]
    pub fn get(&self, id: AccountId) -> Option<&Account> {
        self.accounts.get(&id)
    }

    /// Returns `None` for unknown accounts.
    #[must_use]
    pub fn is_leaf(&self, id: AccountId) -> Option<bool> {
        self.accounts
            .contains_key(&id)
            .then(|| self.children.get(&id).is_none_or(Vec::is_empty))
    }

    /// Direct children ordered by code.
    #[must_use]
    pub fn children(&self, id: AccountId) -> &[AccountId] {
        self.children.get(&id).map_or(&[], Vec::as_slice)
    }

    /// The account itself followed by all of its descendants, depth-first.
    #[must_use]
    pub fn subtree(&self, id: AccountId) -> Vec<AccountId> {
        if !self.accounts.contains_key(&id) {
            return Vec::new();
        }
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        out
    }

    /// Number of accounts in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// True if the index holds no accounts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// The ordered forest.
    #[must_use]
    pub fn forest(&self) -> Vec<AccountNode> {
        self.roots.iter().map(|id| self.node(*id)).collect()
    }

    fn node(&self, id: AccountId) -> AccountNode {
        let children: Vec<AccountNode> = self.children(id).iter().map(|c| self.node(*c)).collect();
        AccountNode {
            account: self.accounts[&id].clone(),
            is_leaf: children.is_empty(),
            children,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn account(code: &str, parent: Option<AccountId>) -> Account {
        let now = Utc::now();
        Account {
            id: AccountId::new(),
            code: code.to_string(),
            name: format!("Account {code}"),
            parent_id: parent,
            is_active: true,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_forest_is_ordered_by_code() {
        let liabilities = account("2", None);
        let expenses = account("4", None);
        let store_payable = account("2-2", Some(liabilities.id));
        let driver_payable = account("2-1", Some(liabilities.id));

        let tree = AccountTree::build(vec![
            expenses.clone(),
            store_payable.clone(),
            liabilities.clone(),
            driver_payable.clone(),
        ]);

        let forest = tree.forest();
        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].account.code, "2");
        assert_eq!(forest[1].account.code, "4");
        let codes: Vec<_> = forest[0].children.iter().map(|n| n.account.code.as_str()).collect();
        assert_eq!(codes, vec!["2-1", "2-2"]);
        assert!(!forest[0].is_leaf);
        assert!(forest[1].is_leaf);
    }

    #[test]
    fn test_is_leaf() {
        let root = account("1", None);
        let child = account("1-1", Some(root.id));
        let tree = AccountTree::build(vec![root.clone(), child.clone()]);

        assert_eq!(tree.is_leaf(root.id), Some(false));
        assert_eq!(tree.is_leaf(child.id), Some(true));
        assert_eq!(tree.is_leaf(AccountId::new()), None);
    }

    #[test]
    fn test_subtree_includes_all_descendants() {
        let root = account("1", None);
        let a = account("1-1", Some(root.id));
        let b = account("1-2", Some(root.id));
        let a1 = account("1-1-01", Some(a.id));
        let other = account("9", None);

        let tree = AccountTree::build(vec![
            root.clone(),
            a.clone(),
            b.clone(),
            a1.clone(),
            other.clone(),
        ]);

        assert_eq!(tree.subtree(root.id), vec![root.id, a.id, a1.id, b.id]);
        assert_eq!(tree.subtree(a1.id), vec![a1.id]);
        assert!(tree.subtree(AccountId::new()).is_empty());
    }

    #[test]
    fn test_orphan_becomes_root() {
        let orphan = account("5-1", Some(AccountId::new()));
        let tree = AccountTree::build(vec![orphan.clone()]);
        assert_eq!(tree.forest().len(), 1);
        assert_eq!(tree.is_leaf(orphan.id), Some(true));
    }
}
