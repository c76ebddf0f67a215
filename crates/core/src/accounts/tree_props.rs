//! Property-based tests for the account tree index.
//!
//! - Property 1: Every account appears exactly once in the forest
//! - Property 2: Leaf flags agree with the children index

use chrono::Utc;
use mizan_shared::AccountId;
use proptest::prelude::*;

use super::tree::AccountTree;
use super::types::{Account, AccountNode};

/// Builds a random forest: account `i` picks a parent among `0..i` or none.
fn random_accounts() -> impl Strategy<Value = Vec<Account>> {
    prop::collection::vec(prop::option::of(any::<prop::sample::Index>()), 1..40).prop_map(
        |parents| {
            let now = Utc::now();
            let mut accounts: Vec<Account> = Vec::with_capacity(parents.len());
            for (i, parent) in parents.into_iter().enumerate() {
                let parent_id = match parent {
                    Some(idx) if i > 0 => Some(accounts[idx.index(i)].id),
                    _ => None,
                };
                accounts.push(Account {
                    id: AccountId::new(),
                    code: format!("{:04}", (i * 7919) % 10_000),
                    name: format!("Account {i}"),
                    parent_id,
                    is_active: true,
                    version: 1,
                    created_at: now,
                    updated_at: now,
                });
            }
            accounts
        },
    )
}

fn collect(nodes: &[AccountNode], out: &mut Vec<AccountId>) {
    for node in nodes {
        out.push(node.account.id);
        collect(&node.children, out);
    }
}

fn check_ordered(nodes: &[AccountNode]) -> bool {
    nodes.windows(2).all(|w| w[0].account.code <= w[1].account.code)
        && nodes.iter().all(|n| check_ordered(&n.children))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property 1.1: The forest contains each account exactly once.
    #[test]
    fn prop_forest_covers_all_accounts(accounts in random_accounts()) {
        let tree = AccountTree::build(accounts.clone());
        let mut seen = Vec::new();
        collect(&tree.forest(), &mut seen);

        prop_assert_eq!(seen.len(), accounts.len());
        seen.sort();
        seen.dedup();
        prop_assert_eq!(seen.len(), accounts.len());
    }

    /// Property 1.2: Siblings are ordered by code at every level.
    #[test]
    fn prop_siblings_ordered(accounts in random_accounts()) {
        let tree = AccountTree::build(accounts);
        prop_assert!(check_ordered(&tree.forest()));
    }

    /// Property 2.1: An account is a leaf iff no account names it as parent.
    #[test]
    fn prop_leaf_iff_no_children(accounts in random_accounts()) {
        let tree = AccountTree::build(accounts.clone());
        for account in &accounts {
            let has_child = accounts.iter().any(|a| a.parent_id == Some(account.id));
            prop_assert_eq!(tree.is_leaf(account.id), Some(!has_child));
        }
    }

    /// Property 2.2: A root's subtree size equals the node count of its forest entry.
    #[test]
    fn prop_subtree_matches_forest(accounts in random_accounts()) {
        let tree = AccountTree::build(accounts);
        for root in tree.forest() {
            let mut ids = Vec::new();
            collect(std::slice::from_ref(&root), &mut ids);
            prop_assert_eq!(tree.subtree(root.account.id).len(), ids.len());
        }
    }
}
