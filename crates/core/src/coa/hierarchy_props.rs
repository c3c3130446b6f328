//! Property-based tests for the account tree rules.

use std::collections::HashMap;

use proptest::prelude::*;
use uuid::Uuid;

use crate::coa::hierarchy::CoaService;
use crate::coa::types::{AccountNode, AccountType};

/// Builds a chain of `depth` accounts, each the child of the previous one.
fn chain(depth: usize) -> Vec<AccountNode> {
    let mut nodes: Vec<AccountNode> = Vec::with_capacity(depth);
    for i in 0..depth {
        let parent_id = nodes.last().map(|n| n.id);
        nodes.push(AccountNode {
            id: Uuid::new_v4(),
            parent_id,
            account_type: AccountType::Asset,
            level: i32::try_from(i).unwrap() + 1,
            is_header: i + 1 < depth,
            is_active: true,
        });
    }
    nodes
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The deepest account of a chain has every other account as ancestor, nearest first.
    #[test]
    fn prop_ancestors_of_leaf_cover_whole_chain(depth in 1usize..12) {
        let nodes = chain(depth);
        let parents: HashMap<_, _> = nodes.iter().map(|n| (n.id, n.parent_id)).collect();
        let leaf = nodes.last().unwrap();

        let ancestors = CoaService::ancestors(leaf.id, &parents).unwrap();

        prop_assert_eq!(ancestors.len(), depth - 1);
        let expected: Vec<Uuid> = nodes.iter().rev().skip(1).map(|n| n.id).collect();
        prop_assert_eq!(ancestors, expected);
    }

    /// A correctly flagged chain has no header mismatches; flipping any flag creates one.
    #[test]
    fn prop_flipped_header_flag_is_detected(depth in 1usize..12, flip in 0usize..12) {
        let mut nodes = chain(depth);
        prop_assert!(CoaService::header_mismatches(&nodes).is_empty());

        let idx = flip % depth;
        nodes[idx].is_header = !nodes[idx].is_header;
        prop_assert_eq!(CoaService::header_mismatches(&nodes), vec![nodes[idx].id]);
    }
}
