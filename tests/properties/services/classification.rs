use crate::properties::strategies::{address_strategy, transaction_strategy};

use proptest::{prelude::*, test_runner::Config};
use router_watcher::{
	services::{
		blockwatcher::{checkpoint_key, classify_transactions, resolve_next_block},
		classifier::MethodClassifier,
	},
	utils::tests::builders::evm::block::BlockBuilder,
};

const MAX_TRANSACTIONS: usize = 20;

proptest! {
	#![proptest_config(Config {
		failure_persistence: None,
		..Config::default()
	})]

	#[test]
	fn test_classified_calls_target_router_with_known_selector(
		(router, transactions) in address_strategy().prop_flat_map(|router| {
			(
				Just(router),
				prop::collection::vec(transaction_strategy(router), 0..MAX_TRANSACTIONS),
			)
		})
	) {
		let classifier = MethodClassifier::default();
		let block = BlockBuilder::new().number(1).transactions(transactions.clone()).build();

		let classified = classify_transactions(&block, &router, &classifier);

		let expected: Vec<_> = transactions
			.iter()
			.filter(|tx| tx.to == Some(router))
			.filter_map(|tx| classifier.classify_input(&tx.input).map(|kind| (tx.hash, kind)))
			.collect();
		let actual: Vec<_> = classified.iter().map(|(tx, kind)| (tx.hash, *kind)).collect();
		prop_assert_eq!(actual, expected);
	}

	#[test]
	fn test_nothing_classified_for_other_router(
		(router, transactions) in address_strategy().prop_flat_map(|router| {
			(
				Just(router),
				prop::collection::vec(transaction_strategy(router), 0..MAX_TRANSACTIONS),
			)
		}),
		other in address_strategy(),
	) {
		prop_assume!(other != router);
		let only_router: Vec<_> = transactions
			.into_iter()
			.filter(|tx| tx.to == Some(router))
			.collect();
		let block = BlockBuilder::new().transactions(only_router).build();

		prop_assert!(classify_transactions(&block, &other, &MethodClassifier::default()).is_empty());
	}

	#[test]
	fn test_resume_never_reprocesses_checkpoint(
		checkpoint in 0u64..u64::MAX,
		start_block in proptest::option::of(any::<u64>()),
	) {
		let next = resolve_next_block(Some(checkpoint), start_block);
		prop_assert!(next.is_some_and(|n| n > checkpoint));
	}

	#[test]
	fn test_checkpoint_keys_are_distinct_per_chain(
		namespace in "[A-Z:_]{1,24}",
		a in any::<u64>(),
		b in any::<u64>(),
	) {
		prop_assume!(a != b);
		prop_assert_ne!(checkpoint_key(&namespace, a), checkpoint_key(&namespace, b));
		let key = checkpoint_key(&namespace, a);
		let suffix = format!(":{}", a);
		prop_assert!(key.ends_with(&suffix));
	}
}
