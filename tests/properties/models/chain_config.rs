use crate::properties::strategies::chain_config_strategy;

use router_watcher::models::{ChainConfig, ConfigLoader};
use proptest::{prelude::*, test_runner::Config};

proptest! {
	#![proptest_config(Config {
		failure_persistence: None,
		..Config::default()
	})]

	#[test]
	fn test_generated_configs_validate(chain in chain_config_strategy()) {
		prop_assert!(chain.validate().is_ok());
	}

	#[test]
	fn test_fetch_retry_defaults_to_one_second(chain in chain_config_strategy()) {
		let expected = chain.fetch_retry_ms.unwrap_or(1000);
		prop_assert_eq!(chain.fetch_retry_ms(), expected);
	}

	#[test]
	fn test_zero_block_time_is_rejected(mut chain in chain_config_strategy()) {
		chain.block_time_ms = 0;
		prop_assert!(chain.validate().is_err());
	}

	#[test]
	fn test_weight_above_hundred_is_rejected(
		mut chain in chain_config_strategy(),
		weight in 101u32..u32::MAX,
	) {
		chain.rpc_urls[0].weight = weight;
		prop_assert!(chain.validate().is_err());
	}

	#[test]
	fn test_slug_with_uppercase_is_rejected(mut chain in chain_config_strategy()) {
		chain.slug = format!("{}X", chain.slug);
		prop_assert!(chain.validate().is_err());
	}

	#[test]
	fn test_router_must_be_an_address(
		mut chain in chain_config_strategy(),
		router in "0x[0-9a-f]{0,39}",
	) {
		chain.router_address = router;
		prop_assert!(chain.validate().is_err());
	}

	#[test]
	fn test_load_from_path(chain in chain_config_strategy()) {
		let temp_dir = tempfile::tempdir().unwrap();
		let path = temp_dir.path().join("chain.json");
		std::fs::write(&path, serde_json::to_string(&chain).unwrap()).unwrap();

		let runtime = tokio::runtime::Runtime::new().unwrap();
		let loaded = runtime.block_on(ChainConfig::load_from_path(&path)).unwrap();
		prop_assert_eq!(loaded, chain);
	}
}
