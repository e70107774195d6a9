use alloy::primitives::{address, b256, Address, B256};
use std::{
	sync::{
		atomic::{AtomicUsize, Ordering},
		Arc,
	},
	time::Duration,
};
use tokio::sync::watch;

use router_watcher::{
	models::{ChainConfig, EvmBlock, OperationKind},
	services::{
		blockchain::BlockChainError,
		blockwatcher::{BlockWatcherError, ChainWatcher, CheckpointError, IterationOutcome},
		classifier::MethodClassifier,
		sink::SinkError,
	},
	utils::tests::builders::{
		chain::ChainConfigBuilder,
		evm::{block::BlockBuilder, transaction::TransactionBuilder},
	},
};

use crate::integration::mocks::{
	FakeChain, MemoryCheckpointStore, MockChainClient, MockCheckpointStore, MockOperationSink,
	RecordingSink,
};

const ROUTER: Address = address!("0x000000000000000000000000000000000000abcd");
const OTHER: Address = address!("0x0000000000000000000000000000000000001234");
const SENDER: Address = address!("0x1111111111111111111111111111111111111111");
const SWAP_HASH: B256 = b256!("0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b");

fn bsc() -> ChainConfig {
	ChainConfigBuilder::new()
		.slug("bsc")
		.chain_id(56)
		.router_address("0x000000000000000000000000000000000000ABCD")
		.block_time_ms(3000)
		.fetch_retry_ms(10)
		.build()
}

/// A block with one swap on the router, one unknown call on the router and one swap elsewhere
fn mixed_block(number: u64) -> EvmBlock {
	BlockBuilder::new()
		.number(number)
		.timestamp(1_700_000_000)
		.transaction(
			TransactionBuilder::new()
				.hash(SWAP_HASH)
				.from(SENDER)
				.to(ROUTER)
				.input_hex("0x38ed17390000000000000000000000000000000000000000000000000000000000000001")
				.build(),
		)
		.transaction(
			TransactionBuilder::new()
				.from(SENDER)
				.to(ROUTER)
				.input_hex("0x00000000")
				.build(),
		)
		.transaction(
			TransactionBuilder::new()
				.from(SENDER)
				.to(OTHER)
				.input_hex("0x38ed1739")
				.build(),
		)
		.build()
}

fn watcher<C, K, S>(
	chain: ChainConfig,
	client: Arc<C>,
	checkpoints: Arc<K>,
	sink: Arc<S>,
) -> ChainWatcher<C, K, S>
where
	C: router_watcher::services::blockchain::ChainClient + 'static,
	K: router_watcher::services::blockwatcher::CheckpointStore,
	S: router_watcher::services::sink::OperationSink,
{
	ChainWatcher::new(
		chain,
		client,
		Arc::new(MethodClassifier::default()),
		checkpoints,
		sink,
	)
	.unwrap()
}

#[tokio::test]
async fn test_records_only_classified_router_calls() {
	let client = Arc::new(FakeChain::new(56).with_block(mixed_block(100)));
	let checkpoints = Arc::new(MemoryCheckpointStore::default());
	let sink = Arc::new(RecordingSink::default());
	let watcher = watcher(bsc(), client, checkpoints.clone(), sink.clone());

	let outcome = watcher.iterate(Some(100)).await;

	assert!(matches!(
		outcome,
		IterationOutcome::Processed {
			block_number: 100,
			operations: 1,
			..
		}
	));

	let operations = sink.operations();
	assert_eq!(operations.len(), 1);
	let op = &operations[0];
	assert_eq!(op.from, SENDER);
	assert_eq!(op.to, ROUTER);
	assert_eq!(op.tx_hash, SWAP_HASH);
	assert_eq!(op.chain_id, 56);
	assert_eq!(op.block_number, 100);
	assert_eq!(op.block_time, 1_700_000_000);
	assert_eq!(op.kind, OperationKind::Swap);

	assert_eq!(checkpoints.writes(), vec![(56, 100)]);
}

#[tokio::test]
async fn test_block_without_router_calls_still_advances_checkpoint() {
	let block = BlockBuilder::new()
		.number(7)
		.timestamp(1_700_000_000)
		.transaction(TransactionBuilder::new().from(SENDER).to(OTHER).build())
		.build();
	let client = Arc::new(FakeChain::new(56).with_block(block));
	let checkpoints = Arc::new(MemoryCheckpointStore::default());

	let mut sink = MockOperationSink::new();
	sink.expect_append_batch().times(0);

	let watcher = watcher(bsc(), client, checkpoints.clone(), Arc::new(sink));
	let outcome = watcher.iterate(Some(7)).await;

	assert!(matches!(
		outcome,
		IterationOutcome::Processed {
			block_number: 7,
			operations: 0,
			..
		}
	));
	assert_eq!(checkpoints.current(56), Some(7));
}

#[tokio::test]
async fn test_unrecoverable_sender_is_skipped() {
	let block = BlockBuilder::new()
		.number(12)
		.transaction(
			TransactionBuilder::new()
				.to(ROUTER)
				.input_hex("0xe8e33700")
				.build(),
		)
		.transaction(
			TransactionBuilder::new()
				.from(SENDER)
				.to(ROUTER)
				.input_hex("0xbaa2abde")
				.build(),
		)
		.build();
	let client = Arc::new(FakeChain::new(56).with_block(block));
	let sink = Arc::new(RecordingSink::default());
	let watcher = watcher(
		bsc(),
		client,
		Arc::new(MemoryCheckpointStore::default()),
		sink.clone(),
	);

	watcher.iterate(Some(12)).await;

	let operations = sink.operations();
	assert_eq!(operations.len(), 1);
	assert_eq!(operations[0].kind, OperationKind::RemoveLiquidity);
}

#[tokio::test]
async fn test_operations_keep_block_order() {
	let kinds = [
		("0xf305d719", OperationKind::AddLiquidity),
		("0x7ff36ab5", OperationKind::Swap),
		("0x02751cec", OperationKind::RemoveLiquidity),
	];
	let transactions = kinds
		.iter()
		.enumerate()
		.map(|(i, (selector, _))| {
			TransactionBuilder::new()
				.hash(B256::with_last_byte(i as u8 + 1))
				.from(SENDER)
				.to(ROUTER)
				.input_hex(selector)
				.build()
		})
		.collect();
	let block = BlockBuilder::new().number(3).transactions(transactions).build();

	let sink = Arc::new(RecordingSink::default());
	let watcher = watcher(
		bsc(),
		Arc::new(FakeChain::new(56).with_block(block)),
		Arc::new(MemoryCheckpointStore::default()),
		sink.clone(),
	);
	watcher.iterate(Some(3)).await;

	let batches = sink.batches();
	assert_eq!(batches.len(), 1);
	let recorded: Vec<_> = batches[0].iter().map(|op| (op.tx_hash, op.kind)).collect();
	let expected: Vec<_> = kinds
		.iter()
		.enumerate()
		.map(|(i, (_, kind))| (B256::with_last_byte(i as u8 + 1), *kind))
		.collect();
	assert_eq!(recorded, expected);
}

#[tokio::test]
async fn test_persist_failure_keeps_checkpoint() {
	let client = Arc::new(FakeChain::new(56).with_block(mixed_block(100)));

	let mut sink = MockOperationSink::new();
	sink.expect_append_batch()
		.times(1)
		.returning(|_| Err(SinkError::write_error("disk full", None, None)));

	let mut checkpoints = MockCheckpointStore::new();
	checkpoints.expect_set().times(0);

	let watcher = watcher(bsc(), client, Arc::new(checkpoints), Arc::new(sink));
	assert_eq!(
		watcher.iterate(Some(100)).await,
		IterationOutcome::PersistFailed { block_number: 100 }
	);
}

#[tokio::test]
async fn test_fetch_failure_touches_nothing() {
	let mut client = MockChainClient::new();
	client
		.expect_get_block_by_number()
		.times(1)
		.returning(|_| Err(BlockChainError::connection_error("timeout", None, None)));

	let mut sink = MockOperationSink::new();
	sink.expect_append_batch().times(0);
	let mut checkpoints = MockCheckpointStore::new();
	checkpoints.expect_set().times(0);

	let watcher = watcher(bsc(), Arc::new(client), Arc::new(checkpoints), Arc::new(sink));
	assert_eq!(watcher.iterate(Some(5)).await, IterationOutcome::FetchFailed);
}

#[tokio::test]
async fn test_checkpoint_write_failure_still_processes_block() {
	let client = Arc::new(FakeChain::new(56).with_block(mixed_block(100)));
	let sink = Arc::new(RecordingSink::default());

	let mut checkpoints = MockCheckpointStore::new();
	checkpoints
		.expect_set()
		.times(1)
		.returning(|_, _| Err(CheckpointError::write_error("read-only", None, None)));

	let watcher = watcher(bsc(), client, Arc::new(checkpoints), sink.clone());
	assert!(matches!(
		watcher.iterate(Some(100)).await,
		IterationOutcome::Processed {
			block_number: 100,
			..
		}
	));
	assert_eq!(sink.operations().len(), 1);
}

#[tokio::test]
async fn test_latest_mode_uses_block_number() {
	let client = Arc::new(
		FakeChain::new(56)
			.with_block(BlockBuilder::new().number(76).build())
			.with_block(BlockBuilder::new().number(77).build()),
	);
	let checkpoints = Arc::new(MemoryCheckpointStore::default());
	let watcher = watcher(bsc(), client.clone(), checkpoints.clone(), Arc::new(RecordingSink::default()));

	assert_eq!(watcher.resolve_start().await.unwrap(), None);
	assert!(matches!(
		watcher.iterate(None).await,
		IterationOutcome::Processed {
			block_number: 77,
			..
		}
	));
	assert_eq!(client.requested(), vec![None]);
	assert_eq!(checkpoints.current(56), Some(77));
}

/// Unix seconds of the wall clock, the precision block headers carry
fn now_s() -> u64 {
	chrono::Utc::now().timestamp() as u64
}

#[tokio::test]
async fn test_fresh_block_is_paced_to_block_interval() {
	let chain = ChainConfigBuilder::new()
		.chain_id(56)
		.block_time_ms(3000)
		.deviation_ms(1000)
		.build();
	let client = Arc::new(
		FakeChain::new(56).with_block(BlockBuilder::new().number(200).timestamp(now_s()).build()),
	);
	let watcher = watcher(
		chain,
		client,
		Arc::new(MemoryCheckpointStore::default()),
		Arc::new(RecordingSink::default()),
	);

	match watcher.iterate(Some(200)).await {
		IterationOutcome::Processed {
			block_number: 200,
			pacing: Some(delay),
			..
		} => {
			// Header timestamps are whole seconds, so up to a second may already count as elapsed
			assert!(delay <= Duration::from_millis(2000), "delay {:?}", delay);
			assert!(delay >= Duration::from_millis(500), "delay {:?}", delay);
		}
		other => panic!("expected a paced block, got {:?}", other),
	}
}

#[tokio::test(start_paused = true)]
async fn test_run_waits_for_block_interval_before_next_fetch() {
	let chain = ChainConfigBuilder::new()
		.chain_id(56)
		.block_time_ms(10_000)
		.deviation_ms(1000)
		.fetch_retry_ms(10)
		.build();
	let client = Arc::new(
		FakeChain::new(56).with_block(BlockBuilder::new().number(10).timestamp(now_s()).build()),
	);
	let checkpoints = Arc::new(MemoryCheckpointStore::with_checkpoint(56, 9));
	let watcher = Arc::new(watcher(
		chain,
		client.clone(),
		checkpoints.clone(),
		Arc::new(RecordingSink::default()),
	));

	let (shutdown, shutdown_rx) = watch::channel(false);
	let task = {
		let watcher = watcher.clone();
		tokio::spawn(async move { watcher.run(shutdown_rx).await })
	};

	tokio::time::timeout(Duration::from_secs(60), async {
		while client.requested().len() < 2 {
			tokio::time::sleep(Duration::from_millis(100)).await;
		}
	})
	.await
	.expect("second fetch never happened");
	shutdown.send(true).unwrap();
	task.await.unwrap().unwrap();

	assert_eq!(&client.requested()[..2], &[Some(10), Some(11)]);
	assert_eq!(checkpoints.writes(), vec![(56, 10)]);

	let times = client.request_times();
	let gap = times[1] - times[0];
	// 10s interval minus 1s deviation minus what already elapsed since the header timestamp
	assert!(gap >= Duration::from_secs(8), "gap {:?}", gap);
	assert!(gap < Duration::from_millis(9100), "gap {:?}", gap);
}

#[tokio::test]
async fn test_resolve_start() {
	let cases = [
		(Some(100), None, Some(101)),
		(Some(100), Some(500), Some(500)),
		(Some(100), Some(50), Some(101)),
		(Some(100), Some(100), Some(101)),
		(None, Some(500), Some(500)),
		(None, None, None),
	];

	for (checkpoint, start_block, expected) in cases {
		let checkpoints = match checkpoint {
			Some(block) => MemoryCheckpointStore::with_checkpoint(56, block),
			None => MemoryCheckpointStore::default(),
		};
		let mut builder = ChainConfigBuilder::new().chain_id(56);
		if let Some(start) = start_block {
			builder = builder.start_block(start);
		}
		let watcher = watcher(
			builder.build(),
			Arc::new(FakeChain::new(56)),
			Arc::new(checkpoints),
			Arc::new(RecordingSink::default()),
		);

		assert_eq!(
			watcher.resolve_start().await.unwrap(),
			expected,
			"checkpoint {:?}, start {:?}",
			checkpoint,
			start_block
		);
	}
}

#[tokio::test]
async fn test_resolve_start_read_failure() {
	let mut checkpoints = MockCheckpointStore::new();
	checkpoints
		.expect_get()
		.returning(|_| Err(CheckpointError::connection_error("redis down", None, None)));

	let watcher = watcher(
		bsc(),
		Arc::new(FakeChain::new(56)),
		Arc::new(checkpoints),
		Arc::new(RecordingSink::default()),
	);
	assert!(matches!(
		watcher.resolve_start().await,
		Err(BlockWatcherError::StorageError(_))
	));
}

#[tokio::test]
async fn test_invalid_router_address() {
	let chain = ChainConfigBuilder::new().router_address("not-an-address").build();
	let result = ChainWatcher::new(
		chain,
		Arc::new(FakeChain::new(1)),
		Arc::new(MethodClassifier::default()),
		Arc::new(MemoryCheckpointStore::default()),
		Arc::new(RecordingSink::default()),
	);
	assert!(matches!(result, Err(BlockWatcherError::ConfigError(_))));
}

#[tokio::test]
async fn test_chain_id_mismatch_stops_before_fetching() {
	let client = Arc::new(FakeChain::new(97).with_block(mixed_block(100)));
	let checkpoints = Arc::new(MemoryCheckpointStore::default());
	let watcher = watcher(bsc(), client.clone(), checkpoints.clone(), Arc::new(RecordingSink::default()));

	let (_shutdown, shutdown_rx) = watch::channel(false);
	let result = watcher.run(shutdown_rx).await;

	match result {
		Err(BlockWatcherError::ConfigError(ctx)) => {
			assert!(ctx.message.contains("97"));
			assert!(ctx.message.contains("56"));
		}
		other => panic!("expected configuration error, got {:?}", other),
	}
	assert!(client.requested().is_empty());
	assert!(checkpoints.writes().is_empty());
}

#[tokio::test]
async fn test_unreachable_node_is_fatal() {
	let mut client = MockChainClient::new();
	client
		.expect_get_chain_id()
		.returning(|| Err(BlockChainError::connection_error("refused", None, None)));
	client.expect_get_block_by_number().times(0);

	let watcher = watcher(
		bsc(),
		Arc::new(client),
		Arc::new(MemoryCheckpointStore::default()),
		Arc::new(RecordingSink::default()),
	);
	let (_shutdown, shutdown_rx) = watch::channel(false);
	assert!(matches!(
		watcher.run(shutdown_rx).await,
		Err(BlockWatcherError::ConfigError(_))
	));
}

async fn wait_for_checkpoint(store: &MemoryCheckpointStore, chain_id: u64, block: u64) {
	tokio::time::timeout(Duration::from_secs(5), async {
		while store.current(chain_id) != Some(block) {
			tokio::time::sleep(Duration::from_millis(5)).await;
		}
	})
	.await
	.expect("checkpoint was not reached in time");
}

#[tokio::test]
async fn test_run_resumes_after_checkpoint_and_stops_on_shutdown() {
	let client = Arc::new(
		FakeChain::new(56)
			.with_block(mixed_block(10))
			.with_block(mixed_block(11))
			.with_block(mixed_block(12))
			.with_block(mixed_block(13)),
	);
	let checkpoints = Arc::new(MemoryCheckpointStore::with_checkpoint(56, 10));
	let sink = Arc::new(RecordingSink::default());
	let watcher = Arc::new(watcher(bsc(), client.clone(), checkpoints.clone(), sink.clone()));

	let (shutdown, shutdown_rx) = watch::channel(false);
	let task = {
		let watcher = watcher.clone();
		tokio::spawn(async move { watcher.run(shutdown_rx).await })
	};

	wait_for_checkpoint(&checkpoints, 56, 13).await;
	shutdown.send(true).unwrap();
	let result = tokio::time::timeout(Duration::from_secs(5), task)
		.await
		.expect("watcher did not stop")
		.unwrap();
	assert!(result.is_ok());

	assert_eq!(checkpoints.writes(), vec![(56, 11), (56, 12), (56, 13)]);
	let blocks: Vec<u64> = sink.operations().iter().map(|op| op.block_number).collect();
	assert_eq!(blocks, vec![11, 12, 13]);

	// Block 14 does not exist yet; the watcher keeps asking for it
	let requested = client.requested();
	assert_eq!(&requested[..3], &[Some(11), Some(12), Some(13)]);
	assert!(requested[3..].iter().all(|n| *n == Some(14)));
}

#[tokio::test]
async fn test_run_picks_up_new_blocks() {
	let client = Arc::new(FakeChain::new(56));
	let checkpoints = Arc::new(MemoryCheckpointStore::default());
	let chain = ChainConfigBuilder::new()
		.chain_id(56)
		.router_address("0x000000000000000000000000000000000000abcd")
		.start_block(500)
		.fetch_retry_ms(10)
		.build();
	let watcher = Arc::new(watcher(chain, client.clone(), checkpoints.clone(), Arc::new(RecordingSink::default())));

	let (shutdown, shutdown_rx) = watch::channel(false);
	let task = {
		let watcher = watcher.clone();
		tokio::spawn(async move { watcher.run(shutdown_rx).await })
	};

	tokio::time::sleep(Duration::from_millis(30)).await;
	assert_eq!(checkpoints.current(56), None);

	client.push_block(mixed_block(500));
	wait_for_checkpoint(&checkpoints, 56, 500).await;

	drop(shutdown);
	assert!(tokio::time::timeout(Duration::from_secs(5), task)
		.await
		.expect("watcher did not stop")
		.unwrap()
		.is_ok());
}

#[tokio::test]
async fn test_persist_failure_retries_same_block() {
	let client = Arc::new(FakeChain::new(56).with_block(mixed_block(100)));
	let checkpoints = Arc::new(MemoryCheckpointStore::with_checkpoint(56, 99));

	let attempts = Arc::new(AtomicUsize::new(0));
	let mut sink = MockOperationSink::new();
	{
		let attempts = attempts.clone();
		sink.expect_append_batch().returning(move |_| {
			if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
				Err(SinkError::connection_error("db down", None, None))
			} else {
				Ok(())
			}
		});
	}

	let watcher = Arc::new(watcher(bsc(), client.clone(), checkpoints.clone(), Arc::new(sink)));
	let (shutdown, shutdown_rx) = watch::channel(false);
	let task = {
		let watcher = watcher.clone();
		tokio::spawn(async move { watcher.run(shutdown_rx).await })
	};

	wait_for_checkpoint(&checkpoints, 56, 100).await;
	shutdown.send(true).unwrap();
	tokio::time::timeout(Duration::from_secs(5), task)
		.await
		.expect("watcher did not stop")
		.unwrap()
		.unwrap();

	assert_eq!(attempts.load(Ordering::SeqCst), 3);
	assert_eq!(checkpoints.writes(), vec![(56, 100)]);
	assert_eq!(
		&client.requested()[..3],
		&[Some(100), Some(100), Some(100)]
	);
}
