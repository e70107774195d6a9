//! Prometheus metrics.
//!
//! - A process-wide registry exposed by the metrics server
//! - Host gauges refreshed on every scrape
//! - Per-chain watcher counters updated from the watch loop

pub mod server;
use lazy_static::lazy_static;
use prometheus::{
	Encoder, Gauge, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder,
};
use std::collections::HashMap;
use sysinfo::{Disks, System};

use crate::models::{ChainConfig, OperationKind};

lazy_static! {
	/// Global Prometheus registry.
	pub static ref REGISTRY: Registry = Registry::new();

	/// Current CPU usage across all cores (0-100).
	pub static ref CPU_USAGE: Gauge = {
		let gauge = Gauge::new("cpu_usage_percentage", "Current CPU usage percentage").unwrap();
		REGISTRY.register(Box::new(gauge.clone())).unwrap();
		gauge
	};

	pub static ref MEMORY_USAGE_PERCENT: Gauge = {
		let gauge = Gauge::new("memory_usage_percentage", "Memory usage percentage").unwrap();
		REGISTRY.register(Box::new(gauge.clone())).unwrap();
		gauge
	};

	pub static ref MEMORY_USAGE: Gauge = {
		let gauge = Gauge::new("memory_usage_bytes", "Memory usage in bytes").unwrap();
		REGISTRY.register(Box::new(gauge.clone())).unwrap();
		gauge
	};

	pub static ref TOTAL_MEMORY: Gauge = {
		let gauge = Gauge::new("total_memory_bytes", "Total memory in bytes").unwrap();
		REGISTRY.register(Box::new(gauge.clone())).unwrap();
		gauge
	};

	/// Used disk space summed over all mounted filesystems.
	pub static ref DISK_USAGE: Gauge = {
		let gauge = Gauge::new("disk_usage_bytes", "Used disk space in bytes").unwrap();
		REGISTRY.register(Box::new(gauge.clone())).unwrap();
		gauge
	};

	/// Number of chains loaded from the configuration directory.
	pub static ref CHAINS_CONFIGURED: IntGauge = {
		let gauge = IntGauge::new("chains_configured", "Number of configured chains").unwrap();
		REGISTRY.register(Box::new(gauge.clone())).unwrap();
		gauge
	};

	/// Blocks fully processed, per chain.
	pub static ref BLOCKS_PROCESSED: IntCounterVec = {
		let counter = IntCounterVec::new(
			Opts::new("blocks_processed_total", "Blocks processed per chain"),
			&["chain"]
		).unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Sender operations handed to the sink, per chain and operation kind.
	pub static ref SENDER_OPERATIONS: IntCounterVec = {
		let counter = IntCounterVec::new(
			Opts::new("sender_operations_total", "Sender operations extracted per chain and kind"),
			&["chain", "kind"]
		).unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	pub static ref BLOCK_FETCH_FAILURES: IntCounterVec = {
		let counter = IntCounterVec::new(
			Opts::new("block_fetch_failures_total", "Failed block fetches per chain"),
			&["chain"]
		).unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	pub static ref PERSIST_FAILURES: IntCounterVec = {
		let counter = IntCounterVec::new(
			Opts::new("persist_failures_total", "Failed sink or checkpoint writes per chain"),
			&["chain"]
		).unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Last block number processed, per chain.
	pub static ref LAST_PROCESSED_BLOCK: IntGaugeVec = {
		let gauge = IntGaugeVec::new(
			Opts::new("last_processed_block", "Last processed block number per chain"),
			&["chain"]
		).unwrap();
		REGISTRY.register(Box::new(gauge.clone())).unwrap();
		gauge
	};
}

/// Gather all metrics and encode them in the Prometheus text format.
pub fn gather_metrics() -> Result<Vec<u8>, Box<dyn std::error::Error>> {
	let encoder = TextEncoder::new();
	let metric_families = REGISTRY.gather();
	let mut buffer = Vec::new();
	encoder.encode(&metric_families, &mut buffer)?;
	Ok(buffer)
}

/// Refreshes host CPU, memory and disk gauges.
pub fn update_system_metrics() {
	let mut sys = System::new_all();
	sys.refresh_all();

	CPU_USAGE.set(sys.global_cpu_usage() as f64);

	let total_memory = sys.total_memory();
	let memory_usage = sys.used_memory();
	TOTAL_MEMORY.set(total_memory as f64);
	MEMORY_USAGE.set(memory_usage as f64);
	MEMORY_USAGE_PERCENT.set(if total_memory > 0 {
		(memory_usage as f64 / total_memory as f64) * 100.0
	} else {
		0.0
	});

	let disks = Disks::new_with_refreshed_list();
	let used: u64 = disks
		.list()
		.iter()
		.map(|disk| disk.total_space().saturating_sub(disk.available_space()))
		.sum();
	DISK_USAGE.set(used as f64);
}

pub fn update_chain_metrics(chains: &HashMap<String, ChainConfig>) {
	CHAINS_CONFIGURED.set(chains.len() as i64);
}

/// Records one processed block and the operations it produced.
pub fn record_block_processed(chain: &str, block_number: u64, kinds: &[OperationKind]) {
	BLOCKS_PROCESSED.with_label_values(&[chain]).inc();
	LAST_PROCESSED_BLOCK
		.with_label_values(&[chain])
		.set(i64::try_from(block_number).unwrap_or(i64::MAX));
	for kind in kinds {
		SENDER_OPERATIONS
			.with_label_values(&[chain, kind.as_str()])
			.inc();
	}
}

pub fn record_fetch_failure(chain: &str) {
	BLOCK_FETCH_FAILURES.with_label_values(&[chain]).inc();
}

pub fn record_persist_failure(chain: &str) {
	PERSIST_FAILURES.with_label_values(&[chain]).inc();
}
