//! Defaults shared by the binary and the bootstrap code.

/// Directory holding one JSON file per watched chain
pub const DEFAULT_CHAIN_CONFIG_DIR: &str = "config/chains";

/// Prefix of checkpoint keys, `<namespace>:<chainId>`
pub const DEFAULT_CHECKPOINT_NAMESPACE: &str = "CACHES:LISTEN:OLD_BLOCK";

/// Directory used by the file checkpoint store
pub const DEFAULT_CHECKPOINT_DIR: &str = "data/checkpoints";

/// File used by the JSON lines operation sink
pub const DEFAULT_SINK_PATH: &str = "data/sender_operations.jsonl";

/// Address of the metrics server when none is given
pub const DEFAULT_METRICS_ADDRESS: &str = "127.0.0.1:8081";
