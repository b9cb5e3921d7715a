pub const VAULT_SEED: &[u8] = b"vault";
pub const SHARE_BALANCE_SEED: &[u8] = b"shares";

/// Fixed-point scale of `exchange_rate` (1e9 = one position unit per share).
pub const EXCHANGE_RATE_PRECISION: u64 = 1_000_000_000;

/// Fixed-point scale of the pool's reported virtual price.
pub const VIRTUAL_PRICE_PRECISION: u64 = 1_000_000_000_000_000_000;

/// Global namespace used when deriving collaborator instruction sighashes.
pub const SIGHASH_NAMESPACE: &str = "global";
