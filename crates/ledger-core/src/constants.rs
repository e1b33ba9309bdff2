pub const BYTE: usize = 8;
pub const HASH_SIZE: usize = 32;
pub const HASH_BITS: u32 = (HASH_SIZE * BYTE) as u32;
pub const DEFAULT_DIFFICULTY_BITS: u32 = 16;
/// Exclusive upper bound of the nonce search space (62 bits).
pub const MAX_NONCE: u64 = 1 << 62;
pub const GENESIS_DATA: &str = "Genesis Block";
pub const BLOCKS_TREE: &str = "blocks";
/// Reserved key holding the tip hash. One byte long, so it can never collide
/// with a block key.
pub const TIP_KEY: &[u8] = b"l";
/// Reserved key holding the difficulty the chain was mined at (u32, big-endian).
pub const DIFFICULTY_KEY: &[u8] = b"d";
