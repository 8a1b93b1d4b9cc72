//! constants.rs
//! Run defaults, GPU layout constants and ZIP structural constants.

use std::time::Duration;

/// Defaults when a config field is zero or missing.
pub const DEFAULT_BATCH_SIZE: usize = 8192;
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_MIN_LEN: usize = 1;
pub const DEFAULT_MAX_LEN: usize = 8;

/// Bounded batch queue capacity = workers * QUEUE_DEPTH_PER_WORKER.
pub const QUEUE_DEPTH_PER_WORKER: usize = 2;

/// Stats stream buffer; oldest snapshot is evicted when full.
pub const STATS_CHANNEL_CAPACITY: usize = 8;

/// GPU device-side layout.
pub mod gpu {
    /// Maximum candidates per dispatch (per worker buffer set).
    pub const DEFAULT_BATCH_CAPACITY: usize = 4096;
    /// Fixed per-candidate slot in the packed password buffer, in bytes.
    pub const CANDIDATE_STRIDE_BYTES: usize = 256;
    pub const CANDIDATE_STRIDE_WORDS: usize = CANDIDATE_STRIDE_BYTES / 4;
    /// Length marker for candidates that do not fit a slot; the kernel skips them.
    pub const OVERLONG_MARKER: u32 = u32::MAX;
    /// Must match `@workgroup_size` in the kernel.
    pub const WORKGROUP_SIZE: u32 = 64;
    /// Cipher header params: 3 header words, check byte, active count, 3 pad.
    pub const PARAMS_WORDS: usize = 8;
    pub const PARAMS_COUNT_OFFSET: u64 = 16;
    pub const DEFAULT_KERNEL_PATH: &str = "shaders/zipcrack.wgsl";
    pub const KERNEL_ENTRY_POINT: &str = "main";
}

/// ZIP record signatures and fixed sizes (APPNOTE 4.3).
pub mod zip_format {
    pub const EOCD_SIGNATURE: u32 = 0x0605_4b50;
    pub const CENTRAL_SIGNATURE: u32 = 0x0201_4b50;
    pub const LOCAL_SIGNATURE: u32 = 0x0403_4b50;

    pub const EOCD_LEN: usize = 22;
    pub const CENTRAL_HEADER_LEN: usize = 46;
    pub const LOCAL_HEADER_LEN: usize = 30;

    /// Traditional cipher header prepended to the encrypted payload.
    pub const CIPHER_HEADER_LEN: usize = 12;
}

/// Traditional PKWARE cipher initial key state.
pub mod cipher_keys {
    pub const KEY0: u32 = 0x1234_5678;
    pub const KEY1: u32 = 0x2345_6789;
    pub const KEY2: u32 = 0x3456_7890;
    pub const KEY1_MULTIPLIER: u32 = 134_775_813;
}
