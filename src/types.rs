//! 缓存配置类型

use crate::consts::DEFAULT_CHUNK_CACHE_CAPACITY;

/// chunk 缓存配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkCacheConfig {
    /// 最大缓存字节数
    pub capacity: usize,
    /// 插入时记录 CRC32，并在 `verify` 时重新校验
    pub track_checksums: bool,
}

impl ChunkCacheConfig {
    /// 指定容量，其余使用默认值
    pub const fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            track_checksums: false,
        }
    }
}

impl Default for ChunkCacheConfig {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CHUNK_CACHE_CAPACITY)
    }
}
