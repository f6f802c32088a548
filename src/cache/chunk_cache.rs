//! chunk 缓存实现
//!
//! [`ChunkCache`] 把三部分组合在一起：
//!
//! - [`ChunkStore`]：按 `(key, offset)` 排序的 chunk 记录
//! - [`LruTracker`]：可驱逐 / 固定两个 LRU 链表
//! - 容量统计：`used <= capacity`
//!
//! 缓存是被动的：不做任何 I/O，只响应 get / put / evict。
//!
//! ```text
//! get(key, off) ──hit──> 提升到 LRU 头部，返回 ChunkRef
//!       │
//!      miss ──> 调用者自行读取数据
//!               evict_memory(size)   // 可选，为新 chunk 腾空间
//!               put(key, flags, data, off)
//! ```

use alloc::boxed::Box;

use super::chunk::{Chunk, ChunkFlags, ChunkRef};
use super::debug::KeyResolver;
use super::lru::LruTracker;
use super::store::ChunkStore;
use crate::error::{Error, ErrorKind, Result};
use crate::types::ChunkCacheConfig;

/// 缓存统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// `get` 调用次数
    pub total_accesses: u64,
    /// 命中次数
    pub hits: u64,
    /// 未命中次数
    pub misses: u64,
    /// 成功插入次数
    pub insertions: u64,
    /// 被拒绝的插入（空间不足、重复、空数据）
    pub rejected: u64,
    /// 因容量压力被驱逐的 chunk 数
    pub evictions: u64,
    /// 因 `evict_key` 被移除的 chunk 数
    pub key_evictions: u64,
}

impl CacheStats {
    /// 计算命中率
    pub fn hit_rate(&self) -> f64 {
        if self.total_accesses == 0 {
            0.0
        } else {
            self.hits as f64 / self.total_accesses as f64
        }
    }
}

/// chunk 缓存
///
/// 单线程数据结构：所有修改操作（包括会提升 LRU 的 `get`）都需要 `&mut self`。
/// 多线程使用时调用者需要在外部加锁，参见 `SharedChunkCache`（`std` 特性）。
///
/// # 示例
///
/// ```rust,ignore
/// use resource_chunk_cache::{ChunkCache, ChunkFlags};
///
/// let mut cache = ChunkCache::new(64 * 1024);
///
/// if cache.get(path_hash, offset).is_none() {
///     let data = read_from_archive(path_hash, offset)?;
///     cache.evict_memory(data.len());
///     cache.put(path_hash, ChunkFlags::empty(), &data, offset)?;
/// }
/// ```
pub struct ChunkCache {
    pub(super) store: ChunkStore,
    pub(super) lru: LruTracker,
    pub(super) capacity: usize,
    pub(super) used: usize,
    /// 固定 chunk 占用的字节数（包含在 `used` 中）
    pub(super) pinned: usize,
    track_checksums: bool,
    stats: CacheStats,
    pub(super) resolver: Option<Box<dyn KeyResolver + Send>>,
}

impl ChunkCache {
    /// 创建指定容量（字节）的缓存
    pub fn new(capacity: usize) -> Self {
        Self::with_config(ChunkCacheConfig::with_capacity(capacity))
    }

    /// 按配置创建缓存
    pub fn with_config(config: ChunkCacheConfig) -> Self {
        let mut store = ChunkStore::new();
        let lru = LruTracker::new(&mut store);
        Self {
            store,
            lru,
            capacity: config.capacity,
            used: 0,
            pinned: 0,
            track_checksums: config.track_checksums,
            stats: CacheStats::default(),
            resolver: None,
        }
    }

    /// 查找覆盖 `offset` 的 chunk
    ///
    /// 命中时把 chunk 移到所在 LRU 链表头部。返回的视图借用缓存，
    /// 在下一次修改缓存之前有效。
    pub fn get(&mut self, key: u64, offset: u64) -> Option<ChunkRef<'_>> {
        self.stats.total_accesses += 1;

        let Some(id) = self.store.lookup(key, offset) else {
            self.stats.misses += 1;
            log::trace!("[CHUNK_CACHE] get key={:#018x} offset={} MISS", key, offset);
            return None;
        };

        self.stats.hits += 1;
        self.lru.touch(&mut self.store, id);
        let chunk = self.store.chunk(id);
        log::trace!(
            "[CHUNK_CACHE] get key={:#018x} offset={} HIT chunk=[{}, +{})",
            key,
            offset,
            chunk.offset,
            chunk.size()
        );
        Some(chunk.as_chunk_ref())
    }

    /// 与 `get` 相同的查找，但不改变 LRU 顺序和统计信息
    pub fn peek(&self, key: u64, offset: u64) -> Option<ChunkRef<'_>> {
        self.store
            .lookup(key, offset)
            .map(|id| self.store.chunk(id).as_chunk_ref())
    }

    /// 是否存在起始于 `offset` 的 chunk
    pub fn contains(&self, key: u64, offset: u64) -> bool {
        self.store.find(key, offset).is_some()
    }

    /// 插入 chunk
    ///
    /// 数据会被复制，缓存不持有调用者的缓冲区。
    ///
    /// # 错误
    ///
    /// - `NoSpace`：剩余空间放不下 `data`。插入本身不会驱逐，调用者应先调用
    ///   [`evict_memory`](Self::evict_memory)
    /// - `AlreadyExists`：`(key, offset)` 已存在，旧数据不会被覆盖
    /// - `InvalidInput`：`data` 为空
    ///
    /// 失败时不修改缓存内容（只计入 `stats().rejected`）。
    ///
    /// 同一 key 的 chunk 不应互相重叠（I/O 层按固定步长切分）；
    /// 此处只检查起始偏移完全相同的情况。
    pub fn put(&mut self, key: u64, flags: ChunkFlags, data: &[u8], offset: u64) -> Result<()> {
        let size = data.len();

        if size == 0 {
            self.stats.rejected += 1;
            log::error!("[CHUNK_CACHE] put key={:#018x} offset={} rejected: empty chunk", key, offset);
            return Err(Error::new(ErrorKind::InvalidInput, "Chunk data is empty"));
        }

        if !self.can_fit(size) {
            self.stats.rejected += 1;
            log::error!(
                "[CHUNK_CACHE] put key={:#018x} offset={} size={} rejected: cache full ({}/{})",
                key,
                offset,
                size,
                self.used,
                self.capacity
            );
            return Err(Error::new(ErrorKind::NoSpace, "Chunk does not fit in the cache"));
        }

        if self.store.find(key, offset).is_some() {
            self.stats.rejected += 1;
            log::error!(
                "[CHUNK_CACHE] put key={:#018x} offset={} size={} rejected: chunk already cached",
                key,
                offset,
                size
            );
            return Err(Error::new(
                ErrorKind::AlreadyExists,
                "Chunk with the same key and offset is already cached",
            ));
        }

        let chunk = Chunk::new(key, offset, flags, data.to_vec(), self.track_checksums);
        let pinned = chunk.is_pinned();
        let id = self.store.insert(chunk)?;
        self.lru.link(&mut self.store, id);

        self.used += size;
        if pinned {
            self.pinned += size;
        }
        self.stats.insertions += 1;

        log::debug!(
            "[CHUNK_CACHE] put key={:#018x} offset={} size={} pinned={} used={}/{}",
            key,
            offset,
            size,
            pinned,
            self.used,
            self.capacity
        );
        Ok(())
    }

    /// 剩余空间是否能放下 `size` 字节
    #[inline]
    pub fn can_fit(&self, size: usize) -> bool {
        matches!(self.capacity.checked_sub(self.used), Some(free) if size <= free)
    }

    /// 按 LRU 顺序驱逐可驱逐 chunk，直到能放下 `size` 字节
    ///
    /// 固定 chunk 从不被驱逐。没有可驱逐 chunk 时提前停止。
    ///
    /// # 返回
    ///
    /// 结束时是否能放下 `size` 字节（无需驱逐时同样返回 `true`）
    pub fn evict_memory(&mut self, size: usize) -> bool {
        while !self.can_fit(size) {
            let Some(victim) = self.lru.victim(&self.store) else {
                log::debug!(
                    "[CHUNK_CACHE] evict_memory size={} stopped: no evictable chunks ({}/{}, pinned={})",
                    size,
                    self.used,
                    self.capacity,
                    self.pinned
                );
                break;
            };

            self.lru.unlink(&mut self.store, victim);
            let index = self.store.find_index(victim);
            let removed = self.store.remove_range(index, 1);

            self.used -= removed.bytes;
            self.stats.evictions += removed.chunks as u64;
            log::debug!(
                "[CHUNK_CACHE] evicted {} bytes, used={}/{}",
                removed.bytes,
                self.used,
                self.capacity
            );
        }

        self.can_fit(size)
    }

    /// 移除 `key` 的所有 chunk（包括固定 chunk）
    ///
    /// 这些 chunk 在有序索引中是连续的，一次性移除。
    ///
    /// # 返回
    ///
    /// 移除的 chunk 数；key 不存在时为 0
    pub fn evict_key(&mut self, key: u64) -> usize {
        let start = self.store.lower_bound(key);
        let count = self.store.run_len(start, key);
        if count == 0 {
            return 0;
        }

        for index in start..start + count {
            let id = self.store.id_at(index);
            self.lru.unlink(&mut self.store, id);
        }
        let removed = self.store.remove_range(start, count);

        self.used -= removed.bytes;
        self.pinned -= removed.pinned_bytes;
        self.stats.key_evictions += removed.chunks as u64;

        log::debug!(
            "[CHUNK_CACHE] evict_key key={:#018x} removed {} chunks ({} bytes), used={}/{}",
            key,
            removed.chunks,
            removed.bytes,
            self.used,
            self.capacity
        );
        removed.chunks
    }

    /// 调整容量
    ///
    /// 缩小时按 LRU 顺序驱逐可驱逐 chunk。
    ///
    /// # 错误
    ///
    /// 固定 chunk 的总大小已超过 `capacity` 时返回 `NoSpace`，容量保持不变。
    pub fn set_capacity(&mut self, capacity: usize) -> Result<()> {
        if self.pinned > capacity {
            log::warn!(
                "[CHUNK_CACHE] set_capacity {} refused: {} bytes are pinned",
                capacity,
                self.pinned
            );
            return Err(Error::new(
                ErrorKind::NoSpace,
                "Pinned chunks exceed the requested capacity",
            ));
        }

        log::debug!("[CHUNK_CACHE] set_capacity {} -> {}", self.capacity, capacity);
        self.capacity = capacity;
        self.evict_memory(0);
        Ok(())
    }

    /// 清空缓存（包括固定 chunk）
    pub fn clear(&mut self) {
        self.store = ChunkStore::new();
        self.lru = LruTracker::new(&mut self.store);
        self.used = 0;
        self.pinned = 0;
    }

    /// 已使用的字节数
    #[inline]
    pub fn used_memory(&self) -> usize {
        self.used
    }

    /// 固定 chunk 占用的字节数
    #[inline]
    pub fn pinned_memory(&self) -> usize {
        self.pinned
    }

    /// 缓存容量（字节）
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 驻留 chunk 数量
    #[inline]
    pub fn num_chunks(&self) -> usize {
        self.store.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// 统计信息
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    /// 重置统计信息
    pub fn reset_stats(&mut self) {
        self.stats = CacheStats::default();
    }

    pub(super) fn track_checksums(&self) -> bool {
        self.track_checksums
    }
}

impl Default for ChunkCache {
    fn default() -> Self {
        Self::with_config(ChunkCacheConfig::default())
    }
}

impl core::fmt::Debug for ChunkCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChunkCache")
            .field("capacity", &self.capacity)
            .field("used", &self.used)
            .field("pinned", &self.pinned)
            .field("chunks", &self.store.len())
            .field("track_checksums", &self.track_checksums)
            .field("stats", &self.stats)
            .finish()
    }
}
