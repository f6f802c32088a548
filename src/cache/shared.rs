//! 带锁的共享缓存
//!
//! [`ChunkCache`] 本身不做同步。多线程环境下每个缓存实例配一把互斥锁，
//! 所有调用都在锁内完成。

use std::sync::{Mutex, MutexGuard};
use std::vec::Vec;

use super::chunk::ChunkFlags;
use super::chunk_cache::ChunkCache;
use crate::error::{Error, ErrorKind, Result};

/// 锁外可用的 chunk 副本
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedChunk {
    /// chunk 起始偏移
    pub offset: u64,
    /// chunk 数据
    pub data: Vec<u8>,
}

/// 互斥锁保护的 chunk 缓存
#[derive(Debug)]
pub struct SharedChunkCache {
    inner: Mutex<ChunkCache>,
}

impl SharedChunkCache {
    /// 包装已有缓存
    pub fn new(cache: ChunkCache) -> Self {
        Self {
            inner: Mutex::new(cache),
        }
    }

    /// 创建指定容量的缓存
    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(ChunkCache::new(capacity))
    }

    fn lock(&self) -> Result<MutexGuard<'_, ChunkCache>> {
        self.inner
            .lock()
            .map_err(|_| Error::new(ErrorKind::Busy, "Chunk cache lock is poisoned"))
    }

    /// 在一次加锁内执行任意操作序列
    pub fn with<R>(&self, f: impl FnOnce(&mut ChunkCache) -> R) -> Result<R> {
        let mut cache = self.lock()?;
        Ok(f(&mut cache))
    }

    /// 查找并复制覆盖 `offset` 的 chunk
    pub fn get_owned(&self, key: u64, offset: u64) -> Result<Option<OwnedChunk>> {
        let mut cache = self.lock()?;
        Ok(cache.get(key, offset).map(|chunk| OwnedChunk {
            offset: chunk.offset,
            data: chunk.data.to_vec(),
        }))
    }

    /// 插入 chunk，参见 [`ChunkCache::put`]
    pub fn put(&self, key: u64, flags: ChunkFlags, data: &[u8], offset: u64) -> Result<()> {
        self.lock()?.put(key, flags, data, offset)
    }

    /// 先驱逐再插入，两步在同一次加锁内完成
    pub fn put_evicting(&self, key: u64, flags: ChunkFlags, data: &[u8], offset: u64) -> Result<()> {
        let mut cache = self.lock()?;
        cache.evict_memory(data.len());
        cache.put(key, flags, data, offset)
    }

    /// 参见 [`ChunkCache::evict_memory`]
    pub fn evict_memory(&self, size: usize) -> Result<bool> {
        Ok(self.lock()?.evict_memory(size))
    }

    /// 参见 [`ChunkCache::evict_key`]
    pub fn evict_key(&self, key: u64) -> Result<usize> {
        Ok(self.lock()?.evict_key(key))
    }

    /// 已使用的字节数
    pub fn used_memory(&self) -> Result<usize> {
        Ok(self.lock()?.used_memory())
    }

    /// 取回内部缓存
    pub fn into_inner(self) -> Result<ChunkCache> {
        self.inner
            .into_inner()
            .map_err(|_| Error::new(ErrorKind::Busy, "Chunk cache lock is poisoned"))
    }
}
