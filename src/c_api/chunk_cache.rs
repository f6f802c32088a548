//! C API 兼容层 - chunk 缓存
//!
//! 保留资源系统原有的函数命名和布尔状态返回值，
//! 所有函数都是 [`ChunkCache`] 方法的简单包装。

use crate::cache::{ChunkCache, ChunkFlags, ChunkRef};

/// chunk 固定标志，对应 [`ChunkFlags::NO_EVICT`]
pub const RESOURCE_CHUNK_CACHE_NO_EVICT: u32 = ChunkFlags::NO_EVICT.bits();

/// C API: ResourceChunkCacheCreate
pub fn resource_chunk_cache_create(max_memory: usize) -> ChunkCache {
    ChunkCache::new(max_memory)
}

/// C API: ResourceChunkCacheDestroy
///
/// 释放全部 chunk 数据。
pub fn resource_chunk_cache_destroy(cache: ChunkCache) {
    drop(cache);
}

/// C API: ResourceChunkCacheGet
///
/// 命中时提升 LRU 顺序。
pub fn resource_chunk_cache_get(cache: &mut ChunkCache, path_hash: u64, offset: u64) -> Option<ChunkRef<'_>> {
    cache.get(path_hash, offset)
}

/// C API: ResourceChunkCachePut
///
/// `flags` 中的未知位被忽略。失败原因已由缓存记录到日志。
pub fn resource_chunk_cache_put(cache: &mut ChunkCache, path_hash: u64, flags: u32, data: &[u8], offset: u64) -> bool {
    cache
        .put(path_hash, ChunkFlags::from_bits_truncate(flags), data, offset)
        .is_ok()
}

/// C API: ResourceChunkCacheCanFit
pub fn resource_chunk_cache_can_fit(cache: &ChunkCache, size: usize) -> bool {
    cache.can_fit(size)
}

/// C API: ResourceChunkCacheEvictMemory
pub fn resource_chunk_cache_evict_memory(cache: &mut ChunkCache, size: usize) -> bool {
    cache.evict_memory(size)
}

/// C API: ResourceChunkCacheEvictPathHash
pub fn resource_chunk_cache_evict_path_hash(cache: &mut ChunkCache, path_hash: u64) {
    cache.evict_key(path_hash);
}

/// C API: ResourceChunkCacheGetUsedMemory
pub fn resource_chunk_cache_get_used_memory(cache: &ChunkCache) -> usize {
    cache.used_memory()
}

/// C API: ResourceChunkCacheDebugChunkCount
pub fn resource_chunk_cache_debug_chunk_count(cache: &ChunkCache) -> usize {
    cache.num_chunks()
}

/// C API: ResourceChunkCacheVerify
pub fn resource_chunk_cache_verify(cache: &ChunkCache) -> bool {
    cache.verify()
}

/// C API: ResourceChunkCacheDebugChunks
pub fn resource_chunk_cache_debug_chunks(cache: &ChunkCache) {
    cache.debug_dump();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_c_api_flow() {
        let mut cache = resource_chunk_cache_create(24);
        let data = [1u8; 8];

        assert!(resource_chunk_cache_put(&mut cache, 7, 0, &data, 0));
        assert!(resource_chunk_cache_put(&mut cache, 7, RESOURCE_CHUNK_CACHE_NO_EVICT, &data, 8));
        assert!(!resource_chunk_cache_put(&mut cache, 7, 0, &data, 0));
        assert_eq!(resource_chunk_cache_debug_chunk_count(&cache), 2);
        assert_eq!(resource_chunk_cache_get_used_memory(&cache), 16);

        assert_eq!(resource_chunk_cache_get(&mut cache, 7, 12).unwrap().offset, 8);
        assert!(resource_chunk_cache_can_fit(&cache, 8));
        assert!(!resource_chunk_cache_evict_memory(&mut cache, 24));
        assert_eq!(resource_chunk_cache_debug_chunk_count(&cache), 1);
        assert!(resource_chunk_cache_verify(&cache));

        resource_chunk_cache_debug_chunks(&cache);
        resource_chunk_cache_evict_path_hash(&mut cache, 7);
        assert_eq!(resource_chunk_cache_get_used_memory(&cache), 0);
        resource_chunk_cache_destroy(cache);
    }

    #[test]
    fn test_unknown_flag_bits_ignored() {
        let mut cache = resource_chunk_cache_create(8);
        assert!(resource_chunk_cache_put(&mut cache, 1, 0xf0, &[0; 8], 0));
        assert!(resource_chunk_cache_evict_memory(&mut cache, 8));
        assert_eq!(resource_chunk_cache_debug_chunk_count(&cache), 0);
    }
}
