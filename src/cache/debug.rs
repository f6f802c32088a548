//! 诊断：缓存转储与一致性校验
//!
//! 这些接口只用于调试和测试，不参与正常的 get / put / evict 流程。

use alloc::boxed::Box;
use alloc::string::String;
use core::fmt::{self, Write};

use super::chunk_cache::ChunkCache;
use crate::consts::UNKNOWN_KEY_NAME;
use crate::error::{Error, ErrorKind, Result};

/// key 反查接口
///
/// 把 64 位路径哈希还原为可读的路径，仅用于转储。
/// 任何 `Fn(u64) -> Option<String>` 闭包都实现了此 trait。
pub trait KeyResolver {
    /// 返回 `key` 对应的路径；未知时返回 `None`
    fn resolve(&self, key: u64) -> Option<String>;
}

impl<F> KeyResolver for F
where
    F: Fn(u64) -> Option<String>,
{
    fn resolve(&self, key: u64) -> Option<String> {
        self(key)
    }
}

fn corrupted(message: &'static str) -> Error {
    Error::new(ErrorKind::Corrupted, message)
}

impl ChunkCache {
    /// 注入 key 反查能力
    pub fn set_key_resolver<R>(&mut self, resolver: R)
    where
        R: KeyResolver + Send + 'static,
    {
        self.resolver = Some(Box::new(resolver));
    }

    /// 移除 key 反查能力，之后转储显示占位符
    pub fn clear_key_resolver(&mut self) {
        self.resolver = None;
    }

    fn write_key_name<W: Write>(&self, w: &mut W, key: u64) -> fmt::Result {
        match self.resolver.as_ref().and_then(|r| r.resolve(key)) {
            Some(name) => w.write_str(&name),
            None => w.write_str(UNKNOWN_KEY_NAME),
        }
    }

    /// 把缓存状态写入 `w`
    ///
    /// 依次输出容量信息、按 (key, offset) 排序的全部 chunk，
    /// 以及两个 LRU 链表（从最近使用到最久未使用）。
    pub fn dump_to<W: Write>(&self, w: &mut W) -> fmt::Result {
        writeln!(
            w,
            "capacity={} used={} pinned={} chunks={}",
            self.capacity,
            self.used,
            self.pinned,
            self.store.len()
        )?;

        writeln!(w, "chunks:")?;
        for (_, chunk) in self.store.iter() {
            w.write_str("  ")?;
            self.write_key_name(w, chunk.key)?;
            writeln!(
                w,
                " ({:#018x}) offset={} size={} data={:p} no_evict={}",
                chunk.key,
                chunk.offset,
                chunk.size(),
                chunk.data().as_ptr(),
                chunk.is_pinned()
            )?;
        }

        let lists = [
            ("evictable", self.lru.evictable(&self.store)),
            ("pinned", self.lru.pinned(&self.store)),
        ];
        for (name, ids) in lists {
            writeln!(w, "{} lru (mru -> lru):", name)?;
            for id in ids.take(self.store.len()) {
                let chunk = self.store.chunk(id);
                w.write_str("  ")?;
                self.write_key_name(w, chunk.key)?;
                writeln!(w, " offset={} size={}", chunk.offset, chunk.size())?;
            }
        }

        Ok(())
    }

    /// 通过 `log::info!` 输出 [`dump_to`](Self::dump_to) 的内容
    pub fn debug_dump(&self) {
        let mut out = String::new();
        if self.dump_to(&mut out).is_err() {
            return;
        }
        for line in out.lines() {
            log::info!("[CHUNK_CACHE] {}", line);
        }
    }

    /// 一致性检查
    ///
    /// - chunk 按 key 非递减、相同 key 内按 offset 非递减排列
    /// - 没有重复的 (key, offset)
    /// - 每个 chunk 恰好位于与其标志对应的 LRU 链表中
    /// - `used`、固定字节数与驻留 chunk 的总和一致，且 `used <= capacity`
    /// - 记录了 CRC32 的 chunk 数据未被破坏
    pub fn check(&self) -> Result<()> {
        if self.store.first_unsorted().is_some() {
            return Err(corrupted("Chunks are not sorted by key and offset"));
        }
        if self.store.first_duplicate().is_some() {
            return Err(corrupted("Duplicate chunk key and offset"));
        }

        // 链表结构损坏时可能成环，最多遍历 len + 1 个节点
        let limit = self.store.len() + 1;
        let mut linked = 0;
        for id in self.lru.evictable(&self.store).take(limit) {
            if self.store.chunk(id).is_pinned() {
                return Err(corrupted("Pinned chunk found in the evictable list"));
            }
            linked += 1;
        }
        for id in self.lru.pinned(&self.store).take(limit) {
            if !self.store.chunk(id).is_pinned() {
                return Err(corrupted("Evictable chunk found in the pinned list"));
            }
            linked += 1;
        }
        if linked != self.store.len() {
            return Err(corrupted("LRU lists do not hold every chunk exactly once"));
        }

        let (used, pinned) = self.store.iter().fold((0, 0), |(used, pinned), (_, chunk)| {
            let pinned_size = if chunk.is_pinned() { chunk.size() } else { 0 };
            (used + chunk.size(), pinned + pinned_size)
        });
        if used != self.used {
            return Err(corrupted("Used memory does not match resident chunks"));
        }
        if pinned != self.pinned {
            return Err(corrupted("Pinned memory does not match resident pinned chunks"));
        }
        if self.used > self.capacity {
            return Err(corrupted("Used memory exceeds capacity"));
        }

        if self.track_checksums() && !self.store.iter().all(|(_, chunk)| chunk.checksum_matches()) {
            return Err(corrupted("Chunk data does not match its checksum"));
        }

        Ok(())
    }

    /// 校验缓存，失败时记录原因并转储完整状态
    pub fn verify(&self) -> bool {
        match self.check() {
            Ok(()) => true,
            Err(err) => {
                log::error!("[CHUNK_CACHE] verify failed: {}", err.message());
                self.debug_dump();
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::chunk::ChunkFlags;
    use crate::types::ChunkCacheConfig;
    use alloc::string::ToString;
    use alloc::vec;

    const MUSIC: u64 = 0xaaaa_0000_0000_0001;
    const VOICE: u64 = 0xbbbb_0000_0000_0002;

    fn filled_cache() -> ChunkCache {
        let mut cache = ChunkCache::new(64);
        cache.put(MUSIC, ChunkFlags::empty(), &[1; 8], 0).unwrap();
        cache.put(MUSIC, ChunkFlags::NO_EVICT, &[2; 8], 8).unwrap();
        cache.put(VOICE, ChunkFlags::empty(), &[3; 4], 0).unwrap();
        cache
    }

    fn dump(cache: &ChunkCache) -> String {
        let mut out = String::new();
        cache.dump_to(&mut out).unwrap();
        out
    }

    #[test]
    fn test_dump_without_resolver() {
        let cache = filled_cache();
        let out = dump(&cache);

        assert!(out.starts_with("capacity=64 used=20 pinned=8 chunks=3\n"));
        assert!(out.contains("<unknown> (0xaaaa000000000001) offset=8 size=8"));
        assert!(out.contains("no_evict=true"));
        assert!(out.contains("evictable lru (mru -> lru):\n  <unknown> offset=0 size=4\n  <unknown> offset=0 size=8\n"));
        assert!(out.contains("pinned lru (mru -> lru):\n  <unknown> offset=8 size=8\n"));
    }

    #[test]
    fn test_dump_with_resolver() {
        let mut cache = filled_cache();
        cache.set_key_resolver(|key: u64| (key == MUSIC).then(|| "/sounds/music.ogg".to_string()));

        let out = dump(&cache);
        assert!(out.contains("/sounds/music.ogg (0xaaaa000000000001) offset=0"));
        assert!(out.contains("<unknown> (0xbbbb000000000002) offset=0"));

        cache.clear_key_resolver();
        assert!(!dump(&cache).contains("/sounds/music.ogg"));
    }

    #[test]
    fn test_chunks_listed_in_sorted_order() {
        let cache = filled_cache();
        let out = dump(&cache);
        let first = out.find("offset=0 size=8 data=").unwrap();
        let second = out.find("offset=8 size=8 data=").unwrap();
        let third = out.find("offset=0 size=4 data=").unwrap();
        assert!(first < second && second < third);
    }

    #[test]
    fn test_debug_dump_does_not_panic() {
        let cache = filled_cache();
        cache.debug_dump();
        ChunkCache::new(0).debug_dump();
    }

    #[test]
    fn test_verify_ok() {
        let cache = filled_cache();
        assert!(cache.check().is_ok());
        assert!(cache.verify());
    }

    #[test]
    fn test_verify_detects_unsorted() {
        let mut cache = filled_cache();
        let id = cache.store.id_at(0);
        cache.store.chunk_mut(id).key = u64::MAX;

        let err = cache.check().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupted);
        assert!(!cache.verify());
    }

    #[test]
    fn test_verify_detects_duplicate() {
        let mut cache = filled_cache();
        let id = cache.store.id_at(1);
        cache.store.chunk_mut(id).offset = 0;
        assert_eq!(
            cache.check().unwrap_err().message(),
            "Duplicate chunk key and offset"
        );
    }

    #[test]
    fn test_verify_detects_wrong_partition() {
        let mut cache = filled_cache();
        let id = cache.store.id_at(0);
        cache.store.chunk_mut(id).flags = ChunkFlags::NO_EVICT;
        assert!(!cache.verify());
    }

    #[test]
    fn test_verify_detects_accounting_drift() {
        let mut cache = filled_cache();
        cache.used += 1;
        assert_eq!(
            cache.check().unwrap_err().message(),
            "Used memory does not match resident chunks"
        );
    }

    #[test]
    fn test_verify_detects_checksum_mismatch() {
        let mut cache = ChunkCache::with_config(ChunkCacheConfig {
            capacity: 64,
            track_checksums: true,
        });
        cache.put(MUSIC, ChunkFlags::empty(), &vec![7u8; 16], 0).unwrap();
        assert!(cache.verify());

        let id = cache.store.id_at(0);
        cache.store.chunk_mut(id).data_mut()[0] = 0;
        assert_eq!(
            cache.check().unwrap_err().message(),
            "Chunk data does not match its checksum"
        );
    }
}
