//! chunk 存储
//!
//! chunk 记录保存在一个 arena 中，通过 [`ChunkId`] 访问；
//! 另有一个按 `(key, offset)` 升序排列的 `ChunkId` 数组作为有序索引，
//! 用于二分查找和按 key 的范围操作。
//!
//! arena 的前 [`RESERVED_SLOTS`] 个槽位是两个 LRU 链表的哨兵，不保存 chunk。
//! 每个槽位同时携带 LRU 链接字段，所以 arena 实现了 [`ListAdapter`]。

use alloc::vec::Vec;
use core::cmp::Ordering;

use super::chunk::{Chunk, ChunkId};
use crate::consts::RESERVED_SLOTS;
use crate::error::{Error, ErrorKind, Result};
use crate::utils::{Link, ListAdapter};

/// arena 槽位
struct Slot {
    link: Link<ChunkId>,
    chunk: Option<Chunk>,
}

impl Slot {
    const fn vacant() -> Self {
        Self {
            link: Link::unlinked(),
            chunk: None,
        }
    }
}

/// `remove_range` 释放的内容
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemovedSpan {
    /// 释放的 chunk 数
    pub chunks: usize,
    /// 释放的总字节数
    pub bytes: usize,
    /// 其中固定 chunk 的字节数
    pub pinned_bytes: usize,
}

/// chunk 存储
pub struct ChunkStore {
    /// arena
    slots: Vec<Slot>,
    /// 可复用的空闲槽位
    free: Vec<ChunkId>,
    /// 按 (key, offset) 排序的索引
    sorted: Vec<ChunkId>,
}

impl ChunkStore {
    /// 创建空存储（只包含哨兵槽位）
    pub fn new() -> Self {
        let mut slots = Vec::with_capacity(RESERVED_SLOTS as usize);
        slots.extend((0..RESERVED_SLOTS).map(|_| Slot::vacant()));
        Self {
            slots,
            free: Vec::new(),
            sorted: Vec::new(),
        }
    }

    /// 驻留 chunk 数量
    #[inline]
    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    /// 是否没有驻留 chunk
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// 读取 chunk
    ///
    /// `id` 必须指向驻留 chunk，否则说明存储与 LRU 链表不同步，直接 panic。
    pub fn chunk(&self, id: ChunkId) -> &Chunk {
        match self.slots.get(id.index()).and_then(|slot| slot.chunk.as_ref()) {
            Some(chunk) => chunk,
            None => {
                log::error!("[CHUNK_CACHE] slot {} holds no chunk", id.index());
                panic!("chunk slot {} is empty", id.index());
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn chunk_mut(&mut self, id: ChunkId) -> &mut Chunk {
        self.slots[id.index()]
            .chunk
            .as_mut()
            .expect("chunk slot is empty")
    }

    /// 有序索引中第 `index` 个 chunk 的句柄
    #[inline]
    pub fn id_at(&self, index: usize) -> ChunkId {
        self.sorted[index]
    }

    /// 按 (key, offset) 顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = (ChunkId, &Chunk)> + '_ {
        self.sorted.iter().map(move |&id| (id, self.chunk(id)))
    }

    /// 第一个 `chunk.key >= key` 的位置
    pub fn lower_bound(&self, key: u64) -> usize {
        self.sorted.partition_point(|&id| self.chunk(id).key < key)
    }

    /// 从 `start` 开始、key 等于 `key` 的连续 chunk 数
    pub fn run_len(&self, start: usize, key: u64) -> usize {
        self.sorted[start..]
            .iter()
            .take_while(|&&id| self.chunk(id).key == key)
            .count()
    }

    fn search(&self, key: u64, offset: u64) -> core::result::Result<usize, usize> {
        self.sorted
            .binary_search_by(|&id| self.chunk(id).cmp_position(key, offset))
    }

    /// 精确查找 `(key, offset)`
    pub fn find(&self, key: u64, offset: u64) -> Option<ChunkId> {
        self.search(key, offset).ok().map(|index| self.sorted[index])
    }

    /// 已知驻留 chunk 在有序索引中的位置
    ///
    /// 找不到说明内部状态已损坏，直接 panic。
    pub fn find_index(&self, id: ChunkId) -> usize {
        let chunk = self.chunk(id);
        match self.search(chunk.key, chunk.offset) {
            Ok(index) if self.sorted[index] == id => index,
            _ => {
                log::error!(
                    "[CHUNK_CACHE] chunk key={:#018x} offset={} missing from sorted index",
                    chunk.key,
                    chunk.offset
                );
                panic!("chunk is not present in the sorted index");
            }
        }
    }

    /// 查找覆盖 `offset` 的 chunk
    ///
    /// 从该 key 的第一个 chunk 开始按偏移升序扫描；
    /// 一旦遇到起始偏移大于 `offset` 的 chunk 即可判定未命中。
    pub fn lookup(&self, key: u64, offset: u64) -> Option<ChunkId> {
        let start = self.lower_bound(key);
        for &id in &self.sorted[start..] {
            let chunk = self.chunk(id);
            if chunk.key != key || offset < chunk.offset {
                return None;
            }
            if chunk.covers(offset) {
                return Some(id);
            }
        }
        None
    }

    /// 插入 chunk，保持有序
    ///
    /// 相同 `(key, offset)` 已存在时返回 `AlreadyExists`，不做任何修改。
    /// 新 chunk 未链接到任何 LRU 链表。
    pub fn insert(&mut self, chunk: Chunk) -> Result<ChunkId> {
        let position = match self.search(chunk.key, chunk.offset) {
            Ok(_) => {
                return Err(Error::new(
                    ErrorKind::AlreadyExists,
                    "Chunk with the same key and offset is already cached",
                ))
            }
            Err(position) => position,
        };

        let id = self.alloc_slot(chunk);
        self.sorted.insert(position, id);
        Ok(id)
    }

    fn alloc_slot(&mut self, chunk: Chunk) -> ChunkId {
        let slot = Slot {
            link: Link::unlinked(),
            chunk: Some(chunk),
        };
        if let Some(id) = self.free.pop() {
            self.slots[id.index()] = slot;
            id
        } else {
            let id = ChunkId::new(self.slots.len() as u32);
            self.slots.push(slot);
            id
        }
    }

    /// 移除有序索引中 `[start, start + count)` 的 chunk
    ///
    /// 调用前这些 chunk 必须已从 LRU 链表摘除。数据缓冲区在此释放，
    /// 槽位进入空闲列表；有序索引整体前移，不改变剩余元素的顺序。
    pub fn remove_range(&mut self, start: usize, count: usize) -> RemovedSpan {
        let mut removed = RemovedSpan::default();

        for id in self.sorted.drain(start..start + count) {
            let slot = &mut self.slots[id.index()];
            debug_assert!(!slot.link.is_linked(), "removing a chunk that is still linked");
            if let Some(chunk) = slot.chunk.take() {
                removed.chunks += 1;
                removed.bytes += chunk.size();
                if chunk.is_pinned() {
                    removed.pinned_bytes += chunk.size();
                }
            }
            slot.link = Link::unlinked();
            self.free.push(id);
        }

        removed
    }

    /// 检查有序索引：key 非递减，相同 key 内 offset 非递减
    ///
    /// 返回第一个违反顺序的相邻对的位置。
    pub fn first_unsorted(&self) -> Option<usize> {
        self.sorted.windows(2).position(|pair| {
            let a = self.chunk(pair[0]);
            let b = self.chunk(pair[1]);
            a.cmp_position(b.key, b.offset) == Ordering::Greater
        })
    }

    /// 返回第一个与后继 `(key, offset)` 相同的位置
    pub fn first_duplicate(&self) -> Option<usize> {
        self.sorted.windows(2).position(|pair| {
            let a = self.chunk(pair[0]);
            let b = self.chunk(pair[1]);
            a.cmp_position(b.key, b.offset) == Ordering::Equal
        })
    }
}

impl Default for ChunkStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ListAdapter<ChunkId> for ChunkStore {
    fn link(&self, node: ChunkId) -> &Link<ChunkId> {
        &self.slots[node.index()].link
    }

    fn link_mut(&mut self, node: ChunkId) -> &mut Link<ChunkId> {
        &mut self.slots[node.index()].link
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::chunk::ChunkFlags;
    use alloc::vec;

    fn chunk(key: u64, offset: u64, size: usize) -> Chunk {
        Chunk::new(key, offset, ChunkFlags::empty(), vec![offset as u8; size], false)
    }

    fn positions(store: &ChunkStore) -> Vec<(u64, u64)> {
        store.iter().map(|(_, c)| (c.key, c.offset)).collect()
    }

    #[test]
    fn test_store_creation() {
        let store = ChunkStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert_eq!(store.lower_bound(42), 0);
        assert_eq!(store.lookup(42, 0), None);
    }

    #[test]
    fn test_insert_keeps_sorted() {
        let mut store = ChunkStore::new();
        store.insert(chunk(2, 16, 8)).unwrap();
        store.insert(chunk(1, 8, 8)).unwrap();
        store.insert(chunk(2, 0, 8)).unwrap();
        store.insert(chunk(1, 0, 8)).unwrap();

        assert_eq!(positions(&store), vec![(1, 0), (1, 8), (2, 0), (2, 16)]);
        assert_eq!(store.first_unsorted(), None);
        assert_eq!(store.first_duplicate(), None);
    }

    #[test]
    fn test_first_id_after_sentinels() {
        let mut store = ChunkStore::new();
        let id = store.insert(chunk(1, 0, 4)).unwrap();
        assert_eq!(id.index(), RESERVED_SLOTS as usize);
    }

    #[test]
    fn test_insert_duplicate_rejected() {
        let mut store = ChunkStore::new();
        store.insert(chunk(1, 0, 8)).unwrap();
        let err = store.insert(chunk(1, 0, 4)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(store.len(), 1);
        assert_eq!(store.chunk(store.id_at(0)).size(), 8);
    }

    #[test]
    fn test_find_exact() {
        let mut store = ChunkStore::new();
        let a = store.insert(chunk(1, 0, 8)).unwrap();
        let b = store.insert(chunk(1, 8, 8)).unwrap();

        assert_eq!(store.find(1, 0), Some(a));
        assert_eq!(store.find(1, 8), Some(b));
        assert_eq!(store.find(1, 4), None);
        assert_eq!(store.find(2, 0), None);
    }

    #[test]
    fn test_find_index() {
        let mut store = ChunkStore::new();
        let ids: Vec<_> = [(3, 0), (1, 0), (2, 0), (1, 100)]
            .iter()
            .map(|&(k, o)| store.insert(chunk(k, o, 4)).unwrap())
            .collect();

        for id in ids {
            let index = store.find_index(id);
            assert_eq!(store.id_at(index), id);
        }
    }

    #[test]
    fn test_lookup_range() {
        let mut store = ChunkStore::new();
        let a = store.insert(chunk(1, 0, 8)).unwrap();
        let c = store.insert(chunk(1, 16, 8)).unwrap();
        store.insert(chunk(2, 0, 8)).unwrap();

        assert_eq!(store.lookup(1, 0), Some(a));
        assert_eq!(store.lookup(1, 7), Some(a));
        // 间隙
        assert_eq!(store.lookup(1, 8), None);
        assert_eq!(store.lookup(1, 15), None);
        assert_eq!(store.lookup(1, 16), Some(c));
        assert_eq!(store.lookup(1, 23), Some(c));
        assert_eq!(store.lookup(1, 24), None);
        // 不能越过 key 边界命中下一个 key 的 chunk
        assert_eq!(store.lookup(0, 0), None);
        assert_eq!(store.lookup(3, 0), None);
    }

    #[test]
    fn test_lower_bound_and_run_len() {
        let mut store = ChunkStore::new();
        for (k, o) in [(1, 0), (2, 0), (2, 8), (2, 16), (4, 0)] {
            store.insert(chunk(k, o, 8)).unwrap();
        }

        assert_eq!(store.lower_bound(0), 0);
        assert_eq!(store.lower_bound(2), 1);
        assert_eq!(store.run_len(1, 2), 3);
        assert_eq!(store.lower_bound(3), 4);
        assert_eq!(store.run_len(4, 3), 0);
        assert_eq!(store.lower_bound(5), 5);
        assert_eq!(store.run_len(5, 5), 0);
    }

    #[test]
    fn test_remove_range_compacts() {
        let mut store = ChunkStore::new();
        for (k, o) in [(1, 0), (2, 0), (2, 8), (3, 0)] {
            store.insert(chunk(k, o, 8)).unwrap();
        }
        let pinned = Chunk::new(2, 16, ChunkFlags::NO_EVICT, vec![0; 4], false);
        store.insert(pinned).unwrap();

        let removed = store.remove_range(1, 3);
        assert_eq!(removed.chunks, 3);
        assert_eq!(removed.bytes, 20);
        assert_eq!(removed.pinned_bytes, 4);
        assert_eq!(positions(&store), vec![(1, 0), (3, 0)]);
        assert_eq!(store.first_unsorted(), None);
    }

    #[test]
    fn test_slots_are_reused() {
        let mut store = ChunkStore::new();
        let a = store.insert(chunk(1, 0, 8)).unwrap();
        store.remove_range(store.find_index(a), 1);
        let b = store.insert(chunk(9, 0, 8)).unwrap();
        assert_eq!(a, b);
        assert_eq!(store.chunk(b).key, 9);
    }

    #[test]
    #[should_panic]
    fn test_find_index_missing_panics() {
        let mut store = ChunkStore::new();
        let id = store.insert(chunk(1, 0, 8)).unwrap();
        store.remove_range(0, 1);
        store.find_index(id);
    }
}
