//! LRU 跟踪
//!
//! 两个相互独立的 LRU 链表：
//!
//! - **可驱逐链表**：普通 chunk，`evict_memory` 从其尾部取牺牲者
//! - **固定链表**：带 [`ChunkFlags::NO_EVICT`](super::ChunkFlags::NO_EVICT) 的 chunk，
//!   只记录访问顺序，永远不会被容量驱逐
//!
//! 链接字段存放在 [`ChunkStore`] 的槽位中，哨兵占用保留槽位。

use super::chunk::ChunkId;
use super::store::ChunkStore;
use crate::consts::{EVICTABLE_HEAD_SLOT, EVICTABLE_TAIL_SLOT, PINNED_HEAD_SLOT, PINNED_TAIL_SLOT};
use crate::utils::{IntrusiveList, Iter};

/// LRU 跟踪器
#[derive(Debug)]
pub struct LruTracker {
    evictable: IntrusiveList<ChunkId>,
    pinned: IntrusiveList<ChunkId>,
}

impl LruTracker {
    /// 在 `store` 的哨兵槽位上初始化两个空链表
    pub fn new(store: &mut ChunkStore) -> Self {
        Self {
            evictable: IntrusiveList::init(
                store,
                ChunkId::new(EVICTABLE_HEAD_SLOT),
                ChunkId::new(EVICTABLE_TAIL_SLOT),
            ),
            pinned: IntrusiveList::init(
                store,
                ChunkId::new(PINNED_HEAD_SLOT),
                ChunkId::new(PINNED_TAIL_SLOT),
            ),
        }
    }

    fn list_for(&self, store: &ChunkStore, id: ChunkId) -> &IntrusiveList<ChunkId> {
        if store.chunk(id).is_pinned() {
            &self.pinned
        } else {
            &self.evictable
        }
    }

    /// 新 chunk 加入对应链表头部
    pub fn link(&self, store: &mut ChunkStore, id: ChunkId) {
        self.list_for(store, id).add_front(store, id);
    }

    /// 从所在链表摘除
    pub fn unlink(&self, store: &mut ChunkStore, id: ChunkId) {
        self.list_for(store, id).remove(store, id);
    }

    /// 访问提升：移到所在链表头部
    pub fn touch(&self, store: &mut ChunkStore, id: ChunkId) {
        self.list_for(store, id).move_to_front(store, id);
    }

    /// 可驱逐链表中最久未使用的 chunk
    pub fn victim(&self, store: &ChunkStore) -> Option<ChunkId> {
        self.evictable.last(store)
    }

    /// 可驱逐链表，从最近使用到最久未使用
    pub fn evictable<'a>(&self, store: &'a ChunkStore) -> Iter<'a, ChunkId, ChunkStore> {
        self.evictable.iter(store)
    }

    /// 固定链表，从最近使用到最久未使用
    pub fn pinned<'a>(&self, store: &'a ChunkStore) -> Iter<'a, ChunkId, ChunkStore> {
        self.pinned.iter(store)
    }
}
