//! chunk 缓存常量定义

//=============================================================================
// 容量
//=============================================================================

/// 默认缓存容量（字节，2 MiB）
pub const DEFAULT_CHUNK_CACHE_CAPACITY: usize = 2 * 1024 * 1024;

//=============================================================================
// Arena 布局
//=============================================================================

/// 可驱逐 LRU 链表的头哨兵槽位
pub(crate) const EVICTABLE_HEAD_SLOT: u32 = 0;

/// 可驱逐 LRU 链表的尾哨兵槽位
pub(crate) const EVICTABLE_TAIL_SLOT: u32 = 1;

/// 固定（no-evict）LRU 链表的头哨兵槽位
pub(crate) const PINNED_HEAD_SLOT: u32 = 2;

/// 固定（no-evict）LRU 链表的尾哨兵槽位
pub(crate) const PINNED_TAIL_SLOT: u32 = 3;

/// 为哨兵保留的 arena 槽位数，chunk 从此下标开始分配
pub(crate) const RESERVED_SLOTS: u32 = 4;

//=============================================================================
// 调试输出
//=============================================================================

/// key 无法反查为路径时，dump 中显示的占位符
pub const UNKNOWN_KEY_NAME: &str = "<unknown>";
