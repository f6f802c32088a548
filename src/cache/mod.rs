//! chunk 缓存模块
//!
//! 按 `(资源 key, 字节偏移)` 缓存资源文件片段（chunk），
//! 用于流式加载的大资源（声音、视频等），避免重复读取磁盘或网络。
//!
//! # 主要组件
//!
//! - [`Chunk`] / [`ChunkRef`] - chunk 记录和只读视图
//! - [`ChunkStore`] - 按 `(key, offset)` 排序的 chunk 存储
//! - [`LruTracker`] - 可驱逐 / 固定两个 LRU 链表
//! - [`ChunkCache`] - 组合以上部分，负责容量统计和驱逐
//! - [`KeyResolver`] - 转储时把 key 还原为路径（可选）
//!
//! # 设计原理
//!
//! 1. **有序索引**：`ChunkId` 数组按 key、offset 升序排列，
//!    `get` 先二分定位 key，再顺序扫描该 key 的少量 chunk 做范围匹配
//! 2. **基于句柄的侵入式链表**：链接字段存放在 arena 槽位中，
//!    用 `ChunkId` 而不是指针相连，摘除 / 插入都是 O(1)，无 unsafe
//! 3. **两个 LRU 分区**：固定 chunk 放在独立链表里，
//!    驱逐循环只看可驱逐链表的尾部，不需要逐个判断标志
//! 4. **被动**：缓存不做 I/O，也不会在 `put` 内部自动驱逐，
//!    由调用者决定何时调用 `evict_memory`
//!
//! # 复杂度
//!
//! - **get**: O(log n + k)，k 为该 key 已驻留的 chunk 数
//! - **put**: O(log n) 查找 + O(n) 有序插入移动
//! - **evict_memory**: 每个牺牲者 O(log n) 定位 + O(n) 压缩
//! - **evict_key**: O(log n + n)，该 key 的 chunk 一次性移除
//!
//! # 使用示例
//!
//! ```rust,ignore
//! use resource_chunk_cache::{ChunkCache, ChunkFlags};
//!
//! let mut cache = ChunkCache::new(24);
//! cache.put(path_hash, ChunkFlags::empty(), &[0u8; 8], 0)?;
//!
//! // 偏移 7 落在 [0, 8) 内
//! let chunk = cache.get(path_hash, 7).unwrap();
//! assert_eq!(chunk.offset, 0);
//!
//! // 卸载资源时移除它的全部 chunk
//! cache.evict_key(path_hash);
//! ```

mod chunk;
mod chunk_cache;
mod debug;
mod lru;
mod store;

#[cfg(feature = "std")]
mod shared;

pub use chunk::{Chunk, ChunkFlags, ChunkId, ChunkRef};
pub use chunk_cache::{CacheStats, ChunkCache};
pub use debug::KeyResolver;
pub use lru::LruTracker;
pub use store::{ChunkStore, RemovedSpan};

#[cfg(feature = "std")]
pub use shared::{OwnedChunk, SharedChunkCache};
