//! resource_chunk_cache: 资源文件 chunk 的内存缓存
//!
//! 按 `(资源 key, 字节偏移)` 缓存资源文件的字节片段，容量以字节计，
//! 为流式加载的大资源（声音、视频等）避免重复读取磁盘或网络。
//!
//! - **零 unsafe 代码**：LRU 链表使用 arena 句柄而非指针
//! - **两个 LRU 分区**：可驱逐 chunk 与固定（no-evict）chunk 分开跟踪
//! - **被动缓存**：不做 I/O，只提供 get / put / evict
//! - **单线程**：需要并发时由调用者加锁（`std` 特性提供 `SharedChunkCache`）
//!
//! # 示例
//!
//! ```rust,ignore
//! use resource_chunk_cache::{ChunkCache, ChunkFlags, Result};
//!
//! fn read_chunk(cache: &mut ChunkCache, key: u64, offset: u64) -> Result<Vec<u8>> {
//!     if let Some(chunk) = cache.get(key, offset) {
//!         return Ok(chunk.data.to_vec());
//!     }
//!
//!     let data = load_from_archive(key, offset)?;
//!     cache.evict_memory(data.len());
//!     cache.put(key, ChunkFlags::empty(), &data, offset)?;
//!     Ok(data)
//! }
//! ```
//!
//! # 模块结构
//!
//! - [`error`] - 错误类型定义
//! - [`consts`] - 常量定义
//! - [`types`] - 配置类型
//! - [`cache`] - chunk 缓存
//! - [`utils`] - 侵入式链表
//! - [`c_api`] - C API 兼容层（可选）

#![no_std]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

// ===== 核心模块 =====

/// 错误处理
pub mod error;

/// 常量定义
pub mod consts;

/// 配置类型
pub mod types;

/// chunk 缓存
pub mod cache;

/// 通用数据结构
pub mod utils;

/// CRC32 校验和计算
pub(crate) mod crc;

// ===== C API 兼容层（可选）=====

/// C API 兼容层
///
/// 提供与资源系统 C 接口同名的函数。
#[cfg(feature = "c-api")]
pub mod c_api;

// ===== 公共导出 =====

// 错误处理
pub use error::{Error, ErrorKind, Result};

// 配置
pub use types::ChunkCacheConfig;
pub use consts::DEFAULT_CHUNK_CACHE_CAPACITY;

// Cache
pub use cache::{CacheStats, Chunk, ChunkCache, ChunkFlags, ChunkId, ChunkRef, KeyResolver};

#[cfg(feature = "std")]
pub use cache::{OwnedChunk, SharedChunkCache};

// 链表
pub use utils::{IntrusiveList, Link, ListAdapter};
