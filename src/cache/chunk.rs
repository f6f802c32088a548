//! chunk 记录
//!
//! 一个 chunk 是某个资源文件中一段连续字节 `[offset, offset + size)` 的副本，
//! 由 `(key, offset)` 唯一标识。

use alloc::vec::Vec;
use bitflags::bitflags;
use core::cmp::Ordering;

use crate::crc::chunk_checksum;

bitflags! {
    /// chunk 标志
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ChunkFlags: u32 {
        /// 固定在缓存中，不参与容量驱逐
        const NO_EVICT = 0x01;
    }
}

/// chunk 在 arena 中的句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChunkId(u32);

impl ChunkId {
    pub(crate) const fn new(slot: u32) -> Self {
        Self(slot)
    }

    /// arena 下标
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// 驻留的 chunk
///
/// 数据缓冲区由缓存独占，chunk 被移除时释放。
#[derive(Clone)]
pub struct Chunk {
    /// 资源标识（路径的 64 位哈希）
    pub key: u64,
    /// 在资源中的起始字节偏移
    pub offset: u64,
    /// 标志
    pub flags: ChunkFlags,
    /// 插入时的 CRC32（仅当开启校验和跟踪时记录）
    pub checksum: Option<u32>,
    data: Vec<u8>,
}

impl core::fmt::Debug for Chunk {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Chunk")
            .field("key", &format_args!("{:#018x}", self.key))
            .field("offset", &self.offset)
            .field("size", &self.data.len())
            .field("flags", &self.flags)
            .field("checksum", &self.checksum)
            .finish()
    }
}

impl Chunk {
    /// 创建 chunk
    ///
    /// # 参数
    ///
    /// * `key` - 资源标识
    /// * `offset` - 起始偏移
    /// * `flags` - chunk 标志
    /// * `data` - 数据（所有权转移给 chunk）
    /// * `track_checksum` - 是否记录 CRC32
    pub fn new(key: u64, offset: u64, flags: ChunkFlags, data: Vec<u8>, track_checksum: bool) -> Self {
        let checksum = track_checksum.then(|| chunk_checksum(&data));
        Self {
            key,
            offset,
            flags,
            checksum,
            data,
        }
    }

    /// 数据
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// 字节数
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 是否固定（不可驱逐）
    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.flags.contains(ChunkFlags::NO_EVICT)
    }

    /// `offset` 是否落在 `[self.offset, self.offset + size)` 内
    #[inline]
    pub fn covers(&self, offset: u64) -> bool {
        offset >= self.offset && offset - self.offset < self.data.len() as u64
    }

    /// 与 `(key, offset)` 比较：先比 key，再比 offset
    #[inline]
    pub fn cmp_position(&self, key: u64, offset: u64) -> Ordering {
        (self.key, self.offset).cmp(&(key, offset))
    }

    /// 数据是否与记录的 CRC32 一致；未记录时视为一致
    pub fn checksum_matches(&self) -> bool {
        self.checksum
            .map_or(true, |crc| crc == chunk_checksum(&self.data))
    }

    /// 借出只读视图
    pub fn as_chunk_ref(&self) -> ChunkRef<'_> {
        ChunkRef {
            data: &self.data,
            offset: self.offset,
            size: self.data.len(),
            flags: self.flags,
        }
    }

    #[cfg(test)]
    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

/// `get` 返回的 chunk 视图
///
/// 借用缓存本身，因此在下一次修改缓存之前有效。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRef<'a> {
    /// chunk 数据
    pub data: &'a [u8],
    /// chunk 起始偏移（不一定等于查询偏移）
    pub offset: u64,
    /// chunk 字节数
    pub size: usize,
    /// chunk 标志
    pub flags: ChunkFlags,
}

impl ChunkRef<'_> {
    /// 从 `offset`（资源内绝对偏移）开始的剩余数据
    ///
    /// `offset` 不在此 chunk 内时返回 `None`。
    pub fn slice_from(&self, offset: u64) -> Option<&[u8]> {
        let start = offset.checked_sub(self.offset)?;
        let start = usize::try_from(start).ok()?;
        self.data.get(start..)
    }
}
