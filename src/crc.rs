//! CRC32 校验和计算
//!
//! 为驻留 chunk 的数据提供完整性校验

/// 计算 chunk 数据的 CRC32
///
/// # 参数
/// * `data` - chunk 的完整数据
///
/// # 返回
/// CRC32 值
#[inline]
pub fn chunk_checksum(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}
