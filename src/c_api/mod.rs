//! C API 兼容层
//!
//! 提供与资源系统 C 接口同名的函数。
//!
//! 这些函数仅保留 C 风格的命名（`resource_chunk_cache_*`），内部实现全部使用 Rust 风格的方法。

pub mod chunk_cache;
