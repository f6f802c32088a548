//! 通用数据结构

pub mod list;

pub use list::{IntrusiveList, Iter, Link, ListAdapter};
