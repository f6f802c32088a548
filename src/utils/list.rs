//! 基于句柄的侵入式双向链表
//!
//! 链表本身只保存头、尾两个哨兵句柄；每个节点的 [`Link`] 字段存放在
//! 调用者的存储里（通常是一个 arena），并通过 [`ListAdapter`] 访问。
//! 句柄可以是任意 `Copy + Eq` 类型（数组下标、newtype ID 等），
//! 因此不需要裸指针，也不需要把链接字段放在结构体的第一个成员。
//!
//! 哨兵节点在 [`IntrusiveList::init`] 时首尾相连：
//!
//! ```text
//! head.next == tail, tail.prev == head   （空链表）
//! head <-> n1 <-> n2 <-> ... <-> tail    （n1 为最近使用）
//! ```

/// 节点链接字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link<H> {
    /// 前驱节点
    pub prev: Option<H>,
    /// 后继节点
    pub next: Option<H>,
}

impl<H> Link<H> {
    /// 未链接状态
    pub const fn unlinked() -> Self {
        Self {
            prev: None,
            next: None,
        }
    }

    /// 是否已链接到某个链表中
    pub fn is_linked(&self) -> bool {
        self.prev.is_some() || self.next.is_some()
    }
}

impl<H> Default for Link<H> {
    fn default() -> Self {
        Self::unlinked()
    }
}

/// 节点链接访问接口
///
/// 存储节点的容器实现此 Trait，告诉链表如何通过句柄找到 [`Link`]。
/// 对不存在的句柄可以 panic：链表只会传入已经分配过的句柄。
pub trait ListAdapter<H> {
    /// 获取节点的链接字段
    fn link(&self, node: H) -> &Link<H>;

    /// 获取节点链接字段的可变引用
    fn link_mut(&mut self, node: H) -> &mut Link<H>;
}

/// 带哨兵头尾的侵入式双向链表
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntrusiveList<H> {
    head: H,
    tail: H,
}

impl<H: Copy + Eq> IntrusiveList<H> {
    /// 初始化链表
    ///
    /// `head` 和 `tail` 必须是存储中已分配、且不属于任何链表的节点，
    /// 之后它们只作为哨兵使用。
    pub fn init<A: ListAdapter<H>>(nodes: &mut A, head: H, tail: H) -> Self {
        *nodes.link_mut(head) = Link {
            prev: Some(tail),
            next: Some(tail),
        };
        *nodes.link_mut(tail) = Link {
            prev: Some(head),
            next: Some(head),
        };
        Self { head, tail }
    }

    /// 头哨兵
    pub fn head(&self) -> H {
        self.head
    }

    /// 尾哨兵
    pub fn tail(&self) -> H {
        self.tail
    }

    /// 是否为哨兵节点
    pub fn is_sentinel(&self, node: H) -> bool {
        node == self.head || node == self.tail
    }

    /// 链表是否为空
    pub fn is_empty<A: ListAdapter<H>>(&self, nodes: &A) -> bool {
        nodes.link(self.head).next == Some(self.tail)
    }

    /// 插入到头部（成为最近使用的节点）
    pub fn add_front<A: ListAdapter<H>>(&self, nodes: &mut A, node: H) {
        debug_assert!(!self.is_sentinel(node));
        debug_assert!(!nodes.link(node).is_linked(), "node is already linked");

        let first = nodes
            .link(self.head)
            .next
            .expect("list head sentinel is not initialised");

        *nodes.link_mut(node) = Link {
            prev: Some(self.head),
            next: Some(first),
        };
        nodes.link_mut(self.head).next = Some(node);
        nodes.link_mut(first).prev = Some(node);
    }

    /// 从所在位置摘除节点
    ///
    /// 摘除后节点自身的 prev/next 被置为 `None`，重复摘除会被发现。
    pub fn remove<A: ListAdapter<H>>(&self, nodes: &mut A, node: H) {
        debug_assert!(!self.is_sentinel(node));

        let Link { prev, next } = *nodes.link(node);
        debug_assert!(prev.is_some() && next.is_some(), "node is not linked");
        let (Some(prev), Some(next)) = (prev, next) else {
            log::error!("[LIST] remove called on a node that is not linked");
            return;
        };

        nodes.link_mut(prev).next = Some(next);
        nodes.link_mut(next).prev = Some(prev);
        *nodes.link_mut(node) = Link::unlinked();
    }

    /// 移到头部
    pub fn move_to_front<A: ListAdapter<H>>(&self, nodes: &mut A, node: H) {
        if nodes.link(self.head).next == Some(node) {
            return;
        }
        self.remove(nodes, node);
        self.add_front(nodes, node);
    }

    /// 第一个节点（最近使用），空链表返回 `None`
    pub fn first<A: ListAdapter<H>>(&self, nodes: &A) -> Option<H> {
        nodes.link(self.head).next.filter(|&n| n != self.tail)
    }

    /// 最后一个节点（最久未使用），空链表返回 `None`
    pub fn last<A: ListAdapter<H>>(&self, nodes: &A) -> Option<H> {
        nodes.link(self.tail).prev.filter(|&n| n != self.head)
    }

    /// 从头到尾遍历
    pub fn iter<'a, A: ListAdapter<H>>(&self, nodes: &'a A) -> Iter<'a, H, A> {
        Iter {
            nodes,
            next: self.first(nodes),
            tail: self.tail,
        }
    }
}

/// 从头（最近使用）到尾（最久未使用）的迭代器
pub struct Iter<'a, H, A> {
    nodes: &'a A,
    next: Option<H>,
    tail: H,
}

impl<'a, H: Copy + Eq, A: ListAdapter<H>> Iterator for Iter<'a, H, A> {
    type Item = H;

    fn next(&mut self) -> Option<H> {
        let current = self.next?;
        self.next = self.nodes.link(current).next.filter(|&n| n != self.tail);
        Some(current)
    }
}
