/// 可编辑表单：保存一份“服务端版本”，编辑只改 current
///
/// dirty 标志决定保存/重置是否可用。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft<T> {
    saved: T,
    current: T,
}

impl<T: Clone + PartialEq> Draft<T> {
    pub fn new(value: T) -> Self {
        Self {
            saved: value.clone(),
            current: value,
        }
    }

    pub fn current(&self) -> &T {
        &self.current
    }

    pub fn current_mut(&mut self) -> &mut T {
        &mut self.current
    }

    pub fn saved(&self) -> &T {
        &self.saved
    }

    pub fn is_dirty(&self) -> bool {
        self.saved != self.current
    }

    /// 丢弃本地修改
    pub fn reset(&mut self) {
        self.current = self.saved.clone();
    }

    /// 从后端重新加载，覆盖本地修改
    pub fn load(&mut self, value: T) {
        self.saved = value.clone();
        self.current = value;
    }
}
