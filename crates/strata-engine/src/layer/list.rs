use core::fmt;

use crate::task::RenderTask;

/// Ordered task sequence for one layer slot.
///
/// Performance characteristics:
/// - `push()` is amortized O(1)
/// - `clear()` keeps the allocation, so a warmed layer does not reallocate per frame
///
/// Not synchronized. Only the render thread touches layers.
pub struct Layer<B: ?Sized> {
    tasks: Vec<Box<dyn RenderTask<B>>>,
}

impl<B: ?Sized> Layer<B> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tasks: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn push(&mut self, task: Box<dyn RenderTask<B>>) {
        self.tasks.push(task);
    }

    /// Appends every task from `tasks`, preserving their order.
    pub fn extend<I>(&mut self, tasks: I)
    where
        I: IntoIterator<Item = Box<dyn RenderTask<B>>>,
    {
        self.tasks.extend(tasks);
    }

    /// Tasks in insertion order, for execution.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut (dyn RenderTask<B> + 'static)> {
        self.tasks.iter_mut().map(|t| t.as_mut())
    }

    /// Drops every task. Keeps allocated capacity for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl<B: ?Sized> fmt::Debug for Layer<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer").field("len", &self.tasks.len()).finish()
    }
}
