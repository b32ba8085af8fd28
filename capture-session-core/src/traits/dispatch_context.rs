/// A unit of work posted to a dispatch context.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// A single-threaded execution context that listeners choose to be called on.
///
/// `post` is fire-and-forget: it must never block on the context's thread,
/// since it is called from the native callback path. Tasks run in the order
/// they were posted.
pub trait DispatchContext: Send + Sync {
    /// Queue a task. Returns `false` if the context no longer accepts work.
    fn post(&self, task: Task) -> bool;
}
