use std::marker::PhantomData;
use std::mem;
use std::mem::MaybeUninit;
use std::ptr;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// An unbounded MPMC FIFO queue over a singly linked chain.
///
/// The front and the back are guarded by separate locks, so enqueuers only
/// contend with enqueuers and dequeuers with dequeuers. The chain permanently
/// starts with a vacant stub node: [`enqueue`](Self::enqueue) never writes
/// `head` and [`dequeue`](Self::dequeue) never writes `tail`, which removes
/// any cross-lock agreement on the empty/non-empty transition. The one
/// location both ends can reach at the same time is the stub's `next` link on
/// an empty queue, and links are atomic for exactly that case.
pub struct Queue<T> {
    /// The stub in front of the first live value.
    head: Mutex<NonNull<Node<T>>>,
    /// The most recently linked node, or the stub if the queue is empty.
    tail: Mutex<NonNull<Node<T>>>,
    len: AtomicUsize,
    marker: PhantomData<Box<Node<T>>>,
}

// Values move through the queue whole and are only ever touched by the
// thread holding the front lock, as with `Mutex<T>`.
unsafe impl<T: Send> Send for Queue<T> {}
unsafe impl<T: Send> Sync for Queue<T> {}

struct Node<T> {
    /// Vacant on the stub, initialized on every node behind it.
    value: MaybeUninit<T>,
    next: AtomicPtr<Node<T>>,
}

impl<T> Node<T> {
    fn alloc(value: MaybeUninit<T>) -> NonNull<Self> {
        NonNull::from(Box::leak(Box::new(Self {
            value,
            next: AtomicPtr::new(ptr::null_mut()),
        })))
    }
}

impl<T> Queue<T> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        let stub = Node::alloc(MaybeUninit::uninit());
        Self {
            head: Mutex::new(stub),
            tail: Mutex::new(stub),
            len: AtomicUsize::new(0),
            marker: PhantomData,
        }
    }

    /// Appends `value` at the back of the queue.
    pub fn enqueue(&self, value: T) {
        let node = Node::alloc(MaybeUninit::new(value));
        let mut tail = lock(&self.tail);
        // `Release` publishes the value write to the `Acquire` load in
        // `dequeue` and `peek`.
        unsafe { tail.as_ref().next.store(node.as_ptr(), Ordering::Release) };
        *tail = node;
        self.len.fetch_add(1, Ordering::Relaxed);
    }

    /// Removes and returns the value at the front, or `None` if the queue is
    /// empty.
    pub fn dequeue(&self) -> Option<T> {
        let mut head = lock(&self.head);
        let next = NonNull::new(unsafe { head.as_ref().next.load(Ordering::Acquire) })?;
        // The front node becomes the new stub once its value moves out.
        let value = unsafe { next.as_ref().value.as_ptr().read() };
        let stub = mem::replace(&mut *head, next);
        self.len.fetch_sub(1, Ordering::Relaxed);
        drop(head);
        // `tail` only reaches the old stub while the queue is empty, and an
        // empty queue returns above, so this is the last reference to it.
        drop(unsafe { Box::from_raw(stub.as_ptr()) });
        Some(value)
    }

    /// Returns a copy of the value at the front without removing it.
    pub fn peek(&self) -> Option<T>
    where
        T: Clone,
    {
        let head = lock(&self.head);
        let next = NonNull::new(unsafe { head.as_ref().next.load(Ordering::Acquire) })?;
        // Clone while the front lock pins the node; a dequeuer may free it
        // as soon as the guard drops.
        Some(unsafe { next.as_ref().value.assume_init_ref() }.clone())
    }

    /// Number of values currently in the queue.
    ///
    /// Reads the atomic counter without taking either lock. While other
    /// operations are in flight the answer is advisory, not a snapshot of
    /// the chain.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for Queue<T> {
    fn drop(&mut self) {
        // `&mut self` means no operation is in flight; walk the chain
        // without the locks.
        let mut cur = Some(*self.head.get_mut().unwrap_or_else(PoisonError::into_inner));
        let mut vacant = true;
        while let Some(node) = cur {
            let mut node = unsafe { Box::from_raw(node.as_ptr()) };
            if !vacant {
                // Every node behind the stub still carries a live value.
                unsafe { node.value.assume_init_drop() };
            }
            vacant = false;
            cur = NonNull::new(*node.next.get_mut());
        }
    }
}

// The only user code that runs under a lock is `T::clone` in `peek`, which
// cannot leave the chain mid-update, so a poisoned guard is still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
