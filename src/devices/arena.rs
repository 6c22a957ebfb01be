/*
 * Device Storage Arenas
 *
 * The host owns the memory a device stores its data in. A device asks an
 * arena for its buffer when it is attached and the buffer goes back to
 * the same arena when it is dropped, so a detach (or a failed attach)
 * can never leak.
 *
 * Two arenas exist:
 * - GlobalArena: the kernel's global allocator
 * - HeapArena:   a dedicated, bounded region managed by
 *                linked_list_allocator, useful to cap device memory and
 *                to observe how much of it is in use
 *
 * Buffers are always zero-filled, so no byte of a fresh buffer is ever
 * uninitialized memory.
 */

use alloc::alloc::{alloc_zeroed, dealloc};
use alloc::sync::Arc;
use core::alloc::Layout;
use core::mem::align_of;
use core::ptr::NonNull;

use linked_list_allocator::Heap;
use linked_list_allocator::hole::HoleList;
use spin::Mutex;

use super::DeviceError;

/// Source of device buffers
pub trait StorageArena: Send + Sync {
    /// Allocate a zero-filled buffer of `len` bytes
    fn allocate(self: Arc<Self>, len: usize) -> Result<DeviceBuffer, DeviceError>;

    /// Return memory obtained from `allocate`
    ///
    /// # Safety
    /// `ptr` and `layout` must come from a buffer allocated by this arena
    /// that has not been released yet.
    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout);
}

/// Fixed-size byte buffer owned by a device
///
/// Frees itself into its arena on drop.
pub struct DeviceBuffer {
    ptr: NonNull<u8>,
    layout: Layout,
    arena: Arc<dyn StorageArena>,
}

// Safety: the buffer exclusively owns its memory; shared access goes
// through the device lock.
unsafe impl Send for DeviceBuffer {}
unsafe impl Sync for DeviceBuffer {}

impl DeviceBuffer {
    pub fn len(&self) -> usize {
        self.layout.size()
    }

    pub fn is_empty(&self) -> bool {
        self.layout.size() == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        // Safety: ptr is valid for layout.size() initialized bytes
        unsafe { core::slice::from_raw_parts(self.ptr.as_ptr(), self.layout.size()) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // Safety: as above, and &mut self guarantees exclusivity
        unsafe { core::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.layout.size()) }
    }
}

impl Drop for DeviceBuffer {
    fn drop(&mut self) {
        // Safety: ptr/layout were produced by self.arena
        unsafe { self.arena.release(self.ptr, self.layout) };
    }
}

fn buffer_layout(len: usize) -> Result<Layout, DeviceError> {
    if len == 0 {
        return Err(DeviceError::InvalidArgument);
    }
    Layout::array::<u8>(len).map_err(|_| DeviceError::OutOfMemory)
}

/// Arena backed by the global allocator
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobalArena;

impl StorageArena for GlobalArena {
    fn allocate(self: Arc<Self>, len: usize) -> Result<DeviceBuffer, DeviceError> {
        let layout = buffer_layout(len)?;
        // Safety: layout has a non-zero size
        let ptr = unsafe { alloc_zeroed(layout) };
        let ptr = NonNull::new(ptr).ok_or(DeviceError::OutOfMemory)?;
        Ok(DeviceBuffer { ptr, layout, arena: self })
    }

    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout) {
        // Safety: guaranteed by the caller
        unsafe { dealloc(ptr.as_ptr(), layout) };
    }
}

/// Arena over a dedicated memory region
pub struct HeapArena {
    heap: Mutex<Heap>,
}

impl HeapArena {
    /// Manage `size` bytes starting at `bottom`
    ///
    /// A region too small to hold the allocator's bookkeeping yields an
    /// arena that fails every allocation with OutOfMemory.
    ///
    /// # Safety
    /// The region must be valid, writable, unused by anything else and
    /// outlive the arena and every buffer allocated from it.
    pub unsafe fn new(bottom: *mut u8, size: usize) -> Self {
        let usable = size.saturating_sub(bottom.align_offset(align_of::<usize>()));
        if usable < HoleList::min_size() {
            log::warn!(
                "Device arena at 0x{:x}: {} bytes is below the minimum of {}",
                bottom as usize,
                size,
                HoleList::min_size()
            );
            return Self {
                heap: Mutex::new(Heap::empty()),
            };
        }

        log::info!(
            "Device arena: 0x{:x} - 0x{:x} ({} KiB)",
            bottom as usize,
            bottom as usize + size.saturating_sub(1),
            size / 1024
        );
        Self {
            // Safety: forwarded from the caller, size checked above
            heap: Mutex::new(unsafe { Heap::new(bottom, size) }),
        }
    }

    /// Manage a leaked static region
    pub fn from_static(region: &'static mut [u8]) -> Self {
        let size = region.len();
        // Safety: the 'static exclusive borrow is handed to the arena for good
        unsafe { Self::new(region.as_mut_ptr(), size) }
    }

    /// Bytes currently handed out
    pub fn used(&self) -> usize {
        self.heap.lock().used()
    }

    /// Bytes still available
    pub fn free(&self) -> usize {
        self.heap.lock().free()
    }
}

impl StorageArena for HeapArena {
    fn allocate(self: Arc<Self>, len: usize) -> Result<DeviceBuffer, DeviceError> {
        let layout = buffer_layout(len)?;
        let ptr = self
            .heap
            .lock()
            .allocate_first_fit(layout)
            .map_err(|_| DeviceError::OutOfMemory)?;
        // Safety: fresh allocation of layout.size() bytes
        unsafe { core::ptr::write_bytes(ptr.as_ptr(), 0, layout.size()) };
        Ok(DeviceBuffer { ptr, layout, arena: self })
    }

    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout) {
        // Safety: guaranteed by the caller
        unsafe { self.heap.lock().deallocate(ptr, layout) };
    }
}
