pub mod bufferpool;
pub mod hashtable;
pub mod replacer;

/// Index of a slot in the buffer pool's page array, in [0, pool_size).
/// Stable for the lifetime of the pool.
pub type FrameId = usize;

/// Replacer tracks page usage for replacement in case of buffer pool is full.
pub trait Replacer {
    /// Record the event that the given frame id is accessed. Create a new
    /// entry for access history if frame id has not been seen before.
    ///
    /// Panics if the frame id is outside the replacer's capacity; that is
    /// an internal consistency bug, not a recoverable condition.
    fn record_access(&self, frame_id: FrameId);

    /// Find the frame to evict per the replacement policy. Only frames that
    /// are marked as evictable are candidates for eviction.
    ///
    /// Successful eviction of a frame decrements the size of replacer and
    /// removes the frame's access history entirely.
    ///
    /// Return the frame id if a frame is evicted successfully, None if no
    /// frames can be evicted.
    fn evict(&self) -> Option<FrameId>;

    /// Toggle whether a frame is evictable or non-evictable. this function
    /// also control replacer size. Note that size is equal to number of
    /// evictable entries.
    ///
    /// If a frame was previously evictable and is to be set to non-evictable,
    /// then size should decrement. If a frame was previously non-evictable
    /// and is to be set evictable, then size should increment.
    ///
    /// Panics if the frame id is out of range or not tracked.
    fn set_evictable(&self, frame_id: FrameId, evictable: bool);

    /// Remove a tracked frame from replacer, along with its access history,
    /// regardless of where the policy ranks it. Decrements the replacer size
    /// if removal happens.
    ///
    /// Removing an untracked frame is a no-op. Panics if the frame is
    /// tracked but not evictable.
    fn remove(&self, frame_id: FrameId);

    /// Number of evictable tracked frames.
    fn size(&self) -> usize;
}
