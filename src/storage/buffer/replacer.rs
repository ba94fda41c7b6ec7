use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::{FrameId, Replacer};

/// Per-frame bookkeeping. Which queue the frame sits in follows from the
/// access count: under `k` accesses it is in the history queue, at `k` or
/// more it is in the cache queue.
struct Record {
    access_count: usize,
    evictable: bool,
}

/// LRUKReplacer implements the LRU-K replacement policy.
///
/// Frames with fewer than K recorded accesses wait in the history queue in
/// order of first access; they have too little evidence of hotness and are
/// evicted first, oldest arrival first. Frames with at least K accesses sit
/// in the cache queue ordered by most recent access and are evicted least
/// recently used first, only when the history queue has no candidate. Both
/// queues keep their newest entry at the back, so an eviction scan always
/// starts at the oldest end.
pub struct LRUKReplacer {
    records: HashMap<FrameId, Record>,
    /// Under-K frames, front = oldest first access.
    history: VecDeque<FrameId>,
    /// At-least-K frames, front = least recently used.
    cache: VecDeque<FrameId>,
    curr_size: usize,
    replacer_size: usize,
    k: usize,
}

fn detach(queue: &mut VecDeque<FrameId>, frame_id: FrameId) {
    if let Some(pos) = queue.iter().position(|&id| id == frame_id) {
        queue.remove(pos);
    }
}

impl LRUKReplacer {
    pub fn new(k: usize, size: usize) -> Self {
        assert!(k > 0, "replacer k should be larger than zero");
        LRUKReplacer {
            records: HashMap::new(),
            history: VecDeque::new(),
            cache: VecDeque::new(),
            curr_size: 0,
            replacer_size: size,
            k,
        }
    }

    fn record_access(&mut self, frame_id: FrameId) {
        if frame_id >= self.replacer_size {
            panic!("invalid frame id: {}", frame_id);
        }
        match self.records.get_mut(&frame_id) {
            None => {
                self.records.insert(frame_id, Record { access_count: 1, evictable: false });
                // with k = 1 a single access already qualifies for the
                // cache queue
                if self.k == 1 {
                    self.cache.push_back(frame_id);
                } else {
                    self.history.push_back(frame_id);
                }
            }
            Some(record) => {
                record.access_count += 1;
                if record.access_count == self.k {
                    // graduate from history to cache
                    detach(&mut self.history, frame_id);
                    self.cache.push_back(frame_id);
                } else if record.access_count > self.k {
                    detach(&mut self.cache, frame_id);
                    self.cache.push_back(frame_id);
                } else {
                    detach(&mut self.history, frame_id);
                    self.history.push_back(frame_id);
                }
            }
        }
    }

    fn evict(&mut self) -> Option<FrameId> {
        let records = &self.records;
        let first_evictable =
            |queue: &VecDeque<FrameId>| queue.iter().copied().find(|id| records[id].evictable);

        let victim = first_evictable(&self.history).or_else(|| first_evictable(&self.cache))?;
        let record = self.records.remove(&victim).unwrap();
        if record.access_count >= self.k {
            detach(&mut self.cache, victim);
        } else {
            detach(&mut self.history, victim);
        }
        self.curr_size -= 1;
        Some(victim)
    }

    fn set_evictable(&mut self, frame_id: FrameId, evictable: bool) {
        if frame_id >= self.replacer_size {
            panic!("invalid frame id: {}", frame_id);
        }
        let record = match self.records.get_mut(&frame_id) {
            Some(record) => record,
            None => panic!("invalid frame id: {}", frame_id),
        };
        if record.evictable == evictable {
            return;
        }
        record.evictable = evictable;
        if evictable {
            self.curr_size += 1;
        } else {
            self.curr_size -= 1;
        }
    }

    fn remove(&mut self, frame_id: FrameId) {
        let record = match self.records.get(&frame_id) {
            Some(record) => record,
            None => return,
        };
        if !record.evictable {
            panic!("invalid frame id: {}", frame_id);
        }
        let record = self.records.remove(&frame_id).unwrap();
        if record.access_count >= self.k {
            detach(&mut self.cache, frame_id);
        } else {
            detach(&mut self.history, frame_id);
        }
        self.curr_size -= 1;
    }

    fn size(&self) -> usize {
        self.curr_size
    }
}

/// SyncLRUKReplacer implements the thread-safe version of LRU-K replacement
/// policy, basically all the heavy lifting are happens in the LRUKReplacer.
pub struct SyncLRUKReplacer {
    inner: Mutex<LRUKReplacer>,
}

impl SyncLRUKReplacer {
    pub fn new(k: usize, size: usize) -> Self {
        let inner = Mutex::new(LRUKReplacer::new(k, size));
        SyncLRUKReplacer { inner }
    }
}

impl Replacer for SyncLRUKReplacer {
    fn record_access(&self, frame_id: FrameId) {
        let mut guard = self.inner.lock().unwrap();
        guard.record_access(frame_id)
    }

    fn evict(&self) -> Option<FrameId> {
        let mut guard = self.inner.lock().unwrap();
        guard.evict()
    }

    fn set_evictable(&self, frame_id: FrameId, evictable: bool) {
        let mut guard = self.inner.lock().unwrap();
        guard.set_evictable(frame_id, evictable)
    }

    fn remove(&self, frame_id: FrameId) {
        let mut guard = self.inner.lock().unwrap();
        guard.remove(frame_id)
    }

    fn size(&self) -> usize {
        let guard = self.inner.lock().unwrap();
        guard.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_fifo_then_cache_lru() {
        let mut replacer = LRUKReplacer::new(2, 8);

        // Scenario: five frames seen once each, all but 5 evictable.
        for id in 1..=5 {
            replacer.record_access(id);
        }
        for id in 1..=4 {
            replacer.set_evictable(id, true);
        }
        assert_eq!(4, replacer.size());

        // Under-K frames go first, in order of first access.
        assert_eq!(Some(1), replacer.evict());

        // Frames 2 and 3 reach two accesses and graduate to the cache queue,
        // 2 before 3.
        replacer.record_access(2);
        replacer.record_access(3);

        // The history queue still holds 4 (5 is not evictable).
        assert_eq!(Some(4), replacer.evict());

        // With the history queue dry, the least recently used cached frame
        // goes next.
        assert_eq!(Some(2), replacer.evict());
        assert_eq!(1, replacer.size());
    }

    #[test]
    fn test_mixed_sequence() {
        let mut replacer = LRUKReplacer::new(2, 7);

        // Scenario: add six frames. Frame 6 stays non-evictable.
        for id in 1..=6 {
            replacer.record_access(id);
        }
        for id in 1..=5 {
            replacer.set_evictable(id, true);
        }
        assert_eq!(5, replacer.size());

        // Scenario: a second access moves frame 1 to the cache queue. The
        // eviction order among the rest is now [2,3,4,5] then 1.
        replacer.record_access(1);

        assert_eq!(Some(2), replacer.evict());
        assert_eq!(Some(3), replacer.evict());
        assert_eq!(Some(4), replacer.evict());
        assert_eq!(2, replacer.size());

        // Scenario: re-track 3 and 4, touch 5 and 4 a second time so both
        // graduate. History is [6,3], cache is [1,5,4].
        replacer.record_access(3);
        replacer.record_access(4);
        replacer.record_access(5);
        replacer.record_access(4);
        replacer.set_evictable(3, true);
        replacer.set_evictable(4, true);
        assert_eq!(4, replacer.size());

        // 6 heads the history queue but is not evictable, so 3 goes.
        assert_eq!(Some(3), replacer.evict());
        assert_eq!(3, replacer.size());

        // Scenario: once 6 becomes evictable it is the only history frame
        // left and goes before anything cached.
        replacer.set_evictable(6, true);
        assert_eq!(4, replacer.size());
        assert_eq!(Some(6), replacer.evict());
        assert_eq!(3, replacer.size());

        // Scenario: pin 1; the least recently used cached frame is 5.
        replacer.set_evictable(1, false);
        assert_eq!(2, replacer.size());
        assert_eq!(Some(5), replacer.evict());
        assert_eq!(1, replacer.size());

        // Scenario: touch 1 twice more and release it; 4 is now colder.
        replacer.record_access(1);
        replacer.record_access(1);
        replacer.set_evictable(1, true);
        assert_eq!(2, replacer.size());
        assert_eq!(Some(4), replacer.evict());
        assert_eq!(Some(1), replacer.evict());
        assert_eq!(0, replacer.size());

        // Scenario: nothing left to evict; removing an untracked frame is
        // a no-op.
        assert_eq!(None, replacer.evict());
        replacer.remove(1);
        assert_eq!(0, replacer.size());
    }

    #[test]
    fn test_k_of_one_is_plain_lru() {
        let mut replacer = LRUKReplacer::new(1, 4);

        replacer.record_access(0);
        replacer.record_access(1);
        replacer.record_access(2);
        for id in 0..3 {
            replacer.set_evictable(id, true);
        }

        // Every frame qualifies for the cache queue immediately; touching
        // 0 again leaves 1 as the least recently used.
        replacer.record_access(0);
        assert_eq!(Some(1), replacer.evict());
        assert_eq!(Some(2), replacer.evict());
        assert_eq!(Some(0), replacer.evict());
        assert_eq!(None, replacer.evict());
    }

    #[test]
    fn test_eviction_removes_all_trace() {
        let mut replacer = LRUKReplacer::new(2, 4);

        replacer.record_access(0);
        replacer.record_access(0);
        replacer.record_access(1);
        replacer.set_evictable(0, true);
        replacer.set_evictable(1, true);

        assert_eq!(Some(1), replacer.evict());

        // A fresh access starts a new history entry rather than resuming
        // the old count.
        replacer.record_access(1);
        replacer.set_evictable(1, true);
        assert_eq!(Some(1), replacer.evict());
    }

    #[test]
    fn test_remove_forgets_history() {
        let mut replacer = LRUKReplacer::new(2, 4);

        replacer.record_access(2);
        replacer.record_access(3);
        replacer.set_evictable(2, true);
        replacer.set_evictable(3, true);
        assert_eq!(2, replacer.size());

        replacer.remove(2);
        assert_eq!(1, replacer.size());
        assert_eq!(Some(3), replacer.evict());
        assert_eq!(None, replacer.evict());
    }

    #[test]
    #[should_panic(expected = "invalid frame id")]
    fn test_record_access_out_of_range() {
        let mut replacer = LRUKReplacer::new(2, 4);
        replacer.record_access(4);
    }

    #[test]
    #[should_panic(expected = "invalid frame id")]
    fn test_set_evictable_untracked() {
        let mut replacer = LRUKReplacer::new(2, 4);
        replacer.set_evictable(0, true);
    }

    #[test]
    #[should_panic(expected = "invalid frame id")]
    fn test_remove_non_evictable() {
        let mut replacer = LRUKReplacer::new(2, 4);
        replacer.record_access(0);
        replacer.remove(0);
    }

    #[test]
    fn test_sync_replacer() {
        use std::sync::Arc;
        use std::thread;

        let replacer = Arc::new(SyncLRUKReplacer::new(2, 64));
        let mut handles = vec![];
        for t in 0..4 {
            let replacer = Arc::clone(&replacer);
            handles.push(thread::spawn(move || {
                for i in 0..16 {
                    let frame_id = t * 16 + i;
                    replacer.record_access(frame_id);
                    replacer.set_evictable(frame_id, true);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(64, replacer.size());
        for _ in 0..64 {
            assert!(replacer.evict().is_some());
        }
        assert_eq!(None, replacer.evict());
    }
}
