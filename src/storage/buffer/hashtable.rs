use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;

/// A bucket holds at most `size` entries and records its local depth: the
/// number of low hash bits shared by every key routed to it.
struct Bucket<K, V> {
    depth: usize,
    size: usize,
    items: Vec<(K, V)>,
}

impl<K: Hash + Eq + Clone, V: Clone> Bucket<K, V> {
    fn new(size: usize, depth: usize) -> Self {
        Bucket { depth, size, items: Vec::with_capacity(size) }
    }

    fn find(&self, key: &K) -> Option<V> {
        self.items.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }

    fn remove(&mut self, key: &K) -> bool {
        match self.items.iter().position(|(k, _)| k == key) {
            Some(pos) => {
                self.items.swap_remove(pos);
                true
            }
            None => false,
        }
    }

    /// Install or overwrite the mapping. Returns false if the key is new
    /// and the bucket is full.
    fn insert(&mut self, key: &K, value: &V) -> bool {
        if let Some(slot) = self.items.iter_mut().find(|(k, _)| k == key) {
            slot.1 = value.clone();
            return true;
        }
        if self.items.len() >= self.size {
            return false;
        }
        self.items.push((key.clone(), value.clone()));
        true
    }
}

/// Directory state behind the table's mutex. The directory is a vector of
/// indices into a bucket arena; several directory slots alias the same
/// bucket whenever that bucket's local depth is below the global depth.
/// Splits never mutate an aliased slot's target, they only rewrite the
/// slots that move to the new sibling.
struct Directory<K, V> {
    global_depth: usize,
    bucket_size: usize,
    num_buckets: usize,
    dir: Vec<usize>,
    buckets: Vec<Bucket<K, V>>,
}

impl<K: Hash + Eq + Clone, V: Clone> Directory<K, V> {
    fn new(bucket_size: usize) -> Self {
        Directory {
            global_depth: 0,
            bucket_size,
            num_buckets: 1,
            dir: vec![0],
            buckets: vec![Bucket::new(bucket_size, 0)],
        }
    }

    fn index_of(&self, key: &K) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let mask = (1usize << self.global_depth) - 1;
        hasher.finish() as usize & mask
    }

    fn find(&self, key: &K) -> Option<V> {
        self.buckets[self.dir[self.index_of(key)]].find(key)
    }

    fn remove(&mut self, key: &K) -> bool {
        let slot = self.dir[self.index_of(key)];
        self.buckets[slot].remove(key)
    }

    fn insert(&mut self, key: &K, value: &V) {
        loop {
            let bucket_no = self.index_of(key);
            if self.buckets[self.dir[bucket_no]].insert(key, value) {
                return;
            }
            // Full bucket: split it and retry. The retried insert may hit a
            // full bucket again when every key lands in the same half.
            self.split(bucket_no);
        }
    }

    /// Split the bucket behind directory slot `bucket_no`: deepen it, grow
    /// the directory if its depth now exceeds the global depth, carve off a
    /// sibling, and rehash the bucket's entries across the pair.
    fn split(&mut self, bucket_no: usize) {
        let old = self.dir[bucket_no];
        let items = std::mem::take(&mut self.buckets[old].items);
        self.buckets[old].depth += 1;
        let local_depth = self.buckets[old].depth;
        if local_depth > self.global_depth {
            self.grow();
        }

        let new = self.buckets.len();
        self.buckets.push(Bucket::new(self.bucket_size, local_depth));
        self.num_buckets += 1;

        // Every alias of the old bucket whose new split bit disagrees with
        // bucket_no now points at the sibling.
        let mask = 1usize << (local_depth - 1);
        for i in 0..self.dir.len() {
            if self.dir[i] == old && (i & mask) != (bucket_no & mask) {
                self.dir[i] = new;
            }
        }

        // Rehash the drained entries with the longer prefix. Each lands in
        // either the old bucket or the sibling, so capacity cannot overflow
        // here.
        for (k, v) in items {
            let slot = self.dir[self.index_of(&k)];
            let inserted = self.buckets[slot].insert(&k, &v);
            debug_assert!(inserted);
        }
    }

    /// Double the directory: duplicate every slot. The duplicated half
    /// still references the same buckets, preserving all aliases.
    fn grow(&mut self) {
        self.dir.extend_from_within(..);
        self.global_depth += 1;
    }
}

/// An extendible hash table: an associative map with bounded bucket size
/// that grows by bucket split and directory doubling. Inserts always
/// succeed. A single mutex serializes all operations; callers observe
/// find/insert/remove as atomic.
pub struct ExtendibleHashTable<K, V> {
    inner: Mutex<Directory<K, V>>,
}

impl<K: Hash + Eq + Clone, V: Clone> ExtendibleHashTable<K, V> {
    pub fn new(bucket_size: usize) -> Self {
        assert!(bucket_size > 0, "bucket size should be larger than zero");
        ExtendibleHashTable { inner: Mutex::new(Directory::new(bucket_size)) }
    }

    /// Return the mapped value if the key is present.
    pub fn find(&self, key: &K) -> Option<V> {
        let guard = self.inner.lock().unwrap();
        guard.find(key)
    }

    /// Install or overwrite the mapping, splitting buckets and doubling
    /// the directory as needed.
    pub fn insert(&self, key: K, value: V) {
        let mut guard = self.inner.lock().unwrap();
        guard.insert(&key, &value)
    }

    /// Remove the mapping, returning whether one existed.
    pub fn remove(&self, key: &K) -> bool {
        let mut guard = self.inner.lock().unwrap();
        guard.remove(key)
    }

    pub fn global_depth(&self) -> usize {
        let guard = self.inner.lock().unwrap();
        guard.global_depth
    }

    pub fn local_depth(&self, dir_index: usize) -> usize {
        let guard = self.inner.lock().unwrap();
        guard.buckets[guard.dir[dir_index]].depth
    }

    pub fn num_buckets(&self) -> usize {
        let guard = self.inner.lock().unwrap();
        guard.num_buckets
    }
}
