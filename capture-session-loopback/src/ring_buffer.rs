/// Fixed-capacity circular buffer of captured data.
///
/// Not synchronised; the engine keeps it behind its state lock.
///
/// Overflow behavior: drops the oldest elements and counts them as overrun.
#[derive(Debug)]
pub struct RingBuffer<T> {
    buffer: Vec<T>,
    write_index: usize,
    read_index: usize,
    available: usize,
    overrun: u64,
}

impl<T: Copy + Default> RingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![T::default(); capacity],
            write_index: 0,
            read_index: 0,
            available: 0,
            overrun: 0,
        }
    }

    /// Append `data`, dropping the oldest elements on overflow.
    ///
    /// If `data` is larger than the capacity, only its tail is kept.
    pub fn write(&mut self, data: &[T]) {
        let capacity = self.capacity();
        if data.is_empty() || capacity == 0 {
            self.overrun += data.len() as u64;
            return;
        }

        let data = if data.len() > capacity {
            self.overrun += (data.len() - capacity) as u64;
            &data[data.len() - capacity..]
        } else {
            data
        };

        let overflow = (self.available + data.len()).saturating_sub(capacity);
        if overflow > 0 {
            self.read_index = (self.read_index + overflow) % capacity;
            self.available -= overflow;
            self.overrun += overflow as u64;
        }

        // at most two contiguous runs
        let first = data.len().min(capacity - self.write_index);
        self.buffer[self.write_index..self.write_index + first].copy_from_slice(&data[..first]);
        self.buffer[..data.len() - first].copy_from_slice(&data[first..]);
        self.write_index = (self.write_index + data.len()) % capacity;
        self.available += data.len();
    }

    /// Move up to `out.len()` elements into `out`. Returns how many were moved.
    pub fn read_into(&mut self, out: &mut [T]) -> usize {
        let to_read = out.len().min(self.available);
        if to_read == 0 {
            return 0;
        }
        let capacity = self.capacity();
        let first = to_read.min(capacity - self.read_index);
        out[..first].copy_from_slice(&self.buffer[self.read_index..self.read_index + first]);
        out[first..to_read].copy_from_slice(&self.buffer[..to_read - first]);
        self.read_index = (self.read_index + to_read) % capacity;
        self.available -= to_read;
        to_read
    }

    /// Number of elements currently available for reading.
    pub fn count(&self) -> usize {
        self.available
    }

    pub fn is_empty(&self) -> bool {
        self.available == 0
    }

    /// Elements dropped on overflow since creation or the last reset.
    pub fn overrun(&self) -> u64 {
        self.overrun
    }

    pub fn reset(&mut self) {
        self.write_index = 0;
        self.read_index = 0;
        self.available = 0;
        self.overrun = 0;
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }
}
