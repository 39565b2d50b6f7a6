//! The SHM writer: publishes frames into the shared region for
//! an arbitrary number of injected readers to consume.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use geometry::PixelRect;
use utils::log;

use crate::types::{
    LayerID, SHMHeader, SHMLayer, VRSettings, MAX_VIEW_COUNT, SWAPCHAIN_LENGTH,
};

#[derive(Debug, thiserror::Error)]
pub enum ShmError {
    #[error("too many layers: {0} exceeds MAX_VIEW_COUNT ({MAX_VIEW_COUNT})")]
    TooManyLayers(usize),
    #[error("GPU device lost; writer must reconstruct its texture pool")]
    DeviceLost,
}

/// Per-layer round-robin texture pool bookkeeping.
struct LayerPool {
    /// Index of the slot that will be handed out on the next publish.
    next_slot: usize,
    /// The fence value each pool slot was last published with. A slot
    /// is safe to reuse once every client's "last seen" broadcast
    /// value has passed it, or once it's `pool_size - 1` generations
    /// stale.
    slot_fence_values: [u64; SWAPCHAIN_LENGTH],
}

impl LayerPool {
    fn new() -> Self {
        LayerPool {
            next_slot: 0,
            slot_fence_values: [0; SWAPCHAIN_LENGTH],
        }
    }

    fn acquire_slot(&mut self, fence_value: u64) -> usize {
        let slot = self.next_slot;
        self.next_slot = (self.next_slot + 1) % SWAPCHAIN_LENGTH;
        self.slot_fence_values[slot] = fence_value;
        slot
    }
}

/// Tracks, per injected client, the last sequence number it
/// broadcast having consumed.
#[derive(Default)]
pub struct ClientBroadcastTable {
    last_seen_seq: Mutex<std::collections::HashMap<u64, u64>>,
}

impl ClientBroadcastTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report_consumed(&self, client_id: u64, sequence: u64) {
        let mut table = self.last_seen_seq.lock().unwrap();
        let entry = table.entry(client_id).or_insert(0);
        if sequence > *entry {
            *entry = sequence;
        }
    }

    /// The oldest sequence number any still-registered client has
    /// reported consuming, or `None` if there are no clients (nothing
    /// constrains slot reuse).
    fn oldest_consumed(&self) -> Option<u64> {
        self.last_seen_seq.lock().unwrap().values().copied().min()
    }
}

/// Shared, mutex-guarded publication state. A reader's seqlock read
/// is modeled here as "lock, copy, unlock" rather than a raw
/// lock-free atomic seqlock over literal shared-memory bytes: the
/// byte-level transport (a named `CreateFileMappingW` region on
/// Windows) is a separate concern from this publish/observe contract,
/// and the mutex gives the identical external guarantee (a reader
/// never observes a torn write) that the original's
/// `std::atomic_ref`-based seqlock provides.
pub(crate) struct ShmState {
    pub(crate) committed: Mutex<SHMHeader>,
    pub(crate) sequence: AtomicU64,
}

impl ShmState {
    fn new() -> Self {
        ShmState {
            committed: Mutex::new(SHMHeader::empty()),
            sequence: AtomicU64::new(0),
        }
    }
}

pub struct ShmWriter {
    state: Arc<ShmState>,
    pools: Vec<LayerPool>,
    fence_value: AtomicU64,
    broadcast: Arc<ClientBroadcastTable>,
    gpu_luid: i64,
}

/// A single call to [`ShmWriter::begin_publish`]/[`PublishTransaction::commit`]:
/// add layers, then commit them as one published frame.
pub struct PublishTransaction<'a> {
    writer: &'a mut ShmWriter,
    layers: Vec<SHMLayer>,
    fence_value: u64,
}

impl<'a> PublishTransaction<'a> {
    /// Step 1: acquire the next pool slot for `layer_id`, round-robin.
    /// Step 2 (rendering into the slot) happens in caller code against
    /// whatever render-target the slot's texture index identifies;
    /// this type only tracks bookkeeping.
    pub fn add_layer(&mut self, index: usize, mut layer: SHMLayer) -> Result<(), ShmError> {
        if index >= MAX_VIEW_COUNT {
            return Err(ShmError::TooManyLayers(index + 1));
        }
        while self.writer.pools.len() <= index {
            self.writer.pools.push(LayerPool::new());
        }
        let slot = self.writer.pools[index].acquire_slot(self.fence_value);
        layer.texture_index = slot as u32;
        layer.fence_value = self.fence_value;
        self.layers.push(layer);
        Ok(())
    }

    /// Steps 3-5: bump+signal the fence (already captured at
    /// `begin_publish` time so every layer in this frame shares one
    /// value), write layers then header, then the sequence number
    /// last.
    pub fn commit(self, global_input_layer_id: LayerID, vr: VRSettings) -> u64 {
        let PublishTransaction {
            writer,
            layers,
            fence_value,
        } = self;
        let next_seq = writer.state.sequence.load(Ordering::Acquire) + 1;

        let mut committed = writer.state.committed.lock().unwrap();
        committed.layer_count = layers.len() as u8;
        committed.layers = layers;
        committed.global_input_layer_id = global_input_layer_id;
        committed.vr = vr;
        committed.fence_value = fence_value;
        committed.feeder_gpu_luid = writer.gpu_luid;
        committed.sequence = next_seq;
        drop(committed);

        writer.state.sequence.store(next_seq, Ordering::Release);
        next_seq
    }
}

impl ShmWriter {
    pub fn new() -> Self {
        ShmWriter {
            state: Arc::new(ShmState::new()),
            pools: Vec::new(),
            fence_value: AtomicU64::new(0),
            broadcast: Arc::new(ClientBroadcastTable::new()),
            gpu_luid: 0,
        }
    }

    pub fn broadcast_table(&self) -> Arc<ClientBroadcastTable> {
        Arc::clone(&self.broadcast)
    }

    /// A cheap handle readers can poll through without the writer's
    /// mutable half; used to wire up [`crate::reader::CachedReader`]
    /// in-process for tests.
    pub(crate) fn shared_state(&self) -> Arc<ShmState> {
        Arc::clone(&self.state)
    }

    /// GPU device lost. Drops the pool and bumps the LUID field so
    /// readers can detect the feeder reconstructed its device; the
    /// next `begin_publish` starts a fresh pool.
    pub fn on_device_lost(&mut self, new_luid: i64) {
        log::error!("GPU device lost; dropping texture pool (new luid {new_luid})");
        self.pools.clear();
        self.gpu_luid = new_luid;
    }

    /// Whether `slot`'s previous occupant (published with
    /// `prev_fence_value`) is safe to overwrite: either every client's
    /// reported "last seen" sequence has moved past it, or there's no
    /// client tracking at all.
    pub fn slot_reclaimable(&self, prev_fence_value: u64) -> bool {
        match self.broadcast.oldest_consumed() {
            None => true,
            Some(oldest) => oldest >= prev_fence_value,
        }
    }

    /// Creates a new per-client [`crate::reader::CachedReader`] bound
    /// to this writer's region.
    pub fn new_reader(&self, client_id: u64) -> crate::reader::CachedReader {
        crate::reader::CachedReader::new(self.shared_state(), self.broadcast_table(), client_id)
    }

    /// Begins a new publish. `fence_value` is bumped once per frame
    ///, shared by every layer published in this
    /// transaction.
    pub fn begin_publish(&mut self) -> PublishTransaction<'_> {
        let fence_value = self.fence_value.fetch_add(1, Ordering::SeqCst) + 1;
        PublishTransaction {
            writer: self,
            layers: Vec::new(),
            fence_value,
        }
    }
}

impl Default for ShmWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::CachedReader;
    use crate::types::SHMLayer;
    use geometry::Point;
    use geometry::Size;

    fn rect() -> PixelRect {
        PixelRect::new(Point::new(0, 0), Size::new(1024, 768))
    }

    #[test]
    fn publish_assigns_round_robin_slots() {
        let mut writer = ShmWriter::new();
        let layer_id = LayerID::from_raw(1);
        for expected_slot in [0, 1, 2, 0, 1] {
            let mut tx = writer.begin_publish();
            tx.add_layer(0, SHMLayer::new(layer_id, rect())).unwrap();
            // peek the slot we just assigned via the committed header
            tx.commit(LayerID::NULL, VRSettings::default());
            let committed = writer.state.committed.lock().unwrap();
            assert_eq!(committed.layers[0].texture_index as usize, expected_slot);
        }
    }

    #[test]
    fn too_many_layers_is_rejected() {
        let mut writer = ShmWriter::new();
        let mut tx = writer.begin_publish();
        let err = tx.add_layer(MAX_VIEW_COUNT, SHMLayer::new(LayerID::from_raw(1), rect()));
        assert!(matches!(err, Err(ShmError::TooManyLayers(_))));
    }

    #[test]
    fn sequence_increases_monotonically_and_never_torn() {
        // A reader must never observe a sequence number going
        // backwards, and must never observe a header whose `sequence`
        // field disagrees with the layers it was published alongside.
        let mut writer = ShmWriter::new();
        let reader = CachedReader::new(writer.shared_state(), writer.broadcast_table(), 1);

        for i in 1..=5u64 {
            let mut tx = writer.begin_publish();
            tx.add_layer(0, SHMLayer::new(LayerID::from_raw(1), rect()))
                .unwrap();
            let seq = tx.commit(LayerID::NULL, VRSettings::default());
            assert_eq!(seq, i);
            let snapshot = reader.maybe_get().unwrap();
            assert_eq!(snapshot.header.sequence, i);
        }
    }

    #[test]
    fn device_lost_clears_pool_and_bumps_luid() {
        let mut writer = ShmWriter::new();
        let mut tx = writer.begin_publish();
        tx.add_layer(0, SHMLayer::new(LayerID::from_raw(1), rect()))
            .unwrap();
        tx.commit(LayerID::NULL, VRSettings::default());
        assert_eq!(writer.pools[0].next_slot, 1);

        writer.on_device_lost(42);
        assert!(writer.pools.is_empty());
        assert_eq!(writer.gpu_luid, 42);
    }

    #[test]
    fn slot_reclaimable_with_no_clients_tracked() {
        let writer = ShmWriter::new();
        assert!(writer.slot_reclaimable(0));
    }

    #[test]
    fn slot_not_reclaimable_until_client_catches_up() {
        let writer = ShmWriter::new();
        writer.broadcast.report_consumed(7, 3);
        assert!(!writer.slot_reclaimable(5));
        assert!(writer.slot_reclaimable(3));
    }
}
