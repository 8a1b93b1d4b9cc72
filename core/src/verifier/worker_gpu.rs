//! verifier/worker_gpu.rs
//! Batched traditional-cipher header check on a wgpu compute device.
//!
//! Per run: one device, one pipeline, shared by every worker.
//! Per worker: its own buffer set sized for `capacity` candidates.
//! Per batch: upload lengths + packed bytes, rewrite the active count,
//! dispatch, copy results to a staging buffer and map it back.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use bytemuck::cast_slice;
use bytes::Bytes;
use crossbeam::channel::bounded;
use log::{debug, info, warn};
use wgpu::util::DeviceExt;
use wgpu::wgt::PollType;

use crate::archive::{parse_cipher_header, ZipCryptoTarget};
use crate::cipher::confirm_stored;
use crate::config::BackendKind;
use crate::constants::gpu::{
    CANDIDATE_STRIDE_BYTES, KERNEL_ENTRY_POINT, PARAMS_COUNT_OFFSET, PARAMS_WORDS, WORKGROUP_SIZE,
};
use crate::types::{BackendInitError, CrackError, ResourceError};
use crate::verifier::packing::pack_candidates;
use crate::verifier::types::{BatchOutcome, BatchVerifier, VerifierBackend};

/// Device, queue and compiled pipeline; shared across workers.
struct GpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
    capacity: usize,
}

pub struct GpuBackend {
    ctx: Arc<GpuContext>,
}

/// Parse and validate WGSL before handing it to the device, so a bad
/// artifact is an init error instead of a device-side panic.
fn load_kernel(path: &Path) -> Result<String, BackendInitError> {
    let src = fs::read_to_string(path).map_err(|source| BackendInitError::KernelMissing {
        path: path.display().to_string(),
        source,
    })?;

    let module = naga::front::wgsl::parse_str(&src)
        .map_err(|e| BackendInitError::KernelInvalid(e.emit_to_string(&src)))?;
    naga::valid::Validator::new(naga::valid::ValidationFlags::all(), naga::valid::Capabilities::all())
        .validate(&module)
        .map_err(|e| BackendInitError::KernelInvalid(format!("{e:?}")))?;

    if !module.entry_points.iter().any(|ep| ep.name == KERNEL_ENTRY_POINT) {
        return Err(BackendInitError::KernelInvalid(format!("missing entry point `{KERNEL_ENTRY_POINT}`")));
    }
    Ok(src)
}

impl GpuBackend {
    pub fn new(kernel_path: &Path, capacity: usize) -> Result<Self, BackendInitError> {
        pollster::block_on(Self::init(kernel_path, capacity))
    }

    async fn init(kernel_path: &Path, capacity: usize) -> Result<Self, BackendInitError> {
        let src = load_kernel(kernel_path)?;

        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| BackendInitError::NoAdapter(format!("{e:?}")))?;

        let info = adapter.get_info();
        info!("[GPU] adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("zipcrack-device"),
                required_features: wgpu::Features::empty(),
                required_limits: adapter.limits(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
                experimental_features: wgpu::ExperimentalFeatures::default(),
            })
            .await
            .map_err(|e| BackendInitError::Device(e.to_string()))?;

        let limits = device.limits();
        let storage_limit = (limits.max_storage_buffer_binding_size as u64).min(limits.max_buffer_size);
        let dispatch_limit = limits.max_compute_workgroups_per_dimension as usize * WORKGROUP_SIZE as usize;
        let device_capacity = (storage_limit / CANDIDATE_STRIDE_BYTES as u64) as usize;
        let capacity = capacity.min(device_capacity).min(dispatch_limit);
        if capacity == 0 {
            return Err(BackendInitError::Device(ResourceError::ZeroCapacity.to_string()));
        }
        debug!("[GPU] batch capacity {capacity} (device allows {device_capacity})");

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("zipcrack-kernel"),
            source: wgpu::ShaderSource::Wgsl(src.into()),
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("zipcrack-pipeline"),
            layout: None,
            module: &shader,
            entry_point: Some(KERNEL_ENTRY_POINT),
            cache: None,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        });

        Ok(Self { ctx: Arc::new(GpuContext { device, queue, pipeline, capacity }) })
    }

    pub fn capacity(&self) -> usize {
        self.ctx.capacity
    }
}

impl VerifierBackend for GpuBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Gpu
    }

    fn new_worker(&self, archive: &Bytes) -> Result<Box<dyn BatchVerifier>, CrackError> {
        let target = parse_cipher_header(archive)?;
        Ok(Box::new(GpuVerifier::new(self.ctx.clone(), archive.clone(), target)?))
    }
}

// ---- Per-worker device resources ----

struct GpuBuffers {
    lengths: wgpu::Buffer,
    passwords: wgpu::Buffer,
    params: wgpu::Buffer,
    results: wgpu::Buffer,
    staging: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl GpuBuffers {
    fn new(ctx: &GpuContext, target: &ZipCryptoTarget) -> Result<Self, ResourceError> {
        let device = &ctx.device;
        let words = (ctx.capacity * 4) as u64;
        let packed = (ctx.capacity * CANDIDATE_STRIDE_BYTES) as u64;

        let limit = device.limits().max_buffer_size;
        if packed > limit {
            return Err(ResourceError::BufferTooLarge { label: "passwords", size: packed, limit });
        }

        let storage = |label: &'static str, size: u64, extra: wgpu::BufferUsages| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size,
                usage: wgpu::BufferUsages::STORAGE | extra,
                mapped_at_creation: false,
            })
        };

        let lengths = storage("lengths", words, wgpu::BufferUsages::COPY_DST);
        let passwords = storage("passwords", packed, wgpu::BufferUsages::COPY_DST);
        let results = storage("results", words, wgpu::BufferUsages::COPY_SRC);

        // [h0, h1, h2, check, count, pad, pad, pad]
        let h = target.header.words();
        let mut params_init = [0u32; PARAMS_WORDS];
        params_init[..3].copy_from_slice(&h);
        params_init[3] = target.header.check as u32;
        let params = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("params"),
            contents: cast_slice(&params_init),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        });

        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("staging"),
            size: words,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let layout = ctx.pipeline.get_bind_group_layout(0);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("zipcrack-bind-group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: lengths.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: passwords.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 2, resource: params.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 3, resource: results.as_entire_binding() },
            ],
        });

        Ok(Self { lengths, passwords, params, results, staging, bind_group })
    }

    /// Buffers first, then the bind group that references them.
    fn release(self) {
        self.staging.destroy();
        self.results.destroy();
        self.params.destroy();
        self.passwords.destroy();
        self.lengths.destroy();
        drop(self.bind_group);
    }
}

pub struct GpuVerifier {
    ctx: Arc<GpuContext>,
    archive: Bytes,
    target: ZipCryptoTarget,
    buffers: Option<GpuBuffers>,
}

impl GpuVerifier {
    fn new(ctx: Arc<GpuContext>, archive: Bytes, target: ZipCryptoTarget) -> Result<Self, ResourceError> {
        let buffers = GpuBuffers::new(&ctx, &target)?;
        Ok(Self { ctx, archive, target, buffers: Some(buffers) })
    }

    /// Run one dispatch over the packed batch; returns one marker per slot.
    fn dispatch(&self, batch: &[String]) -> Result<Vec<u32>, ResourceError> {
        let bufs = self.buffers.as_ref().ok_or_else(|| ResourceError::Device("verifier closed".into()))?;
        let packed = pack_candidates(batch, self.ctx.capacity);
        let count = packed.count();
        let result_bytes = (count * 4) as u64;

        let queue = &self.ctx.queue;
        queue.write_buffer(&bufs.lengths, 0, cast_slice(&packed.lengths));
        queue.write_buffer(&bufs.passwords, 0, cast_slice(&packed.words));
        queue.write_buffer(&bufs.params, PARAMS_COUNT_OFFSET, &(count as u32).to_le_bytes());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("zipcrack-dispatch") });
        {
            let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: None,
                timestamp_writes: None,
            });
            cpass.set_pipeline(&self.ctx.pipeline);
            cpass.set_bind_group(0, &bufs.bind_group, &[]);
            cpass.dispatch_workgroups((count as u32).div_ceil(WORKGROUP_SIZE), 1, 1);
        }
        encoder.copy_buffer_to_buffer(&bufs.results, 0, &bufs.staging, 0, result_bytes);
        let submission = queue.submit(Some(encoder.finish()));

        let slice = bufs.staging.slice(..result_bytes);
        let (tx, rx) = bounded(1);
        slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });
        self.ctx
            .device
            .poll(PollType::Wait { submission_index: Some(submission), timeout: None })
            .map_err(|e| ResourceError::Device(format!("poll failed: {e:?}")))?;
        rx.recv()
            .map_err(|_| ResourceError::Device("map callback dropped".into()))?
            .map_err(|e| ResourceError::Device(format!("map failed: {e:?}")))?;

        let markers = {
            let data = slice.get_mapped_range();
            cast_slice::<u8, u32>(&data).to_vec()
        };
        bufs.staging.unmap();
        Ok(markers)
    }
}

/// Lowest flagged slot whose full decrypt matches the entry CRC.
/// Check-byte hits include ~1/256 false positives, so every flag is re-checked.
fn first_confirmed(markers: &[u32], batch: &[String], data: &[u8], crc: u32) -> Option<usize> {
    markers
        .iter()
        .zip(batch)
        .enumerate()
        .find(|&(_, (&m, pw))| m != 0 && confirm_stored(pw.as_bytes(), data, crc))
        .map(|(i, _)| i)
}

/// One marker per dispatched slot: the marker count is the attempt count,
/// even when the batch was truncated to the device capacity.
fn resolve_markers(markers: &[u32], batch: &[String], data: &[u8], crc: u32) -> BatchOutcome {
    let attempts = markers.len().min(batch.len());
    match first_confirmed(&markers[..attempts], batch, data, crc) {
        Some(i) => BatchOutcome::hit(i, attempts),
        None => BatchOutcome::miss(attempts),
    }
}

impl BatchVerifier for GpuVerifier {
    fn batch_verify(&mut self, batch: &[String]) -> BatchOutcome {
        let count = batch.len().min(self.ctx.capacity);
        if count == 0 {
            return BatchOutcome::miss(0);
        }

        let markers = match self.dispatch(batch) {
            Ok(m) => m,
            Err(e) => {
                warn!("[GPU] dispatch failed: {e}");
                return BatchOutcome::miss(0);
            }
        };

        let data = self.target.encrypted_data(&self.archive);
        resolve_markers(&markers, batch, data, self.target.crc32)
    }

    fn close(&mut self) {
        if let Some(buffers) = self.buffers.take() {
            buffers.release();
        }
    }
}

impl Drop for GpuVerifier {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::{header_check, ZipCryptoKeys};
    use crate::constants::zip_format::CIPHER_HEADER_LEN;

    const PASSWORD: &str = "hunter2";
    const PAYLOAD: &[u8] = b"stored payload for host confirmation";

    /// Encrypted `header || payload` for a stored entry, plus its CRC.
    fn encrypted_entry() -> (Vec<u8>, u32) {
        let crc = crc32fast::hash(PAYLOAD);
        let mut buf = vec![0x5au8; CIPHER_HEADER_LEN];
        buf[CIPHER_HEADER_LEN - 1] = (crc >> 24) as u8;
        buf.extend_from_slice(PAYLOAD);
        ZipCryptoKeys::from_password(PASSWORD.as_bytes()).encrypt_in_place(&mut buf);
        (buf, crc)
    }

    /// A wrong password whose decrypted header still ends in the check byte.
    fn check_byte_collision(data: &[u8], crc: u32) -> String {
        let header: [u8; CIPHER_HEADER_LEN] = data[..CIPHER_HEADER_LEN].try_into().unwrap();
        let check = (crc >> 24) as u8;
        (0..1_000_000)
            .map(|n| format!("w{n}"))
            .find(|pw| header_check(pw.as_bytes(), &header, check))
            .expect("no check-byte collision in range")
    }

    fn batch(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn lowest_confirmed_slot_wins() {
        let (data, crc) = encrypted_entry();
        let batch = batch(&["aa", PASSWORD, "bb", PASSWORD]);
        let markers = [0, 1, 0, 1];
        assert_eq!(first_confirmed(&markers, &batch, &data, crc), Some(1));
    }

    #[test]
    fn unflagged_slots_are_never_confirmed() {
        let (data, crc) = encrypted_entry();
        let batch = batch(&[PASSWORD, "zz"]);
        assert_eq!(first_confirmed(&[0, 0], &batch, &data, crc), None);
    }

    #[test]
    fn check_byte_collision_is_rejected() {
        let (data, crc) = encrypted_entry();
        let impostor = check_byte_collision(&data, crc);
        assert!(!confirm_stored(impostor.as_bytes(), &data, crc));

        let batch = vec!["nope".to_string(), impostor, PASSWORD.to_string()];
        let outcome = resolve_markers(&[0, 1, 1], &batch, &data, crc);
        assert_eq!(outcome, BatchOutcome::hit(2, 3));
    }

    #[test]
    fn truncated_batch_counts_only_dispatched_slots() {
        let (data, crc) = encrypted_entry();
        let mut batch = batch(&["a", "b", "c", "d", "e", "f"]);
        batch.push(PASSWORD.to_string());

        let capacity = 4;
        let packed = pack_candidates(&batch, capacity);
        let markers = vec![0u32; packed.count()];
        let outcome = resolve_markers(&markers, &batch, &data, crc);
        assert_eq!(outcome, BatchOutcome::miss(capacity));
    }
}
