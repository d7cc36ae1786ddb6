use std::time::Instant;

use crate::detection::domain::chunk_deduplicator::deduplicate;
use crate::detection::domain::face_observation::{DetectedFace, FaceObservation};
use crate::identity::domain::identity::{Identity, IdentityId};
use crate::identity::domain::identity_matcher::IdentityMatcher;
use crate::identity::domain::identity_pool::IdentityPool;
use crate::identity::domain::identity_seeder::IdentitySeeder;
use crate::identity::domain::identity_store::IdentityStore;
use crate::interaction::domain::face_crop::FaceCrop;
use crate::interaction::domain::interaction_aggregator::InteractionAggregator;
use crate::shared::config::AnalysisConfig;
use crate::shared::error::AnalysisError;
use crate::shared::frame::Frame;
use crate::storage::domain::object_store::{ChunkKey, ObjectStore};
use crate::storage::domain::search_index::{SearchEntry, SearchIndex};
use crate::video::domain::chunk::Chunk;
use crate::video::domain::chunk_decoder::ChunkDecoder;
use crate::video::domain::frame_sampler::FrameSampler;
use crate::video::domain::image_codec::CropEncoder;
use crate::video::domain::video_segmenter::VideoSegmenter;
use crate::video::domain::video_transcoder::VideoTranscoder;

use super::analysis_notifier::AnalysisNotifier;
use super::analysis_store::AnalysisStore;
use super::detection_executor::DetectionExecutor;
use super::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use super::pipeline_state::PipelineState;
use super::video_analysis::{ChunkDetection, NewIdentity, VideoAnalysis};

/// One video to analyse on behalf of `owner`.
pub struct AnalysisRequest {
    pub owner: String,
    pub video_id: String,
    pub media: Vec<u8>,
}

/// Accumulates results across the chunk loop.
struct ChunkLoop {
    aggregator: InteractionAggregator,
    new_identities: Vec<NewIdentity>,
    detections: Vec<ChunkDetection>,
}

/// Turns one video into an interaction graph between the people in it.
///
/// Loads the owner's identities into an in-memory pool, segments the video,
/// then processes chunks strictly in index order: detect on sampled frames,
/// collapse same-person faces per chunk, match each cluster against the
/// pool (creating identities as needed) and count appearances and
/// co-occurrences. The pool is only written from this loop.
///
/// Each chunk's media is dropped once that chunk is processed. With an
/// analysis store configured, the result is persisted before the run is
/// `Done`.
///
/// Single-use: a second `execute` returns [`AnalysisError::AlreadyExecuted`].
/// Any error is terminal for the video and nothing is published; chunks
/// already uploaded or identities already created are kept.
pub struct AnalyzeVideoUseCase {
    config: AnalysisConfig,
    segmenter: VideoSegmenter,
    decoder: Box<dyn ChunkDecoder>,
    sampler: FrameSampler,
    executor: Box<dyn DetectionExecutor>,
    matcher: IdentityMatcher,
    store: Box<dyn IdentityStore>,
    crop_encoder: Box<dyn CropEncoder>,
    seeder: Option<IdentitySeeder>,
    object_store: Option<Box<dyn ObjectStore>>,
    search_index: Option<Box<dyn SearchIndex>>,
    analysis_store: Option<Box<dyn AnalysisStore>>,
    notifier: Option<Box<dyn AnalysisNotifier>>,
    logger: Box<dyn PipelineLogger>,
    state: PipelineState,
}

impl AnalyzeVideoUseCase {
    pub fn new(
        config: AnalysisConfig,
        transcoder: Box<dyn VideoTranscoder>,
        decoder: Box<dyn ChunkDecoder>,
        executor: Box<dyn DetectionExecutor>,
        store: Box<dyn IdentityStore>,
        crop_encoder: Box<dyn CropEncoder>,
    ) -> Result<Self, AnalysisError> {
        config.validate()?;
        let segmenter = VideoSegmenter::new(transcoder, config.chunk_duration_secs)
            .map_err(|e| AnalysisError::Input(e.into()))?;
        let sampler =
            FrameSampler::new(config.frame_skip).map_err(|e| AnalysisError::Input(e.into()))?;
        let matcher =
            IdentityMatcher::new(config.face_match_threshold, config.new_identity_threshold);
        Ok(Self {
            config,
            segmenter,
            decoder,
            sampler,
            executor,
            matcher,
            store,
            crop_encoder,
            seeder: None,
            object_store: None,
            search_index: None,
            analysis_store: None,
            notifier: None,
            logger: Box::new(NullPipelineLogger),
            state: PipelineState::Pending,
        })
    }

    /// Embeds stored identities that only have a reference image.
    /// Without a seeder such identities are left out of the pool.
    pub fn with_seeder(mut self, seeder: IdentitySeeder) -> Self {
        self.seeder = Some(seeder);
        self
    }

    pub fn with_object_store(mut self, store: Box<dyn ObjectStore>) -> Self {
        self.object_store = Some(store);
        self
    }

    pub fn with_search_index(mut self, index: Box<dyn SearchIndex>) -> Self {
        self.search_index = Some(index);
        self
    }

    pub fn with_analysis_store(mut self, store: Box<dyn AnalysisStore>) -> Self {
        self.analysis_store = Some(store);
        self
    }

    pub fn with_notifier(mut self, notifier: Box<dyn AnalysisNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn execute(&mut self, request: &AnalysisRequest) -> Result<VideoAnalysis, AnalysisError> {
        if self.state != PipelineState::Pending {
            return Err(AnalysisError::AlreadyExecuted);
        }

        match self.run(request) {
            Ok(analysis) => {
                self.logger.summary();
                if let Some(notifier) = &self.notifier {
                    notifier.notify(&analysis);
                }
                Ok(analysis)
            }
            Err(e) => {
                log::error!("Analysis of video {} failed in {}: {e}", request.video_id, self.state);
                if !self.state.is_terminal() {
                    self.state.advance(PipelineState::Failed)?;
                }
                Err(e)
            }
        }
    }

    fn run(&mut self, request: &AnalysisRequest) -> Result<VideoAnalysis, AnalysisError> {
        self.state.advance(PipelineState::LoadingIdentities)?;
        let mut pool = self.load_identities(&request.owner)?;
        self.logger
            .info(&format!("Loaded {} known identities for {}", pool.len(), request.owner));

        self.state.advance(PipelineState::Segmenting)?;
        let started = Instant::now();
        let chunks = self.segmenter.segment(&request.media)?;
        self.logger.timing("segment", elapsed_ms(started));

        self.state.advance(PipelineState::ProcessingChunks)?;
        let mut acc = ChunkLoop {
            aggregator: InteractionAggregator::new(self.config.max_sample_faces),
            new_identities: Vec::new(),
            detections: Vec::new(),
        };
        let total_chunks = chunks.len();
        for chunk in chunks {
            let index = chunk.index;
            self.process_chunk(request, chunk, &mut pool, &mut acc)?;
            self.logger.progress(index + 1, total_chunks);
        }

        self.state.advance(PipelineState::Aggregating)?;
        let analysis = VideoAnalysis {
            video_id: request.video_id.clone(),
            owner: request.owner.clone(),
            total_chunks,
            identities: acc.aggregator.finish(),
            new_identities: acc.new_identities,
            detections: acc.detections,
        };
        if let Some(store) = self.analysis_store.as_mut() {
            store.save_analysis(&analysis).map_err(AnalysisError::store)?;
        }

        self.state.advance(PipelineState::Done)?;
        self.logger.info(&format!(
            "Video {}: {} chunks, {} identities present, {} new",
            request.video_id,
            total_chunks,
            analysis.identities.len(),
            analysis.new_identities.len()
        ));
        Ok(analysis)
    }

    fn load_identities(&mut self, owner: &str) -> Result<IdentityPool, AnalysisError> {
        let mut pool = IdentityPool::new(self.executor.embedding_dim());
        let stored = self
            .store
            .load_known_identities(owner)
            .map_err(AnalysisError::store)?;
        let stored = match self.seeder.as_mut() {
            Some(seeder) => seeder.embed_pending(owner, stored, self.store.as_mut())?,
            None => stored,
        };
        for identity in stored {
            match identity.embedding {
                Some(embedding) => pool.insert(identity.id, embedding)?,
                None => log::warn!("Identity {} has no embedding yet, skipping", identity.id),
            }
        }
        Ok(pool)
    }

    /// Takes the chunk by value so its media is freed when the chunk is done.
    fn process_chunk(
        &mut self,
        request: &AnalysisRequest,
        chunk: Chunk,
        pool: &mut IdentityPool,
        acc: &mut ChunkLoop,
    ) -> Result<(), AnalysisError> {
        let chunk_index = chunk.index;

        if let Some(object_store) = self.object_store.as_mut() {
            let started = Instant::now();
            let key = ChunkKey {
                owner: request.owner.clone(),
                video_id: request.video_id.clone(),
                chunk_index,
                chunk_id: chunk.id.clone(),
            };
            let stored = object_store
                .put_chunk(&key, &chunk.media_bytes)
                .map_err(|e| AnalysisError::capability("upload", format!("chunk {chunk_index}: {e}")))?;
            log::debug!("Uploaded chunk {chunk_index} as {}", stored.reference);
            self.logger.timing("upload", elapsed_ms(started));
        }

        let started = Instant::now();
        let faces = self.detect(&chunk)?;
        self.logger.timing("detect", elapsed_ms(started));
        self.logger.metric("faces", faces.len() as f64);

        let (observations, crops): (Vec<FaceObservation>, Vec<Frame>) = faces
            .into_iter()
            .map(|DetectedFace { observation, crop }| (observation, crop))
            .unzip();

        let started = Instant::now();
        let clusters = deduplicate(&observations, self.config.face_grouping_threshold);
        self.logger.timing("cluster", elapsed_ms(started));
        self.logger.metric("clusters", clusters.len() as f64);

        let started = Instant::now();
        let mut present: Vec<IdentityId> = Vec::with_capacity(clusters.len());
        for cluster in &clusters {
            let representative = cluster.representative();
            let observation = &observations[representative];
            let Some(matched) = self.matcher.resolve(observation, pool)? else {
                log::debug!(
                    "Chunk {chunk_index}: dropping unmatched face (quality {:.2})",
                    observation.quality
                );
                continue;
            };

            if matched.is_new {
                let identity = Identity::discovered(
                    matched.identity_id.clone(),
                    observation.embedding.clone(),
                    &request.video_id,
                    chunk_index,
                );
                self.store
                    .create_or_update_identity(&request.owner, &identity)
                    .map_err(AnalysisError::store)?;
                log::info!("Chunk {chunk_index}: new identity {}", matched.identity_id);
                acc.new_identities.push(NewIdentity {
                    identity_id: matched.identity_id.clone(),
                    embedding: observation.embedding.clone(),
                });
            }

            if let Some(crop) = self.encode_crop(&crops[representative]) {
                acc.aggregator.add_sample(&matched.identity_id, crop);
            }
            acc.detections.push(ChunkDetection {
                chunk_index,
                identity_id: matched.identity_id.clone(),
                confidence: matched.confidence,
                is_new: matched.is_new,
                bbox: observation.bbox,
            });
            present.push(matched.identity_id);
        }
        self.logger.timing("match", elapsed_ms(started));

        acc.aggregator.record_chunk(&present);
        self.index_chunk(request, &chunk, &present);
        Ok(())
    }

    /// Decodes and samples the chunk, then runs detection. A chunk that
    /// cannot be decoded contributes no faces.
    fn detect(&mut self, chunk: &Chunk) -> Result<Vec<DetectedFace>, AnalysisError> {
        let decoded = match self.decoder.decode(&chunk.media_bytes) {
            Ok(frames) => frames,
            Err(e) => {
                log::warn!("Chunk {}: decode failed, no faces: {e}", chunk.index);
                return Ok(Vec::new());
            }
        };
        let mut sampled = self.sampler.sample(decoded);
        self.executor
            .detect_chunk(chunk.index, &mut sampled, self.config.crop_padding)
    }

    fn encode_crop(&self, crop: &Frame) -> Option<FaceCrop> {
        match self.crop_encoder.encode(crop) {
            Ok(data) => Some(FaceCrop::new(self.crop_encoder.mime_type(), data)),
            Err(e) => {
                log::warn!("Could not encode face crop: {e}");
                None
            }
        }
    }

    fn index_chunk(&mut self, request: &AnalysisRequest, chunk: &Chunk, present: &[IdentityId]) {
        let Some(index) = self.search_index.as_mut() else {
            return;
        };
        let entry = SearchEntry {
            key: format!("{}:{}", request.video_id, chunk.index),
            text: chunk_summary(chunk, present),
            namespace: request.owner.clone(),
        };
        if let Err(e) = index.upsert(&entry) {
            log::warn!("Could not index chunk {}: {e}", chunk.index);
        }
    }
}

fn chunk_summary(chunk: &Chunk, present: &[IdentityId]) -> String {
    let mut ids: Vec<&str> = present.iter().map(IdentityId::as_str).collect();
    ids.sort_unstable();
    ids.dedup();
    let people = if ids.is_empty() {
        "no identified people".to_string()
    } else {
        format!("people: {}", ids.join(", "))
    };
    format!(
        "Chunk {} ({:.2}s to {:.2}s), {people}",
        chunk.index, chunk.start_time, chunk.end_time
    )
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
