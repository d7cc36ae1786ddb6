use crate::detection::domain::face_detector::FaceDetector;
use crate::identity::domain::identity::{Identity, IdentityId};
use crate::identity::domain::identity_store::IdentityStore;
use crate::shared::embedding::Embedding;
use crate::shared::error::AnalysisError;
use crate::video::domain::image_codec::ImageDecoder;

/// A reference photo for one person.
#[derive(Clone, Debug)]
pub struct SeedRequest {
    pub id: IdentityId,
    pub display_name: Option<String>,
    pub image: Vec<u8>,
}

/// Turns reference photos into identity embeddings.
///
/// Failures are reported per identity; one photo without a face never
/// stops the rest of a batch.
pub struct IdentitySeeder {
    detector: Box<dyn FaceDetector>,
    decoder: Box<dyn ImageDecoder>,
}

impl IdentitySeeder {
    pub fn new(detector: Box<dyn FaceDetector>, decoder: Box<dyn ImageDecoder>) -> Self {
        Self { detector, decoder }
    }

    pub fn embedding_dim(&self) -> usize {
        self.detector.embedding_dim()
    }

    /// Embeds the most prominent face in `image`.
    pub fn embed_reference(&mut self, id: &IdentityId, image: &[u8]) -> Result<Embedding, AnalysisError> {
        let frame = self
            .decoder
            .decode(image)
            .map_err(|e| AnalysisError::Input(format!("reference image for {id}: {e}")))?;
        let faces = self
            .detector
            .detect(&frame)
            .map_err(|e| AnalysisError::capability("detect", e))?;

        if faces.len() > 1 {
            log::warn!(
                "Reference image for {id} has {} faces, using the most prominent",
                faces.len()
            );
        }
        faces
            .into_iter()
            .reduce(|best, f| if f.quality > best.quality { f } else { best })
            .map(|f| f.embedding)
            .ok_or_else(|| AnalysisError::NoFace {
                identity_id: id.to_string(),
            })
    }

    /// Embeds and stores every request, returning one outcome per request
    /// in input order.
    pub fn seed(
        &mut self,
        scope: &str,
        requests: Vec<SeedRequest>,
        store: &mut dyn IdentityStore,
    ) -> Vec<(IdentityId, Result<(), AnalysisError>)> {
        requests
            .into_iter()
            .map(|request| {
                let id = request.id.clone();
                let outcome = self.seed_one(scope, request, store);
                if let Err(e) = &outcome {
                    log::warn!("Could not seed identity {id}: {e}");
                }
                (id, outcome)
            })
            .collect()
    }

    fn seed_one(
        &mut self,
        scope: &str,
        request: SeedRequest,
        store: &mut dyn IdentityStore,
    ) -> Result<(), AnalysisError> {
        let embedding = self.embed_reference(&request.id, &request.image)?;
        let mut identity = Identity::new(request.id.clone()).with_embedding(embedding);
        identity.display_name = request.display_name;
        store
            .save_reference_image(scope, &request.id, &request.image)
            .map_err(AnalysisError::store)?;
        store
            .create_or_update_identity(scope, &identity)
            .map_err(AnalysisError::store)?;
        Ok(())
    }

    /// Stores a reference photo without embedding it; the embedding is
    /// computed the first time an analysis loads the identity.
    pub fn register_deferred(
        scope: &str,
        request: SeedRequest,
        store: &mut dyn IdentityStore,
    ) -> Result<(), AnalysisError> {
        let mut identity = Identity::new(request.id.clone());
        identity.display_name = request.display_name;
        store
            .save_reference_image(scope, &request.id, &request.image)
            .map_err(AnalysisError::store)?;
        store
            .create_or_update_identity(scope, &identity)
            .map_err(AnalysisError::store)?;
        Ok(())
    }

    /// Fills in missing embeddings from stored reference images and
    /// persists them.
    ///
    /// Identities whose photo is missing or has no face are left out of the
    /// result with a warning. Store failures abort.
    pub fn embed_pending(
        &mut self,
        scope: &str,
        identities: Vec<Identity>,
        store: &mut dyn IdentityStore,
    ) -> Result<Vec<Identity>, AnalysisError> {
        let mut ready = Vec::with_capacity(identities.len());
        for identity in identities {
            if identity.embedding.is_some() {
                ready.push(identity);
                continue;
            }
            let Some(image) = store
                .reference_image(scope, &identity.id)
                .map_err(AnalysisError::store)?
            else {
                log::warn!("Identity {} has neither embedding nor reference image", identity.id);
                continue;
            };
            match self.embed_reference(&identity.id, &image) {
                Ok(embedding) => {
                    let identity = identity.with_embedding(embedding);
                    store
                        .create_or_update_identity(scope, &identity)
                        .map_err(AnalysisError::store)?;
                    log::info!("Embedded reference image for identity {}", identity.id);
                    ready.push(identity);
                }
                Err(e) => log::warn!("Skipping identity {}: {e}", identity.id),
            }
        }
        Ok(ready)
    }
}
