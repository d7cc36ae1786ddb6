use crate::identity::domain::identity::{Identity, IdentityId};

/// Persistent identity storage, partitioned by an owner scope.
///
/// Identities may be stored without an embedding; those carry a reference
/// image that is embedded on first use.
pub trait IdentityStore: Send {
    /// All identities in `scope`, in a stable order.
    fn load_known_identities(&self, scope: &str) -> Result<Vec<Identity>, Box<dyn std::error::Error>>;

    /// Inserts `identity`, or replaces the stored one with the same id.
    fn create_or_update_identity(
        &mut self,
        scope: &str,
        identity: &Identity,
    ) -> Result<IdentityId, Box<dyn std::error::Error>>;

    fn reference_image(
        &self,
        scope: &str,
        id: &IdentityId,
    ) -> Result<Option<Vec<u8>>, Box<dyn std::error::Error>>;

    fn save_reference_image(
        &mut self,
        scope: &str,
        id: &IdentityId,
        image: &[u8],
    ) -> Result<(), Box<dyn std::error::Error>>;
}
