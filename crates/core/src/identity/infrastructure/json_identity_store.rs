use std::fs;
use std::path::PathBuf;

use crate::identity::domain::identity::{Identity, IdentityId};
use crate::identity::domain::identity_store::IdentityStore;
use crate::shared::file_store::{safe_component, write_atomic};

const IDENTITIES_FILE: &str = "identities.json";
const REFERENCES_DIR: &str = "references";

/// File-backed identity store.
///
/// Layout per scope: `<root>/<scope>/identities.json` holding every identity
/// in insertion order, plus `<root>/<scope>/references/<id>` photo bytes.
pub struct JsonIdentityStore {
    root: PathBuf,
}

impl JsonIdentityStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Platform data location, e.g. `~/.local/share/FaceGraph/identities`.
    pub fn default_root() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("FaceGraph").join("identities"))
    }

    fn scope_dir(&self, scope: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
        Ok(self.root.join(safe_component(scope, "scope")?))
    }

    fn reference_path(&self, scope: &str, id: &IdentityId) -> Result<PathBuf, Box<dyn std::error::Error>> {
        Ok(self
            .scope_dir(scope)?
            .join(REFERENCES_DIR)
            .join(safe_component(id.as_str(), "identity id")?))
    }

    fn write_all(&self, scope: &str, identities: &[Identity]) -> Result<(), Box<dyn std::error::Error>> {
        let dir = self.scope_dir(scope)?;
        fs::create_dir_all(&dir)?;
        let json = serde_json::to_string_pretty(identities)?;
        write_atomic(&dir.join(IDENTITIES_FILE), json.as_bytes())
    }
}

impl IdentityStore for JsonIdentityStore {
    fn load_known_identities(&self, scope: &str) -> Result<Vec<Identity>, Box<dyn std::error::Error>> {
        let path = self.scope_dir(scope)?.join(IDENTITIES_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let json = fs::read_to_string(&path)?;
        serde_json::from_str(&json)
            .map_err(|e| format!("corrupt identity file {}: {e}", path.display()).into())
    }

    fn create_or_update_identity(
        &mut self,
        scope: &str,
        identity: &Identity,
    ) -> Result<IdentityId, Box<dyn std::error::Error>> {
        let mut identities = self.load_known_identities(scope)?;
        match identities.iter_mut().find(|i| i.id == identity.id) {
            Some(existing) => *existing = identity.clone(),
            None => identities.push(identity.clone()),
        }
        self.write_all(scope, &identities)?;
        Ok(identity.id.clone())
    }

    fn reference_image(
        &self,
        scope: &str,
        id: &IdentityId,
    ) -> Result<Option<Vec<u8>>, Box<dyn std::error::Error>> {
        let path = self.reference_path(scope, id)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read(path)?))
    }

    fn save_reference_image(
        &mut self,
        scope: &str,
        id: &IdentityId,
        image: &[u8],
    ) -> Result<(), Box<dyn std::error::Error>> {
        let path = self.reference_path(scope, id)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        write_atomic(&path, image)
    }
}
