// Circuit key artifacts
// Runs circuit-specific Groth16 setup and keeps proving/verifying keys on disk,
// addressed by circuit id, with a manifest of verifying key fingerprints.
use ark_bn254::Bn254;
use ark_groth16::{Groth16, ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use ark_std::rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, warn};

use crate::primitives::{Fingerprint, Result, Timestamp, VotingError};
use super::circuits::BallotCircuit;
use super::inputs::CircuitId;

pub const MANIFEST_FILE: &str = "setup_manifest.json";

/// Keys directory for one deployment
#[derive(Debug, Clone)]
pub struct CircuitKeyStore {
    keys_dir: PathBuf,
}

/// Record of every circuit set up in a keys directory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetupManifest {
    pub circuits: BTreeMap<CircuitId, ManifestEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// SHA-256 of the compressed verifying key, hex
    pub vk_fingerprint: String,
    pub proving_key_bytes: u64,
    pub verifying_key_bytes: u64,
    pub public_signals: Vec<String>,
    pub created_at: Timestamp,
}

impl CircuitKeyStore {
    pub fn new(keys_dir: impl Into<PathBuf>) -> Self {
        Self { keys_dir: keys_dir.into() }
    }

    pub fn keys_dir(&self) -> &Path {
        &self.keys_dir
    }

    fn proving_key_path(&self, circuit: CircuitId) -> PathBuf {
        self.keys_dir.join(format!("{}.pk", circuit))
    }

    fn verifying_key_path(&self, circuit: CircuitId) -> PathBuf {
        self.keys_dir.join(format!("{}.vk", circuit))
    }

    fn manifest_path(&self) -> PathBuf {
        self.keys_dir.join(MANIFEST_FILE)
    }

    /// Generate and persist keys for one circuit
    pub async fn setup_circuit<R: RngCore + CryptoRng>(
        &self,
        circuit: CircuitId,
        rng: &mut R,
    ) -> Result<(ProvingKey<Bn254>, VerifyingKey<Bn254>)> {
        info!("🔒 Generating {} circuit parameters...", circuit);

        fs::create_dir_all(&self.keys_dir)
            .await
            .map_err(|e| VotingError::Io(format!("Failed to create keys directory: {}", e)))?;

        let mut manifest = self.load_manifest_or_empty().await?;

        let (proving_key, verifying_key) = Groth16::<Bn254>::circuit_specific_setup(BallotCircuit::empty(circuit), rng)
            .map_err(|e| VotingError::Configuration(format!("{} setup failed: {}", circuit, e)))?;

        let entry = self.save_circuit_keys(circuit, &proving_key, &verifying_key).await?;
        manifest.circuits.insert(circuit, entry);
        self.save_manifest(&manifest).await?;

        info!("✅ {} circuit setup complete", circuit);
        Ok((proving_key, verifying_key))
    }

    /// Set up every protocol circuit
    pub async fn setup_all<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Result<SetupManifest> {
        info!("🔐 Running setup for {} circuits", CircuitId::ALL.len());
        for circuit in CircuitId::ALL {
            self.setup_circuit(circuit, rng).await?;
        }
        self.load_manifest().await
    }

    async fn save_circuit_keys(
        &self,
        circuit: CircuitId,
        proving_key: &ProvingKey<Bn254>,
        verifying_key: &VerifyingKey<Bn254>,
    ) -> Result<ManifestEntry> {
        let mut pk_bytes = Vec::new();
        proving_key
            .serialize_compressed(&mut pk_bytes)
            .map_err(|e| VotingError::Serialization(format!("PK serialization error: {}", e)))?;
        fs::write(self.proving_key_path(circuit), &pk_bytes)
            .await
            .map_err(|e| VotingError::Io(format!("Failed to write PK: {}", e)))?;

        let mut vk_bytes = Vec::new();
        verifying_key
            .serialize_compressed(&mut vk_bytes)
            .map_err(|e| VotingError::Serialization(format!("VK serialization error: {}", e)))?;
        fs::write(self.verifying_key_path(circuit), &vk_bytes)
            .await
            .map_err(|e| VotingError::Io(format!("Failed to write VK: {}", e)))?;

        info!("💾 Saved keys for {} to {:?}", circuit, self.keys_dir);
        info!("   📁 Proving key: {} bytes", pk_bytes.len());
        info!("   📁 Verifying key: {} bytes", vk_bytes.len());

        Ok(ManifestEntry {
            vk_fingerprint: Fingerprint::from_data(&vk_bytes).to_hex(),
            proving_key_bytes: pk_bytes.len() as u64,
            verifying_key_bytes: vk_bytes.len() as u64,
            public_signals: circuit.public_signal_names().iter().map(|s| s.to_string()).collect(),
            created_at: chrono::Utc::now().timestamp() as Timestamp,
        })
    }

    pub async fn load_proving_key(&self, circuit: CircuitId) -> Result<ProvingKey<Bn254>> {
        let path = self.proving_key_path(circuit);
        let bytes = fs::read(&path)
            .await
            .map_err(|e| VotingError::Configuration(format!("proving key for {} unavailable at {:?}: {}", circuit, path, e)))?;
        let key = ProvingKey::<Bn254>::deserialize_compressed(&bytes[..])
            .map_err(|e| VotingError::Serialization(format!("PK deserialization error: {}", e)))?;
        info!("🔑 Loaded proving key for circuit: {}", circuit);
        Ok(key)
    }

    pub async fn load_verifying_key(&self, circuit: CircuitId) -> Result<VerifyingKey<Bn254>> {
        let path = self.verifying_key_path(circuit);
        let bytes = fs::read(&path).await.map_err(|e| {
            VotingError::Configuration(format!("verifying key for {} unavailable at {:?}: {}", circuit, path, e))
        })?;
        let key = VerifyingKey::<Bn254>::deserialize_compressed(&bytes[..])
            .map_err(|e| VotingError::Serialization(format!("VK deserialization error: {}", e)))?;
        info!("🔑 Loaded verifying key for circuit: {}", circuit);
        Ok(key)
    }

    pub async fn keys_exist(&self, circuit: CircuitId) -> bool {
        fs::try_exists(self.proving_key_path(circuit)).await.unwrap_or(false)
            && fs::try_exists(self.verifying_key_path(circuit)).await.unwrap_or(false)
    }

    async fn save_manifest(&self, manifest: &SetupManifest) -> Result<()> {
        let json = serde_json::to_string_pretty(manifest)?;
        fs::write(self.manifest_path(), json)
            .await
            .map_err(|e| VotingError::Io(format!("Failed to write manifest: {}", e)))?;
        Ok(())
    }

    // A missing manifest means nothing has been set up yet; anything else is an error
    async fn load_manifest_or_empty(&self) -> Result<SetupManifest> {
        match fs::try_exists(self.manifest_path()).await {
            Ok(false) => Ok(SetupManifest::default()),
            Ok(true) => self.load_manifest().await,
            Err(e) => Err(VotingError::Io(format!("Failed to stat setup manifest: {}", e))),
        }
    }

    pub async fn load_manifest(&self) -> Result<SetupManifest> {
        let json = fs::read_to_string(self.manifest_path())
            .await
            .map_err(|e| VotingError::Configuration(format!("Failed to read setup manifest: {}", e)))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Check that every verifying key on disk still matches its manifest fingerprint
    pub async fn verify_manifest(&self) -> Result<bool> {
        info!("🔍 Verifying circuit keys against manifest...");
        let manifest = self.load_manifest().await?;

        if manifest.circuits.is_empty() {
            warn!("⏳ Setup manifest lists no circuits");
            return Ok(false);
        }

        for (circuit, entry) in &manifest.circuits {
            let vk_bytes = match fs::read(self.verifying_key_path(*circuit)).await {
                Ok(bytes) => bytes,
                Err(_) => {
                    error!("❌ Missing verifying key for circuit: {}", circuit);
                    return Ok(false);
                }
            };

            if Fingerprint::from_data(&vk_bytes).to_hex() != entry.vk_fingerprint {
                error!("❌ Key fingerprint mismatch for circuit: {}", circuit);
                return Ok(false);
            }

            // must still deserialize as a BN254 key
            VerifyingKey::<Bn254>::deserialize_compressed(&vk_bytes[..])?;
            info!("✅ Circuit {} keys verified", circuit);
        }

        Ok(true)
    }

    /// Verifying keys for distribution to verifiers that never prove
    pub async fn export_verifying_keys(&self) -> Result<HashMap<CircuitId, Vec<u8>>> {
        let mut exports = HashMap::new();
        for circuit in CircuitId::ALL {
            let path = self.verifying_key_path(circuit);
            if fs::try_exists(&path).await.unwrap_or(false) {
                let bytes = fs::read(&path)
                    .await
                    .map_err(|e| VotingError::Io(format!("Failed to read VK: {}", e)))?;
                exports.insert(circuit, bytes);
            }
        }
        Ok(exports)
    }

    /// Import exported verifying keys into this directory
    pub async fn import_verifying_keys(&self, keys: HashMap<CircuitId, Vec<u8>>) -> Result<()> {
        fs::create_dir_all(&self.keys_dir)
            .await
            .map_err(|e| VotingError::Io(format!("Failed to create keys directory: {}", e)))?;

        for (circuit, bytes) in keys {
            VerifyingKey::<Bn254>::deserialize_compressed(&bytes[..])
                .map_err(|e| VotingError::Serialization(format!("Invalid VK for {}: {}", circuit, e)))?;

            fs::write(self.verifying_key_path(circuit), &bytes)
                .await
                .map_err(|e| VotingError::Io(format!("Failed to write VK: {}", e)))?;

            info!("📥 Imported verifying key for: {}", circuit);
        }
        Ok(())
    }
}
