use std::path::PathBuf;

use log::{debug, error, info, warn};

use crate::archive;
use crate::builder::{MissionDocuments, build_documents};
use crate::error::Result;
use crate::options::CompilerConfig;
use crate::parser::parse_waypoint_payload;
use crate::policy::{ActionPolicy, TimeLapseSurveyPolicy};
use crate::storage::{KmzStorage, LatestKmzPath};
use crate::waypoint::{MissionMetadata, Waypoint};
use crate::xml;

/// Result of one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KmzOutput {
    /// Complete KMZ container.
    pub bytes: Vec<u8>,
    /// Where a copy was saved, when saving is enabled and succeeded.
    pub saved_path: Option<PathBuf>,
}

/// Compiles waypoint lists into KMZ mission packages.
///
/// A compiler holds no per-mission state and can be shared between threads;
/// every call owns its documents and archive buffer.
pub struct KmzCompiler {
    config: CompilerConfig,
    policy: Box<dyn ActionPolicy>,
    storage: KmzStorage,
    latest: Option<LatestKmzPath>,
}

impl KmzCompiler {
    pub fn new(config: CompilerConfig) -> Self {
        let storage = KmzStorage::new(config.kmz_storage_dir.clone());
        Self {
            config,
            policy: Box::new(TimeLapseSurveyPolicy),
            storage,
            latest: None,
        }
    }

    pub fn with_policy(mut self, policy: Box<dyn ActionPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Record every saved file path in `latest`.
    pub fn with_latest_path(mut self, latest: LatestKmzPath) -> Self {
        self.latest = Some(latest);
        self
    }

    /// Build the document trees without packaging them.
    pub fn documents(
        &self,
        waypoints: &[Waypoint],
        metadata: &MissionMetadata,
    ) -> Result<MissionDocuments> {
        build_documents(waypoints, metadata, &self.config, self.policy.as_ref())
    }

    /// Compile `waypoints` into a KMZ package.
    ///
    /// Either a complete buffer is returned or an error; a failed save to disk
    /// is logged and only leaves `saved_path` empty.
    pub fn convert(&self, waypoints: &[Waypoint], metadata: &MissionMetadata) -> Result<KmzOutput> {
        let mission = metadata.mission_label();

        let docs = self.documents(waypoints, metadata).inspect_err(|e| {
            error!("Cannot compile mission '{mission}': {e}");
        })?;

        let waylines_wpml = xml::serialize(&docs.waylines)?;
        let template_kml = xml::serialize(&docs.template)?;
        debug!(
            "Serialized mission '{mission}': waylines {} bytes, template {} bytes",
            waylines_wpml.len(),
            template_kml.len()
        );

        let bytes = archive::package(&waylines_wpml, &template_kml).inspect_err(|e| {
            error!("Packaging mission '{mission}' failed: {e}");
        })?;
        info!(
            "Compiled mission '{mission}' ({} waypoints) into {} bytes",
            waypoints.len(),
            bytes.len()
        );

        let saved_path = if self.config.save_kmz_file {
            self.save(&bytes)
        } else {
            None
        };

        Ok(KmzOutput { bytes, saved_path })
    }

    /// Parse an uplink JSON payload and compile it.
    pub fn convert_payload_json(&self, json: &str) -> Result<KmzOutput> {
        let payload = parse_waypoint_payload(json)?;
        self.convert(&payload.waypoints, &payload.metadata())
    }

    fn save(&self, bytes: &[u8]) -> Option<PathBuf> {
        match self.storage.write(bytes) {
            Ok(path) => {
                if let Some(latest) = &self.latest {
                    latest.set(path.clone());
                }
                Some(path)
            }
            Err(e) => {
                warn!(
                    "Could not save KMZ under {}: {e}",
                    self.storage.dir().display()
                );
                None
            }
        }
    }
}

impl Default for KmzCompiler {
    fn default() -> Self {
        Self::new(CompilerConfig::default())
    }
}

/// One-shot conversion with the default action policy.
pub fn convert_waypoints_to_kmz(
    waypoints: &[Waypoint],
    metadata: &MissionMetadata,
    config: &CompilerConfig,
) -> Result<KmzOutput> {
    KmzCompiler::new(config.clone()).convert(waypoints, metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KmzError;
    use crate::policy::BareWaylinePolicy;

    fn square() -> Vec<Waypoint> {
        vec![
            Waypoint::new(113.9400, 22.5400, 30.0, 5.0),
            Waypoint::new(113.9410, 22.5400, 30.0, 5.0),
            Waypoint::new(113.9410, 22.5410, 30.0, 5.0),
            Waypoint::new(113.9400, 22.5410, 30.0, 5.0),
        ]
    }

    #[test]
    fn test_convert_produces_zip() {
        let out = KmzCompiler::default()
            .convert(&square(), &MissionMetadata::with_mission_id("m1"))
            .unwrap();
        assert_eq!(&out.bytes[..2], b"PK");
        assert!(out.saved_path.is_none());
    }

    #[test]
    fn test_convert_is_deterministic_with_fixed_stamp() {
        let compiler = KmzCompiler::default();
        let meta = MissionMetadata::default().created_at(1_700_000_000_000);
        let a = compiler.convert(&square(), &meta).unwrap();
        let b = compiler.convert(&square(), &meta).unwrap();
        assert_eq!(a.bytes, b.bytes);
    }

    #[test]
    fn test_empty_mission() {
        let err = KmzCompiler::default()
            .convert(&[], &MissionMetadata::default())
            .unwrap_err();
        assert!(matches!(err, KmzError::EmptyMission));

        let err =
            convert_waypoints_to_kmz(&[], &MissionMetadata::default(), &CompilerConfig::default())
                .unwrap_err();
        assert!(matches!(err, KmzError::EmptyMission));
    }

    #[test]
    fn test_policy_swap() {
        let compiler = KmzCompiler::default().with_policy(Box::new(BareWaylinePolicy));
        let docs = compiler.documents(&square(), &MissionMetadata::default()).unwrap();
        assert_eq!(docs.waylines.action_groups().count(), 0);
    }

    #[test]
    fn test_convert_payload_json() {
        let json = r#"{"RWID":"m-7","HDJ":[{"JD":113.94,"WD":22.54,"GD":30,"SD":5}]}"#;
        let out = KmzCompiler::default().convert_payload_json(json).unwrap();
        assert!(!out.bytes.is_empty());

        let err = KmzCompiler::default()
            .convert_payload_json(r#"{"HDJ":[]}"#)
            .unwrap_err();
        assert!(matches!(err, KmzError::EmptyMission));
    }

    #[test]
    fn test_compiler_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<KmzCompiler>();
    }
}
