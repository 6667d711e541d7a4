//! Undoable deformation history on top of a [`TubeRepository`].

use tracing::{info, warn};
use tube_kernel::{DeformReport, DeformationEngine, MeshOptions, Tube, TubeConstructionResult};

use crate::error::{Result, StoreError};
use crate::repository::{TubeId, TubeRepository};
use crate::snapshot::TubeSnapshot;

/// Outcome of a committed deformation.
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    /// Id of the stored result.
    pub id: TubeId,
    /// Version number of the stored result.
    pub version: u32,
    /// What the engine did.
    pub report: DeformReport,
    /// Mesh of the deformed tube.
    pub mesh: TubeConstructionResult,
}

/// Tracks the current version of one tube in a repository.
#[derive(Debug)]
pub struct TubeHistory<R> {
    repo: R,
    current: Option<TubeId>,
    version: u32,
}

impl<R: TubeRepository> TubeHistory<R> {
    /// History with nothing saved yet.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            current: None,
            version: 0,
        }
    }

    /// The backing repository.
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Give the repository back.
    pub fn into_repository(self) -> R {
        self.repo
    }

    /// Id of the current version, once anything has been saved.
    pub fn current(&self) -> Option<TubeId> {
        self.current
    }

    /// Current version number.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Save `tube` as the current version if nothing is saved yet.
    pub fn record_original(&mut self, tube: &Tube) -> Result<TubeId> {
        if let Some(id) = self.current {
            return Ok(id);
        }
        let id = self
            .repo
            .save(TubeSnapshot::from_tube(tube), self.version, None)?;
        self.current = Some(id);
        Ok(id)
    }

    /// Deform `tube` and store the result as the next version.
    ///
    /// The original is saved first if needed and any redo chain is
    /// dropped. `tube` is only replaced once the deformed copy has a mesh
    /// and has been saved; on failure the version number is restored.
    pub fn commit_deformation(
        &mut self,
        engine: &DeformationEngine,
        tube: &mut Tube,
        options: &MeshOptions,
    ) -> Result<Commit> {
        let previous = self.record_original(tube)?;
        self.repo.delete_future_versions(previous)?;

        let prior = self.version;
        self.version += 1;
        match self.deform_and_save(engine, tube, options, previous) {
            Ok((commit, deformed)) => {
                *tube = deformed;
                self.current = Some(commit.id);
                info!(version = commit.version, "deformation committed");
                Ok(commit)
            }
            Err(e) => {
                warn!(error = %e, version = self.version, "deformation rolled back");
                self.version = prior;
                Err(e)
            }
        }
    }

    fn deform_and_save(
        &mut self,
        engine: &DeformationEngine,
        tube: &Tube,
        options: &MeshOptions,
        previous: TubeId,
    ) -> Result<(Commit, Tube)> {
        let mut deformed = tube.clone();
        let report = engine.apply_to_tube(&mut deformed)?;
        let mesh = deformed.build_mesh(options);
        if !mesh.success {
            return Err(StoreError::MeshFailed(format!(
                "problematic sections {:?}",
                mesh.problematic_sections
            )));
        }
        let id = self.repo.save(
            TubeSnapshot::from_tube(&deformed),
            self.version,
            Some(previous),
        )?;
        let commit = Commit {
            id,
            version: self.version,
            report,
            mesh,
        };
        Ok((commit, deformed))
    }

    /// `true` if the current version has a predecessor.
    pub fn can_undo(&self) -> bool {
        self.neighbour(true).is_some()
    }

    /// `true` if the current version has a successor.
    pub fn can_redo(&self) -> bool {
        self.neighbour(false).is_some()
    }

    fn neighbour(&self, past: bool) -> Option<TubeId> {
        let id = self.current?;
        let link = if past {
            self.repo.past(id)
        } else {
            self.repo.future(id)
        };
        link.ok().flatten()
    }

    /// Step back one version and return it.
    pub fn undo(&mut self) -> Result<Tube> {
        let id = self.neighbour(true).ok_or(StoreError::NothingToUndo)?;
        self.move_to(id)
    }

    /// Step forward one version and return it.
    pub fn redo(&mut self) -> Result<Tube> {
        let id = self.neighbour(false).ok_or(StoreError::NothingToRedo)?;
        self.move_to(id)
    }

    fn move_to(&mut self, id: TubeId) -> Result<Tube> {
        let stored = self.repo.load(id)?;
        let version = stored.version;
        let tube = stored.snapshot.clone().into_tube()?;
        self.current = Some(id);
        self.version = version;
        Ok(tube)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryRepository;
    use tube_kernel::{Attenuation, ConnectSettings, DeformationPoint, Section, Vec3};

    fn tube() -> Tube {
        let mut tube = Tube::new();
        for z in [0.0, 10.0, 20.0] {
            tube.add_section(Section::regular(6, 3.0, Vec3::new(0.0, 0.0, z), 0.0))
                .unwrap();
        }
        tube.build_all_segments(&ConnectSettings::default()).unwrap();
        tube
    }

    fn push(amount: f32) -> DeformationEngine {
        let mut engine = DeformationEngine::new();
        engine
            .add_point(DeformationPoint::new(
                Vec3::new(0.0, 0.0, 10.0),
                Vec3::new(amount, 0.0, 0.0),
                8.0,
                Attenuation::Gaussian,
            ))
            .unwrap();
        engine
    }

    #[test]
    fn test_commit_links_versions() {
        let mut history = TubeHistory::new(InMemoryRepository::new());
        let original = tube();
        let mut t = original.clone();

        let commit = history
            .commit_deformation(&push(2.0), &mut t, &MeshOptions::default())
            .unwrap();
        assert_eq!(commit.version, 1);
        assert!(commit.mesh.success);
        assert!(commit.report.changed());
        assert_ne!(t, original);
        assert_eq!(history.repository().len(), 2);

        let repo = history.repository();
        let first = repo.past(commit.id).unwrap().unwrap();
        assert_eq!(repo.future(first).unwrap(), Some(commit.id));
        assert_eq!(repo.load(first).unwrap().version, 0);
        assert_eq!(repo.latest(), Some(commit.id));
    }

    #[test]
    fn test_undo_and_redo() {
        let mut history = TubeHistory::new(InMemoryRepository::new());
        let original = tube();
        let mut t = original.clone();
        history
            .commit_deformation(&push(2.0), &mut t, &MeshOptions::default())
            .unwrap();
        let deformed = t.clone();

        assert!(history.can_undo());
        assert_eq!(history.undo().unwrap(), original);
        assert_eq!(history.version(), 0);
        assert!(matches!(history.undo(), Err(StoreError::NothingToUndo)));

        assert_eq!(history.redo().unwrap(), deformed);
        assert_eq!(history.version(), 1);
        assert!(matches!(history.redo(), Err(StoreError::NothingToRedo)));
    }

    #[test]
    fn test_commit_after_undo_drops_redo_chain() {
        let mut history = TubeHistory::new(InMemoryRepository::new());
        let mut t = tube();
        history
            .commit_deformation(&push(2.0), &mut t, &MeshOptions::default())
            .unwrap();
        history
            .commit_deformation(&push(1.0), &mut t, &MeshOptions::default())
            .unwrap();
        assert_eq!(history.repository().len(), 3);

        history.undo().unwrap();
        let mut t = history.undo().unwrap();
        assert!(history.can_redo());

        let commit = history
            .commit_deformation(&push(-1.0), &mut t, &MeshOptions::default())
            .unwrap();
        assert_eq!(commit.version, 1);
        assert!(!history.can_redo());
        assert_eq!(history.repository().len(), 2);
    }

    #[test]
    fn test_failed_commit_restores_version() {
        let mut history = TubeHistory::new(InMemoryRepository::new());
        let mut bare = Tube::new();
        bare.add_section(Section::regular(4, 2.0, Vec3::zeros(), 0.0))
            .unwrap();
        // a single section has no mesh
        let before = bare.clone();
        let err = history
            .commit_deformation(&push(1.0), &mut bare, &MeshOptions::default())
            .unwrap_err();
        assert!(matches!(err, StoreError::MeshFailed(_)));
        assert_eq!(history.version(), 0);
        assert_eq!(bare, before);
        assert_eq!(history.repository().len(), 1);
    }
}
