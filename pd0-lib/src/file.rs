use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::datatype::{BeamCellData, Variable};
use crate::error::{Decoded, ErrorCode};
use crate::header::FileIndex;
use crate::leader::{FixedLeader, VariableLeader};

/// Every decodable component of a file, decoded from a single scan.
///
/// Components are decoded independently, so their ensemble counts may differ when
/// the file is damaged. [Pd0File::fix_ensembles] truncates them to a common count.
#[derive(Debug, Clone)]
pub struct Pd0File {
    pub path: PathBuf,
    pub index: Decoded<FileIndex>,
    pub fixed_leader: Decoded<FixedLeader>,
    pub variable_leader: Decoded<VariableLeader>,
    /// Beam by cell data types present in the first ensemble, in [Variable::ALL] order.
    pub data: Vec<Decoded<BeamCellData>>,
    fixed_ensembles: bool,
}

impl Pd0File {
    pub(crate) fn new(
        path: &Path,
        index: Decoded<FileIndex>,
        fixed_leader: Decoded<FixedLeader>,
        variable_leader: Decoded<VariableLeader>,
        data: Vec<Decoded<BeamCellData>>,
    ) -> Self {
        let file = Pd0File {
            path: path.to_path_buf(),
            index,
            fixed_leader,
            variable_leader,
            data,
            fixed_ensembles: false,
        };
        if file.has_warning() {
            warn!(path = ?file.path, "one or more components did not decode cleanly");
        }
        file
    }

    #[must_use]
    pub fn get(&self, variable: Variable) -> Option<&Decoded<BeamCellData>> {
        self.data.iter().find(|d| d.data.variable == variable)
    }

    /// Ensemble count of each component, labelled by component name.
    #[must_use]
    pub fn ensembles(&self) -> Vec<(&'static str, usize)> {
        let mut counts = vec![
            ("Fileheader", self.index.ensembles),
            ("Fixed Leader", self.fixed_leader.ensembles),
            ("Variable Leader", self.variable_leader.ensembles),
        ];
        counts.extend(
            self.data
                .iter()
                .map(|d| (d.data.variable.kind().name(), d.ensembles)),
        );
        counts
    }

    /// Error code of each component, labelled by component name.
    #[must_use]
    pub fn errors(&self) -> Vec<(&'static str, ErrorCode)> {
        let mut codes = vec![
            ("Fileheader", self.index.error),
            ("Fixed Leader", self.fixed_leader.error),
            ("Variable Leader", self.variable_leader.error),
        ];
        codes.extend(
            self.data
                .iter()
                .map(|d| (d.data.variable.kind().name(), d.error)),
        );
        codes
    }

    /// True if all components hold the same number of ensembles.
    #[must_use]
    pub fn is_ensemble_equal(&self) -> bool {
        let counts = self.ensembles();
        counts.windows(2).all(|w| w[0].1 == w[1].1)
    }

    /// True if any component reported an error.
    #[must_use]
    pub fn has_warning(&self) -> bool {
        self.errors().iter().any(|(_, code)| !code.is_success())
    }

    /// True once [Pd0File::fix_ensembles] has truncated the components.
    #[must_use]
    pub fn is_fixed_ensemble(&self) -> bool {
        self.fixed_ensembles
    }

    /// Truncate every component to the smallest ensemble count greater than
    /// `min_cutoff`.
    ///
    /// Counts at or below `min_cutoff` are ignored, so a component that failed
    /// outright does not empty the others. Returns the resulting count, or `None` if
    /// no component exceeds `min_cutoff`.
    pub fn fix_ensembles(&mut self, min_cutoff: usize) -> Option<usize> {
        let n = self
            .ensembles()
            .into_iter()
            .map(|(_, n)| n)
            .filter(|n| *n > min_cutoff)
            .min()?;

        if self.is_ensemble_equal() {
            info!("all components already have {n} ensembles");
        } else {
            let fix = |ensembles: &mut usize| *ensembles = (*ensembles).min(n);
            self.index.data.truncate(n);
            fix(&mut self.index.ensembles);
            self.fixed_leader.data.truncate(n);
            fix(&mut self.fixed_leader.ensembles);
            self.variable_leader.data.truncate(n);
            fix(&mut self.variable_leader.ensembles);
            for d in &mut self.data {
                d.data.truncate(n);
                fix(&mut d.ensembles);
            }
            info!("ensembles fixed to {n}");
        }
        self.fixed_ensembles = true;
        Some(n)
    }
}
