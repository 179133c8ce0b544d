//! Reference model for a single transactional file.
//!
//! [`ModelHarness`] applies each operation both to a real file and to a
//! three-field model, then checks that the committed content agrees.

use crate::fixtures::TestFile;
use crate::generators::FileOperation;
use txnfs_core::TxnResult;

/// What the artifacts should hold, tracked without touching storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileModel {
    /// Content of the primary file.
    pub committed: Vec<u8>,
    /// Content of the dirty file.
    pub staged: Vec<u8>,
    /// Content of the rollback file, if one exists.
    pub snapshot: Option<Vec<u8>>,
}

impl FileModel {
    /// Applies one operation to the model.
    pub fn apply(&mut self, op: &FileOperation) {
        match op {
            FileOperation::Write(data) => self.staged = data.clone(),
            FileOperation::Commit => {
                self.snapshot = Some(std::mem::replace(&mut self.committed, self.staged.clone()));
            }
            FileOperation::Rollback => {
                if let Some(snapshot) = &self.snapshot {
                    self.committed = snapshot.clone();
                }
            }
            FileOperation::Read => {}
            FileOperation::Restart => {
                self.staged = self.committed.clone();
                self.snapshot = None;
            }
        }
    }
}

/// A harness that runs operations against a real file and the model.
pub struct ModelHarness {
    /// The file under test.
    pub file: TestFile,
    /// Expected state.
    pub model: FileModel,
}

impl ModelHarness {
    /// Creates a harness over an in-memory file with a transaction begun.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started.
    pub fn memory() -> TxnResult<Self> {
        Self::over(TestFile::memory())
    }

    /// Creates a harness over an on-disk file with a transaction begun.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started.
    pub fn on_disk() -> TxnResult<Self> {
        Self::over(TestFile::on_disk())
    }

    fn over(mut file: TestFile) -> TxnResult<Self> {
        file.begin()?;
        Ok(Self {
            file,
            model: FileModel::default(),
        })
    }

    /// Applies `op` to both sides.
    ///
    /// # Errors
    ///
    /// Returns an error if the real file rejects the operation.
    pub fn apply(&mut self, op: &FileOperation) -> TxnResult<()> {
        match op {
            FileOperation::Write(data) => self.file.write_file(data)?,
            FileOperation::Commit => self.file.commit()?,
            FileOperation::Rollback => self.file.rollback()?,
            FileOperation::Read => {
                self.file.read_file()?;
            }
            FileOperation::Restart => {
                self.file.restart();
                self.file.begin()?;
            }
        }
        self.model.apply(op);
        Ok(())
    }

    /// Returns the committed content as seen through the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the primary cannot be read.
    pub fn committed(&self) -> TxnResult<Vec<u8>> {
        self.file.read_file()
    }

    /// Returns true if the file and the model agree on the committed content.
    ///
    /// # Errors
    ///
    /// Returns an error if the primary cannot be read.
    pub fn agrees(&self) -> TxnResult<bool> {
        Ok(self.committed()? == self.model.committed)
    }
}
