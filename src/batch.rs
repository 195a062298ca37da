//! Batch orchestration
//!
//! Drives every eligible file in a folder through classify -> sanitize ->
//! mutate, strictly one file at a time. The folder listing is snapshotted
//! once up front; per-item failures are recorded and the loop moves on. Only
//! a missing/invalid target folder aborts a batch.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::ai::{Classifier, UNKNOWN_DOCUMENT};
use crate::error::BatchError;
use crate::ops;

/// Progress notification emitted before each file is classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchProgress {
    /// 1-based position in the batch
    pub current: usize,
    /// Number of files in the batch
    pub total: usize,
    /// Name of the file being processed
    pub file: String,
}

/// Result of one file's trip through the batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Rename mode success
    Renamed { from: String, to: String },
    /// Organize mode success; `to` is `"category/filename"`
    Moved { from: String, to: String },
    /// No usable label for this file; nothing was touched
    Skipped { file: String, reason: String },
    /// The filesystem mutation failed for this file
    Failed { file: String, error: String },
}

impl ItemOutcome {
    /// Original name of the file this outcome refers to.
    pub fn file(&self) -> &str {
        match self {
            Self::Renamed { from, .. } | Self::Moved { from, .. } => from,
            Self::Skipped { file, .. } | Self::Failed { file, .. } => file,
        }
    }
}

/// Notifications surfaced to the observer while a batch runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    /// About to classify a file
    Processing(BatchProgress),
    /// A file finished, however it went
    Completed(ItemOutcome),
}

/// Ordered outcomes of a finished batch, with derived counts
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub outcomes: Vec<ItemOutcome>,
}

impl BatchReport {
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn renamed(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Renamed { .. }))
    }

    pub fn moved(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Moved { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }

    fn push(&mut self, outcome: ItemOutcome) {
        self.outcomes.push(outcome);
    }
}

/// Runs whole-folder rename or organize passes over a [`Classifier`].
pub struct BatchOrganizer<C> {
    classifier: C,
}

impl<C: Classifier> BatchOrganizer<C> {
    pub fn new(classifier: C) -> Self {
        Self { classifier }
    }

    /// Rename every eligible file using a content-based name suggestion.
    ///
    /// Files the classifier cannot name (errors, empty labels, or the
    /// [`UNKNOWN_DOCUMENT`] sentinel) are skipped and reported; they are
    /// never renamed to the sentinel.
    pub async fn rename_files<F>(
        &self,
        folder: &Path,
        mut observer: F,
    ) -> Result<BatchReport, BatchError>
    where
        F: FnMut(BatchEvent),
    {
        let files = snapshot_files(folder)?;
        let total = files.len();
        info!(
            "[BatchOrganizer] Renaming {} files in {}",
            total,
            folder.display()
        );

        let mut report = BatchReport::default();
        for (i, path) in files.iter().enumerate() {
            let file = display_name(path);
            observer(BatchEvent::Processing(BatchProgress {
                current: i + 1,
                total,
                file: file.clone(),
            }));

            let outcome = match self.classifier.suggest_filename(path).await {
                Ok(label) => {
                    let label = label.trim();
                    if label.is_empty() || label == UNKNOWN_DOCUMENT {
                        warn!("[BatchOrganizer] No usable name for {}", file);
                        ItemOutcome::Skipped {
                            file,
                            reason: "no usable name suggested".to_string(),
                        }
                    } else {
                        match ops::rename_with_label(path, label) {
                            Ok(new_name) => ItemOutcome::Renamed {
                                from: file,
                                to: new_name,
                            },
                            Err(e) => ItemOutcome::Failed {
                                file,
                                error: e.to_string(),
                            },
                        }
                    }
                }
                Err(e) => {
                    warn!("[BatchOrganizer] Classification failed for {}: {}", file, e);
                    ItemOutcome::Skipped {
                        file,
                        reason: e.to_string(),
                    }
                }
            };

            observer(BatchEvent::Completed(outcome.clone()));
            report.push(outcome);
        }

        info!(
            "[BatchOrganizer] Rename pass done: {} renamed, {} skipped, {} failed",
            report.renamed(),
            report.skipped(),
            report.failed()
        );
        Ok(report)
    }

    /// Move every eligible file into an AI-suggested category folder.
    ///
    /// Categorization never fails outward (the gateway degrades to
    /// `"Uncategorized"`), so every file reaches the move step.
    pub async fn organize_files<F>(
        &self,
        folder: &Path,
        mut observer: F,
    ) -> Result<BatchReport, BatchError>
    where
        F: FnMut(BatchEvent),
    {
        let files = snapshot_files(folder)?;
        let total = files.len();
        info!(
            "[BatchOrganizer] Organizing {} files in {}",
            total,
            folder.display()
        );

        let mut report = BatchReport::default();
        for (i, path) in files.iter().enumerate() {
            let file = display_name(path);
            observer(BatchEvent::Processing(BatchProgress {
                current: i + 1,
                total,
                file: file.clone(),
            }));

            let category = self.classifier.categorize(&file).await;
            let outcome = match ops::move_to_category(path, &category) {
                Ok(destination) => ItemOutcome::Moved {
                    from: file,
                    to: destination,
                },
                Err(e) => ItemOutcome::Failed {
                    file,
                    error: e.to_string(),
                },
            };

            observer(BatchEvent::Completed(outcome.clone()));
            report.push(outcome);
        }

        info!(
            "[BatchOrganizer] Organize pass done: {} moved, {} failed",
            report.moved(),
            report.failed()
        );
        Ok(report)
    }
}

/// Materialize the folder's eligible files: regular files only, dot-prefixed
/// names excluded, sorted by name. Listed exactly once per batch; later
/// changes to the folder are invisible to the run.
fn snapshot_files(folder: &Path) -> Result<Vec<PathBuf>, BatchError> {
    if !folder.exists() {
        return Err(BatchError::FolderNotFound {
            path: folder.display().to_string(),
        });
    }
    if !folder.is_dir() {
        return Err(BatchError::NotAFolder {
            path: folder.display().to_string(),
        });
    }

    let entries = fs::read_dir(folder).map_err(|e| BatchError::ReadFolder {
        path: folder.display().to_string(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| BatchError::ReadFolder {
            path: folder.display().to_string(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        files.push(path);
    }
    files.sort();
    Ok(files)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClassifyError;
    use crate::naming::UNCATEGORIZED;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tempfile::tempdir;

    enum ScriptedReply {
        Name(&'static str),
        Fail,
    }

    /// Classifier fed from filename -> reply tables.
    #[derive(Default)]
    struct ScriptedClassifier {
        names: HashMap<String, ScriptedReply>,
        categories: HashMap<String, String>,
    }

    impl ScriptedClassifier {
        fn with_name(mut self, file: &str, reply: ScriptedReply) -> Self {
            self.names.insert(file.to_string(), reply);
            self
        }

        fn with_category(mut self, file: &str, category: &str) -> Self {
            self.categories.insert(file.to_string(), category.to_string());
            self
        }
    }

    #[async_trait]
    impl Classifier for ScriptedClassifier {
        async fn suggest_filename(&self, path: &Path) -> Result<String, ClassifyError> {
            let name = display_name(path);
            match self.names.get(&name) {
                Some(ScriptedReply::Name(label)) => Ok(label.to_string()),
                Some(ScriptedReply::Fail) => Err(ClassifyError::EmptyReply),
                None => Ok(UNKNOWN_DOCUMENT.to_string()),
            }
        }

        async fn categorize(&self, filename: &str) -> String {
            self.categories
                .get(filename)
                .cloned()
                .unwrap_or_else(|| UNCATEGORIZED.to_string())
        }
    }

    #[tokio::test]
    async fn test_rename_batch_isolates_failures() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();
        fs::write(dir.path().join("c.txt"), "c").unwrap();

        let classifier = ScriptedClassifier::default()
            .with_name("a.txt", ScriptedReply::Name("Alpha_Notes"))
            .with_name("b.txt", ScriptedReply::Fail)
            .with_name("c.txt", ScriptedReply::Name("Gamma_Report"));
        let organizer = BatchOrganizer::new(classifier);

        let mut events = Vec::new();
        let report = organizer
            .rename_files(dir.path(), |e| events.push(e))
            .await
            .unwrap();

        // The failure in the middle stopped nothing.
        assert_eq!(report.total(), 3);
        assert_eq!(report.renamed(), 2);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 0);
        assert!(dir.path().join("Alpha_Notes.txt").exists());
        assert!(dir.path().join("b.txt").exists());
        assert!(dir.path().join("Gamma_Report.txt").exists());

        // Outcomes arrive in snapshot order, failure included.
        let files: Vec<_> = report.outcomes.iter().map(|o| o.file()).collect();
        assert_eq!(files, vec!["a.txt", "b.txt", "c.txt"]);

        // One Processing + one Completed per file, progress counting up.
        let progresses: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                BatchEvent::Processing(p) => Some((p.current, p.total)),
                _ => None,
            })
            .collect();
        assert_eq!(progresses, vec![(1, 3), (2, 3), (3, 3)]);
        assert_eq!(events.len(), 6);
        assert!(matches!(events[0], BatchEvent::Processing(_)));
        assert!(matches!(events[1], BatchEvent::Completed(_)));
    }

    #[tokio::test]
    async fn test_rename_skips_sentinel_label() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("doc.txt"), "body").unwrap();

        let classifier = ScriptedClassifier::default()
            .with_name("doc.txt", ScriptedReply::Name(UNKNOWN_DOCUMENT));
        let organizer = BatchOrganizer::new(classifier);

        let report = organizer.rename_files(dir.path(), |_| {}).await.unwrap();

        assert_eq!(report.skipped(), 1);
        assert_eq!(report.renamed(), 0);
        // Untouched, under its original name.
        assert!(dir.path().join("doc.txt").exists());
        assert_eq!(fs::read_to_string(dir.path().join("doc.txt")).unwrap(), "body");
    }

    #[tokio::test]
    async fn test_rename_skips_blank_label() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("doc.txt"), "body").unwrap();

        let classifier = ScriptedClassifier::default()
            .with_name("doc.txt", ScriptedReply::Name("   "));
        let organizer = BatchOrganizer::new(classifier);

        let report = organizer.rename_files(dir.path(), |_| {}).await.unwrap();

        assert_eq!(report.skipped(), 1);
        assert!(dir.path().join("doc.txt").exists());
    }

    #[tokio::test]
    async fn test_missing_folder_is_fatal() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("not_here");

        let organizer = BatchOrganizer::new(ScriptedClassifier::default());
        let mut events = Vec::new();
        let err = organizer
            .rename_files(&missing, |e| events.push(e))
            .await
            .unwrap_err();

        assert!(matches!(err, BatchError::FolderNotFound { .. }));
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_file_target_is_fatal() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        fs::write(&file, "x").unwrap();

        let organizer = BatchOrganizer::new(ScriptedClassifier::default());
        let err = organizer.rename_files(&file, |_| {}).await.unwrap_err();

        assert!(matches!(err, BatchError::NotAFolder { .. }));
    }

    #[tokio::test]
    async fn test_empty_folder_is_nothing_to_do() {
        let dir = tempdir().unwrap();

        let organizer = BatchOrganizer::new(ScriptedClassifier::default());
        let mut events = Vec::new();
        let report = organizer
            .rename_files(dir.path(), |e| events.push(e))
            .await
            .unwrap();

        assert!(report.is_empty());
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_hidden_files_and_folders_excluded() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".hidden.txt"), "h").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("nested.txt"), "n").unwrap();
        fs::write(dir.path().join("visible.txt"), "v").unwrap();

        let classifier = ScriptedClassifier::default()
            .with_name("visible.txt", ScriptedReply::Name("Seen"));
        let organizer = BatchOrganizer::new(classifier);

        let report = organizer.rename_files(dir.path(), |_| {}).await.unwrap();

        assert_eq!(report.total(), 1);
        assert!(dir.path().join(".hidden.txt").exists());
        assert!(dir.path().join("sub").join("nested.txt").exists());
        assert!(dir.path().join("Seen.txt").exists());
    }

    #[tokio::test]
    async fn test_organize_batch_moves_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("inv.pdf"), "pdf").unwrap();
        fs::write(dir.path().join("notes.txt"), "txt").unwrap();

        let classifier = ScriptedClassifier::default().with_category("inv.pdf", "My Finance!!");
        let organizer = BatchOrganizer::new(classifier);

        let mut events = Vec::new();
        let report = organizer
            .organize_files(dir.path(), |e| events.push(e))
            .await
            .unwrap();

        assert_eq!(report.moved(), 2);
        assert!(dir.path().join("MyFinance").join("inv.pdf").exists());
        // No scripted category degrades to the fallback.
        assert!(dir.path().join(UNCATEGORIZED).join("notes.txt").exists());

        let moved_to: Vec<_> = report
            .outcomes
            .iter()
            .filter_map(|o| match o {
                ItemOutcome::Moved { to, .. } => Some(to.as_str()),
                _ => None,
            })
            .collect();
        assert!(moved_to.contains(&"MyFinance/inv.pdf"));
        assert!(moved_to.contains(&"Uncategorized/notes.txt"));
    }

    #[tokio::test]
    async fn test_organize_isolates_mutation_failures() {
        let dir = tempdir().unwrap();
        // Occupy dup.txt's destination ahead of time.
        fs::create_dir(dir.path().join("Docs")).unwrap();
        fs::write(dir.path().join("Docs").join("dup.txt"), "old").unwrap();
        fs::write(dir.path().join("dup.txt"), "new").unwrap();
        fs::write(dir.path().join("extra.txt"), "e").unwrap();

        let classifier = ScriptedClassifier::default()
            .with_category("dup.txt", "Docs")
            .with_category("extra.txt", "Docs");
        let organizer = BatchOrganizer::new(classifier);

        let mut progress_peak = 0;
        let report = organizer
            .organize_files(dir.path(), |e| {
                if let BatchEvent::Processing(p) = &e {
                    progress_peak = p.current;
                }
            })
            .await
            .unwrap();

        assert_eq!(report.total(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.moved(), 1);
        assert_eq!(progress_peak, 2);
        // The occupied destination kept its bytes; the source stayed put.
        assert_eq!(
            fs::read_to_string(dir.path().join("Docs").join("dup.txt")).unwrap(),
            "old"
        );
        assert_eq!(fs::read_to_string(dir.path().join("dup.txt")).unwrap(), "new");
        assert!(dir.path().join("Docs").join("extra.txt").exists());
    }

    #[tokio::test]
    async fn test_snapshot_ignores_files_created_mid_batch() {
        // Organize mode creates category folders while iterating; the
        // snapshot must not pick up moved files as new work.
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("one.txt"), "1").unwrap();
        fs::write(dir.path().join("two.txt"), "2").unwrap();

        let classifier = ScriptedClassifier::default()
            .with_category("one.txt", "Bucket")
            .with_category("two.txt", "Bucket");
        let organizer = BatchOrganizer::new(classifier);

        let report = organizer.organize_files(dir.path(), |_| {}).await.unwrap();

        assert_eq!(report.total(), 2);
        assert_eq!(report.moved(), 2);
        assert!(dir.path().join("Bucket").join("one.txt").exists());
        assert!(dir.path().join("Bucket").join("two.txt").exists());
    }
}
