pub mod engine;
pub mod reconciler;
pub mod remote;
pub mod scanner;
pub mod uploader;

pub use engine::{BackupEngine, BackupPlan, BackupReport, RunStatus};
pub use reconciler::{IdentityStrategy, Reconciler};
pub use remote::{RemoteEnumerator, RemoteSnapshot};
pub use scanner::{LocalFileRef, LocalScanner, RootMissing};
pub use uploader::{UploadReport, Uploader};
