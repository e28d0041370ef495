// fs-persister: disk-backed persistence tier for keyed caches
//
// Keys are resolved to canonical paths (resolver), stored as plain files
// under a root directory (fs) and exposed to the caching tier as futures
// (persister).

pub mod config;
pub mod constants;
pub mod error;
pub mod fs;
pub mod logging;
pub mod persister;
pub mod resolver;

pub use config::StoreConfig;
pub use error::{PersistError, Result};
pub use fs::{FileSystem, LocalFileSystem, MemoryFileSystem, RecordState};
pub use persister::{
    DiskAllErase, DiskAllRead, DiskRead, DiskWrite, FileSystemPersister, FsAllEraser,
    FsAllReader, FsReader, FsWriter, Persister, RecordProvider,
};
pub use resolver::{
    BarCode, BarCodePathResolver, HashedPathResolver, PathResolver, SegmentPathResolver,
};
