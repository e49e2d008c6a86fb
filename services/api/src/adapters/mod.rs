pub mod db;
pub mod storage;

pub use db::DbAdapter;
pub use storage::FsStorage;
