pub mod fs_ext;

pub use fs_ext::{DirEntryInfo, list_files, modified_time};
