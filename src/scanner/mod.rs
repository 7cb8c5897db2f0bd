mod walk;

pub use walk::{relative_path, scan_source_directory, walk_media_files, ScanOptions};
