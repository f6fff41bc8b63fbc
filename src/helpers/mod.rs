pub mod domain;
pub mod download;
pub mod temp_dir;
pub mod temp_file;
pub mod text;
