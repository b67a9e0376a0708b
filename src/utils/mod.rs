pub mod lib_download;
pub mod lib_duckdb;
pub mod lib_zip;
