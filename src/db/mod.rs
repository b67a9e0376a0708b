pub mod dropcatch;
pub mod godaddy;
pub mod lib_loader;
pub mod prod_db;
pub mod schema;
