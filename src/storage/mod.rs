pub mod db;
pub mod files;
pub mod migrations;
