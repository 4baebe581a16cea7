pub mod db;
pub mod import;
pub mod ipc;
pub mod logging;
