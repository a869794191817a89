// src/db/mod.rs
//
// The SQLite library file: opening it, versioning its schema and
// summarising its contents.

pub mod connection;
pub mod migrations;

pub use connection::{
    create_connection_pool, create_test_connection, default_database_path, get_connection,
    ConnectionPool, PooledConn,
};

pub use migrations::{
    get_database_stats, initialize_database, schema_version, verify_database_integrity,
    DatabaseStats,
};
